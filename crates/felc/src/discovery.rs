//! Project layout discovery for FEL projects.
//!
//! Finds every `*.fel` file under a project root (source: `meshc`'s
//! `discover_mesh_files`/`discover_recursive`), sorted for determinism and
//! skipping hidden entries. FEL has no import declarations, so unlike the
//! teacher there is no module graph to build afterward: every discovered
//! file is simply part of the one program (spec.md §6).

use std::path::{Path, PathBuf};

/// Recursively discover all `.fel` files in a project directory.
///
/// Returns paths relative to `project_root`, sorted alphabetically. Hidden
/// directories and files (names starting with `.`) are skipped.
pub fn discover_fel_files(project_root: &Path) -> std::io::Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    discover_recursive(project_root, project_root, &mut files)?;
    files.sort();
    Ok(files)
}

fn discover_recursive(root: &Path, dir: &Path, files: &mut Vec<PathBuf>) -> std::io::Result<()> {
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        let entry_path = entry.path();
        let name = entry.file_name();
        let name = name.to_string_lossy();

        if name.starts_with('.') {
            continue;
        }

        if entry_path.is_dir() {
            discover_recursive(root, &entry_path, files)?;
        } else if entry_path.extension().and_then(|e| e.to_str()) == Some("fel") {
            let relative = entry_path.strip_prefix(root).unwrap_or(&entry_path).to_path_buf();
            files.push(relative);
        }
    }
    Ok(())
}

/// Checks the two structural requirements spec.md §6 places on a project
/// directory before any parsing is attempted: a `config.fel` at the root
/// and a `templates/` subdirectory.
pub fn validate_layout(project_root: &Path) -> Result<(), String> {
    if !project_root.is_dir() {
        return Err(format!("'{}' is not a directory", project_root.display()));
    }
    if !project_root.join("config.fel").is_file() {
        return Err(format!("no 'config.fel' found in '{}'; a FEL project must have one at its root", project_root.display()));
    }
    if !project_root.join("templates").is_dir() {
        return Err(format!("no 'templates' directory found in '{}'; a FEL project must have one", project_root.display()));
    }
    Ok(())
}

/// Converts a discovered relative path (always using the platform's own
/// separator from [`std::fs::read_dir`]) to the `/`-separated form every
/// other stage compares against (`is_config_file`, the `templates/` strip
/// in [`crate::write_outputs`]).
pub fn to_slash_path(relative: &Path) -> String {
    relative.components().map(|c| c.as_os_str().to_string_lossy().into_owned()).collect::<Vec<_>>().join("/")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn discovers_nested_fel_files_sorted() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("config.fel"), "").unwrap();
        std::fs::create_dir_all(dir.path().join("templates/blog")).unwrap();
        std::fs::write(dir.path().join("templates/index.fel"), "").unwrap();
        std::fs::write(dir.path().join("templates/blog/post.fel"), "").unwrap();
        std::fs::write(dir.path().join("README.md"), "").unwrap();
        std::fs::create_dir_all(dir.path().join(".git")).unwrap();
        std::fs::write(dir.path().join(".git/ignored.fel"), "").unwrap();

        let files = discover_fel_files(dir.path()).unwrap();
        let slashed: Vec<String> = files.iter().map(|p| to_slash_path(p)).collect();
        assert_eq!(slashed, vec!["config.fel", "templates/blog/post.fel", "templates/index.fel"]);
    }

    #[test]
    fn validate_layout_requires_config_and_templates() {
        let dir = tempfile::tempdir().unwrap();
        assert!(validate_layout(dir.path()).is_err());
        std::fs::write(dir.path().join("config.fel"), "").unwrap();
        assert!(validate_layout(dir.path()).is_err());
        std::fs::create_dir_all(dir.path().join("templates")).unwrap();
        assert!(validate_layout(dir.path()).is_ok());
    }
}
