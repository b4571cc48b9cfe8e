//! Driver library for the FEL compiler: discovers a project's source files,
//! runs them through the parse -> typecheck -> evaluate pipeline, and writes
//! the resulting HTML/CSS (spec.md §5, §6). `src/main.rs` is a thin `clap`
//! wrapper around [`build_project`]; kept as a library too so integration
//! tests can drive the pipeline without shelling out.

pub mod discovery;
pub mod report;

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use fel_common::Diagnostic;
use fel_eval::EvaluatedProject;
use fel_parser::ast::File;
use fel_parser::Parser;
use fel_typeck::TypeChecker;

/// Every diagnostic produced in one `build_project` run, plus the source
/// text each one's `file` points into -- everything [`report::render_to_stderr`]
/// and [`report::render_json`] need, without re-reading the filesystem.
pub struct Diagnostics {
    pub diagnostics: Vec<Diagnostic>,
    pub sources: HashMap<String, String>,
}

pub enum BuildError {
    /// The project directory failed the §6 layout check (no `config.fel`,
    /// no `templates/`) or an I/O error occurred while discovering/reading
    /// source files.
    Layout(String),
    /// Parsing or type-checking reported at least one diagnostic; per
    /// spec.md §5 the evaluator does not run and no outputs are written.
    Diagnostics(Diagnostics),
    /// `template_output_directory`/`css_output_directory` were missing or
    /// pointed at a directory that does not exist (spec.md §6).
    Config(String),
    /// Writing an output file failed.
    Io(String),
}

pub struct BuildOutput {
    pub html_files: Vec<PathBuf>,
    pub css_file: PathBuf,
}

/// Parses every `*.fel` file discovered under `project_root` (spec.md §6:
/// "All `*.fel` files under the project directory are compiled as one
/// program"). A file whose scanner/parser hits a fatal error contributes
/// that one diagnostic and is otherwise skipped, so the rest of the
/// project still gets a chance to report its own errors in the same run.
pub fn load_project(project_root: &Path) -> Result<(Vec<File>, Diagnostics), BuildError> {
    discovery::validate_layout(project_root).map_err(BuildError::Layout)?;
    let relative_paths = discovery::discover_fel_files(project_root).map_err(|e| BuildError::Layout(format!("failed to walk '{}': {}", project_root.display(), e)))?;

    let mut files = Vec::new();
    let mut diagnostics = Vec::new();
    let mut sources = HashMap::new();

    for relative in &relative_paths {
        let path_str = discovery::to_slash_path(relative);
        let full_path = project_root.join(relative);
        let source = std::fs::read_to_string(&full_path).map_err(|e| BuildError::Layout(format!("failed to read '{}': {}", full_path.display(), e)))?;

        match Parser::parse_file(path_str.clone(), &source) {
            Ok((file, file_diagnostics)) => {
                for diag in file_diagnostics {
                    diagnostics.push(stamp(diag, &path_str));
                }
                files.push(file);
            }
            Err(fatal) => diagnostics.push(stamp(fatal, &path_str)),
        }
        sources.insert(path_str, source);
    }

    Ok((files, Diagnostics { diagnostics, sources }))
}

fn stamp(diag: Diagnostic, path: &str) -> Diagnostic {
    if diag.file.is_some() {
        diag
    } else {
        diag.with_file(std::rc::Rc::from(path))
    }
}

/// Runs the global type checker, then the evaluator, matching spec.md §5's
/// partial-failure policy: the evaluator never runs while any diagnostic
/// -- parser or type-checker -- is outstanding.
fn check_and_evaluate(files: &[File], mut diagnostics: Diagnostics) -> Result<EvaluatedProject, BuildError> {
    if !diagnostics.diagnostics.is_empty() {
        return Err(BuildError::Diagnostics(diagnostics));
    }

    let checked = TypeChecker::new().check_project(files);
    if !checked.diagnostics.is_empty() {
        diagnostics.diagnostics = checked.diagnostics;
        return Err(BuildError::Diagnostics(diagnostics));
    }

    match fel_eval::evaluate_project(files, &checked) {
        Ok(project) => Ok(project),
        Err(eval_diagnostics) => {
            diagnostics.diagnostics = eval_diagnostics;
            Err(BuildError::Diagnostics(diagnostics))
        }
    }
}

/// Writes an evaluated project's HTML and CSS to disk (spec.md §6).
///
/// `template_output_directory` and `css_output_directory` must already
/// exist on disk (spec §6: "relative path; must exist") -- this function
/// never creates them, matching the original's `os.Stat`-then-fail
/// behavior rather than `mkdir -p` convenience.
fn write_outputs(project_root: &Path, evaluated: &EvaluatedProject) -> Result<BuildOutput, BuildError> {
    let template_output_directory = evaluated
        .template_output_directory
        .clone()
        .ok_or_else(|| BuildError::Config("template_output_directory is undefined in config.fel. This definition is required.".to_string()))?;
    let css_output_directory = evaluated
        .css_output_directory
        .clone()
        .ok_or_else(|| BuildError::Config("css_output_directory is undefined in config.fel. This definition is required.".to_string()))?;

    let html_dir = project_root.join(&template_output_directory);
    let css_dir = project_root.join(&css_output_directory);
    if !html_dir.is_dir() {
        return Err(BuildError::Config(format!("template_output_directory '{}' does not exist", template_output_directory)));
    }
    if !css_dir.is_dir() {
        return Err(BuildError::Config(format!("css_output_directory '{}' does not exist", css_output_directory)));
    }

    let mut html_files = Vec::new();
    for template in &evaluated.templates {
        let relative = template.path.strip_prefix("templates/").unwrap_or(&template.path);
        let relative = relative.strip_suffix(".fel").unwrap_or(relative);
        let out_path = html_dir.join(format!("{relative}.html"));
        if let Some(parent) = out_path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| BuildError::Io(format!("failed to create '{}': {}", parent.display(), e)))?;
        }
        std::fs::write(&out_path, &template.html).map_err(|e| BuildError::Io(format!("failed to write '{}': {}", out_path.display(), e)))?;
        html_files.push(out_path);
    }

    let css_file = css_dir.join("main.css");
    std::fs::write(&css_file, &evaluated.css).map_err(|e| BuildError::Io(format!("failed to write '{}': {}", css_file.display(), e)))?;

    Ok(BuildOutput { html_files, css_file })
}

/// Runs the full pipeline -- discover, parse, typecheck, evaluate, write --
/// over a project directory.
pub fn build_project(project_root: &Path) -> Result<BuildOutput, BuildError> {
    let (files, diagnostics) = load_project(project_root)?;
    let evaluated = check_and_evaluate(&files, diagnostics)?;
    write_outputs(project_root, &evaluated)
}
