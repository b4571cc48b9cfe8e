//! End-to-end integration tests for the FEL compiler.
//!
//! Each test builds a temporary project directory, invokes the `felc`
//! binary against it, and asserts on the files it wrote (or the diagnostics
//! it printed for a project that should fail to compile).

use std::path::{Path, PathBuf};
use std::process::Command;

fn write_project(root: &Path, templates: &[(&str, &str)]) {
    std::fs::create_dir_all(root.join("templates")).unwrap();
    std::fs::create_dir_all(root.join("out/html")).unwrap();
    std::fs::create_dir_all(root.join("out/css")).unwrap();
    std::fs::write(
        root.join("config.fel"),
        "template_output_directory := \"out/html\"\ncss_output_directory := \"out/css\"\n",
    )
    .unwrap();
    for (name, source) in templates {
        std::fs::write(root.join("templates").join(name), source).unwrap();
    }
}

fn run_build(root: &Path, extra_args: &[&str]) -> std::process::Output {
    let felc = find_felc();
    Command::new(&felc).arg("build").arg(root).args(extra_args).output().expect("failed to invoke felc")
}

fn find_felc() -> PathBuf {
    let mut path = std::env::current_exe().expect("cannot find current exe").parent().expect("cannot find parent dir").to_path_buf();
    if path.file_name().map_or(false, |n| n == "deps") {
        path = path.parent().unwrap().to_path_buf();
    }
    let felc = path.join("felc");
    assert!(felc.exists(), "felc binary not found at {}. Run `cargo build -p felc` first.", felc.display());
    felc
}

#[test]
fn builds_a_project_to_html_and_css() {
    let dir = tempfile::tempdir().unwrap();
    write_project(
        dir.path(),
        &[(
            "index.fel",
            r#"
Card :: html {
    title: string = "Untitled"
    div(class="card") {
        h1 { title }
    }
}

div {
    Card(title="Hello") {}
}

:: css {
    .card {
        color: blue
    }
}
"#,
        )],
    );

    let output = run_build(dir.path(), &[]);
    assert!(output.status.success(), "build failed:\nstdout: {}\nstderr: {}", String::from_utf8_lossy(&output.stdout), String::from_utf8_lossy(&output.stderr));

    let html = std::fs::read_to_string(dir.path().join("out/html/index.html")).expect("index.html should have been written");
    assert!(html.contains("Hello"));

    let css = std::fs::read_to_string(dir.path().join("out/css/main.css")).expect("main.css should have been written");
    assert!(css.contains(".card"));
}

#[test]
fn undefined_identifier_reports_a_diagnostic_and_writes_nothing() {
    let dir = tempfile::tempdir().unwrap();
    write_project(dir.path(), &[("index.fel", "div { missing_name }\n")]);

    let output = run_build(dir.path(), &[]);
    assert!(!output.status.success(), "expected build to fail");
    assert!(!dir.path().join("out/html/index.html").exists(), "no output should be written when type-checking fails");
}

#[test]
fn json_diagnostics_flag_emits_parseable_json() {
    let dir = tempfile::tempdir().unwrap();
    write_project(dir.path(), &[("index.fel", "div { missing_name }\n")]);

    let output = run_build(dir.path(), &["--json-diagnostics"]);
    assert!(!output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    let parsed: serde_json::Value = serde_json::from_str(&stdout).expect("stdout should be valid JSON");
    assert!(parsed.as_array().map_or(false, |a| !a.is_empty()), "expected at least one diagnostic: {stdout}");
}

#[test]
fn rejects_a_project_missing_config_fel() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::create_dir_all(dir.path().join("templates")).unwrap();

    let output = run_build(dir.path(), &[]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("config.fel"));
}
