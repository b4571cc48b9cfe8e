use fel_parser::Parser;
use fel_typeck::{TypeChecker, TypeInfo};

fn check(source: &str) -> fel_typeck::CheckedProgram {
    let (file, parse_diags) = Parser::parse_file("t.fel", source).expect("parse");
    assert!(parse_diags.is_empty(), "unexpected parse diagnostics: {parse_diags:?}");
    TypeChecker::new().check_project(&[file])
}

#[test]
fn accepts_a_well_typed_component() {
    let program = check(
        r#"
Card :: struct {
    title: string
}

Card :: html {
    div(class="card") {
        h1 { title }
        children
    }
}
"#,
    );
    assert!(program.diagnostics.is_empty(), "unexpected diagnostics: {:?}", program.diagnostics);
}

#[test]
fn rejects_declare_type_mismatch() {
    let program = check("x : int = \"oops\"\n");
    assert_eq!(program.diagnostics.len(), 1);
}

#[test]
fn rejects_if_condition_that_is_not_bool() {
    let program = check("x := 1\nif x {\n y := 2\n}\n");
    assert_eq!(program.diagnostics.len(), 1);
}

#[test]
fn resolves_for_loop_element_type() {
    let program = check(
        r#"
items := [1, 2, 3]
for i, n : items {
    total := n + 1
}
"#,
    );
    assert!(program.diagnostics.is_empty(), "unexpected diagnostics: {:?}", program.diagnostics);
}

#[test]
fn detects_procedure_arity_mismatch() {
    let program = check(
        r#"
add :: (a: int, b: int) -> int {
    return a + b
}
x := add(1)
"#,
    );
    assert_eq!(program.diagnostics.len(), 1);
}

#[test]
fn detects_component_dependency_cycle() {
    let program = check(
        r#"
A :: html {
    B()
}
B :: html {
    A()
}
"#,
    );
    assert!(!program.diagnostics.is_empty(), "expected a cycle diagnostic");
}

#[test]
fn orphan_css_config_is_reported() {
    let program = check(
        r#"
Lonely :: css_config {
    media_query: "screen"
}
"#,
    );
    assert_eq!(program.diagnostics.len(), 1);
}

#[test]
fn array_literal_type_resolves_to_element_array() {
    let program = check("xs := [1, 2, 3]\n");
    assert!(program.diagnostics.is_empty());
    let ty = program.node_types.values().find(|t| t.is_array());
    assert_eq!(ty, Some(&TypeInfo::array_of(TypeInfo::Int)));
}

#[test]
fn duplicate_declaration_in_same_scope_emits_two_diagnostics() {
    let program = check("x := 1\nx := 2\n");
    assert_eq!(program.diagnostics.len(), 2, "expected one diagnostic per occurrence: {:?}", program.diagnostics);
}

#[test]
fn duplicate_top_level_struct_emits_two_diagnostics() {
    let program = check(
        r#"
Point :: struct {
    x: int
}
Point :: struct {
    y: int
}
"#,
    );
    assert_eq!(program.diagnostics.len(), 2, "expected one diagnostic per occurrence: {:?}", program.diagnostics);
}

#[test]
fn children_is_rejected_as_a_component_field_name() {
    let program = check(
        r#"
Card :: html {
    children: string
    div { children }
}
"#,
    );
    assert!(!program.diagnostics.is_empty(), "expected a reserved-name diagnostic");
}

#[test]
fn redeclaring_a_component_field_in_its_body_is_an_error() {
    let program = check(
        r#"
Card :: html {
    title: string
    title := "again"
    div { title }
}
"#,
    );
    assert_eq!(program.diagnostics.len(), 2, "expected one diagnostic per occurrence: {:?}", program.diagnostics);
}

#[test]
fn mixing_top_level_struct_and_inline_fields_is_an_error() {
    let program = check(
        r#"
Card :: struct {
    title: string
}
Card :: html {
    title: string
    div { title }
}
"#,
    );
    assert!(!program.diagnostics.is_empty(), "expected a diagnostic for mixing a top-level struct with inline fields");
}
