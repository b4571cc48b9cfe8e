use fel_eval::evaluate_project;
use fel_parser::Parser;
use fel_typeck::TypeChecker;

fn build(sources: &[(&str, &str)]) -> fel_eval::EvaluatedProject {
    let mut files = Vec::new();
    for (path, source) in sources {
        let (file, parse_diags) = Parser::parse_file(*path, source).expect("parse");
        assert!(parse_diags.is_empty(), "unexpected parse diagnostics in {path}: {parse_diags:?}");
        files.push(file);
    }
    let checked = TypeChecker::new().check_project(&files);
    assert!(checked.diagnostics.is_empty(), "unexpected type diagnostics: {:?}", checked.diagnostics);
    evaluate_project(&files, &checked).expect("evaluation diagnostics")
}

#[test]
fn renders_a_component_with_a_field_default_and_an_override() {
    let project = build(&[(
        "index.fel",
        r#"
Card :: html {
    title: string = "Untitled"
    div(class="card") {
        h1 { title }
        children
    }
}

div {
    Card(title="Hello") {
        p { "body" }
    }
    Card {}
}
"#,
    )]);

    assert_eq!(project.templates.len(), 1);
    let html = &project.templates[0].html;
    assert!(html.contains("Hello"), "missing overridden title in: {html}");
    assert!(html.contains("Untitled"), "missing default title in: {html}");
    assert!(html.contains("body"), "missing spliced children in: {html}");
    assert!(!html.contains('"'), "rendered html retained quote delimiters: {html}");
}

#[test]
fn string_concatenation_becomes_text_content() {
    let project = build(&[(
        "index.fel",
        r#"
Greeting :: html {
    name: string = ""
    button { "Hi " + name }
}

Greeting(name="Jo") {}
"#,
    )]);

    let html = &project.templates[0].html;
    assert!(html.contains("Hi Jo"), "expected concatenated greeting text, got: {html}");
}

#[test]
fn button_field_renders_with_its_override() {
    let project = build(&[(
        "index.fel",
        r#"
Button :: html {
    Name : string = ""
    button { "Hi " + Name }
}

Button(Name="Jo") {}
"#,
    )]);

    let html = &project.templates[0].html;
    assert!(html.contains("<button>"), "missing opening tag in: {html}");
    assert!(html.contains("Hi Jo"), "missing rendered field override in: {html}");
    assert!(html.contains("</button>"), "missing closing tag in: {html}");
}

#[test]
fn if_and_for_bodies_contribute_their_html_to_the_enclosing_node() {
    let project = build(&[(
        "index.fel",
        r#"
items := ["a", "b"]

ul {
    for item : items {
        li { item }
    }
    if true {
        li { "tail" }
    }
}
"#,
    )]);

    let html = &project.templates[0].html;
    assert!(html.matches("<li>").count() == 3, "expected three `li` elements in: {html}");
    assert!(html.contains('a') && html.contains('b'), "missing for-loop item text in: {html}");
    assert!(html.contains("tail"), "missing if-body output in: {html}");
}

#[test]
fn procedure_call_feeds_a_for_loop() {
    let project = build(&[(
        "index.fel",
        r#"
double :: (n: int) -> int {
    return n * 2
}

nums := [1, 2, 3]

ul {
    for n : nums {
        li { double(n) }
    }
}
"#,
    )]);

    let html = &project.templates[0].html;
    assert!(html.contains('2') && html.contains('4') && html.contains('6'), "expected doubled values in: {html}");
}

#[test]
fn nested_css_rules_combine_selectors_and_substitute_variables() {
    let project = build(&[(
        "index.fel",
        r#"
accent := "navy"

div(class="panel") {
    h1(class="title") { "hi" }
}

:: css {
    .panel {
        color: $accent
        .title {
            font-weight: bold
        }
    }
}
"#,
    )]);

    assert!(project.css.contains(".panel"), "missing top-level rule in: {}", project.css);
    assert!(project.css.contains(".panel .title"), "missing combined nested selector in: {}", project.css);
    assert!(project.css.contains("navy"), "missing substituted variable in: {}", project.css);
}

#[test]
fn dead_css_rule_with_no_matching_node_is_pruned() {
    let project = build(&[(
        "index.fel",
        r#"
div(class="used") { "hi" }

:: css {
    .used {
        color: red
    }
    .unused {
        color: blue
    }
}
"#,
    )]);

    assert!(project.css.contains(".used"), "expected matched rule to survive: {}", project.css);
    assert!(!project.css.contains(".unused"), "expected unmatched rule to be pruned: {}", project.css);
}
