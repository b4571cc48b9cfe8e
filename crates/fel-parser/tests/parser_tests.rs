use fel_parser::ast::TopLevelItem;
use fel_parser::Parser;

#[test]
fn parses_simple_component_with_leading_field_declarations() {
    let source = r#"
Card :: html {
    title: string
    count: int = 0
    div(class="card") {
        h1 { title }
        children
    }
}
"#;
    let (file, diags) = Parser::parse_file("card.fel", source).expect("parse");
    assert!(diags.is_empty(), "unexpected diagnostics: {diags:?}");
    assert_eq!(file.items.len(), 1);
    match &file.items[0] {
        TopLevelItem::Html(def) => {
            assert!(def.properties.is_some());
            assert_eq!(def.properties.as_ref().unwrap().fields.len(), 2);
            assert_eq!(def.body.statements.len(), 1);
        }
        other => panic!("expected html definition, got {other:?}"),
    }
}

#[test]
fn component_without_leading_declarations_has_no_properties() {
    let source = r#"
Card :: html {
    div { children }
}
"#;
    let (file, diags) = Parser::parse_file("card.fel", source).expect("parse");
    assert!(diags.is_empty(), "unexpected diagnostics: {diags:?}");
    match &file.items[0] {
        TopLevelItem::Html(def) => assert!(def.properties.is_none()),
        other => panic!("expected html definition, got {other:?}"),
    }
}

#[test]
fn parses_css_definition_with_nesting_and_combinators() {
    let source = r#"
Card :: css {
    .card > h1 ~ p {
        color: "navy"
    }
    @media {
        .card {
            width: "100%"
        }
    }
}
"#;
    let (file, diags) = Parser::parse_file("card.css.fel", source).expect("parse");
    assert!(diags.is_empty(), "unexpected diagnostics: {diags:?}");
    match &file.items[0] {
        TopLevelItem::Css(def) => assert_eq!(def.rules.len(), 2),
        other => panic!("expected css definition, got {other:?}"),
    }
}

#[test]
fn parses_struct_and_procedure_definitions() {
    let source = r#"
Point :: struct {
    x: int
    y: int
}

add :: (a: int, b: int) -> int {
    return a + b
}
"#;
    let (file, diags) = Parser::parse_file("util.fel", source).expect("parse");
    assert!(diags.is_empty(), "unexpected diagnostics: {diags:?}");
    assert_eq!(file.items.len(), 2);
    match &file.items[1] {
        TopLevelItem::Procedure(proc) => {
            assert_eq!(proc.params.len(), 2);
            assert!(proc.return_type.is_some());
        }
        other => panic!("expected procedure definition, got {other:?}"),
    }
}

#[test]
fn parses_control_flow_and_declarations() {
    let source = r#"
x := 1
y : int = 2
if x == 1 {
    y = y + 1
} else {
    y = 0
}
for i, n : items {
    total += n
}
"#;
    let (file, diags) = Parser::parse_file("tmpl.fel", source).expect("parse");
    assert!(diags.is_empty(), "unexpected diagnostics: {diags:?}");
    assert_eq!(file.items.len(), 4);
}

#[test]
fn parses_config_file_shape() {
    let source = r#"
template_output_directory := "out/html"
css_output_directory := "out/css"
"#;
    let (file, diags) = Parser::parse_file("config.fel", source).expect("parse");
    assert!(diags.is_empty());
    assert_eq!(file.items.len(), 2);
}

#[test]
fn unterminated_string_is_a_fatal_parse_error() {
    let result = Parser::parse_file("bad.fel", "x := \"oops");
    assert!(result.is_err());
}

#[test]
fn mismatched_parens_are_fatal() {
    let result = Parser::parse_file("bad.fel", "x := (1 + 2");
    assert!(result.is_err());
}
