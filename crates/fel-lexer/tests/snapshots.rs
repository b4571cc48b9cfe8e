use fel_lexer::Lexer;

fn token_summary(source: &str) -> String {
    Lexer::tokenize(source)
        .expect("tokenize")
        .into_iter()
        .map(|t| format!("{:?} {}:{} {:?}", t.kind, t.line, t.column, t.lexeme))
        .collect::<Vec<_>>()
        .join("\n")
}

#[test]
fn component_definition() {
    let source = r#"
Card :: html {
    title: string
    div {
        class: "card"
        h1 { $title }
        children
    }
}
"#;
    insta::assert_snapshot!(token_summary(source));
}

#[test]
fn css_selector_with_combinators() {
    let source = r#"
css {
    .card > h1 ~ p {
        color: "navy"
    }
    @media {
        .card { width: "100%" }
    }
}
"#;
    insta::assert_snapshot!(token_summary(source));
}

#[test]
fn struct_and_procedure_headers() {
    let source = r#"
Point :: struct {
    x: int
    y: int
}

add :: (a: int, b: int) -> int {
    return a + b
}
"#;
    insta::assert_snapshot!(token_summary(source));
}
