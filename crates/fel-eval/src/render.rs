use crate::css::CssNodeValue;
use crate::value::HtmlValue;

/// HTML5 void elements: rendered as a single self-closing-style tag with no
/// matching close tag, regardless of whether the source gave them a body.
fn is_void_element(tag: &str) -> bool {
    matches!(
        tag,
        "area" | "base" | "br" | "col" | "embed" | "hr" | "img" | "input" | "link" | "meta" | "param" | "source" | "track" | "wbr"
    )
}

/// Pretty-prints a rendered component/template tree to HTML (spec.md §6).
/// `Fragment` nodes splice their children in place without an enclosing tag.
pub fn render_html(root: &HtmlValue) -> String {
    let mut out = String::new();
    render_node(root, 0, &mut out);
    out
}

fn render_node(node: &HtmlValue, indent: usize, out: &mut String) {
    match node {
        HtmlValue::Fragment(children) => {
            for child in children {
                render_node(child, indent, out);
            }
        }
        HtmlValue::Text(text) => {
            push_indent(indent, out);
            out.push_str(text);
            out.push('\n');
        }
        HtmlValue::Element { tag, attributes, children } => {
            push_indent(indent, out);
            out.push('<');
            out.push_str(tag);
            for (name, value) in attributes {
                out.push(' ');
                out.push_str(name);
                out.push_str("=\"");
                out.push_str(value);
                out.push('"');
            }
            if is_void_element(tag) {
                out.push_str(" />\n");
                return;
            }
            out.push('>');
            if children.is_empty() {
                out.push_str("</");
                out.push_str(tag);
                out.push_str(">\n");
                return;
            }
            out.push('\n');
            for child in children {
                render_node(child, indent + 1, out);
            }
            push_indent(indent, out);
            out.push_str("</");
            out.push_str(tag);
            out.push_str(">\n");
        }
    }
}

fn push_indent(indent: usize, out: &mut String) {
    for _ in 0..indent {
        out.push_str("  ");
    }
}

/// Pretty-prints every surviving rule in a CSS sheet, after dead-rule
/// pruning has already run.
pub fn render_css(nodes: &[CssNodeValue]) -> String {
    let mut out = String::new();
    for node in nodes {
        render_css_node(node, 0, &mut out);
    }
    out
}

fn render_css_node(node: &CssNodeValue, indent: usize, out: &mut String) {
    match node {
        CssNodeValue::Rule { selectors, properties, nested } => {
            if selectors.is_empty() {
                return;
            }
            push_indent(indent, out);
            out.push_str(&selectors.iter().map(|s| render_selector(s)).collect::<Vec<_>>().join(", "));
            out.push_str(" {\n");
            for (name, value) in properties {
                push_indent(indent + 1, out);
                out.push_str(name);
                out.push_str(": ");
                out.push_str(value);
                out.push_str(";\n");
            }
            for child in nested {
                render_css_node(child, indent + 1, out);
            }
            push_indent(indent, out);
            out.push_str("}\n");
        }
        CssNodeValue::AtRule { keyword, nested } => {
            if nested.is_empty() {
                return;
            }
            push_indent(indent, out);
            out.push('@');
            out.push_str(keyword);
            out.push_str(" {\n");
            for child in nested {
                render_css_node(child, indent + 1, out);
            }
            push_indent(indent, out);
            out.push_str("}\n");
        }
    }
}

fn render_selector(parts: &[crate::css::CssSelectorPartValue]) -> String {
    use crate::css::CssSelectorPartValue as P;
    use fel_parser::ast::CssCombinator;

    let mut out = String::new();
    for part in parts {
        match part {
            P::Tag(name) => out.push_str(name),
            P::Class(name) => {
                out.push('.');
                out.push_str(name);
            }
            P::Id(name) => {
                out.push('#');
                out.push_str(name);
            }
            P::Pseudo(name) => {
                out.push(':');
                out.push_str(name);
            }
            P::AtKeyword(name) => {
                out.push('@');
                out.push_str(name);
            }
            P::Number(n) => out.push_str(n),
            P::Attribute { name, operator, value } => {
                out.push('[');
                out.push_str(name);
                if let (Some(op), Some(val)) = (operator, value) {
                    out.push_str(op);
                    out.push_str(val);
                }
                out.push(']');
            }
            P::Combinator(CssCombinator::Ancestor) => out.push(' '),
            P::Combinator(CssCombinator::Child) => out.push_str(" > "),
            P::Combinator(CssCombinator::Adjacent) => out.push_str(" + "),
            P::Combinator(CssCombinator::Sibling) => out.push_str(" ~ "),
        }
    }
    out.trim().to_string()
}
