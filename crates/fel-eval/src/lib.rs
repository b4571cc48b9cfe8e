//! Renders a type-checked FEL project to static HTML and CSS.
//!
//! [`evaluate_project`] walks every file's top-level statements with a
//! tree-walking evaluator (spec.md §9), constructing one [`value::HtmlValue`]
//! fragment per template file, then evaluates every `:: css` definition into
//! a [`css::CssSheetValue`], prunes rules whose selectors match no node in
//! any rendered template (source: `evaluator/css.go`'s
//! `optimizeAndReturnUsedCSS`), and pretty-prints the result (spec.md §6).

mod css;
mod evaluator;
mod render;
mod scope;
mod selector_match;
mod value;

use std::rc::Rc;

use fel_common::Diagnostic;
use fel_parser::ast::{Block, File, HtmlComponentDefinition, ProcedureDefinition, StructDefinition, StructField, Stmt, TopLevelItem};
use fel_typeck::CheckedProgram;
use rustc_hash::FxHashMap;

pub use css::{CssNodeValue, CssSelectorPartValue, CssSelectorValue, CssSheetValue};
pub use evaluator::Evaluator;
pub use render::{render_css, render_html};
pub use scope::Scope;
pub use value::{HtmlValue, StructValue, Value};

pub struct TemplateOutput {
    pub path: String,
    pub html: String,
}

pub struct EvaluatedProject {
    pub templates: Vec<TemplateOutput>,
    pub css: String,
    /// `template_output_directory` and `css_output_directory`, as declared
    /// in `config.fel`'s top level (spec.md §6). `None` if `config.fel`
    /// never declared that key, or declared it to something other than a
    /// string; the caller is responsible for turning that into the "…is
    /// undefined in config.fel. This definition is required." diagnostic,
    /// since only it knows the project's `config.fel` path for the message.
    pub template_output_directory: Option<String>,
    pub css_output_directory: Option<String>,
}

/// Strips a string token's surrounding `"`/`` ` `` delimiters. The scanner
/// keeps them in `lexeme` (spec.md §4.1's raw-slice design), so every
/// consumer that wants the string's contents strips them itself.
pub(crate) fn unquote(lexeme: &str) -> &str {
    let bytes = lexeme.as_bytes();
    if bytes.len() >= 2 && (bytes[0] == b'"' || bytes[0] == b'`') {
        &lexeme[1..lexeme.len() - 1]
    } else {
        lexeme
    }
}

fn is_config_file(path: &str) -> bool {
    path.ends_with("config.fel")
}

/// Runs evaluation over every parsed file. Callers must only invoke this
/// once the type checker reported zero diagnostics (spec.md §5): this
/// function does not re-check types, and a type error left unresolved will
/// surface here as a runtime evaluation diagnostic instead, with a worse
/// error message.
pub fn evaluate_project(files: &[File], checked: &CheckedProgram) -> Result<EvaluatedProject, Vec<Diagnostic>> {
    let _ = &checked.node_types; // reserved for expression-result caching; not yet consumed here.
    let _ = &checked.registry;
    let _ = &checked.node_html_defs;

    let mut components: FxHashMap<Rc<str>, &HtmlComponentDefinition> = FxHashMap::default();
    let mut structs: FxHashMap<Rc<str>, &StructDefinition> = FxHashMap::default();
    let mut procedures: FxHashMap<Rc<str>, &ProcedureDefinition> = FxHashMap::default();
    let mut css_defs: Vec<(&fel_parser::ast::CssDefinition, &str)> = Vec::new();
    let mut css_configs: FxHashMap<Rc<str>, &fel_parser::ast::CssConfigDefinition> = FxHashMap::default();

    for file in files {
        for item in &file.items {
            match item {
                TopLevelItem::Html(def) => {
                    if let Some(name) = &def.name {
                        components.insert(Rc::from(name.lexeme.as_str()), def);
                    }
                }
                TopLevelItem::Struct(def) => {
                    if let Some(name) = &def.name {
                        structs.insert(Rc::from(name.lexeme.as_str()), def);
                    }
                }
                TopLevelItem::Procedure(def) => {
                    procedures.insert(Rc::from(def.name.lexeme.as_str()), def);
                }
                TopLevelItem::Css(def) => css_defs.push((def, file.path.as_str())),
                TopLevelItem::CssConfig(def) => {
                    if let Some(name) = &def.name {
                        css_configs.insert(Rc::from(name.lexeme.as_str()), def);
                    }
                }
                TopLevelItem::Statement(_) => {}
            }
        }
    }

    let mut component_fields: FxHashMap<Rc<str>, &[StructField]> = FxHashMap::default();
    for (name, def) in &components {
        let fields: &[StructField] = match &def.properties {
            Some(props) => &props.fields,
            None => structs.get(name).map(|s| s.fields.as_slice()).unwrap_or(&[]),
        };
        component_fields.insert(name.clone(), fields);
    }

    let mut evaluator = Evaluator::new(components, component_fields, procedures);
    let mut global = Scope::root();

    if let Some(config_file) = files.iter().find(|f| is_config_file(&f.path)) {
        evaluator.set_file(&config_file.path);
        let stmts: Vec<Stmt> = config_file.items.iter().filter_map(top_level_stmt).cloned().collect();
        evaluator.eval_top_level(&Block { statements: stmts, span: config_file.span }, &mut global);
    }

    let config_string = |scope: &Scope, key: &str| match scope.lookup(key) {
        Some(Value::String(s)) => Some(s.to_string()),
        _ => None,
    };
    let template_output_directory = config_string(&global, "template_output_directory");
    let css_output_directory = config_string(&global, "css_output_directory");

    let mut templates = Vec::new();
    for file in files {
        if is_config_file(&file.path) {
            continue;
        }
        let stmts: Vec<Stmt> = file.items.iter().filter_map(top_level_stmt).cloned().collect();
        if stmts.is_empty() {
            continue;
        }
        evaluator.set_file(&file.path);
        let mut file_scope = std::mem::take(&mut global).child();
        let nodes = evaluator.eval_top_level(&Block { statements: stmts, span: file.span }, &mut file_scope);
        global = file_scope.pop();
        if !nodes.is_empty() {
            templates.push((file.path.clone(), HtmlValue::Fragment(nodes)));
        }
    }

    let mut sheets = Vec::new();
    for (def, path) in &css_defs {
        evaluator.set_file(path);
        let mut sheet_scope = std::mem::take(&mut global).child();
        if let Some(name) = &def.name {
            if let Some(config) = css_configs.get(name.lexeme.as_str()) {
                for entry in &config.entries {
                    if let Some(value) = evaluator.eval_expr(&entry.value, &mut sheet_scope) {
                        sheet_scope.declare(entry.name.lexeme.clone(), value);
                    }
                }
            }
        }
        let sheet = css::evaluate_css_definition(def, path, &mut sheet_scope);
        global = sheet_scope.pop();
        sheets.push(sheet);
    }

    let diagnostics = evaluator.into_diagnostics();
    if !diagnostics.is_empty() {
        return Err(diagnostics);
    }

    let roots: Vec<&HtmlValue> = templates.iter().map(|(_, root)| root).collect();
    for sheet in &mut sheets {
        sheet.nodes = sheet.nodes.drain(..).filter_map(|node| prune_unused(node, &roots)).collect();
    }

    let template_outputs = templates
        .into_iter()
        .map(|(path, root)| TemplateOutput {
            path,
            html: render_html(&root),
        })
        .collect();

    let mut css_output = String::new();
    for sheet in &sheets {
        css_output.push_str("/* ");
        css_output.push_str(if sheet.name.is_empty() { "anonymous" } else { &sheet.name });
        css_output.push_str(" */\n");
        css_output.push_str(&render_css(&sheet.nodes));
        css_output.push('\n');
    }

    Ok(EvaluatedProject {
        templates: template_outputs,
        css: css_output,
        template_output_directory,
        css_output_directory,
    })
}

fn top_level_stmt(item: &TopLevelItem) -> Option<&Stmt> {
    match item {
        TopLevelItem::Statement(stmt) => Some(stmt),
        _ => None,
    }
}

/// Drops selectors unmatched by any rendered template, then drops rules
/// and `@`-wrappers left with nothing under them (source: `evaluator/css.go`'s
/// `optimizeAndReturnUsedCSS`, simplified to search across every rendered
/// template rather than per-component instance sets -- see DESIGN.md).
fn prune_unused(node: CssNodeValue, roots: &[&HtmlValue]) -> Option<CssNodeValue> {
    match node {
        CssNodeValue::Rule { selectors, properties, nested } => {
            let selectors: Vec<CssSelectorValue> = selectors
                .into_iter()
                .filter(|selector| !selector_match::is_degenerate(selector))
                .filter(|selector| roots.iter().any(|root| selector_match::has_match_recursive(root, selector)))
                .collect();
            let nested: Vec<CssNodeValue> = nested.into_iter().filter_map(|n| prune_unused(n, roots)).collect();
            if selectors.is_empty() && nested.is_empty() {
                None
            } else {
                Some(CssNodeValue::Rule { selectors, properties, nested })
            }
        }
        CssNodeValue::AtRule { keyword, nested } => {
            let nested: Vec<CssNodeValue> = nested.into_iter().filter_map(|n| prune_unused(n, roots)).collect();
            if nested.is_empty() {
                None
            } else {
                Some(CssNodeValue::AtRule { keyword, nested })
            }
        }
    }
}
