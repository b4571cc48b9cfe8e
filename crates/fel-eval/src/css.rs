use fel_parser::ast::{CssAttributeSelector, CssCombinator, CssDefinition, CssProperty, CssRule, CssRuleKind, CssSelector, CssSelectorPart};

use crate::scope::Scope;

/// A resolved selector part. Mirrors [`CssSelectorPart`] but with all
/// tokens reduced to owned strings, since by evaluation time the scanner's
/// lexeme/span bookkeeping is no longer needed -- only the printable/
/// matchable identity of each part (source: `evaluator/css.go`'s
/// `evaluateSelector`, which performs the same token -> `data.CSSSelectorPart`
/// reduction).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CssSelectorPartValue {
    Tag(String),
    Class(String),
    Id(String),
    Attribute { name: String, operator: Option<String>, value: Option<String> },
    Pseudo(String),
    AtKeyword(String),
    Number(String),
    Combinator(CssCombinator),
}

pub type CssSelectorValue = Vec<CssSelectorPartValue>;

/// A CSS rule after evaluation: selector lists already combined with every
/// enclosing rule's selectors (spec.md §4.5's nested-rule cartesian
/// product), property values with in-scope identifiers substituted, and
/// `@`-rules kept as a distinct wrapping node so rendering can still emit
/// `@media { … }` around its nested rules.
#[derive(Debug, Clone)]
pub enum CssNodeValue {
    Rule {
        selectors: Vec<CssSelectorValue>,
        properties: Vec<(String, String)>,
        nested: Vec<CssNodeValue>,
    },
    AtRule {
        keyword: String,
        nested: Vec<CssNodeValue>,
    },
}

impl CssNodeValue {
    /// All selector lists reachable in or below this node, used by the
    /// dead-CSS-rule pass to decide whether a rule has any surviving
    /// selector once unmatched ones are pruned.
    pub fn is_empty_rule(&self) -> bool {
        matches!(self, CssNodeValue::Rule { selectors, .. } if selectors.is_empty())
    }
}

/// `Name :: css { … }`, flattened into the rule tree the renderer and the
/// used-CSS pruning pass both walk (source: `evaluator/css.go`'s
/// `evaluateCSSDefinition`).
pub struct CssSheetValue {
    pub name: String,
    pub nodes: Vec<CssNodeValue>,
}

pub fn evaluate_css_definition(def: &CssDefinition, file_path: &str, scope: &mut Scope) -> CssSheetValue {
    let name = def.name.as_ref().map(|t| t.lexeme.clone()).unwrap_or_else(|| file_path.to_string());
    let nodes = def.rules.iter().map(|rule| evaluate_rule(rule, None, scope)).collect();
    CssSheetValue { name, nodes }
}

fn evaluate_rule(rule: &CssRule, parent_selectors: Option<&[CssSelectorValue]>, scope: &mut Scope) -> CssNodeValue {
    match rule.kind {
        CssRuleKind::Rule => {
            let own: Vec<CssSelectorValue> = rule.selectors.iter().map(evaluate_selector).collect();
            let combined = combine_selectors(parent_selectors, &own);
            let properties = rule.properties.iter().map(|p| evaluate_property(p, scope)).collect();
            let nested = rule.nested.iter().map(|n| evaluate_rule(n, Some(&combined), scope)).collect();
            CssNodeValue::Rule {
                selectors: combined,
                properties,
                nested,
            }
        }
        CssRuleKind::AtKeyword => {
            let keyword = rule.at_keyword.as_ref().map(|t| t.lexeme.clone()).unwrap_or_default();
            let mut nested: Vec<CssNodeValue> = rule.nested.iter().map(|n| evaluate_rule(n, parent_selectors, scope)).collect();
            // Bare declarations directly inside an `@`-block (no nested
            // selector of their own) inherit whatever selector list was in
            // scope above them.
            if !rule.properties.is_empty() {
                let properties = rule.properties.iter().map(|p| evaluate_property(p, scope)).collect();
                nested.push(CssNodeValue::Rule {
                    selectors: parent_selectors.map(<[_]>::to_vec).unwrap_or_default(),
                    properties,
                    nested: Vec::new(),
                });
            }
            CssNodeValue::AtRule { keyword, nested }
        }
    }
}

/// Nested rules combine with every enclosing selector via an implicit
/// descendant combinator (spec.md §4.5); a rule with no enclosing selector
/// (top-level) keeps its own selectors unchanged.
fn combine_selectors(parent: Option<&[CssSelectorValue]>, own: &[CssSelectorValue]) -> Vec<CssSelectorValue> {
    match parent {
        None => own.to_vec(),
        Some(parents) => parents
            .iter()
            .flat_map(|p| {
                own.iter().map(move |o| {
                    let mut combined = p.clone();
                    combined.push(CssSelectorPartValue::Combinator(CssCombinator::Ancestor));
                    combined.extend(o.iter().cloned());
                    combined
                })
            })
            .collect(),
    }
}

fn evaluate_selector(selector: &CssSelector) -> CssSelectorValue {
    selector.parts.iter().map(evaluate_selector_part).collect()
}

fn evaluate_selector_part(part: &CssSelectorPart) -> CssSelectorPartValue {
    match part {
        CssSelectorPart::Tag(tok) => CssSelectorPartValue::Tag(tok.lexeme.clone()),
        CssSelectorPart::Class(tok) => CssSelectorPartValue::Class(tok.lexeme.clone()),
        CssSelectorPart::Id(tok) => CssSelectorPartValue::Id(tok.lexeme.clone()),
        CssSelectorPart::Pseudo(tok) => CssSelectorPartValue::Pseudo(tok.lexeme.clone()),
        CssSelectorPart::AtKeyword(tok) => CssSelectorPartValue::AtKeyword(tok.lexeme.clone()),
        CssSelectorPart::Number(tok) => CssSelectorPartValue::Number(tok.lexeme.clone()),
        CssSelectorPart::Combinator(c) => CssSelectorPartValue::Combinator(*c),
        CssSelectorPart::Attribute(attr) => evaluate_attribute_selector(attr),
    }
}

fn evaluate_attribute_selector(attr: &CssAttributeSelector) -> CssSelectorPartValue {
    CssSelectorPartValue::Attribute {
        name: attr.name.lexeme.clone(),
        operator: attr.operator.as_ref().map(|t| t.lexeme.clone()),
        value: attr.value.as_ref().map(|t| t.lexeme.clone()),
    }
}

/// Renders a property's raw value tokens to a single string, substituting
/// any identifier token that names an in-scope variable with that
/// variable's rendered value (spec.md §4.5; source: `evaluator/css.go`'s
/// identifier-substitution loop in `evaluateCSSRule`).
fn evaluate_property(prop: &CssProperty, scope: &Scope) -> (String, String) {
    let mut parts = Vec::with_capacity(prop.value_tokens.len());
    for tok in &prop.value_tokens {
        match tok.kind {
            fel_common::TokenKind::Identifier | fel_common::TokenKind::InteropVar => match scope.lookup(&tok.lexeme) {
                Some(value) => parts.push(value.render()),
                None => parts.push(tok.lexeme.clone()),
            },
            fel_common::TokenKind::String => parts.push(crate::unquote(&tok.lexeme).to_string()),
            _ => parts.push(tok.lexeme.clone()),
        }
    }
    (prop.name.lexeme.clone(), parts.join(" "))
}
