use std::rc::Rc;

use rustc_hash::FxHashMap;

/// A runtime value produced while walking an expression's postfix sequence
/// (spec.md §9, "Stack-based expression interpretation" -- the evaluator
/// mirrors the type checker's stack walk but pushes values instead of
/// [`fel_typeck::TypeInfo`]).
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Int(i64),
    Float(f64),
    String(Rc<str>),
    Bool(bool),
    Array(Rc<Vec<Value>>),
    Struct(Rc<StructValue>),
    Html(Rc<HtmlValue>),
}

impl Value {
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::String(_) => "string",
            Value::Bool(_) => "bool",
            Value::Array(_) => "array",
            Value::Struct(_) => "struct",
            Value::Html(_) => "html",
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Renders a value for interpolation into HTML text or a CSS property
    /// value (source: `data.HTMLElement.String`/`evaluator/css.go`'s
    /// variable-substitution path both stringify bare values this way).
    pub fn render(&self) -> String {
        match self {
            Value::Int(n) => n.to_string(),
            Value::Float(f) => f.to_string(),
            Value::String(s) => s.to_string(),
            Value::Bool(b) => b.to_string(),
            Value::Array(items) => items.iter().map(Value::render).collect::<Vec<_>>().join(", "),
            Value::Struct(s) => format!("{{{}}}", s.type_name),
            Value::Html(_) => String::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct StructValue {
    pub type_name: Rc<str>,
    pub fields: FxHashMap<Rc<str>, Value>,
}

/// A constructed HTML node tree (source: `data.HTMLElement` / `HTMLKind`).
/// `Fragment` carries no tag of its own; its children splice directly into
/// whatever parent renders them -- this is how a component's implicit
/// `children` binding and multi-root component bodies both render without
/// an extra wrapper element.
#[derive(Debug, Clone, PartialEq)]
pub enum HtmlValue {
    Element {
        tag: Rc<str>,
        attributes: Vec<(Rc<str>, String)>,
        children: Vec<HtmlValue>,
    },
    Text(String),
    Fragment(Vec<HtmlValue>),
}

impl HtmlValue {
    pub fn tag_name(&self) -> Option<&str> {
        match self {
            HtmlValue::Element { tag, .. } => Some(tag),
            _ => None,
        }
    }

    pub fn class_attribute(&self) -> Option<&str> {
        match self {
            HtmlValue::Element { attributes, .. } => {
                attributes.iter().find(|(name, _)| name.as_ref() == "class").map(|(_, v)| v.as_str())
            }
            _ => None,
        }
    }

    pub fn children(&self) -> &[HtmlValue] {
        match self {
            HtmlValue::Element { children, .. } => children,
            HtmlValue::Fragment(children) => children,
            HtmlValue::Text(_) => &[],
        }
    }
}
