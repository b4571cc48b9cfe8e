use fel_common::{Span, Token};

use super::{Block, Expression, NodeId, Stmt, TypeRef};

/// One field of an `:: html` component's leading declarations or a
/// top-level `:: struct` (source: `ast.HTMLProperties.Statements
/// []*DeclareStatement` -- both shapes reuse the same
/// `name : Type [= default]` grammar).
#[derive(Debug, Clone)]
pub struct StructField {
    pub name: Token,
    pub type_ref: TypeRef,
    pub default: Option<Expression>,
    pub span: Span,
}

/// `Name :: struct { field : Type [= default] … }`.
#[derive(Debug, Clone)]
pub struct StructDefinition {
    pub name: Option<Token>,
    pub fields: Vec<StructField>,
    pub span: Span,
}

/// A component's field shape: the run of typed declarations at the head
/// of an `:: html` body (source: `ast.HTMLProperties`), an alternative to
/// referencing a same-named top-level `:: struct`.
#[derive(Debug, Clone)]
pub struct HtmlProperties {
    pub fields: Vec<StructField>,
    pub span: Span,
}

/// `Name :: html { [field : Type [= default] …] … }` -- any leading typed
/// declarations become `properties`; the rest of the block is `body`.
#[derive(Debug, Clone)]
pub struct HtmlComponentDefinition {
    pub name: Option<Token>,
    pub properties: Option<HtmlProperties>,
    pub body: Block,
    pub span: Span,
}

/// `Tag(attr=expr, …) { children }` -- either a primitive HTML5 element or
/// an invocation of an `:: html` component, disambiguated by the type
/// checker (spec.md §4.4).
#[derive(Debug, Clone)]
pub struct HtmlNode {
    pub id: NodeId,
    pub tag: Token,
    pub attributes: Vec<HtmlAttribute>,
    pub body: Vec<Stmt>,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub struct HtmlAttribute {
    pub name: Token,
    pub value: Expression,
}

/// `Name :: (params) -> Ret { … }`.
#[derive(Debug, Clone)]
pub struct ProcedureDefinition {
    pub name: Token,
    pub params: Vec<super::Parameter>,
    pub return_type: Option<TypeRef>,
    pub body: Block,
    pub span: Span,
}
