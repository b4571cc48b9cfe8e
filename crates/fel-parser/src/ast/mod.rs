//! AST node definitions.
//!
//! The source language models every node behind one `Nodes() []Node`
//! interface method; we re-model that as a plain tagged sum type with a
//! `children()` accessor per spec.md §9 ("Polymorphism over AST") -- pattern
//! matching instead of a vtable. Nodes hold no back-references to sibling
//! definitions or derived data (dependency sets, resolved types); those are
//! owned by `fel-typeck`'s side tables, keyed by [`NodeId`] or by name, so
//! the AST stays an arena of plain values (spec.md §9, "Cyclic AST/graph
//! shapes").

mod css;
mod expr;
mod html;

pub use css::*;
pub use expr::*;
pub use html::*;

use fel_common::{Span, Token};

/// Identifies an AST node that the type checker annotates out-of-line
/// (its resolved [`fel_typeck`]-owned `TypeInfo`, or an `HTMLDefinition`
/// back-reference). Assigned sequentially by the parser.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub u32);

/// A parsed source file: config.fel, a template, or a definitions file.
/// All three use the same grammar (spec.md §6).
#[derive(Debug, Clone)]
pub struct File {
    pub path: String,
    pub items: Vec<TopLevelItem>,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub enum TopLevelItem {
    Html(HtmlComponentDefinition),
    Css(CssDefinition),
    CssConfig(CssConfigDefinition),
    Struct(StructDefinition),
    Procedure(ProcedureDefinition),
    Statement(Stmt),
}

#[derive(Debug, Clone)]
pub struct Block {
    pub statements: Vec<Stmt>,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub enum Stmt {
    Declare(DeclareStatement),
    Op(OpStatement),
    ArrayAppend(ArrayAppendStatement),
    If(IfStatement),
    For(ForStatement),
    Return(ReturnStatement),
    Html(HtmlNode),
    Expr(Expression),
}

impl Stmt {
    pub fn span(&self) -> Span {
        match self {
            Stmt::Declare(s) => s.span,
            Stmt::Op(s) => s.span,
            Stmt::ArrayAppend(s) => s.span,
            Stmt::If(s) => s.span,
            Stmt::For(s) => s.span,
            Stmt::Return(s) => s.span,
            Stmt::Html(s) => s.span,
            Stmt::Expr(s) => s.span,
        }
    }
}

/// `name := expr` (inferred) or `name : Type [= expr]` (declared).
#[derive(Debug, Clone)]
pub struct DeclareStatement {
    pub name: Token,
    pub declared_type: Option<TypeRef>,
    pub value: Option<Expression>,
    pub span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpKind {
    Assign,
    AddAssign,
    SubAssign,
    MulAssign,
    DivAssign,
}

/// `lhs = expr`, `lhs += expr`, etc. `lhs` is a dotted path.
#[derive(Debug, Clone)]
pub struct OpStatement {
    pub target: TokenList,
    pub op: OpKind,
    pub value: Expression,
    pub span: Span,
}

/// `name []= expr`.
#[derive(Debug, Clone)]
pub struct ArrayAppendStatement {
    pub target: TokenList,
    pub value: Expression,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub struct IfStatement {
    pub condition: Expression,
    pub then_block: Block,
    pub else_branch: Option<Box<ElseBranch>>,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub enum ElseBranch {
    If(IfStatement),
    Block(Block),
}

/// `for [i,] name : arrayExpr { … }`.
#[derive(Debug, Clone)]
pub struct ForStatement {
    pub index_name: Option<Token>,
    pub item_name: Token,
    pub array: Expression,
    pub body: Block,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub struct ReturnStatement {
    pub value: Option<Expression>,
    pub span: Span,
}

/// A type reference: a name plus an array nesting depth, e.g. `int`,
/// `string[]`, `string[][]` (depth 2).
#[derive(Debug, Clone)]
pub struct TypeRef {
    pub name: Token,
    pub array_depth: u32,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub struct Parameter {
    pub name: Token,
    pub type_ref: TypeRef,
    pub span: Span,
}
