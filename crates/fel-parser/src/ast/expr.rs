use fel_common::{Span, Token};

use super::NodeId;

/// An expression, stored as the postfix token/operand sequence the parser's
/// precedence-climbing pass produces (spec.md §4.2) rather than as a tree --
/// the evaluator and type checker both walk it with a small value/type
/// stack (spec.md §9, "Stack-based expression interpretation").
#[derive(Debug, Clone)]
pub struct Expression {
    pub id: NodeId,
    pub postfix: Vec<PostfixItem>,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub enum PostfixItem {
    Operand(Operand),
    /// A binary operator; pops two values/types, pushes one.
    Operator(Token),
    /// A prefix operator (`!`, unary `-`) kept distinct from [`Operator`]
    /// so the postfix walker in typeck/eval knows to pop one operand, not
    /// two, without having to special-case shared token kinds like `-`.
    UnaryOperator(Token),
}

#[derive(Debug, Clone)]
pub enum Operand {
    /// String/number/true/false literal token.
    Literal(Token),
    /// A single bare identifier (no dots).
    Identifier(Token),
    /// A dotted path `a.b.c`, e.g. struct field access.
    Path(TokenList),
    Call(Call),
    Struct(StructLiteral),
    Array(ArrayLiteral),
}

/// An ordered dotted path of identifier tokens, `a.b.c` (spec.md §4.2).
#[derive(Debug, Clone)]
pub struct TokenList {
    pub id: NodeId,
    pub tokens: Vec<Token>,
    pub span: Span,
}

/// `Name(args, …)` -- a procedure call.
#[derive(Debug, Clone)]
pub struct Call {
    pub id: NodeId,
    pub name: Token,
    pub args: Vec<Expression>,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub struct StructLiteralField {
    pub name: Token,
    pub value: Expression,
}

#[derive(Debug, Clone)]
pub struct StructLiteral {
    pub id: NodeId,
    pub type_name: Option<Token>,
    pub fields: Vec<StructLiteralField>,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub struct ArrayLiteral {
    pub id: NodeId,
    pub elements: Vec<Expression>,
    pub span: Span,
}
