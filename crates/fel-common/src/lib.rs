//! Shared types for the FEL compiler: source spans, tokens, and diagnostics.
//!
//! Every later stage (lexer, parser, typeck, eval) builds on these three
//! small modules so that positions and error reporting stay uniform across
//! the whole pipeline.

pub mod diagnostic;
pub mod span;
pub mod token;

pub use diagnostic::{Diagnostic, Label, Severity};
pub use span::{LineIndex, Span};
pub use token::{keyword_from_str, Token, TokenKind};
