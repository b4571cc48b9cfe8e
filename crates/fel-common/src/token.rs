use serde::Serialize;

use crate::span::Span;

/// A token produced by the FEL scanner.
///
/// `lexeme` is a slice of the original source; `line`/`column` are 1-based
/// and computed at scan time (cheaper than a [`crate::LineIndex`] lookup per
/// token since the scanner already tracks them incrementally).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Token {
    pub kind: TokenKind,
    pub lexeme: String,
    pub line: u32,
    pub column: u32,
    pub span: Span,
}

impl Token {
    pub fn new(kind: TokenKind, lexeme: impl Into<String>, line: u32, column: u32, span: Span) -> Self {
        Self {
            kind,
            lexeme: lexeme.into(),
            line,
            column,
            span,
        }
    }

    pub fn is_operator(&self) -> bool {
        matches!(
            self.kind,
            TokenKind::Plus
                | TokenKind::Minus
                | TokenKind::Star
                | TokenKind::Slash
                | TokenKind::Percent
                | TokenKind::EqEq
                | TokenKind::NotEq
                | TokenKind::Lt
                | TokenKind::Gt
                | TokenKind::LtEq
                | TokenKind::GtEq
                | TokenKind::AmpAmp
                | TokenKind::PipePipe
                | TokenKind::Bang
        )
    }
}

/// Every kind of token the FEL scanner produces.
///
/// A handful of kinds are deliberately shared between the "plain" language
/// grammar and the embedded CSS grammar (`Colon`/`DoubleColon`/`GreaterThan`)
/// -- the parser disambiguates them by context, exactly as the source
/// language's own grammar does (spec.md §4.1/§4.6).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum TokenKind {
    // ── Keywords ───────────────────────────────────────────────────────
    KwHtml,
    KwCss,
    KwCssConfig,
    KwStruct,
    KwIf,
    KwElse,
    KwFor,
    KwReturn,
    KwTrue,
    KwFalse,

    // ── Literals / identifiers ─────────────────────────────────────────
    String,
    Number,
    Identifier,
    /// `$name` -- the `$` is stripped, `lexeme` is just `name`.
    InteropVar,

    // ── Punctuation / definitions ───────────────────────────────────────
    LParen,
    RParen,
    LBrace,
    RBrace,
    LBracket,
    RBracket,
    Comma,
    Semicolon,
    Dot,
    /// `:`
    Declare,
    /// `::`
    Define,
    /// `:=`
    DeclareSet,
    /// `@` (start of an at-rule, e.g. `@media`)
    At,
    /// `~` (CSS general-sibling combinator)
    Tilde,
    /// `->` (procedure return-type arrow)
    Arrow,
    /// `#` (CSS id-selector prefix)
    Hash,

    // ── Operators ────────────────────────────────────────────────────────
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    Eq,
    EqEq,
    NotEq,
    Lt,
    /// Also CSS child combinator (`>`) in selector context.
    Gt,
    LtEq,
    GtEq,
    AmpAmp,
    PipePipe,
    Bang,
    PlusEq,
    MinusEq,
    StarEq,
    SlashEq,

    // ── Structural ───────────────────────────────────────────────────────
    Newline,
    Eof,
    Unknown,
}

/// Look up a keyword `TokenKind` for an identifier-shaped lexeme.
pub fn keyword_from_str(s: &str) -> Option<TokenKind> {
    Some(match s {
        "html" => TokenKind::KwHtml,
        "css" => TokenKind::KwCss,
        "css_config" => TokenKind::KwCssConfig,
        "struct" => TokenKind::KwStruct,
        "if" => TokenKind::KwIf,
        "else" => TokenKind::KwElse,
        "for" => TokenKind::KwFor,
        "return" => TokenKind::KwReturn,
        "true" => TokenKind::KwTrue,
        "false" => TokenKind::KwFalse,
        _ => return None,
    })
}
