//! Scanner for the FEL templating language.
//!
//! Converts source text into a restartable, peekable stream of [`Token`]s
//! with byte/line/column positions attached (spec.md §4.1). Structurally
//! invalid input -- an embedded NUL, a byte-order-mark after position 0, or
//! an unterminated string/comment -- is fatal and short-circuits the whole
//! stage; everything else (an unrecognized character) is handed back as an
//! `Unknown` token for the parser to turn into an ordinary diagnostic.

mod cursor;

use cursor::Cursor;
use fel_common::{keyword_from_str, Diagnostic, Span, Token, TokenKind};

const BYTE_ORDER_MARK: char = '\u{FEFF}';

/// The FEL scanner. Wraps a [`Cursor`] and produces tokens on demand.
pub struct Lexer<'src> {
    cursor: Cursor<'src>,
    line: u32,
    line_start_pos: u32,
    emitted_eof: bool,
}

impl<'src> Lexer<'src> {
    pub fn new(source: &'src str) -> Self {
        Self {
            cursor: Cursor::new(source),
            line: 1,
            line_start_pos: 0,
            emitted_eof: false,
        }
    }

    /// Tokenize the entire source, stopping (and returning the fatal
    /// diagnostic) at the first structurally invalid construct. On
    /// success the returned vector's last token is always `Eof`.
    pub fn tokenize(source: &str) -> Result<Vec<Token>, Diagnostic> {
        let mut lexer = Lexer::new(source);
        let mut tokens = Vec::new();
        loop {
            let tok = lexer.next_token()?;
            let is_eof = tok.kind == TokenKind::Eof;
            tokens.push(tok);
            if is_eof {
                break;
            }
        }
        Ok(tokens)
    }

    /// Produce the next token without consuming lexer state permanently;
    /// restores position/line on return. Used by the parser for one-token
    /// lookahead (e.g. detecting `Name ::` definition headers).
    pub fn peek_token(&mut self) -> Result<Token, Diagnostic> {
        let saved_cursor = self.cursor.clone();
        let saved_line = self.line;
        let saved_line_start = self.line_start_pos;
        let saved_eof = self.emitted_eof;
        let result = self.next_token();
        self.cursor = saved_cursor;
        self.line = saved_line;
        self.line_start_pos = saved_line_start;
        self.emitted_eof = saved_eof;
        result
    }

    /// Produce the next token, consuming lexer state. The parser calls this
    /// once to prime its first lookahead token and again on every advance.
    pub fn next_token(&mut self) -> Result<Token, Diagnostic> {
        if self.emitted_eof {
            return Ok(self.make(TokenKind::Eof, self.cursor.pos(), self.cursor.pos()));
        }

        self.skip_trivia()?;

        let start = self.cursor.pos();
        let Some(c) = self.cursor.peek() else {
            self.emitted_eof = true;
            return Ok(self.make(TokenKind::Eof, start, start));
        };

        if c == '\0' {
            return Err(Diagnostic::fatal(Span::point(start), "illegal NUL byte in source"));
        }
        if c == BYTE_ORDER_MARK && start != 0 {
            return Err(Diagnostic::fatal(
                Span::point(start),
                "illegal byte-order-mark; only permitted as the very first character",
            ));
        }

        match c {
            '\n' => {
                self.cursor.advance();
                self.newline(start);
                Ok(self.make(TokenKind::Newline, start, self.cursor.pos()))
            }
            '\r' => {
                self.cursor.advance();
                if self.cursor.peek() == Some('\n') {
                    self.cursor.advance();
                }
                self.newline(start);
                Ok(self.make(TokenKind::Newline, start, self.cursor.pos()))
            }
            '(' => Ok(self.single(TokenKind::LParen, start)),
            ')' => Ok(self.single(TokenKind::RParen, start)),
            '{' => Ok(self.single(TokenKind::LBrace, start)),
            '}' => Ok(self.single(TokenKind::RBrace, start)),
            '[' => Ok(self.single(TokenKind::LBracket, start)),
            ']' => Ok(self.single(TokenKind::RBracket, start)),
            ',' => Ok(self.single(TokenKind::Comma, start)),
            ';' => Ok(self.single(TokenKind::Semicolon, start)),
            '@' => Ok(self.single(TokenKind::At, start)),
            '~' => Ok(self.single(TokenKind::Tilde, start)),
            '#' => Ok(self.single(TokenKind::Hash, start)),
            '%' => Ok(self.single(TokenKind::Percent, start)),
            ':' => Ok(self.lex_colon(start)),
            '+' => Ok(self.lex_two(TokenKind::Plus, '=', TokenKind::PlusEq, start)),
            '-' => Ok(self.lex_minus(start)),
            '*' => Ok(self.lex_two(TokenKind::Star, '=', TokenKind::StarEq, start)),
            '/' => Ok(self.lex_two(TokenKind::Slash, '=', TokenKind::SlashEq, start)),
            '=' => Ok(self.lex_two(TokenKind::Eq, '=', TokenKind::EqEq, start)),
            '!' => Ok(self.lex_two(TokenKind::Bang, '=', TokenKind::NotEq, start)),
            '<' => Ok(self.lex_two(TokenKind::Lt, '=', TokenKind::LtEq, start)),
            '>' => Ok(self.lex_two(TokenKind::Gt, '=', TokenKind::GtEq, start)),
            '&' => Ok(self.lex_double_or_unknown('&', TokenKind::AmpAmp, start)),
            '|' => Ok(self.lex_double_or_unknown('|', TokenKind::PipePipe, start)),
            '$' => self.lex_interop(start),
            '"' | '`' => self.lex_string(c, start),
            '.' => Ok(self.lex_dot(start)),
            '0'..='9' => Ok(self.lex_number(start)),
            c if is_ident_start(c) => Ok(self.lex_ident(start)),
            _ => {
                self.cursor.advance();
                Ok(self.make(TokenKind::Unknown, start, self.cursor.pos()))
            }
        }
    }

    fn newline(&mut self, start: u32) {
        self.line += 1;
        self.line_start_pos = start + 1;
    }

    // `line`/`line_start_pos` always describe the position of `start`,
    // since every character-consuming helper below advances them in lockstep
    // with the cursor before the next token begins.
    fn make(&self, kind: TokenKind, start: u32, end: u32) -> Token {
        let lexeme = self.cursor.slice(start, end).to_string();
        let column = start - self.line_start_pos + 1;
        Token::new(kind, lexeme, self.line, column, Span::new(start, end))
    }

    fn single(&mut self, kind: TokenKind, start: u32) -> Token {
        self.cursor.advance();
        self.make(kind, start, self.cursor.pos())
    }

    fn lex_two(&mut self, alone: TokenKind, second: char, pair: TokenKind, start: u32) -> Token {
        self.cursor.advance(); // consume the first character
        if self.cursor.peek() == Some(second) {
            self.cursor.advance();
            self.make(pair, start, self.cursor.pos())
        } else {
            self.make(alone, start, self.cursor.pos())
        }
    }

    /// `-` -> Minus, `-=` -> MinusEq, `->` -> Arrow (procedure return type).
    fn lex_minus(&mut self, start: u32) -> Token {
        self.cursor.advance();
        match self.cursor.peek() {
            Some('=') => {
                self.cursor.advance();
                self.make(TokenKind::MinusEq, start, self.cursor.pos())
            }
            Some('>') => {
                self.cursor.advance();
                self.make(TokenKind::Arrow, start, self.cursor.pos())
            }
            _ => self.make(TokenKind::Minus, start, self.cursor.pos()),
        }
    }

    fn lex_double_or_unknown(&mut self, c: char, pair: TokenKind, start: u32) -> Token {
        self.cursor.advance();
        if self.cursor.peek() == Some(c) {
            self.cursor.advance();
            self.make(pair, start, self.cursor.pos())
        } else {
            self.make(TokenKind::Unknown, start, self.cursor.pos())
        }
    }

    /// `:` -> Declare, `::` -> Define, `:=` -> DeclareSet.
    fn lex_colon(&mut self, start: u32) -> Token {
        self.cursor.advance();
        match self.cursor.peek() {
            Some(':') => {
                self.cursor.advance();
                self.make(TokenKind::Define, start, self.cursor.pos())
            }
            Some('=') => {
                self.cursor.advance();
                self.make(TokenKind::DeclareSet, start, self.cursor.pos())
            }
            _ => self.make(TokenKind::Declare, start, self.cursor.pos()),
        }
    }

    /// `.` alone (not followed by a digit) -> Dot.
    fn lex_dot(&mut self, start: u32) -> Token {
        if self.cursor.peek_next().is_some_and(|c| c.is_ascii_digit()) {
            return self.lex_number(start);
        }
        self.cursor.advance();
        self.make(TokenKind::Dot, start, self.cursor.pos())
    }

    /// Digits, with at most one `.`, per spec.md §4.1.
    fn lex_number(&mut self, start: u32) -> Token {
        let mut seen_dot = false;
        if self.cursor.peek() == Some('.') {
            seen_dot = true;
            self.cursor.advance();
        }
        self.cursor.eat_while(|c| c.is_ascii_digit());
        loop {
            if !seen_dot
                && self.cursor.peek() == Some('.')
                && self.cursor.peek_next().is_some_and(|c| c.is_ascii_digit())
            {
                seen_dot = true;
                self.cursor.advance();
                self.cursor.eat_while(|c| c.is_ascii_digit());
            } else {
                break;
            }
        }
        self.make(TokenKind::Number, start, self.cursor.pos())
    }

    /// `$identifier` -- the `$` is skipped, lexeme is just the identifier.
    fn lex_interop(&mut self, start: u32) -> Result<Token, Diagnostic> {
        self.cursor.advance(); // consume '$'
        let ident_start = self.cursor.pos();
        self.cursor.eat_while(is_ident_continue);
        if self.cursor.pos() == ident_start {
            return Ok(self.make(TokenKind::Unknown, start, self.cursor.pos()));
        }
        Ok(self.make(TokenKind::InteropVar, ident_start, self.cursor.pos()))
    }

    /// Raw string content between matching `"` or `` ` `` delimiters; no
    /// escape processing (spec.md §4.1). Unterminated is fatal.
    fn lex_string(&mut self, delim: char, start: u32) -> Result<Token, Diagnostic> {
        self.cursor.advance(); // consume opening delimiter
        loop {
            match self.cursor.peek() {
                None => {
                    return Err(Diagnostic::fatal(
                        Span::new(start, self.cursor.pos()),
                        "unterminated string literal",
                    ))
                }
                Some(c) if c == delim => {
                    self.cursor.advance();
                    break;
                }
                Some(c) if c == '\0' => {
                    return Err(Diagnostic::fatal(Span::point(self.cursor.pos()), "illegal NUL byte in string"))
                }
                Some(c) => {
                    if c == '\n' {
                        let nl_start = self.cursor.pos();
                        self.cursor.advance();
                        self.newline(nl_start);
                    } else {
                        self.cursor.advance();
                    }
                }
            }
        }
        Ok(self.make(TokenKind::String, start, self.cursor.pos()))
    }

    /// Identifiers start with `\`, `_`, or a letter; continue with
    /// letters/digits/`\`/`-`/`_`/`.`. Reclassified against the keyword
    /// table after capture.
    fn lex_ident(&mut self, start: u32) -> Token {
        self.cursor.advance();
        self.cursor.eat_while(is_ident_continue);
        let text = self.cursor.slice(start, self.cursor.pos());
        let kind = keyword_from_str(text).unwrap_or(TokenKind::Identifier);
        self.make(kind, start, self.cursor.pos())
    }

    /// Skip whitespace (not newlines), `//` line comments, and nested
    /// `/* */` block comments.
    fn skip_trivia(&mut self) -> Result<(), Diagnostic> {
        loop {
            self.cursor.eat_while(|c| c == ' ' || c == '\t');
            match (self.cursor.peek(), self.cursor.peek_next()) {
                (Some('/'), Some('/')) => {
                    self.cursor.advance();
                    self.cursor.advance();
                    self.cursor.eat_while(|c| c != '\n' && c != '\r');
                }
                (Some('/'), Some('*')) => {
                    let start = self.cursor.pos();
                    self.cursor.advance();
                    self.cursor.advance();
                    self.skip_block_comment(start, 1)?;
                }
                _ => break,
            }
        }
        Ok(())
    }

    fn skip_block_comment(&mut self, start: u32, mut depth: u32) -> Result<(), Diagnostic> {
        while depth > 0 {
            match self.cursor.peek() {
                None => {
                    return Err(Diagnostic::fatal(
                        Span::new(start, self.cursor.pos()),
                        "unterminated block comment",
                    ))
                }
                Some('\n') => {
                    let nl_start = self.cursor.pos();
                    self.cursor.advance();
                    self.newline(nl_start);
                }
                Some('/') if self.cursor.peek_next() == Some('*') => {
                    self.cursor.advance();
                    self.cursor.advance();
                    depth += 1;
                }
                Some('*') if self.cursor.peek_next() == Some('/') => {
                    self.cursor.advance();
                    self.cursor.advance();
                    depth -= 1;
                }
                Some(_) => {
                    self.cursor.advance();
                }
            }
        }
        Ok(())
    }
}

fn is_ident_start(c: char) -> bool {
    c == '\\' || c == '_' || c.is_alphabetic()
}

fn is_ident_continue(c: char) -> bool {
    c.is_alphanumeric() || c == '\\' || c == '-' || c == '_' || c == '.'
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<TokenKind> {
        Lexer::tokenize(source)
            .expect("tokenize")
            .into_iter()
            .map(|t| t.kind)
            .collect()
    }

    #[test]
    fn lex_definition_header() {
        assert_eq!(
            kinds("Button :: html { }"),
            vec![
                TokenKind::Identifier,
                TokenKind::Define,
                TokenKind::KwHtml,
                TokenKind::LBrace,
                TokenKind::RBrace,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn lex_declare_set_and_declare() {
        assert_eq!(
            kinds("x := 1\ny : int"),
            vec![
                TokenKind::Identifier,
                TokenKind::DeclareSet,
                TokenKind::Number,
                TokenKind::Newline,
                TokenKind::Identifier,
                TokenKind::Declare,
                TokenKind::Identifier,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn lex_string_raw_backtick_with_quotes() {
        let tokens = Lexer::tokenize(r#"`has "quotes" inside`"#).unwrap();
        assert_eq!(tokens[0].kind, TokenKind::String);
        assert_eq!(tokens[0].lexeme, r#"`has "quotes" inside`"#);
    }

    #[test]
    fn lex_number_trailing_dot() {
        let tokens = Lexer::tokenize("1.").unwrap();
        assert_eq!(tokens[0].kind, TokenKind::Number);
        assert_eq!(tokens[0].lexeme, "1.");
    }

    #[test]
    fn lex_dot_not_followed_by_digit() {
        assert_eq!(kinds("a.b"), vec![
            TokenKind::Identifier,
            TokenKind::Dot,
            TokenKind::Identifier,
            TokenKind::Eof,
        ]);
    }

    #[test]
    fn lex_nested_block_comment() {
        assert_eq!(kinds("/* outer /* inner */ still */ x"), vec![TokenKind::Identifier, TokenKind::Eof]);
    }

    #[test]
    fn lex_unterminated_string_is_fatal() {
        let err = Lexer::tokenize(r#""oops"#).unwrap_err();
        assert!(err.is_fatal());
    }

    #[test]
    fn lex_unterminated_block_comment_is_fatal() {
        let err = Lexer::tokenize("/* never closes").unwrap_err();
        assert!(err.is_fatal());
    }

    #[test]
    fn lex_nul_is_fatal() {
        let err = Lexer::tokenize("a\0b").unwrap_err();
        assert!(err.is_fatal());
    }

    #[test]
    fn lex_interop_variable() {
        let tokens = Lexer::tokenize("$siteName").unwrap();
        assert_eq!(tokens[0].kind, TokenKind::InteropVar);
        assert_eq!(tokens[0].lexeme, "siteName");
    }

    #[test]
    fn lex_logical_operators() {
        assert_eq!(kinds("a && b || !c"), vec![
            TokenKind::Identifier,
            TokenKind::AmpAmp,
            TokenKind::Identifier,
            TokenKind::PipePipe,
            TokenKind::Bang,
            TokenKind::Identifier,
            TokenKind::Eof,
        ]);
    }

    #[test]
    fn lex_newline_is_significant() {
        assert_eq!(kinds("a\nb"), vec![
            TokenKind::Identifier,
            TokenKind::Newline,
            TokenKind::Identifier,
            TokenKind::Eof,
        ]);
    }

    #[test]
    fn lex_procedure_return_arrow() {
        assert_eq!(kinds("(a : int) -> int"), vec![
            TokenKind::LParen,
            TokenKind::Identifier,
            TokenKind::Declare,
            TokenKind::Identifier,
            TokenKind::RParen,
            TokenKind::Arrow,
            TokenKind::Identifier,
            TokenKind::Eof,
        ]);
    }

    #[test]
    fn lex_css_combinators() {
        assert_eq!(kinds("> ~ @media"), vec![
            TokenKind::Gt,
            TokenKind::Tilde,
            TokenKind::At,
            TokenKind::Identifier,
            TokenKind::Eof,
        ]);
    }
}
