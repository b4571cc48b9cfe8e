//! Recursive-descent statement/definition parser.
//!
//! Expression parsing (precedence climbing) lives in [`expr`]; CSS-specific
//! grammar lives in [`css`]. Both are `impl Parser` blocks split into
//! separate files for readability, same type.

mod css;
mod expr;

use fel_common::{Diagnostic, Span, Token, TokenKind};
use fel_lexer::Lexer;

use crate::ast::*;

/// Parses one source file into a [`File`] AST, collecting diagnostics as it
/// goes. Fatal errors (lexer failures, mismatched parens, a malformed
/// definition header) short-circuit immediately via `Err`; everything else
/// is recorded in [`Parser::diagnostics`] and parsing continues so later
/// errors in the same file are also reported.
pub struct Parser<'src> {
    lexer: Lexer<'src>,
    current: Token,
    next_id: u32,
    diagnostics: Vec<Diagnostic>,
}

impl<'src> Parser<'src> {
    pub fn new(source: &'src str) -> Result<Self, Diagnostic> {
        let mut lexer = Lexer::new(source);
        let current = lexer.next_token()?;
        Ok(Self {
            lexer,
            current,
            next_id: 0,
            diagnostics: Vec::new(),
        })
    }

    pub fn parse_file(path: impl Into<String>, source: &'src str) -> Result<(File, Vec<Diagnostic>), Diagnostic> {
        let path = path.into();
        let mut parser = Parser::new(source)?;
        let start = parser.current.span;
        let mut items = Vec::new();
        parser.skip_separators();
        while !parser.at(TokenKind::Eof) {
            items.push(parser.parse_top_level_item()?);
            parser.skip_separators();
        }
        let span = Span::new(start.start, parser.current.span.end);
        Ok((File { path, items, span }, parser.diagnostics))
    }

    fn next_id(&mut self) -> NodeId {
        let id = NodeId(self.next_id);
        self.next_id += 1;
        id
    }

    fn error(&mut self, span: Span, message: impl Into<String>) {
        self.diagnostics.push(Diagnostic::error(span, message));
    }

    fn fatal(&self, span: Span, message: impl Into<String>) -> Diagnostic {
        Diagnostic::fatal(span, message)
    }

    fn at(&self, kind: TokenKind) -> bool {
        self.current.kind == kind
    }

    fn advance(&mut self) -> Result<Token, Diagnostic> {
        let tok = self.current.clone();
        self.current = self.lexer.next_token()?;
        Ok(tok)
    }

    fn peek_ahead(&mut self) -> Result<Token, Diagnostic> {
        self.lexer.peek_token()
    }

    fn expect(&mut self, kind: TokenKind, what: &str) -> Result<Token, Diagnostic> {
        if self.current.kind == kind {
            self.advance()
        } else {
            Err(self.fatal(
                self.current.span,
                format!("expected {what}, found {:?} {:?}", self.current.kind, self.current.lexeme),
            ))
        }
    }

    /// Skip blank-line / semicolon separators between statements.
    fn skip_separators(&mut self) {
        while matches!(self.current.kind, TokenKind::Newline | TokenKind::Semicolon) {
            let _ = self.advance();
        }
    }

    fn is_statement_end(&self) -> bool {
        matches!(
            self.current.kind,
            TokenKind::Newline | TokenKind::Semicolon | TokenKind::RBrace | TokenKind::Eof
        )
    }

    // ── Top level ────────────────────────────────────────────────────────

    fn parse_top_level_item(&mut self) -> Result<TopLevelItem, Diagnostic> {
        if self.at(TokenKind::Identifier) && self.peek_ahead()?.kind == TokenKind::Define {
            let name = self.advance()?;
            return self.parse_definition(Some(name));
        }
        if self.at(TokenKind::Define) {
            // Anonymous `:: css { … }`; anonymous html/struct/css_config
            // parse the same way but are rejected later by the type
            // checker (spec.md §4.2).
            return self.parse_definition(None);
        }
        Ok(TopLevelItem::Statement(self.parse_statement()?))
    }

    fn parse_definition(&mut self, name: Option<Token>) -> Result<TopLevelItem, Diagnostic> {
        self.expect(TokenKind::Define, "`::`")?;
        match self.current.kind {
            TokenKind::KwHtml => Ok(TopLevelItem::Html(self.parse_html_definition(name)?)),
            TokenKind::KwCss => Ok(TopLevelItem::Css(self.parse_css_definition(name)?)),
            TokenKind::KwCssConfig => Ok(TopLevelItem::CssConfig(self.parse_css_config_definition(name)?)),
            TokenKind::KwStruct => Ok(TopLevelItem::Struct(self.parse_struct_definition(name)?)),
            TokenKind::LParen => {
                let name = name.ok_or_else(|| self.fatal(self.current.span, "procedure definitions must be named"))?;
                Ok(TopLevelItem::Procedure(self.parse_procedure_definition(name)?))
            }
            _ => Err(self.fatal(
                self.current.span,
                format!("expected `html`, `css`, `css_config`, `struct`, or `(` after `::`, found {:?}", self.current.kind),
            )),
        }
    }

    fn parse_html_definition(&mut self, name: Option<Token>) -> Result<HtmlComponentDefinition, Diagnostic> {
        let start = self.current.span;
        self.expect(TokenKind::KwHtml, "`html`")?;
        self.expect(TokenKind::LBrace, "`{`")?;
        let mut body = self.parse_block_until_rbrace()?;
        let end = self.expect(TokenKind::RBrace, "`}`")?;
        let properties = Self::split_leading_field_declarations(&mut body);
        Ok(HtmlComponentDefinition {
            name,
            properties,
            body,
            span: Span::new(start.start, end.span.end),
        })
    }

    /// A component's field shape is written as plain typed declarations at
    /// the head of its body (`Name : string = ""`, no wrapper keyword).
    /// Splits that leading run off `body` and turns it into the
    /// component's `HtmlProperties`, leaving the remainder as the body
    /// that actually renders. A declare-set (`name := expr`, untyped) ends
    /// the run immediately, since it carries no type for the field shape.
    fn split_leading_field_declarations(body: &mut Block) -> Option<HtmlProperties> {
        let split_at = body
            .statements
            .iter()
            .take_while(|stmt| matches!(stmt, Stmt::Declare(decl) if decl.declared_type.is_some()))
            .count();
        if split_at == 0 {
            return None;
        }
        let field_stmts: Vec<Stmt> = body.statements.drain(..split_at).collect();
        let start = field_stmts.first().map(|s| s.span().start).unwrap_or(body.span.start);
        let end = field_stmts.last().map(|s| s.span().end).unwrap_or(start);
        let fields = field_stmts
            .into_iter()
            .filter_map(|stmt| match stmt {
                Stmt::Declare(decl) => Some(StructField {
                    span: decl.span,
                    name: decl.name,
                    type_ref: decl.declared_type.expect("filtered by split_leading_field_declarations"),
                    default: decl.value,
                }),
                _ => None,
            })
            .collect();
        Some(HtmlProperties {
            fields,
            span: Span::new(start, end),
        })
    }

    fn parse_struct_definition(&mut self, name: Option<Token>) -> Result<StructDefinition, Diagnostic> {
        let start = self.current.span;
        self.expect(TokenKind::KwStruct, "`struct`")?;
        self.expect(TokenKind::LBrace, "`{`")?;
        self.skip_separators();
        let mut fields = Vec::new();
        while !self.at(TokenKind::RBrace) && !self.at(TokenKind::Eof) {
            fields.push(self.parse_struct_field()?);
            self.skip_separators();
        }
        let end = self.expect(TokenKind::RBrace, "`}`")?;
        Ok(StructDefinition {
            name,
            fields,
            span: Span::new(start.start, end.span.end),
        })
    }

    fn parse_struct_field(&mut self) -> Result<StructField, Diagnostic> {
        let name = self.expect(TokenKind::Identifier, "field name")?;
        self.expect(TokenKind::Declare, "`:`")?;
        let type_ref = self.parse_type_ref()?;
        let mut default = None;
        let mut end = type_ref.span;
        if self.at(TokenKind::Eq) {
            self.advance()?;
            let expr = self.parse_expression()?;
            end = expr.span;
            default = Some(expr);
        }
        Ok(StructField {
            span: Span::new(name.span.start, end.end),
            name,
            type_ref,
            default,
        })
    }

    fn parse_type_ref(&mut self) -> Result<TypeRef, Diagnostic> {
        let name = self.expect(TokenKind::Identifier, "type name")?;
        let mut depth = 0u32;
        let mut end = name.span;
        while self.at(TokenKind::LBracket) {
            let lb = self.advance()?;
            let rb = self.expect(TokenKind::RBracket, "`]`")?;
            let _ = lb;
            depth += 1;
            end = rb.span;
        }
        Ok(TypeRef {
            span: Span::new(name.span.start, end.end),
            name,
            array_depth: depth,
        })
    }

    fn parse_procedure_definition(&mut self, name: Token) -> Result<ProcedureDefinition, Diagnostic> {
        self.expect(TokenKind::LParen, "`(`")?;
        let mut params = Vec::new();
        while !self.at(TokenKind::RParen) {
            let pname = self.expect(TokenKind::Identifier, "parameter name")?;
            self.expect(TokenKind::Declare, "`:`")?;
            let type_ref = self.parse_type_ref()?;
            params.push(Parameter {
                span: Span::new(pname.span.start, type_ref.span.end),
                name: pname,
                type_ref,
            });
            if self.at(TokenKind::Comma) {
                self.advance()?;
            } else {
                break;
            }
        }
        self.expect(TokenKind::RParen, "`)`")?;
        let mut return_type = None;
        if self.at(TokenKind::Arrow) {
            self.advance()?;
            return_type = Some(self.parse_type_ref()?);
        }
        self.expect(TokenKind::LBrace, "`{`")?;
        let body = self.parse_block_until_rbrace()?;
        let end = self.expect(TokenKind::RBrace, "`}`")?;
        Ok(ProcedureDefinition {
            span: Span::new(name.span.start, end.span.end),
            name,
            params,
            return_type,
            body,
        })
    }

    // ── Statements ───────────────────────────────────────────────────────

    fn parse_block_until_rbrace(&mut self) -> Result<Block, Diagnostic> {
        let start = self.current.span;
        self.skip_separators();
        let mut statements = Vec::new();
        while !self.at(TokenKind::RBrace) && !self.at(TokenKind::Eof) {
            statements.push(self.parse_statement()?);
            self.skip_separators();
        }
        Ok(Block {
            statements,
            span: Span::new(start.start, self.current.span.start),
        })
    }

    fn parse_statement(&mut self) -> Result<Stmt, Diagnostic> {
        match self.current.kind {
            TokenKind::KwIf => Ok(Stmt::If(self.parse_if()?)),
            TokenKind::KwFor => Ok(Stmt::For(self.parse_for()?)),
            TokenKind::KwReturn => Ok(Stmt::Return(self.parse_return()?)),
            TokenKind::Identifier => self.parse_identifier_led_statement(),
            _ => Ok(Stmt::Expr(self.parse_expression()?)),
        }
    }

    /// Disambiguates, by lookahead, the many statement forms that start
    /// with an identifier: declarations, assignments, array-append, a bare
    /// HTML-node construction, or a plain expression.
    fn parse_identifier_led_statement(&mut self) -> Result<Stmt, Diagnostic> {
        let checkpoint_next = self.peek_ahead()?;
        match checkpoint_next.kind {
            TokenKind::DeclareSet => Ok(Stmt::Declare(self.parse_declare_set()?)),
            TokenKind::Declare => Ok(Stmt::Declare(self.parse_declare_typed()?)),
            TokenKind::LParen => self.parse_html_or_call_statement(),
            TokenKind::LBrace => Ok(Stmt::Html(self.parse_html_node()?)),
            _ => self.parse_assignment_or_expr_statement(),
        }
    }

    fn parse_declare_set(&mut self) -> Result<DeclareStatement, Diagnostic> {
        let name = self.advance()?;
        self.expect(TokenKind::DeclareSet, "`:=`")?;
        let value = self.parse_expression()?;
        Ok(DeclareStatement {
            span: Span::new(name.span.start, value.span.end),
            name,
            declared_type: None,
            value: Some(value),
        })
    }

    fn parse_declare_typed(&mut self) -> Result<DeclareStatement, Diagnostic> {
        let name = self.advance()?;
        self.expect(TokenKind::Declare, "`:`")?;
        let type_ref = self.parse_type_ref()?;
        let mut end = type_ref.span;
        let mut value = None;
        if self.at(TokenKind::Eq) {
            self.advance()?;
            let expr = self.parse_expression()?;
            end = expr.span;
            value = Some(expr);
        }
        Ok(DeclareStatement {
            span: Span::new(name.span.start, end.end),
            name,
            declared_type: Some(type_ref),
            value,
        })
    }

    /// An identifier immediately followed by `(` is either an HTML-node
    /// construction (`Tag(attr=expr) { … }`) or a plain procedure call used
    /// as a statement. The type checker is the real arbiter of tag-vs-
    /// procedure (spec.md §4.4); here we only need to choose an AST shape,
    /// using the same naming convention the checker's HTML5-tag table
    /// implies: `Name(...)` with an uppercase-leading or known tag name is
    /// an HTML-node statement, everything else is a bare call expression.
    fn parse_html_or_call_statement(&mut self) -> Result<Stmt, Diagnostic> {
        let is_html = self.current.lexeme.chars().next().is_some_and(|c| c.is_uppercase()) || is_html5_tag(&self.current.lexeme);
        if is_html {
            Ok(Stmt::Html(self.parse_html_node()?))
        } else {
            Ok(Stmt::Expr(self.parse_expression()?))
        }
    }

    fn parse_html_node(&mut self) -> Result<HtmlNode, Diagnostic> {
        let tag = self.advance()?;
        let mut attributes = Vec::new();
        if self.at(TokenKind::LParen) {
            self.advance()?;
            while !self.at(TokenKind::RParen) {
                let aname = self.expect(TokenKind::Identifier, "attribute name")?;
                self.expect(TokenKind::Eq, "`=`")?;
                let value = self.parse_expression()?;
                attributes.push(HtmlAttribute { name: aname, value });
                if self.at(TokenKind::Comma) {
                    self.advance()?;
                } else {
                    break;
                }
            }
            self.expect(TokenKind::RParen, "`)`")?;
        }
        let mut body = Vec::new();
        let mut end = tag.span;
        if self.at(TokenKind::LBrace) {
            self.advance()?;
            let block = self.parse_block_until_rbrace()?;
            let rb = self.expect(TokenKind::RBrace, "`}`")?;
            body = block.statements;
            end = rb.span;
        }
        Ok(HtmlNode {
            id: self.next_id(),
            span: Span::new(tag.span.start, end.end),
            tag,
            attributes,
            body,
        })
    }

    fn parse_assignment_or_expr_statement(&mut self) -> Result<Stmt, Diagnostic> {
        let expr_start = self.current.span;
        let first = self.parse_token_list()?;
        let is_array_append = self.current.kind == TokenKind::LBracket
            && self.peek_ahead()?.kind == TokenKind::RBracket;
        match self.current.kind {
            TokenKind::LBracket if is_array_append => {
                self.advance()?;
                self.advance()?;
                self.expect(TokenKind::Eq, "`=` (array-append `[]=`)")?;
                let value = self.parse_expression()?;
                Ok(Stmt::ArrayAppend(ArrayAppendStatement {
                    span: Span::new(expr_start.start, value.span.end),
                    target: first,
                    value,
                }))
            }
            TokenKind::Eq | TokenKind::PlusEq | TokenKind::MinusEq | TokenKind::StarEq | TokenKind::SlashEq => {
                let op = match self.advance()?.kind {
                    TokenKind::Eq => OpKind::Assign,
                    TokenKind::PlusEq => OpKind::AddAssign,
                    TokenKind::MinusEq => OpKind::SubAssign,
                    TokenKind::StarEq => OpKind::MulAssign,
                    _ => OpKind::DivAssign,
                };
                let value = self.parse_expression()?;
                Ok(Stmt::Op(OpStatement {
                    span: Span::new(expr_start.start, value.span.end),
                    target: first,
                    op,
                    value,
                }))
            }
            _ => {
                // Not actually an assignment target -- re-interpret the
                // path we already consumed as the start of an expression.
                let expr = self.continue_expression_from_path(first)?;
                Ok(Stmt::Expr(expr))
            }
        }
    }

    fn parse_if(&mut self) -> Result<IfStatement, Diagnostic> {
        let start = self.advance()?.span; // `if`
        let condition = self.parse_expression()?;
        self.expect(TokenKind::LBrace, "`{`")?;
        let then_block = self.parse_block_until_rbrace()?;
        let mut end = self.expect(TokenKind::RBrace, "`}`")?.span;
        let mut else_branch = None;
        let save = self.current.clone();
        self.skip_separators();
        if self.at(TokenKind::KwElse) {
            self.advance()?;
            if self.at(TokenKind::KwIf) {
                let nested = self.parse_if()?;
                end = nested.span;
                else_branch = Some(Box::new(ElseBranch::If(nested)));
            } else {
                self.expect(TokenKind::LBrace, "`{`")?;
                let block = self.parse_block_until_rbrace()?;
                end = self.expect(TokenKind::RBrace, "`}`")?.span;
                else_branch = Some(Box::new(ElseBranch::Block(block)));
            }
        } else {
            // No `else` here: the separators we skipped belong to whatever
            // follows, not to this statement.
            let _ = save;
        }
        Ok(IfStatement {
            span: Span::new(start.start, end.end),
            condition,
            then_block,
            else_branch,
        })
    }

    fn parse_for(&mut self) -> Result<ForStatement, Diagnostic> {
        let start = self.advance()?.span; // `for`
        let first = self.expect(TokenKind::Identifier, "loop variable")?;
        let (index_name, item_name) = if self.at(TokenKind::Comma) {
            self.advance()?;
            let item = self.expect(TokenKind::Identifier, "loop variable")?;
            (Some(first), item)
        } else {
            (None, first)
        };
        self.expect(TokenKind::Declare, "`:`")?;
        let array = self.parse_expression()?;
        self.expect(TokenKind::LBrace, "`{`")?;
        let body = self.parse_block_until_rbrace()?;
        let end = self.expect(TokenKind::RBrace, "`}`")?;
        Ok(ForStatement {
            span: Span::new(start.start, end.span.end),
            index_name,
            item_name,
            array,
            body,
        })
    }

    fn parse_return(&mut self) -> Result<ReturnStatement, Diagnostic> {
        let start = self.advance()?.span; // `return`
        let mut end = start;
        let mut value = None;
        if !self.is_statement_end() {
            let expr = self.parse_expression()?;
            end = expr.span;
            value = Some(expr);
        }
        Ok(ReturnStatement {
            span: Span::new(start.start, end.end),
            value,
        })
    }
}

/// The HTML5 void/common element names recognized as primitive tags rather
/// than component invocations (spec.md §4.4). Not exhaustive of the HTML5
/// spec -- just the common set templates in this language reach for.
fn is_html5_tag(name: &str) -> bool {
    matches!(
        name,
        "html"
            | "head"
            | "body"
            | "title"
            | "meta"
            | "link"
            | "script"
            | "style"
            | "div"
            | "span"
            | "p"
            | "a"
            | "img"
            | "ul"
            | "ol"
            | "li"
            | "table"
            | "thead"
            | "tbody"
            | "tr"
            | "td"
            | "th"
            | "form"
            | "input"
            | "button"
            | "label"
            | "select"
            | "option"
            | "textarea"
            | "h1"
            | "h2"
            | "h3"
            | "h4"
            | "h5"
            | "h6"
            | "nav"
            | "header"
            | "footer"
            | "main"
            | "section"
            | "article"
            | "aside"
            | "figure"
            | "figcaption"
            | "br"
            | "hr"
            | "strong"
            | "em"
            | "small"
            | "pre"
            | "code"
            | "blockquote"
            | "iframe"
            | "svg"
            | "path"
    )
}
