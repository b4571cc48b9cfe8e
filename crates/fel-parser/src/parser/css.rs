use fel_common::{Diagnostic, Span, Token, TokenKind};

use super::Parser;
use crate::ast::*;

impl<'src> Parser<'src> {
    pub(super) fn parse_css_definition(&mut self, name: Option<Token>) -> Result<CssDefinition, Diagnostic> {
        let start = self.current.span;
        self.expect(TokenKind::KwCss, "`css`")?;
        self.expect(TokenKind::LBrace, "`{`")?;
        let (properties, rules) = self.parse_css_body()?;
        if !properties.is_empty() {
            self.error(start, "top-level declarations are not allowed directly inside `:: css`; wrap them in a selector");
        }
        let end = self.expect(TokenKind::RBrace, "`}`")?;
        Ok(CssDefinition {
            name,
            rules,
            span: Span::new(start.start, end.span.end),
        })
    }

    pub(super) fn parse_css_config_definition(&mut self, name: Option<Token>) -> Result<CssConfigDefinition, Diagnostic> {
        let start = self.current.span;
        self.expect(TokenKind::KwCssConfig, "`css_config`")?;
        self.expect(TokenKind::LBrace, "`{`")?;
        self.skip_separators();
        let mut entries = Vec::new();
        while !self.at(TokenKind::RBrace) && !self.at(TokenKind::Eof) {
            let ename = self.expect(TokenKind::Identifier, "entry name")?;
            self.expect(TokenKind::Declare, "`:`")?;
            let value = self.parse_expression()?;
            entries.push(CssConfigEntry {
                span: Span::new(ename.span.start, value.span.end),
                name: ename,
                value,
            });
            self.skip_separators();
        }
        let end = self.expect(TokenKind::RBrace, "`}`")?;
        Ok(CssConfigDefinition {
            name,
            entries,
            span: Span::new(start.start, end.span.end),
        })
    }

    /// Parses the contents of a `{ … }` CSS block: an interleaving of
    /// `name: value;` declarations and nested selector/at-rules.
    fn parse_css_body(&mut self) -> Result<(Vec<CssProperty>, Vec<CssRule>), Diagnostic> {
        self.skip_separators();
        let mut properties = Vec::new();
        let mut rules = Vec::new();
        while !self.at(TokenKind::RBrace) && !self.at(TokenKind::Eof) {
            if self.at(TokenKind::At) {
                rules.push(self.parse_css_at_rule()?);
            } else if self.at(TokenKind::Identifier) && self.peek_ahead()?.kind == TokenKind::Declare {
                properties.push(self.parse_css_property()?);
            } else {
                rules.push(self.parse_css_selector_rule()?);
            }
            self.skip_separators();
        }
        Ok((properties, rules))
    }

    fn parse_css_at_rule(&mut self) -> Result<CssRule, Diagnostic> {
        let start = self.advance()?.span; // `@`
        let keyword = self.expect(TokenKind::Identifier, "at-rule keyword")?;
        self.expect(TokenKind::LBrace, "`{`")?;
        let (properties, nested) = self.parse_css_body()?;
        let end = self.expect(TokenKind::RBrace, "`}`")?;
        Ok(CssRule {
            kind: CssRuleKind::AtKeyword,
            at_keyword: Some(keyword),
            selectors: Vec::new(),
            properties,
            nested,
            span: Span::new(start.start, end.span.end),
        })
    }

    fn parse_css_selector_rule(&mut self) -> Result<CssRule, Diagnostic> {
        let start = self.current.span;
        let mut selectors = vec![self.parse_css_selector()?];
        while self.at(TokenKind::Comma) {
            self.advance()?;
            selectors.push(self.parse_css_selector()?);
        }
        self.expect(TokenKind::LBrace, "`{`")?;
        let (properties, nested) = self.parse_css_body()?;
        let end = self.expect(TokenKind::RBrace, "`}`")?;
        Ok(CssRule {
            kind: CssRuleKind::Rule,
            at_keyword: None,
            selectors,
            properties,
            nested,
            span: Span::new(start.start, end.span.end),
        })
    }

    fn parse_css_property(&mut self) -> Result<CssProperty, Diagnostic> {
        let name = self.advance()?;
        self.expect(TokenKind::Declare, "`:`")?;
        let mut value_tokens = Vec::new();
        while !matches!(
            self.current.kind,
            TokenKind::Semicolon | TokenKind::Newline | TokenKind::RBrace | TokenKind::Eof
        ) {
            value_tokens.push(self.advance()?);
        }
        let end = value_tokens.last().map(|t| t.span).unwrap_or(name.span);
        if self.at(TokenKind::Semicolon) {
            self.advance()?;
        }
        Ok(CssProperty {
            span: Span::new(name.span.start, end.end),
            name,
            value_tokens,
        })
    }

    /// A selector is a sequence of parts; whitespace the scanner already
    /// discarded as trivia is recovered as an implicit `Ancestor`
    /// combinator whenever two adjacent parts' spans aren't contiguous and
    /// no explicit combinator token separates them (spec.md §4.6).
    fn parse_css_selector(&mut self) -> Result<CssSelector, Diagnostic> {
        let start = self.current.span;
        let mut parts = Vec::new();
        let mut last_end = None::<u32>;
        loop {
            if matches!(self.current.kind, TokenKind::LBrace | TokenKind::Comma | TokenKind::Eof) {
                break;
            }
            if let Some(end) = last_end {
                if self.current.span.start > end && self.starts_selector_part() {
                    parts.push(CssSelectorPart::Combinator(CssCombinator::Ancestor));
                }
            }
            match self.current.kind {
                TokenKind::Dot => {
                    self.advance()?;
                    let ident = self.expect(TokenKind::Identifier, "class name")?;
                    last_end = Some(ident.span.end);
                    parts.push(CssSelectorPart::Class(ident));
                }
                TokenKind::Hash => {
                    self.advance()?;
                    let ident = self.expect(TokenKind::Identifier, "id name")?;
                    last_end = Some(ident.span.end);
                    parts.push(CssSelectorPart::Id(ident));
                }
                TokenKind::Identifier => {
                    let ident = self.advance()?;
                    last_end = Some(ident.span.end);
                    parts.push(CssSelectorPart::Tag(ident));
                }
                TokenKind::Number => {
                    let tok = self.advance()?;
                    last_end = Some(tok.span.end);
                    parts.push(CssSelectorPart::Number(tok));
                }
                TokenKind::At => {
                    self.advance()?;
                    let ident = self.expect(TokenKind::Identifier, "at-keyword")?;
                    last_end = Some(ident.span.end);
                    parts.push(CssSelectorPart::AtKeyword(ident));
                }
                TokenKind::Declare | TokenKind::Define => {
                    self.advance()?;
                    let ident = self.expect(TokenKind::Identifier, "pseudo-class name")?;
                    last_end = Some(ident.span.end);
                    parts.push(CssSelectorPart::Pseudo(ident));
                }
                TokenKind::LBracket => {
                    let attr = self.parse_css_attribute_selector()?;
                    last_end = Some(attr.span.end);
                    parts.push(CssSelectorPart::Attribute(attr));
                }
                TokenKind::Gt => {
                    self.advance()?;
                    last_end = None;
                    parts.push(CssSelectorPart::Combinator(CssCombinator::Child));
                }
                TokenKind::Plus => {
                    self.advance()?;
                    last_end = None;
                    parts.push(CssSelectorPart::Combinator(CssCombinator::Adjacent));
                }
                TokenKind::Tilde => {
                    self.advance()?;
                    last_end = None;
                    parts.push(CssSelectorPart::Combinator(CssCombinator::Sibling));
                }
                _ => break,
            }
        }
        Ok(CssSelector {
            span: Span::new(start.start, self.current.span.start),
            parts,
        })
    }

    fn starts_selector_part(&self) -> bool {
        matches!(
            self.current.kind,
            TokenKind::Dot
                | TokenKind::Hash
                | TokenKind::Identifier
                | TokenKind::Number
                | TokenKind::At
                | TokenKind::Declare
                | TokenKind::Define
                | TokenKind::LBracket
        )
    }

    fn parse_css_attribute_selector(&mut self) -> Result<CssAttributeSelector, Diagnostic> {
        let start = self.advance()?.span; // `[`
        let name = self.expect(TokenKind::Identifier, "attribute name")?;
        let mut operator = None;
        let mut value = None;
        if self.at(TokenKind::Eq) {
            operator = Some(self.advance()?);
            value = Some(self.advance()?);
        }
        let end = self.expect(TokenKind::RBracket, "`]`")?;
        Ok(CssAttributeSelector {
            name,
            operator,
            value,
            span: Span::new(start.start, end.span.end),
        })
    }
}
