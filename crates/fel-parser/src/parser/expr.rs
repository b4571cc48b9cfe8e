use fel_common::{Diagnostic, Span, Token, TokenKind};

use super::Parser;
use crate::ast::*;

/// An item on the shunting-yard operator stack: either a `(` marker or an
/// operator token together with whether it's a prefix (unary) use.
enum StackItem {
    Paren,
    Operator(Token, bool),
}

fn binary_precedence(kind: TokenKind) -> Option<u8> {
    Some(match kind {
        TokenKind::PipePipe => 1,
        TokenKind::AmpAmp => 2,
        TokenKind::EqEq | TokenKind::NotEq => 3,
        TokenKind::Lt | TokenKind::Gt | TokenKind::LtEq | TokenKind::GtEq => 4,
        TokenKind::Plus | TokenKind::Minus => 5,
        TokenKind::Star | TokenKind::Slash | TokenKind::Percent => 6,
        _ => return None,
    })
}

/// Prefix operators bind tighter than every binary operator.
const UNARY_PRECEDENCE: u8 = 100;

impl<'src> Parser<'src> {
    /// Precedence-climbing expression parser (spec.md §4.2): converts infix
    /// input into the flat postfix sequence stored on [`Expression`].
    pub(super) fn parse_expression(&mut self) -> Result<Expression, Diagnostic> {
        let start = self.current.span;
        self.expr_loop(Vec::new(), Vec::new(), true, start)
    }

    /// Resume shunting-yard parsing after a dotted path has already been
    /// consumed speculatively (while disambiguating an assignment target
    /// from a plain expression statement).
    pub(super) fn continue_expression_from_path(&mut self, path: TokenList) -> Result<Expression, Diagnostic> {
        let start = path.span;
        let operand = if path.tokens.len() == 1 {
            Operand::Identifier(path.tokens[0].clone())
        } else {
            Operand::Path(path)
        };
        self.expr_loop(vec![PostfixItem::Operand(operand)], Vec::new(), false, start)
    }

    fn expr_loop(
        &mut self,
        mut output: Vec<PostfixItem>,
        mut op_stack: Vec<StackItem>,
        mut expect_operand: bool,
        start: Span,
    ) -> Result<Expression, Diagnostic> {
        loop {
            if expect_operand {
                match self.current.kind {
                    TokenKind::Bang | TokenKind::Minus => {
                        let op = self.advance()?;
                        op_stack.push(StackItem::Operator(op, true));
                    }
                    TokenKind::LParen => {
                        self.advance()?;
                        op_stack.push(StackItem::Paren);
                    }
                    _ => {
                        let operand = self.parse_operand()?;
                        output.push(PostfixItem::Operand(operand));
                        expect_operand = false;
                    }
                }
                continue;
            }

            match self.current.kind {
                TokenKind::RParen => {
                    if Self::has_paren_marker(&op_stack) {
                        self.advance()?;
                        Self::pop_until_paren(&mut op_stack, &mut output);
                    } else {
                        break; // unmatched `)` terminates the expression (spec.md §4.2)
                    }
                }
                kind if binary_precedence(kind).is_some() => {
                    let new_prec = binary_precedence(kind).unwrap();
                    while let Some(top_prec) = Self::top_precedence(&op_stack) {
                        if top_prec >= new_prec {
                            Self::pop_one(&mut op_stack, &mut output);
                        } else {
                            break;
                        }
                    }
                    let op = self.advance()?;
                    op_stack.push(StackItem::Operator(op, false));
                    expect_operand = true;
                }
                _ => break,
            }
        }

        if expect_operand && !output.is_empty() {
            // Trailing operator with nothing after it, e.g. `x +`.
            return Err(self.fatal(self.current.span, "expected an expression after operator"));
        }

        let end = if let Some(last) = output.last() {
            match last {
                PostfixItem::Operand(_) => self.current.span,
                _ => self.current.span,
            }
        } else {
            self.current.span
        };
        while let Some(item) = op_stack.pop() {
            match item {
                StackItem::Paren => return Err(self.fatal(start, "mismatched parentheses in expression")),
                StackItem::Operator(tok, is_unary) => {
                    output.push(if is_unary {
                        PostfixItem::UnaryOperator(tok)
                    } else {
                        PostfixItem::Operator(tok)
                    });
                }
            }
        }

        Ok(Expression {
            id: self.next_id(),
            postfix: output,
            span: Span::new(start.start, end.start.max(start.end)),
        })
    }

    fn has_paren_marker(stack: &[StackItem]) -> bool {
        stack.iter().any(|item| matches!(item, StackItem::Paren))
    }

    fn top_precedence(stack: &[StackItem]) -> Option<u8> {
        match stack.last()? {
            StackItem::Paren => None,
            StackItem::Operator(tok, is_unary) => {
                if *is_unary {
                    Some(UNARY_PRECEDENCE)
                } else {
                    binary_precedence(tok.kind)
                }
            }
        }
    }

    fn pop_one(stack: &mut Vec<StackItem>, output: &mut Vec<PostfixItem>) {
        if let Some(StackItem::Operator(tok, is_unary)) = stack.pop() {
            output.push(if is_unary {
                PostfixItem::UnaryOperator(tok)
            } else {
                PostfixItem::Operator(tok)
            });
        }
    }

    fn pop_until_paren(stack: &mut Vec<StackItem>, output: &mut Vec<PostfixItem>) {
        while let Some(item) = stack.pop() {
            match item {
                StackItem::Paren => break,
                StackItem::Operator(tok, is_unary) => {
                    output.push(if is_unary {
                        PostfixItem::UnaryOperator(tok)
                    } else {
                        PostfixItem::Operator(tok)
                    });
                }
            }
        }
    }

    fn parse_operand(&mut self) -> Result<Operand, Diagnostic> {
        match self.current.kind {
            TokenKind::String | TokenKind::Number | TokenKind::KwTrue | TokenKind::KwFalse | TokenKind::InteropVar => {
                Ok(Operand::Literal(self.advance()?))
            }
            TokenKind::LBracket => Ok(Operand::Array(self.parse_array_literal()?)),
            TokenKind::Identifier => self.parse_identifier_operand(),
            _ => Err(self.fatal(
                self.current.span,
                format!("expected an expression, found {:?}", self.current.kind),
            )),
        }
    }

    fn parse_identifier_operand(&mut self) -> Result<Operand, Diagnostic> {
        let peek = self.peek_ahead()?;
        let is_type_name = self.current.lexeme.chars().next().is_some_and(|c| c.is_uppercase());
        match peek.kind {
            TokenKind::LParen => Ok(Operand::Call(self.parse_call()?)),
            // Only a capitalized `Name { … }` is a struct literal; a bare
            // `cond { … }` / `items { … }` is a plain identifier immediately
            // followed by an `if`/`for` body block, not part of the
            // expression (spec.md §4.2's terminator list doesn't include
            // `{`, so callers own that brace).
            TokenKind::LBrace if is_type_name => Ok(Operand::Struct(self.parse_struct_literal()?)),
            TokenKind::Dot => Ok(Operand::Path(self.parse_token_list()?)),
            _ => Ok(Operand::Identifier(self.advance()?)),
        }
    }

    pub(super) fn parse_token_list(&mut self) -> Result<TokenList, Diagnostic> {
        let first = self.expect(TokenKind::Identifier, "identifier")?;
        let mut tokens = vec![first.clone()];
        let mut end = first.span;
        while self.at(TokenKind::Dot) && self.peek_ahead()?.kind == TokenKind::Identifier {
            self.advance()?; // `.`
            let next = self.advance()?;
            end = next.span;
            tokens.push(next);
        }
        Ok(TokenList {
            id: self.next_id(),
            span: Span::new(first.span.start, end.end),
            tokens,
        })
    }

    fn parse_call(&mut self) -> Result<Call, Diagnostic> {
        let name = self.advance()?;
        self.expect(TokenKind::LParen, "`(`")?;
        let mut args = Vec::new();
        while !self.at(TokenKind::RParen) {
            args.push(self.parse_expression()?);
            if self.at(TokenKind::Comma) {
                self.advance()?;
            } else {
                break;
            }
        }
        let end = self.expect(TokenKind::RParen, "`)`")?;
        Ok(Call {
            id: self.next_id(),
            span: Span::new(name.span.start, end.span.end),
            name,
            args,
        })
    }

    fn parse_struct_literal(&mut self) -> Result<StructLiteral, Diagnostic> {
        let type_name = self.advance()?; // identifier
        self.expect(TokenKind::LBrace, "`{`")?;
        self.skip_separators();
        let mut fields = Vec::new();
        while !self.at(TokenKind::RBrace) {
            let fname = self.expect(TokenKind::Identifier, "field name")?;
            self.expect(TokenKind::Declare, "`:`")?;
            let value = self.parse_expression()?;
            fields.push(StructLiteralField { name: fname, value });
            if self.at(TokenKind::Comma) {
                self.advance()?;
            }
            self.skip_separators();
        }
        let end = self.expect(TokenKind::RBrace, "`}`")?;
        Ok(StructLiteral {
            id: self.next_id(),
            span: Span::new(type_name.span.start, end.span.end),
            type_name: Some(type_name),
            fields,
        })
    }

    fn parse_array_literal(&mut self) -> Result<ArrayLiteral, Diagnostic> {
        let start = self.advance()?.span; // `[`
        let mut elements = Vec::new();
        while !self.at(TokenKind::RBracket) {
            elements.push(self.parse_expression()?);
            if self.at(TokenKind::Comma) {
                self.advance()?;
            } else {
                break;
            }
        }
        let end = self.expect(TokenKind::RBracket, "`]`")?;
        Ok(ArrayLiteral {
            id: self.next_id(),
            span: Span::new(start.start, end.span.end),
            elements,
        })
    }
}
