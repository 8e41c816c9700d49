//! Expression parsing.
//!
//! Two precedence levels: multiplicative (`*` `/`) binds tighter than the
//! additive level, which `+` `-` share with the comparisons `<` `>`. All
//! operators are left-associative, so `a < b + c` chains left-to-right as
//! `(a < b) + c`; comparisons produce 0/1 and participate in arithmetic.

use tellc_lex::TokenKind;

use crate::ast::{BinaryOp, Node};
use crate::{ParseFailed, ParseResult, Parser};

impl<'a> Parser<'a> {
    /// `expression := term (('+'|'-'|'<'|'>') term)*`
    pub(crate) fn parse_expression(&mut self) -> ParseResult<Node> {
        let mut left = self.parse_term()?;

        loop {
            let op = match self.current().kind {
                TokenKind::Plus => BinaryOp::Add,
                TokenKind::Minus => BinaryOp::Subtract,
                TokenKind::Less => BinaryOp::Less,
                TokenKind::Greater => BinaryOp::Greater,
                _ => break,
            };
            let op_token = self.advance();
            let right = self.parse_term()?;
            left = Node::BinaryOp {
                op,
                left: Box::new(left),
                right: Box::new(right),
                span: op_token.span,
            };
        }

        Ok(left)
    }

    /// `term := primary (('*'|'/') primary)*`
    fn parse_term(&mut self) -> ParseResult<Node> {
        let mut left = self.parse_primary()?;

        loop {
            let op = match self.current().kind {
                TokenKind::Star => BinaryOp::Multiply,
                TokenKind::Slash => BinaryOp::Divide,
                _ => break,
            };
            let op_token = self.advance();
            let right = self.parse_primary()?;
            left = Node::BinaryOp {
                op,
                left: Box::new(left),
                right: Box::new(right),
                span: op_token.span,
            };
        }

        Ok(left)
    }

    /// `primary := NUMBER | '-' NUMBER | STRING | IDENT | call | '(' expression ')'`
    ///
    /// A `-` reaches primary position only where no left operand exists
    /// (after `=`, `(`, or another operator), so folding it into the number
    /// literal here is unambiguous; `a-3` never enters this path.
    fn parse_primary(&mut self) -> ParseResult<Node> {
        match self.current().kind {
            TokenKind::NumberLiteral => {
                let token = self.advance();
                let value = self.parse_number_value(&token)?;
                Ok(Node::Number {
                    value,
                    span: token.span,
                })
            }

            TokenKind::Minus => {
                let minus_token = self.advance();
                if self.current().kind != TokenKind::NumberLiteral {
                    self.report(format!(
                        "expected {} after unary '-'",
                        TokenKind::NumberLiteral
                    ));
                    return Err(ParseFailed);
                }
                let token = self.advance();
                let value = self.parse_number_value(&token)?;
                Ok(Node::Number {
                    value: -value,
                    span: minus_token.span,
                })
            }

            TokenKind::StringLiteral => {
                let token = self.advance();
                Ok(Node::String {
                    value: token.lexeme,
                    span: token.span,
                })
            }

            TokenKind::Identifier => {
                let token = self.advance();
                if self.current().kind == TokenKind::LParen {
                    return self.parse_call(token);
                }
                Ok(Node::Identifier {
                    name: token.lexeme,
                    span: token.span,
                })
            }

            TokenKind::Show | TokenKind::Ask => {
                let token = self.advance();
                self.parse_call(token)
            }

            TokenKind::LParen => {
                self.advance();
                let expr = self.parse_expression()?;
                self.expect(TokenKind::RParen)?;
                Ok(expr)
            }

            _ => {
                self.report(format!(
                    "expected an expression but got '{}' ({})",
                    self.current().lexeme,
                    self.current().kind
                ));
                Err(ParseFailed)
            }
        }
    }

    fn parse_number_value(&self, token: &tellc_lex::Token) -> ParseResult<i64> {
        match token.lexeme.parse::<i64>() {
            Ok(value) => Ok(value),
            Err(_) => {
                self.report_at(
                    format!("number literal '{}' is out of range", token.lexeme),
                    token.span,
                );
                Err(ParseFailed)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tellc_util::Handler;

    fn parse_expr(source: &str) -> Node {
        let handler = Handler::new();
        let mut parser = Parser::new(source, &handler);
        let expr = parser.parse_expression().expect("expression should parse");
        assert!(!handler.has_errors());
        expr
    }

    #[test]
    fn test_left_associative_addition() {
        // 1 + 2 + 3 parses as (1 + 2) + 3
        match parse_expr("1 + 2 + 3") {
            Node::BinaryOp {
                op: BinaryOp::Add,
                left,
                right,
                ..
            } => {
                assert!(matches!(
                    left.as_ref(),
                    Node::BinaryOp {
                        op: BinaryOp::Add,
                        ..
                    }
                ));
                assert!(matches!(right.as_ref(), Node::Number { value: 3, .. }));
            }
            other => panic!("unexpected tree: {:?}", other),
        }
    }

    #[test]
    fn test_comparison_chains_with_additive() {
        // a < b + c parses as (a < b) + c; the comparison shares the
        // additive level and chains left-to-right.
        match parse_expr("a < b + c") {
            Node::BinaryOp {
                op: BinaryOp::Add,
                left,
                ..
            } => {
                assert!(matches!(
                    left.as_ref(),
                    Node::BinaryOp {
                        op: BinaryOp::Less,
                        ..
                    }
                ));
            }
            other => panic!("unexpected tree: {:?}", other),
        }
    }

    #[test]
    fn test_parentheses_override_precedence() {
        match parse_expr("(2 + 3) * 4") {
            Node::BinaryOp {
                op: BinaryOp::Multiply,
                left,
                ..
            } => {
                assert!(matches!(
                    left.as_ref(),
                    Node::BinaryOp {
                        op: BinaryOp::Add,
                        ..
                    }
                ));
            }
            other => panic!("unexpected tree: {:?}", other),
        }
    }

    #[test]
    fn test_division_parses() {
        assert!(matches!(
            parse_expr("10 / 2"),
            Node::BinaryOp {
                op: BinaryOp::Divide,
                ..
            }
        ));
    }

    #[test]
    fn test_negative_literal_after_operator() {
        match parse_expr("1 + -2") {
            Node::BinaryOp {
                op: BinaryOp::Add,
                right,
                ..
            } => {
                assert!(matches!(right.as_ref(), Node::Number { value: -2, .. }));
            }
            other => panic!("unexpected tree: {:?}", other),
        }
    }

    #[test]
    fn test_call_as_rvalue() {
        assert!(matches!(
            parse_expr("ask(\"prompt\")"),
            Node::FunctionCall { name, args, .. } if name == "ask" && args.len() == 1
        ));
    }

    #[test]
    fn test_number_out_of_range() {
        let handler = Handler::new();
        let mut parser = Parser::new("99999999999999999999", &handler);
        assert!(parser.parse_expression().is_err());
        assert!(handler.has_errors());
    }

    #[test]
    fn test_unary_minus_requires_literal() {
        let handler = Handler::new();
        let mut parser = Parser::new("-x", &handler);
        assert!(parser.parse_expression().is_err());
        assert!(handler
            .diagnostics()[0]
            .message
            .contains("after unary '-'"));
    }
}
