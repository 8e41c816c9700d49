//! tellc-par - Recursive-descent parser for the Tell language.
//!
//! Predictive LL(1): every statement form is selected by its first token.
//! On a mismatch the parser reports one diagnostic through the shared
//! [`Handler`](tellc_util::Handler) and fails the current production;
//! failure propagates to the top, so a program with a syntax error produces
//! no AST (first-fail policy). Partially built subtrees are dropped on the
//! way out.

pub mod ast;
mod expr;

pub use ast::{BinaryOp, Node, TypeName};

use tellc_lex::{Lexer, Token, TokenKind};
use tellc_util::Handler;

/// Marker for a failed production. The diagnostic has already been
/// reported by the time this is returned.
#[derive(Debug)]
pub struct ParseFailed;

pub type ParseResult<T> = Result<T, ParseFailed>;

/// The Tell parser. Pulls tokens from the lexer one at a time.
pub struct Parser<'a> {
    lexer: Lexer<'a>,
    handler: &'a Handler,
    current: Token,
}

impl<'a> Parser<'a> {
    pub fn new(source: &'a str, handler: &'a Handler) -> Self {
        let mut lexer = Lexer::new(source, handler);
        let current = lexer.next_token();
        Self {
            lexer,
            handler,
            current,
        }
    }

    /// Parses a whole program: statements until EOF.
    pub fn parse_program(&mut self) -> ParseResult<Node> {
        let mut statements = Vec::new();

        while self.current.kind != TokenKind::Eof {
            statements.push(self.parse_statement()?);
        }

        Ok(Node::Program { statements })
    }

    fn parse_statement(&mut self) -> ParseResult<Node> {
        match self.current.kind {
            TokenKind::Num | TokenKind::Str => self.parse_variable_declaration(),
            TokenKind::When => self.parse_if_statement(),
            TokenKind::Repeat => self.parse_for_loop(),
            TokenKind::Show | TokenKind::Ask => {
                let name_token = self.advance();
                let call = self.parse_call(name_token)?;
                self.expect(TokenKind::Semicolon)?;
                Ok(call)
            }
            TokenKind::Identifier => self.parse_identifier_statement(),
            _ => {
                self.handler.error(
                    format!(
                        "unexpected token '{}' ({}) in statement",
                        self.current_lexeme(),
                        self.current.kind
                    ),
                    self.current.span,
                );
                Err(ParseFailed)
            }
        }
    }

    /// `('num'|'str') IDENT ('=' expression)? ';'`
    fn parse_variable_declaration(&mut self) -> ParseResult<Node> {
        let type_token = self.advance();
        let type_name = match type_token.kind {
            TokenKind::Num => TypeName::Num,
            TokenKind::Str => TypeName::Str,
            _ => {
                self.report_at(
                    format!(
                        "expected a type ({} or {}) but got '{}' ({})",
                        TokenKind::Num,
                        TokenKind::Str,
                        type_token.lexeme,
                        type_token.kind
                    ),
                    type_token.span,
                );
                return Err(ParseFailed);
            }
        };

        let name_token = self.expect(TokenKind::Identifier)?;

        let initializer = if self.current.kind == TokenKind::Equals {
            self.advance();
            Some(Box::new(self.parse_expression()?))
        } else {
            None
        };

        self.expect(TokenKind::Semicolon)?;

        Ok(Node::VarDecl {
            type_name,
            name: name_token.lexeme,
            initializer,
            span: type_token.span,
        })
    }

    /// `'when' '(' expression ')' block ('otherwise' block)?`
    fn parse_if_statement(&mut self) -> ParseResult<Node> {
        let when_token = self.advance();

        self.expect(TokenKind::LParen)?;
        let condition = self.parse_expression()?;
        self.expect(TokenKind::RParen)?;

        let then_body = self.parse_block()?;

        let else_body = if self.current.kind == TokenKind::Otherwise {
            self.advance();
            Some(Box::new(self.parse_block()?))
        } else {
            None
        };

        Ok(Node::If {
            condition: Box::new(condition),
            then_body: Box::new(then_body),
            else_body,
            span: when_token.span,
        })
    }

    /// `'repeat' '(' varDecl expression ';' assignExpr ')' block`
    ///
    /// The variable declaration consumes its own terminating semicolon.
    fn parse_for_loop(&mut self) -> ParseResult<Node> {
        let repeat_token = self.advance();

        self.expect(TokenKind::LParen)?;
        let init = self.parse_variable_declaration()?;
        let condition = self.parse_expression()?;
        self.expect(TokenKind::Semicolon)?;
        let increment = self.parse_assignment_expression()?;
        self.expect(TokenKind::RParen)?;

        let body = self.parse_block()?;

        Ok(Node::For {
            init: Box::new(init),
            condition: Box::new(condition),
            increment: Box::new(increment),
            body: Box::new(body),
            span: repeat_token.span,
        })
    }

    /// `IDENT ('=' expression)?` - the for-loop increment form.
    fn parse_assignment_expression(&mut self) -> ParseResult<Node> {
        if self.current.kind != TokenKind::Identifier {
            return self.parse_expression();
        }

        let id_token = self.advance();
        let left = Node::Identifier {
            name: id_token.lexeme,
            span: id_token.span,
        };

        if self.current.kind == TokenKind::Equals {
            let op_token = self.advance();
            let right = self.parse_expression()?;
            return Ok(Node::BinaryOp {
                op: BinaryOp::Assign,
                left: Box::new(left),
                right: Box::new(right),
                span: op_token.span,
            });
        }

        Ok(left)
    }

    /// Statement starting with an identifier: assignment or call. A bare
    /// identifier is rejected with a hint listing the valid forms.
    fn parse_identifier_statement(&mut self) -> ParseResult<Node> {
        let id_token = self.advance();

        if self.current.kind == TokenKind::LParen {
            let call = self.parse_call(id_token)?;
            self.expect(TokenKind::Semicolon)?;
            return Ok(call);
        }

        if self.current.kind == TokenKind::Equals {
            let op_token = self.advance();
            let left = Node::Identifier {
                name: id_token.lexeme,
                span: id_token.span,
            };
            let right = self.parse_expression()?;
            self.expect(TokenKind::Semicolon)?;
            return Ok(Node::BinaryOp {
                op: BinaryOp::Assign,
                left: Box::new(left),
                right: Box::new(right),
                span: op_token.span,
            });
        }

        let name = &id_token.lexeme;
        self.handler.error(
            format!(
                "invalid statement: the identifier '{name}' must be used in a proper \
                 statement like a variable declaration (num {name} = value;), an \
                 assignment ({name} = value;), or a call ({name}(value);)"
            ),
            id_token.span,
        );
        Err(ParseFailed)
    }

    /// `'(' expression? ')'` after the callee name has been consumed.
    fn parse_call(&mut self, name_token: Token) -> ParseResult<Node> {
        self.expect(TokenKind::LParen)?;

        let mut args = Vec::new();
        if self.current.kind != TokenKind::RParen {
            args.push(self.parse_expression()?);
        }

        self.expect(TokenKind::RParen)?;

        Ok(Node::FunctionCall {
            name: name_token.lexeme,
            args,
            span: name_token.span,
        })
    }

    /// `'{' statement* '}'`
    fn parse_block(&mut self) -> ParseResult<Node> {
        let brace_token = self.expect(TokenKind::LBrace)?;

        let mut statements = Vec::new();
        while self.current.kind != TokenKind::RBrace {
            if self.current.kind == TokenKind::Eof {
                self.handler.error(
                    format!("expected {} but got EOF", TokenKind::RBrace),
                    self.current.span,
                );
                return Err(ParseFailed);
            }
            statements.push(self.parse_statement()?);
        }

        self.expect(TokenKind::RBrace)?;

        Ok(Node::Block {
            statements,
            span: brace_token.span,
        })
    }

    /// Consumes the current token and returns it.
    pub(crate) fn advance(&mut self) -> Token {
        let next = self.lexer.next_token();
        std::mem::replace(&mut self.current, next)
    }

    /// Consumes the current token if it has the expected kind; otherwise
    /// reports `Expected X but got Y` and fails the production.
    pub(crate) fn expect(&mut self, kind: TokenKind) -> ParseResult<Token> {
        if self.current.kind == kind {
            Ok(self.advance())
        } else {
            self.handler.error(
                format!(
                    "expected {} but got '{}' ({})",
                    kind,
                    self.current_lexeme(),
                    self.current.kind
                ),
                self.current.span,
            );
            Err(ParseFailed)
        }
    }

    pub(crate) fn current(&self) -> &Token {
        &self.current
    }

    pub(crate) fn report(&self, message: String) {
        self.handler.error(message, self.current.span);
    }

    pub(crate) fn report_at(&self, message: String, span: tellc_util::Span) {
        self.handler.error(message, span);
    }

    fn current_lexeme(&self) -> &str {
        if self.current.kind == TokenKind::Eof {
            "EOF"
        } else {
            &self.current.lexeme
        }
    }
}
