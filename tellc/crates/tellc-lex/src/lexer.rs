//! Main lexer implementation for the Tell language.

use tellc_util::{Handler, Span};

use crate::cursor::Cursor;
use crate::token::{keyword_from_ident, Token, TokenKind};

/// The Tell lexer.
///
/// Produces tokens on demand via [`next_token`](Lexer::next_token). The
/// final token is [`TokenKind::Eof`] and can be requested repeatedly.
/// A `-` always lexes as [`TokenKind::Minus`]; whether it denotes
/// subtraction or a negative literal is decided by the parser, where the
/// surrounding context is known.
pub struct Lexer<'a> {
    /// Character cursor over the source.
    cursor: Cursor<'a>,

    /// Diagnostic sink for unknown characters and unterminated strings.
    handler: &'a Handler,

    /// Start position of the token currently being scanned.
    token_start: usize,

    /// Start line/column of the token currently being scanned.
    token_span: Span,
}

impl<'a> Lexer<'a> {
    /// Creates a new lexer for the given source text.
    ///
    /// # Arguments
    ///
    /// * `source` - The source code to lex
    /// * `handler` - Diagnostic sink for reporting lexical errors
    ///
    /// # Example
    ///
    /// ```
    /// use tellc_lex::Lexer;
    /// use tellc_util::Handler;
    ///
    /// let handler = Handler::new();
    /// let lexer = Lexer::new("num x = 42;", &handler);
    /// ```
    pub fn new(source: &'a str, handler: &'a Handler) -> Self {
        Self {
            cursor: Cursor::new(source),
            handler,
            token_start: 0,
            token_span: Span::new(1, 1),
        }
    }

    /// Returns the next token from the source.
    ///
    /// Skips whitespace and comments, records the token's start position,
    /// then dispatches on the first character.
    ///
    /// # Returns
    ///
    /// The next token, or an EOF token at the end of input.
    ///
    /// # Example
    ///
    /// ```
    /// use tellc_lex::{Lexer, TokenKind};
    /// use tellc_util::Handler;
    ///
    /// let handler = Handler::new();
    /// let mut lexer = Lexer::new("num x = 42;", &handler);
    ///
    /// assert_eq!(lexer.next_token().kind, TokenKind::Num);
    /// let name = lexer.next_token();
    /// assert_eq!(name.kind, TokenKind::Identifier);
    /// assert_eq!(name.lexeme, "x");
    /// ```
    pub fn next_token(&mut self) -> Token {
        loop {
            self.skip_whitespace_and_comments();

            self.token_start = self.cursor.position();
            self.token_span = Span::new(self.cursor.line(), self.cursor.column());

            if self.cursor.is_at_end() {
                return Token::eof(self.token_span);
            }

            let c = self.cursor.current_char();
            match c {
                '+' => return self.single(TokenKind::Plus),
                '-' => return self.single(TokenKind::Minus),
                '*' => return self.single(TokenKind::Star),
                '/' => return self.single(TokenKind::Slash),
                '<' => return self.single(TokenKind::Less),
                '>' => return self.single(TokenKind::Greater),
                '=' => return self.single(TokenKind::Equals),
                ';' => return self.single(TokenKind::Semicolon),
                '(' => return self.single(TokenKind::LParen),
                ')' => return self.single(TokenKind::RParen),
                '{' => return self.single(TokenKind::LBrace),
                '}' => return self.single(TokenKind::RBrace),
                '"' => return self.lex_string(),
                c if c.is_ascii_digit() => return self.lex_number(),
                c if is_ident_start(c) => return self.lex_identifier(),
                c => {
                    self.handler
                        .error(format!("unexpected character '{}'", c), self.token_span);
                    self.cursor.advance();
                    // Keep scanning; lexical errors never abort the stream.
                }
            }
        }
    }

    fn single(&mut self, kind: TokenKind) -> Token {
        let c = self.cursor.current_char();
        self.cursor.advance();
        Token::new(kind, c.to_string(), self.token_span)
    }

    /// Lexes an identifier or keyword: `[A-Za-z_][A-Za-z0-9_]*`.
    fn lex_identifier(&mut self) -> Token {
        while is_ident_continue(self.cursor.current_char()) {
            self.cursor.advance();
        }

        let text = self.cursor.slice_from(self.token_start);
        let kind = keyword_from_ident(text).unwrap_or(TokenKind::Identifier);
        Token::new(kind, text, self.token_span)
    }

    /// Lexes a decimal number literal: `[0-9]+`.
    fn lex_number(&mut self) -> Token {
        while self.cursor.current_char().is_ascii_digit() {
            self.cursor.advance();
        }

        let text = self.cursor.slice_from(self.token_start);
        Token::new(TokenKind::NumberLiteral, text, self.token_span)
    }

    /// Lexes a string literal. No escape processing; the lexeme is the
    /// enclosed bytes with the quotes stripped.
    fn lex_string(&mut self) -> Token {
        self.cursor.advance(); // opening quote

        let content_start = self.cursor.position();
        while self.cursor.current_char() != '"' && !self.cursor.is_at_end() {
            self.cursor.advance();
        }

        let text = self.cursor.slice_from(content_start).to_string();

        if self.cursor.is_at_end() {
            self.handler
                .error("unterminated string literal", self.token_span);
        } else {
            self.cursor.advance(); // closing quote
        }

        Token::new(TokenKind::StringLiteral, text, self.token_span)
    }

    fn skip_whitespace_and_comments(&mut self) {
        loop {
            let c = self.cursor.current_char();
            if c == ' ' || c == '\t' || c == '\r' || c == '\n' {
                self.cursor.advance();
            } else if c == '/' && self.cursor.peek_char(1) == '/' {
                while self.cursor.current_char() != '\n' && !self.cursor.is_at_end() {
                    self.cursor.advance();
                }
            } else {
                break;
            }
        }
    }
}

/// `[A-Za-z_]`
fn is_ident_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_'
}

/// `[A-Za-z0-9_]`
fn is_ident_continue(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lex_all(source: &str) -> Vec<Token> {
        let handler = Handler::new();
        let mut lexer = Lexer::new(source, &handler);
        let mut tokens = Vec::new();
        loop {
            let token = lexer.next_token();
            let done = token.kind == TokenKind::Eof;
            tokens.push(token);
            if done {
                break;
            }
        }
        tokens
    }

    fn kinds(source: &str) -> Vec<TokenKind> {
        lex_all(source).into_iter().map(|t| t.kind).collect()
    }

    #[test]
    fn test_keywords_and_identifier() {
        assert_eq!(
            kinds("num x"),
            vec![TokenKind::Num, TokenKind::Identifier, TokenKind::Eof]
        );
        assert_eq!(
            kinds("when otherwise repeat show ask str"),
            vec![
                TokenKind::When,
                TokenKind::Otherwise,
                TokenKind::Repeat,
                TokenKind::Show,
                TokenKind::Ask,
                TokenKind::Str,
                TokenKind::Eof
            ]
        );
    }

    #[test]
    fn test_declaration_token_stream() {
        let tokens = lex_all("num count = 42;");
        let expected = [
            (TokenKind::Num, "num"),
            (TokenKind::Identifier, "count"),
            (TokenKind::Equals, "="),
            (TokenKind::NumberLiteral, "42"),
            (TokenKind::Semicolon, ";"),
            (TokenKind::Eof, ""),
        ];
        for (token, (kind, lexeme)) in tokens.iter().zip(expected) {
            assert_eq!(token.kind, kind);
            assert_eq!(token.lexeme, lexeme);
        }
    }

    #[test]
    fn test_minus_is_always_an_operator() {
        // `a-3` must lex as subtraction, never a negative literal.
        assert_eq!(
            kinds("a-3"),
            vec![
                TokenKind::Identifier,
                TokenKind::Minus,
                TokenKind::NumberLiteral,
                TokenKind::Eof
            ]
        );
    }

    #[test]
    fn test_string_literal_strips_quotes() {
        let tokens = lex_all("\"hi there\"");
        assert_eq!(tokens[0].kind, TokenKind::StringLiteral);
        assert_eq!(tokens[0].lexeme, "hi there");
    }

    #[test]
    fn test_unterminated_string_is_reported() {
        let handler = Handler::new();
        let mut lexer = Lexer::new("\"oops", &handler);
        let token = lexer.next_token();
        assert_eq!(token.kind, TokenKind::StringLiteral);
        assert_eq!(token.lexeme, "oops");
        assert!(handler.has_errors());
    }

    #[test]
    fn test_line_comment_skipped() {
        assert_eq!(
            kinds("num x; // trailing note\nnum y;"),
            vec![
                TokenKind::Num,
                TokenKind::Identifier,
                TokenKind::Semicolon,
                TokenKind::Num,
                TokenKind::Identifier,
                TokenKind::Semicolon,
                TokenKind::Eof
            ]
        );
    }

    #[test]
    fn test_positions_round_trip() {
        let source = "num x = 1;\nshow(x);";
        let tokens = lex_all(source);
        let lines: Vec<&str> = source.lines().collect();
        for token in &tokens {
            if token.kind == TokenKind::Eof || token.kind == TokenKind::StringLiteral {
                continue;
            }
            let line = lines[(token.span.line - 1) as usize];
            let col = (token.span.column - 1) as usize;
            assert!(
                line[col..].starts_with(&token.lexeme),
                "token {:?} does not match source at {}",
                token,
                token.span
            );
        }
    }

    #[test]
    fn test_unknown_character_reported_and_skipped() {
        let handler = Handler::new();
        let mut lexer = Lexer::new("num @x;", &handler);
        let mut kinds = Vec::new();
        loop {
            let t = lexer.next_token();
            if t.kind == TokenKind::Eof {
                break;
            }
            kinds.push(t.kind);
        }
        assert_eq!(
            kinds,
            vec![TokenKind::Num, TokenKind::Identifier, TokenKind::Semicolon]
        );
        assert_eq!(handler.error_count(), 1);
        assert!(handler.diagnostics()[0].message.contains('@'));
    }

    #[test]
    fn test_eof_is_repeatable() {
        let handler = Handler::new();
        let mut lexer = Lexer::new("", &handler);
        assert_eq!(lexer.next_token().kind, TokenKind::Eof);
        assert_eq!(lexer.next_token().kind, TokenKind::Eof);
    }

    #[test]
    fn test_column_resets_after_newline() {
        let tokens = lex_all("x\ny");
        assert_eq!(tokens[0].span, Span::new(1, 1));
        assert_eq!(tokens[1].span, Span::new(2, 1));
    }
}
