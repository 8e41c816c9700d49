//! Token model for the Tell language.

use std::fmt;

use tellc_util::Span;

/// The kind of a lexical token.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TokenKind {
    // Type keywords
    /// "num" - signed 64-bit integer type
    Num,
    /// "str" - NUL-terminated string type
    Str,

    // Statement keywords
    /// "show" - output builtin
    Show,
    /// "when" - conditional
    When,
    /// "otherwise" - alternative branch
    Otherwise,
    /// "repeat" - counted loop
    Repeat,
    /// "ask" - input builtin
    Ask,

    // Operators
    Plus,
    Minus,
    Star,
    Slash,
    Less,
    Greater,
    Equals,

    // Punctuation
    Semicolon,
    LParen,
    RParen,
    LBrace,
    RBrace,

    // Literals and names
    Identifier,
    NumberLiteral,
    StringLiteral,

    /// End of input; requesting further tokens keeps returning this.
    Eof,
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TokenKind::Num => "NUM",
            TokenKind::Str => "STR",
            TokenKind::Show => "SHOW",
            TokenKind::When => "WHEN",
            TokenKind::Otherwise => "OTHERWISE",
            TokenKind::Repeat => "REPEAT",
            TokenKind::Ask => "ASK",
            TokenKind::Plus => "PLUS",
            TokenKind::Minus => "MINUS",
            TokenKind::Star => "MULTIPLY",
            TokenKind::Slash => "DIVIDE",
            TokenKind::Less => "LESS",
            TokenKind::Greater => "GREATER",
            TokenKind::Equals => "EQUALS",
            TokenKind::Semicolon => "SEMICOLON",
            TokenKind::LParen => "LPAREN",
            TokenKind::RParen => "RPAREN",
            TokenKind::LBrace => "LBRACE",
            TokenKind::RBrace => "RBRACE",
            TokenKind::Identifier => "IDENTIFIER",
            TokenKind::NumberLiteral => "NUMBER_LITERAL",
            TokenKind::StringLiteral => "STRING_LITERAL",
            TokenKind::Eof => "EOF",
        };
        f.write_str(name)
    }
}

/// A lexical token: kind, the source text it came from, and its position.
///
/// For string literals the lexeme is the enclosed bytes with the
/// surrounding quotes stripped; for every other kind the lexeme is the
/// exact source substring.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub lexeme: String,
    pub span: Span,
}

impl Token {
    pub fn new(kind: TokenKind, lexeme: impl Into<String>, span: Span) -> Self {
        Self {
            kind,
            lexeme: lexeme.into(),
            span,
        }
    }

    pub fn eof(span: Span) -> Self {
        Self::new(TokenKind::Eof, "", span)
    }
}

/// Maps an identifier lexeme to its keyword kind, if it is one.
pub fn keyword_from_ident(ident: &str) -> Option<TokenKind> {
    match ident {
        "num" => Some(TokenKind::Num),
        "str" => Some(TokenKind::Str),
        "show" => Some(TokenKind::Show),
        "when" => Some(TokenKind::When),
        "otherwise" => Some(TokenKind::Otherwise),
        "repeat" => Some(TokenKind::Repeat),
        "ask" => Some(TokenKind::Ask),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keyword_lookup() {
        assert_eq!(keyword_from_ident("when"), Some(TokenKind::When));
        assert_eq!(keyword_from_ident("otherwise"), Some(TokenKind::Otherwise));
        assert_eq!(keyword_from_ident("count"), None);
        // Keywords are case sensitive
        assert_eq!(keyword_from_ident("Show"), None);
    }

    #[test]
    fn test_kind_display() {
        assert_eq!(format!("{}", TokenKind::Semicolon), "SEMICOLON");
        assert_eq!(format!("{}", TokenKind::NumberLiteral), "NUMBER_LITERAL");
    }
}
