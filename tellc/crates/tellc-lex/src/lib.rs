//! tellc-lex - Lexical analysis for the Tell language.
//!
//! Transforms source text into a stream of tokens on demand. Whitespace and
//! `//` line comments are skipped, every token carries its 1-based source
//! position, and unknown characters are reported through the shared
//! [`Handler`](tellc_util::Handler) without aborting the scan.

pub mod cursor;
pub mod lexer;
pub mod token;

pub use cursor::Cursor;
pub use lexer::Lexer;
pub use token::{keyword_from_ident, Token, TokenKind};
