//! tellc-sem - Semantic analysis for the Tell language.
//!
//! Checks the AST against the scope and typing rules and accumulates every
//! violation instead of stopping at the first one. Analysis succeeds iff
//! the error list stays empty; the driver only lowers to TAC on success.

mod analysis;
pub mod scope;
pub mod types;

pub use analysis::{SemanticAnalyzer, SemanticError, SemanticErrorKind};
pub use scope::{ScopeStack, Symbol};
pub use types::{DataType, SymbolKind};
