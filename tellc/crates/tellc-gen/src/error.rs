//! Codegen error types.
//!
//! These are internal invariant violations: well-formed TAC produced by
//! the lowering stage never triggers them. They exist so that malformed
//! input surfaces as a typed fatal error instead of bad assembly.

use thiserror::Error;

use tellc_tac::TacOp;

#[derive(Debug, Error)]
pub enum CodegenError {
    /// An instruction reached emission without an operand its shape requires.
    #[error("malformed {op:?} instruction from line {line}: missing {what}")]
    MissingOperand {
        op: TacOp,
        what: &'static str,
        line: u32,
    },

    /// A call to a function the runtime does not provide.
    #[error("call to unknown function '{name}' from line {line}")]
    UnknownCallee { name: String, line: u32 },
}
