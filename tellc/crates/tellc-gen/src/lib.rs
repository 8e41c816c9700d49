//! tellc-gen - x86-64 assembly emission for the Tell compiler.
//!
//! Turns a TAC sequence into assembly text for a minimal runtime exposing
//! `show_num`, `show_str`, `process_exit`, and `ask_str`. Windows x64
//! calling convention: the first integer argument travels in `rcx`.

mod asm;
mod error;

pub use asm::{generate, AsmGenerator};
pub use error::CodegenError;
