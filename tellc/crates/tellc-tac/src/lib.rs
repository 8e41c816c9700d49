//! tellc-tac - Three-address code for the Tell compiler.
//!
//! The flat linear IR between the AST and assembly emission. [`lower`]
//! turns a checked AST into a `Vec<Tac>`; the [`optimize`] module holds
//! the optional cleanup passes the driver can run before codegen.

pub mod lower;
pub mod optimize;
pub mod tac;

pub use lower::{lower, Lowerer};
pub use optimize::optimize;
pub use tac::{
    is_label_name, is_numeric_literal, is_string_literal, is_temp_name, Tac, TacOp,
};
