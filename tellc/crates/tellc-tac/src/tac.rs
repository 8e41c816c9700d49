//! TAC instruction model.
//!
//! Each instruction has at most one result and two source operands, all
//! plain strings. An operand is one of: a user variable name, a temporary
//! `tN`, a label `LN`, an integer literal (possibly negative), or a string
//! literal kept in its double quotes. Instruction order in the `Vec` is
//! the contract codegen consumes.

use std::fmt;

/// TAC operation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TacOp {
    /// `result = arg1`
    Assign,
    /// `result = arg1 + arg2`
    Add,
    /// `result = arg1 - arg2`
    Sub,
    /// `result = arg1 * arg2`
    Mul,
    /// `result = arg1 / arg2`
    Div,
    /// `result = -arg1`
    Neg,
    /// `result = arg1 < arg2`
    Less,
    /// `result = arg1 > arg2`
    Greater,
    /// `result = arg1 == arg2`
    Eq,
    /// `result = arg1 != arg2`
    Neq,
    /// `result = arg1 <= arg2`
    LessEq,
    /// `result = arg1 >= arg2`
    GreaterEq,
    /// `result:`
    Label,
    /// `if arg1 goto result`
    If,
    /// `goto result`
    Goto,
    /// `result = call arg1, arg2`; a statement call has no result
    Call,
}

impl TacOp {
    /// The infix symbol for binary operations.
    pub fn symbol(self) -> &'static str {
        match self {
            TacOp::Add => "+",
            TacOp::Sub => "-",
            TacOp::Mul => "*",
            TacOp::Div => "/",
            TacOp::Less => "<",
            TacOp::Greater => ">",
            TacOp::Eq => "==",
            TacOp::Neq => "!=",
            TacOp::LessEq => "<=",
            TacOp::GreaterEq => ">=",
            _ => "",
        }
    }

    pub fn is_binary(self) -> bool {
        matches!(
            self,
            TacOp::Add
                | TacOp::Sub
                | TacOp::Mul
                | TacOp::Div
                | TacOp::Less
                | TacOp::Greater
                | TacOp::Eq
                | TacOp::Neq
                | TacOp::LessEq
                | TacOp::GreaterEq
        )
    }

    pub fn is_comparison(self) -> bool {
        matches!(
            self,
            TacOp::Less
                | TacOp::Greater
                | TacOp::Eq
                | TacOp::Neq
                | TacOp::LessEq
                | TacOp::GreaterEq
        )
    }
}

/// One TAC instruction.
#[derive(Clone, Debug, PartialEq)]
pub struct Tac {
    pub op: TacOp,
    pub result: Option<String>,
    pub arg1: Option<String>,
    pub arg2: Option<String>,
    /// Source line this instruction was lowered from.
    pub line: u32,
}

impl Tac {
    pub fn new(
        op: TacOp,
        result: Option<String>,
        arg1: Option<String>,
        arg2: Option<String>,
        line: u32,
    ) -> Self {
        Self {
            op,
            result,
            arg1,
            arg2,
            line,
        }
    }
}

impl fmt::Display for Tac {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let result = self.result.as_deref().unwrap_or("");
        let arg1 = self.arg1.as_deref().unwrap_or("");
        let arg2 = self.arg2.as_deref().unwrap_or("");

        match self.op {
            TacOp::Assign => write!(f, "{} = {}", result, arg1),
            TacOp::Neg => write!(f, "{} = -{}", result, arg1),
            TacOp::Label => write!(f, "{}:", result),
            TacOp::If => write!(f, "if {} goto {}", arg1, result),
            TacOp::Goto => write!(f, "goto {}", result),
            TacOp::Call => {
                if self.result.is_some() {
                    write!(f, "{} = call {}, {}", result, arg1, arg2)
                } else {
                    write!(f, "call {}, {}", arg1, arg2)
                }
            }
            op => write!(f, "{} = {} {} {}", result, arg1, op.symbol(), arg2),
        }
    }
}

/// True for compiler temporaries `tN`.
pub fn is_temp_name(name: &str) -> bool {
    let mut chars = name.chars();
    chars.next() == Some('t') && {
        let rest = chars.as_str();
        !rest.is_empty() && rest.bytes().all(|b| b.is_ascii_digit())
    }
}

/// True for label names `LN`.
pub fn is_label_name(name: &str) -> bool {
    let mut chars = name.chars();
    chars.next() == Some('L') && {
        let rest = chars.as_str();
        !rest.is_empty() && rest.bytes().all(|b| b.is_ascii_digit())
    }
}

/// True for integer literals, including a leading minus.
pub fn is_numeric_literal(operand: &str) -> bool {
    let digits = operand.strip_prefix('-').unwrap_or(operand);
    !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit())
}

/// True for string literals (kept in their double quotes).
pub fn is_string_literal(operand: &str) -> bool {
    operand.starts_with('"')
}
