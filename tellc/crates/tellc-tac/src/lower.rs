//! AST to TAC lowering.
//!
//! Expressions emit into fresh temporaries `t0, t1, ...`; control flow uses
//! fresh labels `L0, L1, ...`. The two counters live on the [`Lowerer`] and
//! start at zero for every lowering, so temp and label names are unique
//! within one compilation and independent compilations cannot contaminate
//! each other.

use tellc_par::{BinaryOp, Node};

use crate::tac::{Tac, TacOp};

/// Lowers a checked program to a flat TAC sequence.
pub fn lower(program: &Node) -> Vec<Tac> {
    let mut lowerer = Lowerer::new();
    lowerer.lower_stmt(program);
    lowerer.finish()
}

/// Owns the output buffer and the temp/label counters for one lowering.
pub struct Lowerer {
    code: Vec<Tac>,
    temp_counter: u32,
    label_counter: u32,
}

impl Lowerer {
    pub fn new() -> Self {
        Self {
            code: Vec::new(),
            temp_counter: 0,
            label_counter: 0,
        }
    }

    pub fn finish(self) -> Vec<Tac> {
        self.code
    }

    fn new_temp(&mut self) -> String {
        let name = format!("t{}", self.temp_counter);
        self.temp_counter += 1;
        name
    }

    fn new_label(&mut self) -> String {
        let name = format!("L{}", self.label_counter);
        self.label_counter += 1;
        name
    }

    fn emit(&mut self, op: TacOp, result: Option<String>, arg1: Option<String>, arg2: Option<String>, line: u32) {
        self.code.push(Tac::new(op, result, arg1, arg2, line));
    }

    /// Lowers an expression and returns the operand holding its value.
    pub fn lower_expr(&mut self, node: &Node) -> String {
        let line = node.span().line;
        match node {
            Node::Number { value, .. } => {
                let temp = self.new_temp();
                self.emit(
                    TacOp::Assign,
                    Some(temp.clone()),
                    Some(value.to_string()),
                    None,
                    line,
                );
                temp
            }

            Node::String { value, .. } => {
                let temp = self.new_temp();
                self.emit(
                    TacOp::Assign,
                    Some(temp.clone()),
                    Some(format!("\"{}\"", value)),
                    None,
                    line,
                );
                temp
            }

            Node::Identifier { name, .. } => {
                let temp = self.new_temp();
                self.emit(
                    TacOp::Assign,
                    Some(temp.clone()),
                    Some(name.clone()),
                    None,
                    line,
                );
                temp
            }

            Node::BinaryOp {
                op: BinaryOp::Assign,
                left,
                right,
                ..
            } => {
                // The left side is a store target, not a value; it gets no
                // temporary of its own.
                let value = self.lower_expr(right);
                let name = match left.as_ref() {
                    Node::Identifier { name, .. } => name.clone(),
                    other => unreachable!("assignment target must be an identifier: {:?}", other),
                };
                self.emit(
                    TacOp::Assign,
                    Some(name.clone()),
                    Some(value),
                    None,
                    line,
                );
                name
            }

            Node::BinaryOp {
                op, left, right, ..
            } => {
                let lhs = self.lower_expr(left);
                let rhs = self.lower_expr(right);
                let temp = self.new_temp();
                let tac_op = match op {
                    BinaryOp::Add => TacOp::Add,
                    BinaryOp::Subtract => TacOp::Sub,
                    BinaryOp::Multiply => TacOp::Mul,
                    BinaryOp::Divide => TacOp::Div,
                    BinaryOp::Less => TacOp::Less,
                    BinaryOp::Greater => TacOp::Greater,
                    BinaryOp::Assign => unreachable!("handled above"),
                };
                self.emit(tac_op, Some(temp.clone()), Some(lhs), Some(rhs), line);
                temp
            }

            Node::FunctionCall { name, args, .. } => {
                let arg = args.first().map(|a| self.lower_expr(a));
                let temp = self.new_temp();
                self.emit(
                    TacOp::Call,
                    Some(temp.clone()),
                    Some(name.clone()),
                    arg,
                    line,
                );
                temp
            }

            other => unreachable!("not an expression: {:?}", other),
        }
    }

    /// Lowers a statement, appending its TAC to the buffer.
    pub fn lower_stmt(&mut self, node: &Node) {
        let line = node.span().line;
        match node {
            Node::Program { statements } | Node::Block { statements, .. } => {
                for statement in statements {
                    self.lower_stmt(statement);
                }
            }

            Node::VarDecl {
                name, initializer, ..
            } => {
                // A declaration without an initializer emits nothing; the
                // data cell appears once codegen sees the first use.
                if let Some(initializer) = initializer {
                    let value = self.lower_expr(initializer);
                    self.emit(
                        TacOp::Assign,
                        Some(name.clone()),
                        Some(value),
                        None,
                        line,
                    );
                }
            }

            Node::If {
                condition,
                then_body,
                else_body,
                ..
            } => {
                let cond = self.lower_expr(condition);

                let true_label = self.new_label();
                let false_label = self.new_label();
                let end_label = self.new_label();

                self.emit(TacOp::If, Some(true_label.clone()), Some(cond), None, line);
                self.emit(TacOp::Goto, Some(false_label.clone()), None, None, line);
                self.emit(TacOp::Label, Some(true_label), None, None, line);
                self.lower_stmt(then_body);
                self.emit(TacOp::Goto, Some(end_label.clone()), None, None, line);
                self.emit(TacOp::Label, Some(false_label), None, None, line);
                if let Some(else_body) = else_body {
                    self.lower_stmt(else_body);
                }
                self.emit(TacOp::Label, Some(end_label), None, None, line);
            }

            Node::For {
                init,
                condition,
                increment,
                body,
                ..
            } => {
                self.lower_stmt(init);

                let start_label = self.new_label();
                let body_label = self.new_label();
                let end_label = self.new_label();

                self.emit(TacOp::Label, Some(start_label.clone()), None, None, line);
                let cond = self.lower_expr(condition);
                self.emit(TacOp::If, Some(body_label.clone()), Some(cond), None, line);
                self.emit(TacOp::Goto, Some(end_label.clone()), None, None, line);
                self.emit(TacOp::Label, Some(body_label), None, None, line);
                self.lower_stmt(body);
                self.lower_expr(increment);
                self.emit(TacOp::Goto, Some(start_label), None, None, line);
                self.emit(TacOp::Label, Some(end_label), None, None, line);
            }

            Node::FunctionCall { name, args, .. } => {
                let arg = args.first().map(|a| self.lower_expr(a));
                // `show` is a pure statement; other calls keep their value
                // in a temp even when it goes unused.
                let result = if name == "show" {
                    None
                } else {
                    Some(self.new_temp())
                };
                self.emit(TacOp::Call, result, Some(name.clone()), arg, line);
            }

            Node::BinaryOp { .. } => {
                self.lower_expr(node);
            }

            other => unreachable!("not a statement: {:?}", other),
        }
    }
}

impl Default for Lowerer {
    fn default() -> Self {
        Self::new()
    }
}
