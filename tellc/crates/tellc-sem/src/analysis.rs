//! The semantic analyzer.
//!
//! Expressions are typed bottom-up (children first); blocks are entered
//! top-down so a scope exists before its statements are checked. The
//! bodies of `when`/`otherwise`/`repeat` each push a scope; a `repeat`
//! initializer binds inside the loop's own scope.

use std::fmt;

use tellc_par::{BinaryOp, Node};
use tellc_util::Span;

use crate::scope::ScopeStack;
use crate::types::{DataType, SymbolKind};

/// Classification of a semantic error.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SemanticErrorKind {
    UndefinedVariable,
    DuplicateVariable,
    TypeMismatch,
    UninitializedVariable,
    /// Includes division by a literal zero.
    InvalidOperation,
}

impl fmt::Display for SemanticErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            SemanticErrorKind::UndefinedVariable => "Undefined variable",
            SemanticErrorKind::DuplicateVariable => "Duplicate variable declaration",
            SemanticErrorKind::TypeMismatch => "Type mismatch",
            SemanticErrorKind::UninitializedVariable => "Use of uninitialized variable",
            SemanticErrorKind::InvalidOperation => "Invalid operation",
        };
        f.write_str(text)
    }
}

/// One semantic error: kind, human-readable message, source position.
#[derive(Clone, Debug)]
pub struct SemanticError {
    pub kind: SemanticErrorKind,
    pub message: String,
    pub span: Span,
}

impl fmt::Display for SemanticError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Error at {}: {} - {}",
            self.span, self.kind, self.message
        )
    }
}

/// Walks the AST and collects scope and type violations.
pub struct SemanticAnalyzer {
    scopes: ScopeStack,
    errors: Vec<SemanticError>,
}

impl SemanticAnalyzer {
    pub fn new() -> Self {
        let mut scopes = ScopeStack::new();
        // The builtins live in the root scope like any other symbol, so a
        // call site resolves them through the ordinary lookup path.
        scopes.insert("show", SymbolKind::Function, DataType::Void);
        scopes.set_initialized("show");
        scopes.insert("ask", SymbolKind::Function, DataType::Str);
        scopes.set_initialized("ask");

        Self {
            scopes,
            errors: Vec::new(),
        }
    }

    /// Analyzes a program. Returns `true` iff no errors were recorded.
    pub fn analyze(&mut self, program: &Node) -> bool {
        self.analyze_node(program);
        self.errors.is_empty()
    }

    pub fn errors(&self) -> &[SemanticError] {
        &self.errors
    }

    pub fn into_errors(self) -> Vec<SemanticError> {
        self.errors
    }

    fn error(&mut self, kind: SemanticErrorKind, message: impl Into<String>, span: Span) {
        self.errors.push(SemanticError {
            kind,
            message: message.into(),
            span,
        });
    }

    fn analyze_node(&mut self, node: &Node) {
        match node {
            Node::Program { statements } | Node::Block { statements, .. } => {
                for statement in statements {
                    self.analyze_node(statement);
                }
            }

            Node::VarDecl { .. } => self.analyze_variable_declaration(node),

            Node::If {
                condition,
                then_body,
                else_body,
                span,
            } => {
                let cond_type = self.expression_type(condition);
                if cond_type != DataType::Num {
                    self.error(
                        SemanticErrorKind::TypeMismatch,
                        "If condition must be a numeric expression",
                        *span,
                    );
                }

                self.scopes.enter_scope();
                self.analyze_node(then_body);
                self.scopes.exit_scope();

                if let Some(else_body) = else_body {
                    self.scopes.enter_scope();
                    self.analyze_node(else_body);
                    self.scopes.exit_scope();
                }
            }

            Node::For {
                init,
                condition,
                increment,
                body,
                span,
            } => {
                self.scopes.enter_scope();

                self.analyze_node(init);

                let cond_type = self.expression_type(condition);
                if cond_type != DataType::Num {
                    self.error(
                        SemanticErrorKind::TypeMismatch,
                        "For loop condition must be a numeric expression",
                        *span,
                    );
                }

                self.analyze_node(increment);
                self.analyze_node(body);

                self.scopes.exit_scope();
            }

            Node::BinaryOp { .. } => {
                self.expression_type(node);
            }

            Node::FunctionCall { .. } => {
                self.expression_type(node);
            }

            // Bare literals and identifiers cannot appear as statements;
            // the parser already rejects them.
            _ => {}
        }
    }

    fn analyze_variable_declaration(&mut self, node: &Node) {
        let (type_name, name, initializer, span) = match node {
            Node::VarDecl {
                type_name,
                name,
                initializer,
                span,
            } => (*type_name, name, initializer, *span),
            _ => return,
        };

        let var_type = DataType::from(type_name);

        if !self.scopes.insert(name, SymbolKind::Variable, var_type) {
            self.error(
                SemanticErrorKind::DuplicateVariable,
                "Variable already declared in this scope",
                span,
            );
            return;
        }

        if let Some(initializer) = initializer {
            let init_type = self.expression_type(initializer);
            if init_type != var_type && init_type != DataType::Void {
                self.error(
                    SemanticErrorKind::TypeMismatch,
                    "Initializer type does not match variable type",
                    span,
                );
            } else if matches!(initializer.as_ref(), Node::FunctionCall { .. })
                || init_type == var_type
            {
                // A call result is trusted to land in the variable even
                // when its static type is void.
                self.scopes.set_initialized(name);
            }
        }
    }

    /// Computes the type of an expression, recording any violations found
    /// along the way. Analysis keeps going after an error, so one bad
    /// subtree cannot hide problems in its siblings.
    fn expression_type(&mut self, expr: &Node) -> DataType {
        match expr {
            Node::Number { .. } => DataType::Num,
            Node::String { .. } => DataType::Str,

            Node::Identifier { name, span } => {
                let (data_type, initialized) = match self.scopes.lookup(name) {
                    Some(symbol) => (symbol.data_type, symbol.is_initialized),
                    None => {
                        self.error(
                            SemanticErrorKind::UndefinedVariable,
                            format!("Use of undefined variable '{}'", name),
                            *span,
                        );
                        return DataType::Void;
                    }
                };
                if !initialized {
                    self.error(
                        SemanticErrorKind::UninitializedVariable,
                        format!("Variable '{}' is used before being initialized", name),
                        *span,
                    );
                }
                data_type
            }

            Node::BinaryOp {
                op,
                left,
                right,
                span,
            } => self.binary_op_type(*op, left, right, *span),

            Node::FunctionCall { name, args, span } => {
                for arg in args {
                    self.expression_type(arg);
                }
                self.call_type(name, args.len(), *span)
            }

            _ => DataType::Void,
        }
    }

    fn call_type(&mut self, name: &str, arg_count: usize, span: Span) -> DataType {
        let return_type = match self.scopes.lookup(name) {
            Some(symbol) if symbol.kind == SymbolKind::Function => symbol.data_type,
            Some(_) => {
                self.error(
                    SemanticErrorKind::InvalidOperation,
                    format!("'{}' is not a function", name),
                    span,
                );
                return DataType::Void;
            }
            None => {
                self.error(
                    SemanticErrorKind::UndefinedVariable,
                    format!("Call of undefined function '{}'", name),
                    span,
                );
                return DataType::Void;
            }
        };

        if name == "show" && arg_count != 1 {
            self.error(
                SemanticErrorKind::InvalidOperation,
                "show expects exactly one argument",
                span,
            );
        }

        return_type
    }

    fn binary_op_type(&mut self, op: BinaryOp, left: &Node, right: &Node, span: Span) -> DataType {
        if op == BinaryOp::Assign {
            return self.assignment_type(left, right, span);
        }

        let left_type = self.expression_type(left);
        let right_type = self.expression_type(right);

        match op {
            BinaryOp::Add | BinaryOp::Subtract | BinaryOp::Multiply | BinaryOp::Divide => {
                if left_type != DataType::Num || right_type != DataType::Num {
                    self.error(
                        SemanticErrorKind::TypeMismatch,
                        "Arithmetic operations require numeric operands",
                        span,
                    );
                    return DataType::Num;
                }
                if op == BinaryOp::Divide {
                    if let Node::Number { value: 0, .. } = right {
                        self.error(
                            SemanticErrorKind::InvalidOperation,
                            "Division by zero detected",
                            span,
                        );
                    }
                }
                DataType::Num
            }

            BinaryOp::Less | BinaryOp::Greater => {
                if left_type != right_type {
                    self.error(
                        SemanticErrorKind::TypeMismatch,
                        "Comparison operators require operands of the same type",
                        span,
                    );
                }
                // Boolean result as 0/1
                DataType::Num
            }

            BinaryOp::Assign => unreachable!("handled above"),
        }
    }

    /// `x = expr`. The left side is a store target, so looking it up must
    /// not trip the initialized-use check; a successful assignment is what
    /// initializes it.
    fn assignment_type(&mut self, left: &Node, right: &Node, span: Span) -> DataType {
        let name = match left {
            Node::Identifier { name, span } => {
                if self.scopes.lookup(name).is_none() {
                    self.error(
                        SemanticErrorKind::UndefinedVariable,
                        format!("Use of undefined variable '{}'", name),
                        *span,
                    );
                    self.expression_type(right);
                    return DataType::Void;
                }
                name.clone()
            }
            _ => {
                self.error(
                    SemanticErrorKind::InvalidOperation,
                    "Assignment target must be a variable",
                    span,
                );
                self.expression_type(right);
                return DataType::Void;
            }
        };

        let declared = self
            .scopes
            .lookup(&name)
            .map(|s| s.data_type)
            .unwrap_or(DataType::Void);
        let right_type = self.expression_type(right);

        if right_type != declared && right_type != DataType::Void {
            self.error(
                SemanticErrorKind::TypeMismatch,
                "Cannot assign value of different type",
                span,
            );
        } else {
            self.scopes.set_initialized(&name);
        }

        declared
    }
}

impl Default for SemanticAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}
