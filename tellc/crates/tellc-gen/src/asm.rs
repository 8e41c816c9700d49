//! The assembly generator.
//!
//! Two passes over the TAC list. The first discovers the data section:
//! every operand that is not a literal, not a label, and not a callee name
//! becomes a zero-initialized quadword cell, and every string literal gets
//! its own `string_<k>` (or, for literals used directly as call arguments,
//! `temp_string_<k>`) byte label. The second pass emits the text section
//! one instruction at a time.
//!
//! Variables holding string pointers are tracked in a set so that `show`
//! can dispatch between `show_num` and `show_str`: the set is seeded by
//! string-literal assignments and grows along the linear walk through
//! copies and `ask` results.

use std::collections::HashMap;
use std::fmt::Write;

use tellc_tac::{is_label_name, is_numeric_literal, is_string_literal, Tac, TacOp};
use tellc_util::FxIndexSet;

use crate::error::CodegenError;

/// Generates the assembly for a TAC sequence.
///
/// The returned text starts at `section .data`; the driver prepends the
/// `default rel` prologue before writing it out.
pub fn generate(code: &[Tac]) -> Result<String, CodegenError> {
    let mut generator = AsmGenerator::new();
    generator.generate(code)
}

/// Emission state for one TAC sequence.
pub struct AsmGenerator {
    output: String,
    /// Variables currently known to hold string pointers.
    string_vars: FxIndexSet<String>,
    /// Labels for string literals assigned into variables, by instruction
    /// index.
    assign_strings: HashMap<usize, String>,
    /// Labels for string literals passed directly to a call, by
    /// instruction index.
    call_strings: HashMap<usize, String>,
}

impl AsmGenerator {
    pub fn new() -> Self {
        Self {
            // Real programs need at least this much; growth doubles.
            output: String::with_capacity(1024),
            string_vars: FxIndexSet::default(),
            assign_strings: HashMap::new(),
            call_strings: HashMap::new(),
        }
    }

    pub fn generate(&mut self, code: &[Tac]) -> Result<String, CodegenError> {
        self.emit_data_section(code);
        self.emit_text_section(code)?;
        Ok(std::mem::take(&mut self.output))
    }

    /// Pass 1: collect data cells and string labels, then emit `.data`.
    fn emit_data_section(&mut self, code: &[Tac]) {
        let mut cells: FxIndexSet<String> = FxIndexSet::default();

        for tac in code {
            let mut add = |operand: &Option<String>| {
                if let Some(operand) = operand {
                    if !operand.is_empty()
                        && !is_numeric_literal(operand)
                        && !is_string_literal(operand)
                        && !is_label_name(operand)
                        && !cells.contains(operand.as_str())
                    {
                        cells.insert(operand.clone());
                    }
                }
            };

            match tac.op {
                // Branch targets and label definitions name code, not data.
                TacOp::Label | TacOp::Goto => {}
                TacOp::If => add(&tac.arg1),
                // arg1 of a call is the callee, not a variable.
                TacOp::Call => {
                    add(&tac.result);
                    add(&tac.arg2);
                }
                _ => {
                    add(&tac.result);
                    add(&tac.arg1);
                    add(&tac.arg2);
                }
            }
        }

        self.line("section .data");
        for cell in &cells {
            self.line(&format!("    {}: dq 0", cell));
        }

        // String literals: assignments get string_<k> labels and mark
        // their destination as string-valued; direct call arguments get
        // inline temp_string_<k> labels.
        let mut string_count = 0usize;
        let mut temp_string_count = 0usize;
        for (index, tac) in code.iter().enumerate() {
            match tac.op {
                TacOp::Assign => {
                    if let Some(arg1) = &tac.arg1 {
                        if is_string_literal(arg1) {
                            let label = format!("string_{}", string_count);
                            string_count += 1;
                            self.line(&format!("    {}: db {}, 0", label, arg1));
                            self.assign_strings.insert(index, label);
                            if let Some(result) = &tac.result {
                                self.string_vars.insert(result.clone());
                            }
                        }
                    }
                }
                TacOp::Call => {
                    if let Some(arg2) = &tac.arg2 {
                        if is_string_literal(arg2) {
                            let label = format!("temp_string_{}", temp_string_count);
                            temp_string_count += 1;
                            self.line(&format!("    {}: db {}, 0", label, arg2));
                            self.call_strings.insert(index, label);
                        }
                    }
                }
                _ => {}
            }
        }
    }

    /// Pass 2: emit `.text` with one block per instruction, then the
    /// process-exit epilogue.
    fn emit_text_section(&mut self, code: &[Tac]) -> Result<(), CodegenError> {
        let uses_ask = code
            .iter()
            .any(|t| t.op == TacOp::Call && t.arg1.as_deref() == Some("ask"));

        self.line("");
        self.line("section .text");
        self.line("global _start");
        self.line("extern show_num");
        self.line("extern show_str");
        self.line("extern process_exit");
        if uses_ask {
            self.line("extern ask_str");
        }
        self.line("");
        self.line("_start:");

        for (index, tac) in code.iter().enumerate() {
            self.emit_instruction(index, tac)?;
        }

        self.line("");
        self.line("    mov rcx, 0");
        self.line("    call process_exit");
        Ok(())
    }

    fn emit_instruction(&mut self, index: usize, tac: &Tac) -> Result<(), CodegenError> {
        match tac.op {
            TacOp::Assign => {
                let result = required(tac, &tac.result, "result")?.to_string();
                let arg1 = required(tac, &tac.arg1, "source operand")?.to_string();

                if let Some(label) = self.assign_strings.get(&index).cloned() {
                    self.line(&format!("    lea rax, [rel {}]", label));
                } else if is_numeric_literal(&arg1) {
                    self.line(&format!("    mov rax, {}", arg1));
                } else {
                    self.line(&format!("    mov rax, [{}]", arg1));
                    // Copying a string pointer keeps the destination
                    // string-valued.
                    if self.string_vars.contains(arg1.as_str()) {
                        self.string_vars.insert(result.clone());
                    }
                }
                self.line(&format!("    mov [{}], rax", result));
            }

            TacOp::Add | TacOp::Sub | TacOp::Mul => {
                let result = required(tac, &tac.result, "result")?.to_string();
                let arg1 = required(tac, &tac.arg1, "left operand")?.to_string();
                let arg2 = required(tac, &tac.arg2, "right operand")?.to_string();
                let mnemonic = match tac.op {
                    TacOp::Add => "add",
                    TacOp::Sub => "sub",
                    _ => "imul",
                };
                self.load_rax(&arg1);
                let rhs = self.rhs_operand(&arg2);
                self.line(&format!("    {} rax, {}", mnemonic, rhs));
                self.line(&format!("    mov [{}], rax", result));
            }

            TacOp::Div => {
                let result = required(tac, &tac.result, "result")?.to_string();
                let arg1 = required(tac, &tac.arg1, "dividend")?.to_string();
                let arg2 = required(tac, &tac.arg2, "divisor")?.to_string();
                self.load_rax(&arg1);
                let divisor = self.rhs_operand(&arg2);
                self.line("    cqo");
                self.line(&format!("    idiv {}", divisor));
                self.line(&format!("    mov [{}], rax", result));
            }

            TacOp::Neg => {
                let result = required(tac, &tac.result, "result")?.to_string();
                let arg1 = required(tac, &tac.arg1, "operand")?.to_string();
                self.load_rax(&arg1);
                self.line("    neg rax");
                self.line(&format!("    mov [{}], rax", result));
            }

            op if op.is_comparison() => {
                let result = required(tac, &tac.result, "result")?.to_string();
                let arg1 = required(tac, &tac.arg1, "left operand")?.to_string();
                let arg2 = required(tac, &tac.arg2, "right operand")?.to_string();
                let setcc = match op {
                    TacOp::Less => "setl",
                    TacOp::Greater => "setg",
                    TacOp::Eq => "sete",
                    TacOp::Neq => "setne",
                    TacOp::LessEq => "setle",
                    _ => "setge",
                };
                self.load_rax(&arg1);
                let rhs = self.rhs_operand(&arg2);
                self.line(&format!("    cmp rax, {}", rhs));
                self.line(&format!("    {} al", setcc));
                self.line("    movzx rax, al");
                self.line(&format!("    mov [{}], rax", result));
            }

            TacOp::If => {
                let target = required(tac, &tac.result, "branch target")?.to_string();
                let arg1 = required(tac, &tac.arg1, "condition")?.to_string();
                self.line(&format!("    mov rax, [{}]", arg1));
                self.line("    cmp rax, 0");
                self.line(&format!("    jne {}", target));
            }

            TacOp::Goto => {
                let target = required(tac, &tac.result, "jump target")?.to_string();
                self.line(&format!("    jmp {}", target));
            }

            TacOp::Label => {
                let name = required(tac, &tac.result, "label name")?.to_string();
                self.line(&format!("{}:", name));
            }

            TacOp::Call => self.emit_call(index, tac)?,

            _ => unreachable!(),
        }
        Ok(())
    }

    fn emit_call(&mut self, index: usize, tac: &Tac) -> Result<(), CodegenError> {
        let callee = required(tac, &tac.arg1, "callee")?.to_string();

        match callee.as_str() {
            "show" => {
                let arg = required(tac, &tac.arg2, "argument")?.to_string();
                if let Some(label) = self.call_strings.get(&index).cloned() {
                    self.line(&format!("    lea rcx, [rel {}]", label));
                    self.line("    call show_str");
                } else if is_numeric_literal(&arg) {
                    self.line(&format!("    mov rcx, {}", arg));
                    self.line("    call show_num");
                } else if self.string_vars.contains(arg.as_str()) {
                    self.line(&format!("    mov rcx, [{}]", arg));
                    self.line("    call show_str");
                } else {
                    self.line(&format!("    mov rcx, [{}]", arg));
                    self.line("    call show_num");
                }
            }

            "ask" => {
                match (self.call_strings.get(&index).cloned(), &tac.arg2) {
                    (Some(label), _) => self.line(&format!("    lea rcx, [rel {}]", label)),
                    (None, Some(arg)) if is_numeric_literal(arg) => {
                        self.line(&format!("    mov rcx, {}", arg))
                    }
                    (None, Some(arg)) => self.line(&format!("    mov rcx, [{}]", arg)),
                    (None, None) => self.line("    mov rcx, 0"),
                }
                self.line("    call ask_str");
                if let Some(result) = &tac.result {
                    self.line(&format!("    mov [{}], rax", result));
                    self.string_vars.insert(result.clone());
                }
            }

            _ => {
                return Err(CodegenError::UnknownCallee {
                    name: callee,
                    line: tac.line,
                });
            }
        }
        Ok(())
    }

    /// Loads a first operand into rax: literals as immediates, anything
    /// else from its data cell.
    fn load_rax(&mut self, operand: &str) {
        if is_numeric_literal(operand) {
            self.line(&format!("    mov rax, {}", operand));
        } else {
            self.line(&format!("    mov rax, [{}]", operand));
        }
    }

    /// Prepares a second operand. Memory cells are referenced in place;
    /// literals are staged through rbx, since the 64-bit forms of
    /// `idiv`/`cmp` do not take wide immediates.
    fn rhs_operand(&mut self, operand: &str) -> String {
        if is_numeric_literal(operand) {
            self.line(&format!("    mov rbx, {}", operand));
            "rbx".to_string()
        } else {
            format!("qword [{}]", operand)
        }
    }

    fn line(&mut self, text: &str) {
        // Writing to a String cannot fail.
        let _ = writeln!(self.output, "{}", text);
    }
}

impl Default for AsmGenerator {
    fn default() -> Self {
        Self::new()
    }
}

fn required<'t>(
    tac: &Tac,
    operand: &'t Option<String>,
    what: &'static str,
) -> Result<&'t str, CodegenError> {
    operand.as_deref().ok_or(CodegenError::MissingOperand {
        op: tac.op,
        what,
        line: tac.line,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tellc_tac::{is_label_name, lower};
    use tellc_par::Parser;
    use tellc_util::Handler;

    fn lower_source(source: &str) -> Vec<Tac> {
        let handler = Handler::new();
        let mut parser = Parser::new(source, &handler);
        let program = parser.parse_program().expect("program should parse");
        assert!(!handler.has_errors());
        lower(&program)
    }

    fn compile(source: &str) -> String {
        generate(&lower_source(source)).expect("codegen should succeed")
    }

    #[test]
    fn test_hello_world_assembly() {
        let asm = compile("show(\"hi\");");
        assert!(asm.contains("string_0: db \"hi\", 0"));
        assert!(asm.contains("lea rax, [rel string_0]"));
        assert!(asm.contains("mov rcx, [t0]"));
        assert!(asm.contains("call show_str"));
        assert!(asm.contains("call process_exit"));
    }

    #[test]
    fn test_numeric_show_dispatches_to_show_num() {
        let asm = compile("num x = 2 + 3 * 4; show(x);");
        assert!(asm.contains("imul"));
        assert!(asm.contains("call show_num"));
        assert!(!asm.contains("call show_str"));
    }

    #[test]
    fn test_data_section_completeness() {
        let code = lower_source("num x = 1; num y = x + 2; show(y);");
        let asm = generate(&code).expect("codegen should succeed");
        let data: Vec<&str> = asm
            .lines()
            .take_while(|l| !l.starts_with("section .text"))
            .collect();
        for tac in &code {
            let operands = [&tac.result, &tac.arg1, &tac.arg2];
            for operand in operands.into_iter().flatten() {
                if tellc_tac::is_numeric_literal(operand)
                    || tellc_tac::is_string_literal(operand)
                    || is_label_name(operand)
                    || operand == "show"
                {
                    continue;
                }
                let cell = format!("{}: dq 0", operand);
                assert!(
                    data.iter().any(|l| l.trim() == cell),
                    "no data cell for {}",
                    operand
                );
            }
        }
    }

    #[test]
    fn test_each_string_literal_gets_its_own_label() {
        let asm = compile("str a = \"one\"; str b = \"two\"; show(a); show(b);");
        assert!(asm.contains("string_0: db \"one\", 0"));
        assert!(asm.contains("string_1: db \"two\", 0"));
    }

    #[test]
    fn test_string_flag_propagates_through_copies() {
        // a holds a string; b copies a; showing b must use show_str.
        let asm = compile("str a = \"x\"; str b = a; show(b);");
        assert!(asm.contains("call show_str"));
        assert!(!asm.contains("call show_num"));
    }

    #[test]
    fn test_division_uses_cqo_idiv() {
        let asm = compile("num a = 9; num b = 3; num c = a / b; show(c);");
        assert!(asm.contains("cqo"));
        assert!(asm.contains("idiv qword ["));
    }

    #[test]
    fn test_comparison_materializes_boolean() {
        let asm = compile("num a = 1; num b = a < 2; show(b);");
        assert!(asm.contains("setl al"));
        assert!(asm.contains("movzx rax, al"));
    }

    #[test]
    fn test_branch_emission() {
        let asm = compile("num a = 5; when (a > 3) { show(1); } otherwise { show(2); }");
        assert!(asm.contains("cmp rax, 0"));
        assert!(asm.contains("jne L0"));
        assert!(asm.contains("jmp L1"));
        assert!(asm.contains("\nL0:\n"));
        assert!(asm.contains("\nL1:\n"));
        assert!(asm.contains("\nL2:\n"));
        assert!(asm.contains("setg al"));
    }

    #[test]
    fn test_loop_emission() {
        let asm = compile("repeat (num i = 0; i < 3; i = i + 1) { show(i); }");
        assert!(asm.contains("jmp L0")); // back edge
        assert!(asm.contains("jne L1")); // into the body
        assert!(asm.contains("jmp L2")); // exit
    }

    #[test]
    fn test_ask_call_and_string_result() {
        let asm = compile("str reply = ask(\"name?\"); show(reply);");
        assert!(asm.contains("extern ask_str"));
        assert!(asm.contains("call ask_str"));
        // the prompt literal was materialized into a temp first
        assert!(asm.contains("string_0: db \"name?\", 0"));
        // the result flows through reply and shows as a string
        assert!(asm.contains("call show_str"));
    }

    #[test]
    fn test_ask_extern_absent_without_ask() {
        let asm = compile("show(1);");
        assert!(!asm.contains("extern ask_str"));
    }

    #[test]
    fn test_show_literal_argument_inline_string() {
        // Direct string-literal call arguments only appear in hand-built
        // TAC; lowering always goes through a temp.
        let code = vec![Tac::new(
            TacOp::Call,
            None,
            Some("show".into()),
            Some("\"direct\"".into()),
            1,
        )];
        let asm = generate(&code).expect("codegen should succeed");
        assert!(asm.contains("temp_string_0: db \"direct\", 0"));
        assert!(asm.contains("lea rcx, [rel temp_string_0]"));
        assert!(asm.contains("call show_str"));
    }

    #[test]
    fn test_show_numeric_literal_argument() {
        let code = vec![Tac::new(
            TacOp::Call,
            None,
            Some("show".into()),
            Some("-7".into()),
            1,
        )];
        let asm = generate(&code).expect("codegen should succeed");
        assert!(asm.contains("mov rcx, -7"));
        assert!(asm.contains("call show_num"));
    }

    #[test]
    fn test_unknown_callee_is_fatal() {
        let code = vec![Tac::new(
            TacOp::Call,
            None,
            Some("launch".into()),
            None,
            3,
        )];
        let err = generate(&code).unwrap_err();
        assert!(matches!(err, CodegenError::UnknownCallee { .. }));
        assert!(err.to_string().contains("launch"));
    }

    #[test]
    fn test_missing_operand_is_fatal() {
        let code = vec![Tac::new(TacOp::Add, Some("t0".into()), None, None, 2)];
        let err = generate(&code).unwrap_err();
        assert!(matches!(err, CodegenError::MissingOperand { .. }));
    }

    #[test]
    fn test_epilogue_exits_with_zero() {
        let asm = compile("show(1);");
        let tail: Vec<&str> = asm.lines().rev().take(2).collect();
        assert_eq!(tail[0], "    call process_exit");
        assert_eq!(tail[1], "    mov rcx, 0");
    }

    #[test]
    fn test_negation_emission() {
        let code = vec![
            Tac::new(
                TacOp::Assign,
                Some("t0".into()),
                Some("5".into()),
                None,
                1,
            ),
            Tac::new(TacOp::Neg, Some("t1".into()), Some("t0".into()), None, 1),
            Tac::new(
                TacOp::Call,
                None,
                Some("show".into()),
                Some("t1".into()),
                1,
            ),
        ];
        let asm = generate(&code).expect("codegen should succeed");
        assert!(asm.contains("neg rax"));
    }
}
