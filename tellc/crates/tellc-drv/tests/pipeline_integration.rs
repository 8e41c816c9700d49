//! Whole-pipeline tests: source text in, assembly (or diagnostics) out.

use tellc_drv::{compile, Compiled, Config};
use tellc_sem::SemanticErrorKind;
use tellc_util::Handler;

fn compile_source(source: &str) -> Compiled {
    let handler = Handler::new();
    let outcome = compile(source, &Config::default(), &handler).expect("pipeline should not fail");
    assert!(
        !handler.has_errors() || matches!(outcome, Compiled::ParseFailed),
        "unexpected lexer/parser diagnostics on a verdict that kept going"
    );
    outcome
}

fn assembly_of(source: &str) -> String {
    match compile_source(source) {
        Compiled::Assembly(assembly) => assembly,
        Compiled::ParseFailed => panic!("parse failed"),
        Compiled::SemanticFailed(errors) => panic!("semantic errors: {:?}", errors),
    }
}

#[test]
fn test_hello_world() {
    let asm = assembly_of("show(\"hi\");");
    assert!(asm.starts_with("default rel\n\n"));
    assert!(asm.contains("string_0: db \"hi\", 0"));
    assert!(asm.contains("call show_str"));
}

#[test]
fn test_arithmetic_program() {
    let asm = assembly_of("num x = 2 + 3 * 4; show(x);");
    assert!(asm.contains("imul"));
    assert!(asm.contains("add rax"));
    assert!(asm.contains("call show_num"));
    assert!(asm.contains("x: dq 0"));
}

#[test]
fn test_if_else_program() {
    let asm = assembly_of(
        "num a = 5; when (a > 3) { show(\"big\"); } otherwise { show(\"small\"); }",
    );
    // two branch labels and a post-merge label
    assert!(asm.contains("L0:"));
    assert!(asm.contains("L1:"));
    assert!(asm.contains("L2:"));
    assert!(asm.contains("string_0: db \"big\", 0"));
    assert!(asm.contains("string_1: db \"small\", 0"));
}

#[test]
fn test_for_loop_program() {
    let asm = assembly_of("repeat (num i = 0; i < 3; i = i + 1) { show(i); }");
    assert!(asm.contains("i: dq 0"));
    assert!(asm.contains("jmp L0"));
    assert!(asm.contains("setl al"));
    assert!(asm.contains("call show_num"));
}

#[test]
fn test_redeclaration_diagnostic() {
    match compile_source("num x = 1; num x = 2;") {
        Compiled::SemanticFailed(errors) => {
            assert_eq!(errors.len(), 1);
            assert_eq!(errors[0].kind, SemanticErrorKind::DuplicateVariable);
            assert_eq!(errors[0].span.line, 1);
            assert_eq!(errors[0].span.column, 12);
        }
        _ => panic!("expected a semantic failure"),
    }
}

#[test]
fn test_shadowing_compiles_clean() {
    let asm = assembly_of("num x = 1; when (x > 0) { num x = 2; show(x); }");
    assert!(asm.contains("call show_num"));
}

#[test]
fn test_parse_failure_produces_no_assembly() {
    let handler = Handler::new();
    let outcome = compile("num = 5;", &Config::default(), &handler).unwrap();
    assert!(matches!(outcome, Compiled::ParseFailed));
    assert!(handler.has_errors());
}

#[test]
fn test_optimizer_preserves_output_shape() {
    let source = "num a = 4; num b = a * 2; show(b); repeat (num i = 0; i < b; i = i + 1) { show(i); }";
    let plain = assembly_of(source);

    let handler = Handler::new();
    let config = Config {
        optimize: true,
        ..Config::default()
    };
    let optimized = match compile(source, &config, &handler).unwrap() {
        Compiled::Assembly(assembly) => assembly,
        _ => panic!("optimized compile failed"),
    };

    // strength reduction rewrote the doubling as an addition
    assert!(plain.contains("imul"));
    assert!(!optimized.contains("imul"));
    // control flow and calls survive
    for needle in ["jmp", "jne", "call show_num", "call process_exit"] {
        assert!(optimized.contains(needle), "missing {}", needle);
    }
}

#[test]
fn test_ask_program_end_to_end() {
    let asm = assembly_of("str name = ask(\"who? \"); show(name);");
    assert!(asm.contains("extern ask_str"));
    assert!(asm.contains("call ask_str"));
    assert!(asm.contains("call show_str"));
}

#[test]
fn test_uninitialized_use_rejected() {
    match compile_source("num x; show(x);") {
        Compiled::SemanticFailed(errors) => {
            assert_eq!(errors[0].kind, SemanticErrorKind::UninitializedVariable);
        }
        _ => panic!("expected a semantic failure"),
    }
}

#[test]
fn test_lexical_error_does_not_stop_compilation() {
    // Unknown bytes are reported but skipped; the rest still compiles.
    let handler = Handler::new();
    let outcome = compile("num x = 1; @ show(x);", &Config::default(), &handler).unwrap();
    assert!(matches!(outcome, Compiled::Assembly(_)));
    assert_eq!(handler.error_count(), 1);
}
