//! tellc-drv - Compiler driver.
//!
//! Orchestrates the pipeline: read source, lex+parse, analyze, lower to
//! TAC, optionally optimize, emit assembly, write `x86_64.asm` into the
//! current directory.
//!
//! Exit-code policy: a compile that ran to a verdict exits 0 even when the
//! program was rejected (the diagnostics are the output; no file is
//! written). Only environment failures, like an unreadable input file, are
//! reported through a non-zero exit.

use std::io::Read;
use std::path::PathBuf;

use anyhow::Context;
use tellc_par::Parser;
use tellc_sem::{SemanticAnalyzer, SemanticError};
use tellc_util::Handler;

/// Name of the output artifact, always in the current directory.
pub const OUTPUT_FILE: &str = "x86_64.asm";

const USAGE: &str = "\
Usage: tellc [OPTIONS] [FILE]

Compiles a Tell source file (stdin when FILE is absent) to x86_64.asm
in the current directory.

Options:
  -O, --optimize    run the TAC optimizer before emission
      --emit-tokens print the token stream to stdout
      --emit-tac    print the TAC listing to stdout
      --verbose     report each phase on stderr
  -h, --help        show this help
";

/// Driver configuration.
#[derive(Debug, Clone, Default)]
pub struct Config {
    /// Source file; stdin when absent.
    pub input: Option<PathBuf>,
    /// Run the optimizer between lowering and emission.
    pub optimize: bool,
    /// Print the token stream to stdout.
    pub emit_tokens: bool,
    /// Print the TAC listing to stdout.
    pub emit_tac: bool,
    /// Report pipeline phases on stderr.
    pub verbose: bool,
}

impl Config {
    /// Parses command-line arguments (without the program name).
    /// `Ok(None)` means help was requested.
    pub fn parse_args(args: impl Iterator<Item = String>) -> anyhow::Result<Option<Config>> {
        let mut config = Config::default();

        for arg in args {
            match arg.as_str() {
                "-O" | "--optimize" => config.optimize = true,
                "--emit-tokens" => config.emit_tokens = true,
                "--emit-tac" => config.emit_tac = true,
                "--verbose" => config.verbose = true,
                "-h" | "--help" => return Ok(None),
                other if other.starts_with('-') => {
                    anyhow::bail!("unknown option '{}'\n\n{}", other, USAGE);
                }
                path => {
                    if config.input.is_some() {
                        anyhow::bail!("only one input file may be given\n\n{}", USAGE);
                    }
                    config.input = Some(PathBuf::from(path));
                }
            }
        }

        Ok(Some(config))
    }
}

/// Outcome of one compile attempt.
pub enum Compiled {
    /// Full pipeline ran; the text is ready to write (prologue included).
    Assembly(String),
    /// A syntax error stopped the parse; diagnostics are in the handler.
    ParseFailed,
    /// The program parsed but broke the semantic rules.
    SemanticFailed(Vec<SemanticError>),
}

/// Runs the pipeline over one source text.
///
/// Lexical diagnostics never stop compilation on their own; the parse
/// verdict does. Semantic errors stop the pipeline before lowering.
pub fn compile(source: &str, config: &Config, handler: &Handler) -> anyhow::Result<Compiled> {
    if config.emit_tokens {
        emit_tokens(source);
    }

    if config.verbose {
        eprintln!("Parsing...");
    }
    let program = {
        let mut parser = Parser::new(source, handler);
        match parser.parse_program() {
            Ok(program) => program,
            Err(_) => return Ok(Compiled::ParseFailed),
        }
    };

    if config.verbose {
        eprintln!("Semantic analysis...");
    }
    let mut analyzer = SemanticAnalyzer::new();
    if !analyzer.analyze(&program) {
        return Ok(Compiled::SemanticFailed(analyzer.into_errors()));
    }

    if config.verbose {
        eprintln!("Lowering to TAC...");
    }
    let mut tac = tellc_tac::lower(&program);

    if config.optimize {
        if config.verbose {
            eprintln!("Optimizing...");
        }
        tac = tellc_tac::optimize(tac);
    }

    if config.emit_tac {
        for instruction in &tac {
            println!("{}", instruction);
        }
    }

    if config.verbose {
        eprintln!("Generating assembly...");
    }
    let body = tellc_gen::generate(&tac).context("internal codegen failure")?;

    Ok(Compiled::Assembly(format!("default rel\n\n{}", body)))
}

/// Entry point used by the binary.
pub fn run(args: impl Iterator<Item = String>) -> anyhow::Result<()> {
    let config = match Config::parse_args(args)? {
        Some(config) => config,
        None => {
            print!("{}", USAGE);
            return Ok(());
        }
    };

    let source = read_source(&config)?;

    let handler = Handler::new();
    let outcome = compile(&source, &config, &handler)?;

    // Lexer and parser diagnostics, in emission order.
    for diagnostic in handler.diagnostics() {
        eprintln!("{}", diagnostic);
    }

    match outcome {
        Compiled::ParseFailed => {
            eprintln!("error: failed to parse the program");
            Ok(())
        }
        Compiled::SemanticFailed(errors) => {
            for error in &errors {
                eprintln!("{}", error);
            }
            eprintln!(
                "error: {} semantic error{} found",
                errors.len(),
                if errors.len() == 1 { "" } else { "s" }
            );
            Ok(())
        }
        Compiled::Assembly(assembly) => {
            std::fs::write(OUTPUT_FILE, assembly)
                .with_context(|| format!("could not write {}", OUTPUT_FILE))?;
            if config.verbose {
                eprintln!("Assembly written to {}", OUTPUT_FILE);
            }
            Ok(())
        }
    }
}

/// Prints the token stream for `--emit-tokens`. Uses its own handler so
/// that lexical diagnostics are not reported twice when the parse re-lexes
/// the source.
fn emit_tokens(source: &str) {
    use tellc_lex::{Lexer, TokenKind};

    let scratch = Handler::new();
    let mut lexer = Lexer::new(source, &scratch);
    loop {
        let token = lexer.next_token();
        println!(
            "Token(kind={}, lexeme='{}', line={}, column={})",
            token.kind, token.lexeme, token.span.line, token.span.column
        );
        if token.kind == TokenKind::Eof {
            break;
        }
    }
}

fn read_source(config: &Config) -> anyhow::Result<String> {
    match &config.input {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("could not read '{}'", path.display())),
        None => {
            let mut source = String::new();
            std::io::stdin()
                .read_to_string(&mut source)
                .context("could not read from stdin")?;
            Ok(source)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args<'a>(list: &'a [&'a str]) -> impl Iterator<Item = String> + 'a {
        list.iter().map(|s| s.to_string())
    }

    #[test]
    fn test_parse_args_defaults() {
        let config = Config::parse_args(args(&[])).unwrap().unwrap();
        assert!(config.input.is_none());
        assert!(!config.optimize);
        assert!(!config.emit_tac);
    }

    #[test]
    fn test_parse_args_flags_and_file() {
        let config = Config::parse_args(args(&["-O", "--verbose", "main.tell"]))
            .unwrap()
            .unwrap();
        assert!(config.optimize);
        assert!(config.verbose);
        assert_eq!(config.input.unwrap(), PathBuf::from("main.tell"));
    }

    #[test]
    fn test_parse_args_help() {
        assert!(Config::parse_args(args(&["--help"])).unwrap().is_none());
    }

    #[test]
    fn test_parse_args_rejects_unknown_option() {
        assert!(Config::parse_args(args(&["--frobnicate"])).is_err());
    }

    #[test]
    fn test_parse_args_rejects_two_files() {
        assert!(Config::parse_args(args(&["a.tell", "b.tell"])).is_err());
    }
}
