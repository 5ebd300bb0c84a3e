//! Checking driver: lex, parse and analyze one source file

use crate::ast::Program;
use crate::common::{CompileError, CompileResult, DiagnosticReporter};
use crate::lexer::Lexer;
use crate::parser::Parser;
use crate::sema::{SemaConfig, SemanticAnalyzer};
use log::{debug, info};
use std::fs;
use std::io::Write;
use std::path::Path;

/// Driver options
#[derive(Debug, Clone, Default)]
pub struct CheckConfig {
    /// Write the token stream to the dump sink before parsing
    pub dump_tokens: bool,
    /// Write the annotated AST to the dump sink after analysis
    pub dump_ast: bool,
    /// Write a one-line progress note per phase to the dump sink
    pub verbose: bool,
    pub sema: SemaConfig,
}

/// Runs the checking pipeline and reports failures as diagnostics
pub struct Driver {
    config: CheckConfig,
    reporter: DiagnosticReporter,
}

impl Driver {
    pub fn new(config: CheckConfig) -> Self {
        Self::with_reporter(config, DiagnosticReporter::new())
    }

    pub fn with_reporter(config: CheckConfig, reporter: DiagnosticReporter) -> Self {
        Self { config, reporter }
    }

    pub fn config(&self) -> &CheckConfig {
        &self.config
    }

    pub fn reporter(&self) -> &DiagnosticReporter {
        &self.reporter
    }

    /// Read and check a file from disk
    pub fn check_file(&mut self, path: &Path, dump: &mut impl Write) -> CompileResult<Program> {
        let source = fs::read_to_string(path)?;
        let filename = path.display().to_string();
        self.check_source(&filename, &source, dump).map(|(program, _)| program)
    }

    /// Check `source`, registered under `filename` for diagnostics.
    ///
    /// Returns the annotated program and the file id. Any failure has
    /// already been reported through the diagnostic reporter.
    pub fn check_source(
        &mut self,
        filename: &str,
        source: &str,
        dump: &mut impl Write,
    ) -> CompileResult<(Program, usize)> {
        let file_id = self.reporter.add_file(filename, source);
        match self.run_phases(filename, source, dump) {
            Ok(program) => Ok((program, file_id)),
            Err(err) => {
                self.reporter.report_error(file_id, &err);
                Err(err)
            }
        }
    }

    fn run_phases(&self, filename: &str, source: &str, dump: &mut impl Write) -> CompileResult<Program> {
        info!("checking {} ({} bytes)", filename, source.len());

        // Phase 1: Lexing (optional token dump)
        if self.config.dump_tokens {
            let tokens = Lexer::new(source).tokenize_all()?;
            writeln!(dump, "=== Tokens ===")?;
            for token in &tokens {
                writeln!(dump, "{:?}", token)?;
            }
            writeln!(dump, "=== End Tokens ===\n")?;
        }

        // Phase 2: Parsing
        if self.config.verbose {
            writeln!(dump, "Parsing...")?;
        }
        debug!("parsing {}", filename);
        let mut program = Parser::new(source)?.parse()?;

        // Phase 3: Semantic analysis
        if self.config.verbose {
            writeln!(dump, "Analyzing...")?;
        }
        debug!("analyzing {} top-level statement(s)", program.items.len());
        SemanticAnalyzer::with_config(self.config.sema)
            .analyze(&mut program)
            .map_err(CompileError::from)?;

        if self.config.dump_ast {
            writeln!(dump, "=== AST ===")?;
            writeln!(dump, "{:#?}", program)?;
            writeln!(dump, "=== End AST ===\n")?;
        }

        info!("{}: no errors", filename);
        Ok(program)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::StmtKind;
    use crate::common::SemanticErrorKind;
    use codespan_reporting::term::termcolor::ColorChoice;

    fn driver(config: CheckConfig) -> Driver {
        let _ = env_logger::builder().is_test(true).try_init();
        Driver::with_reporter(config, DiagnosticReporter::with_color(ColorChoice::Never))
    }

    fn check(config: CheckConfig, source: &str) -> (CompileResult<Program>, String) {
        let mut out = Vec::new();
        let result = driver(config)
            .check_source("test.mini", source, &mut out)
            .map(|(program, _)| program);
        (result, String::from_utf8(out).unwrap())
    }

    #[test]
    fn test_valid_program() {
        let (result, dump) = check(
            CheckConfig::default(),
            "int add(int a, int b) { return a + b; }\nint total = add(1, 2);",
        );
        let program = result.unwrap();
        assert_eq!(program.items.len(), 2);
        assert!(dump.is_empty());
    }

    #[test]
    fn test_semantic_failure() {
        let (result, _) = check(CheckConfig::default(), "int x = true;");
        let err = result.unwrap_err();
        assert_eq!(err.semantic_kind(), Some(SemanticErrorKind::TypeMismatch));
    }

    #[test]
    fn test_lexer_and_parser_failures() {
        let (result, _) = check(CheckConfig::default(), "int x = 1 @ 2;");
        assert!(matches!(result.unwrap_err(), CompileError::Lexer { .. }));

        let (result, _) = check(CheckConfig::default(), "int x = ;");
        assert!(matches!(result.unwrap_err(), CompileError::Parser { .. }));
    }

    #[test]
    fn test_sema_config_is_forwarded() {
        let source = "float f = 1;";
        let (result, _) = check(CheckConfig::default(), source);
        assert!(result.is_err());

        let config = CheckConfig {
            sema: SemaConfig {
                widen_int_to_float: true,
                ..SemaConfig::default()
            },
            ..CheckConfig::default()
        };
        let (result, _) = check(config, source);
        assert!(result.is_ok());
    }

    #[test]
    fn test_dumps() {
        let config = CheckConfig {
            dump_tokens: true,
            dump_ast: true,
            verbose: true,
            ..CheckConfig::default()
        };
        let (result, dump) = check(config, "bool ok = 1 < 2;");
        let program = result.unwrap();

        assert!(matches!(program.items[0].kind, StmtKind::Declaration(_)));
        assert!(dump.contains("=== Tokens ==="));
        assert!(dump.contains("Identifier(\"ok\")"));
        assert!(dump.contains("Parsing..."));
        assert!(dump.contains("Analyzing..."));
        assert!(dump.contains("=== AST ==="));
        // Annotated types appear in the AST dump
        assert!(dump.contains("Bool"));
    }

    #[test]
    fn test_no_ast_dump_on_failure() {
        let config = CheckConfig {
            dump_ast: true,
            ..CheckConfig::default()
        };
        let (result, dump) = check(config, "y = 1;");
        assert!(result.is_err());
        assert!(!dump.contains("=== AST ==="));
    }

    #[test]
    fn test_failure_renders_against_source() {
        let mut d = driver(CheckConfig::default());
        let mut out = Vec::new();
        let source = "int a = 1;\nbool a = false;";
        let err = d.check_source("dup.mini", source, &mut out).unwrap_err();

        // The file registered by the failed check is file 0
        let rendered = d.reporter().render_error(0, &err);
        assert!(rendered.contains("E0001"), "{}", rendered);
        assert!(rendered.contains("dup.mini:2:1"), "{}", rendered);
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let mut d = driver(CheckConfig::default());
        let mut out = Vec::new();
        let err = d
            .check_file(Path::new("/nonexistent/minic/input.mini"), &mut out)
            .unwrap_err();
        assert!(matches!(err, CompileError::Io(_)));
    }

    #[test]
    fn test_huge_operator_chain_is_a_parse_error() {
        let source = format!("int x = {};", vec!["1"; 1_000_000].join(" + "));
        let (result, _) = check(CheckConfig::default(), &source);
        assert!(matches!(result.unwrap_err(), CompileError::Parser { .. }));

        let source = format!("int x = {};", vec!["1"; 300].join(" + "));
        let (result, _) = check(CheckConfig::default(), &source);
        assert!(matches!(result.unwrap_err(), CompileError::Parser { .. }));
    }
}
