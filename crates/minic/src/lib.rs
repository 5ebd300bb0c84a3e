//! minic - semantic checker for a small C-like imperative language
//!
//! The checker walks a parsed program once, resolves every identifier
//! against a stack of lexical scopes, and records the static type of
//! every expression. The first violation stops analysis with a
//! [`SemanticError`] pointing at the offending span.
//!
//! ## Architecture
//!
//! - **Common** (`common/`): spans, error types and diagnostic rendering
//! - **Lexer** (`lexer/`): logos-based tokenizer
//! - **Parser** (`parser/`): recursive-descent parser producing the AST
//! - **AST** (`ast/`): program, statement, expression and type nodes
//! - **Sema** (`sema/`): scope table, type rules and the analyzer
//! - **Driver** (`driver/`): lex, parse and analyze one file with optional dumps

pub mod common;
pub mod ast;
pub mod lexer;
pub mod parser;
pub mod sema;
pub mod driver;

// Re-exports for convenience
pub use common::{CompileError, CompileResult, DiagnosticReporter, SemanticError, SemanticErrorKind, Span};
pub use driver::{CheckConfig, Driver};
pub use sema::{analyze, analyze_with, SemaConfig, SemanticAnalyzer};
