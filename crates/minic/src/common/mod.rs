//! Common infrastructure shared by the lexer, parser, analyzer and driver

mod error;
mod span;

pub use error::{
    CompileError, CompileResult, DiagnosticReporter, SemaResult, SemanticError, SemanticErrorKind,
};
pub use span::Span;
