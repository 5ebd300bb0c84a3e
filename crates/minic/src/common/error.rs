//! Error types and diagnostic reporting

use codespan_reporting::diagnostic::{Diagnostic, Label};
use codespan_reporting::files::SimpleFiles;
use codespan_reporting::term;
use codespan_reporting::term::termcolor::{Buffer, ColorChoice, StandardStream};
use std::fmt;
use thiserror::Error;
use super::Span;

/// Category of a semantic rule violation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SemanticErrorKind {
    /// Identifier already bound in the current scope frame
    DuplicateDeclaration,
    /// Identifier not bound in any visible scope
    UndeclaredIdentifier,
    /// Declared vs. actual type disagreement at a declaration or assignment
    TypeMismatch,
    /// Argument type disagrees with the parameter type at a call site
    ArgumentTypeMismatch,
    /// Returned value disagrees with the function's declared return type
    ReturnTypeMismatch,
    /// Branch or loop condition is not `bool`
    InvalidConditionType,
    /// Argument count disagrees with the function declaration
    ArityMismatch,
    /// Call target is not a function
    NotCallable,
    /// Operator applied to operands it does not accept
    InvalidOperandType,
    /// `return` used outside of any function body
    ReturnOutsideFunction,
    /// AST nesting exceeded the configured depth limit
    StackExhausted,
    /// Broken analyzer invariant (unbalanced scope stack and similar)
    InternalError,
}

impl SemanticErrorKind {
    /// Stable diagnostic code
    pub fn code(self) -> &'static str {
        match self {
            Self::DuplicateDeclaration => "E0001",
            Self::UndeclaredIdentifier => "E0002",
            Self::TypeMismatch => "E0003",
            Self::ArgumentTypeMismatch => "E0004",
            Self::ReturnTypeMismatch => "E0005",
            Self::InvalidConditionType => "E0006",
            Self::ArityMismatch => "E0007",
            Self::NotCallable => "E0008",
            Self::InvalidOperandType => "E0009",
            Self::ReturnOutsideFunction => "E0010",
            Self::StackExhausted => "E0011",
            Self::InternalError => "E0999",
        }
    }

    /// Short human-readable title used as the diagnostic headline
    pub fn title(self) -> &'static str {
        match self {
            Self::DuplicateDeclaration => "duplicate declaration",
            Self::UndeclaredIdentifier => "undeclared identifier",
            Self::TypeMismatch => "type mismatch",
            Self::ArgumentTypeMismatch => "argument type mismatch",
            Self::ReturnTypeMismatch => "return type mismatch",
            Self::InvalidConditionType => "invalid condition type",
            Self::ArityMismatch => "arity mismatch",
            Self::NotCallable => "not callable",
            Self::InvalidOperandType => "invalid operand type",
            Self::ReturnOutsideFunction => "return outside function",
            Self::StackExhausted => "nesting too deep",
            Self::InternalError => "internal analyzer error",
        }
    }
}

impl fmt::Display for SemanticErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.title())
    }
}

/// A semantic rule violation found by the analyzer
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{kind} at {span}: {message}")]
pub struct SemanticError {
    pub kind: SemanticErrorKind,
    pub message: String,
    pub span: Span,
}

impl SemanticError {
    pub fn new(kind: SemanticErrorKind, message: impl Into<String>, span: Span) -> Self {
        Self {
            kind,
            message: message.into(),
            span,
        }
    }

    pub fn duplicate(name: &str, span: Span) -> Self {
        Self::new(
            SemanticErrorKind::DuplicateDeclaration,
            format!("'{}' is already declared in this scope", name),
            span,
        )
    }

    pub fn undeclared(name: &str, span: Span) -> Self {
        Self::new(
            SemanticErrorKind::UndeclaredIdentifier,
            format!("use of undeclared identifier '{}'", name),
            span,
        )
    }

    pub fn internal(message: impl Into<String>, span: Span) -> Self {
        Self::new(SemanticErrorKind::InternalError, message, span)
    }
}

pub type SemaResult<T> = Result<T, SemanticError>;

/// Any error produced while checking a source file
#[derive(Error, Debug)]
pub enum CompileError {
    #[error("Lexer error at {span:?}: {message}")]
    Lexer { message: String, span: Span },

    #[error("Parser error at {span:?}: {message}")]
    Parser { message: String, span: Span },

    #[error("Semantic error: {0}")]
    Semantic(#[from] SemanticError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl CompileError {
    pub fn lexer(message: impl Into<String>, span: Span) -> Self {
        Self::Lexer {
            message: message.into(),
            span,
        }
    }

    pub fn parser(message: impl Into<String>, span: Span) -> Self {
        Self::Parser {
            message: message.into(),
            span,
        }
    }

    /// Semantic error kind, if this is a semantic failure
    pub fn semantic_kind(&self) -> Option<SemanticErrorKind> {
        match self {
            Self::Semantic(err) => Some(err.kind),
            _ => None,
        }
    }
}

pub type CompileResult<T> = Result<T, CompileError>;

/// Diagnostic reporter for pretty error output
pub struct DiagnosticReporter {
    files: SimpleFiles<String, String>,
    writer: StandardStream,
    config: term::Config,
}

impl DiagnosticReporter {
    pub fn new() -> Self {
        Self::with_color(ColorChoice::Auto)
    }

    pub fn with_color(choice: ColorChoice) -> Self {
        Self {
            files: SimpleFiles::new(),
            writer: StandardStream::stderr(choice),
            config: term::Config::default(),
        }
    }

    pub fn add_file(&mut self, name: impl Into<String>, source: impl Into<String>) -> usize {
        self.files.add(name.into(), source.into())
    }

    fn diagnostic(&self, file_id: usize, error: &CompileError) -> Diagnostic<usize> {
        match error {
            CompileError::Lexer { message, span } => Diagnostic::error()
                .with_message("Lexer error")
                .with_labels(vec![
                    Label::primary(file_id, span.start..span.end).with_message(message)
                ]),

            CompileError::Parser { message, span } => Diagnostic::error()
                .with_message("Syntax error")
                .with_labels(vec![
                    Label::primary(file_id, span.start..span.end).with_message(message)
                ]),

            CompileError::Semantic(err) => Diagnostic::error()
                .with_message(err.kind.title())
                .with_code(err.kind.code())
                .with_labels(vec![
                    Label::primary(file_id, err.span.start..err.span.end).with_message(&err.message)
                ]),

            CompileError::Io(err) => {
                Diagnostic::error().with_message(format!("IO error: {}", err))
            }
        }
    }

    pub fn report_error(&self, file_id: usize, error: &CompileError) {
        let diagnostic = self.diagnostic(file_id, error);
        let _ = term::emit(&mut self.writer.lock(), &self.config, &self.files, &diagnostic);
    }

    /// Render a diagnostic without colors, for tests and non-terminal sinks
    pub fn render_error(&self, file_id: usize, error: &CompileError) -> String {
        let diagnostic = self.diagnostic(file_id, error);
        let mut buffer = Buffer::no_color();
        let _ = term::emit(&mut buffer, &self.config, &self.files, &diagnostic);
        String::from_utf8_lossy(buffer.as_slice()).into_owned()
    }
}

impl Default for DiagnosticReporter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_semantic_error_display() {
        let err = SemanticError::undeclared("x", Span::new(4, 5));
        assert_eq!(
            err.to_string(),
            "undeclared identifier at 4..5: use of undeclared identifier 'x'"
        );
    }

    #[test]
    fn test_semantic_kind_is_exposed() {
        let err: CompileError = SemanticError::duplicate("y", Span::new(0, 1)).into();
        assert_eq!(err.semantic_kind(), Some(SemanticErrorKind::DuplicateDeclaration));
        assert_eq!(CompileError::parser("oops", Span::default()).semantic_kind(), None);
    }

    #[test]
    fn test_render_points_at_span() {
        let mut reporter = DiagnosticReporter::with_color(ColorChoice::Never);
        let file_id = reporter.add_file("main.mini", "int x = y;\n");
        let err: CompileError = SemanticError::undeclared("y", Span::new(8, 9)).into();

        let rendered = reporter.render_error(file_id, &err);
        assert!(rendered.contains("error[E0002]: undeclared identifier"));
        assert!(rendered.contains("main.mini:1:9"));
        assert!(rendered.contains("use of undeclared identifier 'y'"));
    }
}
