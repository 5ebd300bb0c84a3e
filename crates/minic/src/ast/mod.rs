//! Abstract Syntax Tree definitions

mod types;
mod expr;
mod stmt;
mod decl;

pub use types::*;
pub use expr::*;
pub use stmt::*;
pub use decl::*;

use crate::common::Span;

/// A complete program (one source file)
#[derive(Debug, Clone, PartialEq)]
pub struct Program {
    pub items: Vec<Stmt>,
    pub span: Span,
}

impl Program {
    pub fn new(items: Vec<Stmt>, span: Span) -> Self {
        Self { items, span }
    }
}
