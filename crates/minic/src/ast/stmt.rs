//! Statement AST nodes

use super::{Expr, FuncDecl, VarDecl};
use crate::common::Span;

/// Statement node
#[derive(Debug, Clone, PartialEq)]
pub struct Stmt {
    pub kind: StmtKind,
    pub span: Span,
}

impl Stmt {
    pub fn new(kind: StmtKind, span: Span) -> Self {
        Self { kind, span }
    }
}

/// Statement kinds
#[derive(Debug, Clone, PartialEq)]
pub enum StmtKind {
    /// Variable declaration: int x = expr;
    Declaration(VarDecl),

    /// Assignment: x = expr;
    Assign {
        name: String,
        value: Expr,
    },

    /// If statement: if (cond) { ... } [else { ... }]
    If {
        condition: Expr,
        then_block: Block,
        else_block: Option<Block>,
    },

    /// While loop: while (cond) { ... }
    While {
        condition: Expr,
        body: Block,
    },

    /// For loop: for (init; cond; update) { ... }
    For {
        init: Option<Box<Stmt>>,
        condition: Option<Expr>,
        update: Option<Box<Stmt>>,
        body: Block,
    },

    /// Function declaration
    Function(FuncDecl),

    /// Return statement: return [expr];
    Return(Option<Expr>),

    /// Nested block: { ... }
    Block(Block),

    /// Expression statement: expr;
    Expr(Expr),
}

/// Block of statements
#[derive(Debug, Clone, PartialEq)]
pub struct Block {
    pub stmts: Vec<Stmt>,
    pub span: Span,
}

impl Block {
    pub fn new(stmts: Vec<Stmt>, span: Span) -> Self {
        Self { stmts, span }
    }
}
