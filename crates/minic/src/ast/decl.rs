//! Declaration AST nodes

use super::{Block, Expr, Type};
use crate::common::Span;

/// Variable declaration: int x = 1;
#[derive(Debug, Clone, PartialEq)]
pub struct VarDecl {
    pub ty: Type,
    pub name: String,
    pub init: Option<Expr>,
    pub span: Span,
}

impl VarDecl {
    pub fn new(ty: Type, name: impl Into<String>, init: Option<Expr>, span: Span) -> Self {
        Self {
            ty,
            name: name.into(),
            init,
            span,
        }
    }
}

/// Function parameter
#[derive(Debug, Clone, PartialEq)]
pub struct Param {
    pub ty: Type,
    pub name: String,
    pub span: Span,
}

impl Param {
    pub fn new(ty: Type, name: impl Into<String>, span: Span) -> Self {
        Self {
            ty,
            name: name.into(),
            span,
        }
    }
}

/// Function declaration: int add(int a, int b) { ... }
#[derive(Debug, Clone, PartialEq)]
pub struct FuncDecl {
    pub return_type: Type,
    pub name: String,
    pub params: Vec<Param>,
    pub body: Block,
    pub span: Span,
}

impl FuncDecl {
    pub fn new(
        return_type: Type,
        name: impl Into<String>,
        params: Vec<Param>,
        body: Block,
        span: Span,
    ) -> Self {
        Self {
            return_type,
            name: name.into(),
            params,
            body,
            span,
        }
    }

    /// Function shape carried by the function's symbol
    pub fn signature(&self) -> Type {
        Type::function(
            self.params.iter().map(|p| p.ty.clone()).collect(),
            self.return_type.clone(),
        )
    }
}
