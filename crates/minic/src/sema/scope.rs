//! Symbol table and scope management

use crate::ast::Type;
use crate::common::{SemaResult, SemanticError, Span};
use log::trace;
use std::collections::HashMap;

/// A symbol in the symbol table
#[derive(Debug, Clone, PartialEq)]
pub struct Symbol {
    pub name: String,
    pub kind: SymbolKind,
    pub ty: Type,
    /// Where the symbol was declared
    pub span: Span,
}

impl Symbol {
    pub fn new(name: impl Into<String>, kind: SymbolKind, ty: Type, span: Span) -> Self {
        Self {
            name: name.into(),
            kind,
            ty,
            span,
        }
    }

    pub fn variable(name: impl Into<String>, ty: Type, span: Span) -> Self {
        Self::new(name, SymbolKind::Variable, ty, span)
    }

    pub fn parameter(name: impl Into<String>, ty: Type, span: Span) -> Self {
        Self::new(name, SymbolKind::Parameter, ty, span)
    }

    /// Function symbol; `signature` must be a `Type::Function`
    pub fn function(name: impl Into<String>, signature: Type, span: Span) -> Self {
        Self::new(name, SymbolKind::Function, signature, span)
    }

    pub fn is_function(&self) -> bool {
        self.kind == SymbolKind::Function
    }

    /// Parameter types and return type, for function symbols
    pub fn signature(&self) -> Option<(&[Type], &Type)> {
        match (&self.kind, &self.ty) {
            (SymbolKind::Function, Type::Function { params, ret }) => Some((params.as_slice(), ret.as_ref())),
            _ => None,
        }
    }
}

/// Kind of symbol
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SymbolKind {
    Variable,
    Parameter,
    Function,
}

impl SymbolKind {
    pub fn describe(self) -> &'static str {
        match self {
            SymbolKind::Variable => "variable",
            SymbolKind::Parameter => "parameter",
            SymbolKind::Function => "function",
        }
    }
}

/// Stack of lexical scope frames, innermost last
#[derive(Debug, Default)]
pub struct ScopeTable {
    frames: Vec<HashMap<String, Symbol>>,
}

impl ScopeTable {
    pub fn new() -> Self {
        Self { frames: Vec::new() }
    }

    /// Push a new empty frame
    pub fn enter_scope(&mut self) {
        self.frames.push(HashMap::new());
        trace!("enter scope (depth {})", self.frames.len());
    }

    /// Pop the innermost frame
    pub fn exit_scope(&mut self) -> SemaResult<()> {
        match self.frames.pop() {
            Some(frame) => {
                trace!("exit scope (depth {}, {} symbols)", self.frames.len() + 1, frame.len());
                Ok(())
            }
            None => Err(SemanticError::internal(
                "scope exit without a matching scope entry",
                Span::default(),
            )),
        }
    }

    /// Define a symbol in the innermost frame
    pub fn declare(&mut self, symbol: Symbol) -> SemaResult<()> {
        let Some(frame) = self.frames.last_mut() else {
            return Err(SemanticError::internal(
                format!("declaration of '{}' with no open scope", symbol.name),
                symbol.span,
            ));
        };

        if frame.contains_key(&symbol.name) {
            return Err(SemanticError::duplicate(&symbol.name, symbol.span));
        }

        trace!("declare {} '{}': {}", symbol.kind.describe(), symbol.name, symbol.ty);
        frame.insert(symbol.name.clone(), symbol);
        Ok(())
    }

    /// Look up a symbol by name, innermost frame first
    pub fn lookup(&self, name: &str) -> Option<&Symbol> {
        self.frames.iter().rev().find_map(|frame| frame.get(name))
    }

    /// Look up a symbol in the innermost frame only
    pub fn lookup_local(&self, name: &str) -> Option<&Symbol> {
        self.frames.last().and_then(|frame| frame.get(name))
    }

    /// Resolve a name, failing if no visible frame declares it
    pub fn resolve(&self, name: &str, span: Span) -> SemaResult<&Symbol> {
        self.lookup(name)
            .ok_or_else(|| SemanticError::undeclared(name, span))
    }

    /// Number of open frames (0 = none, 1 = global only)
    pub fn depth(&self) -> usize {
        self.frames.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::SemanticErrorKind;

    fn var(name: &str, ty: Type) -> Symbol {
        Symbol::variable(name, ty, Span::default())
    }

    #[test]
    fn test_declare_and_resolve() {
        let mut table = ScopeTable::new();
        table.enter_scope();
        table.declare(var("x", Type::Int)).unwrap();

        let sym = table.resolve("x", Span::default()).unwrap();
        assert_eq!(sym.ty, Type::Int);
        assert_eq!(sym.kind, SymbolKind::Variable);
    }

    #[test]
    fn test_duplicate_in_same_frame() {
        let mut table = ScopeTable::new();
        table.enter_scope();
        table.declare(var("x", Type::Int)).unwrap();

        let err = table.declare(var("x", Type::Bool)).unwrap_err();
        assert_eq!(err.kind, SemanticErrorKind::DuplicateDeclaration);
    }

    #[test]
    fn test_shadowing_across_frames() {
        let mut table = ScopeTable::new();
        table.enter_scope();
        table.declare(var("x", Type::Int)).unwrap();
        table.enter_scope();
        table.declare(var("x", Type::Str)).unwrap();

        assert_eq!(table.resolve("x", Span::default()).unwrap().ty, Type::Str);
        assert_eq!(table.lookup_local("x").unwrap().ty, Type::Str);

        table.exit_scope().unwrap();
        assert_eq!(table.resolve("x", Span::default()).unwrap().ty, Type::Int);
    }

    #[test]
    fn test_symbols_die_with_their_frame() {
        let mut table = ScopeTable::new();
        table.enter_scope();
        table.enter_scope();
        table.declare(var("tmp", Type::Float)).unwrap();
        table.exit_scope().unwrap();

        let err = table.resolve("tmp", Span::new(3, 6)).unwrap_err();
        assert_eq!(err.kind, SemanticErrorKind::UndeclaredIdentifier);
        assert_eq!(err.span, Span::new(3, 6));
    }

    #[test]
    fn test_lookup_local_ignores_outer_frames() {
        let mut table = ScopeTable::new();
        table.enter_scope();
        table.declare(var("x", Type::Int)).unwrap();
        table.enter_scope();

        assert!(table.lookup_local("x").is_none());
        assert!(table.lookup("x").is_some());
    }

    #[test]
    fn test_unbalanced_exit_is_internal_error() {
        let mut table = ScopeTable::new();
        table.enter_scope();
        table.exit_scope().unwrap();

        let err = table.exit_scope().unwrap_err();
        assert_eq!(err.kind, SemanticErrorKind::InternalError);
        assert_eq!(table.depth(), 0);
    }

    #[test]
    fn test_declare_without_frame_is_internal_error() {
        let mut table = ScopeTable::new();
        let err = table.declare(var("x", Type::Int)).unwrap_err();
        assert_eq!(err.kind, SemanticErrorKind::InternalError);
    }

    #[test]
    fn test_function_signature() {
        let sym = Symbol::function(
            "add",
            Type::function(vec![Type::Int, Type::Int], Type::Int),
            Span::default(),
        );
        let (params, ret) = sym.signature().unwrap();
        assert_eq!(params, &[Type::Int, Type::Int]);
        assert_eq!(ret, &Type::Int);
        assert!(var("x", Type::Int).signature().is_none());
    }
}
