//! Semantic analysis module
//!
//! Resolves identifiers against a stack of lexical scopes and checks the
//! static typing rules, annotating every expression with its type.

mod scope;
mod analyzer;
mod types;


pub use scope::{ScopeTable, Symbol, SymbolKind};
pub use analyzer::{analyze, analyze_with, SemaConfig, SemanticAnalyzer, DEFAULT_MAX_DEPTH};
pub use types::TypeChecker;
