//! Parser module: tokens to AST

mod parser;

pub use parser::{Parser, MAX_NESTING};
