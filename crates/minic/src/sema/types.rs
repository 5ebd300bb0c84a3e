//! Type compatibility and operator typing

use crate::ast::{BinaryOp, Type, UnaryOp};
use crate::common::{SemaResult, SemanticError, SemanticErrorKind, Span};

/// Type checker for assignments and operators
#[derive(Debug, Clone, Copy, Default)]
pub struct TypeChecker {
    widen_int_to_float: bool,
}

impl TypeChecker {
    /// Exact-equality checker, no implicit conversions
    pub fn new() -> Self {
        Self::default()
    }

    /// Checker that also accepts `int` where `float` is expected
    pub fn with_widening(widen_int_to_float: bool) -> Self {
        Self { widen_int_to_float }
    }

    /// Check if a value of type `actual` may be stored where `declared` is expected
    pub fn is_compatible(&self, declared: &Type, actual: &Type) -> bool {
        declared == actual
            || (self.widen_int_to_float && *declared == Type::Float && *actual == Type::Int)
    }

    /// Common numeric type of two operands, if they have one
    fn numeric_join(&self, left: &Type, right: &Type) -> Option<Type> {
        match (left, right) {
            (Type::Int, Type::Int) => Some(Type::Int),
            (Type::Float, Type::Float) => Some(Type::Float),
            (Type::Int, Type::Float) | (Type::Float, Type::Int) if self.widen_int_to_float => {
                Some(Type::Float)
            }
            _ => None,
        }
    }

    /// Get the result type of a binary operation
    pub fn binary_result_type(
        &self,
        op: BinaryOp,
        left: &Type,
        right: &Type,
        span: Span,
    ) -> SemaResult<Type> {
        let result = if op.is_arithmetic() {
            match (left, right) {
                (Type::Str, Type::Str) if op == BinaryOp::Add => Some(Type::Str),
                _ => self.numeric_join(left, right),
            }
        } else if op.is_ordering() {
            self.numeric_join(left, right).map(|_| Type::Bool)
        } else if op.is_equality() {
            let comparable = left.is_value()
                && (left == right || self.numeric_join(left, right).is_some());
            comparable.then_some(Type::Bool)
        } else if op.is_logical() {
            (left.is_bool() && right.is_bool()).then_some(Type::Bool)
        } else {
            None
        };

        result.ok_or_else(|| {
            SemanticError::new(
                SemanticErrorKind::InvalidOperandType,
                format!("operator '{}' cannot be applied to '{}' and '{}'", op, left, right),
                span,
            )
        })
    }

    /// Get the result type of a unary operation
    pub fn unary_result_type(&self, op: UnaryOp, operand: &Type, span: Span) -> SemaResult<Type> {
        let ok = match op {
            UnaryOp::Neg => operand.is_numeric(),
            UnaryOp::Not => operand.is_bool(),
        };

        if ok {
            Ok(operand.clone())
        } else {
            Err(SemanticError::new(
                SemanticErrorKind::InvalidOperandType,
                format!("operator '{}' cannot be applied to '{}'", op, operand),
                span,
            ))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kind(result: SemaResult<Type>) -> SemanticErrorKind {
        result.unwrap_err().kind
    }

    #[test]
    fn test_exact_compatibility() {
        let tc = TypeChecker::new();
        assert!(tc.is_compatible(&Type::Int, &Type::Int));
        assert!(!tc.is_compatible(&Type::Float, &Type::Int));
        assert!(!tc.is_compatible(&Type::Int, &Type::Float));
        assert!(tc.is_compatible(
            &Type::function(vec![Type::Int], Type::Bool),
            &Type::function(vec![Type::Int], Type::Bool),
        ));
    }

    #[test]
    fn test_widening_is_one_way() {
        let tc = TypeChecker::with_widening(true);
        assert!(tc.is_compatible(&Type::Float, &Type::Int));
        assert!(!tc.is_compatible(&Type::Int, &Type::Float));
    }

    #[test]
    fn test_arithmetic() {
        let tc = TypeChecker::new();
        let span = Span::default();
        assert_eq!(tc.binary_result_type(BinaryOp::Mul, &Type::Int, &Type::Int, span).unwrap(), Type::Int);
        assert_eq!(tc.binary_result_type(BinaryOp::Sub, &Type::Float, &Type::Float, span).unwrap(), Type::Float);
        assert_eq!(tc.binary_result_type(BinaryOp::Add, &Type::Str, &Type::Str, span).unwrap(), Type::Str);
        assert_eq!(
            kind(tc.binary_result_type(BinaryOp::Sub, &Type::Str, &Type::Str, span)),
            SemanticErrorKind::InvalidOperandType
        );
        assert_eq!(
            kind(tc.binary_result_type(BinaryOp::Add, &Type::Int, &Type::Float, span)),
            SemanticErrorKind::InvalidOperandType
        );
        assert_eq!(
            kind(tc.binary_result_type(BinaryOp::Add, &Type::Int, &Type::Bool, span)),
            SemanticErrorKind::InvalidOperandType
        );
    }

    #[test]
    fn test_mixed_arithmetic_with_widening() {
        let tc = TypeChecker::with_widening(true);
        let span = Span::default();
        assert_eq!(tc.binary_result_type(BinaryOp::Add, &Type::Int, &Type::Float, span).unwrap(), Type::Float);
        assert_eq!(tc.binary_result_type(BinaryOp::Lt, &Type::Float, &Type::Int, span).unwrap(), Type::Bool);
    }

    #[test]
    fn test_comparison_and_logic() {
        let tc = TypeChecker::new();
        let span = Span::default();
        assert_eq!(tc.binary_result_type(BinaryOp::Lt, &Type::Int, &Type::Int, span).unwrap(), Type::Bool);
        assert_eq!(tc.binary_result_type(BinaryOp::Eq, &Type::Str, &Type::Str, span).unwrap(), Type::Bool);
        assert_eq!(tc.binary_result_type(BinaryOp::Ne, &Type::Bool, &Type::Bool, span).unwrap(), Type::Bool);
        assert_eq!(tc.binary_result_type(BinaryOp::Or, &Type::Bool, &Type::Bool, span).unwrap(), Type::Bool);
        assert_eq!(
            kind(tc.binary_result_type(BinaryOp::Lt, &Type::Bool, &Type::Bool, span)),
            SemanticErrorKind::InvalidOperandType
        );
        assert_eq!(
            kind(tc.binary_result_type(BinaryOp::And, &Type::Int, &Type::Bool, span)),
            SemanticErrorKind::InvalidOperandType
        );
        assert_eq!(
            kind(tc.binary_result_type(BinaryOp::Eq, &Type::Void, &Type::Void, span)),
            SemanticErrorKind::InvalidOperandType
        );
    }

    #[test]
    fn test_unary() {
        let tc = TypeChecker::new();
        let span = Span::default();
        assert_eq!(tc.unary_result_type(UnaryOp::Neg, &Type::Float, span).unwrap(), Type::Float);
        assert_eq!(tc.unary_result_type(UnaryOp::Not, &Type::Bool, span).unwrap(), Type::Bool);
        assert_eq!(
            kind(tc.unary_result_type(UnaryOp::Neg, &Type::Bool, span)),
            SemanticErrorKind::InvalidOperandType
        );
        assert_eq!(
            kind(tc.unary_result_type(UnaryOp::Not, &Type::Int, span)),
            SemanticErrorKind::InvalidOperandType
        );
    }
}
