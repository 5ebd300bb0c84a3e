//! Static types of the language

use std::fmt;

/// Static type of a variable, expression or function
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Type {
    Int,
    Float,
    Bool,
    Str,
    Void,
    /// Function shape: ordered parameter types and a return type
    Function {
        params: Vec<Type>,
        ret: Box<Type>,
    },
}

impl Type {
    pub fn function(params: Vec<Type>, ret: Type) -> Self {
        Type::Function {
            params,
            ret: Box::new(ret),
        }
    }

    /// Check if this type is `int` or `float`
    pub fn is_numeric(&self) -> bool {
        matches!(self, Type::Int | Type::Float)
    }

    pub fn is_bool(&self) -> bool {
        matches!(self, Type::Bool)
    }

    pub fn is_void(&self) -> bool {
        matches!(self, Type::Void)
    }

    pub fn is_function(&self) -> bool {
        matches!(self, Type::Function { .. })
    }

    /// Check if values of this type can be stored in a variable
    pub fn is_value(&self) -> bool {
        !self.is_void() && !self.is_function()
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Type::Int => write!(f, "int"),
            Type::Float => write!(f, "float"),
            Type::Bool => write!(f, "bool"),
            Type::Str => write!(f, "string"),
            Type::Void => write!(f, "void"),
            Type::Function { params, ret } => {
                write!(f, "fn(")?;
                for (i, param) in params.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", param)?;
                }
                write!(f, ") -> {}", ret)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        assert_eq!(Type::Str.to_string(), "string");
        assert_eq!(
            Type::function(vec![Type::Int, Type::Bool], Type::Float).to_string(),
            "fn(int, bool) -> float"
        );
        assert_eq!(Type::function(vec![], Type::Void).to_string(), "fn() -> void");
    }

    #[test]
    fn test_structural_equality() {
        let a = Type::function(vec![Type::Int], Type::Bool);
        let b = Type::function(vec![Type::Int], Type::Bool);
        let c = Type::function(vec![Type::Float], Type::Bool);
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert!(!a.is_value());
        assert!(Type::Int.is_value());
    }
}
