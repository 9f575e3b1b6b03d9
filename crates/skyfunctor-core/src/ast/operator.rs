//! Operators for arithmetic expressions

use serde::{Deserialize, Serialize};

/// Binary operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Operator {
    /// Addition (+)
    Add,
    /// Subtraction (-)
    Sub,
    /// Multiplication (*)
    Mul,
    /// Division (/)
    Div,
    /// Exponentiation (**)
    Pow,
}

impl Operator {
    pub fn symbol(&self) -> &'static str {
        match self {
            Operator::Add => "+",
            Operator::Sub => "-",
            Operator::Mul => "*",
            Operator::Div => "/",
            Operator::Pow => "**",
        }
    }

    /// Apply the operator to two scalars
    pub fn apply(&self, left: f64, right: f64) -> f64 {
        match self {
            Operator::Add => left + right,
            Operator::Sub => left - right,
            Operator::Mul => left * right,
            Operator::Div => left / right,
            Operator::Pow => left.powf(right),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_operator_apply() {
        assert_eq!(Operator::Sub.apply(5.0, 3.0), 2.0);
        assert_eq!(Operator::Pow.apply(16.0, 0.25), 2.0);
        assert!(Operator::Div.apply(1.0, 0.0).is_infinite());
    }

    #[test]
    fn test_operator_symbol() {
        assert_eq!(Operator::Pow.symbol(), "**");
        assert_eq!(Operator::Div.symbol(), "/");
    }
}
