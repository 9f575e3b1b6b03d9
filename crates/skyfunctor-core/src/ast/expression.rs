//! Expression AST nodes

use super::operator::Operator;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Arithmetic expression over table columns
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Expression {
    /// Numeric literal
    Literal(f64),

    /// Column reference (e.g., base_PsfFlux_instFlux)
    Column(String),

    /// Binary operation
    Binary {
        left: Box<Expression>,
        op: Operator,
        right: Box<Expression>,
    },

    /// Unary operation
    Unary {
        op: UnaryOperator,
        operand: Box<Expression>,
    },

    /// Function call (e.g., log10(x), sqrt(a*b))
    FunctionCall { name: String, args: Vec<Expression> },
}

/// Unary operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UnaryOperator {
    /// Arithmetic negation (-)
    Negate,
}

impl Expression {
    /// Create a literal expression
    pub fn literal(value: f64) -> Self {
        Expression::Literal(value)
    }

    /// Create a column reference
    pub fn column(name: impl Into<String>) -> Self {
        Expression::Column(name.into())
    }

    /// Create a binary expression
    pub fn binary(left: Expression, op: Operator, right: Expression) -> Self {
        Expression::Binary {
            left: Box::new(left),
            op,
            right: Box::new(right),
        }
    }

    /// Create a unary expression
    pub fn unary(op: UnaryOperator, operand: Expression) -> Self {
        Expression::Unary {
            op,
            operand: Box::new(operand),
        }
    }

    /// Create a function call expression
    pub fn function_call(name: impl Into<String>, args: Vec<Expression>) -> Self {
        Expression::FunctionCall {
            name: name.into(),
            args,
        }
    }

    /// Every column referenced by the expression
    pub fn columns(&self) -> BTreeSet<String> {
        let mut out = BTreeSet::new();
        self.collect_columns(&mut out);
        out
    }

    fn collect_columns(&self, acc: &mut BTreeSet<String>) {
        match self {
            Expression::Literal(_) => {}
            Expression::Column(name) => {
                acc.insert(name.clone());
            }
            Expression::Binary { left, right, .. } => {
                left.collect_columns(acc);
                right.collect_columns(acc);
            }
            Expression::Unary { operand, .. } => operand.collect_columns(acc),
            Expression::FunctionCall { args, .. } => {
                for arg in args {
                    arg.collect_columns(acc);
                }
            }
        }
    }
}
