//! Vectorized expression evaluation and the expression-based functor
//!
//! `ExpressionEvaluator` walks an `Expression` tree over a loaded frame,
//! keeping literal subtrees scalar until they meet a column.
//!
//! `CustomFunctor` evaluates a free-form expression. Its columns are found
//! lexically, and `mag(x)` is rewritten to `-2.5*log10(x)`. The rewritten
//! expression is tried with the literal argument first and then once more
//! with the `_instFlux` suffix appended.

use crate::error::{ComputeError, ComputeResult, Result};
use crate::functor::{floats, Functor, FunctorSettings, WithSettings};
use skyfunctor_core::ast::{Expression, UnaryOperator};
use skyfunctor_core::{ColumnValues, Frame};
use skyfunctor_parser::{ExpressionParser, ExpressionScanner, FLUX_SUFFIX};

/// Intermediate value: a broadcastable scalar or a full column
#[derive(Debug, Clone, PartialEq)]
enum Operand {
    Scalar(f64),
    Series(Vec<f64>),
}

impl Operand {
    fn materialize(self, len: usize) -> Vec<f64> {
        match self {
            Operand::Scalar(value) => vec![value; len],
            Operand::Series(values) => values,
        }
    }

    fn map(self, f: impl Fn(f64) -> f64) -> Operand {
        match self {
            Operand::Scalar(value) => Operand::Scalar(f(value)),
            Operand::Series(values) => Operand::Series(values.into_iter().map(f).collect()),
        }
    }

    fn zip_with(self, other: Operand, f: impl Fn(f64, f64) -> f64) -> ComputeResult<Operand> {
        match (self, other) {
            (Operand::Scalar(a), Operand::Scalar(b)) => Ok(Operand::Scalar(f(a, b))),
            (Operand::Scalar(a), Operand::Series(b)) => {
                Ok(Operand::Series(b.into_iter().map(|y| f(a, y)).collect()))
            }
            (Operand::Series(a), Operand::Scalar(b)) => {
                Ok(Operand::Series(a.into_iter().map(|x| f(x, b)).collect()))
            }
            (Operand::Series(a), Operand::Series(b)) => {
                if a.len() != b.len() {
                    return Err(ComputeError::Expression(format!(
                        "operand lengths differ: {} vs {}",
                        a.len(),
                        b.len()
                    )));
                }
                Ok(Operand::Series(
                    a.into_iter().zip(b).map(|(x, y)| f(x, y)).collect(),
                ))
            }
        }
    }
}

/// Evaluates expressions column-wise over a frame
pub struct ExpressionEvaluator<'a> {
    frame: &'a Frame,
}

impl<'a> ExpressionEvaluator<'a> {
    pub fn new(frame: &'a Frame) -> Self {
        Self { frame }
    }

    /// Evaluate to one value per frame row
    pub fn evaluate(&self, expr: &Expression) -> ComputeResult<Vec<f64>> {
        Ok(self.eval(expr)?.materialize(self.frame.len()))
    }

    fn eval(&self, expr: &Expression) -> ComputeResult<Operand> {
        match expr {
            Expression::Literal(value) => Ok(Operand::Scalar(*value)),
            Expression::Column(name) => Ok(Operand::Series(floats(self.frame, name)?)),
            Expression::Unary { op, operand } => {
                let value = self.eval(operand)?;
                match op {
                    UnaryOperator::Negate => Ok(value.map(|x| -x)),
                }
            }
            Expression::Binary { left, op, right } => {
                let left = self.eval(left)?;
                let right = self.eval(right)?;
                left.zip_with(right, |a, b| op.apply(a, b))
            }
            Expression::FunctionCall { name, args } => self.call(name, args),
        }
    }

    fn call(&self, name: &str, args: &[Expression]) -> ComputeResult<Operand> {
        let unary: fn(f64) -> f64 = match name {
            "sin" => f64::sin,
            "cos" => f64::cos,
            "tan" => f64::tan,
            "arcsin" => f64::asin,
            "arccos" => f64::acos,
            "arctan" => f64::atan,
            "exp" => f64::exp,
            "log" => f64::ln,
            "log10" => f64::log10,
            "sqrt" => f64::sqrt,
            "abs" => f64::abs,
            _ => return self.call_binary(name, args),
        };

        let [arg] = args else {
            return Err(arity_error(name, 1, args.len()));
        };
        Ok(self.eval(arg)?.map(unary))
    }

    fn call_binary(&self, name: &str, args: &[Expression]) -> ComputeResult<Operand> {
        let binary: fn(f64, f64) -> f64 = match name {
            "arctan2" => f64::atan2,
            "hypot" => f64::hypot,
            _ => {
                return Err(ComputeError::Expression(format!(
                    "Unknown function: {}",
                    name
                )))
            }
        };

        let [a, b] = args else {
            return Err(arity_error(name, 2, args.len()));
        };
        self.eval(a)?.zip_with(self.eval(b)?, binary)
    }
}

fn arity_error(name: &str, expected: usize, actual: usize) -> ComputeError {
    ComputeError::Expression(format!(
        "{} expects {} argument(s), got {}",
        name, expected, actual
    ))
}

/// Functor over an arbitrary arithmetic expression
#[derive(Debug, Clone)]
pub struct CustomFunctor {
    expr: String,
    columns: Vec<String>,
    literal: Expression,
    suffixed: Expression,
    settings: FunctorSettings,
}

impl CustomFunctor {
    /// Scan and parse the expression; syntax errors surface here
    pub fn new(expr: impl Into<String>) -> Result<Self> {
        let expr = expr.into();
        let columns = ExpressionScanner::required_columns(&expr)?
            .into_iter()
            .collect();
        let literal = ExpressionParser::parse(&ExpressionScanner::rewrite_mag(&expr, None)?)?;
        let suffixed =
            ExpressionParser::parse(&ExpressionScanner::rewrite_mag(&expr, Some(FLUX_SUFFIX))?)?;

        Ok(Self {
            expr,
            columns,
            literal,
            suffixed,
            settings: FunctorSettings::default(),
        })
    }

    pub fn expr(&self) -> &str {
        &self.expr
    }
}

impl Functor for CustomFunctor {
    fn name(&self) -> String {
        self.expr.clone()
    }

    fn columns(&self) -> Result<Vec<String>> {
        Ok(self.columns.clone())
    }

    fn settings(&self) -> &FunctorSettings {
        &self.settings
    }

    fn compute(&self, frame: &Frame) -> ComputeResult<ColumnValues> {
        let evaluator = ExpressionEvaluator::new(frame);
        let values = match evaluator.evaluate(&self.literal) {
            Ok(values) => values,
            Err(_) => evaluator.evaluate(&self.suffixed)?,
        };
        Ok(values.into())
    }
}

impl WithSettings for CustomFunctor {
    fn settings_mut(&mut self) -> &mut FunctorSettings {
        &mut self.settings
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use skyfunctor_core::ColumnKey;

    fn frame() -> Frame {
        Frame::new(vec![0, 1].into())
            .with_column(ColumnKey::flat("a"), vec![1.0, 4.0])
            .unwrap()
            .with_column(ColumnKey::flat("b"), vec![3.0, 0.0])
            .unwrap()
    }

    fn eval(expr: &str) -> ComputeResult<Vec<f64>> {
        let frame = frame();
        ExpressionEvaluator::new(&frame).evaluate(&ExpressionParser::parse(expr).unwrap())
    }

    #[test]
    fn test_scalar_broadcast() {
        assert_eq!(eval("2 * 3").unwrap(), vec![6.0, 6.0]);
        assert_eq!(eval("a + 1").unwrap(), vec![2.0, 5.0]);
        assert_eq!(eval("-a ** 2").unwrap(), vec![-1.0, -16.0]);
    }

    #[test]
    fn test_functions() {
        assert_eq!(eval("sqrt(a)").unwrap(), vec![1.0, 2.0]);
        assert!((eval("hypot(a, b)").unwrap()[0] - 10f64.sqrt()).abs() < 1e-12);
        assert!(eval("log10(b)").unwrap()[1].is_infinite());
    }

    #[test]
    fn test_errors() {
        assert_eq!(
            eval("a + missing").unwrap_err(),
            ComputeError::MissingColumn("missing".to_string())
        );
        assert!(matches!(eval("gamma(a)"), Err(ComputeError::Expression(_))));
        assert!(matches!(eval("sqrt(a, b)"), Err(ComputeError::Expression(_))));
    }

    #[test]
    fn test_custom_functor_columns() {
        let functor = CustomFunctor::new("mag(psFlux) - mag(cModelFlux)").unwrap();
        assert_eq!(
            functor.columns().unwrap(),
            vec!["cModelFlux_instFlux", "psFlux_instFlux"]
        );
        assert_eq!(functor.name(), "mag(psFlux) - mag(cModelFlux)");
    }

    #[test]
    fn test_custom_functor_syntax_error() {
        assert!(CustomFunctor::new("a + (b").is_err());
    }
}
