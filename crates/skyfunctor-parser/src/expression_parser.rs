//! Expression parser
//!
//! Parses arithmetic expression strings into Expression AST nodes.
//!
//! Supported syntax:
//! - Column references: `base_PsfFlux_instFlux`
//! - Numeric literals: `42`, `3.14`, `1e-5`, `.5`
//! - Binary operators: `+`, `-`, `*`, `/`, `**`
//! - Unary operators: `-`, `+`
//! - Function calls: `log10(x)`, `sqrt(a * b)`, `arctan2(y, x)`
//! - Parentheses for grouping: `(a + b) * c`
//!
//! Precedence (lowest first): additive, multiplicative, unary sign, power.
//! Power is right-associative, everything else left-associative.

use crate::error::{ParseError, Result};
use skyfunctor_core::ast::{Expression, Operator, UnaryOperator};

const UNSUPPORTED_OPERATORS: &[char] = &['%', '^', '&', '|', '<', '>', '=', '!', '~', '@'];

/// Expression parser
pub struct ExpressionParser;

impl ExpressionParser {
    /// Parse an expression from a string
    pub fn parse(input: &str) -> Result<Expression> {
        let input = input.trim();

        if input.is_empty() {
            return Err(ParseError::InvalidExpression("Empty expression".to_string()));
        }

        Self::check_parentheses(input)?;
        Self::check_operators(input)?;
        Self::parse_expression(input)
    }

    /// Parse a complete expression (handles binary operators with precedence)
    fn parse_expression(input: &str) -> Result<Expression> {
        let input = input.trim();
        if input.is_empty() {
            return Err(ParseError::InvalidExpression("Missing operand".to_string()));
        }

        // Additive operators (lowest precedence)
        if let Some((left, op, right)) = Self::split_by_operator(input, &[b'+', b'-']) {
            return Ok(Expression::binary(
                Self::parse_expression(left)?,
                op,
                Self::parse_expression(right)?,
            ));
        }

        // Multiplicative operators
        if let Some((left, op, right)) = Self::split_by_operator(input, &[b'*', b'/']) {
            return Ok(Expression::binary(
                Self::parse_expression(left)?,
                op,
                Self::parse_expression(right)?,
            ));
        }

        Self::parse_unary(input)
    }

    /// Parse a leading sign
    fn parse_unary(input: &str) -> Result<Expression> {
        let input = input.trim();

        if let Some(rest) = input.strip_prefix('-') {
            return Ok(Expression::unary(
                UnaryOperator::Negate,
                Self::parse_unary(rest)?,
            ));
        }
        if let Some(rest) = input.strip_prefix('+') {
            return Self::parse_unary(rest);
        }

        Self::parse_power(input)
    }

    /// Parse `base ** exponent`, splitting at the leftmost top-level `**`
    fn parse_power(input: &str) -> Result<Expression> {
        let bytes = input.as_bytes();
        let mut paren_depth = 0;

        for i in 0..bytes.len() {
            match bytes[i] {
                b'(' => paren_depth += 1,
                b')' => paren_depth -= 1,
                b'*' if paren_depth == 0 && i + 1 < bytes.len() && bytes[i + 1] == b'*' => {
                    let base = Self::parse_primary(&input[..i])?;
                    let exponent = Self::parse_unary(&input[i + 2..])?;
                    return Ok(Expression::binary(base, Operator::Pow, exponent));
                }
                _ => {}
            }
        }

        Self::parse_primary(input)
    }

    /// Parse a primary expression
    fn parse_primary(input: &str) -> Result<Expression> {
        let input = input.trim();

        if input.is_empty() {
            return Err(ParseError::InvalidExpression("Missing operand".to_string()));
        }

        // Check for parentheses
        if input.starts_with('(') && input.ends_with(')') {
            return Self::parse_expression(&input[1..input.len() - 1]);
        }

        // Check for number literals
        if input.starts_with(|c: char| c.is_ascii_digit() || c == '.') {
            return input
                .parse::<f64>()
                .map(Expression::literal)
                .map_err(|_| ParseError::InvalidExpression(format!("Invalid number: {}", input)));
        }

        // Check for function calls
        if let Some(paren_pos) = input.find('(') {
            if input.ends_with(')') {
                let func_name = input[..paren_pos].trim();
                if !Self::is_identifier(func_name) {
                    return Err(ParseError::InvalidExpression(format!(
                        "Invalid function name: {}",
                        func_name
                    )));
                }
                let args = Self::parse_function_args(&input[paren_pos + 1..input.len() - 1])?;
                return Ok(Expression::function_call(func_name, args));
            }
        }

        // Single identifier is a column reference
        if Self::is_identifier(input) {
            return Ok(Expression::column(input));
        }

        Err(ParseError::InvalidExpression(format!("Cannot parse: {}", input)))
    }

    /// Split input by binary operator (respecting parentheses)
    ///
    /// Scans right to left so that operators associate to the left. A sign
    /// with no operand before it is unary and is skipped, as is the sign of a
    /// scientific-notation exponent.
    fn split_by_operator<'a>(
        input: &'a str,
        operators: &[u8],
    ) -> Option<(&'a str, Operator, &'a str)> {
        let bytes = input.as_bytes();
        let mut paren_depth = 0;

        for i in (0..bytes.len()).rev() {
            let c = bytes[i];

            if c == b')' {
                paren_depth += 1;
                continue;
            } else if c == b'(' {
                paren_depth -= 1;
                continue;
            }

            if paren_depth != 0 || !operators.contains(&c) {
                continue;
            }

            // Part of `**`
            if c == b'*'
                && ((i > 0 && bytes[i - 1] == b'*') || (i + 1 < bytes.len() && bytes[i + 1] == b'*'))
            {
                continue;
            }

            let left = input[..i].trim_end();
            match left.chars().last() {
                None => continue,
                Some(p) if Self::is_operator_char(p) || p == '(' || p == ',' => continue,
                _ => {}
            }

            if (c == b'+' || c == b'-') && Self::is_exponent_sign(bytes, i) {
                continue;
            }

            let op = Self::parse_operator(c)?;
            return Some((left, op, input[i + 1..].trim()));
        }

        None
    }

    /// Whether the sign at `i` belongs to a literal like `1e-5`
    fn is_exponent_sign(bytes: &[u8], i: usize) -> bool {
        if i < 2 || !matches!(bytes[i - 1], b'e' | b'E') {
            return false;
        }

        let mut start = i - 1;
        while start > 0 && (bytes[start - 1].is_ascii_digit() || bytes[start - 1] == b'.') {
            start -= 1;
        }

        let mantissa = &bytes[start..i - 1];
        let has_digit = mantissa.iter().any(u8::is_ascii_digit);
        let preceded_by_word = start > 0 && (bytes[start - 1].is_ascii_alphanumeric() || bytes[start - 1] == b'_');

        has_digit && !preceded_by_word
    }

    /// Check if a character is part of an operator
    fn is_operator_char(c: char) -> bool {
        matches!(c, '+' | '-' | '*' | '/')
    }

    fn is_identifier(s: &str) -> bool {
        let mut chars = s.chars();
        match chars.next() {
            Some(c) if c.is_ascii_alphabetic() || c == '_' => {
                chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
            }
            _ => false,
        }
    }

    /// Parse function arguments
    fn parse_function_args(args_str: &str) -> Result<Vec<Expression>> {
        if args_str.trim().is_empty() {
            return Ok(Vec::new());
        }

        let mut args = Vec::new();
        let mut current_arg = String::new();
        let mut paren_depth = 0;

        for c in args_str.chars() {
            match c {
                '(' => paren_depth += 1,
                ')' => paren_depth -= 1,
                ',' if paren_depth == 0 => {
                    args.push(Self::parse_expression(&current_arg)?);
                    current_arg.clear();
                    continue;
                }
                _ => {}
            }
            current_arg.push(c);
        }

        args.push(Self::parse_expression(&current_arg)?);

        Ok(args)
    }

    /// Parentheses must balance and never close before opening
    fn check_parentheses(input: &str) -> Result<()> {
        let mut depth = 0i32;
        for c in input.chars() {
            match c {
                '(' => depth += 1,
                ')' => {
                    depth -= 1;
                    if depth < 0 {
                        return Err(ParseError::InvalidExpression(format!(
                            "Unbalanced parentheses: {}",
                            input
                        )));
                    }
                }
                _ => {}
            }
        }
        if depth != 0 {
            return Err(ParseError::InvalidExpression(format!(
                "Unbalanced parentheses: {}",
                input
            )));
        }
        Ok(())
    }

    /// Reject operator characters the grammar does not support
    fn check_operators(input: &str) -> Result<()> {
        match input.chars().find(|c| UNSUPPORTED_OPERATORS.contains(c)) {
            Some(c) => Err(ParseError::InvalidOperator(format!("'{}' in {}", c, input))),
            None => Ok(()),
        }
    }

    /// Parse an operator byte
    fn parse_operator(op: u8) -> Option<Operator> {
        match op {
            b'+' => Some(Operator::Add),
            b'-' => Some(Operator::Sub),
            b'*' => Some(Operator::Mul),
            b'/' => Some(Operator::Div),
            _ => None,
        }
    }
}
