//! Expression scanner
//!
//! Finds the columns a free-form expression needs without fully parsing it,
//! and rewrites the `mag(x)` shorthand into the literal magnitude formula.
//!
//! Column discovery is lexical: every identifier-like word that is not a
//! known math function is a column. Arguments of `mag(...)` name a flux
//! measurement, so they are required with the `_instFlux` suffix.

use crate::error::Result;
use regex::Regex;
use std::collections::BTreeSet;
use std::sync::OnceLock;

/// Suffix of instrumental flux columns
pub const FLUX_SUFFIX: &str = "_instFlux";

/// Suffix of instrumental flux error columns
pub const FLUX_ERR_SUFFIX: &str = "_instFluxErr";

/// Words that are functions, not columns
pub const MATH_WORDS: &[&str] = &[
    "mag", "sin", "cos", "tan", "arcsin", "arccos", "arctan", "arctan2", "exp", "log", "log10",
    "sqrt", "abs", "hypot",
];

const IDENTIFIER_RE: &str = r"\b[A-Za-z_][A-Za-z0-9_]*\b";
const MAG_CALL_RE: &str = r"mag\(\s*(\w+)\s*\)";

fn identifier_re() -> Result<&'static Regex> {
    static RE: OnceLock<std::result::Result<Regex, regex::Error>> = OnceLock::new();
    RE.get_or_init(|| Regex::new(IDENTIFIER_RE))
        .as_ref()
        .map_err(|e| e.clone().into())
}

fn mag_call_re() -> Result<&'static Regex> {
    static RE: OnceLock<std::result::Result<Regex, regex::Error>> = OnceLock::new();
    RE.get_or_init(|| Regex::new(MAG_CALL_RE))
        .as_ref()
        .map_err(|e| e.clone().into())
}

/// Append the flux suffix unless already present
pub fn flux_name(col: &str) -> String {
    if col.ends_with(FLUX_SUFFIX) {
        col.to_string()
    } else {
        format!("{}{}", col, FLUX_SUFFIX)
    }
}

/// Append the flux error suffix unless already present
pub fn flux_err_name(col: &str) -> String {
    if col.ends_with(FLUX_ERR_SUFFIX) {
        col.to_string()
    } else {
        format!("{}{}", col, FLUX_ERR_SUFFIX)
    }
}

/// Lexical scanner for custom expressions
pub struct ExpressionScanner;

impl ExpressionScanner {
    /// Identifier-like words, excluding math function names
    pub fn identifiers(expr: &str) -> Result<Vec<String>> {
        let re = identifier_re()?;
        Ok(re
            .find_iter(expr)
            .map(|m| m.as_str())
            .filter(|w| !MATH_WORDS.contains(w))
            .map(str::to_string)
            .collect())
    }

    /// Arguments of every `mag(...)` call, in order of appearance
    pub fn mag_arguments(expr: &str) -> Result<Vec<String>> {
        let re = mag_call_re()?;
        Ok(re
            .captures_iter(expr)
            .filter_map(|caps| caps.get(1))
            .map(|m| m.as_str().to_string())
            .collect())
    }

    /// Columns the expression needs loaded
    ///
    /// `mag(psFlux)` requires `psFlux_instFlux`; the bare `psFlux` is not
    /// treated as a column.
    pub fn required_columns(expr: &str) -> Result<BTreeSet<String>> {
        let mut cols: BTreeSet<String> = Self::identifiers(expr)?.into_iter().collect();
        for arg in Self::mag_arguments(expr)? {
            if !arg.ends_with(FLUX_SUFFIX) {
                cols.remove(&arg);
                cols.insert(flux_name(&arg));
            }
        }
        Ok(cols)
    }

    /// Replace `mag(x)` with `(-2.5*log10(x<suffix>))`
    pub fn rewrite_mag(expr: &str, suffix: Option<&str>) -> Result<String> {
        let re = mag_call_re()?;
        let replacement = match suffix {
            Some(suffix) => format!("(-2.5*log10(${{1}}{}))", suffix),
            None => "(-2.5*log10(${1}))".to_string(),
        };
        Ok(re.replace_all(expr, replacement.as_str()).into_owned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flux_names() {
        assert_eq!(flux_name("base_PsfFlux"), "base_PsfFlux_instFlux");
        assert_eq!(flux_name("base_PsfFlux_instFlux"), "base_PsfFlux_instFlux");
        assert_eq!(flux_err_name("base_PsfFlux"), "base_PsfFlux_instFluxErr");
        assert_eq!(flux_err_name("a_instFluxErr"), "a_instFluxErr");
    }

    #[test]
    fn test_required_columns_for_mag_expression() {
        let cols = ExpressionScanner::required_columns("mag(psFlux) - mag(cModelFlux)").unwrap();
        let cols: Vec<&str> = cols.iter().map(String::as_str).collect();
        assert_eq!(cols, vec!["cModelFlux_instFlux", "psFlux_instFlux"]);
    }

    #[test]
    fn test_required_columns_ignore_math_and_numbers() {
        let cols = ExpressionScanner::required_columns("sqrt(xx*yy) + 1e-5 * log10(x2)").unwrap();
        let cols: Vec<&str> = cols.iter().map(String::as_str).collect();
        assert_eq!(cols, vec!["x2", "xx", "yy"]);
    }

    #[test]
    fn test_suffixed_mag_argument_kept() {
        let cols = ExpressionScanner::required_columns("mag(a_instFlux)").unwrap();
        assert!(cols.contains("a_instFlux"));
        assert_eq!(cols.len(), 1);
    }

    #[test]
    fn test_patterns_compiled_once() {
        assert!(std::ptr::eq(identifier_re().unwrap(), identifier_re().unwrap()));
        assert!(std::ptr::eq(mag_call_re().unwrap(), mag_call_re().unwrap()));
        // Repeated scans reuse the cached patterns
        for _ in 0..3 {
            assert_eq!(ExpressionScanner::mag_arguments("mag(a) + mag(b)").unwrap(), vec!["a", "b"]);
        }
    }

    #[test]
    fn test_rewrite_mag() {
        assert_eq!(
            ExpressionScanner::rewrite_mag("mag(a) - mag( b )", None).unwrap(),
            "(-2.5*log10(a)) - (-2.5*log10(b))"
        );
        assert_eq!(
            ExpressionScanner::rewrite_mag("mag(a)", Some(FLUX_SUFFIX)).unwrap(),
            "(-2.5*log10(a_instFlux))"
        );
    }
}
