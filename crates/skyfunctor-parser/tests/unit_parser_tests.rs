//! Unit tests for the specification and expression parsers
//!
//! Covers YAML functor specifications (funcs, rename rules, flag lists,
//! config blocks), file loading, expression parsing and the `mag(x)`
//! scanner.

use skyfunctor_core::ast::{rename_column, Expression, Operator};
use skyfunctor_core::Value;
use skyfunctor_parser::*;
use std::io::Write;

// =============================================================================
// Specification Parser Tests
// =============================================================================

#[test]
fn test_parse_full_specification() {
    let yaml = r#"
funcs:
  psfMag:
    functor: Mag
    args: [base_PsfFlux]
    filt: HSC-G
    dataset: meas
  ra:
    functor: RAColumn
  color:
    functor: Color
    args:
      - base_PsfFlux
      - HSC-R
      - HSC-G
flag_rename_rules:
  - [base_Pixel, pixel]
  - [base_, ""]
refFlags:
  - detect_isPrimary
flags:
  - base_PixelFlags_flag_saturated
"#;

    let result = SpecParser::parse(yaml);
    assert!(result.is_ok(), "Failed to parse specification: {:?}", result.err());

    let spec = result.unwrap();
    let names: Vec<&str> = spec.funcs.iter().map(|f| f.name.as_str()).collect();
    assert_eq!(names, vec!["psfMag", "ra", "color"]);

    let psf = spec.func("psfMag").unwrap();
    assert_eq!(psf.functor, "Mag");
    assert_eq!(psf.args, vec![Value::from("base_PsfFlux")]);
    assert_eq!(psf.kwargs.get("filt"), Some(&Value::from("HSC-G")));
    assert_eq!(psf.kwargs.get("dataset"), Some(&Value::from("meas")));
    assert!(!psf.kwargs.contains_key("functor"));
    assert!(!psf.kwargs.contains_key("args"));

    assert_eq!(spec.func("color").unwrap().args.len(), 3);

    assert_eq!(spec.flag_rename_rules.len(), 2);
    assert_eq!(spec.ref_flags, vec!["detect_isPrimary"]);
    assert_eq!(spec.flags, vec!["base_PixelFlags_flag_saturated"]);
    assert!(spec.config.is_none());
}

#[test]
fn test_rename_rules_apply_in_order() {
    let spec = SpecParser::parse(
        r#"
funcs: {}
flag_rename_rules:
  - [base_Pixel, pixel]
  - [base_, ""]
"#,
    )
    .unwrap();

    assert_eq!(
        rename_column("base_PixelFlags_flag_saturated", &spec.flag_rename_rules),
        "pixelFlags_flag_saturated"
    );
    assert_eq!(
        rename_column("base_SdssShape_flag", &spec.flag_rename_rules),
        "SdssShape_flag"
    );
    assert_eq!(
        rename_column("detect_isPrimary", &spec.flag_rename_rules),
        "detect_isPrimary"
    );
}

#[test]
fn test_parse_calib_and_config_blocks() {
    let yaml = r#"
funcs:
  mag:
    functor: Mag
    args: base_PsfFlux
    calib:
      fluxMag0: 1.0e11
      fluxMag0Err: 100.0
config:
  force_str_labels: true
"#;

    let spec = SpecParser::parse(yaml).unwrap();
    let mag = spec.func("mag").unwrap();
    assert_eq!(mag.args, vec![Value::from("base_PsfFlux")]);

    let calib = mag.kwargs.get("calib").and_then(Value::as_object).unwrap();
    assert_eq!(calib.get("fluxMag0").and_then(Value::as_f64), Some(1.0e11));

    let config = spec.config.unwrap();
    let config = config.as_object().unwrap();
    assert_eq!(config.get("force_str_labels"), Some(&Value::Bool(true)));
}

#[test]
fn test_parse_invalid_specifications() {
    // Not a mapping
    assert!(SpecParser::parse("- a\n- b\n").is_err());

    // funcs must be a mapping
    assert!(matches!(
        SpecParser::parse("funcs: [a, b]"),
        Err(ParseError::InvalidValue { .. })
    ));

    // Functor definition must be a mapping
    assert!(SpecParser::parse("funcs:\n  a: Mag\n").is_err());

    // Flags must be strings
    assert!(SpecParser::parse("funcs: {}\nflags: [[a]]\n").is_err());

    // Malformed YAML
    assert!(matches!(
        SpecParser::parse("funcs: {a: [}"),
        Err(ParseError::YamlError(_))
    ));
}

#[test]
fn test_parse_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(
        file,
        "funcs:\n  id:\n    functor: IDColumn\nflags: [base_Centroid_flag]"
    )
    .unwrap();

    let spec = SpecParser::parse_file(file.path()).unwrap();
    assert_eq!(spec.funcs.len(), 1);
    assert_eq!(spec.flags, vec!["base_Centroid_flag"]);
}

#[test]
fn test_parse_missing_file() {
    let dir = tempfile::tempdir().unwrap();
    let err = SpecParser::parse_file(dir.path().join("absent.yaml")).unwrap_err();
    assert!(matches!(err, ParseError::Io { .. }));
    assert!(err.to_string().contains("absent.yaml"));
}

// =============================================================================
// Expression Parser Tests
// =============================================================================

#[test]
fn test_parse_rewritten_mag_expression() {
    let rewritten =
        ExpressionScanner::rewrite_mag("mag(psFlux) - mag(cModelFlux)", Some(FLUX_SUFFIX)).unwrap();
    let expr = ExpressionParser::parse(&rewritten).unwrap();

    match &expr {
        Expression::Binary { op, .. } => assert_eq!(*op, Operator::Sub),
        other => panic!("Expected subtraction, got {:?}", other),
    }

    let cols: Vec<String> = expr.columns().into_iter().collect();
    assert_eq!(cols, vec!["cModelFlux_instFlux", "psFlux_instFlux"]);
}

#[test]
fn test_parse_shape_expression() {
    let expr = ExpressionParser::parse("sqrt(0.5 * (ixx + iyy))").unwrap();
    if let Expression::FunctionCall { name, args } = &expr {
        assert_eq!(name, "sqrt");
        assert_eq!(args.len(), 1);
    } else {
        panic!("Expected function call");
    }

    let cols: Vec<String> = expr.columns().into_iter().collect();
    assert_eq!(cols, vec!["ixx", "iyy"]);
}

#[test]
fn test_parse_nested_powers_and_signs() {
    assert!(ExpressionParser::parse("(xx * yy - xy ** 2) ** 0.25").is_ok());
    assert!(ExpressionParser::parse("-(a + b) / -c").is_ok());
    assert!(ExpressionParser::parse("+a - -b").is_ok());
    assert!(ExpressionParser::parse("hypot(a * 1e+3, b)").is_ok());
}

#[test]
fn test_parse_expression_errors() {
    assert!(ExpressionParser::parse("   ").is_err());
    assert!(ExpressionParser::parse("a * * b").is_err());
    assert!(ExpressionParser::parse("f(a,)").is_err());
    assert!(ExpressionParser::parse("2a").is_err());
}

// =============================================================================
// Expression Scanner Tests
// =============================================================================

#[test]
fn test_scanner_required_columns() {
    let cols = ExpressionScanner::required_columns("mag(psFlux) - mag(cModelFlux)").unwrap();
    assert!(cols.contains("psFlux_instFlux"));
    assert!(cols.contains("cModelFlux_instFlux"));
    assert_eq!(cols.len(), 2);

    let cols = ExpressionScanner::required_columns("exp(a) + cos(b) * log(c)").unwrap();
    assert_eq!(cols.len(), 3);
}

#[test]
fn test_scanner_mag_arguments_in_order() {
    let args = ExpressionScanner::mag_arguments("mag(z) - mag(a) + mag(z)").unwrap();
    assert_eq!(args, vec!["z", "a", "z"]);
}
