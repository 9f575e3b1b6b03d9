//! Custom expression example
//!
//! This example demonstrates:
//! - Discovering the columns a free-form expression needs
//! - Evaluating `mag(x)` shorthand against a flat table
//! - How a failing expression is contained as a missing column
//!
//! Run with: cargo run --example custom_expression

use skyfunctor_parser::ExpressionScanner;
use skyfunctor_runtime::{
    ColumnOutcome, CustomFunctor, FlatTable, Functor, FunctorConfig, FunctorLoader,
};
use skyfunctor_core::ast::{CompositeSpec, FunctorSpec};

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    println!("=== Custom Expression Example ===\n");

    let table = FlatTable::new(vec![101, 102, 103])
        .with_column("psFlux_instFlux", vec![100.0, 250.0, 80.0])?
        .with_column("cModelFlux_instFlux", vec![50.0, 260.0, 0.0])?
        .with_column("ext_shapeHSM_HsmSourceMoments_xx", vec![2.0, 3.0, 4.0])?
        .with_column("ext_shapeHSM_HsmSourceMoments_yy", vec![2.0, 1.0, 4.0])?;

    let expr = "mag(psFlux) - mag(cModelFlux)";
    println!("Expression: {}", expr);
    println!("Required columns: {:?}", ExpressionScanner::required_columns(expr)?);

    let concentration = CustomFunctor::new(expr)?;
    let column = concentration.evaluate(&table, false)?;
    println!("{} = {:?}\n", column.name(), column.floats()?);

    // A declarative spec mixing an expression with a built-in functor
    let spec = CompositeSpec::new()
        .with_func(FunctorSpec::new("concentration", "CustomFunctor").with_arg(expr))
        .with_func(FunctorSpec::new("hsmTrace", "HsmTraceSize"))
        .with_func(FunctorSpec::new("broken", "CustomFunctor").with_arg("sqrt(psFlux_instFlux, 2)"));

    let loader = FunctorLoader::new(
        skyfunctor_runtime::FunctorRegistry::with_builtins(),
        FunctorConfig::default(),
    );
    let composite = loader.load(&spec)?;
    let result = composite.evaluate_detailed(&table, false)?;

    for column in result.frame.columns() {
        println!("{:>14}: {:?}", column.name(), column.floats()?);
    }
    for failure in &result.failures {
        println!("substituted '{}': {}", failure.name, failure.reason);
    }

    // The same containment is visible on a single functor
    let broken = CustomFunctor::new("sqrt(psFlux_instFlux, 2)")?;
    let frame = skyfunctor_core::Frame::new(table.index().clone());
    if let ColumnOutcome::Substituted { reason, .. } = broken.outcome(&frame) {
        println!("\nsingle functor failure: {}", reason);
    }

    Ok(())
}
