//! Object table example
//!
//! This example demonstrates:
//! - Building a two-band leveled table in memory
//! - Loading a composite functor from a YAML specification
//! - Evaluating it with a single bulk load and printing JSON records
//!
//! Run with: cargo run --example object_table

use skyfunctor_runtime::{
    ColumnKey, ColumnTable, CompositeFunctor, LeveledTable, Result as RuntimeResult,
};

const ROWS: usize = 4;

fn object_table() -> RuntimeResult<LeveledTable> {
    let mut table = LeveledTable::canonical(ROWS);

    for (band, scale) in [("g", 1.0), ("r", 1.6)] {
        let key = |dataset: &str, column: &str| ColumnKey::leveled(band, dataset, column);

        table.insert(key("ref", "coord_ra"), vec![0.61, 0.62, 0.63, 0.64])?;
        table.insert(key("ref", "coord_dec"), vec![-0.01, 0.0, 0.01, 0.02])?;
        table.insert(key("ref", "detect_isPrimary"), vec![true, true, false, true])?;

        let flux: Vec<f64> = [1200.0, 850.0, -3.0, 4100.0].iter().map(|f| f * scale).collect();
        table.insert(key("meas", "base_PsfFlux_instFlux"), flux.clone())?;
        table.insert(key("meas", "base_PsfFlux_instFluxErr"), vec![12.0, 10.0, 9.0, 20.0])?;
        table.insert(key("forced_src", "base_PsfFlux_instFlux"), flux)?;

        table.insert(key("meas", "base_SdssShape_xx"), vec![4.1, 3.2, 2.0, 6.5])?;
        table.insert(key("meas", "base_SdssShape_xy"), vec![0.2, -0.1, 0.0, 1.1])?;
        table.insert(key("meas", "base_SdssShape_yy"), vec![3.9, 3.0, 2.0, 5.0])?;
        table.insert(
            key("meas", "base_ClassificationExtendedness_value"),
            vec![0.0, 1.0, f64::NAN, 1.0],
        )?;
        table.insert(key("meas", "base_PixelFlags_flag_edge"), vec![false, false, true, false])?;
    }

    Ok(table)
}

fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("skyfunctor_runtime=debug".parse()?),
        )
        .init();

    println!("=== Object Table Example ===\n");

    let table = object_table()?;
    println!("Filters in table: {:?}\n", table.level_values(skyfunctor_core::Level::Filter));

    let mut functors = CompositeFunctor::from_file("demos/specs/object_functors.yaml")?;
    functors.set_filter(Some("r".to_string()));
    println!("Functors: {:?}\n", functors.keys());

    let result = functors.evaluate_detailed(&table, false)?;
    for failure in &result.failures {
        println!("Column '{}' was substituted: {}", failure.name, failure.reason);
    }

    println!("{}", serde_json::to_string_pretty(&result.frame.to_json_records())?);
    Ok(())
}
