//! Terminal rendering for offline scoring.
//!
//! Feature frames are single-row, Float64-only record batches. The default
//! card lays one column per line, grouped by how the column was derived;
//! `--table` falls back to Arrow's pretty table.

use arrow::array::{Array, Float64Array};
use arrow::util::pretty::pretty_format_batches;
use kesonia_ai::FeatureFrame;
use kesonia_core::Decision;
use kesonia_core::schema::CATEGORICAL_FIELDS;

// ── Public API ──

pub fn print_decision(decision: &Decision) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(decision)?);
    Ok(())
}

/// Print each labelled frame as a card or a table.
pub fn print_frames(frames: &[FeatureFrame], table: bool) -> anyhow::Result<()> {
    for frame in frames {
        if table {
            println!("=== {} ({} columns) ===", frame.label, frame.batch.num_columns());
            println!("{}", pretty_format_batches(std::slice::from_ref(&frame.batch))?);
            println!();
        } else {
            print_feature_card(frame);
        }
    }
    Ok(())
}

// ── Card rendering ──

fn print_feature_card(frame: &FeatureFrame) {
    let batch = &frame.batch;
    println!("=== {} ({} columns) ===", frame.label, batch.num_columns());

    let schema = batch.schema();
    let mut numeric = Vec::new();
    let mut indicators = Vec::new();
    for (idx, field) in schema.fields().iter().enumerate() {
        let name = field.name().as_str();
        let entry = (name, value_at(batch.column(idx).as_ref()));
        if is_indicator(name) {
            indicators.push(entry);
        } else {
            numeric.push(entry);
        }
    }

    if !numeric.is_empty() {
        println!("Numeric");
        for (name, value) in &numeric {
            println!(
                "  {:<36} {}{}",
                name,
                fmt_value(*value),
                log_marker(frame, name)
            );
        }
    }

    if !indicators.is_empty() {
        println!("Indicators");
        let set: Vec<&str> = indicators
            .iter()
            .filter(|(_, v)| v.is_some_and(|v| v != 0.0))
            .map(|(name, _)| *name)
            .collect();
        if set.is_empty() {
            println!("  (baseline levels only)");
        }
        for name in set {
            println!("  {name}");
        }
        println!("  {} of {} set", count_set(&indicators), indicators.len());
    }
    println!();
}

// ── Helpers ──

fn is_indicator(column: &str) -> bool {
    CATEGORICAL_FIELDS.iter().any(|field| {
        column
            .strip_prefix(field)
            .is_some_and(|rest| rest.starts_with('_'))
    })
}

fn log_marker(frame: &FeatureFrame, column: &str) -> &'static str {
    if frame.log_columns.iter().any(|c| c == column) {
        "  (log1p)"
    } else {
        ""
    }
}

fn value_at(col: &dyn Array) -> Option<f64> {
    if col.is_empty() || col.is_null(0) {
        return None;
    }
    col.as_any()
        .downcast_ref::<Float64Array>()
        .map(|a| a.value(0))
}

fn fmt_value(value: Option<f64>) -> String {
    match value {
        Some(v) => format!("{v:>12.4}"),
        None => format!("{:>12}", "-"),
    }
}

fn count_set(indicators: &[(&str, Option<f64>)]) -> usize {
    indicators
        .iter()
        .filter(|(_, v)| v.is_some_and(|v| v != 0.0))
        .count()
}
