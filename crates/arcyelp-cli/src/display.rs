//! Vertical card display for business records.
//!
//! Renders one normalised record as a grouped, human-readable card.

use std::fmt::Write as _;

use arcyelp_core::NormalizedDisplayRecord;
use arcyelp_core::spatial::is_cell_field;
use serde_json::Value;

// ── Section groupings ──

const IDENTITY: &[&str] = &["id", "name", "url", "image_url"];

const LISTING: &[&str] = &["categories", "rating", "review_count", "price", "address"];

// ── Public API ──

/// Render a record as a card grouped by section.
pub fn business_card(record: &NormalizedDisplayRecord) -> String {
    let mut out = String::new();
    let name = record.get("name").and_then(Value::as_str).unwrap_or_default();
    let id = record.id().unwrap_or("-");

    let _ = writeln!(out, "=== {} ===", if name.is_empty() { id } else { name });
    out.push('\n');

    write_section(&mut out, record, "Identity", IDENTITY);
    write_section(&mut out, record, "Listing", LISTING);

    let cells: Vec<&str> = record
        .as_document()
        .keys()
        .map(String::as_str)
        .filter(|k| is_cell_field(k))
        .collect();
    let mut spatial = cells;
    spatial.push("geometry");
    write_section(&mut out, record, "Spatial", &spatial);

    out
}

pub fn print_business_card(record: &NormalizedDisplayRecord) {
    print!("{}", business_card(record));
}

// ── Section rendering ──

fn write_section(out: &mut String, record: &NormalizedDisplayRecord, header: &str, keys: &[&str]) {
    let present: Vec<(&str, &Value)> = keys
        .iter()
        .filter_map(|&k| record.get(k).filter(|v| !v.is_null()).map(|v| (k, v)))
        .collect();
    if present.is_empty() {
        return;
    }

    let _ = writeln!(out, "{header}");
    for (key, value) in present {
        let _ = writeln!(out, "  {:<26} {}", key, display_value(value));
    }
    out.push('\n');
}

fn display_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => (if *b { "yes" } else { "no" }).to_string(),
        other => other.to_string(),
    }
}
