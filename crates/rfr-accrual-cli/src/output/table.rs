use serde_json::{Map, Value};
use tabled::{builder::Builder, Table};

use super::format_scalar;

/// Nested sections printed as their own tables after the headline fields.
const SECTIONS: [&str; 2] = ["margin_breakdown", "daily_details"];

/// Format output as tables using the tabled crate.
pub fn print_table(value: &Value) {
    match value.as_object() {
        Some(map) => match map.get("result") {
            Some(Value::Object(result)) => print_result(result, map),
            _ => print_fields(map),
        },
        None => println!("{}", value),
    }
}

fn print_result(result: &Map<String, Value>, envelope: &Map<String, Value>) {
    let headline: Map<String, Value> = result
        .iter()
        .filter(|(key, _)| !SECTIONS.contains(&key.as_str()))
        .map(|(key, val)| (key.clone(), val.clone()))
        .collect();
    print_fields(&headline);

    if let Some(Value::Object(breakdown)) = result.get("margin_breakdown") {
        println!("\nMargin breakdown:");
        print_legs(breakdown);
    }

    if let Some(Value::Array(days)) = result.get("daily_details") {
        println!("\nDaily details:");
        print_rows(days);
    }

    if let Some(Value::Array(warnings)) = envelope.get("warnings") {
        if !warnings.is_empty() {
            println!("\nWarnings:");
            for w in warnings.iter().filter_map(Value::as_str) {
                println!("  - {}", w);
            }
        }
    }

    if let Some(Value::String(meth)) = envelope.get("methodology") {
        println!("\nMethodology: {}", meth);
    }
}

fn print_fields(map: &Map<String, Value>) {
    let mut builder = Builder::default();
    builder.push_record(["Field", "Value"]);
    for (key, val) in map {
        builder.push_record([key.as_str(), &format_scalar(val)]);
    }
    println!("{}", Table::from(builder));
}

/// One row per leg (`pre`, `post`).
fn print_legs(breakdown: &Map<String, Value>) {
    let mut builder = Builder::default();
    builder.push_record(["Leg", "Days", "Margin p.a.", "Effective"]);
    for (leg, detail) in breakdown {
        let cell = |field: &str| detail.get(field).map(format_scalar).unwrap_or_default();
        builder.push_record([
            leg.clone(),
            cell("days"),
            cell("margin_pa"),
            cell("effective_date"),
        ]);
    }
    println!("{}", Table::from(builder));
}

fn print_rows(rows: &[Value]) {
    let Some(Value::Object(first)) = rows.first() else {
        println!("(empty)");
        return;
    };

    let headers: Vec<String> = first.keys().cloned().collect();
    let mut builder = Builder::default();
    builder.push_record(headers.clone());
    for row in rows.iter().filter_map(Value::as_object) {
        builder.push_record(
            headers
                .iter()
                .map(|h| row.get(h).map(format_scalar).unwrap_or_default()),
        );
    }
    println!("{}", Table::from(builder));
}
