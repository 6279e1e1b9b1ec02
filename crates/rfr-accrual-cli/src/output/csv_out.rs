use serde_json::{Map, Value};
use std::io;

use super::format_scalar;

/// Write output as CSV to stdout: the daily trace when present, otherwise
/// `field,value` pairs with nested fields flattened to dotted keys.
pub fn print_csv(value: &Value) {
    let stdout = io::stdout();
    let mut wtr = csv::Writer::from_writer(stdout.lock());

    let result = value
        .as_object()
        .and_then(|m| m.get("result"))
        .unwrap_or(value);

    match result.get("daily_details") {
        Some(Value::Array(days)) if !days.is_empty() => write_rows(&mut wtr, days),
        _ => {
            let _ = wtr.write_record(["field", "value"]);
            let mut pairs = Vec::new();
            flatten("", result, &mut pairs);
            for (key, val) in pairs {
                let _ = wtr.write_record([key, val]);
            }
        }
    }

    let _ = wtr.flush();
}

fn write_rows<W: io::Write>(wtr: &mut csv::Writer<W>, rows: &[Value]) {
    let Some(Value::Object(first)) = rows.first() else {
        return;
    };
    let headers: Vec<&str> = first.keys().map(String::as_str).collect();
    let _ = wtr.write_record(&headers);

    for row in rows.iter().filter_map(Value::as_object) {
        let record: Vec<String> = headers
            .iter()
            .map(|h| row.get(*h).map(format_scalar).unwrap_or_default())
            .collect();
        let _ = wtr.write_record(&record);
    }
}

fn flatten(prefix: &str, value: &Value, out: &mut Vec<(String, String)>) {
    match value {
        Value::Object(map) => flatten_map(prefix, map, out),
        _ => out.push((prefix.to_string(), format_scalar(value))),
    }
}

fn flatten_map(prefix: &str, map: &Map<String, Value>, out: &mut Vec<(String, String)>) {
    for (key, val) in map {
        let path = if prefix.is_empty() {
            key.clone()
        } else {
            format!("{}.{}", prefix, key)
        };
        flatten(&path, val, out);
    }
}
