use serde_json::Value;

use super::format_scalar;

/// Headline field for each command, most important first.
const PRIORITY_KEYS: [&str; 3] = ["interest_total", "observation_date", "compounded_factor"];

/// Print just the headline value, falling back to the first result field.
pub fn print_minimal(value: &Value) {
    let result_obj = value
        .as_object()
        .and_then(|m| m.get("result"))
        .unwrap_or(value);

    if let Value::Object(map) = result_obj {
        let headline = PRIORITY_KEYS
            .iter()
            .filter_map(|key| map.get(*key))
            .find(|val| !val.is_null());
        if let Some(val) = headline {
            println!("{}", format_scalar(val));
            return;
        }

        if let Some((key, val)) = map.iter().next() {
            println!("{}: {}", key, format_scalar(val));
            return;
        }
    }

    println!("{}", format_scalar(result_obj));
}
