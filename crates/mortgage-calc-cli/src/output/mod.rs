pub mod csv_out;
pub mod json;
pub mod minimal;
pub mod table;

use crate::OutputFormat;
use serde_json::{Map, Value};

/// Dispatch output to the appropriate formatter.
pub fn format_output(format: &OutputFormat, value: &Value) {
    match format {
        OutputFormat::Json => json::print_json(value),
        OutputFormat::Table => table::print_table(value),
        OutputFormat::Csv => csv_out::print_csv(value),
        OutputFormat::Minimal => minimal::print_minimal(value),
    }
}

/// Array fields worth exporting as rows, most useful first.
pub(crate) const ROW_FIELDS: [&str; 8] = [
    "schedule",
    "years",
    "yearly_rollups",
    "scenarios",
    "yearly_bands",
    "timeline",
    "equity_over_time",
    "resets",
];

/// Scalar fields of `map` with nested objects flattened to dotted keys, and
/// the arrays of objects found along the way.
pub(crate) fn flatten<'a>(
    prefix: &str,
    map: &'a Map<String, Value>,
    scalars: &mut Vec<(String, String)>,
    tables: &mut Vec<(String, &'a [Value])>,
) {
    for (key, val) in map {
        let name = if prefix.is_empty() {
            key.clone()
        } else {
            format!("{prefix}.{key}")
        };
        match val {
            Value::Array(items) if items.first().is_some_and(Value::is_object) => {
                tables.push((name, items.as_slice()));
            }
            Value::Object(inner) if breakeven_period(val).is_none() => {
                flatten(&name, inner, scalars, tables);
            }
            _ => scalars.push((name, format_value(val))),
        }
    }
}

/// `{"at": n}` as produced for a breakeven period.
fn breakeven_period(value: &Value) -> Option<&Value> {
    match value {
        Value::Object(map) if map.len() == 1 => map.get("at"),
        _ => None,
    }
}

pub(crate) fn format_value(value: &Value) -> String {
    if let Some(at) = breakeven_period(value) {
        return format_value(at);
    }
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => String::new(),
        Value::Array(arr) => arr.iter().map(format_value).collect::<Vec<_>>().join(", "),
        Value::Object(_) => serde_json::to_string(value).unwrap_or_default(),
    }
}
