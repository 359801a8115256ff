use serde_json::Value;
use tabled::{builder::Builder, Table};

use super::{flatten, format_value};

/// Format output as tables: result fields first, then each array of rows
/// (schedule, yearly rows, scenarios), then warnings and methodology.
pub fn print_table(value: &Value) {
    match value {
        Value::Object(map) => match map.get("result") {
            Some(Value::Object(result)) => {
                let mut scalars = Vec::new();
                let mut tables = Vec::new();
                flatten("", result, &mut scalars, &mut tables);
                print_pairs(&scalars);
                for (name, rows) in tables {
                    println!("\n{name}:");
                    print_rows(rows);
                }
                print_notes(map);
            }
            _ => {
                let mut scalars = Vec::new();
                let mut tables = Vec::new();
                flatten("", map, &mut scalars, &mut tables);
                print_pairs(&scalars);
            }
        },
        Value::Array(arr) => print_rows(arr),
        _ => println!("{value}"),
    }
}

fn print_pairs(pairs: &[(String, String)]) {
    let mut builder = Builder::default();
    builder.push_record(["Field", "Value"]);
    for (key, val) in pairs {
        builder.push_record([key.as_str(), val.as_str()]);
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
    builder.push_record(&headers);
    for row in rows {
        if let Value::Object(map) = row {
            builder.push_record(
                headers
                    .iter()
                    .map(|h| map.get(h.as_str()).map(format_value).unwrap_or_default()),
            );
        }
    }
    println!("{}", Table::from(builder));
}

fn print_notes(envelope: &serde_json::Map<String, Value>) {
    if let Some(Value::Array(warnings)) = envelope.get("warnings") {
        if !warnings.is_empty() {
            println!("\nWarnings:");
            for w in warnings.iter().filter_map(Value::as_str) {
                println!("  - {w}");
            }
        }
    }

    if let Some(Value::String(meth)) = envelope.get("methodology") {
        println!("\nMethodology: {meth}");
    }
}
