use serde_json::Value;
use std::io;

use super::{flatten, format_value, ROW_FIELDS};

/// Write output as CSV to stdout. Results carrying rows (a schedule, yearly
/// projections, scenarios) export those rows; anything else is written as
/// field,value pairs.
pub fn print_csv(value: &Value) {
    let stdout = io::stdout();
    let mut wtr = csv::Writer::from_writer(stdout.lock());

    let result = value
        .as_object()
        .and_then(|m| m.get("result"))
        .unwrap_or(value);

    match result {
        Value::Object(map) => {
            let mut scalars = Vec::new();
            let mut tables = Vec::new();
            flatten("", map, &mut scalars, &mut tables);

            let rows = ROW_FIELDS.iter().find_map(|field| {
                tables
                    .iter()
                    .find(|(name, _)| name == field || name.ends_with(&format!(".{field}")))
                    .map(|(_, rows)| *rows)
            });
            match rows {
                Some(rows) => write_rows(&mut wtr, rows),
                None => {
                    let _ = wtr.write_record(["field", "value"]);
                    for (key, val) in &scalars {
                        let _ = wtr.write_record([key.as_str(), val.as_str()]);
                    }
                }
            }
        }
        Value::Array(arr) => write_rows(&mut wtr, arr),
        _ => {
            let _ = wtr.write_record([format_value(result)]);
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
    for row in rows {
        if let Value::Object(map) = row {
            let record: Vec<String> = headers
                .iter()
                .map(|h| map.get(*h).map(format_value).unwrap_or_default())
                .collect();
            let _ = wtr.write_record(&record);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_rows_written_with_headers() {
        let rows = json!([
            { "month_index": 1, "ending_balance": "299728.80" },
            { "month_index": 2, "ending_balance": "299456.14" }
        ]);
        let mut wtr = csv::Writer::from_writer(Vec::new());
        write_rows(&mut wtr, rows.as_array().unwrap());
        let text = String::from_utf8(wtr.into_inner().unwrap()).unwrap();
        // serde_json maps iterate in key order
        assert_eq!(text, "ending_balance,month_index\n299728.80,1\n299456.14,2\n");
    }
}
