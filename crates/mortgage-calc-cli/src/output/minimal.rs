use serde_json::Value;

use super::format_value;

/// The headline answer of each calculator, checked in order.
const PRIORITY_KEYS: [&str; 16] = [
    "monthly_payment",
    "breakeven_month",
    "net_breakeven_month",
    "breakeven_year",
    "cumulative_crossover_year",
    "cheaper_option",
    "recommendation",
    "back_end_ratio_percent",
    "effective_termination_month",
    "total_subsidy",
    "net_cost",
    "best_scenario",
    "interest_saved",
    "scenarios_failed",
    "probability_negative_equity_at_horizon",
    "monthly_savings",
];

/// Print just the key answer from the output.
pub fn print_minimal(value: &Value) {
    let result_obj = value
        .as_object()
        .and_then(|m| m.get("result"))
        .unwrap_or(value);

    match pick(result_obj) {
        Some(line) => println!("{line}"),
        None => println!("{}", format_value(result_obj)),
    }
}

fn pick(result: &Value) -> Option<String> {
    let map = result.as_object()?;

    for key in PRIORITY_KEYS {
        if let Some(val) = map.get(key) {
            if !val.is_null() {
                return Some(format_value(val));
            }
        }
    }

    // Amortization nests its headline figures under "summary"
    if let Some(summary) = map.get("summary") {
        if let Some(line) = pick(summary) {
            return Some(line);
        }
    }

    map.iter()
        .next()
        .map(|(key, val)| format!("{key}: {}", format_value(val)))
}
