use serde_json::Value;

use super::{cell, result_rows};

/// Print one line per investment: name, rank-method amount, equal-error amount.
pub fn print_minimal(value: &Value) {
    match result_rows(value) {
        Some(rows) => {
            for row in rows {
                println!("{}", minimal_line(row));
            }
        }
        None => println!("{}", cell(Some(value))),
    }
}

fn minimal_line(row: &Value) -> String {
    let name = match row.get("label").and_then(|l| l.as_str()) {
        Some(label) => label.to_string(),
        None => format!("#{}", cell(row.get("index"))),
    };
    let m1 = cell(row.get("allocation_m1"));
    match row.get("allocation_m2") {
        Some(Value::Null) | None => format!("{name} {m1}"),
        m2 => format!("{name} {m1} {}", cell(m2)),
    }
}
