use serde_json::Value;
use tabled::{builder::Builder, Table};

use super::{cell, result_rows, row_cells, ROW_COLUMNS};

/// Print the allocation rows, then the summary, warnings and methodology.
pub fn print_table(value: &Value) {
    let Some(rows) = result_rows(value) else {
        print_flat_object(value);
        return;
    };

    let mut builder = Builder::default();
    builder.push_record(ROW_COLUMNS);
    for row in rows {
        builder.push_record(row_cells(row));
    }
    println!("{}", Table::from(builder));

    if let Some(summary) = value.get("result").and_then(|r| r.get("summary")) {
        println!();
        print_flat_object(summary);
    }

    if let Some(Value::Array(warnings)) = value.get("warnings") {
        if !warnings.is_empty() {
            println!("\nWarnings:");
            for w in warnings {
                if let Value::String(s) = w {
                    println!("  - {}", s);
                }
            }
        }
    }

    if let Some(Value::String(meth)) = value.get("methodology") {
        println!("\nMethodology: {}", meth);
    }
}

fn print_flat_object(value: &Value) {
    match value {
        Value::Object(map) => {
            let mut builder = Builder::default();
            builder.push_record(["Field", "Value"]);
            for (key, val) in map {
                builder.push_record([key.clone(), cell(Some(val))]);
            }
            println!("{}", Table::from(builder));
        }
        other => println!("{}", cell(Some(other))),
    }
}
