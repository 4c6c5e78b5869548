pub mod csv_out;
pub mod minimal;
pub mod table;

use crate::OutputFormat;
use serde_json::Value;

/// Column order for the per-investment result table.
pub const ROW_COLUMNS: [&str; 13] = [
    "rank",
    "index",
    "label",
    "target_pct",
    "current_pct",
    "target_value",
    "current_value",
    "deficit",
    "error",
    "allocation_m1",
    "error_m1",
    "allocation_m2",
    "error_m2",
];

/// Dispatch output to the appropriate formatter.
pub fn format_output(format: &OutputFormat, value: &Value) {
    match format {
        OutputFormat::Json => match serde_json::to_string_pretty(value) {
            Ok(s) => println!("{}", s),
            Err(e) => eprintln!("JSON serialization error: {}", e),
        },
        OutputFormat::Table => table::print_table(value),
        OutputFormat::Csv => csv_out::print_csv(value),
        OutputFormat::Minimal => minimal::print_minimal(value),
    }
}

/// The allocation rows inside a result envelope, if present.
pub fn result_rows(value: &Value) -> Option<&Vec<Value>> {
    value.get("result")?.get("rows")?.as_array()
}

/// Render a scalar cell; nulls become empty strings.
pub fn cell(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        Some(Value::Bool(b)) => b.to_string(),
        Some(other) => serde_json::to_string(other).unwrap_or_default(),
    }
}

/// Row cells in `ROW_COLUMNS` order.
pub fn row_cells(row: &Value) -> Vec<String> {
    ROW_COLUMNS.iter().map(|c| cell(row.get(*c))).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_row_cells_order_and_nulls() {
        let row = json!({
            "index": 2,
            "rank": 0,
            "target_pct": "0.2",
            "allocation_m2": null,
        });
        let cells = row_cells(&row);
        assert_eq!(cells[0], "0");
        assert_eq!(cells[1], "2");
        assert_eq!(cells[2], "");
        assert_eq!(cells[3], "0.2");
        assert_eq!(cells[11], "");
    }

    #[test]
    fn test_result_rows_lookup() {
        let envelope = json!({"result": {"rows": [{"index": 0}]}});
        assert_eq!(result_rows(&envelope).map(|r| r.len()), Some(1));
        assert!(result_rows(&json!({"result": {}})).is_none());
    }
}
