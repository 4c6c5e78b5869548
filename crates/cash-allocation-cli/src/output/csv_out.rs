use serde_json::Value;
use std::io;

use super::{cell, result_rows, row_cells, ROW_COLUMNS};

/// Write the allocation rows as CSV to stdout.
///
/// Values without a row table fall back to two-column `field,value` output.
pub fn print_csv(value: &Value) {
    let stdout = io::stdout();
    let mut wtr = csv::Writer::from_writer(stdout.lock());

    if let Err(e) = write_csv(&mut wtr, value) {
        eprintln!("CSV write error: {}", e);
    }
    let _ = wtr.flush();
}

fn write_csv<W: io::Write>(wtr: &mut csv::Writer<W>, value: &Value) -> csv::Result<()> {
    if let Some(rows) = result_rows(value) {
        wtr.write_record(ROW_COLUMNS)?;
        for row in rows {
            wtr.write_record(row_cells(row))?;
        }
        return Ok(());
    }

    wtr.write_record(["field", "value"])?;
    if let Value::Object(map) = value {
        for (key, val) in map {
            wtr.write_record([key.clone(), cell(Some(val))])?;
        }
    } else {
        wtr.write_record(["value".to_string(), cell(Some(value))])?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_rows_written_with_header() {
        let envelope = json!({"result": {"rows": [
            {"rank": 0, "index": 1, "allocation_m1": "180", "allocation_m2": "170"},
            {"rank": 1, "index": 0, "allocation_m1": "20", "allocation_m2": null},
        ]}});
        let mut wtr = csv::Writer::from_writer(Vec::new());
        write_csv(&mut wtr, &envelope).unwrap();
        let out = String::from_utf8(wtr.into_inner().unwrap()).unwrap();
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("rank,index,label,"));
        assert!(lines[1].starts_with("0,1,,"));
        assert!(lines[2].ends_with("20,,,"));
    }
}
