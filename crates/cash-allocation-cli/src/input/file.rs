use serde::de::DeserializeOwned;
use std::fs;
use std::path::{Path, PathBuf};

/// Read an input file and deserialise it, choosing YAML or JSON by extension.
pub fn read_input<T: DeserializeOwned>(path: &str) -> Result<T, Box<dyn std::error::Error>> {
    let canonical = resolve_path(path)?;
    let contents = fs::read_to_string(&canonical)
        .map_err(|e| format!("Failed to read '{}': {}", canonical.display(), e))?;

    let is_yaml = matches!(
        canonical.extension().and_then(|ext| ext.to_str()),
        Some("yaml") | Some("yml")
    );

    let value: T = if is_yaml {
        serde_yaml::from_str(&contents)
            .map_err(|e| format!("Failed to parse '{}': {}", canonical.display(), e))?
    } else {
        serde_json::from_str(&contents)
            .map_err(|e| format!("Failed to parse '{}': {}", canonical.display(), e))?
    };
    Ok(value)
}

/// Resolve and validate the path.
fn resolve_path(path: &str) -> Result<PathBuf, Box<dyn std::error::Error>> {
    let p = Path::new(path);
    let canonical = if p.is_absolute() {
        p.to_path_buf()
    } else {
        std::env::current_dir()?.join(p)
    };

    if !canonical.exists() {
        return Err(format!("File not found: {}", canonical.display()).into());
    }

    if !canonical.is_file() {
        return Err(format!("Not a file: {}", canonical.display()).into());
    }

    Ok(canonical)
}

#[cfg(test)]
mod tests {
    use super::*;
    use cash_allocation_core::allocation::CashAllocationInput;

    fn write_temp(name: &str, contents: &str) -> PathBuf {
        let path = std::env::temp_dir().join(format!("cashalloc-{}-{}", std::process::id(), name));
        fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn test_reads_json() {
        let path = write_temp(
            "input.json",
            r#"{"cash": "200", "current_values": ["500", "300", "200"], "target_pcts": ["0.4", "0.4", "0.2"]}"#,
        );
        let input: CashAllocationInput = read_input(path.to_str().unwrap()).unwrap();
        assert_eq!(input.current_values.len(), 3);
        let _ = fs::remove_file(path);
    }

    #[test]
    fn test_reads_yaml() {
        let path = write_temp(
            "input.yaml",
            "cash: \"200\"\ncurrent_values: [\"500\", \"300\", \"200\"]\ntarget_pcts: [\"0.4\", \"0.4\", \"0.2\"]\nskip_equal_error: true\n",
        );
        let input: CashAllocationInput = read_input(path.to_str().unwrap()).unwrap();
        assert!(input.skip_equal_error);
        let _ = fs::remove_file(path);
    }

    #[test]
    fn test_missing_file() {
        let result: Result<CashAllocationInput, _> = read_input("/nonexistent/allocation.json");
        assert!(result.is_err());
    }
}
