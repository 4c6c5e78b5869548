use serde_json::Value;
use std::io::{self, Read};

/// Read a piped allocation document from stdin, JSON first then YAML.
///
/// Returns None when stdin is interactive or the pipe is empty.
pub fn read_stdin() -> Result<Option<Value>, Box<dyn std::error::Error>> {
    if atty::is(atty::Stream::Stdin) {
        return Ok(None);
    }

    let mut buffer = String::new();
    io::stdin().read_to_string(&mut buffer)?;
    parse_document(&buffer)
}

fn parse_document(raw: &str) -> Result<Option<Value>, Box<dyn std::error::Error>> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }

    match serde_json::from_str::<Value>(trimmed) {
        Ok(value) => Ok(Some(value)),
        Err(json_err) => {
            let value: Value = serde_yaml::from_str(trimmed).map_err(|yaml_err| {
                format!("stdin is neither JSON ({json_err}) nor YAML ({yaml_err})")
            })?;
            Ok(Some(value))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_pipe() {
        assert!(parse_document("  \n").unwrap().is_none());
    }

    #[test]
    fn test_json_and_yaml_documents() {
        let json = parse_document(r#"{"cash": "10"}"#).unwrap().unwrap();
        assert_eq!(json["cash"], "10");

        let yaml = parse_document("cash: \"10\"\nskip_equal_error: true\n")
            .unwrap()
            .unwrap();
        assert_eq!(yaml["cash"], "10");
        assert_eq!(yaml["skip_equal_error"], true);
    }
}
