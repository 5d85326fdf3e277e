//! Filter command implementation.

use super::OutputFormat;
use serde_json::json;
use tablestore_core::{filter, keys};

/// Builds the filter a store would send for the given keys.
pub fn build(
    partition_key: Option<&str>,
    row_key: Option<&str>,
    replacement: &str,
) -> Option<String> {
    let sanitize = |raw: &str| keys::sanitize(Some(raw), replacement);
    let partition_key = partition_key.map(sanitize).filter(|k| !k.trim().is_empty());
    let row_key = row_key.map(sanitize).filter(|k| !k.trim().is_empty());
    filter::key_filter(partition_key.as_deref(), row_key.as_deref())
}

/// Runs the filter command.
pub fn run(
    partition_key: Option<&str>,
    row_key: Option<&str>,
    replacement: &str,
    format: OutputFormat,
) -> Result<(), Box<dyn std::error::Error>> {
    let filter = build(partition_key, row_key, replacement)
        .ok_or("A partition key or a row key is required")?;

    match format {
        OutputFormat::Json => println!("{}", json!({ "filter": filter })),
        OutputFormat::Text => println!("{filter}"),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_sanitized_filter() {
        assert_eq!(
            build(Some("West/view"), Some("O'Neil"), "").as_deref(),
            Some("PartitionKey eq 'Westview' and RowKey eq 'O''Neil'")
        );
    }

    #[test]
    fn blank_keys_are_dropped() {
        assert_eq!(build(Some("#"), None, ""), None);
        assert_eq!(
            build(Some("#"), Some("r"), "").as_deref(),
            Some("RowKey eq 'r'")
        );
    }
}
