//! Validate command implementation.

use super::OutputFormat;
use serde::Serialize;
use tablestore_core::keys;

/// Validation outcome for one key.
#[derive(Debug, Serialize)]
pub struct KeyReport {
    /// The key checked.
    pub key: String,
    /// The first rule it violates, if any.
    pub failure: Option<String>,
}

/// Validates each key.
pub fn check(keys: &[String]) -> Vec<KeyReport> {
    keys.iter()
        .map(|key| KeyReport {
            key: key.clone(),
            failure: keys::validate(Some(key)).map(|f| f.to_string()),
        })
        .collect()
}

/// Runs the validate command.
pub fn run(keys: &[String], format: OutputFormat) -> Result<(), Box<dyn std::error::Error>> {
    let reports = check(keys);

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&reports)?),
        OutputFormat::Text => {
            for report in &reports {
                match &report.failure {
                    None => println!("✓ {:?}", report.key),
                    Some(failure) => println!("✗ {:?}: {failure}", report.key),
                }
            }
        }
    }

    let invalid = reports.iter().filter(|r| r.failure.is_some()).count();
    if invalid == 0 {
        Ok(())
    } else {
        Err(format!("{invalid} of {} key(s) invalid", reports.len()).into())
    }
}
