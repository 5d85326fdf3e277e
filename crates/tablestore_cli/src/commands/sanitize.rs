//! Sanitize command implementation.

use super::OutputFormat;
use serde::Serialize;
use tablestore_core::keys;
use tracing::debug;

/// Result of sanitizing one key.
#[derive(Debug, Serialize)]
pub struct SanitizeReport {
    /// The text given.
    pub input: String,
    /// The sanitized key.
    pub sanitized: String,
    /// Why the sanitized key still fails validation, if it does.
    pub failure: Option<String>,
}

/// Sanitizes `key` and reports whether the result validates.
pub fn report(key: &str, replacement: &str) -> SanitizeReport {
    let sanitized = keys::sanitize(Some(key), replacement);
    let failure = keys::validate(Some(&sanitized)).map(|f| f.to_string());
    SanitizeReport {
        input: key.to_string(),
        sanitized,
        failure,
    }
}

/// Runs the sanitize command.
pub fn run(
    key: &str,
    replacement: &str,
    format: OutputFormat,
) -> Result<(), Box<dyn std::error::Error>> {
    let report = report(key, replacement);
    debug!(input = %report.input, sanitized = %report.sanitized, "sanitized key");

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
        OutputFormat::Text => {
            println!("{}", report.sanitized);
            if let Some(failure) = &report.failure {
                eprintln!("warning: sanitized key is still invalid: {failure}");
            }
        }
    }
    Ok(())
}
