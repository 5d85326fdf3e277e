//! Endpoint command implementation.

use super::OutputFormat;
use serde_json::json;
use tablestore_client::Credentials;

/// Resolves the account name and table endpoint for a credential.
pub fn resolve(
    connection_string: Option<String>,
    account: Option<String>,
) -> Result<(String, String), Box<dyn std::error::Error>> {
    let credentials = match (connection_string, account) {
        (Some(cs), _) => Credentials::connection_string(cs),
        // The token is irrelevant for endpoint resolution.
        (None, Some(account)) => Credentials::sas("-", account),
        (None, None) => return Err("Either --connection-string or --account is required".into()),
    };
    credentials.validate()?;

    let account = credentials
        .account_name()
        .ok_or("Connection string has no AccountName")?;
    let endpoint = credentials
        .endpoint()
        .ok_or("Connection string has no TableEndpoint or AccountName")?;
    Ok((account, endpoint))
}

/// Runs the endpoint command.
pub fn run(
    connection_string: Option<String>,
    account: Option<String>,
    format: OutputFormat,
) -> Result<(), Box<dyn std::error::Error>> {
    let (account, endpoint) = resolve(connection_string, account)?;
    match format {
        OutputFormat::Json => println!("{}", json!({ "account": account, "endpoint": endpoint })),
        OutputFormat::Text => println!("{account}: {endpoint}"),
    }
    Ok(())
}
