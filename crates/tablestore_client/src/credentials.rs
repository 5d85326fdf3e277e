//! Account credentials.

use crate::error::{ClientError, ClientResult};
use std::fmt;

const DEFAULT_ENDPOINT_SUFFIX: &str = "core.windows.net";
const DEVELOPMENT_ACCOUNT: &str = "devstoreaccount1";
const DEVELOPMENT_TABLE_ENDPOINT: &str = "http://127.0.0.1:10002/devstoreaccount1";

/// Credentials for one storage account.
///
/// The two forms are mutually exclusive: a store handle uses exactly one.
#[derive(Clone, PartialEq, Eq)]
pub enum Credentials {
    /// A full connection string (`AccountName=...;AccountKey=...;...`).
    ConnectionString(String),
    /// A shared access signature token scoped to an account.
    SharedAccessSignature {
        /// The SAS token, with or without a leading `?`.
        token: String,
        /// The storage account name.
        account_name: String,
    },
}

impl Credentials {
    /// Creates connection string credentials.
    pub fn connection_string(value: impl Into<String>) -> Self {
        Self::ConnectionString(value.into())
    }

    /// Creates shared access signature credentials.
    pub fn sas(token: impl Into<String>, account_name: impl Into<String>) -> Self {
        Self::SharedAccessSignature {
            token: token.into(),
            account_name: account_name.into(),
        }
    }

    /// Checks that every credential part is present.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::InvalidCredentials`] naming the blank part.
    pub fn validate(&self) -> ClientResult<()> {
        match self {
            Credentials::ConnectionString(value) if value.trim().is_empty() => Err(
                ClientError::InvalidCredentials("connection string is blank".into()),
            ),
            Credentials::ConnectionString(_) => Ok(()),
            Credentials::SharedAccessSignature { token, .. } if token.trim().is_empty() => {
                Err(ClientError::InvalidCredentials("SAS token is blank".into()))
            }
            Credentials::SharedAccessSignature { account_name, .. }
                if account_name.trim().is_empty() =>
            {
                Err(ClientError::InvalidCredentials("account name is blank".into()))
            }
            Credentials::SharedAccessSignature { .. } => Ok(()),
        }
    }

    /// Returns the storage account name, if it can be determined.
    pub fn account_name(&self) -> Option<String> {
        match self {
            Credentials::ConnectionString(value) => {
                if is_development_storage(value) {
                    return Some(DEVELOPMENT_ACCOUNT.to_string());
                }
                connection_string_part(value, "AccountName").map(str::to_string)
            }
            Credentials::SharedAccessSignature { account_name, .. } => {
                Some(account_name.clone())
            }
        }
    }

    /// Returns the table service endpoint URI.
    ///
    /// For SAS credentials and connection strings without an explicit
    /// `TableEndpoint` this is `https://{account}.table.core.windows.net`.
    pub fn endpoint(&self) -> Option<String> {
        match self {
            Credentials::ConnectionString(value) => {
                if is_development_storage(value) {
                    return Some(DEVELOPMENT_TABLE_ENDPOINT.to_string());
                }
                if let Some(endpoint) = connection_string_part(value, "TableEndpoint") {
                    return Some(endpoint.trim_end_matches('/').to_string());
                }
                let account = connection_string_part(value, "AccountName")?;
                let protocol =
                    connection_string_part(value, "DefaultEndpointsProtocol").unwrap_or("https");
                let suffix = connection_string_part(value, "EndpointSuffix")
                    .unwrap_or(DEFAULT_ENDPOINT_SUFFIX);
                Some(format!("{protocol}://{account}.table.{suffix}"))
            }
            Credentials::SharedAccessSignature { account_name, .. } => Some(format!(
                "https://{account_name}.table.{DEFAULT_ENDPOINT_SUFFIX}"
            )),
        }
    }
}

// Secrets stay out of logs.
impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Credentials::ConnectionString(_) => f
                .debug_struct("ConnectionString")
                .field("account_name", &self.account_name())
                .finish_non_exhaustive(),
            Credentials::SharedAccessSignature { account_name, .. } => f
                .debug_struct("SharedAccessSignature")
                .field("account_name", account_name)
                .finish_non_exhaustive(),
        }
    }
}

fn is_development_storage(value: &str) -> bool {
    connection_string_part(value, "UseDevelopmentStorage")
        .is_some_and(|v| v.eq_ignore_ascii_case("true"))
}

fn connection_string_part<'a>(value: &'a str, name: &str) -> Option<&'a str> {
    value
        .split(';')
        .filter_map(|part| part.split_once('='))
        .find(|(key, _)| key.trim().eq_ignore_ascii_case(name))
        .map(|(_, v)| v.trim())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    const CS: &str = "DefaultEndpointsProtocol=https;AccountName=fleet;AccountKey=c2VjcmV0;EndpointSuffix=core.windows.net";

    #[test]
    fn sas_endpoint() {
        let creds = Credentials::sas("?sv=2022&sig=abc", "fleet");
        assert_eq!(
            creds.endpoint().as_deref(),
            Some("https://fleet.table.core.windows.net")
        );
        assert_eq!(creds.account_name().as_deref(), Some("fleet"));
    }

    #[test]
    fn connection_string_endpoint() {
        let creds = Credentials::connection_string(CS);
        assert_eq!(creds.account_name().as_deref(), Some("fleet"));
        assert_eq!(
            creds.endpoint().as_deref(),
            Some("https://fleet.table.core.windows.net")
        );
    }

    #[test]
    fn explicit_table_endpoint_wins() {
        let creds = Credentials::connection_string(
            "AccountName=fleet;AccountKey=x;TableEndpoint=https://tables.example.com/",
        );
        assert_eq!(creds.endpoint().as_deref(), Some("https://tables.example.com"));
    }

    #[test]
    fn development_storage() {
        let creds = Credentials::connection_string("UseDevelopmentStorage=true");
        assert_eq!(creds.account_name().as_deref(), Some("devstoreaccount1"));
        assert_eq!(
            creds.endpoint().as_deref(),
            Some("http://127.0.0.1:10002/devstoreaccount1")
        );
    }

    #[test]
    fn blank_parts_are_rejected() {
        assert!(Credentials::connection_string("  ").validate().is_err());
        assert!(Credentials::sas("", "fleet").validate().is_err());
        assert!(Credentials::sas("sig", " ").validate().is_err());
        assert!(Credentials::sas("sig", "fleet").validate().is_ok());
        assert!(Credentials::connection_string(CS).validate().is_ok());
    }

    #[test]
    fn debug_hides_secrets() {
        let debug = format!("{:?}", Credentials::connection_string(CS));
        assert!(!debug.contains("c2VjcmV0"));
        let debug = format!("{:?}", Credentials::sas("sig=topsecret", "fleet"));
        assert!(!debug.contains("topsecret"));
    }
}
