//! Store configuration.

use crate::error::{CoreError, CoreResult};
use tablestore_client::Credentials;

/// Configuration for connecting a store to one table.
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// Name of the table.
    pub table_name: String,

    /// How to authenticate against the account.
    pub credentials: Credentials,

    /// Whether to create the table while connecting.
    pub create_if_not_exists: bool,

    /// Substitute for reserved characters when sanitizing keys.
    pub invalid_key_char_replacement: String,
}

impl StoreConfig {
    /// Creates a configuration with explicit credentials.
    pub fn new(table_name: impl Into<String>, credentials: Credentials) -> Self {
        Self {
            table_name: table_name.into(),
            credentials,
            create_if_not_exists: true,
            invalid_key_char_replacement: String::new(),
        }
    }

    /// Connects with a storage connection string.
    pub fn with_connection_string(
        table_name: impl Into<String>,
        connection_string: impl Into<String>,
    ) -> Self {
        Self::new(table_name, Credentials::connection_string(connection_string))
    }

    /// Connects with a shared access signature for an account.
    pub fn with_sas(
        table_name: impl Into<String>,
        sas_token: impl Into<String>,
        account_name: impl Into<String>,
    ) -> Self {
        Self::new(table_name, Credentials::sas(sas_token, account_name))
    }

    /// Sets whether to create the table while connecting.
    #[must_use]
    pub fn create_if_not_exists(mut self, value: bool) -> Self {
        self.create_if_not_exists = value;
        self
    }

    /// Sets the substitute for reserved key characters.
    #[must_use]
    pub fn invalid_key_char_replacement(mut self, replacement: impl Into<String>) -> Self {
        self.invalid_key_char_replacement = replacement.into();
        self
    }

    /// Checks that the table name and credentials are not blank.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` naming the blank part.
    pub fn validate(&self) -> CoreResult<()> {
        if self.table_name.trim().is_empty() {
            return Err(CoreError::invalid_argument(
                "table_name",
                "table name must not be blank",
            ));
        }
        match &self.credentials {
            Credentials::ConnectionString(value) if value.trim().is_empty() => Err(
                CoreError::invalid_argument("connection_string", "connection string must not be blank"),
            ),
            Credentials::SharedAccessSignature { token, .. } if token.trim().is_empty() => Err(
                CoreError::invalid_argument("sas_token", "SAS token must not be blank"),
            ),
            Credentials::SharedAccessSignature { account_name, .. }
                if account_name.trim().is_empty() =>
            {
                Err(CoreError::invalid_argument(
                    "account_name",
                    "account name must not be blank",
                ))
            }
            _ => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = StoreConfig::with_connection_string("vehicles", "UseDevelopmentStorage=true");
        assert!(config.create_if_not_exists);
        assert_eq!(config.invalid_key_char_replacement, "");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn builder_pattern() {
        let config = StoreConfig::with_sas("vehicles", "sv=2024&sig=abc", "acct")
            .create_if_not_exists(false)
            .invalid_key_char_replacement("_");

        assert!(!config.create_if_not_exists);
        assert_eq!(config.invalid_key_char_replacement, "_");
        assert_eq!(config.credentials.account_name().as_deref(), Some("acct"));
    }

    #[test]
    fn blank_parts_are_rejected() {
        let cases = [
            (StoreConfig::with_connection_string(" ", "cs"), "table_name"),
            (StoreConfig::with_connection_string("t", ""), "connection_string"),
            (StoreConfig::with_sas("t", " ", "acct"), "sas_token"),
            (StoreConfig::with_sas("t", "sig", ""), "account_name"),
        ];
        for (config, expected) in cases {
            match config.validate() {
                Err(CoreError::InvalidArgument { parameter, .. }) => assert_eq!(parameter, expected),
                other => panic!("expected InvalidArgument for {expected}, got {other:?}"),
            }
        }
    }
}
