//! OData key filter construction.

use tablestore_codec::{PARTITION_KEY, ROW_KEY};

/// Escapes a value for use inside a single-quoted filter literal.
pub fn escape_filter_value(value: &str) -> String {
    value.replace('\'', "''")
}

/// Builds an equality filter over the supplied keys.
///
/// Supplied keys are AND-combined, partition key first. Returns `None` if
/// neither key is supplied.
///
/// ```
/// use tablestore_core::filter::key_filter;
///
/// assert_eq!(
///     key_filter(Some("Westview"), Some("O'Brien")).as_deref(),
///     Some("PartitionKey eq 'Westview' and RowKey eq 'O''Brien'")
/// );
/// ```
pub fn key_filter(partition_key: Option<&str>, row_key: Option<&str>) -> Option<String> {
    let clauses: Vec<String> = [(PARTITION_KEY, partition_key), (ROW_KEY, row_key)]
        .into_iter()
        .filter_map(|(column, value)| {
            value.map(|v| format!("{column} eq '{}'", escape_filter_value(v)))
        })
        .collect();

    if clauses.is_empty() {
        None
    } else {
        Some(clauses.join(" and "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_key_filters() {
        assert_eq!(
            key_filter(Some("p"), None).as_deref(),
            Some("PartitionKey eq 'p'")
        );
        assert_eq!(key_filter(None, Some("r")).as_deref(), Some("RowKey eq 'r'"));
    }

    #[test]
    fn no_keys_no_filter() {
        assert_eq!(key_filter(None, None), None);
    }

    #[test]
    fn quotes_are_doubled() {
        assert_eq!(escape_filter_value("it's"), "it''s");
        assert_eq!(escape_filter_value("''"), "''''");
        assert_eq!(escape_filter_value("plain"), "plain");
    }
}
