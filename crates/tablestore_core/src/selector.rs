//! Key derivation from records.

use std::fmt;

/// Derives one key from a record.
///
/// Any `Fn(&T) -> String + Send + Sync` is a selector.
pub trait KeySelector<T>: Send + Sync {
    /// Returns the key for `record`.
    fn select(&self, record: &T) -> String;
}

impl<T, F> KeySelector<T> for F
where
    F: Fn(&T) -> String + Send + Sync,
{
    fn select(&self, record: &T) -> String {
        self(record)
    }
}

/// A partition key selector paired with a row key selector.
pub struct KeySelectors<T> {
    partition: Box<dyn KeySelector<T>>,
    row: Box<dyn KeySelector<T>>,
}

impl<T> KeySelectors<T> {
    /// Pairs the two selectors.
    pub fn new(
        partition: impl KeySelector<T> + 'static,
        row: impl KeySelector<T> + 'static,
    ) -> Self {
        Self {
            partition: Box::new(partition),
            row: Box::new(row),
        }
    }

    /// Returns the partition key for `record`.
    pub fn partition_key(&self, record: &T) -> String {
        self.partition.select(record)
    }

    /// Returns the row key for `record`.
    pub fn row_key(&self, record: &T) -> String {
        self.row.select(record)
    }

    /// Returns `(partition_key, row_key)` for `record`.
    pub fn keys(&self, record: &T) -> (String, String) {
        (self.partition_key(record), self.row_key(record))
    }
}

impl<T> fmt::Debug for KeySelectors<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeySelectors").finish_non_exhaustive()
    }
}
