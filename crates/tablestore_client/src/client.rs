//! Table service client traits.

use crate::credentials::Credentials;
use crate::error::ClientResult;
use async_trait::async_trait;
use tablestore_codec::NativeEntity;

/// One operation inside an entity group transaction.
#[derive(Debug, Clone, PartialEq)]
pub enum BatchOperation {
    /// Insert the entity, or merge its columns into the existing row.
    UpsertMerge(NativeEntity),
    /// Delete a row.
    Delete {
        /// The partition key.
        partition_key: String,
        /// The row key.
        row_key: String,
    },
}

impl BatchOperation {
    /// Creates a delete operation.
    pub fn delete(partition_key: impl Into<String>, row_key: impl Into<String>) -> Self {
        Self::Delete {
            partition_key: partition_key.into(),
            row_key: row_key.into(),
        }
    }

    /// Returns the partition key the operation targets.
    pub fn partition_key(&self) -> &str {
        match self {
            BatchOperation::UpsertMerge(entity) => &entity.partition_key,
            BatchOperation::Delete { partition_key, .. } => partition_key,
        }
    }

    /// Returns the row key the operation targets.
    pub fn row_key(&self) -> &str {
        match self {
            BatchOperation::UpsertMerge(entity) => &entity.row_key,
            BatchOperation::Delete { row_key, .. } => row_key,
        }
    }
}

/// Position to resume a paged query from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContinuationToken {
    /// Partition key of the next entity to return.
    pub next_partition_key: String,
    /// Row key of the next entity to return.
    pub next_row_key: String,
}

/// One page of query results.
#[derive(Debug, Clone, Default)]
pub struct QueryPage {
    /// Entities on this page.
    pub entities: Vec<NativeEntity>,
    /// Token for the next page, `None` on the last page.
    pub continuation: Option<ContinuationToken>,
}

/// Metadata of a table in an account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableDescriptor {
    /// The table name.
    pub name: String,
}

/// A handle to one table in the backing store.
///
/// This is the network boundary: every method is one request (or one page
/// of a query). Implementations must be `Send + Sync` so one handle can be
/// reused by many tasks.
#[async_trait]
pub trait TableClient: Send + Sync {
    /// Returns the name of the table this client targets.
    fn table_name(&self) -> &str;

    /// Creates the table if it does not exist yet.
    ///
    /// Concurrent creation of a table that does not exist yet can fail with
    /// a conflict on all but one caller.
    async fn create_if_not_exists(&self) -> ClientResult<()>;

    /// Inserts the entity or merges its columns into the existing row.
    async fn upsert_merge(&self, entity: NativeEntity) -> ClientResult<()>;

    /// Deletes a row.
    async fn delete_entity(&self, partition_key: &str, row_key: &str) -> ClientResult<()>;

    /// Submits an atomic batch of operations on a single partition.
    async fn submit_batch(&self, operations: Vec<BatchOperation>) -> ClientResult<()>;

    /// Fetches one page of entities matching an OData filter.
    ///
    /// `filter = None` returns every entity in the table.
    async fn query_page(
        &self,
        filter: Option<&str>,
        continuation: Option<&ContinuationToken>,
    ) -> ClientResult<QueryPage>;
}

/// Account-level entry point of the backing store.
#[async_trait]
pub trait TableService: Send + Sync {
    /// The per-table client type.
    type Client: TableClient + 'static;

    /// Connects to a table with the given credentials.
    ///
    /// This does not create the table.
    fn table_client(&self, credentials: &Credentials, table_name: &str)
        -> ClientResult<Self::Client>;

    /// Lists the tables in the account.
    async fn list_tables(&self, credentials: &Credentials) -> ClientResult<Vec<TableDescriptor>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn batch_operation_keys() {
        let upsert = BatchOperation::UpsertMerge(NativeEntity::new("p", "r1"));
        let delete = BatchOperation::delete("p", "r2");

        assert_eq!(upsert.partition_key(), "p");
        assert_eq!(upsert.row_key(), "r1");
        assert_eq!(delete.partition_key(), "p");
        assert_eq!(delete.row_key(), "r2");
    }
}
