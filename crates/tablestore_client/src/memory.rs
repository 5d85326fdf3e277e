//! In-memory table service for testing.

use crate::client::{
    BatchOperation, ContinuationToken, QueryPage, TableClient, TableDescriptor, TableService,
};
use crate::credentials::Credentials;
use crate::error::{ClientError, ClientResult};
use crate::filter::{parse_filter, KeyFilter};
use async_trait::async_trait;
use parking_lot::{Mutex, RwLock};
use std::collections::{BTreeMap, HashSet};
use std::ops::Bound;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tablestore_codec::{NativeEntity, PropertyMap};
use tracing::debug;

/// Maximum number of operations in one entity group transaction.
pub const MAX_BATCH_OPERATIONS: usize = 100;

/// Maximum number of entities the store returns per query page.
pub const DEFAULT_PAGE_SIZE: usize = 1000;

/// Configuration for the in-memory store.
#[derive(Debug, Clone)]
pub struct InMemoryConfig {
    /// Entities returned per query page.
    pub page_size: usize,
    /// Operations accepted per batch.
    pub max_batch_size: usize,
}

impl Default for InMemoryConfig {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
            max_batch_size: MAX_BATCH_OPERATIONS,
        }
    }
}

impl InMemoryConfig {
    /// Creates a configuration with the store's default limits.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the page size.
    #[must_use]
    pub const fn page_size(mut self, size: usize) -> Self {
        self.page_size = size;
        self
    }

    /// Sets the batch capacity.
    #[must_use]
    pub const fn max_batch_size(mut self, size: usize) -> Self {
        self.max_batch_size = size;
        self
    }
}

/// A request received by an [`InMemoryTableClient`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordedCall {
    /// `create_if_not_exists`
    CreateIfNotExists,
    /// `upsert_merge`
    UpsertMerge {
        /// Partition key of the entity.
        partition_key: String,
        /// Row key of the entity.
        row_key: String,
    },
    /// `delete_entity`
    Delete {
        /// Partition key of the row.
        partition_key: String,
        /// Row key of the row.
        row_key: String,
    },
    /// `submit_batch`
    Batch {
        /// Partition key of the first operation.
        partition_key: String,
        /// Number of operations.
        operations: usize,
    },
    /// `query_page`
    QueryPage {
        /// The filter, if any.
        filter: Option<String>,
    },
}

/// Which request an injected fault applies to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FaultTarget {
    /// The next `create_if_not_exists`.
    CreateIfNotExists,
    /// The next `upsert_merge`.
    UpsertMerge,
    /// The next `delete_entity`.
    Delete,
    /// The next batch, optionally only for one partition.
    Batch {
        /// Restrict the fault to this partition.
        partition_key: Option<String>,
    },
    /// The next `query_page`.
    QueryPage,
}

impl FaultTarget {
    fn applies_to_batch(&self, partition: &str) -> bool {
        match self {
            FaultTarget::Batch { partition_key } => {
                partition_key.as_deref().map_or(true, |pk| pk == partition)
            }
            _ => false,
        }
    }
}

type RowKey = (String, String);

#[derive(Debug, Default)]
struct TableState {
    exists: AtomicBool,
    rows: RwLock<BTreeMap<RowKey, PropertyMap>>,
    faults: Mutex<Vec<(FaultTarget, ClientError)>>,
    calls: Mutex<Vec<RecordedCall>>,
}

/// An in-memory table.
///
/// Clones share the same table. Merge, batch atomicity, the batch capacity,
/// paging and key filters behave like the real store. Tests can inject
/// one-shot faults and inspect every request received.
///
/// # Example
///
/// ```rust
/// use tablestore_client::{InMemoryTableClient, TableClient};
/// use tablestore_codec::NativeEntity;
///
/// # tokio_test_block(async {
/// let client = InMemoryTableClient::new("vehicles");
/// client.create_if_not_exists().await.unwrap();
/// client.upsert_merge(NativeEntity::new("Westview", "ABC123")).await.unwrap();
/// assert_eq!(client.row_count(), 1);
/// # });
/// # fn tokio_test_block<F: std::future::Future>(f: F) -> F::Output {
/// #     tokio::runtime::Runtime::new().unwrap().block_on(f)
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct InMemoryTableClient {
    table_name: String,
    config: InMemoryConfig,
    state: Arc<TableState>,
}

impl InMemoryTableClient {
    /// Creates a client for a table that does not exist yet.
    pub fn new(table_name: impl Into<String>) -> Self {
        Self::with_config(table_name, InMemoryConfig::default())
    }

    /// Creates a client with custom limits.
    pub fn with_config(table_name: impl Into<String>, config: InMemoryConfig) -> Self {
        Self {
            table_name: table_name.into(),
            config,
            state: Arc::new(TableState::default()),
        }
    }

    /// Returns true once the table has been created.
    pub fn exists(&self) -> bool {
        self.state.exists.load(Ordering::SeqCst)
    }

    /// Returns the number of stored rows.
    pub fn row_count(&self) -> usize {
        self.state.rows.read().len()
    }

    /// Returns a stored row, bypassing request recording.
    pub fn get(&self, partition_key: &str, row_key: &str) -> Option<NativeEntity> {
        self.state
            .rows
            .read()
            .get(&(partition_key.to_string(), row_key.to_string()))
            .map(|props| NativeEntity::with_properties(partition_key, row_key, props.clone()))
    }

    /// Stores a row as-is, bypassing recording and faults.
    ///
    /// Creates the table if needed. Useful for seeding data that the typed
    /// layer would never write, such as corrupt columns.
    pub fn seed(&self, entity: NativeEntity) {
        self.state.exists.store(true, Ordering::SeqCst);
        self.state.rows.write().insert(
            (entity.partition_key, entity.row_key),
            entity.properties,
        );
    }

    /// Makes the next matching request fail with `error`.
    pub fn inject_fault(&self, target: FaultTarget, error: ClientError) {
        self.state.faults.lock().push((target, error));
    }

    /// Returns every request received so far.
    pub fn calls(&self) -> Vec<RecordedCall> {
        self.state.calls.lock().clone()
    }

    /// Returns `(partition_key, operation_count)` for each batch received.
    pub fn batch_calls(&self) -> Vec<(String, usize)> {
        self.state
            .calls
            .lock()
            .iter()
            .filter_map(|call| match call {
                RecordedCall::Batch {
                    partition_key,
                    operations,
                } => Some((partition_key.clone(), *operations)),
                _ => None,
            })
            .collect()
    }

    /// Returns the number of query pages fetched so far.
    pub fn page_fetches(&self) -> usize {
        self.state
            .calls
            .lock()
            .iter()
            .filter(|call| matches!(call, RecordedCall::QueryPage { .. }))
            .count()
    }

    /// Forgets recorded requests.
    pub fn clear_calls(&self) {
        self.state.calls.lock().clear();
    }

    fn record(&self, call: RecordedCall) {
        self.state.calls.lock().push(call);
    }

    fn take_fault(&self, applies: impl Fn(&FaultTarget) -> bool) -> ClientResult<()> {
        let mut faults = self.state.faults.lock();
        match faults.iter().position(|(target, _)| applies(target)) {
            Some(index) => Err(faults.remove(index).1),
            None => Ok(()),
        }
    }

    fn ensure_exists(&self) -> ClientResult<()> {
        if self.exists() {
            Ok(())
        } else {
            Err(ClientError::not_found("TableNotFound"))
        }
    }

    fn validate_batch(&self, partition: &str, operations: &[BatchOperation]) -> ClientResult<()> {
        if operations.is_empty() {
            return Err(ClientError::bad_request(
                "InvalidInput: batch contains no operations",
            ));
        }
        if operations.len() > self.config.max_batch_size {
            return Err(ClientError::bad_request(format!(
                "InvalidInput: batch of {} operations exceeds the limit of {}",
                operations.len(),
                self.config.max_batch_size
            )));
        }
        if operations.iter().any(|op| op.partition_key() != partition) {
            return Err(ClientError::bad_request(
                "CommandsInBatchActOnDifferentPartitions",
            ));
        }
        let mut seen = HashSet::new();
        if !operations.iter().all(|op| seen.insert(op.row_key())) {
            return Err(ClientError::bad_request("InvalidDuplicateRow"));
        }
        Ok(())
    }
}

#[async_trait]
impl TableClient for InMemoryTableClient {
    fn table_name(&self) -> &str {
        &self.table_name
    }

    async fn create_if_not_exists(&self) -> ClientResult<()> {
        self.record(RecordedCall::CreateIfNotExists);
        self.take_fault(|t| *t == FaultTarget::CreateIfNotExists)?;
        if !self.state.exists.swap(true, Ordering::SeqCst) {
            debug!(table = %self.table_name, "created in-memory table");
        }
        Ok(())
    }

    async fn upsert_merge(&self, entity: NativeEntity) -> ClientResult<()> {
        self.record(RecordedCall::UpsertMerge {
            partition_key: entity.partition_key.clone(),
            row_key: entity.row_key.clone(),
        });
        self.take_fault(|t| *t == FaultTarget::UpsertMerge)?;
        self.ensure_exists()?;

        self.state
            .rows
            .write()
            .entry((entity.partition_key, entity.row_key))
            .or_default()
            .extend(entity.properties);
        Ok(())
    }

    async fn delete_entity(&self, partition_key: &str, row_key: &str) -> ClientResult<()> {
        self.record(RecordedCall::Delete {
            partition_key: partition_key.to_string(),
            row_key: row_key.to_string(),
        });
        self.take_fault(|t| *t == FaultTarget::Delete)?;
        self.ensure_exists()?;

        self.state
            .rows
            .write()
            .remove(&(partition_key.to_string(), row_key.to_string()))
            .map(|_| ())
            .ok_or_else(|| ClientError::not_found("ResourceNotFound"))
    }

    async fn submit_batch(&self, operations: Vec<BatchOperation>) -> ClientResult<()> {
        let partition = operations
            .first()
            .map(|op| op.partition_key().to_string())
            .unwrap_or_default();
        self.record(RecordedCall::Batch {
            partition_key: partition.clone(),
            operations: operations.len(),
        });
        self.take_fault(|t| t.applies_to_batch(&partition))?;
        self.ensure_exists()?;
        self.validate_batch(&partition, &operations)?;

        let count = operations.len();
        let mut rows = self.state.rows.write();
        // All or nothing: apply to a copy, publish on success.
        let mut staged = rows.clone();
        for op in operations {
            match op {
                BatchOperation::UpsertMerge(entity) => {
                    staged
                        .entry((entity.partition_key, entity.row_key))
                        .or_default()
                        .extend(entity.properties);
                }
                BatchOperation::Delete {
                    partition_key,
                    row_key,
                } => {
                    if staged.remove(&(partition_key, row_key)).is_none() {
                        return Err(ClientError::not_found("ResourceNotFound"));
                    }
                }
            }
        }
        *rows = staged;

        debug!(table = %self.table_name, partition = %partition, count, "applied batch");
        Ok(())
    }

    async fn query_page(
        &self,
        filter: Option<&str>,
        continuation: Option<&ContinuationToken>,
    ) -> ClientResult<QueryPage> {
        self.record(RecordedCall::QueryPage {
            filter: filter.map(str::to_string),
        });
        self.take_fault(|t| *t == FaultTarget::QueryPage)?;
        self.ensure_exists()?;

        let filter = match filter {
            Some(text) => parse_filter(text).map_err(ClientError::bad_request)?,
            None => KeyFilter::default(),
        };
        let lower = match continuation {
            Some(token) => Bound::Included((
                token.next_partition_key.clone(),
                token.next_row_key.clone(),
            )),
            None => Bound::Unbounded,
        };

        let rows = self.state.rows.read();
        let mut matching = rows
            .range((lower, Bound::Unbounded))
            .filter(|((pk, rk), _)| filter.matches(pk, rk));

        let entities = matching
            .by_ref()
            .take(self.config.page_size.max(1))
            .map(|((pk, rk), props)| NativeEntity::with_properties(pk, rk, props.clone()))
            .collect();
        let continuation = matching.next().map(|((pk, rk), _)| ContinuationToken {
            next_partition_key: pk.clone(),
            next_row_key: rk.clone(),
        });

        Ok(QueryPage {
            entities,
            continuation,
        })
    }
}

/// An in-memory account holding any number of tables.
///
/// Clones share the same account.
#[derive(Debug, Clone, Default)]
pub struct InMemoryTableService {
    config: InMemoryConfig,
    tables: Arc<RwLock<BTreeMap<String, InMemoryTableClient>>>,
}

impl InMemoryTableService {
    /// Creates an empty account.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty account whose tables use `config`.
    #[must_use]
    pub fn with_config(config: InMemoryConfig) -> Self {
        Self {
            config,
            tables: Arc::default(),
        }
    }

    /// Returns the client for a table previously connected to.
    pub fn table(&self, table_name: &str) -> Option<InMemoryTableClient> {
        self.tables.read().get(table_name).cloned()
    }
}

#[async_trait]
impl TableService for InMemoryTableService {
    type Client = InMemoryTableClient;

    fn table_client(
        &self,
        credentials: &Credentials,
        table_name: &str,
    ) -> ClientResult<InMemoryTableClient> {
        credentials.validate()?;
        if table_name.trim().is_empty() {
            return Err(ClientError::bad_request("InvalidResourceName"));
        }
        let mut tables = self.tables.write();
        let client = tables
            .entry(table_name.to_string())
            .or_insert_with(|| InMemoryTableClient::with_config(table_name, self.config.clone()));
        Ok(client.clone())
    }

    async fn list_tables(&self, credentials: &Credentials) -> ClientResult<Vec<TableDescriptor>> {
        credentials.validate()?;
        Ok(self
            .tables
            .read()
            .values()
            .filter(|table| table.exists())
            .map(|table| TableDescriptor {
                name: table.table_name.clone(),
            })
            .collect())
    }
}
