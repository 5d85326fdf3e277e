//! Store operations on typed records.

use crate::batch::{BatchSummary, PartitionBatches, PartitionGroup};
use crate::error::{CoreError, CoreResult};
use crate::keys::is_blank;
use crate::selector::{KeySelector, KeySelectors};
use crate::untyped::{EntityStream, UntypedStore};
use futures::stream::{BoxStream, StreamExt};
use std::fmt;
use std::sync::Arc;
use tablestore_client::TableClient;
use tablestore_codec::{EntityCodec, NativeEntity, TableEntity};

/// A lazily paged sequence of decoded records.
pub type RecordStream<'a, T> = BoxStream<'a, CoreResult<T>>;

/// A handle to one table, operating on records of type `T`.
///
/// All encoding and decoding goes through [`EntityCodec`]; all key handling
/// goes through the wrapped [`UntypedStore`], which may be shared with
/// untyped callers.
///
/// Operations that derive keys from a record need the key selectors given to
/// [`with_selectors`](Self::with_selectors). Without them those operations
/// fail with `InvalidOperation`.
///
/// # Example
///
/// ```rust
/// use tablestore_client::InMemoryTableService;
/// use tablestore_codec::table_entity;
/// use tablestore_core::{StoreConfig, TypedStore, UntypedStore};
///
/// #[derive(Debug, Default, PartialEq)]
/// struct Vehicle {
///     plate_no: String,
///     city: String,
///     seats: i32,
/// }
///
/// table_entity!(Vehicle {
///     native plate_no => "PlateNo",
///     native city => "City",
///     native seats => "Seats",
/// });
///
/// # tokio::runtime::Runtime::new().unwrap().block_on(async {
/// let service = InMemoryTableService::new();
/// let config = StoreConfig::with_connection_string("vehicles", "UseDevelopmentStorage=true");
/// let untyped = UntypedStore::connect(&service, config).await.unwrap();
/// let store = TypedStore::with_selectors(
///     untyped,
///     |v: &Vehicle| v.city.clone(),
///     |v: &Vehicle| v.plate_no.clone(),
/// );
///
/// let car = Vehicle { plate_no: "ABC123".into(), city: "Westview".into(), seats: 5 };
/// store.store(&car).await.unwrap();
///
/// let found = store.query_single("Westview", "ABC123").await.unwrap();
/// assert_eq!(found, Some(car));
/// # });
/// ```
pub struct TypedStore<T, C: TableClient> {
    store: Arc<UntypedStore<C>>,
    selectors: Option<KeySelectors<T>>,
}

impl<T, C> TypedStore<T, C>
where
    T: TableEntity + Send + 'static,
    C: TableClient + 'static,
{
    /// Wraps a store without key selectors.
    pub fn new(store: impl Into<Arc<UntypedStore<C>>>) -> Self {
        Self {
            store: store.into(),
            selectors: None,
        }
    }

    /// Wraps a store with partition and row key selectors.
    pub fn with_selectors(
        store: impl Into<Arc<UntypedStore<C>>>,
        partition_key: impl KeySelector<T> + 'static,
        row_key: impl KeySelector<T> + 'static,
    ) -> Self {
        Self {
            store: store.into(),
            selectors: Some(KeySelectors::new(partition_key, row_key)),
        }
    }

    /// Returns the wrapped untyped store.
    pub fn untyped(&self) -> &Arc<UntypedStore<C>> {
        &self.store
    }

    /// Returns true if key selectors are configured.
    pub fn has_selectors(&self) -> bool {
        self.selectors.is_some()
    }

    /// Returns the record stored under the keys `record` maps to.
    ///
    /// # Errors
    ///
    /// Requires key selectors.
    pub async fn query_single_match(&self, record: &T) -> CoreResult<Option<T>> {
        let (partition_key, row_key) = self.inferred_keys("query_single_match", record)?;
        self.query_single(&partition_key, &row_key).await
    }

    /// Returns the record with the given keys, or `None`.
    ///
    /// # Errors
    ///
    /// Both keys are required.
    pub async fn query_single(&self, partition_key: &str, row_key: &str) -> CoreResult<Option<T>> {
        self.store
            .query_single(partition_key, row_key)
            .await?
            .map(|entity| decode(&entity))
            .transpose()
    }

    /// Returns every record matching the keys `record` maps to.
    ///
    /// # Errors
    ///
    /// Requires key selectors, and fails without contacting the store if
    /// both selectors produce blank keys.
    pub fn query_match(&self, record: &T) -> CoreResult<RecordStream<'_, T>> {
        let (partition_key, row_key) = self.inferred_keys("query_match", record)?;
        if is_blank(&partition_key) && is_blank(&row_key) {
            return Err(CoreError::invalid_argument(
                "match",
                "the key selectors produced a blank partition key and a blank row key; \
                 use retrieve_full_table to read every record",
            ));
        }
        self.query(Some(&partition_key), Some(&row_key))
    }

    /// Returns every record matching the supplied keys.
    ///
    /// # Errors
    ///
    /// At least one key is required.
    pub fn query(
        &self,
        partition_key: Option<&str>,
        row_key: Option<&str>,
    ) -> CoreResult<RecordStream<'_, T>> {
        Ok(decode_stream(self.store.query(partition_key, row_key)?))
    }

    /// Returns every record in the table.
    pub fn retrieve_full_table(&self) -> RecordStream<'_, T> {
        decode_stream(self.store.retrieve_full_table())
    }

    /// Stores a record under the keys its selectors produce.
    ///
    /// # Errors
    ///
    /// Requires key selectors.
    pub async fn store(&self, record: &T) -> CoreResult<()> {
        let (partition_key, row_key) = self.inferred_keys("store", record)?;
        self.store_with_keys(record, &partition_key, &row_key).await
    }

    /// Stores a record under explicit keys, ignoring any selectors.
    pub async fn store_with_keys(
        &self,
        record: &T,
        partition_key: &str,
        row_key: &str,
    ) -> CoreResult<()> {
        let entity = EntityCodec::to_entity(record, partition_key, row_key)?;
        self.store
            .store_single(entity, partition_key, row_key)
            .await
    }

    /// Stores records, one atomic batch per partition.
    ///
    /// Batches are submitted in sequence and the first failure stops the
    /// run; see [`crate::batch`].
    ///
    /// # Errors
    ///
    /// Requires key selectors. Every inferred key is checked before the
    /// first batch is sent, so a blank key fails with `InvalidArgument`
    /// and writes nothing. A failing batch yields
    /// [`CoreError::BatchAborted`].
    pub async fn store_multiple(&self, records: &[T]) -> CoreResult<BatchSummary> {
        let selectors = self.require_selectors("store_multiple")?;

        let mut items = Vec::with_capacity(records.len());
        for record in records {
            let (partition_key, row_key) = selectors.keys(record);
            self.store
                .check_keys("store_multiple", &partition_key, &row_key)?;
            let entity = EntityCodec::to_entity(record, partition_key.as_str(), row_key)?;
            items.push((partition_key, entity));
        }

        let store = &self.store;
        PartitionBatches::group_by_partition(items)
            .run(|group: PartitionGroup<NativeEntity>| async move {
                let PartitionGroup {
                    partition_key,
                    operations,
                } = group;
                store
                    .store_multiple_in_partition(operations, &partition_key)
                    .await
            })
            .await
    }

    /// Deletes the row `record` maps to.
    ///
    /// # Errors
    ///
    /// Requires key selectors.
    pub async fn delete_match(&self, record: &T) -> CoreResult<()> {
        let (partition_key, row_key) = self.inferred_keys("delete_match", record)?;
        self.delete(&partition_key, &row_key).await
    }

    /// Deletes one row.
    pub async fn delete(&self, partition_key: &str, row_key: &str) -> CoreResult<()> {
        self.store.delete_single(partition_key, row_key).await
    }

    /// Deletes the rows `records` map to, one atomic batch per partition.
    ///
    /// # Errors
    ///
    /// Requires key selectors. Every inferred key is checked before the
    /// first batch is sent. A failing batch yields
    /// [`CoreError::BatchAborted`].
    pub async fn delete_multiple(&self, records: &[T]) -> CoreResult<BatchSummary> {
        let selectors = self.require_selectors("delete_multiple")?;
        let items = records
            .iter()
            .map(|record| {
                let (partition_key, row_key) = selectors.keys(record);
                self.store
                    .check_keys("delete_multiple", &partition_key, &row_key)?;
                Ok((partition_key, row_key))
            })
            .collect::<CoreResult<Vec<_>>>()?;

        let store = &self.store;
        PartitionBatches::group_by_partition(items)
            .run(|group: PartitionGroup<String>| async move {
                store
                    .delete_multiple_in_partition(&group.partition_key, group.operations.as_slice())
                    .await
            })
            .await
    }

    /// Deletes rows sharing one partition in a single atomic batch.
    pub async fn delete_multiple_in_partition<S: AsRef<str>>(
        &self,
        partition_key: &str,
        row_keys: &[S],
    ) -> CoreResult<()> {
        self.store
            .delete_multiple_in_partition(partition_key, row_keys)
            .await
    }

    fn require_selectors(&self, operation: &str) -> CoreResult<&KeySelectors<T>> {
        self.selectors.as_ref().ok_or_else(|| {
            CoreError::invalid_operation(format!(
                "{operation} requires partition and row key selectors; \
                 construct the store with TypedStore::with_selectors"
            ))
        })
    }

    fn inferred_keys(&self, operation: &str, record: &T) -> CoreResult<(String, String)> {
        Ok(self.require_selectors(operation)?.keys(record))
    }
}

impl<T, C: TableClient> fmt::Debug for TypedStore<T, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypedStore")
            .field("table", &self.store.table_name())
            .field("selectors", &self.selectors.is_some())
            .finish()
    }
}

fn decode<T: TableEntity>(entity: &NativeEntity) -> CoreResult<T> {
    Ok(EntityCodec::decode(entity)?)
}

fn decode_stream<T>(entities: EntityStream<'_>) -> RecordStream<'_, T>
where
    T: TableEntity + Send + 'static,
{
    entities
        .map(|result| result.and_then(|entity| decode(&entity)))
        .boxed()
}
