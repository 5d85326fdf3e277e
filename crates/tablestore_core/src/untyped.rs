//! Store operations on native entities.

use crate::config::StoreConfig;
use crate::error::{CoreError, CoreResult};
use crate::filter::key_filter;
use crate::keys::{self, is_blank};
use futures::stream::{self, BoxStream, StreamExt, TryStreamExt};
use tablestore_client::{BatchOperation, ContinuationToken, Credentials, TableClient, TableService};
use tablestore_codec::NativeEntity;
use tracing::{debug, info, warn};

/// A lazily paged sequence of entities.
///
/// Pages are fetched one at a time as the previous one is exhausted.
/// Dropping the stream stops paging.
pub type EntityStream<'a> = BoxStream<'a, CoreResult<NativeEntity>>;

/// Where a paged query continues from.
enum PageCursor {
    Start,
    Next(ContinuationToken),
    Done,
}

/// A handle to one table, operating on native entities.
///
/// Every key passed in is sanitized with the configured replacement before
/// it is sent to the store. One long-lived instance per table is intended;
/// the handle is `Send + Sync` whenever its client is.
///
/// # Example
///
/// ```rust
/// use tablestore_client::InMemoryTableService;
/// use tablestore_codec::NativeEntity;
/// use tablestore_core::{StoreConfig, UntypedStore};
///
/// # tokio::runtime::Runtime::new().unwrap().block_on(async {
/// let service = InMemoryTableService::new();
/// let config = StoreConfig::with_connection_string("vehicles", "UseDevelopmentStorage=true");
/// let store = UntypedStore::connect(&service, config).await.unwrap();
///
/// let mut entity = NativeEntity::default();
/// entity.insert("Make", "Volvo");
/// store.store_single(entity, "Westview", "ABC123").await.unwrap();
///
/// let found = store.query_single("Westview", "ABC123").await.unwrap();
/// assert!(found.is_some());
/// # });
/// ```
#[derive(Debug)]
pub struct UntypedStore<C: TableClient> {
    client: C,
    config: StoreConfig,
}

impl<C: TableClient> UntypedStore<C> {
    /// Connects to the configured table.
    ///
    /// If `config.create_if_not_exists` is set, the table is created before
    /// this returns.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` for a blank table name or credential, or the
    /// store's error if connecting or creating the table fails.
    pub async fn connect<S>(service: &S, config: StoreConfig) -> CoreResult<Self>
    where
        S: TableService<Client = C>,
    {
        config.validate()?;
        let client = service.table_client(&config.credentials, &config.table_name)?;
        let store = Self::from_client(client, config);

        if store.config.create_if_not_exists {
            store.create_table_if_not_exists().await?;
        }
        debug!(table = %store.config.table_name, "connected store");
        Ok(store)
    }

    /// Wraps an already connected client without contacting the store.
    pub fn from_client(client: C, config: StoreConfig) -> Self {
        Self { client, config }
    }

    /// Returns the table name.
    pub fn table_name(&self) -> &str {
        &self.config.table_name
    }

    /// Returns the configuration the store was built with.
    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// Returns the underlying client.
    pub fn client(&self) -> &C {
        &self.client
    }

    /// Creates the table if it does not exist.
    ///
    /// # Errors
    ///
    /// A concurrent creation of the same table surfaces as
    /// [`CoreError::Conflict`].
    pub async fn create_table_if_not_exists(&self) -> CoreResult<()> {
        match self.client.create_if_not_exists().await {
            Ok(()) => {
                info!(table = %self.config.table_name, "table ready");
                Ok(())
            }
            Err(e) if e.is_conflict() => {
                warn!(table = %self.config.table_name, reason = %e.reason(), "conflict while creating table");
                Err(CoreError::Conflict {
                    table: self.config.table_name.clone(),
                    reason: e.reason(),
                })
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Returns the entity with the given keys, or `None`.
    ///
    /// # Errors
    ///
    /// Both keys are required; a key that is blank after sanitizing is an
    /// `InvalidArgument`. Use [`query`](Self::query) or
    /// [`retrieve_full_table`](Self::retrieve_full_table) for partial lookups.
    pub async fn query_single(
        &self,
        partition_key: &str,
        row_key: &str,
    ) -> CoreResult<Option<NativeEntity>> {
        let hint = "query_single requires both keys; use query or retrieve_full_table for partial lookups";
        let partition_key = self.required_key("partition_key", partition_key, hint)?;
        let row_key = self.required_key("row_key", row_key, hint)?;

        let filter = key_filter(Some(&partition_key), Some(&row_key));
        let mut results = self.paged(filter);
        results.try_next().await
    }

    /// Returns every entity matching the supplied keys.
    ///
    /// Keys that are `None` or blank after sanitizing are not filtered on.
    ///
    /// # Errors
    ///
    /// At least one key is required; use
    /// [`retrieve_full_table`](Self::retrieve_full_table) to read everything.
    pub fn query(
        &self,
        partition_key: Option<&str>,
        row_key: Option<&str>,
    ) -> CoreResult<EntityStream<'_>> {
        let partition_key = self.optional_key(partition_key);
        let row_key = self.optional_key(row_key);

        let filter = key_filter(partition_key.as_deref(), row_key.as_deref()).ok_or_else(|| {
            CoreError::invalid_argument(
                "partition_key",
                "query requires a partition key or a row key; use retrieve_full_table to read every entity",
            )
        })?;
        debug!(table = %self.config.table_name, %filter, "query");
        Ok(self.paged(Some(filter)))
    }

    /// Returns every entity in the table.
    pub fn retrieve_full_table(&self) -> EntityStream<'_> {
        debug!(table = %self.config.table_name, "full table scan");
        self.paged(None)
    }

    /// Inserts the entity or merges it into the existing row.
    ///
    /// The entity's own keys are replaced by the sanitized `partition_key`
    /// and `row_key`.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` for a key that is blank after sanitizing,
    /// and `StoreOperation` if the store rejects the write.
    pub async fn store_single(
        &self,
        mut entity: NativeEntity,
        partition_key: &str,
        row_key: &str,
    ) -> CoreResult<()> {
        let hint = "store_single requires both keys";
        let partition_key = self.required_key("partition_key", partition_key, hint)?;
        let row_key = self.required_key("row_key", row_key, hint)?;

        entity.partition_key.clone_from(&partition_key);
        entity.row_key.clone_from(&row_key);

        debug!(table = %self.config.table_name, %partition_key, %row_key, "store_single");
        self.client.upsert_merge(entity).await.map_err(|e| {
            CoreError::store_operation("store_single", &partition_key, Some(&row_key), &e)
        })
    }

    /// Upserts entities sharing one partition in a single atomic batch.
    ///
    /// Every entity gets the sanitized `partition_key`; each entity's own row
    /// key is sanitized independently. An empty list is a no-op.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` for a key that is blank after sanitizing,
    /// and `StoreOperation` (naming the partition only) if the store rejects
    /// the batch.
    pub async fn store_multiple_in_partition(
        &self,
        entities: Vec<NativeEntity>,
        partition_key: &str,
    ) -> CoreResult<()> {
        if entities.is_empty() {
            return Ok(());
        }
        let hint = "store_multiple_in_partition requires a partition key and a row key per entity";
        let partition_key = self.required_key("partition_key", partition_key, hint)?;

        let operations = entities
            .into_iter()
            .map(|mut entity| {
                entity.row_key = self.required_key("row_key", &entity.row_key, hint)?;
                entity.partition_key.clone_from(&partition_key);
                Ok(BatchOperation::UpsertMerge(entity))
            })
            .collect::<CoreResult<Vec<_>>>()?;

        self.submit("store_multiple_in_partition", &partition_key, operations)
            .await
    }

    /// Deletes one row.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` for a key that is blank after sanitizing,
    /// and `StoreOperation` if the store rejects the delete.
    pub async fn delete_single(&self, partition_key: &str, row_key: &str) -> CoreResult<()> {
        let hint = "delete_single requires both keys";
        let partition_key = self.required_key("partition_key", partition_key, hint)?;
        let row_key = self.required_key("row_key", row_key, hint)?;

        debug!(table = %self.config.table_name, %partition_key, %row_key, "delete_single");
        self.client
            .delete_entity(&partition_key, &row_key)
            .await
            .map_err(|e| {
                CoreError::store_operation("delete_single", &partition_key, Some(&row_key), &e)
            })
    }

    /// Deletes rows sharing one partition in a single atomic batch.
    ///
    /// An empty list is a no-op.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` if any key is blank after sanitizing, and
    /// `StoreOperation` if the store rejects the batch.
    pub async fn delete_multiple_in_partition<S: AsRef<str>>(
        &self,
        partition_key: &str,
        row_keys: &[S],
    ) -> CoreResult<()> {
        if row_keys.is_empty() {
            return Ok(());
        }
        let hint = "delete_multiple_in_partition requires a partition key and non-blank row keys";
        let partition_key = self.required_key("partition_key", partition_key, hint)?;

        let operations = row_keys
            .iter()
            .map(|row_key| {
                let row_key = self.required_key("row_keys", row_key.as_ref(), hint)?;
                Ok(BatchOperation::delete(partition_key.clone(), row_key))
            })
            .collect::<CoreResult<Vec<_>>>()?;

        self.submit("delete_multiple_in_partition", &partition_key, operations)
            .await
    }

    async fn submit(
        &self,
        operation: &str,
        partition_key: &str,
        operations: Vec<BatchOperation>,
    ) -> CoreResult<()> {
        let count = operations.len();
        debug!(table = %self.config.table_name, %partition_key, count, "{operation}");
        self.client
            .submit_batch(operations)
            .await
            .map_err(|e| CoreError::store_operation(operation, partition_key, None, &e))
    }

    fn paged(&self, filter: Option<String>) -> EntityStream<'_> {
        let client = &self.client;
        stream::try_unfold(PageCursor::Start, move |cursor| {
            fetch_page(client, filter.clone(), cursor)
        })
        .map_ok(|entities| stream::iter(entities.into_iter().map(Ok::<_, CoreError>)))
        .try_flatten()
        .boxed()
    }

    /// Checks that both keys are non-blank once sanitized.
    pub(crate) fn check_keys(
        &self,
        operation: &str,
        partition_key: &str,
        row_key: &str,
    ) -> CoreResult<()> {
        let hint = format!("{operation} requires a partition key and a row key for every record");
        self.required_key("partition_key", partition_key, &hint)?;
        self.required_key("row_key", row_key, &hint)?;
        Ok(())
    }

    fn sanitize(&self, raw: &str) -> String {
        keys::sanitize(Some(raw), &self.config.invalid_key_char_replacement)
    }

    fn optional_key(&self, raw: Option<&str>) -> Option<String> {
        raw.map(|raw| self.sanitize(raw)).filter(|key| !is_blank(key))
    }

    fn required_key(&self, parameter: &str, raw: &str, hint: &str) -> CoreResult<String> {
        let key = self.sanitize(raw);
        if is_blank(&key) {
            return Err(CoreError::invalid_argument(
                parameter,
                format!("key is blank after sanitizing; {hint}"),
            ));
        }
        Ok(key)
    }
}

async fn fetch_page<C: TableClient>(
    client: &C,
    filter: Option<String>,
    cursor: PageCursor,
) -> CoreResult<Option<(Vec<NativeEntity>, PageCursor)>> {
    let continuation = match cursor {
        PageCursor::Done => return Ok(None),
        PageCursor::Start => None,
        PageCursor::Next(token) => Some(token),
    };

    let page = client
        .query_page(filter.as_deref(), continuation.as_ref())
        .await?;
    debug!(
        table = %client.table_name(),
        count = page.entities.len(),
        more = page.continuation.is_some(),
        "fetched page"
    );

    let next = page.continuation.map_or(PageCursor::Done, PageCursor::Next);
    Ok(Some((page.entities, next)))
}

/// Lists the names of the account's tables accepted by `predicate`.
///
/// # Errors
///
/// Returns the store's error if listing fails.
pub async fn list_tables<S, P>(
    service: &S,
    credentials: &Credentials,
    predicate: P,
) -> CoreResult<Vec<String>>
where
    S: TableService,
    P: Fn(&str) -> bool,
{
    credentials.validate()?;
    let tables = service.list_tables(credentials).await?;
    Ok(tables
        .into_iter()
        .map(|table| table.name)
        .filter(|name| predicate(name))
        .collect())
}

/// Lists the names of all the account's tables.
///
/// # Errors
///
/// Returns the store's error if listing fails.
pub async fn list_all_tables<S: TableService>(
    service: &S,
    credentials: &Credentials,
) -> CoreResult<Vec<String>> {
    list_tables(service, credentials, |_| true).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use tablestore_codec::EdmValue;
    use tablestore_client::{
        ClientError, FaultTarget, InMemoryConfig, InMemoryTableClient, InMemoryTableService, RecordedCall,
    };

    const DEV: &str = "UseDevelopmentStorage=true";

    async fn store() -> (UntypedStore<InMemoryTableClient>, InMemoryTableClient) {
        store_with(InMemoryConfig::default(), StoreConfig::with_connection_string("t", DEV)).await
    }

    async fn store_with(
        memory: InMemoryConfig,
        config: StoreConfig,
    ) -> (UntypedStore<InMemoryTableClient>, InMemoryTableClient) {
        let service = InMemoryTableService::with_config(memory);
        let store = UntypedStore::connect(&service, config).await.unwrap();
        let client = store.client().clone();
        (store, client)
    }

    fn entity_with(column: &str, value: i32) -> NativeEntity {
        let mut entity = NativeEntity::default();
        entity.insert(column, value);
        entity
    }

    #[tokio::test]
    async fn connect_creates_table() {
        let (_store, client) = store().await;
        assert!(client.exists());
        assert_eq!(client.calls(), vec![RecordedCall::CreateIfNotExists]);
    }

    #[tokio::test]
    async fn connect_without_create() {
        let service = InMemoryTableService::new();
        let config = StoreConfig::with_connection_string("t", DEV).create_if_not_exists(false);
        let store = UntypedStore::connect(&service, config).await.unwrap();
        assert!(!store.client().exists());
        assert!(store.client().calls().is_empty());
    }

    #[tokio::test]
    async fn connect_rejects_blank_table_name() {
        let service = InMemoryTableService::new();
        let err = UntypedStore::connect(&service, StoreConfig::with_connection_string("  ", DEV))
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::InvalidArgument { .. }));
    }

    #[tokio::test]
    async fn creation_conflict_is_surfaced() {
        let client = InMemoryTableClient::new("t");
        client.inject_fault(
            FaultTarget::CreateIfNotExists,
            ClientError::conflict("TableBeingDeleted"),
        );
        let store = UntypedStore::from_client(client, StoreConfig::with_connection_string("t", DEV));
        let err = store.create_table_if_not_exists().await.unwrap_err();
        assert!(matches!(err, CoreError::Conflict { ref table, .. } if table == "t"));
    }

    #[tokio::test]
    async fn create_is_idempotent() {
        let (store, _) = store().await;
        store.create_table_if_not_exists().await.unwrap();
        store.create_table_if_not_exists().await.unwrap();
    }

    #[tokio::test]
    async fn store_single_sanitizes_keys() {
        let (store, client) = store().await;
        store
            .store_single(entity_with("Seats", 5), "West/view", "ABC#123")
            .await
            .unwrap();

        let stored = client.get("Westview", "ABC123").unwrap();
        assert_eq!(stored.get("Seats"), Some(&EdmValue::Int32(5)));
    }

    #[tokio::test]
    async fn store_single_uses_configured_replacement() {
        let (store, client) = store_with(
            InMemoryConfig::default(),
            StoreConfig::with_connection_string("t", DEV).invalid_key_char_replacement("_"),
        )
        .await;
        store
            .store_single(NativeEntity::default(), "a/b", "c?d")
            .await
            .unwrap();
        assert!(client.get("a_b", "c_d").is_some());
    }

    #[tokio::test]
    async fn store_single_merges_columns() {
        let (store, client) = store().await;
        store
            .store_single(entity_with("A", 1), "p", "r")
            .await
            .unwrap();
        store
            .store_single(entity_with("B", 2), "p", "r")
            .await
            .unwrap();

        let stored = client.get("p", "r").unwrap();
        assert!(stored.contains_column("A"));
        assert!(stored.contains_column("B"));
    }

    #[tokio::test]
    async fn store_single_rejects_blank_keys() {
        let (store, client) = store().await;
        client.clear_calls();
        let err = store
            .store_single(NativeEntity::default(), "///", "r")
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::InvalidArgument { ref parameter, .. } if parameter == "partition_key"));
        assert!(client.calls().is_empty());
    }

    #[tokio::test]
    async fn store_single_translates_errors() {
        let (store, client) = store().await;
        client.inject_fault(FaultTarget::UpsertMerge, ClientError::status(503, "ServerBusy"));
        let err = store
            .store_single(NativeEntity::default(), "p", "r")
            .await
            .unwrap_err();
        match err {
            CoreError::StoreOperation {
                operation,
                partition_key,
                row_key,
                status,
                reason,
            } => {
                assert_eq!(operation, "store_single");
                assert_eq!(partition_key, "p");
                assert_eq!(row_key.as_deref(), Some("r"));
                assert_eq!(status, Some(503));
                assert_eq!(reason, "ServerBusy");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn query_single_requires_both_keys() {
        let (store, _) = store().await;
        let err = store.query_single("p", " ").await.unwrap_err();
        assert!(err.to_string().contains("retrieve_full_table"));
    }

    #[tokio::test]
    async fn query_single_missing_is_none() {
        let (store, _) = store().await;
        assert_eq!(store.query_single("p", "r").await.unwrap(), None);
    }

    #[tokio::test]
    async fn query_requires_a_key() {
        let (store, client) = store().await;
        client.clear_calls();
        assert!(matches!(
            store.query(None, None),
            Err(CoreError::InvalidArgument { .. })
        ));
        assert!(store.query(Some("#"), Some("")).is_err());
        assert!(client.calls().is_empty());
    }

    #[tokio::test]
    async fn query_by_partition_and_row() {
        let (store, _) = store().await;
        for (pk, rk) in [("a", "1"), ("a", "2"), ("b", "1")] {
            store
                .store_single(NativeEntity::default(), pk, rk)
                .await
                .unwrap();
        }

        let by_partition: Vec<_> = store.query(Some("a"), None).unwrap().try_collect().await.unwrap();
        assert_eq!(by_partition.len(), 2);

        let by_row: Vec<_> = store.query(None, Some("1")).unwrap().try_collect().await.unwrap();
        assert_eq!(by_row.len(), 2);

        let exact: Vec<_> = store.query(Some("b"), Some("1")).unwrap().try_collect().await.unwrap();
        assert_eq!(exact.len(), 1);
    }

    #[tokio::test]
    async fn query_escapes_quotes() {
        let (store, client) = store().await;
        store
            .store_single(NativeEntity::default(), "O'Brien", "1")
            .await
            .unwrap();
        client.clear_calls();

        let found: Vec<_> = store
            .query(Some("O'Brien"), None)
            .unwrap()
            .try_collect()
            .await
            .unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(
            client.calls(),
            vec![RecordedCall::QueryPage {
                filter: Some("PartitionKey eq 'O''Brien'".into())
            }]
        );
    }

    #[tokio::test]
    async fn pages_are_fetched_lazily() {
        let (store, client) = store_with(
            InMemoryConfig::new().page_size(2),
            StoreConfig::with_connection_string("t", DEV),
        )
        .await;
        for i in 0..5 {
            client.seed(NativeEntity::new("p", format!("r{i}")));
        }
        client.clear_calls();

        let mut stream = store.retrieve_full_table();
        assert_eq!(client.page_fetches(), 0);

        stream.try_next().await.unwrap();
        assert_eq!(client.page_fetches(), 1);
        stream.try_next().await.unwrap();
        assert_eq!(client.page_fetches(), 1);
        stream.try_next().await.unwrap();
        assert_eq!(client.page_fetches(), 2);

        let rest: Vec<_> = stream.try_collect().await.unwrap();
        assert_eq!(rest.len(), 2);
        assert_eq!(client.page_fetches(), 3);
    }

    #[tokio::test]
    async fn page_failure_is_yielded() {
        let (store, client) = store().await;
        client.inject_fault(FaultTarget::QueryPage, ClientError::Transport("reset".into()));
        let result: CoreResult<Vec<_>> = store.retrieve_full_table().try_collect().await;
        assert!(matches!(result, Err(CoreError::Client(_))));
    }

    #[tokio::test]
    async fn store_multiple_in_partition_is_one_batch() {
        let (store, client) = store().await;
        client.clear_calls();
        let entities = vec![
            NativeEntity::new("ignored", "r/1"),
            NativeEntity::new("ignored", "r2"),
        ];
        store
            .store_multiple_in_partition(entities, "p#")
            .await
            .unwrap();

        assert_eq!(client.batch_calls(), vec![("p".to_string(), 2)]);
        assert!(client.get("p", "r1").is_some());
        assert!(client.get("p", "r2").is_some());
    }

    #[tokio::test]
    async fn empty_batches_are_no_ops() {
        let (store, client) = store().await;
        client.clear_calls();
        store.store_multiple_in_partition(Vec::new(), "p").await.unwrap();
        store
            .delete_multiple_in_partition::<&str>("p", &[])
            .await
            .unwrap();
        assert!(client.calls().is_empty());
    }

    #[tokio::test]
    async fn batch_errors_name_partition_only() {
        let (store, client) = store().await;
        client.inject_fault(
            FaultTarget::Batch { partition_key: None },
            ClientError::status(500, "InternalError"),
        );
        let err = store
            .store_multiple_in_partition(vec![NativeEntity::new("", "r")], "p")
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            CoreError::StoreOperation { row_key: None, status: Some(500), .. }
        ));
    }

    #[tokio::test]
    async fn delete_single_and_missing_row() {
        let (store, client) = store().await;
        client.seed(NativeEntity::new("p", "r"));
        store.delete_single("p", "r").await.unwrap();
        assert_eq!(client.row_count(), 0);

        let err = store.delete_single("p", "r").await.unwrap_err();
        assert_eq!(err.status_code(), Some(404));
    }

    #[tokio::test]
    async fn delete_multiple_rejects_blank_row_key() {
        let (store, client) = store().await;
        client.seed(NativeEntity::new("p", "r1"));
        client.clear_calls();

        let err = store
            .delete_multiple_in_partition("p", &["r1", "\t"])
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::InvalidArgument { .. }));
        assert!(client.calls().is_empty());
        assert_eq!(client.row_count(), 1);
    }

    #[tokio::test]
    async fn delete_multiple_in_partition_is_one_batch() {
        let (store, client) = store().await;
        for rk in ["r1", "r2", "r3"] {
            client.seed(NativeEntity::new("p", rk));
        }
        client.clear_calls();

        store
            .delete_multiple_in_partition("p", &["r1", "r3"])
            .await
            .unwrap();
        assert_eq!(client.batch_calls(), vec![("p".to_string(), 2)]);
        assert_eq!(client.row_count(), 1);
    }

    #[tokio::test]
    async fn lists_tables_with_predicate() {
        let service = InMemoryTableService::new();
        for name in ["vehicles", "owners", "vehicles2024"] {
            UntypedStore::connect(&service, StoreConfig::with_connection_string(name, DEV))
                .await
                .unwrap();
        }
        let credentials = Credentials::connection_string(DEV);

        let mut all = list_all_tables(&service, &credentials).await.unwrap();
        all.sort();
        assert_eq!(all, vec!["owners", "vehicles", "vehicles2024"]);

        let vehicles = list_tables(&service, &credentials, |name| name.starts_with("vehicles"))
            .await
            .unwrap();
        assert_eq!(vehicles.len(), 2);
    }
}
