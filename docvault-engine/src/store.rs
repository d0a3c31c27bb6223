//! The document store facade.
//!
//! [`Store`] composes the engine's parts behind one handle: every mutating
//! call is admitted through the operation queue (when enabled), invalidates
//! the query cache, validates its input, mutates the current map through the
//! transaction manager, keeps the indexes in step, and flushes the committed
//! state through the persistence manager. Reads consult the query cache,
//! then the indexes (equality conjunctions only), then fall back to a full
//! scan through the evaluator.
//!
//! # Example
//!
//! ```ignore
//! use docvault::{Condition, SortOrder, Store};
//! use serde::{Deserialize, Serialize};
//!
//! #[derive(Debug, Clone, Serialize, Deserialize)]
//! struct Person {
//!     name: String,
//!     age: u32,
//! }
//!
//! #[tokio::main]
//! async fn main() -> docvault::StoreResult<()> {
//!     let store = Store::<Person>::builder().build().await?;
//!     store.create_one(Person { name: "milad".into(), age: 30 }).await?;
//!
//!     let adults = store
//!         .get_many(Condition::gte("age", 18))
//!         .sort("name", SortOrder::Asc)
//!         .limit(10)
//!         .await?;
//!     println!("{adults:?}");
//!     Ok(())
//! }
//! ```

use futures::future::BoxFuture;
use serde::{Serialize, de::DeserializeOwned};
use serde_json::Value;
use std::cmp::Ordering;
use std::fmt;
use std::future::IntoFuture;
use std::marker::PhantomData;
use std::path::PathBuf;
use std::sync::Arc;

use mea::rwlock::RwLock;

use docvault_core::{
    backend::StorageBackend,
    document::{self, Document, Id},
    error::{StoreError, StoreResult},
    query::{ALL_DOCUMENTS_KEY, ConditionNode, SortOrder},
    results::{DeleteResult, UpdateManyResult},
};

use crate::{
    cache::{CacheConfig, CacheStats, QueryCache},
    evaluator::{Evaluator, Projections, values_cmp},
    index::IndexManager,
    persistence::{DEFAULT_STORAGE_PATH, FileBackend, PersistenceManager},
    queue::OperationQueue,
    transaction::{DocMap, TransactionManager},
};

/// Bounds a type must satisfy to be stored as a document payload.
///
/// Blanket-implemented; any `Clone + Send + Sync` type that serializes to a
/// JSON object qualifies (the object shape is enforced at create time).
pub trait Payload: Serialize + DeserializeOwned + Clone + Send + Sync + 'static {}

impl<T> Payload for T where T: Serialize + DeserializeOwned + Clone + Send + Sync + 'static {}

/// How many documents `create_many` inserts between persistence flushes.
pub const CREATE_CHUNK_SIZE: usize = 256;

struct Inner<T: Payload> {
    transactions: TransactionManager<T>,
    indexes: RwLock<IndexManager>,
    cache: QueryCache<T>,
    persistence: PersistenceManager,
    queue: OperationQueue,
}

/// An embedded document store for payloads of type `T`.
///
/// The store is a cheap-to-clone handle (`Arc` inner); clones share one
/// document map, index registry, cache, and queue. The map is private to the
/// instance — two stores never share state unless they are clones.
pub struct Store<T: Payload> {
    inner: Arc<Inner<T>>,
}

impl<T: Payload> Clone for Store<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T: Payload> fmt::Debug for Store<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Store")
            .field("persistent", &self.inner.persistence.is_enabled())
            .field("serialized", &self.inner.queue.is_enabled())
            .finish_non_exhaustive()
    }
}

/// Configures and builds a [`Store`].
///
/// `build` performs the initial disk load when persistence is enabled, so a
/// constructed store always reflects its durable snapshot — there is no
/// separate readiness signal to await.
pub struct StoreBuilder<T: Payload> {
    storage_path: PathBuf,
    persist_to_disk: bool,
    serialize_writes: bool,
    cache: CacheConfig,
    backend: Option<Box<dyn StorageBackend>>,
    _payload: PhantomData<fn() -> T>,
}

impl<T: Payload> StoreBuilder<T> {
    fn new() -> Self {
        Self {
            storage_path: PathBuf::from(DEFAULT_STORAGE_PATH),
            persist_to_disk: false,
            serialize_writes: false,
            cache: CacheConfig::default(),
            backend: None,
            _payload: PhantomData,
        }
    }

    /// Sets the snapshot file location (default `data.json`).
    pub fn storage_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.storage_path = path.into();
        self
    }

    /// Enables persistence: every mutation rewrites the snapshot file and
    /// `build` loads whatever the file already holds.
    pub fn persist_to_disk(mut self, enabled: bool) -> Self {
        self.persist_to_disk = enabled;
        self
    }

    /// Enables the FIFO operation queue, serializing all mutating calls.
    pub fn serialize_writes(mut self, enabled: bool) -> Self {
        self.serialize_writes = enabled;
        self
    }

    /// Configures the query cache.
    pub fn cache(mut self, config: CacheConfig) -> Self {
        self.cache = config;
        self
    }

    /// Supplies a custom storage backend instead of the default file backend.
    pub fn backend(mut self, backend: Box<dyn StorageBackend>) -> Self {
        self.backend = Some(backend);
        self
    }

    /// Builds the store, loading the durable snapshot first when persistence
    /// is enabled.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Persistence`] when the snapshot cannot be read
    /// or the placeholder cannot be written.
    pub async fn build(self) -> StoreResult<Store<T>> {
        let backend = self
            .backend
            .unwrap_or_else(|| Box::new(FileBackend::new(self.storage_path)));
        let persistence = PersistenceManager::new(backend, self.persist_to_disk);

        let mut map = DocMap::new();
        for (id, doc) in persistence.load::<T>().await? {
            map.insert(id, doc);
        }
        if persistence.is_enabled() {
            log::debug!("loaded {} documents from the snapshot", map.len());
        }

        Ok(Store {
            inner: Arc::new(Inner {
                transactions: TransactionManager::new(map),
                indexes: RwLock::new(IndexManager::new()),
                cache: QueryCache::new(self.cache),
                persistence,
                queue: OperationQueue::new(self.serialize_writes),
            }),
        })
    }
}

impl<T: Payload> Store<T> {
    /// Starts configuring a store.
    pub fn builder() -> StoreBuilder<T> {
        StoreBuilder::new()
    }

    // ---- create ----------------------------------------------------------

    /// Validates and stores one document, assigning it a fresh id.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Validation`] when the payload does not
    /// serialize to an object with at least one field, and
    /// [`StoreError::Persistence`] when the flush fails.
    pub async fn create_one(&self, payload: T) -> StoreResult<Document<T>> {
        self.inner
            .queue
            .run(|| async move {
                self.inner.cache.invalidate(None).await;
                document::validate_payload(&payload)?;
                let doc = Document::new(Id::generate(), payload);
                self.insert_document(&doc).await?;
                self.flush().await?;
                Ok(doc)
            })
            .await
    }

    /// Validates and stores a batch of documents. Every payload is validated
    /// before the first insert; inserts then proceed in fixed-size chunks
    /// with one persistence flush per chunk.
    pub async fn create_many(&self, payloads: Vec<T>) -> StoreResult<Vec<Document<T>>> {
        self.inner
            .queue
            .run(|| async move {
                self.inner.cache.invalidate(None).await;
                for payload in &payloads {
                    document::validate_payload(payload)?;
                }
                let docs: Vec<Document<T>> = payloads
                    .into_iter()
                    .map(|payload| Document::new(Id::generate(), payload))
                    .collect();
                for chunk in docs.chunks(CREATE_CHUNK_SIZE) {
                    for doc in chunk {
                        self.insert_document(doc).await?;
                    }
                    self.flush().await?;
                }
                Ok(docs)
            })
            .await
    }

    // ---- read ------------------------------------------------------------

    /// Fetches a document by id.
    pub async fn get_by_id(&self, id: &Id) -> StoreResult<Option<Document<T>>> {
        Ok(self
            .inner
            .transactions
            .with_current(|map| map.get(id).cloned())
            .await)
    }

    /// Fetches the first document matching the query, consulting the cache
    /// and the indexes before scanning.
    pub async fn get_one(&self, query: &ConditionNode) -> StoreResult<Option<Document<T>>> {
        query.validate()?;
        let key = query.cache_key();
        if let Some(key) = &key {
            if let Some(cached) = self.inner.cache.get(key).await {
                return Ok(cached.into_iter().next());
            }
        }

        let mut projections = Projections::new();
        let matched = self.fetch_query(Some(query), &mut projections, Some(1)).await?;
        let first = matched.into_iter().next();
        if let (Some(key), Some(doc)) = (&key, &first) {
            self.inner.cache.put(key.clone(), vec![doc.clone()]).await;
        }
        Ok(first)
    }

    /// Returns a lazy query over all documents matching the condition tree.
    /// Chain [`FindMany::sort`], [`FindMany::skip`], and [`FindMany::limit`],
    /// then either call [`FindMany::exec`] or await the builder directly.
    pub fn get_many(&self, query: ConditionNode) -> FindMany<T> {
        FindMany::new(self.clone(), Some(query))
    }

    /// Returns a lazy query over every document.
    pub fn get_all(&self) -> FindMany<T> {
        FindMany::new(self.clone(), None)
    }

    /// Counts the documents matching the query, or all documents when no
    /// query is given.
    pub async fn count_documents(&self, query: Option<&ConditionNode>) -> StoreResult<usize> {
        match query {
            Some(query) => Ok(self.get_many(query.clone()).exec().await?.len()),
            None => Ok(self.inner.transactions.with_current(|map| map.len()).await),
        }
    }

    /// The number of documents in the current view.
    pub async fn len(&self) -> usize {
        self.inner.transactions.with_current(|map| map.len()).await
    }

    /// True when the current view holds no documents.
    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// A snapshot of the current view's documents, in insertion order. This
    /// is the feed for collaborators that work outside the transactional
    /// path, such as the fuzzy search utility.
    pub async fn documents(&self) -> Vec<Document<T>> {
        self.inner
            .transactions
            .with_current(|map| map.values().cloned().collect())
            .await
    }

    // ---- update ----------------------------------------------------------

    /// Merges a patch over the document with the given id. The `id` field of
    /// the patch, if any, is ignored.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] when no document has the id, and
    /// [`StoreError::Validation`] when the patch is not an object with at
    /// least one field.
    pub async fn update_by_id(&self, id: &Id, patch: Value) -> StoreResult<Document<T>> {
        self.inner
            .queue
            .run(|| async move {
                self.inner.cache.invalidate(None).await;
                let patch = document::validate_patch(&patch)?;
                let existing = self
                    .inner
                    .transactions
                    .with_current(|map| map.get(id).cloned())
                    .await
                    .ok_or_else(|| StoreError::NotFound(format!("no document with id {id}")))?;
                let updated = existing.merge(patch)?;
                self.apply_update(&existing, &updated).await?;
                self.flush().await?;
                Ok(updated)
            })
            .await
    }

    /// Merges a patch over the first document matching the query.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] when nothing matches.
    pub async fn update_one(&self, query: &ConditionNode, patch: Value) -> StoreResult<Document<T>> {
        self.inner
            .queue
            .run(|| async move {
                self.inner.cache.invalidate(None).await;
                query.validate()?;
                let patch = document::validate_patch(&patch)?;
                let mut projections = Projections::new();
                let matched = self.fetch_query(Some(query), &mut projections, Some(1)).await?;
                let existing = matched.into_iter().next().ok_or_else(|| {
                    StoreError::NotFound("no document matches the query".to_owned())
                })?;
                let updated = existing.merge(patch)?;
                self.apply_update(&existing, &updated).await?;
                self.flush().await?;
                Ok(updated)
            })
            .await
    }

    /// Merges a patch over every document matching the query, sequentially,
    /// with a single flush at the end. Matching nothing is not an error.
    pub async fn update_many(
        &self,
        query: &ConditionNode,
        patch: Value,
    ) -> StoreResult<UpdateManyResult<T>> {
        self.inner
            .queue
            .run(|| async move {
                self.inner.cache.invalidate(None).await;
                query.validate()?;
                let patch = document::validate_patch(&patch)?;
                let mut projections = Projections::new();
                let matched = self.fetch_query(Some(query), &mut projections, None).await?;
                let mut documents = Vec::with_capacity(matched.len());
                for existing in &matched {
                    let updated = existing.merge(patch)?;
                    self.apply_update(existing, &updated).await?;
                    documents.push(updated);
                }
                self.flush().await?;
                Ok(UpdateManyResult {
                    updated: true,
                    n: documents.len(),
                    documents,
                })
            })
            .await
    }

    // ---- delete ----------------------------------------------------------

    /// Removes the document with the given id and returns it.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] when no document has the id.
    pub async fn delete_by_id(&self, id: &Id) -> StoreResult<Document<T>> {
        self.inner
            .queue
            .run(|| async move {
                self.inner.cache.invalidate(None).await;
                let existing = self
                    .inner
                    .transactions
                    .with_current(|map| map.get(id).cloned())
                    .await
                    .ok_or_else(|| StoreError::NotFound(format!("no document with id {id}")))?;
                self.remove_document(&existing).await?;
                self.flush().await?;
                Ok(existing)
            })
            .await
    }

    /// Removes the first document matching the query and returns it.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] when nothing matches.
    pub async fn delete_one(&self, query: &ConditionNode) -> StoreResult<Document<T>> {
        self.inner
            .queue
            .run(|| async move {
                self.inner.cache.invalidate(None).await;
                query.validate()?;
                let mut projections = Projections::new();
                let matched = self.fetch_query(Some(query), &mut projections, Some(1)).await?;
                let existing = matched.into_iter().next().ok_or_else(|| {
                    StoreError::NotFound("no document matches the query".to_owned())
                })?;
                self.remove_document(&existing).await?;
                self.flush().await?;
                Ok(existing)
            })
            .await
    }

    /// Removes every document matching the query, sequentially, with a
    /// single flush at the end. Matching nothing is not an error.
    pub async fn delete_many(&self, query: &ConditionNode) -> StoreResult<DeleteResult> {
        self.inner
            .queue
            .run(|| async move {
                self.inner.cache.invalidate(None).await;
                query.validate()?;
                let mut projections = Projections::new();
                let matched = self.fetch_query(Some(query), &mut projections, None).await?;
                for doc in &matched {
                    self.remove_document(doc).await?;
                }
                self.flush().await?;
                Ok(DeleteResult {
                    deleted: true,
                    n: matched.len(),
                })
            })
            .await
    }

    /// Removes every document and drops all indexes, registrations included.
    /// Idempotent: a second call reports zero deletions.
    pub async fn delete_all(&self) -> StoreResult<DeleteResult> {
        self.inner
            .queue
            .run(|| async move {
                self.inner.cache.invalidate(None).await;
                let n = self
                    .inner
                    .transactions
                    .with_current_mut(|map| {
                        let n = map.len();
                        map.clear();
                        n
                    })
                    .await;
                self.inner.indexes.write().await.clear();
                self.flush().await?;
                Ok(DeleteResult { deleted: true, n })
            })
            .await
    }

    // ---- transactions ----------------------------------------------------

    /// Opens a transaction. Until commit, writes are visible only through
    /// this store's current view; the committed (persisted) state is frozen.
    pub async fn begin_transaction(&self) -> StoreResult<()> {
        self.inner
            .queue
            .run(|| async move {
                self.inner.cache.invalidate(None).await;
                self.inner.transactions.begin().await
            })
            .await
    }

    /// Commits the open transaction and flushes the now-canonical state.
    pub async fn commit_transaction(&self) -> StoreResult<()> {
        self.inner
            .queue
            .run(|| async move {
                self.inner.cache.invalidate(None).await;
                self.inner.transactions.commit().await?;
                self.flush().await
            })
            .await
    }

    /// Rolls the open transaction back, undoing every write since `begin`.
    /// Indexes are rebuilt from the restored canonical map, since the
    /// discarded working copy may have touched them.
    pub async fn rollback_transaction(&self) -> StoreResult<()> {
        self.inner
            .queue
            .run(|| async move {
                self.inner.cache.invalidate(None).await;
                self.inner.transactions.rollback().await?;
                self.rebuild_indexes().await
            })
            .await
    }

    /// True while a transaction is open.
    pub async fn in_transaction(&self) -> bool {
        self.inner.transactions.is_open().await
    }

    // ---- indexes & stats -------------------------------------------------

    /// Registers an equality index over a field set and backfills it from
    /// the current documents. Idempotent; registering twice is a no-op.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Validation`] for an empty field set or an empty
    /// field name.
    pub async fn register_index(&self, fields: &[&str]) -> StoreResult<()> {
        if fields.is_empty() || fields.iter().any(|field| field.is_empty()) {
            return Err(StoreError::Validation(
                "an index must cover at least one named field".to_owned(),
            ));
        }
        self.inner
            .queue
            .run(|| async move {
                let mut indexes = self.inner.indexes.write().await;
                if indexes.register(fields) {
                    let documents = self
                        .inner
                        .transactions
                        .with_current(|map| map.values().cloned().collect::<Vec<_>>())
                        .await;
                    if let Some(index) = indexes.index_mut(fields) {
                        for doc in &documents {
                            let projected = doc.fields()?;
                            index.insert(&doc.id, &projected);
                        }
                    }
                }
                Ok(())
            })
            .await
    }

    /// The query cache's hit/miss counters and occupancy.
    pub async fn cache_stats(&self) -> CacheStats {
        self.inner.cache.stats().await
    }

    // ---- internals -------------------------------------------------------

    async fn insert_document(&self, doc: &Document<T>) -> StoreResult<()> {
        self.inner
            .transactions
            .with_current_mut(|map| {
                map.insert(doc.id.clone(), doc.clone());
            })
            .await;
        let mut indexes = self.inner.indexes.write().await;
        if !indexes.is_empty() {
            let fields = doc.fields()?;
            indexes.insert_document(&doc.id, &fields);
        }
        Ok(())
    }

    async fn apply_update(&self, old: &Document<T>, new: &Document<T>) -> StoreResult<()> {
        self.inner
            .transactions
            .with_current_mut(|map| {
                map.insert(new.id.clone(), new.clone());
            })
            .await;
        let mut indexes = self.inner.indexes.write().await;
        if !indexes.is_empty() {
            let old_fields = old.fields()?;
            let new_fields = new.fields()?;
            indexes.replace_document(&new.id, &old_fields, &new_fields);
        }
        Ok(())
    }

    async fn remove_document(&self, doc: &Document<T>) -> StoreResult<()> {
        self.inner
            .transactions
            .with_current_mut(|map| {
                map.shift_remove(&doc.id);
            })
            .await;
        let mut indexes = self.inner.indexes.write().await;
        if !indexes.is_empty() {
            let fields = doc.fields()?;
            indexes.remove_document(&doc.id, &fields);
        }
        Ok(())
    }

    async fn rebuild_indexes(&self) -> StoreResult<()> {
        let mut indexes = self.inner.indexes.write().await;
        if indexes.is_empty() {
            return Ok(());
        }
        let documents = self
            .inner
            .transactions
            .with_current(|map| map.values().cloned().collect::<Vec<_>>())
            .await;
        let mut projected = Vec::with_capacity(documents.len());
        for doc in &documents {
            projected.push((doc.id.clone(), doc.fields()?));
        }
        indexes.rebuild(&projected);
        Ok(())
    }

    /// Resolves a query against the current view: the index route first when
    /// the query is an eligible equality conjunction with hits, otherwise a
    /// full scan through the evaluator. `None` means "all documents".
    async fn fetch_query(
        &self,
        query: Option<&ConditionNode>,
        projections: &mut Projections,
        limit: Option<usize>,
    ) -> StoreResult<Vec<Document<T>>> {
        let Some(node) = query else {
            return Ok(self.documents().await);
        };

        {
            let indexes = self.inner.indexes.read().await;
            if let Some(ids) = indexes.lookup(node) {
                if !ids.is_empty() {
                    let docs = self
                        .inner
                        .transactions
                        .with_current(|map| {
                            ids.iter()
                                .filter_map(|id| map.get(id).cloned())
                                .collect::<Vec<_>>()
                        })
                        .await;
                    if !docs.is_empty() {
                        return Ok(docs);
                    }
                }
            }
        }

        let candidates = self.documents().await;
        let mut evaluator = Evaluator::new();
        let mut matched = Vec::new();
        for doc in candidates {
            let is_match = projections
                .get(&doc)
                .is_some_and(|fields| evaluator.matches(fields, node));
            if is_match {
                matched.push(doc);
                if limit.is_some_and(|limit| matched.len() >= limit) {
                    break;
                }
            }
        }
        Ok(matched)
    }

    async fn flush(&self) -> StoreResult<()> {
        if !self.inner.persistence.is_enabled() {
            return Ok(());
        }
        let entries = self.inner.transactions.committed_entries().await;
        self.inner.persistence.save(&entries).await
    }
}

/// A lazy, chainable query over many documents.
///
/// Configure sorting and pagination, then materialize the result with
/// [`FindMany::exec`] — or simply await the builder, which is equivalent.
/// The final (sorted, paginated) result is re-cached under the original
/// query key only when it differs from the pre-pagination result.
#[must_use = "a query does nothing until executed or awaited"]
pub struct FindMany<T: Payload> {
    store: Store<T>,
    query: Option<ConditionNode>,
    sorts: Vec<(String, SortOrder)>,
    skip: usize,
    limit: Option<usize>,
}

impl<T: Payload> FindMany<T> {
    fn new(store: Store<T>, query: Option<ConditionNode>) -> Self {
        Self {
            store,
            query,
            sorts: Vec::new(),
            skip: 0,
            limit: None,
        }
    }

    /// Adds a sort key; call repeatedly for multi-key ordering. Documents
    /// missing the field keep their relative order.
    pub fn sort(mut self, field: impl Into<String>, order: SortOrder) -> Self {
        self.sorts.push((field.into(), order));
        self
    }

    /// Skips the first `n` results.
    pub fn skip(mut self, n: usize) -> Self {
        self.skip = n;
        self
    }

    /// Caps the result at `n` documents.
    pub fn limit(mut self, n: usize) -> Self {
        self.limit = Some(n);
        self
    }

    /// Executes the query once and returns the materialized result.
    pub async fn exec(self) -> StoreResult<Vec<Document<T>>> {
        let FindMany {
            store,
            query,
            sorts,
            skip,
            limit,
        } = self;

        if let Some(query) = &query {
            query.validate()?;
        }
        let key = match &query {
            Some(query) => query.cache_key(),
            None => Some(ALL_DOCUMENTS_KEY.to_owned()),
        };

        let mut projections = Projections::new();
        let cached = match &key {
            Some(key) => store.inner.cache.get(key).await,
            None => None,
        };
        let base = match cached {
            Some(docs) => docs,
            None => {
                let docs = store
                    .fetch_query(query.as_ref(), &mut projections, None)
                    .await?;
                if let Some(key) = &key {
                    store.inner.cache.put(key.clone(), docs.clone()).await;
                }
                docs
            }
        };

        let mut result = base.clone();
        if !sorts.is_empty() {
            let mut decorated: Vec<(Vec<Option<Value>>, Document<T>)> = result
                .into_iter()
                .map(|doc| {
                    let keys = sorts
                        .iter()
                        .map(|(field, _)| {
                            projections
                                .get(&doc)
                                .and_then(|fields| fields.get(field))
                                .cloned()
                        })
                        .collect();
                    (keys, doc)
                })
                .collect();
            decorated.sort_by(|(a, _), (b, _)| {
                for (i, (_, order)) in sorts.iter().enumerate() {
                    let ordering = match (&a[i], &b[i]) {
                        (Some(x), Some(y)) => values_cmp(x, y).unwrap_or(Ordering::Equal),
                        _ => Ordering::Equal,
                    };
                    let ordering = match order {
                        SortOrder::Asc => ordering,
                        SortOrder::Desc => ordering.reverse(),
                    };
                    if ordering != Ordering::Equal {
                        return ordering;
                    }
                }
                Ordering::Equal
            });
            result = decorated.into_iter().map(|(_, doc)| doc).collect();
        }

        if skip > 0 || limit.is_some() {
            result = result
                .into_iter()
                .skip(skip)
                .take(limit.unwrap_or(usize::MAX))
                .collect();
        }

        if let Some(key) = &key {
            if !same_documents(&base, &result) {
                store.inner.cache.put(key.clone(), result.clone()).await;
            }
        }
        Ok(result)
    }
}

impl<T: Payload> IntoFuture for FindMany<T> {
    type Output = StoreResult<Vec<Document<T>>>;
    type IntoFuture = BoxFuture<'static, Self::Output>;

    fn into_future(self) -> Self::IntoFuture {
        Box::pin(self.exec())
    }
}

fn same_documents<T>(a: &[Document<T>], b: &[Document<T>]) -> bool {
    a.len() == b.len() && a.iter().zip(b).all(|(x, y)| x.id == y.id)
}
