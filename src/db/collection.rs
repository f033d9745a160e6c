//! Typed document collections
//!
//! Each collection reads and writes one kind of schema document through
//! the store contract the service is built on: store-assigned ids, point
//! get by id, equality-filtered lookups, patch, and delete.
//!
//! Two backends exist behind the same API. The MongoDB backend is used
//! when a connection is configured. The memory backend keeps rows in an
//! insertion-ordered in-process table and backs dev mode and unit tests.

use std::collections::{BTreeMap, HashMap};

use futures_util::StreamExt;
use serde::{de::DeserializeOwned, Serialize};
use tokio::sync::RwLock;
use tracing::error;
use uuid::Uuid;

use crate::db::schemas::Metadata;
use crate::types::{Result, ShelfmarkError};

/// Trait for documents stored in a typed collection
pub trait DocumentSchema:
    Serialize + DeserializeOwned + Unpin + Send + Sync + Clone + 'static
{
    /// Collection name in the store
    const COLLECTION: &'static str;

    /// Document id (empty until inserted)
    fn id(&self) -> &str;

    /// Assign the store-generated id
    fn set_id(&mut self, id: String);

    /// Mutable access to the shared metadata block
    fn metadata_mut(&mut self) -> &mut Metadata;
}

/// Equality filter over document fields
///
/// The store only supports lookups by one or more equality-matched
/// fields; this is that surface and nothing more.
#[derive(Debug, Clone, Default)]
pub struct Filter {
    fields: Vec<(String, serde_json::Value)>,
}

impl Filter {
    /// Create an empty filter (matches everything)
    pub fn new() -> Self {
        Self::default()
    }

    /// Require a field to equal a value
    pub fn eq(mut self, field: &str, value: impl Into<serde_json::Value>) -> Self {
        self.fields.push((field.to_string(), value.into()));
        self
    }

    fn to_document(&self) -> Result<bson::Document> {
        let mut doc = bson::Document::new();
        for (field, value) in &self.fields {
            doc.insert(field.clone(), bson::to_bson(value)?);
        }
        Ok(doc)
    }

    fn matches(&self, doc: &serde_json::Value) -> bool {
        self.fields
            .iter()
            .all(|(field, value)| doc.get(field) == Some(value))
    }
}

/// In-process table preserving insertion order
struct MemTable<T> {
    inner: RwLock<MemInner<T>>,
}

struct MemInner<T> {
    /// Rows keyed by insertion sequence, so iteration follows creation order
    rows: BTreeMap<u64, T>,
    /// Document id to insertion sequence
    ids: HashMap<String, u64>,
    seq: u64,
}

impl<T> MemTable<T> {
    fn new() -> Self {
        Self {
            inner: RwLock::new(MemInner {
                rows: BTreeMap::new(),
                ids: HashMap::new(),
                seq: 0,
            }),
        }
    }
}

enum Backend<T: Send + Sync> {
    Mongo(mongodb::Collection<T>),
    Memory(MemTable<T>),
}

/// Typed collection over one of the two backends
pub struct Collection<T: DocumentSchema> {
    backend: Backend<T>,
}

impl<T: DocumentSchema> Collection<T> {
    /// Wrap a MongoDB collection
    pub fn mongo(inner: mongodb::Collection<T>) -> Self {
        Self {
            backend: Backend::Mongo(inner),
        }
    }

    /// Create an in-process memory collection
    pub fn memory() -> Self {
        Self {
            backend: Backend::Memory(MemTable::new()),
        }
    }

    /// Insert a document, assigning its id and metadata timestamps.
    /// Returns the new id.
    pub async fn insert(&self, mut doc: T) -> Result<String> {
        let id = Uuid::new_v4().to_string();
        doc.set_id(id.clone());
        *doc.metadata_mut() = Metadata::new();

        match &self.backend {
            Backend::Mongo(collection) => {
                collection.insert_one(&doc).await?;
            }
            Backend::Memory(table) => {
                let mut inner = table.inner.write().await;
                inner.seq += 1;
                let seq = inner.seq;
                inner.ids.insert(id.clone(), seq);
                inner.rows.insert(seq, doc);
            }
        }

        Ok(id)
    }

    /// Point lookup by id
    pub async fn get(&self, id: &str) -> Result<Option<T>> {
        match &self.backend {
            Backend::Mongo(collection) => {
                Ok(collection.find_one(bson::doc! { "_id": id }).await?)
            }
            Backend::Memory(table) => {
                let inner = table.inner.read().await;
                Ok(inner
                    .ids
                    .get(id)
                    .and_then(|seq| inner.rows.get(seq))
                    .cloned())
            }
        }
    }

    /// First document matching the filter, in creation order
    pub async fn find_one(&self, filter: Filter) -> Result<Option<T>> {
        match &self.backend {
            Backend::Mongo(collection) => Ok(collection.find_one(filter.to_document()?).await?),
            Backend::Memory(table) => {
                let inner = table.inner.read().await;
                for row in inner.rows.values() {
                    if filter.matches(&serde_json::to_value(row)?) {
                        return Ok(Some(row.clone()));
                    }
                }
                Ok(None)
            }
        }
    }

    /// All documents matching the filter, in creation order
    pub async fn find_many(&self, filter: Filter) -> Result<Vec<T>> {
        match &self.backend {
            Backend::Mongo(collection) => {
                let cursor = collection.find(filter.to_document()?).await?;
                let results: Vec<T> = cursor
                    .filter_map(|doc| async {
                        match doc {
                            Ok(d) => Some(d),
                            Err(e) => {
                                error!("Error reading document: {}", e);
                                None
                            }
                        }
                    })
                    .collect()
                    .await;
                Ok(results)
            }
            Backend::Memory(table) => {
                let inner = table.inner.read().await;
                let mut results = Vec::new();
                for row in inner.rows.values() {
                    if filter.matches(&serde_json::to_value(row)?) {
                        results.push(row.clone());
                    }
                }
                Ok(results)
            }
        }
    }

    /// Every document in the collection, in creation order
    pub async fn all(&self) -> Result<Vec<T>> {
        self.find_many(Filter::new()).await
    }

    /// Patch the named fields of one document. Fields set to JSON null
    /// overwrite (and thereby clear) optional values. Patching an unknown
    /// id is a no-op.
    pub async fn patch(
        &self,
        id: &str,
        changes: serde_json::Map<String, serde_json::Value>,
    ) -> Result<()> {
        match &self.backend {
            Backend::Mongo(collection) => {
                let mut set = bson::to_document(&serde_json::Value::Object(changes))?;
                set.insert("metadata.updated_at", bson::to_bson(&chrono::Utc::now())?);
                collection
                    .update_one(bson::doc! { "_id": id }, bson::doc! { "$set": set })
                    .await?;
                Ok(())
            }
            Backend::Memory(table) => {
                let mut inner = table.inner.write().await;
                let Some(seq) = inner.ids.get(id).copied() else {
                    return Ok(());
                };
                let Some(row) = inner.rows.get(&seq) else {
                    return Ok(());
                };

                let mut value = serde_json::to_value(row)?;
                let Some(object) = value.as_object_mut() else {
                    return Err(ShelfmarkError::Internal(format!(
                        "document {} did not serialize to an object",
                        id
                    )));
                };
                for (field, new_value) in changes {
                    object.insert(field, new_value);
                }

                let mut patched: T = serde_json::from_value(value)?;
                patched.metadata_mut().updated_at = Some(chrono::Utc::now());
                inner.rows.insert(seq, patched);
                Ok(())
            }
        }
    }

    /// Delete one document by id. Returns whether a document was removed.
    pub async fn delete(&self, id: &str) -> Result<bool> {
        match &self.backend {
            Backend::Mongo(collection) => {
                let result = collection.delete_one(bson::doc! { "_id": id }).await?;
                Ok(result.deleted_count > 0)
            }
            Backend::Memory(table) => {
                let mut inner = table.inner.write().await;
                match inner.ids.remove(id) {
                    Some(seq) => {
                        inner.rows.remove(&seq);
                        Ok(true)
                    }
                    None => Ok(false),
                }
            }
        }
    }
}
