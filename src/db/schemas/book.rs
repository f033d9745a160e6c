//! Book document schema

use bson::Document;
use mongodb::options::IndexOptions;
use serde::{Deserialize, Serialize};

use crate::db::collection::DocumentSchema;
use crate::db::mongo::IntoIndexes;
use crate::db::schemas::Metadata;

/// Collection name for books
pub const BOOK_COLLECTION: &str = "books";

/// Book document
///
/// Anyone may submit a book; there is no duplicate-title check.
#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub struct BookDoc {
    /// Document ID
    #[serde(rename = "_id", default)]
    pub id: String,

    /// Common metadata (created_at, updated_at)
    #[serde(default)]
    pub metadata: Metadata,

    /// Book title
    pub title: String,

    /// Author name
    pub author: String,

    /// Page count, if known
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pages: Option<u32>,
}

impl BookDoc {
    /// Create a new book document
    pub fn new(title: String, author: String, pages: Option<u32>) -> Self {
        Self {
            id: String::new(),
            metadata: Metadata::new(),
            title,
            author,
            pages,
        }
    }
}

impl DocumentSchema for BookDoc {
    const COLLECTION: &'static str = BOOK_COLLECTION;

    fn id(&self) -> &str {
        &self.id
    }

    fn set_id(&mut self, id: String) {
        self.id = id;
    }

    fn metadata_mut(&mut self) -> &mut Metadata {
        &mut self.metadata
    }
}

impl IntoIndexes for BookDoc {
    fn into_indices() -> Vec<(Document, Option<IndexOptions>)> {
        // Books are only ever fetched by id or scanned whole
        Vec::new()
    }
}
