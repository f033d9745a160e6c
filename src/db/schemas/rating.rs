//! Rating document schema

use bson::{doc, Document};
use mongodb::options::IndexOptions;
use serde::{Deserialize, Serialize};

use crate::db::collection::DocumentSchema;
use crate::db::mongo::IntoIndexes;
use crate::db::schemas::Metadata;

/// Collection name for ratings
pub const RATING_COLLECTION: &str = "ratings";

/// Rating document
///
/// At most one rating per (book, user) pair, enforced by lookup-then-write
/// rather than a unique index. The rating value and finished date are
/// stored as submitted, without range or format validation.
#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub struct RatingDoc {
    /// Document ID
    #[serde(rename = "_id", default)]
    pub id: String,

    /// Common metadata (created_at, updated_at)
    #[serde(default)]
    pub metadata: Metadata,

    /// Rated book id
    pub book_id: String,

    /// Rating user id
    pub user_id: String,

    /// Back-reference to the reviewer's profile
    #[serde(skip_serializing_if = "Option::is_none")]
    pub profile_id: Option<String>,

    /// Star rating
    pub rating: f64,

    /// ISO date the reader finished the book
    #[serde(skip_serializing_if = "Option::is_none")]
    pub finished_date: Option<String>,

    /// Free-form review notes
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl RatingDoc {
    /// Create a new rating document
    pub fn new(
        book_id: String,
        user_id: String,
        profile_id: Option<String>,
        rating: f64,
        finished_date: Option<String>,
        notes: Option<String>,
    ) -> Self {
        Self {
            id: String::new(),
            metadata: Metadata::new(),
            book_id,
            user_id,
            profile_id,
            rating,
            finished_date,
            notes,
        }
    }
}

impl DocumentSchema for RatingDoc {
    const COLLECTION: &'static str = RATING_COLLECTION;

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

impl IntoIndexes for RatingDoc {
    fn into_indices() -> Vec<(Document, Option<IndexOptions>)> {
        vec![
            // Compound index for the per-(book, user) upsert lookup
            (
                doc! { "book_id": 1, "user_id": 1 },
                Some(
                    IndexOptions::builder()
                        .name("book_and_user_index".to_string())
                        .build(),
                ),
            ),
            // Index on user_id for "my ratings" queries
            (
                doc! { "user_id": 1 },
                Some(
                    IndexOptions::builder()
                        .name("user_id_index".to_string())
                        .build(),
                ),
            ),
        ]
    }
}
