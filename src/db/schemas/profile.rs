//! Reader profile document schema

use bson::{doc, Document};
use mongodb::options::IndexOptions;
use serde::{Deserialize, Serialize};

use crate::db::collection::DocumentSchema;
use crate::db::mongo::IntoIndexes;
use crate::db::schemas::Metadata;

/// Collection name for profiles
pub const PROFILE_COLLECTION: &str = "profiles";

/// Reader profile document
///
/// One profile per user, enforced by lookup-then-write rather than a
/// unique index. Created explicitly via the profile update operation, or
/// lazily the first time a user rates a book.
#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub struct ProfileDoc {
    /// Document ID
    #[serde(rename = "_id", default)]
    pub id: String,

    /// Common metadata (created_at, updated_at)
    #[serde(default)]
    pub metadata: Metadata,

    /// Owning user id
    pub user_id: String,

    /// Display name shown alongside reviews
    pub name: String,

    /// Short bio
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bio: Option<String>,

    /// Favorite genres, in the reader's preferred order
    #[serde(skip_serializing_if = "Option::is_none")]
    pub favorite_genres: Option<Vec<String>>,
}

impl ProfileDoc {
    /// Create a new profile document
    pub fn new(user_id: String, name: String) -> Self {
        Self {
            id: String::new(),
            metadata: Metadata::new(),
            user_id,
            name,
            bio: None,
            favorite_genres: None,
        }
    }
}

impl DocumentSchema for ProfileDoc {
    const COLLECTION: &'static str = PROFILE_COLLECTION;

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

impl IntoIndexes for ProfileDoc {
    fn into_indices() -> Vec<(Document, Option<IndexOptions>)> {
        vec![
            // Index on user_id for lookups; intentionally not unique,
            // the one-per-user invariant lives in the service layer
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
