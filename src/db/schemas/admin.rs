//! Admin membership document schema

use bson::{doc, Document};
use mongodb::options::IndexOptions;
use serde::{Deserialize, Serialize};

use crate::db::collection::DocumentSchema;
use crate::db::mongo::IntoIndexes;
use crate::db::schemas::Metadata;

/// Collection name for admins
pub const ADMIN_COLLECTION: &str = "admins";

/// Admin membership document
///
/// A user is an admin iff a document with their user_id exists here.
/// At most one per user, checked at promotion time rather than by a
/// unique index. The first admin is seeded out-of-band (`seed-admin`).
#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub struct AdminDoc {
    /// Document ID
    #[serde(rename = "_id", default)]
    pub id: String,

    /// Common metadata (created_at, updated_at)
    #[serde(default)]
    pub metadata: Metadata,

    /// Member user id
    pub user_id: String,
}

impl AdminDoc {
    /// Create a new admin membership document
    pub fn new(user_id: String) -> Self {
        Self {
            id: String::new(),
            metadata: Metadata::new(),
            user_id,
        }
    }
}

impl DocumentSchema for AdminDoc {
    const COLLECTION: &'static str = ADMIN_COLLECTION;

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

impl IntoIndexes for AdminDoc {
    fn into_indices() -> Vec<(Document, Option<IndexOptions>)> {
        vec![
            // Index on user_id for membership checks
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
