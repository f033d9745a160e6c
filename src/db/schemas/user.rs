//! User document schema
//!
//! Stores login credentials for the identity layer. The rest of the
//! service only ever reads the id, email, and display name.

use bson::{doc, Document};
use mongodb::options::IndexOptions;
use serde::{Deserialize, Serialize};

use crate::db::collection::DocumentSchema;
use crate::db::mongo::IntoIndexes;
use crate::db::schemas::Metadata;

/// Collection name for users
pub const USER_COLLECTION: &str = "users";

/// User document
#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub struct UserDoc {
    /// Document ID
    #[serde(rename = "_id", default)]
    pub id: String,

    /// Common metadata (created_at, updated_at)
    #[serde(default)]
    pub metadata: Metadata,

    /// Login email, one account per address
    pub email: String,

    /// Display name shown on reviews
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Argon2 password hash
    pub password_hash: String,
}

impl UserDoc {
    /// Create a new user document
    pub fn new(email: String, name: Option<String>, password_hash: String) -> Self {
        Self {
            id: String::new(),
            metadata: Metadata::new(),
            email,
            name,
            password_hash,
        }
    }
}

impl DocumentSchema for UserDoc {
    const COLLECTION: &'static str = USER_COLLECTION;

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

impl IntoIndexes for UserDoc {
    fn into_indices() -> Vec<(Document, Option<IndexOptions>)> {
        vec![
            // Unique index on email
            (
                doc! { "email": 1 },
                Some(
                    IndexOptions::builder()
                        .unique(true)
                        .name("email_unique".to_string())
                        .build(),
                ),
            ),
        ]
    }
}
