//! Database layer for Shelfmark
//!
//! Typed collections over MongoDB, with an in-process memory mode used
//! when no MongoDB URI is configured (dev mode and unit tests).

pub mod collection;
pub mod mongo;
pub mod schemas;

pub use collection::{Collection, DocumentSchema, Filter};
pub use mongo::{IntoIndexes, MongoClient};

use tracing::warn;

use schemas::{
    AdminDoc, BookDoc, ProfileDoc, RatingDoc, UserDoc, ADMIN_COLLECTION, BOOK_COLLECTION,
    PROFILE_COLLECTION, RATING_COLLECTION, USER_COLLECTION,
};

use crate::types::Result;

/// The service's document collections
pub struct Database {
    pub users: Collection<UserDoc>,
    pub books: Collection<BookDoc>,
    pub profiles: Collection<ProfileDoc>,
    pub ratings: Collection<RatingDoc>,
    pub admins: Collection<AdminDoc>,
    persistent: bool,
}

impl Database {
    /// Connect to MongoDB and prepare all collections with their indexes
    pub async fn connect(uri: &str, db_name: &str) -> Result<Self> {
        let mongo = MongoClient::new(uri, db_name).await?;

        Ok(Self {
            users: Collection::mongo(mongo.collection::<UserDoc>(USER_COLLECTION).await?),
            books: Collection::mongo(mongo.collection::<BookDoc>(BOOK_COLLECTION).await?),
            profiles: Collection::mongo(mongo.collection::<ProfileDoc>(PROFILE_COLLECTION).await?),
            ratings: Collection::mongo(mongo.collection::<RatingDoc>(RATING_COLLECTION).await?),
            admins: Collection::mongo(mongo.collection::<AdminDoc>(ADMIN_COLLECTION).await?),
            persistent: true,
        })
    }

    /// Create an in-process database (no MongoDB)
    pub fn memory() -> Self {
        warn!("Document store running in memory-only mode (no MongoDB)");

        Self {
            users: Collection::memory(),
            books: Collection::memory(),
            profiles: Collection::memory(),
            ratings: Collection::memory(),
            admins: Collection::memory(),
            persistent: false,
        }
    }

    /// Whether the store is backed by MongoDB
    pub fn is_persistent(&self) -> bool {
        self.persistent
    }
}
