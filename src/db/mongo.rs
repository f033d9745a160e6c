//! MongoDB client wrapper
//!
//! Connects with short server-selection timeouts, verifies the connection
//! with a ping, and hands out typed collections with their schema-declared
//! indexes applied.

use bson::{doc, Document};
use mongodb::{options::IndexOptions, Client, IndexModel};
use serde::{de::DeserializeOwned, Serialize};
use tracing::info;

use crate::types::{Result, ShelfmarkError};

/// Trait for schemas that provide index definitions
pub trait IntoIndexes {
    fn into_indices() -> Vec<(Document, Option<IndexOptions>)>;
}

/// MongoDB client wrapper
#[derive(Clone)]
pub struct MongoClient {
    client: Client,
    db_name: String,
}

impl MongoClient {
    /// Create a new MongoDB client
    pub async fn new(uri: &str, db_name: &str) -> Result<Self> {
        info!("Connecting to MongoDB at {}", uri);

        // Use serverSelectionTimeoutMS to avoid hanging on unreachable MongoDB
        let timeout_uri = if uri.contains('?') {
            format!("{}&serverSelectionTimeoutMS=3000&connectTimeoutMS=3000", uri)
        } else {
            format!("{}?serverSelectionTimeoutMS=3000&connectTimeoutMS=3000", uri)
        };

        let client = Client::with_uri_str(&timeout_uri).await.map_err(|e| {
            ShelfmarkError::Database(format!("Failed to connect to MongoDB: {}", e))
        })?;

        // Verify connection with timeout
        client
            .database(db_name)
            .run_command(doc! { "ping": 1 })
            .await
            .map_err(|e| ShelfmarkError::Database(format!("MongoDB ping failed: {}", e)))?;

        info!("Connected to MongoDB database '{}'", db_name);

        Ok(Self {
            client,
            db_name: db_name.to_string(),
        })
    }

    /// Get a typed collection with its schema indexes applied
    pub async fn collection<T>(&self, name: &str) -> Result<mongodb::Collection<T>>
    where
        T: Serialize + DeserializeOwned + Unpin + Send + Sync + IntoIndexes,
    {
        let collection = self.client.database(&self.db_name).collection::<T>(name);
        apply_indexes::<T>(&collection).await?;
        Ok(collection)
    }

    /// Get the raw MongoDB client
    pub fn inner(&self) -> &Client {
        &self.client
    }

    /// Get the database name
    pub fn db_name(&self) -> &str {
        &self.db_name
    }
}

/// Apply schema-defined indexes to a collection
async fn apply_indexes<T>(collection: &mongodb::Collection<T>) -> Result<()>
where
    T: Serialize + DeserializeOwned + Unpin + Send + Sync + IntoIndexes,
{
    let schema_indices = T::into_indices();

    if schema_indices.is_empty() {
        return Ok(());
    }

    let indices: Vec<IndexModel> = schema_indices
        .into_iter()
        .map(|(keys, opts)| IndexModel::builder().keys(keys).options(opts).build())
        .collect();

    collection
        .create_indexes(indices)
        .await
        .map_err(|e| ShelfmarkError::Database(format!("Failed to create indexes: {}", e)))?;

    Ok(())
}
