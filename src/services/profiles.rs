//! Reader profile service
//!
//! One profile per user, upserted by lookup-then-write. Updates replace
//! the supplied fields wholesale; bio and favorite genres are not merged
//! with what was there before.

use std::sync::Arc;

use tracing::info;

use crate::db::schemas::ProfileDoc;
use crate::db::{Database, Filter};
use crate::types::{Result, ShelfmarkError};

/// Profile operations
pub struct ProfileService {
    db: Arc<Database>,
}

impl ProfileService {
    /// Create a new profile service
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    /// Fetch a user's profile
    pub async fn get(&self, user_id: &str) -> Result<Option<ProfileDoc>> {
        self.db
            .profiles
            .find_one(Filter::new().eq("user_id", user_id))
            .await
    }

    /// Create or replace the caller's profile fields. Returns the
    /// profile id.
    pub async fn update(
        &self,
        caller: Option<&str>,
        name: String,
        bio: Option<String>,
        favorite_genres: Option<Vec<String>>,
    ) -> Result<String> {
        let user_id = caller.ok_or_else(|| {
            ShelfmarkError::Unauthenticated("updating a profile requires a signed-in caller".into())
        })?;

        let existing = self
            .db
            .profiles
            .find_one(Filter::new().eq("user_id", user_id))
            .await?;

        if let Some(existing) = existing {
            let mut changes = serde_json::Map::new();
            changes.insert("name".into(), serde_json::json!(name));
            changes.insert("bio".into(), serde_json::json!(bio));
            changes.insert("favorite_genres".into(), serde_json::json!(favorite_genres));
            self.db.profiles.patch(&existing.id, changes).await?;

            info!(profile_id = %existing.id, "Updated profile");

            return Ok(existing.id);
        }

        let mut profile = ProfileDoc::new(user_id.to_string(), name);
        profile.bio = bio;
        profile.favorite_genres = favorite_genres;
        let profile_id = self.db.profiles.insert(profile).await?;

        info!(profile_id = %profile_id, "Created profile");

        Ok(profile_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::testing::{seed_user, test_db};
    use crate::types::ShelfmarkError;

    #[tokio::test]
    async fn test_update_requires_identity() {
        let db = test_db();
        let profiles = ProfileService::new(db.clone());

        let err = profiles
            .update(None, "Reader".into(), None, None)
            .await
            .unwrap_err();
        assert!(matches!(err, ShelfmarkError::Unauthenticated(_)));
    }

    #[tokio::test]
    async fn test_update_creates_then_patches() {
        let db = test_db();
        let profiles = ProfileService::new(db.clone());

        let reader = seed_user(&db, "reader@example.com", None).await;

        let first = profiles
            .update(
                Some(&reader),
                "Reader".into(),
                Some("I like sand".into()),
                Some(vec!["sci-fi".into(), "history".into()]),
            )
            .await
            .unwrap();

        let stored = profiles.get(&reader).await.unwrap().unwrap();
        assert_eq!(stored.id, first);
        assert_eq!(stored.name, "Reader");
        assert_eq!(stored.bio.as_deref(), Some("I like sand"));

        // Second update patches the same document; omitted optional
        // fields are cleared, not kept
        let second = profiles
            .update(Some(&reader), "Muad'Dib".into(), None, None)
            .await
            .unwrap();
        assert_eq!(first, second);

        let stored = profiles.get(&reader).await.unwrap().unwrap();
        assert_eq!(stored.name, "Muad'Dib");
        assert_eq!(stored.bio, None);
        assert_eq!(stored.favorite_genres, None);

        assert_eq!(db.profiles.all().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_get_unknown_user_is_none() {
        let db = test_db();
        let profiles = ProfileService::new(db);

        assert!(profiles.get("nobody").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_genre_order_is_preserved() {
        let db = test_db();
        let profiles = ProfileService::new(db.clone());

        let reader = seed_user(&db, "reader@example.com", None).await;
        profiles
            .update(
                Some(&reader),
                "Reader".into(),
                None,
                Some(vec!["fantasy".into(), "sci-fi".into(), "poetry".into()]),
            )
            .await
            .unwrap();

        let stored = profiles.get(&reader).await.unwrap().unwrap();
        assert_eq!(
            stored.favorite_genres,
            Some(vec![
                "fantasy".to_string(),
                "sci-fi".to_string(),
                "poetry".to_string()
            ])
        );
    }
}
