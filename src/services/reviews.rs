//! Rating and review service
//!
//! One rating per (book, user), upserted by lookup-then-write. Rating a
//! book for the first time lazily creates the reader's profile. Values
//! are stored as submitted: the star value, finished date, and book id
//! are not validated here.

use std::sync::Arc;

use serde::Serialize;
use tracing::info;

use crate::db::schemas::{ProfileDoc, RatingDoc};
use crate::db::{Database, Filter};
use crate::types::{Result, ShelfmarkError};

/// A caller's own rating of a book; every field is null when the caller
/// is anonymous or has not rated the book
#[derive(Debug, Clone, Default, Serialize)]
pub struct RatingView {
    pub rating: Option<f64>,
    pub finished_date: Option<String>,
    pub notes: Option<String>,
}

/// A rating joined with the reviewer's profile (null when the reviewer
/// has none)
#[derive(Debug, Clone, Serialize)]
pub struct Review {
    #[serde(flatten)]
    pub rating: RatingDoc,
    pub profile: Option<ProfileDoc>,
}

/// Rating and review operations
pub struct ReviewService {
    db: Arc<Database>,
}

impl ReviewService {
    /// Create a new review service
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    /// Rate a book, replacing the caller's previous rating of it if one
    /// exists. Returns the rating id.
    pub async fn rate(
        &self,
        caller: Option<&str>,
        book_id: &str,
        rating: f64,
        finished_date: Option<String>,
        notes: Option<String>,
    ) -> Result<String> {
        let user_id = caller.ok_or_else(|| {
            ShelfmarkError::Unauthenticated("rating a book requires a signed-in caller".into())
        })?;

        let profile = self.ensure_profile(user_id).await?;

        let existing = self
            .db
            .ratings
            .find_one(Filter::new().eq("book_id", book_id).eq("user_id", user_id))
            .await?;

        if let Some(existing) = existing {
            let mut changes = serde_json::Map::new();
            changes.insert("rating".into(), serde_json::json!(rating));
            changes.insert("finished_date".into(), serde_json::json!(finished_date));
            changes.insert("notes".into(), serde_json::json!(notes));
            self.db.ratings.patch(&existing.id, changes).await?;

            info!(rating_id = %existing.id, book_id = %book_id, "Updated rating");

            return Ok(existing.id);
        }

        let rating_id = self
            .db
            .ratings
            .insert(RatingDoc::new(
                book_id.to_string(),
                user_id.to_string(),
                Some(profile.id),
                rating,
                finished_date,
                notes,
            ))
            .await?;

        info!(rating_id = %rating_id, book_id = %book_id, "Created rating");

        Ok(rating_id)
    }

    /// The caller's own rating of a book, null-filled when absent
    pub async fn get_rating(&self, caller: Option<&str>, book_id: &str) -> Result<RatingView> {
        let Some(user_id) = caller else {
            return Ok(RatingView::default());
        };

        let rating = self
            .db
            .ratings
            .find_one(Filter::new().eq("book_id", book_id).eq("user_id", user_id))
            .await?;

        Ok(match rating {
            Some(r) => RatingView {
                rating: Some(r.rating),
                finished_date: r.finished_date,
                notes: r.notes,
            },
            None => RatingView::default(),
        })
    }

    /// Arithmetic mean of all ratings for a book; null when unrated
    pub async fn average_rating(&self, book_id: &str) -> Result<Option<f64>> {
        let ratings = self
            .db
            .ratings
            .find_many(Filter::new().eq("book_id", book_id))
            .await?;

        if ratings.is_empty() {
            return Ok(None);
        }

        let sum: f64 = ratings.iter().map(|r| r.rating).sum();
        Ok(Some(sum / ratings.len() as f64))
    }

    /// Every rating of a book with the reviewer's profile attached.
    /// Order follows the underlying fetch order.
    pub async fn book_reviews(&self, book_id: &str) -> Result<Vec<Review>> {
        let ratings = self
            .db
            .ratings
            .find_many(Filter::new().eq("book_id", book_id))
            .await?;

        let mut reviews = Vec::with_capacity(ratings.len());
        for rating in ratings {
            let profile = self
                .db
                .profiles
                .find_one(Filter::new().eq("user_id", rating.user_id.as_str()))
                .await?;
            reviews.push(Review { rating, profile });
        }

        Ok(reviews)
    }

    /// Fetch the caller's profile, creating it with a defaulted display
    /// name on first use
    async fn ensure_profile(&self, user_id: &str) -> Result<ProfileDoc> {
        if let Some(profile) = self
            .db
            .profiles
            .find_one(Filter::new().eq("user_id", user_id))
            .await?
        {
            return Ok(profile);
        }

        let user = self
            .db
            .users
            .get(user_id)
            .await?
            .ok_or_else(|| ShelfmarkError::NotFound("rating user does not exist".into()))?;

        let name = user.name.unwrap_or_else(|| "Anonymous Reader".to_string());
        let mut profile = ProfileDoc::new(user_id.to_string(), name);
        let profile_id = self.db.profiles.insert(profile.clone()).await?;
        profile.id = profile_id;

        info!(user_id = %user_id, "Created profile on first rating");

        Ok(profile)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::schemas::BookDoc;
    use crate::services::testing::{seed_user, test_db};
    use crate::types::ShelfmarkError;

    async fn seed_book(db: &Database, title: &str) -> String {
        db.books
            .insert(BookDoc::new(title.to_string(), "Author".to_string(), None))
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_rate_requires_identity() {
        let db = test_db();
        let reviews = ReviewService::new(db.clone());

        let book_id = seed_book(&db, "Dune").await;
        let err = reviews
            .rate(None, &book_id, 5.0, None, None)
            .await
            .unwrap_err();
        assert!(matches!(err, ShelfmarkError::Unauthenticated(_)));
    }

    #[tokio::test]
    async fn test_rate_unknown_user() {
        let db = test_db();
        let reviews = ReviewService::new(db.clone());

        let book_id = seed_book(&db, "Dune").await;
        let err = reviews
            .rate(Some("ghost-user"), &book_id, 5.0, None, None)
            .await
            .unwrap_err();
        assert!(matches!(err, ShelfmarkError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_rate_upserts_single_record() {
        let db = test_db();
        let reviews = ReviewService::new(db.clone());

        let reader = seed_user(&db, "reader@example.com", Some("Reader")).await;
        let book_id = seed_book(&db, "Dune").await;

        let first = reviews
            .rate(Some(&reader), &book_id, 4.0, Some("2024-01-01".into()), None)
            .await
            .unwrap();
        let second = reviews
            .rate(Some(&reader), &book_id, 2.0, None, Some("on reread: meh".into()))
            .await
            .unwrap();

        assert_eq!(first, second);

        let stored = db.ratings.all().await.unwrap();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].rating, 2.0);
        // The patch replaces all three fields, clearing the old date
        assert_eq!(stored[0].finished_date, None);
        assert_eq!(stored[0].notes.as_deref(), Some("on reread: meh"));
    }

    #[tokio::test]
    async fn test_rate_creates_profile_lazily() {
        let db = test_db();
        let reviews = ReviewService::new(db.clone());

        let named = seed_user(&db, "named@example.com", Some("Paul Atreides")).await;
        let nameless = seed_user(&db, "nameless@example.com", None).await;
        let book_id = seed_book(&db, "Dune").await;

        reviews.rate(Some(&named), &book_id, 5.0, None, None).await.unwrap();
        reviews.rate(Some(&nameless), &book_id, 3.0, None, None).await.unwrap();

        let profiles = db.profiles.all().await.unwrap();
        assert_eq!(profiles.len(), 2);
        assert_eq!(profiles[0].name, "Paul Atreides");
        assert_eq!(profiles[1].name, "Anonymous Reader");

        // A second rating reuses the profile instead of creating another
        let other_book = seed_book(&db, "Dune Messiah").await;
        reviews.rate(Some(&named), &other_book, 4.0, None, None).await.unwrap();
        assert_eq!(db.profiles.all().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_get_rating_null_filled_cases() {
        let db = test_db();
        let reviews = ReviewService::new(db.clone());

        let reader = seed_user(&db, "reader@example.com", None).await;
        let book_id = seed_book(&db, "Dune").await;

        let anonymous = reviews.get_rating(None, &book_id).await.unwrap();
        assert!(anonymous.rating.is_none());
        assert!(anonymous.finished_date.is_none());
        assert!(anonymous.notes.is_none());

        let unrated = reviews.get_rating(Some(&reader), &book_id).await.unwrap();
        assert!(unrated.rating.is_none());

        reviews
            .rate(Some(&reader), &book_id, 4.0, Some("2024-06-01".into()), Some("great".into()))
            .await
            .unwrap();

        let mine = reviews.get_rating(Some(&reader), &book_id).await.unwrap();
        assert_eq!(mine.rating, Some(4.0));
        assert_eq!(mine.finished_date.as_deref(), Some("2024-06-01"));
        assert_eq!(mine.notes.as_deref(), Some("great"));
    }

    #[tokio::test]
    async fn test_average_rating() {
        let db = test_db();
        let reviews = ReviewService::new(db.clone());

        let a = seed_user(&db, "a@example.com", None).await;
        let b = seed_user(&db, "b@example.com", None).await;
        let book_id = seed_book(&db, "Dune").await;

        assert_eq!(reviews.average_rating(&book_id).await.unwrap(), None);

        reviews.rate(Some(&a), &book_id, 3.0, None, None).await.unwrap();
        reviews.rate(Some(&b), &book_id, 5.0, None, None).await.unwrap();

        assert_eq!(reviews.average_rating(&book_id).await.unwrap(), Some(4.0));
    }

    #[tokio::test]
    async fn test_two_reader_scenario() {
        let db = test_db();
        let reviews = ReviewService::new(db.clone());

        let a = seed_user(&db, "a@example.com", Some("Reader A")).await;
        let c = seed_user(&db, "c@example.com", Some("Reader C")).await;
        let dune = seed_book(&db, "Dune").await;

        reviews
            .rate(Some(&a), &dune, 5.0, Some("2024-01-01".into()), None)
            .await
            .unwrap();
        reviews.rate(Some(&c), &dune, 3.0, None, None).await.unwrap();

        assert_eq!(reviews.average_rating(&dune).await.unwrap(), Some(4.0));

        let book_reviews = reviews.book_reviews(&dune).await.unwrap();
        assert_eq!(book_reviews.len(), 2);

        let names: Vec<&str> = book_reviews
            .iter()
            .map(|r| r.profile.as_ref().unwrap().name.as_str())
            .collect();
        assert_eq!(names, vec!["Reader A", "Reader C"]);
    }

    #[tokio::test]
    async fn test_reviews_carry_null_profile_for_profileless_rater() {
        let db = test_db();
        let reviews = ReviewService::new(db.clone());

        let reader = seed_user(&db, "reader@example.com", None).await;
        let book_id = seed_book(&db, "Dune").await;

        // A rating written without the service (no profile behind it)
        db.ratings
            .insert(RatingDoc::new(book_id.clone(), reader.clone(), None, 4.0, None, None))
            .await
            .unwrap();

        let book_reviews = reviews.book_reviews(&book_id).await.unwrap();
        assert_eq!(book_reviews.len(), 1);
        assert!(book_reviews[0].profile.is_none());
    }
}
