//! Book catalog service
//!
//! Adding books, listing them under the four sort keys, and the
//! non-cascading admin removal. The cascading variant lives on the admin
//! service; the two deletes have different cleanup semantics on purpose.

use std::collections::HashMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::db::schemas::BookDoc;
use crate::db::{Database, Filter};
use crate::types::Result;

use super::require_admin;

/// Sort key for the book listing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortBy {
    Title,
    Author,
    Rating,
    Finished,
}

/// Sort direction for the book listing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortOrder {
    Asc,
    Desc,
}

/// Book catalog operations
pub struct CatalogService {
    db: Arc<Database>,
}

impl CatalogService {
    /// Create a new catalog service
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    /// Add a book to the catalog. Returns the new book id.
    ///
    /// The caller's identity is noted for logging but not required;
    /// anonymous submissions are accepted. There is no duplicate-title
    /// check.
    pub async fn add(
        &self,
        caller: Option<&str>,
        title: String,
        author: String,
        pages: Option<u32>,
    ) -> Result<String> {
        if caller.is_none() {
            debug!(title = %title, "Anonymous book submission");
        }

        let book_id = self
            .db
            .books
            .insert(BookDoc::new(title.clone(), author, pages))
            .await?;

        info!(book_id = %book_id, title = %title, "Added book");

        Ok(book_id)
    }

    /// List all books under the requested sort.
    ///
    /// Average ratings are computed over everyone's ratings; finished
    /// dates come from the caller's own ratings only. Both are derived
    /// for ordering and not returned.
    pub async fn list(
        &self,
        caller: Option<&str>,
        sort_by: SortBy,
        sort_order: SortOrder,
    ) -> Result<Vec<BookDoc>> {
        let mut books = self.db.books.all().await?;
        let all_ratings = self.db.ratings.all().await?;
        let user_ratings = match caller {
            Some(user_id) => {
                self.db
                    .ratings
                    .find_many(Filter::new().eq("user_id", user_id))
                    .await?
            }
            None => Vec::new(),
        };

        // Average rating per book; unrated books stay out of the map
        let mut avg_ratings: HashMap<String, f64> = HashMap::new();
        for book in &books {
            let ratings: Vec<f64> = all_ratings
                .iter()
                .filter(|r| r.book_id == book.id)
                .map(|r| r.rating)
                .collect();
            if !ratings.is_empty() {
                let avg = ratings.iter().sum::<f64>() / ratings.len() as f64;
                avg_ratings.insert(book.id.clone(), avg);
            }
        }

        // The caller's finished dates
        let mut finished_dates: HashMap<String, String> = HashMap::new();
        for rating in &user_ratings {
            if let Some(date) = &rating.finished_date {
                finished_dates.insert(rating.book_id.clone(), date.clone());
            }
        }

        match sort_by {
            SortBy::Title => books.sort_by(|a, b| a.title.cmp(&b.title)),
            SortBy::Author => books.sort_by(|a, b| a.author.cmp(&b.author)),
            SortBy::Rating => books.sort_by(|a, b| {
                let rating_a = avg_ratings.get(&a.id).copied().unwrap_or(0.0);
                let rating_b = avg_ratings.get(&b.id).copied().unwrap_or(0.0);
                rating_b.total_cmp(&rating_a) // higher ratings first
            }),
            SortBy::Finished => books.sort_by(|a, b| {
                let date_a = finished_dates.get(&a.id).map(String::as_str).unwrap_or("");
                let date_b = finished_dates.get(&b.id).map(String::as_str).unwrap_or("");
                date_b.cmp(date_a) // recent dates first
            }),
        }

        // "desc" reverses the sorted sequence wholesale, also for the
        // rating/finished keys whose comparators already run descending,
        // so desc re-ascends those two
        if sort_order == SortOrder::Desc {
            books.reverse();
        }

        Ok(books)
    }

    /// Remove a book without touching its ratings. Admin only.
    pub async fn remove(&self, caller: Option<&str>, book_id: &str) -> Result<()> {
        let admin = require_admin(&self.db, caller).await?;

        self.db.books.delete(book_id).await?;

        info!(admin = %admin, book_id = %book_id, "Removed book");

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::schemas::RatingDoc;
    use crate::services::testing::{seed_admin, seed_user, test_db};
    use crate::types::ShelfmarkError;

    async fn seed_book(db: &Database, title: &str, author: &str) -> String {
        db.books
            .insert(BookDoc::new(title.to_string(), author.to_string(), None))
            .await
            .unwrap()
    }

    async fn seed_rating(db: &Database, book_id: &str, user_id: &str, rating: f64) {
        db.ratings
            .insert(RatingDoc::new(
                book_id.to_string(),
                user_id.to_string(),
                None,
                rating,
                None,
                None,
            ))
            .await
            .unwrap();
    }

    fn titles(books: &[BookDoc]) -> Vec<&str> {
        books.iter().map(|b| b.title.as_str()).collect()
    }

    #[tokio::test]
    async fn test_add_without_identity() {
        let db = test_db();
        let catalog = CatalogService::new(db.clone());

        let book_id = catalog
            .add(None, "Dune".into(), "Frank Herbert".into(), Some(412))
            .await
            .unwrap();

        let book = db.books.get(&book_id).await.unwrap().unwrap();
        assert_eq!(book.title, "Dune");
        assert_eq!(book.pages, Some(412));
    }

    #[tokio::test]
    async fn test_list_sorts_by_title_and_desc_reverses() {
        let db = test_db();
        let catalog = CatalogService::new(db.clone());

        seed_book(&db, "Neuromancer", "William Gibson").await;
        seed_book(&db, "Dune", "Frank Herbert").await;
        seed_book(&db, "Hyperion", "Dan Simmons").await;

        let asc = catalog
            .list(None, SortBy::Title, SortOrder::Asc)
            .await
            .unwrap();
        assert_eq!(titles(&asc), vec!["Dune", "Hyperion", "Neuromancer"]);

        let desc = catalog
            .list(None, SortBy::Title, SortOrder::Desc)
            .await
            .unwrap();
        assert_eq!(titles(&desc), vec!["Neuromancer", "Hyperion", "Dune"]);
    }

    #[tokio::test]
    async fn test_list_sorts_by_author() {
        let db = test_db();
        let catalog = CatalogService::new(db.clone());

        seed_book(&db, "Neuromancer", "William Gibson").await;
        seed_book(&db, "Hyperion", "Dan Simmons").await;
        seed_book(&db, "Dune", "Frank Herbert").await;

        let asc = catalog
            .list(None, SortBy::Author, SortOrder::Asc)
            .await
            .unwrap();
        assert_eq!(titles(&asc), vec!["Hyperion", "Dune", "Neuromancer"]);
    }

    #[tokio::test]
    async fn test_list_rating_sort_puts_highest_first() {
        let db = test_db();
        let catalog = CatalogService::new(db.clone());

        let reader_a = seed_user(&db, "a@example.com", None).await;
        let reader_b = seed_user(&db, "b@example.com", None).await;

        let low = seed_book(&db, "Low", "Author").await;
        seed_book(&db, "Unrated", "Author").await;
        let high = seed_book(&db, "High", "Author").await;

        seed_rating(&db, &low, &reader_a, 2.0).await;
        seed_rating(&db, &high, &reader_a, 5.0).await;
        seed_rating(&db, &high, &reader_b, 4.0).await;

        let asc = catalog
            .list(None, SortBy::Rating, SortOrder::Asc)
            .await
            .unwrap();
        // Comparator is descending; "asc" leaves it that way and missing
        // averages count as zero
        assert_eq!(titles(&asc), vec!["High", "Low", "Unrated"]);

        // "desc" reverses the already-descending order back to ascending
        let desc = catalog
            .list(None, SortBy::Rating, SortOrder::Desc)
            .await
            .unwrap();
        assert_eq!(titles(&desc), vec!["Unrated", "Low", "High"]);
    }

    #[tokio::test]
    async fn test_list_finished_sort_uses_caller_dates_only() {
        let db = test_db();
        let catalog = CatalogService::new(db.clone());

        let me = seed_user(&db, "me@example.com", None).await;
        let other = seed_user(&db, "other@example.com", None).await;

        let old = seed_book(&db, "Old Read", "Author").await;
        let recent = seed_book(&db, "Recent Read", "Author").await;
        let unread = seed_book(&db, "Unread", "Author").await;

        db.ratings
            .insert(RatingDoc::new(
                old.clone(),
                me.clone(),
                None,
                3.0,
                Some("2023-05-01".into()),
                None,
            ))
            .await
            .unwrap();
        db.ratings
            .insert(RatingDoc::new(
                recent.clone(),
                me.clone(),
                None,
                4.0,
                Some("2024-01-01".into()),
                None,
            ))
            .await
            .unwrap();
        // Another reader's finished date must not affect my ordering
        db.ratings
            .insert(RatingDoc::new(
                unread.clone(),
                other.clone(),
                None,
                5.0,
                Some("2025-01-01".into()),
                None,
            ))
            .await
            .unwrap();

        let listed = catalog
            .list(Some(&me), SortBy::Finished, SortOrder::Asc)
            .await
            .unwrap();
        // Recent dates first, books without my finished date last
        assert_eq!(titles(&listed), vec!["Recent Read", "Old Read", "Unread"]);

        // Anonymous listing has no finished dates at all; creation order
        // survives the stable sort
        let anonymous = catalog
            .list(None, SortBy::Finished, SortOrder::Asc)
            .await
            .unwrap();
        assert_eq!(titles(&anonymous), vec!["Old Read", "Recent Read", "Unread"]);
    }

    #[tokio::test]
    async fn test_remove_is_admin_gated_and_keeps_ratings() {
        let db = test_db();
        let catalog = CatalogService::new(db.clone());

        let root = seed_user(&db, "root@example.com", None).await;
        seed_admin(&db, &root).await;
        let reader = seed_user(&db, "reader@example.com", None).await;

        let book_id = seed_book(&db, "Dune", "Frank Herbert").await;
        seed_rating(&db, &book_id, &reader, 5.0).await;

        let err = catalog.remove(Some(&reader), &book_id).await.unwrap_err();
        assert!(matches!(err, ShelfmarkError::Forbidden(_)));

        catalog.remove(Some(&root), &book_id).await.unwrap();
        assert!(db.books.get(&book_id).await.unwrap().is_none());

        // Unlike the cascading delete, ratings stay behind
        assert_eq!(db.ratings.all().await.unwrap().len(), 1);
    }
}
