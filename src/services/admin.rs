//! Admin authorization service
//!
//! Membership in the admin set gates book removal and promoting other
//! users. The very first admin is seeded out-of-band with `seed-admin`;
//! no runtime path creates it.

use std::sync::Arc;

use tracing::info;

use crate::db::schemas::AdminDoc;
use crate::db::{Database, Filter};
use crate::types::{Result, ShelfmarkError};

use super::require_admin;

/// Admin set membership and privileged mutations
pub struct AdminService {
    db: Arc<Database>,
}

impl AdminService {
    /// Create a new admin service
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    /// Whether the caller is an admin. Anonymous callers never are.
    pub async fn is_admin(&self, caller: Option<&str>) -> Result<bool> {
        let Some(user_id) = caller else {
            return Ok(false);
        };

        let membership = self
            .db
            .admins
            .find_one(Filter::new().eq("user_id", user_id))
            .await?;

        Ok(membership.is_some())
    }

    /// Promote the user with the given email into the admin set.
    ///
    /// Fails `Unauthenticated` for anonymous callers, `Forbidden` for
    /// non-admins, `NotFound` when no user has that email, and `Conflict`
    /// when the target is already an admin.
    pub async fn make_admin(&self, caller: Option<&str>, email: &str) -> Result<String> {
        let promoter = require_admin(&self.db, caller).await?;

        let target = self
            .db
            .users
            .find_one(Filter::new().eq("email", email))
            .await?
            .ok_or_else(|| ShelfmarkError::NotFound(format!("no user with email {}", email)))?;

        let existing = self
            .db
            .admins
            .find_one(Filter::new().eq("user_id", target.id.as_str()))
            .await?;

        if existing.is_some() {
            return Err(ShelfmarkError::Conflict(format!(
                "user {} is already an admin",
                email
            )));
        }

        let admin_id = self.db.admins.insert(AdminDoc::new(target.id.clone())).await?;

        info!(promoter = %promoter, target = %target.id, "Promoted user to admin");

        Ok(admin_id)
    }

    /// Delete a book and every rating referencing it.
    ///
    /// Rating deletes are issued one by one before the book delete; there
    /// is no transaction around the sequence.
    pub async fn delete_book(&self, caller: Option<&str>, book_id: &str) -> Result<()> {
        let admin = require_admin(&self.db, caller).await?;

        let ratings = self
            .db
            .ratings
            .find_many(Filter::new().eq("book_id", book_id))
            .await?;

        let rating_count = ratings.len();
        for rating in ratings {
            self.db.ratings.delete(&rating.id).await?;
        }

        self.db.books.delete(book_id).await?;

        info!(
            admin = %admin,
            book_id = %book_id,
            ratings_removed = rating_count,
            "Deleted book with its ratings"
        );

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::schemas::{BookDoc, RatingDoc};
    use crate::services::testing::{seed_admin, seed_user, test_db};
    use crate::types::ShelfmarkError;

    #[tokio::test]
    async fn test_is_admin_false_without_membership() {
        let db = test_db();
        let admins = AdminService::new(db.clone());

        let user_id = seed_user(&db, "reader@example.com", Some("Reader")).await;

        assert!(!admins.is_admin(None).await.unwrap());
        assert!(!admins.is_admin(Some(&user_id)).await.unwrap());

        seed_admin(&db, &user_id).await;
        assert!(admins.is_admin(Some(&user_id)).await.unwrap());
    }

    #[tokio::test]
    async fn test_make_admin_requires_identity_and_membership() {
        let db = test_db();
        let admins = AdminService::new(db.clone());

        let outsider = seed_user(&db, "outsider@example.com", None).await;
        seed_user(&db, "target@example.com", None).await;

        let err = admins.make_admin(None, "target@example.com").await.unwrap_err();
        assert!(matches!(err, ShelfmarkError::Unauthenticated(_)));

        let err = admins
            .make_admin(Some(&outsider), "target@example.com")
            .await
            .unwrap_err();
        assert!(matches!(err, ShelfmarkError::Forbidden(_)));
    }

    #[tokio::test]
    async fn test_make_admin_unknown_email() {
        let db = test_db();
        let admins = AdminService::new(db.clone());

        let root = seed_user(&db, "root@example.com", None).await;
        seed_admin(&db, &root).await;

        let err = admins
            .make_admin(Some(&root), "nobody@example.com")
            .await
            .unwrap_err();
        assert!(matches!(err, ShelfmarkError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_make_admin_twice_conflicts() {
        let db = test_db();
        let admins = AdminService::new(db.clone());

        let root = seed_user(&db, "root@example.com", None).await;
        seed_admin(&db, &root).await;
        let target = seed_user(&db, "target@example.com", None).await;

        admins
            .make_admin(Some(&root), "target@example.com")
            .await
            .unwrap();
        assert!(admins.is_admin(Some(&target)).await.unwrap());

        let err = admins
            .make_admin(Some(&root), "target@example.com")
            .await
            .unwrap_err();
        assert!(matches!(err, ShelfmarkError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_delete_book_cascades_ratings() {
        let db = test_db();
        let admins = AdminService::new(db.clone());

        let root = seed_user(&db, "root@example.com", None).await;
        seed_admin(&db, &root).await;
        let reader = seed_user(&db, "reader@example.com", None).await;

        let book_id = db
            .books
            .insert(BookDoc::new("Dune".into(), "Frank Herbert".into(), None))
            .await
            .unwrap();
        let other_book = db
            .books
            .insert(BookDoc::new("Hyperion".into(), "Dan Simmons".into(), None))
            .await
            .unwrap();

        db.ratings
            .insert(RatingDoc::new(book_id.clone(), reader.clone(), None, 5.0, None, None))
            .await
            .unwrap();
        db.ratings
            .insert(RatingDoc::new(book_id.clone(), root.clone(), None, 3.0, None, None))
            .await
            .unwrap();
        db.ratings
            .insert(RatingDoc::new(other_book.clone(), reader.clone(), None, 4.0, None, None))
            .await
            .unwrap();

        admins.delete_book(Some(&root), &book_id).await.unwrap();

        assert!(db.books.get(&book_id).await.unwrap().is_none());
        let remaining = db.ratings.all().await.unwrap();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].book_id, other_book);
    }

    #[tokio::test]
    async fn test_delete_book_forbidden_leaves_data() {
        let db = test_db();
        let admins = AdminService::new(db.clone());

        let reader = seed_user(&db, "reader@example.com", None).await;
        let book_id = db
            .books
            .insert(BookDoc::new("Dune".into(), "Frank Herbert".into(), None))
            .await
            .unwrap();
        db.ratings
            .insert(RatingDoc::new(book_id.clone(), reader.clone(), None, 5.0, None, None))
            .await
            .unwrap();

        let err = admins.delete_book(Some(&reader), &book_id).await.unwrap_err();
        assert!(matches!(err, ShelfmarkError::Forbidden(_)));

        assert!(db.books.get(&book_id).await.unwrap().is_some());
        assert_eq!(db.ratings.all().await.unwrap().len(), 1);
    }
}
