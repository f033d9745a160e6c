//! Service layer for Shelfmark
//!
//! One service per component: admin authorization, book catalog, rating
//! and review, reader profiles. Services only interact through the shared
//! document collections, never through each other.

pub mod admin;
pub mod catalog;
pub mod profiles;
pub mod reviews;

pub use admin::AdminService;
pub use catalog::{CatalogService, SortBy, SortOrder};
pub use profiles::ProfileService;
pub use reviews::{RatingView, Review, ReviewService};

use crate::db::{Database, Filter};
use crate::types::{Result, ShelfmarkError};

/// Check that the caller is signed in and a member of the admin set.
/// Returns the caller's user id.
pub(crate) async fn require_admin<'a>(
    db: &Database,
    caller: Option<&'a str>,
) -> Result<&'a str> {
    let user_id = caller.ok_or_else(|| {
        ShelfmarkError::Unauthenticated("admin operations require a signed-in caller".into())
    })?;

    let membership = db
        .admins
        .find_one(Filter::new().eq("user_id", user_id))
        .await?;

    if membership.is_none() {
        return Err(ShelfmarkError::Forbidden(
            "caller is not an admin".into(),
        ));
    }

    Ok(user_id)
}

#[cfg(test)]
pub(crate) mod testing {
    use std::sync::Arc;

    use crate::db::schemas::{AdminDoc, UserDoc};
    use crate::db::Database;

    pub fn test_db() -> Arc<Database> {
        Arc::new(Database::memory())
    }

    pub async fn seed_user(db: &Database, email: &str, name: Option<&str>) -> String {
        db.users
            .insert(UserDoc::new(
                email.to_string(),
                name.map(str::to_string),
                "unused-test-hash".to_string(),
            ))
            .await
            .unwrap()
    }

    pub async fn seed_admin(db: &Database, user_id: &str) {
        db.admins
            .insert(AdminDoc::new(user_id.to_string()))
            .await
            .unwrap();
    }
}
