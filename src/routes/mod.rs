//! HTTP routes for Shelfmark

pub mod admin;
pub mod auth_routes;
pub mod books;
pub mod health;
pub mod profiles;
pub mod response;

pub use admin::handle_admin_request;
pub use auth_routes::handle_auth_request;
pub use books::handle_book_request;
pub use health::{health_check, version_info};
pub use profiles::handle_profile_request;

use http_body_util::BodyExt;
use hyper::body::Incoming;
use hyper::Request;
use serde::de::DeserializeOwned;

use crate::server::AppState;
use crate::types::{Result, ShelfmarkError};

/// Largest accepted JSON request body
const MAX_BODY_BYTES: usize = 16 * 1024;

/// Read and deserialize a JSON request body
pub(crate) async fn parse_json_body<T: DeserializeOwned>(req: Request<Incoming>) -> Result<T> {
    let body = req
        .collect()
        .await
        .map_err(|e| ShelfmarkError::Http(format!("Failed to read body: {}", e)))?;

    let bytes = body.to_bytes();
    if bytes.len() > MAX_BODY_BYTES {
        return Err(ShelfmarkError::Http("Request body too large".into()));
    }

    serde_json::from_slice(&bytes)
        .map_err(|e| ShelfmarkError::Http(format!("Invalid JSON: {}", e)))
}

/// Resolve the caller's user id from the Authorization header, or None
/// for anonymous requests
pub(crate) fn caller_id(req: &Request<Incoming>, state: &AppState) -> Option<String> {
    let header = req
        .headers()
        .get(hyper::header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok());

    state.jwt.resolve_caller(header).map(|caller| caller.user_id)
}
