//! Admin routes
//!
//! - `GET    /api/admin/me` - Whether the caller is an admin
//! - `POST   /api/admin/admins` - Promote a user by email
//! - `DELETE /api/admin/books/{id}` - Delete a book and all its ratings

use bytes::Bytes;
use http_body_util::Full;
use hyper::body::Incoming;
use hyper::{Method, Request, Response};
use serde::{Deserialize, Serialize};

use crate::server::AppState;

use super::response::{self, bad_request, created, error_response, no_content, not_found, ok};
use super::{caller_id, parse_json_body};

#[derive(Debug, Deserialize)]
pub struct MakeAdminRequest {
    pub email: String,
}

#[derive(Debug, Serialize)]
pub struct MakeAdminResponse {
    pub admin_id: String,
}

/// Route `/api/admin/...` requests
pub async fn handle_admin_request(
    req: Request<Incoming>,
    state: &AppState,
    path: &str,
) -> Response<Full<Bytes>> {
    let method = req.method().clone();

    match (method, path) {
        (Method::GET, "/api/admin/me") => handle_is_admin(&req, state).await,
        (Method::POST, "/api/admin/admins") => handle_make_admin(req, state).await,
        (Method::DELETE, p) if p.starts_with("/api/admin/books/") => {
            let book_id = p.strip_prefix("/api/admin/books/").unwrap_or("");
            if book_id.is_empty() || book_id.contains('/') {
                return not_found("Not Found");
            }
            let book_id = book_id.to_string();
            handle_delete_book(&req, state, &book_id).await
        }
        _ => response::method_not_allowed(),
    }
}

/// GET /api/admin/me
///
/// Serves a bare boolean; anonymous callers are never admins.
async fn handle_is_admin(req: &Request<Incoming>, state: &AppState) -> Response<Full<Bytes>> {
    let caller = caller_id(req, state);

    match state.admin.is_admin(caller.as_deref()).await {
        Ok(is_admin) => ok(&is_admin),
        Err(e) => error_response(e),
    }
}

/// POST /api/admin/admins
async fn handle_make_admin(req: Request<Incoming>, state: &AppState) -> Response<Full<Bytes>> {
    let caller = caller_id(&req, state);

    let body: MakeAdminRequest = match parse_json_body(req).await {
        Ok(b) => b,
        Err(e) => return bad_request(&e.to_string()),
    };

    match state.admin.make_admin(caller.as_deref(), &body.email).await {
        Ok(admin_id) => created(&MakeAdminResponse { admin_id }),
        Err(e) => error_response(e),
    }
}

/// DELETE /api/admin/books/{id}
///
/// The cascading delete: every rating of the book goes with it.
async fn handle_delete_book(
    req: &Request<Incoming>,
    state: &AppState,
    book_id: &str,
) -> Response<Full<Bytes>> {
    let caller = caller_id(req, state);

    match state.admin.delete_book(caller.as_deref(), book_id).await {
        Ok(()) => no_content(),
        Err(e) => error_response(e),
    }
}
