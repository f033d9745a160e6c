//! Reader profile routes
//!
//! - `GET /api/profiles/{user_id}` - Fetch a profile (JSON null when absent)
//! - `PUT /api/profiles` - Create or replace the caller's profile

use bytes::Bytes;
use http_body_util::Full;
use hyper::body::Incoming;
use hyper::{Method, Request, Response};
use serde::{Deserialize, Serialize};

use crate::server::AppState;

use super::response::{self, bad_request, error_response, not_found, ok};
use super::{caller_id, parse_json_body};

#[derive(Debug, Deserialize)]
pub struct UpdateProfileRequest {
    pub name: String,
    #[serde(default)]
    pub bio: Option<String>,
    #[serde(default)]
    pub favorite_genres: Option<Vec<String>>,
}

#[derive(Debug, Serialize)]
pub struct UpdateProfileResponse {
    pub profile_id: String,
}

/// Route `/api/profiles...` requests
pub async fn handle_profile_request(
    req: Request<Incoming>,
    state: &AppState,
    path: &str,
) -> Response<Full<Bytes>> {
    let method = req.method().clone();

    match (method, path) {
        (Method::PUT, "/api/profiles") => handle_update(req, state).await,
        (Method::GET, p) if p.starts_with("/api/profiles/") => {
            let user_id = p.strip_prefix("/api/profiles/").unwrap_or("");
            if user_id.is_empty() || user_id.contains('/') {
                return not_found("Not Found");
            }
            let user_id = user_id.to_string();
            handle_get(state, &user_id).await
        }
        _ => response::method_not_allowed(),
    }
}

/// GET /api/profiles/{user_id}
///
/// A missing profile is data, not an error: the body is JSON null with
/// 200, never 404.
async fn handle_get(state: &AppState, user_id: &str) -> Response<Full<Bytes>> {
    match state.profiles.get(user_id).await {
        Ok(profile) => ok(&profile),
        Err(e) => error_response(e),
    }
}

/// PUT /api/profiles
async fn handle_update(req: Request<Incoming>, state: &AppState) -> Response<Full<Bytes>> {
    let caller = caller_id(&req, state);

    let body: UpdateProfileRequest = match parse_json_body(req).await {
        Ok(b) => b,
        Err(e) => return bad_request(&e.to_string()),
    };

    match state
        .profiles
        .update(caller.as_deref(), body.name, body.bio, body.favorite_genres)
        .await
    {
        Ok(profile_id) => ok(&UpdateProfileResponse { profile_id }),
        Err(e) => error_response(e),
    }
}
