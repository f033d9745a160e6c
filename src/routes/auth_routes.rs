//! HTTP routes for authentication
//!
//! Provides REST API endpoints for reader accounts:
//! - `POST /api/auth/register` - Create an account, get a JWT token
//! - `POST /api/auth/login`    - Authenticate and get a JWT token
//! - `GET  /api/auth/me`       - Current user info from token

use bytes::Bytes;
use http_body_util::Full;
use hyper::body::Incoming;
use hyper::{Method, Request, Response};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::auth::{hash_password, verify_password, TokenInput};
use crate::db::schemas::UserDoc;
use crate::db::Filter;
use crate::server::AppState;
use crate::types::ShelfmarkError;

use super::response::{self, bad_request, created, error_response, ok};
use super::{caller_id, parse_json_body};

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub token: String,
    pub user_id: String,
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Token lifetime in seconds
    pub expires_in: u64,
}

#[derive(Debug, Serialize)]
pub struct MeResponse {
    pub user_id: String,
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

/// Route `/api/auth/...` requests
pub async fn handle_auth_request(
    req: Request<Incoming>,
    state: &AppState,
    path: &str,
) -> Response<Full<Bytes>> {
    let method = req.method().clone();

    match (method, path) {
        (Method::POST, "/api/auth/register") => handle_register(req, state).await,
        (Method::POST, "/api/auth/login") => handle_login(req, state).await,
        (Method::GET, "/api/auth/me") => handle_me(&req, state).await,
        _ => response::method_not_allowed(),
    }
}

/// POST /api/auth/register
///
/// Flow:
/// 1. Validate required fields
/// 2. Reject an already-registered email with Conflict
/// 3. Hash the password with argon2
/// 4. Store the user and return a JWT token
async fn handle_register(req: Request<Incoming>, state: &AppState) -> Response<Full<Bytes>> {
    let body: RegisterRequest = match parse_json_body(req).await {
        Ok(b) => b,
        Err(e) => return bad_request(&e.to_string()),
    };

    if body.email.is_empty() || body.password.is_empty() {
        return bad_request("Missing required fields: email, password");
    }

    let existing = match state
        .db
        .users
        .find_one(Filter::new().eq("email", body.email.as_str()))
        .await
    {
        Ok(user) => user,
        Err(e) => return error_response(e),
    };
    if existing.is_some() {
        return error_response(ShelfmarkError::Conflict(format!(
            "email {} is already registered",
            body.email
        )));
    }

    let password_hash = match hash_password(&body.password) {
        Ok(hash) => hash,
        Err(e) => return error_response(e),
    };

    let user = UserDoc::new(body.email.clone(), body.name.clone(), password_hash);
    let user_id = match state.db.users.insert(user).await {
        Ok(id) => id,
        Err(e) => return error_response(e),
    };

    let token = match state.jwt.generate_token(TokenInput {
        user_id: user_id.clone(),
        email: body.email.clone(),
    }) {
        Ok(token) => token,
        Err(e) => return error_response(e),
    };

    info!(user_id = %user_id, "Registered reader account");

    created(&AuthResponse {
        token,
        user_id,
        email: body.email,
        name: body.name,
        expires_in: state.jwt.expiry_seconds(),
    })
}

/// POST /api/auth/login
async fn handle_login(req: Request<Incoming>, state: &AppState) -> Response<Full<Bytes>> {
    let body: LoginRequest = match parse_json_body(req).await {
        Ok(b) => b,
        Err(e) => return bad_request(&e.to_string()),
    };

    let user = match state
        .db
        .users
        .find_one(Filter::new().eq("email", body.email.as_str()))
        .await
    {
        Ok(Some(user)) => user,
        // Same error for unknown email and wrong password
        Ok(None) => {
            return error_response(ShelfmarkError::Auth("invalid email or password".into()))
        }
        Err(e) => return error_response(e),
    };

    match verify_password(&body.password, &user.password_hash) {
        Ok(true) => {}
        Ok(false) => {
            return error_response(ShelfmarkError::Auth("invalid email or password".into()))
        }
        Err(e) => return error_response(e),
    }

    let token = match state.jwt.generate_token(TokenInput {
        user_id: user.id.clone(),
        email: user.email.clone(),
    }) {
        Ok(token) => token,
        Err(e) => return error_response(e),
    };

    info!(user_id = %user.id, "Reader logged in");

    ok(&AuthResponse {
        token,
        user_id: user.id,
        email: user.email,
        name: user.name,
        expires_in: state.jwt.expiry_seconds(),
    })
}

/// GET /api/auth/me
async fn handle_me(req: &Request<Incoming>, state: &AppState) -> Response<Full<Bytes>> {
    let Some(user_id) = caller_id(req, state) else {
        return error_response(ShelfmarkError::Unauthenticated(
            "a valid bearer token is required".into(),
        ));
    };

    match state.db.users.get(&user_id).await {
        Ok(Some(user)) => ok(&MeResponse {
            user_id: user.id,
            email: user.email,
            name: user.name,
        }),
        Ok(None) => error_response(ShelfmarkError::NotFound("user no longer exists".into())),
        Err(e) => error_response(e),
    }
}
