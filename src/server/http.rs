//! HTTP server implementation
//!
//! Uses hyper http1 with TokioIo for async handling; one service
//! function dispatches on method and path.

use bytes::Bytes;
use http_body_util::Full;
use hyper::body::Incoming;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Method, Request, Response};
use hyper_util::rt::TokioIo;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{debug, info, warn};

use crate::auth::JwtValidator;
use crate::config::Args;
use crate::db::Database;
use crate::routes::{self, response};
use crate::services::{AdminService, CatalogService, ProfileService, ReviewService};
use crate::types::Result;

/// Shared application state
pub struct AppState {
    pub args: Args,
    pub db: Arc<Database>,
    pub jwt: JwtValidator,
    pub admin: AdminService,
    pub catalog: CatalogService,
    pub reviews: ReviewService,
    pub profiles: ProfileService,
}

impl AppState {
    /// Create application state over a prepared database
    pub fn new(args: Args, db: Arc<Database>, jwt: JwtValidator) -> Self {
        Self {
            args,
            jwt,
            admin: AdminService::new(db.clone()),
            catalog: CatalogService::new(db.clone()),
            reviews: ReviewService::new(db.clone()),
            profiles: ProfileService::new(db.clone()),
            db,
        }
    }
}

/// Start the HTTP server
pub async fn run(state: Arc<AppState>) -> Result<()> {
    let listener = TcpListener::bind(state.args.listen).await?;

    info!(addr = %state.args.listen, "Shelfmark listening");

    if state.args.dev_mode {
        warn!("Development mode enabled - using the built-in JWT secret");
    }

    loop {
        let (stream, remote_addr) = listener.accept().await?;
        let io = TokioIo::new(stream);
        let state = state.clone();

        tokio::spawn(async move {
            let service = service_fn(move |req| {
                let state = state.clone();
                async move { handle_request(req, state).await }
            });

            if let Err(err) = http1::Builder::new().serve_connection(io, service).await {
                warn!(addr = %remote_addr, error = %err, "Connection error");
            }
        });
    }
}

/// Route requests to handlers
async fn handle_request(
    req: Request<Incoming>,
    state: Arc<AppState>,
) -> std::result::Result<Response<Full<Bytes>>, hyper::Error> {
    let path = req.uri().path().to_string();
    let method = req.method().clone();

    debug!(method = %method, path = %path, "Incoming request");

    let response = match (method, path.as_str()) {
        (Method::GET, "/health") | (Method::GET, "/healthz") => {
            routes::health_check(&state).await
        }
        (Method::GET, "/version") => routes::version_info(),

        (Method::OPTIONS, _) => response::cors_preflight(),

        (_, p) if p.starts_with("/api/auth/") => {
            routes::handle_auth_request(req, &state, &path).await
        }
        (_, p) if p.starts_with("/api/admin") => {
            routes::handle_admin_request(req, &state, &path).await
        }
        (_, p) if p == "/api/books" || p.starts_with("/api/books/") => {
            routes::handle_book_request(req, &state, &path).await
        }
        (_, p) if p == "/api/profiles" || p.starts_with("/api/profiles/") => {
            routes::handle_profile_request(req, &state, &path).await
        }

        _ => response::not_found("Not Found"),
    };

    Ok(response)
}
