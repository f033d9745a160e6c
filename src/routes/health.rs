//! Health and version endpoints

use bytes::Bytes;
use http_body_util::Full;
use hyper::Response;

use crate::server::AppState;

use super::response::ok;

/// GET /health
pub async fn health_check(state: &AppState) -> Response<Full<Bytes>> {
    let body = serde_json::json!({
        "status": "ok",
        "persistent": state.db.is_persistent(),
    });
    ok(&body)
}

/// GET /version
pub fn version_info() -> Response<Full<Bytes>> {
    let body = serde_json::json!({
        "name": env!("CARGO_PKG_NAME"),
        "version": env!("CARGO_PKG_VERSION"),
    });
    ok(&body)
}
