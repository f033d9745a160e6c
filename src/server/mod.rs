//! HTTP server for Shelfmark

pub mod http;

pub use http::{run, AppState};
