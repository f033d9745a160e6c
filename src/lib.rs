//! Shelfmark - community book catalog and review service
//!
//! Readers catalog books, rate and review them, and keep a reader
//! profile; a small admin set can promote other users and remove books.
//! Records live in MongoDB collections (or an in-process store in dev
//! mode), and every operation is exposed as a JSON-over-HTTP procedure.
//!
//! ## Components
//!
//! - **Auth**: JWT identity resolution; argon2 credentials
//! - **Catalog**: add, list (sorted), and remove books
//! - **Reviews**: per-(book, user) rating upserts and aggregation
//! - **Profiles**: per-user reader profile, lazily created
//! - **Admin**: the admin set gating privileged mutations

pub mod auth;
pub mod config;
pub mod db;
pub mod routes;
pub mod server;
pub mod services;
pub mod types;

pub use config::Args;
pub use server::{run, AppState};
pub use types::{Result, ShelfmarkError};
