//! Shared types for Shelfmark

pub mod error;

pub use error::{Result, ShelfmarkError};
