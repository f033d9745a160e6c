//! Authentication for Shelfmark
//!
//! Provides:
//! - JWT token generation and validation
//! - Caller identity resolution (user id or anonymous)
//! - Password hashing with Argon2

pub mod jwt;
pub mod password;

pub use jwt::{extract_token_from_header, Caller, Claims, JwtValidator, TokenInput};
pub use password::{hash_password, verify_password};
