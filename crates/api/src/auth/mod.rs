//! Authentication primitives.
//!
//! - [`password`] -- Argon2id password hashing and verification.
//! - [`tokens`] -- token lifetimes and `Authorization` header parsing.

pub mod password;
pub mod tokens;
