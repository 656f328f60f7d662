//! Pure domain logic shared by the store and HTTP layers.
//!
//! Nothing in this crate performs I/O: field validation, pagination and sort
//! safelisting, permission codes, and opaque token generation all live here so
//! they can be unit tested without a database or a runtime.

pub mod error;
pub mod filters;
pub mod permissions;
pub mod tokens;
pub mod types;
pub mod validator;
