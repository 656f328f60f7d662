//! Request admission middleware and authorization extractors.
//!
//! - [`rate_limit::rate_limit`] -- Refuses clients that exhausted their token bucket.
//! - [`auth::authenticate`] -- Resolves the bearer token into a [`auth::CurrentUser`].
//! - [`rbac::RequireAuthenticated`] -- Requires a non-anonymous caller.
//! - [`rbac::RequireActivated`] -- Requires an activated account.
//! - [`rbac::RequirePermission`] -- Requires a permission code.

pub mod auth;
pub mod rate_limit;
pub mod rbac;
