//! Well-known permission codes.
//!
//! These must match the seed data in `20261001000005_create_permissions_table.sql`.

pub const EPISODES_READ: &str = "episodes:read";
pub const EPISODES_WRITE: &str = "episodes:write";

/// The set of permission codes held by one user.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Permissions(Vec<String>);

impl Permissions {
    pub fn includes(&self, code: &str) -> bool {
        self.0.iter().any(|c| c == code)
    }

    pub fn codes(&self) -> &[String] {
        &self.0
    }
}

impl From<Vec<String>> for Permissions {
    fn from(codes: Vec<String>) -> Self {
        Self(codes)
    }
}
