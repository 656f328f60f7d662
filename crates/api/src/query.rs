//! Raw query-string access for listing endpoints.

use std::collections::HashMap;

use axum::extract::{FromRequestParts, Query};
use axum::http::request::Parts;
use episodic_core::filters::Filters;
use episodic_core::types::DbId;
use episodic_core::validator::Validator;
use serde::Deserialize;

use crate::error::AppError;

/// Every query parameter as a string, read through typed helpers.
///
/// Parsing never fails at extraction time; malformed pagination values are
/// reported through [`QueryParams::filters`] as validation errors instead.
#[derive(Debug, Default, Deserialize)]
#[serde(transparent)]
pub struct QueryParams(HashMap<String, String>);

impl QueryParams {
    /// The value of `key`, or `""` when absent.
    pub fn string(&self, key: &str) -> String {
        self.0.get(key).cloned().unwrap_or_default()
    }

    /// Comma-separated values of `key`, trimmed, empties dropped.
    pub fn csv(&self, key: &str) -> Vec<String> {
        self.0
            .get(key)
            .map(|raw| {
                raw.split(',')
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default()
    }

    /// `key` as a positive id, or `None` when absent. Anything else is
    /// recorded against `key` in `v`.
    pub fn optional_id(&self, key: &str, v: &mut Validator) -> Option<DbId> {
        let raw = self.0.get(key).map(|s| s.trim()).filter(|s| !s.is_empty())?;
        match raw.parse::<DbId>() {
            Ok(id) if id > 0 => Some(id),
            _ => {
                v.add_error(key, "must be a positive integer");
                None
            }
        }
    }

    /// `page`, `page_size`, and `sort` parsed and validated against `safelist`.
    pub fn filters(&self, safelist: &'static [&'static str], v: &mut Validator) -> Filters {
        let filters = Filters::parse(
            self.0.get("page").map(String::as_str),
            self.0.get("page_size").map(String::as_str),
            self.0.get("sort").map(String::as_str),
            safelist,
            v,
        );
        filters.validate(v);
        filters
    }
}

/// Only an undecodable query string is rejected (400).
impl<S: Send + Sync> FromRequestParts<S> for QueryParams {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Query::<QueryParams>::try_from_uri(&parts.uri)
            .map(|Query(params)| params)
            .map_err(|rejection| AppError::BadRequest(rejection.body_text()))
    }
}

impl<const N: usize> From<[(&str, &str); N]> for QueryParams {
    fn from(pairs: [(&str, &str); N]) -> Self {
        Self(
            pairs
                .into_iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        )
    }
}
