//! Per-request accumulator of field validation errors.
//!
//! A [`Validator`] is created for one request, fed any number of checks, and
//! then either converted into a [`CoreError::Validation`] or discarded. Only
//! the first failure recorded for a field is kept.

use std::collections::{BTreeMap, HashSet};
use std::hash::Hash;
use std::sync::LazyLock;

use regex::Regex;

use crate::error::CoreError;

/// Field name -> message. Ordered so JSON error bodies are deterministic.
pub type FieldErrors = BTreeMap<String, String>;

static EMAIL_RX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^[a-zA-Z0-9.!#$%&'*+/=?^_`{|}~-]+@[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?(?:\.[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?)*$",
    )
    .expect("email pattern is a valid regex")
});

#[derive(Debug, Default, Clone)]
pub struct Validator {
    errors: FieldErrors,
}

impl Validator {
    pub fn new() -> Self {
        Self::default()
    }

    /// True when no check has failed.
    pub fn valid(&self) -> bool {
        self.errors.is_empty()
    }

    /// Record `message` for `field` unless the field already has an error.
    pub fn add_error(&mut self, field: &str, message: &str) {
        self.errors
            .entry(field.to_string())
            .or_insert_with(|| message.to_string());
    }

    /// Record `message` for `field` when `ok` is false.
    pub fn check(&mut self, ok: bool, field: &str, message: &str) {
        if !ok {
            self.add_error(field, message);
        }
    }

    pub fn errors(&self) -> &FieldErrors {
        &self.errors
    }

    /// `Ok(())` when valid, otherwise a [`CoreError::Validation`] carrying
    /// every recorded field error.
    pub fn into_result(self) -> Result<(), CoreError> {
        if self.valid() {
            Ok(())
        } else {
            Err(CoreError::Validation(self.errors))
        }
    }
}

/// True when `value` is one of `permitted`.
pub fn permitted_value<T: PartialEq>(value: &T, permitted: &[T]) -> bool {
    permitted.contains(value)
}

/// True when every element of `values` is distinct.
pub fn unique<T: Eq + Hash>(values: &[T]) -> bool {
    let mut seen = HashSet::with_capacity(values.len());
    values.iter().all(|v| seen.insert(v))
}

pub fn is_email(value: &str) -> bool {
    EMAIL_RX.is_match(value)
}
