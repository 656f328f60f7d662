//! Row types, request DTOs, and per-resource validation rules.

pub mod character;
pub mod comment;
pub mod episode;
pub mod token;
pub mod user;
