//! Bearer token lifetimes and `Authorization` header parsing.

use axum::http::header::AUTHORIZATION;
use axum::http::HeaderMap;
use episodic_core::tokens::is_well_formed;

/// Lifetimes for issued tokens.
#[derive(Debug, Clone)]
pub struct TokenConfig {
    pub authentication_ttl: chrono::Duration,
    pub activation_ttl: chrono::Duration,
}

impl Default for TokenConfig {
    fn default() -> Self {
        Self {
            authentication_ttl: chrono::Duration::hours(24),
            activation_ttl: chrono::Duration::hours(72),
        }
    }
}

/// What the `Authorization` header says about the caller.
#[derive(Debug, PartialEq, Eq)]
pub enum BearerCredential<'a> {
    /// No header at all.
    Absent,
    /// `Bearer <token>` where the token has the shape of an issued token.
    Token(&'a str),
    /// Anything else: wrong scheme, extra parts, bad token shape, non-ASCII.
    Malformed,
}

pub fn bearer_credential(headers: &HeaderMap) -> BearerCredential<'_> {
    let Some(value) = headers.get(AUTHORIZATION) else {
        return BearerCredential::Absent;
    };
    let Ok(value) = value.to_str() else {
        return BearerCredential::Malformed;
    };

    let mut parts = value.split(' ');
    match (parts.next(), parts.next(), parts.next()) {
        (Some("Bearer"), Some(token), None) if is_well_formed(token) => {
            BearerCredential::Token(token)
        }
        _ => BearerCredential::Malformed,
    }
}

#[cfg(test)]
mod tests {
    use axum::http::HeaderValue;
    use episodic_core::tokens::generate_token;

    use super::*;

    fn headers(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_str(value).unwrap());
        headers
    }

    #[test]
    fn test_absent_header() {
        assert_eq!(bearer_credential(&HeaderMap::new()), BearerCredential::Absent);
    }

    #[test]
    fn test_well_formed_bearer() {
        let token = generate_token().plaintext;
        let h = headers(&format!("Bearer {token}"));
        assert_eq!(bearer_credential(&h), BearerCredential::Token(token.as_str()));
    }

    #[test]
    fn test_malformed_variants() {
        let token = generate_token().plaintext;
        for value in [
            format!("Basic {token}"),
            format!("Bearer {token} {token}"),
            format!("bearer {token}"),
            "Bearer".to_string(),
            "Bearer short".to_string(),
            String::new(),
        ] {
            assert_eq!(
                bearer_credential(&headers(&value)),
                BearerCredential::Malformed,
                "header {value:?}"
            );
        }
    }
}
