//! Opaque bearer-token generation and hashing.
//!
//! Tokens are 32 random bytes, base32-encoded (RFC 4648, no padding) for
//! transport. Only the SHA-256 hex digest of the encoded string is ever
//! persisted; the plaintext is handed to the caller once and forgotten.

use rand::Rng;
use sha2::{Digest, Sha256};

/// Number of random bytes behind every token.
pub const TOKEN_BYTES: usize = 32;

/// Length of the base32 plaintext for [`TOKEN_BYTES`] bytes (ceil(256 / 5)).
pub const TOKEN_LENGTH: usize = 52;

const BASE32_ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ234567";

/// What a token may be used for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Scope {
    Activation,
    Authentication,
}

impl Scope {
    pub fn as_str(self) -> &'static str {
        match self {
            Scope::Activation => "activation",
            Scope::Authentication => "authentication",
        }
    }
}

impl std::fmt::Display for Scope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A freshly generated token before it is bound to a user.
pub struct GeneratedToken {
    /// Sent to the client exactly once, never stored.
    pub plaintext: String,
    /// SHA-256 hex digest of `plaintext`, the only form that is persisted.
    pub hash: String,
}

pub fn generate_token() -> GeneratedToken {
    let mut bytes = [0u8; TOKEN_BYTES];
    rand::rng().fill(&mut bytes);

    let plaintext = base32_encode(&bytes);
    let hash = hash_token(&plaintext);

    GeneratedToken { plaintext, hash }
}

/// SHA-256 hex digest of a token plaintext.
pub fn hash_token(plaintext: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(plaintext.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// True when `plaintext` has the shape of a token this module produced.
pub fn is_well_formed(plaintext: &str) -> bool {
    plaintext.len() == TOKEN_LENGTH && plaintext.bytes().all(|b| BASE32_ALPHABET.contains(&b))
}

fn base32_encode(data: &[u8]) -> String {
    let mut out = String::with_capacity(data.len().div_ceil(5) * 8);
    let mut buffer: u64 = 0;
    let mut bits = 0;

    for &byte in data {
        buffer = (buffer << 8) | u64::from(byte);
        bits += 8;
        while bits >= 5 {
            bits -= 5;
            out.push(BASE32_ALPHABET[((buffer >> bits) & 0x1F) as usize] as char);
        }
    }
    if bits > 0 {
        out.push(BASE32_ALPHABET[((buffer << (5 - bits)) & 0x1F) as usize] as char);
    }
    out
}
