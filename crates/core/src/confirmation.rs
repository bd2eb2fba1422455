//! Confirmation-code generation and hashing.
//!
//! Codes are emailed in plaintext at signup and exchanged for an access
//! token. Only their SHA-256 hex digest is persisted, so a database leak does
//! not expose codes that have not been used yet.

use rand::Rng;
use sha2::{Digest, Sha256};

/// URL-safe alphabet (RFC 4648 section 5).
pub const URL_SAFE_ALPHABET: &str =
    "ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789-_";

/// Default code length. 24 characters of a 64-symbol alphabet carry 144 bits.
pub const DEFAULT_CODE_LENGTH: usize = 24;

/// Generates fixed-length confirmation codes from a configured alphabet.
#[derive(Debug, Clone)]
pub struct ConfirmationCodeGenerator {
    length: usize,
    alphabet: Vec<char>,
}

impl ConfirmationCodeGenerator {
    /// Build a generator. Returns `None` for a zero length or an empty alphabet.
    pub fn new(length: usize, alphabet: &str) -> Option<Self> {
        let alphabet: Vec<char> = alphabet.chars().collect();
        if length == 0 || alphabet.is_empty() {
            return None;
        }
        Some(Self { length, alphabet })
    }

    /// Generate a code from the thread-local CSPRNG.
    pub fn generate(&self) -> String {
        self.generate_with(&mut rand::rng())
    }

    /// Generate a code from the given RNG.
    pub fn generate_with<R: Rng>(&self, rng: &mut R) -> String {
        (0..self.length)
            .map(|_| self.alphabet[rng.random_range(0..self.alphabet.len())])
            .collect()
    }
}

impl Default for ConfirmationCodeGenerator {
    fn default() -> Self {
        Self {
            length: DEFAULT_CODE_LENGTH,
            alphabet: URL_SAFE_ALPHABET.chars().collect(),
        }
    }
}

/// SHA-256 hex digest of a confirmation code, as stored in `users`.
pub fn hash_confirmation_code(code: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(code.as_bytes());
    format!("{:x}", hasher.finalize())
}
