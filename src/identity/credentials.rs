//! Credential hashing.
//!
//! Current accounts use Argon2id PHC strings with an embedded random salt.
//! Legacy members were stored as unsalted MD5 hex digests; those are only ever
//! verified (never produced) and are replaced by an Argon2 hash on migration.

use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use md5::{Digest, Md5};
use subtle::ConstantTimeEq;

/// Strong adaptive credential hashing.
pub trait CredentialHasher: Send + Sync {
    /// Hash a plaintext password.
    fn hash(&self, plaintext: &str) -> Result<String, CredentialError>;

    /// Check a plaintext password against a stored hash.
    fn verify(&self, stored: &str, plaintext: &str) -> Result<bool, CredentialError>;
}

/// Argon2id with the crate's default parameters.
#[derive(Default)]
pub struct Argon2Hasher {
    argon2: Argon2<'static>,
}

impl Argon2Hasher {
    pub fn new() -> Self {
        Self::default()
    }
}

impl CredentialHasher for Argon2Hasher {
    fn hash(&self, plaintext: &str) -> Result<String, CredentialError> {
        let salt = SaltString::generate(&mut OsRng);
        self.argon2
            .hash_password(plaintext.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|e| CredentialError::HashFailed(e.to_string()))
    }

    fn verify(&self, stored: &str, plaintext: &str) -> Result<bool, CredentialError> {
        let parsed =
            PasswordHash::new(stored).map_err(|e| CredentialError::MalformedHash(e.to_string()))?;

        match self.argon2.verify_password(plaintext.as_bytes(), &parsed) {
            Ok(()) => Ok(true),
            Err(argon2::password_hash::Error::Password) => Ok(false),
            Err(e) => Err(CredentialError::HashFailed(e.to_string())),
        }
    }
}

/// Verify a plaintext password against a legacy unsalted MD5 hex digest.
///
/// The digest comparison is constant-time; the scheme itself is still weak and
/// must not be used for anything but one-shot migration.
pub fn verify_legacy_digest(stored_hex: &str, plaintext: &str) -> bool {
    let digest = Md5::digest(plaintext.as_bytes());
    let computed: String = digest.iter().map(|b| format!("{b:02x}")).collect();
    let stored = stored_hex.trim().to_ascii_lowercase();

    computed.as_bytes().ct_eq(stored.as_bytes()).into()
}

/// Credential errors.
#[derive(Debug, thiserror::Error)]
pub enum CredentialError {
    #[error("Hashing failed: {0}")]
    HashFailed(String),

    #[error("Malformed stored hash: {0}")]
    MalformedHash(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_argon2_roundtrip() {
        let hasher = Argon2Hasher::new();
        let hash = hasher.hash("rahasia123").unwrap();

        assert!(hash.starts_with("$argon2id$"));
        assert!(hasher.verify(&hash, "rahasia123").unwrap());
        assert!(!hasher.verify(&hash, "rahasia124").unwrap());
    }

    #[test]
    fn test_argon2_salts_differ() {
        let hasher = Argon2Hasher::new();
        assert_ne!(hasher.hash("same").unwrap(), hasher.hash("same").unwrap());
    }

    #[test]
    fn test_argon2_malformed_hash() {
        let hasher = Argon2Hasher::new();
        assert!(matches!(
            hasher.verify("not-a-phc-string", "x"),
            Err(CredentialError::MalformedHash(_))
        ));
    }

    #[test]
    fn test_legacy_digest() {
        // md5("password")
        let stored = "5f4dcc3b5aa765d61d8327deb882cf99";
        assert!(verify_legacy_digest(stored, "password"));
        assert!(verify_legacy_digest(&stored.to_uppercase(), "password"));
        assert!(!verify_legacy_digest(stored, "Password"));
        assert!(!verify_legacy_digest("", "password"));
    }
}
