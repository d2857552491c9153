//! Password generation, hashing and verification
//!
//! Two password classes exist: 20-character admin passwords (folder
//! ownership) and 16-character content passwords (per-email deletion).
//! Generated passwords map CSPRNG bytes into a fixed alphanumeric alphabet
//! via modulo. The mapping is slightly non-uniform across the alphabet
//! (256 % 62 != 0); this bias is a documented property of the stored wire
//! format, not a defect to silently fix.
//!
//! Hashes are PBKDF2-HMAC-SHA512 with a fresh 128-bit salt, 100 000
//! iterations and a 512-bit output, all hex-encoded. The parameters are
//! fixed; verification reproduces them exactly from the stored salt.

use pbkdf2::pbkdf2_hmac;
use serde::{Deserialize, Serialize};
use sha2::Sha512;

/// Alphabet shared by both password classes
const ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789";

/// Salt length in bytes (128 bits)
const SALT_SIZE: usize = 16;
/// Derived key length in bytes (512 bits)
const KEY_SIZE: usize = 64;
/// PBKDF2 iteration count, fixed for the life of the stored records
const ITERATIONS: u32 = 100_000;

/// Errors that can occur during password generation or hashing
#[derive(Debug, thiserror::Error)]
pub enum PasswordError {
    #[error("failed to draw random bytes: {0}")]
    Rng(#[from] getrandom::Error),
}

/// The two classes of generated password
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PasswordClass {
    /// Folder administration, 20 characters
    Admin,
    /// Per-email content ownership, 16 characters
    Content,
}

impl PasswordClass {
    /// Length of a generated password of this class
    pub fn length(&self) -> usize {
        match self {
            PasswordClass::Admin => 20,
            PasswordClass::Content => 16,
        }
    }

    /// Generate a fresh password of this class from a CSPRNG
    pub fn generate(&self) -> Result<String, PasswordError> {
        let mut bytes = vec![0u8; self.length()];
        getrandom::getrandom(&mut bytes)?;
        Ok(bytes
            .iter()
            .map(|b| ALPHABET[*b as usize % ALPHABET.len()] as char)
            .collect())
    }
}

/// A salted PBKDF2 password hash, as persisted inside entity documents
///
/// Both fields are lowercase hex. The derivation parameters are fixed
/// (see module docs), so the stored salt alone is enough to re-verify.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PasswordHash {
    pub hash: String,
    pub salt: String,
}

impl PasswordHash {
    /// Hash a password under a fresh random salt
    pub fn new(password: &str) -> Result<Self, PasswordError> {
        let mut salt = [0u8; SALT_SIZE];
        getrandom::getrandom(&mut salt)?;
        Ok(Self {
            hash: derive_hex(password, &salt),
            salt: hex::encode(salt),
        })
    }

    /// Reconstruct from stored hex fields
    pub fn from_parts(hash: impl Into<String>, salt: impl Into<String>) -> Self {
        Self {
            hash: hash.into(),
            salt: salt.into(),
        }
    }

    /// Verify a candidate password against this hash
    ///
    /// Recomputes the derivation with the stored salt and compares the
    /// results byte-for-byte without early exit.
    pub fn verify(&self, password: &str) -> bool {
        let salt = match hex::decode(&self.salt) {
            Ok(salt) => salt,
            Err(_) => return false,
        };
        constant_time_eq(derive_hex_with_salt(password, &salt).as_bytes(), self.hash.as_bytes())
    }
}

fn derive_hex(password: &str, salt: &[u8; SALT_SIZE]) -> String {
    derive_hex_with_salt(password, salt)
}

fn derive_hex_with_salt(password: &str, salt: &[u8]) -> String {
    let mut key = [0u8; KEY_SIZE];
    pbkdf2_hmac::<Sha512>(password.as_bytes(), salt, ITERATIONS, &mut key);
    hex::encode(key)
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b.iter()).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_generate_lengths() {
        let admin = PasswordClass::Admin.generate().unwrap();
        let content = PasswordClass::Content.generate().unwrap();
        assert_eq!(admin.len(), 20);
        assert_eq!(content.len(), 16);
        assert!(admin.bytes().all(|b| ALPHABET.contains(&b)));
        assert!(content.bytes().all(|b| ALPHABET.contains(&b)));
    }

    #[test]
    fn test_hash_verify_roundtrip() {
        let password = PasswordClass::Admin.generate().unwrap();
        let hashed = PasswordHash::new(&password).unwrap();
        assert!(hashed.verify(&password));
        assert!(!hashed.verify("not-the-password"));
    }

    #[test]
    fn test_distinct_salts() {
        let a = PasswordHash::new("same-password").unwrap();
        let b = PasswordHash::new("same-password").unwrap();
        assert_ne!(a.salt, b.salt);
        assert_ne!(a.hash, b.hash);
        assert!(a.verify("same-password"));
        assert!(b.verify("same-password"));
    }

    #[test]
    fn test_verify_from_stored_parts() {
        let hashed = PasswordHash::new("stored").unwrap();
        let restored = PasswordHash::from_parts(hashed.hash.clone(), hashed.salt.clone());
        assert!(restored.verify("stored"));
    }

    #[test]
    fn test_verify_garbage_salt() {
        let hashed = PasswordHash::from_parts("00ff", "not hex");
        assert!(!hashed.verify("anything"));
    }
}
