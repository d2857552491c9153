//! Cryptographic primitives for draftbox
//!
//! This module provides the security foundation for treating a contents-API
//! repository as a multi-writer data store:
//!
//! - **Passwords**: CSPRNG generation in two classes (admin/content) and
//!   PBKDF2-HMAC-SHA512 hashing with per-password salts
//! - **Encryption**: ChaCha20-Poly1305 keyed directly by a password string,
//!   used for at-rest blobs co-located with their own access password
//!   (share-link metadata keyed by the link token, cached credentials keyed
//!   by the device id)
//! - **Integrity**: SHA-256 checksums over canonical JSON, so any field
//!   mutation of a stored entity is detectable on read
//! - **Identifiers**: one-way IP hashing (raw addresses never at rest) and
//!   unguessable share tokens
//!
//! # Threat model
//!
//! The backing store offers no server-side authorization; every document is
//! world-readable through the contents API. Consequently nothing secret is
//! ever persisted in plaintext: passwords are stored as salted hashes, IPs as
//! digests, and share metadata as ciphertext only link holders can open.

mod checksum;
mod cipher;
mod password;
mod token;

pub use checksum::{checksum_of, verify_checksum, ChecksumError};
pub use cipher::{Cipher, CipherError};
pub use password::{PasswordClass, PasswordError, PasswordHash};
pub use token::{hash_ip, ShareToken};
