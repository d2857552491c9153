//! Password-keyed symmetric encryption using ChaCha20-Poly1305
//!
//! Used for blobs that live next to their own access-control password:
//! share-link metadata (keyed by the link token) and the credential cache's
//! plaintext copies (keyed by the device id). The key is derived directly
//! from the password string with a single SHA-256; there is no separate
//! KDF in this path because the keying material is itself machine-generated
//! and high-entropy.
//!
//! Output layout: `nonce (12 bytes) || ciphertext || auth tag (16 bytes)`,
//! hex-encoded so it can sit inside a JSON document.

use chacha20poly1305::{
    aead::{Aead, KeyInit},
    ChaCha20Poly1305, Key, Nonce,
};
use serde::{de::DeserializeOwned, Serialize};
use sha2::{Digest, Sha256};

/// Size of ChaCha20-Poly1305 nonce in bytes
const NONCE_SIZE: usize = 12;

/// Errors that can occur during encryption/decryption
#[derive(Debug, thiserror::Error)]
pub enum CipherError {
    #[error("cipher error: {0}")]
    Default(#[from] anyhow::Error),
    #[error("ciphertext is not valid hex")]
    Encoding(#[from] hex::FromHexError),
    #[error("payload is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// A symmetric cipher keyed by a password string
pub struct Cipher {
    key: [u8; 32],
}

impl Cipher {
    /// Derive a cipher from a password string
    pub fn from_password(password: &str) -> Self {
        let mut key = [0u8; 32];
        key.copy_from_slice(&Sha256::digest(password.as_bytes()));
        Self { key }
    }

    /// Encrypt a serializable value, returning hex `nonce || ciphertext`
    ///
    /// A random nonce is generated for each call.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails or the system RNG fails.
    pub fn encrypt<T: Serialize>(&self, data: &T) -> Result<String, CipherError> {
        let plaintext = serde_json::to_vec(data)?;

        let mut nonce_bytes = [0u8; NONCE_SIZE];
        getrandom::getrandom(&mut nonce_bytes)
            .map_err(|e| anyhow::anyhow!("failed to generate nonce: {}", e))?;
        let nonce = Nonce::from_slice(&nonce_bytes);

        let cipher = ChaCha20Poly1305::new(Key::from_slice(&self.key));
        let ciphertext = cipher
            .encrypt(nonce, plaintext.as_ref())
            .map_err(|_| anyhow::anyhow!("encrypt error"))?;

        let mut out = Vec::with_capacity(NONCE_SIZE + ciphertext.len());
        out.extend_from_slice(&nonce_bytes);
        out.extend_from_slice(&ciphertext);
        Ok(hex::encode(out))
    }

    /// Decrypt hex `nonce || ciphertext` back into a value
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The input is not valid hex or is too short to contain a nonce
    /// - Authentication fails (wrong password or tampered data)
    /// - The plaintext is not valid JSON for `T`
    pub fn decrypt<T: DeserializeOwned>(&self, ciphertext: &str) -> Result<T, CipherError> {
        let data = hex::decode(ciphertext)?;
        if data.len() < NONCE_SIZE {
            return Err(anyhow::anyhow!("data too short for nonce").into());
        }

        let nonce = Nonce::from_slice(&data[..NONCE_SIZE]);
        let cipher = ChaCha20Poly1305::new(Key::from_slice(&self.key));
        let plaintext = cipher
            .decrypt(nonce, &data[NONCE_SIZE..])
            .map_err(|_| anyhow::anyhow!("decrypt error"))?;

        Ok(serde_json::from_slice(&plaintext)?)
    }
}
