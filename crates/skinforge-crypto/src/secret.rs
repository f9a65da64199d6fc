//! Symmetric encryption for persisted account credentials.
//!
//! Contract (spec §4.1): `encrypt(plain) -> cipher` with a stable output
//! format including the IV, `decrypt(cipher) -> plain`, and a decrypt
//! failure surfaces as `CREDENTIAL_UNREADABLE`. No key rotation lives here —
//! that's an operational concern external to the core.

use base64::Engine;
use chacha20poly1305::aead::{Aead, AeadCore, KeyInit, OsRng};
use chacha20poly1305::{ChaCha20Poly1305, Key, Nonce};
use thiserror::Error;
use zeroize::Zeroizing;

const NONCE_LEN: usize = 12;

#[derive(Debug, Error)]
pub enum SecretError {
    #[error("credential could not be decrypted")]
    Unreadable,
}

/// Wraps a process-wide 256-bit key. The key bytes are zeroized on drop.
pub struct SecretCodec {
    key: Zeroizing<[u8; 32]>,
}

impl SecretCodec {
    pub fn new(key: [u8; 32]) -> Self {
        Self {
            key: Zeroizing::new(key),
        }
    }

    /// Parse a 64-character hex-encoded key, as supplied via configuration.
    pub fn from_hex(hex_key: &str) -> Result<Self, SecretError> {
        let bytes = hex::decode(hex_key).map_err(|_| SecretError::Unreadable)?;
        if bytes.len() != 32 {
            return Err(SecretError::Unreadable);
        }
        let mut key = [0u8; 32];
        key.copy_from_slice(&bytes);
        Ok(Self::new(key))
    }

    fn cipher(&self) -> ChaCha20Poly1305 {
        ChaCha20Poly1305::new(Key::from_slice(self.key.as_ref()))
    }

    /// Encrypts `plain`, returning base64(nonce || ciphertext || tag) — the
    /// format stored verbatim in `Account.encrypted_password`.
    pub fn encrypt(&self, plain: &str) -> String {
        let cipher = self.cipher();
        let nonce = ChaCha20Poly1305::generate_nonce(&mut OsRng);
        let ciphertext = cipher
            .encrypt(&nonce, plain.as_bytes())
            .expect("encryption over a fresh nonce cannot fail");

        let mut out = Vec::with_capacity(NONCE_LEN + ciphertext.len());
        out.extend_from_slice(&nonce);
        out.extend_from_slice(&ciphertext);
        base64::engine::general_purpose::STANDARD.encode(out)
    }

    /// Reverses [`Self::encrypt`]. Any malformed input or AEAD tag mismatch
    /// surfaces as `SecretError::Unreadable`, which the engine maps onto
    /// `EngineError::CredentialUnreadable`.
    pub fn decrypt(&self, cipher_b64: &str) -> Result<String, SecretError> {
        let raw = base64::engine::general_purpose::STANDARD
            .decode(cipher_b64)
            .map_err(|_| SecretError::Unreadable)?;
        if raw.len() < NONCE_LEN {
            return Err(SecretError::Unreadable);
        }
        let (nonce_bytes, ciphertext) = raw.split_at(NONCE_LEN);
        let nonce = Nonce::from_slice(nonce_bytes);

        let plain = self
            .cipher()
            .decrypt(nonce, ciphertext)
            .map_err(|_| SecretError::Unreadable)?;
        String::from_utf8(plain).map_err(|_| SecretError::Unreadable)
    }
}
