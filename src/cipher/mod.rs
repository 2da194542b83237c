//! Cipher engine: public-key envelope encryption and private-key decryption
//! against tagged keys in the secure key store.
//!
//! Encryption never creates keys implicitly — an absent tag is
//! [`EnclaveKitError::KeyNotFound`], and callers wanting create-if-absent go
//! through [`crate::keys::KeyManager::ensure_key_pair`] first. The envelope
//! layout is owned entirely by the store's algorithm implementation; this
//! module treats ciphertext as opaque bytes plus their base64 text form.

use std::sync::Arc;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;

use crate::error::{EnclaveKitError, Result};
use crate::store::{Algorithm, KeyHandle, KeyOperation, KeyQuery, SecureKeyStore};

/// The one algorithm this engine speaks: ECIES with cofactor ECDH,
/// X9.63-SHA256 key derivation, and AES-GCM with a KDF-derived IV.
const CIPHER_ALGORITHM: Algorithm = Algorithm::EciesCofactorVariableIvX963Sha256AesGcm;

pub struct CipherEngine {
    store: Arc<dyn SecureKeyStore>,
}

impl CipherEngine {
    pub fn new(store: Arc<dyn SecureKeyStore>) -> Self {
        CipherEngine { store }
    }

    fn resolve(&self, key_tag: &str, operation: KeyOperation) -> Result<KeyHandle> {
        let handle = self
            .store
            .find_key(&KeyQuery::private_key(key_tag))?
            .ok_or(EnclaveKitError::KeyNotFound)?;
        if !self
            .store
            .supports_algorithm(&handle, operation, CIPHER_ALGORITHM)
        {
            return Err(EnclaveKitError::AlgorithmNotSupported);
        }
        Ok(handle)
    }

    /// Encrypt `plaintext` to the public key under `key_tag`.
    ///
    /// Non-deterministic: the store draws a fresh ephemeral component per
    /// call, so two envelopes for the same plaintext never match.
    pub fn encrypt_bytes(&self, plaintext: &[u8], key_tag: &str) -> Result<Vec<u8>> {
        let handle = self.resolve(key_tag, KeyOperation::Encrypt)?;
        self.store.encrypt(&handle, CIPHER_ALGORITHM, plaintext)
    }

    /// Convenience text path: UTF-8 encode, encrypt, base64 encode.
    pub fn encrypt_string(&self, text: &str, key_tag: &str) -> Result<String> {
        let envelope = self.encrypt_bytes(text.as_bytes(), key_tag)?;
        Ok(STANDARD.encode(envelope))
    }

    /// Decrypt an envelope with the private key under `key_tag`.
    ///
    /// The store enforces the access-control gate (device unlock plus
    /// presence assertion) before touching the private key; gate refusals
    /// surface as store-level failures, not cipher-specific ones.
    pub fn decrypt_bytes(&self, ciphertext: &[u8], key_tag: &str) -> Result<Vec<u8>> {
        let handle = self.resolve(key_tag, KeyOperation::Decrypt)?;
        self.store.decrypt(&handle, CIPHER_ALGORITHM, ciphertext)
    }

    /// Convenience text path: base64 decode, decrypt, UTF-8 decode.
    pub fn decrypt_base64(&self, base64_text: &str, key_tag: &str) -> Result<String> {
        let envelope = STANDARD
            .decode(base64_text)
            .map_err(|_| EnclaveKitError::NotBase64String)?;
        let plaintext = self.decrypt_bytes(&envelope, key_tag)?;
        String::from_utf8(plaintext).map_err(|_| EnclaveKitError::CannotDecodeUtf8)
    }
}
