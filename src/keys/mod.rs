//! Key manager: tagged key-pair lifecycle against the secure key store.
//!
//! Holds no key material and no handle cache — every call re-resolves the
//! tag against current store state, so results are always consistent with
//! what the store holds right now.

pub mod fingerprint;

use std::sync::Arc;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;

use crate::error::{EnclaveKitError, Result};
use crate::store::{status, AccessControl, KeyCreateRequest, KeyQuery, SecureKeyStore};

pub struct KeyManager {
    store: Arc<dyn SecureKeyStore>,
    access_control: AccessControl,
}

impl KeyManager {
    /// Manager with the default policy: device unlocked, user presence
    /// asserted before any private-key use.
    pub fn new(store: Arc<dyn SecureKeyStore>) -> Self {
        Self::with_access_control(store, AccessControl::default())
    }

    /// Manager applying `access_control` to every key pair it generates.
    /// The policy is baked into each key at creation and cannot change later.
    pub fn with_access_control(
        store: Arc<dyn SecureKeyStore>,
        access_control: AccessControl,
    ) -> Self {
        KeyManager {
            store,
            access_control,
        }
    }

    /// Generate a new permanent, non-exportable P-256 key pair under `tag`.
    ///
    /// Fails with [`EnclaveKitError::KeyAlreadyExists`] when a pair for the
    /// tag is already present. Duplicate rejection under racing callers is
    /// the store's job; this pre-check only gives the common case its
    /// specific error kind.
    pub fn generate_key_pair(&self, tag: &str) -> Result<()> {
        if tag.is_empty() {
            return Err(EnclaveKitError::PlatformFailure(status::PARAM));
        }
        if self.store.find_key(&KeyQuery::private_key(tag))?.is_some() {
            return Err(EnclaveKitError::KeyAlreadyExists);
        }
        self.store
            .create_key(&KeyCreateRequest::secure_element(tag, self.access_control))?;
        Ok(())
    }

    /// Exportable public key for `tag` as uncompressed SEC1 point bytes.
    ///
    /// `Ok(None)` when no pair exists — absence is how callers decide
    /// whether to generate, not an error.
    pub fn get_public_key_data(&self, tag: &str) -> Result<Option<Vec<u8>>> {
        match self.store.find_key(&KeyQuery::private_key(tag))? {
            Some(handle) => self.store.copy_public_key(&handle).map(Some),
            None => Ok(None),
        }
    }

    /// Public key for `tag`, base64-encoded for the text boundary.
    pub fn get_public_key_base64(&self, tag: &str) -> Result<Option<String>> {
        Ok(self
            .get_public_key_data(tag)?
            .map(|bytes| STANDARD.encode(bytes)))
    }

    /// Remove the key pair under `tag` from the store.
    ///
    /// Surfaces the raw store status on refusal (including "no match") so
    /// callers can diagnose without this module guessing at causes.
    pub fn delete_key_pair(&self, tag: &str) -> Result<()> {
        let status = self.store.delete_key(&KeyQuery::private_key(tag));
        if status != status::SUCCESS {
            return Err(EnclaveKitError::KeyDeletionFailed(status));
        }
        Ok(())
    }

    /// Resolve-or-generate: the public key for `tag`, generating the pair
    /// first if absent.
    ///
    /// Generation nominally always yields a derivable public key, so a
    /// second miss right after generating is reported as
    /// [`EnclaveKitError::MissingPublicKey`] rather than retried.
    pub fn ensure_key_pair(&self, tag: &str) -> Result<Vec<u8>> {
        if let Some(public) = self.get_public_key_data(tag)? {
            return Ok(public);
        }
        self.generate_key_pair(tag)?;
        self.get_public_key_data(tag)?
            .ok_or(EnclaveKitError::MissingPublicKey)
    }
}
