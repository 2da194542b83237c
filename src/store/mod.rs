//! Secure key store capability: the boundary behind which private keys live.
//!
//! The [`SecureKeyStore`] trait models a hardware-backed key store. Private
//! key material never crosses this boundary — callers hold a [`KeyHandle`]
//! and ask the store to encrypt, decrypt, or export the public half. The
//! file-backed [`software::SoftwareKeyStore`] is the shipped implementation;
//! tests and the CLI run against it, and anything hardware-backed can slot in
//! behind the same trait.

mod ecies;
pub mod software;

pub use software::{AlwaysPresent, PresenceGate, SoftwareKeyStore};

use crate::error::{Result, StoreStatus};

/// Store status codes, following the platform OSStatus numbering.
pub mod status {
    use crate::error::StoreStatus;

    pub const SUCCESS: StoreStatus = 0;
    /// Backing storage I/O failure.
    pub const IO: StoreStatus = -36;
    /// Invalid parameter (empty tag, unsupported key type or size).
    pub const PARAM: StoreStatus = -50;
    /// The user-presence or biometric check was not satisfied.
    pub const AUTH_FAILED: StoreStatus = -25293;
    /// A key pair already exists under the requested tag.
    pub const DUPLICATE_ITEM: StoreStatus = -25299;
    /// No key pair matches the query predicate.
    pub const ITEM_NOT_FOUND: StoreStatus = -25300;
    /// Private-key use refused while the device is locked.
    pub const INTERACTION_NOT_ALLOWED: StoreStatus = -25308;
    /// Malformed key file, malformed envelope, or failed authentication.
    pub const DECODE: StoreStatus = -26275;
}

/// Item class selected by a store query. Only keys are stored here.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemClass {
    Key,
}

/// Key types the store understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyType {
    /// NIST P-256 elliptic-curve key pair.
    EcP256,
}

/// Storage token a key pair is created on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenId {
    /// Hardware secure element (emulated by the software store).
    SecureElement,
}

/// Cryptographic algorithms a key handle can be asked to perform.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Algorithm {
    /// ECIES: cofactor ECDH, X9.63-SHA256 KDF, AES-GCM with KDF-derived IV.
    EciesCofactorVariableIvX963Sha256AesGcm,
}

/// Which side of an algorithm a handle is being asked to perform.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyOperation {
    Encrypt,
    Decrypt,
}

/// When a private key may be read by the store at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Accessibility {
    /// Only while this device is unlocked; never migrates to another device.
    WhenUnlockedThisDeviceOnly,
}

/// Which presence assertion gates private-key use.
///
/// Both options block the same way (until the device owner responds); the
/// choice only selects which prompt the platform shows, so it is a policy
/// knob rather than a behavioral fork.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PresenceRequirement {
    UserPresence,
    BiometryAny,
}

/// Access-control policy fixed at key creation. Cannot be altered later.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AccessControl {
    pub accessibility: Accessibility,
    /// The private key may be used for cryptographic operations.
    pub private_key_usage: bool,
    pub presence: PresenceRequirement,
}

impl Default for AccessControl {
    fn default() -> Self {
        AccessControl {
            accessibility: Accessibility::WhenUnlockedThisDeviceOnly,
            private_key_usage: true,
            presence: PresenceRequirement::UserPresence,
        }
    }
}

/// Lookup predicate for a key pair. Yields at most one match.
#[derive(Debug, Clone)]
pub struct KeyQuery {
    pub class: ItemClass,
    pub application_tag: Vec<u8>,
    pub key_type: KeyType,
    /// Ask for an opaque reference rather than key material.
    pub return_ref: bool,
}

impl KeyQuery {
    /// The query used everywhere in this crate: private P-256 key by tag,
    /// returned by reference.
    pub fn private_key(tag: &str) -> Self {
        KeyQuery {
            class: ItemClass::Key,
            application_tag: tag.as_bytes().to_vec(),
            key_type: KeyType::EcP256,
            return_ref: true,
        }
    }
}

/// Key-creation request: a permanent, non-exportable pair on the secure
/// element, gated by an access-control policy.
#[derive(Debug, Clone)]
pub struct KeyCreateRequest {
    pub key_type: KeyType,
    pub size_in_bits: u32,
    pub token: TokenId,
    pub permanent: bool,
    pub application_tag: Vec<u8>,
    pub access_control: AccessControl,
}

impl KeyCreateRequest {
    pub fn secure_element(tag: &str, access_control: AccessControl) -> Self {
        KeyCreateRequest {
            key_type: KeyType::EcP256,
            size_in_bits: 256,
            token: TokenId::SecureElement,
            permanent: true,
            application_tag: tag.as_bytes().to_vec(),
            access_control,
        }
    }
}

/// Opaque reference to a key pair resident in the store.
///
/// Holds only the lookup coordinates — never key material. Every operation
/// on a handle re-resolves it against current store state, so a handle never
/// goes stale; it can only start failing with `KeyNotFound`-class statuses
/// after the underlying pair is deleted.
#[derive(Debug, Clone)]
pub struct KeyHandle {
    application_tag: Vec<u8>,
    key_type: KeyType,
}

impl KeyHandle {
    pub fn new(application_tag: Vec<u8>, key_type: KeyType) -> Self {
        KeyHandle {
            application_tag,
            key_type,
        }
    }

    pub fn application_tag(&self) -> &[u8] {
        &self.application_tag
    }

    pub fn key_type(&self) -> KeyType {
        self.key_type
    }
}

/// Capability trait for the secure key store.
///
/// All operations are synchronous and may block, including on a presence
/// prompt during private-key use. Implementations own the uniqueness
/// invariant: `create_key` must reject a duplicate tag even when two callers
/// race, since this crate performs no client-side locking.
pub trait SecureKeyStore: Send + Sync {
    /// Resolve the key pair matching `query`. `Ok(None)` when absent —
    /// absence is a normal outcome, not an error.
    fn find_key(&self, query: &KeyQuery) -> Result<Option<KeyHandle>>;

    /// Create a new key pair per `request` and return its handle.
    fn create_key(&self, request: &KeyCreateRequest) -> Result<KeyHandle>;

    /// Remove the key pair matching `query`, returning the raw store status
    /// (`status::SUCCESS` on removal, `status::ITEM_NOT_FOUND` on no match).
    fn delete_key(&self, query: &KeyQuery) -> StoreStatus;

    /// Export the public half of `handle` as uncompressed SEC1 point bytes.
    fn copy_public_key(&self, handle: &KeyHandle) -> Result<Vec<u8>>;

    /// Whether `handle` can perform `algorithm` in the given role.
    fn supports_algorithm(
        &self,
        handle: &KeyHandle,
        operation: KeyOperation,
        algorithm: Algorithm,
    ) -> bool;

    /// Encrypt `plaintext` to the public half of `handle`. Not gated by the
    /// access-control policy (public-key operation).
    fn encrypt(&self, handle: &KeyHandle, algorithm: Algorithm, plaintext: &[u8])
        -> Result<Vec<u8>>;

    /// Decrypt `ciphertext` with the private half of `handle`. Triggers the
    /// access-control gate established at creation before any key use.
    fn decrypt(
        &self,
        handle: &KeyHandle,
        algorithm: Algorithm,
        ciphertext: &[u8],
    ) -> Result<Vec<u8>>;
}
