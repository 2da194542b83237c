use thiserror::Error;

/// Raw status code surfaced by the secure key store, mirroring the
/// platform OSStatus convention (0 = success, negative = failure).
pub type StoreStatus = i32;

/// Result alias used throughout the library.
pub type Result<T> = std::result::Result<T, EnclaveKitError>;

/// Closed set of failure kinds surfaced by the key manager and cipher engine.
///
/// Absence of a key is NOT in this set: lookups return `Ok(None)` for a tag
/// with no key pair, so callers can distinguish "not there yet" from failure.
#[derive(Error, Debug)]
pub enum EnclaveKitError {
    #[error("A key pair already exists for this tag")]
    KeyAlreadyExists,

    #[error("No key pair found for this tag")]
    KeyNotFound,

    #[error("Key deletion failed with store status {0}")]
    KeyDeletionFailed(StoreStatus),

    #[error("The key does not support the requested algorithm")]
    AlgorithmNotSupported,

    #[error("Input is not a valid base64 string")]
    NotBase64String,

    #[error("Decrypted bytes are not valid UTF-8")]
    CannotDecodeUtf8,

    #[error("Key pair was generated but no public key could be derived")]
    MissingPublicKey,

    #[error("Secure key store failure (status {0})")]
    PlatformFailure(StoreStatus),
}
