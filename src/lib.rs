/// enclavekit library crate — exposes internal modules for integration tests.
///
/// The caller-facing surface is [`keys::KeyManager`] plus [`cipher::CipherEngine`],
/// both constructed over an injected [`store::SecureKeyStore`] capability.
pub mod cipher;
pub mod error;
pub mod keys;
pub mod store;
