use std::sync::Arc;

use enclavekit::cipher::CipherEngine;
use enclavekit::store::SecureKeyStore;

use crate::cli::EncryptArgs;

/// Encrypt text to a tag's public key and print the base64 envelope.
///
/// Fails with `KeyNotFound` for an absent tag — encryption never creates
/// keys on its own.
pub fn run_encrypt(store: Arc<dyn SecureKeyStore>, args: EncryptArgs) -> anyhow::Result<()> {
    let engine = CipherEngine::new(store);
    let ciphertext = engine.encrypt_string(&args.text, &args.tag)?;
    println!("{}", ciphertext);
    Ok(())
}
