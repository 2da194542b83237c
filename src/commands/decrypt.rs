use std::sync::Arc;

use enclavekit::cipher::CipherEngine;
use enclavekit::store::SecureKeyStore;

use crate::cli::DecryptArgs;

/// Decrypt a base64 envelope with a tag's private key and print the text.
///
/// The store's access-control gate fires during the private-key operation;
/// this command just waits on it like any other caller.
pub fn run_decrypt(store: Arc<dyn SecureKeyStore>, args: DecryptArgs) -> anyhow::Result<()> {
    let engine = CipherEngine::new(store);
    let plaintext = engine.decrypt_base64(&args.ciphertext, &args.tag)?;
    println!("{}", plaintext);
    Ok(())
}
