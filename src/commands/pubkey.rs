use std::sync::Arc;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;

use enclavekit::keys::{fingerprint, KeyManager};
use enclavekit::store::SecureKeyStore;

use crate::cli::PubkeyArgs;

fn try_copy_to_clipboard(text: &str) -> bool {
    match arboard::Clipboard::new() {
        Ok(mut clipboard) => clipboard.set_text(text).is_ok(),
        Err(_) => false,
    }
}

/// Print the base64 public key for a tag.
///
/// With `--generate`, an absent pair is created first (the resolution
/// policy callers use before encrypting to a fresh tag). Without it,
/// absence is reported with a hint rather than silently creating keys.
pub fn run_pubkey(store: Arc<dyn SecureKeyStore>, args: PubkeyArgs) -> anyhow::Result<()> {
    let keys = KeyManager::new(store);

    let public = if args.generate {
        keys.ensure_key_pair(&args.tag)?
    } else {
        match keys.get_public_key_data(&args.tag)? {
            Some(public) => public,
            None => anyhow::bail!(
                "No key pair found for tag '{}'. Run `enclavekit generate {}` first.",
                args.tag,
                args.tag
            ),
        }
    };

    let encoded = STANDARD.encode(&public);
    println!("Public key:  {}", encoded);
    println!(
        "Fingerprint: {}",
        fingerprint::short_fingerprint(&public)
    );

    if try_copy_to_clipboard(&encoded) {
        println!("Public key copied to clipboard.");
    }

    Ok(())
}
