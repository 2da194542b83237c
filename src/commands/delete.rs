use std::io::IsTerminal;
use std::sync::Arc;

use owo_colors::{OwoColorize, Stream::Stdout};

use enclavekit::keys::KeyManager;
use enclavekit::store::SecureKeyStore;

use crate::cli::DeleteArgs;

/// Delete the key pair under a tag. Deletion is the only destruction path
/// for a key pair, so it asks first unless `-y` or stdin is not a TTY.
pub fn run_delete(store: Arc<dyn SecureKeyStore>, args: DeleteArgs) -> anyhow::Result<()> {
    let skip_confirm = args.yes || !std::io::stdin().is_terminal();
    if !skip_confirm {
        let confirmed = dialoguer::Confirm::new()
            .with_prompt(format!(
                "Delete key pair '{}'? Ciphertexts encrypted to it become unrecoverable.",
                args.tag
            ))
            .default(false)
            .interact()
            .map_err(|e| anyhow::anyhow!("prompt failed: {}", e))?;
        if !confirmed {
            println!("Aborted.");
            return Ok(());
        }
    }

    let keys = KeyManager::new(store);
    keys.delete_key_pair(&args.tag)?;

    println!(
        "{} key pair '{}'",
        "Deleted".if_supports_color(Stdout, |t| t.green()),
        args.tag
    );
    Ok(())
}
