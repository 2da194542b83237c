use std::sync::Arc;

use owo_colors::{OwoColorize, Stream::Stdout};

use enclavekit::keys::{fingerprint, KeyManager};
use enclavekit::store::{AccessControl, PresenceRequirement, SecureKeyStore};

use crate::cli::GenerateArgs;

/// Generate a new key pair under the given tag.
///
/// The access-control policy is fixed here for the life of the key:
/// device-unlocked accessibility plus either user presence or, with
/// `--biometry`, a biometric assertion before any private-key use.
pub fn run_generate(store: Arc<dyn SecureKeyStore>, args: GenerateArgs) -> anyhow::Result<()> {
    let mut access = AccessControl::default();
    if args.biometry {
        access.presence = PresenceRequirement::BiometryAny;
    }

    let keys = KeyManager::with_access_control(store, access);
    keys.generate_key_pair(&args.tag)?;

    let public = keys
        .get_public_key_data(&args.tag)?
        .ok_or(enclavekit::error::EnclaveKitError::MissingPublicKey)?;

    println!(
        "{} key pair '{}' (fingerprint {})",
        "Generated".if_supports_color(Stdout, |t| t.green()),
        args.tag,
        fingerprint::short_fingerprint(&public)
    );
    Ok(())
}
