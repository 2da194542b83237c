pub mod decrypt;
pub mod delete;
pub mod encrypt;
pub mod generate;
pub mod pubkey;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use enclavekit::store::{SecureKeyStore, SoftwareKeyStore};

/// Default key store directory: `~/.enclavekit/keys`.
pub fn default_store_dir() -> anyhow::Result<PathBuf> {
    let home = dirs::home_dir().context("Cannot determine home directory")?;
    Ok(home.join(".enclavekit").join("keys"))
}

/// Open the software key store at the given (or default) directory.
pub fn open_store(dir: Option<PathBuf>) -> anyhow::Result<Arc<dyn SecureKeyStore>> {
    let dir = match dir {
        Some(dir) => dir,
        None => default_store_dir()?,
    };
    let store = SoftwareKeyStore::open(&dir)
        .with_context(|| format!("Failed to open key store at {}", dir.display()))?;
    Ok(Arc::new(store))
}
