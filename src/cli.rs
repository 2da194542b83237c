use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "enclavekit",
    version,
    about = "Tagged key pairs in a secure key store with ECIES envelope encryption"
)]
pub struct Cli {
    /// Key store directory (default: ~/.enclavekit/keys)
    #[arg(long, global = true, value_name = "DIR")]
    pub store_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Generate a new key pair under a tag
    Generate(GenerateArgs),
    /// Show the base64 public key for a tag
    Pubkey(PubkeyArgs),
    /// Encrypt text to a tag's public key
    Encrypt(EncryptArgs),
    /// Decrypt a base64 ciphertext with a tag's private key
    Decrypt(DecryptArgs),
    /// Delete the key pair under a tag
    Delete(DeleteArgs),
}

#[derive(Parser)]
pub struct GenerateArgs {
    /// Tag naming the new key pair
    #[arg(value_name = "TAG")]
    pub tag: String,

    /// Require a biometric assertion (instead of any user presence) for
    /// private-key use
    #[arg(long)]
    pub biometry: bool,
}

#[derive(Parser)]
pub struct PubkeyArgs {
    /// Tag of the key pair
    #[arg(value_name = "TAG")]
    pub tag: String,

    /// Generate the key pair first if it does not exist yet
    #[arg(long)]
    pub generate: bool,
}

#[derive(Parser)]
pub struct EncryptArgs {
    /// Tag of the key pair to encrypt to
    #[arg(value_name = "TAG")]
    pub tag: String,

    /// Text to encrypt
    #[arg(value_name = "TEXT")]
    pub text: String,
}

#[derive(Parser)]
pub struct DecryptArgs {
    /// Tag of the key pair to decrypt with
    #[arg(value_name = "TAG")]
    pub tag: String,

    /// Base64 ciphertext produced by `encrypt`
    #[arg(value_name = "CIPHERTEXT")]
    pub ciphertext: String,
}

#[derive(Parser)]
pub struct DeleteArgs {
    /// Tag of the key pair to delete
    #[arg(value_name = "TAG")]
    pub tag: String,

    /// Skip confirmation prompt
    #[arg(long, short = 'y')]
    pub yes: bool,
}
