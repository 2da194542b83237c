use sha2::{Digest, Sha256};

/// Short display fingerprint of public key bytes: first 8 hex chars of the
/// SHA-256 digest. For human comparison only, never for verification.
pub fn short_fingerprint(public_key: &[u8]) -> String {
    let digest = Sha256::digest(public_key);
    digest[..4].iter().map(|b| format!("{:02x}", b)).collect()
}
