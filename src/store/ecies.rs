//! ECIES over P-256: cofactor ECDH + ANSI X9.63 KDF (SHA-256) + AES-GCM.
//!
//! Envelope layout, fixed by the algorithm rather than by any caller:
//!
//! ```text
//! Offset  Size  Field
//! 0       65    Ephemeral public key (uncompressed SEC1 point)
//! 65      N     AES-128-GCM ciphertext body
//! 65+N    16    GCM authentication tag
//! ```
//!
//! The KDF consumes the raw ECDH shared secret with the ephemeral public
//! point as SharedInfo and yields 32 bytes: the first 16 are the AES-128 key,
//! the last 16 the GCM IV (the "variable IV" variant derives the IV from the
//! KDF instead of fixing it at zero). P-256 has cofactor 1, so cofactor and
//! plain Diffie-Hellman coincide.

use aes_gcm::aead::generic_array::typenum::U16;
use aes_gcm::aead::generic_array::GenericArray;
use aes_gcm::aead::Aead;
use aes_gcm::aes::Aes128;
use aes_gcm::{AesGcm, KeyInit};
use p256::ecdh;
use p256::elliptic_curve::sec1::ToEncodedPoint;
use p256::{PublicKey, SecretKey};
use rand::rngs::OsRng;
use sha2::{Digest, Sha256};
use zeroize::Zeroizing;

use super::status;
use crate::error::{EnclaveKitError, Result};

/// Uncompressed SEC1 encoding of a P-256 point: 0x04 || X || Y.
pub const EPHEMERAL_POINT_LEN: usize = 65;

/// AES-GCM authentication tag length.
pub const GCM_TAG_LEN: usize = 16;

const AES_KEY_LEN: usize = 16;
const GCM_IV_LEN: usize = 16;

/// AES-128-GCM with a 16-byte KDF-derived IV.
type EnvelopeAead = AesGcm<Aes128, U16>;

/// ANSI X9.63 KDF with SHA-256: out = SHA256(Z || counter || SharedInfo),
/// counter starting at 1, big-endian, one hash block per 32 output bytes.
fn x963_kdf_sha256(shared_secret: &[u8], shared_info: &[u8], out: &mut [u8]) {
    let mut counter: u32 = 1;
    for chunk in out.chunks_mut(32) {
        let mut hasher = Sha256::new();
        hasher.update(shared_secret);
        hasher.update(counter.to_be_bytes());
        hasher.update(shared_info);
        chunk.copy_from_slice(&hasher.finalize()[..chunk.len()]);
        counter += 1;
    }
}

/// Derive the AES key and GCM IV for one envelope.
fn derive_key_iv(
    shared_secret: &[u8],
    ephemeral_point: &[u8],
) -> Zeroizing<[u8; AES_KEY_LEN + GCM_IV_LEN]> {
    let mut okm = Zeroizing::new([0u8; AES_KEY_LEN + GCM_IV_LEN]);
    x963_kdf_sha256(shared_secret, ephemeral_point, okm.as_mut());
    okm
}

/// Encrypt `plaintext` to `public_key` with a fresh ephemeral key pair.
///
/// Non-deterministic: every call draws a new ephemeral key, so encrypting the
/// same plaintext twice yields different envelopes.
pub fn encrypt(public_key: &PublicKey, plaintext: &[u8]) -> Result<Vec<u8>> {
    let ephemeral = ecdh::EphemeralSecret::random(&mut OsRng);
    let ephemeral_point = ephemeral.public_key().to_encoded_point(false);
    let shared = ephemeral.diffie_hellman(public_key);

    let okm = derive_key_iv(shared.raw_secret_bytes().as_slice(), ephemeral_point.as_bytes());
    let cipher = EnvelopeAead::new(GenericArray::from_slice(&okm[..AES_KEY_LEN]));
    let nonce = GenericArray::from_slice(&okm[AES_KEY_LEN..]);

    let sealed = cipher
        .encrypt(nonce, plaintext)
        .map_err(|_| EnclaveKitError::PlatformFailure(status::PARAM))?;

    let mut envelope = Vec::with_capacity(EPHEMERAL_POINT_LEN + sealed.len());
    envelope.extend_from_slice(ephemeral_point.as_bytes());
    envelope.extend_from_slice(&sealed);
    Ok(envelope)
}

/// Open an envelope with the resident private scalar.
///
/// Fails with a decode-status platform error when the envelope is truncated,
/// the ephemeral point is not on the curve, the envelope was produced under a
/// different key, or the authentication tag does not verify. Never returns
/// partial plaintext.
pub fn decrypt(secret_key: &SecretKey, envelope: &[u8]) -> Result<Vec<u8>> {
    if envelope.len() < EPHEMERAL_POINT_LEN + GCM_TAG_LEN {
        return Err(EnclaveKitError::PlatformFailure(status::DECODE));
    }

    let ephemeral_point = &envelope[..EPHEMERAL_POINT_LEN];
    let ephemeral_public = PublicKey::from_sec1_bytes(ephemeral_point)
        .map_err(|_| EnclaveKitError::PlatformFailure(status::DECODE))?;

    let shared = ecdh::diffie_hellman(secret_key.to_nonzero_scalar(), ephemeral_public.as_affine());
    let okm = derive_key_iv(shared.raw_secret_bytes().as_slice(), ephemeral_point);
    let cipher = EnvelopeAead::new(GenericArray::from_slice(&okm[..AES_KEY_LEN]));
    let nonce = GenericArray::from_slice(&okm[AES_KEY_LEN..]);

    cipher
        .decrypt(nonce, &envelope[EPHEMERAL_POINT_LEN..])
        .map_err(|_| EnclaveKitError::PlatformFailure(status::DECODE))
}
