//! File-backed software key store.
//!
//! Stands in for the hardware secure element: one key file per tag, private
//! scalars confined behind the [`SecureKeyStore`] trait surface. Key files
//! are created with exclusive open and 0600 permissions, and the permission
//! check is repeated before every read — the store owns this guarantee
//! rather than relying on the process umask.
//!
//! Private-key operations consult an injected [`PresenceGate`], the software
//! analogue of the platform's user-presence / biometric prompt. The gate is
//! consulted synchronously and may block for as long as it likes.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use p256::elliptic_curve::sec1::ToEncodedPoint;
use p256::SecretKey;
use rand::rngs::OsRng;
use zeroize::Zeroizing;

use super::{
    ecies, status, AccessControl, Accessibility, Algorithm, KeyCreateRequest, KeyHandle,
    KeyOperation, KeyQuery, KeyType, PresenceRequirement, SecureKeyStore,
};
use crate::error::{EnclaveKitError, Result, StoreStatus};

/// Magic header bytes identifying an EnclaveKit P-256 key file.
const KEY_FILE_MAGIC: &[u8; 4] = b"EKP2";

/// Current key-file format version.
const KEY_FILE_VERSION: u8 = 0x01;

/// Fixed key-file length: 4 magic + 1 version + 1 accessibility + 1 presence
/// + 32 scalar = 39 bytes.
const KEY_FILE_LEN: usize = 39;

/// Trust gate consulted before every private-key operation.
///
/// Implementations decide how the device owner asserts presence (prompt,
/// fingerprint reader, test stub). Both checks block until answered; there
/// is no timeout on this side of the boundary.
pub trait PresenceGate: Send + Sync {
    /// Whether the device is currently unlocked.
    fn device_unlocked(&self) -> bool;

    /// Whether the owner asserted presence for a use of the key under
    /// `application_tag`, via whichever mechanism `requirement` selects.
    fn confirm_presence(&self, application_tag: &[u8], requirement: PresenceRequirement) -> bool;
}

/// Gate that grants everything. Default for tests and the CLI, where no
/// prompt hardware exists.
pub struct AlwaysPresent;

impl PresenceGate for AlwaysPresent {
    fn device_unlocked(&self) -> bool {
        true
    }

    fn confirm_presence(&self, _application_tag: &[u8], _requirement: PresenceRequirement) -> bool {
        true
    }
}

/// File-backed implementation of [`SecureKeyStore`].
pub struct SoftwareKeyStore {
    dir: PathBuf,
    gate: Arc<dyn PresenceGate>,
}

impl SoftwareKeyStore {
    /// Open a store rooted at `dir` with no presence prompt (always granted).
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self> {
        Self::with_gate(dir, Arc::new(AlwaysPresent))
    }

    /// Open a store rooted at `dir` with an injected presence gate.
    pub fn with_gate(dir: impl Into<PathBuf>, gate: Arc<dyn PresenceGate>) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)
            .map_err(|_| EnclaveKitError::PlatformFailure(status::IO))?;
        Ok(SoftwareKeyStore { dir, gate })
    }

    /// Key-file path for a tag. Tags are arbitrary bytes, so the filename is
    /// the url-safe base64 of the tag rather than the tag itself.
    fn key_path(&self, application_tag: &[u8]) -> PathBuf {
        self.dir
            .join(format!("{}.p256", URL_SAFE_NO_PAD.encode(application_tag)))
    }

    /// Load and parse the key file for a tag. `Ok(None)` when no file exists.
    fn load_key(&self, application_tag: &[u8]) -> Result<Option<(SecretKey, AccessControl)>> {
        let path = self.key_path(application_tag);
        if !path.exists() {
            return Ok(None);
        }
        check_key_permissions(&path)?;

        let raw = Zeroizing::new(
            fs::read(&path).map_err(|_| EnclaveKitError::PlatformFailure(status::IO))?,
        );
        decode_key_file(&raw).map(Some)
    }
}

impl SecureKeyStore for SoftwareKeyStore {
    fn find_key(&self, query: &KeyQuery) -> Result<Option<KeyHandle>> {
        if query.application_tag.is_empty() {
            return Err(EnclaveKitError::PlatformFailure(status::PARAM));
        }
        if self.key_path(&query.application_tag).exists() {
            Ok(Some(KeyHandle::new(
                query.application_tag.clone(),
                query.key_type,
            )))
        } else {
            Ok(None)
        }
    }

    fn create_key(&self, request: &KeyCreateRequest) -> Result<KeyHandle> {
        if request.application_tag.is_empty()
            || request.key_type != KeyType::EcP256
            || request.size_in_bits != 256
        {
            return Err(EnclaveKitError::PlatformFailure(status::PARAM));
        }

        let secret = SecretKey::random(&mut OsRng);
        let contents = encode_key_file(&secret, &request.access_control);

        // Exclusive create is what rejects the second of two racing callers;
        // callers above this layer do no locking of their own.
        let path = self.key_path(&request.application_tag);
        let mut options = fs::OpenOptions::new();
        options.write(true).create_new(true);
        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            options.mode(0o600);
        }
        let mut file = options.open(&path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::AlreadyExists {
                EnclaveKitError::PlatformFailure(status::DUPLICATE_ITEM)
            } else {
                EnclaveKitError::PlatformFailure(status::IO)
            }
        })?;
        file.write_all(&contents)
            .and_then(|_| file.sync_all())
            .map_err(|_| EnclaveKitError::PlatformFailure(status::IO))?;

        Ok(KeyHandle::new(
            request.application_tag.clone(),
            request.key_type,
        ))
    }

    fn delete_key(&self, query: &KeyQuery) -> StoreStatus {
        if query.application_tag.is_empty() {
            return status::PARAM;
        }
        match fs::remove_file(self.key_path(&query.application_tag)) {
            Ok(()) => status::SUCCESS,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => status::ITEM_NOT_FOUND,
            Err(_) => status::IO,
        }
    }

    fn copy_public_key(&self, handle: &KeyHandle) -> Result<Vec<u8>> {
        let (secret, _) = self
            .load_key(handle.application_tag())?
            .ok_or(EnclaveKitError::PlatformFailure(status::ITEM_NOT_FOUND))?;
        Ok(secret.public_key().to_encoded_point(false).as_bytes().to_vec())
    }

    fn supports_algorithm(
        &self,
        handle: &KeyHandle,
        _operation: KeyOperation,
        algorithm: Algorithm,
    ) -> bool {
        handle.key_type() == KeyType::EcP256
            && algorithm == Algorithm::EciesCofactorVariableIvX963Sha256AesGcm
    }

    fn encrypt(
        &self,
        handle: &KeyHandle,
        _algorithm: Algorithm,
        plaintext: &[u8],
    ) -> Result<Vec<u8>> {
        // Public-key operation: no access-control gate applies.
        let (secret, _) = self
            .load_key(handle.application_tag())?
            .ok_or(EnclaveKitError::PlatformFailure(status::ITEM_NOT_FOUND))?;
        ecies::encrypt(&secret.public_key(), plaintext)
    }

    fn decrypt(
        &self,
        handle: &KeyHandle,
        _algorithm: Algorithm,
        ciphertext: &[u8],
    ) -> Result<Vec<u8>> {
        let (secret, access) = self
            .load_key(handle.application_tag())?
            .ok_or(EnclaveKitError::PlatformFailure(status::ITEM_NOT_FOUND))?;

        // The gate fixed at creation time fires on every private-key use.
        if !self.gate.device_unlocked() {
            return Err(EnclaveKitError::PlatformFailure(
                status::INTERACTION_NOT_ALLOWED,
            ));
        }
        if !access.private_key_usage
            || !self
                .gate
                .confirm_presence(handle.application_tag(), access.presence)
        {
            return Err(EnclaveKitError::PlatformFailure(status::AUTH_FAILED));
        }

        ecies::decrypt(&secret, ciphertext)
    }
}

fn encode_key_file(secret: &SecretKey, access: &AccessControl) -> Zeroizing<Vec<u8>> {
    let mut out = Zeroizing::new(Vec::with_capacity(KEY_FILE_LEN));
    out.extend_from_slice(KEY_FILE_MAGIC);
    out.push(KEY_FILE_VERSION);
    out.push(match access.accessibility {
        Accessibility::WhenUnlockedThisDeviceOnly => 0x01,
    });
    out.push(match access.presence {
        PresenceRequirement::UserPresence => 0x01,
        PresenceRequirement::BiometryAny => 0x02,
    });
    out.extend_from_slice(secret.to_bytes().as_slice());
    out
}

fn decode_key_file(raw: &[u8]) -> Result<(SecretKey, AccessControl)> {
    if raw.len() != KEY_FILE_LEN || &raw[..4] != KEY_FILE_MAGIC || raw[4] != KEY_FILE_VERSION {
        return Err(EnclaveKitError::PlatformFailure(status::DECODE));
    }
    let accessibility = match raw[5] {
        0x01 => Accessibility::WhenUnlockedThisDeviceOnly,
        _ => return Err(EnclaveKitError::PlatformFailure(status::DECODE)),
    };
    let presence = match raw[6] {
        0x01 => PresenceRequirement::UserPresence,
        0x02 => PresenceRequirement::BiometryAny,
        _ => return Err(EnclaveKitError::PlatformFailure(status::DECODE)),
    };
    let secret = SecretKey::from_slice(&raw[7..])
        .map_err(|_| EnclaveKitError::PlatformFailure(status::DECODE))?;
    Ok((
        secret,
        AccessControl {
            accessibility,
            private_key_usage: true,
            presence,
        },
    ))
}

/// Check that a key file has exactly 0600 permissions (Unix only).
///
/// The store refuses to read private material that other users on the
/// system could also read.
#[cfg(unix)]
fn check_key_permissions(path: &Path) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;
    let metadata =
        fs::metadata(path).map_err(|_| EnclaveKitError::PlatformFailure(status::IO))?;
    let mode = metadata.permissions().mode() & 0o777;
    if mode != 0o600 {
        return Err(EnclaveKitError::PlatformFailure(status::AUTH_FAILED));
    }
    Ok(())
}

/// No-op permission check on non-Unix platforms.
#[cfg(not(unix))]
fn check_key_permissions(_path: &Path) -> Result<()> {
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALG: Algorithm = Algorithm::EciesCofactorVariableIvX963Sha256AesGcm;

    fn temp_store() -> (tempfile::TempDir, SoftwareKeyStore) {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = SoftwareKeyStore::open(dir.path()).expect("open store");
        (dir, store)
    }

    fn create(store: &SoftwareKeyStore, tag: &str) -> KeyHandle {
        store
            .create_key(&KeyCreateRequest::secure_element(
                tag,
                AccessControl::default(),
            ))
            .expect("create key")
    }

    #[test]
    fn test_create_find_delete_lifecycle() {
        let (_dir, store) = temp_store();
        let query = KeyQuery::private_key("t1");

        assert!(store.find_key(&query).expect("find").is_none());
        create(&store, "t1");
        assert!(store.find_key(&query).expect("find").is_some());
        assert_eq!(store.delete_key(&query), status::SUCCESS);
        assert!(store.find_key(&query).expect("find").is_none());
    }

    #[test]
    fn test_duplicate_create_rejected_by_store() {
        let (_dir, store) = temp_store();
        let request = KeyCreateRequest::secure_element("dup", AccessControl::default());
        store.create_key(&request).expect("first create");
        let result = store.create_key(&request);
        assert!(matches!(
            result,
            Err(EnclaveKitError::PlatformFailure(status::DUPLICATE_ITEM))
        ));
    }

    #[test]
    fn test_delete_missing_returns_item_not_found() {
        let (_dir, store) = temp_store();
        assert_eq!(
            store.delete_key(&KeyQuery::private_key("ghost")),
            status::ITEM_NOT_FOUND
        );
    }

    #[test]
    fn test_empty_tag_rejected() {
        let (_dir, store) = temp_store();
        assert!(matches!(
            store.find_key(&KeyQuery::private_key("")),
            Err(EnclaveKitError::PlatformFailure(status::PARAM))
        ));
        assert_eq!(store.delete_key(&KeyQuery::private_key("")), status::PARAM);
    }

    #[test]
    fn test_public_key_is_uncompressed_sec1() {
        let (_dir, store) = temp_store();
        let handle = create(&store, "pk");
        let public = store.copy_public_key(&handle).expect("copy public key");
        assert_eq!(public.len(), 65);
        assert_eq!(public[0], 0x04, "uncompressed SEC1 points start with 0x04");
    }

    #[test]
    fn test_public_key_rederived_not_cached() {
        let (_dir, store) = temp_store();
        let handle = create(&store, "recheck");
        let first = store.copy_public_key(&handle).expect("first copy");
        let second = store.copy_public_key(&handle).expect("second copy");
        assert_eq!(first, second, "same resident key, same public bytes");

        // After deletion the same handle must stop resolving.
        store.delete_key(&KeyQuery::private_key("recheck"));
        assert!(matches!(
            store.copy_public_key(&handle),
            Err(EnclaveKitError::PlatformFailure(status::ITEM_NOT_FOUND))
        ));
    }

    #[test]
    fn test_store_round_trip() {
        let (_dir, store) = temp_store();
        let handle = create(&store, "rt");
        let envelope = store.encrypt(&handle, ALG, b"store payload").expect("encrypt");
        let opened = store.decrypt(&handle, ALG, &envelope).expect("decrypt");
        assert_eq!(opened, b"store payload");
    }

    #[cfg(unix)]
    #[test]
    fn test_key_file_created_with_0600() {
        use std::os::unix::fs::PermissionsExt;
        let (dir, store) = temp_store();
        create(&store, "perms");
        let entry = fs::read_dir(dir.path())
            .expect("read dir")
            .next()
            .expect("one key file")
            .expect("dir entry");
        let mode = entry.metadata().expect("metadata").permissions().mode() & 0o777;
        assert_eq!(mode, 0o600, "key file must be 0600, got {:04o}", mode);
    }

    #[cfg(unix)]
    #[test]
    fn test_loose_permissions_rejected_on_read() {
        use std::os::unix::fs::PermissionsExt;
        let (dir, store) = temp_store();
        let handle = create(&store, "loose");
        let entry = fs::read_dir(dir.path())
            .expect("read dir")
            .next()
            .expect("one key file")
            .expect("dir entry");
        fs::set_permissions(entry.path(), fs::Permissions::from_mode(0o644))
            .expect("set permissions");

        let result = store.copy_public_key(&handle);
        assert!(
            matches!(
                result,
                Err(EnclaveKitError::PlatformFailure(status::AUTH_FAILED))
            ),
            "0644 key file must be refused, got: {:?}",
            result
        );
    }

    #[test]
    fn test_corrupt_key_file_is_decode_failure() {
        let (dir, store) = temp_store();
        let handle = create(&store, "corrupt");
        let entry = fs::read_dir(dir.path())
            .expect("read dir")
            .next()
            .expect("one key file")
            .expect("dir entry");
        let path = entry.path();
        fs::remove_file(&path).expect("remove");
        let mut options = fs::OpenOptions::new();
        options.write(true).create_new(true);
        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            options.mode(0o600);
        }
        options
            .open(&path)
            .expect("recreate")
            .write_all(b"not a key file")
            .expect("write garbage");

        assert!(matches!(
            store.copy_public_key(&handle),
            Err(EnclaveKitError::PlatformFailure(status::DECODE))
        ));
    }

    #[test]
    fn test_key_file_round_trips_access_policy() {
        let secret = SecretKey::from_slice(&[11u8; 32]).expect("scalar");
        let access = AccessControl {
            accessibility: Accessibility::WhenUnlockedThisDeviceOnly,
            private_key_usage: true,
            presence: PresenceRequirement::BiometryAny,
        };
        let encoded = encode_key_file(&secret, &access);
        let (decoded_secret, decoded_access) = decode_key_file(&encoded).expect("decode");
        assert_eq!(decoded_secret.to_bytes(), secret.to_bytes());
        assert_eq!(decoded_access, access);
    }

    // ── Presence gate ───────────────────────────────────────────────────────

    struct LockedDevice;
    impl PresenceGate for LockedDevice {
        fn device_unlocked(&self) -> bool {
            false
        }
        fn confirm_presence(&self, _tag: &[u8], _req: PresenceRequirement) -> bool {
            true
        }
    }

    struct AbsentOwner;
    impl PresenceGate for AbsentOwner {
        fn device_unlocked(&self) -> bool {
            true
        }
        fn confirm_presence(&self, _tag: &[u8], _req: PresenceRequirement) -> bool {
            false
        }
    }

    #[test]
    fn test_locked_device_blocks_decrypt_only() {
        let dir = tempfile::tempdir().expect("tempdir");
        // Create the key while unlocked, then swap in a locked gate.
        let unlocked = SoftwareKeyStore::open(dir.path()).expect("open");
        let handle = create(&unlocked, "locked");
        let envelope = unlocked.encrypt(&handle, ALG, b"gated").expect("encrypt");

        let locked =
            SoftwareKeyStore::with_gate(dir.path(), Arc::new(LockedDevice)).expect("open locked");
        let result = locked.decrypt(&handle, ALG, &envelope);
        assert!(matches!(
            result,
            Err(EnclaveKitError::PlatformFailure(
                status::INTERACTION_NOT_ALLOWED
            ))
        ));

        // Encryption is a public-key operation and stays available.
        locked
            .encrypt(&handle, ALG, b"still fine")
            .expect("encrypt must not be gated");
    }

    #[test]
    fn test_presence_denied_fails_auth() {
        let dir = tempfile::tempdir().expect("tempdir");
        let granting = SoftwareKeyStore::open(dir.path()).expect("open");
        let handle = create(&granting, "denied");
        let envelope = granting.encrypt(&handle, ALG, b"gated").expect("encrypt");

        let denying =
            SoftwareKeyStore::with_gate(dir.path(), Arc::new(AbsentOwner)).expect("open denying");
        let result = denying.decrypt(&handle, ALG, &envelope);
        assert!(matches!(
            result,
            Err(EnclaveKitError::PlatformFailure(status::AUTH_FAILED))
        ));
    }
}
