//! Secret values and their encryption at rest.
//!
//! # Security Constraints
//! - `Secret` never prints its contents (`Debug`/`Display` are redacted)
//! - `Secret` is not `Serialize`; the only way to disk is through `SecretCipher`
//! - Ciphertext is `base64(nonce || aes-256-gcm(plaintext))`

use std::ffi::OsString;
use std::fmt;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use aes_gcm::{
    aead::{Aead, AeadCore, KeyInit, OsRng},
    Aes256Gcm, Key, Nonce,
};
use base64ct::{Base64, Encoding};
use thiserror::Error;

const NONCE_LEN: usize = 12;
const KEY_LEN: usize = 32;

/// Errors raised while encrypting or decrypting secrets.
#[derive(Debug, Error)]
pub enum CipherError {
    /// Key material is malformed or has the wrong length.
    #[error("invalid key: {0}")]
    InvalidKey(String),

    /// AEAD encryption failed.
    #[error("encryption failed")]
    Encrypt,

    /// Ciphertext is malformed or was produced under another key.
    #[error("decryption failed: {0}")]
    Decrypt(String),
}

/// An opaque secret value such as a password.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Secret(String);

impl Secret {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Reveal the plaintext. Call sites should be few and obvious.
    pub fn reveal(&self) -> &str {
        &self.0
    }

    /// Compare against a plaintext candidate without revealing to the caller.
    pub fn expose_eq(&self, candidate: &str) -> bool {
        self.0 == candidate
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<String> for Secret {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for Secret {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Secret(***)")
    }
}

impl fmt::Display for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("***")
    }
}

/// Symmetric cipher used to store secrets in the settings file.
#[derive(Clone)]
pub struct SecretCipher {
    key: Key<Aes256Gcm>,
}

impl SecretCipher {
    /// Build a cipher from a base64 encoded 256-bit key.
    pub fn new(key_base64: &str) -> Result<Self, CipherError> {
        let key_bytes = Base64::decode_vec(key_base64.trim())
            .map_err(|e| CipherError::InvalidKey(format!("not base64: {}", e)))?;

        if key_bytes.len() != KEY_LEN {
            return Err(CipherError::InvalidKey(format!(
                "expected {} bytes, got {}",
                KEY_LEN,
                key_bytes.len()
            )));
        }

        Ok(Self {
            key: *Key::<Aes256Gcm>::from_slice(&key_bytes),
        })
    }

    /// Create a cipher with a fresh random key.
    pub fn generate() -> Self {
        Self {
            key: Aes256Gcm::generate_key(OsRng),
        }
    }

    /// Base64 form of the key, as written to the key file.
    fn encoded_key(&self) -> String {
        Base64::encode_string(self.key.as_slice())
    }

    /// Read the key file, or create it with a fresh key on first run.
    ///
    /// Never fails. An unreadable or malformed key file is moved aside to
    /// `<name>.invalid` and replaced; if the new key cannot be written the
    /// cipher lives in memory only and secrets saved under it will not
    /// survive a restart.
    pub fn load_or_create(path: &Path) -> Self {
        match fs::read_to_string(path) {
            Ok(encoded) => match Self::new(&encoded) {
                Ok(cipher) => {
                    tracing::debug!(path = %path.display(), "Loaded settings key");
                    return cipher;
                }
                Err(e) => {
                    tracing::error!(path = %path.display(), error = %e, "Settings key is invalid, replacing it");
                }
            },
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => {
                tracing::error!(path = %path.display(), error = %e, "Failed to read settings key, replacing it");
            }
        }

        let cipher = Self::generate();
        if path.symlink_metadata().is_ok() && !set_aside(path) {
            tracing::error!(path = %path.display(), "Keeping settings key in memory only");
            return cipher;
        }

        match write_key(path, &cipher.encoded_key()) {
            Ok(()) => tracing::info!(path = %path.display(), "Generated new settings key"),
            Err(e) => tracing::error!(
                path = %path.display(),
                error = %e,
                "Failed to write settings key, keeping it in memory only"
            ),
        }
        cipher
    }

    pub fn encrypt(&self, secret: &Secret) -> Result<String, CipherError> {
        let cipher = Aes256Gcm::new(&self.key);
        let nonce = Aes256Gcm::generate_nonce(&mut OsRng);

        let ciphertext = cipher
            .encrypt(&nonce, secret.reveal().as_bytes())
            .map_err(|_| CipherError::Encrypt)?;

        let mut combined = nonce.to_vec();
        combined.extend_from_slice(&ciphertext);
        Ok(Base64::encode_string(&combined))
    }

    pub fn decrypt(&self, encoded: &str) -> Result<Secret, CipherError> {
        let combined = Base64::decode_vec(encoded)
            .map_err(|e| CipherError::Decrypt(format!("not base64: {}", e)))?;

        if combined.len() < NONCE_LEN {
            return Err(CipherError::Decrypt("ciphertext too short".to_string()));
        }

        let (nonce_bytes, ciphertext) = combined.split_at(NONCE_LEN);
        let plaintext = Aes256Gcm::new(&self.key)
            .decrypt(Nonce::from_slice(nonce_bytes), ciphertext)
            .map_err(|_| CipherError::Decrypt("authentication failed".to_string()))?;

        String::from_utf8(plaintext)
            .map(Secret::from)
            .map_err(|e| CipherError::Decrypt(format!("invalid UTF-8: {}", e)))
    }
}

impl fmt::Debug for SecretCipher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SecretCipher").finish_non_exhaustive()
    }
}

fn sibling(path: &Path, suffix: &str) -> PathBuf {
    let mut name = path.file_name().map(OsString::from).unwrap_or_default();
    name.push(suffix);
    path.with_file_name(name)
}

/// Move a bad key file out of the way so it can be inspected later.
fn set_aside(path: &Path) -> bool {
    let target = sibling(path, ".invalid");
    match fs::rename(path, &target) {
        Ok(()) => {
            tracing::warn!(from = %path.display(), to = %target.display(), "Moved invalid settings key aside");
            true
        }
        Err(e) => {
            tracing::error!(path = %path.display(), error = %e, "Failed to move invalid settings key aside");
            false
        }
    }
}

/// Write the key to a temp file, sync it, then rename it into place.
fn write_key(path: &Path, encoded: &str) -> io::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    let tmp = sibling(path, ".tmp");
    let mut options = fs::OpenOptions::new();
    options.write(true).create(true).truncate(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }
    let mut file = options.open(&tmp)?;
    file.write_all(encoded.as_bytes())?;
    file.sync_all()?;
    fs::rename(&tmp, path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_secret_is_redacted() {
        let secret = Secret::new("hunter2");
        assert_eq!(format!("{:?}", secret), "Secret(***)");
        assert_eq!(secret.to_string(), "***");
        assert_eq!(secret.reveal(), "hunter2");
        assert!(secret.expose_eq("hunter2"));
        assert!(!secret.expose_eq("hunter3"));
    }

    #[test]
    fn test_encrypt_decrypt() {
        let cipher = SecretCipher::generate();
        let encrypted = cipher.encrypt(&Secret::new("broker-pass")).unwrap();

        assert!(!encrypted.contains("broker-pass"));
        assert_eq!(cipher.decrypt(&encrypted).unwrap().reveal(), "broker-pass");
    }

    #[test]
    fn test_nonce_differs_per_encryption() {
        let cipher = SecretCipher::generate();
        let secret = Secret::new("same");
        assert_ne!(cipher.encrypt(&secret).unwrap(), cipher.encrypt(&secret).unwrap());
    }

    #[test]
    fn test_wrong_key_fails() {
        let encrypted = SecretCipher::generate().encrypt(&Secret::new("x")).unwrap();
        let result = SecretCipher::generate().decrypt(&encrypted);
        assert!(matches!(result, Err(CipherError::Decrypt(_))));
    }

    #[test]
    fn test_invalid_key_length() {
        let short = Base64::encode_string(b"short");
        assert!(matches!(SecretCipher::new(&short), Err(CipherError::InvalidKey(_))));
    }

    #[test]
    fn test_key_file_is_reused() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("keys").join("settings.key");

        let first = SecretCipher::load_or_create(&path);
        let encrypted = first.encrypt(&Secret::new("persisted")).unwrap();

        let second = SecretCipher::load_or_create(&path);
        assert_eq!(second.decrypt(&encrypted).unwrap().reveal(), "persisted");
        assert!(!sibling(&path, ".tmp").exists());
    }

    fn assert_key_replaced(path: &Path, old_contents: &str) {
        let cipher = SecretCipher::load_or_create(path);
        let encrypted = cipher.encrypt(&Secret::new("after")).unwrap();

        let written = fs::read_to_string(path).unwrap();
        assert!(SecretCipher::new(&written).is_ok());
        assert_eq!(
            SecretCipher::load_or_create(path).decrypt(&encrypted).unwrap().reveal(),
            "after"
        );
        assert_eq!(fs::read_to_string(sibling(path, ".invalid")).unwrap(), old_contents);
    }

    #[test]
    fn test_empty_key_file_is_replaced() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.key");
        fs::write(&path, "").unwrap();

        assert_key_replaced(&path, "");
    }

    #[test]
    fn test_malformed_key_file_is_replaced() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.key");
        fs::write(&path, "not-a-key!").unwrap();

        assert_key_replaced(&path, "not-a-key!");
    }

    #[test]
    fn test_unreadable_key_path_is_replaced() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.key");
        fs::create_dir(&path).unwrap();

        let cipher = SecretCipher::load_or_create(&path);
        let encrypted = cipher.encrypt(&Secret::new("after")).unwrap();

        assert!(sibling(&path, ".invalid").is_dir());
        assert!(path.is_file());
        assert_eq!(
            SecretCipher::load_or_create(&path).decrypt(&encrypted).unwrap().reveal(),
            "after"
        );
    }
}
