//! Persists the API bearer token across launches.
//!
//! The OS keyring is preferred. When it is unavailable (headless boxes, CI)
//! the token is kept in a ChaCha20-Poly1305 sealed file under the app root,
//! with the key in a sibling 0600 file.

use std::path::{Path, PathBuf};

use crate::app_dirs;

const KEYRING_SERVICE: &str = "medisynth";
const KEYRING_KEY: &str = "medisynth_api_token";

const KEY_LEN: usize = 32;
const NONCE_LEN: usize = 12;

#[derive(Debug, thiserror::Error)]
pub enum TokenStoreError {
    #[error("Token store unavailable: {0}")]
    Unavailable(String),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Crypto error: {0}")]
    Crypto(String),
    #[error("Decode error: {0}")]
    Decode(String),
    #[error("App dir error: {0}")]
    AppDir(#[from] app_dirs::AppDirError),
}

/// Saved bearer token for the synthesis backend.
#[derive(Clone, Debug)]
pub struct ApiTokenStore {
    fallback_dir: PathBuf,
}

impl ApiTokenStore {
    pub fn new() -> Result<Self, TokenStoreError> {
        let fallback_dir = app_dirs::app_root_dir()?.join("secrets");
        std::fs::create_dir_all(&fallback_dir)?;
        Ok(Self { fallback_dir })
    }

    pub fn get(&self) -> Result<Option<String>, TokenStoreError> {
        if let Some(token) = self.try_keyring_get()? {
            return Ok(Some(token));
        }
        self.fallback_get()
    }

    pub fn set(&self, token: &str) -> Result<(), TokenStoreError> {
        let token = token.trim();
        if token.is_empty() {
            return Ok(());
        }
        if self.try_keyring_set(token).is_ok() {
            let _ = self.fallback_delete();
            return Ok(());
        }
        self.fallback_set(token)
    }

    pub fn delete(&self) -> Result<(), TokenStoreError> {
        let _ = self.try_keyring_delete();
        let _ = self.fallback_delete();
        Ok(())
    }

    fn try_keyring_get(&self) -> Result<Option<String>, TokenStoreError> {
        if keyring_disabled() {
            return Ok(None);
        }
        let entry = keyring_entry()?;
        match entry.get_password() {
            Ok(token) => Ok(Some(token)),
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(_) => Ok(None),
        }
    }

    fn try_keyring_set(&self, token: &str) -> Result<(), TokenStoreError> {
        if keyring_disabled() {
            return Err(TokenStoreError::Unavailable("keyring disabled".into()));
        }
        keyring_entry()?
            .set_password(token)
            .map_err(|err| TokenStoreError::Unavailable(err.to_string()))
    }

    fn try_keyring_delete(&self) -> Result<(), TokenStoreError> {
        if keyring_disabled() {
            return Ok(());
        }
        let _ = keyring_entry()?.delete_credential();
        Ok(())
    }

    fn fallback_token_path(&self) -> PathBuf {
        self.fallback_dir.join("api_token.bin")
    }

    fn fallback_key_path(&self) -> PathBuf {
        self.fallback_dir.join("api_token.key")
    }

    fn fallback_get(&self) -> Result<Option<String>, TokenStoreError> {
        let token_path = self.fallback_token_path();
        if !token_path.exists() {
            return Ok(None);
        }
        let data = std::fs::read(token_path)?;
        if data.len() < NONCE_LEN {
            return Err(TokenStoreError::Decode("token file too short".into()));
        }
        let (nonce, ciphertext) = data.split_at(NONCE_LEN);
        let key_bytes = std::fs::read(self.fallback_key_path())?;
        if key_bytes.len() != KEY_LEN {
            return Err(TokenStoreError::Decode("token key invalid".into()));
        }
        let plaintext = open_sealed(&key_bytes, nonce, ciphertext)?;
        let token =
            String::from_utf8(plaintext).map_err(|err| TokenStoreError::Decode(err.to_string()))?;
        Ok(Some(token))
    }

    fn fallback_set(&self, token: &str) -> Result<(), TokenStoreError> {
        let key_path = self.fallback_key_path();
        let key_bytes = if key_path.exists() {
            std::fs::read(&key_path)?
        } else {
            let bytes = random_bytes(KEY_LEN)?;
            write_private_file(&key_path, &bytes)?;
            bytes
        };
        if key_bytes.len() != KEY_LEN {
            return Err(TokenStoreError::Decode("token key invalid".into()));
        }
        let nonce = random_bytes(NONCE_LEN)?;
        let ciphertext = seal(&key_bytes, &nonce, token.as_bytes())?;
        let mut payload = Vec::with_capacity(nonce.len() + ciphertext.len());
        payload.extend_from_slice(&nonce);
        payload.extend_from_slice(&ciphertext);
        write_private_file(&self.fallback_token_path(), &payload)?;
        Ok(())
    }

    fn fallback_delete(&self) -> Result<(), TokenStoreError> {
        let _ = std::fs::remove_file(self.fallback_token_path());
        let _ = std::fs::remove_file(self.fallback_key_path());
        Ok(())
    }
}

fn keyring_entry() -> Result<keyring::Entry, TokenStoreError> {
    keyring::Entry::new(KEYRING_SERVICE, KEYRING_KEY)
        .map_err(|err| TokenStoreError::Unavailable(err.to_string()))
}

fn keyring_disabled() -> bool {
    std::env::var("MEDISYNTH_DISABLE_KEYRING")
        .map(|value| value == "1" || value.eq_ignore_ascii_case("true"))
        .unwrap_or(false)
}

fn random_bytes(len: usize) -> Result<Vec<u8>, TokenStoreError> {
    let mut out = vec![0u8; len];
    use rand::TryRngCore;
    rand::rngs::OsRng
        .try_fill_bytes(&mut out)
        .map_err(|err| TokenStoreError::Unavailable(err.to_string()))?;
    Ok(out)
}

fn write_private_file(path: &Path, bytes: &[u8]) -> Result<(), TokenStoreError> {
    use std::io::Write;
    let mut file = std::fs::OpenOptions::new()
        .create(true)
        .truncate(true)
        .write(true)
        .open(path)?;
    file.write_all(bytes)?;
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let _ = std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600));
    }
    Ok(())
}

fn seal(key: &[u8], nonce: &[u8], plaintext: &[u8]) -> Result<Vec<u8>, TokenStoreError> {
    use chacha20poly1305::aead::{Aead, KeyInit};
    let cipher = chacha20poly1305::ChaCha20Poly1305::new_from_slice(key)
        .map_err(|err| TokenStoreError::Crypto(err.to_string()))?;
    let nonce = chacha20poly1305::Nonce::from_slice(nonce);
    cipher
        .encrypt(nonce, plaintext)
        .map_err(|err| TokenStoreError::Crypto(err.to_string()))
}

fn open_sealed(key: &[u8], nonce: &[u8], ciphertext: &[u8]) -> Result<Vec<u8>, TokenStoreError> {
    use chacha20poly1305::aead::{Aead, KeyInit};
    let cipher = chacha20poly1305::ChaCha20Poly1305::new_from_slice(key)
        .map_err(|err| TokenStoreError::Crypto(err.to_string()))?;
    let nonce = chacha20poly1305::Nonce::from_slice(nonce);
    cipher
        .decrypt(nonce, ciphertext)
        .map_err(|err| TokenStoreError::Crypto(err.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn fallback_roundtrip_when_keyring_disabled() {
        unsafe {
            std::env::set_var("MEDISYNTH_DISABLE_KEYRING", "1");
        }
        let base = tempdir().unwrap();
        let _guard = app_dirs::ConfigBaseGuard::set(base.path().to_path_buf());
        let store = ApiTokenStore::new().unwrap();
        assert_eq!(store.get().unwrap(), None);
        store.set("tok_abcdefghijklmnopqrstuvwxyz").unwrap();
        assert_eq!(
            store.get().unwrap().as_deref(),
            Some("tok_abcdefghijklmnopqrstuvwxyz")
        );
        store.delete().unwrap();
        assert_eq!(store.get().unwrap(), None);
        unsafe {
            std::env::remove_var("MEDISYNTH_DISABLE_KEYRING");
        }
    }

    #[test]
    fn blank_token_is_not_persisted() {
        unsafe {
            std::env::set_var("MEDISYNTH_DISABLE_KEYRING", "1");
        }
        let base = tempdir().unwrap();
        let _guard = app_dirs::ConfigBaseGuard::set(base.path().to_path_buf());
        let store = ApiTokenStore::new().unwrap();
        store.set("   ").unwrap();
        assert_eq!(store.get().unwrap(), None);
        unsafe {
            std::env::remove_var("MEDISYNTH_DISABLE_KEYRING");
        }
    }

    #[test]
    fn seal_then_open_round_trips() {
        let key = vec![7u8; KEY_LEN];
        let nonce = vec![1u8; NONCE_LEN];
        let sealed = seal(&key, &nonce, b"tok_secret").unwrap();
        assert_ne!(sealed, b"tok_secret");
        let opened = open_sealed(&key, &nonce, &sealed).unwrap();
        assert_eq!(opened, b"tok_secret");
    }
}
