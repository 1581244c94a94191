//! Auth context
//!
//! Holds the bearer token handed to the HTTP transport at construction.
//! Optionally backed by a [`TokenStore`] so the token survives restarts.

use crate::error::{ConsoleError, Result};
use parking_lot::RwLock;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// File-backed token persistence
#[derive(Debug, Clone)]
pub struct TokenStore {
    path: PathBuf,
}

impl TokenStore {
    /// Create store at path
    #[inline]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Location of the token file
    #[inline]
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the persisted token; a missing or blank file means no token
    pub fn load(&self) -> Result<Option<String>> {
        match fs::read_to_string(&self.path) {
            Ok(contents) => {
                let token = contents.trim();
                Ok((!token.is_empty()).then(|| token.to_string()))
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(ConsoleError::Config(format!(
                "reading token file {}: {e}",
                self.path.display()
            ))),
        }
    }

    /// Persist token
    pub fn save(&self, token: &str) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(|e| {
                    ConsoleError::Config(format!("creating {}: {e}", parent.display()))
                })?;
            }
        }
        fs::write(&self.path, token).map_err(|e| {
            ConsoleError::Config(format!("writing token file {}: {e}", self.path.display()))
        })
    }

    /// Remove persisted token
    pub fn remove(&self) -> Result<()> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(ConsoleError::Config(format!(
                "removing token file {}: {e}",
                self.path.display()
            ))),
        }
    }
}

/// Process-wide auth state, shared by reference
#[derive(Debug, Default)]
pub struct AuthContext {
    token: RwLock<Option<String>>,
    store: Option<TokenStore>,
}

impl AuthContext {
    /// In-memory context without a token
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// In-memory context with a token
    #[inline]
    pub fn with_token(token: impl Into<String>) -> Self {
        Self {
            token: RwLock::new(Some(token.into())),
            store: None,
        }
    }

    /// Context backed by a token file, seeded from its current contents
    pub fn persistent(store: TokenStore) -> Result<Self> {
        let token = store.load()?;
        tracing::debug!(path = %store.path().display(), loaded = token.is_some(), "auth context opened");
        Ok(Self {
            token: RwLock::new(token),
            store: Some(store),
        })
    }

    /// Current token
    #[inline]
    #[must_use]
    pub fn get(&self) -> Option<String> {
        self.token.read().clone()
    }

    /// Replace token (persisted when a store is attached)
    pub fn set(&self, token: impl Into<String>) -> Result<()> {
        let token = token.into();
        if let Some(store) = &self.store {
            store.save(&token)?;
        }
        *self.token.write() = Some(token);
        Ok(())
    }

    /// Drop token (and its persisted copy)
    pub fn clear(&self) -> Result<()> {
        if let Some(store) = &self.store {
            store.remove()?;
        }
        *self.token.write() = None;
        Ok(())
    }

    /// `Authorization` header value, if a token is set
    #[inline]
    #[must_use]
    pub fn bearer(&self) -> Option<String> {
        self.token.read().as_ref().map(|t| format!("Bearer {t}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn in_memory_get_set_clear() {
        let auth = AuthContext::new();
        assert_eq!(auth.get(), None);
        assert_eq!(auth.bearer(), None);

        auth.set("abc").unwrap();
        assert_eq!(auth.get().as_deref(), Some("abc"));
        assert_eq!(auth.bearer().as_deref(), Some("Bearer abc"));

        auth.clear().unwrap();
        assert_eq!(auth.get(), None);
    }

    #[test]
    fn persistent_context_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("token");

        let auth = AuthContext::persistent(TokenStore::new(&path)).unwrap();
        assert_eq!(auth.get(), None);
        auth.set("persisted").unwrap();

        let reopened = AuthContext::persistent(TokenStore::new(&path)).unwrap();
        assert_eq!(reopened.get().as_deref(), Some("persisted"));

        reopened.clear().unwrap();
        assert!(!path.exists());
        // clearing twice is fine
        reopened.clear().unwrap();
    }

    #[test]
    fn blank_token_file_means_no_token() {
        let file = tempfile::NamedTempFile::new().unwrap();
        std::fs::write(file.path(), "  \n").unwrap();
        let store = TokenStore::new(file.path());
        assert_eq!(store.load().unwrap(), None);
    }
}
