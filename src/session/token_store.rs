//! Persistence for the admin token pair.
//!
//! A single `{access, refresh}` object lives under a fixed key. A file that
//! cannot be parsed is treated as absent; the session clears it on restore.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use crate::models::TokenPair;

pub trait TokenStore: Send + Sync {
    fn load(&self) -> Option<TokenPair>;
    fn save(&self, tokens: &TokenPair) -> io::Result<()>;
    fn clear(&self) -> io::Result<()>;
}

/// JSON file on disk, the CLI's stand-in for browser local storage.
pub struct FileTokenStore {
    path: PathBuf,
}

impl FileTokenStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl TokenStore for FileTokenStore {
    fn load(&self) -> Option<TokenPair> {
        let raw = fs::read_to_string(&self.path).ok()?;
        match serde_json::from_str(&raw) {
            Ok(tokens) => Some(tokens),
            Err(e) => {
                tracing::warn!(path = %self.path.display(), error = %e, "ignoring unreadable token file");
                None
            }
        }
    }

    fn save(&self, tokens: &TokenPair) -> io::Result<()> {
        if let Some(dir) = self.path.parent() {
            fs::create_dir_all(dir)?;
        }
        let raw = serde_json::to_string(tokens).map_err(io::Error::other)?;
        fs::write(&self.path, raw)
    }

    fn clear(&self) -> io::Result<()> {
        match fs::remove_file(&self.path) {
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            other => other,
        }
    }
}

#[derive(Default)]
pub struct MemoryTokenStore {
    slot: Mutex<Option<TokenPair>>,
}

impl MemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_tokens(tokens: TokenPair) -> Self {
        Self {
            slot: Mutex::new(Some(tokens)),
        }
    }
}

impl TokenStore for MemoryTokenStore {
    fn load(&self) -> Option<TokenPair> {
        self.slot.lock().ok()?.clone()
    }

    fn save(&self, tokens: &TokenPair) -> io::Result<()> {
        let mut slot = self.slot.lock().map_err(|_| io::Error::other("token store poisoned"))?;
        *slot = Some(tokens.clone());
        Ok(())
    }

    fn clear(&self) -> io::Result<()> {
        let mut slot = self.slot.lock().map_err(|_| io::Error::other("token store poisoned"))?;
        *slot = None;
        Ok(())
    }
}
