//! Persisted token storage

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};

/// The two fixed keys of the persisted session.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct Tokens {
    access_token: Option<String>,
    refresh_token: Option<String>,
}

/// Session context read by every outgoing request.
///
/// Written only by login and logout; single-writer by convention.
pub trait SessionStore: Send + Sync {
    fn access_token(&self) -> Option<String>;
    fn refresh_token(&self) -> Option<String>;
    fn set_tokens(&self, access: &str, refresh: &str) -> AppResult<()>;
    /// Clears both tokens together.
    fn clear(&self) -> AppResult<()>;
}

/// Process-local store for tests and embedding.
#[derive(Default)]
pub struct MemorySessionStore {
    tokens: RwLock<Tokens>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SessionStore for MemorySessionStore {
    fn access_token(&self) -> Option<String> {
        self.tokens.read().expect("session store lock").access_token.clone()
    }

    fn refresh_token(&self) -> Option<String> {
        self.tokens.read().expect("session store lock").refresh_token.clone()
    }

    fn set_tokens(&self, access: &str, refresh: &str) -> AppResult<()> {
        let mut tokens = self.tokens.write().expect("session store lock");
        tokens.access_token = Some(access.to_string());
        tokens.refresh_token = Some(refresh.to_string());
        Ok(())
    }

    fn clear(&self) -> AppResult<()> {
        *self.tokens.write().expect("session store lock") = Tokens::default();
        Ok(())
    }
}

/// JSON-file-backed store, the durable analog of browser local storage.
pub struct FileSessionStore {
    path: PathBuf,
    tokens: RwLock<Tokens>,
}

impl FileSessionStore {
    /// Open the store at `path`, restoring any previously persisted tokens.
    pub fn open(path: impl AsRef<Path>) -> AppResult<Self> {
        let path = path.as_ref().to_path_buf();
        let tokens = match fs::read_to_string(&path) {
            Ok(raw) => serde_json::from_str(&raw)
                .map_err(|e| AppError::Storage(format!("corrupt session file: {}", e)))?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Tokens::default(),
            Err(e) => return Err(AppError::Storage(e.to_string())),
        };
        Ok(Self {
            path,
            tokens: RwLock::new(tokens),
        })
    }

    fn persist(&self, tokens: &Tokens) -> AppResult<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(|e| AppError::Storage(e.to_string()))?;
            }
        }
        let raw = serde_json::to_string_pretty(tokens)
            .map_err(|e| AppError::Storage(e.to_string()))?;
        fs::write(&self.path, raw).map_err(|e| AppError::Storage(e.to_string()))
    }
}

impl SessionStore for FileSessionStore {
    fn access_token(&self) -> Option<String> {
        self.tokens.read().expect("session store lock").access_token.clone()
    }

    fn refresh_token(&self) -> Option<String> {
        self.tokens.read().expect("session store lock").refresh_token.clone()
    }

    fn set_tokens(&self, access: &str, refresh: &str) -> AppResult<()> {
        let mut tokens = self.tokens.write().expect("session store lock");
        tokens.access_token = Some(access.to_string());
        tokens.refresh_token = Some(refresh.to_string());
        self.persist(&tokens)
    }

    fn clear(&self) -> AppResult<()> {
        let mut tokens = self.tokens.write().expect("session store lock");
        *tokens = Tokens::default();
        self.persist(&tokens)
    }
}
