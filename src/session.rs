//! Session token storage.
//!
//! The bearer token returned by login or registration is persisted as a
//! single file named after the configured token key, inside the session
//! directory. Nothing else about the session is stored.

use crate::models::UserInfo;
use base64::Engine as _;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, warn};

/// Directory name used under the platform config directory.
const APP_DIR_NAME: &str = "institution-insights";

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("no config directory found; set [session].dir in .insights.toml")]
    NoSessionDir,

    #[error("token key must be a plain file name, got {0:?}")]
    InvalidKey(String),

    #[error("session storage error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// File-backed store for one bearer token.
#[derive(Debug, Clone)]
pub struct TokenStore {
    dir: PathBuf,
    key: String,
}

impl TokenStore {
    /// Create a store rooted at `dir` using `key` as the file name.
    pub fn new(dir: impl Into<PathBuf>, key: impl Into<String>) -> Result<Self, SessionError> {
        let key = key.into();
        if key.is_empty() || key.contains(['/', '\\']) || key == "." || key == ".." {
            return Err(SessionError::InvalidKey(key));
        }
        Ok(Self {
            dir: dir.into(),
            key,
        })
    }

    /// Create a store from session settings, defaulting the directory to
    /// the platform config directory.
    pub fn from_config(config: &crate::config::SessionConfig) -> Result<Self, SessionError> {
        let dir = match &config.dir {
            Some(dir) => PathBuf::from(dir),
            None => dirs::config_dir()
                .map(|d| d.join(APP_DIR_NAME))
                .ok_or(SessionError::NoSessionDir)?,
        };
        Self::new(dir, config.token_key.clone())
    }

    /// Full path of the token file.
    pub fn path(&self) -> PathBuf {
        self.dir.join(&self.key)
    }

    /// Persist a token, replacing any previous one.
    pub fn store(&self, token: &str) -> Result<(), SessionError> {
        fs::create_dir_all(&self.dir).map_err(|e| io_error(&self.dir, e))?;
        let path = self.path();
        fs::write(&path, token).map_err(|e| io_error(&path, e))?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            if let Err(e) = fs::set_permissions(&path, fs::Permissions::from_mode(0o600)) {
                warn!("Failed to restrict permissions on {}: {}", path.display(), e);
            }
        }

        debug!("Stored session token at {}", path.display());
        Ok(())
    }

    /// Load the stored token, if any. Blank files count as no token.
    pub fn load(&self) -> Option<String> {
        fs::read_to_string(self.path())
            .ok()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
    }

    /// Remove the stored token. Succeeds when there is nothing to remove.
    pub fn delete(&self) -> Result<(), SessionError> {
        let path = self.path();
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(io_error(&path, e)),
        }
    }
}

fn io_error(path: &Path, source: std::io::Error) -> SessionError {
    SessionError::Io {
        path: path.to_path_buf(),
        source,
    }
}

/// Decode profile fields from a JWT payload without verifying it.
///
/// Missing claims become empty strings; a malformed token yields `None`.
pub fn decode_user_info(token: &str) -> Option<UserInfo> {
    let payload = token.split('.').nth(1)?;
    let bytes = base64::engine::general_purpose::URL_SAFE_NO_PAD
        .decode(payload.trim_end_matches('='))
        .ok()?;
    let value: serde_json::Value = serde_json::from_slice(&bytes).ok()?;

    let claim = |name: &str| {
        value
            .get(name)
            .and_then(|v| v.as_str())
            .unwrap_or_default()
            .to_string()
    };

    Some(UserInfo {
        first_name: claim("firstName"),
        last_name: claim("lastName"),
        email: claim("email"),
    })
}
