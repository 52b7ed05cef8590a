//! Exported browser session kept on disk.
//!
//! The agent never signs in with a password. An operator exports cookies
//! once; the bridge refreshes them and the client writes them back.

use serde_json::Value;
use std::path::{Path, PathBuf};
use umbra_core::FeedError;

#[derive(Debug, Clone)]
pub struct SessionFile {
    path: PathBuf,
}

impl SessionFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Missing or unreadable cookies are an authentication failure.
    pub async fn load(&self) -> Result<Value, FeedError> {
        let raw = tokio::fs::read_to_string(&self.path).await.map_err(|e| {
            FeedError::Auth(format!(
                "Session file {} not readable ({}); export cookies first",
                self.path.display(),
                e
            ))
        })?;
        serde_json::from_str(&raw).map_err(|e| {
            FeedError::Auth(format!("Session file {} is not JSON: {}", self.path.display(), e))
        })
    }

    /// Replace the stored cookies via a temp file and rename.
    pub async fn save(&self, cookies: &Value) -> std::io::Result<()> {
        let body = serde_json::to_vec_pretty(cookies)?;
        let tmp = self.path.with_extension("json.tmp");
        if let Some(dir) = self.path.parent() {
            if !dir.as_os_str().is_empty() {
                tokio::fs::create_dir_all(dir).await?;
            }
        }
        tokio::fs::write(&tmp, body).await?;
        tokio::fs::rename(&tmp, &self.path).await
    }
}
