use std::path::{Path, PathBuf};

use crate::{Res, types::TokenRecord, utils};

/// Reads and writes the persisted [`TokenRecord`].
///
/// The file is the only authentication state that survives between
/// invocations. Writes go through a temporary sibling and a rename; there is
/// no locking, so two concurrent invocations are last-writer-wins.
#[derive(Debug, Clone)]
pub struct TokenStore {
    path: PathBuf,
}

impl TokenStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        TokenStore { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns `None` when no login has happened yet (absent or empty file).
    pub async fn load(&self) -> Res<Option<TokenRecord>> {
        let content = match async_fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        if content.trim().is_empty() {
            return Ok(None);
        }

        let record: TokenRecord = serde_json::from_str(&content)?;
        Ok(Some(record))
    }

    pub async fn persist(&self, record: &TokenRecord) -> Res<()> {
        let json = serde_json::to_string_pretty(record)?;
        utils::write_atomic(&self.path, json.as_bytes()).await?;
        tracing::debug!(path = %self.path.display(), "token record stored");
        Ok(())
    }
}
