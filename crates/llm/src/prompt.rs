//! System prompt loaded from disk on first use.

use std::path::{Path, PathBuf};
use tokio::sync::OnceCell;
use tracing::info;

#[derive(Debug, thiserror::Error)]
#[error("failed to read system prompt {path}: {source}")]
pub struct PromptError {
    pub path: PathBuf,
    #[source]
    pub source: std::io::Error,
}

/// Read-once cache for the Oracle's system prompt.
///
/// The file is read on the first successful [`PromptCache::get`] and never
/// again. A failed read is not cached; the next call retries.
#[derive(Debug)]
pub struct PromptCache {
    path: PathBuf,
    cell: OnceCell<String>,
}

impl PromptCache {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            cell: OnceCell::new(),
        }
    }

    /// A cache that is already populated. Used where no file exists.
    pub fn fixed(prompt: impl Into<String>) -> Self {
        Self {
            path: PathBuf::new(),
            cell: OnceCell::new_with(Some(prompt.into())),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub async fn get(&self) -> Result<&str, PromptError> {
        let prompt = self
            .cell
            .get_or_try_init(|| async {
                let text = tokio::fs::read_to_string(&self.path)
                    .await
                    .map_err(|source| PromptError {
                        path: self.path.clone(),
                        source,
                    })?;
                info!(path = %self.path.display(), chars = text.len(), "loaded system prompt");
                Ok::<_, PromptError>(text)
            })
            .await?;
        Ok(prompt.as_str())
    }
}
