use std::collections::BTreeMap;

use async_trait::async_trait;
use dashmap::DashMap;
use thiserror::Error;

use crate::files::FileSet;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("snippet '{0}' was not found")]
    SnippetNotFound(String),
    #[error("file '{0}' was not found")]
    FileNotFound(String),
    #[error("storage backend error: {0}")]
    Backend(String),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// The remote snippet-storage collaborator. The playground only ever talks
/// to storage through this seam; implementations move bytes and carry no
/// pipeline logic.
#[async_trait]
pub trait GistStore: Send + Sync {
    async fn list_files(&self, gist_id: &str) -> Result<FileSet, StorageError>;

    async fn write_file(
        &self,
        gist_id: &str,
        file_name: &str,
        content: &str,
    ) -> Result<(), StorageError>;

    async fn file_content(&self, gist_id: &str, file_name: &str) -> Result<String, StorageError>;
}

/// In-memory store backing tests and the local snippet mirror.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    snippets: DashMap<String, BTreeMap<String, String>>,
}

impl InMemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn seed(&self, gist_id: &str, files: &FileSet) {
        let entry = files
            .iter()
            .map(|(name, file)| (name.to_string(), file.content.clone()))
            .collect();
        self.snippets.insert(gist_id.to_string(), entry);
    }
}

#[async_trait]
impl GistStore for InMemoryStore {
    async fn list_files(&self, gist_id: &str) -> Result<FileSet, StorageError> {
        let snippet = self
            .snippets
            .get(gist_id)
            .ok_or_else(|| StorageError::SnippetNotFound(gist_id.to_string()))?;
        Ok(snippet
            .iter()
            .map(|(name, content)| (name.clone(), content.clone()))
            .collect())
    }

    async fn write_file(
        &self,
        gist_id: &str,
        file_name: &str,
        content: &str,
    ) -> Result<(), StorageError> {
        let mut snippet = self
            .snippets
            .entry(gist_id.to_string())
            .or_default();
        snippet.insert(file_name.to_string(), content.to_string());
        Ok(())
    }

    async fn file_content(&self, gist_id: &str, file_name: &str) -> Result<String, StorageError> {
        let snippet = self
            .snippets
            .get(gist_id)
            .ok_or_else(|| StorageError::SnippetNotFound(gist_id.to_string()))?;
        snippet
            .get(file_name)
            .cloned()
            .ok_or_else(|| StorageError::FileNotFound(file_name.to_string()))
    }
}
