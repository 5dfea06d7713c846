//! Note storage on the local file system.
//!
//! Note paths coming from the core are vault-relative and `/`-separated; they
//! are resolved under the vault root here.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use canvas_notes_core::contract::NoteStore;
use canvas_notes_core::error::StorageError;
use tokio::fs;
use tokio::io::AsyncWriteExt;

pub struct VaultNoteStore {
    root: PathBuf,
}

impl VaultNoteStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn resolve(&self, path: &str) -> PathBuf {
        path.split('/')
            .filter(|part| !part.is_empty())
            .fold(self.root.clone(), |acc, part| acc.join(part))
    }
}

fn io_error(path: &Path, source: std::io::Error) -> StorageError {
    tracing::error!(error = ?source, path = %path.display(), "Vault I/O error");
    StorageError::Io {
        path: path.display().to_string(),
        source,
    }
}

async fn metadata(path: &Path) -> Result<Option<std::fs::Metadata>, StorageError> {
    match fs::metadata(path).await {
        Ok(meta) => Ok(Some(meta)),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
        Err(e) => Err(io_error(path, e)),
    }
}

#[async_trait]
impl NoteStore for VaultNoteStore {
    async fn folder_exists(&self, path: &str) -> Result<bool, StorageError> {
        Ok(metadata(&self.resolve(path)).await?.is_some_and(|m| m.is_dir()))
    }

    async fn create_folder(&self, path: &str) -> Result<(), StorageError> {
        let full = self.resolve(path);
        fs::create_dir_all(&full)
            .await
            .map_err(|e| io_error(&full, e))?;
        tracing::debug!(path = %full.display(), "Created folder");
        Ok(())
    }

    async fn exists(&self, path: &str) -> Result<bool, StorageError> {
        Ok(metadata(&self.resolve(path)).await?.is_some_and(|m| m.is_file()))
    }

    async fn read(&self, path: &str) -> Result<String, StorageError> {
        let full = self.resolve(path);
        match fs::read_to_string(&full).await {
            Ok(content) => Ok(content),
            Err(e) if e.kind() == ErrorKind::NotFound => Err(StorageError::NotFound(path.to_string())),
            Err(e) => Err(io_error(&full, e)),
        }
    }

    async fn create(&self, path: &str, content: &str) -> Result<(), StorageError> {
        let full = self.resolve(path);
        let mut file = match fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&full)
            .await
        {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                return Err(StorageError::AlreadyExists(path.to_string()))
            }
            Err(e) => return Err(io_error(&full, e)),
        };
        file.write_all(content.as_bytes())
            .await
            .map_err(|e| io_error(&full, e))?;
        file.flush().await.map_err(|e| io_error(&full, e))?;
        tracing::debug!(path = %full.display(), bytes = content.len(), "Created note");
        Ok(())
    }

    async fn modify(&self, path: &str, content: &str) -> Result<(), StorageError> {
        let full = self.resolve(path);
        if metadata(&full).await?.is_none() {
            return Err(StorageError::NotFound(path.to_string()));
        }
        fs::write(&full, content)
            .await
            .map_err(|e| io_error(&full, e))?;
        tracing::debug!(path = %full.display(), bytes = content.len(), "Modified note");
        Ok(())
    }
}
