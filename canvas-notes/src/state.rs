//! Settings and cache persisted as JSON next to the notes.
//!
//! ```text
//! <vault>/.canvas-notes/settings.json
//! <vault>/.canvas-notes/cache.json
//! ```
//!
//! A missing file loads as its default, so a fresh vault needs no setup.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use canvas_notes_core::cache::AssignmentCache;
use canvas_notes_core::contract::StateStore;
use canvas_notes_core::error::StorageError;
use canvas_notes_core::settings::Settings;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::fs;
use tracing::{debug, error, info};

pub const STATE_DIR: &str = ".canvas-notes";
const SETTINGS_FILE: &str = "settings.json";
const CACHE_FILE: &str = "cache.json";

pub struct JsonStateStore {
    dir: PathBuf,
}

impl JsonStateStore {
    /// State store for the vault at `vault`.
    pub fn for_vault(vault: &Path) -> Self {
        Self {
            dir: vault.join(STATE_DIR),
        }
    }

    pub fn settings_path(&self) -> PathBuf {
        self.dir.join(SETTINGS_FILE)
    }

    pub fn cache_path(&self) -> PathBuf {
        self.dir.join(CACHE_FILE)
    }
}

fn io_error(path: &Path, source: std::io::Error) -> StorageError {
    error!(error = ?source, path = %path.display(), "State file I/O error");
    StorageError::Io {
        path: path.display().to_string(),
        source,
    }
}

async fn read_json<T: DeserializeOwned + Default>(path: &Path) -> Result<T, StorageError> {
    let content = match fs::read_to_string(path).await {
        Ok(content) => content,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            debug!(path = %path.display(), "No state file yet, using defaults");
            return Ok(T::default());
        }
        Err(e) => return Err(io_error(path, e)),
    };
    serde_json::from_str(&content).map_err(|e| {
        error!(error = ?e, path = %path.display(), "Failed to parse state file");
        StorageError::Serde {
            what: path.display().to_string(),
            message: e.to_string(),
        }
    })
}

async fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<(), StorageError> {
    let json = serde_json::to_string_pretty(value).map_err(|e| StorageError::Serde {
        what: path.display().to_string(),
        message: e.to_string(),
    })?;
    fs::write(path, json).await.map_err(|e| io_error(path, e))
}

#[async_trait]
impl StateStore for JsonStateStore {
    async fn load(&self) -> Result<(Settings, AssignmentCache), StorageError> {
        let settings: Settings = read_json(&self.settings_path()).await?;
        let cache: AssignmentCache = read_json(&self.cache_path()).await?;
        info!(
            dir = %self.dir.display(),
            courses = settings.courses.len(),
            cached = cache.len(),
            "Loaded state"
        );
        Ok((settings, cache))
    }

    async fn save(
        &self,
        settings: &Settings,
        cache: &AssignmentCache,
    ) -> Result<(), StorageError> {
        fs::create_dir_all(&self.dir)
            .await
            .map_err(|e| io_error(&self.dir, e))?;
        write_json(&self.settings_path(), settings).await?;
        write_json(&self.cache_path(), cache).await?;
        debug!(dir = %self.dir.display(), cached = cache.len(), "Saved state");
        Ok(())
    }
}
