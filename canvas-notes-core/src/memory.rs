//! In-memory collaborators.
//!
//! Mocks are fine for scripting the remote API, but the reconciler's file and
//! state traffic is easier to assert on after the fact. These keep everything
//! in a map and record every write.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;

use crate::cache::AssignmentCache;
use crate::contract::{NoteStore, StateStore};
use crate::error::StorageError;
use crate::settings::Settings;

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// A write the reconciler made to a [`MemoryNoteStore`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NoteWrite {
    CreateFolder(String),
    Create(String),
    Modify(String),
}

#[derive(Debug, Default)]
pub struct MemoryNoteStore {
    notes: Mutex<BTreeMap<String, String>>,
    folders: Mutex<BTreeSet<String>>,
    writes: Mutex<Vec<NoteWrite>>,
}

impl MemoryNoteStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Put a note in place without recording a write.
    pub fn seed(&self, path: &str, content: &str) {
        lock(&self.notes).insert(path.to_string(), content.to_string());
    }

    /// Simulate the user deleting a note.
    pub fn remove(&self, path: &str) -> Option<String> {
        lock(&self.notes).remove(path)
    }

    pub fn note(&self, path: &str) -> Option<String> {
        lock(&self.notes).get(path).cloned()
    }

    pub fn paths(&self) -> Vec<String> {
        lock(&self.notes).keys().cloned().collect()
    }

    pub fn writes(&self) -> Vec<NoteWrite> {
        lock(&self.writes).clone()
    }

    pub fn clear_writes(&self) {
        lock(&self.writes).clear();
    }
}

#[async_trait]
impl NoteStore for MemoryNoteStore {
    async fn folder_exists(&self, path: &str) -> Result<bool, StorageError> {
        Ok(lock(&self.folders).contains(path))
    }

    async fn create_folder(&self, path: &str) -> Result<(), StorageError> {
        lock(&self.folders).insert(path.to_string());
        lock(&self.writes).push(NoteWrite::CreateFolder(path.to_string()));
        Ok(())
    }

    async fn exists(&self, path: &str) -> Result<bool, StorageError> {
        Ok(lock(&self.notes).contains_key(path))
    }

    async fn read(&self, path: &str) -> Result<String, StorageError> {
        lock(&self.notes)
            .get(path)
            .cloned()
            .ok_or_else(|| StorageError::NotFound(path.to_string()))
    }

    async fn create(&self, path: &str, content: &str) -> Result<(), StorageError> {
        let mut notes = lock(&self.notes);
        if notes.contains_key(path) {
            return Err(StorageError::AlreadyExists(path.to_string()));
        }
        notes.insert(path.to_string(), content.to_string());
        lock(&self.writes).push(NoteWrite::Create(path.to_string()));
        Ok(())
    }

    async fn modify(&self, path: &str, content: &str) -> Result<(), StorageError> {
        let mut notes = lock(&self.notes);
        match notes.get_mut(path) {
            Some(existing) => *existing = content.to_string(),
            None => return Err(StorageError::NotFound(path.to_string())),
        }
        lock(&self.writes).push(NoteWrite::Modify(path.to_string()));
        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct MemoryStateStore {
    state: Mutex<(Settings, AssignmentCache)>,
    saves: Mutex<usize>,
}

impl MemoryStateStore {
    pub fn new(settings: Settings, cache: AssignmentCache) -> Self {
        Self {
            state: Mutex::new((settings, cache)),
            saves: Mutex::new(0),
        }
    }

    pub fn saved_cache(&self) -> AssignmentCache {
        lock(&self.state).1.clone()
    }

    pub fn save_count(&self) -> usize {
        *lock(&self.saves)
    }
}

#[async_trait]
impl StateStore for MemoryStateStore {
    async fn load(&self) -> Result<(Settings, AssignmentCache), StorageError> {
        Ok(lock(&self.state).clone())
    }

    async fn save(
        &self,
        settings: &Settings,
        cache: &AssignmentCache,
    ) -> Result<(), StorageError> {
        *lock(&self.state) = (settings.clone(), cache.clone());
        *lock(&self.saves) += 1;
        Ok(())
    }
}
