//! Known-assignment cache.
//!
//! Keyed by Canvas assignment id. An entry means "a note for this assignment
//! was materialised at `file_path` when the remote record looked like
//! `last_updated`". The note itself may have been moved or deleted since.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CachedAssignment {
    pub name: String,
    pub course_id: u64,
    pub last_updated: String,
    pub file_path: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AssignmentCache {
    entries: HashMap<u64, CachedAssignment>,
}

impl AssignmentCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, assignment_id: u64) -> Option<&CachedAssignment> {
        self.entries.get(&assignment_id)
    }

    pub fn insert(&mut self, assignment_id: u64, record: CachedAssignment) {
        self.entries.insert(assignment_id, record);
    }

    /// Record a new `last_updated` for a known assignment. Returns `false` if
    /// the id is unknown.
    pub fn touch(&mut self, assignment_id: u64, last_updated: &str) -> bool {
        match self.entries.get_mut(&assignment_id) {
            Some(record) => {
                record.last_updated = last_updated.to_string();
                true
            }
            None => false,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
