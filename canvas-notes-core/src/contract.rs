//! # contract: interfaces to everything outside the sync core
//!
//! The reconciler never talks to the network, the disk or the host application
//! directly. It goes through the traits below:
//!
//! - [`AssignmentSource`]: the Canvas REST API (paged list + single fetch).
//! - [`NoteStore`]: the note vault (folders and markdown files, by path).
//! - [`StateStore`]: durable settings + known-assignment cache.
//! - [`HtmlConverter`]: HTML description to markdown.
//!
//! ## Mocking & Testing
//! - Every trait is annotated for `mockall` so tests can script the remote
//!   side deterministically (`MockAssignmentSource`, `MockNoteStore`, ...).
//! - Stateful in-memory stand-ins live in [`crate::memory`].
//!
//! ## Errors
//! - Each trait returns the typed error of its boundary
//!   ([`TransportError`], [`StorageError`]); the reconciler maps them into
//!   [`crate::error::SyncError`].

use async_trait::async_trait;

#[cfg(any(test, feature = "test-export-mocks"))]
use mockall::automock;

use crate::assignment::RemoteAssignment;
use crate::cache::AssignmentCache;
use crate::error::{StorageError, TransportError};
use crate::pagination::ResponseHeaders;
use crate::settings::Settings;

/// One page of a paginated assignment listing.
#[derive(Debug, Clone, Default)]
pub struct AssignmentPage {
    pub assignments: Vec<RemoteAssignment>,
    pub headers: ResponseHeaders,
}

/// Read-only access to the remote assignment API.
///
/// Implementors attach authentication to every request. Failures are not
/// retried.
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
#[async_trait]
pub trait AssignmentSource: Send + Sync {
    /// Fetch one page (zero-based index) of a course's assignments, page size
    /// [`crate::pagination::PAGE_SIZE`].
    async fn fetch_page(&self, course_id: u64, page: u32)
        -> Result<AssignmentPage, TransportError>;

    /// Fetch a single assignment.
    async fn fetch_assignment(
        &self,
        course_id: u64,
        assignment_id: u64,
    ) -> Result<RemoteAssignment, TransportError>;
}

/// File operations on the note vault. Paths are vault-relative and
/// `/`-separated.
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
#[async_trait]
pub trait NoteStore: Send + Sync {
    async fn folder_exists(&self, path: &str) -> Result<bool, StorageError>;

    async fn create_folder(&self, path: &str) -> Result<(), StorageError>;

    async fn exists(&self, path: &str) -> Result<bool, StorageError>;

    async fn read(&self, path: &str) -> Result<String, StorageError>;

    /// Create a new note. Fails with [`StorageError::AlreadyExists`] if one is
    /// already there.
    async fn create(&self, path: &str, content: &str) -> Result<(), StorageError>;

    /// Replace the content of an existing note.
    async fn modify(&self, path: &str, content: &str) -> Result<(), StorageError>;
}

/// Durable storage for settings and cache, loaded and saved as a unit.
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
#[async_trait]
pub trait StateStore: Send + Sync {
    async fn load(&self) -> Result<(Settings, AssignmentCache), StorageError>;

    async fn save(&self, settings: &Settings, cache: &AssignmentCache)
        -> Result<(), StorageError>;
}

/// Converts an assignment's HTML description into markdown.
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
pub trait HtmlConverter: Send + Sync {
    fn to_markdown(&self, html: &str) -> String;
}
