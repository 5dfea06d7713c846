//! Error types shared by the core pipeline.
//!
//! Each collaborator boundary has its own error so callers can tell a bad
//! configuration line apart from a dead network or a full disk. [`SyncError`]
//! is what the reconciler hands back to its caller; every variant aborts the
//! run it came from.

/// A course rule line could not be turned into a [`crate::course::CourseConfig`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CourseRuleError {
    /// The `id` key is absent.
    #[error("course rule has no `id`")]
    MissingId,

    /// The `id` value is not an integer.
    #[error("course rule id `{0}` is not an integer")]
    InvalidId(String),

    /// A segment of the rule has no `=`.
    #[error("course rule segment `{0}` is not of the form `key = value`")]
    MalformedSegment(String),

    /// The key is one the renderer writes itself.
    #[error("course rule key `{0}` is reserved")]
    ReservedKey(String),

    /// A line inside a multi-line block failed; the whole block is rejected.
    #[error("line {line}: {source}")]
    AtLine {
        line: usize,
        #[source]
        source: Box<CourseRuleError>,
    },
}

/// The total page count could not be derived from a list response.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PaginationError {
    #[error("response has no Link header")]
    MissingLinkHeader,

    #[error("Link header has no rel=\"last\" page: {0}")]
    MissingLastPage(String),
}

/// The remote API could not be reached or answered with a failure.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("request to {url} failed: {message}")]
    Request { url: String, message: String },

    #[error("{url} answered with status {status}")]
    Status { url: String, status: u16 },

    #[error("could not decode response from {url}: {message}")]
    Decode { url: String, message: String },
}

/// A note file or the persisted state could not be read or written.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("no note at {0}")]
    NotFound(String),

    #[error("note already exists at {0}")]
    AlreadyExists(String),

    #[error("could not (de)serialise {what}: {message}")]
    Serde { what: String, message: String },
}

/// A settings change was refused.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("invalid course rules: {0}")]
    CourseRules(#[from] CourseRuleError),

    #[error("API host must not be empty")]
    EmptyApiHost,
}

/// Fatal outcome of a synchronisation run.
#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    #[error("pagination failed for course {course_id}: {source}")]
    Pagination {
        course_id: u64,
        #[source]
        source: PaginationError,
    },

    #[error("transport failed for course {course_id}: {source}")]
    Transport {
        course_id: u64,
        #[source]
        source: TransportError,
    },

    #[error("storage failed: {0}")]
    Storage(#[from] StorageError),

    #[error("a synchronisation is already running")]
    AlreadyRunning,

    #[error("course {0} is not configured")]
    UnknownCourse(u64),
}
