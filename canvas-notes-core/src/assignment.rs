//! Assignment records as returned by the Canvas assignments API.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One assignment from `GET /courses/{course_id}/assignments`.
///
/// `updated_at` is kept as the raw string the API sent: it is compared
/// verbatim against the cache and never reformatted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemoteAssignment {
    pub id: u64,
    pub name: String,
    /// HTML body.
    #[serde(default)]
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: String,
    #[serde(default)]
    pub due_at: Option<DateTime<Utc>>,
    pub course_id: u64,
    #[serde(rename = "has_submitted_submissions", default)]
    pub has_submission: bool,
    #[serde(rename = "html_url")]
    pub url: String,
    #[serde(default)]
    pub rubric: Option<Vec<RubricCriterion>>,
}

/// A scored rubric row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RubricCriterion {
    pub points: f64,
    pub description: String,
    #[serde(default)]
    pub long_description: Option<String>,
}
