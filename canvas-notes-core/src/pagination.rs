//! Page fetching for paginated list endpoints.
//!
//! Canvas reports paging through an RFC 8288 `Link` header:
//!
//! ```text
//! <https://host/api/v1/courses/1/assignments?page=1&per_page=100>; rel="current",
//! <https://host/api/v1/courses/1/assignments?page=3&per_page=100>; rel="last"
//! ```
//!
//! The `page` of the `rel="last"` link is the total page count. Without it no
//! page beyond the first can be trusted, so its absence is fatal for the course.

use std::sync::OnceLock;

use regex::Regex;
use tracing::{debug, error, info};

use crate::assignment::RemoteAssignment;
use crate::contract::AssignmentSource;
use crate::error::{PaginationError, SyncError};

pub const PAGE_SIZE: u32 = 100;

/// Response header pairs, in the order the transport saw them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResponseHeaders(Vec<(String, String)>);

impl ResponseHeaders {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.0.push((name.into(), value.into()));
    }

    /// Look up a header: exact name first, then lowercase, then any casing.
    pub fn get(&self, name: &str) -> Option<&str> {
        let lower = name.to_ascii_lowercase();
        self.find(|n| n == name)
            .or_else(|| self.find(|n| n == lower))
            .or_else(|| self.find(|n| n.eq_ignore_ascii_case(name)))
    }

    fn find(&self, matches: impl Fn(&str) -> bool) -> Option<&str> {
        self.0
            .iter()
            .find(|(n, _)| matches(n))
            .map(|(_, v)| v.as_str())
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for ResponseHeaders {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

fn last_page_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r#"<[^>]*[?&]page=(\d+)[^>]*>\s*;\s*rel="last""#)
            .expect("last-page pattern is a valid regex")
    })
}

/// Total number of pages announced by a list response.
pub fn total_pages(headers: &ResponseHeaders) -> Result<u32, PaginationError> {
    let link = headers
        .get("Link")
        .ok_or(PaginationError::MissingLinkHeader)?;
    last_page_pattern()
        .captures(link)
        .and_then(|caps| caps.get(1))
        .and_then(|page| page.as_str().parse::<u32>().ok())
        .ok_or_else(|| PaginationError::MissingLastPage(link.to_string()))
}

/// Fetch every assignment of a course, pages in increasing order, one at a time.
///
/// Remote order is preserved; nothing is re-sorted.
pub async fn fetch_all_assignments<S>(
    source: &S,
    course_id: u64,
) -> Result<Vec<RemoteAssignment>, SyncError>
where
    S: AssignmentSource + ?Sized,
{
    let first = source
        .fetch_page(course_id, 0)
        .await
        .map_err(|source| {
            error!(course_id, error = %source, "[SYNC][ERROR] First page fetch failed");
            SyncError::Transport { course_id, source }
        })?;

    let pages = total_pages(&first.headers).map_err(|source| {
        error!(course_id, error = %source, "[SYNC][ERROR] Could not derive page count");
        SyncError::Pagination { course_id, source }
    })?;
    info!(course_id, pages, "[SYNC] Paging through assignments");

    let mut assignments = first.assignments;
    for page in 1..pages {
        let next = source.fetch_page(course_id, page).await.map_err(|source| {
            error!(course_id, page, error = %source, "[SYNC][ERROR] Page fetch failed");
            SyncError::Transport { course_id, source }
        })?;
        debug!(course_id, page, count = next.assignments.len(), "Fetched page");
        assignments.extend(next.assignments);
    }

    Ok(assignments)
}
