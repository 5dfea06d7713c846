//! Course rules: one line of `key = value; key = value` per Canvas course.
//!
//! ```text
//! # comment lines are skipped
//! id = 1234; folder = School/Physics; tags = physics, lab; semester = fall
//! ```
//!
//! `id` is required. `folder` and `tags` are optional. Any other key is kept,
//! in order, as an extra frontmatter line for every note of that course.

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::CourseRuleError;

/// Parsed form of one course rule line.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CourseConfig {
    pub id: u64,
    #[serde(default)]
    pub folder: String,
    #[serde(default)]
    pub extra_tags: Vec<String>,
    #[serde(default)]
    pub extra_frontmatter: Vec<(String, String)>,
}

/// Splits a rule into trimmed pairs, keeping source order.
fn split_pairs(line: &str) -> Result<Vec<(String, String)>, CourseRuleError> {
    line.split(';')
        .map(str::trim)
        .filter(|segment| !segment.is_empty())
        .map(|segment| {
            let (key, value) = segment
                .split_once('=')
                .ok_or_else(|| CourseRuleError::MalformedSegment(segment.to_string()))?;
            Ok((key.trim().to_string(), value.trim().to_string()))
        })
        .collect()
}

/// Frontmatter keys every note already carries.
const RESERVED_KEYS: &[&str] = &["due", "assigned", "url", "done"];

/// Parse a single course rule line.
pub fn parse_course_rule(line: &str) -> Result<CourseConfig, CourseRuleError> {
    let mut id = None;
    let mut folder = String::new();
    let mut extra_tags = Vec::new();
    let mut extra_frontmatter = Vec::new();

    for (key, value) in split_pairs(line)? {
        match key.as_str() {
            "id" => {
                let parsed = value
                    .parse::<u64>()
                    .map_err(|_| CourseRuleError::InvalidId(value.clone()))?;
                id = Some(parsed);
            }
            "folder" => folder = value,
            "tags" => {
                extra_tags = value
                    .split(',')
                    .map(str::trim)
                    .filter(|tag| !tag.is_empty())
                    .map(String::from)
                    .collect();
            }
            _ if RESERVED_KEYS.contains(&key.as_str()) => {
                return Err(CourseRuleError::ReservedKey(key));
            }
            _ => extra_frontmatter.push((key, value)),
        }
    }

    let id = id.ok_or(CourseRuleError::MissingId)?;
    debug!(course_id = id, folder = %folder, "Parsed course rule");
    Ok(CourseConfig {
        id,
        folder,
        extra_tags,
        extra_frontmatter,
    })
}

/// Parse a whole block of rules. Blank lines and `#` comments are skipped.
///
/// The block is accepted only if every line parses; the first bad line is
/// reported with its 1-based line number.
pub fn parse_course_rules(text: &str) -> Result<Vec<CourseConfig>, CourseRuleError> {
    let mut courses = Vec::new();
    for (index, line) in text.lines().enumerate() {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        match parse_course_rule(trimmed) {
            Ok(course) => courses.push(course),
            Err(e) => {
                warn!(line = index + 1, error = %e, "Rejecting course rules");
                return Err(CourseRuleError::AtLine {
                    line: index + 1,
                    source: Box::new(e),
                });
            }
        }
    }
    Ok(courses)
}
