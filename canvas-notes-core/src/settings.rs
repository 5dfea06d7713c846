//! User settings and the only way to change them.
//!
//! Settings are never mutated field-by-field from the outside: callers build a
//! [`SettingsChange`] and run it through [`apply_change`], which validates it
//! and returns a new value. A rejected change leaves the old settings intact.

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::course::{parse_course_rules, CourseConfig};
use crate::error::ValidationError;
use crate::render::RubricMode;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub access_token: String,
    #[serde(default = "default_api_host")]
    pub api_host: String,
    #[serde(default)]
    pub rubric_mode: RubricMode,
    /// Parsed from `course_rules`; always in sync with it.
    #[serde(default)]
    pub courses: Vec<CourseConfig>,
    /// The raw text the user wrote, comments included.
    #[serde(default)]
    pub course_rules: String,
}

fn default_api_host() -> String {
    "https://canvas.instructure.com".to_string()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            access_token: String::new(),
            api_host: default_api_host(),
            rubric_mode: RubricMode::default(),
            courses: Vec::new(),
            course_rules: String::new(),
        }
    }
}

/// One user edit to the settings.
#[derive(Debug, Clone, PartialEq)]
pub enum SettingsChange {
    AccessToken(String),
    ApiHost(String),
    RubricMode(RubricMode),
    /// Replace the full course rules text.
    CourseRules(String),
}

/// Validate `change` and return the updated settings.
pub fn apply_change(
    settings: Settings,
    change: SettingsChange,
) -> Result<Settings, ValidationError> {
    let mut next = settings;
    match change {
        SettingsChange::AccessToken(token) => {
            next.access_token = token.trim().to_string();
        }
        SettingsChange::ApiHost(host) => {
            let host = host.trim().trim_end_matches('/');
            if host.is_empty() {
                warn!("Rejected empty API host");
                return Err(ValidationError::EmptyApiHost);
            }
            next.api_host = host.to_string();
        }
        SettingsChange::RubricMode(mode) => next.rubric_mode = mode,
        SettingsChange::CourseRules(text) => {
            let courses = parse_course_rules(&text)?;
            info!(courses = courses.len(), "Accepted course rules");
            next.courses = courses;
            next.course_rules = text;
        }
    }
    Ok(next)
}
