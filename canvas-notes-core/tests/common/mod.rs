#![allow(dead_code)]

use canvas_notes_core::assignment::{RemoteAssignment, RubricCriterion};
use canvas_notes_core::cache::AssignmentCache;
use canvas_notes_core::contract::{AssignmentPage, MockAssignmentSource};
use canvas_notes_core::course::CourseConfig;
use canvas_notes_core::memory::{MemoryNoteStore, MemoryStateStore};
use canvas_notes_core::pagination::ResponseHeaders;
use canvas_notes_core::render::DisplayZone;
use canvas_notes_core::settings::Settings;
use canvas_notes_core::synchronise::{Reconciler, SyncState};
use chrono::{FixedOffset, TimeZone, Utc};

pub const HOST: &str = "https://canvas.test";

pub fn assignment(id: u64, course_id: u64, name: &str, updated_at: &str) -> RemoteAssignment {
    RemoteAssignment {
        id,
        name: name.to_string(),
        description: Some("\n<h2>Task</h2><p>Write <strong>two</strong> pages.</p>".to_string()),
        created_at: Utc.with_ymd_and_hms(2024, 1, 10, 9, 0, 0).unwrap(),
        updated_at: updated_at.to_string(),
        due_at: Some(Utc.with_ymd_and_hms(2024, 2, 1, 23, 59, 0).unwrap()),
        course_id,
        has_submission: false,
        url: format!("{HOST}/courses/{course_id}/assignments/{id}"),
        rubric: Some(vec![
            RubricCriterion {
                points: 5.0,
                description: "Thesis".to_string(),
                long_description: Some("Clear and arguable".to_string()),
            },
            RubricCriterion {
                points: 2.5,
                description: "Citations".to_string(),
                long_description: None,
            },
        ]),
    }
}

pub fn link_headers(course_id: u64, last: u32) -> ResponseHeaders {
    let base = format!("{HOST}/api/v1/courses/{course_id}/assignments");
    let link = format!(
        "<{base}?page=1&per_page=100>; rel=\"current\",<{base}?page=1&per_page=100>; rel=\"first\",<{base}?page={last}&per_page=100>; rel=\"last\""
    );
    [("Link", link)].into_iter().collect()
}

pub fn page(course_id: u64, last: u32, assignments: Vec<RemoteAssignment>) -> AssignmentPage {
    AssignmentPage {
        assignments,
        headers: link_headers(course_id, last),
    }
}

pub fn course(id: u64, folder: &str) -> CourseConfig {
    CourseConfig {
        id,
        folder: folder.to_string(),
        extra_tags: vec!["essay".to_string()],
        extra_frontmatter: vec![("semester".to_string(), "spring".to_string())],
    }
}

pub fn settings(courses: Vec<CourseConfig>) -> Settings {
    Settings {
        access_token: "token".to_string(),
        api_host: HOST.to_string(),
        courses,
        ..Settings::default()
    }
}

pub fn utc() -> DisplayZone {
    DisplayZone::Fixed(FixedOffset::east_opt(0).unwrap())
}

pub type TestReconciler = Reconciler<MockAssignmentSource, MemoryNoteStore, MemoryStateStore>;

pub fn reconciler(
    source: MockAssignmentSource,
    settings: Settings,
    cache: AssignmentCache,
) -> TestReconciler {
    let store = MemoryStateStore::new(settings.clone(), cache.clone());
    Reconciler::new(
        source,
        MemoryNoteStore::new(),
        store,
        SyncState { settings, cache },
    )
    .with_zone(utc())
}

/// A source that serves the same single page of a course on every call.
pub fn serving(course_id: u64, assignments: Vec<RemoteAssignment>) -> MockAssignmentSource {
    let mut source = MockAssignmentSource::new();
    source
        .expect_fetch_page()
        .withf(move |c, p| *c == course_id && *p == 0)
        .returning(move |c, _| Ok(page(c, 1, assignments.clone())));
    source
}
