mod common;

use async_trait::async_trait;
use canvas_notes_core::assignment::RemoteAssignment;
use canvas_notes_core::cache::{AssignmentCache, CachedAssignment};
use canvas_notes_core::contract::{AssignmentPage, AssignmentSource, MockAssignmentSource};
use canvas_notes_core::error::{SyncError, TransportError};
use canvas_notes_core::memory::{MemoryNoteStore, MemoryStateStore, NoteWrite};
use canvas_notes_core::pagination::ResponseHeaders;
use canvas_notes_core::synchronise::{AssignmentOutcome, Reconciler, SyncState};
use chrono::{TimeZone, Utc};
use common::*;
use mockall::Sequence;

#[tokio::test]
async fn test_new_assignments_create_notes_and_cache_entries() {
    let source = serving(
        7,
        vec![
            assignment(1, 7, "Quiz 1/2", "2024-01-10T09:00:00Z"),
            assignment(2, 7, "Essay: \"Draft\"", "2024-01-11T09:00:00Z"),
        ],
    );
    let reconciler = reconciler(source, settings(vec![course(7, "School/English")]), AssignmentCache::new());

    let report = reconciler.sync_all().await.expect("sync should succeed");

    assert_eq!(report.courses.len(), 1);
    let course_report = &report.courses[0];
    assert_eq!(course_report.fetched, 2);
    assert_eq!(
        course_report.created,
        vec![
            "School/English/Quiz 1_2.md".to_string(),
            "School/English/Essay_ 'Draft'.md".to_string(),
        ]
    );

    let notes = reconciler.notes();
    assert_eq!(
        notes.writes(),
        vec![
            NoteWrite::CreateFolder("School/English".to_string()),
            NoteWrite::Create("School/English/Quiz 1_2.md".to_string()),
            NoteWrite::Create("School/English/Essay_ 'Draft'.md".to_string()),
        ]
    );

    let state = reconciler.state().await;
    assert_eq!(state.cache.len(), 2);
    assert_eq!(
        state.cache.get(1),
        Some(&CachedAssignment {
            name: "Quiz 1/2".to_string(),
            course_id: 7,
            last_updated: "2024-01-10T09:00:00Z".to_string(),
            file_path: "School/English/Quiz 1_2.md".to_string(),
        })
    );

    // Cache persisted once, after the course.
    assert_eq!(reconciler.store().save_count(), 1);
    assert_eq!(reconciler.store().saved_cache(), state.cache);
}

#[tokio::test]
async fn test_second_run_without_remote_changes_writes_nothing() {
    let source = serving(
        7,
        vec![
            assignment(1, 7, "Lab 1", "2024-01-10T09:00:00Z"),
            assignment(2, 7, "Lab 2", "2024-01-11T09:00:00Z"),
        ],
    );
    let reconciler = reconciler(source, settings(vec![course(7, "Labs")]), AssignmentCache::new());

    reconciler.sync_all().await.expect("first run");
    let cache_after_first = reconciler.state().await.cache;
    let notes_after_first: Vec<_> = reconciler
        .notes()
        .paths()
        .into_iter()
        .map(|p| reconciler.notes().note(&p))
        .collect();
    reconciler.notes().clear_writes();

    let report = reconciler.sync_all().await.expect("second run");

    let course_report = &report.courses[0];
    assert_eq!(course_report.unchanged, 2);
    assert_eq!(course_report.writes(), 0);
    assert!(reconciler.notes().writes().is_empty(), "no file should be touched");
    assert_eq!(reconciler.state().await.cache, cache_after_first);
    let notes_after_second: Vec<_> = reconciler
        .notes()
        .paths()
        .into_iter()
        .map(|p| reconciler.notes().note(&p))
        .collect();
    assert_eq!(notes_after_first, notes_after_second);
}

#[tokio::test]
async fn test_changed_assignment_only_rewrites_schedule_fields() {
    let path = "Labs/Lab 1.md";
    let mut cache = AssignmentCache::new();
    cache.insert(
        1,
        CachedAssignment {
            name: "Lab 1".to_string(),
            course_id: 7,
            last_updated: "2024-01-10T09:00:00Z".to_string(),
            file_path: path.to_string(),
        },
    );

    let hand_edited = "---\ntags:\n  - assignment\ndue: 2024-02-01 23:59:00\nassigned: 2024-01-10\nurl: https://canvas.test/courses/7/assignments/1\ndone: true\n---\n\n## Description\n\nMy own notes about the lab.\n\n## Rubric\n\n- [x] **Thesis** (5 points)\n";

    let mut changed = assignment(1, 7, "Lab 1", "2024-01-20T12:00:00Z");
    changed.due_at = Some(Utc.with_ymd_and_hms(2024, 2, 8, 17, 0, 0).unwrap());
    changed.created_at = Utc.with_ymd_and_hms(2024, 1, 12, 8, 0, 0).unwrap();
    changed.description = Some("<p>Completely different text</p>".to_string());

    let source = serving(7, vec![changed]);
    let reconciler = reconciler(source, settings(vec![course(7, "Labs")]), cache);
    reconciler.notes().seed(path, hand_edited);

    let report = reconciler.sync_all().await.expect("sync should succeed");

    assert_eq!(report.courses[0].updated, vec![path.to_string()]);
    let updated = reconciler.notes().note(path).expect("note still there");
    let expected = hand_edited
        .replace("due: 2024-02-01 23:59:00", "due: 2024-02-08 17:00:00")
        .replace("assigned: 2024-01-10", "assigned: 2024-01-12");
    assert_eq!(updated, expected);

    let body_before = hand_edited.split_once("---\n\n").map(|(_, b)| b);
    let body_after = updated.split_once("---\n\n").map(|(_, b)| b);
    assert_eq!(body_before, body_after, "body must be byte-identical");

    assert_eq!(
        reconciler.state().await.cache.get(1).map(|r| r.last_updated.as_str()),
        Some("2024-01-20T12:00:00Z")
    );
    assert_eq!(
        reconciler.notes().writes(),
        vec![NoteWrite::CreateFolder("Labs".to_string()), NoteWrite::Modify(path.to_string())]
    );
}

#[tokio::test]
async fn test_changed_assignment_with_deleted_note_is_recreated_at_cached_path() {
    let source = {
        let mut source = MockAssignmentSource::new();
        let mut seq = Sequence::new();
        source
            .expect_fetch_page()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|c, _| Ok(page(c, 1, vec![assignment(1, c, "Lab 1", "v1")])));
        source
            .expect_fetch_page()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|c, _| Ok(page(c, 1, vec![assignment(1, c, "Lab 1 (renamed)", "v2")])));
        source
    };
    let reconciler = reconciler(source, settings(vec![course(7, "Labs")]), AssignmentCache::new());

    reconciler.sync_all().await.expect("first run");
    let first_content = reconciler.notes().remove("Labs/Lab 1.md").expect("note created");

    let report = reconciler.sync_all().await.expect("second run");

    // Same path as cached, even though the name changed remotely.
    assert_eq!(report.courses[0].recreated, vec!["Labs/Lab 1.md".to_string()]);
    assert_eq!(reconciler.notes().note("Labs/Lab 1.md"), Some(first_content));
    assert_eq!(reconciler.notes().paths(), vec!["Labs/Lab 1.md".to_string()]);
    assert_eq!(
        reconciler.state().await.cache.get(1).map(|r| r.last_updated.clone()),
        Some("v2".to_string())
    );
}

#[tokio::test]
async fn test_recreated_note_gets_its_cached_folder_back() {
    let source = serving(7, vec![assignment(1, 7, "Lab 1", "v2")]);
    let mut cache = AssignmentCache::new();
    cache.insert(
        1,
        CachedAssignment {
            name: "Lab 1".to_string(),
            course_id: 7,
            last_updated: "v1".to_string(),
            file_path: "Old/Lab 1.md".to_string(),
        },
    );
    let reconciler = reconciler(source, settings(vec![course(7, "New")]), cache);

    let report = reconciler.sync_all().await.expect("sync should succeed");

    assert_eq!(report.courses[0].recreated, vec!["Old/Lab 1.md".to_string()]);
    assert_eq!(
        reconciler.notes().writes(),
        vec![
            NoteWrite::CreateFolder("New".to_string()),
            NoteWrite::CreateFolder("Old".to_string()),
            NoteWrite::Create("Old/Lab 1.md".to_string()),
        ]
    );
}

#[tokio::test]
async fn test_untracked_note_at_new_path_is_left_alone() {
    let source = serving(7, vec![assignment(1, 7, "Lab 1", "v1")]);
    let reconciler = reconciler(source, settings(vec![course(7, "Labs")]), AssignmentCache::new());
    reconciler.notes().seed("Labs/Lab 1.md", "hand written");

    let report = reconciler.sync_all().await.expect("sync should succeed");

    assert_eq!(report.courses[0].collisions, vec!["Labs/Lab 1.md".to_string()]);
    assert_eq!(reconciler.notes().note("Labs/Lab 1.md").as_deref(), Some("hand written"));
    let state = reconciler.state().await;
    assert_eq!(
        state.cache.get(1).map(|r| r.file_path.as_str()),
        Some("Labs/Lab 1.md"),
        "new ids are tracked even when the write is skipped"
    );
}

#[tokio::test]
async fn test_pages_fetched_in_order_and_concatenated() {
    let mut source = MockAssignmentSource::new();
    let mut seq = Sequence::new();
    for (index, ids) in [(0u32, [1u64, 2]), (1, [3, 4]), (2, [5, 6])] {
        source
            .expect_fetch_page()
            .withf(move |c, p| *c == 7 && *p == index)
            .times(1)
            .in_sequence(&mut seq)
            .returning(move |c, _| {
                Ok(page(
                    c,
                    3,
                    ids.iter()
                        .map(|id| assignment(*id, c, &format!("Task {id}"), "v1"))
                        .collect(),
                ))
            });
    }
    let reconciler = reconciler(source, settings(vec![course(7, "")]), AssignmentCache::new());

    let report = reconciler.sync_all().await.expect("sync should succeed");

    let created: Vec<_> = report.courses[0].created.clone();
    assert_eq!(
        created,
        (1..=6).map(|id| format!("Task {id}.md")).collect::<Vec<_>>()
    );
    // Empty folder means the vault root: no folder is created.
    assert!(!reconciler
        .notes()
        .writes()
        .iter()
        .any(|w| matches!(w, NoteWrite::CreateFolder(_))));
}

#[tokio::test]
async fn test_missing_page_count_aborts_run_after_earlier_courses() {
    let mut source = MockAssignmentSource::new();
    source
        .expect_fetch_page()
        .withf(|c, _| *c == 7)
        .returning(|c, _| Ok(page(c, 1, vec![assignment(1, c, "Lab 1", "v1")])));
    source.expect_fetch_page().withf(|c, _| *c == 8).returning(|c, _| {
        Ok(AssignmentPage {
            assignments: vec![assignment(2, c, "Essay", "v1")],
            headers: [("Content-Type", "application/json")].into_iter().collect(),
        })
    });
    let reconciler = reconciler(
        source,
        settings(vec![course(7, "Labs"), course(8, "Essays"), course(9, "Never")]),
        AssignmentCache::new(),
    );

    let err = reconciler.sync_all().await.expect_err("sync should fail");

    assert!(
        matches!(err, SyncError::Pagination { course_id: 8, .. }),
        "unexpected error: {err:?}"
    );
    assert_eq!(reconciler.notes().paths(), vec!["Labs/Lab 1.md".to_string()]);
    assert_eq!(reconciler.store().save_count(), 1, "only the first course was persisted");
    assert!(reconciler.state().await.cache.get(2).is_none());
}

#[tokio::test]
async fn test_transport_failure_on_later_page_aborts_without_writes() {
    let mut source = MockAssignmentSource::new();
    source
        .expect_fetch_page()
        .withf(|_, p| *p == 0)
        .returning(|c, _| Ok(page(c, 2, vec![assignment(1, c, "Lab 1", "v1")])));
    source.expect_fetch_page().withf(|_, p| *p == 1).returning(|_, _| {
        Err(TransportError::Status {
            url: "https://canvas.test/api/v1/courses/7/assignments?page=2&per_page=100".to_string(),
            status: 401,
        })
    });
    let reconciler = reconciler(source, settings(vec![course(7, "Labs")]), AssignmentCache::new());

    let err = reconciler.sync_all().await.expect_err("sync should fail");

    assert!(matches!(err, SyncError::Transport { course_id: 7, .. }));
    assert!(reconciler.notes().paths().is_empty());
    assert_eq!(reconciler.store().save_count(), 0);
}

#[tokio::test]
async fn test_refresh_single_assignment_updates_existing_note() {
    let mut source = serving(7, vec![assignment(1, 7, "Lab 1", "v1")]);
    source
        .expect_fetch_assignment()
        .withf(|c, a| *c == 7 && *a == 1)
        .times(1)
        .returning(|c, a| {
            let mut refreshed = assignment(a, c, "Lab 1", "v2");
            refreshed.due_at = None;
            Ok(refreshed)
        });
    let reconciler = reconciler(source, settings(vec![course(7, "Labs")]), AssignmentCache::new());
    reconciler.sync_all().await.expect("initial sync");

    let outcome = reconciler.refresh_assignment(7, 1).await.expect("refresh");

    assert_eq!(outcome, AssignmentOutcome::Updated("Labs/Lab 1.md".to_string()));
    let note = reconciler.notes().note("Labs/Lab 1.md").expect("note");
    assert!(note.contains("\ndue:\n"), "due should be cleared: {note}");
    assert_eq!(reconciler.store().save_count(), 2);
}

#[tokio::test]
async fn test_refresh_unknown_course_is_rejected() {
    let reconciler = reconciler(
        MockAssignmentSource::new(),
        settings(vec![course(7, "Labs")]),
        AssignmentCache::new(),
    );

    let err = reconciler.refresh_assignment(99, 1).await.expect_err("unknown course");

    assert!(matches!(err, SyncError::UnknownCourse(99)));
}

/// Yields once before answering so a second run can try to start meanwhile.
struct SlowSource;

#[async_trait]
impl AssignmentSource for SlowSource {
    async fn fetch_page(&self, course_id: u64, _page: u32) -> Result<AssignmentPage, TransportError> {
        tokio::task::yield_now().await;
        Ok(page(course_id, 1, vec![assignment(1, course_id, "Lab 1", "v1")]))
    }

    async fn fetch_assignment(
        &self,
        course_id: u64,
        assignment_id: u64,
    ) -> Result<RemoteAssignment, TransportError> {
        Ok(assignment(assignment_id, course_id, "Lab 1", "v1"))
    }
}

#[tokio::test]
async fn test_overlapping_runs_are_refused() {
    let settings = settings(vec![course(7, "Labs")]);
    let reconciler = Reconciler::new(
        SlowSource,
        MemoryNoteStore::new(),
        MemoryStateStore::new(settings.clone(), AssignmentCache::new()),
        SyncState {
            settings,
            cache: AssignmentCache::new(),
        },
    )
    .with_zone(utc());

    let (first, second) = tokio::join!(reconciler.sync_all(), reconciler.sync_all());

    assert!(first.is_ok());
    assert!(matches!(second, Err(SyncError::AlreadyRunning)));
    assert_eq!(reconciler.notes().paths(), vec!["Labs/Lab 1.md".to_string()]);
}

#[tokio::test]
async fn test_load_builds_reconciler_from_persisted_state() {
    let mut cache = AssignmentCache::new();
    cache.insert(
        1,
        CachedAssignment {
            name: "Lab 1".to_string(),
            course_id: 7,
            last_updated: "v1".to_string(),
            file_path: "Labs/Lab 1.md".to_string(),
        },
    );
    let store = MemoryStateStore::new(settings(vec![course(7, "Labs")]), cache.clone());
    let source = serving(7, vec![assignment(1, 7, "Lab 1", "v1")]);

    let reconciler = Reconciler::load(source, MemoryNoteStore::new(), store)
        .await
        .expect("load");
    let report = reconciler.sync_all().await.expect("sync");

    assert_eq!(report.courses[0].unchanged, 1);
    assert_eq!(reconciler.state().await.cache, cache);
}

#[test]
fn test_headers_fixture_has_link() {
    let headers: ResponseHeaders = link_headers(7, 4);
    assert!(headers.get("link").is_some());
}
