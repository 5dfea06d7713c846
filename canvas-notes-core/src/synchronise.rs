//! High-level pipeline: brings the notes of every configured course in line
//! with Canvas.
//!
//! For each course, in configuration order:
//!   - Ensures the course folder exists
//!   - Pages through all assignments (see [`crate::pagination`])
//!   - Compares each assignment against the [`AssignmentCache`] and either
//!     skips it, narrowly updates its note, recreates a vanished note, or
//!     creates a new one
//!   - Persists the cache once the course is done
//!
//! # Responsibilities
//! - Fail-fast: the first fatal error ends the whole run. Notes and cache
//!   entries from courses finished earlier in the run stay as they are.
//! - One run at a time: a second call while a run is in flight is refused
//!   with [`SyncError::AlreadyRunning`].
//! - The raw `updated_at` string is the only change signal.
//!
//! # Navigation
//! - Main entrypoint: [`Reconciler::sync_all`]
//! - Supporting types: [`SyncState`], [`SynchroniseReport`], [`CourseReport`].

use std::time::{Duration, Instant};

use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};

use crate::assignment::RemoteAssignment;
use crate::cache::{AssignmentCache, CachedAssignment};
use crate::contract::{AssignmentSource, HtmlConverter, NoteStore, StateStore};
use crate::course::CourseConfig;
use crate::error::SyncError;
use crate::html::RegexHtmlConverter;
use crate::pagination::fetch_all_assignments;
use crate::path::{note_path, parent_folder};
use crate::render::DisplayZone;
use crate::settings::Settings;

/// Settings and cache as held in memory between load and save.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SyncState {
    pub settings: Settings,
    pub cache: AssignmentCache,
}

/// What happened to a single assignment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AssignmentOutcome {
    /// Cache says nothing changed; nothing was read or written.
    Unchanged,
    /// New assignment, new note.
    Created(String),
    /// Changed assignment; `due`/`assigned` rewritten in place.
    Updated(String),
    /// Changed assignment whose note had disappeared; rendered again.
    Recreated(String),
    /// New assignment, but an untracked note already sits at its path.
    Collision(String),
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct CourseReport {
    pub course_id: u64,
    pub fetched: usize,
    pub unchanged: usize,
    pub created: Vec<String>,
    pub updated: Vec<String>,
    pub recreated: Vec<String>,
    pub collisions: Vec<String>,
}

impl CourseReport {
    fn record(&mut self, outcome: AssignmentOutcome) {
        match outcome {
            AssignmentOutcome::Unchanged => self.unchanged += 1,
            AssignmentOutcome::Created(path) => self.created.push(path),
            AssignmentOutcome::Updated(path) => self.updated.push(path),
            AssignmentOutcome::Recreated(path) => self.recreated.push(path),
            AssignmentOutcome::Collision(path) => self.collisions.push(path),
        }
    }

    /// Number of note files this course's sync wrote.
    pub fn writes(&self) -> usize {
        self.created.len() + self.updated.len() + self.recreated.len()
    }
}

#[derive(Debug, Default)]
pub struct SynchroniseReport {
    pub courses: Vec<CourseReport>,
    pub elapsed: Duration,
}

pub struct Reconciler<S, N, P> {
    source: S,
    notes: N,
    store: P,
    converter: Box<dyn HtmlConverter>,
    zone: DisplayZone,
    state: Mutex<SyncState>,
}

impl<S, N, P> Reconciler<S, N, P>
where
    S: AssignmentSource,
    N: NoteStore,
    P: StateStore,
{
    pub fn new(source: S, notes: N, store: P, state: SyncState) -> Self {
        Self {
            source,
            notes,
            store,
            converter: Box::new(RegexHtmlConverter),
            zone: DisplayZone::Local,
            state: Mutex::new(state),
        }
    }

    /// Build a reconciler from whatever the state store has persisted.
    pub async fn load(source: S, notes: N, store: P) -> Result<Self, SyncError> {
        let (settings, cache) = store.load().await?;
        info!(
            courses = settings.courses.len(),
            cached = cache.len(),
            "[SYNC] Loaded persisted state"
        );
        Ok(Self::new(source, notes, store, SyncState { settings, cache }))
    }

    pub fn with_converter(mut self, converter: Box<dyn HtmlConverter>) -> Self {
        self.converter = converter;
        self
    }

    pub fn with_zone(mut self, zone: DisplayZone) -> Self {
        self.zone = zone;
        self
    }

    /// Snapshot of the in-memory state. Waits for a running sync to finish.
    pub async fn state(&self) -> SyncState {
        self.state.lock().await.clone()
    }

    pub fn notes(&self) -> &N {
        &self.notes
    }

    pub fn store(&self) -> &P {
        &self.store
    }

    /// Synchronise every configured course, in order.
    pub async fn sync_all(&self) -> Result<SynchroniseReport, SyncError> {
        let started = Instant::now();
        let mut state = self.state.try_lock().map_err(|_| {
            warn!("[SYNC] Refusing to start: another synchronisation is running");
            SyncError::AlreadyRunning
        })?;

        let courses = state.settings.courses.clone();
        info!(courses = courses.len(), "[SYNC] Starting synchronisation");

        let mut report = SynchroniseReport::default();
        for course in &courses {
            match self.sync_course_locked(&mut state, course).await {
                Ok(course_report) => report.courses.push(course_report),
                Err(e) => {
                    error!(course_id = course.id, error = %e, "[SYNC][ERROR] Aborting run");
                    return Err(e);
                }
            }
        }

        report.elapsed = started.elapsed();
        info!(
            elapsed_ms = report.elapsed.as_millis() as u64,
            "[SYNC] Synchronisation complete"
        );
        Ok(report)
    }

    /// Synchronise one course.
    pub async fn sync_course(&self, course: &CourseConfig) -> Result<CourseReport, SyncError> {
        let mut state = self
            .state
            .try_lock()
            .map_err(|_| SyncError::AlreadyRunning)?;
        self.sync_course_locked(&mut state, course).await
    }

    /// Re-fetch a single assignment and reconcile just that one.
    pub async fn refresh_assignment(
        &self,
        course_id: u64,
        assignment_id: u64,
    ) -> Result<AssignmentOutcome, SyncError> {
        let mut state = self
            .state
            .try_lock()
            .map_err(|_| SyncError::AlreadyRunning)?;

        let course = state
            .settings
            .courses
            .iter()
            .find(|c| c.id == course_id)
            .cloned()
            .ok_or(SyncError::UnknownCourse(course_id))?;

        let assignment = self
            .source
            .fetch_assignment(course_id, assignment_id)
            .await
            .map_err(|source| {
                error!(course_id, assignment_id, error = %source, "[SYNC][ERROR] Fetch failed");
                SyncError::Transport { course_id, source }
            })?;

        self.ensure_folder(&course.folder).await?;
        let outcome = self.reconcile(&mut state, &course, &assignment).await?;
        self.store.save(&state.settings, &state.cache).await?;
        info!(course_id, assignment_id, ?outcome, "[SYNC] Refreshed assignment");
        Ok(outcome)
    }

    async fn sync_course_locked(
        &self,
        state: &mut SyncState,
        course: &CourseConfig,
    ) -> Result<CourseReport, SyncError> {
        info!(course_id = course.id, folder = %course.folder, "[SYNC] Synchronising course");
        self.ensure_folder(&course.folder).await?;

        let assignments = fetch_all_assignments(&self.source, course.id).await?;
        let mut report = CourseReport {
            course_id: course.id,
            fetched: assignments.len(),
            ..CourseReport::default()
        };

        for assignment in &assignments {
            let outcome = self.reconcile(state, course, assignment).await?;
            report.record(outcome);
        }

        self.store.save(&state.settings, &state.cache).await?;
        info!(
            course_id = course.id,
            fetched = report.fetched,
            unchanged = report.unchanged,
            created = report.created.len(),
            updated = report.updated.len(),
            recreated = report.recreated.len(),
            collisions = report.collisions.len(),
            "[SYNC] Course synchronised"
        );
        Ok(report)
    }

    async fn ensure_folder(&self, folder: &str) -> Result<(), SyncError> {
        let folder = folder.trim_end_matches('/');
        if folder.is_empty() || self.notes.folder_exists(folder).await? {
            return Ok(());
        }
        info!(folder, "[SYNC] Creating course folder");
        self.notes.create_folder(folder).await?;
        Ok(())
    }

    async fn reconcile(
        &self,
        state: &mut SyncState,
        course: &CourseConfig,
        assignment: &RemoteAssignment,
    ) -> Result<AssignmentOutcome, SyncError> {
        let known = state
            .cache
            .get(assignment.id)
            .map(|record| (record.last_updated.clone(), record.file_path.clone()));

        match known {
            Some((last_updated, _)) if last_updated == assignment.updated_at => {
                debug!(assignment_id = assignment.id, "Assignment unchanged");
                Ok(AssignmentOutcome::Unchanged)
            }
            Some((_, path)) => {
                let outcome = if self.notes.exists(&path).await? {
                    let note = self.notes.read(&path).await?;
                    let updated = self.zone.update(&note, assignment);
                    if updated != note {
                        self.notes.modify(&path, &updated).await?;
                    }
                    info!(assignment_id = assignment.id, path = %path, "[SYNC] Updated note");
                    AssignmentOutcome::Updated(path)
                } else {
                    // The cached folder may have gone with the note.
                    self.ensure_folder(parent_folder(&path)).await?;
                    let content = self.render(state, course, assignment);
                    self.notes.create(&path, &content).await?;
                    info!(assignment_id = assignment.id, path = %path, "[SYNC] Recreated missing note");
                    AssignmentOutcome::Recreated(path)
                };
                state.cache.touch(assignment.id, &assignment.updated_at);
                Ok(outcome)
            }
            None => {
                let path = note_path(&course.folder, &assignment.name);
                state.cache.insert(
                    assignment.id,
                    CachedAssignment {
                        name: assignment.name.clone(),
                        course_id: course.id,
                        last_updated: assignment.updated_at.clone(),
                        file_path: path.clone(),
                    },
                );

                if self.notes.exists(&path).await? {
                    warn!(
                        assignment_id = assignment.id,
                        path = %path,
                        "[SYNC] Untracked note already at path, leaving it alone"
                    );
                    return Ok(AssignmentOutcome::Collision(path));
                }

                let content = self.render(state, course, assignment);
                self.notes.create(&path, &content).await?;
                info!(assignment_id = assignment.id, path = %path, "[SYNC] Created note");
                Ok(AssignmentOutcome::Created(path))
            }
        }
    }

    fn render(
        &self,
        state: &SyncState,
        course: &CourseConfig,
        assignment: &RemoteAssignment,
    ) -> String {
        self.zone.render(
            assignment,
            course,
            state.settings.rubric_mode,
            self.converter.as_ref(),
        )
    }
}
