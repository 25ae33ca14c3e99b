//! Session controller: the studio's single active project.
//!
//! The controller owns an in-memory working copy of the open project. Edits
//! mutate that copy immediately and arm the autosave coordinator; the copy
//! reaches the repository only through a commit (scheduled, manual or the
//! final flush on close). Time is always passed in by the caller, so a timer
//! driver decides when `tick` runs.

use std::sync::Arc;

use chrono::{DateTime, Utc};

use cipher_core::file_set::{self, FileSetChange};
use cipher_core::{
    AutosaveCoordinator, CommitTicket, EditOutcome, FileMap, FileSetError, ProjectRecord,
    ValidationError,
};
use cipher_store::{KeyedStore, ProjectRepository};

use crate::error::SessionError;
use crate::event::SessionEvent;

/// Result of a manual save request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SaveOutcome {
    Saved(ProjectRecord),
    /// A commit is already in flight; the request was dropped.
    AlreadySaving,
}

#[derive(Debug)]
struct ActiveProject {
    record: ProjectRecord,
    active_path: String,
}

pub struct SessionController<S> {
    repo: Arc<ProjectRepository<S>>,
    autosave: AutosaveCoordinator,
    active: Option<ActiveProject>,
    events: Vec<SessionEvent>,
}

impl<S: KeyedStore> SessionController<S> {
    pub fn new(repo: Arc<ProjectRepository<S>>, autosave: AutosaveCoordinator) -> Self {
        Self {
            repo,
            autosave,
            active: None,
            events: Vec::new(),
        }
    }

    pub fn repository(&self) -> &ProjectRepository<S> {
        &self.repo
    }

    // ─── Read access ─────────────────────────────────────────────────

    /// In-memory working copy of the open project.
    pub fn project(&self) -> Option<&ProjectRecord> {
        self.active.as_ref().map(|a| &a.record)
    }

    pub fn files(&self) -> Option<&FileMap> {
        self.project().map(|r| &r.files)
    }

    pub fn active_path(&self) -> Option<&str> {
        self.active.as_ref().map(|a| a.active_path.as_str())
    }

    pub fn autosave(&self) -> &AutosaveCoordinator {
        &self.autosave
    }

    pub fn is_dirty(&self) -> bool {
        self.active.is_some() && self.autosave.is_dirty()
    }

    /// Deadline of the pending autosave, for the timer driver.
    pub fn next_deadline(&self) -> Option<DateTime<Utc>> {
        self.autosave.deadline()
    }

    /// Drain queued notifications.
    pub fn take_events(&mut self) -> Vec<SessionEvent> {
        std::mem::take(&mut self.events)
    }

    // ─── Project selection ───────────────────────────────────────────

    /// Load `id` as the active project. A previously open project is closed
    /// first, flushing its outstanding edits.
    pub fn open_project(&mut self, id: &str, now: DateTime<Utc>) -> Result<(), SessionError> {
        if self.project().is_some_and(|p| p.id == id) {
            return Ok(());
        }
        self.close(now)?;

        let record = self.repo.get_project(id).map_err(|e| {
            tracing::warn!(project_id = %id, error = %e, "cannot open project");
            SessionError::from(e)
        })?;
        let active_path = file_set::default_active_path(&record.files)
            .or_else(|| record.files.keys().next().cloned())
            .unwrap_or_default();

        self.reset_autosave();
        tracing::info!(project_id = %record.id, files = record.files.len(), "project opened");
        self.events.push(SessionEvent::ProjectOpened {
            project_id: record.id.clone(),
        });
        self.events.push(SessionEvent::FilesChanged {
            files: record.files.clone(),
            active_path: active_path.clone(),
        });
        self.active = Some(ActiveProject {
            record,
            active_path,
        });
        Ok(())
    }

    /// Leave the active project. Cancels the pending autosave and, when
    /// autosave is on and edits are outstanding, commits them first.
    ///
    /// If that final commit fails the project stays open and the error is
    /// returned; use [`Self::discard`] to leave anyway.
    pub fn close(&mut self, now: DateTime<Utc>) -> Result<Option<ProjectRecord>, SessionError> {
        if self.active.is_none() {
            return Ok(None);
        }
        self.autosave.cancel();
        let flushed = match self.autosave.begin_flush() {
            Some(ticket) => Some(self.commit(ticket, now)?),
            None => None,
        };
        self.discard();
        Ok(flushed)
    }

    /// Drop the active project without saving.
    pub fn discard(&mut self) {
        self.autosave.cancel();
        if let Some(active) = self.active.take() {
            if self.autosave.is_dirty() {
                tracing::warn!(project_id = %active.record.id, "closing project with unsaved edits");
            }
            tracing::info!(project_id = %active.record.id, "project closed");
            self.events.push(SessionEvent::ProjectClosed {
                project_id: active.record.id,
            });
        }
        self.reset_autosave();
    }

    // ─── File-set edits ──────────────────────────────────────────────

    pub fn create_file(&mut self, path: &str, now: DateTime<Utc>) -> Result<(), SessionError> {
        let change = file_set::create_file(&self.active_ref()?.record.files, path);
        self.apply_change(change, now)
    }

    pub fn delete_file(&mut self, path: &str, now: DateTime<Utc>) -> Result<(), SessionError> {
        let active = self.active_ref()?;
        let change = file_set::delete_file(&active.record.files, path, &active.active_path);
        self.apply_change(change, now)
    }

    pub fn rename_file(
        &mut self,
        old_path: &str,
        new_path: &str,
        now: DateTime<Utc>,
    ) -> Result<(), SessionError> {
        let change = file_set::rename_file(&self.active_ref()?.record.files, old_path, new_path);
        self.apply_change(change, now)
    }

    fn apply_change(
        &mut self,
        change: Result<FileSetChange, FileSetError>,
        now: DateTime<Utc>,
    ) -> Result<(), SessionError> {
        let change = change.map_err(|e| self.reject(e.into()))?;
        let active = self.active.as_mut().ok_or(SessionError::NoActiveProject)?;
        active.record.files = change.files;
        let path_changed = active.active_path != change.active_path;
        active.active_path = change.active_path;

        self.events.push(SessionEvent::FilesChanged {
            files: active.record.files.clone(),
            active_path: active.active_path.clone(),
        });
        if path_changed {
            self.events.push(SessionEvent::ActiveFileChanged {
                path: active.active_path.clone(),
            });
        }
        self.record_edit(now);
        Ok(())
    }

    // ─── Collaborator hooks ──────────────────────────────────────────

    /// The viewed file changed. Not an edit: autosave is not armed.
    pub fn select_file(&mut self, path: &str) -> Result<(), SessionError> {
        if !self.active_ref()?.record.files.contains_key(path) {
            return Err(self.reject(FileSetError::NotFound(path.to_string()).into()));
        }
        let active = self.active.as_mut().ok_or(SessionError::NoActiveProject)?;
        if active.active_path != path {
            active.active_path = path.to_string();
            self.events.push(SessionEvent::ActiveFileChanged {
                path: path.to_string(),
            });
        }
        Ok(())
    }

    /// File text edited in the sandboxed editor.
    pub fn update_content(
        &mut self,
        path: &str,
        content: impl Into<String>,
        now: DateTime<Utc>,
    ) -> Result<(), SessionError> {
        let files = file_set::update_content(&self.active_ref()?.record.files, path, content);
        let files = files.map_err(|e| self.reject(e.into()))?;
        let active = self.active.as_mut().ok_or(SessionError::NoActiveProject)?;
        active.record.files = files;
        self.record_edit(now);
        Ok(())
    }

    /// Whole-map change emitted by the collaborator, optionally with a new
    /// active path. Treated like any other edit for autosave purposes.
    pub fn apply_external_change(
        &mut self,
        files: FileMap,
        active_path: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<(), SessionError> {
        let current = self.active_ref()?.active_path.clone();
        let next_path = file_set::validate_file_map(&files).and_then(|()| match active_path {
            Some(path) if files.contains_key(path) => Ok(path.to_string()),
            Some(path) => Err(FileSetError::NotFound(path.to_string())),
            None if files.contains_key(&current) => Ok(current.clone()),
            None => Ok(file_set::default_active_path(&files).unwrap_or_default()),
        });
        let next_path = next_path.map_err(|e| self.reject(e.into()))?;

        let active = self.active.as_mut().ok_or(SessionError::NoActiveProject)?;
        active.record.files = files;
        if current != next_path {
            active.active_path = next_path.clone();
            self.events.push(SessionEvent::ActiveFileChanged { path: next_path });
        }
        self.record_edit(now);
        Ok(())
    }

    /// Change the open project's display name. Committed like a file edit.
    pub fn rename_project(&mut self, name: &str, now: DateTime<Utc>) -> Result<(), SessionError> {
        self.active_ref()?;
        if name.trim().is_empty() {
            return Err(self.reject(ValidationError::EmptyName.into()));
        }
        let active = self.active.as_mut().ok_or(SessionError::NoActiveProject)?;
        active.record.name = name.to_string();
        self.record_edit(now);
        Ok(())
    }

    /// Queue a rejection notice; in-memory state is left untouched.
    fn reject(&mut self, err: SessionError) -> SessionError {
        tracing::debug!(error = %err, "operation rejected");
        self.events.push(SessionEvent::OperationRejected {
            message: err.to_string(),
            severity: err.severity(),
        });
        err
    }

    fn record_edit(&mut self, now: DateTime<Utc>) {
        match self.autosave.record_edit(now) {
            EditOutcome::Armed { deadline } => tracing::trace!(%deadline, "autosave armed"),
            EditOutcome::Deferred => tracing::trace!("autosave off; edit kept in memory"),
        }
    }

    // ─── Commits ─────────────────────────────────────────────────────

    /// Explicit save. Ignored while another commit is in flight.
    pub fn save(&mut self, now: DateTime<Utc>) -> Result<SaveOutcome, SessionError> {
        self.active_ref()?;
        match self.autosave.begin_manual() {
            Some(ticket) => self.commit(ticket, now).map(SaveOutcome::Saved),
            None => Ok(SaveOutcome::AlreadySaving),
        }
    }

    /// Run the scheduled autosave if its deadline has passed.
    pub fn tick(&mut self, now: DateTime<Utc>) -> Result<Option<ProjectRecord>, SessionError> {
        if self.active.is_none() {
            return Ok(None);
        }
        match self.autosave.begin_scheduled(now) {
            Some(ticket) => self.commit(ticket, now).map(Some),
            None => Ok(None),
        }
    }

    pub fn set_autosave(&mut self, enabled: bool) {
        self.autosave.set_enabled(enabled);
        tracing::debug!(enabled, "autosave toggled");
    }

    fn commit(
        &mut self,
        ticket: CommitTicket,
        now: DateTime<Utc>,
    ) -> Result<ProjectRecord, SessionError> {
        let trigger = ticket.trigger;
        let snapshot = match self.active.as_ref() {
            Some(active) => active.record.clone(),
            None => {
                self.autosave.finish(ticket, false);
                return Err(SessionError::NoActiveProject);
            }
        };

        match self.repo.save_project(&snapshot, now) {
            Ok(saved) => {
                self.autosave.finish(ticket, true);
                if let Some(active) = self.active.as_mut() {
                    active.record.updated_at = saved.updated_at;
                }
                tracing::info!(project_id = %saved.id, ?trigger, updated_at = %saved.updated_at, "project committed");
                self.events.push(SessionEvent::Saved {
                    updated_at: saved.updated_at,
                    trigger,
                });
                Ok(saved)
            }
            Err(e) => {
                self.autosave.finish(ticket, false);
                let err = SessionError::from(e);
                tracing::warn!(project_id = %snapshot.id, ?trigger, error = %err, "commit failed");
                self.events.push(SessionEvent::SaveFailed {
                    trigger,
                    message: err.to_string(),
                });
                Err(err)
            }
        }
    }

    // ─── Helpers ─────────────────────────────────────────────────────

    /// Fresh coordinator for the next project; debounce and the on/off
    /// setting carry over.
    fn reset_autosave(&mut self) {
        self.autosave = AutosaveCoordinator::new(self.autosave.debounce(), self.autosave.is_enabled());
    }

    fn active_ref(&self) -> Result<&ActiveProject, SessionError> {
        self.active.as_ref().ok_or(SessionError::NoActiveProject)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeDelta;
    use cipher_core::{AutosaveState, CommitTrigger, FileEntry};
    use crate::error::Severity;
    use cipher_store::{MemoryStore, RepoError};

    fn ts(s: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(s)
            .expect("valid RFC3339")
            .with_timezone(&Utc)
    }

    fn t0() -> DateTime<Utc> {
        ts("2026-02-25T12:00:00Z")
    }

    fn at(ms: i64) -> DateTime<Utc> {
        t0() + TimeDelta::milliseconds(ms)
    }

    fn setup() -> (SessionController<MemoryStore>, String) {
        setup_with(MemoryStore::new())
    }

    fn setup_with(store: MemoryStore) -> (SessionController<MemoryStore>, String) {
        let repo = Arc::new(ProjectRepository::new(store));
        let id = repo.create_project("Demo", t0()).expect("create").id;
        let mut session =
            SessionController::new(repo, AutosaveCoordinator::with_debounce_ms(1500, true));
        session.open_project(&id, t0()).expect("open");
        session.take_events();
        (session, id)
    }

    fn stored(session: &SessionController<MemoryStore>, id: &str) -> ProjectRecord {
        session.repository().get_project(id).expect("stored")
    }

    #[test]
    fn open_selects_app_js() {
        let (session, id) = setup();
        assert_eq!(session.active_path(), Some("/App.js"));
        assert_eq!(session.project().map(|p| p.id.as_str()), Some(id.as_str()));
    }

    #[test]
    fn open_unknown_project_is_not_found() {
        let repo = Arc::new(ProjectRepository::new(MemoryStore::new()));
        let mut session = SessionController::new(repo, AutosaveCoordinator::default());
        let err = session.open_project("ghost", t0()).expect_err("missing");
        assert!(matches!(err, SessionError::ProjectNotFound(ref id) if id == "ghost"));
        assert!(session.project().is_none());
    }

    #[test]
    fn edits_without_project_are_rejected() {
        let repo = Arc::new(ProjectRepository::new(MemoryStore::new()));
        let mut session = SessionController::new(repo, AutosaveCoordinator::default());
        assert!(matches!(
            session.create_file("/a.js", t0()),
            Err(SessionError::NoActiveProject)
        ));
    }

    #[test]
    fn create_file_updates_memory_and_arms_autosave() {
        let (mut session, id) = setup();
        session.create_file("/utils.js", at(0)).expect("create");

        assert_eq!(session.active_path(), Some("/utils.js"));
        assert!(session.files().expect("files").contains_key("/utils.js"));
        assert_eq!(session.next_deadline(), Some(at(1500)));
        // not persisted yet
        assert!(!stored(&session, &id).files.contains_key("/utils.js"));

        let events = session.take_events();
        assert!(matches!(events[0], SessionEvent::FilesChanged { .. }));
        assert_eq!(
            events[1],
            SessionEvent::ActiveFileChanged {
                path: "/utils.js".into()
            }
        );
    }

    #[test]
    fn debounced_burst_commits_once_with_latest_state() {
        let (mut session, id) = setup();
        session.update_content("/App.js", "v1", at(0)).expect("edit");
        session.update_content("/App.js", "v2", at(500)).expect("edit");
        session.update_content("/App.js", "v3", at(1000)).expect("edit");

        let mut commits = Vec::new();
        let mut t = 0;
        while t <= 5000 {
            if session.tick(at(t)).expect("tick").is_some() {
                commits.push(t);
            }
            t += 100;
        }
        assert_eq!(commits, vec![2500]);

        let record = stored(&session, &id);
        assert_eq!(record.files["/App.js"].content, "v3");
        assert_eq!(record.updated_at, at(2500));
        assert!(!session.is_dirty());
    }

    #[test]
    fn rejected_edit_leaves_state_and_timer_alone() {
        let (mut session, _) = setup();
        let before = session.files().cloned();
        let err = session.create_file("/App.js", at(0)).expect_err("duplicate");
        assert!(matches!(err, SessionError::FileSet(FileSetError::DuplicatePath(_))));
        assert_eq!(session.files().cloned(), before);
        assert_eq!(session.autosave().state(), AutosaveState::Idle);
        assert!(matches!(
            session.take_events().as_slice(),
            [SessionEvent::OperationRejected {
                severity: Severity::Rejection,
                ..
            }]
        ));
    }

    #[test]
    fn delete_active_file_moves_selection() {
        let (mut session, _) = setup();
        session.delete_file("/App.js", at(0)).expect("delete");
        let active = session.active_path().expect("active").to_string();
        assert_ne!(active, "/App.js");
        assert!(session.files().expect("files").contains_key(&active));
    }

    #[test]
    fn manual_save_commits_immediately() {
        let (mut session, id) = setup();
        session.set_autosave(false);
        session.rename_file("/styles.css", "/main.css", at(0)).expect("rename");
        assert_eq!(session.next_deadline(), None);

        let outcome = session.save(at(10)).expect("save");
        let SaveOutcome::Saved(saved) = outcome else {
            panic!("expected a commit");
        };
        assert_eq!(saved.updated_at, at(10));
        assert!(stored(&session, &id).files.contains_key("/main.css"));
        assert!(session.take_events().iter().any(|e| matches!(
            e,
            SessionEvent::Saved {
                trigger: CommitTrigger::Manual,
                ..
            }
        )));
    }

    #[test]
    fn disabled_autosave_never_fires() {
        let (mut session, id) = setup();
        session.set_autosave(false);
        session.update_content("/App.js", "offline", at(0)).expect("edit");
        for t in (0..10_000).step_by(500) {
            assert!(session.tick(at(t)).expect("tick").is_none());
        }
        assert!(session.is_dirty());
        assert_ne!(stored(&session, &id).files["/App.js"].content, "offline");
    }

    #[test]
    fn select_file_does_not_arm() {
        let (mut session, _) = setup();
        session.select_file("/index.js").expect("select");
        assert_eq!(session.active_path(), Some("/index.js"));
        assert_eq!(session.next_deadline(), None);
        assert!(matches!(
            session.select_file("/nope"),
            Err(SessionError::FileSet(FileSetError::NotFound(_)))
        ));
    }

    #[test]
    fn external_change_counts_as_edit() {
        let (mut session, id) = setup();
        let mut files = session.files().cloned().expect("files");
        files.insert("/extra.js".into(), FileEntry::visible("1"));
        session
            .apply_external_change(files, Some("/extra.js"), at(0))
            .expect("apply");
        assert_eq!(session.active_path(), Some("/extra.js"));
        assert_eq!(session.next_deadline(), Some(at(1500)));

        session.tick(at(1500)).expect("tick").expect("committed");
        assert!(stored(&session, &id).files.contains_key("/extra.js"));
    }

    #[test]
    fn external_change_without_visible_files_is_rejected() {
        let (mut session, _) = setup();
        let files = FileMap::from([("/only".to_string(), FileEntry::hidden("x"))]);
        assert!(matches!(
            session.apply_external_change(files, None, at(0)),
            Err(SessionError::FileSet(FileSetError::NoVisibleFiles))
        ));
    }

    #[test]
    fn close_flushes_outstanding_edits() {
        let (mut session, id) = setup();
        session.create_file("/late.js", at(0)).expect("create");
        let flushed = session.close(at(200)).expect("close").expect("flushed");
        assert_eq!(flushed.updated_at, at(200));
        assert!(stored(&session, &id).files.contains_key("/late.js"));
        assert!(session.project().is_none());
        assert_eq!(session.next_deadline(), None);
    }

    #[test]
    fn close_without_autosave_does_not_flush() {
        let (mut session, id) = setup();
        session.set_autosave(false);
        session.create_file("/draft.js", at(0)).expect("create");
        assert!(session.close(at(100)).expect("close").is_none());
        assert!(!stored(&session, &id).files.contains_key("/draft.js"));
    }

    #[test]
    fn failed_commit_keeps_edits_and_reports() {
        let (mut session, id) = setup_with(MemoryStore::new().with_quota(8 * 1024));
        session
            .update_content("/App.js", "x".repeat(16 * 1024), at(0))
            .expect("edit");
        let err = session.tick(at(1500)).expect_err("over quota");
        assert!(matches!(err, SessionError::NotSaved(_)));
        assert!(session.is_dirty());
        assert_eq!(session.files().expect("files")["/App.js"].content.len(), 16 * 1024);
        assert!(session.take_events().iter().any(|e| matches!(e, SessionEvent::SaveFailed { .. })));
        // no automatic retry
        assert!(session.tick(at(5000)).expect("tick").is_none());
        assert!(stored(&session, &id).files["/App.js"].content.len() < 16 * 1024);

        // a failed final flush keeps the project open
        assert!(session.close(at(6000)).is_err());
        assert!(session.project().is_some());
        session.discard();
        assert!(session.project().is_none());
    }

    #[test]
    fn rename_project_is_committed() {
        let (mut session, id) = setup();
        assert!(matches!(
            session.rename_project("  ", at(0)),
            Err(SessionError::Validation(_))
        ));
        session.rename_project("Renamed", at(0)).expect("rename");
        session.tick(at(1500)).expect("tick");
        assert_eq!(stored(&session, &id).name, "Renamed");
    }

    #[test]
    fn switching_projects_flushes_previous() {
        let (mut session, first) = setup();
        let second = session
            .repository()
            .create_project("Other", t0())
            .expect("create")
            .id;
        session.create_file("/pending.js", at(0)).expect("create");
        session.open_project(&second, at(300)).expect("switch");

        assert!(stored(&session, &first).files.contains_key("/pending.js"));
        assert_eq!(session.project().map(|p| p.id.clone()), Some(second));
        assert!(!session.is_dirty());
        assert_eq!(session.next_deadline(), None);
    }

    #[test]
    fn project_deleted_elsewhere_then_reopened_is_not_found() {
        let (mut session, id) = setup();
        session.close(at(0)).expect("close");
        session.repository().delete_project(&id).expect("delete");
        let err = session.open_project(&id, at(10)).expect_err("gone");
        assert!(matches!(err, SessionError::ProjectNotFound(_)));
        assert!(matches!(
            session.repository().get_project(&id),
            Err(RepoError::NotFound(_))
        ));
    }
}
