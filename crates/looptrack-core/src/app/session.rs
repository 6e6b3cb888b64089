//! Session - the per-invocation context.
//!
//! Everything an operation needs (paths, markers, clock, profile source,
//! change signal) is wired once by [`SessionBuilder`] and passed around
//! explicitly. There is no process-wide state.

use std::fs;
use std::path::PathBuf;

use serde::Serialize;
use tracing::debug;

use super::drafts::{DraftScan, scan_drafts};
use super::report::{self, ProgressReport, ReportInputs, TaskView, WrapUpReport};
use crate::config::{LoopConfig, STAGE_ZERO_SCOPES, WRAP_UP_SCOPES};
use crate::domain::{Issue, IssueKind, LoopResult, StateUpdate, WorkflowState};
use crate::lint::lint_files;
use crate::ports::{ChangeSignal, Clock, GitStatus, ProfileConfig, ProfileSource, SystemClock};
use crate::resolver::{ReferenceResolver, ValidationReport, validate};
use crate::store::{LoadedState, StateStore, TaskDirectory};

/// Builds a [`Session`].
///
/// # Example
/// ```ignore
/// let session = SessionBuilder::new(LoopConfig::from_env(root))
///     .clock(FixedClock::new(at))
///     .build()?;
/// ```
///
/// `build()` compiles the reference marker, so a bad marker fails before
/// any file is read.
pub struct SessionBuilder {
    config: LoopConfig,
    clock: Option<Box<dyn Clock>>,
    profile: Option<Box<dyn ProfileSource>>,
    changes: Option<Box<dyn ChangeSignal>>,
}

impl SessionBuilder {
    pub fn new(config: LoopConfig) -> Self {
        Self {
            config,
            clock: None,
            profile: None,
            changes: None,
        }
    }

    pub fn clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Some(Box::new(clock));
        self
    }

    pub fn profile(mut self, profile: impl ProfileSource + 'static) -> Self {
        self.profile = Some(Box::new(profile));
        self
    }

    pub fn changes(mut self, changes: impl ChangeSignal + 'static) -> Self {
        self.changes = Some(Box::new(changes));
        self
    }

    /// Unset collaborators default to the wall clock, the discovered
    /// profile config and `git status` in the project root.
    pub fn build(self) -> LoopResult<Session> {
        let resolver =
            ReferenceResolver::new(&self.config.reference_marker, &self.config.pending_marker)?;
        let profile_config = ProfileConfig::discover(
            self.config.profile_config.clone(),
            &self.config.project_root,
        );
        let root = self.config.project_root.clone();

        Ok(Session {
            tasks: TaskDirectory::new(&self.config.tasks_dir),
            state: StateStore::new(&self.config.state_file),
            resolver,
            clock: self.clock.unwrap_or_else(|| Box::new(SystemClock)),
            profile: self
                .profile
                .unwrap_or_else(|| Box::new(profile_config.clone())),
            changes: self.changes.unwrap_or_else(|| Box::new(GitStatus::new(root))),
            profile_config,
            config: self.config,
        })
    }
}

/// Outcome of `lint`.
#[derive(Debug, Clone, Default, Serialize)]
pub struct LintReport {
    pub files_checked: usize,
    pub issues: Vec<Issue>,
}

impl LintReport {
    pub fn passed(&self) -> bool {
        self.issues.is_empty()
    }
}

pub struct Session {
    config: LoopConfig,
    tasks: TaskDirectory,
    state: StateStore,
    resolver: ReferenceResolver,
    profile_config: ProfileConfig,
    clock: Box<dyn Clock>,
    profile: Box<dyn ProfileSource>,
    changes: Box<dyn ChangeSignal>,
}

impl Session {
    /// Field checks over every task file.
    pub fn lint(&self) -> LoopResult<LintReport> {
        let files = self.tasks.load()?;
        Ok(LintReport {
            files_checked: files.len(),
            issues: lint_files(&files),
        })
    }

    /// Lint plus master-document references plus the workflow-state cross-check.
    pub fn validate(&self) -> LoopResult<ValidationReport> {
        let files = self.tasks.load()?;
        let state = self.state.load().state;

        let path = &self.config.master_doc;
        let (document, read_issue) = match fs::read_to_string(path) {
            Ok(text) => (Some(text), None),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "no master document, nothing is referenced");
                (None, None)
            }
            Err(e) => (
                None,
                Some(Issue::in_file(
                    path,
                    IssueKind::UnreadableFile {
                        reason: e.to_string(),
                    },
                )),
            ),
        };

        let mut report = validate(&files, document.as_deref(), &state, &self.resolver);
        report.issues.extend(read_issue);
        Ok(report)
    }

    pub fn progress_report(&self) -> LoopResult<ProgressReport> {
        let records = self.tasks.load_records()?;
        let tasks = TaskView::all(&records);
        let state = self.state.load().state;
        let changes = self.changes.changed_paths(&scopes(&STAGE_ZERO_SCOPES));
        let profile = self.profile.active_profile();

        Ok(report::progress_report(
            ReportInputs {
                tasks: &tasks,
                state: &state,
                changes: &changes,
                profile: profile.as_deref(),
            },
            &self.config.watched_docs,
        ))
    }

    pub fn wrap_up_report(&self) -> LoopResult<WrapUpReport> {
        let records = self.tasks.load_records()?;
        let tasks = TaskView::all(&records);
        let state = self.state.load().state;
        let changes = self.changes.changed_paths(&scopes(&WRAP_UP_SCOPES));
        let profile = self.profile.active_profile();

        Ok(report::wrap_up_report(ReportInputs {
            tasks: &tasks,
            state: &state,
            changes: &changes,
            profile: profile.as_deref(),
        }))
    }

    pub fn update_state(&self, update: &StateUpdate) -> LoopResult<WorkflowState> {
        self.state.update(update, self.clock.as_ref())
    }

    pub fn show_state(&self) -> LoadedState {
        self.state.load()
    }

    pub fn state_path(&self) -> PathBuf {
        self.state.path().to_path_buf()
    }

    pub fn active_profile(&self) -> Option<String> {
        self.profile.active_profile()
    }

    pub fn set_profile(&self, name: &str) -> LoopResult<PathBuf> {
        self.profile_config.set_active(name)
    }

    pub fn drafts(&self) -> DraftScan {
        scan_drafts(&self.config.drafts_dir, &self.config.published_dir)
    }
}

fn scopes(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| s.to_string()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ResolvedStage, TaskId};
    use crate::ports::{FixedClock, FixedProfile, StaticChanges};
    use chrono::{TimeZone, Utc};
    use std::path::Path;
    use tempfile::{TempDir, tempdir};

    const TASK: &str = "\
id: AUTH-01
title: Login
loop_step: 3
preconditions:
  - schema
refs:
  - docs/service/service-definition.md
required_tests:
  - make tests-core
post_updates:
  - docs/service/tech-guide.md#auth
acceptance:
  - user can log in
";

    fn project() -> TempDir {
        let dir = tempdir().unwrap();
        let tasks = dir.path().join("docs").join("tasks");
        fs::create_dir_all(&tasks).unwrap();
        fs::write(tasks.join("AUTH-01.yaml"), TASK).unwrap();
        fs::write(
            tasks.join("LIB-02.yaml"),
            TASK.replace("AUTH-01", "LIB-02").replace("loop_step: 3", "loop_step: 7"),
        )
        .unwrap();
        fs::create_dir_all(dir.path().join("docs").join("service")).unwrap();
        dir
    }

    fn session(root: &Path) -> Session {
        SessionBuilder::new(LoopConfig::for_root(root))
            .clock(FixedClock::new(Utc.with_ymd_and_hms(2025, 1, 2, 3, 4, 5).unwrap()))
            .profile(FixedProfile(Some("design".into())))
            .changes(StaticChanges(vec![" M docs/service/tech-guide.md".into()]))
            .build()
            .unwrap()
    }

    fn write_master(root: &Path, text: &str) {
        fs::write(
            root.join("docs").join("service").join("service-definition.md"),
            text,
        )
        .unwrap();
    }

    #[test]
    fn lint_passes_on_valid_tasks() {
        let dir = project();
        let report = session(dir.path()).lint().unwrap();
        assert_eq!(report.files_checked, 2);
        assert!(report.passed(), "{:?}", report.issues);
    }

    #[test]
    fn lint_without_task_directory_is_an_error() {
        let dir = tempdir().unwrap();
        assert!(session(dir.path()).lint().is_err());
    }

    #[test]
    fn validate_reports_missing_reference_and_state_mismatch() {
        let dir = project();
        write_master(
            dir.path(),
            concat!(
                "| a | Taskmaster: AUTH-01 |\n",
                "| b | Taskmaster: NEW-09 |\n",
                "| c | Taskmaster: LATER-1 (not yet authored) |\n",
            ),
        );
        let session = session(dir.path());
        session
            .update_state(&StateUpdate {
                current_task_id: Some(TaskId::new("AUTH-01")),
                current_loop_step: Some(5),
                ..StateUpdate::default()
            })
            .unwrap();

        let report = session.validate().unwrap();

        let kinds: Vec<&IssueKind> = report.issues.iter().map(|i| &i.kind).collect();
        assert_eq!(
            kinds,
            vec![
                &IssueKind::MissingReferencedTask { id: TaskId::new("NEW-09") },
                &IssueKind::StateTaskMismatch {
                    id: TaskId::new("AUTH-01"),
                    state_step: 5,
                    task_step: Some(3),
                },
            ]
        );
    }

    #[test]
    fn validate_without_master_document_checks_the_rest() {
        let dir = project();
        let report = session(dir.path()).validate().unwrap();
        assert!(report.passed());
        assert!(report.required.is_empty());
    }

    #[test]
    fn unreadable_master_document_is_an_issue() {
        let dir = project();
        let mut config = LoopConfig::for_root(dir.path());
        // a directory exists but cannot be read as text
        config.master_doc = dir.path().join("docs").join("service");
        let session = SessionBuilder::new(config)
            .profile(FixedProfile(None))
            .changes(StaticChanges::default())
            .build()
            .unwrap();

        let report = session.validate().unwrap();

        assert!(!report.passed());
        assert_eq!(report.issues.len(), 1);
        assert_eq!(report.issues[0].path, Some(dir.path().join("docs").join("service")));
        assert!(matches!(report.issues[0].kind, IssueKind::UnreadableFile { .. }));
    }

    #[test]
    fn progress_report_reads_state_and_collaborators() {
        let dir = project();
        let session = session(dir.path());
        session
            .update_state(&StateUpdate {
                current_task_id: Some(TaskId::new("AUTH-01")),
                current_loop_step: Some(2),
                ..StateUpdate::default()
            })
            .unwrap();

        let report = session.progress_report().unwrap();

        assert_eq!(report.profile, "design");
        assert_eq!(report.stage, ResolvedStage::Known(3));
        assert_eq!(report.next_action, "write the comment skeleton");
        assert_eq!(report.pending.len(), 1);
        assert_eq!(report.required_tests, vec!["make tests-core"]);
    }

    #[test]
    fn wrap_up_report_uses_changes() {
        let dir = project();
        let session = session(dir.path());
        session
            .update_state(&StateUpdate {
                current_task_id: Some(TaskId::new("AUTH-01")),
                last_tests: Some("make tests-core".into()),
                ..StateUpdate::default()
            })
            .unwrap();

        let report = session.wrap_up_report().unwrap();
        let task = report.task.unwrap();
        assert_eq!(task.file_name, "AUTH-01.yaml");
        assert_eq!(task.post_updates[0].status, report::UpdateStatus::Changed);
        assert_eq!(report.last_tests, vec!["make tests-core"]);
    }

    #[test]
    fn state_update_is_stamped_by_the_session_clock() {
        let dir = project();
        let session = session(dir.path());
        let state = session.update_state(&StateUpdate::notes("hi")).unwrap();
        assert_eq!(
            state.updated_at,
            Some(Utc.with_ymd_and_hms(2025, 1, 2, 3, 4, 5).unwrap())
        );
        assert_eq!(session.show_state().state, state);
    }

    #[test]
    fn reference_marker_is_matched_literally() {
        let dir = tempdir().unwrap();
        let mut config = LoopConfig::for_root(dir.path());
        config.reference_marker = "Task[".into();
        // markers are escaped, so regex metacharacters are fine
        assert!(SessionBuilder::new(config).build().is_ok());
    }
}
