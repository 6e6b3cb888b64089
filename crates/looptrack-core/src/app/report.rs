//! Reconciler and progress reports.
//!
//! Both reports are pure functions of their inputs: task records in file
//! order, the workflow state, the changed-path entries and the profile name.
//! Nothing here writes back.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::domain::{LoopStep, ResolvedStage, TaskId, TaskRecord, WorkflowState};

pub const UNKNOWN_PROFILE: &str = "unknown";

/// A task record together with the file it came from.
#[derive(Debug, Clone, Copy)]
pub struct TaskView<'a> {
    pub path: &'a Path,
    pub record: &'a TaskRecord,
}

impl<'a> TaskView<'a> {
    pub fn new(path: &'a Path, record: &'a TaskRecord) -> Self {
        Self { path, record }
    }

    /// Views over loaded `(path, record)` pairs.
    pub fn all(records: &'a [(PathBuf, TaskRecord)]) -> Vec<TaskView<'a>> {
        records.iter().map(|(p, r)| TaskView::new(p, r)).collect()
    }

    fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DocStatus {
    Changed,
    Clean,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WatchedDoc {
    pub path: String,
    pub status: DocStatus,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TaskSummary {
    pub id: TaskId,
    pub loop_step: Option<LoopStep>,
    pub title: String,
}

impl TaskSummary {
    fn of(record: &TaskRecord) -> Self {
        Self {
            id: record.id.clone(),
            loop_step: record.loop_step,
            title: record.title.clone(),
        }
    }
}

/// The task the workflow state points at.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FocusTask {
    pub id: TaskId,
    /// `None` when no task file defines the id.
    pub title: Option<String>,
}

/// Stage 0 report: where are we and what comes next.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProgressReport {
    pub profile: String,
    pub focus: Option<FocusTask>,
    pub stage: ResolvedStage,
    pub next_action: String,
    pub pending: Vec<TaskSummary>,
    pub watched: Vec<WatchedDoc>,
    pub changes: Vec<String>,
    pub required_tests: Vec<String>,
}

/// Inputs shared by both reports.
#[derive(Debug, Clone, Copy)]
pub struct ReportInputs<'a> {
    pub tasks: &'a [TaskView<'a>],
    pub state: &'a WorkflowState,
    pub changes: &'a [String],
    pub profile: Option<&'a str>,
}

impl<'a> ReportInputs<'a> {
    fn profile_name(&self) -> String {
        self.profile.unwrap_or(UNKNOWN_PROFILE).to_string()
    }

    fn active_task(&self) -> Option<&'a TaskView<'a>> {
        let id = self.state.current_task_id.as_ref()?;
        self.tasks.iter().find(|t| &t.record.id == id)
    }
}

/// Builds the stage 0 report.
pub fn progress_report(inputs: ReportInputs<'_>, watched_docs: &[String]) -> ProgressReport {
    let active = inputs.active_task();
    let stage = ResolvedStage::resolve(
        inputs.state.current_loop_step,
        active.and_then(|t| t.record.loop_step),
    );

    let focus = inputs
        .state
        .current_task_id
        .as_ref()
        .filter(|id| !id.is_empty())
        .map(|id| FocusTask {
            id: id.clone(),
            title: active.map(|t| t.record.title.clone()),
        });

    let pending: Vec<&TaskRecord> = inputs
        .tasks
        .iter()
        .map(|t| t.record)
        .filter(|r| r.is_pending())
        .collect();

    let watched = watched_docs
        .iter()
        .map(|doc| WatchedDoc {
            path: doc.clone(),
            status: if mentions(inputs.changes, doc) {
                DocStatus::Changed
            } else {
                DocStatus::Clean
            },
        })
        .collect();

    let test_sources = active
        .map(|t| t.record)
        .into_iter()
        .chain(pending.iter().copied());

    ProgressReport {
        profile: inputs.profile_name(),
        focus,
        stage,
        next_action: stage.next_action().to_string(),
        pending: pending.iter().map(|r| TaskSummary::of(r)).collect(),
        watched,
        changes: inputs.changes.to_vec(),
        required_tests: merge_required_tests(test_sources),
    }
}

/// `required_tests` of every source, first occurrence wins.
pub fn merge_required_tests<'a>(sources: impl IntoIterator<Item = &'a TaskRecord>) -> Vec<String> {
    let mut seen: HashSet<&'a str> = HashSet::new();
    let mut merged = Vec::new();
    for record in sources {
        for cmd in &record.required_tests {
            if seen.insert(cmd.as_str()) {
                merged.push(cmd.clone());
            }
        }
    }
    merged
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum UpdateStatus {
    Changed,
    NeedsCheck,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PostUpdate {
    pub item: String,
    pub status: UpdateStatus,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WrapUpTask {
    pub loop_step: Option<LoopStep>,
    pub file_name: String,
    pub post_updates: Vec<PostUpdate>,
}

/// Stage 7 report: what still has to be written back before the cycle closes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WrapUpReport {
    pub profile: String,
    pub current_task_id: Option<TaskId>,
    pub task: Option<WrapUpTask>,
    pub last_tests: Vec<String>,
    pub changes: Vec<String>,
}

/// Builds the stage 7 report.
pub fn wrap_up_report(inputs: ReportInputs<'_>) -> WrapUpReport {
    let task = inputs.active_task().map(|t| WrapUpTask {
        loop_step: t.record.loop_step,
        file_name: t.file_name(),
        post_updates: t
            .record
            .post_updates
            .iter()
            .map(|item| {
                // `docs/x.md#section` counts as changed when the file is.
                let target = item.split('#').next().unwrap_or_default();
                let status = if mentions(inputs.changes, target) {
                    UpdateStatus::Changed
                } else {
                    UpdateStatus::NeedsCheck
                };
                PostUpdate {
                    item: item.clone(),
                    status,
                }
            })
            .collect(),
    });

    WrapUpReport {
        profile: inputs.profile_name(),
        current_task_id: inputs.state.current_task_id.clone(),
        task,
        last_tests: inputs.state.last_test_commands(),
        changes: inputs.changes.to_vec(),
    }
}

fn mentions(changes: &[String], needle: &str) -> bool {
    changes.iter().any(|entry| entry.contains(needle))
}
