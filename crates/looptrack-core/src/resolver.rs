//! Reference resolver: master document mentions vs. defined task files.

use std::collections::{BTreeMap, BTreeSet};

use regex::Regex;
use serde::Serialize;

use crate::domain::{Issue, IssueKind, LoopResult, TaskId, WorkflowState};
use crate::lint::lint_files;
use crate::store::TaskFile;

/// Extracts task-id mentions such as `Taskmaster: AUTH-01` from free text.
#[derive(Debug, Clone)]
pub struct ReferenceResolver {
    mention: Regex,
    pending_marker: String,
}

impl ReferenceResolver {
    /// `reference_marker` is matched literally and may be followed by whitespace.
    /// A line containing `pending_marker` contributes no mentions.
    pub fn new(reference_marker: &str, pending_marker: &str) -> LoopResult<Self> {
        let mention = Regex::new(&format!(r"{}\s*([A-Z0-9-]+)", regex::escape(reference_marker)))?;
        Ok(Self {
            mention,
            pending_marker: pending_marker.to_string(),
        })
    }

    /// Task ids the document requires to exist.
    pub fn required_ids(&self, document: &str) -> BTreeSet<TaskId> {
        document
            .lines()
            .filter(|line| self.pending_marker.is_empty() || !line.contains(&self.pending_marker))
            .flat_map(|line| self.mention.captures_iter(line))
            .filter_map(|caps| caps.get(1))
            .map(|m| TaskId::new(m.as_str()))
            .collect()
    }

    /// Required ids that no task file defines, sorted.
    pub fn missing_ids(&self, document: &str, defined: &BTreeSet<TaskId>) -> Vec<TaskId> {
        self.required_ids(document)
            .into_iter()
            .filter(|id| !defined.contains(id))
            .collect()
    }
}

/// Aggregate result of `validate`.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ValidationReport {
    pub files_checked: usize,
    pub required: BTreeSet<TaskId>,
    pub defined: BTreeSet<TaskId>,
    pub issues: Vec<Issue>,
}

impl ValidationReport {
    pub fn passed(&self) -> bool {
        self.issues.is_empty()
    }
}

/// Runs every consistency check and merges the findings.
///
/// Order of the issue list: per-file lint issues, duplicate ids, missing
/// references, then the workflow-state cross-check.
pub fn validate(
    files: &[TaskFile],
    document: Option<&str>,
    state: &WorkflowState,
    resolver: &ReferenceResolver,
) -> ValidationReport {
    let mut issues = lint_files(files);

    let mut defined: BTreeMap<TaskId, &TaskFile> = BTreeMap::new();
    for file in files {
        let Some(id) = file.defined_id() else { continue };
        if let Some(first) = defined.get(&id) {
            issues.push(Issue::in_file(
                &file.path,
                IssueKind::DuplicateTaskId {
                    id,
                    first: first.path.clone(),
                },
            ));
            continue;
        }
        defined.insert(id, file);
    }
    let defined_ids: BTreeSet<TaskId> = defined.keys().cloned().collect();

    let (required, missing) = match document {
        Some(doc) => (
            resolver.required_ids(doc),
            resolver.missing_ids(doc, &defined_ids),
        ),
        None => (BTreeSet::new(), Vec::new()),
    };
    issues.extend(
        missing
            .into_iter()
            .map(|id| Issue::global(IssueKind::MissingReferencedTask { id })),
    );

    issues.extend(cross_check_state(state, &defined));

    ValidationReport {
        files_checked: files.len(),
        required,
        defined: defined_ids,
        issues,
    }
}

fn cross_check_state(
    state: &WorkflowState,
    defined: &BTreeMap<TaskId, &TaskFile>,
) -> Option<Issue> {
    let id = state.current_task_id.as_ref().filter(|id| !id.is_empty())?;
    let Some(file) = defined.get(id) else {
        return Some(Issue::global(IssueKind::UnresolvedStateTask { id: id.clone() }));
    };

    let state_step = state.current_loop_step?;
    let task_step = file
        .record
        .as_ref()
        .ok()
        .and_then(|r| r.loop_step)
        .map(|s| s.value());
    if task_step.map(i64::from) == Some(state_step) {
        return None;
    }
    Some(Issue::in_file(
        &file.path,
        IssueKind::StateTaskMismatch {
            id: id.clone(),
            state_step,
            task_step,
        },
    ))
}
