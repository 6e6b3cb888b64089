//! Issue - validation findings.
//!
//! Issues are data, not errors: lint and validate collect every issue from
//! every file and only then decide the exit status.

use serde::Serialize;
use std::fmt;
use std::path::{Path, PathBuf};

use super::{TaskField, TaskId};

/// What is wrong.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum IssueKind {
    MissingRequiredField { field: TaskField },
    /// `raw` is `None` when the key is absent altogether.
    InvalidLoopStep { raw: Option<String> },
    EmptyListField { field: TaskField },
    UnreadableFile { reason: String },
    MissingReferencedTask { id: TaskId },
    DuplicateTaskId { id: TaskId, first: PathBuf },
    UnresolvedStateTask { id: TaskId },
    StateTaskMismatch { id: TaskId, state_step: i64, task_step: Option<u8> },
}

/// One finding, optionally tied to the file it was found in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Issue {
    pub path: Option<PathBuf>,
    #[serde(flatten)]
    pub kind: IssueKind,
}

impl Issue {
    pub fn in_file(path: impl AsRef<Path>, kind: IssueKind) -> Self {
        Self {
            path: Some(path.as_ref().to_path_buf()),
            kind,
        }
    }

    pub fn global(kind: IssueKind) -> Self {
        Self { path: None, kind }
    }
}

impl fmt::Display for IssueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IssueKind::MissingRequiredField { field } => {
                write!(f, "missing required field `{field}`")
            }
            IssueKind::InvalidLoopStep { raw: None } => f.write_str("loop_step is missing"),
            IssueKind::InvalidLoopStep { raw: Some(raw) } => {
                write!(f, "loop_step '{raw}' is not an integer in 0..=7")
            }
            IssueKind::EmptyListField { field } => write!(f, "`{field}` has no items"),
            IssueKind::UnreadableFile { reason } => write!(f, "cannot read file: {reason}"),
            IssueKind::MissingReferencedTask { id } => write!(
                f,
                "task {id} is referenced by the master document but has no task file"
            ),
            IssueKind::DuplicateTaskId { id, first } => {
                write!(f, "task id {id} is already defined in {}", first.display())
            }
            IssueKind::UnresolvedStateTask { id } => {
                write!(f, "current_task_id {id} does not match any task file")
            }
            IssueKind::StateTaskMismatch { id, state_step, task_step } => {
                let task_step = task_step.map_or_else(|| "absent".to_string(), |s| s.to_string());
                write!(
                    f,
                    "current_loop_step ({state_step}) does not match \
                     loop_step ({task_step}) of task {id}"
                )
            }
        }
    }
}

impl fmt::Display for Issue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.path {
            Some(path) => write!(f, "{}: {}", path.display(), self.kind),
            None => self.kind.fmt(f),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_loop_step_quotes_raw_text() {
        let issue = Issue::in_file(
            "docs/tasks/a.yaml",
            IssueKind::InvalidLoopStep { raw: Some("nine".into()) },
        );
        assert_eq!(
            issue.to_string(),
            "docs/tasks/a.yaml: loop_step 'nine' is not an integer in 0..=7"
        );
    }

    #[test]
    fn mismatch_cites_both_steps() {
        let issue = Issue::global(IssueKind::StateTaskMismatch {
            id: TaskId::new("T1"),
            state_step: 3,
            task_step: Some(5),
        });
        let text = issue.to_string();
        assert!(text.contains("(3)"));
        assert!(text.contains("(5)"));
    }

    #[test]
    fn issue_serializes_with_kind_tag() {
        let issue = Issue::global(IssueKind::MissingReferencedTask { id: TaskId::new("ABC-01") });
        let v = serde_json::to_value(&issue).unwrap();
        assert_eq!(v["kind"], "missing_referenced_task");
        assert_eq!(v["id"], "ABC-01");
        assert!(v["path"].is_null());
    }
}
