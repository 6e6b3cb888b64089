//! Task record: one unit of work and its loop metadata.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

use super::TaskId;
use super::stage::LoopStep;

/// The eight recognized top-level keys of a task file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskField {
    Id,
    Title,
    LoopStep,
    Preconditions,
    Refs,
    RequiredTests,
    PostUpdates,
    Acceptance,
}

impl TaskField {
    pub const ALL: [TaskField; 8] = [
        TaskField::Id,
        TaskField::Title,
        TaskField::LoopStep,
        TaskField::Preconditions,
        TaskField::Refs,
        TaskField::RequiredTests,
        TaskField::PostUpdates,
        TaskField::Acceptance,
    ];

    pub const LISTS: [TaskField; 5] = [
        TaskField::Preconditions,
        TaskField::Refs,
        TaskField::RequiredTests,
        TaskField::PostUpdates,
        TaskField::Acceptance,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            TaskField::Id => "id",
            TaskField::Title => "title",
            TaskField::LoopStep => "loop_step",
            TaskField::Preconditions => "preconditions",
            TaskField::Refs => "refs",
            TaskField::RequiredTests => "required_tests",
            TaskField::PostUpdates => "post_updates",
            TaskField::Acceptance => "acceptance",
        }
    }

    /// Looks up a key as written in a task file.
    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|f| f.as_str() == key)
    }
}

impl fmt::Display for TaskField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A parsed task definition.
///
/// Parsing never fails, so a record may be incomplete: `present` remembers
/// which keys appeared as headers and `loop_step_raw` keeps the text the
/// author wrote. Lint decides whether the record is valid.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TaskRecord {
    pub id: TaskId,
    pub title: String,
    /// Only set when the raw text is an integer in 0..=7.
    pub loop_step: Option<LoopStep>,
    pub loop_step_raw: Option<String>,
    pub preconditions: Vec<String>,
    pub refs: Vec<String>,
    pub required_tests: Vec<String>,
    pub post_updates: Vec<String>,
    pub acceptance: Vec<String>,
    #[serde(skip)]
    pub present: BTreeSet<TaskField>,
}

impl TaskRecord {
    pub fn has_field(&self, field: TaskField) -> bool {
        self.present.contains(&field)
    }

    /// Items of a list field. Scalar fields have no items.
    pub fn items(&self, field: TaskField) -> &[String] {
        match field {
            TaskField::Preconditions => &self.preconditions,
            TaskField::Refs => &self.refs,
            TaskField::RequiredTests => &self.required_tests,
            TaskField::PostUpdates => &self.post_updates,
            TaskField::Acceptance => &self.acceptance,
            TaskField::Id | TaskField::Title | TaskField::LoopStep => &[],
        }
    }

    pub(crate) fn items_mut(&mut self, field: TaskField) -> Option<&mut Vec<String>> {
        match field {
            TaskField::Preconditions => Some(&mut self.preconditions),
            TaskField::Refs => Some(&mut self.refs),
            TaskField::RequiredTests => Some(&mut self.required_tests),
            TaskField::PostUpdates => Some(&mut self.post_updates),
            TaskField::Acceptance => Some(&mut self.acceptance),
            TaskField::Id | TaskField::Title | TaskField::LoopStep => None,
        }
    }

    /// The authored `loop_step` when it is an integer, in range or not.
    pub fn authored_step(&self) -> Option<i64> {
        match self.loop_step {
            Some(step) => Some(i64::from(step.value())),
            None => self
                .loop_step_raw
                .as_deref()?
                .trim_matches(['"', '\''])
                .trim()
                .parse()
                .ok(),
        }
    }

    /// A task is pending while its authored stage is below the last one.
    /// Records whose `loop_step` is not an integer count as pending.
    pub fn is_pending(&self) -> bool {
        let last = i64::from(LoopStep::LAST.value());
        self.authored_step().is_none_or(|step| step < last)
    }
}
