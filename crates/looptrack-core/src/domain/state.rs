//! State - the persisted pointer to the active profile / task / stage.

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::TaskId;

/// WorkflowState is the single current-state record.
///
/// Every field is optional because the record is built up by merges. Keys
/// written by other tools are kept in `extra` and survive rewrites.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WorkflowState {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_profile: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_task_id: Option<TaskId>,

    /// Free integer: the state is authored by hand and may hold a value
    /// outside the loop. Lint-style checks report it, nothing clamps it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_loop_step: Option<i64>,

    /// Comma-joined list of the last test commands.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_tests: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl WorkflowState {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Decodes a state object field by field.
    ///
    /// A known key whose value has the wrong type is left unset and its raw
    /// value stays in `extra`, so a rewrite keeps it. The returned list names
    /// those keys.
    pub fn from_object(mut object: Map<String, Value>) -> (Self, Vec<String>) {
        let mut rejected = Vec::new();
        let state = Self {
            current_profile: take(&mut object, "current_profile", &mut rejected),
            current_task_id: take(&mut object, "current_task_id", &mut rejected),
            current_loop_step: take(&mut object, "current_loop_step", &mut rejected),
            last_tests: take(&mut object, "last_tests", &mut rejected),
            notes: take(&mut object, "notes", &mut rejected),
            updated_at: take(&mut object, "updated_at", &mut rejected),
            extra: object,
        };
        (state, rejected)
    }

    /// `last_tests` split on commas, blank entries dropped.
    pub fn last_test_commands(&self) -> Vec<String> {
        self.last_tests
            .as_deref()
            .unwrap_or_default()
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect()
    }

    /// Overwrites every supplied field and stamps `updated_at`.
    pub fn apply(&mut self, update: &StateUpdate, now: DateTime<Utc>) {
        // A set field replaces any raw value kept from an unusable entry.
        if let Some(profile) = &update.current_profile {
            self.current_profile = Some(profile.clone());
            self.extra.remove("current_profile");
        }
        if let Some(task_id) = &update.current_task_id {
            self.current_task_id = Some(task_id.clone());
            self.extra.remove("current_task_id");
        }
        if let Some(step) = update.current_loop_step {
            self.current_loop_step = Some(step);
            self.extra.remove("current_loop_step");
        }
        if let Some(tests) = &update.last_tests {
            self.last_tests = Some(tests.clone());
            self.extra.remove("last_tests");
        }
        if let Some(notes) = &update.notes {
            self.notes = Some(notes.clone());
            self.extra.remove("notes");
        }
        self.updated_at = Some(now);
        self.extra.remove("updated_at");
    }

    /// Displayable `(key, value)` pairs in the persisted (sorted) key order.
    pub fn display_fields(&self) -> Vec<(&'static str, String)> {
        vec![
            ("current_loop_step", opt(self.current_loop_step.map(|s| s.to_string()))),
            ("current_profile", opt(self.current_profile.clone())),
            ("current_task_id", opt(self.current_task_id.as_ref().map(TaskId::to_string))),
            ("last_tests", opt(self.last_tests.clone())),
            ("notes", opt(self.notes.clone())),
            ("updated_at", opt(self.updated_at.map(|t| t.to_rfc3339()))),
        ]
    }
}

/// Moves `key` out of `object` when its value decodes as `T` (or is null).
fn take<T: DeserializeOwned>(
    object: &mut Map<String, Value>,
    key: &str,
    rejected: &mut Vec<String>,
) -> Option<T> {
    let value = object.get(key)?;
    match serde_json::from_value::<Option<T>>(value.clone()) {
        Ok(decoded) => {
            object.remove(key);
            decoded
        }
        Err(_) => {
            rejected.push(key.to_string());
            None
        }
    }
}

fn opt(value: Option<String>) -> String {
    value.unwrap_or_else(|| "-".to_string())
}

/// Fields to merge into the workflow state. `None` means "leave as is".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StateUpdate {
    pub current_profile: Option<String>,
    pub current_task_id: Option<TaskId>,
    pub current_loop_step: Option<i64>,
    pub last_tests: Option<String>,
    pub notes: Option<String>,
}

impl StateUpdate {
    pub fn notes(notes: impl Into<String>) -> Self {
        Self {
            notes: Some(notes.into()),
            ..Self::default()
        }
    }

    pub fn last_tests(tests: impl Into<String>) -> Self {
        Self {
            last_tests: Some(tests.into()),
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(secs, 0).unwrap()
    }

    #[test]
    fn apply_only_touches_supplied_fields() {
        let mut state = WorkflowState {
            current_profile: Some("design".into()),
            current_task_id: Some(TaskId::new("AUTH-01")),
            current_loop_step: Some(3),
            last_tests: Some("make tests-core".into()),
            updated_at: Some(at(10)),
            ..WorkflowState::default()
        };

        state.apply(&StateUpdate::notes("waiting on review"), at(20));

        assert_eq!(state.current_profile.as_deref(), Some("design"));
        assert_eq!(state.current_task_id, Some(TaskId::new("AUTH-01")));
        assert_eq!(state.current_loop_step, Some(3));
        assert_eq!(state.last_tests.as_deref(), Some("make tests-core"));
        assert_eq!(state.notes.as_deref(), Some("waiting on review"));
        assert_eq!(state.updated_at, Some(at(20)));
    }

    #[test]
    fn last_test_commands_drop_blank_entries() {
        let state = WorkflowState {
            last_tests: Some(" make tests-core, ,npm test,".into()),
            ..WorkflowState::default()
        };
        assert_eq!(state.last_test_commands(), vec!["make tests-core", "npm test"]);
    }

    #[test]
    fn unknown_keys_are_kept() {
        let json = r#"{ "current_task_id": "T1", "owner": "kim" }"#;
        let state: WorkflowState = serde_json::from_str(json).unwrap();
        assert_eq!(state.current_task_id, Some(TaskId::new("T1")));
        assert_eq!(state.extra["owner"], "kim");
    }

    #[test]
    fn wrong_typed_field_is_kept_raw_and_the_rest_decoded() {
        let json = r#"{ "current_task_id": "T1", "current_loop_step": "3", "owner": "kim" }"#;
        let Value::Object(object) = serde_json::from_str(json).unwrap() else {
            panic!("expected an object");
        };

        let (state, rejected) = WorkflowState::from_object(object);

        assert_eq!(rejected, vec!["current_loop_step"]);
        assert_eq!(state.current_task_id, Some(TaskId::new("T1")));
        assert_eq!(state.current_loop_step, None);
        assert_eq!(state.extra["current_loop_step"], "3");
        assert_eq!(state.extra["owner"], "kim");
    }

    #[test]
    fn apply_replaces_a_kept_raw_value() {
        let mut object = Map::new();
        object.insert("current_loop_step".into(), Value::from("three"));
        let (mut state, _) = WorkflowState::from_object(object);

        state.apply(
            &StateUpdate {
                current_loop_step: Some(4),
                ..StateUpdate::default()
            },
            at(1),
        );

        assert_eq!(state.current_loop_step, Some(4));
        assert!(!state.extra.contains_key("current_loop_step"));
    }

    #[test]
    fn empty_state_is_empty() {
        assert!(WorkflowState::default().is_empty());
        let state: WorkflowState = serde_json::from_str("{}").unwrap();
        assert!(state.is_empty());
    }
}
