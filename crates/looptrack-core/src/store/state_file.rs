//! Workflow state store backed by a single JSON file.
//!
//! Writes replace the file through a temporary sibling and a rename, so an
//! interrupted write never leaves a truncated state behind. There is no
//! locking: concurrent writers are last-writer-wins.

use std::fs;
use std::io::Write as _;
use std::path::{Path, PathBuf};

use serde_json::Value;
use tracing::{debug, warn};

use crate::domain::{LoopError, LoopResult, StateUpdate, WorkflowState};
use crate::ports::Clock;

/// Result of loading the state file.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadedState {
    pub state: WorkflowState,
    /// Set when the file existed but could not be used; the state is then empty.
    pub recovered: Option<String>,
    /// Known keys whose values had the wrong type. They are unset in `state`
    /// and kept raw in `state.extra`.
    pub rejected: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct StateStore {
    path: PathBuf,
}

impl StateStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Loads the state. Never fails: an absent file is an empty state and
    /// malformed content is an empty state plus a warning.
    pub fn load(&self) -> LoadedState {
        let text = match fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "no state file yet");
                return LoadedState {
                    state: WorkflowState::default(),
                    recovered: None,
                    rejected: Vec::new(),
                };
            }
            Err(e) => return self.recover(e.to_string()),
        };

        match parse_state(&text) {
            Ok((state, rejected)) => {
                if !rejected.is_empty() {
                    warn!(
                        path = %self.path.display(),
                        keys = %rejected.join(", "),
                        "ignoring workflow state fields with unusable values"
                    );
                }
                LoadedState {
                    state,
                    recovered: None,
                    rejected,
                }
            }
            Err(reason) => self.recover(reason),
        }
    }

    fn recover(&self, reason: String) -> LoadedState {
        warn!(
            path = %self.path.display(),
            %reason,
            "workflow state is malformed, treating it as empty"
        );
        LoadedState {
            state: WorkflowState::default(),
            recovered: Some(reason),
            rejected: Vec::new(),
        }
    }

    /// Read-only view of the persisted fields.
    pub fn show(&self) -> WorkflowState {
        self.load().state
    }

    /// Merges `update` into the persisted state and writes it back.
    pub fn update(&self, update: &StateUpdate, clock: &dyn Clock) -> LoopResult<WorkflowState> {
        let mut state = self.load().state;
        state.apply(update, clock.now());
        self.persist(&state)?;
        Ok(state)
    }

    fn persist(&self, state: &WorkflowState) -> LoopResult<()> {
        // Value objects are BTreeMap-backed, so keys come out sorted.
        let value = serde_json::to_value(state)?;
        let mut contents = serde_json::to_string_pretty(&value)?;
        contents.push('\n');

        let write_err = |source| LoopError::Write {
            path: self.path.clone(),
            source,
        };

        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent).map_err(write_err)?;
        }

        let tmp_path = self.path.with_extension(format!("tmp.{}", std::process::id()));
        let written = fs::File::create(&tmp_path).and_then(|mut file| {
            file.write_all(contents.as_bytes())?;
            file.sync_all()
        });
        if let Err(e) = written.and_then(|()| fs::rename(&tmp_path, &self.path)) {
            let _ = fs::remove_file(&tmp_path);
            return Err(write_err(e));
        }
        debug!(path = %self.path.display(), "workflow state written");
        Ok(())
    }
}

/// Only text that is not a JSON object counts as malformed.
fn parse_state(text: &str) -> Result<(WorkflowState, Vec<String>), String> {
    match serde_json::from_str::<Value>(text).map_err(|e| e.to_string())? {
        Value::Object(object) => Ok(WorkflowState::from_object(object)),
        _ => Err("state is not a JSON object".to_string()),
    }
}
