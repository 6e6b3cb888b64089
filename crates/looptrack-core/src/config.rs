//! Configuration for one invocation.
//!
//! Paths default to the conventional project layout and can be overridden
//! through environment variables:
//! - `LOOPTRACK_TASKS_DIR` - task files directory. Defaults to `docs/tasks`.
//! - `LOOPTRACK_MASTER_DOC` - master document. Defaults to
//!   `docs/service/service-definition.md`.
//! - `LOOPTRACK_STATE_FILE` - workflow state file. Defaults to `.codex/state.json`.
//! - `LOOPTRACK_PROFILE_CONFIG` - profile config. Discovered when unset.
//! - `LOOPTRACK_REFERENCE_MARKER` - text that precedes a task id. Defaults to `Taskmaster:`.
//! - `LOOPTRACK_PENDING_MARKER` - annotation that suppresses a mention.
//!   Defaults to `(not yet authored)`.
//!
//! Relative values are resolved against the project root.

use std::path::{Path, PathBuf};

pub const DEFAULT_REFERENCE_MARKER: &str = "Taskmaster:";
pub const DEFAULT_PENDING_MARKER: &str = "(not yet authored)";

/// Documents whose change status the stage 0 report shows.
pub const DEFAULT_WATCHED_DOCS: [&str; 5] = [
    "docs/service/service-definition.md",
    "docs/service/tech-guide.md",
    "docs/service/domain-model.md",
    "docs/service/feature-inventory.md",
    "docs/openapi/fridge-mvp.yaml",
];

/// Scopes passed to the change signal for each report.
pub const STAGE_ZERO_SCOPES: [&str; 3] = ["docs/service", "docs/openapi", "docs/tasks"];
pub const WRAP_UP_SCOPES: [&str; 4] = [
    "docs/service",
    "docs/openapi",
    "docs/tasks",
    "docs/checklist.md",
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoopConfig {
    pub project_root: PathBuf,
    pub tasks_dir: PathBuf,
    pub master_doc: PathBuf,
    pub state_file: PathBuf,
    /// `None` means "discover".
    pub profile_config: Option<PathBuf>,
    pub drafts_dir: PathBuf,
    pub published_dir: PathBuf,
    pub reference_marker: String,
    pub pending_marker: String,
    pub watched_docs: Vec<String>,
}

impl LoopConfig {
    /// Defaults for a project rooted at `root`.
    pub fn for_root(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        Self {
            tasks_dir: root.join("docs").join("tasks"),
            master_doc: root.join("docs").join("service").join("service-definition.md"),
            state_file: root.join(".codex").join("state.json"),
            profile_config: None,
            drafts_dir: root.join("docs").join("service").join("_drafts"),
            published_dir: root.join("docs").join("service"),
            reference_marker: DEFAULT_REFERENCE_MARKER.to_string(),
            pending_marker: DEFAULT_PENDING_MARKER.to_string(),
            watched_docs: DEFAULT_WATCHED_DOCS.iter().map(|s| s.to_string()).collect(),
            project_root: root,
        }
    }

    /// Defaults overridden by `LOOPTRACK_*` environment variables.
    pub fn from_env(root: impl Into<PathBuf>) -> Self {
        Self::from_lookup(root, |key| std::env::var(key).ok())
    }

    /// Same as [`from_env`](Self::from_env) with an explicit variable source.
    pub fn from_lookup(root: impl Into<PathBuf>, lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::for_root(root);
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(v) = var("LOOPTRACK_TASKS_DIR") {
            config.tasks_dir = config.resolve(v);
        }
        if let Some(v) = var("LOOPTRACK_MASTER_DOC") {
            config.master_doc = config.resolve(v);
        }
        if let Some(v) = var("LOOPTRACK_STATE_FILE") {
            config.state_file = config.resolve(v);
        }
        if let Some(v) = var("LOOPTRACK_PROFILE_CONFIG") {
            config.profile_config = Some(config.resolve(v));
        }
        if let Some(v) = var("LOOPTRACK_REFERENCE_MARKER") {
            config.reference_marker = v;
        }
        if let Some(v) = var("LOOPTRACK_PENDING_MARKER") {
            config.pending_marker = v;
        }
        config
    }

    /// Resolves a possibly relative path against the project root.
    pub fn resolve(&self, path: impl AsRef<Path>) -> PathBuf {
        let path = path.as_ref();
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.project_root.join(path)
        }
    }
}
