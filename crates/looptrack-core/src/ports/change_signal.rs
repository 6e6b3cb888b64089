//! ChangeSignal port - "which paths changed" as reported by an outside tool.
//!
//! The engine never interprets the entries beyond substring checks, so the
//! default implementation just forwards `git status --short` lines.

use std::path::PathBuf;
use std::process::Command;

use tracing::debug;

pub trait ChangeSignal {
    /// Changed-path entries limited to `scopes`, in the order the source reports them.
    fn changed_paths(&self, scopes: &[String]) -> Vec<String>;
}

/// Asks git for the working tree status of the project.
///
/// Any failure (git missing, not a repository) yields an empty list.
#[derive(Debug, Clone)]
pub struct GitStatus {
    root: PathBuf,
}

impl GitStatus {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl ChangeSignal for GitStatus {
    fn changed_paths(&self, scopes: &[String]) -> Vec<String> {
        let output = Command::new("git")
            .args(["status", "--short", "--"])
            .args(scopes)
            .current_dir(&self.root)
            .output();

        match output {
            Ok(output) if output.status.success() => {
                non_blank_lines(&String::from_utf8_lossy(&output.stdout))
            }
            Ok(output) => {
                debug!(status = %output.status, "git status failed, assuming no changes");
                Vec::new()
            }
            Err(e) => {
                debug!(error = %e, "git not available, assuming no changes");
                Vec::new()
            }
        }
    }
}

/// A fixed list of entries, for tests and for callers that already know.
#[derive(Debug, Clone, Default)]
pub struct StaticChanges(pub Vec<String>);

impl ChangeSignal for StaticChanges {
    fn changed_paths(&self, scopes: &[String]) -> Vec<String> {
        self.0
            .iter()
            .filter(|entry| scopes.is_empty() || scopes.iter().any(|s| entry.contains(s.as_str())))
            .cloned()
            .collect()
    }
}

fn non_blank_lines(text: &str) -> Vec<String> {
    text.lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(str::to_string)
        .collect()
}
