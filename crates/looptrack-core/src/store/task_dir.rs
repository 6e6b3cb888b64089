//! Task directory: the set of task files on disk.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::domain::{LoopError, LoopResult, TaskId, TaskRecord};
use crate::parser::parse_task;

const TASK_EXTENSIONS: [&str; 2] = ["yaml", "yml"];

/// One task file, read and parsed, or the reason it could not be read.
#[derive(Debug, Clone)]
pub struct TaskFile {
    pub path: PathBuf,
    pub record: Result<TaskRecord, String>,
}

impl TaskFile {
    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    }

    /// The record id, falling back to the file stem when `id` is empty.
    pub fn defined_id(&self) -> Option<TaskId> {
        let record = self.record.as_ref().ok()?;
        if !record.id.is_empty() {
            return Some(record.id.clone());
        }
        self.path
            .file_stem()
            .map(|stem| TaskId::new(stem.to_string_lossy()))
    }
}

/// Reads every task file of a directory, sorted by file name.
///
/// A missing directory is a hard error. A file that cannot be read is kept
/// with its error so that lint can report it and carry on with the rest.
#[derive(Debug, Clone)]
pub struct TaskDirectory {
    root: PathBuf,
}

impl TaskDirectory {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn load(&self) -> LoopResult<Vec<TaskFile>> {
        if !self.root.is_dir() {
            return Err(LoopError::TaskDirMissing(self.root.clone()));
        }

        let entries = fs::read_dir(&self.root).map_err(|source| LoopError::ListDir {
            path: self.root.clone(),
            source,
        })?;

        let mut paths: Vec<PathBuf> = entries
            .filter_map(Result::ok)
            .map(|entry| entry.path())
            .filter(|path| path.is_file() && is_task_file(path))
            .collect();
        paths.sort_by(|a, b| a.file_name().cmp(&b.file_name()));

        let files = paths
            .into_iter()
            .map(|path| {
                let record = fs::read_to_string(&path)
                    .map(|text| parse_task(&text))
                    .map_err(|e| e.to_string());
                debug!(path = %path.display(), ok = record.is_ok(), "loaded task file");
                TaskFile { path, record }
            })
            .collect();
        Ok(files)
    }

    /// Only the records that parsed and carry an id.
    pub fn load_records(&self) -> LoopResult<Vec<(PathBuf, TaskRecord)>> {
        Ok(self
            .load()?
            .into_iter()
            .filter_map(|file| match file.record {
                Ok(record) if !record.id.is_empty() => Some((file.path, record)),
                _ => None,
            })
            .collect())
    }
}

fn is_task_file(path: &Path) -> bool {
    let is_readme = path
        .file_stem()
        .is_some_and(|stem| stem.to_string_lossy().eq_ignore_ascii_case("readme"));
    let has_ext = path
        .extension()
        .is_some_and(|ext| TASK_EXTENSIONS.iter().any(|e| ext.eq_ignore_ascii_case(e)));
    has_ext && !is_readme
}
