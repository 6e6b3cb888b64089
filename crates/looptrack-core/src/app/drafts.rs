//! Draft sync status: drafts under `_drafts/` vs. the published documents.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;
use walkdir::WalkDir;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "reason", rename_all = "snake_case")]
pub enum DraftStatus {
    /// No published document at the same relative path.
    Missing,
    Synced,
    Diff,
    Error(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DraftEntry {
    /// Relative to the drafts directory, `/`-separated.
    pub path: String,
    #[serde(flatten)]
    pub status: DraftStatus,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "entries", rename_all = "snake_case")]
pub enum DraftScan {
    NoDraftsDir,
    Entries(Vec<DraftEntry>),
}

/// Compares every draft file with its published counterpart.
pub fn scan_drafts(drafts_dir: &Path, published_dir: &Path) -> DraftScan {
    if !drafts_dir.is_dir() {
        return DraftScan::NoDraftsDir;
    }

    let mut drafts: Vec<PathBuf> = WalkDir::new(drafts_dir)
        .into_iter()
        .filter_map(Result::ok)
        .filter(|e| e.file_type().is_file() && e.file_name() != ".gitkeep")
        .map(|e| e.into_path())
        .collect();
    drafts.sort();

    let entries = drafts
        .into_iter()
        .filter_map(|draft| {
            let rel = draft.strip_prefix(drafts_dir).ok()?.to_path_buf();
            Some(DraftEntry {
                path: to_slash(&rel),
                status: compare(&draft, &published_dir.join(&rel)),
            })
        })
        .collect();
    DraftScan::Entries(entries)
}

fn compare(draft: &Path, published: &Path) -> DraftStatus {
    if !published.exists() {
        return DraftStatus::Missing;
    }
    match (fs::read(draft), fs::read(published)) {
        (Ok(a), Ok(b)) if a == b => DraftStatus::Synced,
        (Ok(_), Ok(_)) => DraftStatus::Diff,
        (Err(e), _) | (_, Err(e)) => DraftStatus::Error(e.to_string()),
    }
}

fn to_slash(path: &Path) -> String {
    path.components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}
