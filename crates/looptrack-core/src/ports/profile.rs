//! Profile port - the name of the active assistant profile.
//!
//! The profile lives in an external TOML config as a single
//! `active_profile = "<name>"` line. Only that line is read or rewritten;
//! the rest of the file is left byte-for-byte intact.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::Regex;
use tracing::debug;

use crate::domain::{LoopError, LoopResult};

const ACTIVE_PROFILE_KEY: &str = "active_profile";

static ACTIVE_PROFILE_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?m)^active_profile\s*=\s*".*?""#).expect("valid regex"));

pub trait ProfileSource {
    /// `None` when the profile cannot be determined.
    fn active_profile(&self) -> Option<String>;
}

/// Reads the profile from a config file on disk.
#[derive(Debug, Clone)]
pub struct ProfileConfig {
    path: Option<PathBuf>,
}

impl ProfileConfig {
    pub fn new(path: Option<PathBuf>) -> Self {
        Self { path }
    }

    /// Picks the first existing candidate: an explicit path, then
    /// `~/.codex/config.toml`, then `<root>/.codex/config.toml`.
    pub fn discover(explicit: Option<PathBuf>, project_root: &Path) -> Self {
        if explicit.is_some() {
            return Self::new(explicit);
        }
        let home = dirs::home_dir().map(|home| home.join(".codex").join("config.toml"));
        let project = Some(project_root.join(".codex").join("config.toml"));
        let path = [home, project].into_iter().flatten().find(|p| p.is_file());
        debug!(path = ?path, "profile config");
        Self::new(path)
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Rewrites the `active_profile` line to `profile`.
    ///
    /// The profile must be declared as a `[profiles.<name>]` table.
    pub fn set_active(&self, profile: &str) -> LoopResult<PathBuf> {
        let path = self
            .path
            .clone()
            .filter(|p| p.is_file())
            .ok_or_else(|| LoopError::ProfileConfigMissing(self.path.clone().unwrap_or_default()))?;

        let content = fs::read_to_string(&path).map_err(|source| LoopError::Read {
            path: path.clone(),
            source,
        })?;

        if !content.contains(&format!("[profiles.{profile}]")) {
            return Err(LoopError::ProfileNotDefined(profile.to_string()));
        }

        let line = &*ACTIVE_PROFILE_LINE;
        if !line.is_match(&content) {
            return Err(LoopError::ActiveProfileLineMissing(path));
        }
        let replacement = format!("{ACTIVE_PROFILE_KEY} = \"{profile}\"");
        let updated = line.replacen(&content, 1, regex::NoExpand(&replacement));

        fs::write(&path, updated.as_bytes()).map_err(|source| LoopError::Write {
            path: path.clone(),
            source,
        })?;
        Ok(path)
    }
}

impl ProfileSource for ProfileConfig {
    fn active_profile(&self) -> Option<String> {
        let text = fs::read_to_string(self.path.as_ref()?).ok()?;
        read_active_profile(&text)
    }
}

/// A profile known up front.
#[derive(Debug, Clone, Default)]
pub struct FixedProfile(pub Option<String>);

impl ProfileSource for FixedProfile {
    fn active_profile(&self) -> Option<String> {
        self.0.clone()
    }
}

/// Value of the first `active_profile = ...` line, without comment or quotes.
pub fn read_active_profile(text: &str) -> Option<String> {
    text.lines()
        .map(str::trim)
        .filter(|line| line.starts_with(ACTIVE_PROFILE_KEY))
        .find_map(|line| line.split_once('='))
        .map(|(_, value)| {
            let value = value.split('#').next().unwrap_or_default();
            value.trim().trim_matches('"').to_string()
        })
        .filter(|value| !value.is_empty())
}
