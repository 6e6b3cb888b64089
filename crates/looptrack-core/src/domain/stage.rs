//! Stage - the eight-stage loop and next-action hints.
//!
//! Stages are authored by hand on task records and in the workflow state.
//! The engine only observes them: it never advances a stage and it accepts
//! regressions (7 -> 3) without complaint.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A validated loop stage in `0..=7`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct LoopStep(u8);

impl LoopStep {
    pub const LAST: LoopStep = LoopStep(7);

    pub fn new(value: u8) -> Option<Self> {
        (value <= Self::LAST.0).then_some(Self(value))
    }

    /// Parses authored text. Anything that is not an integer in range is `None`.
    pub fn parse(raw: &str) -> Option<Self> {
        raw.trim()
            .parse::<i64>()
            .ok()
            .and_then(|v| u8::try_from(v).ok())
            .and_then(Self::new)
    }

    pub fn value(self) -> u8 {
        self.0
    }
}

impl TryFrom<u8> for LoopStep {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::new(value).ok_or_else(|| format!("loop step {value} is outside 0..=7"))
    }
}

impl From<LoopStep> for u8 {
    fn from(step: LoopStep) -> Self {
        step.0
    }
}

impl fmt::Display for LoopStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

const NEXT_ACTION_HINTS: [&str; 8] = [
    "restate requirements",
    "define steps and success criteria",
    "explain core concepts",
    "write the comment skeleton",
    "implement",
    "review the implementation",
    "run required tests",
    "cycle complete, pick next task",
];

const START_OVER_HINT: &str = "start from stage 0";

/// Stage after reconciling the workflow state with the active task record.
///
/// The workflow state stores a free integer, so a resolved stage may fall
/// outside the loop; such a stage gets the start-over hint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum ResolvedStage {
    Known(i64),
    Undetermined,
}

impl ResolvedStage {
    /// The greater of both stages when both are known, otherwise whichever is known.
    pub fn resolve(state_step: Option<i64>, task_step: Option<LoopStep>) -> Self {
        let task_step = task_step.map(|s| i64::from(s.value()));
        match (state_step, task_step) {
            (Some(a), Some(b)) => ResolvedStage::Known(a.max(b)),
            (Some(a), None) | (None, Some(a)) => ResolvedStage::Known(a),
            (None, None) => ResolvedStage::Undetermined,
        }
    }

    pub fn next_action(self) -> &'static str {
        match self {
            ResolvedStage::Known(step) => usize::try_from(step)
                .ok()
                .and_then(|i| NEXT_ACTION_HINTS.get(i))
                .copied()
                .unwrap_or(START_OVER_HINT),
            ResolvedStage::Undetermined => START_OVER_HINT,
        }
    }
}

impl fmt::Display for ResolvedStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResolvedStage::Known(step) => step.fmt(f),
            ResolvedStage::Undetermined => f.write_str("undetermined"),
        }
    }
}
