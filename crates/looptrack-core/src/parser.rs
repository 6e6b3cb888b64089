//! Record parser for the task-file notation.
//!
//! The notation is a small key/list subset of YAML:
//!
//! ```text
//! id: AUTH-01
//! title: Login flow
//! loop_step: 3
//! required_tests:
//!   - make tests-core
//! ```
//!
//! It is parsed with a two-state machine instead of a YAML library so that
//! anything outside the notation is simply not picked up and lint can report
//! it. Parsing never fails.

use crate::domain::{LoopStep, TaskField, TaskId, TaskRecord};

const COMMENT_MARKER: char = '#';
const BULLET_MARKER: char = '-';
const KEY_SEPARATOR: char = ':';

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ParseState {
    /// Between keys, or inside a scalar / unknown key.
    TopLevel,
    /// Collecting bullet items for a list key.
    InList(TaskField),
}

/// Parses one task definition.
pub fn parse_task(text: &str) -> TaskRecord {
    let mut record = TaskRecord::default();
    let mut state = ParseState::TopLevel;

    for line in text.lines() {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with(COMMENT_MARKER) {
            continue;
        }

        let indented = line.starts_with(char::is_whitespace);
        if !indented {
            // Any non-indented line closes an open list block.
            state = ParseState::TopLevel;
            if let Some((key, value)) = line.split_once(KEY_SEPARATOR)
                && let Some(field) = TaskField::from_key(key.trim())
            {
                record.present.insert(field);
                state = read_key(&mut record, field, value.trim());
            }
            continue;
        }

        if let ParseState::InList(field) = state
            && let Some(item) = trimmed.strip_prefix(BULLET_MARKER)
        {
            let item = item.trim();
            if !item.is_empty()
                && let Some(items) = record.items_mut(field)
            {
                items.push(item.to_string());
            }
        }
    }

    record
}

fn read_key(record: &mut TaskRecord, field: TaskField, value: &str) -> ParseState {
    match field {
        TaskField::Id => {
            record.id = TaskId::new(unquote(value));
            ParseState::TopLevel
        }
        TaskField::Title => {
            record.title = unquote(value).to_string();
            ParseState::TopLevel
        }
        TaskField::LoopStep => {
            record.loop_step_raw = Some(value.to_string());
            record.loop_step = LoopStep::parse(unquote(value));
            ParseState::TopLevel
        }
        list => ParseState::InList(list),
    }
}

/// Strips one pair of matching surrounding quotes.
fn unquote(value: &str) -> &str {
    for quote in ['"', '\''] {
        if let Some(inner) = value
            .strip_prefix(quote)
            .and_then(|v| v.strip_suffix(quote))
        {
            return inner;
        }
    }
    value
}
