//! Persistence: task files (read-only) and the workflow state file.

pub mod state_file;
pub mod task_dir;

pub use self::state_file::{LoadedState, StateStore};
pub use self::task_dir::{TaskDirectory, TaskFile};
