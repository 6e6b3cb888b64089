//! Domain model (ids, task records, loop stages, workflow state, issues, errors).

pub mod errors;
pub mod ids;
pub mod issue;
pub mod stage;
pub mod state;
pub mod task;

pub use self::errors::{LoopError, LoopResult};
pub use self::ids::TaskId;
pub use self::issue::{Issue, IssueKind};
pub use self::stage::{LoopStep, ResolvedStage};
pub use self::state::{StateUpdate, WorkflowState};
pub use self::task::{TaskField, TaskRecord};
