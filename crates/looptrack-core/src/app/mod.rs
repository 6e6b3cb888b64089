//! App - operations built from the domain, stores and ports.
//!
//! # Components
//! - **Session / SessionBuilder**: per-invocation wiring and the operations
//!   (`lint`, `validate`, reports, state updates)
//! - **report**: the reconciler and both progress reports
//! - **drafts**: draft-vs-published sync status
//! - **checklist**: pull request test checklist guard

pub mod checklist;
pub mod drafts;
pub mod report;
pub mod session;

pub use self::checklist::{ChecklistVerdict, check_body};
pub use self::drafts::{DraftEntry, DraftScan, DraftStatus};
pub use self::report::{
    DocStatus, ProgressReport, ReportInputs, TaskView, UpdateStatus, WrapUpReport,
};
pub use self::session::{LintReport, Session, SessionBuilder};
