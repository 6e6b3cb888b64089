//! looptrack-core
//!
//! Consistency checks and progress reporting for an eight-stage (0-7)
//! development loop.
//!
//! # Modules
//! - **domain**: task records, loop stages, workflow state, issues, errors
//! - **parser**: the key/list notation of task files
//! - **lint**: per-file field checks
//! - **resolver**: master-document references and the state cross-check
//! - **store**: task directory and workflow state file
//! - **ports**: clock, change signal, profile source
//! - **app**: session wiring, reports, drafts, checklist
//! - **config**: paths and markers for one invocation

pub mod app;
pub mod config;
pub mod domain;
pub mod lint;
pub mod parser;
pub mod ports;
pub mod resolver;
pub mod store;
