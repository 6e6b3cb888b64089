//! Plain-text rendering of reports for the terminal.

use std::path::Path;

use looptrack_core::app::{
    DocStatus, DraftScan, DraftStatus, LintReport, ProgressReport, UpdateStatus, WrapUpReport,
};
use looptrack_core::domain::{LoopStep, WorkflowState};
use looptrack_core::resolver::ValidationReport;
use looptrack_core::store::LoadedState;

pub fn lint(report: &LintReport) {
    if report.passed() {
        println!("lint OK ({} task files)", report.files_checked);
        return;
    }
    for issue in &report.issues {
        eprintln!("{issue}");
    }
    eprintln!(
        "lint failed: {} issue(s) in {} task files",
        report.issues.len(),
        report.files_checked
    );
}

pub fn validation(report: &ValidationReport) {
    if report.passed() {
        println!(
            "validation OK ({} task files, {} referenced ids)",
            report.files_checked,
            report.required.len()
        );
        return;
    }
    for issue in &report.issues {
        eprintln!("{issue}");
    }
    eprintln!("validation failed: {} issue(s)", report.issues.len());
}

pub fn progress(report: &ProgressReport) {
    println!("== Stage 0 report ==");
    println!("profile: {}", report.profile);
    match &report.focus {
        Some(focus) => match &focus.title {
            Some(title) => println!("current task: {} ({title})", focus.id),
            None => println!("current task: {} (no task file)", focus.id),
        },
        None => println!("current task: -"),
    }
    println!("stage: {}", report.stage);
    println!("next action: {}", report.next_action);

    println!();
    println!("pending tasks:");
    if report.pending.is_empty() {
        println!("  (none)");
    }
    for task in &report.pending {
        println!("  - {} [{}] {}", task.id, step(task.loop_step), task.title);
    }

    println!();
    println!("watched documents:");
    for doc in &report.watched {
        let status = match doc.status {
            DocStatus::Changed => "changed",
            DocStatus::Clean => "clean",
        };
        println!("  - {} ({status})", doc.path);
    }

    list("changed paths", &report.changes);
    list("required tests", &report.required_tests);
}

pub fn wrap_up(report: &WrapUpReport) {
    println!("== Stage 7 report ==");
    println!("profile: {}", report.profile);
    match &report.current_task_id {
        Some(id) => println!("current task: {id}"),
        None => println!("current task: -"),
    }
    match &report.task {
        Some(task) => {
            println!("task file: {} [{}]", task.file_name, step(task.loop_step));
            println!();
            println!("post updates:");
            if task.post_updates.is_empty() {
                println!("  (none)");
            }
            for update in &task.post_updates {
                let status = match update.status {
                    UpdateStatus::Changed => "changed",
                    UpdateStatus::NeedsCheck => "needs check",
                };
                println!("  - {} ({status})", update.item);
            }
        }
        None => println!("task file: -"),
    }

    list("last tests", &report.last_tests);
    list("changed paths", &report.changes);
}

pub fn state(path: &Path, loaded: &LoadedState) {
    if let Some(reason) = &loaded.recovered {
        eprintln!(
            "warning: {} could not be parsed ({reason}), showing empty state",
            path.display()
        );
    }
    if !loaded.rejected.is_empty() {
        eprintln!(
            "warning: ignoring unusable values for {} in {}",
            loaded.rejected.join(", "),
            path.display()
        );
    }
    if loaded.state.is_empty() {
        println!("no workflow state recorded at {}", path.display());
        return;
    }
    fields(&loaded.state);
}

pub fn state_updated(path: &Path, state: &WorkflowState) {
    println!("updated {}", path.display());
    fields(state);
}

pub fn drafts(scan: &DraftScan) {
    let entries = match scan {
        DraftScan::NoDraftsDir => {
            println!("no drafts directory");
            return;
        }
        DraftScan::Entries(entries) => entries,
    };
    if entries.is_empty() {
        println!("no drafts");
        return;
    }
    for entry in entries {
        match &entry.status {
            DraftStatus::Missing => println!("[MISSING] {}", entry.path),
            DraftStatus::Synced => println!("[SYNCED]  {}", entry.path),
            DraftStatus::Diff => println!("[DIFF]    {}", entry.path),
            DraftStatus::Error(reason) => println!("[ERROR]   {} ({reason})", entry.path),
        }
    }
}

fn fields(state: &WorkflowState) {
    for (key, value) in state.display_fields() {
        println!("{key}: {value}");
    }
}

fn list(heading: &str, items: &[String]) {
    println!();
    println!("{heading}:");
    if items.is_empty() {
        println!("  (none)");
    }
    for item in items {
        println!("  - {item}");
    }
}

fn step(step: Option<LoopStep>) -> String {
    step.map_or_else(|| "?".to_string(), |s| s.to_string())
}
