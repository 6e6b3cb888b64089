use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use clap::{Args, Parser, Subcommand, ValueEnum};
use tracing::debug;
use tracing_subscriber::EnvFilter;

use looptrack_core::app::{Session, SessionBuilder, check_body};
use looptrack_core::config::LoopConfig;
use looptrack_core::domain::{StateUpdate, TaskId};

mod render;

/// Consistency checks and progress reports for the 0-7 development loop.
#[derive(Parser, Debug)]
#[command(name = "looptrack", version, about)]
struct Cli {
    /// Project root (default: current directory)
    #[arg(long, global = true, value_name = "PATH")]
    project_root: Option<PathBuf>,

    /// Task files directory
    #[arg(long, global = true, value_name = "PATH")]
    tasks_dir: Option<PathBuf>,

    /// Master document that references task ids
    #[arg(long, global = true, value_name = "PATH")]
    master_doc: Option<PathBuf>,

    /// Workflow state file
    #[arg(long, global = true, value_name = "PATH")]
    state_file: Option<PathBuf>,

    /// Profile config (default: ~/.codex/config.toml, then <root>/.codex/config.toml)
    #[arg(long, global = true, value_name = "PATH")]
    profile_config: Option<PathBuf>,

    /// Annotation that marks a referenced task as not written yet
    #[arg(long, global = true, value_name = "TEXT")]
    pending_marker: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Check task files, master document references and the workflow state
    Validate(JsonFlag),
    /// Check the fields of every task file
    Lint(JsonFlag),
    /// Print the stage 0 or stage 7 report
    Report {
        #[arg(long, value_enum)]
        step: ReportStep,
        #[arg(long)]
        json: bool,
    },
    /// Show or update the workflow state
    State {
        #[command(subcommand)]
        command: StateCommand,
    },
    /// Show or switch the active profile
    Profile {
        #[command(subcommand)]
        command: ProfileCommand,
    },
    /// Compare draft documents with their published versions
    Drafts(JsonFlag),
    /// Verify the test checklist of a pull request body
    Checklist {
        /// File holding the pull request body
        #[arg(long, value_name = "FILE")]
        body: PathBuf,
    },
}

#[derive(Args, Debug)]
struct JsonFlag {
    /// Print machine-readable JSON
    #[arg(long)]
    json: bool,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum ReportStep {
    #[value(name = "0")]
    Start,
    #[value(name = "7")]
    WrapUp,
}

#[derive(Subcommand, Debug)]
enum StateCommand {
    /// Print the persisted state
    Show(JsonFlag),
    /// Merge the given fields into the state
    Update(UpdateArgs),
}

#[derive(Args, Debug)]
struct UpdateArgs {
    /// Current profile (design, stubs, review, ...)
    #[arg(long)]
    profile: Option<String>,
    /// Currently active task id (e.g. AUTH-01)
    #[arg(long = "task", alias = "task-id")]
    task: Option<String>,
    /// Current loop step (0-7)
    #[arg(long)]
    loop_step: Option<i64>,
    /// Comma separated list of the last test commands
    #[arg(long)]
    last_tests: Option<String>,
    /// Free-form notes
    #[arg(long)]
    notes: Option<String>,
}

impl From<UpdateArgs> for StateUpdate {
    fn from(args: UpdateArgs) -> Self {
        StateUpdate {
            current_profile: args.profile,
            current_task_id: args.task.map(TaskId::from),
            current_loop_step: args.loop_step,
            last_tests: args.last_tests,
            notes: args.notes,
        }
    }
}

#[derive(Subcommand, Debug)]
enum ProfileCommand {
    /// Print the active profile
    Show,
    /// Set `active_profile` in the profile config
    Set { name: String },
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "looptrack=warn,looptrack_core=warn".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    exit_code(run(Cli::parse()))
}

/// Issues found map to 1 inside `run`; a hard error maps to 2 here.
fn exit_code(result: anyhow::Result<ExitCode>) -> ExitCode {
    match result {
        Ok(code) => code,
        Err(e) => {
            eprintln!("error: {e:#}");
            ExitCode::from(2)
        }
    }
}

fn run(cli: Cli) -> anyhow::Result<ExitCode> {
    let session = build_session(&cli)?;

    match cli.command {
        Command::Validate(JsonFlag { json }) => {
            let report = session.validate()?;
            if json {
                print_json(&report)?;
            } else {
                render::validation(&report);
            }
            Ok(pass_fail(report.passed()))
        }
        Command::Lint(JsonFlag { json }) => {
            let report = session.lint()?;
            if json {
                print_json(&report)?;
            } else {
                render::lint(&report);
            }
            Ok(pass_fail(report.passed()))
        }
        Command::Report { step, json } => {
            match (step, json) {
                (ReportStep::Start, true) => print_json(&session.progress_report()?)?,
                (ReportStep::Start, false) => render::progress(&session.progress_report()?),
                (ReportStep::WrapUp, true) => print_json(&session.wrap_up_report()?)?,
                (ReportStep::WrapUp, false) => render::wrap_up(&session.wrap_up_report()?),
            }
            Ok(ExitCode::SUCCESS)
        }
        Command::State { command } => state(&session, command),
        Command::Profile { command } => profile(&session, command),
        Command::Drafts(JsonFlag { json }) => {
            let scan = session.drafts();
            if json {
                print_json(&scan)?;
            } else {
                render::drafts(&scan);
            }
            Ok(ExitCode::SUCCESS)
        }
        Command::Checklist { body } => {
            let text = std::fs::read_to_string(&body)
                .with_context(|| format!("failed to read {}", body.display()))?;
            let verdict = check_body(&text);
            if verdict.passed() {
                println!("{}", verdict.message());
            } else {
                eprintln!("{}", verdict.message());
            }
            Ok(pass_fail(verdict.passed()))
        }
    }
}

fn state(session: &Session, command: StateCommand) -> anyhow::Result<ExitCode> {
    match command {
        StateCommand::Show(JsonFlag { json }) => {
            let loaded = session.show_state();
            if json {
                print_json(&loaded.state)?;
            } else {
                render::state(&session.state_path(), &loaded);
            }
        }
        StateCommand::Update(args) => {
            let state = session.update_state(&args.into())?;
            render::state_updated(&session.state_path(), &state);
        }
    }
    Ok(ExitCode::SUCCESS)
}

fn profile(session: &Session, command: ProfileCommand) -> anyhow::Result<ExitCode> {
    match command {
        ProfileCommand::Show => {
            println!(
                "{}",
                session
                    .active_profile()
                    .unwrap_or_else(|| looptrack_core::app::report::UNKNOWN_PROFILE.to_string())
            );
            Ok(ExitCode::SUCCESS)
        }
        ProfileCommand::Set { name } => match session.set_profile(&name) {
            Ok(path) => {
                println!("active_profile set to '{name}' in {}", path.display());
                Ok(ExitCode::SUCCESS)
            }
            Err(e) => {
                eprintln!("{e}");
                Ok(ExitCode::FAILURE)
            }
        },
    }
}

fn build_session(cli: &Cli) -> anyhow::Result<Session> {
    let root = match &cli.project_root {
        Some(root) => root.clone(),
        None => std::env::current_dir().context("cannot determine the current directory")?,
    };
    let mut config = LoopConfig::from_env(root);
    if let Some(p) = &cli.tasks_dir {
        config.tasks_dir = config.resolve(p);
    }
    if let Some(p) = &cli.master_doc {
        config.master_doc = config.resolve(p);
    }
    if let Some(p) = &cli.state_file {
        config.state_file = config.resolve(p);
    }
    if let Some(p) = &cli.profile_config {
        config.profile_config = Some(config.resolve(p));
    }
    if let Some(marker) = &cli.pending_marker {
        config.pending_marker = marker.clone();
    }
    debug!(
        root = %config.project_root.display(),
        tasks = %config.tasks_dir.display(),
        state = %config.state_file.display(),
        "resolved paths"
    );
    Ok(SessionBuilder::new(config).build()?)
}

fn pass_fail(passed: bool) -> ExitCode {
    if passed {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}

fn print_json(value: &impl serde::Serialize) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_definition_is_consistent() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn report_step_accepts_zero_and_seven_only() {
        let cli = Cli::try_parse_from(["looptrack", "report", "--step", "7"]).unwrap();
        assert!(matches!(
            cli.command,
            Command::Report {
                step: ReportStep::WrapUp,
                json: false
            }
        ));
        assert!(Cli::try_parse_from(["looptrack", "report", "--step", "3"]).is_err());
    }

    #[test]
    fn state_update_maps_only_given_fields() {
        let cli = Cli::try_parse_from([
            "looptrack", "state", "update", "--task", "AUTH-01", "--loop-step", "4",
        ])
        .unwrap();
        let Command::State {
            command: StateCommand::Update(args),
        } = cli.command
        else {
            panic!("expected state update");
        };
        let update: StateUpdate = args.into();
        assert_eq!(update.current_task_id, Some(TaskId::new("AUTH-01")));
        assert_eq!(update.current_loop_step, Some(4));
        assert_eq!(update.notes, None);
        assert_eq!(update.current_profile, None);
    }

    const VALID_TASK: &str = "\
id: AUTH-01
title: Login
loop_step: 3
preconditions:
  - schema
refs:
  - docs/service/service-definition.md
required_tests:
  - make tests-core
post_updates:
  - docs/service/tech-guide.md
acceptance:
  - user can log in
";

    fn run_in(root: &std::path::Path, args: &[&str]) -> ExitCode {
        let root = root.to_string_lossy().into_owned();
        let argv = ["looptrack", "--project-root", root.as_str()]
            .into_iter()
            .chain(args.iter().copied());
        exit_code(run(Cli::try_parse_from(argv).unwrap()))
    }

    fn project_with(task: &str) -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        let tasks = dir.path().join("docs").join("tasks");
        std::fs::create_dir_all(&tasks).unwrap();
        std::fs::write(tasks.join("AUTH-01.yaml"), task).unwrap();
        dir
    }

    #[test]
    fn clean_project_exits_zero() {
        let dir = project_with(VALID_TASK);
        assert_eq!(run_in(dir.path(), &["lint"]), ExitCode::SUCCESS);
        assert_eq!(run_in(dir.path(), &["validate"]), ExitCode::SUCCESS);
    }

    #[test]
    fn issues_exit_one() {
        let dir = project_with(&VALID_TASK.replace("loop_step: 3", "loop_step: nine"));
        assert_eq!(run_in(dir.path(), &["lint"]), ExitCode::FAILURE);
        assert_eq!(run_in(dir.path(), &["validate"]), ExitCode::FAILURE);
    }

    #[test]
    fn missing_task_directory_exits_two() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(run_in(dir.path(), &["lint"]), ExitCode::from(2));
        assert_eq!(run_in(dir.path(), &["report", "--step", "0"]), ExitCode::from(2));
    }

    #[test]
    fn global_flags_work_after_the_subcommand() {
        let cli = Cli::try_parse_from(["looptrack", "lint", "--tasks-dir", "tasks"]).unwrap();
        assert_eq!(cli.tasks_dir, Some(PathBuf::from("tasks")));
    }
}
