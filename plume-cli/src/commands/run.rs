//! Run command handlers
//!
//! Handles all run-related CLI commands: submitting model inputs, listing
//! and inspecting runs, watching a run until it settles, and fetching outputs.

use anyhow::{Context, Result};
use clap::Subcommand;
use colored::*;
use plume_client::AnalysisClient;
use plume_core::domain::run::{ModelModule, OutputKind, RunInfo, RunStatus};
use plume_core::dto::run::{RunSummary, SubmitRun};
use serde_json::Value as JsonValue;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

use crate::config::Config;
use crate::id_resolver::resolve_run_id;
use crate::types::IdOrPrefix;
use crate::watch::{RunPollState, RunWatcher, WatchOutcome};

/// Options shared by `watch` and `submit --watch`
#[derive(clap::Args, Debug, Clone)]
pub struct WatchArgs {
    /// Override the polling interval (milliseconds)
    #[arg(long)]
    interval_ms: Option<u64>,

    /// Override the maximum number of status checks
    #[arg(long)]
    max_attempts: Option<u32>,

    /// Restart polling this many times after a transient failure
    #[arg(long, default_value_t = 0)]
    retries: u32,

    /// Pause before restarting after a failure (milliseconds)
    #[arg(long, default_value_t = 5000)]
    retry_delay_ms: u64,
}

/// Run subcommands
#[derive(Subcommand)]
pub enum RunCommands {
    /// List all runs
    List,
    /// Get run details
    Get {
        /// Run ID or unambiguous prefix
        id: String,
    },
    /// Submit model inputs as a new run
    Submit {
        /// Model to run (aerscreen, aersurface, aermod)
        module: ModelModule,

        /// JSON file holding the input parameters object
        #[arg(short, long)]
        input: PathBuf,

        /// Label for the run
        #[arg(short, long)]
        name: Option<String>,

        /// Keep polling until the run settles
        #[arg(short, long)]
        watch: bool,

        #[command(flatten)]
        watch_args: WatchArgs,
    },
    /// Poll a run until it finishes or fails
    Watch {
        /// Run ID or unambiguous prefix
        id: String,

        #[command(flatten)]
        watch_args: WatchArgs,
    },
    /// List or download the outputs of a run
    Outputs {
        /// Run ID or unambiguous prefix
        id: String,

        /// Download every output into this directory
        #[arg(short, long)]
        download: Option<PathBuf>,
    },
}

/// Handle run commands
pub async fn handle_run_command(command: RunCommands, config: &Config) -> Result<()> {
    let client = config.client()?;

    match command {
        RunCommands::List => list_runs(&client).await,
        RunCommands::Get { id } => get_run(&client, &id).await,
        RunCommands::Submit {
            module,
            input,
            name,
            watch,
            watch_args,
        } => {
            let run = submit_run(&client, module, &input, name).await?;
            if watch {
                watch_run(client, config, run.id, &watch_args).await?;
            }
            Ok(())
        }
        RunCommands::Watch { id, watch_args } => {
            let uuid = resolve_run_id(&client, &IdOrPrefix::parse(&id)).await?;
            watch_run(client, config, uuid, &watch_args).await
        }
        RunCommands::Outputs { id, download } => {
            list_outputs(&client, &id, download.as_deref()).await
        }
    }
}

/// List all runs
async fn list_runs(client: &AnalysisClient) -> Result<()> {
    let runs = client.list_runs().await?;

    if runs.is_empty() {
        println!("{}", "No runs found.".yellow());
    } else {
        println!("{}", format!("Found {} run(s):", runs.len()).bold());
        println!();
        for run in runs {
            print_run_summary(&run);
        }
    }

    Ok(())
}

/// Get and display a single run
async fn get_run(client: &AnalysisClient, id: &str) -> Result<()> {
    let uuid = resolve_run_id(client, &IdOrPrefix::parse(id)).await?;
    let run = client.get_run(uuid).await?;

    print_run_details(&run);

    Ok(())
}

/// Submit a run from a JSON parameter file
async fn submit_run(
    client: &AnalysisClient,
    module: ModelModule,
    input: &Path,
    name: Option<String>,
) -> Result<RunInfo> {
    let parameters = read_parameters(input)?;

    let run = client
        .submit_run(SubmitRun {
            module,
            name,
            parameters,
        })
        .await
        .context("Failed to submit run")?;

    println!(
        "{} Submitted {} run {}",
        "✓".green(),
        module,
        run.id.to_string().cyan()
    );

    Ok(run)
}

/// Read the parameters object from a JSON file
fn read_parameters(path: &Path) -> Result<HashMap<String, JsonValue>> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read input file {}", path.display()))?;

    serde_json::from_str(&raw)
        .with_context(|| format!("{} must contain a JSON object", path.display()))
}

/// Watch a run until it settles, printing each status change
async fn watch_run(
    client: AnalysisClient,
    config: &Config,
    run_id: Uuid,
    args: &WatchArgs,
) -> Result<()> {
    let mut poller_config = config.poller_config();
    if let Some(ms) = args.interval_ms {
        poller_config.interval = Duration::from_millis(ms);
    }
    if args.max_attempts.is_some() {
        poller_config.max_attempts = args.max_attempts;
    }

    let watcher = RunWatcher::new(Arc::new(client), run_id, poller_config)
        .with_retries(args.retries, Duration::from_millis(args.retry_delay_ms));

    println!("{}", format!("Watching run {}", run_id).bold());

    let mut printer = ProgressPrinter::default();
    let outcome = tokio::select! {
        outcome = watcher.watch(|state| printer.update(state)) => outcome?,
        _ = tokio::signal::ctrl_c() => {
            println!("{}", "Stopped watching.".yellow());
            return Ok(());
        }
    };

    match outcome {
        WatchOutcome::Finished(run) => {
            println!("{} Run finished", "✓".green());
            print_outputs(&run);
            Ok(())
        }
        WatchOutcome::Failed(run) => {
            let reason = run.message.as_deref().unwrap_or("no reason given");
            anyhow::bail!("Run {} failed: {}", run.id, reason)
        }
        WatchOutcome::GaveUp { attempts, last } => {
            let status = last
                .map(|run| run.status.to_string())
                .unwrap_or_else(|| "unknown".to_string());
            anyhow::bail!(
                "Run {} still {} after {} status check(s)",
                run_id,
                status,
                attempts
            )
        }
        WatchOutcome::Errored(error) => {
            anyhow::bail!("Status check for run {} failed: {}", run_id, error)
        }
    }
}

/// Prints a line whenever the observed status or progress changes
#[derive(Default)]
struct ProgressPrinter {
    last: Option<(RunStatus, Option<u8>)>,
}

impl ProgressPrinter {
    fn update(&mut self, state: &RunPollState) {
        let Some(run) = &state.data else {
            return;
        };

        let current = (run.status, run.progress);
        if self.last == Some(current) {
            return;
        }
        self.last = Some(current);

        let progress = run
            .progress
            .map(|p| format!(" {:>3}%", p))
            .unwrap_or_default();
        println!(
            "  [check {:>3}] {}{}",
            state.attempt_count,
            colorize_status(run.status),
            progress.dimmed()
        );
    }
}

/// List the outputs of a run, optionally downloading them
async fn list_outputs(client: &AnalysisClient, id: &str, download: Option<&Path>) -> Result<()> {
    let uuid = resolve_run_id(client, &IdOrPrefix::parse(id)).await?;
    let run = client.get_run(uuid).await?;

    if run.outputs.is_empty() {
        println!("{}", "This run has no outputs.".yellow());
        return Ok(());
    }

    print_outputs(&run);

    if let Some(dir) = download {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create {}", dir.display()))?;

        for output in &run.outputs {
            let target = output_path(dir, &output.name)?;
            let bytes = client
                .download_output(&output.url)
                .await
                .with_context(|| format!("Failed to download {}", output.name))?;
            std::fs::write(&target, bytes)
                .with_context(|| format!("Failed to write {}", target.display()))?;
            println!("  {} {}", "↓".green(), target.display());
        }
    }

    Ok(())
}

/// Target path for an output, keeping only its final file name
fn output_path(dir: &Path, name: &str) -> Result<PathBuf> {
    let file_name = Path::new(name)
        .file_name()
        .with_context(|| format!("Output name '{}' is not a file name", name))?;
    Ok(dir.join(file_name))
}

/// Print a run summary line block
fn print_run_summary(run: &RunSummary) {
    println!("  {} Run {}", "▸".cyan(), run.id.to_string().dimmed());
    println!("    Module:    {}", run.module);
    println!("    Status:    {}", colorize_status(run.status));
    if let Some(name) = &run.name {
        println!("    Name:      {}", name);
    }
    println!(
        "    Submitted: {}",
        run.submitted_at
            .format("%Y-%m-%d %H:%M:%S")
            .to_string()
            .dimmed()
    );
    println!();
}

/// Print detailed run information
fn print_run_details(run: &RunInfo) {
    println!("{}", "Run Details:".bold());
    println!("  ID:        {}", run.id.to_string().cyan());
    println!("  Module:    {}", run.module);
    println!("  Status:    {}", colorize_status(run.status));

    if let Some(name) = &run.name {
        println!("  Name:      {}", name);
    }

    println!(
        "  Submitted: {}",
        run.submitted_at.format("%Y-%m-%d %H:%M:%S")
    );

    if let Some(started) = run.started_at {
        println!("  Started:   {}", started.format("%Y-%m-%d %H:%M:%S"));
    }

    if let Some(finished) = run.finished_at {
        println!("  Finished:  {}", finished.format("%Y-%m-%d %H:%M:%S"));
    }

    if let Some(duration) = run.duration() {
        println!("  Duration:  {}s", duration.num_seconds());
    }

    if let Some(progress) = run.progress {
        println!("  Progress:  {}%", progress);
    }

    if let Some(message) = &run.message {
        println!("\n{}", "Message:".bold());
        if run.status == RunStatus::Fail {
            println!("{}", message.red());
        } else {
            println!("{}", message);
        }
    }

    if !run.outputs.is_empty() {
        println!();
        print_outputs(run);
    }
}

/// Print the outputs of a run
fn print_outputs(run: &RunInfo) {
    if run.outputs.is_empty() {
        return;
    }

    println!("{}", "Outputs:".bold());
    for output in &run.outputs {
        let kind = match output.kind {
            OutputKind::Chart => "chart".cyan(),
            OutputKind::Map => "map".green(),
            OutputKind::File => "file".normal(),
        };
        println!("  [{}] {} {}", kind, output.name, output.url.dimmed());
    }
}

/// Colorize run status for display
fn colorize_status(status: RunStatus) -> ColoredString {
    let status_str = status.to_string();
    match status {
        RunStatus::Pending => status_str.yellow(),
        RunStatus::Running => status_str.cyan(),
        RunStatus::Finished => status_str.green(),
        RunStatus::Fail => status_str.red(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_read_parameters() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"stack_height": 30.0, "terrain": "flat"}}"#).unwrap();

        let params = read_parameters(file.path()).unwrap();
        assert_eq!(params["stack_height"], 30.0);
        assert_eq!(params["terrain"], "flat");
    }

    #[test]
    fn test_read_parameters_rejects_non_object() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "[1, 2, 3]").unwrap();

        assert!(read_parameters(file.path()).is_err());
    }

    #[test]
    fn test_output_path_strips_directories() {
        let dir = Path::new("/tmp/out");
        assert_eq!(
            output_path(dir, "../../etc/plot.png").unwrap(),
            dir.join("plot.png")
        );
        assert_eq!(output_path(dir, "table.csv").unwrap(), dir.join("table.csv"));
        assert!(output_path(dir, "..").is_err());
    }
}
