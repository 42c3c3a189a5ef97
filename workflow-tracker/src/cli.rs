//! Command-line interface
//!
//! Without a subcommand the binary opens the terminal UI; each subcommand runs
//! one operation against the execution service and exits.

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use workflow_tracker_sdk::{WorkflowAction, WorkflowApi, WorkflowStatus};

use crate::config::ConfigOverrides;
use crate::library::WorkflowLibrary;
use crate::steps::{affordance, format_duration, status_glyph};
use crate::tracker::{open_gate, spawn_tracker, TrackerOptions};

#[derive(Parser, Debug)]
#[command(name = "workflow-tracker", version, about = "Track research workflows on a remote execution service")]
pub struct Cli {
    /// Config file (YAML)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Execution service base URL
    #[arg(long, global = true)]
    pub base_url: Option<String>,

    /// Bearer token for the execution service
    #[arg(long, global = true)]
    pub token: Option<String>,

    /// Status poll interval in milliseconds
    #[arg(long, global = true)]
    pub poll_interval_ms: Option<u64>,

    /// Log filter, e.g. "debug" or "workflow_tracker=trace"
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    /// Log file used by the terminal UI
    #[arg(long, global = true)]
    pub log_file: Option<PathBuf>,

    /// Print raw JSON (list, status)
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// List workflows grouped by status
    List,
    /// Show the current status of a workflow
    Status { workflow_id: String },
    /// Follow a workflow until it completes or fails
    Watch { workflow_id: String },
    /// Ask the service to cancel a workflow
    Cancel { workflow_id: String },
    /// Retry a failed workflow from its failed step
    Retry { workflow_id: String },
    /// Delete a workflow and its tracking data
    Delete { workflow_id: String },
}

impl Cli {
    pub fn overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            base_url: self.base_url.clone(),
            auth_token: self.token.clone(),
            poll_interval_ms: self.poll_interval_ms,
            log_level: self.log_level.clone(),
            log_file: self.log_file.clone(),
        }
    }
}

/// Run one subcommand, writing human-readable (or JSON) output to `out`
pub async fn run_command<W: Write>(
    api: Arc<dyn WorkflowApi>,
    command: &Command,
    json: bool,
    options: TrackerOptions,
    out: &mut W,
) -> Result<()> {
    match command {
        Command::List => {
            let workflows = api.list_workflows().await.context("Failed to list workflows")?;
            if json {
                writeln!(out, "{}", serde_json::to_string_pretty(&workflows)?)?;
                return Ok(());
            }

            let mut library = WorkflowLibrary::new();
            library.request_load();
            library.finish_load(Ok(workflows));
            let groups = library.groups();
            if groups.is_empty() {
                writeln!(out, "No workflows")?;
            }
            for (group, items) in groups.sections() {
                writeln!(out, "{} ({})", group.title(), items.len())?;
                for w in items {
                    write!(out, "  {} {}  {}", status_glyph(w.status), w.id, w.title)?;
                    if w.status.is_active() && w.total_steps > 0 {
                        write!(
                            out,
                            "  step {}/{} {}%",
                            w.display_step(),
                            w.total_steps,
                            w.percent_complete()
                        )?;
                    }
                    if let Some(report) = &w.report {
                        write!(out, "  report: {}", report.display_name())?;
                    }
                    writeln!(out)?;
                }
            }
        }

        Command::Status { workflow_id } => {
            let status = api
                .fetch_status(workflow_id)
                .await
                .with_context(|| format!("Failed to fetch status of {}", workflow_id))?;
            if json {
                writeln!(out, "{}", serde_json::to_string_pretty(&status)?)?;
            } else {
                write_status(out, &status)?;
            }
        }

        Command::Watch { workflow_id } => watch(api, workflow_id, options, out).await?,

        Command::Cancel { workflow_id } => {
            send_action(api, workflow_id, WorkflowAction::Cancel, out).await?
        }

        Command::Retry { workflow_id } => {
            send_action(api, workflow_id, WorkflowAction::Retry, out).await?
        }

        Command::Delete { workflow_id } => {
            api.delete_workflow(workflow_id)
                .await
                .with_context(|| format!("Failed to delete {}", workflow_id))?;
            writeln!(out, "Deleted {}", workflow_id)?;
        }
    }
    Ok(())
}

async fn send_action<W: Write>(
    api: Arc<dyn WorkflowApi>,
    workflow_id: &str,
    action: WorkflowAction,
    out: &mut W,
) -> Result<()> {
    api.send_action(workflow_id, action)
        .await
        .with_context(|| format!("Failed to {} {}", action, workflow_id))?;
    writeln!(out, "Sent {} for {}", action, workflow_id)?;

    // The service is authoritative; show what it reports now
    match api.fetch_status(workflow_id).await {
        Ok(status) => writeln!(out, "{}: {}", status.status, status.progress_line())?,
        Err(e) => writeln!(out, "Status unavailable: {}", e)?,
    }
    Ok(())
}

async fn watch<W: Write>(
    api: Arc<dyn WorkflowApi>,
    workflow_id: &str,
    options: TrackerOptions,
    out: &mut W,
) -> Result<()> {
    let mut tracker = spawn_tracker(api, workflow_id, options, open_gate());
    let mut last_line = String::new();
    let mut last_error = String::new();

    while let Some(snapshot) = tracker.changed().await {
        if let Some(status) = &snapshot.status {
            let line = format!("[{}] {}", status.status, status.progress_line());
            if line != last_line {
                writeln!(out, "{}", line)?;
                last_line = line;
            }
        }

        if let Some(error) = &snapshot.error {
            let message = error.to_string();
            if message != last_error {
                writeln!(out, "! {}", message)?;
                last_error = message;
            }
            if snapshot.status.is_none() && !error.is_recoverable() {
                tracker.shutdown().await;
                bail!("Cannot watch {}: {}", workflow_id, error);
            }
        }

        if snapshot.is_settled() {
            if let Some(status) = &snapshot.status {
                write_outcome(out, status)?;
            }
            break;
        }
    }

    tracker.shutdown().await;
    Ok(())
}

fn write_outcome<W: Write>(out: &mut W, status: &WorkflowStatus) -> std::io::Result<()> {
    if let Some(report) = status.report_ready() {
        writeln!(out, "Report ready: {} ({})", report.display_name(), report.id)?;
    }
    if let Some(error) = &status.error {
        match status.failed_step_status() {
            Some(step) => writeln!(out, "Failed at \"{}\": {}", step.title, error)?,
            None => writeln!(out, "Failed: {}", error)?,
        }
    }
    Ok(())
}

fn write_status<W: Write>(out: &mut W, status: &WorkflowStatus) -> std::io::Result<()> {
    writeln!(out, "{} ({})", status.title, status.id)?;
    writeln!(out, "Query: {}", status.query)?;
    writeln!(out, "Status: {}", status.status)?;
    writeln!(out, "{}", status.progress_line())?;
    for step in &status.steps {
        let a = affordance(step);
        write!(out, "  {} {} {} [{}]", a.glyph, a.icon, step.title, a.label)?;
        if let Some(ms) = step.duration {
            write!(out, " {}", format_duration(ms))?;
        }
        writeln!(out)?;
        if let Some(error) = &step.error {
            writeln!(out, "      error: {}", error)?;
        }
    }
    write_outcome(out, status)
}
