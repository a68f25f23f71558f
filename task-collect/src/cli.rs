///
/// This module implements the CLI interface for task-collect: command parsing,
/// wiring of the executors and user-visible output.
///
/// All orchestration logic lives in the [`task-collect-core`] crate. This module
/// only loads configuration, builds the production executors and reports.
///
/// ## Features
/// - Entry struct [`Cli`] defines all user-facing options and subcommands.
/// - `collect` runs every configured backend once, locally or through the remote scheduler.
/// - `tasks` lists the task ids registered in the remote scheduler.
/// - Async entrypoint ([`run`]) for programmatic invocation and integration testing.
///
/// [`task-collect-core`]: ../../task-collect-core/
use crate::arthur::ArthurClient;
use crate::load_config::load_config;
use anyhow::{bail, Result};
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use task_collect_core::config::ExecutionMode;
use task_collect_core::contract::TaskRegistry;
use task_collect_core::feeder::P2oFeeder;
use task_collect_core::orchestrate::TaskOrchestrator;
use task_collect_core::report::{format_elapsed, RunReport};

/// CLI for task-collect: schedule or run raw data collection.
#[derive(Parser)]
#[clap(
    name = "task-collect",
    version,
    about = "Collect raw activity data from configured repositories, locally or through a remote task scheduler"
)]
pub struct Cli {
    #[clap(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run collection for every configured backend once
    Collect {
        /// Path to the YAML config file
        #[clap(long)]
        config: PathBuf,
        /// Override `general.mode` from the config file
        #[clap(long, value_enum)]
        mode: Option<ModeArg>,
    },
    /// List the task ids registered in the remote scheduler
    Tasks {
        /// Path to the YAML config file
        #[clap(long)]
        config: PathBuf,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ModeArg {
    Local,
    Remote,
}

impl From<ModeArg> for ExecutionMode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::Local => ExecutionMode::Local,
            ModeArg::Remote => ExecutionMode::Remote,
        }
    }
}

/// Async CLI entrypoint shared by `main()` and the integration tests.
pub async fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Collect { config, mode } => {
            let mut config = load_config(config)?;
            if let Some(mode) = mode {
                config.general.mode = mode.into();
            }
            tracing::info!(command = "collect", mode = ?config.general.mode, "Starting collection");

            let feeder = P2oFeeder::from_config(&config);
            let registry = match config.general.mode {
                ExecutionMode::Remote => Some(ArthurClient::new(&config.scheduler)?),
                ExecutionMode::Local => None,
            };
            let mut orchestrator = TaskOrchestrator::new(&config).with_feeder(&feeder);
            if let Some(registry) = &registry {
                orchestrator = orchestrator.with_registry(registry);
            }

            let report = match orchestrator.run().await {
                Ok(report) => report,
                Err(e) => {
                    tracing::error!(command = "collect", error = %e, "Collection run aborted");
                    return Err(anyhow::Error::new(e).context("Collection run aborted"));
                }
            };

            println!("Collection complete.\nReport:");
            print!("{}", render_report(&report));
            if !report.is_success() {
                tracing::error!(
                    command = "collect",
                    failed = report.failures.len(),
                    "Collection finished with failed backends"
                );
                bail!("{} backend(s) failed", report.failures.len());
            }
            tracing::info!(command = "collect", "Collection complete");
            Ok(())
        }
        Commands::Tasks { config } => {
            let config = load_config(config)?;
            let client = ArthurClient::new(&config.scheduler)?;
            let mut ids: Vec<String> = client.list().await?.into_iter().collect();
            ids.sort();
            tracing::info!(command = "tasks", count = ids.len(), scheduler_url = client.base_url(), "Listed scheduler tasks");
            for id in ids {
                println!("{id}");
            }
            Ok(())
        }
    }
}

/// Human readable run summary, one line per repository.
pub fn render_report(report: &RunReport) -> String {
    let mut out = String::new();
    for backend in &report.reports {
        out.push_str(&format!(
            "[{}] {:?} in {}\n",
            backend.backend,
            backend.mode,
            format_elapsed(backend.elapsed)
        ));
        for repo in &backend.repos {
            match &repo.task_id {
                Some(task_id) => out.push_str(&format!("  {} ({}): {}\n", repo.repo, task_id, repo.outcome)),
                None => out.push_str(&format!("  {}: {}\n", repo.repo, repo.outcome)),
            }
        }
    }
    for failure in &report.failures {
        out.push_str(&format!("[{}] FAILED: {}\n", failure.backend, failure.error));
    }
    out
}
