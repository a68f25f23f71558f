//! Outcome reporting for collection runs.

use std::fmt;
use std::time::Duration;

use crate::config::ExecutionMode;
use crate::error::CollectError;

/// Final state of one repository of one backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RepoOutcome {
    /// Raw data collected in-process.
    Collected,
    /// Task added to the remote scheduler.
    Submitted,
    /// The remote scheduler already holds a task with the same id.
    SkippedDuplicate,
    /// Enrichment-only repository.
    SkippedFilterRaw,
    /// Collection disabled for the backend.
    SkippedDisabled,
}

impl fmt::Display for RepoOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RepoOutcome::Collected => "collected",
            RepoOutcome::Submitted => "submitted",
            RepoOutcome::SkippedDuplicate => "skipped (duplicate task)",
            RepoOutcome::SkippedFilterRaw => "skipped (filter-raw)",
            RepoOutcome::SkippedDisabled => "skipped (collect disabled)",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoReport {
    pub repo: String,
    /// Set for remote scheduling only.
    pub task_id: Option<String>,
    pub outcome: RepoOutcome,
}

#[derive(Debug, Clone)]
pub struct BackendReport {
    pub backend: String,
    pub mode: ExecutionMode,
    pub repos: Vec<RepoReport>,
    pub elapsed: Duration,
}

impl BackendReport {
    pub fn new(backend: &str, mode: ExecutionMode) -> Self {
        Self {
            backend: backend.to_string(),
            mode,
            repos: Vec::new(),
            elapsed: Duration::ZERO,
        }
    }

    /// Report for a backend whose collection is disabled: every repo skipped.
    pub fn disabled(backend: &str, mode: ExecutionMode, repos: &[String]) -> Self {
        let mut report = Self::new(backend, mode);
        for repo in repos {
            report.record(repo, None, RepoOutcome::SkippedDisabled);
        }
        report
    }

    pub fn record(&mut self, repo: &str, task_id: Option<String>, outcome: RepoOutcome) {
        self.repos.push(RepoReport {
            repo: repo.to_string(),
            task_id,
            outcome,
        });
    }

    pub fn count(&self, outcome: RepoOutcome) -> usize {
        self.repos.iter().filter(|r| r.outcome == outcome).count()
    }

    pub fn outcome_of(&self, repo: &str) -> Option<RepoOutcome> {
        self.repos.iter().find(|r| r.repo == repo).map(|r| r.outcome)
    }
}

/// A backend whose processing stopped on an error.
#[derive(Debug)]
pub struct BackendFailure {
    pub backend: String,
    pub error: CollectError,
}

/// Everything one orchestrator run did.
#[derive(Debug, Default)]
pub struct RunReport {
    pub reports: Vec<BackendReport>,
    pub failures: Vec<BackendFailure>,
}

impl RunReport {
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }

    pub fn report_for(&self, backend: &str) -> Option<&BackendReport> {
        self.reports.iter().find(|r| r.backend == backend)
    }
}

/// `HH:MM:SS`, hours not wrapped at 24.
pub fn format_elapsed(elapsed: Duration) -> String {
    let secs = elapsed.as_secs();
    format!("{:02}:{:02}:{:02}", secs / 3600, (secs % 3600) / 60, secs % 60)
}

