//! Hands collection tasks to a remote scheduler instead of running them here.
//!
//! For each repository the scheduler's task set is listed and the new task is
//! added only when its id is absent. Listing then adding is not atomic: two
//! orchestrators working on the same backend at the same time can both add
//! the task. Run a single orchestrator per backend.
//!
//! # Error Handling
//! - Scheduler unreachable: [`CollectError::Connection`], fatal to the run. No
//!   further task is added.
//! - Task rejected by the scheduler: [`CollectError::Submission`], remaining
//!   repositories of the backend are not attempted.
//! - Duplicate task and enrichment-only repository: soft skips, the loop goes on.

use std::time::Instant;
use tracing::{debug, error, info, warn};

use crate::config::{CollectConfig, ExecutionMode};
use crate::contract::TaskRegistry;
use crate::descriptor::TaskDescriptor;
use crate::error::{CollectError, RegistryError};
use crate::gate::{is_enrichment_only, should_collect};
use crate::params::{compose_arthur_params, compose_p2o_params};
use crate::report::{format_elapsed, BackendReport, RepoOutcome};

pub struct RemoteScheduler<'a, R: TaskRegistry + ?Sized> {
    config: &'a CollectConfig,
    registry: &'a R,
}

impl<'a, R: TaskRegistry + ?Sized> RemoteScheduler<'a, R> {
    pub fn new(config: &'a CollectConfig, registry: &'a R) -> Self {
        Self { config, registry }
    }

    pub async fn schedule_all(
        &self,
        backend_name: &str,
        repos: &[String],
    ) -> Result<BackendReport, CollectError> {
        let section = self.config.backend(backend_name)?;
        if !should_collect(backend_name, section) {
            return Ok(BackendReport::disabled(
                backend_name,
                ExecutionMode::Remote,
                repos,
            ));
        }

        let started = Instant::now();
        info!(backend = backend_name, "[SCHEDULE] Programming scheduler for [{backend_name}] raw data collection");

        let mut report = BackendReport::new(backend_name, ExecutionMode::Remote);
        for repo in repos {
            let p2o = compose_p2o_params(self.config, backend_name, repo)?;
            if is_enrichment_only(repo, &p2o) {
                report.record(repo, None, RepoOutcome::SkippedFilterRaw);
                continue;
            }

            let backend_args = compose_arthur_params(self.config, backend_name, repo)?;
            let descriptor =
                TaskDescriptor::build(repo, backend_name, backend_args, &self.config.scheduler);
            debug!(
                task_id = %descriptor.task_id,
                backend = %descriptor.backend,
                arg_keys = ?descriptor.backend_args.keys().collect::<Vec<_>>(),
                delay = descriptor.scheduler.delay,
                "[SCHEDULE] Task descriptor for scheduler"
            );

            let outcome = self.submit_once(backend_name, &descriptor).await?;
            report.record(repo, Some(descriptor.task_id), outcome);
        }

        report.elapsed = started.elapsed();
        for entry in &report.repos {
            info!(
                backend = backend_name,
                repo = %entry.repo,
                task_id = entry.task_id.as_deref().unwrap_or("-"),
                outcome = %entry.outcome,
                "[SCHEDULE] Repository outcome"
            );
        }
        info!(
            backend = backend_name,
            submitted = report.count(RepoOutcome::Submitted),
            duplicates = report.count(RepoOutcome::SkippedDuplicate),
            "[SCHEDULE] [{backend_name}] scheduling finished in {}",
            format_elapsed(report.elapsed)
        );
        Ok(report)
    }

    /// Add `descriptor` unless a task with the same id is already registered.
    async fn submit_once(
        &self,
        backend_name: &str,
        descriptor: &TaskDescriptor,
    ) -> Result<RepoOutcome, CollectError> {
        let existing = self
            .registry
            .list()
            .await
            .map_err(|e| self.listing_error(backend_name, e))?;

        if existing.contains(&descriptor.task_id) {
            warn!(
                backend = backend_name,
                task_id = %descriptor.task_id,
                "[SCHEDULE] Task not added to scheduler because it already exists: {}",
                descriptor.task_id
            );
            return Ok(RepoOutcome::SkippedDuplicate);
        }

        self.registry
            .add(descriptor)
            .await
            .map_err(|e| self.submission_error(&descriptor.task_id, e))?;
        info!(
            backend = backend_name,
            task_id = %descriptor.task_id,
            "[SCHEDULE] [{backend_name}] collection configured in scheduler for {}",
            descriptor.task_id
        );
        Ok(RepoOutcome::Submitted)
    }

    fn listing_error(&self, backend_name: &str, e: RegistryError) -> CollectError {
        match e {
            RegistryError::Connection { url, message } => {
                error!(url = %url, error = %message, "[SCHEDULE][FATAL] Can not connect to {url}");
                CollectError::Connection { url, message }
            }
            other => {
                error!(backend = backend_name, error = %other, "[SCHEDULE][ERROR] Listing scheduler tasks failed");
                CollectError::TaskListing {
                    backend: backend_name.to_string(),
                    message: other.to_string(),
                }
            }
        }
    }

    fn submission_error(&self, task_id: &str, e: RegistryError) -> CollectError {
        error!(task_id, error = %e, "[SCHEDULE][ERROR] Adding task to scheduler failed");
        match e {
            RegistryError::Connection { url, message } => CollectError::Connection { url, message },
            RegistryError::Status { status, body, .. } => CollectError::Submission {
                task_id: task_id.to_string(),
                status,
                message: body,
            },
            RegistryError::Decode { message, .. } => CollectError::Submission {
                task_id: task_id.to_string(),
                status: 0,
                message,
            },
        }
    }
}
