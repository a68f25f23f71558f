//! Top-level dispatch: every configured backend, local or remote.
//!
//! The orchestrator holds no logic beyond choosing the executor and collecting
//! the per-backend results. A backend that fails is recorded and the next one
//! runs, except when the remote scheduler is unreachable: then the run stops
//! and the error is returned.

use tracing::{debug, error, info};

use crate::collect::SyncCollector;
use crate::config::{CollectConfig, ExecutionMode};
use crate::contract::{RawFeeder, TaskRegistry};
use crate::error::CollectError;
use crate::report::{BackendFailure, BackendReport, RunReport};
use crate::schedule::RemoteScheduler;

pub struct TaskOrchestrator<'a> {
    config: &'a CollectConfig,
    feeder: Option<&'a dyn RawFeeder>,
    registry: Option<&'a dyn TaskRegistry>,
}

impl<'a> TaskOrchestrator<'a> {
    pub fn new(config: &'a CollectConfig) -> Self {
        Self {
            config,
            feeder: None,
            registry: None,
        }
    }

    /// Entrypoint used when the configuration asks for local collection.
    pub fn with_feeder(mut self, feeder: &'a dyn RawFeeder) -> Self {
        self.feeder = Some(feeder);
        self
    }

    /// Registry used when the configuration asks for remote scheduling.
    pub fn with_registry(mut self, registry: &'a dyn TaskRegistry) -> Self {
        self.registry = Some(registry);
        self
    }

    pub async fn run(&self) -> Result<RunReport, CollectError> {
        let mode = self.config.general.mode;
        info!(mode = ?mode, "[ORCHESTRATE] Starting collection run");

        let mut run = RunReport::default();
        for backend_name in self.config.backend_names() {
            let repos = self.config.repos_for(&backend_name);
            if repos.is_empty() {
                debug!(backend = %backend_name, "[ORCHESTRATE] No repositories configured, skipping backend");
                continue;
            }

            match self.run_backend(mode, &backend_name, &repos).await {
                Ok(report) => run.reports.push(report),
                Err(e) if e.is_fatal() => {
                    error!(backend = %backend_name, error = %e, "[ORCHESTRATE][FATAL] Stopping collection run");
                    return Err(e);
                }
                Err(e) => {
                    error!(backend = %backend_name, error = %e, "[ORCHESTRATE][ERROR] Backend failed");
                    run.failures.push(BackendFailure {
                        backend: backend_name,
                        error: e,
                    });
                }
            }
        }

        info!(
            backends_ok = run.reports.len(),
            backends_failed = run.failures.len(),
            "[ORCHESTRATE] Collection run finished"
        );
        Ok(run)
    }

    async fn run_backend(
        &self,
        mode: ExecutionMode,
        backend_name: &str,
        repos: &[String],
    ) -> Result<BackendReport, CollectError> {
        match mode {
            ExecutionMode::Local => {
                let feeder = self.feeder.ok_or_else(|| {
                    CollectError::configuration(backend_name, "no local collection entrypoint available")
                })?;
                SyncCollector::new(self.config, feeder)
                    .collect(backend_name, repos)
                    .await
            }
            ExecutionMode::Remote => {
                let registry = self.registry.ok_or_else(|| {
                    CollectError::configuration(backend_name, "no task registry available")
                })?;
                RemoteScheduler::new(self.config, registry)
                    .schedule_all(backend_name, repos)
                    .await
            }
        }
    }
}
