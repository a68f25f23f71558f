//! In-process raw data collection, one repository at a time.
//!
//! Repositories are handed to the [`RawFeeder`] strictly in listed order. The
//! first feeder failure ends the batch: remaining repositories are not
//! attempted and the error is returned to the caller, which decides whether
//! other backends still run.

use std::time::Instant;
use tracing::{debug, error, info};

use crate::config::{CollectConfig, ExecutionMode};
use crate::contract::{FeedRequest, RawFeeder};
use crate::error::CollectError;
use crate::gate::{is_enrichment_only, should_collect};
use crate::params::{compose_p2o_params, compose_perceval_params};
use crate::report::{format_elapsed, BackendReport, RepoOutcome};

pub struct SyncCollector<'a, F: RawFeeder + ?Sized> {
    config: &'a CollectConfig,
    feeder: &'a F,
}

impl<'a, F: RawFeeder + ?Sized> SyncCollector<'a, F> {
    pub fn new(config: &'a CollectConfig, feeder: &'a F) -> Self {
        Self { config, feeder }
    }

    pub async fn collect(
        &self,
        backend_name: &str,
        repos: &[String],
    ) -> Result<BackendReport, CollectError> {
        let section = self.config.backend(backend_name)?;
        if !should_collect(backend_name, section) {
            return Ok(BackendReport::disabled(
                backend_name,
                ExecutionMode::Local,
                repos,
            ));
        }

        let started = Instant::now();
        info!(backend = backend_name, "[COLLECT] [{backend_name}] raw data collection starts");

        let fetch_cache = section.fetch_cache();

        let mut report = BackendReport::new(backend_name, ExecutionMode::Local);
        for repo in repos {
            let p2o = compose_p2o_params(self.config, backend_name, repo)?;
            if is_enrichment_only(repo, &p2o) {
                report.record(repo, None, RepoOutcome::SkippedFilterRaw);
                continue;
            }

            // Indexes are only needed once a repository is actually fed.
            let raw_index = section.raw_index(backend_name)?;
            let enriched_index = section.enriched_index(backend_name)?;
            let backend_args = compose_perceval_params(self.config, backend_name, repo)?;
            debug!(
                backend = backend_name,
                arg_keys = ?backend_args.keys().collect::<Vec<_>>(),
                "[COLLECT] Composed collector arguments"
            );
            debug!(backend = backend_name, repo = %repo, "[COLLECT] [{backend_name}] collection starts for {repo}");

            let req = FeedRequest {
                endpoint: self.config.general.es_collection.clone(),
                clean: false,
                fetch_cache,
                backend_name: backend_name.to_string(),
                backend_args,
                raw_index: raw_index.to_string(),
                enriched_index: enriched_index.to_string(),
                url: p2o.url,
            };
            if let Err(e) = self.feeder.feed_backend(req).await {
                error!(backend = backend_name, repo = %repo, error = %e, "[COLLECT][ERROR] Raw collection failed");
                return Err(CollectError::Collection {
                    backend: backend_name.to_string(),
                    repo: repo.clone(),
                    message: e.to_string(),
                });
            }
            report.record(repo, None, RepoOutcome::Collected);
        }

        report.elapsed = started.elapsed();
        info!(
            backend = backend_name,
            collected = report.count(RepoOutcome::Collected),
            "[COLLECT] [{backend_name}] Data collection finished in {}",
            format_elapsed(report.elapsed)
        );
        Ok(report)
    }
}
