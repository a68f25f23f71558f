//! Typed configuration consumed by the collection layer.
//!
//! The configuration is read-only for everything in this crate. Loading it from
//! disk is the job of the front end (see the `task-collect` crate); here it is
//! just data plus a few lookups that turn absent sections into
//! [`CollectError::Configuration`].

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::{BTreeMap, BTreeSet};
use std::path::PathBuf;
use tracing::{debug, info};

use crate::error::CollectError;

pub const DEFAULT_SCHEDULER_URL: &str = "http://127.0.0.1:8080";
pub const DEFAULT_TASK_DELAY_SECS: u64 = 60;
pub const DEFAULT_REPOSITORY_DIR: &str = "/tmp";
pub const DEFAULT_ES_COLLECTION: &str = "http://127.0.0.1:9200";
pub const DEFAULT_P2O_COMMAND: &str = "p2o.py";

/// Where collection work is executed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExecutionMode {
    /// Collect in-process through the local collection entrypoint.
    #[default]
    Local,
    /// Hand tasks to the remote scheduler.
    Remote,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CollectConfig {
    #[serde(default)]
    pub general: GeneralSection,
    #[serde(default)]
    pub scheduler: SchedulerSettings,
    /// project name -> backend name -> repositories
    #[serde(default)]
    pub projects: BTreeMap<String, BTreeMap<String, Vec<String>>>,
    #[serde(default)]
    pub backends: BTreeMap<String, BackendSection>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralSection {
    #[serde(default)]
    pub mode: ExecutionMode,
    /// Storage endpoint raw items are written to by local collection.
    #[serde(default = "default_es_collection")]
    pub es_collection: String,
    /// Executable spawned by [`P2oFeeder`](crate::feeder::P2oFeeder).
    #[serde(default = "default_p2o_command")]
    pub p2o_command: PathBuf,
}

impl Default for GeneralSection {
    fn default() -> Self {
        Self {
            mode: ExecutionMode::default(),
            es_collection: default_es_collection(),
            p2o_command: default_p2o_command(),
        }
    }
}

fn default_es_collection() -> String {
    DEFAULT_ES_COLLECTION.to_string()
}

fn default_p2o_command() -> PathBuf {
    PathBuf::from(DEFAULT_P2O_COMMAND)
}

/// Settings of the remote scheduler, passed explicitly to the scheduler and
/// its HTTP client instead of living in globals.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerSettings {
    pub url: String,
    /// Delay between runs of a scheduled task, in seconds.
    pub task_delay: u64,
    /// Parent directory of the working copies of git tasks.
    pub repository_dir: PathBuf,
    pub connect_timeout_secs: u64,
    pub request_timeout_secs: u64,
}

impl Default for SchedulerSettings {
    fn default() -> Self {
        Self {
            url: DEFAULT_SCHEDULER_URL.to_string(),
            task_delay: DEFAULT_TASK_DELAY_SECS,
            repository_dir: PathBuf::from(DEFAULT_REPOSITORY_DIR),
            connect_timeout_secs: 10,
            request_timeout_secs: 60,
        }
    }
}

/// Options of one backend. Anything not modelled explicitly ends up in
/// `options`, in file order, and is forwarded to the collectors.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BackendSection {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub collect: Option<bool>,
    #[serde(
        default,
        rename = "fetch-cache",
        skip_serializing_if = "Option::is_none"
    )]
    pub fetch_cache: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub raw_index: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enriched_index: Option<String>,
    #[serde(flatten)]
    pub options: Map<String, Value>,
}

impl BackendSection {
    pub fn fetch_cache(&self) -> bool {
        self.fetch_cache.unwrap_or(false)
    }

    pub fn raw_index(&self, backend_name: &str) -> Result<&str, CollectError> {
        self.raw_index
            .as_deref()
            .ok_or_else(|| CollectError::configuration(backend_name, "missing raw_index"))
    }

    pub fn enriched_index(&self, backend_name: &str) -> Result<&str, CollectError> {
        self.enriched_index
            .as_deref()
            .ok_or_else(|| CollectError::configuration(backend_name, "missing enriched_index"))
    }
}

impl CollectConfig {
    pub fn backend(&self, backend_name: &str) -> Result<&BackendSection, CollectError> {
        self.backends
            .get(backend_name)
            .ok_or_else(|| CollectError::configuration(backend_name, "missing backend section"))
    }

    /// Repositories of a backend across all projects, in project order,
    /// first occurrence wins.
    pub fn repos_for(&self, backend_name: &str) -> Vec<String> {
        let mut seen = BTreeSet::new();
        self.projects
            .values()
            .filter_map(|backends| backends.get(backend_name))
            .flatten()
            .filter(|repo| seen.insert(repo.as_str()))
            .cloned()
            .collect()
    }

    /// Every backend named either by a section or by a project entry.
    pub fn backend_names(&self) -> Vec<String> {
        let mut names: BTreeSet<&str> = self.backends.keys().map(String::as_str).collect();
        for backends in self.projects.values() {
            names.extend(backends.keys().map(String::as_str));
        }
        names.into_iter().map(str::to_string).collect()
    }

    pub fn trace_loaded(&self) {
        info!(
            mode = ?self.general.mode,
            backends_count = self.backends.len(),
            projects_count = self.projects.len(),
            scheduler_url = %self.scheduler.url,
            "Loaded collection config"
        );
        for (name, section) in &self.backends {
            let option_keys: Vec<&str> = section.options.keys().map(String::as_str).collect();
            debug!(
                backend = %name,
                collect = ?section.collect,
                raw_index = ?section.raw_index,
                enriched_index = ?section.enriched_index,
                ?option_keys,
                "Backend section loaded"
            );
        }
    }
}
