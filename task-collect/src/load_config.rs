/// `load_config` module: loads the YAML collection configuration and applies environment overrides.
///
/// This is the only place where user-supplied YAML is parsed. The result is the
/// typed [`CollectConfig`] of the core crate.
///
/// # Responsibilities
/// - Parse the configuration file into type-safe structs
/// - Apply environment overrides for deployment specific endpoints
/// - Reject configurations that can not work before any collection starts
///
/// # Environment
/// - `TASK_COLLECT_SCHEDULER_URL` replaces `scheduler.url`
/// - `TASK_COLLECT_ES_COLLECTION` replaces `general.es_collection`
///
/// # Errors
/// All errors use `anyhow::Error` for context-rich diagnostics and are surfaced at the CLI boundary.
use anyhow::{bail, Context, Result};
use std::fs;
use std::path::Path;
use task_collect_core::config::CollectConfig;
use tracing::{error, info};

pub const SCHEDULER_URL_ENV: &str = "TASK_COLLECT_SCHEDULER_URL";
pub const ES_COLLECTION_ENV: &str = "TASK_COLLECT_ES_COLLECTION";

pub fn load_config<P: AsRef<Path>>(path: P) -> Result<CollectConfig> {
    let path_ref = path.as_ref();
    info!(config_path = ?path_ref, "Loading configuration from file");

    let config_content = match fs::read_to_string(path_ref) {
        Ok(content) => content,
        Err(e) => {
            error!(error = ?e, config_path = ?path_ref, "Failed to read config file");
            return Err(anyhow::anyhow!(
                "Failed to read config file {:?}: {}",
                path_ref,
                e
            ));
        }
    };

    let mut config: CollectConfig = match serde_yaml::from_str(&config_content) {
        Ok(conf) => {
            info!(config_path = ?path_ref, "Parsed config YAML successfully");
            conf
        }
        Err(e) => {
            error!(error = ?e, config_path = ?path_ref, "Failed to parse config YAML");
            return Err(anyhow::anyhow!("Failed to parse config YAML: {e}"));
        }
    };

    apply_env_overrides(&mut config);
    validate(&config).with_context(|| format!("Invalid configuration in {path_ref:?}"))?;
    config.trace_loaded();
    Ok(config)
}

fn apply_env_overrides(config: &mut CollectConfig) {
    if let Ok(url) = std::env::var(SCHEDULER_URL_ENV) {
        info!(scheduler_url = %url, "Scheduler url overridden from environment");
        config.scheduler.url = url;
    }
    if let Ok(url) = std::env::var(ES_COLLECTION_ENV) {
        info!(es_collection = %url, "Collection endpoint overridden from environment");
        config.general.es_collection = url;
    }
}

fn validate(config: &CollectConfig) -> Result<()> {
    if config.scheduler.url.trim().is_empty() {
        bail!("scheduler.url must not be empty");
    }
    if config.general.es_collection.trim().is_empty() {
        bail!("general.es_collection must not be empty");
    }
    for (project, backends) in &config.projects {
        for (backend, repos) in backends {
            if let Some(repo) = repos.iter().find(|r| r.trim().is_empty()) {
                bail!("project '{project}' lists an empty repository {repo:?} for backend '{backend}'");
            }
        }
    }
    Ok(())
}
