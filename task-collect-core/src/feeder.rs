//! Local collection entrypoint backed by the `p2o` command line tool.
//!
//! Each [`FeedRequest`] becomes one `p2o` process; the call returns when the
//! process exits. A spawn failure or a non-zero exit status is a feed error.

use serde_json::Value;
use std::path::PathBuf;
use tokio::process::Command;

use crate::config::CollectConfig;
use crate::contract::{FeedError, FeedRequest, RawFeeder};
use crate::params::data_source;

/// Collector arguments passed positionally, in this order, when present.
const POSITIONAL_ARGS: &[&str] = &["uri", "dirpath"];

pub struct P2oFeeder {
    program: PathBuf,
}

impl P2oFeeder {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }

    pub fn from_config(config: &CollectConfig) -> Self {
        Self::new(config.general.p2o_command.clone())
    }
}

/// Command line for one request, program name excluded.
pub fn command_args(req: &FeedRequest) -> Vec<String> {
    let mut args = vec![
        "-e".to_string(),
        req.endpoint.clone(),
        "--index".to_string(),
        req.raw_index.clone(),
        "--index-enrich".to_string(),
        req.enriched_index.clone(),
    ];
    if req.clean {
        args.push("--no_incremental".to_string());
    }
    if req.fetch_cache {
        args.push("--fetch_cache".to_string());
    }
    args.push(data_source(&req.backend_name).to_string());

    for key in POSITIONAL_ARGS {
        if let Some(value) = req.backend_args.get(*key) {
            args.push(plain(value));
        }
    }
    for (key, value) in &req.backend_args {
        if POSITIONAL_ARGS.contains(&key.as_str()) {
            continue;
        }
        match value {
            Value::Null | Value::Bool(false) => {}
            Value::Bool(true) => args.push(format!("--{key}")),
            Value::Array(items) => {
                args.push(format!("--{key}"));
                args.extend(items.iter().map(plain));
            }
            other => {
                args.push(format!("--{key}"));
                args.push(plain(other));
            }
        }
    }
    args
}

/// String values without JSON quoting.
fn plain(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[async_trait::async_trait]
impl RawFeeder for P2oFeeder {
    async fn feed_backend(&self, req: FeedRequest) -> Result<(), FeedError> {
        let args = command_args(&req);
        tracing::debug!(
            program = %self.program.display(),
            backend = %req.backend_name,
            arg_count = args.len(),
            url = %req.url,
            "Launching raw collection process"
        );

        let status = Command::new(&self.program).args(&args).status().await;
        match status {
            Ok(s) if s.success() => {
                tracing::info!(
                    backend = %req.backend_name,
                    url = %req.url,
                    raw_index = %req.raw_index,
                    "Raw collection process finished"
                );
                Ok(())
            }
            Ok(s) => {
                tracing::error!(
                    backend = %req.backend_name,
                    url = %req.url,
                    "Raw collection process exited with non-zero code: {}", s
                );
                Err(format!("{} exited with {s}", self.program.display()).into())
            }
            Err(e) => {
                tracing::error!(
                    error = ?e,
                    program = %self.program.display(),
                    "Failed to launch raw collection process"
                );
                Err(format!("failed to launch {}: {e}", self.program.display()).into())
            }
        }
    }
}
