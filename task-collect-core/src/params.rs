//! Argument composition for the collectors.
//!
//! A repository entry of a project file is a URL optionally followed by more
//! whitespace separated tokens. For mailing-list data sources the second token
//! is the local directory holding the archives. Beyond that the only accepted
//! token is `--filter-raw=<descriptor>`, which marks the repository as
//! enrichment-only.
//!
//! Every function here is pure: same configuration and inputs, same output.

use regex::Regex;
use serde_json::{Map, Value};
use std::sync::OnceLock;

use crate::config::CollectConfig;
use crate::error::CollectError;

/// Collector arguments, in insertion order.
pub type BackendArgs = Map<String, Value>;

/// Parameters shared by collection and enrichment for one repository.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct P2oParams {
    pub url: String,
    pub filter_raw: Option<String>,
}

/// Backend options that steer orchestration or enrichment and must not reach a collector.
const NON_COLLECTOR_OPTIONS: &[&str] = &["studies", "node_regex", "anonymize", "enrich"];

const FILTER_RAW_FLAG: &str = "--filter-raw";

/// Data sources whose repository entry is `<uri> <dirpath>`.
const MAILING_LIST_SOURCES: &[&str] = &["mbox", "pipermail"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum KeyStyle {
    /// Option names as written in the configuration (`api-token`).
    Perceval,
    /// Option names as keyword arguments (`api_token`).
    Arthur,
}

/// The part of a backend name before `:` (`github:pull` -> `github`).
pub fn data_source(backend_name: &str) -> &str {
    backend_name
        .split_once(':')
        .map_or(backend_name, |(source, _)| source)
}

fn is_mailing_list(backend_name: &str) -> bool {
    MAILING_LIST_SOURCES.contains(&data_source(backend_name))
}

fn forge_url_regex() -> Option<&'static Regex> {
    static FORGE_URL: OnceLock<Option<Regex>> = OnceLock::new();
    FORGE_URL
        .get_or_init(|| {
            Regex::new(r"^https?://[^/]+/(?P<owner>.+)/(?P<repository>[^/]+?)(?:\.git)?/?$").ok()
        })
        .as_ref()
}

/// A repository entry split into its parts.
struct RepoEntry {
    url: String,
    dirpath: Option<String>,
    filter_raw: Option<String>,
}

fn parse_entry(backend_name: &str, repo: &str) -> Result<RepoEntry, CollectError> {
    let mut tokens = repo.split_whitespace().peekable();
    let url = match tokens.next() {
        Some(url) => url.to_string(),
        None => {
            return Err(CollectError::configuration(
                backend_name,
                format!("repository entry '{repo}' has no url"),
            ))
        }
    };

    let mut dirpath = None;
    if is_mailing_list(backend_name) {
        if let Some(token) = tokens.next_if(|t| !t.starts_with(FILTER_RAW_FLAG)) {
            dirpath = Some(token.to_string());
        }
    }

    let mut filter_raw = None;
    while let Some(token) = tokens.next() {
        if let Some(value) = token.strip_prefix(FILTER_RAW_FLAG) {
            let value = match value.strip_prefix('=') {
                Some(inline) => inline.to_string(),
                None if value.is_empty() => tokens.next().unwrap_or_default().to_string(),
                None => {
                    return Err(unexpected_token(backend_name, repo, token));
                }
            };
            filter_raw = Some(value);
        } else {
            return Err(unexpected_token(backend_name, repo, token));
        }
    }

    Ok(RepoEntry {
        url,
        dirpath,
        filter_raw,
    })
}

pub fn compose_p2o_params(
    config: &CollectConfig,
    backend_name: &str,
    repo: &str,
) -> Result<P2oParams, CollectError> {
    config.backend(backend_name)?;
    let entry = parse_entry(backend_name, repo)?;
    Ok(P2oParams {
        url: entry.url,
        filter_raw: entry.filter_raw,
    })
}

fn unexpected_token(backend_name: &str, repo: &str, token: &str) -> CollectError {
    CollectError::configuration(
        backend_name,
        format!("unexpected token '{token}' in repository entry '{repo}'"),
    )
}

/// Arguments for the local collection entrypoint.
pub fn compose_perceval_params(
    config: &CollectConfig,
    backend_name: &str,
    repo: &str,
) -> Result<BackendArgs, CollectError> {
    compose_collector_args(config, backend_name, repo, KeyStyle::Perceval)
}

/// Arguments for a remote scheduler task.
pub fn compose_arthur_params(
    config: &CollectConfig,
    backend_name: &str,
    repo: &str,
) -> Result<BackendArgs, CollectError> {
    compose_collector_args(config, backend_name, repo, KeyStyle::Arthur)
}

fn compose_collector_args(
    config: &CollectConfig,
    backend_name: &str,
    repo: &str,
    style: KeyStyle,
) -> Result<BackendArgs, CollectError> {
    let section = config.backend(backend_name)?;
    let entry = parse_entry(backend_name, repo)?;

    let mut args = url_args(backend_name, &entry)?;
    for (key, value) in &section.options {
        if NON_COLLECTOR_OPTIONS.contains(&key.as_str()) {
            continue;
        }
        let key = match style {
            KeyStyle::Perceval => key.clone(),
            KeyStyle::Arthur => key.replace('-', "_"),
        };
        args.insert(key, value.clone());
    }
    Ok(args)
}

/// Arguments a collector needs that are encoded in the repository URL itself.
fn url_args(backend_name: &str, entry: &RepoEntry) -> Result<BackendArgs, CollectError> {
    let url = entry.url.as_str();
    let mut args = BackendArgs::new();
    match data_source(backend_name) {
        "github" | "gitlab" => {
            let caps = forge_url_regex().and_then(|re| re.captures(url)).ok_or_else(|| {
                CollectError::configuration(
                    backend_name,
                    format!("can not extract owner and repository from '{url}'"),
                )
            })?;
            args.insert("owner".into(), Value::String(caps["owner"].to_string()));
            args.insert(
                "repository".into(),
                Value::String(caps["repository"].to_string()),
            );
        }
        source if MAILING_LIST_SOURCES.contains(&source) => {
            args.insert("uri".into(), Value::String(url.to_string()));
            if let Some(dirpath) = &entry.dirpath {
                args.insert("dirpath".into(), Value::String(dirpath.clone()));
            }
        }
        _ => {
            args.insert("uri".into(), Value::String(url.to_string()));
        }
    }
    Ok(args)
}
