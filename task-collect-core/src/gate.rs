//! Decides whether collection runs at all, per backend and per repository.

use tracing::{info, warn};

use crate::config::BackendSection;
use crate::params::P2oParams;

/// Collection is enabled unless the section says `collect: false`.
pub fn should_collect(backend_name: &str, section: &BackendSection) -> bool {
    if section.collect == Some(false) {
        info!(backend = backend_name, "{backend_name} collect disabled");
        return false;
    }
    true
}

/// A repository carrying a non-empty `filter-raw` only gets enriched; its raw
/// data is collected elsewhere.
pub fn is_enrichment_only(repo: &str, p2o: &P2oParams) -> bool {
    match p2o.filter_raw.as_deref() {
        Some(filter) if !filter.is_empty() => {
            warn!(repo, filter_raw = filter, "Not collecting filter raw repository: {repo}");
            true
        }
        _ => false,
    }
}
