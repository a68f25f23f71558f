//! Error taxonomy for the collection layer.
//!
//! [`CollectError`] is what the collectors, the scheduler and the orchestrator
//! return. [`RegistryError`] is the transport-level error of a
//! [`TaskRegistry`](crate::contract::TaskRegistry) implementation; the remote
//! scheduler maps it into a [`CollectError`] depending on which call failed.
//!
//! Only [`CollectError::Connection`] is fatal to a whole run. Every other
//! variant aborts the backend it was raised for.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CollectError {
    /// Missing or malformed backend section, missing url, unparsable repository.
    #[error("configuration error for backend '{backend}': {message}")]
    Configuration { backend: String, message: String },

    /// The remote scheduler could not be reached.
    #[error("can not connect to task scheduler at {url}: {message}")]
    Connection { url: String, message: String },

    /// The remote scheduler answered the task listing with an unusable response.
    #[error("task listing failed for backend '{backend}': {message}")]
    TaskListing { backend: String, message: String },

    /// The remote scheduler rejected a new task.
    #[error("task '{task_id}' rejected by scheduler (status {status}): {message}")]
    Submission {
        task_id: String,
        status: u16,
        message: String,
    },

    /// The local collection entrypoint failed for one repository.
    #[error("raw collection failed for '{repo}' (backend '{backend}'): {message}")]
    Collection {
        backend: String,
        repo: String,
        message: String,
    },
}

impl CollectError {
    pub fn configuration(backend: &str, message: impl Into<String>) -> Self {
        CollectError::Configuration {
            backend: backend.to_string(),
            message: message.into(),
        }
    }

    /// True when the whole run has to stop, not just the current backend.
    pub fn is_fatal(&self) -> bool {
        matches!(self, CollectError::Connection { .. })
    }
}

/// Transport error raised by a task registry.
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("connection to {url} failed: {message}")]
    Connection { url: String, message: String },

    #[error("{url} answered with status {status}: {body}")]
    Status { url: String, status: u16, body: String },

    #[error("failed to decode response from {url}: {message}")]
    Decode { url: String, message: String },
}
