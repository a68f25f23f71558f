//! # contract: the seams between orchestration and the outside world
//!
//! Two traits describe everything the orchestration layer consumes:
//!
//! - [`RawFeeder`]: the local raw-collection entrypoint, called once per
//!   repository by [`SyncCollector`](crate::collect::SyncCollector).
//! - [`TaskRegistry`]: the remote scheduler's task set, listed and extended by
//!   [`RemoteScheduler`](crate::schedule::RemoteScheduler).
//!
//! Both are annotated for `mockall` so tests can assert exactly which external
//! calls happen. [`InMemoryRegistry`] is a deterministic registry without I/O.
//!
//! Production implementations live in [`crate::feeder`] (process based) and in
//! the `task-collect` crate (HTTP client).

use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::Mutex;

use mockall::automock;

use crate::descriptor::TaskDescriptor;
use crate::error::RegistryError;
use crate::params::BackendArgs;

/// Error type for the local collection entrypoint.
pub type FeedError = Box<dyn std::error::Error + Send + Sync>;

/// Everything the local collection entrypoint needs for one repository.
#[derive(Debug, Clone, PartialEq)]
pub struct FeedRequest {
    /// Storage endpoint the raw items are written to.
    pub endpoint: String,
    /// Drop the raw index before collecting.
    pub clean: bool,
    pub fetch_cache: bool,
    pub backend_name: String,
    pub backend_args: BackendArgs,
    pub raw_index: String,
    pub enriched_index: String,
    /// Repository URL the items are tagged with.
    pub url: String,
}

/// Local raw-collection entrypoint. Blocks (asynchronously) until the
/// repository has been collected.
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
#[async_trait]
pub trait RawFeeder: Send + Sync {
    async fn feed_backend(&self, req: FeedRequest) -> Result<(), FeedError>;
}

/// The task set of a remote scheduler.
///
/// There is no atomic create-if-absent: callers list, compare and then add.
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
#[async_trait]
pub trait TaskRegistry: Send + Sync {
    /// Ids of every task currently registered.
    async fn list(&self) -> Result<HashSet<String>, RegistryError>;

    /// Register a new task.
    async fn add(&self, descriptor: &TaskDescriptor) -> Result<(), RegistryError>;
}

/// Registry kept in memory. Adding an id that is already present is rejected
/// the way a scheduler would reject it.
#[derive(Debug, Default)]
pub struct InMemoryRegistry {
    tasks: Mutex<Vec<TaskDescriptor>>,
}

impl InMemoryRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_tasks(tasks: Vec<TaskDescriptor>) -> Self {
        Self {
            tasks: Mutex::new(tasks),
        }
    }

    /// Snapshot of the registered descriptors, in insertion order.
    pub fn tasks(&self) -> Vec<TaskDescriptor> {
        self.tasks
            .lock()
            .map(|tasks| tasks.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl TaskRegistry for InMemoryRegistry {
    async fn list(&self) -> Result<HashSet<String>, RegistryError> {
        let tasks = self.tasks.lock().map_err(poisoned)?;
        Ok(tasks.iter().map(|task| task.task_id.clone()).collect())
    }

    async fn add(&self, descriptor: &TaskDescriptor) -> Result<(), RegistryError> {
        let mut tasks = self.tasks.lock().map_err(poisoned)?;
        if tasks.iter().any(|task| task.task_id == descriptor.task_id) {
            return Err(RegistryError::Status {
                url: "memory:/add".to_string(),
                status: 409,
                body: format!("task '{}' already exists", descriptor.task_id),
            });
        }
        tasks.push(descriptor.clone());
        Ok(())
    }
}

fn poisoned<T>(_: std::sync::PoisonError<T>) -> RegistryError {
    RegistryError::Connection {
        url: "memory:".to_string(),
        message: "registry lock poisoned".to_string(),
    }
}
