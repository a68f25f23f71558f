//! Task descriptors handed to the remote scheduler.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::config::SchedulerSettings;
use crate::params::BackendArgs;

/// Natural key of a scheduled task: `<repo>_<backend_name>`.
pub fn task_id(repo: &str, backend_name: &str) -> String {
    format!("{repo}_{backend_name}")
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CachePolicy {
    pub cache: bool,
    pub fetch_from_cache: bool,
}

impl Default for CachePolicy {
    fn default() -> Self {
        Self {
            cache: true,
            fetch_from_cache: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchedulerPolicy {
    /// Seconds between two runs of the task.
    pub delay: u64,
}

/// One scheduled collection job. Built once per submission attempt and never
/// changed afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskDescriptor {
    pub task_id: String,
    pub backend: String,
    pub backend_args: BackendArgs,
    pub cache: CachePolicy,
    pub scheduler: SchedulerPolicy,
}

impl TaskDescriptor {
    /// Assemble the descriptor for `repo` from arthur-style `backend_args`.
    ///
    /// Git tasks get a working copy under `settings.repository_dir`; every task
    /// is tagged with its own id.
    pub fn build(
        repo: &str,
        backend_name: &str,
        mut backend_args: BackendArgs,
        settings: &SchedulerSettings,
    ) -> Self {
        let task_id = task_id(repo, backend_name);
        if backend_name == "git" {
            let gitpath = settings.repository_dir.join(repo);
            backend_args.insert(
                "gitpath".into(),
                Value::String(gitpath.to_string_lossy().into_owned()),
            );
        }
        backend_args.insert("tag".into(), Value::String(task_id.clone()));

        Self {
            task_id,
            backend: backend_name.to_string(),
            backend_args,
            cache: CachePolicy::default(),
            scheduler: SchedulerPolicy {
                delay: settings.task_delay,
            },
        }
    }
}

/// Body of `POST /add`.
#[derive(Debug, Serialize)]
pub struct TaskBatch<'a> {
    pub tasks: Vec<&'a TaskDescriptor>,
}

impl<'a> TaskBatch<'a> {
    pub fn single(descriptor: &'a TaskDescriptor) -> Self {
        Self {
            tasks: vec![descriptor],
        }
    }
}
