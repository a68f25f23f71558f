#![doc = "Task registry client for the remote scheduler: bridges the core `TaskRegistry` trait to the scheduler's HTTP API."]
//
//! # Scheduler Integration (CLI <-> Core)
//!
//! This module wires the [`TaskRegistry`] trait of
//! `task_collect_core::contract` to a running arthur scheduler over HTTP.
//!
//! - `GET  {url}/tasks` lists the registered tasks (`{"tasks": [{"task_id": ...}]}`)
//! - `POST {url}/add` registers new tasks (`{"tasks": [descriptor]}`)
//!
//! ## Client Usage
//!
//! - Construct [`ArthurClient`] from the `scheduler` section of the configuration.
//! - Connect and request timeouts come from the same section.
//! - Transport failures become [`RegistryError::Connection`], unexpected status
//!   codes [`RegistryError::Status`], unreadable bodies [`RegistryError::Decode`].

use async_trait::async_trait;
use serde::Deserialize;
use std::collections::HashSet;
use std::time::Duration;

use task_collect_core::config::SchedulerSettings;
use task_collect_core::contract::TaskRegistry;
use task_collect_core::descriptor::{TaskBatch, TaskDescriptor};
use task_collect_core::error::RegistryError;

/// Response of `GET /tasks`. Fields other than the id are ignored.
#[derive(Debug, Deserialize)]
struct TaskListing {
    #[serde(default)]
    tasks: Vec<ListedTask>,
}

#[derive(Debug, Deserialize)]
struct ListedTask {
    task_id: String,
}

pub struct ArthurClient {
    client: reqwest::Client,
    base_url: String,
}

impl ArthurClient {
    pub fn new(settings: &SchedulerSettings) -> Result<Self, RegistryError> {
        let base_url = settings.url.trim_end_matches('/').to_string();
        let client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(settings.connect_timeout_secs))
            .timeout(Duration::from_secs(settings.request_timeout_secs))
            .build()
            .map_err(|e| {
                tracing::error!(error = ?e, "Failed to build scheduler HTTP client");
                RegistryError::Connection {
                    url: base_url.clone(),
                    message: e.to_string(),
                }
            })?;
        tracing::info!(scheduler_url = %base_url, "Initialized scheduler client");
        Ok(Self { client, base_url })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }
}

fn transport_error(url: &str, e: reqwest::Error) -> RegistryError {
    if e.is_decode() {
        RegistryError::Decode {
            url: url.to_string(),
            message: e.to_string(),
        }
    } else {
        RegistryError::Connection {
            url: url.to_string(),
            message: e.to_string(),
        }
    }
}

async fn status_error(url: &str, resp: reqwest::Response) -> RegistryError {
    let status = resp.status().as_u16();
    let body = resp
        .text()
        .await
        .unwrap_or_else(|_| String::from("<Failed to decode response body>"));
    RegistryError::Status {
        url: url.to_string(),
        status,
        body,
    }
}

#[async_trait]
impl TaskRegistry for ArthurClient {
    async fn list(&self) -> Result<HashSet<String>, RegistryError> {
        let url = self.endpoint("tasks");
        tracing::debug!(url = %url, "Listing scheduler tasks");

        let resp = self.client.get(&url).send().await.map_err(|e| {
            tracing::error!(error = ?e, url = %url, "Failed to reach scheduler");
            transport_error(&url, e)
        })?;
        if !resp.status().is_success() {
            let err = status_error(&url, resp).await;
            tracing::error!(error = %err, "Scheduler refused task listing");
            return Err(err);
        }

        let listing: TaskListing = resp.json().await.map_err(|e| {
            tracing::error!(error = ?e, url = %url, "Failed to parse scheduler task listing");
            RegistryError::Decode {
                url: url.clone(),
                message: e.to_string(),
            }
        })?;
        tracing::info!(count = listing.tasks.len(), "Fetched scheduler tasks");
        Ok(listing.tasks.into_iter().map(|t| t.task_id).collect())
    }

    async fn add(&self, descriptor: &TaskDescriptor) -> Result<(), RegistryError> {
        let url = self.endpoint("add");
        tracing::info!(url = %url, task_id = %descriptor.task_id, "Adding task to scheduler");

        let resp = self
            .client
            .post(&url)
            .json(&TaskBatch::single(descriptor))
            .send()
            .await
            .map_err(|e| {
                tracing::error!(error = ?e, url = %url, "Failed to reach scheduler");
                transport_error(&url, e)
            })?;
        if !resp.status().is_success() {
            let err = status_error(&url, resp).await;
            tracing::error!(error = %err, task_id = %descriptor.task_id, "Scheduler rejected task");
            return Err(err);
        }
        tracing::info!(task_id = %descriptor.task_id, "Successfully added task");
        Ok(())
    }
}
