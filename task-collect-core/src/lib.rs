#![doc = "task-collect-core: orchestration of raw data collection tasks."]

//! Decides, per backend and per repository, whether raw data collection runs,
//! composes the collector arguments and hands the work either to a local
//! collection entrypoint or to a remote task scheduler, submitting each task at
//! most once.
//!
//! # Usage
//! Build a [`config::CollectConfig`], pick the executors and run a
//! [`orchestrate::TaskOrchestrator`]. The traits in [`contract`] are the only
//! seams to the outside world.

pub mod collect;
pub mod config;
pub mod contract;
pub mod descriptor;
pub mod error;
pub mod feeder;
pub mod gate;
pub mod orchestrate;
pub mod params;
pub mod report;
pub mod schedule;
