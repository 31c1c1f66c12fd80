//! Orchestrator data models — app links, build jobs, catalog rows.

pub mod app_link;
pub mod build_job;
pub mod catalog;
pub mod snapshot;
