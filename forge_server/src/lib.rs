//! AppForge build pipeline orchestrator.
//!
//! Multi-tenant backend that assembles build configuration for tenant
//! mobile apps, dispatches Android/iOS build jobs to an external CI
//! runner, and tracks them through idempotent status callbacks. Also
//! serves owner dashboards, super-admin rebuild controls, and a
//! manifest-pull fallback for artifact URLs.

pub mod auth;
pub mod config;
pub mod error;
pub mod metrics;
pub mod migration;
pub mod models;
pub mod routes;
pub mod schema;
pub mod services;
pub mod store;
