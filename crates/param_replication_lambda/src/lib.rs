//! AWS-oriented adapters and handler for cross-region parameter replication.
//!
//! This crate owns runtime integration details (the Lambda handler, the
//! Systems Manager store adapter, environment configuration and log setup).
//! Replication decisions live in `param_replication_core`.

pub mod adapters;
pub mod config;
pub mod handlers;
pub mod logging;
