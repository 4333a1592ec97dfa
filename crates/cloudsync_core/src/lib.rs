//! Shared domain primitives for the audit log relay and repository mirror.
//!
//! This crate owns trigger payload contracts, naming rules and credential
//! splicing. It intentionally excludes AWS SDK and Lambda runtime concerns,
//! which live in `cloudsync_lambda`.

pub mod destination;
pub mod invocation;
pub mod log_batch;
pub mod log_level;
pub mod outcome;
pub mod push;
pub mod remote_url;
