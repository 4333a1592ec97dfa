//! Lambda runtime integration for the audit log relay and repository mirror.
//!
//! This crate owns configuration loading, adapter traits for the remote
//! services each function talks to, and the two handlers. The AWS SDK
//! implementations of the adapters live next to the `bin` entry points.

pub mod adapters;
pub mod config;
pub mod error;
pub mod handlers;
pub mod telemetry;
