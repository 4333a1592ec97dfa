use std::path::PathBuf;

use cloudsync_core::invocation::ArnError;
use cloudsync_core::log_batch::DecodeError;
use cloudsync_core::push::NotificationError;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("{name} must be configured")]
    Missing { name: &'static str },
}

/// A remote call failed for a reason the caller does not recover from.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{operation} failed: {message}")]
pub struct AdapterError {
    pub operation: &'static str,
    pub message: String,
}

impl AdapterError {
    pub fn new(operation: &'static str, message: impl Into<String>) -> Self {
        Self {
            operation,
            message: message.into(),
        }
    }
}

/// Outcome of a create-if-absent call. Only `AlreadyExists` is recoverable.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CreateError {
    #[error("resource already exists")]
    AlreadyExists,
    #[error(transparent)]
    Failed(#[from] AdapterError),
}

#[derive(Debug, Error)]
pub enum GitError {
    #[error("failed to spawn git {command}: {source}")]
    Spawn {
        command: &'static str,
        #[source]
        source: std::io::Error,
    },
    #[error("git {command} failed (status {status}): {stderr}")]
    Failed {
        command: &'static str,
        status: String,
        stderr: String,
    },
}

#[derive(Debug, Error)]
pub enum RelayError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Context(#[from] ArnError),
    #[error(transparent)]
    Payload(#[from] DecodeError),
    #[error("unable to resolve account name: {0}")]
    AccountName(#[source] AdapterError),
    #[error("unable to assume audit account role: {0}")]
    AssumeRole(#[source] AdapterError),
    #[error("unable to create destination {resource} '{name}': {source}")]
    Destination {
        resource: &'static str,
        name: String,
        #[source]
        source: AdapterError,
    },
    #[error("unable to read destination sequence token: {0}")]
    SequenceToken(#[source] AdapterError),
    #[error("unable to append log event: {0}")]
    PutEvent(#[source] AdapterError),
}

#[derive(Debug, Error)]
pub enum MirrorError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Context(#[from] ArnError),
    #[error(transparent)]
    Notification(#[from] NotificationError),
    #[error("Unable to get CodeCommit {credential} from SSM parameter {parameter}: {source}")]
    Credentials {
        credential: &'static str,
        parameter: &'static str,
        #[source]
        source: AdapterError,
    },
    #[error("unable to create checkout directory under {root}: {source}")]
    Checkout {
        root: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error(transparent)]
    Git(#[from] GitError),
}
