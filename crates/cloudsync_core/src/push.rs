//! Push notifications published by the external repository's webhook to SNS.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum NotificationError {
    #[error("Error parsing SNS message: {0}")]
    Envelope(String),
    #[error("Unable to get source repository URL: {0}")]
    Source(String),
}

/// Repository details carried by the webhook body.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PushNotification {
    pub repository: SourceRepository,
    #[serde(rename = "ref")]
    pub git_ref: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SourceRepository {
    pub git_http_url: String,
    pub name: String,
}

/// What gets mirrored: one branch of one repository.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MirrorSource {
    pub url: String,
    pub name: String,
    pub branch: String,
}

/// Pulls `Records[0].Sns.Message` out of an SNS trigger and parses it as JSON.
pub fn message_from_sns(event: &Value) -> Result<Value, NotificationError> {
    let message = event
        .pointer("/Records/0/Sns/Message")
        .and_then(Value::as_str)
        .ok_or_else(|| {
            NotificationError::Envelope("trigger has no Records[0].Sns.Message string".to_string())
        })?;

    serde_json::from_str(message).map_err(|error| NotificationError::Envelope(error.to_string()))
}

pub fn source_from_message(message: Value) -> Result<MirrorSource, NotificationError> {
    let notification: PushNotification = serde_json::from_value(message)
        .map_err(|error| NotificationError::Source(error.to_string()))?;

    let branch = branch_from_ref(&notification.git_ref).ok_or_else(|| {
        NotificationError::Source(format!(
            "ref '{}' does not name a branch",
            notification.git_ref
        ))
    })?;

    if !is_plain_directory_name(&notification.repository.name) {
        return Err(NotificationError::Source(format!(
            "repository name '{}' is not a single path segment",
            notification.repository.name
        )));
    }

    Ok(MirrorSource {
        url: notification.repository.git_http_url,
        name: notification.repository.name,
        branch: branch.to_string(),
    })
}

pub fn source_from_sns(event: &Value) -> Result<MirrorSource, NotificationError> {
    source_from_message(message_from_sns(event)?)
}

/// The repository name becomes a directory inside the checkout, so it must
/// not be able to name anything outside it.
fn is_plain_directory_name(name: &str) -> bool {
    !name.is_empty()
        && name != "."
        && name != ".."
        && !name.contains(['/', '\\'])
        && !std::path::Path::new(name).is_absolute()
}

/// Everything after the second `/`: `refs/heads/feature/x` is `feature/x`.
pub fn branch_from_ref(git_ref: &str) -> Option<&str> {
    git_ref
        .splitn(3, '/')
        .nth(2)
        .filter(|branch| !branch.is_empty())
}
