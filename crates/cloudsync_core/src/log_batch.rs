//! CloudWatch Logs subscription payloads.
//!
//! A subscription delivers `{"awslogs": {"data": "<base64>"}}` where the data
//! is a gzip-compressed JSON document describing one batch of log events.

use std::io::Read;

use base64::Engine as _;
use flate2::read::GzDecoder;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("log trigger must carry a string at awslogs.data")]
    MissingData,
    #[error("log payload is not valid base64: {0}")]
    Base64(#[from] base64::DecodeError),
    #[error("log payload could not be decompressed: {0}")]
    Decompress(#[source] std::io::Error),
    #[error("log payload is not a valid log batch: {0}")]
    Json(#[from] serde_json::Error),
    #[error("log batch from {log_group}/{log_stream} contains no events")]
    EmptyBatch {
        log_group: String,
        log_stream: String,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct LogBatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner: Option<String>,
    pub log_group: String,
    pub log_stream: String,
    #[serde(default)]
    pub subscription_filters: Vec<String>,
    pub log_events: Vec<LogEvent>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LogEvent {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub timestamp: i64,
    pub message: String,
}

impl LogBatch {
    /// The single event that gets forwarded. Later events in the batch are
    /// never relayed.
    pub fn first_event(&self) -> Result<&LogEvent, DecodeError> {
        self.log_events.first().ok_or_else(|| DecodeError::EmptyBatch {
            log_group: self.log_group.clone(),
            log_stream: self.log_stream.clone(),
        })
    }
}

pub fn batch_from_trigger(event: &Value) -> Result<LogBatch, DecodeError> {
    let data = event
        .pointer("/awslogs/data")
        .and_then(Value::as_str)
        .ok_or(DecodeError::MissingData)?;
    decode_log_batch(data)
}

pub fn decode_log_batch(data: &str) -> Result<LogBatch, DecodeError> {
    let compressed = base64::engine::general_purpose::STANDARD.decode(data.trim())?;

    let mut decoder = GzDecoder::new(compressed.as_slice());
    let mut uncompressed = Vec::new();
    decoder
        .read_to_end(&mut uncompressed)
        .map_err(DecodeError::Decompress)?;

    Ok(serde_json::from_slice(&uncompressed)?)
}
