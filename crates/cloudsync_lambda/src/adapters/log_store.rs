use cloudsync_core::destination::DestinationStream;
use cloudsync_core::log_batch::LogEvent;

use crate::error::{AdapterError, CreateError};

/// A stream returned by a prefix query against the destination log group.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamDescription {
    pub name: String,
    pub upload_sequence_token: Option<String>,
}

pub trait LogStore {
    fn create_log_group(&self, log_group: &str) -> Result<(), CreateError>;

    fn create_log_stream(&self, log_group: &str, log_stream: &str) -> Result<(), CreateError>;

    fn describe_log_streams(
        &self,
        log_group: &str,
        log_stream_prefix: &str,
    ) -> Result<Vec<StreamDescription>, AdapterError>;

    fn put_log_event(
        &self,
        destination: &DestinationStream,
        event: &LogEvent,
        sequence_token: Option<&str>,
    ) -> Result<(), AdapterError>;
}

/// Prefix queries can return sibling streams, so the exact name wins. The
/// first returned stream is used when no name matches.
pub fn select_sequence_token(streams: &[StreamDescription], log_stream: &str) -> Option<String> {
    streams
        .iter()
        .find(|stream| stream.name == log_stream)
        .or_else(|| streams.first())
        .and_then(|stream| stream.upload_sequence_token.clone())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stream(name: &str, token: Option<&str>) -> StreamDescription {
        StreamDescription {
            name: name.to_string(),
            upload_sequence_token: token.map(str::to_string),
        }
    }

    #[test]
    fn exact_name_beats_prefix_sibling() {
        let streams = vec![stream("app/1-old", Some("111")), stream("app/1", Some("222"))];
        assert_eq!(
            select_sequence_token(&streams, "app/1"),
            Some("222".to_string())
        );
    }

    #[test]
    fn fresh_stream_has_no_token() {
        let streams = vec![stream("app/1", None)];
        assert_eq!(select_sequence_token(&streams, "app/1"), None);
    }

    #[test]
    fn no_streams_means_no_token() {
        assert_eq!(select_sequence_token(&[], "app/1"), None);
    }
}
