use serde::{Deserialize, Serialize};

use crate::log_batch::LogBatch;

/// Where a relayed event lands in the audit account.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DestinationStream {
    pub log_group: String,
    pub log_stream: String,
}

/// The log group is named after the source account. Streams that already
/// embed the account ID keep their name, everything else is prefixed with
/// the source log group so streams from different groups cannot collide.
pub fn destination_for(
    batch: &LogBatch,
    account_name: &str,
    account_id: &str,
) -> DestinationStream {
    let log_stream = if batch.log_stream.contains(account_id) {
        batch.log_stream.clone()
    } else {
        format!("{}/{}", batch.log_group, batch.log_stream)
    };

    DestinationStream {
        log_group: account_name.to_string(),
        log_stream,
    }
}
