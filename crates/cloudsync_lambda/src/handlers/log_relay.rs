use cloudsync_core::destination::{destination_for, DestinationStream};
use cloudsync_core::invocation::{resolve_account_name, InvocationContext};
use cloudsync_core::log_batch::batch_from_trigger;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info};

use crate::adapters::identity::{AccountDirectory, RoleAssumer, TemporaryCredentials};
use crate::adapters::log_store::{select_sequence_token, LogStore};
use crate::config::LogRelayConfig;
use crate::error::{CreateError, RelayError};

pub const AUDIT_ROLE_SESSION_NAME: &str = "audit_acct_role";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RelaySummary {
    pub log_group: String,
    pub log_stream: String,
    pub event_timestamp: i64,
    pub sequence_token_supplied: bool,
}

/// Forwards the first event of a CloudWatch Logs subscription batch to the
/// audit account. `connect` builds the destination store from the assumed
/// role's credentials.
pub fn handle_log_batch<S, F>(
    event: &Value,
    context: &InvocationContext,
    lookup: impl Fn(&str) -> Option<String>,
    directory: &impl AccountDirectory,
    assumer: &impl RoleAssumer,
    connect: F,
) -> Result<RelaySummary, RelayError>
where
    S: LogStore,
    F: FnOnce(&TemporaryCredentials) -> S,
{
    let config = LogRelayConfig::load(lookup)?;
    let account_id = context.account_id()?;

    let aliases = directory
        .account_aliases()
        .map_err(RelayError::AccountName)?;
    let account_name = resolve_account_name(&aliases, account_id);

    let credentials = assumer
        .assume_role(&config.audit_role_arn, AUDIT_ROLE_SESSION_NAME)
        .map_err(RelayError::AssumeRole)?;
    info!(
        account_id,
        account_name = %account_name,
        role_arn = %config.audit_role_arn,
        expiration = ?credentials.expiration,
        "assumed audit account role"
    );
    let store = connect(&credentials);

    let batch = batch_from_trigger(event)?;
    let log_event = batch.first_event()?;
    if batch.log_events.len() > 1 {
        debug!(
            skipped = batch.log_events.len() - 1,
            "only the first event of the batch is relayed"
        );
    }

    let destination = destination_for(&batch, &account_name, account_id);
    ensure_destination(&store, &destination)?;

    let streams = store
        .describe_log_streams(&destination.log_group, &destination.log_stream)
        .map_err(RelayError::SequenceToken)?;
    let sequence_token = select_sequence_token(&streams, &destination.log_stream);

    store
        .put_log_event(&destination, log_event, sequence_token.as_deref())
        .map_err(RelayError::PutEvent)?;

    info!(
        source_log_group = %batch.log_group,
        source_log_stream = %batch.log_stream,
        log_group = %destination.log_group,
        log_stream = %destination.log_stream,
        timestamp = log_event.timestamp,
        "relayed log event"
    );

    Ok(RelaySummary {
        log_group: destination.log_group,
        log_stream: destination.log_stream,
        event_timestamp: log_event.timestamp,
        sequence_token_supplied: sequence_token.is_some(),
    })
}

fn ensure_destination(
    store: &impl LogStore,
    destination: &DestinationStream,
) -> Result<(), RelayError> {
    match store.create_log_group(&destination.log_group) {
        Ok(()) => info!(log_group = %destination.log_group, "created destination log group"),
        Err(CreateError::AlreadyExists) => {
            debug!(log_group = %destination.log_group, "destination log group already exists")
        }
        Err(CreateError::Failed(source)) => {
            return Err(RelayError::Destination {
                resource: "log group",
                name: destination.log_group.clone(),
                source,
            })
        }
    }

    match store.create_log_stream(&destination.log_group, &destination.log_stream) {
        Ok(()) => info!(log_stream = %destination.log_stream, "created destination log stream"),
        Err(CreateError::AlreadyExists) => {
            debug!(log_stream = %destination.log_stream, "destination log stream already exists")
        }
        Err(CreateError::Failed(source)) => {
            return Err(RelayError::Destination {
                resource: "log stream",
                name: destination.log_stream.clone(),
                source,
            })
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use std::io::Write;
    use std::sync::{Arc, Mutex};

    use base64::Engine as _;
    use cloudsync_core::log_batch::{DecodeError, LogEvent};
    use flate2::write::GzEncoder;
    use flate2::Compression;
    use serde_json::json;

    use super::*;
    use crate::adapters::log_store::StreamDescription;
    use crate::error::{AdapterError, ConfigError};

    const FUNCTION_ARN: &str = "arn:aws:lambda:eu-west-1:123456789012:function:cw2cw";
    const ROLE_ARN: &str = "arn:aws:iam::999999999999:role/audit-writer";

    #[derive(Debug, Clone, PartialEq, Eq)]
    enum Call {
        ListAliases,
        AssumeRole { role_arn: String, session: String },
        CreateGroup(String),
        CreateStream(String, String),
        Describe(String, String),
        Put {
            log_group: String,
            log_stream: String,
            timestamp: i64,
            message: String,
            token: Option<String>,
        },
    }

    type CallLog = Arc<Mutex<Vec<Call>>>;

    fn record(calls: &CallLog, call: Call) {
        calls.lock().expect("poisoned mutex").push(call);
    }

    struct FakeDirectory {
        calls: CallLog,
        aliases: Vec<String>,
    }

    impl AccountDirectory for FakeDirectory {
        fn account_aliases(&self) -> Result<Vec<String>, AdapterError> {
            record(&self.calls, Call::ListAliases);
            Ok(self.aliases.clone())
        }
    }

    struct FakeAssumer {
        calls: CallLog,
    }

    impl RoleAssumer for FakeAssumer {
        fn assume_role(
            &self,
            role_arn: &str,
            session_name: &str,
        ) -> Result<TemporaryCredentials, AdapterError> {
            record(
                &self.calls,
                Call::AssumeRole {
                    role_arn: role_arn.to_string(),
                    session: session_name.to_string(),
                },
            );
            Ok(TemporaryCredentials {
                access_key_id: "ASIAEXAMPLE".to_string(),
                secret_access_key: "secret".to_string(),
                session_token: "token".to_string(),
                expiration: None,
            })
        }
    }

    #[derive(Clone)]
    struct FakeLogStore {
        calls: CallLog,
        group_result: Result<(), CreateError>,
        stream_result: Result<(), CreateError>,
        streams: Vec<StreamDescription>,
    }

    impl FakeLogStore {
        fn new(calls: &CallLog) -> Self {
            Self {
                calls: calls.clone(),
                group_result: Ok(()),
                stream_result: Ok(()),
                streams: Vec::new(),
            }
        }
    }

    impl LogStore for FakeLogStore {
        fn create_log_group(&self, log_group: &str) -> Result<(), CreateError> {
            record(&self.calls, Call::CreateGroup(log_group.to_string()));
            self.group_result.clone()
        }

        fn create_log_stream(&self, log_group: &str, log_stream: &str) -> Result<(), CreateError> {
            record(
                &self.calls,
                Call::CreateStream(log_group.to_string(), log_stream.to_string()),
            );
            self.stream_result.clone()
        }

        fn describe_log_streams(
            &self,
            log_group: &str,
            log_stream_prefix: &str,
        ) -> Result<Vec<StreamDescription>, AdapterError> {
            record(
                &self.calls,
                Call::Describe(log_group.to_string(), log_stream_prefix.to_string()),
            );
            Ok(self.streams.clone())
        }

        fn put_log_event(
            &self,
            destination: &DestinationStream,
            event: &LogEvent,
            sequence_token: Option<&str>,
        ) -> Result<(), AdapterError> {
            record(
                &self.calls,
                Call::Put {
                    log_group: destination.log_group.clone(),
                    log_stream: destination.log_stream.clone(),
                    timestamp: event.timestamp,
                    message: event.message.clone(),
                    token: sequence_token.map(str::to_string),
                },
            );
            Ok(())
        }
    }

    fn trigger(log_stream: &str, events: &[(i64, &str)]) -> Value {
        let document = json!({
            "messageType": "DATA_MESSAGE",
            "owner": "123456789012",
            "logGroup": "/aws/lambda/payments",
            "logStream": log_stream,
            "subscriptionFilters": ["audit"],
            "logEvents": events
                .iter()
                .map(|(timestamp, message)| json!({"timestamp": timestamp, "message": message}))
                .collect::<Vec<_>>(),
        });
        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder
            .write_all(document.to_string().as_bytes())
            .expect("gzip write should succeed");
        let data = base64::engine::general_purpose::STANDARD
            .encode(encoder.finish().expect("gzip finish should succeed"));
        json!({"awslogs": {"data": data}})
    }

    fn configured(name: &str) -> Option<String> {
        (name == "AUDIT_ACCT_ROLE_ARN").then(|| ROLE_ARN.to_string())
    }

    fn context() -> InvocationContext {
        InvocationContext::new("req-1", FUNCTION_ARN)
    }

    fn puts(calls: &CallLog) -> Vec<Call> {
        calls
            .lock()
            .expect("poisoned mutex")
            .iter()
            .filter(|call| matches!(call, Call::Put { .. }))
            .cloned()
            .collect()
    }

    #[test]
    fn relays_only_the_first_event_of_the_batch() {
        let calls = CallLog::default();
        let directory = FakeDirectory {
            calls: calls.clone(),
            aliases: vec!["prod-payments".to_string()],
        };
        let assumer = FakeAssumer {
            calls: calls.clone(),
        };
        let store = FakeLogStore::new(&calls);

        let summary = handle_log_batch(
            &trigger(
                "2026/10/19/[$LATEST]abc",
                &[(1_000, "first"), (2_000, "second"), (3_000, "third")],
            ),
            &context(),
            configured,
            &directory,
            &assumer,
            |_| store.clone(),
        )
        .expect("relay should succeed");

        assert_eq!(
            puts(&calls),
            vec![Call::Put {
                log_group: "prod-payments".to_string(),
                log_stream: "/aws/lambda/payments/2026/10/19/[$LATEST]abc".to_string(),
                timestamp: 1_000,
                message: "first".to_string(),
                token: None,
            }]
        );
        assert_eq!(summary.event_timestamp, 1_000);
    }

    #[test]
    fn calls_services_in_order_with_audit_session() {
        let calls = CallLog::default();
        let directory = FakeDirectory {
            calls: calls.clone(),
            aliases: Vec::new(),
        };
        let assumer = FakeAssumer {
            calls: calls.clone(),
        };
        let store = FakeLogStore::new(&calls);

        handle_log_batch(
            &trigger("123456789012_CloudTrail_eu-west-1", &[(5, "m")]),
            &context(),
            configured,
            &directory,
            &assumer,
            |_| store.clone(),
        )
        .expect("relay should succeed");

        let recorded = calls.lock().expect("poisoned mutex").clone();
        assert_eq!(
            recorded[..5],
            [
                Call::ListAliases,
                Call::AssumeRole {
                    role_arn: ROLE_ARN.to_string(),
                    session: AUDIT_ROLE_SESSION_NAME.to_string(),
                },
                Call::CreateGroup("123456789012".to_string()),
                Call::CreateStream(
                    "123456789012".to_string(),
                    "123456789012_CloudTrail_eu-west-1".to_string()
                ),
                Call::Describe(
                    "123456789012".to_string(),
                    "123456789012_CloudTrail_eu-west-1".to_string()
                ),
            ]
        );
    }

    #[test]
    fn supplies_existing_sequence_token() {
        let calls = CallLog::default();
        let directory = FakeDirectory {
            calls: calls.clone(),
            aliases: Vec::new(),
        };
        let assumer = FakeAssumer {
            calls: calls.clone(),
        };
        let mut store = FakeLogStore::new(&calls);
        store.group_result = Err(CreateError::AlreadyExists);
        store.stream_result = Err(CreateError::AlreadyExists);
        store.streams = vec![StreamDescription {
            name: "/aws/lambda/payments/s1".to_string(),
            upload_sequence_token: Some("4962".to_string()),
        }];

        let summary = handle_log_batch(
            &trigger("s1", &[(7, "hello")]),
            &context(),
            configured,
            &directory,
            &assumer,
            |_| store.clone(),
        )
        .expect("existing destination should be reused");

        assert!(summary.sequence_token_supplied);
        assert!(matches!(
            puts(&calls).as_slice(),
            [Call::Put { token: Some(token), .. }] if token == "4962"
        ));
    }

    #[test]
    fn other_creation_failures_abort_before_appending() {
        let calls = CallLog::default();
        let directory = FakeDirectory {
            calls: calls.clone(),
            aliases: Vec::new(),
        };
        let assumer = FakeAssumer {
            calls: calls.clone(),
        };
        let mut store = FakeLogStore::new(&calls);
        store.group_result = Err(CreateError::Failed(AdapterError::new(
            "logs:CreateLogGroup",
            "AccessDeniedException",
        )));

        let error = handle_log_batch(
            &trigger("s1", &[(7, "hello")]),
            &context(),
            configured,
            &directory,
            &assumer,
            |_| store.clone(),
        )
        .expect_err("authorization failure must surface");

        assert!(matches!(
            error,
            RelayError::Destination {
                resource: "log group",
                ..
            }
        ));
        assert!(puts(&calls).is_empty());
    }

    #[test]
    fn stream_creation_failure_aborts_before_appending() {
        let calls = CallLog::default();
        let directory = FakeDirectory {
            calls: calls.clone(),
            aliases: Vec::new(),
        };
        let assumer = FakeAssumer {
            calls: calls.clone(),
        };
        let mut store = FakeLogStore::new(&calls);
        store.group_result = Err(CreateError::AlreadyExists);
        store.stream_result = Err(CreateError::Failed(AdapterError::new(
            "logs:CreateLogStream",
            "LimitExceededException",
        )));

        let error = handle_log_batch(
            &trigger("s1", &[(7, "hello")]),
            &context(),
            configured,
            &directory,
            &assumer,
            |_| store.clone(),
        )
        .expect_err("stream creation failure must surface");

        assert!(matches!(
            error,
            RelayError::Destination {
                resource: "log stream",
                ..
            }
        ));
        assert!(puts(&calls).is_empty());
    }

    #[test]
    fn missing_role_arn_aborts_before_remote_calls() {
        let calls = CallLog::default();
        let directory = FakeDirectory {
            calls: calls.clone(),
            aliases: Vec::new(),
        };
        let assumer = FakeAssumer {
            calls: calls.clone(),
        };
        let store = FakeLogStore::new(&calls);

        let error = handle_log_batch(
            &trigger("s1", &[(7, "hello")]),
            &context(),
            |_| None,
            &directory,
            &assumer,
            |_| store.clone(),
        )
        .expect_err("missing configuration is fatal");

        assert!(matches!(
            error,
            RelayError::Config(ConfigError::Missing {
                name: "AUDIT_ACCT_ROLE_ARN"
            })
        ));
        assert!(calls.lock().expect("poisoned mutex").is_empty());
    }

    #[test]
    fn malformed_payload_is_fatal() {
        let calls = CallLog::default();
        let directory = FakeDirectory {
            calls: calls.clone(),
            aliases: Vec::new(),
        };
        let assumer = FakeAssumer {
            calls: calls.clone(),
        };
        let store = FakeLogStore::new(&calls);

        let error = handle_log_batch(
            &json!({"awslogs": {"data": "!!!"}}),
            &context(),
            configured,
            &directory,
            &assumer,
            |_| store.clone(),
        )
        .expect_err("payload should fail");

        assert!(matches!(error, RelayError::Payload(DecodeError::Base64(_))));
        assert!(puts(&calls).is_empty());
    }
}
