use std::time::SystemTime;

use aws_sdk_cloudwatchlogs::types::InputLogEvent;
use cloudsync_core::destination::DestinationStream;
use cloudsync_core::invocation::InvocationContext;
use cloudsync_core::log_batch::LogEvent;
use cloudsync_lambda::adapters::identity::{AccountDirectory, RoleAssumer, TemporaryCredentials};
use cloudsync_lambda::adapters::log_store::{LogStore, StreamDescription};
use cloudsync_lambda::config::env_lookup;
use cloudsync_lambda::error::{AdapterError, CreateError};
use cloudsync_lambda::handlers::log_relay::{handle_log_batch, RelaySummary};
use cloudsync_lambda::telemetry;
use lambda_runtime::{service_fn, Error, LambdaEvent};
use serde_json::Value;

struct IamAccountDirectory {
    iam_client: aws_sdk_iam::Client,
}

impl AccountDirectory for IamAccountDirectory {
    fn account_aliases(&self) -> Result<Vec<String>, AdapterError> {
        let client = self.iam_client.clone();

        tokio::task::block_in_place(|| {
            tokio::runtime::Handle::current().block_on(async move {
                client
                    .list_account_aliases()
                    .send()
                    .await
                    .map(|output| output.account_aliases().to_vec())
                    .map_err(|error| {
                        AdapterError::new(
                            "iam:ListAccountAliases",
                            aws_sdk_iam::error::DisplayErrorContext(&error).to_string(),
                        )
                    })
            })
        })
    }
}

struct StsRoleAssumer {
    sts_client: aws_sdk_sts::Client,
}

impl RoleAssumer for StsRoleAssumer {
    fn assume_role(
        &self,
        role_arn: &str,
        session_name: &str,
    ) -> Result<TemporaryCredentials, AdapterError> {
        let client = self.sts_client.clone();
        let role_arn = role_arn.to_string();
        let session_name = session_name.to_string();

        tokio::task::block_in_place(|| {
            tokio::runtime::Handle::current().block_on(async move {
                let output = client
                    .assume_role()
                    .role_arn(role_arn)
                    .role_session_name(session_name)
                    .send()
                    .await
                    .map_err(|error| {
                        AdapterError::new(
                            "sts:AssumeRole",
                            aws_sdk_sts::error::DisplayErrorContext(&error).to_string(),
                        )
                    })?;

                let credentials = output.credentials().ok_or_else(|| {
                    AdapterError::new("sts:AssumeRole", "response carried no credentials")
                })?;

                Ok(TemporaryCredentials {
                    access_key_id: credentials.access_key_id().to_string(),
                    secret_access_key: credentials.secret_access_key().to_string(),
                    session_token: credentials.session_token().to_string(),
                    expiration: chrono::DateTime::from_timestamp(
                        credentials.expiration().secs(),
                        0,
                    ),
                })
            })
        })
    }
}

struct CloudWatchLogStore {
    logs_client: aws_sdk_cloudwatchlogs::Client,
}

fn connect_audit_logs(
    aws_config: &aws_config::SdkConfig,
    credentials: &TemporaryCredentials,
) -> CloudWatchLogStore {
    let provider = aws_sdk_cloudwatchlogs::config::Credentials::new(
        credentials.access_key_id.clone(),
        credentials.secret_access_key.clone(),
        Some(credentials.session_token.clone()),
        credentials.expiration.map(SystemTime::from),
        "audit_acct_role",
    );
    let logs_config = aws_sdk_cloudwatchlogs::config::Builder::from(aws_config)
        .credentials_provider(provider)
        .build();

    CloudWatchLogStore {
        logs_client: aws_sdk_cloudwatchlogs::Client::from_conf(logs_config),
    }
}

fn logs_error(
    operation: &'static str,
    error: &(impl std::error::Error + 'static),
) -> AdapterError {
    AdapterError::new(
        operation,
        aws_sdk_cloudwatchlogs::error::DisplayErrorContext(error).to_string(),
    )
}

impl LogStore for CloudWatchLogStore {
    fn create_log_group(&self, log_group: &str) -> Result<(), CreateError> {
        let client = self.logs_client.clone();
        let log_group = log_group.to_string();

        tokio::task::block_in_place(|| {
            tokio::runtime::Handle::current().block_on(async move {
                match client.create_log_group().log_group_name(log_group).send().await {
                    Ok(_) => Ok(()),
                    Err(error) => {
                        let exists = error
                            .as_service_error()
                            .is_some_and(|service| service.is_resource_already_exists_exception());
                        if exists {
                            Err(CreateError::AlreadyExists)
                        } else {
                            Err(CreateError::Failed(logs_error("logs:CreateLogGroup", &error)))
                        }
                    }
                }
            })
        })
    }

    fn create_log_stream(&self, log_group: &str, log_stream: &str) -> Result<(), CreateError> {
        let client = self.logs_client.clone();
        let log_group = log_group.to_string();
        let log_stream = log_stream.to_string();

        tokio::task::block_in_place(|| {
            tokio::runtime::Handle::current().block_on(async move {
                match client
                    .create_log_stream()
                    .log_group_name(log_group)
                    .log_stream_name(log_stream)
                    .send()
                    .await
                {
                    Ok(_) => Ok(()),
                    Err(error) => {
                        let exists = error
                            .as_service_error()
                            .is_some_and(|service| service.is_resource_already_exists_exception());
                        if exists {
                            Err(CreateError::AlreadyExists)
                        } else {
                            Err(CreateError::Failed(logs_error("logs:CreateLogStream", &error)))
                        }
                    }
                }
            })
        })
    }

    #[allow(deprecated)]
    fn describe_log_streams(
        &self,
        log_group: &str,
        log_stream_prefix: &str,
    ) -> Result<Vec<StreamDescription>, AdapterError> {
        let client = self.logs_client.clone();
        let log_group = log_group.to_string();
        let log_stream_prefix = log_stream_prefix.to_string();

        tokio::task::block_in_place(|| {
            tokio::runtime::Handle::current().block_on(async move {
                let output = client
                    .describe_log_streams()
                    .log_group_name(log_group)
                    .log_stream_name_prefix(log_stream_prefix)
                    .send()
                    .await
                    .map_err(|error| logs_error("logs:DescribeLogStreams", &error))?;

                Ok(output
                    .log_streams()
                    .iter()
                    .map(|stream| StreamDescription {
                        name: stream.log_stream_name().unwrap_or_default().to_string(),
                        upload_sequence_token: stream.upload_sequence_token().map(str::to_string),
                    })
                    .collect())
            })
        })
    }

    #[allow(deprecated)]
    fn put_log_event(
        &self,
        destination: &DestinationStream,
        event: &LogEvent,
        sequence_token: Option<&str>,
    ) -> Result<(), AdapterError> {
        let client = self.logs_client.clone();
        let destination = destination.clone();
        let sequence_token = sequence_token.map(str::to_string);
        let input = InputLogEvent::builder()
            .timestamp(event.timestamp)
            .message(event.message.clone())
            .build()
            .map_err(|error| logs_error("logs:PutLogEvents", &error))?;

        tokio::task::block_in_place(|| {
            tokio::runtime::Handle::current().block_on(async move {
                client
                    .put_log_events()
                    .log_group_name(destination.log_group)
                    .log_stream_name(destination.log_stream)
                    .log_events(input)
                    .set_sequence_token(sequence_token)
                    .send()
                    .await
                    .map(|_| ())
                    .map_err(|error| logs_error("logs:PutLogEvents", &error))
            })
        })
    }
}

async fn handle_request(event: LambdaEvent<Value>) -> Result<RelaySummary, Error> {
    let aws_config = aws_config::load_defaults(aws_config::BehaviorVersion::latest()).await;
    let directory = IamAccountDirectory {
        iam_client: aws_sdk_iam::Client::new(&aws_config),
    };
    let assumer = StsRoleAssumer {
        sts_client: aws_sdk_sts::Client::new(&aws_config),
    };
    let context = InvocationContext::new(
        event.context.request_id.clone(),
        event.context.invoked_function_arn.clone(),
    );

    handle_log_batch(
        &event.payload,
        &context,
        env_lookup,
        &directory,
        &assumer,
        |credentials| connect_audit_logs(&aws_config, credentials),
    )
    .map_err(Error::from)
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    telemetry::init_from_env();
    lambda_runtime::run(service_fn(handle_request)).await
}
