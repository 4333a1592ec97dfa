use cloudsync_core::invocation::InvocationContext;
use cloudsync_core::log_level::LogLevel;
use cloudsync_lambda::adapters::git::SystemGit;
use cloudsync_lambda::adapters::parameters::ParameterStore;
use cloudsync_lambda::adapters::repository_host::RepositoryHost;
use cloudsync_lambda::config::{env_lookup, LOG_LEVEL_VAR};
use cloudsync_lambda::error::{AdapterError, CreateError};
use cloudsync_lambda::handlers::repo_mirror::handle_push_event;
use cloudsync_lambda::telemetry;
use lambda_runtime::{service_fn, Error, LambdaEvent};
use serde_json::Value;

struct SsmParameterStore {
    ssm_client: aws_sdk_ssm::Client,
}

impl ParameterStore for SsmParameterStore {
    fn parameter(&self, name: &str, with_decryption: bool) -> Result<String, AdapterError> {
        let client = self.ssm_client.clone();
        let name = name.to_string();

        tokio::task::block_in_place(|| {
            tokio::runtime::Handle::current().block_on(async move {
                let output = client
                    .get_parameter()
                    .name(&name)
                    .with_decryption(with_decryption)
                    .send()
                    .await
                    .map_err(|error| {
                        AdapterError::new(
                            "ssm:GetParameter",
                            aws_sdk_ssm::error::DisplayErrorContext(&error).to_string(),
                        )
                    })?;

                output
                    .parameter()
                    .and_then(|parameter| parameter.value())
                    .map(str::to_string)
                    .ok_or_else(|| {
                        AdapterError::new(
                            "ssm:GetParameter",
                            format!("parameter {name} has no value"),
                        )
                    })
            })
        })
    }
}

struct CodeCommitRepositoryHost {
    codecommit_client: aws_sdk_codecommit::Client,
}

impl RepositoryHost for CodeCommitRepositoryHost {
    fn create_repository(&self, name: &str, description: &str) -> Result<(), CreateError> {
        let client = self.codecommit_client.clone();
        let name = name.to_string();
        let description = description.to_string();

        tokio::task::block_in_place(|| {
            tokio::runtime::Handle::current().block_on(async move {
                match client
                    .create_repository()
                    .repository_name(name)
                    .repository_description(description)
                    .send()
                    .await
                {
                    Ok(_) => Ok(()),
                    Err(error) => {
                        let exists = error
                            .as_service_error()
                            .is_some_and(|service| service.is_repository_name_exists_exception());
                        if exists {
                            Err(CreateError::AlreadyExists)
                        } else {
                            Err(CreateError::Failed(AdapterError::new(
                                "codecommit:CreateRepository",
                                aws_sdk_codecommit::error::DisplayErrorContext(&error).to_string(),
                            )))
                        }
                    }
                }
            })
        })
    }
}

async fn handle_request(event: LambdaEvent<Value>) -> Result<String, Error> {
    let aws_config = aws_config::load_defaults(aws_config::BehaviorVersion::latest()).await;
    let parameters = SsmParameterStore {
        ssm_client: aws_sdk_ssm::Client::new(&aws_config),
    };
    let host = CodeCommitRepositoryHost {
        codecommit_client: aws_sdk_codecommit::Client::new(&aws_config),
    };
    let context = InvocationContext::new(
        event.context.request_id.clone(),
        event.context.invoked_function_arn.clone(),
    );

    let outcome = handle_push_event(
        &event.payload,
        &context,
        env_lookup,
        &parameters,
        &host,
        &SystemGit,
    )?;
    Ok(outcome.message())
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    telemetry::init_with_level(LogLevel::from_setting(env_lookup(LOG_LEVEL_VAR).as_deref()));
    lambda_runtime::run(service_fn(handle_request)).await
}
