use std::fmt;
use std::path::Path;

use cloudsync_core::invocation::InvocationContext;
use cloudsync_core::outcome::MirrorOutcome;
use cloudsync_core::push::{source_from_sns, MirrorSource};
use cloudsync_core::remote_url::{
    codecommit_remote_url, encode_credential, redact_userinfo, splice_basic_auth,
    CODECOMMIT_REMOTE_NAME,
};
use serde_json::Value;
use tempfile::TempDir;
use tracing::{error, info, warn};

use crate::adapters::git::GitClient;
use crate::adapters::parameters::ParameterStore;
use crate::adapters::repository_host::{repository_description, RepositoryHost};
use crate::config::{MirrorConfig, CODECOMMIT_PASSWORD_PARAMETER, CODECOMMIT_USER_PARAMETER};
use crate::error::{CreateError, MirrorError};

/// Per-invocation values threaded through the mirror steps.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MirrorContext {
    pub region: String,
    pub account_id: String,
    pub request_id: String,
}

/// CodeCommit git credentials, already URL-encoded.
#[derive(Clone, PartialEq, Eq)]
pub struct CodeCommitCredentials {
    pub user: String,
    pub password: String,
}

impl fmt::Debug for CodeCommitCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CodeCommitCredentials")
            .field("user", &self.user)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Mirrors the pushed branch into CodeCommit.
///
/// Parse and configuration failures are returned as errors, as are clone and
/// push failures. A rejected repository creation is reported through
/// [`MirrorOutcome::Unsynced`] instead, and nothing is pushed.
pub fn handle_push_event(
    event: &Value,
    context: &InvocationContext,
    lookup: impl Fn(&str) -> Option<String>,
    parameters: &impl ParameterStore,
    host: &impl RepositoryHost,
    git: &impl GitClient,
) -> Result<MirrorOutcome, MirrorError> {
    let config = MirrorConfig::load(lookup)?;
    let mirror_context = MirrorContext {
        region: config.region.clone(),
        account_id: context.account_id()?.to_string(),
        request_id: context.request_id.clone(),
    };

    let source = source_from_sns(event)?;
    info!(
        source_url = %redact_userinfo(&source.url),
        branch = %source.branch,
        log_level = %config.log_level,
        "Source repo"
    );

    let credentials = codecommit_credentials(parameters)?;

    let checkout = create_checkout(&config.scratch_root, &mirror_context.request_id)?;
    let repository_dir = checkout.path().join(&source.name);

    let auth_url = splice_basic_auth(&source.url, &config.source_user, &config.source_password);
    git.clone_branch(&auth_url, &source.branch, &repository_dir)?;
    info!(
        repository = %source.name,
        branch = %source.branch,
        checkout = %repository_dir.display(),
        "cloned source branch"
    );

    push_to_codecommit(
        &mirror_context,
        &source,
        &credentials,
        &repository_dir,
        host,
        git,
    )
}

pub fn codecommit_credentials(
    parameters: &impl ParameterStore,
) -> Result<CodeCommitCredentials, MirrorError> {
    let user = parameters
        .parameter(CODECOMMIT_USER_PARAMETER, false)
        .map_err(|source| MirrorError::Credentials {
            credential: "user",
            parameter: CODECOMMIT_USER_PARAMETER,
            source,
        })?;
    let password = parameters
        .parameter(CODECOMMIT_PASSWORD_PARAMETER, true)
        .map_err(|source| MirrorError::Credentials {
            credential: "password",
            parameter: CODECOMMIT_PASSWORD_PARAMETER,
            source,
        })?;

    Ok(CodeCommitCredentials {
        user: encode_credential(&user),
        password: encode_credential(&password),
    })
}

/// The checkout is removed when the returned guard drops.
///
/// A retried invocation reuses its request ID, so a checkout left behind by
/// an attempt that was killed mid-clone is cleared first.
fn create_checkout(scratch_root: &Path, request_id: &str) -> Result<TempDir, MirrorError> {
    let checkout_error = |source: std::io::Error| MirrorError::Checkout {
        root: scratch_root.to_path_buf(),
        source,
    };

    std::fs::create_dir_all(scratch_root).map_err(checkout_error)?;
    let stale = scratch_root.join(request_id);
    if stale.exists() {
        warn!(checkout = %stale.display(), "removing stale checkout from an earlier attempt");
        std::fs::remove_dir_all(&stale).map_err(checkout_error)?;
    }
    tempfile::Builder::new()
        .prefix(request_id)
        .rand_bytes(0)
        .tempdir_in(scratch_root)
        .map_err(checkout_error)
}

fn push_to_codecommit(
    context: &MirrorContext,
    source: &MirrorSource,
    credentials: &CodeCommitCredentials,
    repository_dir: &Path,
    host: &impl RepositoryHost,
    git: &impl GitClient,
) -> Result<MirrorOutcome, MirrorError> {
    match host.create_repository(&source.name, &repository_description(&source.url)) {
        Ok(()) => info!(repository = %source.name, "created CodeCommit repository"),
        Err(CreateError::AlreadyExists) => info!(
            repository = %source.name,
            "Repository {} already exists in CodeCommit.",
            source.name
        ),
        Err(CreateError::Failed(failure)) => {
            error!(
                repository = %source.name,
                account_id = %context.account_id,
                region = %context.region,
                operation = failure.operation,
                reason = %failure.message,
                "CodeCommit repository creation failed, skipping push"
            );
            return Ok(MirrorOutcome::Unsynced {
                source_url: source.url.clone(),
                branch: source.branch.clone(),
                reason: failure.to_string(),
            });
        }
    }

    let remote_url = codecommit_remote_url(
        &context.region,
        &credentials.user,
        &credentials.password,
        &source.name,
    );
    git.add_remote(repository_dir, CODECOMMIT_REMOTE_NAME, &remote_url)?;
    git.push(repository_dir, CODECOMMIT_REMOTE_NAME, &source.branch)?;
    info!(
        repository = %source.name,
        branch = %source.branch,
        remote = %redact_userinfo(&remote_url),
        "pushed branch to CodeCommit"
    );

    Ok(MirrorOutcome::Synced {
        source_url: source.url.clone(),
        branch: source.branch.clone(),
    })
}
