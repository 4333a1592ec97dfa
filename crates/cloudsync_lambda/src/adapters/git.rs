//! Git operations used by the mirror, backed by the system `git` binary.

use std::ffi::OsString;
use std::path::Path;
use std::process::Stdio;

use cloudsync_core::remote_url::redact_userinfo;
use tokio::process::Command;
use tracing::debug;

use crate::error::GitError;

pub trait GitClient {
    /// Clones only `branch` of `url` into `destination`.
    fn clone_branch(&self, url: &str, branch: &str, destination: &Path) -> Result<(), GitError>;

    fn add_remote(&self, repository: &Path, name: &str, url: &str) -> Result<(), GitError>;

    fn push(&self, repository: &Path, remote: &str, branch: &str) -> Result<(), GitError>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemGit;

impl GitClient for SystemGit {
    fn clone_branch(&self, url: &str, branch: &str, destination: &Path) -> Result<(), GitError> {
        run_git("clone", clone_args(url, branch, destination), Some(url))
    }

    fn add_remote(&self, repository: &Path, name: &str, url: &str) -> Result<(), GitError> {
        let args = vec![
            OsString::from("-C"),
            repository.as_os_str().to_owned(),
            OsString::from("remote"),
            OsString::from("add"),
            OsString::from(name),
            OsString::from(url),
        ];
        run_git("remote add", args, Some(url))
    }

    fn push(&self, repository: &Path, remote: &str, branch: &str) -> Result<(), GitError> {
        let args = vec![
            OsString::from("-C"),
            repository.as_os_str().to_owned(),
            OsString::from("push"),
            OsString::from(remote),
            OsString::from(branch),
        ];
        run_git("push", args, None)
    }
}

pub fn clone_args(url: &str, branch: &str, destination: &Path) -> Vec<OsString> {
    vec![
        OsString::from("clone"),
        OsString::from("--single-branch"),
        OsString::from("-b"),
        OsString::from(branch),
        OsString::from(url),
        destination.as_os_str().to_owned(),
    ]
}

/// Git echoes remote URLs in its errors; the authenticated form is replaced
/// before the text leaves this module.
fn scrub(text: &str, secret_url: Option<&str>) -> String {
    match secret_url {
        Some(url) => text.replace(url, &redact_userinfo(url)),
        None => text.to_string(),
    }
}

fn run_git(
    command: &'static str,
    args: Vec<OsString>,
    secret_url: Option<&str>,
) -> Result<(), GitError> {
    tokio::task::block_in_place(|| {
        tokio::runtime::Handle::current().block_on(async move {
            debug!(command, "spawning git");

            let output = Command::new("git")
                .args(&args)
                .env("GIT_TERMINAL_PROMPT", "0")
                .stdin(Stdio::null())
                .stdout(Stdio::piped())
                .stderr(Stdio::piped())
                .output()
                .await
                .map_err(|source| GitError::Spawn { command, source })?;

            let stderr = scrub(String::from_utf8_lossy(&output.stderr).trim(), secret_url);
            if !output.status.success() {
                return Err(GitError::Failed {
                    command,
                    status: output.status.to_string(),
                    stderr,
                });
            }

            debug!(command, stderr = %stderr, "git succeeded");
            Ok(())
        })
    })
}
