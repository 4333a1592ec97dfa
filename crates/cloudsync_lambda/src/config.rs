//! Environment-driven configuration for both functions.
//!
//! Values are read through a lookup closure so handlers can be exercised
//! with in-memory maps; the binaries pass [`env_lookup`].

use std::fmt;
use std::path::PathBuf;

use cloudsync_core::log_level::LogLevel;

use crate::error::ConfigError;

pub const AUDIT_ROLE_ARN_VAR: &str = "AUDIT_ACCT_ROLE_ARN";
pub const SOURCE_USER_VAR: &str = "src_repo_user";
pub const SOURCE_PASSWORD_VAR: &str = "src_repo_pass";
pub const LOG_LEVEL_VAR: &str = "LogLevel";
pub const REGION_VAR: &str = "AWS_DEFAULT_REGION";
pub const REGION_FALLBACK_VAR: &str = "AWS_REGION";
pub const SCRATCH_DIR_VAR: &str = "MIRROR_SCRATCH_DIR";

pub const CODECOMMIT_USER_PARAMETER: &str = "git2ccLambdaUser";
pub const CODECOMMIT_PASSWORD_PARAMETER: &str = "git2ccLambdaPwd";

pub fn env_lookup(name: &str) -> Option<String> {
    std::env::var(name).ok()
}

fn optional(lookup: &impl Fn(&str) -> Option<String>, name: &str) -> Option<String> {
    lookup(name).filter(|value| !value.trim().is_empty())
}

fn required(
    lookup: &impl Fn(&str) -> Option<String>,
    name: &'static str,
) -> Result<String, ConfigError> {
    optional(lookup, name).ok_or(ConfigError::Missing { name })
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogRelayConfig {
    pub audit_role_arn: String,
}

impl LogRelayConfig {
    pub fn load(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        Ok(Self {
            audit_role_arn: required(&lookup, AUDIT_ROLE_ARN_VAR)?,
        })
    }
}

#[derive(Clone, PartialEq, Eq)]
pub struct MirrorConfig {
    pub region: String,
    pub source_user: String,
    pub source_password: String,
    pub log_level: LogLevel,
    pub scratch_root: PathBuf,
}

impl MirrorConfig {
    pub fn load(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let region = optional(&lookup, REGION_VAR)
            .or_else(|| optional(&lookup, REGION_FALLBACK_VAR))
            .ok_or(ConfigError::Missing { name: REGION_VAR })?;

        Ok(Self {
            region,
            source_user: required(&lookup, SOURCE_USER_VAR)?,
            source_password: required(&lookup, SOURCE_PASSWORD_VAR)?,
            log_level: LogLevel::from_setting(lookup(LOG_LEVEL_VAR).as_deref()),
            scratch_root: optional(&lookup, SCRATCH_DIR_VAR)
                .map(PathBuf::from)
                .unwrap_or_else(std::env::temp_dir),
        })
    }
}

impl fmt::Debug for MirrorConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MirrorConfig")
            .field("region", &self.region)
            .field("source_user", &self.source_user)
            .field("source_password", &"<redacted>")
            .field("log_level", &self.log_level)
            .field("scratch_root", &self.scratch_root)
            .finish()
    }
}
