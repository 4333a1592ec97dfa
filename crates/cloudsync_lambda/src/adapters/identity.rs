use std::fmt;

use chrono::{DateTime, Utc};

use crate::error::AdapterError;

pub trait AccountDirectory {
    fn account_aliases(&self) -> Result<Vec<String>, AdapterError>;
}

pub trait RoleAssumer {
    fn assume_role(
        &self,
        role_arn: &str,
        session_name: &str,
    ) -> Result<TemporaryCredentials, AdapterError>;
}

/// Short-lived credentials for the audit account. Held in memory for one
/// invocation only.
#[derive(Clone, PartialEq, Eq)]
pub struct TemporaryCredentials {
    pub access_key_id: String,
    pub secret_access_key: String,
    pub session_token: String,
    pub expiration: Option<DateTime<Utc>>,
}

impl fmt::Debug for TemporaryCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TemporaryCredentials")
            .field("access_key_id", &self.access_key_id)
            .field("secret_access_key", &"<redacted>")
            .field("session_token", &"<redacted>")
            .field("expiration", &self.expiration)
            .finish()
    }
}
