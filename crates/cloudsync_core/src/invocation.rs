use thiserror::Error;

/// Index of the account ID field in `arn:aws:lambda:<region>:<account>:function:<name>`.
const ARN_ACCOUNT_FIELD: usize = 4;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ArnError {
    #[error("invoked function ARN '{arn}' has no account ID field")]
    MissingAccountId { arn: String },
}

/// The per-invocation identity handed over by the Lambda runtime.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvocationContext {
    pub request_id: String,
    pub invoked_function_arn: String,
}

impl InvocationContext {
    pub fn new(request_id: impl Into<String>, invoked_function_arn: impl Into<String>) -> Self {
        Self {
            request_id: request_id.into(),
            invoked_function_arn: invoked_function_arn.into(),
        }
    }

    pub fn account_id(&self) -> Result<&str, ArnError> {
        account_id_from_arn(&self.invoked_function_arn)
    }
}

pub fn account_id_from_arn(arn: &str) -> Result<&str, ArnError> {
    arn.split(':')
        .nth(ARN_ACCOUNT_FIELD)
        .filter(|field| !field.is_empty())
        .ok_or_else(|| ArnError::MissingAccountId {
            arn: arn.to_string(),
        })
}

/// Human-readable account name: the first alias when the account has one,
/// otherwise the numeric account ID.
pub fn resolve_account_name(aliases: &[String], account_id: &str) -> String {
    aliases
        .iter()
        .find(|alias| !alias.trim().is_empty())
        .cloned()
        .unwrap_or_else(|| account_id.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    const FUNCTION_ARN: &str = "arn:aws:lambda:eu-west-1:123456789012:function:cw2cw";

    #[test]
    fn account_id_is_fifth_arn_field() {
        let context = InvocationContext::new("req-1", FUNCTION_ARN);
        assert_eq!(context.account_id(), Ok("123456789012"));
    }

    #[test]
    fn short_arn_is_rejected() {
        let error = account_id_from_arn("arn:aws:lambda").expect_err("arn should fail");
        assert!(error.to_string().contains("no account ID field"));
    }

    #[test]
    fn empty_account_field_is_rejected() {
        assert!(account_id_from_arn("arn:aws:lambda:eu-west-1::function:x").is_err());
    }

    #[test]
    fn first_alias_wins() {
        let aliases = vec!["prod-payments".to_string(), "legacy".to_string()];
        assert_eq!(
            resolve_account_name(&aliases, "123456789012"),
            "prod-payments"
        );
    }

    #[test]
    fn falls_back_to_account_id_without_alias() {
        assert_eq!(resolve_account_name(&[], "123456789012"), "123456789012");
    }
}
