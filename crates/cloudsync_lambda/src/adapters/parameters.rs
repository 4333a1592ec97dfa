use crate::error::AdapterError;

pub trait ParameterStore {
    /// Reads one parameter value; `with_decryption` is needed for
    /// `SecureString` parameters.
    fn parameter(&self, name: &str, with_decryption: bool) -> Result<String, AdapterError>;
}
