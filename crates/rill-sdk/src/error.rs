//! Error types for application components

/// Result type for component calls
pub type ComponentResult<T> = Result<T, ComponentError>;

/// Errors raised by application components while handling a record
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ComponentError {
    /// The component was handed a value of a type it does not accept
    #[error("Unexpected input: expected {expected}, got {got}")]
    UnexpectedInput {
        /// Expected type name
        expected: &'static str,
        /// Actual type name
        got: &'static str,
    },

    /// Inbound bytes could not be decoded
    #[error("Decode error: {0}")]
    Decode(String),

    /// Outbound value could not be encoded
    #[error("Encode error: {0}")]
    Encode(String),

    /// Any other application-level failure
    #[error("{0}")]
    Other(String),
}

impl From<String> for ComponentError {
    fn from(s: String) -> Self {
        ComponentError::Other(s)
    }
}

impl From<&str> for ComponentError {
    fn from(s: &str) -> Self {
        ComponentError::Other(s.to_string())
    }
}
