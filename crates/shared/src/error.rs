use thiserror::Error;

/// Peer-local protocol fault. Non-fatal: the offending message is
/// dropped and the connection stays open.
#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("malformed message: {0}")]
    Malformed(#[from] serde_json::Error),
}

/// Rejected operator edit. The stored configuration is left untouched.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("expected a numeric angle, got {input:?}")]
    NotNumeric { input: String },
}

impl ValidationError {
    pub fn not_numeric(input: impl Into<String>) -> Self {
        Self::NotNumeric {
            input: input.into(),
        }
    }
}
