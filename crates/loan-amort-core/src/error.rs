use thiserror::Error;

#[derive(Debug, Error)]
pub enum LoanAmortError {
    #[error("Invalid loan parameter: {field} — {reason}")]
    InvalidParameter { field: String, reason: String },

    #[error("Invalid extra payment: {0}")]
    InvalidExtraPayment(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl From<serde_json::Error> for LoanAmortError {
    fn from(e: serde_json::Error) -> Self {
        LoanAmortError::SerializationError(e.to_string())
    }
}
