use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Missing brand default: {field}: {reason}")]
    MissingBrandDefault { field: String, reason: String },

    #[error("Invalid input: {field}: {reason}")]
    InvalidInput { field: String, reason: String },

    #[error("Invalid loan input: {}", violations.join("; "))]
    InvalidLoanInput { violations: Vec<String> },

    #[error("Unsupported repayment style: {0}")]
    UnsupportedRepaymentStyle(String),

    #[error("Division by zero in {context}")]
    DivisionByZero { context: String },

    #[error("Output schema violation: {check}")]
    SchemaViolation { check: String },

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl From<serde_json::Error> for EngineError {
    fn from(e: serde_json::Error) -> Self {
        EngineError::SerializationError(e.to_string())
    }
}
