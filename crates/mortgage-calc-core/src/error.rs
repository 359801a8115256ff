use thiserror::Error;

#[derive(Debug, Error)]
pub enum MortgageCalcError {
    #[error("Invalid input: {field} - {reason}")]
    InvalidInput { field: String, reason: String },

    #[error("Division by zero in {context}")]
    DivisionByZero { context: String },

    #[error("Insufficient data: {0}")]
    InsufficientData(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl MortgageCalcError {
    /// Arithmetic left the representable range. Reported as invalid input so
    /// callers treat it as a validation failure rather than a result.
    pub fn overflow(field: &str, context: &str) -> Self {
        MortgageCalcError::InvalidInput {
            field: field.into(),
            reason: format!("Numeric overflow in {context}; inputs are too large to evaluate"),
        }
    }
}

impl From<serde_json::Error> for MortgageCalcError {
    fn from(e: serde_json::Error) -> Self {
        MortgageCalcError::SerializationError(e.to_string())
    }
}
