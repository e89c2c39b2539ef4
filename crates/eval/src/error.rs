use thiserror::Error;

#[derive(Debug, Error)]
pub enum EvalError {
    /// A typed annotation was built from data that violates its role
    #[error("invalid domain object: {0}")]
    InvalidDomainObject(String),

    /// Two different documents were handed to the file scorer
    #[error("mismatched document identity: prediction {prediction:?} vs reference {reference:?}")]
    MismatchedDocument {
        prediction: String,
        reference: String,
    },

    #[error("failed to write report: {0}")]
    Report(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, EvalError>;
