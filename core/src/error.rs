use thiserror::Error;

#[derive(Error, Debug)]
pub enum BridgeError {
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Cannot aggregate an empty list of periods")]
    EmptyAggregationInput,

    #[error("Structural validation failed: {reason}")]
    StructuralValidation { reason: String },

    #[error("Invalid period key '{key}': expected YYYY-MM")]
    InvalidPeriod { key: String },

    #[error("Unknown segment '{0}'")]
    UnknownSegment(String),

    #[error("Unknown view '{0}'")]
    UnknownView(String),

    #[error("Invalid generator config: {0}")]
    InvalidConfig(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type BridgeResult<T> = Result<T, BridgeError>;

impl BridgeError {
    pub(crate) fn structural(reason: impl Into<String>) -> Self {
        Self::StructuralValidation { reason: reason.into() }
    }
}
