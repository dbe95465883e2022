use thiserror::Error;

/// Raised by a [`crate::model::PricingModel`] when a row cannot be priced.
#[derive(Debug, Error)]
pub enum PredictionError {
    #[error("feature schema mismatch at position {position}: expected column {expected}, got {found}")]
    SchemaMismatch {
        position: usize,
        expected: String,
        found: String,
    },

    #[error("column {column} must be {expected}")]
    KindMismatch {
        column: String,
        expected: &'static str,
    },

    #[error("row has {got} columns, schema expects {expected}")]
    ColumnCount { got: usize, expected: usize },

    #[error("feature length mismatch: got {got}, expected {expected}")]
    Dimension { got: usize, expected: usize },

    #[error("inference failed: {0}")]
    Inference(String),

    #[error("model returned a non-finite price: {0}")]
    NonFinite(f64),
}

/// Client-visible failures of the pricing pipeline.
#[derive(Debug, Error)]
pub enum PricingError {
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error(transparent)]
    Prediction(#[from] PredictionError),
}
