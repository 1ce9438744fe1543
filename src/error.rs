//! Error types for Better Rest

use thiserror::Error;

/// Errors returned by the bedtime estimator.
///
/// The estimator has exactly one failure mode: the regression model could not
/// be loaded or could not produce a usable prediction.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EstimateError {
    #[error("Model failure: {0}")]
    ModelFailure(String),
}

impl EstimateError {
    /// Human-readable failure description, without the error kind prefix
    pub fn description(&self) -> &str {
        match self {
            EstimateError::ModelFailure(msg) => msg,
        }
    }
}

/// Errors raised by the regression model layer
#[derive(Debug, Error)]
pub enum ModelError {
    #[error("Invalid model artifact: {0}")]
    InvalidArtifact(String),

    #[error("Failed to read model artifact: {0}")]
    Io(#[from] std::io::Error),

    #[error("Malformed model JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Inference failed: {0}")]
    Inference(String),
}

impl From<ModelError> for EstimateError {
    fn from(e: ModelError) -> Self {
        EstimateError::ModelFailure(e.to_string())
    }
}

/// Errors raised by the input layer when a value falls outside its bounds
#[derive(Debug, Clone, PartialEq, Error)]
pub enum InputError {
    #[error("Wake time out of range: {hour:02}:{minute:02}")]
    WakeTimeOutOfRange { hour: u32, minute: u32 },

    #[error("Sleep amount out of range: {0} hours (expected 4 to 12)")]
    SleepAmountOutOfRange(f64),

    #[error("Coffee intake out of range: {0} cups (expected 0 to 20)")]
    CoffeeOutOfRange(i64),

    #[error("Invalid time format: {0} (expected HH:MM)")]
    InvalidTimeFormat(String),
}
