//! Better Rest - On-device bedtime estimation
//!
//! Better Rest recommends a bedtime from three inputs: when the user wants to
//! wake up, how much sleep they would like, and how much coffee they drink. A
//! pre-trained regression model predicts how much sleep the user will actually
//! get, and the bedtime is the wake time minus that prediction.
//!
//! ## Modules
//!
//! - **Estimator**: the pure estimate over an injected [`SleepModel`]
//! - **Form**: input state, validation, and the alert/fallback policy for a host UI
//! - **FFI**: C bindings for mobile hosts

pub mod encoder;
pub mod error;
pub mod estimator;
pub mod form;
pub mod model;
pub mod types;

// FFI bindings for C interop (always available for cdylib/staticlib builds)
pub mod ffi;

pub use encoder::{EstimateEncoder, EstimateReport};
pub use error::{EstimateError, InputError, ModelError};
pub use estimator::BedtimeEstimator;
pub use form::{Alert, BedtimeForm, FormOutcome};
pub use model::{LinearSleepModel, ModelInfo, SleepModel};
pub use types::{BedtimeEstimate, CoffeeIntake, EstimateRequest, SleepAmount, WakeTime};

/// Library version embedded in all reports
pub const REST_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Producer name for reports
pub const PRODUCER_NAME: &str = "better-rest";
