//! Regression model
//!
//! The bedtime estimator treats the sleep model as an opaque collaborator with a
//! single `predict` method. `LinearSleepModel` is the shipped implementation: a
//! linear regression whose coefficients live in a JSON artifact, loaded once and
//! reused for every estimate.

use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use crate::error::ModelError;

/// Model artifact compiled into the library
pub const BUNDLED_MODEL_JSON: &str = include_str!("../models/sleep_calculator.json");

/// Identity of a loaded model, used for provenance in reports
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelInfo {
    pub name: String,
    pub version: String,
}

/// A pre-trained model predicting how many hours of sleep a user actually gets.
///
/// Inputs use the training units: wake time in seconds since midnight, desired
/// sleep in hours, coffee as a cup count.
pub trait SleepModel {
    /// Predict actual sleep in hours
    fn predict(
        &self,
        wake_seconds: f64,
        estimated_sleep: f64,
        coffee: f64,
    ) -> Result<f64, ModelError>;

    /// Model identity for provenance
    fn describe(&self) -> ModelInfo;
}

impl<M: SleepModel + ?Sized> SleepModel for &M {
    fn predict(
        &self,
        wake_seconds: f64,
        estimated_sleep: f64,
        coffee: f64,
    ) -> Result<f64, ModelError> {
        (**self).predict(wake_seconds, estimated_sleep, coffee)
    }

    fn describe(&self) -> ModelInfo {
        (**self).describe()
    }
}

impl<M: SleepModel + ?Sized> SleepModel for Box<M> {
    fn predict(
        &self,
        wake_seconds: f64,
        estimated_sleep: f64,
        coffee: f64,
    ) -> Result<f64, ModelError> {
        (**self).predict(wake_seconds, estimated_sleep, coffee)
    }

    fn describe(&self) -> ModelInfo {
        (**self).describe()
    }
}

/// Linear regression over the three model features.
///
/// ```text
/// actual_sleep = intercept
///              + coeff_wake * wake_seconds
///              + coeff_estimated_sleep * estimated_sleep
///              + coeff_coffee * coffee
/// ```
///
/// Named fields make schema mismatches fail at deserialization time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LinearSleepModel {
    /// Model name
    pub name: String,
    /// Artifact version
    pub version: String,
    /// Constant term (hours)
    pub intercept: f64,
    /// Hours per second of wake time
    pub coeff_wake: f64,
    /// Hours per requested hour of sleep
    pub coeff_estimated_sleep: f64,
    /// Hours per cup of coffee
    pub coeff_coffee: f64,
}

impl LinearSleepModel {
    /// Load the artifact compiled into the library
    pub fn bundled() -> Result<Self, ModelError> {
        Self::from_json(BUNDLED_MODEL_JSON)
    }

    /// Parse and validate a model artifact from JSON
    pub fn from_json(json: &str) -> Result<Self, ModelError> {
        let model: Self = serde_json::from_str(json)?;
        model.validate()?;
        Ok(model)
    }

    /// Load and validate a model artifact from a file
    pub fn load(path: &Path) -> Result<Self, ModelError> {
        let reader = BufReader::new(File::open(path)?);
        let model: Self = serde_json::from_reader(reader)?;
        model.validate()?;
        tracing::debug!(
            path = %path.display(),
            name = %model.name,
            version = %model.version,
            "loaded sleep model"
        );
        Ok(model)
    }

    /// Serialize the artifact back to JSON
    pub fn to_json(&self) -> Result<String, ModelError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    fn validate(&self) -> Result<(), ModelError> {
        if self.name.trim().is_empty() {
            return Err(ModelError::InvalidArtifact("model name is empty".to_string()));
        }

        let coefficients = [
            ("intercept", self.intercept),
            ("coeff_wake", self.coeff_wake),
            ("coeff_estimated_sleep", self.coeff_estimated_sleep),
            ("coeff_coffee", self.coeff_coffee),
        ];
        for (field, value) in coefficients {
            if !value.is_finite() {
                return Err(ModelError::InvalidArtifact(format!(
                    "{field} is not a finite number"
                )));
            }
        }

        Ok(())
    }
}

impl SleepModel for LinearSleepModel {
    fn predict(
        &self,
        wake_seconds: f64,
        estimated_sleep: f64,
        coffee: f64,
    ) -> Result<f64, ModelError> {
        if !(wake_seconds.is_finite() && estimated_sleep.is_finite() && coffee.is_finite()) {
            return Err(ModelError::Inference("non-finite input feature".to_string()));
        }

        let prediction = self.intercept
            + self.coeff_wake * wake_seconds
            + self.coeff_estimated_sleep * estimated_sleep
            + self.coeff_coffee * coffee;

        if !prediction.is_finite() {
            return Err(ModelError::Inference("prediction overflowed".to_string()));
        }

        Ok(prediction)
    }

    fn describe(&self) -> ModelInfo {
        ModelInfo {
            name: self.name.clone(),
            version: self.version.clone(),
        }
    }
}
