//! Bedtime form state
//!
//! Holds the three form inputs and turns them into the one derived value the
//! screen shows. A host UI binds to this instead of keeping ambient mutable
//! fields: inputs go in through validated setters, and `evaluate` hands back
//! the bedtime text together with any alert to present.

use chrono::NaiveTime;
use serde::{Deserialize, Serialize};

use crate::error::{EstimateError, InputError, ModelError};
use crate::estimator::BedtimeEstimator;
use crate::model::SleepModel;
use crate::types::{format_short_time, CoffeeIntake, EstimateRequest, SleepAmount, WakeTime};

/// Alert title used for every estimation failure
pub const ALERT_TITLE: &str = "Error";
/// The single acknowledgement button on the alert
pub const ALERT_ACTION: &str = "Ok";

/// A dismissible notification for the user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Alert {
    pub title: String,
    pub message: String,
    pub action: String,
}

impl Alert {
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            title: ALERT_TITLE.to_string(),
            message: message.into(),
            action: ALERT_ACTION.to_string(),
        }
    }
}

/// What the screen shows after one evaluation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormOutcome {
    /// Bedtime as HH:MM, or the fallback time when estimation failed
    pub bedtime_text: String,
    /// Model-predicted sleep, absent on failure
    pub actual_sleep_hours: Option<f64>,
    /// Present only when estimation failed
    pub alert: Option<Alert>,
}

impl FormOutcome {
    pub fn is_fallback(&self) -> bool {
        self.alert.is_some()
    }
}

/// The form's three inputs
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct BedtimeForm {
    wake: WakeTime,
    sleep_amount: SleepAmount,
    coffee: CoffeeIntake,
}

impl BedtimeForm {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn wake(&self) -> WakeTime {
        self.wake
    }

    pub fn sleep_amount(&self) -> SleepAmount {
        self.sleep_amount
    }

    pub fn coffee(&self) -> CoffeeIntake {
        self.coffee
    }

    pub fn set_wake(&mut self, hour: u32, minute: u32) -> Result<(), InputError> {
        self.wake = WakeTime::new(hour, minute)?;
        Ok(())
    }

    /// Set the wake time from a picker value, keeping only hour and minute
    pub fn set_wake_time(&mut self, time: NaiveTime) {
        self.wake = WakeTime::from(time);
    }

    pub fn set_sleep_amount(&mut self, hours: f64) -> Result<(), InputError> {
        self.sleep_amount = SleepAmount::new(hours)?;
        Ok(())
    }

    pub fn increment_sleep(&mut self) {
        self.sleep_amount = self.sleep_amount.increment();
    }

    pub fn decrement_sleep(&mut self) {
        self.sleep_amount = self.sleep_amount.decrement();
    }

    pub fn set_coffee(&mut self, cups: i64) -> Result<(), InputError> {
        self.coffee = CoffeeIntake::new(cups)?;
        Ok(())
    }

    /// Snapshot of the current inputs
    pub fn request(&self) -> EstimateRequest {
        EstimateRequest::new(self.wake, self.sleep_amount, self.coffee)
    }

    /// Estimate the bedtime for the current inputs.
    ///
    /// Never fails: a model failure yields `now` as the displayed bedtime plus
    /// an alert carrying the failure description.
    pub fn evaluate<M: SleepModel>(
        &self,
        estimator: &BedtimeEstimator<M>,
        now: NaiveTime,
    ) -> FormOutcome {
        self.evaluate_loaded(Ok(estimator), now)
    }

    /// Like `evaluate`, but also accepts the error from a model that failed to
    /// load. A load failure is shown the same way as an inference failure.
    pub fn evaluate_loaded<M: SleepModel>(
        &self,
        estimator: Result<&BedtimeEstimator<M>, &ModelError>,
        now: NaiveTime,
    ) -> FormOutcome {
        let result = match estimator {
            Ok(estimator) => estimator.estimate(&self.request()),
            Err(load_error) => Err(EstimateError::ModelFailure(load_error.to_string())),
        };

        match result {
            Ok(estimate) => FormOutcome {
                bedtime_text: estimate.display(),
                actual_sleep_hours: Some(estimate.actual_sleep_hours),
                alert: None,
            },
            Err(e) => {
                tracing::warn!(error = %e, "bedtime estimate failed, showing current time");
                FormOutcome {
                    bedtime_text: format_short_time(now),
                    actual_sleep_hours: None,
                    alert: Some(Alert::error(e.description())),
                }
            }
        }
    }
}
