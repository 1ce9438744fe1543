//! Bedtime estimation
//!
//! Feeds the three request features into the sleep model and subtracts the
//! predicted sleep from the wake time. The computation is pure: the same model
//! and request always give the same estimate.

use chrono::NaiveTime;

use crate::error::EstimateError;
use crate::model::{ModelInfo, SleepModel};
use crate::types::{
    BedtimeEstimate, CoffeeIntake, EstimateRequest, SleepAmount, WakeTime, MINUTES_PER_DAY,
};

const MILLIS_PER_HOUR: f64 = 3_600_000.0;
const MILLIS_PER_DAY: f64 = 86_400_000.0;

/// Stateless estimator over an injected sleep model
#[derive(Debug, Clone)]
pub struct BedtimeEstimator<M> {
    model: M,
}

impl<M: SleepModel> BedtimeEstimator<M> {
    pub fn new(model: M) -> Self {
        Self { model }
    }

    pub fn model(&self) -> &M {
        &self.model
    }

    pub fn model_info(&self) -> ModelInfo {
        self.model.describe()
    }

    /// Estimate a bedtime for a validated request
    pub fn estimate(&self, request: &EstimateRequest) -> Result<BedtimeEstimate, EstimateError> {
        let features = request.features();

        let actual_sleep = self
            .model
            .predict(features.wake_seconds, features.estimated_sleep, features.coffee)?;

        if !actual_sleep.is_finite() {
            return Err(EstimateError::ModelFailure(format!(
                "model returned a non-finite prediction ({actual_sleep})"
            )));
        }

        tracing::debug!(
            wake_seconds = features.wake_seconds,
            estimated_sleep = features.estimated_sleep,
            coffee = features.coffee,
            actual_sleep,
            "sleep model prediction"
        );

        let bedtime = subtract_hours(request.wake, actual_sleep)?;

        Ok(BedtimeEstimate {
            wake: request.wake,
            actual_sleep_hours: actual_sleep,
            bedtime,
        })
    }

    /// Estimate from raw scalars: wake minutes since midnight, sleep hours, cups.
    ///
    /// Callers are expected to have range-checked the values already. Anything
    /// out of range is reported as a model failure rather than a panic.
    pub fn estimate_raw(
        &self,
        wake_minutes: u32,
        sleep_hours: f64,
        coffee_cups: u8,
    ) -> Result<BedtimeEstimate, EstimateError> {
        if wake_minutes >= MINUTES_PER_DAY {
            return Err(EstimateError::ModelFailure(format!(
                "wake time out of range ({wake_minutes} minutes since midnight)"
            )));
        }
        let request = EstimateRequest {
            wake: WakeTime::from_minutes(wake_minutes)
                .map_err(|e| EstimateError::ModelFailure(e.to_string()))?,
            sleep_amount: SleepAmount::new(sleep_hours)
                .map_err(|e| EstimateError::ModelFailure(e.to_string()))?,
            coffee: CoffeeIntake::new(coffee_cups as i64)
                .map_err(|e| EstimateError::ModelFailure(e.to_string()))?,
        };
        self.estimate(&request)
    }
}

/// Wake time minus `hours`, wrapped onto the 24-hour clock face.
///
/// Works at millisecond resolution so that fractional predictions survive.
fn subtract_hours(wake: WakeTime, hours: f64) -> Result<NaiveTime, EstimateError> {
    let wake_ms = wake.seconds_since_midnight() as f64 * 1000.0;
    let offset_ms = (hours * MILLIS_PER_HOUR).round();
    let bedtime_ms = (wake_ms - offset_ms).rem_euclid(MILLIS_PER_DAY) as u64;

    let secs = (bedtime_ms / 1000) as u32;
    let nanos = ((bedtime_ms % 1000) * 1_000_000) as u32;

    NaiveTime::from_num_seconds_from_midnight_opt(secs, nanos).ok_or_else(|| {
        EstimateError::ModelFailure(format!("bedtime out of range ({bedtime_ms} ms)"))
    })
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::error::ModelError;
    use crate::model::LinearSleepModel;
    use chrono::Timelike;
    use pretty_assertions::assert_eq;
    use std::cell::RefCell;

    /// Returns a fixed prediction and records the features it was called with
    pub(crate) struct FixedModel {
        pub prediction: f64,
        pub calls: RefCell<Vec<(f64, f64, f64)>>,
    }

    impl FixedModel {
        pub(crate) fn new(prediction: f64) -> Self {
            Self {
                prediction,
                calls: RefCell::new(Vec::new()),
            }
        }
    }

    impl SleepModel for FixedModel {
        fn predict(
            &self,
            wake_seconds: f64,
            estimated_sleep: f64,
            coffee: f64,
        ) -> Result<f64, ModelError> {
            self.calls
                .borrow_mut()
                .push((wake_seconds, estimated_sleep, coffee));
            Ok(self.prediction)
        }

        fn describe(&self) -> ModelInfo {
            ModelInfo {
                name: "Fixed".to_string(),
                version: "test".to_string(),
            }
        }
    }

    /// Fails every prediction with the given message
    pub(crate) struct FailingModel(pub &'static str);

    impl SleepModel for FailingModel {
        fn predict(&self, _: f64, _: f64, _: f64) -> Result<f64, ModelError> {
            Err(ModelError::Inference(self.0.to_string()))
        }

        fn describe(&self) -> ModelInfo {
            ModelInfo {
                name: "Failing".to_string(),
                version: "test".to_string(),
            }
        }
    }

    fn request(hour: u32, minute: u32, sleep: f64, coffee: i64) -> EstimateRequest {
        EstimateRequest::new(
            WakeTime::new(hour, minute).unwrap(),
            SleepAmount::new(sleep).unwrap(),
            CoffeeIntake::new(coffee).unwrap(),
        )
    }

    fn hm(hour: u32, minute: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(hour, minute, 0).unwrap()
    }

    #[test]
    fn test_default_scenario() {
        let estimator = BedtimeEstimator::new(FixedModel::new(7.5));
        let estimate = estimator.estimate(&request(8, 0, 8.0, 1)).unwrap();

        assert_eq!(estimator.model().calls.borrow().as_slice(), &[(28800.0, 8.0, 1.0)]);
        assert_eq!(estimate.bedtime, hm(0, 30));
        assert_eq!(estimate.display(), "00:30");
        assert_eq!(estimate.actual_sleep_hours, 7.5);
    }

    #[test]
    fn test_wraps_across_midnight() {
        let estimator = BedtimeEstimator::new(FixedModel::new(8.25));
        let estimate = estimator.estimate(&request(6, 0, 8.0, 1)).unwrap();
        assert_eq!(estimate.bedtime, hm(21, 45));

        let estimator = BedtimeEstimator::new(FixedModel::new(0.5));
        let estimate = estimator.estimate(&request(0, 10, 8.0, 1)).unwrap();
        assert_eq!(estimate.bedtime, hm(23, 40));
    }

    #[test]
    fn test_offset_is_exactly_actual_sleep() {
        for prediction in [4.0, 6.75, 9.1, 13.5, 23.99] {
            let estimator = BedtimeEstimator::new(FixedModel::new(prediction));
            for minutes in (0..MINUTES_PER_DAY).step_by(37) {
                let estimate = estimator.estimate_raw(minutes, 8.0, 1).unwrap();
                let wake_ms = minutes as i64 * 60_000;
                let bed_ms = estimate.bedtime.num_seconds_from_midnight() as i64 * 1000
                    + (estimate.bedtime.nanosecond() / 1_000_000) as i64;
                let diff = (wake_ms - bed_ms).rem_euclid(86_400_000);
                assert_eq!(diff, (prediction * 3_600_000.0).round() as i64);
            }
        }
    }

    #[test]
    fn test_fractional_prediction_keeps_seconds() {
        let estimator = BedtimeEstimator::new(FixedModel::new(7.0 + 1.0 / 3600.0));
        let estimate = estimator.estimate(&request(8, 0, 8.0, 1)).unwrap();
        assert_eq!(estimate.bedtime, NaiveTime::from_hms_opt(0, 59, 59).unwrap());
        assert_eq!(estimate.display(), "00:59");
    }

    #[test]
    fn test_model_failure_is_reported() {
        let estimator = BedtimeEstimator::new(FailingModel("runtime unavailable"));
        let err = estimator.estimate(&request(6, 0, 4.0, 20)).unwrap_err();
        assert!(matches!(err, EstimateError::ModelFailure(_)));
        assert!(err.description().contains("runtime unavailable"));
    }

    #[test]
    fn test_non_finite_prediction_is_a_failure() {
        let estimator = BedtimeEstimator::new(FixedModel::new(f64::NAN));
        assert!(estimator.estimate(&request(8, 0, 8.0, 1)).is_err());

        let estimator = BedtimeEstimator::new(FixedModel::new(f64::INFINITY));
        assert!(estimator.estimate(&request(8, 0, 8.0, 1)).is_err());
    }

    #[test]
    fn test_raw_out_of_range_does_not_panic() {
        let estimator = BedtimeEstimator::new(FixedModel::new(7.0));
        assert!(estimator.estimate_raw(1440, 8.0, 1).is_err());
        assert!(estimator.estimate_raw(480, 3.0, 1).is_err());
        assert!(estimator.estimate_raw(480, 8.0, 21).is_err());
        assert!(estimator.model().calls.borrow().is_empty());
    }

    #[test]
    fn test_estimate_is_idempotent() {
        let estimator = BedtimeEstimator::new(LinearSleepModel::bundled().unwrap());
        let req = request(7, 15, 9.0, 3);
        let first = estimator.estimate(&req).unwrap();
        let second = estimator.estimate(&req).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_bundled_model_snapshot() {
        let estimator = BedtimeEstimator::new(LinearSleepModel::bundled().unwrap());

        // 0.5 + 0.0000075 * 28800 + 0.88 * 8 + 0.11 * 1 = 7.866 hours
        let estimate = estimator.estimate(&request(8, 0, 8.0, 1)).unwrap();
        assert!((estimate.actual_sleep_hours - 7.866).abs() < 1e-9);
        assert_eq!(estimate.display(), "00:08");
    }

    #[test]
    fn test_bundled_model_more_sleep_requested_never_predicts_less() {
        let estimator = BedtimeEstimator::new(LinearSleepModel::bundled().unwrap());
        let baseline = estimator
            .estimate(&request(8, 0, 4.0, 1))
            .unwrap()
            .actual_sleep_hours;

        let mut previous = baseline;
        let mut sleep = 4.0;
        while sleep <= 12.0 {
            let actual = estimator
                .estimate(&request(8, 0, sleep, 1))
                .unwrap()
                .actual_sleep_hours;
            assert!(actual >= baseline);
            assert!(actual >= previous);
            previous = actual;
            sleep += 0.25;
        }
    }
}
