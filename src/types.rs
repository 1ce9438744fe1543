//! Core value types for Better Rest
//!
//! These are the three user inputs (wake time, sleep amount, coffee intake),
//! the request object that bundles them, and the bedtime estimate produced
//! from them. Bounds are enforced here, at construction time, so the estimator
//! can assume valid input.

use chrono::{NaiveTime, Timelike};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::InputError;

/// Minimum selectable sleep amount (hours)
pub const MIN_SLEEP_HOURS: f64 = 4.0;
/// Maximum selectable sleep amount (hours)
pub const MAX_SLEEP_HOURS: f64 = 12.0;
/// Stepper increment for the sleep amount (hours)
pub const SLEEP_STEP_HOURS: f64 = 1.0;
/// Default sleep amount (hours)
pub const DEFAULT_SLEEP_HOURS: f64 = 8.0;

/// Minimum selectable coffee intake (cups)
pub const MIN_COFFEE_CUPS: u8 = 0;
/// Maximum selectable coffee intake (cups)
pub const MAX_COFFEE_CUPS: u8 = 20;
/// Default coffee intake (cups)
pub const DEFAULT_COFFEE_CUPS: u8 = 1;

/// Default wake time hour (08:00)
pub const DEFAULT_WAKE_HOUR: u32 = 8;

pub const MINUTES_PER_DAY: u32 = 24 * 60;

/// A time of day with minute resolution.
///
/// Only the position on the clock face matters; there is no date component.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct WakeTime {
    hour: u32,
    minute: u32,
}

impl Default for WakeTime {
    fn default() -> Self {
        Self {
            hour: DEFAULT_WAKE_HOUR,
            minute: 0,
        }
    }
}

impl WakeTime {
    /// Create a wake time, rejecting hours above 23 and minutes above 59
    pub fn new(hour: u32, minute: u32) -> Result<Self, InputError> {
        if hour > 23 || minute > 59 {
            return Err(InputError::WakeTimeOutOfRange { hour, minute });
        }
        Ok(Self { hour, minute })
    }

    /// Create a wake time from minutes since midnight (0..=1439)
    pub fn from_minutes(minutes: u32) -> Result<Self, InputError> {
        if minutes >= MINUTES_PER_DAY {
            return Err(InputError::WakeTimeOutOfRange {
                hour: minutes / 60,
                minute: minutes % 60,
            });
        }
        Ok(Self {
            hour: minutes / 60,
            minute: minutes % 60,
        })
    }

    pub fn hour(&self) -> u32 {
        self.hour
    }

    pub fn minute(&self) -> u32 {
        self.minute
    }

    pub fn minutes_since_midnight(&self) -> u32 {
        self.hour * 60 + self.minute
    }

    /// Wake time in seconds, the unit the regression model was trained on
    pub fn seconds_since_midnight(&self) -> u32 {
        self.hour * 3600 + self.minute * 60
    }

    pub fn to_naive_time(&self) -> NaiveTime {
        // Fields are range-checked at construction.
        NaiveTime::from_hms_opt(self.hour, self.minute, 0).unwrap_or(NaiveTime::MIN)
    }
}

impl From<NaiveTime> for WakeTime {
    /// Drops seconds, like an hour-and-minute picker
    fn from(time: NaiveTime) -> Self {
        Self {
            hour: time.hour(),
            minute: time.minute(),
        }
    }
}

impl fmt::Display for WakeTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.hour, self.minute)
    }
}

impl FromStr for WakeTime {
    type Err = InputError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || InputError::InvalidTimeFormat(s.to_string());
        let (hour, minute) = s.trim().split_once(':').ok_or_else(invalid)?;
        let digits = |part: &str| part.bytes().all(|b| b.is_ascii_digit());
        if hour.is_empty()
            || hour.len() > 2
            || minute.len() != 2
            || !digits(hour)
            || !digits(minute)
        {
            return Err(invalid());
        }
        let hour: u32 = hour.parse().map_err(|_| invalid())?;
        let minute: u32 = minute.parse().map_err(|_| invalid())?;
        Self::new(hour, minute)
    }
}

impl TryFrom<String> for WakeTime {
    type Error = InputError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<WakeTime> for String {
    fn from(value: WakeTime) -> Self {
        value.to_string()
    }
}

/// Desired hours of sleep, always within [4.0, 12.0]
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(try_from = "f64", into = "f64")]
pub struct SleepAmount(f64);

impl Default for SleepAmount {
    fn default() -> Self {
        Self(DEFAULT_SLEEP_HOURS)
    }
}

impl SleepAmount {
    pub fn new(hours: f64) -> Result<Self, InputError> {
        if !(MIN_SLEEP_HOURS..=MAX_SLEEP_HOURS).contains(&hours) {
            return Err(InputError::SleepAmountOutOfRange(hours));
        }
        Ok(Self(hours))
    }

    pub fn hours(&self) -> f64 {
        self.0
    }

    /// Step up by one increment, saturating at the upper bound
    pub fn increment(&self) -> Self {
        Self((self.0 + SLEEP_STEP_HOURS).min(MAX_SLEEP_HOURS))
    }

    /// Step down by one increment, saturating at the lower bound
    pub fn decrement(&self) -> Self {
        Self((self.0 - SLEEP_STEP_HOURS).max(MIN_SLEEP_HOURS))
    }

    /// Stepper label, e.g. "8 hours" or "8.5 hours"
    pub fn label(&self) -> String {
        format!("{} hours", self.0)
    }
}

impl TryFrom<f64> for SleepAmount {
    type Error = InputError;

    fn try_from(value: f64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<SleepAmount> for f64 {
    fn from(value: SleepAmount) -> Self {
        value.0
    }
}

/// Daily coffee intake in cups, always within [0, 20]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "u8")]
pub struct CoffeeIntake(u8);

impl Default for CoffeeIntake {
    fn default() -> Self {
        Self(DEFAULT_COFFEE_CUPS)
    }
}

impl CoffeeIntake {
    /// Accepts any integer so that negative input is reported, not truncated
    pub fn new(cups: i64) -> Result<Self, InputError> {
        if cups < MIN_COFFEE_CUPS as i64 || cups > MAX_COFFEE_CUPS as i64 {
            return Err(InputError::CoffeeOutOfRange(cups));
        }
        Ok(Self(cups as u8))
    }

    pub fn cups(&self) -> u8 {
        self.0
    }

    /// Every value the picker offers, in display order
    pub fn choices() -> impl Iterator<Item = CoffeeIntake> {
        (MIN_COFFEE_CUPS..=MAX_COFFEE_CUPS).map(CoffeeIntake)
    }

    /// Picker label, e.g. "3 cup"
    pub fn label(&self) -> String {
        format!("{} cup", self.0)
    }
}

impl TryFrom<i64> for CoffeeIntake {
    type Error = InputError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<CoffeeIntake> for u8 {
    fn from(value: CoffeeIntake) -> Self {
        value.0
    }
}

/// Everything the estimator needs for one call
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct EstimateRequest {
    pub wake: WakeTime,
    pub sleep_amount: SleepAmount,
    pub coffee: CoffeeIntake,
}

impl EstimateRequest {
    pub fn new(wake: WakeTime, sleep_amount: SleepAmount, coffee: CoffeeIntake) -> Self {
        Self {
            wake,
            sleep_amount,
            coffee,
        }
    }

    /// Feature vector in model order: wake seconds, estimated sleep, coffee
    pub fn features(&self) -> ModelFeatures {
        ModelFeatures {
            wake_seconds: self.wake.seconds_since_midnight() as f64,
            estimated_sleep: self.sleep_amount.hours(),
            coffee: self.coffee.cups() as f64,
        }
    }
}

/// Model inputs, in the units the regression was trained on
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ModelFeatures {
    /// Wake time as seconds since midnight
    pub wake_seconds: f64,
    /// Desired sleep in hours
    pub estimated_sleep: f64,
    /// Cups of coffee per day
    pub coffee: f64,
}

/// The derived output: when to go to bed
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BedtimeEstimate {
    /// Wake time the estimate was computed for
    pub wake: WakeTime,
    /// Model-predicted hours of sleep
    pub actual_sleep_hours: f64,
    /// Wake time minus the predicted sleep, wrapped across midnight
    pub bedtime: NaiveTime,
}

impl BedtimeEstimate {
    /// Shortened clock-face rendering, e.g. "23:15"
    pub fn display(&self) -> String {
        format_short_time(self.bedtime)
    }
}

/// Format a time as HH:MM, truncating seconds
pub fn format_short_time(time: NaiveTime) -> String {
    time.format("%H:%M").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wake_time_defaults_to_eight() {
        let wake = WakeTime::default();
        assert_eq!(wake.to_string(), "08:00");
        assert_eq!(wake.minutes_since_midnight(), 480);
        assert_eq!(wake.seconds_since_midnight(), 28800);
    }

    #[test]
    fn test_wake_time_bounds() {
        assert!(WakeTime::new(23, 59).is_ok());
        assert!(WakeTime::new(24, 0).is_err());
        assert!(WakeTime::new(7, 60).is_err());
        assert_eq!(WakeTime::from_minutes(1439).unwrap().to_string(), "23:59");
        assert!(WakeTime::from_minutes(1440).is_err());
    }

    #[test]
    fn test_wake_time_parse() {
        assert_eq!("06:30".parse::<WakeTime>().unwrap(), WakeTime::new(6, 30).unwrap());
        assert_eq!("6:05".parse::<WakeTime>().unwrap(), WakeTime::new(6, 5).unwrap());
        assert!("0630".parse::<WakeTime>().is_err());
        assert!("6:5".parse::<WakeTime>().is_err());
        assert!("25:00".parse::<WakeTime>().is_err());
        assert!("aa:bb".parse::<WakeTime>().is_err());
    }

    #[test]
    fn test_wake_time_parse_rejects_signs() {
        for input in ["+6:30", "6:+5", "-1:30", "+0:00", "06:-1"] {
            assert!(
                matches!(input.parse::<WakeTime>(), Err(InputError::InvalidTimeFormat(_))),
                "{input} should be rejected"
            );
        }
    }

    #[test]
    fn test_wake_time_from_naive_time_drops_seconds() {
        let time = NaiveTime::from_hms_opt(7, 45, 59).unwrap();
        let wake = WakeTime::from(time);
        assert_eq!(wake.to_string(), "07:45");
        assert_eq!(wake.to_naive_time(), NaiveTime::from_hms_opt(7, 45, 0).unwrap());
    }

    #[test]
    fn test_sleep_amount_bounds() {
        assert!(SleepAmount::new(4.0).is_ok());
        assert!(SleepAmount::new(12.0).is_ok());
        assert!(SleepAmount::new(3.99).is_err());
        assert!(SleepAmount::new(12.01).is_err());
        assert!(SleepAmount::new(f64::NAN).is_err());
    }

    #[test]
    fn test_sleep_amount_stepper_clamps() {
        let top = SleepAmount::new(11.5).unwrap().increment();
        assert_eq!(top.hours(), 12.0);
        assert_eq!(top.increment().hours(), 12.0);

        let bottom = SleepAmount::new(4.5).unwrap().decrement();
        assert_eq!(bottom.hours(), 4.0);
        assert_eq!(bottom.decrement().hours(), 4.0);

        assert_eq!(SleepAmount::default().increment().hours(), 9.0);
    }

    #[test]
    fn test_sleep_amount_label() {
        assert_eq!(SleepAmount::default().label(), "8 hours");
        assert_eq!(SleepAmount::new(8.5).unwrap().label(), "8.5 hours");
        assert_eq!(SleepAmount::new(8.25).unwrap().label(), "8.25 hours");
    }

    #[test]
    fn test_coffee_bounds() {
        assert!(CoffeeIntake::new(0).is_ok());
        assert!(CoffeeIntake::new(20).is_ok());
        assert_eq!(CoffeeIntake::new(-1), Err(InputError::CoffeeOutOfRange(-1)));
        assert_eq!(CoffeeIntake::new(21), Err(InputError::CoffeeOutOfRange(21)));
    }

    #[test]
    fn test_coffee_choices_and_label() {
        let choices: Vec<u8> = CoffeeIntake::choices().map(|c| c.cups()).collect();
        assert_eq!(choices.len(), 21);
        assert_eq!(choices.first(), Some(&0));
        assert_eq!(choices.last(), Some(&20));
        assert_eq!(CoffeeIntake::default().label(), "1 cup");
    }

    #[test]
    fn test_request_features_use_seconds() {
        let request = EstimateRequest::new(
            WakeTime::new(6, 0).unwrap(),
            SleepAmount::new(4.0).unwrap(),
            CoffeeIntake::new(20).unwrap(),
        );
        let features = request.features();
        assert_eq!(features.wake_seconds, 21600.0);
        assert_eq!(features.estimated_sleep, 4.0);
        assert_eq!(features.coffee, 20.0);
    }

    #[test]
    fn test_request_json_rejects_out_of_range() {
        let ok: EstimateRequest =
            serde_json::from_str(r#"{"wake":"07:30","sleep_amount":7.5,"coffee":2}"#).unwrap();
        assert_eq!(ok.wake.to_string(), "07:30");
        assert_eq!(ok.coffee.cups(), 2);

        let bad_coffee = serde_json::from_str::<EstimateRequest>(
            r#"{"wake":"07:30","sleep_amount":7.5,"coffee":21}"#,
        );
        assert!(bad_coffee.is_err());

        let bad_sleep = serde_json::from_str::<EstimateRequest>(
            r#"{"wake":"07:30","sleep_amount":3,"coffee":1}"#,
        );
        assert!(bad_sleep.is_err());
    }

    #[test]
    fn test_request_json_shape() {
        let json = serde_json::to_value(EstimateRequest::default()).unwrap();
        assert_eq!(json["wake"], "08:00");
        assert_eq!(json["sleep_amount"], 8.0);
        assert_eq!(json["coffee"], 1);
    }
}
