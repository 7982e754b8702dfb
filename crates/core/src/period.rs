//! Labor period classification.
//!
//! The period is a pure function of the latest dilation reading: once the
//! most recent dilation-bearing measurement reports full dilation (10 cm),
//! the patient is in the second period and the measurement cadence tightens
//! from 30 to 15 minutes. A later reading below 10 cm moves the patient
//! back to period one; regressions are accepted at face value.

use crate::measurement::Measurement;
use chrono::Duration;

/// First or second period of labor.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LaborPeriod {
    First,
    Second,
}

impl LaborPeriod {
    /// The period as displayed to staff: 1 or 2.
    pub const fn number(self) -> u8 {
        match self {
            LaborPeriod::First => 1,
            LaborPeriod::Second => 2,
        }
    }

    /// Mandatory measurement cadence for this period, in minutes.
    pub const fn interval_minutes(self) -> i64 {
        match self {
            LaborPeriod::First => 30,
            LaborPeriod::Second => 15,
        }
    }

    /// Mandatory measurement cadence for this period.
    pub fn interval(self) -> Duration {
        Duration::minutes(self.interval_minutes())
    }
}

impl std::fmt::Display for LaborPeriod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.number())
    }
}

/// Classifies the labor period from a measurement history.
///
/// `measurements` must be ordered most-recent-first, as the stores return
/// them. The first entry carrying a dilation value decides; a history with
/// no dilation readings classifies as period one.
pub fn classify_period(measurements: &[Measurement]) -> LaborPeriod {
    measurements
        .iter()
        .find_map(|m| m.cervical_dilation)
        .map(|dilation| {
            if dilation.is_full() {
                LaborPeriod::Second
            } else {
                LaborPeriod::First
            }
        })
        .unwrap_or(LaborPeriod::First)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::measurement::{sort_latest_first, MeasurementId, NewMeasurement};
    use chrono::{DateTime, Duration, TimeZone, Utc};
    use partogram_types::CervicalDilation;

    fn dilation_at(time: DateTime<Utc>, cm: i64) -> Measurement {
        let mut draft = NewMeasurement::at(time);
        draft.cervical_dilation = Some(CervicalDilation::new(cm).unwrap());
        Measurement::from_new(draft, MeasurementId::new(), time)
    }

    fn plain_at(time: DateTime<Utc>) -> Measurement {
        Measurement::from_new(NewMeasurement::at(time), MeasurementId::new(), time)
    }

    fn base() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap()
    }

    #[test]
    fn test_empty_history_is_first_period() {
        assert_eq!(classify_period(&[]), LaborPeriod::First);
    }

    #[test]
    fn test_no_dilation_readings_is_first_period() {
        let measurements = vec![plain_at(base()), plain_at(base() + Duration::minutes(30))];
        assert_eq!(classify_period(&measurements), LaborPeriod::First);
    }

    #[test]
    fn test_latest_dilation_below_full_is_first_period() {
        let mut measurements = vec![dilation_at(base(), 8)];
        sort_latest_first(&mut measurements);
        assert_eq!(classify_period(&measurements), LaborPeriod::First);
    }

    #[test]
    fn test_full_dilation_is_second_period() {
        let mut measurements = vec![
            dilation_at(base(), 8),
            dilation_at(base() + Duration::minutes(31), 10),
        ];
        sort_latest_first(&mut measurements);
        assert_eq!(classify_period(&measurements), LaborPeriod::Second);
    }

    #[test]
    fn test_entries_without_dilation_are_skipped() {
        // The newest entry has no dilation; the classifier looks back to the
        // most recent entry that has one.
        let mut measurements = vec![
            dilation_at(base(), 10),
            plain_at(base() + Duration::minutes(15)),
        ];
        sort_latest_first(&mut measurements);
        assert_eq!(classify_period(&measurements), LaborPeriod::Second);
    }

    #[test]
    fn test_regression_is_accepted_at_face_value() {
        // 10 cm followed by a later 8 cm reading: period drops back to one.
        let mut measurements = vec![
            dilation_at(base(), 10),
            dilation_at(base() + Duration::minutes(15), 8),
        ];
        sort_latest_first(&mut measurements);
        assert_eq!(classify_period(&measurements), LaborPeriod::First);
    }

    #[test]
    fn test_interval_per_period() {
        assert_eq!(LaborPeriod::First.interval_minutes(), 30);
        assert_eq!(LaborPeriod::Second.interval_minutes(), 15);
        assert_eq!(LaborPeriod::First.number(), 1);
        assert_eq!(LaborPeriod::Second.number(), 2);
    }
}
