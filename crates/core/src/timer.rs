//! Derived timer state.
//!
//! There is no persisted "timer" entity. Every query recomputes the
//! remaining time from the stored measurement history and the injected
//! clock, which keeps stale-timer bugs structurally impossible: deleting
//! the anchoring measurement simply changes what the next computation sees.

use crate::measurement::Measurement;
use crate::patient::{LaborStatus, Patient};
use crate::period::{classify_period, LaborPeriod};
use chrono::{DateTime, Utc};

/// Server-authoritative countdown state for one patient.
///
/// `remaining_seconds` is what clients display; `next_due_at` lets them
/// recompute independently if they accept their own clock.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TimerState {
    pub status: LaborStatus,
    pub period: LaborPeriod,
    pub interval_minutes: i64,
    /// Seconds until the next mandatory measurement, floored at 0.
    pub remaining_seconds: i64,
    pub last_measurement_time: Option<DateTime<Utc>>,
    pub next_due_at: Option<DateTime<Utc>>,
}

impl TimerState {
    /// Whether the countdown has reached zero while labor is in progress.
    ///
    /// A lapsed timer never auto-completes labor; it only signals that a
    /// measurement is overdue.
    pub fn is_lapsed(&self) -> bool {
        self.status == LaborStatus::InProgress && self.remaining_seconds == 0
    }
}

/// Derives the timer state for a patient at `now`.
///
/// `measurements` must be a consistent snapshot ordered most-recent-first;
/// period and anchor are taken from the same snapshot so they can never
/// disagree. Patients outside `InProgress` get an inert state: period one,
/// zero remaining, no due time.
pub fn compute_timer_state(
    patient: &Patient,
    measurements: &[Measurement],
    now: DateTime<Utc>,
) -> TimerState {
    let last_measurement_time = measurements.first().map(|m| m.time);

    if patient.status != LaborStatus::InProgress {
        return TimerState {
            status: patient.status,
            period: LaborPeriod::First,
            interval_minutes: LaborPeriod::First.interval_minutes(),
            remaining_seconds: 0,
            last_measurement_time,
            next_due_at: None,
        };
    }

    let period = classify_period(measurements);
    let anchor = last_measurement_time.or(patient.labor_start);

    let (remaining_seconds, next_due_at) = match anchor {
        Some(anchor) => {
            let elapsed = (now - anchor).num_seconds();
            let remaining = (period.interval_minutes() * 60 - elapsed).max(0);
            (remaining, Some(anchor + period.interval()))
        }
        // Unreachable once InProgress, since starting labor always sets
        // labor_start; treated as an expired timer rather than a panic.
        None => (0, None),
    };

    TimerState {
        status: patient.status,
        period,
        interval_minutes: period.interval_minutes(),
        remaining_seconds,
        last_measurement_time,
        next_due_at,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::measurement::{sort_latest_first, MeasurementId, NewMeasurement};
    use crate::patient::NewPatient;
    use chrono::{Duration, NaiveDate, TimeZone};
    use partogram_types::{CervicalDilation, NonEmptyText};

    fn base() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap()
    }

    fn patient_in_labor(labor_start: DateTime<Utc>) -> Patient {
        let mut patient = Patient::admit(
            NewPatient::new(
                NonEmptyText::new("Ivanova A.P.").unwrap(),
                NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
            ),
            labor_start - Duration::hours(1),
        );
        patient.start_labor(labor_start);
        patient
    }

    fn measurement(time: DateTime<Utc>, dilation: Option<i64>) -> Measurement {
        let mut draft = NewMeasurement::at(time);
        draft.cervical_dilation = dilation.map(|cm| CervicalDilation::new(cm).unwrap());
        Measurement::from_new(draft, MeasurementId::new(), time)
    }

    #[test]
    fn test_not_started_patient_is_inert() {
        let patient = Patient::admit(
            NewPatient::new(
                NonEmptyText::new("Ivanova A.P.").unwrap(),
                NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
            ),
            base(),
        );
        let state = compute_timer_state(&patient, &[], base());

        assert_eq!(state.status, LaborStatus::NotStarted);
        assert_eq!(state.period, LaborPeriod::First);
        assert_eq!(state.remaining_seconds, 0);
        assert!(state.next_due_at.is_none());
        assert!(!state.is_lapsed());
    }

    #[test]
    fn test_completed_patient_is_inert() {
        let mut patient = patient_in_labor(base());
        patient.complete_labor().unwrap();

        let state = compute_timer_state(&patient, &[], base() + Duration::hours(2));
        assert_eq!(state.remaining_seconds, 0);
        assert!(state.next_due_at.is_none());
        assert!(!state.is_lapsed());
    }

    #[test]
    fn test_anchor_is_labor_start_without_measurements() {
        let patient = patient_in_labor(base());
        let state = compute_timer_state(&patient, &[], base());

        assert_eq!(state.remaining_seconds, 30 * 60);
        assert_eq!(state.next_due_at, Some(base() + Duration::minutes(30)));
    }

    #[test]
    fn test_remaining_counts_down_from_latest_measurement() {
        let patient = patient_in_labor(base());
        let mut measurements = vec![measurement(base(), Some(8))];
        sort_latest_first(&mut measurements);

        let state =
            compute_timer_state(&patient, &measurements, base() + Duration::minutes(10));
        assert_eq!(state.period, LaborPeriod::First);
        assert_eq!(state.remaining_seconds, 20 * 60);
        assert_eq!(state.last_measurement_time, Some(base()));
    }

    #[test]
    fn test_lapsed_timer_floors_at_zero() {
        let patient = patient_in_labor(base());
        let mut measurements = vec![measurement(base(), Some(8))];
        sort_latest_first(&mut measurements);

        // 45 minutes past a 30-minute interval: lapsed, never negative.
        let state =
            compute_timer_state(&patient, &measurements, base() + Duration::minutes(45));
        assert_eq!(state.remaining_seconds, 0);
        assert_eq!(state.status, LaborStatus::InProgress);
        assert!(state.is_lapsed());
    }

    #[test]
    fn test_period_transition_recomputes_interval_and_anchor() {
        let patient = patient_in_labor(base());

        // First measurement at T0: 8 cm, period one, full 30 minutes ahead.
        let mut measurements = vec![measurement(base(), Some(8))];
        sort_latest_first(&mut measurements);
        let state = compute_timer_state(&patient, &measurements, base());
        assert_eq!(state.period, LaborPeriod::First);
        assert_eq!(state.interval_minutes, 30);
        assert_eq!(state.remaining_seconds, 1800);

        // Full dilation recorded at T0+31min: period two, 15-minute cadence
        // anchored at the new measurement.
        let at_transition = base() + Duration::minutes(31);
        measurements.push(measurement(at_transition, Some(10)));
        sort_latest_first(&mut measurements);

        let state = compute_timer_state(&patient, &measurements, at_transition);
        assert_eq!(state.period, LaborPeriod::Second);
        assert_eq!(state.interval_minutes, 15);
        assert_eq!(state.remaining_seconds, 900);
        assert_eq!(
            state.next_due_at,
            Some(at_transition + Duration::minutes(15))
        );
    }

    #[test]
    fn test_future_anchor_is_taken_at_face_value() {
        // A backdated-to-the-future measurement time extends the countdown;
        // no clamping beyond the zero floor is applied.
        let patient = patient_in_labor(base());
        let mut measurements = vec![measurement(base() + Duration::minutes(5), None)];
        sort_latest_first(&mut measurements);

        let state = compute_timer_state(&patient, &measurements, base());
        assert_eq!(state.remaining_seconds, 35 * 60);
    }
}
