//! Labor service: the mutating half of the subsystem.
//!
//! Owns admission, measurement recording (which may start labor),
//! completion and deletions. All writes go through the store's atomic
//! operations; after each measurement the timer state is recomputed fresh
//! so callers get the countdown the wire contract promises.

use crate::clock::Clock;
use crate::config::{BackdatePolicy, CoreConfig};
use crate::error::{PartogramError, PartogramResult};
use crate::measurement::{Measurement, MeasurementId, NewMeasurement};
use crate::patient::{NewPatient, Patient, PatientId, PatientUpdate};
use crate::store::LaborStore;
use crate::timer::{compute_timer_state, TimerState};
use std::sync::Arc;

/// Result of recording a measurement: the stored entry plus the freshly
/// derived timer state.
#[derive(Clone, Debug)]
pub struct MeasurementOutcome {
    pub patient: Patient,
    pub measurement: Measurement,
    /// Whether this measurement started labor.
    pub labor_started: bool,
    pub timer: TimerState,
}

/// Mutating operations on patients and measurements.
#[derive(Clone)]
pub struct LaborService {
    store: Arc<dyn LaborStore>,
    clock: Arc<dyn Clock>,
    cfg: Arc<CoreConfig>,
}

impl LaborService {
    pub fn new(store: Arc<dyn LaborStore>, clock: Arc<dyn Clock>, cfg: Arc<CoreConfig>) -> Self {
        Self { store, clock, cfg }
    }

    /// Admits a patient. Labor is not started.
    pub fn admit_patient(&self, new_patient: NewPatient) -> PartogramResult<Patient> {
        let patient = self.store.admit(new_patient, self.clock.now())?;
        tracing::info!(patient_id = %patient.id, "patient admitted");
        Ok(patient)
    }

    /// Applies a demographic update.
    pub fn update_patient(
        &self,
        patient_id: PatientId,
        update: PatientUpdate,
    ) -> PartogramResult<Patient> {
        self.store.update_patient(patient_id, update)
    }

    /// Deletes a patient and their full measurement history.
    pub fn delete_patient(&self, patient_id: PatientId) -> PartogramResult<()> {
        self.store.delete_patient(patient_id)?;
        tracing::info!(patient_id = %patient_id, "patient deleted");
        Ok(())
    }

    /// Records a partogram measurement.
    ///
    /// On a `NotStarted` patient this starts labor, stamping `labor_start`
    /// with the service clock. A `Completed` patient rejects the entry.
    /// The returned timer state is recomputed from the post-write snapshot.
    pub fn record_measurement(
        &self,
        patient_id: PatientId,
        draft: NewMeasurement,
    ) -> PartogramResult<MeasurementOutcome> {
        if self.cfg.backdate_policy() == BackdatePolicy::Reject {
            let snapshot = self.store.snapshot(patient_id)?;
            if let Some(latest) = snapshot.measurements.first() {
                if draft.time < latest.time {
                    return Err(PartogramError::Validation(format!(
                        "measurement time {} predates the latest recorded entry at {}",
                        draft.time, latest.time
                    )));
                }
            }
        }

        let recorded = self
            .store
            .record_measurement(patient_id, draft, self.clock.now())?;
        if recorded.labor_started {
            tracing::info!(patient_id = %patient_id, "labor started by first measurement");
        }

        let snapshot = self.store.snapshot(patient_id)?;
        let timer = compute_timer_state(&snapshot.patient, &snapshot.measurements, self.clock.now());

        Ok(MeasurementOutcome {
            patient: snapshot.patient,
            measurement: recorded.measurement,
            labor_started: recorded.labor_started,
            timer,
        })
    }

    /// Completes labor. Idempotent on an already-completed patient;
    /// rejected before labor has started.
    pub fn complete_labor(&self, patient_id: PatientId) -> PartogramResult<Patient> {
        let patient = self.store.complete_labor(patient_id)?;
        tracing::info!(patient_id = %patient_id, "labor completed");
        Ok(patient)
    }

    /// Removes a single measurement. Subsequent timer queries recompute
    /// against the new latest entry (or `labor_start`) automatically.
    pub fn delete_measurement(
        &self,
        patient_id: PatientId,
        measurement_id: MeasurementId,
    ) -> PartogramResult<()> {
        self.store.delete_measurement(patient_id, measurement_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::patient::LaborStatus;
    use crate::period::LaborPeriod;
    use crate::store::MemoryStore;
    use chrono::{DateTime, Duration, NaiveDate, TimeZone, Utc};
    use partogram_types::{CervicalDilation, NonEmptyText};

    fn base() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap()
    }

    fn service_with(policy: BackdatePolicy) -> (LaborService, ManualClock) {
        let clock = ManualClock::new(base());
        let cfg = Arc::new(
            CoreConfig::new("/partogram_data".into(), policy).expect("config should build"),
        );
        let service = LaborService::new(
            Arc::new(MemoryStore::new()),
            Arc::new(clock.clone()),
            cfg,
        );
        (service, clock)
    }

    fn admit(service: &LaborService) -> Patient {
        service
            .admit_patient(NewPatient::new(
                NonEmptyText::new("Ivanova A.P.").unwrap(),
                NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
            ))
            .expect("admit should succeed")
    }

    fn dilation_draft(time: DateTime<Utc>, cm: i64) -> NewMeasurement {
        let mut draft = NewMeasurement::at(time);
        draft.cervical_dilation = Some(CervicalDilation::new(cm).unwrap());
        draft
    }

    #[test]
    fn test_first_measurement_starts_labor_at_action_time() {
        let (service, clock) = service_with(BackdatePolicy::Accept);
        let patient = admit(&service);

        // The measurement is backdated; labor_start must use the clock, not
        // the measurement's own time.
        clock.advance(Duration::minutes(5));
        let action_time = clock.now();
        let outcome = service
            .record_measurement(patient.id, dilation_draft(base(), 4))
            .expect("record should succeed");

        assert!(outcome.labor_started);
        assert_eq!(outcome.patient.status, LaborStatus::InProgress);
        assert_eq!(outcome.patient.labor_start, Some(action_time));
    }

    #[test]
    fn test_second_measurement_keeps_labor_start() {
        let (service, clock) = service_with(BackdatePolicy::Accept);
        let patient = admit(&service);

        let first = service
            .record_measurement(patient.id, dilation_draft(clock.now(), 4))
            .unwrap();
        clock.advance(Duration::minutes(10));
        let second = service
            .record_measurement(patient.id, dilation_draft(clock.now(), 5))
            .unwrap();

        assert!(!second.labor_started);
        assert_eq!(second.patient.labor_start, first.patient.labor_start);
    }

    #[test]
    fn test_period_transition_scenario() {
        let (service, clock) = service_with(BackdatePolicy::Accept);
        let patient = admit(&service);

        // T0: 8 cm. Period one, 30-minute cadence, full countdown ahead.
        let outcome = service
            .record_measurement(patient.id, dilation_draft(clock.now(), 8))
            .expect("record should succeed");
        assert_eq!(outcome.timer.period, LaborPeriod::First);
        assert_eq!(outcome.timer.interval_minutes, 30);
        assert_eq!(outcome.timer.remaining_seconds, 1800);

        // T0+31min: 10 cm. Period two, 15-minute cadence anchored here.
        clock.advance(Duration::minutes(31));
        let outcome = service
            .record_measurement(patient.id, dilation_draft(clock.now(), 10))
            .expect("record should succeed");
        assert_eq!(outcome.timer.period, LaborPeriod::Second);
        assert_eq!(outcome.timer.interval_minutes, 15);
        assert_eq!(outcome.timer.remaining_seconds, 900);
        assert_eq!(
            outcome.timer.next_due_at,
            Some(clock.now() + Duration::minutes(15))
        );
    }

    #[test]
    fn test_completion_blocks_further_measurements() {
        let (service, clock) = service_with(BackdatePolicy::Accept);
        let patient = admit(&service);
        service
            .record_measurement(patient.id, dilation_draft(clock.now(), 4))
            .unwrap();

        service.complete_labor(patient.id).expect("completion should succeed");

        let err = service
            .record_measurement(patient.id, dilation_draft(clock.now(), 5))
            .expect_err("completed patient should reject measurements");
        assert!(matches!(err, PartogramError::InvalidTransition(_)));
    }

    #[test]
    fn test_completion_is_idempotent() {
        let (service, clock) = service_with(BackdatePolicy::Accept);
        let patient = admit(&service);
        service
            .record_measurement(patient.id, dilation_draft(clock.now(), 4))
            .unwrap();

        let first = service.complete_labor(patient.id).unwrap();
        let second = service
            .complete_labor(patient.id)
            .expect("repeat completion should be a no-op success");
        assert_eq!(first.status, LaborStatus::Completed);
        assert_eq!(second.status, LaborStatus::Completed);
    }

    #[test]
    fn test_completion_rejected_before_labor() {
        let (service, _clock) = service_with(BackdatePolicy::Accept);
        let patient = admit(&service);

        let err = service
            .complete_labor(patient.id)
            .expect_err("completing unstarted labor should fail");
        assert!(matches!(err, PartogramError::InvalidTransition(_)));
    }

    #[test]
    fn test_backdate_policy_reject() {
        let (service, clock) = service_with(BackdatePolicy::Reject);
        let patient = admit(&service);

        service
            .record_measurement(patient.id, dilation_draft(clock.now(), 4))
            .unwrap();

        let backdated = clock.now() - Duration::minutes(10);
        let err = service
            .record_measurement(patient.id, dilation_draft(backdated, 5))
            .expect_err("backdated entry should be rejected");
        assert!(matches!(err, PartogramError::Validation(_)));
    }

    #[test]
    fn test_backdate_accepted_by_default() {
        let (service, clock) = service_with(BackdatePolicy::Accept);
        let patient = admit(&service);

        service
            .record_measurement(patient.id, dilation_draft(clock.now(), 4))
            .unwrap();

        let backdated = clock.now() - Duration::minutes(10);
        service
            .record_measurement(patient.id, dilation_draft(backdated, 5))
            .expect("backdated entry should be accepted at face value");
    }
}
