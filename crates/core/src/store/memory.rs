//! In-memory store.
//!
//! The default store for tests and embedded use. All operations take the
//! same `RwLock`, which is what makes `record_measurement` atomic.

use super::{LaborSnapshot, LaborStore, RecordedMeasurement};
use crate::error::{PartogramError, PartogramResult};
use crate::measurement::{sort_latest_first, Measurement, MeasurementId, NewMeasurement};
use crate::patient::{NewPatient, Patient, PatientId, PatientUpdate};
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::RwLock;

#[derive(Debug)]
struct PatientRecord {
    patient: Patient,
    /// Kept sorted most-recent-first.
    measurements: Vec<Measurement>,
}

/// Thread-safe in-memory [`LaborStore`].
#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: RwLock<HashMap<PatientId, PatientRecord>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl LaborStore for MemoryStore {
    fn admit(
        &self,
        new_patient: NewPatient,
        admitted_at: DateTime<Utc>,
    ) -> PartogramResult<Patient> {
        let patient = Patient::admit(new_patient, admitted_at);
        let mut inner = self.inner.write().expect("store lock poisoned");
        inner.insert(
            patient.id,
            PatientRecord {
                patient: patient.clone(),
                measurements: Vec::new(),
            },
        );
        Ok(patient)
    }

    fn patient(&self, patient_id: PatientId) -> PartogramResult<Patient> {
        let inner = self.inner.read().expect("store lock poisoned");
        inner
            .get(&patient_id)
            .map(|record| record.patient.clone())
            .ok_or(PartogramError::PatientNotFound(patient_id))
    }

    fn list_patients(&self) -> PartogramResult<Vec<Patient>> {
        let inner = self.inner.read().expect("store lock poisoned");
        Ok(inner.values().map(|record| record.patient.clone()).collect())
    }

    fn update_patient(
        &self,
        patient_id: PatientId,
        update: PatientUpdate,
    ) -> PartogramResult<Patient> {
        let mut inner = self.inner.write().expect("store lock poisoned");
        let record = inner
            .get_mut(&patient_id)
            .ok_or(PartogramError::PatientNotFound(patient_id))?;
        record.patient.apply_update(update);
        Ok(record.patient.clone())
    }

    fn delete_patient(&self, patient_id: PatientId) -> PartogramResult<()> {
        let mut inner = self.inner.write().expect("store lock poisoned");
        inner
            .remove(&patient_id)
            .map(|_| ())
            .ok_or(PartogramError::PatientNotFound(patient_id))
    }

    fn record_measurement(
        &self,
        patient_id: PatientId,
        draft: NewMeasurement,
        recorded_at: DateTime<Utc>,
    ) -> PartogramResult<RecordedMeasurement> {
        let mut inner = self.inner.write().expect("store lock poisoned");
        let record = inner
            .get_mut(&patient_id)
            .ok_or(PartogramError::PatientNotFound(patient_id))?;

        if !record.patient.accepts_measurements() {
            return Err(PartogramError::InvalidTransition(
                "completed patients do not accept new measurements",
            ));
        }

        let labor_started = record.patient.start_labor(recorded_at);
        let measurement = Measurement::from_new(draft, MeasurementId::new(), recorded_at);
        record.measurements.push(measurement.clone());
        sort_latest_first(&mut record.measurements);

        Ok(RecordedMeasurement {
            patient: record.patient.clone(),
            measurement,
            labor_started,
        })
    }

    fn complete_labor(&self, patient_id: PatientId) -> PartogramResult<Patient> {
        let mut inner = self.inner.write().expect("store lock poisoned");
        let record = inner
            .get_mut(&patient_id)
            .ok_or(PartogramError::PatientNotFound(patient_id))?;
        record.patient.complete_labor()?;
        Ok(record.patient.clone())
    }

    fn delete_measurement(
        &self,
        patient_id: PatientId,
        measurement_id: MeasurementId,
    ) -> PartogramResult<()> {
        let mut inner = self.inner.write().expect("store lock poisoned");
        let record = inner
            .get_mut(&patient_id)
            .ok_or(PartogramError::PatientNotFound(patient_id))?;

        let before = record.measurements.len();
        record.measurements.retain(|m| m.id != measurement_id);
        if record.measurements.len() == before {
            return Err(PartogramError::MeasurementNotFound(measurement_id));
        }
        Ok(())
    }

    fn snapshot(&self, patient_id: PatientId) -> PartogramResult<LaborSnapshot> {
        let inner = self.inner.read().expect("store lock poisoned");
        let record = inner
            .get(&patient_id)
            .ok_or(PartogramError::PatientNotFound(patient_id))?;
        Ok(LaborSnapshot {
            patient: record.patient.clone(),
            measurements: record.measurements.clone(),
        })
    }

    fn snapshot_all(&self) -> PartogramResult<Vec<LaborSnapshot>> {
        let inner = self.inner.read().expect("store lock poisoned");
        Ok(inner
            .values()
            .map(|record| LaborSnapshot {
                patient: record.patient.clone(),
                measurements: record.measurements.clone(),
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, TimeZone};
    use partogram_types::NonEmptyText;
    use std::sync::Arc;

    fn base() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap()
    }

    fn admit(store: &MemoryStore) -> Patient {
        store
            .admit(
                NewPatient::new(
                    NonEmptyText::new("Ivanova A.P.").unwrap(),
                    NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
                ),
                base(),
            )
            .expect("admit should succeed")
    }

    #[test]
    fn test_record_measurement_starts_labor_once() {
        let store = MemoryStore::new();
        let patient = admit(&store);

        let first = store
            .record_measurement(patient.id, NewMeasurement::at(base()), base())
            .expect("first measurement should succeed");
        assert!(first.labor_started);
        assert_eq!(first.patient.labor_start, Some(base()));

        let later = base() + chrono::Duration::minutes(20);
        let second = store
            .record_measurement(patient.id, NewMeasurement::at(later), later)
            .expect("second measurement should succeed");
        assert!(!second.labor_started);
        assert_eq!(second.patient.labor_start, Some(base()), "labor_start must not move");
    }

    #[test]
    fn test_record_measurement_rejects_completed_patient() {
        let store = MemoryStore::new();
        let patient = admit(&store);
        store
            .record_measurement(patient.id, NewMeasurement::at(base()), base())
            .unwrap();
        store.complete_labor(patient.id).unwrap();

        let err = store
            .record_measurement(patient.id, NewMeasurement::at(base()), base())
            .expect_err("completed patient should reject measurements");
        assert!(matches!(err, PartogramError::InvalidTransition(_)));

        let snapshot = store.snapshot(patient.id).unwrap();
        assert_eq!(snapshot.measurements.len(), 1, "nothing must be persisted");
    }

    #[test]
    fn test_record_measurement_unknown_patient() {
        let store = MemoryStore::new();
        let err = store
            .record_measurement(PatientId::new(), NewMeasurement::at(base()), base())
            .expect_err("unknown patient should be rejected");
        assert!(matches!(err, PartogramError::PatientNotFound(_)));
    }

    #[test]
    fn test_concurrent_first_measurements_promote_once() {
        let store = Arc::new(MemoryStore::new());
        let patient = admit(&store);

        let mut handles = Vec::new();
        for i in 0..8 {
            let store = Arc::clone(&store);
            let at = base() + chrono::Duration::seconds(i);
            handles.push(std::thread::spawn(move || {
                store
                    .record_measurement(patient.id, NewMeasurement::at(at), at)
                    .expect("racing measurement should succeed")
                    .labor_started
            }));
        }

        let promotions: usize = handles
            .into_iter()
            .map(|h| h.join().expect("thread should not panic"))
            .filter(|started| *started)
            .count();
        assert_eq!(promotions, 1, "exactly one racer performs the promotion");

        let snapshot = store.snapshot(patient.id).unwrap();
        assert_eq!(snapshot.measurements.len(), 8);
        assert!(snapshot.patient.labor_start.is_some());
    }

    #[test]
    fn test_delete_measurement_changes_latest() {
        let store = MemoryStore::new();
        let patient = admit(&store);
        store
            .record_measurement(patient.id, NewMeasurement::at(base()), base())
            .unwrap();
        let latest = store
            .record_measurement(
                patient.id,
                NewMeasurement::at(base() + chrono::Duration::minutes(10)),
                base() + chrono::Duration::minutes(10),
            )
            .unwrap();

        store
            .delete_measurement(patient.id, latest.measurement.id)
            .expect("delete should succeed");

        let snapshot = store.snapshot(patient.id).unwrap();
        assert_eq!(snapshot.measurements.len(), 1);
        assert_eq!(snapshot.measurements[0].time, base());
    }

    #[test]
    fn test_delete_patient_cascades_measurements() {
        let store = MemoryStore::new();
        let patient = admit(&store);
        store
            .record_measurement(patient.id, NewMeasurement::at(base()), base())
            .unwrap();

        store.delete_patient(patient.id).expect("delete should succeed");

        let err = store.snapshot(patient.id).expect_err("patient should be gone");
        assert!(matches!(err, PartogramError::PatientNotFound(_)));
    }
}
