//! Patient and measurement storage.
//!
//! The timer subsystem does not own persistence; it talks to a
//! [`LaborStore`]. One trait covers both the patient and measurement
//! collaborators so the snapshot methods can hand the read path a patient
//! and its full history from the same consistent view, and so the
//! first-measurement promotion can be a single atomic operation.

mod fs;
mod memory;

pub use fs::FileStore;
pub use memory::MemoryStore;

use crate::error::PartogramResult;
use crate::measurement::{Measurement, MeasurementId, NewMeasurement};
use crate::patient::{NewPatient, Patient, PatientId, PatientUpdate};
use chrono::{DateTime, Utc};

/// A consistent view of one patient and their full measurement history,
/// ordered most-recent-first.
#[derive(Clone, Debug)]
pub struct LaborSnapshot {
    pub patient: Patient,
    pub measurements: Vec<Measurement>,
}

/// Result of recording a measurement.
#[derive(Clone, Debug)]
pub struct RecordedMeasurement {
    /// The patient after any status transition.
    pub patient: Patient,
    pub measurement: Measurement,
    /// Whether this measurement performed the `NotStarted -> InProgress`
    /// promotion.
    pub labor_started: bool,
}

/// Durable store for patients and their partogram measurements.
///
/// Implementations must make [`record_measurement`](LaborStore::record_measurement)
/// atomic: the status check, the possible labor-start promotion and the
/// measurement append happen under one exclusive section, so two racing
/// first measurements promote the patient exactly once.
pub trait LaborStore: Send + Sync {
    /// Creates a patient record. Labor is not started.
    fn admit(&self, new_patient: NewPatient, admitted_at: DateTime<Utc>)
        -> PartogramResult<Patient>;

    /// Reads a single patient.
    fn patient(&self, patient_id: PatientId) -> PartogramResult<Patient>;

    /// Lists all patients, in unspecified order.
    fn list_patients(&self) -> PartogramResult<Vec<Patient>>;

    /// Applies a demographic update.
    fn update_patient(
        &self,
        patient_id: PatientId,
        update: PatientUpdate,
    ) -> PartogramResult<Patient>;

    /// Deletes a patient and all of their measurements.
    fn delete_patient(&self, patient_id: PatientId) -> PartogramResult<()>;

    /// Appends a measurement, starting labor first if it has not started.
    ///
    /// Rejects a missing patient (`PatientNotFound`) and a completed one
    /// (`InvalidTransition`). On promotion, `labor_start` is set to
    /// `recorded_at` (the action's timestamp, not the measurement's own
    /// clinical `time`). A failed append must leave the status untouched.
    fn record_measurement(
        &self,
        patient_id: PatientId,
        draft: NewMeasurement,
        recorded_at: DateTime<Utc>,
    ) -> PartogramResult<RecordedMeasurement>;

    /// Applies the completion transition: idempotent from `Completed`,
    /// rejected from `NotStarted`.
    fn complete_labor(&self, patient_id: PatientId) -> PartogramResult<Patient>;

    /// Removes a single measurement.
    fn delete_measurement(
        &self,
        patient_id: PatientId,
        measurement_id: MeasurementId,
    ) -> PartogramResult<()>;

    /// Consistent read of one patient plus their history.
    fn snapshot(&self, patient_id: PatientId) -> PartogramResult<LaborSnapshot>;

    /// Consistent read of every patient plus their histories, loaded in one
    /// pass so the bulk timer query stays flat as the ward grows.
    fn snapshot_all(&self) -> PartogramResult<Vec<LaborSnapshot>>;
}
