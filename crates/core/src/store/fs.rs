//! JSON file-backed store.
//!
//! Records live in a sharded directory layout:
//!
//! ```text
//! <data_dir>/
//!   <s1>/
//!     <s2>/
//!       <patient-id>/
//!         patient.json
//!         measurements.json
//! ```
//!
//! where `s1`/`s2` are the first four hex characters of the patient id,
//! keeping directories small as the ward history grows. A coarse mutex
//! serialises all operations; the store assumes a single process owns the
//! data directory.

use super::{LaborSnapshot, LaborStore, RecordedMeasurement};
use crate::error::{PartogramError, PartogramResult};
use crate::measurement::{sort_latest_first, Measurement, MeasurementId, NewMeasurement};
use crate::patient::{NewPatient, Patient, PatientId, PatientUpdate};
use chrono::{DateTime, Utc};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

const PATIENT_FILE: &str = "patient.json";
const MEASUREMENTS_FILE: &str = "measurements.json";

/// File-backed [`LaborStore`].
#[derive(Debug)]
pub struct FileStore {
    data_dir: PathBuf,
    lock: Mutex<()>,
}

impl FileStore {
    /// Opens a store rooted at `data_dir`, creating the directory if needed.
    pub fn open(data_dir: impl Into<PathBuf>) -> PartogramResult<Self> {
        let data_dir = data_dir.into();
        fs::create_dir_all(&data_dir).map_err(PartogramError::StorageDirCreation)?;
        Ok(Self {
            data_dir,
            lock: Mutex::new(()),
        })
    }

    fn patient_dir(&self, patient_id: PatientId) -> PathBuf {
        let (s1, s2) = patient_id.shard_prefixes();
        self.data_dir.join(s1).join(s2).join(patient_id.to_string())
    }

    fn read_patient(&self, patient_id: PatientId) -> PartogramResult<Patient> {
        let path = self.patient_dir(patient_id).join(PATIENT_FILE);
        if !path.is_file() {
            return Err(PartogramError::PatientNotFound(patient_id));
        }
        let contents = fs::read_to_string(&path).map_err(PartogramError::FileRead)?;
        serde_json::from_str(&contents).map_err(PartogramError::Deserialization)
    }

    fn write_patient(&self, patient: &Patient) -> PartogramResult<()> {
        let dir = self.patient_dir(patient.id);
        fs::create_dir_all(&dir).map_err(PartogramError::StorageDirCreation)?;
        let json =
            serde_json::to_string_pretty(patient).map_err(PartogramError::Serialization)?;
        fs::write(dir.join(PATIENT_FILE), json).map_err(PartogramError::FileWrite)
    }

    fn read_measurements(&self, patient_id: PatientId) -> PartogramResult<Vec<Measurement>> {
        let path = self.patient_dir(patient_id).join(MEASUREMENTS_FILE);
        if !path.is_file() {
            return Ok(Vec::new());
        }
        let contents = fs::read_to_string(&path).map_err(PartogramError::FileRead)?;
        let mut measurements: Vec<Measurement> =
            serde_json::from_str(&contents).map_err(PartogramError::Deserialization)?;
        sort_latest_first(&mut measurements);
        Ok(measurements)
    }

    fn write_measurements(
        &self,
        patient_id: PatientId,
        measurements: &[Measurement],
    ) -> PartogramResult<()> {
        let dir = self.patient_dir(patient_id);
        fs::create_dir_all(&dir).map_err(PartogramError::StorageDirCreation)?;
        let json = serde_json::to_string_pretty(measurements)
            .map_err(PartogramError::Serialization)?;
        fs::write(dir.join(MEASUREMENTS_FILE), json).map_err(PartogramError::FileWrite)
    }

    /// Walks the sharded layout and returns every directory holding a
    /// `patient.json`.
    fn patient_dirs(&self) -> Vec<PathBuf> {
        let mut dirs = Vec::new();

        let s1_iter = match fs::read_dir(&self.data_dir) {
            Ok(it) => it,
            Err(_) => return dirs,
        };
        for s1 in s1_iter.flatten() {
            let s1_path = s1.path();
            if !s1_path.is_dir() {
                continue;
            }

            let s2_iter = match fs::read_dir(&s1_path) {
                Ok(it) => it,
                Err(_) => continue,
            };

            for s2 in s2_iter.flatten() {
                let s2_path = s2.path();
                if !s2_path.is_dir() {
                    continue;
                }

                let id_iter = match fs::read_dir(&s2_path) {
                    Ok(it) => it,
                    Err(_) => continue,
                };

                for id_ent in id_iter.flatten() {
                    let id_path = id_ent.path();
                    if id_path.is_dir() && id_path.join(PATIENT_FILE).is_file() {
                        dirs.push(id_path);
                    }
                }
            }
        }

        dirs
    }

    fn load_patient_from(path: &Path) -> Option<Patient> {
        let patient_path = path.join(PATIENT_FILE);
        let contents = fs::read_to_string(&patient_path).ok()?;
        match serde_json::from_str(&contents) {
            Ok(patient) => Some(patient),
            Err(e) => {
                tracing::warn!("failed to parse {}: {}", patient_path.display(), e);
                None
            }
        }
    }

    fn load_measurements_from(path: &Path) -> Vec<Measurement> {
        let measurements_path = path.join(MEASUREMENTS_FILE);
        if !measurements_path.is_file() {
            return Vec::new();
        }
        let contents = match fs::read_to_string(&measurements_path) {
            Ok(contents) => contents,
            Err(_) => return Vec::new(),
        };
        match serde_json::from_str::<Vec<Measurement>>(&contents) {
            Ok(mut measurements) => {
                sort_latest_first(&mut measurements);
                measurements
            }
            Err(e) => {
                tracing::warn!("failed to parse {}: {}", measurements_path.display(), e);
                Vec::new()
            }
        }
    }
}

impl LaborStore for FileStore {
    fn admit(
        &self,
        new_patient: NewPatient,
        admitted_at: DateTime<Utc>,
    ) -> PartogramResult<Patient> {
        let _guard = self.lock.lock().expect("store lock poisoned");
        let patient = Patient::admit(new_patient, admitted_at);
        self.write_patient(&patient)?;
        Ok(patient)
    }

    fn patient(&self, patient_id: PatientId) -> PartogramResult<Patient> {
        let _guard = self.lock.lock().expect("store lock poisoned");
        self.read_patient(patient_id)
    }

    fn list_patients(&self) -> PartogramResult<Vec<Patient>> {
        let _guard = self.lock.lock().expect("store lock poisoned");
        Ok(self
            .patient_dirs()
            .iter()
            .filter_map(|dir| Self::load_patient_from(dir))
            .collect())
    }

    fn update_patient(
        &self,
        patient_id: PatientId,
        update: PatientUpdate,
    ) -> PartogramResult<Patient> {
        let _guard = self.lock.lock().expect("store lock poisoned");
        let mut patient = self.read_patient(patient_id)?;
        patient.apply_update(update);
        self.write_patient(&patient)?;
        Ok(patient)
    }

    fn delete_patient(&self, patient_id: PatientId) -> PartogramResult<()> {
        let _guard = self.lock.lock().expect("store lock poisoned");
        let dir = self.patient_dir(patient_id);
        if !dir.join(PATIENT_FILE).is_file() {
            return Err(PartogramError::PatientNotFound(patient_id));
        }
        // Removes the whole record directory, cascading the measurements.
        fs::remove_dir_all(&dir).map_err(PartogramError::FileDelete)
    }

    fn record_measurement(
        &self,
        patient_id: PatientId,
        draft: NewMeasurement,
        recorded_at: DateTime<Utc>,
    ) -> PartogramResult<RecordedMeasurement> {
        let _guard = self.lock.lock().expect("store lock poisoned");
        let mut patient = self.read_patient(patient_id)?;

        if !patient.accepts_measurements() {
            return Err(PartogramError::InvalidTransition(
                "completed patients do not accept new measurements",
            ));
        }

        let labor_started = patient.start_labor(recorded_at);
        let measurement = Measurement::from_new(draft, MeasurementId::new(), recorded_at);

        let mut measurements = self.read_measurements(patient_id)?;
        measurements.push(measurement.clone());
        sort_latest_first(&mut measurements);

        // Write order: measurements before patient, so a failed append can
        // never leave a patient marked in progress with no durable entry.
        self.write_measurements(patient_id, &measurements)?;
        self.write_patient(&patient)?;

        Ok(RecordedMeasurement {
            patient,
            measurement,
            labor_started,
        })
    }

    fn complete_labor(&self, patient_id: PatientId) -> PartogramResult<Patient> {
        let _guard = self.lock.lock().expect("store lock poisoned");
        let mut patient = self.read_patient(patient_id)?;
        patient.complete_labor()?;
        self.write_patient(&patient)?;
        Ok(patient)
    }

    fn delete_measurement(
        &self,
        patient_id: PatientId,
        measurement_id: MeasurementId,
    ) -> PartogramResult<()> {
        let _guard = self.lock.lock().expect("store lock poisoned");
        // Ensure the patient exists before touching the history.
        self.read_patient(patient_id)?;

        let mut measurements = self.read_measurements(patient_id)?;
        let before = measurements.len();
        measurements.retain(|m| m.id != measurement_id);
        if measurements.len() == before {
            return Err(PartogramError::MeasurementNotFound(measurement_id));
        }
        self.write_measurements(patient_id, &measurements)
    }

    fn snapshot(&self, patient_id: PatientId) -> PartogramResult<LaborSnapshot> {
        let _guard = self.lock.lock().expect("store lock poisoned");
        let patient = self.read_patient(patient_id)?;
        let measurements = self.read_measurements(patient_id)?;
        Ok(LaborSnapshot {
            patient,
            measurements,
        })
    }

    fn snapshot_all(&self) -> PartogramResult<Vec<LaborSnapshot>> {
        let _guard = self.lock.lock().expect("store lock poisoned");
        Ok(self
            .patient_dirs()
            .iter()
            .filter_map(|dir| {
                let patient = Self::load_patient_from(dir)?;
                let measurements = Self::load_measurements_from(dir);
                Some(LaborSnapshot {
                    patient,
                    measurements,
                })
            })
            .collect())
    }
}
