//! # Partogram Core
//!
//! Core business logic for the maternity-ward labor timer:
//! - Labor period classification from partogram measurements
//! - Derived, never-persisted timer state
//! - The `NotStarted -> InProgress -> Completed` labor state machine
//! - Patient/measurement stores (in-memory and JSON file-backed)
//!
//! **No API concerns**: HTTP servers and wire handling belong in `api-rest`;
//! the polling/reconciliation client belongs in `partogram-client`.

pub mod clock;
pub mod config;
pub mod error;
pub mod labor;
pub mod measurement;
pub mod patient;
pub mod period;
pub mod query;
pub mod store;
pub mod timer;
pub mod wire;

pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{backdate_policy_from_env_value, BackdatePolicy, CoreConfig};
pub use error::{PartogramError, PartogramResult};
pub use labor::{LaborService, MeasurementOutcome};
pub use measurement::{Measurement, MeasurementId, NewMeasurement};
pub use patient::{LaborStatus, NewPatient, Patient, PatientId, PatientUpdate};
pub use period::{classify_period, LaborPeriod};
pub use query::{PatientFilter, PatientTimerView, TimerQueryService};
pub use store::{FileStore, LaborSnapshot, LaborStore, MemoryStore, RecordedMeasurement};
pub use timer::{compute_timer_state, TimerState};

/// Default on-disk location for patient records.
pub const DEFAULT_DATA_DIR: &str = "/partogram_data";
