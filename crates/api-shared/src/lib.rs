//! # API Shared
//!
//! Wire types shared across the partogram APIs.
//!
//! Contains:
//! - Request/response DTOs for the REST surface (`serde` + OpenAPI schemas)
//! - Shared services like `HealthService`
//!
//! Used by `partogram-core` (which converts domain types into these DTOs),
//! `api-rest` (which serves them) and `partogram-client` (which polls them).

pub mod health;

pub use health::HealthService;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Labor status as it appears on the wire.
///
/// The domain-side enum lives in `partogram-core`; this mirror exists so the
/// sync client and CLI can speak the protocol without pulling in the domain
/// crate.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum LaborStatus {
    NotStarted,
    InProgress,
    Completed,
}

/// Health check response.
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct HealthRes {
    pub ok: bool,
    pub message: String,
}

/// Current server time, as seconds since the Unix epoch.
///
/// Clients may use this to estimate clock skew for display purposes;
/// `remaining_seconds` from the timer endpoints stays authoritative.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, ToSchema)]
pub struct ServerTimeRes {
    pub time: i64,
}

/// A patient record as returned by the list and detail endpoints.
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct PatientRes {
    pub id: String,
    pub full_name: String,
    pub admission_date: NaiveDate,
    pub status: LaborStatus,
    /// Display color for the status badge (`secondary`/`danger`/`success`).
    pub status_color: String,
    pub labor_start: Option<DateTime<Utc>>,
    pub history_number: Option<String>,
    pub parity: Option<u32>,
    pub age: Option<u32>,
    /// Gestational age in weeks.
    pub gestational_age: Option<u32>,
    pub membrane_rupture: Option<DateTime<Utc>>,
    pub risk_factors: Option<String>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// List of patients, with embedded timer summaries.
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct PatientsRes {
    pub patients: Vec<PatientTimerEntry>,
}

/// Server-computed timer state for a single patient.
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct TimerStateRes {
    pub status: LaborStatus,
    /// Labor period, 1 or 2.
    pub period: u8,
    /// Seconds until the next mandatory measurement is due, floored at 0.
    pub remaining_seconds: i64,
    /// Measurement cadence for the current period: 30 for period 1, 15 for period 2.
    pub interval_minutes: i64,
    pub last_measurement_time: Option<DateTime<Utc>>,
    pub next_measurement_time: Option<DateTime<Utc>>,
}

/// One row of the bulk timer query used by the patient list view.
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct PatientTimerEntry {
    pub patient_id: String,
    pub full_name: String,
    pub admission_date: NaiveDate,
    pub status: LaborStatus,
    pub status_color: String,
    pub period: u8,
    pub remaining_seconds: i64,
    pub interval_minutes: i64,
    pub last_measurement_time: Option<DateTime<Utc>>,
}

/// Bulk timer states for every patient, for the list view.
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct TimerStatesRes {
    pub states: Vec<PatientTimerEntry>,
}

/// Request body for admitting a patient.
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct AdmitPatientReq {
    pub full_name: String,
    pub admission_date: NaiveDate,
    #[serde(default)]
    pub history_number: Option<String>,
    #[serde(default)]
    pub parity: Option<u32>,
    #[serde(default)]
    pub age: Option<u32>,
    #[serde(default)]
    pub gestational_age: Option<u32>,
    #[serde(default)]
    pub membrane_rupture: Option<DateTime<Utc>>,
    #[serde(default)]
    pub risk_factors: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
}

/// Request body for updating a patient's demographic fields.
///
/// Status and labor start are never writable through this request; they
/// change only through the labor state machine.
#[derive(Clone, Debug, Default, Serialize, Deserialize, ToSchema)]
pub struct UpdatePatientReq {
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default)]
    pub admission_date: Option<NaiveDate>,
    #[serde(default)]
    pub history_number: Option<String>,
    #[serde(default)]
    pub parity: Option<u32>,
    #[serde(default)]
    pub age: Option<u32>,
    #[serde(default)]
    pub gestational_age: Option<u32>,
    #[serde(default)]
    pub membrane_rupture: Option<DateTime<Utc>>,
    #[serde(default)]
    pub risk_factors: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
}

/// Request body for recording a partogram measurement.
///
/// All clinical fields are optional; `time` defaults to the server's clock
/// when omitted.
#[derive(Clone, Debug, Default, Serialize, Deserialize, ToSchema)]
pub struct RecordMeasurementReq {
    #[serde(default)]
    pub time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub cervical_dilation: Option<i32>,
    #[serde(default)]
    pub fetal_heart_rate: Option<i32>,
    #[serde(default)]
    pub maternal_pulse: Option<i32>,
    #[serde(default)]
    pub temperature: Option<f64>,
    #[serde(default)]
    pub blood_pressure: Option<String>,
    #[serde(default)]
    pub decelerations: Option<String>,
    #[serde(default)]
    pub amniotic_fluid: Option<String>,
    #[serde(default)]
    pub presentation: Option<String>,
    #[serde(default)]
    pub caput: Option<String>,
    #[serde(default)]
    pub molding: Option<String>,
    #[serde(default)]
    pub head_descent: Option<i32>,
    #[serde(default)]
    pub urination: Option<bool>,
    #[serde(default)]
    pub pushing: Option<bool>,
    #[serde(default)]
    pub contraction_frequency: Option<i32>,
    #[serde(default)]
    pub contraction_duration: Option<i32>,
    #[serde(default)]
    pub oxytocin: Option<String>,
    #[serde(default)]
    pub medications: Option<String>,
    #[serde(default)]
    pub iv_fluids: Option<String>,
}

/// Response to a recorded measurement: the freshly recomputed timer state.
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct RecordMeasurementRes {
    pub measurement_id: String,
    /// Whether this measurement started labor (NotStarted -> InProgress).
    pub labor_started: bool,
    pub status: LaborStatus,
    pub period: u8,
    pub interval_minutes: i64,
    pub remaining_seconds: i64,
    pub next_measurement_time: Option<DateTime<Utc>>,
}

/// Response to completing labor.
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct CompleteLaborRes {
    pub success: bool,
    pub status: LaborStatus,
    pub status_color: String,
}

/// A stored partogram measurement.
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct MeasurementRes {
    pub id: String,
    pub time: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub cervical_dilation: Option<u8>,
    pub fetal_heart_rate: Option<u16>,
    pub maternal_pulse: Option<u16>,
    pub temperature: Option<f64>,
    pub blood_pressure: Option<String>,
    pub decelerations: Option<String>,
    pub amniotic_fluid: Option<String>,
    pub presentation: Option<String>,
    pub caput: Option<String>,
    pub molding: Option<String>,
    pub head_descent: Option<u8>,
    pub urination: Option<bool>,
    pub pushing: Option<bool>,
    pub contraction_frequency: Option<u32>,
    pub contraction_duration: Option<u32>,
    pub oxytocin: Option<String>,
    pub medications: Option<String>,
    pub iv_fluids: Option<String>,
}

/// A patient's measurement history, most recent first.
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct MeasurementsRes {
    pub measurements: Vec<MeasurementRes>,
}

/// Error payload for 4xx responses.
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorRes {
    pub error: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_labor_status_wire_format() {
        assert_eq!(
            serde_json::to_string(&LaborStatus::NotStarted).unwrap(),
            "\"not_started\""
        );
        assert_eq!(
            serde_json::to_string(&LaborStatus::InProgress).unwrap(),
            "\"in_progress\""
        );
        assert_eq!(
            serde_json::to_string(&LaborStatus::Completed).unwrap(),
            "\"completed\""
        );
    }

    #[test]
    fn test_timer_state_res_shape() {
        let state = TimerStateRes {
            status: LaborStatus::InProgress,
            period: 1,
            remaining_seconds: 1800,
            interval_minutes: 30,
            last_measurement_time: None,
            next_measurement_time: None,
        };
        let value: serde_json::Value =
            serde_json::from_str(&serde_json::to_string(&state).unwrap()).unwrap();
        assert_eq!(value["status"], "in_progress");
        assert_eq!(value["period"], 1);
        assert_eq!(value["remaining_seconds"], 1800);
        assert_eq!(value["interval_minutes"], 30);
    }

    #[test]
    fn test_record_measurement_req_defaults() {
        let req: RecordMeasurementReq = serde_json::from_str("{}").unwrap();
        assert!(req.time.is_none());
        assert!(req.cervical_dilation.is_none());
        assert!(req.fetal_heart_rate.is_none());
    }
}
