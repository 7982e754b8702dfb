//! Patient records and the labor status state machine.
//!
//! Status moves `NotStarted -> InProgress -> Completed`. The first recorded
//! measurement starts labor; completion is explicit and idempotent. There is
//! no path out of `Completed`.

use crate::error::{PartogramError, PartogramResult};
use chrono::{DateTime, NaiveDate, Utc};
use partogram_types::NonEmptyText;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Opaque patient identifier.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PatientId(Uuid);

impl PatientId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Parses an identifier from its wire form.
    pub fn parse(input: &str) -> PartogramResult<Self> {
        Uuid::parse_str(input)
            .map(Self)
            .map_err(|_| PartogramError::Validation(format!("invalid patient id: {input}")))
    }

    pub fn as_uuid(&self) -> Uuid {
        self.0
    }

    /// Shard prefixes for the file store layout: the first four hex
    /// characters of the id, split two and two.
    pub fn shard_prefixes(&self) -> (String, String) {
        let simple = self.0.simple().to_string();
        (simple[0..2].to_string(), simple[2..4].to_string())
    }
}

impl Default for PatientId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for PatientId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.simple())
    }
}

/// Labor status, modelled as a closed enum and matched exhaustively in the
/// period and timer logic.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LaborStatus {
    NotStarted,
    InProgress,
    Completed,
}

impl LaborStatus {
    /// Display color for the status badge on the list view.
    pub fn display_color(self) -> &'static str {
        match self {
            LaborStatus::NotStarted => "secondary",
            LaborStatus::InProgress => "danger",
            LaborStatus::Completed => "success",
        }
    }
}

impl std::fmt::Display for LaborStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let text = match self {
            LaborStatus::NotStarted => "labor not started",
            LaborStatus::InProgress => "in labor",
            LaborStatus::Completed => "labor completed",
        };
        write!(f, "{text}")
    }
}

/// Data required to admit a patient.
#[derive(Clone, Debug)]
pub struct NewPatient {
    pub full_name: NonEmptyText,
    pub admission_date: NaiveDate,
    pub history_number: Option<String>,
    pub parity: Option<u32>,
    pub age: Option<u32>,
    /// Gestational age in weeks.
    pub gestational_age: Option<u32>,
    pub membrane_rupture: Option<DateTime<Utc>>,
    pub risk_factors: Option<String>,
    pub notes: Option<String>,
}

impl NewPatient {
    /// Minimal admission: name and admission date only.
    pub fn new(full_name: NonEmptyText, admission_date: NaiveDate) -> Self {
        Self {
            full_name,
            admission_date,
            history_number: None,
            parity: None,
            age: None,
            gestational_age: None,
            membrane_rupture: None,
            risk_factors: None,
            notes: None,
        }
    }
}

/// Demographic fields that may change after admission.
///
/// `status` and `labor_start` are deliberately absent: they move only
/// through the labor state machine.
#[derive(Clone, Debug, Default)]
pub struct PatientUpdate {
    pub full_name: Option<NonEmptyText>,
    pub admission_date: Option<NaiveDate>,
    pub history_number: Option<String>,
    pub parity: Option<u32>,
    pub age: Option<u32>,
    pub gestational_age: Option<u32>,
    pub membrane_rupture: Option<DateTime<Utc>>,
    pub risk_factors: Option<String>,
    pub notes: Option<String>,
}

/// An admitted patient.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Patient {
    pub id: PatientId,
    pub full_name: String,
    pub admission_date: NaiveDate,
    pub status: LaborStatus,
    /// Set exactly once, when labor starts. Present iff status is
    /// `InProgress` or `Completed`.
    pub labor_start: Option<DateTime<Utc>>,
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
    pub created_at: DateTime<Utc>,
}

impl Patient {
    /// Creates a newly admitted patient with labor not yet started.
    pub fn admit(new_patient: NewPatient, admitted_at: DateTime<Utc>) -> Self {
        Self {
            id: PatientId::new(),
            full_name: new_patient.full_name.into_string(),
            admission_date: new_patient.admission_date,
            status: LaborStatus::NotStarted,
            labor_start: None,
            history_number: new_patient.history_number,
            parity: new_patient.parity,
            age: new_patient.age,
            gestational_age: new_patient.gestational_age,
            membrane_rupture: new_patient.membrane_rupture,
            risk_factors: new_patient.risk_factors,
            notes: new_patient.notes,
            created_at: admitted_at,
        }
    }

    /// Starts labor if it has not started yet, setting `labor_start` to the
    /// triggering action's timestamp. Returns whether this call performed
    /// the promotion.
    ///
    /// Callers must hold the store's exclusive section so promotion happens
    /// at most once under concurrent first measurements.
    pub fn start_labor(&mut self, at: DateTime<Utc>) -> bool {
        match self.status {
            LaborStatus::NotStarted => {
                self.status = LaborStatus::InProgress;
                self.labor_start = Some(at);
                true
            }
            LaborStatus::InProgress | LaborStatus::Completed => false,
        }
    }

    /// Completes labor.
    ///
    /// Idempotent from `Completed`. Rejected from `NotStarted`, which has no
    /// clinical meaning.
    pub fn complete_labor(&mut self) -> PartogramResult<()> {
        match self.status {
            LaborStatus::InProgress => {
                self.status = LaborStatus::Completed;
                Ok(())
            }
            LaborStatus::Completed => Ok(()),
            LaborStatus::NotStarted => Err(PartogramError::InvalidTransition(
                "cannot complete labor that has not started",
            )),
        }
    }

    /// Whether the patient can accept new measurements.
    pub fn accepts_measurements(&self) -> bool {
        self.status != LaborStatus::Completed
    }

    /// Applies a demographic update. Fields left as `None` keep their
    /// current value.
    pub fn apply_update(&mut self, update: PatientUpdate) {
        if let Some(full_name) = update.full_name {
            self.full_name = full_name.into_string();
        }
        if let Some(admission_date) = update.admission_date {
            self.admission_date = admission_date;
        }
        if let Some(history_number) = update.history_number {
            self.history_number = Some(history_number);
        }
        if let Some(parity) = update.parity {
            self.parity = Some(parity);
        }
        if let Some(age) = update.age {
            self.age = Some(age);
        }
        if let Some(gestational_age) = update.gestational_age {
            self.gestational_age = Some(gestational_age);
        }
        if let Some(membrane_rupture) = update.membrane_rupture {
            self.membrane_rupture = Some(membrane_rupture);
        }
        if let Some(risk_factors) = update.risk_factors {
            self.risk_factors = Some(risk_factors);
        }
        if let Some(notes) = update.notes {
            self.notes = Some(notes);
        }
    }
}
