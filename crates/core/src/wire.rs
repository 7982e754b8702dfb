//! Conversions from domain types to the shared wire DTOs.
//!
//! Keeps the REST layer thin: handlers fetch domain values and hand them to
//! these impls for serialization.

use crate::labor::MeasurementOutcome;
use crate::measurement::Measurement;
use crate::patient::{LaborStatus, Patient};
use crate::query::PatientTimerView;

impl From<LaborStatus> for api_shared::LaborStatus {
    fn from(status: LaborStatus) -> Self {
        match status {
            LaborStatus::NotStarted => api_shared::LaborStatus::NotStarted,
            LaborStatus::InProgress => api_shared::LaborStatus::InProgress,
            LaborStatus::Completed => api_shared::LaborStatus::Completed,
        }
    }
}

impl From<api_shared::LaborStatus> for LaborStatus {
    fn from(status: api_shared::LaborStatus) -> Self {
        match status {
            api_shared::LaborStatus::NotStarted => LaborStatus::NotStarted,
            api_shared::LaborStatus::InProgress => LaborStatus::InProgress,
            api_shared::LaborStatus::Completed => LaborStatus::Completed,
        }
    }
}

impl From<&Patient> for api_shared::PatientRes {
    fn from(patient: &Patient) -> Self {
        api_shared::PatientRes {
            id: patient.id.to_string(),
            full_name: patient.full_name.clone(),
            admission_date: patient.admission_date,
            status: patient.status.into(),
            status_color: patient.status.display_color().to_string(),
            labor_start: patient.labor_start,
            history_number: patient.history_number.clone(),
            parity: patient.parity,
            age: patient.age,
            gestational_age: patient.gestational_age,
            membrane_rupture: patient.membrane_rupture,
            risk_factors: patient.risk_factors.clone(),
            notes: patient.notes.clone(),
            created_at: patient.created_at,
        }
    }
}

impl From<&Measurement> for api_shared::MeasurementRes {
    fn from(measurement: &Measurement) -> Self {
        api_shared::MeasurementRes {
            id: measurement.id.to_string(),
            time: measurement.time,
            created_at: measurement.created_at,
            cervical_dilation: measurement.cervical_dilation.map(|d| d.cm()),
            fetal_heart_rate: measurement.fetal_heart_rate.map(|r| r.bpm()),
            maternal_pulse: measurement.maternal_pulse.map(|p| p.bpm()),
            temperature: measurement.temperature.map(|t| t.celsius()),
            blood_pressure: measurement.blood_pressure.clone(),
            decelerations: measurement.decelerations.clone(),
            amniotic_fluid: measurement.amniotic_fluid.clone(),
            presentation: measurement.presentation.clone(),
            caput: measurement.caput.clone(),
            molding: measurement.molding.clone(),
            head_descent: measurement.head_descent,
            urination: measurement.urination,
            pushing: measurement.pushing,
            contraction_frequency: measurement.contraction_frequency,
            contraction_duration: measurement.contraction_duration,
            oxytocin: measurement.oxytocin.clone(),
            medications: measurement.medications.clone(),
            iv_fluids: measurement.iv_fluids.clone(),
        }
    }
}

impl From<&PatientTimerView> for api_shared::TimerStateRes {
    fn from(view: &PatientTimerView) -> Self {
        api_shared::TimerStateRes {
            status: view.timer.status.into(),
            period: view.timer.period.number(),
            remaining_seconds: view.timer.remaining_seconds,
            interval_minutes: view.timer.interval_minutes,
            last_measurement_time: view.timer.last_measurement_time,
            next_measurement_time: view.timer.next_due_at,
        }
    }
}

impl From<&PatientTimerView> for api_shared::PatientTimerEntry {
    fn from(view: &PatientTimerView) -> Self {
        api_shared::PatientTimerEntry {
            patient_id: view.patient.id.to_string(),
            full_name: view.patient.full_name.clone(),
            admission_date: view.patient.admission_date,
            status: view.timer.status.into(),
            status_color: view.timer.status.display_color().to_string(),
            period: view.timer.period.number(),
            remaining_seconds: view.timer.remaining_seconds,
            interval_minutes: view.timer.interval_minutes,
            last_measurement_time: view.timer.last_measurement_time,
        }
    }
}

impl From<&MeasurementOutcome> for api_shared::RecordMeasurementRes {
    fn from(outcome: &MeasurementOutcome) -> Self {
        api_shared::RecordMeasurementRes {
            measurement_id: outcome.measurement.id.to_string(),
            labor_started: outcome.labor_started,
            status: outcome.timer.status.into(),
            period: outcome.timer.period.number(),
            interval_minutes: outcome.timer.interval_minutes,
            remaining_seconds: outcome.timer.remaining_seconds,
            next_measurement_time: outcome.timer.next_due_at,
        }
    }
}
