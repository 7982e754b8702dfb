//! Read path: derived timer state queries.
//!
//! Timer state is never stored. Every query takes a consistent snapshot of
//! the patient and their measurement history, then recomputes period,
//! anchor and remaining time from that single snapshot, so the period can
//! never disagree with the anchor it was derived alongside.

use crate::clock::Clock;
use crate::error::PartogramResult;
use crate::measurement::Measurement;
use crate::patient::{LaborStatus, Patient, PatientId};
use crate::store::LaborStore;
use crate::timer::{compute_timer_state, TimerState};
use chrono::NaiveDate;
use std::sync::Arc;

/// A patient paired with their freshly derived timer state.
#[derive(Clone, Debug)]
pub struct PatientTimerView {
    pub patient: Patient,
    pub timer: TimerState,
}

/// Filters for the patient list query.
#[derive(Clone, Debug, Default)]
pub struct PatientFilter {
    /// Case-insensitive substring match on the full name.
    pub search: Option<String>,
    pub status: Option<LaborStatus>,
    pub admission_date: Option<NaiveDate>,
}

impl PatientFilter {
    fn matches(&self, patient: &Patient) -> bool {
        if let Some(search) = &self.search {
            let needle = search.to_lowercase();
            if !patient.full_name.to_lowercase().contains(&needle) {
                return false;
            }
        }
        if let Some(status) = self.status {
            if patient.status != status {
                return false;
            }
        }
        if let Some(admission_date) = self.admission_date {
            if patient.admission_date != admission_date {
                return false;
            }
        }
        true
    }
}

/// Read-only timer queries. Shared by the REST surface and the CLI.
#[derive(Clone)]
pub struct TimerQueryService {
    store: Arc<dyn LaborStore>,
    clock: Arc<dyn Clock>,
}

impl TimerQueryService {
    pub fn new(store: Arc<dyn LaborStore>, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    /// Timer state for one patient, for the detail view.
    pub fn timer_state(&self, patient_id: PatientId) -> PartogramResult<PatientTimerView> {
        let snapshot = self.store.snapshot(patient_id)?;
        let timer =
            compute_timer_state(&snapshot.patient, &snapshot.measurements, self.clock.now());
        Ok(PatientTimerView {
            patient: snapshot.patient,
            timer,
        })
    }

    /// Timer states for every patient, for the list view.
    ///
    /// All histories are loaded in one store pass and derived against a
    /// single `now`, so the batch stays coherent and cheap as the patient
    /// count grows.
    pub fn timer_states_bulk(&self) -> PartogramResult<Vec<PatientTimerView>> {
        let now = self.clock.now();
        Ok(self
            .store
            .snapshot_all()?
            .into_iter()
            .map(|snapshot| PatientTimerView {
                timer: compute_timer_state(&snapshot.patient, &snapshot.measurements, now),
                patient: snapshot.patient,
            })
            .collect())
    }

    /// Filtered patient list, most recently admitted first, with timer
    /// states embedded.
    pub fn patients(&self, filter: &PatientFilter) -> PartogramResult<Vec<PatientTimerView>> {
        let mut views = self.timer_states_bulk()?;
        views.retain(|view| filter.matches(&view.patient));
        views.sort_by(|a, b| b.patient.created_at.cmp(&a.patient.created_at));
        Ok(views)
    }

    /// A patient's measurement history, most recent first.
    pub fn measurements(&self, patient_id: PatientId) -> PartogramResult<Vec<Measurement>> {
        Ok(self.store.snapshot(patient_id)?.measurements)
    }
}
