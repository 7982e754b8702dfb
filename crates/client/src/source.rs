//! Where a view's timer states come from.

use api_shared::{PatientTimerEntry, TimerStateRes, TimerStatesRes};
use chrono::{DateTime, Utc};
use std::future::Future;

/// What a view observes: the whole ward list or a single patient's
/// partogram page.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ViewScope {
    AllPatients,
    Patient(String),
}

/// Errors from a poll.
///
/// Every variant is transient: the caller keeps its cached state and
/// retries on the next interval. Nothing here surfaces to the user.
#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    #[error("timer poll failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("timer poll returned HTTP {0}")]
    Status(u16),
}

/// One server-computed timer observation as held in a view cache.
#[derive(Clone, Debug, PartialEq)]
pub struct ObservedTimer {
    pub patient_id: String,
    /// Present for list-scope observations; the detail endpoint does not
    /// repeat the name.
    pub full_name: Option<String>,
    pub status: api_shared::LaborStatus,
    pub period: u8,
    pub remaining_seconds: i64,
    pub interval_minutes: i64,
    pub last_measurement_time: Option<DateTime<Utc>>,
}

impl ObservedTimer {
    pub fn from_entry(entry: &PatientTimerEntry) -> Self {
        Self {
            patient_id: entry.patient_id.clone(),
            full_name: Some(entry.full_name.clone()),
            status: entry.status,
            period: entry.period,
            remaining_seconds: entry.remaining_seconds,
            interval_minutes: entry.interval_minutes,
            last_measurement_time: entry.last_measurement_time,
        }
    }

    pub fn from_state(patient_id: String, state: &TimerStateRes) -> Self {
        Self {
            patient_id,
            full_name: None,
            status: state.status,
            period: state.period,
            remaining_seconds: state.remaining_seconds,
            interval_minutes: state.interval_minutes,
            last_measurement_time: state.last_measurement_time,
        }
    }

    pub fn in_progress(&self) -> bool {
        self.status == api_shared::LaborStatus::InProgress
    }
}

/// Source of fresh timer states for a scope.
///
/// The sync loop is generic over this so tests can drive it with a scripted
/// source instead of a live server.
pub trait TimerSource: Send + Sync {
    fn fetch(
        &self,
        scope: &ViewScope,
    ) -> impl Future<Output = Result<Vec<ObservedTimer>, SyncError>> + Send;
}

/// HTTP source polling the partogram REST API.
#[derive(Clone, Debug)]
pub struct HttpTimerSource {
    http: reqwest::Client,
    base_url: String,
}

impl HttpTimerSource {
    /// Creates a source against a server base URL such as
    /// `http://localhost:3000`.
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url: String = base_url.into();
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }
}

impl TimerSource for HttpTimerSource {
    async fn fetch(&self, scope: &ViewScope) -> Result<Vec<ObservedTimer>, SyncError> {
        match scope {
            ViewScope::AllPatients => {
                let url = format!("{}/api/timer_states", self.base_url);
                let response = self.http.get(&url).send().await?;
                if !response.status().is_success() {
                    return Err(SyncError::Status(response.status().as_u16()));
                }
                let body: TimerStatesRes = response.json().await?;
                Ok(body.states.iter().map(ObservedTimer::from_entry).collect())
            }
            ViewScope::Patient(patient_id) => {
                let url = format!(
                    "{}/api/patients/{}/timer_state",
                    self.base_url, patient_id
                );
                let response = self.http.get(&url).send().await?;
                if !response.status().is_success() {
                    return Err(SyncError::Status(response.status().as_u16()));
                }
                let body: TimerStateRes = response.json().await?;
                Ok(vec![ObservedTimer::from_state(patient_id.clone(), &body)])
            }
        }
    }
}
