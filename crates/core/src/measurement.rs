//! Partogram measurements.
//!
//! Only `time` and `cervical_dilation` are interpreted by the timer
//! subsystem. The remaining clinical fields are opaque payload: validated
//! at the boundary where a range exists, then stored and returned as-is.

use crate::error::{PartogramError, PartogramResult};
use chrono::{DateTime, Utc};
use partogram_types::{BodyTemperature, CervicalDilation, FetalHeartRate, MaternalPulse};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Opaque measurement identifier.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MeasurementId(Uuid);

impl MeasurementId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Parses an identifier from its wire form.
    pub fn parse(input: &str) -> PartogramResult<Self> {
        Uuid::parse_str(input)
            .map(Self)
            .map_err(|_| PartogramError::Validation(format!("invalid measurement id: {input}")))
    }

    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for MeasurementId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for MeasurementId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.simple())
    }
}

/// A measurement as submitted by staff, before the store assigns identity
/// and receipt time.
#[derive(Clone, Debug)]
pub struct NewMeasurement {
    /// The instant the measurement clinically represents. May be backdated;
    /// acceptance of out-of-order times is governed by
    /// [`BackdatePolicy`](crate::config::BackdatePolicy).
    pub time: DateTime<Utc>,
    pub cervical_dilation: Option<CervicalDilation>,
    pub fetal_heart_rate: Option<FetalHeartRate>,
    pub maternal_pulse: Option<MaternalPulse>,
    pub temperature: Option<BodyTemperature>,
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

impl NewMeasurement {
    /// An empty measurement at the given clinical time.
    pub fn at(time: DateTime<Utc>) -> Self {
        Self {
            time,
            cervical_dilation: None,
            fetal_heart_rate: None,
            maternal_pulse: None,
            temperature: None,
            blood_pressure: None,
            decelerations: None,
            amniotic_fluid: None,
            presentation: None,
            caput: None,
            molding: None,
            head_descent: None,
            urination: None,
            pushing: None,
            contraction_frequency: None,
            contraction_duration: None,
            oxytocin: None,
            medications: None,
            iv_fluids: None,
        }
    }
}

/// A stored partogram entry. Immutable after creation; deletable as a whole.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Measurement {
    pub id: MeasurementId,
    /// The instant the measurement clinically represents.
    pub time: DateTime<Utc>,
    /// Server receipt time; tie-breaks shared clinical timestamps.
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub cervical_dilation: Option<CervicalDilation>,
    #[serde(default)]
    pub fetal_heart_rate: Option<FetalHeartRate>,
    #[serde(default)]
    pub maternal_pulse: Option<MaternalPulse>,
    #[serde(default)]
    pub temperature: Option<BodyTemperature>,
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
    pub head_descent: Option<u8>,
    #[serde(default)]
    pub urination: Option<bool>,
    #[serde(default)]
    pub pushing: Option<bool>,
    #[serde(default)]
    pub contraction_frequency: Option<u32>,
    #[serde(default)]
    pub contraction_duration: Option<u32>,
    #[serde(default)]
    pub oxytocin: Option<String>,
    #[serde(default)]
    pub medications: Option<String>,
    #[serde(default)]
    pub iv_fluids: Option<String>,
}

impl Measurement {
    pub(crate) fn from_new(
        draft: NewMeasurement,
        id: MeasurementId,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            time: draft.time,
            created_at,
            cervical_dilation: draft.cervical_dilation,
            fetal_heart_rate: draft.fetal_heart_rate,
            maternal_pulse: draft.maternal_pulse,
            temperature: draft.temperature,
            blood_pressure: draft.blood_pressure,
            decelerations: draft.decelerations,
            amniotic_fluid: draft.amniotic_fluid,
            presentation: draft.presentation,
            caput: draft.caput,
            molding: draft.molding,
            head_descent: draft.head_descent,
            urination: draft.urination,
            pushing: draft.pushing,
            contraction_frequency: draft.contraction_frequency,
            contraction_duration: draft.contraction_duration,
            oxytocin: draft.oxytocin,
            medications: draft.medications,
            iv_fluids: draft.iv_fluids,
        }
    }
}

/// Sorts measurements most-recent-first: by clinical `time`, then receipt
/// time, then id. "Latest" is therefore deterministic even when entries
/// share a timestamp.
pub fn sort_latest_first(measurements: &mut [Measurement]) {
    measurements.sort_by(|a, b| {
        (b.time, b.created_at, b.id.as_uuid()).cmp(&(a.time, a.created_at, a.id.as_uuid()))
    });
}
