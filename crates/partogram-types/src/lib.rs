//! Validated clinical value types for partogram records.
//!
//! Each type wraps a raw value and enforces its clinical range at
//! construction, so downstream code never re-checks bounds. The ranges
//! follow the partogram entry form: fetal heart rate 1-299 bpm, maternal
//! pulse 1-199 bpm, temperature strictly between 35 and 42 °C, cervical
//! dilation 0-10 cm.

/// Errors that can occur when creating validated clinical values.
#[derive(Debug, thiserror::Error)]
pub enum ValueError {
    /// The input text was empty or contained only whitespace
    #[error("Text cannot be empty")]
    EmptyText,
    /// Cervical dilation outside 0-10 cm
    #[error("cervical dilation must be between 0 and 10 cm, got {0}")]
    CervicalDilation(i64),
    /// Fetal heart rate outside 1-299 bpm
    #[error("fetal heart rate must be between 1 and 299 bpm, got {0}")]
    FetalHeartRate(i64),
    /// Maternal pulse outside 1-199 bpm
    #[error("maternal pulse must be between 1 and 199 bpm, got {0}")]
    MaternalPulse(i64),
    /// Temperature outside the 35-42 °C open interval
    #[error("temperature must be between 35 and 42 degrees Celsius, got {0}")]
    Temperature(f64),
}

/// A string type that guarantees non-empty content.
///
/// Wraps a `String` and ensures it contains at least one non-whitespace
/// character. The input is trimmed of leading and trailing whitespace
/// during construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NonEmptyText(String);

impl NonEmptyText {
    /// Creates a new `NonEmptyText` from the given input.
    ///
    /// The input is trimmed of leading and trailing whitespace. If the
    /// trimmed result is empty, an error is returned.
    pub fn new(input: impl AsRef<str>) -> Result<Self, ValueError> {
        let trimmed = input.as_ref().trim();
        if trimmed.is_empty() {
            return Err(ValueError::EmptyText);
        }
        Ok(Self(trimmed.to_owned()))
    }

    /// Returns the inner string as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consumes the value and returns the inner `String`.
    pub fn into_string(self) -> String {
        self.0
    }
}

impl std::fmt::Display for NonEmptyText {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for NonEmptyText {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl serde::Serialize for NonEmptyText {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> serde::Deserialize<'de> for NonEmptyText {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        NonEmptyText::new(&s).map_err(serde::de::Error::custom)
    }
}

/// Cervical dilation in whole centimetres, 0 to 10.
///
/// This is the one measurement field the labor period classifier reads:
/// full dilation (10 cm) marks the second period of labor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct CervicalDilation(u8);

impl CervicalDilation {
    /// Full dilation in centimetres.
    pub const FULL_CM: u8 = 10;

    /// Creates a dilation value, rejecting anything outside 0-10 cm.
    pub fn new(cm: i64) -> Result<Self, ValueError> {
        if !(0..=Self::FULL_CM as i64).contains(&cm) {
            return Err(ValueError::CervicalDilation(cm));
        }
        Ok(Self(cm as u8))
    }

    /// The dilation in centimetres.
    pub fn cm(self) -> u8 {
        self.0
    }

    /// Whether the cervix is fully dilated.
    pub fn is_full(self) -> bool {
        self.0 >= Self::FULL_CM
    }
}

impl std::fmt::Display for CervicalDilation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} cm", self.0)
    }
}

/// Fetal heart rate in beats per minute, 1 to 299.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct FetalHeartRate(u16);

impl FetalHeartRate {
    /// Creates a heart rate value, rejecting anything outside 1-299 bpm.
    pub fn new(bpm: i64) -> Result<Self, ValueError> {
        if !(1..300).contains(&bpm) {
            return Err(ValueError::FetalHeartRate(bpm));
        }
        Ok(Self(bpm as u16))
    }

    /// The rate in beats per minute.
    pub fn bpm(self) -> u16 {
        self.0
    }
}

/// Maternal pulse in beats per minute, 1 to 199.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct MaternalPulse(u16);

impl MaternalPulse {
    /// Creates a pulse value, rejecting anything outside 1-199 bpm.
    pub fn new(bpm: i64) -> Result<Self, ValueError> {
        if !(1..200).contains(&bpm) {
            return Err(ValueError::MaternalPulse(bpm));
        }
        Ok(Self(bpm as u16))
    }

    /// The pulse in beats per minute.
    pub fn bpm(self) -> u16 {
        self.0
    }
}

/// Maternal body temperature in degrees Celsius, strictly between 35 and 42.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct BodyTemperature(f64);

impl BodyTemperature {
    /// Creates a temperature value, rejecting anything at or outside 35-42 °C.
    pub fn new(celsius: f64) -> Result<Self, ValueError> {
        if !celsius.is_finite() || celsius <= 35.0 || celsius >= 42.0 {
            return Err(ValueError::Temperature(celsius));
        }
        Ok(Self(celsius))
    }

    /// The temperature in degrees Celsius.
    pub fn celsius(self) -> f64 {
        self.0
    }
}

macro_rules! serde_as_number {
    ($ty:ident, $raw:ty, $ser:ident, $de_raw:ty) => {
        impl serde::Serialize for $ty {
            fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
            where
                S: serde::Serializer,
            {
                serializer.$ser(self.0 as $raw)
            }
        }

        impl<'de> serde::Deserialize<'de> for $ty {
            fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
            where
                D: serde::Deserializer<'de>,
            {
                let raw = <$de_raw>::deserialize(deserializer)?;
                $ty::new(raw.into()).map_err(serde::de::Error::custom)
            }
        }
    };
}

serde_as_number!(CervicalDilation, u8, serialize_u8, i32);
serde_as_number!(FetalHeartRate, u16, serialize_u16, i32);
serde_as_number!(MaternalPulse, u16, serialize_u16, i32);

impl serde::Serialize for BodyTemperature {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_f64(self.0)
    }
}

impl<'de> serde::Deserialize<'de> for BodyTemperature {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let raw = f64::deserialize(deserializer)?;
        BodyTemperature::new(raw).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_non_empty_text_trims_and_rejects_blank() {
        let text = NonEmptyText::new("  Ivanova A.P.  ").expect("should accept non-blank text");
        assert_eq!(text.as_str(), "Ivanova A.P.");

        let err = NonEmptyText::new("   ").expect_err("blank text should be rejected");
        assert!(matches!(err, ValueError::EmptyText));
    }

    #[test]
    fn test_cervical_dilation_bounds() {
        assert_eq!(CervicalDilation::new(0).unwrap().cm(), 0);
        assert_eq!(CervicalDilation::new(10).unwrap().cm(), 10);
        assert!(CervicalDilation::new(11).is_err());
        assert!(CervicalDilation::new(-1).is_err());
    }

    #[test]
    fn test_cervical_dilation_full() {
        assert!(CervicalDilation::new(10).unwrap().is_full());
        assert!(!CervicalDilation::new(9).unwrap().is_full());
    }

    #[test]
    fn test_fetal_heart_rate_bounds() {
        assert!(FetalHeartRate::new(0).is_err());
        assert_eq!(FetalHeartRate::new(1).unwrap().bpm(), 1);
        assert_eq!(FetalHeartRate::new(299).unwrap().bpm(), 299);
        assert!(FetalHeartRate::new(300).is_err());
    }

    #[test]
    fn test_maternal_pulse_bounds() {
        assert!(MaternalPulse::new(0).is_err());
        assert_eq!(MaternalPulse::new(199).unwrap().bpm(), 199);
        assert!(MaternalPulse::new(200).is_err());
    }

    #[test]
    fn test_temperature_open_interval() {
        assert!(BodyTemperature::new(35.0).is_err());
        assert!(BodyTemperature::new(42.0).is_err());
        assert!(BodyTemperature::new(f64::NAN).is_err());
        let temp = BodyTemperature::new(36.6).expect("normal temperature should be accepted");
        assert!((temp.celsius() - 36.6).abs() < f64::EPSILON);
    }

    #[test]
    fn test_dilation_serde_round_trip() {
        let dilation = CervicalDilation::new(8).unwrap();
        let json = serde_json::to_string(&dilation).unwrap();
        assert_eq!(json, "8");
        let back: CervicalDilation = serde_json::from_str(&json).unwrap();
        assert_eq!(back, dilation);
    }

    #[test]
    fn test_dilation_serde_rejects_out_of_range() {
        let result: Result<CervicalDilation, _> = serde_json::from_str("12");
        assert!(result.is_err());
    }
}
