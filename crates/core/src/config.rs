//! Core runtime configuration.
//!
//! Configuration is resolved once at process startup and then passed into
//! core services. Request handling never reads process-wide environment
//! variables, which keeps behaviour consistent across multi-threaded
//! runtimes and test harnesses.

use crate::error::{PartogramError, PartogramResult};
use std::path::{Path, PathBuf};

/// Policy for measurements whose clinical `time` predates the latest stored
/// entry for the same patient.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum BackdatePolicy {
    /// Accept out-of-order times at face value.
    #[default]
    Accept,
    /// Reject measurements older than the current latest entry.
    Reject,
}

/// Core configuration resolved at startup.
#[derive(Clone, Debug)]
pub struct CoreConfig {
    data_dir: PathBuf,
    backdate_policy: BackdatePolicy,
}

impl CoreConfig {
    /// Create a new `CoreConfig`.
    pub fn new(data_dir: PathBuf, backdate_policy: BackdatePolicy) -> PartogramResult<Self> {
        if data_dir.as_os_str().is_empty() {
            return Err(PartogramError::Validation(
                "data_dir cannot be empty".into(),
            ));
        }

        Ok(Self {
            data_dir,
            backdate_policy,
        })
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn backdate_policy(&self) -> BackdatePolicy {
        self.backdate_policy
    }
}

/// Parse the backdate policy from an optional environment value.
///
/// If `value` is `None` or empty/whitespace, the default (`Accept`) is used.
pub fn backdate_policy_from_env_value(value: Option<String>) -> PartogramResult<BackdatePolicy> {
    let value = value
        .map(|v| v.trim().to_ascii_lowercase())
        .filter(|v| !v.is_empty());

    match value.as_deref() {
        None | Some("accept") | Some("false") | Some("0") => Ok(BackdatePolicy::Accept),
        Some("reject") | Some("true") | Some("1") => Ok(BackdatePolicy::Reject),
        Some(other) => Err(PartogramError::Validation(format!(
            "unrecognised backdate policy: {other}"
        ))),
    }
}
