use crate::measurement::MeasurementId;
use crate::patient::PatientId;

/// Errors produced by partogram core services and stores.
#[derive(Debug, thiserror::Error)]
pub enum PartogramError {
    #[error("invalid input: {0}")]
    Validation(String),
    #[error(transparent)]
    Value(#[from] partogram_types::ValueError),
    #[error("patient not found: {0}")]
    PatientNotFound(PatientId),
    #[error("measurement not found: {0}")]
    MeasurementNotFound(MeasurementId),
    #[error("invalid labor transition: {0}")]
    InvalidTransition(&'static str),
    #[error("failed to create storage directory: {0}")]
    StorageDirCreation(std::io::Error),
    #[error("failed to write record file: {0}")]
    FileWrite(std::io::Error),
    #[error("failed to read record file: {0}")]
    FileRead(std::io::Error),
    #[error("failed to delete record: {0}")]
    FileDelete(std::io::Error),
    #[error("failed to serialize record: {0}")]
    Serialization(serde_json::Error),
    #[error("failed to deserialize record: {0}")]
    Deserialization(serde_json::Error),
}

pub type PartogramResult<T> = std::result::Result<T, PartogramError>;
