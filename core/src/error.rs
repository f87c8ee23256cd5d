use thiserror::Error;

/// Result type for lesion insertion operations
pub type Result<T> = std::result::Result<T, InsertionError>;

/// Error types for lesion insertion operations
///
/// None of these are retried by the engine itself. The exam-level caller
/// decides whether to log and skip the exam.
#[derive(Error, Debug)]
pub enum InsertionError {
    /// Inputs violate a documented precondition (mismatched masks, bad windows)
    #[error("Precondition violation: {0}")]
    PreconditionViolation(String),

    /// No reconstructed voxel survived the candidate threshold
    #[error("Empty candidate set: no voxel above {threshold} in the reconstructed density volume")]
    EmptyCandidateSet { threshold: f64 },

    /// The placement probability field lost all of its mass
    #[error("Degenerate probability field: {0}")]
    DegenerateField(String),

    /// A calcification shape could not be located or decoded
    #[error("Shape archive error: {0}")]
    ShapeArchiveError(String),

    /// The shape catalog could not be read
    #[error("Catalog error: {0}")]
    Catalog(String),

    /// The reconstruction or projection collaborator failed
    #[error("Reconstruction error: {0}")]
    Reconstruction(String),

    /// DICOM reading error
    #[error("DICOM error: {0}")]
    DicomError(String),

    /// Invalid tag or configuration value
    #[error("Invalid value: {0}")]
    InvalidValue(String),

    /// I/O error
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

impl InsertionError {
    /// Shorthand for a [`InsertionError::PreconditionViolation`]
    pub fn precondition(msg: impl Into<String>) -> Self {
        InsertionError::PreconditionViolation(msg.into())
    }
}

// Convert dicom-object errors
impl From<dicom_object::ReadError> for InsertionError {
    fn from(e: dicom_object::ReadError) -> Self {
        InsertionError::DicomError(format!("{}", e))
    }
}

impl From<dicom_core::value::ConvertValueError> for InsertionError {
    fn from(e: dicom_core::value::ConvertValueError) -> Self {
        InsertionError::InvalidValue(format!("{}", e))
    }
}

impl From<csv::Error> for InsertionError {
    fn from(e: csv::Error) -> Self {
        InsertionError::Catalog(format!("{}", e))
    }
}

impl From<zip::result::ZipError> for InsertionError {
    fn from(e: zip::result::ZipError) -> Self {
        InsertionError::ShapeArchiveError(format!("{}", e))
    }
}

impl From<serde_json::Error> for InsertionError {
    fn from(e: serde_json::Error) -> Self {
        InsertionError::InvalidValue(format!("{}", e))
    }
}
