use thiserror::Error;

#[derive(Debug, Error)]
pub enum PredictError {
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("TLE directory not found: {0}")]
    DirectoryNotFound(String),
    #[error("TLE file read error: {0}")]
    FileRead(#[from] std::io::Error),
    #[error("Invalid TLE format in {file}: {message}")]
    InvalidTle { file: String, message: String },
}

/// Raised by a propagator when no pass can be resolved after the reference time.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PropagationError {
    #[error("invalid elements: {0}")]
    Elements(String),
    #[error("sgp4: {0}")]
    Sgp4(String),
    #[error("satellite never rises above the horizon within {hours} h")]
    NeverRises { hours: i64 },
    #[error("satellite never sets below the horizon within {hours} h")]
    AlwaysUp { hours: i64 },
    #[error("propagator returned no events")]
    NoEvents,
}

impl From<sgp4::TleError> for PropagationError {
    fn from(err: sgp4::TleError) -> Self {
        PropagationError::Elements(err.to_string())
    }
}

impl From<sgp4::ElementsError> for PropagationError {
    fn from(err: sgp4::ElementsError) -> Self {
        PropagationError::Elements(err.to_string())
    }
}

impl From<sgp4::Error> for PropagationError {
    fn from(err: sgp4::Error) -> Self {
        PropagationError::Sgp4(err.to_string())
    }
}
