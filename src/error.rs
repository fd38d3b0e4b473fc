use std::fmt::{self, Debug, Display};
use std::io;

/// Provides `PlagueError` and maps other errors to
/// convert to a `PlagueError`
#[derive(Debug)]
#[allow(clippy::module_name_repetitions)]
pub enum PlagueError {
    IoError(io::Error),
    JsonError(serde_json::Error),
    CSVError(csv::Error),
    /// A city label that is not part of the simulated network.
    UnknownCity(String),
    /// A time step at or past the preallocated horizon.
    HorizonExceeded { step: usize, horizon: usize },
    InvalidParameter(String),
    PlagueError(String),
}

impl From<io::Error> for PlagueError {
    fn from(error: io::Error) -> Self {
        PlagueError::IoError(error)
    }
}

impl From<serde_json::Error> for PlagueError {
    fn from(error: serde_json::Error) -> Self {
        PlagueError::JsonError(error)
    }
}

impl From<csv::Error> for PlagueError {
    fn from(error: csv::Error) -> Self {
        PlagueError::CSVError(error)
    }
}

impl From<String> for PlagueError {
    fn from(error: String) -> Self {
        PlagueError::PlagueError(error)
    }
}

impl From<&str> for PlagueError {
    fn from(error: &str) -> Self {
        PlagueError::PlagueError(error.to_string())
    }
}

impl std::error::Error for PlagueError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            PlagueError::IoError(error) => Some(error),
            PlagueError::JsonError(error) => Some(error),
            PlagueError::CSVError(error) => Some(error),
            _ => None,
        }
    }
}

impl Display for PlagueError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            PlagueError::UnknownCity(city) => write!(f, "Error: unknown city {city}"),
            PlagueError::HorizonExceeded { step, horizon } => write!(
                f,
                "Error: time step {step} is outside the simulation horizon of {horizon} steps"
            ),
            PlagueError::InvalidParameter(message) => {
                write!(f, "Error: invalid parameter: {message}")
            }
            _ => write!(f, "Error: {self:?}"),
        }
    }
}
