use std::fmt::{self, Debug, Display};
use std::io;

/// Provides `VaxlineError` and maps other errors to
/// a `VaxlineError`
#[derive(Debug)]
#[allow(clippy::module_name_repetitions)]
pub enum VaxlineError {
    IoError(io::Error),
    JsonError(serde_json::Error),
    CsvError(csv::Error),
    /// Invalid simulation or allocation parameters. Raised before any
    /// integration work starts.
    Configuration(String),
    /// The solver produced a non-finite compartment value.
    Integration(String),
    /// A supply sheet is malformed; identifies the offending manufacturer.
    InputFormat {
        manufacturer: String,
        message: String,
    },
}

impl VaxlineError {
    pub fn config<S: ToString>(message: S) -> Self {
        VaxlineError::Configuration(message.to_string())
    }

    pub fn input_format<S: ToString>(manufacturer: &str, message: S) -> Self {
        VaxlineError::InputFormat {
            manufacturer: manufacturer.to_string(),
            message: message.to_string(),
        }
    }
}

impl From<io::Error> for VaxlineError {
    fn from(error: io::Error) -> Self {
        VaxlineError::IoError(error)
    }
}

impl From<serde_json::Error> for VaxlineError {
    fn from(error: serde_json::Error) -> Self {
        VaxlineError::JsonError(error)
    }
}

impl From<csv::Error> for VaxlineError {
    fn from(error: csv::Error) -> Self {
        VaxlineError::CsvError(error)
    }
}

impl std::error::Error for VaxlineError {}

impl Display for VaxlineError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            VaxlineError::IoError(error) => write!(f, "IO error: {error}"),
            VaxlineError::JsonError(error) => write!(f, "JSON error: {error}"),
            VaxlineError::CsvError(error) => write!(f, "CSV error: {error}"),
            VaxlineError::Configuration(message) => {
                write!(f, "configuration error: {message}")
            }
            VaxlineError::Integration(message) => {
                write!(f, "integration error: {message}")
            }
            VaxlineError::InputFormat {
                manufacturer,
                message,
            } => {
                write!(f, "malformed supply sheet for {manufacturer}: {message}")
            }
        }
    }
}
