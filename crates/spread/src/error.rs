use std::fmt;

use smartspread_backend::BackendError;
use smartspread_engine::EngineError;

/// Everything a spreadsheet or tab operation can fail with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// Bad data or bad arguments; nothing reached the backend.
    Engine(EngineError),
    /// The backend refused or failed; returned unchanged.
    Backend(BackendError),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Engine(e) => write!(f, "{}", e),
            Error::Backend(e) => write!(f, "{}", e),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Engine(e) => Some(e),
            Error::Backend(e) => Some(e),
        }
    }
}

impl From<EngineError> for Error {
    fn from(e: EngineError) -> Self {
        Error::Engine(e)
    }
}

impl From<BackendError> for Error {
    fn from(e: BackendError) -> Self {
        Error::Backend(e)
    }
}
