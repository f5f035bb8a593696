use std::fmt;

/// Error type for backend operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendError {
    /// No credentials configured
    NotAuthenticated,
    /// Spreadsheet or tab does not exist
    NotFound(String),
    /// Network error (connection, timeout)
    Network(String),
    /// HTTP error with status code
    Http(u16, String),
    /// Service rejected the request (400/422 with message)
    Validation(String),
    /// Response body could not be understood
    Parse(String),
    /// Local file I/O error
    Io(String),
}

impl fmt::Display for BackendError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BackendError::NotAuthenticated => {
                write!(f, "Not authenticated: run `sspread login` or set SMARTSPREAD_TOKEN")
            }
            BackendError::NotFound(what) => write!(f, "Not found: {}", what),
            BackendError::Network(msg) => write!(f, "Network error: {}", msg),
            BackendError::Http(code, msg) => write!(f, "HTTP {}: {}", code, msg),
            BackendError::Validation(msg) => write!(f, "{}", msg),
            BackendError::Parse(msg) => write!(f, "Parse error: {}", msg),
            BackendError::Io(msg) => write!(f, "I/O error: {}", msg),
        }
    }
}

impl std::error::Error for BackendError {}

impl From<std::io::Error> for BackendError {
    fn from(e: std::io::Error) -> Self {
        BackendError::Io(e.to_string())
    }
}
