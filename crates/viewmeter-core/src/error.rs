//! Shared error type across viewmeter crates.

use thiserror::Error;

/// Stable error codes surfaced in logs and HTTP bodies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientCode {
    /// Invalid input / malformed configuration.
    BadRequest,
    /// Unsupported config version.
    UnsupportedVersion,
    /// Facility not available on this platform.
    Unsupported,
    /// Malformed collaborator output (e.g. smaps).
    Parse,
    /// I/O failure talking to the OS.
    Io,
    /// Internal error.
    Internal,
}

impl ClientCode {
    /// String representation used in JSON responses.
    pub fn as_str(self) -> &'static str {
        match self {
            ClientCode::BadRequest => "BAD_REQUEST",
            ClientCode::UnsupportedVersion => "UNSUPPORTED_VERSION",
            ClientCode::Unsupported => "UNSUPPORTED",
            ClientCode::Parse => "PARSE",
            ClientCode::Io => "IO",
            ClientCode::Internal => "INTERNAL",
        }
    }
}

/// Shared result type.
pub type Result<T> = std::result::Result<T, ViewMeterError>;

/// Unified error type used by core and server.
#[derive(Debug, Error)]
pub enum ViewMeterError {
    #[error("bad request: {0}")]
    BadRequest(String),
    #[error("unsupported config version")]
    UnsupportedVersion,
    #[error("unsupported: {0}")]
    Unsupported(&'static str),
    #[error("parse error: {0}")]
    Parse(String),
    #[error("io: {0}")]
    Io(#[from] std::io::Error),
    #[error("internal: {0}")]
    Internal(String),
}

impl ViewMeterError {
    /// Map internal error to a stable client-facing code.
    pub fn client_code(&self) -> ClientCode {
        match self {
            ViewMeterError::BadRequest(_) => ClientCode::BadRequest,
            ViewMeterError::UnsupportedVersion => ClientCode::UnsupportedVersion,
            ViewMeterError::Unsupported(_) => ClientCode::Unsupported,
            ViewMeterError::Parse(_) => ClientCode::Parse,
            ViewMeterError::Io(_) => ClientCode::Io,
            ViewMeterError::Internal(_) => ClientCode::Internal,
        }
    }
}
