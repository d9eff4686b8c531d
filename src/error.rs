use std::fmt;

#[derive(Debug)]
pub enum Error {
    Remote { status: Option<u16>, message: String },
    Unauthorized(String),
    Timeout,
    NoDevices,
    DeviceNotFound(String),
    InvalidValue { code: &'static str, value: String },
    Config(String),
    Setup { stage: &'static str, source: Box<Error> },
    Io(std::io::Error),
    Json(serde_json::Error),
}

impl Error {
    pub fn remote(status: Option<u16>, message: impl Into<String>) -> Self {
        Error::Remote {
            status,
            message: message.into(),
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Remote {
                status: Some(s),
                message,
            } => write!(f, "remote error ({s}): {message}"),
            Error::Remote {
                status: None,
                message,
            } => write!(f, "remote error: {message}"),
            Error::Unauthorized(msg) => write!(f, "unauthorized: {msg}"),
            Error::Timeout => write!(f, "control completion timed out"),
            Error::NoDevices => write!(f, "no devices registered for this account"),
            Error::DeviceNotFound(id) => write!(f, "device not found: {id}"),
            Error::InvalidValue { code, value } => {
                write!(f, "invalid value for property {code}: {value}")
            }
            Error::Config(msg) => write!(f, "config error: {msg}"),
            Error::Setup { stage, source } => write!(f, "setup failed during {stage}: {source}"),
            Error::Io(e) => write!(f, "IO error: {e}"),
            Error::Json(e) => write!(f, "JSON error: {e}"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Setup { source, .. } => Some(source.as_ref()),
            Error::Io(e) => Some(e),
            Error::Json(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::Io(e)
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Json(e)
    }
}

pub type Result<T> = std::result::Result<T, Error>;

/// Recovery class of a failed remote call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Failure {
    /// The session is no longer accepted; re-login and retry once.
    Authentication,
    Other,
}

/// Decide whether a remote failure was caused by an expired or rejected
/// session.
///
/// Vendor clients do not report auth failures consistently, so besides the
/// typed variants this falls back to looking for "401", "unauthorized" or
/// "authentication" in the rendered message.
pub fn classify(err: &Error) -> Failure {
    match err {
        Error::Unauthorized(_) => return Failure::Authentication,
        Error::Remote {
            status: Some(401), ..
        } => return Failure::Authentication,
        Error::Setup { source, .. } => return classify(source),
        _ => {}
    }

    let text = err.to_string();
    if text.contains("401") {
        return Failure::Authentication;
    }
    let lower = text.to_lowercase();
    if lower.contains("unauthorized") || lower.contains("authentication") {
        Failure::Authentication
    } else {
        Failure::Other
    }
}
