use std::fmt;

#[derive(Debug)]
pub enum Error {
    Io(std::io::Error),
    Json(serde_json::Error),
    /// Malformed or unsupported import payload.
    InvalidImport(String),
    /// Persistence refused a write; the in-memory state still holds the change.
    StorageQuota { needed: usize, limit: usize },
    InvalidRating(u8),
    UnknownCell(String),
    UnknownSource(String),
    Pdf(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Io(e) => write!(f, "I/O error: {e}"),
            Error::Json(e) => write!(f, "JSON error: {e}"),
            Error::InvalidImport(msg) => write!(f, "invalid import file: {msg}"),
            Error::StorageQuota { needed, limit } => write!(
                f,
                "storage quota exceeded: {needed} bytes needed, {limit} bytes available"
            ),
            Error::InvalidRating(r) => write!(f, "rating {r} is outside 0..=5"),
            Error::UnknownCell(id) => write!(f, "unknown cell: {id}"),
            Error::UnknownSource(id) => write!(f, "unknown source: {id}"),
            Error::Pdf(msg) => write!(f, "PDF generation failed: {msg}"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
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
