// Errors reported by storage drivers
use std::io;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DriverError {
    #[error("No such file or directory: {0}")]
    NotFound(String),

    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    #[error("Already exists: {0}")]
    AlreadyExists(String),

    #[error("Not a directory: {0}")]
    NotADirectory(String),

    #[error("Is a directory: {0}")]
    IsADirectory(String),

    #[error("Offset {offset} is beyond the end of {path} ({size} bytes)")]
    InvalidOffset { path: String, offset: u64, size: u64 },

    #[error("Unsupported operation: {0}")]
    Unsupported(String),

    #[error("Storage backend unavailable: {0}")]
    Unavailable(String),

    #[error("Operation only partially completed: {0}")]
    Partial(String),

    #[error("I/O error: {0}")]
    Io(io::Error),
}

impl From<io::Error> for DriverError {
    fn from(e: io::Error) -> Self {
        match e.kind() {
            io::ErrorKind::NotFound => DriverError::NotFound(e.to_string()),
            io::ErrorKind::PermissionDenied => DriverError::PermissionDenied(e.to_string()),
            io::ErrorKind::AlreadyExists => DriverError::AlreadyExists(e.to_string()),
            _ => DriverError::Io(e),
        }
    }
}

impl DriverError {
    /// Reply line (without CRLF) sent to the client for this error.
    pub fn to_ftp_response(&self) -> String {
        match self {
            DriverError::NotFound(_)
            | DriverError::PermissionDenied(_)
            | DriverError::AlreadyExists(_)
            | DriverError::NotADirectory(_)
            | DriverError::IsADirectory(_) => {
                format!("550 Requested action not taken: {}.", self)
            }
            DriverError::InvalidOffset { .. } => {
                format!("554 Requested action not taken: invalid REST parameter ({}).", self)
            }
            DriverError::Unsupported(_) => {
                format!("504 Command not implemented for that parameter: {}.", self)
            }
            DriverError::Unavailable(_) => {
                format!("450 Requested file action not taken: {}.", self)
            }
            DriverError::Partial(_) | DriverError::Io(_) => {
                "451 Requested action aborted. Local error in processing.".to_string()
            }
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, DriverError::NotFound(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_io_error_classification() {
        let e: DriverError = io::Error::new(io::ErrorKind::NotFound, "gone").into();
        assert!(e.is_not_found());

        let e: DriverError = io::Error::new(io::ErrorKind::PermissionDenied, "nope").into();
        assert!(matches!(e, DriverError::PermissionDenied(_)));

        let e: DriverError = io::Error::new(io::ErrorKind::BrokenPipe, "pipe").into();
        assert!(matches!(e, DriverError::Io(_)));
    }

    #[test]
    fn test_ftp_response_codes() {
        assert!(DriverError::NotFound("/a".into()).to_ftp_response().starts_with("550 "));
        assert!(DriverError::Unsupported("resume".into()).to_ftp_response().starts_with("504 "));
        let offset = DriverError::InvalidOffset {
            path: "/a".into(),
            offset: 10,
            size: 4,
        };
        assert!(offset.to_ftp_response().starts_with("554 "));
        assert!(DriverError::Partial("rename".into()).to_ftp_response().starts_with("451 "));
        assert!(DriverError::Unavailable("down".into()).to_ftp_response().starts_with("450 "));
    }
}
