use std::{error::Error, fmt::Display, io, path::PathBuf};

/// Errors reported by a host or detected while driving one.
#[derive(Debug)]
pub enum HostError {
    /// The JTAG hardware could not be accessed. There is no way to continue without it.
    Hardware(io::Error),
    /// A vector file could not be opened.
    Source { path: PathBuf, error: io::Error },
    /// The JTAG chain did not behave as expected.
    Protocol(String),
    /// A JTAG operation was requested before `setup`.
    NotSetUp,
}

impl HostError {
    /// Whether the error leaves the host unusable.
    pub fn is_fatal(&self) -> bool {
        matches!(self, HostError::Hardware(_))
    }
}

impl From<io::Error> for HostError {
    fn from(value: io::Error) -> Self {
        HostError::Hardware(value)
    }
}

impl Display for HostError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HostError::Hardware(error) => write!(f, "Hardware access failed: {}", error),
            HostError::Source { path, error } => {
                write!(f, "Can't open `{}': {}", path.display(), error)
            }
            HostError::Protocol(message) => write!(f, "{}", message),
            HostError::NotSetUp => write!(f, "Host used before setup"),
        }
    }
}

impl Error for HostError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            HostError::Hardware(error) | HostError::Source { error, .. } => Some(error),
            _ => None,
        }
    }
}

#[test]
fn only_hardware_errors_are_fatal() {
    assert!(HostError::from(io::Error::from(io::ErrorKind::PermissionDenied)).is_fatal());
    assert!(!HostError::NotSetUp.is_fatal());
    assert!(
        !HostError::Source {
            path: PathBuf::from("a.svf"),
            error: io::Error::from(io::ErrorKind::NotFound),
        }
        .is_fatal()
    );
}
