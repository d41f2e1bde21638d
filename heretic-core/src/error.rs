use std::io;
use std::path::PathBuf;

/// Errors produced by the purge engine and its collaborators
#[derive(Debug, thiserror::Error)]
pub enum PurgeError {
    /// The run was rejected before it started
    #[error("invalid purge configuration: {0}")]
    Configuration(String),

    /// A root could not be scanned; the run continues with the next target
    #[error("failed to scan {}: {source}", root.display())]
    Scan {
        root: PathBuf,
        #[source]
        source: io::Error,
    },

    /// A matched folder could not be removed; the run continues with the next folder
    #[error("failed to delete {}: {source}", path.display())]
    Deletion {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// A project root rejected when registering it
    #[error("not an existing directory: {}", .0.display())]
    InvalidRoot(PathBuf),

    #[error("path store {}: {message}", path.display())]
    Store { path: PathBuf, message: String },
}

impl PurgeError {
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration(message.into())
    }

    /// Per-item errors never abort a run
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Configuration(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = PurgeError::configuration("no target folder names");
        assert_eq!(
            err.to_string(),
            "invalid purge configuration: no target folder names"
        );
        assert!(err.is_fatal());

        let err = PurgeError::Scan {
            root: PathBuf::from("/missing"),
            source: io::Error::new(io::ErrorKind::NotFound, "not found"),
        };
        assert_eq!(err.to_string(), "failed to scan /missing: not found");
        assert!(!err.is_fatal());

        let err = PurgeError::Deletion {
            path: PathBuf::from("/proj/bin"),
            source: io::Error::new(io::ErrorKind::PermissionDenied, "access denied"),
        };
        assert!(err.to_string().contains("access denied"));
        assert!(!err.is_fatal());
    }
}
