use std::io;
use std::path::{Path, PathBuf};

/// Errors raised by the session store and the navigator.
#[derive(Debug, thiserror::Error)]
pub enum ReviewError {
    /// The chosen directory does not exist or is not a directory.
    #[error("directory not found: {}", .0.display())]
    DirectoryNotFound(PathBuf),

    /// The file name is not part of the current session.
    #[error("image not in session: {0}")]
    ImageNotFound(String),

    /// Listing, reading or writing failed.
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The status file has a bad header or a malformed row.
    #[error("malformed status file {}{}: {reason}", path.display(), line.map(|l| format!(" (line {l})")).unwrap_or_default())]
    Parse {
        path: PathBuf,
        line: Option<u64>,
        reason: String,
    },
}

pub type Result<T> = std::result::Result<T, ReviewError>;

impl ReviewError {
    pub(crate) fn io(path: impl AsRef<Path>, source: io::Error) -> Self {
        ReviewError::Io {
            path: path.as_ref().to_path_buf(),
            source,
        }
    }

    pub(crate) fn parse(path: impl AsRef<Path>, line: Option<u64>, reason: impl Into<String>) -> Self {
        ReviewError::Parse {
            path: path.as_ref().to_path_buf(),
            line,
            reason: reason.into(),
        }
    }

    /// Split a `csv::Error` into the I/O or parse side of the taxonomy.
    pub(crate) fn from_csv(path: impl AsRef<Path>, err: csv::Error) -> Self {
        let line = err.position().map(|p| p.line());
        if err.is_io_error() {
            match err.into_kind() {
                csv::ErrorKind::Io(source) => ReviewError::io(path, source),
                other => ReviewError::parse(path, line, format!("{other:?}")),
            }
        } else {
            ReviewError::parse(path, line, err.to_string())
        }
    }
}
