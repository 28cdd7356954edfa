use std::path::PathBuf;

/// Errors that can occur in ruSTAR-Fusion.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("invalid parameter: {0}")]
    Parameter(String),

    #[error("I/O error: {source} ({path})")]
    Io {
        source: std::io::Error,
        path: PathBuf,
    },

    #[error("GTF parsing error: {0}")]
    Gtf(String),

    #[error("chimeric junction parsing error: {0}")]
    Junction(String),

    #[error("alignment record error: {0}")]
    Alignment(String),

    #[error("cannot determine mate from read name '{0}': expected a trailing /1 or /2")]
    MateMarker(String),
}

impl Error {
    /// Convenience for wrapping an `io::Error` with a path context.
    pub fn io(source: std::io::Error, path: impl Into<PathBuf>) -> Self {
        Self::Io {
            source,
            path: path.into(),
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Self::Io {
            source: err,
            path: PathBuf::from("<unknown>"),
        }
    }
}
