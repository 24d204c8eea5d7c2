use std::path::PathBuf;
use thiserror::Error;

/// Main error type for dotrel operations
#[derive(Error, Debug)]
pub enum DotrelError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Parse error in {}: {message}", .path.display())]
    Parse { path: PathBuf, message: String },

    #[error("IO error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Not a directory: {}", .0.display())]
    NotADirectory(PathBuf),

    #[error("No category directories found under {}", .root.display())]
    NoCategoryDirectories { root: PathBuf },
}

impl DotrelError {
    /// Attach a path to an `std::io::Error`
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Short cause description used in skip reports
    pub fn cause(&self) -> String {
        match self {
            Self::Parse { message, .. } => message.clone(),
            Self::Io { source, .. } => source.to_string(),
            other => other.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, DotrelError>;
