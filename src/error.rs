use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Which path failed the existence check
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum PathRole {
    Video,
    SaveDir,
}

impl fmt::Display for PathRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathRole::Video => f.write_str("Video"),
            PathRole::SaveDir => f.write_str("Save"),
        }
    }
}

/// Which side of the pipeline could not be opened
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum StreamRole {
    Source,
    Destination,
}

impl fmt::Display for StreamRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StreamRole::Source => f.write_str("Video file"),
            StreamRole::Destination => f.write_str("Video writer"),
        }
    }
}

/// Every failure the tool can report. All of them are fatal.
#[derive(Debug, Error)]
pub enum ResizeError {
    #[error("Invalid arguments: {0}")]
    InvalidArguments(String),

    #[error("{role} path does not exist: {}", .path.display())]
    PathNotFound { role: PathRole, path: PathBuf },

    #[error("Invalid scale value: {0}")]
    InvalidScale(f64),

    #[error("Error: {role} could not be opened: {reason}")]
    StreamOpen { role: StreamRole, reason: String },

    #[error("Frame processing failed: {0:#}")]
    Processing(#[from] anyhow::Error),
}

impl ResizeError {
    pub(crate) fn source_open(reason: impl fmt::Display) -> Self {
        ResizeError::StreamOpen {
            role: StreamRole::Source,
            reason: reason.to_string(),
        }
    }

    pub(crate) fn destination_open(reason: impl fmt::Display) -> Self {
        ResizeError::StreamOpen {
            role: StreamRole::Destination,
            reason: reason.to_string(),
        }
    }

    /// Whether the usage text should accompany the error message
    pub fn wants_usage(&self) -> bool {
        matches!(self, ResizeError::InvalidArguments(_))
    }
}
