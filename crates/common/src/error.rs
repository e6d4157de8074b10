//! Error types shared across StrokeLab crates.

use std::path::PathBuf;

/// Top-level error type for StrokeLab operations.
#[derive(Debug, thiserror::Error)]
pub enum StrokeLabError {
    #[error("Extraction error: {message}")]
    Extraction { message: String },

    #[error("Analysis error: {message}")]
    Analysis { message: String },

    #[error("Archive error: {message}")]
    Archive { message: String },

    #[error("Media source error: {message}")]
    MediaSource { message: String },

    #[error("Pose estimator error: {message}")]
    Estimator { message: String },

    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("File not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Result type alias using StrokeLabError.
pub type StrokeLabResult<T> = Result<T, StrokeLabError>;

impl StrokeLabError {
    pub fn extraction(msg: impl Into<String>) -> Self {
        Self::Extraction {
            message: msg.into(),
        }
    }

    pub fn analysis(msg: impl Into<String>) -> Self {
        Self::Analysis {
            message: msg.into(),
        }
    }

    pub fn archive(msg: impl Into<String>) -> Self {
        Self::Archive {
            message: msg.into(),
        }
    }

    pub fn media_source(msg: impl Into<String>) -> Self {
        Self::MediaSource {
            message: msg.into(),
        }
    }

    pub fn estimator(msg: impl Into<String>) -> Self {
        Self::Estimator {
            message: msg.into(),
        }
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }
}
