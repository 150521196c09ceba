use std::path::PathBuf;

use thiserror::Error;

/// Error taxonomy shared by every pipeline step.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("{what} not found: {}", .path.display())]
    InputMissing { what: &'static str, path: PathBuf },
    #[error("{0}")]
    EmptyInput(String),
    #[error("validation failed: {0}")]
    Validation(String),
    #[error("{engine} unavailable: {reason}")]
    EngineUnavailable { engine: &'static str, reason: String },
    #[error("no valid frames with chainage data")]
    NoValidFrames,
    #[error("decode failed (exit code {exit_code:?}): {stderr}")]
    Decode {
        exit_code: Option<i32>,
        stderr: String,
    },
    #[error("config error: {0}")]
    Config(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("image error: {0}")]
    Image(#[from] image::ImageError),
}

pub type PipelineResult<T> = Result<T, PipelineError>;

impl PipelineError {
    pub fn input_missing(what: &'static str, path: impl Into<PathBuf>) -> Self {
        Self::InputMissing {
            what,
            path: path.into(),
        }
    }

    pub fn engine_unavailable(engine: &'static str, reason: impl Into<String>) -> Self {
        Self::EngineUnavailable {
            engine,
            reason: reason.into(),
        }
    }

    /// Stable, machine-readable kind used in step outcomes.
    pub fn error_type(&self) -> &'static str {
        match self {
            Self::InputMissing { .. } => "InputMissing",
            Self::EmptyInput(_) => "EmptyInput",
            Self::Validation(_) => "ValidationFailure",
            Self::EngineUnavailable { .. } => "EngineUnavailable",
            Self::NoValidFrames => "NoValidFrames",
            Self::Decode { .. } => "DecodeFailure",
            Self::Config(_) => "ConfigError",
            Self::Io(_) => "Io",
            Self::Json(_) => "ParseFailure",
            Self::Image(_) => "ImageError",
        }
    }
}
