use std::fmt;

use miette::Diagnostic;
use thiserror::Error;

/// Pipeline stage a background worker was running when it failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineStage {
    Slice,
    Dedup,
}

impl fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PipelineStage::Slice => write!(f, "slice"),
            PipelineStage::Dedup => write!(f, "dedup"),
        }
    }
}

/// Main error type for tilex operations
#[derive(Error, Diagnostic, Debug)]
pub enum TileError {
    #[error("IO error: {0}")]
    #[diagnostic(code(tilex::io))]
    IoError(#[from] std::io::Error),

    #[error("IO error with {path}: {message}")]
    #[diagnostic(code(tilex::io))]
    Io {
        path: std::path::PathBuf,
        message: String,
    },

    #[error("Parse error: {message}")]
    #[diagnostic(code(tilex::parse))]
    Parse {
        message: String,
        #[help]
        help: Option<String>,
    },

    #[error("Configuration error: {message}")]
    #[diagnostic(code(tilex::config))]
    Config {
        message: String,
        #[help]
        help: Option<String>,
    },

    #[error("Coordinates out of bounds: {col},{row}")]
    #[diagnostic(
        code(tilex::out_of_bounds),
        help("Grid coordinates must satisfy 0 <= col < width and 0 <= row < height")
    )]
    OutOfBounds { col: i64, row: i64 },

    #[error("Worker error in {stage} stage: {message}")]
    #[diagnostic(code(tilex::worker))]
    Worker {
        stage: PipelineStage,
        message: String,
    },

    #[error("Worker in {stage} stage did not respond within {seconds}s")]
    #[diagnostic(
        code(tilex::worker_timeout),
        help("Raise worker_timeout_secs in tilex.yaml for very large maps")
    )]
    WorkerTimeout { stage: PipelineStage, seconds: u64 },

    #[error("Upload error: {message}")]
    #[diagnostic(code(tilex::upload))]
    Upload { message: String },
}

impl TileError {
    /// Shorthand for a configuration error with a help line.
    pub fn config(message: impl Into<String>, help: impl Into<String>) -> Self {
        TileError::Config {
            message: message.into(),
            help: Some(help.into()),
        }
    }

    /// The pipeline stage this error belongs to, if it came from a worker.
    pub fn stage(&self) -> Option<PipelineStage> {
        match self {
            TileError::Worker { stage, .. } | TileError::WorkerTimeout { stage, .. } => {
                Some(*stage)
            }
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, TileError>;
