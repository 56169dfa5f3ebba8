use emberaid_common::UploadError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum EmberAidError {
    #[error("Config error: {0}")]
    Config(String),

    #[error("File not found: {0}")]
    FileNotFound(String),

    #[error("{0}")]
    InvalidImage(#[from] UploadError),

    #[error("Image load error: {0}")]
    ImageLoad(String),

    #[error("Detection service error: {0}")]
    Detection(String),

    /// 検出もフォールバックも失敗した
    #[error("Failed to process the image. Please try again.")]
    ProcessingFailed,

    #[error("Export error: {0}")]
    Export(String),

    #[error("Unsupported session file version {found} (expected {expected})")]
    SessionVersion { found: u32, expected: u32 },

    #[error("An export is already in progress")]
    ExportInProgress,

    #[error("JSON error: {0}")]
    JsonParse(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Common(#[from] emberaid_common::Error),

    #[error("CLI error: {0}")]
    CliExecution(String),
}

pub type Result<T> = std::result::Result<T, EmberAidError>;
