use std::path::PathBuf;

use miette::Diagnostic;
use thiserror::Error;

#[derive(Debug, Error, Diagnostic)]
pub enum OzoneError {
    #[error("LEDAPS_AUX_DIR environment variable not set")]
    #[diagnostic(help("export LEDAPS_AUX_DIR=<ancillary data root>"))]
    MissingAuxDir,

    #[error("invalid year selection: {0}")]
    #[diagnostic(help("use --today, --quarterly, or both --start-year and --end-year"))]
    InvalidSelection(String),

    #[error("failed to read config file at {0}")]
    ConfigRead(PathBuf),

    #[error("failed to parse JSON config: {0}")]
    ConfigParse(String),

    #[error("day-of-year {day} is out of range for year {year}")]
    InvalidDayOfYear { year: i32, day: u32 },

    #[error("no ozone data source covers year {0}")]
    NoCoverage(i32),

    #[error("download failed: {0}")]
    Download(String),

    #[error("archive returned status {status}: {message}")]
    DownloadStatus { status: u16, message: String },

    #[error("ozone conversion failed: {0}")]
    Conversion(String),

    #[error("required tool not found: {0}")]
    MissingTool(String),

    #[error("filesystem error: {0}")]
    Filesystem(String),
}
