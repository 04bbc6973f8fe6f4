use std::io;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SetupError {
    #[error("Unsupported platform {0}")]
    UnsupportedPlatform(String),
    #[error("Unsupported platform or architecture: {os} {arch}")]
    UnsupportedArchitecture { os: String, arch: String },
    #[error("Could not find 'curl' or 'wget' in your path")]
    MissingHttpClient,
    #[error("download failed: {url} ({reason})")]
    DownloadFailure { url: String, reason: String },
    #[error("extraction failed: {0}")]
    ExtractionFailure(String),
    #[error("disk image error: {0}")]
    MountFailure(String),
    #[error("config error: {0}")]
    Config(String),
    #[error("io error: {0}")]
    Io(#[from] io::Error),
    #[error("prompt error: {0}")]
    Prompt(#[from] dialoguer::Error),
}
