use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ArchiveError {
    #[error("unknown user: {0}")]
    UnknownUser(String),

    #[error("unsupported attachment {file_id}: neither thumb_960 nor thumb_video is present")]
    UnsupportedAttachment { file_id: String },

    #[error("file {file_id} is missing field `{field}`")]
    MissingFileField {
        file_id: String,
        field: &'static str,
    },

    #[error("invalid timestamp: {0}")]
    InvalidTimestamp(String),

    #[error("unknown time zone: {0}")]
    UnknownTimeZone(String),

    #[error("invalid travel window: {0}")]
    InvalidTravelWindow(String),

    #[error("no json files found under {path}")]
    NoInputFiles { path: PathBuf },

    #[error("config file not found: {path}")]
    ConfigNotFound { path: PathBuf },

    #[error("invalid config {path}: {source}")]
    InvalidConfig {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("i/o error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid json in {path}: {source}")]
    InvalidJson {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

pub type Result<T> = std::result::Result<T, ArchiveError>;
