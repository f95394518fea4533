//! HTTP client for the artifact repository service.
//!
//! Implements the deploy wire protocol: checksum-only deploy with a
//! full-body fallback, checksum side-files for older servers, duplicate
//! search, repository enumeration and build-info publishing.

mod client;
mod details;
mod url;
mod version;

pub use client::{
    CHECKSUM_DEPLOY_MIN_FILE_SIZE, ClientConfig, RepoClient, RepoKind, UploadResult,
};
pub use details::{DeployDetails, DeployDetailsBuilder, Properties};
pub use url::{deployment_url, encode_path, matrix_params};
pub use version::{ServiceCapabilities, ServiceVersion};

/// Errors produced by the repository client.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("validation error: {0}")]
    Validation(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("{context}: HTTP response code: {status}. HTTP response message: {reason}")]
    Status {
        context: String,
        status: u16,
        reason: String,
    },

    #[error("incompatible service version: {0}")]
    VersionIncompatible(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("checksum error: {0}")]
    Checksum(#[from] wharf_checksum::ChecksumError),
}

pub(crate) fn is_blank(s: &str) -> bool {
    s.trim().is_empty()
}
