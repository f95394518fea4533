//! Deploy flow error types.

use std::path::PathBuf;

use wharf_client::ClientError;

/// One artifact that already exists in its target repository.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DuplicateEntry {
    pub file_name: String,
    pub repository: String,
}

/// Errors produced during a deploy call.
#[derive(Debug, thiserror::Error)]
pub enum DeployError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Client(#[from] ClientError),

    #[error(
        "error while checking duplicate of {file}; skipping deployment of remaining artifacts (if any) and build info: {source}"
    )]
    DuplicateCheck {
        file: String,
        #[source]
        source: ClientError,
    },

    #[error("{}", format_duplicates(.0))]
    DuplicateConflict(Vec<DuplicateEntry>),

    #[error(
        "error while deploying {file}; skipping deployment of remaining artifacts (if any) and build info: {source}"
    )]
    Upload {
        file: String,
        #[source]
        source: ClientError,
    },

    #[error("failed to save build info to {}: {source}", .path.display())]
    BuildInfoExport {
        path: PathBuf,
        #[source]
        source: wharf_build_info::BuildInfoError,
    },

    #[error("failed to aggregate artifacts and build info in {}: {source}", .path.display())]
    Aggregation {
        path: PathBuf,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

fn format_duplicates(entries: &[DuplicateEntry]) -> String {
    let mut msg =
        String::from("the following artifacts have duplicates in the target repository:\n");
    for entry in entries {
        msg.push_str(&entry.file_name);
        msg.push_str(", repo: ");
        msg.push_str(&entry.repository);
        msg.push('\n');
    }
    msg.push_str("skipping deployment of artifacts (if any) and build info");
    msg
}
