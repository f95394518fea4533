//! Build information documents.
//!
//! A build-info document records one build's modules, artifacts,
//! dependencies and timing. The schema here is deliberately small: the
//! fields this crate must read and merge are typed, everything else rides
//! along verbatim in an opaque extras bag.

mod builder;
mod file;
mod types;

pub use builder::BuildInfoBuilder;
pub use file::{load_from_file, save_to_file};
pub use types::{Artifact, BuildInfo, Dependency, Module, STARTED_FORMAT, format_started};

/// Errors produced while reading or writing build-info documents.
#[derive(Debug, thiserror::Error)]
pub enum BuildInfoError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub(crate) fn is_blank(s: &str) -> bool {
    s.trim().is_empty()
}
