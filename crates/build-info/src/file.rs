//! Persisting build-info documents to disk.

use std::path::Path;

use crate::{BuildInfo, BuildInfoError};

/// Writes `build` to `path` as pretty-printed JSON, creating parent
/// directories as needed. Overwrites in place.
pub fn save_to_file(build: &BuildInfo, path: &Path) -> Result<(), BuildInfoError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let json = serde_json::to_string_pretty(build)?;
    std::fs::write(path, json)?;
    Ok(())
}

/// Loads a build-info document from `path`.
pub fn load_from_file(path: &Path) -> Result<BuildInfo, BuildInfoError> {
    let data = std::fs::read(path)?;
    Ok(serde_json::from_slice(&data)?)
}
