//! Cross-agent aggregation of build info and deployable manifests.
//!
//! The aggregation directory is a cooperative rendezvous shared by
//! independently scheduled build agents (modules built on different
//! machines or in separate invocations). The first agent creates the
//! consolidated files; every later agent read-merges-overwrites them in
//! place. There is no locking: concurrent agents racing on the same
//! directory can lose updates.

use std::path::{Component, Path, PathBuf};

use tracing::{debug, info};
use wharf_build_info::BuildInfo;
use wharf_client::DeployDetails;

use crate::assemble::DeployableSet;
use crate::config::AggregationConfig;
use crate::error::DeployError;

/// Consolidated build-info document inside the aggregation directory.
pub const AGGREGATED_BUILD_INFO: &str = "build-info.json";
/// Consolidated deployables manifest inside the aggregation directory.
pub const AGGREGATED_DEPLOYABLES: &str = "deployables.json";

/// What the orchestrator should do after the aggregation step.
#[derive(Debug)]
pub enum AggregateOutcome {
    /// Aggregation-only mode: nothing is gated, uploaded or sent.
    Stop,
    /// Continue the deploy with the merged deployable set.
    Publish(DeployableSet),
}

/// Merges one agent's build info and deployables into shared storage.
pub struct Aggregator {
    config: AggregationConfig,
}

impl Aggregator {
    pub fn new(config: AggregationConfig) -> Self {
        Self { config }
    }

    /// Runs one agent's aggregation step: merge-or-create both
    /// consolidated files, optionally copy artifact files into the
    /// directory, and decide whether the pipeline continues.
    pub fn aggregate(
        &self,
        build: &BuildInfo,
        set: &DeployableSet,
    ) -> Result<AggregateOutcome, DeployError> {
        std::fs::create_dir_all(&self.config.dir).map_err(|e| self.aggregation_error(e))?;

        self.merge_build_info(build)?;
        let merged = self.merge_deployables(set)?;

        if self.config.copy_artifacts {
            self.copy_artifacts(set)?;
        }

        if !self.config.publish_aggregated {
            info!(
                dir = %self.config.dir.display(),
                "aggregation-only mode, skipping duplicate check, deployment and build info"
            );
            return Ok(AggregateOutcome::Stop);
        }

        Ok(AggregateOutcome::Publish(self.rehydrate(merged)?))
    }

    /// Merges the current document into `build-info.json`, or creates it
    /// as the first writer. `started` keeps the first contributor's
    /// value; `durationMillis` accumulates.
    fn merge_build_info(&self, build: &BuildInfo) -> Result<(), DeployError> {
        let path = self.config.dir.join(AGGREGATED_BUILD_INFO);
        let merged = if path.is_file() {
            debug!(path = %path.display(), "merging with previously aggregated build info");
            let previous =
                wharf_build_info::load_from_file(&path).map_err(|e| self.aggregation_error(e))?;
            BuildInfo::merge_aggregate(previous, build.clone())
        } else {
            debug!(path = %path.display(), "first aggregating agent, copying build info");
            build.clone()
        };
        wharf_build_info::save_to_file(&merged, &path).map_err(|e| self.aggregation_error(e))
    }

    /// Unions the current deployables into `deployables.json` by
    /// artifact path; current entries win over a prior agent's.
    fn merge_deployables(&self, set: &DeployableSet) -> Result<DeployableSet, DeployError> {
        let path = self.config.dir.join(AGGREGATED_DEPLOYABLES);
        let mut merged: DeployableSet = set.iter().cloned().collect();

        if path.is_file() {
            let data = std::fs::read(&path).map_err(|e| self.aggregation_error(e))?;
            let previous: Vec<DeployDetails> =
                serde_json::from_slice(&data).map_err(|e| self.aggregation_error(e))?;
            debug!(
                current = merged.len(),
                previous = previous.len(),
                "merging deployables manifest"
            );
            for details in previous {
                merged.push(details);
            }
        }

        let json =
            serde_json::to_string_pretty(merged.as_slice()).map_err(|e| self.aggregation_error(e))?;
        std::fs::write(&path, json).map_err(|e| self.aggregation_error(e))?;
        Ok(merged)
    }

    fn copy_artifacts(&self, set: &DeployableSet) -> Result<(), DeployError> {
        for details in set.iter() {
            let dest = self.aggregated_file(&details.file);
            if let Some(parent) = dest.parent() {
                std::fs::create_dir_all(parent).map_err(|e| self.aggregation_error(e))?;
            }
            debug!(
                from = %details.file.display(),
                to = %dest.display(),
                "copying aggregated artifact"
            );
            std::fs::copy(&details.file, &dest).map_err(|e| self.aggregation_error(e))?;
        }
        Ok(())
    }

    /// Maps an artifact's filesystem path to its copy inside the
    /// aggregation directory, keyed by the path relative to the
    /// workspace root (the aggregation directory's parent).
    ///
    /// An artifact outside the workspace keeps its full path, re-rooted
    /// under the directory unsanitized.
    fn aggregated_file(&self, file: &Path) -> PathBuf {
        let workspace = self
            .config
            .dir
            .parent()
            .unwrap_or(self.config.dir.as_path());
        let workspace = workspace
            .canonicalize()
            .unwrap_or_else(|_| workspace.to_path_buf());
        let file = file.canonicalize().unwrap_or_else(|_| file.to_path_buf());

        let relative = match file.strip_prefix(&workspace) {
            Ok(rel) => rel.to_path_buf(),
            Err(_) => file
                .components()
                .filter(|c| matches!(c, Component::Normal(_)))
                .collect(),
        };
        self.config.dir.join(relative)
    }

    /// Rebuilds the deployable set from the merged manifest, re-applying
    /// the copy-path rewrite when copying is enabled. Entries are
    /// re-validated: a manifest row whose file is absent on this machine
    /// fails the whole aggregation.
    fn rehydrate(&self, merged: DeployableSet) -> Result<DeployableSet, DeployError> {
        let mut out = DeployableSet::new();
        for details in merged {
            let file = if self.config.copy_artifacts {
                self.aggregated_file(&details.file)
            } else {
                details.file.clone()
            };
            let rebuilt = DeployDetails::builder()
                .target_repository(details.target_repository)
                .artifact_path(details.artifact_path)
                .file(file)
                .sha1(details.sha1)
                .md5(details.md5)
                .properties(details.properties)
                .build()?;
            out.push(rebuilt);
        }
        Ok(out)
    }

    fn aggregation_error(&self, source: impl std::error::Error + Send + Sync + 'static) -> DeployError {
        DeployError::Aggregation {
            path: self.config.dir.clone(),
            source: Box::new(source),
        }
    }
}
