//! Deploy pipeline orchestration.
//!
//! One deploy call runs: assemble → aggregate (optional) → duplicate
//! gate → upload each artifact → send build info. Any failure before the
//! upload phase is terminal for the whole call; a failure inside the
//! upload phase skips the remaining uploads and the build-info send.

use std::collections::HashMap;
use std::path::PathBuf;

use tracing::{debug, info};
use wharf_build_info::BuildInfo;
use wharf_client::DeployDetails;
use wharf_patterns::{IncludeExcludePatterns, path_conflicts};

use crate::aggregate::{AGGREGATED_BUILD_INFO, AggregateOutcome, Aggregator};
use crate::assemble::assemble_deployables;
use crate::config::PublisherConfig;
use crate::error::DeployError;
use crate::gate::check_duplicates;
use crate::service::RepositoryService;

/// Result of one deploy call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeployOutcome {
    /// Artifacts actually uploaded.
    pub uploaded: usize,
    /// Whether the build-info document was sent.
    pub build_info_sent: bool,
    /// True when aggregation-only mode stopped the pipeline early.
    pub aggregated_only: bool,
}

/// Sequences one build's deployment against a repository service.
pub struct Deployer {
    config: PublisherConfig,
}

impl Deployer {
    pub fn new(config: PublisherConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &PublisherConfig {
        &self.config
    }

    /// Runs the full pipeline for one build.
    ///
    /// `templates` maps artifact ids (see [`crate::artifact_id`]) to the
    /// caller-supplied deploy details for that artifact. Checksums
    /// computed during assembly are attached to `build`'s artifact
    /// records, so the published document carries them.
    pub async fn deploy(
        &self,
        service: &dyn RepositoryService,
        build: &mut BuildInfo,
        templates: &HashMap<String, DeployDetails>,
        tests_failed: bool,
    ) -> Result<DeployOutcome, DeployError> {
        let mut set = assemble_deployables(build, templates);
        debug!(deployables = set.len(), "assembled deployable artifact set");

        if self.config.publish_build_info || self.config.aggregation.is_some() {
            let export = self.export_path();
            info!(path = %export.display(), "saving build info");
            wharf_build_info::save_to_file(build, &export).map_err(|source| {
                DeployError::BuildInfoExport {
                    path: export.clone(),
                    source,
                }
            })?;
        }

        let mut aggregated_info: Option<PathBuf> = None;
        if let Some(aggregation) = &self.config.aggregation {
            match Aggregator::new(aggregation.clone()).aggregate(build, &set)? {
                AggregateOutcome::Stop => {
                    return Ok(DeployOutcome {
                        aggregated_only: true,
                        ..DeployOutcome::default()
                    });
                }
                AggregateOutcome::Publish(merged) => {
                    aggregated_info = Some(aggregation.dir.join(AGGREGATED_BUILD_INFO));
                    set = merged;
                }
            }
        }

        if !self.config.publish_build_info && !self.config.publish_artifacts {
            debug!("publishing disabled, nothing to deploy");
            return Ok(DeployOutcome::default());
        }

        let stable_enough = self.config.even_unstable || !tests_failed;
        if !stable_enough {
            info!("tests failed and deploying unstable builds is disabled, skipping");
        }
        let deploy_artifacts = self.config.publish_artifacts && !set.is_empty() && stable_enough;
        let send_build_info = self.config.publish_build_info && stable_enough;

        let patterns = IncludeExcludePatterns::new(
            &self.config.include_patterns,
            &self.config.exclude_patterns,
        );

        let mut uploaded = 0;
        if deploy_artifacts {
            info!(url = %self.config.url, count = set.len(), "deploying artifacts");
            check_duplicates(service, &set, &patterns).await?;

            for details in set.iter() {
                if path_conflicts(&details.artifact_path, &patterns) {
                    info!(
                        path = %details.artifact_path,
                        "skipping deployment due to the configured include-exclude patterns"
                    );
                    continue;
                }
                service
                    .deploy_artifact(details)
                    .await
                    .map_err(|source| DeployError::Upload {
                        file: details.file.display().to_string(),
                        source,
                    })?;
                uploaded += 1;
            }
        }

        let mut build_info_sent = false;
        if send_build_info {
            let to_send = match &aggregated_info {
                Some(path) => {
                    // Publish the consolidated record, re-merged with the
                    // current document.
                    let previous = wharf_build_info::load_from_file(path).map_err(|e| {
                        DeployError::Aggregation {
                            path: path.clone(),
                            source: Box::new(e),
                        }
                    })?;
                    BuildInfo::merge_aggregate(previous, build.clone())
                }
                None => build.clone(),
            };
            service.send_build_info(&to_send).await?;
            build_info_sent = true;
        }

        Ok(DeployOutcome {
            uploaded,
            build_info_sent,
            aggregated_only: false,
        })
    }

    fn export_path(&self) -> PathBuf {
        match &self.config.export_file {
            Some(path) => path.clone(),
            None => self
                .config
                .workspace_root
                .join("target")
                .join("build-info.json"),
        }
    }
}
