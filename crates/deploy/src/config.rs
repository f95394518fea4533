//! Publisher configuration for one deploy call.

use std::path::PathBuf;
use std::time::Duration;

use wharf_client::ClientConfig;

/// Controls what a deploy call publishes and where.
#[derive(Debug, Clone)]
pub struct PublisherConfig {
    /// Repository service base URL.
    pub url: String,
    pub username: Option<String>,
    pub password: Option<String>,
    /// Connect/response timeout for service calls.
    pub timeout: Duration,
    pub publish_artifacts: bool,
    pub publish_build_info: bool,
    /// Deploy even when the build had test failures.
    pub even_unstable: bool,
    /// Comma- or whitespace-delimited glob patterns selecting which
    /// artifact paths are duplicate-checked and deployed.
    pub include_patterns: String,
    pub exclude_patterns: String,
    /// Where the build-info export is written. Defaults to
    /// `<workspace_root>/target/build-info.json`.
    pub export_file: Option<PathBuf>,
    /// Workspace root, used for the default export location.
    pub workspace_root: PathBuf,
    pub aggregation: Option<AggregationConfig>,
}

impl PublisherConfig {
    pub fn new(url: impl Into<String>, workspace_root: impl Into<PathBuf>) -> Self {
        Self {
            url: url.into(),
            username: None,
            password: None,
            timeout: Duration::from_secs(300),
            publish_artifacts: true,
            publish_build_info: true,
            even_unstable: false,
            include_patterns: String::new(),
            exclude_patterns: String::new(),
            export_file: None,
            workspace_root: workspace_root.into(),
            aggregation: None,
        }
    }

    /// Connection settings for the repository client this config targets.
    pub fn client_config(&self) -> ClientConfig {
        let mut config = ClientConfig::new(self.url.clone()).timeout(self.timeout);
        if let Some(username) = &self.username {
            config = config.credentials(
                username.clone(),
                self.password.clone().unwrap_or_default(),
            );
        }
        config
    }
}

/// Cross-agent aggregation settings.
#[derive(Debug, Clone)]
pub struct AggregationConfig {
    /// Shared directory holding the consolidated build-info document and
    /// deployables manifest.
    pub dir: PathBuf,
    /// Copy each deployable's file into the directory, laid out by its
    /// path relative to the workspace root.
    pub copy_artifacts: bool,
    /// Deploy the merged manifest after aggregating. When false the
    /// pipeline stops after the aggregation step.
    pub publish_aggregated: bool,
}
