//! Abstract repository service used by the deploy flow.

use std::future::Future;
use std::pin::Pin;

use wharf_build_info::BuildInfo;
use wharf_client::{ClientError, DeployDetails, RepoClient, UploadResult};

/// The subset of repository operations the deploy pipeline needs.
///
/// Using a trait keeps orchestration decoupled from the HTTP transport
/// and testable with recording fakes.
pub trait RepositoryService: Send + Sync {
    /// Checks for an existing artifact with the same file name in the
    /// target repository.
    fn has_duplicate<'a>(
        &'a self,
        details: &'a DeployDetails,
    ) -> Pin<Box<dyn Future<Output = Result<bool, ClientError>> + Send + 'a>>;

    /// Uploads one artifact.
    fn deploy_artifact<'a>(
        &'a self,
        details: &'a DeployDetails,
    ) -> Pin<Box<dyn Future<Output = Result<UploadResult, ClientError>> + Send + 'a>>;

    /// Publishes the build-info document.
    fn send_build_info<'a>(
        &'a self,
        build: &'a BuildInfo,
    ) -> Pin<Box<dyn Future<Output = Result<(), ClientError>> + Send + 'a>>;
}

impl RepositoryService for RepoClient {
    fn has_duplicate<'a>(
        &'a self,
        details: &'a DeployDetails,
    ) -> Pin<Box<dyn Future<Output = Result<bool, ClientError>> + Send + 'a>> {
        Box::pin(RepoClient::has_duplicate(self, details))
    }

    fn deploy_artifact<'a>(
        &'a self,
        details: &'a DeployDetails,
    ) -> Pin<Box<dyn Future<Output = Result<UploadResult, ClientError>> + Send + 'a>> {
        Box::pin(RepoClient::deploy_artifact(self, details))
    }

    fn send_build_info<'a>(
        &'a self,
        build: &'a BuildInfo,
    ) -> Pin<Box<dyn Future<Output = Result<(), ClientError>> + Send + 'a>> {
        Box::pin(RepoClient::send_build_info(self, build))
    }
}
