//! Pre-flight duplicate gate.
//!
//! Before any byte is uploaded, every non-excluded deployable is checked
//! against the target repository. The whole batch is all-or-nothing: one
//! duplicate anywhere aborts the deploy and the build-info send.

use tracing::{info, warn};
use wharf_patterns::{IncludeExcludePatterns, path_conflicts};

use crate::assemble::DeployableSet;
use crate::error::{DeployError, DuplicateEntry};
use crate::service::RepositoryService;

/// Scans the set for artifacts that already exist on the server.
///
/// The scan runs to completion so the caller gets the full duplicate
/// list, except on a transport failure, which aborts immediately naming
/// the file being checked.
pub async fn check_duplicates(
    service: &dyn RepositoryService,
    set: &DeployableSet,
    patterns: &IncludeExcludePatterns,
) -> Result<(), DeployError> {
    let mut duplicates = Vec::new();

    for details in set.iter() {
        if path_conflicts(&details.artifact_path, patterns) {
            info!(
                path = %details.artifact_path,
                "skipping duplicate check due to the configured include-exclude patterns"
            );
            continue;
        }

        match service.has_duplicate(details).await {
            Ok(true) => {
                warn!(
                    file = %details.file_name(),
                    repo = %details.target_repository,
                    "artifact already exists in target repository"
                );
                duplicates.push(DuplicateEntry {
                    file_name: details.file_name().to_string(),
                    repository: details.target_repository.clone(),
                });
            }
            Ok(false) => {}
            Err(source) => {
                return Err(DeployError::DuplicateCheck {
                    file: details.file.display().to_string(),
                    source,
                });
            }
        }
    }

    if duplicates.is_empty() {
        Ok(())
    } else {
        Err(DeployError::DuplicateConflict(duplicates))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::future::Future;
    use std::path::Path;
    use std::pin::Pin;
    use std::sync::Mutex;
    use tempfile::TempDir;
    use wharf_build_info::BuildInfo;
    use wharf_client::{ClientError, DeployDetails, UploadResult};

    struct FakeService {
        duplicates: Vec<String>,
        fail_check_on: Option<String>,
        checked: Mutex<Vec<String>>,
    }

    impl FakeService {
        fn new(duplicates: &[&str]) -> Self {
            Self {
                duplicates: duplicates.iter().map(|s| s.to_string()).collect(),
                fail_check_on: None,
                checked: Mutex::new(Vec::new()),
            }
        }
    }

    impl RepositoryService for FakeService {
        fn has_duplicate<'a>(
            &'a self,
            details: &'a DeployDetails,
        ) -> Pin<Box<dyn Future<Output = Result<bool, ClientError>> + Send + 'a>> {
            Box::pin(async move {
                let name = details.file_name().to_string();
                self.checked.lock().unwrap().push(name.clone());
                if self.fail_check_on.as_deref() == Some(name.as_str()) {
                    return Err(ClientError::Status {
                        context: "failed to obtain list of duplicates".into(),
                        status: 500,
                        reason: "Internal Server Error".into(),
                    });
                }
                Ok(self.duplicates.contains(&name))
            })
        }

        fn deploy_artifact<'a>(
            &'a self,
            _details: &'a DeployDetails,
        ) -> Pin<Box<dyn Future<Output = Result<UploadResult, ClientError>> + Send + 'a>>
        {
            Box::pin(async { Ok(UploadResult::FullUpload) })
        }

        fn send_build_info<'a>(
            &'a self,
            _build: &'a BuildInfo,
        ) -> Pin<Box<dyn Future<Output = Result<(), ClientError>> + Send + 'a>> {
            Box::pin(async { Ok(()) })
        }
    }

    fn set_of(dir: &Path, names: &[&str]) -> DeployableSet {
        names
            .iter()
            .map(|name| {
                let file = dir.join(name);
                std::fs::write(&file, b"X").unwrap();
                DeployDetails::builder()
                    .target_repository("libs-release")
                    .artifact_path(format!("org/x/{name}"))
                    .file(file)
                    .build()
                    .unwrap()
            })
            .collect()
    }

    #[tokio::test]
    async fn clean_set_passes() {
        let dir = TempDir::new().unwrap();
        let set = set_of(dir.path(), &["a.jar", "b.jar"]);
        let service = FakeService::new(&[]);

        check_duplicates(&service, &set, &IncludeExcludePatterns::default())
            .await
            .unwrap();
        assert_eq!(service.checked.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn scan_completes_and_reports_every_duplicate() {
        let dir = TempDir::new().unwrap();
        let set = set_of(dir.path(), &["a.jar", "b.jar", "c.jar"]);
        let service = FakeService::new(&["a.jar", "c.jar"]);

        let err = check_duplicates(&service, &set, &IncludeExcludePatterns::default())
            .await
            .unwrap_err();

        // All three were checked before the abort.
        assert_eq!(service.checked.lock().unwrap().len(), 3);
        let DeployError::DuplicateConflict(duplicates) = err else {
            panic!("expected duplicate conflict, got {err}");
        };
        let names: Vec<&str> = duplicates.iter().map(|d| d.file_name.as_str()).collect();
        assert_eq!(names, vec!["a.jar", "c.jar"]);
        assert_eq!(duplicates[0].repository, "libs-release");
    }

    #[tokio::test]
    async fn transport_failure_aborts_immediately() {
        let dir = TempDir::new().unwrap();
        let set = set_of(dir.path(), &["a.jar", "b.jar", "c.jar"]);
        let mut service = FakeService::new(&[]);
        service.fail_check_on = Some("b.jar".into());

        let err = check_duplicates(&service, &set, &IncludeExcludePatterns::default())
            .await
            .unwrap_err();

        assert!(matches!(err, DeployError::DuplicateCheck { .. }));
        assert!(err.to_string().contains("b.jar"));
        // c.jar was never checked.
        assert_eq!(
            *service.checked.lock().unwrap(),
            vec!["a.jar".to_string(), "b.jar".to_string()]
        );
    }

    #[tokio::test]
    async fn excluded_paths_are_not_checked() {
        let dir = TempDir::new().unwrap();
        let set = set_of(dir.path(), &["a.jar", "a-sources.jar"]);
        // The excluded artifact is a known duplicate, but exclusion wins.
        let service = FakeService::new(&["a-sources.jar"]);
        let patterns = IncludeExcludePatterns::new("", "**/*-sources.jar");

        check_duplicates(&service, &set, &patterns).await.unwrap();
        assert_eq!(*service.checked.lock().unwrap(), vec!["a.jar".to_string()]);
    }
}
