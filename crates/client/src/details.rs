//! Deploy request details for one artifact.

use std::hash::{Hash, Hasher};
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::{ClientError, is_blank};

/// Properties attached to a deployed artifact as matrix parameters.
///
/// An insertion-ordered multimap: the same key may repeat with different
/// values, and the order entries were added is the order they appear on
/// the deployment URL.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Properties(Vec<(String, String)>);

impl Properties {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.0.push((key.into(), value.into()));
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Properties {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

/// Everything needed to deploy one artifact: target repository, path
/// within it, the local file and its digests, plus matrix properties.
///
/// Identity is the `artifact_path` alone — two details with the same path
/// are the same deployable regardless of their other fields.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeployDetails {
    pub target_repository: String,
    pub artifact_path: String,
    pub file: PathBuf,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub sha1: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub md5: String,
    #[serde(default, skip_serializing_if = "Properties::is_empty")]
    pub properties: Properties,
}

impl DeployDetails {
    pub fn builder() -> DeployDetailsBuilder {
        DeployDetailsBuilder::default()
    }

    /// The artifact's file name: the last segment of its deploy path.
    pub fn file_name(&self) -> &str {
        self.artifact_path
            .rsplit('/')
            .next()
            .unwrap_or(&self.artifact_path)
    }
}

impl PartialEq for DeployDetails {
    fn eq(&self, other: &Self) -> bool {
        self.artifact_path == other.artifact_path
    }
}

impl Eq for DeployDetails {}

impl Hash for DeployDetails {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.artifact_path.hash(state);
    }
}

/// Builder validating a [`DeployDetails`] before any network activity.
#[derive(Debug, Default)]
pub struct DeployDetailsBuilder {
    target_repository: String,
    artifact_path: String,
    file: Option<PathBuf>,
    sha1: String,
    md5: String,
    properties: Properties,
}

impl DeployDetailsBuilder {
    pub fn target_repository(mut self, repo: impl Into<String>) -> Self {
        self.target_repository = repo.into();
        self
    }

    pub fn artifact_path(mut self, path: impl Into<String>) -> Self {
        self.artifact_path = path.into();
        self
    }

    pub fn file(mut self, file: impl Into<PathBuf>) -> Self {
        self.file = Some(file.into());
        self
    }

    pub fn sha1(mut self, sha1: impl Into<String>) -> Self {
        self.sha1 = sha1.into();
        self
    }

    pub fn md5(mut self, md5: impl Into<String>) -> Self {
        self.md5 = md5.into();
        self
    }

    pub fn add_property(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.properties.add(key, value);
        self
    }

    pub fn properties(mut self, properties: Properties) -> Self {
        self.properties = properties;
        self
    }

    /// Validates and builds. Fails when the file does not exist on disk
    /// or the target repository / artifact path is blank.
    pub fn build(self) -> Result<DeployDetails, ClientError> {
        let file = match self.file {
            Some(file) if file.is_file() => file,
            Some(file) => {
                return Err(ClientError::Validation(format!(
                    "file not found: {}",
                    file.display()
                )));
            }
            None => {
                return Err(ClientError::Validation("file not found: <unset>".into()));
            }
        };
        if is_blank(&self.target_repository) {
            return Err(ClientError::Validation(
                "target repository cannot be empty".into(),
            ));
        }
        if is_blank(&self.artifact_path) {
            return Err(ClientError::Validation(
                "artifact path cannot be empty".into(),
            ));
        }

        Ok(DeployDetails {
            target_repository: self.target_repository,
            artifact_path: self.artifact_path,
            file,
            sha1: self.sha1,
            md5: self.md5,
            properties: self.properties,
        })
    }
}
