//! Assembling the deployable artifact set for one build.
//!
//! The build's module tree supplies artifact identities; the caller
//! supplies deploy templates (target repository, path, properties) keyed
//! by artifact id. Only artifacts present in both are deployed.

use std::collections::{HashMap, HashSet};

use tracing::{debug, warn};
use wharf_build_info::BuildInfo;
use wharf_client::DeployDetails;

/// Identifier joining a module and one of its artifacts.
pub fn artifact_id(module_id: &str, artifact_name: &str) -> String {
    format!("{module_id}:{artifact_name}")
}

/// Insertion-ordered set of deploy details, deduplicated by artifact path.
#[derive(Debug, Clone, Default)]
pub struct DeployableSet {
    items: Vec<DeployDetails>,
    paths: HashSet<String>,
}

impl DeployableSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a deployable. Returns false when an entry with the same
    /// artifact path is already present; the existing entry wins.
    pub fn push(&mut self, details: DeployDetails) -> bool {
        if self.paths.contains(&details.artifact_path) {
            return false;
        }
        self.paths.insert(details.artifact_path.clone());
        self.items.push(details);
        true
    }

    pub fn iter(&self) -> impl Iterator<Item = &DeployDetails> {
        self.items.iter()
    }

    pub fn as_slice(&self) -> &[DeployDetails] {
        &self.items
    }

    pub fn contains_path(&self, path: &str) -> bool {
        self.paths.contains(path)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl FromIterator<DeployDetails> for DeployableSet {
    fn from_iter<I: IntoIterator<Item = DeployDetails>>(iter: I) -> Self {
        let mut set = Self::new();
        for details in iter {
            set.push(details);
        }
        set
    }
}

impl IntoIterator for DeployableSet {
    type Item = DeployDetails;
    type IntoIter = std::vec::IntoIter<DeployDetails>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.into_iter()
    }
}

/// Joins the build's module tree against the deploy templates, attaching
/// freshly computed digests to both the emitted details and the build's
/// artifact records.
///
/// A file that cannot be hashed is logged and deployed without digests;
/// a missing checksum is non-fatal here.
pub fn assemble_deployables(
    build: &mut BuildInfo,
    templates: &HashMap<String, DeployDetails>,
) -> DeployableSet {
    let mut set = DeployableSet::new();

    for module in &mut build.modules {
        let module_id = module.id.clone();
        for artifact in &mut module.artifacts {
            let id = artifact_id(&module_id, &artifact.name);
            let Some(template) = templates.get(&id) else {
                continue;
            };

            let mut details = template.clone();
            match wharf_checksum::compute(&details.file) {
                Ok(sums) => {
                    artifact.md5 = sums.md5.clone();
                    artifact.sha1 = sums.sha1.clone();
                    details.md5 = sums.md5;
                    details.sha1 = sums.sha1;
                }
                Err(e) => {
                    warn!(
                        artifact = %artifact.name,
                        file = %details.file.display(),
                        error = %e,
                        "could not compute artifact checksums"
                    );
                }
            }

            if !set.push(details) {
                debug!(path = %template.artifact_path, "duplicate artifact path collapsed");
            }
        }
    }

    set
}
