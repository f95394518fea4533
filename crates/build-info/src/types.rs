//! Build-info document types.
//!
//! Wire representation is camelCase JSON. Unknown fields are preserved
//! through deserialize → merge → serialize via the flattened `extra` maps.

use std::collections::BTreeMap;

use chrono::{DateTime, TimeZone};
use serde::{Deserialize, Serialize};

use crate::is_blank;

/// Wire format of the `started` timestamp, e.g. `2026-08-08T10:49:01.143+0200`.
pub const STARTED_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.3f%z";

/// Formats a timestamp in the `started` wire format.
pub fn format_started<Tz: TimeZone>(t: &DateTime<Tz>) -> String
where
    Tz::Offset: std::fmt::Display,
{
    t.format(STARTED_FORMAT).to_string()
}

/// One build's structured record: modules, artifacts, dependencies, timing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildInfo {
    pub name: String,
    pub number: String,
    pub started: String,
    #[serde(default)]
    pub duration_millis: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_number: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub modules: Vec<Module>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

impl BuildInfo {
    /// Merges the current agent's document into a previously aggregated one.
    ///
    /// Invariants enforced here:
    /// - `started` keeps the first contributor's value;
    /// - `durationMillis` is the sum of all contributions;
    /// - modules merge by id, artifacts by name, dependencies by id with
    ///   scope union; an artifact that already carries a checksum is never
    ///   overwritten.
    ///
    /// For every other field the current document wins.
    pub fn merge_aggregate(previous: BuildInfo, current: BuildInfo) -> BuildInfo {
        let mut merged = current;
        merged.duration_millis += previous.duration_millis;
        merged.started = previous.started;

        let mut modules = previous.modules;
        for module in merged.modules.drain(..) {
            merge_module_into(&mut modules, module);
        }
        merged.modules = modules;

        let mut extra = previous.extra;
        extra.extend(merged.extra);
        merged.extra = extra;

        merged
    }
}

/// One module of a build.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Module {
    pub id: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub artifacts: Vec<Artifact>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub dependencies: Vec<Dependency>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

impl Module {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            artifacts: Vec::new(),
            dependencies: Vec::new(),
            extra: BTreeMap::new(),
        }
    }
}

/// An artifact produced by a module. Immutable once checksums are attached.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Artifact {
    pub name: String,
    #[serde(rename = "type", default, skip_serializing_if = "String::is_empty")]
    pub artifact_type: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub sha1: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub md5: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub properties: BTreeMap<String, String>,
}

impl Artifact {
    /// True when either digest is present.
    pub fn has_checksums(&self) -> bool {
        !is_blank(&self.md5) || !is_blank(&self.sha1)
    }
}

/// A resolved dependency of a module.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Dependency {
    pub id: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub scopes: Vec<String>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub sha1: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub md5: String,
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

/// Merges `incoming` into `modules`, deduplicating by module id.
pub(crate) fn merge_module_into(modules: &mut Vec<Module>, incoming: Module) {
    let Some(existing) = modules.iter_mut().find(|m| m.id == incoming.id) else {
        modules.push(incoming);
        return;
    };

    merge_artifacts(&mut existing.artifacts, incoming.artifacts);
    merge_dependencies(&mut existing.dependencies, incoming.dependencies);
}

fn merge_artifacts(existing: &mut Vec<Artifact>, incoming: Vec<Artifact>) {
    if existing.is_empty() {
        *existing = incoming;
        return;
    }

    for artifact in incoming {
        match existing.iter_mut().find(|a| a.name == artifact.name) {
            None => existing.push(artifact),
            Some(found) => {
                // A checksum already attached on either side stays put.
                if !found.has_checksums() {
                    found.artifact_type = artifact.artifact_type;
                    found.md5 = artifact.md5;
                    found.sha1 = artifact.sha1;
                    found.properties = artifact.properties;
                }
            }
        }
    }
}

fn merge_dependencies(existing: &mut Vec<Dependency>, incoming: Vec<Dependency>) {
    if existing.is_empty() {
        *existing = incoming;
        return;
    }

    for dependency in incoming {
        match existing.iter_mut().find(|d| d.id == dependency.id) {
            None => existing.push(dependency),
            Some(found) => {
                for scope in dependency.scopes {
                    if !found.scopes.contains(&scope) {
                        found.scopes.push(scope);
                    }
                }
            }
        }
    }
}
