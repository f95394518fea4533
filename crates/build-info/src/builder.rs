//! Incremental build-info assembly.
//!
//! Build agents register modules as they finish; modules reported twice
//! (e.g. a re-run submodule) merge instead of duplicating.

use std::collections::BTreeMap;

use crate::types::{BuildInfo, Module, merge_module_into};

/// Builder collecting one build's data before publishing.
#[derive(Debug, Default)]
pub struct BuildInfoBuilder {
    name: String,
    number: String,
    started: String,
    duration_millis: i64,
    parent_name: Option<String>,
    parent_number: Option<String>,
    modules: Vec<Module>,
    extra: BTreeMap<String, serde_json::Value>,
}

impl BuildInfoBuilder {
    pub fn new(name: impl Into<String>, number: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            number: number.into(),
            ..Self::default()
        }
    }

    /// Sets the build start timestamp, already in wire format
    /// (see [`crate::format_started`]).
    pub fn started(mut self, started: impl Into<String>) -> Self {
        self.started = started.into();
        self
    }

    pub fn duration_millis(mut self, millis: i64) -> Self {
        self.duration_millis = millis;
        self
    }

    pub fn parent(mut self, name: impl Into<String>, number: impl Into<String>) -> Self {
        self.parent_name = Some(name.into());
        self.parent_number = Some(number.into());
        self
    }

    /// Adds a module, merging with an already-registered module of the
    /// same id: artifacts dedup by name (attached checksums are kept),
    /// dependencies dedup by id with scope union.
    pub fn add_module(mut self, module: Module) -> Self {
        merge_module_into(&mut self.modules, module);
        self
    }

    /// Attaches an opaque top-level field carried through verbatim.
    pub fn extra_field(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.extra.insert(key.into(), value);
        self
    }

    pub fn build(self) -> BuildInfo {
        BuildInfo {
            name: self.name,
            number: self.number,
            started: self.started,
            duration_millis: self.duration_millis,
            parent_name: self.parent_name,
            parent_number: self.parent_number,
            modules: self.modules,
            extra: self.extra,
        }
    }
}
