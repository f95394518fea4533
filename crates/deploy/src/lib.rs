//! Deploy pipeline for build-produced artifacts.
//!
//! This crate implements the **business logic** of one deploy call:
//! assemble the deployable artifact set, optionally aggregate build info
//! and deployables across independent build agents, gate the whole batch
//! on pre-existing duplicates, upload, and publish the build-info
//! document. It is a library crate with no host-build-tool dependencies;
//! adapters provide a [`RepositoryService`] implementation (usually
//! `wharf_client::RepoClient`) and call [`Deployer::deploy`].
//!
//! # Pipeline
//!
//! 1. **Assemble** — join the build's module tree with deploy templates
//! 2. **Aggregate** — merge with prior agents' records on shared storage
//! 3. **Gate** — all-or-nothing duplicate check
//! 4. **Upload** — checksum deploy with full-body fallback, per artifact
//! 5. **Publish** — send the (possibly merged) build-info document

pub mod aggregate;
pub mod assemble;
pub mod config;
pub mod deploy;
pub mod error;
pub mod gate;
pub mod service;

pub use aggregate::{
    AGGREGATED_BUILD_INFO, AGGREGATED_DEPLOYABLES, AggregateOutcome, Aggregator,
};
pub use assemble::{DeployableSet, artifact_id, assemble_deployables};
pub use config::{AggregationConfig, PublisherConfig};
pub use deploy::{DeployOutcome, Deployer};
pub use error::{DeployError, DuplicateEntry};
pub use gate::check_duplicates;
pub use service::RepositoryService;
