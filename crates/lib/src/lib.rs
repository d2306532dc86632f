//! swarmpack-lib: assembly pipeline for self-contained uberjars
//!
//! This crate provides the pieces the `swarmpack` binary drives:
//! - `ArtifactSpec`: immutable dependency coordinates
//! - `DependencyManager`: working set, resolution, and generated descriptors
//! - `FractionUsageAnalyzer`: detects optional modules from compiled bytecode
//! - `BuildManifest`: the YAML build manifest embedded in every archive
//! - `BuildTool`: the staged pipeline that merges everything into one archive

pub mod analyzer;
pub mod archive;
pub mod artifact;
pub mod build;
pub mod catalog;
pub mod consts;
pub mod deps;
pub mod manifest;
pub mod paths;
pub mod properties;
pub mod repository;
pub mod util;
