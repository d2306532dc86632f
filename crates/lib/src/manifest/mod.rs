//! Build manifest embedded in every produced archive.
//!
//! The manifest lives at `META-INF/wildfly-swarm-manifest.yaml` and tells the
//! bootstrap runtime what to launch and where to find it. Keys are always
//! written in the same order so that the document is stable across builds:
//!
//! ```yaml
//! asset: _bootstrap/app.war
//! main-class: org.wildfly.swarm.Swarm
//! hollow: false
//! properties:
//!   swarm.http.port: 8080
//! modules:
//! - org.wildfly.swarm:jaxrs:jar:1.0
//! bootstrap-artifacts: []
//! bundle-dependencies: true
//! dependencies: []
//! ```
//!
//! The hollow/asset invariant is enforced by the mutators: a hollow manifest
//! never carries an asset.

mod types;

pub use types::*;

use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::consts::{BUNDLED_DEPENDENCIES_PROPERTY, DEFAULT_MAIN_CLASS};

#[derive(Debug, Error)]
pub enum ManifestError {
  #[error("manifest is missing required key '{0}'")]
  MissingField(&'static str),

  #[error("malformed manifest: {0}")]
  Parse(#[source] serde_yaml::Error),

  #[error("failed to serialize manifest: {0}")]
  Serialize(#[source] serde_yaml::Error),

  #[error("failed to read manifest {}: {source}", path.display())]
  Read {
    path: PathBuf,
    #[source]
    source: io::Error,
  },

  #[error("failed to write manifest {}: {source}", path.display())]
  Write {
    path: PathBuf,
    #[source]
    source: io::Error,
  },
}

#[derive(Debug, Clone, PartialEq)]
pub struct BuildManifest {
  asset: Option<String>,
  main_class: String,
  hollow: bool,
  properties: BTreeMap<String, PropertyValue>,
  bootstrap_modules: Vec<String>,
  bootstrap_artifacts: Vec<String>,
  bundle_dependencies: Option<bool>,
  dependencies: BTreeSet<String>,
}

/// On-disk shape. Field order is the serialized key order.
#[derive(Serialize)]
#[serde(rename_all = "kebab-case")]
struct ManifestDocument<'a> {
  #[serde(skip_serializing_if = "Option::is_none")]
  asset: Option<&'a str>,
  main_class: &'a str,
  hollow: bool,
  properties: &'a BTreeMap<String, PropertyValue>,
  modules: &'a [String],
  bootstrap_artifacts: &'a [String],
  #[serde(skip_serializing_if = "Option::is_none")]
  bundle_dependencies: Option<bool>,
  dependencies: &'a BTreeSet<String>,
}

/// Everything optional so that absent keys can be reported by name.
#[derive(Deserialize)]
#[serde(rename_all = "kebab-case")]
struct RawManifest {
  asset: Option<String>,
  main_class: Option<String>,
  hollow: Option<bool>,
  properties: Option<BTreeMap<String, PropertyValue>>,
  modules: Option<Vec<String>>,
  bootstrap_artifacts: Option<Vec<String>>,
  bundle_dependencies: Option<bool>,
  dependencies: Option<Vec<String>>,
}

impl Default for BuildManifest {
  fn default() -> Self {
    Self::new()
  }
}

impl BuildManifest {
  pub fn new() -> Self {
    Self {
      asset: None,
      main_class: DEFAULT_MAIN_CLASS.to_string(),
      hollow: false,
      properties: BTreeMap::new(),
      bootstrap_modules: Vec::new(),
      bootstrap_artifacts: Vec::new(),
      bundle_dependencies: None,
      dependencies: BTreeSet::new(),
    }
  }

  pub fn from_yaml_str(content: &str) -> Result<Self, ManifestError> {
    let raw: RawManifest = serde_yaml::from_str(content).map_err(ManifestError::Parse)?;
    Self::from_raw(raw)
  }

  pub fn read(reader: impl Read) -> Result<Self, ManifestError> {
    let raw: RawManifest = serde_yaml::from_reader(reader).map_err(ManifestError::Parse)?;
    Self::from_raw(raw)
  }

  pub fn read_path(path: &Path) -> Result<Self, ManifestError> {
    let file = fs::File::open(path).map_err(|source| ManifestError::Read {
      path: path.to_path_buf(),
      source,
    })?;
    Self::read(io::BufReader::new(file))
  }

  fn from_raw(raw: RawManifest) -> Result<Self, ManifestError> {
    let main_class = raw.main_class.ok_or(ManifestError::MissingField("main-class"))?;
    let hollow = raw.hollow.ok_or(ManifestError::MissingField("hollow"))?;
    let properties = raw.properties.ok_or(ManifestError::MissingField("properties"))?;
    let modules = raw.modules.ok_or(ManifestError::MissingField("modules"))?;
    let artifacts = raw
      .bootstrap_artifacts
      .ok_or(ManifestError::MissingField("bootstrap-artifacts"))?;
    let dependencies = raw.dependencies.ok_or(ManifestError::MissingField("dependencies"))?;

    let mut manifest = Self::new();
    manifest.set_main_class(Some(main_class));
    manifest.set_hollow(hollow);
    if let Some(asset) = raw.asset {
      manifest.set_asset(asset);
    }
    manifest.properties = properties;
    for module in modules {
      manifest.add_bootstrap_module(module);
    }
    for artifact in artifacts {
      manifest.add_bootstrap_artifact(artifact);
    }
    manifest.bundle_dependencies = raw.bundle_dependencies;
    manifest.dependencies = dependencies.into_iter().collect();
    Ok(manifest)
  }

  pub fn to_yaml(&self) -> Result<String, ManifestError> {
    let doc = ManifestDocument {
      asset: self.asset.as_deref(),
      main_class: &self.main_class,
      hollow: self.hollow,
      properties: &self.properties,
      modules: &self.bootstrap_modules,
      bootstrap_artifacts: &self.bootstrap_artifacts,
      bundle_dependencies: self.bundle_dependencies,
      dependencies: &self.dependencies,
    };
    serde_yaml::to_string(&doc).map_err(ManifestError::Serialize)
  }

  /// Write the manifest to `path`, creating parent directories.
  pub fn write(&self, path: &Path) -> Result<(), ManifestError> {
    let yaml = self.to_yaml()?;
    if let Some(parent) = path.parent() {
      fs::create_dir_all(parent).map_err(|source| ManifestError::Write {
        path: parent.to_path_buf(),
        source,
      })?;
    }
    fs::write(path, yaml).map_err(|source| ManifestError::Write {
      path: path.to_path_buf(),
      source,
    })
  }

  pub fn asset(&self) -> Option<&str> {
    self.asset.as_deref()
  }

  /// Ignored while the manifest is hollow.
  pub fn set_asset(&mut self, asset: impl Into<String>) {
    if !self.hollow {
      self.asset = Some(asset.into());
    }
  }

  pub fn main_class(&self) -> &str {
    &self.main_class
  }

  /// `None` keeps the current main class.
  pub fn set_main_class(&mut self, main_class: Option<impl Into<String>>) {
    if let Some(main_class) = main_class {
      self.main_class = main_class.into();
    }
  }

  pub fn is_hollow(&self) -> bool {
    self.hollow
  }

  pub fn set_hollow(&mut self, hollow: bool) {
    self.hollow = hollow;
    if hollow {
      self.asset = None;
    }
  }

  pub fn properties(&self) -> &BTreeMap<String, PropertyValue> {
    &self.properties
  }

  pub fn set_property(&mut self, key: impl Into<String>, value: impl Into<PropertyValue>) {
    self.properties.insert(key.into(), value.into());
  }

  pub fn bootstrap_modules(&self) -> &[String] {
    &self.bootstrap_modules
  }

  pub fn add_bootstrap_module(&mut self, module: impl Into<String>) {
    let module = module.into();
    if !self.bootstrap_modules.contains(&module) {
      self.bootstrap_modules.push(module);
    }
  }

  pub fn bootstrap_artifacts(&self) -> &[String] {
    &self.bootstrap_artifacts
  }

  pub fn add_bootstrap_artifact(&mut self, artifact: impl Into<String>) {
    let artifact = artifact.into();
    if !self.bootstrap_artifacts.contains(&artifact) {
      self.bootstrap_artifacts.push(artifact);
    }
  }

  pub fn dependencies(&self) -> &BTreeSet<String> {
    &self.dependencies
  }

  pub fn add_dependency(&mut self, gav: impl Into<String>) {
    self.dependencies.insert(gav.into());
  }

  /// The raw tri-state flag.
  pub fn bundle_dependencies(&self) -> Option<bool> {
    self.bundle_dependencies
  }

  /// Unset means bundle.
  pub fn is_bundle_dependencies(&self) -> bool {
    self.bundle_dependencies.unwrap_or(true)
  }

  pub fn set_bundle_dependencies(&mut self, bundle: bool) {
    self.bundle_dependencies = Some(bundle);
  }

  /// Combine the manifest properties with `existing`, returning the merged map.
  ///
  /// When bundling was explicitly enabled the bundled-dependencies flag is
  /// always set, regardless of `policy`.
  pub fn merge_properties(&self, existing: &BTreeMap<String, String>, policy: MergePolicy) -> BTreeMap<String, String> {
    let mut merged = existing.clone();
    for (key, value) in &self.properties {
      match policy {
        MergePolicy::KeepExisting => {
          merged.entry(key.clone()).or_insert_with(|| value.to_string());
        }
        MergePolicy::Overwrite => {
          merged.insert(key.clone(), value.to_string());
        }
      }
    }
    if self.bundle_dependencies == Some(true) {
      merged.insert(BUNDLED_DEPENDENCIES_PROPERTY.to_string(), "true".to_string());
    }
    merged
  }
}
