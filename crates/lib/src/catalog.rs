//! Catalog of known optional modules (fractions).
//!
//! The catalog is a YAML (or JSON) document listing every module the analyzer
//! may select, the Java packages each module exposes, and the other modules it
//! depends on:
//!
//! ```yaml
//! modules:
//!   - group-id: org.wildfly.swarm
//!     artifact-id: jaxrs
//!     version: 1.0.0
//!     packages: [javax.ws.rs]
//!     dependencies: ["org.wildfly.swarm:undertow"]
//! ```

use std::collections::{BTreeMap, BTreeSet, VecDeque};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::artifact::ArtifactSpec;

/// An optional feature module.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ModuleDescriptor {
  pub group_id: String,
  pub artifact_id: String,
  pub version: String,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub name: Option<String>,
  /// Java package prefixes, e.g. `javax.ws.rs`.
  #[serde(default)]
  pub packages: Vec<String>,
  /// Resource paths whose presence in the project artifact selects the module.
  #[serde(default)]
  pub resources: Vec<String>,
  /// `group:artifact` keys of other catalog modules.
  #[serde(default)]
  pub dependencies: Vec<String>,
}

impl ModuleDescriptor {
  pub fn new(group_id: impl Into<String>, artifact_id: impl Into<String>, version: impl Into<String>) -> Self {
    Self {
      group_id: group_id.into(),
      artifact_id: artifact_id.into(),
      version: version.into(),
      name: None,
      packages: Vec::new(),
      resources: Vec::new(),
      dependencies: Vec::new(),
    }
  }

  pub fn with_packages(mut self, packages: &[&str]) -> Self {
    self.packages = packages.iter().map(|p| p.to_string()).collect();
    self
  }

  pub fn with_dependencies(mut self, dependencies: &[&str]) -> Self {
    self.dependencies = dependencies.iter().map(|d| d.to_string()).collect();
    self
  }

  /// `group:artifact`
  pub fn key(&self) -> String {
    format!("{}:{}", self.group_id, self.artifact_id)
  }

  pub fn display_name(&self) -> &str {
    self.name.as_deref().unwrap_or(&self.artifact_id)
  }

  pub fn to_artifact_spec(&self) -> ArtifactSpec {
    ArtifactSpec::new(&self.group_id, &self.artifact_id, &self.version)
  }

  /// True when `package` equals one of the exposed packages or lies beneath one.
  pub fn exposes_package(&self, package: &str) -> bool {
    self.packages.iter().any(|p| {
      package
        .strip_prefix(p.as_str())
        .is_some_and(|rest| rest.is_empty() || rest.starts_with('.'))
    })
  }

  pub fn provides_resource(&self, path: &str) -> bool {
    self.resources.iter().any(|r| r == path)
  }
}

#[derive(Debug, Error)]
pub enum CatalogError {
  #[error("failed to read catalog {}: {source}", path.display())]
  Read {
    path: PathBuf,
    #[source]
    source: io::Error,
  },

  #[error("invalid catalog YAML: {0}")]
  Yaml(#[source] serde_yaml::Error),

  #[error("invalid catalog JSON: {0}")]
  Json(#[source] serde_json::Error),

  #[error("module '{0}' is listed more than once")]
  DuplicateModule(String),

  #[error("module '{module}' depends on unknown module '{dependency}'")]
  UnknownDependency { module: String, dependency: String },
}

#[derive(Debug, Serialize, Deserialize)]
struct CatalogDocument {
  modules: Vec<ModuleDescriptor>,
}

/// Validated set of modules, indexed by `group:artifact`.
#[derive(Debug, Clone, Default)]
pub struct ModuleCatalog {
  modules: BTreeMap<String, ModuleDescriptor>,
}

impl ModuleCatalog {
  pub fn new(modules: Vec<ModuleDescriptor>) -> Result<Self, CatalogError> {
    let mut index = BTreeMap::new();
    for module in modules {
      let key = module.key();
      if index.insert(key.clone(), module).is_some() {
        return Err(CatalogError::DuplicateModule(key));
      }
    }

    for module in index.values() {
      for dependency in &module.dependencies {
        if !index.contains_key(dependency) {
          return Err(CatalogError::UnknownDependency {
            module: module.key(),
            dependency: dependency.clone(),
          });
        }
      }
    }

    Ok(Self { modules: index })
  }

  pub fn from_yaml_str(content: &str) -> Result<Self, CatalogError> {
    let doc: CatalogDocument = serde_yaml::from_str(content).map_err(CatalogError::Yaml)?;
    Self::new(doc.modules)
  }

  pub fn from_json_str(content: &str) -> Result<Self, CatalogError> {
    let doc: CatalogDocument = serde_json::from_str(content).map_err(CatalogError::Json)?;
    Self::new(doc.modules)
  }

  /// Load a catalog file. Files ending in `.json` are read as JSON, anything else as YAML.
  pub fn from_path(path: &Path) -> Result<Self, CatalogError> {
    let content = fs::read_to_string(path).map_err(|source| CatalogError::Read {
      path: path.to_path_buf(),
      source,
    })?;

    let catalog = match path.extension().and_then(|e| e.to_str()) {
      Some("json") => Self::from_json_str(&content)?,
      _ => Self::from_yaml_str(&content)?,
    };
    debug!(path = ?path, modules = catalog.len(), "loaded module catalog");
    Ok(catalog)
  }

  pub fn get(&self, group_id: &str, artifact_id: &str) -> Option<&ModuleDescriptor> {
    self.modules.get(&format!("{}:{}", group_id, artifact_id))
  }

  /// Modules in `group:artifact` order.
  pub fn modules(&self) -> impl Iterator<Item = &ModuleDescriptor> {
    self.modules.values()
  }

  pub fn len(&self) -> usize {
    self.modules.len()
  }

  pub fn is_empty(&self) -> bool {
    self.modules.is_empty()
  }

  /// Expand `selection` across module dependencies.
  ///
  /// The result is sorted and unique. Selected modules unknown to the catalog
  /// are kept as given and contribute no further dependencies.
  pub fn closure(&self, selection: &[ModuleDescriptor]) -> Vec<ModuleDescriptor> {
    let mut result: BTreeSet<ModuleDescriptor> = BTreeSet::new();
    let mut seen: BTreeSet<String> = BTreeSet::new();
    let mut queue: VecDeque<ModuleDescriptor> = selection.iter().cloned().collect();

    while let Some(module) = queue.pop_front() {
      if !seen.insert(module.key()) {
        continue;
      }
      for dependency in &module.dependencies {
        if let Some(dep) = self.modules.get(dependency)
          && !seen.contains(dependency)
        {
          queue.push_back(dep.clone());
        }
      }
      result.insert(module);
    }

    result.into_iter().collect()
  }
}
