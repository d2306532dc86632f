//! Dependency working set and resolution.
//!
//! The [`DependencyManager`] holds every artifact the output archive needs,
//! keyed by [`ArtifactKey`]. Adding an artifact whose key is already present
//! replaces the earlier entry; a differing version is recorded as a
//! [`VersionConflict`] and logged.
//!
//! # Resolution order
//!
//! Declared dependencies are processed in declaration order. With transitive
//! resolution on, each declared root is expanded breadth-first through the
//! repository, with a per-root visited set so cycles terminate. The most
//! recently processed entry for a key wins, which keeps the outcome a pure
//! function of the inputs.

mod conf;
mod module_xml;

pub use conf::{ApplicationConf, BootstrapConf, DependenciesConf};
pub use module_xml::{ModuleXml, ModuleXmlError};

use std::collections::{BTreeMap, BTreeSet, VecDeque};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::archive::{Archive, ArchiveError, EntrySource};
use crate::artifact::{ArtifactKey, ArtifactSpec, Scope};
use crate::consts::{
  BOOTSTRAP_ARTIFACT_ID, BOOTSTRAP_GROUP_ID, EMBEDDED_REPOSITORY_ROOT, MAX_MODULE_SEARCH_DEPTH,
  MODULE_DESCRIPTOR_NAME, MODULE_LOADER_ARTIFACT_ID, MODULE_LOADER_GROUP_ID,
};
use crate::repository::{ArtifactResolver, RepositoryError};

#[derive(Debug, Error)]
pub enum ResolveError {
  #[error(
    "artifact {coordinate} not found{}",
    required_by.as_ref().map(|p| format!(" (required by {})", p)).unwrap_or_default()
  )]
  NotFound {
    coordinate: String,
    required_by: Option<String>,
  },

  #[error("repository lookup failed for {coordinate}: {source}")]
  Repository {
    coordinate: String,
    #[source]
    source: RepositoryError,
  },

  #[error("artifact {0} has not been resolved")]
  Unresolved(String),

  #[error(transparent)]
  ModuleDescriptor(#[from] ModuleXmlError),

  #[error(transparent)]
  Archive(#[from] ArchiveError),

  #[error("failed to copy {} into repository: {source}", path.display())]
  Copy {
    path: PathBuf,
    #[source]
    source: io::Error,
  },
}

/// Two versions competed for the same identity; `chosen` replaced `previous`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionConflict {
  pub key: ArtifactKey,
  pub previous: String,
  pub chosen: String,
}

pub struct DependencyManager<'a> {
  resolver: &'a dyn ArtifactResolver,
  working: BTreeMap<ArtifactKey, ArtifactSpec>,
  /// Declared roots, first-declaration order.
  declared: Vec<ArtifactKey>,
  modules: BTreeSet<ArtifactKey>,
  descriptors: Vec<ModuleXml>,
  pending: Vec<ArtifactSpec>,
  conflicts: Vec<VersionConflict>,
}

impl<'a> DependencyManager<'a> {
  pub fn new(resolver: &'a dyn ArtifactResolver) -> Self {
    Self {
      resolver,
      working: BTreeMap::new(),
      declared: Vec::new(),
      modules: BTreeSet::new(),
      descriptors: Vec::new(),
      pending: Vec::new(),
      conflicts: Vec::new(),
    }
  }

  /// Declare a dependency, replacing any entry with the same identity.
  ///
  /// Test-scoped dependencies never reach the packaged archive and are dropped.
  pub fn add_dependency(&mut self, spec: ArtifactSpec) {
    if spec.scope() == Scope::Test {
      debug!(artifact = %spec, "skipping test-scoped dependency");
      return;
    }
    let key = spec.key();
    if !self.declared.contains(&key) {
      self.declared.push(key);
    }
    self.merge(spec);
  }

  /// Declare a dependency that is also a bootstrap module (fraction).
  pub fn add_module(&mut self, spec: ArtifactSpec) {
    if spec.scope() == Scope::Test {
      debug!(artifact = %spec, "skipping test-scoped module");
      return;
    }
    self.modules.insert(spec.key());
    self.add_dependency(spec);
  }

  fn merge(&mut self, spec: ArtifactSpec) {
    let key = spec.key();
    let chosen = spec.version().to_string();
    if let Some(previous) = self.working.insert(key.clone(), spec)
      && previous.version() != chosen
    {
      warn!(
        artifact = %key,
        previous = previous.version(),
        chosen = %chosen,
        "version conflict, keeping most recent"
      );
      let conflict = VersionConflict {
        key,
        previous: previous.version().to_string(),
        chosen,
      };
      if !self.conflicts.contains(&conflict) {
        self.conflicts.push(conflict);
      }
    }
  }

  /// Resolve every declared dependency, and with `resolve_transitive` their closures.
  pub fn analyze_dependencies(&mut self, resolve_transitive: bool) -> Result<(), ResolveError> {
    info!(count = self.declared.len(), transitive = resolve_transitive, "resolving dependencies");

    let roots: Vec<ArtifactSpec> = self
      .declared
      .iter()
      .filter_map(|key| self.working.get(key).cloned())
      .collect();

    for root in roots {
      let resolved = self.resolve_one(&root, None)?;
      self.merge(resolved.clone());

      if !resolve_transitive {
        continue;
      }

      let mut visited = BTreeSet::from([root.key()]);
      let mut queue = VecDeque::from([resolved]);
      while let Some(parent) = queue.pop_front() {
        let children = self.resolver.dependencies(&parent).map_err(|source| ResolveError::Repository {
          coordinate: parent.to_string(),
          source,
        })?;

        for child in children {
          if child.scope() == Scope::Test || !visited.insert(child.key()) {
            continue;
          }
          let child = self.resolve_one(&child, Some(&parent))?;
          debug!(parent = %parent, child = %child, "resolved transitive dependency");
          self.merge(child.clone());
          queue.push_back(child);
        }
      }
    }

    info!(resolved = self.working.len(), "dependencies resolved");
    Ok(())
  }

  fn resolve_one(&self, spec: &ArtifactSpec, required_by: Option<&ArtifactSpec>) -> Result<ArtifactSpec, ResolveError> {
    if spec.is_resolved() {
      return Ok(spec.clone());
    }
    if let Some(existing) = self.working.get(&spec.key())
      && existing.version() == spec.version()
      && existing.is_resolved()
    {
      return Ok(existing.clone());
    }

    let file = self.resolver.resolve(spec).map_err(|source| ResolveError::Repository {
      coordinate: spec.to_string(),
      source,
    })?;

    match file {
      Some(file) => Ok(spec.clone().with_file(file)),
      None => Err(ResolveError::NotFound {
        coordinate: spec.to_string(),
        required_by: required_by.map(ToString::to_string),
      }),
    }
  }

  pub fn find_bootstrap_runtime_artifact(&self) -> Option<&ArtifactSpec> {
    self.find(BOOTSTRAP_GROUP_ID, BOOTSTRAP_ARTIFACT_ID)
  }

  pub fn find_module_loader_artifact(&self) -> Option<&ArtifactSpec> {
    self.find(MODULE_LOADER_GROUP_ID, MODULE_LOADER_ARTIFACT_ID)
  }

  fn find(&self, group_id: &str, artifact_id: &str) -> Option<&ArtifactSpec> {
    self.working.values().find(|spec| spec.is(group_id, artifact_id))
  }

  /// Parse a `module.xml` and queue its artifacts for resolution.
  pub fn register_module_descriptor(&mut self, path: &Path) -> Result<&ModuleXml, ResolveError> {
    let descriptor = ModuleXml::read(path)?;
    debug!(module = %descriptor.identifier(), artifacts = descriptor.artifacts.len(), "registered module descriptor");
    self.pending.extend(descriptor.artifacts.iter().cloned());
    self.descriptors.push(descriptor);
    Ok(&self.descriptors[self.descriptors.len() - 1])
  }

  /// Register every `module.xml` under `dir`, searching at most 20 levels deep.
  pub fn register_module_descriptors_in(&mut self, dir: &Path) -> Result<usize, ResolveError> {
    let mut found = Vec::new();
    for entry in WalkDir::new(dir).max_depth(MAX_MODULE_SEARCH_DEPTH).sort_by_file_name() {
      let entry = entry.map_err(|e| ResolveError::Copy {
        path: dir.to_path_buf(),
        source: e.into(),
      })?;
      if entry.file_type().is_file() && entry.file_name() == MODULE_DESCRIPTOR_NAME {
        found.push(entry.into_path());
      }
    }
    for path in &found {
      self.register_module_descriptor(path)?;
    }
    Ok(found.len())
  }

  /// Resolve artifacts queued by module descriptors. Not transitive.
  pub fn resolve_pending(&mut self) -> Result<usize, ResolveError> {
    let pending = std::mem::take(&mut self.pending);
    let count = pending.len();
    for spec in pending {
      let resolved = self.resolve_one(&spec, None)?;
      self.merge(resolved);
    }
    Ok(count)
  }

  /// Add every resolved artifact to `archive` under `m2repo/`.
  pub fn populate_embedded_repository(&mut self, archive: &mut Archive) -> Result<usize, ResolveError> {
    self.resolve_pending()?;
    for spec in self.working.values() {
      let file = spec.file().ok_or_else(|| ResolveError::Unresolved(spec.to_string()))?;
      archive.add(
        format!("{}/{}", EMBEDDED_REPOSITORY_ROOT, spec.repository_path()),
        EntrySource::File(file.to_path_buf()),
      )?;
    }
    info!(artifacts = self.working.len(), "populated embedded repository");
    Ok(self.working.len())
  }

  /// Copy every resolved artifact into the repository at `dir`, skipping files already present.
  pub fn populate_external_repository(&mut self, dir: &Path) -> Result<usize, ResolveError> {
    self.resolve_pending()?;
    let mut copied = 0;
    for spec in self.working.values() {
      let file = spec.file().ok_or_else(|| ResolveError::Unresolved(spec.to_string()))?;
      let dest = dir.join(spec.repository_path());
      if dest.exists() {
        continue;
      }
      if let Some(parent) = dest.parent() {
        fs::create_dir_all(parent).map_err(|source| ResolveError::Copy {
          path: parent.to_path_buf(),
          source,
        })?;
      }
      fs::copy(file, &dest).map_err(|source| ResolveError::Copy {
        path: dest.clone(),
        source,
      })?;
      copied += 1;
    }
    info!(repository = ?dir, copied, "populated external repository");
    Ok(copied)
  }

  pub fn bootstrap_conf(&self) -> BootstrapConf {
    let mut conf = BootstrapConf::default();
    for key in &self.modules {
      conf.add(format!("{}:{}", key.group_id, key.artifact_id));
    }
    conf
  }

  pub fn dependencies_conf(&self) -> DependenciesConf {
    let mut conf = DependenciesConf::default();
    for (key, spec) in &self.working {
      if self.declared.contains(key) && !self.modules.contains(key) {
        conf.add_primary(spec.to_string());
      } else {
        conf.add_extra(spec.to_string());
      }
    }
    conf
  }

  /// `asset` is the in-archive path of the project artifact, `None` when hollow.
  pub fn application_conf(&self, asset: Option<&str>) -> ApplicationConf {
    let mut conf = ApplicationConf::default();
    for descriptor in &self.descriptors {
      conf.add_module(descriptor.identifier());
    }
    conf.set_path(asset);
    conf
  }

  /// Working set in key order.
  pub fn resolved(&self) -> impl Iterator<Item = &ArtifactSpec> {
    self.working.values()
  }

  pub fn get(&self, key: &ArtifactKey) -> Option<&ArtifactSpec> {
    self.working.get(key)
  }

  pub fn len(&self) -> usize {
    self.working.len()
  }

  pub fn is_empty(&self) -> bool {
    self.working.is_empty()
  }

  /// Bootstrap modules in key order.
  pub fn modules(&self) -> impl Iterator<Item = &ArtifactSpec> {
    self.modules.iter().filter_map(|key| self.working.get(key))
  }

  pub fn module_descriptors(&self) -> &[ModuleXml] {
    &self.descriptors
  }

  pub fn conflicts(&self) -> &[VersionConflict] {
    &self.conflicts
  }
}
