use std::collections::HashMap;
use std::path::PathBuf;

use super::{ArtifactResolver, RepositoryError};
use crate::artifact::ArtifactSpec;

/// An in-memory repository keyed by `group:artifact:version` plus classifier and packaging.
#[derive(Debug, Clone, Default)]
pub struct MemoryRepository {
  entries: HashMap<String, (PathBuf, Vec<ArtifactSpec>)>,
}

impl MemoryRepository {
  pub fn new() -> Self {
    Self::default()
  }

  /// Register `spec` backed by `file`, with `dependencies` as its direct dependencies.
  pub fn add(&mut self, spec: &ArtifactSpec, file: impl Into<PathBuf>, dependencies: Vec<ArtifactSpec>) {
    self.entries.insert(spec.to_string(), (file.into(), dependencies));
  }

  pub fn len(&self) -> usize {
    self.entries.len()
  }

  pub fn is_empty(&self) -> bool {
    self.entries.is_empty()
  }
}

impl ArtifactResolver for MemoryRepository {
  fn resolve(&self, spec: &ArtifactSpec) -> Result<Option<PathBuf>, RepositoryError> {
    Ok(self.entries.get(&spec.to_string()).map(|(file, _)| file.clone()))
  }

  fn dependencies(&self, spec: &ArtifactSpec) -> Result<Vec<ArtifactSpec>, RepositoryError> {
    Ok(
      self
        .entries
        .get(&spec.to_string())
        .map(|(_, deps)| deps.clone())
        .unwrap_or_default(),
    )
  }
}
