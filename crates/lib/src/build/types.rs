use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};

use serde::Serialize;
use thiserror::Error;

use crate::analyzer::AnalysisError;
use crate::archive::{Archive, ArchiveError};
use crate::artifact::ArtifactSpec;
use crate::catalog::{CatalogError, ModuleCatalog, ModuleDescriptor};
use crate::consts::PROJECT_ASSET_DIR;
use crate::deps::ResolveError;
use crate::manifest::{BuildManifest, ManifestError};
use crate::paths;
use crate::util::hash::{ContentHash, HashError};

#[derive(Debug, Error)]
pub enum BuildError {
  #[error("invalid build configuration: {0}")]
  Configuration(String),

  #[error("bootstrap runtime artifact not found; declare a fraction or enable auto-detection")]
  MissingBootstrap,

  #[error("bootstrap runtime does not include the module loader and no module loader artifact was resolved")]
  MissingModuleLoader,

  #[error(transparent)]
  Resolve(#[from] ResolveError),

  #[error(transparent)]
  Analysis(#[from] AnalysisError),

  #[error(transparent)]
  Manifest(#[from] ManifestError),

  #[error(transparent)]
  Catalog(#[from] CatalogError),

  #[error(transparent)]
  Archive(#[from] ArchiveError),

  #[error(transparent)]
  Hash(#[from] HashError),
}

/// The project's own build output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectArtifact {
  spec: ArtifactSpec,
}

impl ProjectArtifact {
  pub fn new(spec: ArtifactSpec) -> Self {
    Self { spec }
  }

  pub fn spec(&self) -> &ArtifactSpec {
    &self.spec
  }

  pub fn file(&self) -> Option<&Path> {
    self.spec.file()
  }

  /// `artifactId.ext`, the name the runtime looks the application up by.
  pub fn simple_name(&self) -> String {
    self.spec.simple_name()
  }

  /// Path of the project artifact inside the output archive.
  pub fn entry_name(&self) -> String {
    format!("{}/{}", PROJECT_ASSET_DIR, self.simple_name())
  }
}

/// Everything a build needs, fixed before the pipeline starts.
#[derive(Debug, Clone)]
pub struct BuildConfig {
  project: Option<ProjectArtifact>,
  main_class: Option<String>,
  properties: BTreeMap<String, String>,
  bundle_dependencies: bool,
  resolve_transitive: bool,
  dependencies: Vec<ArtifactSpec>,
  fractions: Vec<ArtifactSpec>,
  module_dirs: Vec<PathBuf>,
  catalog: Option<ModuleCatalog>,
  auto_detect: bool,
  hollow: bool,
  external_repository: PathBuf,
}

impl Default for BuildConfig {
  fn default() -> Self {
    Self::new()
  }
}

impl BuildConfig {
  pub fn new() -> Self {
    Self {
      project: None,
      main_class: None,
      properties: BTreeMap::new(),
      bundle_dependencies: true,
      resolve_transitive: false,
      dependencies: Vec::new(),
      fractions: Vec::new(),
      module_dirs: Vec::new(),
      catalog: None,
      auto_detect: true,
      hollow: false,
      external_repository: paths::local_repository_dir(),
    }
  }

  pub fn with_project(mut self, spec: ArtifactSpec) -> Self {
    self.project = Some(ProjectArtifact::new(spec));
    self
  }

  pub fn with_main_class(mut self, main_class: impl Into<String>) -> Self {
    self.main_class = Some(main_class.into());
    self
  }

  pub fn with_property(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
    self.properties.insert(key.into(), value.into());
    self
  }

  pub fn with_properties(mut self, properties: BTreeMap<String, String>) -> Self {
    self.properties.extend(properties);
    self
  }

  pub fn with_bundle_dependencies(mut self, bundle: bool) -> Self {
    self.bundle_dependencies = bundle;
    self
  }

  pub fn with_resolve_transitive(mut self, transitive: bool) -> Self {
    self.resolve_transitive = transitive;
    self
  }

  pub fn with_dependency(mut self, spec: ArtifactSpec) -> Self {
    self.dependencies.push(spec);
    self
  }

  pub fn with_fraction(mut self, spec: ArtifactSpec) -> Self {
    self.fractions.push(spec);
    self
  }

  pub fn with_module_dir(mut self, dir: impl Into<PathBuf>) -> Self {
    self.module_dirs.push(dir.into());
    self
  }

  pub fn with_catalog(mut self, catalog: ModuleCatalog) -> Self {
    self.catalog = Some(catalog);
    self
  }

  pub fn with_auto_detect(mut self, auto_detect: bool) -> Self {
    self.auto_detect = auto_detect;
    self
  }

  pub fn with_hollow(mut self, hollow: bool) -> Self {
    self.hollow = hollow;
    self
  }

  pub fn with_external_repository(mut self, dir: impl Into<PathBuf>) -> Self {
    self.external_repository = dir.into();
    self
  }

  pub fn project(&self) -> Option<&ProjectArtifact> {
    self.project.as_ref()
  }

  pub fn main_class(&self) -> Option<&str> {
    self.main_class.as_deref()
  }

  pub fn properties(&self) -> &BTreeMap<String, String> {
    &self.properties
  }

  pub fn bundle_dependencies(&self) -> bool {
    self.bundle_dependencies
  }

  pub fn resolve_transitive(&self) -> bool {
    self.resolve_transitive
  }

  pub fn dependencies(&self) -> &[ArtifactSpec] {
    &self.dependencies
  }

  pub fn fractions(&self) -> &[ArtifactSpec] {
    &self.fractions
  }

  pub fn module_dirs(&self) -> &[PathBuf] {
    &self.module_dirs
  }

  pub fn catalog(&self) -> Option<&ModuleCatalog> {
    self.catalog.as_ref()
  }

  pub fn auto_detect(&self) -> bool {
    self.auto_detect
  }

  pub fn hollow(&self) -> bool {
    self.hollow
  }

  pub fn external_repository(&self) -> &Path {
    &self.external_repository
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum BuildStage {
  Configuring,
  AnalyzingDependencies,
  ResolvingModules,
  MergingArchives,
  EmittingMetadata,
  Exporting,
  Done,
}

impl BuildStage {
  pub fn as_str(&self) -> &'static str {
    match self {
      BuildStage::Configuring => "configuring",
      BuildStage::AnalyzingDependencies => "analyzing-dependencies",
      BuildStage::ResolvingModules => "resolving-modules",
      BuildStage::MergingArchives => "merging-archives",
      BuildStage::EmittingMetadata => "emitting-metadata",
      BuildStage::Exporting => "exporting",
      BuildStage::Done => "done",
    }
  }
}

impl fmt::Display for BuildStage {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

/// Result of every stage before export.
#[derive(Debug)]
pub struct AssembledArchive {
  pub archive: Archive,
  pub manifest: BuildManifest,
  /// Modules selected by auto-detection, including their catalog closure.
  pub detected: Vec<ModuleDescriptor>,
}

#[derive(Debug, Clone, Serialize)]
pub struct BuildOutput {
  pub path: PathBuf,
  pub entries: usize,
  pub sha256: ContentHash,
  pub detected: Vec<ModuleDescriptor>,
}
