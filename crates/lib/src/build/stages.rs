//! Pipeline stages.
//!
//! Each stage consumes the [`Assembly`] produced by the previous one and
//! returns the next. [`BuildTool`](super::BuildTool) runs them in order.

use std::collections::BTreeMap;
use std::path::Path;

use tracing::{debug, info};

use super::{AssembledArchive, BuildConfig, BuildError, BuildOutput};
use crate::analyzer::{FractionUsageAnalyzer, UsageScanner};
use crate::archive::{self, Archive, EntrySource};
use crate::artifact::ArtifactSpec;
use crate::catalog::ModuleDescriptor;
use crate::consts::{
  APP_ARTIFACT_PROPERTY, APPLICATION_CONF_PATH, BOOTSTRAP_CONF_PATH, BOOTSTRAP_MAIN_CLASS, BUILD_MANIFEST_PATH,
  DEPENDENCIES_CONF_PATH, JAR_MANIFEST_MAIN_CLASS_ATTR, JAR_MANIFEST_PATH, MODULE_LOADER_MARKER, MODULES_ROOT,
  OUTPUT_SUFFIX, PROPERTIES_HEADER, PROPERTIES_PATH,
};
use crate::deps::{DependencyManager, ResolveError};
use crate::manifest::{BuildManifest, MergePolicy};
use crate::properties::PropertiesDocument;
use crate::repository::ArtifactResolver;
use crate::util::hash::hash_file;

/// In-progress build state threaded through the stages.
pub struct Assembly<'a> {
  pub deps: DependencyManager<'a>,
  pub archive: Archive,
  pub manifest: BuildManifest,
  pub detected: Vec<ModuleDescriptor>,
}

impl Assembly<'_> {
  pub fn finish(self) -> AssembledArchive {
    AssembledArchive {
      archive: self.archive,
      manifest: self.manifest,
      detected: self.detected,
    }
  }
}

/// Declare dependencies and explicit fractions, with the catalog closure of the fractions.
pub fn configure<'a>(config: &BuildConfig, resolver: &'a dyn ArtifactResolver) -> Assembly<'a> {
  let mut deps = DependencyManager::new(resolver);
  for spec in config.dependencies() {
    deps.add_dependency(spec.clone());
  }
  for spec in config.fractions() {
    deps.add_module(spec.clone());
  }

  if let Some(catalog) = config.catalog() {
    let selected: Vec<ModuleDescriptor> = config
      .fractions()
      .iter()
      .filter_map(|f| catalog.get(f.group_id(), f.artifact_id()).cloned())
      .collect();
    for module in catalog.closure(&selected) {
      let explicit = config
        .fractions()
        .iter()
        .any(|f| f.is(&module.group_id, &module.artifact_id));
      if !explicit {
        debug!(module = %module.key(), "adding fraction dependency");
        deps.add_module(module.to_artifact_spec());
      }
    }
  }

  Assembly {
    deps,
    archive: Archive::new(),
    manifest: BuildManifest::new(),
    detected: Vec::new(),
  }
}

pub fn analyze_dependencies<'a>(config: &BuildConfig, mut state: Assembly<'a>) -> Result<Assembly<'a>, BuildError> {
  let transitive = config.resolve_transitive() || !config.fractions().is_empty();
  state.deps.analyze_dependencies(transitive)?;
  Ok(state)
}

/// Auto-detect fractions when the bootstrap runtime is still missing.
pub fn resolve_modules<'a>(
  config: &BuildConfig,
  scanner: &dyn UsageScanner,
  mut state: Assembly<'a>,
) -> Result<Assembly<'a>, BuildError> {
  if state.deps.find_bootstrap_runtime_artifact().is_none() {
    if config.auto_detect() {
      let catalog = config
        .catalog()
        .ok_or_else(|| BuildError::Configuration("fraction detection requested but no catalog was provided".into()))?;
      let artifact = config.project().and_then(|p| p.file()).ok_or_else(|| {
        BuildError::Configuration("fraction detection requested but the project artifact has no file".into())
      })?;

      info!("no fractions declared, scanning project for needed fractions");
      let found = FractionUsageAnalyzer::new(catalog, scanner).detect_needed_modules(artifact)?;
      let detected = catalog.closure(&found);
      info!(
        fractions = %detected.iter().map(ModuleDescriptor::key).collect::<Vec<_>>().join(", "),
        "detected fractions"
      );

      for module in &detected {
        let spec = module.to_artifact_spec();
        if state.deps.get(&spec.key()).is_none() {
          state.deps.add_module(spec);
        }
      }
      state.deps.analyze_dependencies(true)?;
      state.detected = detected;
    } else {
      info!("no fractions declared and detection disabled");
    }
  }

  if state.deps.find_bootstrap_runtime_artifact().is_none() {
    return Err(BuildError::MissingBootstrap);
  }
  Ok(state)
}

/// Merge the module loader (unless shaded into the bootstrap) and the bootstrap runtime.
pub fn merge_runtime(mut state: Assembly<'_>) -> Result<Assembly<'_>, BuildError> {
  let bootstrap = state
    .deps
    .find_bootstrap_runtime_artifact()
    .cloned()
    .ok_or(BuildError::MissingBootstrap)?;
  let bootstrap_file = resolved_file(&bootstrap)?;

  if !archive::has_entry_with_prefix(bootstrap_file, MODULE_LOADER_MARKER)? {
    let loader = state
      .deps
      .find_module_loader_artifact()
      .cloned()
      .ok_or(BuildError::MissingModuleLoader)?;
    let merged = state.archive.merge_archive(resolved_file(&loader)?)?;
    debug!(artifact = %loader, entries = merged, "merged module loader");
    state.manifest.add_bootstrap_artifact(loader.to_string());
  }

  let merged = state.archive.merge_archive(bootstrap_file)?;
  debug!(artifact = %bootstrap, entries = merged, "merged bootstrap runtime");
  state.manifest.add_bootstrap_artifact(bootstrap.to_string());
  Ok(state)
}

/// Add the project artifact and every additional module directory.
pub fn merge_project<'a>(config: &BuildConfig, mut state: Assembly<'a>) -> Result<Assembly<'a>, BuildError> {
  if config.hollow() {
    state.manifest.set_hollow(true);
  } else {
    let project = config
      .project()
      .ok_or_else(|| BuildError::Configuration("a project artifact is required unless the build is hollow".into()))?;
    let file = project.file().ok_or_else(|| {
      BuildError::Configuration(format!("project artifact {} has no file", project.spec()))
    })?;
    let entry = project.entry_name();
    state.archive.add(entry.clone(), EntrySource::File(file.to_path_buf()))?;
    state.manifest.set_asset(entry);
  }

  for dir in config.module_dirs() {
    if !dir.is_dir() {
      return Err(BuildError::Configuration(format!(
        "module directory {} does not exist",
        dir.display()
      )));
    }
    let files = state.archive.add_directory(dir, MODULES_ROOT)?;
    let descriptors = state.deps.register_module_descriptors_in(dir)?;
    debug!(dir = ?dir, files, descriptors, "added module directory");
  }
  state.deps.resolve_pending()?;
  Ok(state)
}

/// Embed resolved dependencies under `m2repo/`, or copy them to the external repository.
pub fn populate_repository<'a>(config: &BuildConfig, mut state: Assembly<'a>) -> Result<Assembly<'a>, BuildError> {
  if config.bundle_dependencies() {
    state.deps.populate_embedded_repository(&mut state.archive)?;
  } else {
    state.deps.populate_external_repository(config.external_repository())?;
  }
  Ok(state)
}

/// Write the JVM manifest, build manifest, properties and descriptor documents.
pub fn emit_metadata<'a>(config: &BuildConfig, mut state: Assembly<'a>) -> Result<Assembly<'a>, BuildError> {
  let manifest = &mut state.manifest;
  manifest.set_main_class(config.main_class());
  manifest.set_bundle_dependencies(config.bundle_dependencies());
  for (key, value) in config.properties() {
    manifest.set_property(key.as_str(), value.as_str());
  }
  for module in state.deps.modules() {
    manifest.add_bootstrap_module(module.to_string());
  }
  for spec in state.deps.resolved() {
    manifest.add_dependency(spec.to_string());
  }

  let mut properties = PropertiesDocument::new().with_header(PROPERTIES_HEADER);
  for (key, value) in manifest.merge_properties(&BTreeMap::new(), MergePolicy::Overwrite) {
    properties.set(key, value);
  }
  if let Some(project) = config.project() {
    properties.set(APP_ARTIFACT_PROPERTY, project.simple_name());
  }

  let asset = manifest.asset().map(str::to_string);
  let archive = &mut state.archive;
  archive.put_metadata(JAR_MANIFEST_PATH, jar_manifest(manifest.main_class()))?;
  archive.put_metadata(BUILD_MANIFEST_PATH, manifest.to_yaml()?)?;
  archive.put_metadata(PROPERTIES_PATH, properties.to_string())?;
  archive.put_metadata(BOOTSTRAP_CONF_PATH, state.deps.bootstrap_conf().to_string())?;
  archive.put_metadata(DEPENDENCIES_CONF_PATH, state.deps.dependencies_conf().to_string())?;
  archive.put_metadata(APPLICATION_CONF_PATH, state.deps.application_conf(asset.as_deref()).to_string())?;

  info!(entries = archive.len(), "emitted metadata");
  Ok(state)
}

/// Write `<dir>/<base_name>-swarm.jar`.
pub fn export(assembled: AssembledArchive, base_name: &str, dir: &Path) -> Result<BuildOutput, BuildError> {
  if base_name.is_empty() || base_name.contains(['/', '\\']) {
    return Err(BuildError::Configuration(format!("invalid output name '{}'", base_name)));
  }

  let path = dir.join(format!("{}{}", base_name, OUTPUT_SUFFIX));
  let entries = assembled.archive.len();
  assembled.archive.export(&path)?;
  let sha256 = hash_file(&path)?;

  info!(path = ?path, entries, sha256 = %sha256, "wrote archive");
  Ok(BuildOutput {
    path,
    entries,
    sha256,
    detected: assembled.detected,
  })
}

fn resolved_file(spec: &ArtifactSpec) -> Result<&Path, BuildError> {
  spec
    .file()
    .ok_or_else(|| ResolveError::Unresolved(spec.to_string()).into())
}

/// `META-INF/MANIFEST.MF` launching the bootstrap main, which hands off to `main_class`.
fn jar_manifest(main_class: &str) -> String {
  format!(
    "Manifest-Version: 1.0\r\nMain-Class: {}\r\n{}: {}\r\n\r\n",
    BOOTSTRAP_MAIN_CLASS, JAR_MANIFEST_MAIN_CLASS_ATTR, main_class
  )
}
