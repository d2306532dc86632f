use std::path::Path;

use tracing::{debug, info, info_span};

use super::stages::{self, Assembly};
use super::{AssembledArchive, BuildConfig, BuildError, BuildOutput, BuildStage};
use crate::analyzer::UsageScanner;
use crate::repository::ArtifactResolver;

/// Runs the build pipeline for one [`BuildConfig`].
pub struct BuildTool<'a> {
  config: &'a BuildConfig,
  resolver: &'a dyn ArtifactResolver,
  scanner: &'a dyn UsageScanner,
}

impl<'a> BuildTool<'a> {
  pub fn new(config: &'a BuildConfig, resolver: &'a dyn ArtifactResolver, scanner: &'a dyn UsageScanner) -> Self {
    Self {
      config,
      resolver,
      scanner,
    }
  }

  /// Run every stage except export.
  pub fn assemble(&self) -> Result<AssembledArchive, BuildError> {
    let config = self.config;

    let state = stage(BuildStage::Configuring, || Ok(stages::configure(config, self.resolver)))?;
    let state = stage(BuildStage::AnalyzingDependencies, || {
      stages::analyze_dependencies(config, state)
    })?;
    let state = stage(BuildStage::ResolvingModules, || {
      stages::resolve_modules(config, self.scanner, state)
    })?;
    let state = stage(BuildStage::MergingArchives, || {
      let state = stages::merge_runtime(state)?;
      let state = stages::merge_project(config, state)?;
      stages::populate_repository(config, state)
    })?;
    let state: Assembly<'_> = stage(BuildStage::EmittingMetadata, || stages::emit_metadata(config, state))?;

    Ok(state.finish())
  }

  /// Assemble and write `<dir>/<base_name>-swarm.jar`.
  pub fn build(&self, base_name: &str, dir: &Path) -> Result<BuildOutput, BuildError> {
    info!(name = base_name, dir = ?dir, "building uberjar");
    let assembled = self.assemble()?;
    let output = stage(BuildStage::Exporting, || stages::export(assembled, base_name, dir))?;
    debug!(stage = %BuildStage::Done, "build complete");
    Ok(output)
  }
}

fn stage<T>(stage: BuildStage, run: impl FnOnce() -> Result<T, BuildError>) -> Result<T, BuildError> {
  let _span = info_span!("stage", name = %stage).entered();
  debug!("entering stage");
  run()
}
