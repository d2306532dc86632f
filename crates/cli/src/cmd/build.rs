//! Implementation of the `swarmpack build` command.

use std::collections::BTreeMap;

use anyhow::{Context, Result, bail};
use tracing::debug;

use swarmpack_lib::analyzer::ClassFileScanner;
use swarmpack_lib::artifact::ArtifactSpec;
use swarmpack_lib::build::{BuildConfig, BuildTool};
use swarmpack_lib::catalog::ModuleCatalog;
use swarmpack_lib::paths;
use swarmpack_lib::repository::LocalRepository;

use crate::BuildArgs;
use crate::output::{print_info, print_json, print_stat, print_success};

/// Assemble the uberjar described by `args` and report where it was written.
pub fn cmd_build(args: BuildArgs) -> Result<()> {
  let coordinate = args
    .coordinate
    .as_deref()
    .map(|c| c.parse::<ArtifactSpec>())
    .transpose()
    .context("Invalid --coordinate")?;

  let name = match (&args.name, &coordinate) {
    (Some(name), _) => name.clone(),
    (None, Some(spec)) => spec.artifact_id().to_string(),
    (None, None) => bail!("--name is required when no --coordinate is given"),
  };

  let mut config = BuildConfig::new()
    .with_properties(parse_properties(&args.properties)?)
    .with_bundle_dependencies(!args.no_bundle)
    .with_resolve_transitive(args.transitive)
    .with_auto_detect(!args.no_detect)
    .with_hollow(args.hollow);

  if let Some(spec) = coordinate {
    let spec = match &args.project {
      Some(file) => spec.with_file(file),
      None => spec,
    };
    config = config.with_project(spec);
  }
  if let Some(main_class) = &args.main_class {
    config = config.with_main_class(main_class);
  }
  for coordinate in &args.dependencies {
    let spec = coordinate
      .parse()
      .with_context(|| format!("Invalid --dependency '{}'", coordinate))?;
    config = config.with_dependency(spec);
  }
  for coordinate in &args.fractions {
    let spec = coordinate
      .parse()
      .with_context(|| format!("Invalid --fraction '{}'", coordinate))?;
    config = config.with_fraction(spec);
  }
  for dir in &args.module_dirs {
    config = config.with_module_dir(dir);
  }
  if let Some(path) = &args.catalog {
    let catalog =
      ModuleCatalog::from_path(path).with_context(|| format!("Failed to load catalog {}", path.display()))?;
    config = config.with_catalog(catalog);
  }

  let repository = args.repository.clone().unwrap_or_else(paths::local_repository_dir);
  debug!(repository = ?repository, "resolving from repository");
  let resolver = LocalRepository::new(repository);

  let output = BuildTool::new(&config, &resolver, &ClassFileScanner)
    .build(&name, &args.output_dir)
    .context("Build failed")?;

  if args.format.is_json() {
    return print_json(&output);
  }

  print_success(&format!("Wrote {}", output.path.display()));
  print_stat("Entries", &output.entries.to_string());
  print_stat("SHA-256", &output.sha256.to_string());
  if !output.detected.is_empty() {
    println!();
    print_info("Detected fractions:");
    for module in &output.detected {
      println!("  {}:{}", module.key(), module.version);
    }
  }
  Ok(())
}

fn parse_properties(raw: &[String]) -> Result<BTreeMap<String, String>> {
  raw
    .iter()
    .map(|entry| match entry.split_once('=') {
      Some((key, value)) if !key.is_empty() => Ok((key.to_string(), value.to_string())),
      _ => bail!("Invalid property '{}', expected KEY=VALUE", entry),
    })
    .collect()
}
