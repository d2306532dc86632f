//! Implementation of the `swarmpack inspect` command.

use std::path::Path;

use anyhow::{Context, Result, anyhow};

use swarmpack_lib::archive::read_entry;
use swarmpack_lib::consts::BUILD_MANIFEST_PATH;
use swarmpack_lib::manifest::BuildManifest;

use crate::output::{OutputFormat, print_json, print_stat, symbols};

pub fn cmd_inspect(archive: &Path, format: OutputFormat) -> Result<()> {
  let yaml = read_entry(archive, BUILD_MANIFEST_PATH)
    .with_context(|| format!("Failed to read {}", archive.display()))?
    .ok_or_else(|| anyhow!("{} has no {}", archive.display(), BUILD_MANIFEST_PATH))?;
  let yaml = String::from_utf8(yaml).context("Build manifest is not UTF-8")?;
  let manifest = BuildManifest::from_yaml_str(&yaml).context("Invalid build manifest")?;

  if format.is_json() {
    return print_json(&serde_json::json!({
      "asset": manifest.asset(),
      "main_class": manifest.main_class(),
      "hollow": manifest.is_hollow(),
      "properties": manifest.properties(),
      "modules": manifest.bootstrap_modules(),
      "bootstrap_artifacts": manifest.bootstrap_artifacts(),
      "bundle_dependencies": manifest.is_bundle_dependencies(),
      "dependencies": manifest.dependencies(),
    }));
  }

  print_stat("Main class", manifest.main_class());
  print_stat("Asset", manifest.asset().unwrap_or("(hollow)"));
  print_stat("Bundled", &manifest.is_bundle_dependencies().to_string());
  for (label, items) in [
    ("Modules", manifest.bootstrap_modules().iter().collect::<Vec<_>>()),
    ("Bootstrap artifacts", manifest.bootstrap_artifacts().iter().collect()),
    ("Dependencies", manifest.dependencies().iter().collect()),
  ] {
    println!();
    println!("{} ({}):", label, items.len());
    for item in items {
      println!("  {} {}", symbols::INFO, item);
    }
  }
  Ok(())
}
