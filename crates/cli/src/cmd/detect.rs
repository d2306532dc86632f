//! Implementation of the `swarmpack detect` command.

use std::path::Path;

use anyhow::{Context, Result};

use swarmpack_lib::analyzer::{ClassFileScanner, FractionUsageAnalyzer};
use swarmpack_lib::catalog::ModuleCatalog;

use crate::output::{OutputFormat, print_info, print_json, symbols};

pub fn cmd_detect(catalog: &Path, artifact: &Path, format: OutputFormat) -> Result<()> {
  let catalog =
    ModuleCatalog::from_path(catalog).with_context(|| format!("Failed to load catalog {}", catalog.display()))?;

  let detected = FractionUsageAnalyzer::new(&catalog, &ClassFileScanner)
    .detect_needed_modules(artifact)
    .with_context(|| format!("Failed to analyze {}", artifact.display()))?;
  let required = catalog.closure(&detected);

  if format.is_json() {
    return print_json(&serde_json::json!({ "detected": detected, "required": required }));
  }

  if detected.is_empty() {
    print_info("No fractions detected.");
    return Ok(());
  }
  for module in &required {
    let marker = if detected.contains(module) {
      symbols::PLUS
    } else {
      symbols::ARROW
    };
    println!("{} {}:{} ({})", marker, module.key(), module.version, module.display_name());
  }
  Ok(())
}
