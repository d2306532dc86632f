//! Fraction auto-detection.
//!
//! [`FractionUsageAnalyzer`] unpacks the project's compiled artifact, scans
//! every class for referenced types, and selects each catalog module whose
//! packages are referenced. Module dependencies are not expanded here; the
//! build pipeline takes the catalog closure of the result.

mod classfile;

pub use classfile::{ClassFileError, ClassFileScanner, package_of};

use std::collections::BTreeSet;
use std::fs::{self, File};
use std::io::{self, BufReader};
use std::path::{Path, PathBuf};

use tempfile::TempDir;
use thiserror::Error;
use tracing::{debug, info};
use walkdir::WalkDir;
use zip::ZipArchive;
use zip::result::ZipError;

use crate::catalog::{ModuleCatalog, ModuleDescriptor};

/// Reports the types a compiled class references.
pub trait UsageScanner {
  /// Internal names (`a/b/C`) of every type referenced by the class in `bytes`.
  fn scan_class(&self, bytes: &[u8]) -> Result<BTreeSet<String>, ClassFileError>;
}

#[derive(Debug, Error)]
pub enum AnalysisError {
  #[error("failed to open {}: {source}", path.display())]
  Open {
    path: PathBuf,
    #[source]
    source: ZipError,
  },

  #[error("failed to unpack {}: {source}", path.display())]
  Unpack {
    path: PathBuf,
    #[source]
    source: io::Error,
  },

  #[error("failed to read entry {index} of {}: {source}", path.display())]
  Entry {
    path: PathBuf,
    index: usize,
    #[source]
    source: ZipError,
  },

  #[error("entry '{name}' escapes the extraction directory")]
  UnsafeEntry { name: String },

  #[error("invalid class file {path}: {reason}")]
  InvalidClassFile {
    path: String,
    #[source]
    reason: ClassFileError,
  },
}

/// What the project artifact references.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Usage {
  /// Dotted package names, e.g. `javax.ws.rs`.
  pub packages: BTreeSet<String>,
  /// Relative paths of non-class files.
  pub resources: BTreeSet<String>,
  pub classes: usize,
}

pub struct FractionUsageAnalyzer<'a> {
  catalog: &'a ModuleCatalog,
  scanner: &'a dyn UsageScanner,
}

impl<'a> FractionUsageAnalyzer<'a> {
  pub fn new(catalog: &'a ModuleCatalog, scanner: &'a dyn UsageScanner) -> Self {
    Self { catalog, scanner }
  }

  /// Catalog modules the artifact needs, sorted and unique.
  ///
  /// `artifact` may be a zip (jar/war) or an exploded directory.
  pub fn detect_needed_modules(&self, artifact: &Path) -> Result<Vec<ModuleDescriptor>, AnalysisError> {
    let usage = self.scan(artifact)?;
    info!(
      artifact = ?artifact,
      classes = usage.classes,
      packages = usage.packages.len(),
      "scanned project artifact"
    );

    let mut selected = BTreeSet::new();
    for module in self.catalog.modules() {
      let by_package = usage.packages.iter().any(|p| module.exposes_package(p));
      let by_resource = usage.resources.iter().any(|r| module.provides_resource(r));
      if by_package || by_resource {
        debug!(module = %module.key(), by_package, by_resource, "detected module");
        selected.insert(module.clone());
      }
    }

    Ok(selected.into_iter().collect())
  }

  /// Collect referenced packages and resources from `artifact`.
  pub fn scan(&self, artifact: &Path) -> Result<Usage, AnalysisError> {
    if artifact.is_dir() {
      return self.scan_dir(artifact);
    }

    let unpacked = tempfile::Builder::new()
      .prefix("swarmpack-analyze-")
      .tempdir()
      .map_err(|source| AnalysisError::Unpack {
        path: artifact.to_path_buf(),
        source,
      })?;
    unpack(artifact, &unpacked)?;
    self.scan_dir(unpacked.path())
  }

  fn scan_dir(&self, root: &Path) -> Result<Usage, AnalysisError> {
    let mut usage = Usage::default();

    for entry in WalkDir::new(root).sort_by_file_name() {
      let entry = entry.map_err(|e| AnalysisError::Unpack {
        path: root.to_path_buf(),
        source: e.into(),
      })?;
      if !entry.file_type().is_file() {
        continue;
      }

      let relative = entry
        .path()
        .strip_prefix(root)
        .unwrap_or(entry.path())
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/");

      if relative.ends_with(".class") {
        let bytes = fs::read(entry.path()).map_err(|source| AnalysisError::Unpack {
          path: entry.path().to_path_buf(),
          source,
        })?;
        let types = self
          .scanner
          .scan_class(&bytes)
          .map_err(|reason| AnalysisError::InvalidClassFile {
            path: relative.clone(),
            reason,
          })?;
        usage.packages.extend(types.iter().filter_map(|t| package_of(t)));
        usage.classes += 1;
      } else {
        usage.resources.insert(relative);
      }
    }

    Ok(usage)
  }
}

/// Extract `archive` into `dest`. The caller owns cleanup of `dest`.
fn unpack(archive: &Path, dest: &TempDir) -> Result<(), AnalysisError> {
  let unpack_err = |source: io::Error| AnalysisError::Unpack {
    path: archive.to_path_buf(),
    source,
  };

  let file = File::open(archive).map_err(unpack_err)?;
  let mut zip = ZipArchive::new(BufReader::new(file)).map_err(|source| AnalysisError::Open {
    path: archive.to_path_buf(),
    source,
  })?;

  for index in 0..zip.len() {
    let mut entry = zip.by_index(index).map_err(|source| AnalysisError::Entry {
      path: archive.to_path_buf(),
      index,
      source,
    })?;

    let relative = entry.enclosed_name().ok_or_else(|| AnalysisError::UnsafeEntry {
      name: entry.name().to_string(),
    })?;
    let target = dest.path().join(relative);

    if entry.is_dir() {
      fs::create_dir_all(&target).map_err(unpack_err)?;
      continue;
    }
    if let Some(parent) = target.parent() {
      fs::create_dir_all(parent).map_err(unpack_err)?;
    }
    let mut out = File::create(&target).map_err(unpack_err)?;
    io::copy(&mut entry, &mut out).map_err(unpack_err)?;
  }

  Ok(())
}
