//! Dependency repository access.
//!
//! The pipeline never talks to a repository directly; it goes through
//! [`ArtifactResolver`]. Two implementations ship with the crate:
//!
//! - [`LocalRepository`] - a Maven-layout directory on disk, with POM parsing
//!   for transitive dependencies
//! - [`MemoryRepository`] - an in-memory map, useful for tests and for callers
//!   that already know their graph

mod local;
mod memory;
mod pom;

use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::artifact::ArtifactSpec;

pub use local::LocalRepository;
pub use memory::MemoryRepository;
pub use pom::{Pom, PomDependency, parse_pom};

/// Errors raised by a repository implementation.
#[derive(Debug, Error)]
pub enum RepositoryError {
  #[error("failed to read {}: {source}", path.display())]
  Read {
    path: PathBuf,
    #[source]
    source: io::Error,
  },

  #[error("malformed POM {}: {message}", path.display())]
  Pom { path: PathBuf, message: String },
}

/// Locates artifacts and reports their direct dependencies.
pub trait ArtifactResolver {
  /// Find the local file for `spec`.
  ///
  /// Returns `Ok(None)` when the repository does not hold the artifact.
  fn resolve(&self, spec: &ArtifactSpec) -> Result<Option<PathBuf>, RepositoryError>;

  /// Direct runtime dependencies of `spec`, in declaration order.
  ///
  /// Test-scoped and optional dependencies are not reported.
  fn dependencies(&self, spec: &ArtifactSpec) -> Result<Vec<ArtifactSpec>, RepositoryError>;
}
