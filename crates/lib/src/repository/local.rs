use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tracing::{debug, trace};

use super::pom::parse_pom;
use super::{ArtifactResolver, RepositoryError};
use crate::artifact::{ArtifactSpec, Scope};

/// A Maven-layout repository directory, e.g. `~/.m2/repository`.
#[derive(Debug, Clone)]
pub struct LocalRepository {
  root: PathBuf,
}

impl LocalRepository {
  pub fn new(root: impl Into<PathBuf>) -> Self {
    Self { root: root.into() }
  }

  pub fn root(&self) -> &Path {
    &self.root
  }

  fn pom_path(&self, spec: &ArtifactSpec) -> PathBuf {
    self
      .root
      .join(spec.group_id().replace('.', "/"))
      .join(spec.artifact_id())
      .join(spec.version())
      .join(format!("{}-{}.pom", spec.artifact_id(), spec.version()))
  }
}

impl ArtifactResolver for LocalRepository {
  fn resolve(&self, spec: &ArtifactSpec) -> Result<Option<PathBuf>, RepositoryError> {
    let path = self.root.join(spec.repository_path());
    trace!(coordinate = %spec, path = ?path, "looking up artifact");
    Ok(path.is_file().then_some(path))
  }

  fn dependencies(&self, spec: &ArtifactSpec) -> Result<Vec<ArtifactSpec>, RepositoryError> {
    let pom_path = self.pom_path(spec);
    let content = match fs::read_to_string(&pom_path) {
      Ok(content) => content,
      Err(e) if e.kind() == io::ErrorKind::NotFound => {
        debug!(coordinate = %spec, "no POM, treating as leaf");
        return Ok(Vec::new());
      }
      Err(source) => return Err(RepositoryError::Read { path: pom_path, source }),
    };

    let pom = parse_pom(&content).map_err(|e| RepositoryError::Pom {
      path: pom_path.clone(),
      message: e.to_string(),
    })?;

    let mut deps = Vec::new();
    for dep in pom.dependencies {
      if dep.optional || !matches!(dep.scope, Scope::Compile | Scope::Runtime) {
        continue;
      }
      match dep.to_spec() {
        Some(child) => deps.push(child),
        None => debug!(
          parent = %spec,
          dependency = %format!("{}:{}", dep.group_id, dep.artifact_id),
          "skipping unversioned dependency"
        ),
      }
    }
    Ok(deps)
  }
}
