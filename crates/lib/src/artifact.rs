//! Artifact coordinates and identity.
//!
//! An [`ArtifactSpec`] names one dependency: its Maven coordinate, scope, and
//! (once resolved) the local file backing it. Two specs are the same dependency
//! when their [`ArtifactKey`] matches; the version is deliberately not part of
//! the key so that version conflicts collapse into a single working-set entry.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Dependency scope as declared by the build.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Scope {
  #[default]
  Compile,
  Runtime,
  Provided,
  Test,
  System,
  Import,
}

impl Scope {
  pub fn as_str(&self) -> &'static str {
    match self {
      Scope::Compile => "compile",
      Scope::Runtime => "runtime",
      Scope::Provided => "provided",
      Scope::Test => "test",
      Scope::System => "system",
      Scope::Import => "import",
    }
  }
}

impl fmt::Display for Scope {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

impl FromStr for Scope {
  type Err = CoordinateError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s {
      "compile" => Ok(Scope::Compile),
      "runtime" => Ok(Scope::Runtime),
      "provided" => Ok(Scope::Provided),
      "test" => Ok(Scope::Test),
      "system" => Ok(Scope::System),
      "import" => Ok(Scope::Import),
      other => Err(CoordinateError::UnknownScope(other.to_string())),
    }
  }
}

/// Errors produced while parsing coordinates.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CoordinateError {
  #[error("malformed coordinate '{input}': {reason}")]
  Malformed { input: String, reason: String },

  #[error("unknown scope '{0}'")]
  UnknownScope(String),
}

/// Identity of a dependency inside the working set.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ArtifactKey {
  pub group_id: String,
  pub artifact_id: String,
  pub classifier: Option<String>,
  pub packaging: String,
}

impl fmt::Display for ArtifactKey {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}:{}:{}", self.group_id, self.artifact_id, self.packaging)?;
    if let Some(classifier) = &self.classifier {
      write!(f, ":{}", classifier)?;
    }
    Ok(())
  }
}

/// A declared or discovered dependency.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ArtifactSpec {
  scope: Scope,
  group_id: String,
  artifact_id: String,
  version: String,
  packaging: String,
  classifier: Option<String>,
  file: Option<PathBuf>,
}

impl ArtifactSpec {
  /// Create a `jar` artifact in `compile` scope.
  pub fn new(group_id: impl Into<String>, artifact_id: impl Into<String>, version: impl Into<String>) -> Self {
    Self {
      scope: Scope::default(),
      group_id: group_id.into(),
      artifact_id: artifact_id.into(),
      version: version.into(),
      packaging: "jar".to_string(),
      classifier: None,
      file: None,
    }
  }

  pub fn with_scope(mut self, scope: Scope) -> Self {
    self.scope = scope;
    self
  }

  pub fn with_packaging(mut self, packaging: impl Into<String>) -> Self {
    self.packaging = packaging.into();
    self
  }

  pub fn with_classifier(mut self, classifier: Option<String>) -> Self {
    self.classifier = classifier.filter(|c| !c.is_empty());
    self
  }

  pub fn with_file(mut self, file: impl Into<PathBuf>) -> Self {
    self.file = Some(file.into());
    self
  }

  pub fn scope(&self) -> Scope {
    self.scope
  }

  pub fn group_id(&self) -> &str {
    &self.group_id
  }

  pub fn artifact_id(&self) -> &str {
    &self.artifact_id
  }

  pub fn version(&self) -> &str {
    &self.version
  }

  pub fn packaging(&self) -> &str {
    &self.packaging
  }

  pub fn classifier(&self) -> Option<&str> {
    self.classifier.as_deref()
  }

  pub fn file(&self) -> Option<&Path> {
    self.file.as_deref()
  }

  pub fn is_resolved(&self) -> bool {
    self.file.is_some()
  }

  pub fn key(&self) -> ArtifactKey {
    ArtifactKey {
      group_id: self.group_id.clone(),
      artifact_id: self.artifact_id.clone(),
      classifier: self.classifier.clone(),
      packaging: self.packaging.clone(),
    }
  }

  /// Whether this spec names the given `group:artifact`.
  pub fn is(&self, group_id: &str, artifact_id: &str) -> bool {
    self.group_id == group_id && self.artifact_id == artifact_id
  }

  /// `group:artifact:version`
  pub fn gav(&self) -> String {
    format!("{}:{}:{}", self.group_id, self.artifact_id, self.version)
  }

  /// File extension implied by the packaging.
  pub fn extension(&self) -> &str {
    match self.packaging.as_str() {
      "bundle" | "maven-plugin" | "ejb" => "jar",
      other => other,
    }
  }

  /// `artifact-version[-classifier].ext`
  pub fn file_name(&self) -> String {
    match &self.classifier {
      Some(classifier) => format!(
        "{}-{}-{}.{}",
        self.artifact_id,
        self.version,
        classifier,
        self.extension()
      ),
      None => format!("{}-{}.{}", self.artifact_id, self.version, self.extension()),
    }
  }

  /// `artifact.ext`, the name the runtime uses for the application artifact.
  pub fn simple_name(&self) -> String {
    format!("{}.{}", self.artifact_id, self.extension())
  }

  /// Maven repository layout path, always `/`-separated.
  pub fn repository_path(&self) -> String {
    format!(
      "{}/{}/{}/{}",
      self.group_id.replace('.', "/"),
      self.artifact_id,
      self.version,
      self.file_name()
    )
  }
}

/// Canonical form `group:artifact:packaging[:classifier]:version`.
impl fmt::Display for ArtifactSpec {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}:{}:{}", self.group_id, self.artifact_id, self.packaging)?;
    if let Some(classifier) = &self.classifier {
      write!(f, ":{}", classifier)?;
    }
    write!(f, ":{}", self.version)
  }
}

/// Accepts `g:a:v`, `g:a:p:v` and `g:a:p:c:v`.
impl FromStr for ArtifactSpec {
  type Err = CoordinateError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    let malformed = |reason: &str| CoordinateError::Malformed {
      input: s.to_string(),
      reason: reason.to_string(),
    };

    let parts: Vec<&str> = s.trim().split(':').collect();
    if parts.iter().any(|p| p.is_empty()) {
      return Err(malformed("empty segment"));
    }

    let spec = match parts.as_slice() {
      [g, a, v] => ArtifactSpec::new(*g, *a, *v),
      [g, a, p, v] => ArtifactSpec::new(*g, *a, *v).with_packaging(*p),
      [g, a, p, c, v] => ArtifactSpec::new(*g, *a, *v)
        .with_packaging(*p)
        .with_classifier(Some(c.to_string())),
      _ => return Err(malformed("expected 3 to 5 ':'-separated segments")),
    };

    Ok(spec)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  mod parsing {
    use super::*;

    #[test]
    fn three_segments_default_to_jar() {
      let spec: ArtifactSpec = "org.example:lib:1.0".parse().unwrap();
      assert_eq!(spec.packaging(), "jar");
      assert_eq!(spec.classifier(), None);
      assert_eq!(spec.scope(), Scope::Compile);
      assert_eq!(spec.to_string(), "org.example:lib:jar:1.0");
    }

    #[test]
    fn five_segments_carry_classifier() {
      let spec: ArtifactSpec = "org.example:lib:jar:sources:1.0".parse().unwrap();
      assert_eq!(spec.classifier(), Some("sources"));
      assert_eq!(spec.version(), "1.0");
      assert_eq!(spec.to_string(), "org.example:lib:jar:sources:1.0");
    }

    #[test]
    fn rejects_empty_segment() {
      let err = "org.example::1.0".parse::<ArtifactSpec>().unwrap_err();
      assert!(matches!(err, CoordinateError::Malformed { .. }));
    }

    #[test]
    fn rejects_wrong_segment_count() {
      assert!("org.example:lib".parse::<ArtifactSpec>().is_err());
      assert!("a:b:c:d:e:f".parse::<ArtifactSpec>().is_err());
    }

    #[test]
    fn scope_parses_known_names() {
      assert_eq!("runtime".parse::<Scope>().unwrap(), Scope::Runtime);
      assert_eq!(
        "bogus".parse::<Scope>().unwrap_err(),
        CoordinateError::UnknownScope("bogus".to_string())
      );
    }
  }

  mod identity {
    use super::*;

    #[test]
    fn key_ignores_version_and_scope() {
      let a = ArtifactSpec::new("g", "a", "1.0");
      let b = ArtifactSpec::new("g", "a", "2.0").with_scope(Scope::Runtime);
      assert_eq!(a.key(), b.key());
    }

    #[test]
    fn key_distinguishes_classifier_and_packaging() {
      let plain = ArtifactSpec::new("g", "a", "1.0");
      let sources = plain.clone().with_classifier(Some("sources".to_string()));
      let war = plain.clone().with_packaging("war");
      assert_ne!(plain.key(), sources.key());
      assert_ne!(plain.key(), war.key());
    }

    #[test]
    fn empty_classifier_is_none() {
      let spec = ArtifactSpec::new("g", "a", "1.0").with_classifier(Some(String::new()));
      assert_eq!(spec.classifier(), None);
    }
  }

  mod layout {
    use super::*;

    #[test]
    fn repository_path_follows_maven_layout() {
      let spec = ArtifactSpec::new("org.jboss.modules", "jboss-modules", "1.5.2");
      assert_eq!(
        spec.repository_path(),
        "org/jboss/modules/jboss-modules/1.5.2/jboss-modules-1.5.2.jar"
      );
    }

    #[test]
    fn repository_path_includes_classifier() {
      let spec = ArtifactSpec::new("g.h", "a", "1").with_classifier(Some("tests".to_string()));
      assert_eq!(spec.repository_path(), "g/h/a/1/a-1-tests.jar");
    }

    #[test]
    fn bundle_packaging_uses_jar_extension() {
      let spec = ArtifactSpec::new("g", "a", "1").with_packaging("bundle");
      assert_eq!(spec.file_name(), "a-1.jar");
      assert_eq!(spec.simple_name(), "a.jar");
    }

    #[test]
    fn simple_name_for_war() {
      let spec = ArtifactSpec::new("com.acme", "shop", "3.1").with_packaging("war");
      assert_eq!(spec.simple_name(), "shop.war");
    }
  }
}
