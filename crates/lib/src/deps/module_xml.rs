//! `module.xml` descriptors shipped in additional module directories.
//!
//! Only the module identity and its `<artifact name="g:a:v[:classifier]"/>`
//! resources matter here; the artifacts must end up in the repository the
//! runtime reads from. A `<module-alias>` root is read for its identity and
//! target; it carries no artifacts.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use quick_xml::events::{BytesStart, Event};
use quick_xml::reader::Reader;
use thiserror::Error;

use crate::artifact::ArtifactSpec;

#[derive(Debug, Error)]
pub enum ModuleXmlError {
  #[error("failed to read {}: {source}", path.display())]
  Read {
    path: PathBuf,
    #[source]
    source: io::Error,
  },

  #[error("malformed module descriptor {}: {message}", path.display())]
  Malformed { path: PathBuf, message: String },

  #[error("module descriptor {} has no module name", path.display())]
  MissingName { path: PathBuf },

  #[error("invalid artifact '{name}' in {}", path.display())]
  BadArtifact { path: PathBuf, name: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleXml {
  pub name: String,
  pub slot: String,
  pub artifacts: Vec<ArtifactSpec>,
  /// `target-name[:target-slot]` when the descriptor is a `<module-alias>`.
  pub alias_of: Option<String>,
}

impl ModuleXml {
  pub fn read(path: &Path) -> Result<Self, ModuleXmlError> {
    let content = fs::read_to_string(path).map_err(|source| ModuleXmlError::Read {
      path: path.to_path_buf(),
      source,
    })?;
    Self::parse(&content, path)
  }

  /// Parse descriptor text. `origin` is only used in errors.
  pub fn parse(content: &str, origin: &Path) -> Result<Self, ModuleXmlError> {
    let malformed = |message: String| ModuleXmlError::Malformed {
      path: origin.to_path_buf(),
      message,
    };

    let mut reader = Reader::from_str(content);
    reader.config_mut().trim_text(true);

    let mut name = None;
    let mut slot = None;
    let mut alias_of = None;
    let mut artifacts = Vec::new();
    let mut depth = 0usize;

    loop {
      let event = reader.read_event().map_err(|e| malformed(e.to_string()))?;
      let (element, is_start) = match &event {
        Event::Start(e) => (e, true),
        Event::Empty(e) => (e, false),
        Event::End(_) => {
          depth = depth.saturating_sub(1);
          continue;
        }
        Event::Eof => break,
        _ => continue,
      };

      match element.local_name().as_ref() {
        b"module" if depth == 0 => {
          name = attribute(element, b"name").map_err(malformed)?;
          slot = attribute(element, b"slot").map_err(malformed)?;
        }
        b"module-alias" if depth == 0 => {
          name = attribute(element, b"name").map_err(malformed)?;
          slot = attribute(element, b"slot").map_err(malformed)?;
          let target = attribute(element, b"target-name").map_err(malformed)?;
          let target_slot = attribute(element, b"target-slot").map_err(malformed)?;
          alias_of = target.map(|target| match target_slot {
            Some(target_slot) if target_slot != "main" => format!("{}:{}", target, target_slot),
            _ => target,
          });
        }
        b"artifact" => {
          if let Some(coordinate) = attribute(element, b"name").map_err(malformed)? {
            let spec = parse_artifact(&coordinate).ok_or_else(|| ModuleXmlError::BadArtifact {
              path: origin.to_path_buf(),
              name: coordinate.clone(),
            })?;
            artifacts.push(spec);
          }
        }
        _ => {}
      }

      if is_start {
        depth += 1;
      }
    }

    let name = name.ok_or_else(|| ModuleXmlError::MissingName {
      path: origin.to_path_buf(),
    })?;

    Ok(Self {
      name,
      slot: slot.unwrap_or_else(|| "main".to_string()),
      artifacts,
      alias_of,
    })
  }

  /// `name` or `name:slot` when the slot is not `main`.
  pub fn identifier(&self) -> String {
    if self.slot == "main" {
      self.name.clone()
    } else {
      format!("{}:{}", self.name, self.slot)
    }
  }
}

fn attribute(element: &BytesStart<'_>, key: &[u8]) -> Result<Option<String>, String> {
  for attr in element.attributes() {
    let attr = attr.map_err(|e| e.to_string())?;
    if attr.key.local_name().as_ref() == key {
      let value = attr.unescape_value().map_err(|e| e.to_string())?;
      return Ok(Some(value.into_owned()));
    }
  }
  Ok(None)
}

/// `group:artifact:version[:classifier]`
fn parse_artifact(coordinate: &str) -> Option<ArtifactSpec> {
  let parts: Vec<&str> = coordinate.split(':').collect();
  if parts.iter().any(|p| p.is_empty() || p.contains("${")) {
    return None;
  }
  match parts.as_slice() {
    [g, a, v] => Some(ArtifactSpec::new(*g, *a, *v)),
    [g, a, v, c] => Some(ArtifactSpec::new(*g, *a, *v).with_classifier(Some(c.to_string()))),
    _ => None,
  }
}
