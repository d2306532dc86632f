//! Minimal POM reader.
//!
//! Only the parts needed to walk a dependency graph are read: the project
//! coordinate (falling back to `<parent>`), `<properties>`, and the direct
//! `<dependencies>` block. `<dependencyManagement>` is ignored.

use std::collections::BTreeMap;

use quick_xml::events::Event;
use quick_xml::reader::Reader;

use crate::artifact::{ArtifactSpec, Scope};

/// One `<dependency>` element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PomDependency {
  pub group_id: String,
  pub artifact_id: String,
  pub version: Option<String>,
  pub scope: Scope,
  pub optional: bool,
  pub classifier: Option<String>,
  pub packaging: String,
}

impl PomDependency {
  /// Convert to an artifact spec. Unversioned dependencies yield `None`.
  pub fn to_spec(&self) -> Option<ArtifactSpec> {
    let version = self.version.as_ref()?;
    Some(
      ArtifactSpec::new(&self.group_id, &self.artifact_id, version)
        .with_packaging(&self.packaging)
        .with_classifier(self.classifier.clone())
        .with_scope(self.scope),
    )
  }
}

/// The parsed subset of a POM.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Pom {
  pub group_id: Option<String>,
  pub artifact_id: Option<String>,
  pub version: Option<String>,
  pub dependencies: Vec<PomDependency>,
}

#[derive(Default)]
struct DependencyFields {
  group_id: String,
  artifact_id: String,
  version: Option<String>,
  scope: Option<String>,
  optional: Option<String>,
  classifier: Option<String>,
  packaging: Option<String>,
}

/// Parse POM XML, substituting `${...}` references in dependency fields.
pub fn parse_pom(xml: &str) -> Result<Pom, quick_xml::Error> {
  let mut reader = Reader::from_str(xml);
  reader.config_mut().trim_text(true);

  let mut path: Vec<String> = Vec::new();
  let mut pom = Pom::default();
  let mut parent_group: Option<String> = None;
  let mut parent_version: Option<String> = None;
  let mut properties: BTreeMap<String, String> = BTreeMap::new();
  let mut raw_deps: Vec<DependencyFields> = Vec::new();
  let mut current: Option<DependencyFields> = None;

  loop {
    match reader.read_event()? {
      Event::Start(e) => {
        let name = String::from_utf8_lossy(e.local_name().as_ref()).into_owned();
        path.push(name);
        if path_is(&path, &["project", "dependencies", "dependency"]) {
          current = Some(DependencyFields::default());
        }
      }
      Event::End(_) => {
        if path_is(&path, &["project", "dependencies", "dependency"])
          && let Some(fields) = current.take()
        {
          raw_deps.push(fields);
        }
        path.pop();
      }
      Event::Text(t) => {
        let text = t.unescape()?.into_owned();
        let segments: Vec<&str> = path.iter().map(String::as_str).collect();
        match segments.as_slice() {
          ["project", "groupId"] => pom.group_id = Some(text),
          ["project", "artifactId"] => pom.artifact_id = Some(text),
          ["project", "version"] => pom.version = Some(text),
          ["project", "parent", "groupId"] => parent_group = Some(text),
          ["project", "parent", "version"] => parent_version = Some(text),
          ["project", "properties", key] => {
            properties.insert(key.to_string(), text);
          }
          ["project", "dependencies", "dependency", field] => {
            if let Some(dep) = current.as_mut() {
              match *field {
                "groupId" => dep.group_id = text,
                "artifactId" => dep.artifact_id = text,
                "version" => dep.version = Some(text),
                "scope" => dep.scope = Some(text),
                "optional" => dep.optional = Some(text),
                "classifier" => dep.classifier = Some(text),
                "type" => dep.packaging = Some(text),
                _ => {}
              }
            }
          }
          _ => {}
        }
      }
      Event::Eof => break,
      _ => {}
    }
  }

  if pom.group_id.is_none() {
    pom.group_id = parent_group.clone();
  }
  if pom.version.is_none() {
    pom.version = parent_version.clone();
  }

  if let Some(v) = &pom.version {
    properties.entry("project.version".to_string()).or_insert_with(|| v.clone());
    properties.entry("version".to_string()).or_insert_with(|| v.clone());
  }
  if let Some(g) = &pom.group_id {
    properties.entry("project.groupId".to_string()).or_insert_with(|| g.clone());
  }
  if let Some(v) = &parent_version {
    properties.entry("project.parent.version".to_string()).or_insert_with(|| v.clone());
  }

  pom.dependencies = raw_deps
    .into_iter()
    .map(|raw| PomDependency {
      group_id: substitute(&raw.group_id, &properties),
      artifact_id: substitute(&raw.artifact_id, &properties),
      version: raw.version.map(|v| substitute(&v, &properties)),
      scope: raw
        .scope
        .map(|s| substitute(&s, &properties))
        .and_then(|s| s.parse().ok())
        .unwrap_or_default(),
      optional: raw.optional.is_some_and(|o| substitute(&o, &properties) == "true"),
      classifier: raw.classifier.map(|c| substitute(&c, &properties)),
      packaging: raw
        .packaging
        .map(|p| substitute(&p, &properties))
        .unwrap_or_else(|| "jar".to_string()),
    })
    .collect();

  Ok(pom)
}

fn path_is(path: &[String], expected: &[&str]) -> bool {
  path.len() == expected.len() && path.iter().zip(expected).all(|(a, b)| a == b)
}

/// Replace `${key}` with known property values. Unknown references are kept.
fn substitute(value: &str, properties: &BTreeMap<String, String>) -> String {
  let mut out = String::with_capacity(value.len());
  let mut rest = value;

  while let Some(start) = rest.find("${") {
    out.push_str(&rest[..start]);
    let after = &rest[start + 2..];
    match after.find('}') {
      Some(end) => {
        let key = &after[..end];
        match properties.get(key) {
          Some(replacement) => out.push_str(replacement),
          None => {
            out.push_str("${");
            out.push_str(key);
            out.push('}');
          }
        }
        rest = &after[end + 1..];
      }
      None => {
        out.push_str(&rest[start..]);
        rest = "";
      }
    }
  }
  out.push_str(rest);
  out
}
