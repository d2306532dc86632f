//! Value types carried by the build manifest.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A property value. Build tools may hand over non-string scalars (e.g. a port number),
/// so the manifest keeps the original type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PropertyValue {
  Bool(bool),
  Integer(i64),
  Float(f64),
  String(String),
}

impl fmt::Display for PropertyValue {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      PropertyValue::Bool(b) => write!(f, "{}", b),
      PropertyValue::Integer(i) => write!(f, "{}", i),
      PropertyValue::Float(x) => write!(f, "{}", x),
      PropertyValue::String(s) => f.write_str(s),
    }
  }
}

impl From<&str> for PropertyValue {
  fn from(value: &str) -> Self {
    PropertyValue::String(value.to_string())
  }
}

impl From<String> for PropertyValue {
  fn from(value: String) -> Self {
    PropertyValue::String(value)
  }
}

impl From<bool> for PropertyValue {
  fn from(value: bool) -> Self {
    PropertyValue::Bool(value)
  }
}

impl From<i64> for PropertyValue {
  fn from(value: i64) -> Self {
    PropertyValue::Integer(value)
  }
}

impl From<f64> for PropertyValue {
  fn from(value: f64) -> Self {
    PropertyValue::Float(value)
  }
}

/// How manifest properties combine with an existing configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MergePolicy {
  /// Keys already present are left untouched.
  #[default]
  KeepExisting,
  /// Manifest values replace existing ones.
  Overwrite,
}
