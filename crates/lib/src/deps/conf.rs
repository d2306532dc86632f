//! Plain-text descriptors read by the bootstrap runtime at startup.

use std::collections::BTreeSet;
use std::fmt;

/// `META-INF/wildfly-swarm-bootstrap.conf`: one `group:artifact` per bootstrap module.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BootstrapConf {
  modules: BTreeSet<String>,
}

impl BootstrapConf {
  pub fn add(&mut self, module: impl Into<String>) {
    self.modules.insert(module.into());
  }

  pub fn entries(&self) -> impl Iterator<Item = &str> {
    self.modules.iter().map(String::as_str)
  }
}

impl fmt::Display for BootstrapConf {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    for module in &self.modules {
      writeln!(f, "{}", module)?;
    }
    Ok(())
  }
}

/// `META-INF/wildfly-swarm-dependencies.conf`
///
/// `primary:` lines are the dependencies the project declared itself, `extra:`
/// lines everything pulled in on their behalf.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DependenciesConf {
  primary: BTreeSet<String>,
  extra: BTreeSet<String>,
}

impl DependenciesConf {
  pub fn add_primary(&mut self, coordinate: impl Into<String>) {
    self.primary.insert(coordinate.into());
  }

  pub fn add_extra(&mut self, coordinate: impl Into<String>) {
    self.extra.insert(coordinate.into());
  }

  pub fn primary(&self) -> impl Iterator<Item = &str> {
    self.primary.iter().map(String::as_str)
  }

  pub fn extra(&self) -> impl Iterator<Item = &str> {
    self.extra.iter().map(String::as_str)
  }
}

impl fmt::Display for DependenciesConf {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    for coordinate in &self.primary {
      writeln!(f, "primary:{}", coordinate)?;
    }
    for coordinate in &self.extra {
      writeln!(f, "extra:{}", coordinate)?;
    }
    Ok(())
  }
}

/// `META-INF/wildfly-swarm-application.conf`: extra modules to load, then the application path.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ApplicationConf {
  modules: BTreeSet<String>,
  path: Option<String>,
}

impl ApplicationConf {
  pub fn add_module(&mut self, identifier: impl Into<String>) {
    self.modules.insert(identifier.into());
  }

  pub fn set_path(&mut self, path: Option<impl Into<String>>) {
    self.path = path.map(Into::into);
  }
}

impl fmt::Display for ApplicationConf {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    for module in &self.modules {
      writeln!(f, "module:{}", module)?;
    }
    if let Some(path) = &self.path {
      writeln!(f, "path:{}", path)?;
    }
    Ok(())
  }
}
