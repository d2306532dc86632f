//! Shared fixtures: a Maven-layout repository on disk plus project jars.

use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use swarmpack_lib::archive;
use swarmpack_lib::artifact::ArtifactSpec;
use swarmpack_lib::catalog::ModuleCatalog;
use swarmpack_lib::repository::LocalRepository;
use tempfile::TempDir;
use zip::ZipWriter;
use zip::write::SimpleFileOptions;

pub const BOOTSTRAP: &str = "org.wildfly.swarm:bootstrap:1.0";
pub const MODULE_LOADER: &str = "org.jboss.modules:jboss-modules:1.5";
pub const JAXRS: &str = "org.wildfly.swarm:jaxrs:1.0";
pub const CDI: &str = "org.wildfly.swarm:cdi:1.0";
pub const JPA: &str = "org.wildfly.swarm:jpa:1.0";

pub const CATALOG: &str = r#"
modules:
  - group-id: org.wildfly.swarm
    artifact-id: jaxrs
    version: "1.0"
    packages: [javax.ws.rs]
  - group-id: org.wildfly.swarm
    artifact-id: cdi
    version: "1.0"
    packages: [javax.inject, javax.enterprise]
  - group-id: org.wildfly.swarm
    artifact-id: jpa
    version: "1.0"
    packages: [javax.persistence]
"#;

/// Isolated repository, project and output directories.
pub struct Fixture {
  pub temp: TempDir,
}

impl Fixture {
  /// A repository holding the bootstrap runtime, the module loader, and three fractions
  /// that each depend on the bootstrap runtime.
  pub fn new() -> Self {
    let fixture = Self::empty();
    fixture.install(
      MODULE_LOADER,
      &[
        ("org/jboss/modules/ModuleLoader.class", class_file("org/jboss/modules/ModuleLoader", &[])),
        ("META-INF/MANIFEST.MF", b"Manifest-Version: 1.0\r\nMain-Class: org.jboss.modules.Main\r\n".to_vec()),
      ],
      &[],
    );
    fixture.install(
      BOOTSTRAP,
      &[
        ("org/wildfly/swarm/bootstrap/Main.class", class_file("org/wildfly/swarm/bootstrap/Main", &[])),
        ("META-INF/MANIFEST.MF", b"Manifest-Version: 1.0\r\nMain-Class: wrong\r\n".to_vec()),
        ("META-INF/maven/org.wildfly.swarm/bootstrap/pom.properties", b"version=1.0".to_vec()),
      ],
      &[MODULE_LOADER],
    );
    for fraction in [JAXRS, CDI, JPA] {
      fixture.install(fraction, &[("fraction.txt", fraction.as_bytes().to_vec())], &[BOOTSTRAP]);
    }
    fixture
  }

  pub fn empty() -> Self {
    Self {
      temp: TempDir::new().unwrap(),
    }
  }

  pub fn repository_root(&self) -> PathBuf {
    self.temp.path().join("repository")
  }

  pub fn resolver(&self) -> LocalRepository {
    LocalRepository::new(self.repository_root())
  }

  pub fn catalog(&self) -> ModuleCatalog {
    ModuleCatalog::from_yaml_str(CATALOG).unwrap()
  }

  pub fn path(&self, relative: &str) -> PathBuf {
    self.temp.path().join(relative)
  }

  /// Install a jar and its POM at the coordinate's repository path.
  pub fn install(&self, coordinate: &str, entries: &[(&str, Vec<u8>)], dependencies: &[&str]) -> PathBuf {
    let spec: ArtifactSpec = coordinate.parse().unwrap();
    let jar = self.repository_root().join(spec.repository_path());
    write_jar(&jar, entries);
    fs::write(jar.with_extension("pom"), pom(&spec, dependencies)).unwrap();
    jar
  }

  /// Write the project war at `<temp>/project/shop.war`.
  pub fn project(&self, entries: &[(&str, Vec<u8>)]) -> ArtifactSpec {
    let path = self.path("project/shop.war");
    write_jar(&path, entries);
    "com.acme:shop:war:1.0".parse::<ArtifactSpec>().unwrap().with_file(path)
  }

  /// A project with a single class referencing `refs`.
  pub fn project_referencing(&self, refs: &[&str]) -> ArtifactSpec {
    self.project(&[("WEB-INF/classes/com/acme/App.class", class_file("com/acme/App", refs))])
  }
}

pub fn write_jar(path: &Path, entries: &[(&str, Vec<u8>)]) {
  fs::create_dir_all(path.parent().unwrap()).unwrap();
  let mut zip = ZipWriter::new(File::create(path).unwrap());
  for (name, bytes) in entries {
    zip.start_file(*name, SimpleFileOptions::default()).unwrap();
    zip.write_all(bytes).unwrap();
  }
  zip.finish().unwrap();
}

fn pom(spec: &ArtifactSpec, dependencies: &[&str]) -> String {
  let mut deps = String::new();
  for coordinate in dependencies {
    let dep: ArtifactSpec = coordinate.parse().unwrap();
    deps.push_str(&format!(
      "    <dependency><groupId>{}</groupId><artifactId>{}</artifactId><version>{}</version></dependency>\n",
      dep.group_id(),
      dep.artifact_id(),
      dep.version()
    ));
  }
  format!(
    "<project>\n  <groupId>{}</groupId>\n  <artifactId>{}</artifactId>\n  <version>{}</version>\n  <dependencies>\n{}  </dependencies>\n</project>\n",
    spec.group_id(),
    spec.artifact_id(),
    spec.version(),
    deps
  )
}

/// Minimal class file whose constant pool names `this`, `java/lang/Object` and each of `refs`.
pub fn class_file(this: &str, refs: &[&str]) -> Vec<u8> {
  let mut pool = Vec::new();
  let mut next: u16 = 1;
  let mut class = |name: &str, pool: &mut Vec<u8>| {
    pool.push(1);
    pool.extend((name.len() as u16).to_be_bytes());
    pool.extend(name.as_bytes());
    pool.push(7);
    pool.extend(next.to_be_bytes());
    next += 2;
    next - 1
  };

  let this_index = class(this, &mut pool);
  let super_index = class("java/lang/Object", &mut pool);
  for r in refs {
    class(r, &mut pool);
  }

  let mut out = 0xCAFE_BABEu32.to_be_bytes().to_vec();
  out.extend(0u16.to_be_bytes());
  out.extend(52u16.to_be_bytes());
  out.extend(next.to_be_bytes());
  out.extend(pool);
  out.extend(0x0021u16.to_be_bytes());
  out.extend(this_index.to_be_bytes());
  out.extend(super_index.to_be_bytes());
  // interfaces, fields, methods, attributes
  out.extend([0u8; 8]);
  out
}

pub fn entries(path: &Path) -> Vec<String> {
  archive::list_entries(path).unwrap()
}

pub fn read_text(path: &Path, name: &str) -> String {
  let bytes = archive::read_entry(path, name)
    .unwrap()
    .unwrap_or_else(|| panic!("{} has no entry {}", path.display(), name));
  String::from_utf8(bytes).unwrap()
}
