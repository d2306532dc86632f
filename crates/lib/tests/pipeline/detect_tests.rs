//! Builds that rely on fraction auto-detection.

use swarmpack_lib::analyzer::{ClassFileScanner, FractionUsageAnalyzer};
use swarmpack_lib::build::{BuildConfig, BuildError, BuildTool};
use swarmpack_lib::consts::BOOTSTRAP_CONF_PATH;

use super::common::*;

#[test]
fn analyzer_selects_exactly_referenced_modules() {
  let fixture = Fixture::new();
  let project = fixture.project_referencing(&["javax/ws/rs/Path", "javax/inject/Inject", "org/slf4j/Logger"]);
  let catalog = fixture.catalog();

  let detected = FractionUsageAnalyzer::new(&catalog, &ClassFileScanner)
    .detect_needed_modules(project.file().unwrap())
    .unwrap();
  let ids: Vec<&str> = detected.iter().map(|m| m.artifact_id.as_str()).collect();
  assert_eq!(ids, vec!["cdi", "jaxrs"]);
}

#[test]
fn detected_fractions_drive_the_build() {
  let fixture = Fixture::new();
  let config = BuildConfig::new()
    .with_project(fixture.project_referencing(&["javax/ws/rs/GET", "javax/inject/Inject"]))
    .with_catalog(fixture.catalog());
  let resolver = fixture.resolver();

  let output = BuildTool::new(&config, &resolver, &ClassFileScanner)
    .build("shop", &fixture.path("target"))
    .unwrap();

  let detected: Vec<String> = output.detected.iter().map(|m| m.key()).collect();
  assert_eq!(detected, vec!["org.wildfly.swarm:cdi", "org.wildfly.swarm:jaxrs"]);
  assert_eq!(
    read_text(&output.path, BOOTSTRAP_CONF_PATH),
    "org.wildfly.swarm:cdi\norg.wildfly.swarm:jaxrs\n"
  );
  assert!(entries(&output.path).contains(&"m2repo/org/wildfly/swarm/bootstrap/1.0/bootstrap-1.0.jar".to_string()));
}

#[test]
fn detection_is_skipped_when_bootstrap_is_declared() {
  let fixture = Fixture::new();
  let config = BuildConfig::new()
    .with_project(fixture.project_referencing(&["javax/persistence/Entity"]))
    .with_catalog(fixture.catalog())
    .with_fraction(JAXRS.parse().unwrap());
  let resolver = fixture.resolver();

  let assembled = BuildTool::new(&config, &resolver, &ClassFileScanner).assemble().unwrap();
  assert!(assembled.detected.is_empty());
}

#[test]
fn detection_without_catalog_is_configuration_error() {
  let fixture = Fixture::new();
  let config = BuildConfig::new().with_project(fixture.project_referencing(&["javax/ws/rs/GET"]));
  let resolver = fixture.resolver();

  let err = BuildTool::new(&config, &resolver, &ClassFileScanner)
    .build("shop", &fixture.path("target"))
    .unwrap_err();
  assert!(matches!(err, BuildError::Configuration(_)));
  assert!(!fixture.path("target").join("shop-swarm.jar").exists());
}

#[test]
fn unreadable_class_aborts_the_build() {
  let fixture = Fixture::new();
  let project = fixture.project(&[("WEB-INF/classes/Broken.class", b"garbage".to_vec())]);
  let config = BuildConfig::new().with_project(project).with_catalog(fixture.catalog());
  let resolver = fixture.resolver();

  let err = BuildTool::new(&config, &resolver, &ClassFileScanner)
    .build("shop", &fixture.path("target"))
    .unwrap_err();
  assert!(matches!(err, BuildError::Analysis(_)));
}

#[test]
fn nothing_detected_means_missing_bootstrap() {
  let fixture = Fixture::new();
  let config = BuildConfig::new()
    .with_project(fixture.project_referencing(&["java/util/List"]))
    .with_catalog(fixture.catalog());
  let resolver = fixture.resolver();

  let err = BuildTool::new(&config, &resolver, &ClassFileScanner).assemble().unwrap_err();
  assert!(matches!(err, BuildError::MissingBootstrap));
}
