//! Full builds from a declared fraction.

use std::fs;

use swarmpack_lib::analyzer::ClassFileScanner;
use swarmpack_lib::build::{BuildConfig, BuildError, BuildTool};
use swarmpack_lib::consts::{
  APPLICATION_CONF_PATH, BOOTSTRAP_CONF_PATH, BUILD_MANIFEST_PATH, DEPENDENCIES_CONF_PATH, JAR_MANIFEST_PATH,
  PROPERTIES_PATH,
};
use swarmpack_lib::manifest::BuildManifest;
use swarmpack_lib::properties::PropertiesDocument;

use super::common::*;

fn declared_config(fixture: &Fixture) -> BuildConfig {
  BuildConfig::new()
    .with_project(fixture.project_referencing(&[]))
    .with_fraction(JAXRS.parse().unwrap())
    .with_external_repository(fixture.path("external"))
}

mod layout {
  use super::*;

  #[test]
  fn unbundled_build_has_no_embedded_repository() {
    let fixture = Fixture::new();
    let config = declared_config(&fixture).with_bundle_dependencies(false);
    let resolver = fixture.resolver();

    let output = BuildTool::new(&config, &resolver, &ClassFileScanner)
      .build("shop", &fixture.path("target"))
      .unwrap();

    assert_eq!(output.path, fixture.path("target/shop-swarm.jar"));
    let names = entries(&output.path);
    for expected in [
      "_bootstrap/shop.war",
      BUILD_MANIFEST_PATH,
      BOOTSTRAP_CONF_PATH,
      DEPENDENCIES_CONF_PATH,
      APPLICATION_CONF_PATH,
    ] {
      assert!(names.iter().any(|n| n == expected), "missing {}", expected);
    }
    assert!(!names.iter().any(|n| n.starts_with("m2repo/")));
    assert!(fixture.path("external/org/wildfly/swarm/jaxrs/1.0/jaxrs-1.0.jar").is_file());
  }

  #[test]
  fn bundled_build_embeds_every_resolved_dependency() {
    let fixture = Fixture::new();
    fixture.install("org.example:util:2.1", &[("util.txt", b"util".to_vec())], &[]);
    let config = declared_config(&fixture).with_dependency("org.example:util:2.1".parse().unwrap());
    let resolver = fixture.resolver();

    let output = BuildTool::new(&config, &resolver, &ClassFileScanner)
      .build("shop", &fixture.path("target"))
      .unwrap();

    let embedded: Vec<String> = entries(&output.path)
      .into_iter()
      .filter(|n| n.starts_with("m2repo/"))
      .collect();
    assert_eq!(
      embedded,
      vec![
        "m2repo/org/example/util/2.1/util-2.1.jar",
        "m2repo/org/jboss/modules/jboss-modules/1.5/jboss-modules-1.5.jar",
        "m2repo/org/wildfly/swarm/bootstrap/1.0/bootstrap-1.0.jar",
        "m2repo/org/wildfly/swarm/jaxrs/1.0/jaxrs-1.0.jar",
      ]
    );

    let manifest = BuildManifest::from_yaml_str(&read_text(&output.path, BUILD_MANIFEST_PATH)).unwrap();
    assert_eq!(manifest.dependencies().len(), embedded.len());
  }

  #[test]
  fn jar_manifest_first_then_path_order() {
    let fixture = Fixture::new();
    let config = declared_config(&fixture);
    let resolver = fixture.resolver();
    let output = BuildTool::new(&config, &resolver, &ClassFileScanner)
      .build("shop", &fixture.path("target"))
      .unwrap();

    let names = entries(&output.path);
    assert_eq!(names[0], JAR_MANIFEST_PATH);
    let metadata = names.iter().take_while(|n| n.starts_with("META-INF/")).count();
    assert!(names[metadata..].iter().all(|n| !n.starts_with("META-INF/")));
    assert!(names[1..metadata].is_sorted());
    assert!(names[metadata..].is_sorted());
    assert_eq!(output.entries, names.len());
  }

  #[test]
  fn module_directory_lands_under_modules_root() {
    let fixture = Fixture::new();
    fixture.install("com.acme:extra:1.0", &[("extra.txt", b"extra".to_vec())], &[]);
    let module = fixture.path("modules-src/com/acme/main");
    fs::create_dir_all(&module).unwrap();
    fs::write(
      module.join("module.xml"),
      r#"<module xmlns="urn:jboss:module:1.3" name="com.acme"><resources><artifact name="com.acme:extra:1.0"/></resources></module>"#,
    )
    .unwrap();
    fs::write(module.join("notes.txt"), "notes").unwrap();

    let config = declared_config(&fixture).with_module_dir(fixture.path("modules-src"));
    let resolver = fixture.resolver();
    let output = BuildTool::new(&config, &resolver, &ClassFileScanner)
      .build("shop", &fixture.path("target"))
      .unwrap();

    let names = entries(&output.path);
    assert!(names.contains(&"modules/com/acme/main/module.xml".to_string()));
    assert!(names.contains(&"modules/com/acme/main/notes.txt".to_string()));
    assert!(names.contains(&"m2repo/com/acme/extra/1.0/extra-1.0.jar".to_string()));
    assert_eq!(
      read_text(&output.path, APPLICATION_CONF_PATH),
      "module:com.acme\npath:_bootstrap/shop.war\n"
    );
  }
}

mod runtime {
  use super::*;

  #[test]
  fn source_metadata_is_never_merged() {
    let fixture = Fixture::new();
    let config = declared_config(&fixture);
    let resolver = fixture.resolver();
    let output = BuildTool::new(&config, &resolver, &ClassFileScanner)
      .build("shop", &fixture.path("target"))
      .unwrap();

    let names = entries(&output.path);
    assert!(!names.iter().any(|n| n.starts_with("META-INF/maven/")));
    let mf = read_text(&output.path, JAR_MANIFEST_PATH);
    assert!(mf.contains("Main-Class: org.wildfly.swarm.bootstrap.Main"));
    assert!(!mf.contains("wrong"));
  }

  #[test]
  fn module_loader_is_merged_when_not_shaded() {
    let fixture = Fixture::new();
    let config = declared_config(&fixture);
    let resolver = fixture.resolver();
    let assembled = BuildTool::new(&config, &resolver, &ClassFileScanner).assemble().unwrap();

    assert!(assembled.archive.contains("org/jboss/modules/ModuleLoader.class"));
    assert!(assembled.archive.contains("org/wildfly/swarm/bootstrap/Main.class"));
    assert_eq!(
      assembled.manifest.bootstrap_artifacts(),
      &[
        "org.jboss.modules:jboss-modules:jar:1.5".to_string(),
        "org.wildfly.swarm:bootstrap:jar:1.0".to_string(),
      ]
    );
  }

  #[test]
  fn shaded_bootstrap_skips_module_loader() {
    let fixture = Fixture::new();
    fixture.install(
      "org.wildfly.swarm:bootstrap:2.0",
      &[
        ("org/wildfly/swarm/bootstrap/Main.class", class_file("org/wildfly/swarm/bootstrap/Main", &[])),
        ("org/jboss/modules/ModuleLoader.class", class_file("org/jboss/modules/ModuleLoader", &[])),
      ],
      &[],
    );
    let config = BuildConfig::new()
      .with_project(fixture.project_referencing(&[]))
      .with_dependency("org.wildfly.swarm:bootstrap:2.0".parse().unwrap());
    let resolver = fixture.resolver();
    let assembled = BuildTool::new(&config, &resolver, &ClassFileScanner).assemble().unwrap();

    assert_eq!(
      assembled.manifest.bootstrap_artifacts(),
      &["org.wildfly.swarm:bootstrap:jar:2.0".to_string()]
    );
  }

  #[test]
  fn missing_module_loader_fails() {
    let fixture = Fixture::empty();
    fixture.install(
      BOOTSTRAP,
      &[("org/wildfly/swarm/bootstrap/Main.class", class_file("org/wildfly/swarm/bootstrap/Main", &[]))],
      &[],
    );
    let config = BuildConfig::new()
      .with_project(fixture.project_referencing(&[]))
      .with_dependency(BOOTSTRAP.parse().unwrap());
    let resolver = fixture.resolver();

    let err = BuildTool::new(&config, &resolver, &ClassFileScanner)
      .build("shop", &fixture.path("target"))
      .unwrap_err();
    assert!(matches!(err, BuildError::MissingModuleLoader));
    assert!(!fixture.path("target/shop-swarm.jar").exists());
  }
}

mod metadata {
  use super::*;

  #[test]
  fn properties_carry_declared_values_and_app_artifact() {
    let fixture = Fixture::new();
    let config = declared_config(&fixture)
      .with_property("swarm.http.port", "8181")
      .with_main_class("com.acme.Main");
    let resolver = fixture.resolver();
    let output = BuildTool::new(&config, &resolver, &ClassFileScanner)
      .build("shop", &fixture.path("target"))
      .unwrap();

    let text = read_text(&output.path, PROPERTIES_PATH);
    assert!(text.starts_with("#Generated by swarmpack\n"));
    let props = PropertiesDocument::parse(&text);
    assert_eq!(props.get("swarm.http.port"), Some("8181"));
    assert_eq!(props.get("swarm.app.artifact"), Some("shop.war"));
    assert_eq!(props.get("swarm.bundled.dependencies"), Some("true"));

    let mf = read_text(&output.path, JAR_MANIFEST_PATH);
    assert!(mf.contains("Wildfly-Swarm-Main-Class: com.acme.Main"));
  }

  #[test]
  fn unbundled_properties_omit_flag() {
    let fixture = Fixture::new();
    let config = declared_config(&fixture).with_bundle_dependencies(false);
    let resolver = fixture.resolver();
    let assembled = BuildTool::new(&config, &resolver, &ClassFileScanner).assemble().unwrap();

    assert_eq!(assembled.manifest.bundle_dependencies(), Some(false));
    let output = fixture.path("target");
    let built = BuildTool::new(&config, &resolver, &ClassFileScanner).build("shop", &output).unwrap();
    let props = PropertiesDocument::parse(&read_text(&built.path, PROPERTIES_PATH));
    assert_eq!(props.get("swarm.bundled.dependencies"), None);
  }

  #[test]
  fn descriptors_list_modules_and_dependencies() {
    let fixture = Fixture::new();
    let config = declared_config(&fixture);
    let resolver = fixture.resolver();
    let output = BuildTool::new(&config, &resolver, &ClassFileScanner)
      .build("shop", &fixture.path("target"))
      .unwrap();

    assert_eq!(read_text(&output.path, BOOTSTRAP_CONF_PATH), "org.wildfly.swarm:jaxrs\n");
    assert_eq!(
      read_text(&output.path, DEPENDENCIES_CONF_PATH),
      "extra:org.jboss.modules:jboss-modules:jar:1.5\n\
       extra:org.wildfly.swarm:bootstrap:jar:1.0\n\
       extra:org.wildfly.swarm:jaxrs:jar:1.0\n"
    );

    let manifest = BuildManifest::from_yaml_str(&read_text(&output.path, BUILD_MANIFEST_PATH)).unwrap();
    assert_eq!(manifest.asset(), Some("_bootstrap/shop.war"));
    assert_eq!(manifest.bootstrap_modules(), &["org.wildfly.swarm:jaxrs:jar:1.0".to_string()]);
    assert_eq!(manifest.main_class(), "org.wildfly.swarm.Swarm");
  }

  #[test]
  fn hollow_build_has_no_project_entry() {
    let fixture = Fixture::new();
    let config = BuildConfig::new()
      .with_fraction(JAXRS.parse().unwrap())
      .with_hollow(true);
    let resolver = fixture.resolver();
    let output = BuildTool::new(&config, &resolver, &ClassFileScanner)
      .build("hollow", &fixture.path("target"))
      .unwrap();

    let names = entries(&output.path);
    assert!(!names.iter().any(|n| n.starts_with("_bootstrap/")));
    let manifest = BuildManifest::from_yaml_str(&read_text(&output.path, BUILD_MANIFEST_PATH)).unwrap();
    assert!(manifest.is_hollow());
    assert_eq!(manifest.asset(), None);
    assert_eq!(read_text(&output.path, APPLICATION_CONF_PATH), "");
  }
}

mod export {
  use super::*;

  #[test]
  fn identical_inputs_produce_identical_archives() {
    let fixture = Fixture::new();
    let config = declared_config(&fixture);
    let resolver = fixture.resolver();
    let tool = BuildTool::new(&config, &resolver, &ClassFileScanner);

    let first = tool.build("shop", &fixture.path("one")).unwrap();
    let second = tool.build("shop", &fixture.path("two")).unwrap();
    assert_eq!(first.sha256, second.sha256);
    assert_eq!(fs::read(&first.path).unwrap(), fs::read(&second.path).unwrap());
  }

  #[test]
  fn rebuild_overwrites_existing_output() {
    let fixture = Fixture::new();
    let target = fixture.path("target");
    fs::create_dir_all(&target).unwrap();
    fs::write(target.join("shop-swarm.jar"), "stale").unwrap();

    let config = declared_config(&fixture);
    let resolver = fixture.resolver();
    let output = BuildTool::new(&config, &resolver, &ClassFileScanner).build("shop", &target).unwrap();
    assert!(entries(&output.path).contains(&"_bootstrap/shop.war".to_string()));
  }

  #[test]
  fn failed_build_leaves_no_output() {
    let fixture = Fixture::new();
    let config = BuildConfig::new()
      .with_project(fixture.project_referencing(&[]))
      .with_auto_detect(false);
    let resolver = fixture.resolver();

    let err = BuildTool::new(&config, &resolver, &ClassFileScanner)
      .build("shop", &fixture.path("target"))
      .unwrap_err();
    assert!(matches!(err, BuildError::MissingBootstrap));
    assert!(!fixture.path("target/shop-swarm.jar").exists());
  }
}
