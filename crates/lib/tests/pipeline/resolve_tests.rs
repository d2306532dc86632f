//! Resolution against an on-disk repository.

use swarmpack_lib::artifact::ArtifactSpec;
use swarmpack_lib::deps::{DependencyManager, ResolveError};

use super::common::*;

fn chain(fixture: &Fixture) {
  fixture.install("org.example:x:1.0", &[("x.txt", b"x".to_vec())], &["org.example:y:1.0"]);
  fixture.install("org.example:y:1.0", &[("y.txt", b"y".to_vec())], &["org.example:z:1.0"]);
  fixture.install("org.example:z:1.0", &[("z.txt", b"z".to_vec())], &[]);
}

#[test]
fn transitive_chain_resolves_from_disk() {
  let fixture = Fixture::empty();
  chain(&fixture);
  let resolver = fixture.resolver();

  let mut deps = DependencyManager::new(&resolver);
  deps.add_dependency("org.example:x:1.0".parse().unwrap());
  deps.analyze_dependencies(true).unwrap();

  let ids: Vec<&str> = deps.resolved().map(ArtifactSpec::artifact_id).collect();
  assert_eq!(ids, vec!["x", "y", "z"]);
  for spec in deps.resolved() {
    assert!(spec.file().unwrap().is_file());
  }
}

#[test]
fn non_transitive_stops_at_roots() {
  let fixture = Fixture::empty();
  chain(&fixture);
  let resolver = fixture.resolver();

  let mut deps = DependencyManager::new(&resolver);
  deps.add_dependency("org.example:x:1.0".parse().unwrap());
  deps.analyze_dependencies(false).unwrap();
  assert_eq!(deps.len(), 1);
}

#[test]
fn broken_chain_names_the_parent() {
  let fixture = Fixture::empty();
  fixture.install("org.example:x:1.0", &[("x.txt", b"x".to_vec())], &["org.example:gone:1.0"]);
  let resolver = fixture.resolver();

  let mut deps = DependencyManager::new(&resolver);
  deps.add_dependency("org.example:x:1.0".parse().unwrap());
  let err = deps.analyze_dependencies(true).unwrap_err();
  match err {
    ResolveError::NotFound { coordinate, required_by } => {
      assert_eq!(coordinate, "org.example:gone:jar:1.0");
      assert_eq!(required_by.as_deref(), Some("org.example:x:jar:1.0"));
    }
    other => panic!("unexpected error: {}", other),
  }
}
