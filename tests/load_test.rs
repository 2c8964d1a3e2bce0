//! Loading and validation of the dependency file.

use std::path::PathBuf;

use tempfile::TempDir;

use servisor::{Config, LoadError, Manager, ServiceState};

const EXAMPLE: &str = "d b c\nb a\nc a\ne\n";

fn write_services(dir: &TempDir, contents: &str) -> PathBuf {
    let path = dir.path().join("services.txt");
    std::fs::write(&path, contents).expect("write dependency file");
    path
}

fn load(contents: &str) -> (Manager, TempDir) {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = write_services(&dir, contents);
    let manager = Manager::load(&path, Config::default(), Vec::new()).expect("load");
    (manager, dir)
}

fn sorted(mut ids: Vec<String>) -> Vec<String> {
    ids.sort();
    ids
}

#[tokio::test]
async fn example_graph_has_the_documented_shape() {
    let (manager, _dir) = load(EXAMPLE);
    assert_eq!(manager.registry().len(), 5);

    let a = manager.get("a").expect("a");
    let d = manager.get("d").expect("d");
    let e = manager.get("e").expect("e");

    assert!(a.dependency_ids().is_empty());
    assert_eq!(sorted(a.dependent_ids()), vec!["b", "c"]);
    assert_eq!(sorted(d.dependency_ids()), vec!["b", "c"]);
    assert!(d.dependent_ids().is_empty());
    assert!(e.dependency_ids().is_empty());
    assert!(e.dependent_ids().is_empty());

    let sources: Vec<String> = manager
        .registry()
        .sources()
        .iter()
        .map(|s| s.id().to_string())
        .collect();
    let sinks: Vec<String> = manager
        .registry()
        .sinks()
        .iter()
        .map(|s| s.id().to_string())
        .collect();
    assert_eq!(sorted(sources), vec!["d", "e"]);
    assert_eq!(sorted(sinks), vec!["a", "e"]);
}

#[tokio::test]
async fn dependency_only_ids_become_first_class_services() {
    let (manager, _dir) = load("b a\n");
    let a = manager.get("a").expect("a created on demand");
    assert!(a.dependency_ids().is_empty());
    assert_eq!(a.dependent_ids(), vec!["b"]);
}

#[tokio::test]
async fn blank_lines_are_ignored() {
    let (manager, _dir) = load("\nb a\n\n   \ne\n\n");
    assert_eq!(manager.registry().len(), 3);
    assert!(manager.get("e").is_some());
}

#[tokio::test]
async fn services_start_out_created() {
    let (manager, _dir) = load(EXAMPLE);
    for service in manager.registry().services() {
        assert_eq!(service.state(), ServiceState::Created);
    }
}

#[tokio::test]
async fn missing_file_fails_to_load() {
    let dir = tempfile::tempdir().expect("tempdir");
    let err = Manager::load(dir.path().join("nope.txt"), Config::default(), Vec::new())
        .err()
        .expect("load must fail");
    assert!(matches!(err, LoadError::Io(_)));
}

#[tokio::test]
async fn cyclic_dependencies_fail_to_load() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = write_services(&dir, "a b\nb a\n");
    let err = Manager::load(&path, Config::default(), Vec::new())
        .err()
        .expect("cycle must be rejected");
    match err {
        LoadError::CyclicGraph { cycle } => {
            assert_eq!(cycle.first(), cycle.last());
            assert!(cycle.iter().any(|id| id == "a"));
            assert!(cycle.iter().any(|id| id == "b"));
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn self_dependency_fails_to_load() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = write_services(&dir, "a a\n");
    assert!(matches!(
        Manager::load(&path, Config::default(), Vec::new()),
        Err(LoadError::CyclicGraph { .. })
    ));
}

#[tokio::test]
async fn negative_stop_timeout_is_rejected() {
    let (manager, _dir) = load(EXAMPLE);
    let a = manager.get("a").expect("a");

    let before = a.stop_timeout();
    let err = a.set_stop_timeout_ms(-1).err().expect("must be rejected");
    assert_eq!(err.as_label(), "control_invalid_timeout");
    assert_eq!(a.stop_timeout(), before);

    a.set_stop_timeout_ms(10).expect("non-negative is fine");
    assert_eq!(a.stop_timeout(), std::time::Duration::from_millis(10));
}

#[tokio::test]
async fn loaded_services_share_the_configured_timeout() {
    let mut cfg = Config::default();
    cfg.stop_timeout = std::time::Duration::from_millis(250);

    let dir = tempfile::tempdir().expect("tempdir");
    let path = write_services(&dir, EXAMPLE);
    let manager = Manager::load(&path, cfg, Vec::new()).expect("load");

    for service in manager.registry().services() {
        assert_eq!(service.stop_timeout(), std::time::Duration::from_millis(250));
    }
}
