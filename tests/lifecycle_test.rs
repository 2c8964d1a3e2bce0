//! End-to-end lifecycle scenarios over the documented example graph.
//!
//! Each test loads its own manager from a scratch dependency file, runs the
//! dispatcher in the background, pushes commands, waits for the graph to
//! settle, and asserts states through the in-process API.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tempfile::TempDir;
use tokio::task::JoinHandle;

use servisor::{
    CommandQueue, Config, ControlError, Event, EventKind, Manager, ServiceState, Subscribe,
};

const EXAMPLE: &str = "d b c\nb a\nc a\ne\n";
const ALL: [&str; 5] = ["a", "b", "c", "d", "e"];

async fn start(
    contents: &str,
) -> (
    Arc<Manager>,
    CommandQueue,
    JoinHandle<Result<(), ControlError>>,
    TempDir,
) {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("services.txt");
    std::fs::write(&path, contents).expect("write dependency file");

    let manager = Arc::new(Manager::load(&path, Config::default(), Vec::new()).expect("load"));
    let queue = manager.queue();
    let dispatcher = tokio::spawn({
        let manager = Arc::clone(&manager);
        async move { manager.run().await }
    });
    (manager, queue, dispatcher, dir)
}

/// Default settle time after a command burst.
async fn quiesce() {
    tokio::time::sleep(Duration::from_secs(2)).await;
}

fn state_of(manager: &Manager, id: &str) -> ServiceState {
    manager.get(id).expect("known service").state()
}

fn assert_states(manager: &Manager, ids: &[&str], expected: ServiceState) {
    for id in ids {
        assert_eq!(state_of(manager, id), expected, "service {id}");
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn resume_all_then_stop_all() {
    let (manager, queue, _dispatcher, _dir) = start(EXAMPLE).await;

    queue.push("RESUME-ALL").await.unwrap();
    quiesce().await;
    assert_states(&manager, &ALL, ServiceState::Running);

    queue.push("STOP-ALL").await.unwrap();
    quiesce().await;
    assert_states(&manager, &ALL, ServiceState::WaitingRun);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn selective_resume_pulls_in_dependencies_only() {
    let (manager, queue, _dispatcher, _dir) = start(EXAMPLE).await;

    queue.push("RESUME-SERVICE b").await.unwrap();
    quiesce().await;
    assert_states(&manager, &["a", "b"], ServiceState::Running);
    assert_states(&manager, &["c", "d", "e"], ServiceState::WaitingRun);

    queue.push("RESUME-SERVICE d").await.unwrap();
    quiesce().await;
    assert_states(&manager, &["a", "b", "c", "d"], ServiceState::Running);
    assert_states(&manager, &["e"], ServiceState::WaitingRun);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn stopping_a_sink_cascades_to_every_dependent() {
    let (manager, queue, _dispatcher, _dir) = start(EXAMPLE).await;

    queue.push("RESUME-SERVICE b").await.unwrap();
    queue.push("RESUME-SERVICE d").await.unwrap();
    quiesce().await;
    assert_states(&manager, &["a", "b", "c", "d"], ServiceState::Running);

    queue.push("STOP-SERVICE a").await.unwrap();
    quiesce().await;
    assert_states(&manager, &ALL, ServiceState::WaitingRun);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn senseless_command_sequences_settle_without_deadlock() {
    let (manager, queue, _dispatcher, _dir) = start(EXAMPLE).await;

    queue.push("STOP-ALL").await.unwrap();
    queue.push("RESUME-ALL").await.unwrap();
    queue.push("RESUME-ALL").await.unwrap();
    quiesce().await;
    assert_states(&manager, &ALL, ServiceState::Running);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn stop_right_after_resume_leaves_a_consistent_graph() {
    let (manager, queue, _dispatcher, _dir) = start(EXAMPLE).await;

    queue.push("RESUME-SERVICE d").await.unwrap();
    queue.push("STOP-SERVICE d").await.unwrap();
    quiesce().await;

    // Whichever side of the race won, no service may be stuck between
    // states, and a running service implies running dependencies.
    assert_eq!(state_of(&manager, "e"), ServiceState::WaitingRun);
    for id in ALL {
        let state = state_of(&manager, id);
        assert!(
            state == ServiceState::Running || state == ServiceState::WaitingRun,
            "service {id} settled in {state:?}"
        );
    }
    if state_of(&manager, "d") == ServiceState::Running {
        assert_states(&manager, &["a", "b", "c"], ServiceState::Running);
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn misbehaving_dependent_forces_the_drain_timeout() {
    let (manager, queue, _dispatcher, _dir) = start(EXAMPLE).await;

    let a = manager.get("a").expect("a");
    let b = manager.get("b").expect("b");
    b.set_bad(true);
    a.set_stop_timeout_ms(1).unwrap();

    queue.push("RESUME-SERVICE b").await.unwrap();
    quiesce().await;
    assert_states(&manager, &["a", "b"], ServiceState::Running);

    queue.push("STOP-SERVICE a").await.unwrap();
    quiesce().await;

    // a gave up waiting for b and wound down; b is stuck winding down
    // because its payload ignores the stop signal.
    assert_eq!(a.state(), ServiceState::WaitingRun);
    assert_eq!(b.state(), ServiceState::WaitingStop);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn exit_terminates_every_service_and_the_dispatcher() {
    let (manager, queue, dispatcher, _dir) = start(EXAMPLE).await;

    queue.push("RESUME-ALL").await.unwrap();
    quiesce().await;
    assert_states(&manager, &ALL, ServiceState::Running);

    queue.push("EXIT").await.unwrap();
    let result = tokio::time::timeout(Duration::from_secs(30), dispatcher)
        .await
        .expect("dispatcher must terminate")
        .expect("dispatcher must not panic");
    assert!(result.is_ok());

    assert_states(&manager, &ALL, ServiceState::Terminated);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn exit_without_ever_resuming_terminates_parked_services() {
    let (manager, queue, dispatcher, _dir) = start(EXAMPLE).await;

    queue.push("EXIT").await.unwrap();
    let result = tokio::time::timeout(Duration::from_secs(30), dispatcher)
        .await
        .expect("dispatcher must terminate")
        .expect("dispatcher must not panic");
    assert!(result.is_ok());

    assert_states(&manager, &ALL, ServiceState::Terminated);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn stop_before_start_is_harmless() {
    let (manager, queue, _dispatcher, _dir) = start(EXAMPLE).await;

    queue.push("STOP-SERVICE d").await.unwrap();
    quiesce().await;
    assert_states(&manager, &ALL, ServiceState::WaitingRun);

    queue.push("RESUME-SERVICE d").await.unwrap();
    quiesce().await;
    assert_states(&manager, &["a", "b", "c", "d"], ServiceState::Running);
    assert_states(&manager, &["e"], ServiceState::WaitingRun);
}

/// Records every event kind it observes.
struct Recorder {
    seen: Arc<Mutex<Vec<EventKind>>>,
}

#[async_trait]
impl Subscribe for Recorder {
    async fn on_event(&self, event: &Event) {
        self.seen.lock().unwrap().push(event.kind);
    }

    fn name(&self) -> &'static str {
        "recorder"
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn subscribers_are_drained_before_the_dispatcher_returns() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("services.txt");
    std::fs::write(&path, EXAMPLE).expect("write dependency file");

    let seen = Arc::new(Mutex::new(Vec::new()));
    let recorder = Arc::new(Recorder {
        seen: Arc::clone(&seen),
    });
    let manager =
        Arc::new(Manager::load(&path, Config::default(), vec![recorder as _]).expect("load"));
    let queue = manager.queue();
    let dispatcher = tokio::spawn({
        let manager = Arc::clone(&manager);
        async move { manager.run().await }
    });

    queue.push("RESUME-ALL").await.unwrap();
    quiesce().await;
    queue.push("EXIT").await.unwrap();
    tokio::time::timeout(Duration::from_secs(30), dispatcher)
        .await
        .expect("dispatcher must terminate")
        .expect("dispatcher must not panic")
        .unwrap();

    // Once run() returned, the full event history has been delivered.
    let kinds = seen.lock().unwrap();
    assert_eq!(kinds.first(), Some(&EventKind::ManagerStarted));
    assert_eq!(kinds.last(), Some(&EventKind::ManagerTerminated));
    assert!(kinds.contains(&EventKind::ServiceRunning));
    assert!(kinds.contains(&EventKind::ServiceTerminated));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn unknown_ids_and_garbage_lines_are_survivable() {
    let (manager, queue, _dispatcher, _dir) = start(EXAMPLE).await;

    queue.push("RESUME-SERVICE nope").await.unwrap();
    queue.push("STOP-SERVICE nope").await.unwrap();
    queue.push("DANCE").await.unwrap();
    queue.push("").await.unwrap();
    queue.push("RESUME-SERVICE b").await.unwrap();
    quiesce().await;

    // The dispatcher survived the garbage and still served the last command.
    assert_states(&manager, &["a", "b"], ServiceState::Running);
}
