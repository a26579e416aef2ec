// tests/listener_signals.rs

use std::error::Error;
use std::os::unix::fs::PermissionsExt;
use std::time::Duration;

use rebuildd::engine::{Scheduler, SchedulerPhase};
use rebuildd::errors::RebuildError;
use rebuildd::signal::{Endpoint, TriggerListener, send_trigger, spawn_accept_loop};
use rebuildd::types::TriggerSource;
use rebuildd_test_utils::fake_runner::FakeRunner;
use rebuildd_test_utils::{init_tracing, walkthrough_settings, with_timeout};
use tokio::time::sleep;

type TestResult = Result<(), Box<dyn Error>>;

const SEND_TIMEOUT: Duration = Duration::from_secs(1);

async fn wait_for_builds(runner: &FakeRunner, n: usize) {
    with_timeout(async {
        while runner.count() < n {
            sleep(Duration::from_millis(10)).await;
        }
    })
    .await;
}

#[tokio::test]
async fn unix_connection_is_a_trigger() -> TestResult {
    init_tracing();

    let dir = tempfile::tempdir()?;
    let endpoint = Endpoint::Unix(dir.path().join("rebuildd.sock"));

    let listener = TriggerListener::bind(&endpoint).await?;
    assert_eq!(listener.source(), TriggerSource::Local);

    let runner = FakeRunner::new();
    let scheduler = Scheduler::new(walkthrough_settings(), runner.clone());
    let _loop = spawn_accept_loop(listener, scheduler);

    send_trigger(&endpoint, SEND_TIMEOUT).await?;
    wait_for_builds(&runner, 1).await;
    Ok(())
}

#[tokio::test]
async fn tcp_connection_is_a_trigger() -> TestResult {
    init_tracing();

    let listener = TriggerListener::bind(&Endpoint::Tcp("127.0.0.1:0".into())).await?;
    assert_eq!(listener.source(), TriggerSource::Network);
    let endpoint = listener.local_endpoint()?;

    let runner = FakeRunner::new();
    let scheduler = Scheduler::new(walkthrough_settings(), runner.clone());
    let _loop = spawn_accept_loop(listener, scheduler);

    send_trigger(&endpoint, SEND_TIMEOUT).await?;
    wait_for_builds(&runner, 1).await;
    Ok(())
}

#[tokio::test]
async fn rapid_connections_coalesce_into_one_pending_run() -> TestResult {
    init_tracing();

    let listener = TriggerListener::bind(&Endpoint::Tcp("127.0.0.1:0".into())).await?;
    let endpoint = listener.local_endpoint()?;

    let runner = FakeRunner::new();
    let scheduler = Scheduler::new(walkthrough_settings(), runner.clone());
    let _loop = spawn_accept_loop(listener, scheduler.clone());

    for _ in 0..5 {
        send_trigger(&endpoint, SEND_TIMEOUT).await?;
    }
    wait_for_builds(&runner, 1).await;

    // Let the remaining triggers reach the scheduler.
    with_timeout(async {
        while scheduler.snapshot().await.phase != SchedulerPhase::Scheduled {
            sleep(Duration::from_millis(10)).await;
        }
    })
    .await;
    sleep(Duration::from_millis(100)).await;

    assert_eq!(runner.count(), 1);
    Ok(())
}

#[tokio::test]
async fn stale_socket_file_is_replaced_and_world_connectable() -> TestResult {
    init_tracing();

    let dir = tempfile::tempdir()?;
    let path = dir.path().join("stale.sock");
    std::fs::write(&path, b"left over")?;

    let _listener = TriggerListener::bind(&Endpoint::Unix(path.clone())).await?;

    let mode = std::fs::metadata(&path)?.permissions().mode() & 0o777;
    assert_eq!(mode, 0o666);
    Ok(())
}

#[tokio::test]
async fn address_in_use_is_a_bind_error() -> TestResult {
    init_tracing();

    let first = TriggerListener::bind(&Endpoint::Tcp("127.0.0.1:0".into())).await?;
    let taken = first.local_endpoint()?;

    match TriggerListener::bind(&taken).await {
        Err(RebuildError::BindFailed { endpoint, .. }) => {
            assert_eq!(endpoint, taken.to_string());
        }
        other => panic!("expected BindFailed, got {other:?}"),
    }
    Ok(())
}

#[tokio::test]
async fn sending_to_missing_socket_fails() -> TestResult {
    let dir = tempfile::tempdir()?;
    let endpoint = Endpoint::Unix(dir.path().join("nobody-home.sock"));

    assert!(send_trigger(&endpoint, SEND_TIMEOUT).await.is_err());
    Ok(())
}
