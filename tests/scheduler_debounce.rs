// tests/scheduler_debounce.rs

use std::time::Duration;

use rebuildd::engine::{Scheduler, SchedulerPhase};
use rebuildd::types::{BuildOutcome, TriggerEvent, TriggerSource};
use rebuildd_test_utils::fake_runner::FakeRunner;
use rebuildd_test_utils::{init_tracing, walkthrough_settings};
use tokio::time::{Instant, sleep, sleep_until};

fn secs(n: u64) -> Duration {
    Duration::from_secs(n)
}

async fn trigger_at(scheduler: &Scheduler<FakeRunner>, at: Instant, source: TriggerSource) {
    sleep_until(at).await;
    scheduler.handle_trigger(TriggerEvent::now(source)).await;
}

#[tokio::test(start_paused = true)]
async fn first_trigger_after_start_builds_immediately() {
    init_tracing();

    let runner = FakeRunner::new();
    let scheduler = Scheduler::new(walkthrough_settings(), runner.clone());
    let t0 = Instant::now();

    scheduler
        .handle_trigger(TriggerEvent::now(TriggerSource::Local))
        .await;

    assert_eq!(runner.starts(), vec![t0]);
    let snap = scheduler.snapshot().await;
    assert_eq!(snap.last_success, Some(t0));
    assert_eq!(snap.phase, SchedulerPhase::Idle);
    assert_eq!(snap.next_run, None);
}

#[tokio::test(start_paused = true)]
async fn burst_inside_window_collapses_into_one_run_at_anchor() {
    init_tracing();

    let runner = FakeRunner::new();
    let scheduler = Scheduler::new(walkthrough_settings(), runner.clone());
    let t0 = Instant::now();

    trigger_at(&scheduler, t0, TriggerSource::Local).await;
    trigger_at(&scheduler, t0 + secs(10), TriggerSource::Network).await;

    let snap = scheduler.snapshot().await;
    assert_eq!(snap.phase, SchedulerPhase::Scheduled);
    assert_eq!(snap.next_run, Some(t0 + secs(180)));

    for offset in [50, 51, 120, 179] {
        trigger_at(&scheduler, t0 + secs(offset), TriggerSource::Local).await;
        assert_eq!(scheduler.snapshot().await.next_run, Some(t0 + secs(180)));
    }
    assert_eq!(runner.count(), 1);

    sleep_until(t0 + secs(500)).await;

    assert_eq!(runner.starts(), vec![t0, t0 + secs(180)]);
    let snap = scheduler.snapshot().await;
    assert_eq!(snap.last_success, Some(t0 + secs(180)));
    assert_eq!(snap.phase, SchedulerPhase::Idle);
}

#[tokio::test(start_paused = true)]
async fn trigger_after_window_builds_immediately() {
    init_tracing();

    let runner = FakeRunner::new();
    let scheduler = Scheduler::new(walkthrough_settings(), runner.clone());
    let t0 = Instant::now();

    trigger_at(&scheduler, t0, TriggerSource::Local).await;
    trigger_at(&scheduler, t0 + secs(181), TriggerSource::Local).await;

    assert_eq!(runner.starts(), vec![t0, t0 + secs(181)]);
    assert_eq!(scheduler.snapshot().await.next_run, None);
}

#[tokio::test(start_paused = true)]
async fn immediate_build_cancels_pending_run() {
    init_tracing();

    // No success yet: the first build fails and arms a retry at t=180, but
    // a trigger at t=10 still builds immediately and replaces that retry.
    let runner = FakeRunner::new().script([BuildOutcome::Failed(2), BuildOutcome::Success]);
    let scheduler = Scheduler::new(walkthrough_settings(), runner.clone());
    let t0 = Instant::now();

    trigger_at(&scheduler, t0, TriggerSource::Local).await;
    assert_eq!(scheduler.snapshot().await.next_run, Some(t0 + secs(180)));

    trigger_at(&scheduler, t0 + secs(10), TriggerSource::Network).await;
    assert_eq!(scheduler.snapshot().await.next_run, None);

    sleep(secs(1000)).await;

    assert_eq!(runner.starts(), vec![t0, t0 + secs(10)]);
    let snap = scheduler.snapshot().await;
    assert_eq!(snap.retry_count, 0);
    assert_eq!(snap.last_success, Some(t0 + secs(10)));
}

#[tokio::test(start_paused = true)]
async fn concurrent_triggers_while_idle_build_once_then_coalesce() {
    init_tracing();

    let runner = FakeRunner::with_delay(secs(30));
    let scheduler = Scheduler::new(walkthrough_settings(), runner.clone());
    let t0 = Instant::now();

    let handles: Vec<_> = (0..10)
        .map(|i| {
            let scheduler = scheduler.clone();
            let source = if i % 2 == 0 {
                TriggerSource::Local
            } else {
                TriggerSource::Network
            };
            tokio::spawn(async move {
                scheduler.handle_trigger(TriggerEvent::now(source)).await;
            })
        })
        .collect();
    for h in handles {
        h.await.expect("trigger task panicked");
    }

    // One build ran t=0..30; everything queued behind it folded into a
    // single deferred run anchored at the completion time.
    assert_eq!(runner.starts(), vec![t0]);
    let snap = scheduler.snapshot().await;
    assert_eq!(snap.last_success, Some(t0 + secs(30)));
    assert_eq!(snap.next_run, Some(t0 + secs(210)));

    sleep_until(t0 + secs(400)).await;

    assert_eq!(runner.starts(), vec![t0, t0 + secs(210)]);
    assert_eq!(runner.peak_in_flight(), 1);
    assert_eq!(scheduler.snapshot().await.phase, SchedulerPhase::Idle);
}

#[tokio::test(start_paused = true)]
async fn trigger_during_deferred_build_is_not_lost() {
    init_tracing();

    let runner = FakeRunner::with_delay(secs(20));
    let scheduler = Scheduler::new(walkthrough_settings(), runner.clone());
    let t0 = Instant::now();

    // Build 1: t=0..20.
    trigger_at(&scheduler, t0, TriggerSource::Local).await;
    // Scheduled for 20 + 180 = 200.
    trigger_at(&scheduler, t0 + secs(30), TriggerSource::Local).await;
    assert_eq!(scheduler.snapshot().await.next_run, Some(t0 + secs(200)));

    // Arrives while build 2 (t=200..220) holds the lock.
    let late = {
        let scheduler = scheduler.clone();
        tokio::spawn(async move {
            trigger_at(&scheduler, t0 + secs(205), TriggerSource::Network).await;
        })
    };
    late.await.expect("trigger task panicked");

    let snap = scheduler.snapshot().await;
    assert_eq!(snap.last_success, Some(t0 + secs(220)));
    assert_eq!(snap.next_run, Some(t0 + secs(400)));

    sleep_until(t0 + secs(600)).await;
    assert_eq!(runner.starts(), vec![t0, t0 + secs(200), t0 + secs(400)]);
}
