use std::collections::VecDeque;
use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use rebuildd::exec::BuildRunner;
use rebuildd::types::BuildOutcome;
use tokio::time::Instant;

/// A fake build runner that:
/// - records the instant each build started
/// - returns scripted outcomes in order (then `Success` once the script runs out)
/// - optionally takes `delay` of (virtual) time per build
/// - tracks the peak number of builds in flight at once
#[derive(Clone, Default)]
pub struct FakeRunner {
    inner: Arc<Inner>,
}

#[derive(Default)]
struct Inner {
    script: Mutex<VecDeque<BuildOutcome>>,
    started: Mutex<Vec<Instant>>,
    delay: Duration,
    in_flight: AtomicUsize,
    peak_in_flight: AtomicUsize,
}

impl FakeRunner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_delay(delay: Duration) -> Self {
        Self {
            inner: Arc::new(Inner {
                delay,
                ..Inner::default()
            }),
        }
    }

    /// Queue outcomes for the next builds.
    pub fn script(self, outcomes: impl IntoIterator<Item = BuildOutcome>) -> Self {
        self.inner.script.lock().unwrap().extend(outcomes);
        self
    }

    pub fn starts(&self) -> Vec<Instant> {
        self.inner.started.lock().unwrap().clone()
    }

    pub fn count(&self) -> usize {
        self.inner.started.lock().unwrap().len()
    }

    pub fn peak_in_flight(&self) -> usize {
        self.inner.peak_in_flight.load(Ordering::SeqCst)
    }
}

impl BuildRunner for FakeRunner {
    fn execute(&self) -> Pin<Box<dyn Future<Output = BuildOutcome> + Send + '_>> {
        let inner = Arc::clone(&self.inner);

        Box::pin(async move {
            inner.started.lock().unwrap().push(Instant::now());
            let now_running = inner.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            inner.peak_in_flight.fetch_max(now_running, Ordering::SeqCst);

            if !inner.delay.is_zero() {
                tokio::time::sleep(inner.delay).await;
            }

            inner.in_flight.fetch_sub(1, Ordering::SeqCst);
            let next = inner.script.lock().unwrap().pop_front();
            next.unwrap_or(BuildOutcome::Success)
        })
    }
}
