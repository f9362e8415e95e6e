//! Per-connection request activity, used to close idle keep-alive connections.

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Shared between a connection's service (which marks requests busy) and
/// the connection task (which checks for idleness).
#[derive(Debug, Clone)]
pub struct Activity {
    inner: Arc<ActivityInner>,
}

#[derive(Debug)]
struct ActivityInner {
    started: Instant,
    in_flight: AtomicUsize,
    /// Milliseconds since `started` at which the last request finished.
    last_active_ms: AtomicU64,
}

impl Activity {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(ActivityInner {
                started: Instant::now(),
                in_flight: AtomicUsize::new(0),
                last_active_ms: AtomicU64::new(0),
            }),
        }
    }

    /// Mark a request in flight until the returned guard drops.
    pub fn begin(&self) -> Busy {
        self.inner.in_flight.fetch_add(1, Ordering::SeqCst);
        Busy {
            inner: Arc::clone(&self.inner),
        }
    }

    /// How long the connection has had no request in flight.
    pub fn idle_for(&self) -> Duration {
        if self.inner.in_flight.load(Ordering::SeqCst) > 0 {
            return Duration::ZERO;
        }
        let last = Duration::from_millis(self.inner.last_active_ms.load(Ordering::SeqCst));
        self.inner.started.elapsed().saturating_sub(last)
    }
}

impl Default for Activity {
    fn default() -> Self {
        Self::new()
    }
}

/// Guard for one in-flight request.
#[derive(Debug)]
pub struct Busy {
    inner: Arc<ActivityInner>,
}

impl Drop for Busy {
    fn drop(&mut self) {
        let now = self.inner.started.elapsed().as_millis() as u64;
        self.inner.last_active_ms.store(now, Ordering::SeqCst);
        self.inner.in_flight.fetch_sub(1, Ordering::SeqCst);
    }
}
