use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::time::Duration;

use serde::Serialize;

use super::{Middleware, Next};
use crate::dispatcher::{DispatchRequest, DispatchResponse};

/// Middleware counting dispatches as they flow through the pipeline
///
/// All counters use atomic operations for thread-safe updates without locks.
///
/// Metrics collected:
/// - Requests that reached this step
/// - Requests whose handler ran (`after` was called)
/// - Requests stopped before the handler by a later step's halt or fault
/// - Handler responses with a 5xx status
/// - Average handler latency
/// - Coroutine stack size
///
/// Add it first so it observes every matched request.
#[derive(Default)]
pub struct MetricsMiddleware {
    request_count: AtomicUsize,
    completed_count: AtomicUsize,
    server_errors: AtomicUsize,
    total_latency_ns: AtomicU64,
    stack_size: AtomicUsize,
}

/// Point-in-time copy of the counters
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MetricsSnapshot {
    pub requests: usize,
    pub completed: usize,
    pub stopped_early: usize,
    pub server_errors: usize,
    pub average_latency_us: u64,
    pub stack_size: usize,
}

impl MetricsMiddleware {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the total number of requests that reached this step
    pub fn request_count(&self) -> usize {
        self.request_count.load(Ordering::Relaxed)
    }

    /// Requests whose handler ran
    pub fn completed_count(&self) -> usize {
        self.completed_count.load(Ordering::Relaxed)
    }

    /// Requests halted or faulted by a later step
    pub fn stopped_early(&self) -> usize {
        self.request_count()
            .saturating_sub(self.completed_count())
    }

    pub fn server_errors(&self) -> usize {
        self.server_errors.load(Ordering::Relaxed)
    }

    /// Calculate the average handler latency
    ///
    /// Returns zero duration if no handler has completed yet.
    pub fn average_latency(&self) -> Duration {
        let count = self.completed_count() as u64;
        if count == 0 {
            Duration::from_nanos(0)
        } else {
            Duration::from_nanos(self.total_latency_ns.load(Ordering::Relaxed) / count)
        }
    }

    /// Coroutine stack size seen by the last completed request
    pub fn stack_size(&self) -> usize {
        self.stack_size.load(Ordering::Relaxed)
    }

    #[must_use]
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            requests: self.request_count(),
            completed: self.completed_count(),
            stopped_early: self.stopped_early(),
            server_errors: self.server_errors(),
            average_latency_us: self.average_latency().as_micros() as u64,
            stack_size: self.stack_size(),
        }
    }
}

impl Middleware for MetricsMiddleware {
    fn name(&self) -> &str {
        "metrics"
    }

    fn before(&self, req: DispatchRequest) -> anyhow::Result<Next> {
        self.request_count.fetch_add(1, Ordering::Relaxed);
        Ok(Next::Continue(req))
    }

    /// Record latency and stack metrics after the handler ran
    ///
    /// - If in coroutine context: records the stack size of the current coroutine
    /// - If not in coroutine: records the global stack size from May config
    fn after(&self, _req: &DispatchRequest, res: &mut DispatchResponse, latency: Duration) {
        self.completed_count.fetch_add(1, Ordering::Relaxed);
        if res.status >= 500 {
            self.server_errors.fetch_add(1, Ordering::Relaxed);
        }
        self.total_latency_ns
            .fetch_add(latency.as_nanos() as u64, Ordering::Relaxed);
        let size = if may::coroutine::is_coroutine() {
            may::coroutine::current().stack_size()
        } else {
            may::config().get_stack_size()
        };
        self.stack_size.store(size, Ordering::Relaxed);
    }
}
