//! Progress tracking for bulk dispatches
//!
//! The monitor counts task transitions with atomics so fetch tasks can
//! report without locking. A reporter task logs the totals periodically.

use crate::config::{DisplayMode, MonitorConfig};
use crate::state::TaskState;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::task::JoinHandle;

/// Point-in-time copy of the monitor counters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MonitorSnapshot {
    pub queued: usize,
    pub in_flight: usize,
    pub completed: usize,
    pub failed: usize,
    pub retries: usize,
    pub peak_in_flight: usize,
}

impl MonitorSnapshot {
    /// Tasks that reached a terminal state
    pub fn finished(&self) -> usize {
        self.completed + self.failed
    }
}

/// Counts fetch tasks by state
#[derive(Debug)]
pub struct CrawlerMonitor {
    display_mode: DisplayMode,
    queued: AtomicUsize,
    in_flight: AtomicUsize,
    completed: AtomicUsize,
    failed: AtomicUsize,
    retries: AtomicUsize,
    peak_in_flight: AtomicUsize,
    started: Instant,
}

impl CrawlerMonitor {
    pub fn new(display_mode: DisplayMode) -> Self {
        Self {
            display_mode,
            queued: AtomicUsize::new(0),
            in_flight: AtomicUsize::new(0),
            completed: AtomicUsize::new(0),
            failed: AtomicUsize::new(0),
            retries: AtomicUsize::new(0),
            peak_in_flight: AtomicUsize::new(0),
            started: Instant::now(),
        }
    }

    pub fn from_config(config: &MonitorConfig) -> Self {
        Self::new(config.display_mode)
    }

    /// Records that the task for `url` entered `state`
    ///
    /// # Arguments
    ///
    /// * `url` - The URL of the task
    /// * `state` - The state entered
    pub fn transition(&self, url: &str, state: TaskState) {
        match state {
            TaskState::Queued => {
                self.queued.fetch_add(1, Ordering::SeqCst);
            }
            TaskState::Running => {
                decrement(&self.queued);
                let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
                self.peak_in_flight.fetch_max(now, Ordering::SeqCst);
            }
            TaskState::Retrying => {
                self.retries.fetch_add(1, Ordering::SeqCst);
            }
            TaskState::Completed => {
                decrement(&self.in_flight);
                self.completed.fetch_add(1, Ordering::SeqCst);
            }
            TaskState::Failed => {
                decrement(&self.in_flight);
                self.failed.fetch_add(1, Ordering::SeqCst);
            }
        }

        if self.display_mode == DisplayMode::Detailed {
            tracing::debug!("[{}] {}", state, url);
        }
    }

    pub fn snapshot(&self) -> MonitorSnapshot {
        MonitorSnapshot {
            queued: self.queued.load(Ordering::SeqCst),
            in_flight: self.in_flight.load(Ordering::SeqCst),
            completed: self.completed.load(Ordering::SeqCst),
            failed: self.failed.load(Ordering::SeqCst),
            retries: self.retries.load(Ordering::SeqCst),
            peak_in_flight: self.peak_in_flight.load(Ordering::SeqCst),
        }
    }

    /// Logs the current totals
    pub fn report(&self) {
        let snapshot = self.snapshot();
        let elapsed = self.started.elapsed().as_secs_f64();
        let rate = if elapsed > 0.0 {
            snapshot.finished() as f64 / elapsed
        } else {
            0.0
        };

        tracing::info!(
            "Progress: {} queued, {} in flight, {} completed, {} failed, {} retries, {:.2} pages/sec",
            snapshot.queued,
            snapshot.in_flight,
            snapshot.completed,
            snapshot.failed,
            snapshot.retries,
            rate
        );
    }

    /// Spawns a task logging the totals every `interval` until aborted
    pub fn spawn_reporter(monitor: Arc<Self>, interval: Duration) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            // The first tick completes immediately
            ticker.tick().await;
            loop {
                ticker.tick().await;
                monitor.report();
            }
        })
    }
}

fn decrement(counter: &AtomicUsize) {
    let _ = counter.fetch_update(Ordering::SeqCst, Ordering::SeqCst, |v| v.checked_sub(1));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transitions_update_counters() {
        let monitor = CrawlerMonitor::new(DisplayMode::Aggregated);
        for url in ["u1", "u2", "u3"] {
            monitor.transition(url, TaskState::Queued);
        }
        monitor.transition("u1", TaskState::Running);
        monitor.transition("u2", TaskState::Running);
        monitor.transition("u1", TaskState::Retrying);
        monitor.transition("u1", TaskState::Completed);
        monitor.transition("u2", TaskState::Failed);

        let snapshot = monitor.snapshot();
        assert_eq!(snapshot.queued, 1);
        assert_eq!(snapshot.in_flight, 0);
        assert_eq!(snapshot.completed, 1);
        assert_eq!(snapshot.failed, 1);
        assert_eq!(snapshot.retries, 1);
        assert_eq!(snapshot.peak_in_flight, 2);
        assert_eq!(snapshot.finished(), 2);
    }

    #[test]
    fn test_counters_never_underflow() {
        let monitor = CrawlerMonitor::new(DisplayMode::Detailed);
        monitor.transition("u1", TaskState::Completed);
        assert_eq!(monitor.snapshot().in_flight, 0);
        assert_eq!(monitor.snapshot().completed, 1);
    }

    #[tokio::test]
    async fn test_reporter_can_be_aborted() {
        let monitor = Arc::new(CrawlerMonitor::new(DisplayMode::Aggregated));
        let reporter = CrawlerMonitor::spawn_reporter(monitor, Duration::from_millis(5));
        tokio::time::sleep(Duration::from_millis(20)).await;
        reporter.abort();
        assert!(reporter.await.unwrap_err().is_cancelled());
    }
}
