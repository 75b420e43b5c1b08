//! Memory-adaptive admission
//!
//! Before a fetch is admitted the dispatcher asks the [`MemoryGate`] for
//! headroom. While system memory usage is above the threshold the gate polls
//! at a fixed interval; after the maximum wait it lets the fetch through.

use std::sync::{Arc, Mutex};
use std::time::Duration;
use sysinfo::System;
use tokio::time::Instant;

/// Source of the current memory usage
pub trait MemoryProbe: Send + Sync {
    /// Used memory as a percentage of total memory
    fn usage_percent(&self) -> f64;
}

/// Reads system memory through `sysinfo`
pub struct SystemMemory {
    system: Mutex<System>,
}

impl SystemMemory {
    pub fn new() -> Self {
        Self {
            system: Mutex::new(System::new()),
        }
    }
}

impl Default for SystemMemory {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryProbe for SystemMemory {
    fn usage_percent(&self) -> f64 {
        let mut system = self.system.lock().unwrap_or_else(|e| e.into_inner());
        system.refresh_memory();

        let total = system.total_memory();
        if total == 0 {
            return 0.0;
        }
        system.used_memory() as f64 / total as f64 * 100.0
    }
}

/// Pauses admission while memory usage is above a threshold
pub struct MemoryGate {
    probe: Arc<dyn MemoryProbe>,
    threshold_percent: f64,
    check_interval: Duration,
    max_wait: Duration,
}

impl MemoryGate {
    pub fn new(
        probe: Arc<dyn MemoryProbe>,
        threshold_percent: f64,
        check_interval: Duration,
        max_wait: Duration,
    ) -> Self {
        Self {
            probe,
            threshold_percent,
            check_interval,
            max_wait,
        }
    }

    /// Waits until memory usage is at or below the threshold
    ///
    /// # Returns
    ///
    /// * `true` - Usage dropped below the threshold
    /// * `false` - The maximum wait elapsed first; the caller proceeds anyway
    pub async fn wait_for_headroom(&self) -> bool {
        let started = Instant::now();
        let mut paused = false;

        loop {
            let usage = self.probe.usage_percent();
            if usage <= self.threshold_percent {
                if paused {
                    tracing::info!(
                        "Memory usage {:.1}% back under {:.1}%, resuming admission",
                        usage,
                        self.threshold_percent
                    );
                }
                return true;
            }

            if started.elapsed() >= self.max_wait {
                tracing::warn!(
                    "Memory usage still {:.1}% after {:?}, admitting fetch anyway",
                    usage,
                    self.max_wait
                );
                return false;
            }

            if !paused {
                tracing::info!(
                    "Memory usage {:.1}% above {:.1}%, pausing admission",
                    usage,
                    self.threshold_percent
                );
                paused = true;
            }

            tokio::time::sleep(self.check_interval).await;
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Probe replaying a fixed sequence of readings; the last one repeats
    pub(crate) struct ScriptedMemory {
        readings: Vec<f64>,
        calls: AtomicUsize,
    }

    impl ScriptedMemory {
        pub(crate) fn new(readings: Vec<f64>) -> Self {
            Self {
                readings,
                calls: AtomicUsize::new(0),
            }
        }

        pub(crate) fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    impl MemoryProbe for ScriptedMemory {
        fn usage_percent(&self) -> f64 {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            let index = call.min(self.readings.len().saturating_sub(1));
            self.readings.get(index).copied().unwrap_or(0.0)
        }
    }

    fn gate(probe: Arc<ScriptedMemory>, max_wait_ms: u64) -> MemoryGate {
        MemoryGate::new(
            probe,
            80.0,
            Duration::from_millis(5),
            Duration::from_millis(max_wait_ms),
        )
    }

    #[tokio::test]
    async fn test_admits_immediately_under_threshold() {
        let probe = Arc::new(ScriptedMemory::new(vec![42.0]));
        assert!(gate(probe.clone(), 1000).wait_for_headroom().await);
        assert_eq!(probe.calls(), 1);
    }

    #[tokio::test]
    async fn test_pauses_until_usage_drops() {
        let probe = Arc::new(ScriptedMemory::new(vec![95.0, 91.0, 85.0, 60.0]));
        assert!(gate(probe.clone(), 10_000).wait_for_headroom().await);
        assert_eq!(probe.calls(), 4);
    }

    #[tokio::test]
    async fn test_gives_up_after_max_wait() {
        let probe = Arc::new(ScriptedMemory::new(vec![99.0]));
        let started = std::time::Instant::now();

        assert!(!gate(probe.clone(), 30).wait_for_headroom().await);
        assert!(started.elapsed() >= Duration::from_millis(30));
        assert!(probe.calls() > 1);
    }

    #[test]
    fn test_system_memory_reading_is_a_percentage() {
        let usage = SystemMemory::new().usage_percent();
        assert!((0.0..=100.0).contains(&usage));
    }
}
