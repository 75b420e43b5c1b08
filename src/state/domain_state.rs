use std::time::{Duration, Instant};

/// Tracks the request pacing of a single domain
///
/// The delay grows when the domain answers with a rate-limit status and
/// decays back towards the base range after successful responses.
#[derive(Debug, Clone)]
pub struct DomainState {
    /// Minimum time between two requests to this domain
    pub current_delay: Duration,

    /// When the last request was (or is scheduled to be) sent
    pub last_request: Option<Instant>,

    /// Consecutive rate-limit responses since the last success
    pub fail_count: u32,
}

impl DomainState {
    /// Creates a state with the given starting delay and no request history
    pub fn new(initial_delay: Duration) -> Self {
        Self {
            current_delay: initial_delay,
            last_request: None,
            fail_count: 0,
        }
    }

    /// Calculates the time until the next request may be sent
    ///
    /// Returns None if a request can be made now, or the duration to wait otherwise.
    pub fn time_until_next_request(&self, now: Instant) -> Option<Duration> {
        let ready_at = self.last_request? + self.current_delay;
        if ready_at > now {
            Some(ready_at - now)
        } else {
            None
        }
    }

    /// Records a request sent at `at`
    pub fn record_request(&mut self, at: Instant) {
        self.last_request = Some(at);
    }

    /// Grows the delay after a rate-limit response
    ///
    /// # Arguments
    ///
    /// * `jitter` - Random factor applied on top of the doubling
    /// * `max_delay` - Upper bound of the delay
    ///
    /// # Returns
    ///
    /// The new delay
    pub fn back_off(&mut self, jitter: f64, max_delay: Duration) -> Duration {
        self.fail_count += 1;
        let grown = self.current_delay.mul_f64(2.0 * jitter.max(0.0));
        self.current_delay = grown.min(max_delay);
        self.current_delay
    }

    /// Shrinks the delay after a successful response, never below `floor`
    pub fn recover(&mut self, floor: Duration) {
        self.fail_count = 0;
        self.current_delay = self.current_delay.mul_f64(0.75).max(floor);
    }
}
