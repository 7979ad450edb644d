//! Tuning knobs for the registration cycle.

use crate::registration::domain::BackoffPolicy;
use std::time::Duration;

/// Configuration for batching, timeouts, and retry scheduling.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistrationConfig {
    max_batch_size: usize,
    call_timeout: Duration,
    cycle_interval: Duration,
    backoff: BackoffPolicy,
}

impl RegistrationConfig {
    /// Creates a configuration with production defaults: batches of 100,
    /// a 10 second call deadline, a 5 second cycle, and the default backoff
    /// schedule.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            max_batch_size: 100,
            call_timeout: Duration::from_secs(10),
            cycle_interval: Duration::from_secs(5),
            backoff: BackoffPolicy::new(),
        }
    }

    /// Sets the maximum number of entities per registration call.
    #[must_use]
    pub const fn with_max_batch_size(mut self, max_batch_size: usize) -> Self {
        self.max_batch_size = max_batch_size;
        self
    }

    /// Sets the deadline applied to each register call.
    #[must_use]
    pub const fn with_call_timeout(mut self, call_timeout: Duration) -> Self {
        self.call_timeout = call_timeout;
        self
    }

    /// Sets the interval between drain-and-submit cycles.
    #[must_use]
    pub const fn with_cycle_interval(mut self, cycle_interval: Duration) -> Self {
        self.cycle_interval = cycle_interval;
        self
    }

    /// Sets the retry delay policy.
    #[must_use]
    pub const fn with_backoff(mut self, backoff: BackoffPolicy) -> Self {
        self.backoff = backoff;
        self
    }

    /// Returns the maximum number of entities per registration call.
    #[must_use]
    pub const fn max_batch_size(&self) -> usize {
        self.max_batch_size
    }

    /// Returns the deadline applied to each register call.
    #[must_use]
    pub const fn call_timeout(&self) -> Duration {
        self.call_timeout
    }

    /// Returns the interval between drain-and-submit cycles.
    #[must_use]
    pub const fn cycle_interval(&self) -> Duration {
        self.cycle_interval
    }

    /// Returns the retry delay policy.
    #[must_use]
    pub const fn backoff(&self) -> &BackoffPolicy {
        &self.backoff
    }
}

impl Default for RegistrationConfig {
    fn default() -> Self {
        Self::new()
    }
}
