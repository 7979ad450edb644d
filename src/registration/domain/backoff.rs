//! Retry delay policy for failed registration attempts.

use rand::Rng;
use std::time::Duration;

/// Stateless retry delay calculation.
///
/// The policy grows exponentially from a base delay, capped at a maximum,
/// with bounded random jitter so that many entities failing in the same batch
/// do not retry in lockstep. A server-suggested delay always wins when it
/// exceeds the computed value: the agent never retries sooner than
/// instructed. The returned delay is always positive and the calculation
/// performs no I/O.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackoffPolicy {
    base: Duration,
    multiplier: u32,
    cap: Duration,
    jitter_percent: u8,
}

impl BackoffPolicy {
    /// Creates a policy with the default schedule: 1s base, doubling, capped
    /// at 5 minutes, with ±20% jitter.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            base: Duration::from_secs(1),
            multiplier: 2,
            cap: Duration::from_secs(300),
            jitter_percent: 20,
        }
    }

    /// Sets the delay before the first retry.
    #[must_use]
    pub const fn with_base(mut self, base: Duration) -> Self {
        self.base = base;
        self
    }

    /// Sets the growth factor applied per attempt.
    #[must_use]
    pub const fn with_multiplier(mut self, multiplier: u32) -> Self {
        self.multiplier = multiplier;
        self
    }

    /// Sets the maximum delay.
    #[must_use]
    pub const fn with_cap(mut self, cap: Duration) -> Self {
        self.cap = cap;
        self
    }

    /// Sets the jitter bound as a percentage of the computed delay.
    ///
    /// Zero disables jitter, which makes the schedule deterministic.
    #[must_use]
    pub const fn with_jitter_percent(mut self, jitter_percent: u8) -> Self {
        self.jitter_percent = jitter_percent;
        self
    }

    /// Computes the retry delay after the given number of failed attempts.
    ///
    /// `server_hint` carries an explicit retry-after delay from the backend;
    /// it overrides the computed value whenever it is larger.
    #[must_use]
    pub fn delay(&self, attempts: u32, server_hint: Option<Duration>) -> Duration {
        let jittered = self.jitter(self.exponential_millis(attempts));
        let computed = Duration::from_millis(jittered.max(1));
        match server_hint {
            Some(hint) if hint > computed => hint,
            _ => computed,
        }
    }

    /// Returns the capped exponential delay in milliseconds, without jitter.
    fn exponential_millis(&self, attempts: u32) -> u64 {
        let base = u64::try_from(self.base.as_millis()).unwrap_or(u64::MAX);
        let cap = u64::try_from(self.cap.as_millis()).unwrap_or(u64::MAX);
        let growth = u64::from(self.multiplier)
            .checked_pow(attempts.saturating_sub(1))
            .unwrap_or(u64::MAX);
        base.saturating_mul(growth).min(cap)
    }

    /// Applies bounded random jitter around the computed delay.
    #[expect(
        clippy::integer_division,
        reason = "percentage scaling of a millisecond delay tolerates truncation"
    )]
    fn jitter(&self, millis: u64) -> u64 {
        if self.jitter_percent == 0 {
            return millis;
        }
        let spread = millis.saturating_mul(u64::from(self.jitter_percent)) / 100;
        if spread == 0 {
            return millis;
        }
        let low = millis.saturating_sub(spread);
        let high = millis.saturating_add(spread);
        rand::thread_rng().gen_range(low..=high)
    }
}

impl Default for BackoffPolicy {
    fn default() -> Self {
        Self::new()
    }
}
