//! Bounded register polling.

use embedded_hal::delay::DelayNs;
use platform::I2sTuning;

/// How many times to poll, and how long to wait between attempts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PollPolicy {
    /// Reads before giving up.
    pub max_attempts: u32,
    /// Pause after each unsuccessful read; 0 polls back to back.
    pub delay_ns: u32,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self { max_attempts: I2sTuning::POLL_ATTEMPTS, delay_ns: 0 }
    }
}

/// Result of a bounded poll.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PollOutcome {
    /// Condition met on the given attempt (1-based).
    Ready {
        /// Attempt that observed the condition.
        attempts: u32,
    },
    /// Condition never met.
    Exhausted {
        /// Attempts performed.
        attempts: u32,
    },
}

/// Busy-wait delay that returns immediately.
///
/// Used when the register transport itself is slow enough to pace the poll.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoDelay;

impl DelayNs for NoDelay {
    fn delay_ns(&mut self, _ns: u32) {}
}

/// Evaluate `ready` until it returns `true` or the policy is exhausted.
pub fn poll_until<D, E, F>(policy: PollPolicy, delay: &mut D, mut ready: F) -> Result<PollOutcome, E>
where
    D: DelayNs,
    F: FnMut() -> Result<bool, E>,
{
    for attempt in 1..=policy.max_attempts {
        if ready()? {
            return Ok(PollOutcome::Ready { attempts: attempt });
        }
        if policy.delay_ns > 0 {
            delay.delay_ns(policy.delay_ns);
        }
    }
    Ok(PollOutcome::Exhausted { attempts: policy.max_attempts })
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::arithmetic_side_effects)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct CountingDelay {
        calls: u32,
        total_ns: u64,
    }

    impl DelayNs for CountingDelay {
        fn delay_ns(&mut self, ns: u32) {
            self.calls += 1;
            self.total_ns += u64::from(ns);
        }
    }

    #[test]
    fn ready_on_third_attempt() {
        let mut seen = 0;
        let outcome = poll_until::<_, (), _>(PollPolicy::default(), &mut NoDelay, || {
            seen += 1;
            Ok(seen == 3)
        })
        .unwrap();
        assert_eq!(outcome, PollOutcome::Ready { attempts: 3 });
    }

    #[test]
    fn exhausts_after_max_attempts() {
        let mut seen = 0;
        let outcome = poll_until::<_, (), _>(PollPolicy::default(), &mut NoDelay, || {
            seen += 1;
            Ok(false)
        })
        .unwrap();
        assert_eq!(outcome, PollOutcome::Exhausted { attempts: 1000 });
        assert_eq!(seen, 1000);
    }

    #[test]
    fn delay_only_between_failed_attempts() {
        let mut delay = CountingDelay::default();
        let policy = PollPolicy { max_attempts: 5, delay_ns: 250 };
        let mut seen = 0;
        let outcome = poll_until::<_, (), _>(policy, &mut delay, || {
            seen += 1;
            Ok(seen == 2)
        })
        .unwrap();
        assert_eq!(outcome, PollOutcome::Ready { attempts: 2 });
        assert_eq!(delay.calls, 1);
        assert_eq!(delay.total_ns, 250);
    }

    #[test]
    fn transport_error_aborts_poll() {
        let outcome = poll_until(PollPolicy::default(), &mut NoDelay, || Err::<bool, _>("bus"));
        assert_eq!(outcome, Err("bus"));
    }

    #[test]
    fn zero_budget_never_reads() {
        let mut seen = 0;
        let policy = PollPolicy { max_attempts: 0, delay_ns: 0 };
        let outcome = poll_until::<_, (), _>(policy, &mut NoDelay, || {
            seen += 1;
            Ok(true)
        })
        .unwrap();
        assert_eq!(outcome, PollOutcome::Exhausted { attempts: 0 });
        assert_eq!(seen, 0);
    }
}
