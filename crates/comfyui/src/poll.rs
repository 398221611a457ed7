//! Fixed-interval poll-until-ready primitive.
//!
//! Both waiting for the engine to come up and waiting for a submitted
//! job to finish are the same shape: probe, sleep, repeat, give up
//! after a ceiling. Expressing it once lets the liveness and completion
//! checks be tuned and tested independently.

use std::future::Future;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

/// Tunable parameters for one poll loop.
#[derive(Debug, Clone, Copy)]
pub struct PollConfig {
    /// Maximum number of probe invocations before giving up.
    pub max_attempts: u32,
    /// Fixed delay between consecutive probes.
    pub interval: Duration,
}

impl PollConfig {
    pub const fn new(max_attempts: u32, interval: Duration) -> Self {
        Self {
            max_attempts,
            interval,
        }
    }

    /// Default tuning for the engine liveness check: every 2 s, 30 tries.
    pub const fn liveness() -> Self {
        Self::new(30, Duration::from_secs(2))
    }

    /// Default tuning for the completion check: every 2 s, 60 tries
    /// (about two minutes).
    pub const fn completion() -> Self {
        Self::new(60, Duration::from_secs(2))
    }
}

/// Outcome of a poll loop.
#[derive(Debug, PartialEq, Eq)]
pub enum PollOutcome<T> {
    /// The probe reported success; carries its value.
    Ready(T),
    /// Every attempt came back not-ready.
    Exhausted { attempts: u32 },
    /// The cancellation token fired before the probe succeeded.
    Cancelled,
}

/// Invoke `probe` at a fixed interval until it yields `Some`, the
/// attempt ceiling is reached, or `cancel` fires.
///
/// The probe is polled at most [`PollConfig::max_attempts`] times; no
/// sleep follows the final attempt.
pub async fn poll_until<T, F, Fut>(
    config: &PollConfig,
    cancel: &CancellationToken,
    mut probe: F,
) -> PollOutcome<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Option<T>>,
{
    for attempt in 1..=config.max_attempts {
        if cancel.is_cancelled() {
            return PollOutcome::Cancelled;
        }

        tokio::select! {
            _ = cancel.cancelled() => return PollOutcome::Cancelled,
            ready = probe() => {
                if let Some(value) = ready {
                    return PollOutcome::Ready(value);
                }
            }
        }

        if attempt < config.max_attempts {
            tokio::select! {
                _ = cancel.cancelled() => return PollOutcome::Cancelled,
                _ = tokio::time::sleep(config.interval) => {}
            }
        }
    }
    PollOutcome::Exhausted {
        attempts: config.max_attempts,
    }
}
