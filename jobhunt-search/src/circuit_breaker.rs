//! Per-source circuit breaker.
//!
//! Job boards go down, rate-limit, or start serving CAPTCHA pages for hours
//! at a time. A source that fails `failure_threshold` searches in a row is
//! skipped until `cooldown_secs` have passed, then one trial search decides
//! whether it comes back.
//!
//! ```text
//! ┌────────┐  N failures   ┌────────┐  cooldown   ┌──────────┐
//! │ Closed ├──────────────►│  Open  ├────────────►│ HalfOpen │
//! └───▲────┘               └───▲────┘             └────┬─────┘
//!     │                        │      failure          │
//!     │                        └───────────────────────┤
//!     │                 success                        │
//!     └────────────────────────────────────────────────┘
//! ```
//!
//! The breaker belongs to one [`crate::Aggregator`]; there is no process-wide
//! instance.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use crate::config::SearchConfig;

/// Breaker state for one source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CircuitState {
    /// Searches go through.
    Closed,
    /// Too many consecutive failures; searches are skipped until cooldown.
    Open,
    /// Cooldown elapsed; one trial search is allowed at a time.
    HalfOpen,
}

#[derive(Debug, Clone)]
struct SourceHealth {
    state: CircuitState,
    consecutive_failures: u32,
    opened_at: Option<Instant>,
    trial_in_flight: bool,
}

impl Default for SourceHealth {
    fn default() -> Self {
        Self {
            state: CircuitState::Closed,
            consecutive_failures: 0,
            opened_at: None,
            trial_in_flight: false,
        }
    }
}

/// Failure tracking keyed by source name.
#[derive(Debug)]
pub struct CircuitBreaker {
    failure_threshold: u32,
    cooldown: Duration,
    sources: HashMap<String, SourceHealth>,
}

impl CircuitBreaker {
    pub fn new(failure_threshold: u32, cooldown: Duration) -> Self {
        Self {
            failure_threshold: failure_threshold.max(1),
            cooldown,
            sources: HashMap::new(),
        }
    }

    pub fn from_config(config: &SearchConfig) -> Self {
        Self::new(
            config.failure_threshold,
            Duration::from_secs(config.cooldown_seconds),
        )
    }

    /// A search answered, with or without listings.
    pub fn record_success(&mut self, source: &str) {
        let health = self.sources.entry(source.to_string()).or_default();
        if health.state != CircuitState::Closed {
            tracing::info!(source, "source recovered, circuit closed");
        }
        *health = SourceHealth::default();
    }

    /// A search failed or timed out.
    pub fn record_failure(&mut self, source: &str) {
        let health = self.sources.entry(source.to_string()).or_default();
        health.consecutive_failures = health.consecutive_failures.saturating_add(1);
        health.trial_in_flight = false;

        let trip = health.state == CircuitState::HalfOpen
            || health.consecutive_failures >= self.failure_threshold;
        if trip {
            if health.state != CircuitState::Open {
                tracing::warn!(
                    source,
                    failures = health.consecutive_failures,
                    cooldown_secs = self.cooldown.as_secs(),
                    "circuit opened, skipping source"
                );
            }
            health.state = CircuitState::Open;
            health.opened_at = Some(Instant::now());
        }
    }

    /// Whether `source` should be searched now. Moves an Open circuit whose
    /// cooldown has elapsed to HalfOpen and hands out its single trial; a
    /// HalfOpen source with a trial outstanding is skipped.
    pub fn should_attempt(&mut self, source: &str) -> bool {
        let Some(health) = self.sources.get_mut(source) else {
            return true;
        };
        match health.state {
            CircuitState::Closed => true,
            CircuitState::HalfOpen => {
                if health.trial_in_flight {
                    return false;
                }
                health.trial_in_flight = true;
                true
            }
            CircuitState::Open => {
                let cooled = health
                    .opened_at
                    .is_none_or(|at| at.elapsed() >= self.cooldown);
                if cooled {
                    tracing::debug!(source, "cooldown elapsed, trying source again");
                    health.state = CircuitState::HalfOpen;
                    health.trial_in_flight = true;
                }
                cooled
            }
        }
    }

    /// The search admitted by [`CircuitBreaker::should_attempt`] ended with
    /// no verdict (abandoned at the deadline). A pending trial is handed
    /// back so the next search can make it.
    pub fn release(&mut self, source: &str) {
        if let Some(health) = self.sources.get_mut(source) {
            health.trial_in_flight = false;
        }
    }

    /// Current state for `source`; unseen sources are Closed.
    pub fn state(&self, source: &str) -> CircuitState {
        self.sources
            .get(source)
            .map_or(CircuitState::Closed, |h| h.state)
    }
}
