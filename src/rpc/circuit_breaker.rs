use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

/// Current state of the transport circuit breaker.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum CircuitState {
    Closed,
    Open,
    HalfOpen,
}

/// Snapshot of breaker internals for observability.
#[derive(Debug, Copy, Clone)]
pub struct CircuitBreakerSnapshot {
    pub state: CircuitState,
    pub consecutive_failures: usize,
    pub opened_at: Option<Instant>,
}

#[derive(Debug)]
struct BreakerState {
    state: CircuitState,
    consecutive_failures: usize,
    opened_at: Option<Instant>,
    probe_in_flight: bool,
}

/// Returned when the breaker refuses to let a request through.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CircuitOpen;

/// Permit for one attempt. Settle it with [`BreakerPermit::success`] or
/// [`BreakerPermit::failure`]; dropping it unsettled records no outcome and
/// frees the Half-Open probe slot it may hold.
#[must_use]
#[derive(Debug)]
pub(crate) struct BreakerPermit<'a> {
    breaker: &'a CircuitBreaker,
    state: CircuitState,
    settled: bool,
}

impl BreakerPermit<'_> {
    pub(crate) fn state(&self) -> CircuitState {
        self.state
    }

    pub(crate) fn success(mut self) {
        self.settled = true;
        self.breaker.record_success();
    }

    pub(crate) fn failure(mut self) {
        self.settled = true;
        self.breaker.record_failure();
    }
}

impl Drop for BreakerPermit<'_> {
    fn drop(&mut self) {
        if !self.settled && self.state == CircuitState::HalfOpen {
            self.breaker.release_probe();
        }
    }
}

/// Closed/Open/Half-Open breaker guarding the node endpoint.
///
/// After `failure_threshold` consecutive failures the breaker opens and
/// rejects requests for `cooldown`. The first request after the cooldown is
/// let through alone as a probe; its outcome closes or re-opens the breaker.
#[derive(Debug, Clone)]
pub struct CircuitBreaker {
    state: Arc<Mutex<BreakerState>>,
    failure_threshold: usize,
    cooldown: Duration,
}

impl Default for CircuitBreaker {
    fn default() -> Self {
        Self::new(5, Duration::from_secs(30))
    }
}

impl CircuitBreaker {
    pub fn new(failure_threshold: usize, cooldown: Duration) -> Self {
        let cooldown = if cooldown.is_zero() {
            Duration::from_secs(1)
        } else {
            cooldown
        };

        Self {
            state: Arc::new(Mutex::new(BreakerState {
                state: CircuitState::Closed,
                consecutive_failures: 0,
                opened_at: None,
                probe_in_flight: false,
            })),
            failure_threshold: failure_threshold.max(1),
            cooldown,
        }
    }

    pub fn snapshot(&self) -> CircuitBreakerSnapshot {
        let guard = self.lock();
        CircuitBreakerSnapshot {
            state: guard.state,
            consecutive_failures: guard.consecutive_failures,
            opened_at: guard.opened_at,
        }
    }

    /// Asks for a permit. Every granted permit must be settled with
    /// [`record_success`](Self::record_success) or
    /// [`record_failure`](Self::record_failure).
    pub fn before_request(&self) -> Result<CircuitState, CircuitOpen> {
        let mut state = self.lock();

        if state.state == CircuitState::Open {
            match state.opened_at {
                Some(opened_at) if opened_at.elapsed() >= self.cooldown => {
                    transition(&mut state, CircuitState::HalfOpen);
                    state.probe_in_flight = false;
                }
                _ => return Err(CircuitOpen),
            }
        }

        if state.state == CircuitState::HalfOpen {
            if state.probe_in_flight {
                return Err(CircuitOpen);
            }
            state.probe_in_flight = true;
        }

        Ok(state.state)
    }

    /// Like [`before_request`](Self::before_request), but the permit settles
    /// itself on drop if the attempt is abandoned.
    pub(crate) fn acquire(&self) -> Result<BreakerPermit<'_>, CircuitOpen> {
        let state = self.before_request()?;
        Ok(BreakerPermit {
            breaker: self,
            state,
            settled: false,
        })
    }

    /// Gives back an unsettled Half-Open probe without recording an outcome.
    pub fn release_probe(&self) {
        let mut state = self.lock();
        if state.state == CircuitState::HalfOpen && state.probe_in_flight {
            state.probe_in_flight = false;
            tracing::debug!("half-open probe abandoned; slot released");
        }
    }

    pub fn record_success(&self) {
        let mut state = self.lock();
        state.probe_in_flight = false;
        state.consecutive_failures = 0;

        if state.state == CircuitState::HalfOpen {
            state.opened_at = None;
            transition(&mut state, CircuitState::Closed);
        }
    }

    pub fn record_failure(&self) {
        let mut state = self.lock();
        state.probe_in_flight = false;
        state.consecutive_failures = state.consecutive_failures.saturating_add(1);

        let trip = match state.state {
            CircuitState::HalfOpen => true,
            CircuitState::Closed => state.consecutive_failures >= self.failure_threshold,
            CircuitState::Open => false,
        };
        if trip {
            state.opened_at = Some(Instant::now());
            transition(&mut state, CircuitState::Open);
        }
    }

    // The guarded state stays consistent across a panic, so poisoning is ignored.
    fn lock(&self) -> MutexGuard<'_, BreakerState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn transition(state: &mut BreakerState, next: CircuitState) {
    if state.state != next {
        tracing::warn!(
            previous = ?state.state,
            next = ?next,
            consecutive_failures = state.consecutive_failures,
            "transport circuit breaker state changed"
        );
        state.state = next;
    }
}
