use std::time::{Duration, Instant};
use tracing::{error, info, warn};

/// Circuit breaker state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CircuitState {
    Closed,   // Normal operation - cycles run back to back
    Open,     // Failure threshold breached - hold off until the cooldown elapses
    HalfOpen, // A single trial cycle after the cooldown
}

/// Consecutive-failure breaker guarding the supervised cycle loop.
///
/// Owned by a single runner, so state changes take `&mut self` instead of
/// going through a lock.
pub struct CircuitBreaker {
    name: String,
    failure_threshold: usize,
    cooldown: Duration,
    state: CircuitState,
    consecutive_failures: usize,
    opened_at: Option<Instant>,
}

impl CircuitBreaker {
    /// Create a new circuit breaker
    ///
    /// # Arguments
    /// * `name` - Identifier for logging
    /// * `failure_threshold` - Number of consecutive failures before opening circuit
    /// * `cooldown` - Duration to wait before transitioning from Open to HalfOpen
    pub fn new(name: impl Into<String>, failure_threshold: usize, cooldown: Duration) -> Self {
        Self {
            name: name.into(),
            failure_threshold: failure_threshold.max(1),
            cooldown,
            state: CircuitState::Closed,
            consecutive_failures: 0,
            opened_at: None,
        }
    }

    pub fn state(&self) -> CircuitState {
        self.state
    }

    pub fn consecutive_failures(&self) -> usize {
        self.consecutive_failures
    }

    /// Time left before an open circuit allows a trial cycle. Zero when not open.
    pub fn remaining_cooldown(&self) -> Duration {
        match (self.state, self.opened_at) {
            (CircuitState::Open, Some(opened_at)) => self.cooldown.saturating_sub(opened_at.elapsed()),
            _ => Duration::ZERO,
        }
    }

    /// Move Open -> HalfOpen once the cooldown has elapsed.
    ///
    /// Returns true when a cycle may run.
    pub fn try_acquire(&mut self) -> bool {
        match self.state {
            CircuitState::Closed | CircuitState::HalfOpen => true,
            CircuitState::Open => {
                if self.remaining_cooldown().is_zero() {
                    info!(
                        "CircuitBreaker [{}]: Transitioning Open -> HalfOpen (cooldown elapsed)",
                        self.name
                    );
                    self.state = CircuitState::HalfOpen;
                    true
                } else {
                    false
                }
            }
        }
    }

    /// Record a successful cycle
    pub fn record_success(&mut self) {
        if self.state == CircuitState::HalfOpen {
            info!(
                "CircuitBreaker [{}]: Transitioning HalfOpen -> Closed (trial cycle succeeded)",
                self.name
            );
        }
        self.state = CircuitState::Closed;
        self.consecutive_failures = 0;
        self.opened_at = None;
    }

    /// Record a failed cycle.
    ///
    /// Returns true if this failure opened the circuit.
    pub fn record_failure(&mut self) -> bool {
        self.consecutive_failures += 1;

        match self.state {
            CircuitState::Closed => {
                if self.consecutive_failures >= self.failure_threshold {
                    error!(
                        "CircuitBreaker [{}]: Transitioning Closed -> Open ({} failures)",
                        self.name, self.consecutive_failures
                    );
                    self.open();
                    return true;
                }
                false
            }
            CircuitState::HalfOpen => {
                // Any failure in HalfOpen immediately reopens circuit
                warn!(
                    "CircuitBreaker [{}]: Transitioning HalfOpen -> Open (trial cycle failed)",
                    self.name
                );
                self.open();
                true
            }
            CircuitState::Open => false,
        }
    }

    fn open(&mut self) {
        self.state = CircuitState::Open;
        self.opened_at = Some(Instant::now());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn test_circuit_opens_after_failures() {
        let mut cb = CircuitBreaker::new("test", 3, Duration::from_secs(60));

        assert!(!cb.record_failure());
        assert!(!cb.record_failure());
        assert!(cb.record_failure());

        assert_eq!(cb.state(), CircuitState::Open);
        assert!(!cb.try_acquire());
        assert!(cb.remaining_cooldown() > Duration::ZERO);
    }

    #[test]
    fn test_success_resets_failure_count() {
        let mut cb = CircuitBreaker::new("test", 2, Duration::from_secs(60));

        cb.record_failure();
        cb.record_success();
        assert!(!cb.record_failure());
        assert_eq!(cb.state(), CircuitState::Closed);
        assert_eq!(cb.consecutive_failures(), 1);
    }

    #[test]
    fn test_circuit_recovers_after_cooldown() {
        let mut cb = CircuitBreaker::new("test", 1, Duration::from_millis(20));

        assert!(cb.record_failure());
        thread::sleep(Duration::from_millis(40));

        assert!(cb.try_acquire());
        assert_eq!(cb.state(), CircuitState::HalfOpen);

        cb.record_success();
        assert_eq!(cb.state(), CircuitState::Closed);
        assert_eq!(cb.remaining_cooldown(), Duration::ZERO);
    }

    #[test]
    fn test_halfopen_reopens_on_failure() {
        let mut cb = CircuitBreaker::new("test", 1, Duration::ZERO);

        cb.record_failure();
        assert!(cb.try_acquire());
        assert_eq!(cb.state(), CircuitState::HalfOpen);

        assert!(cb.record_failure());
        assert_eq!(cb.state(), CircuitState::Open);
    }
}
