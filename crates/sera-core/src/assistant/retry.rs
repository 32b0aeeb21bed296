//! Bounded linear-backoff retry, expressed as a pure state machine.
//!
//! Each upstream result is classified into an [`AttemptOutcome`], and
//! [`RetryPolicy::next`] maps `(attempt, outcome)` to the next
//! [`RetryState`]. The driver loop in `service.rs` performs the side effects
//! (upstream call, sleep); nothing in here touches the clock or the network.

use std::time::Duration;

use sera_types::config::RetryConfig;
use sera_types::conversation::Turn;
use sera_types::llm::{GenerateResponse, LlmError};

// ---------------------------------------------------------------------------
// RetryPolicy
// ---------------------------------------------------------------------------

/// How many upstream attempts to make and how long to wait between them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first one.
    pub max_attempts: u32,
    /// Base delay; the wait after 0-based attempt `n` is `initial_delay * (n + 1)`.
    pub initial_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            initial_delay: Duration::from_millis(1000),
        }
    }
}

impl From<&RetryConfig> for RetryPolicy {
    fn from(config: &RetryConfig) -> Self {
        Self {
            max_attempts: config.max_attempts,
            initial_delay: Duration::from_millis(config.initial_delay_ms),
        }
    }
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, initial_delay: Duration) -> Self {
        Self {
            max_attempts,
            initial_delay,
        }
    }

    /// Linear backoff: wait after the 0-based `attempt` before the next one.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        self.initial_delay.saturating_mul(attempt.saturating_add(1))
    }

    /// Transition out of `Attempting { attempt }` given that attempt's outcome.
    pub fn next(&self, attempt: u32, outcome: AttemptOutcome) -> RetryState {
        match outcome {
            AttemptOutcome::Success(turn) => RetryState::Succeeded(turn),
            AttemptOutcome::FatalFailure(message) => RetryState::FatalFailed { message },
            AttemptOutcome::TransientFailure(_) => {
                let next_attempt = attempt + 1;
                if next_attempt < self.max_attempts {
                    RetryState::Backoff {
                        next_attempt,
                        delay: self.delay_for(attempt),
                    }
                } else {
                    RetryState::ExhaustedFailed
                }
            }
        }
    }
}

// ---------------------------------------------------------------------------
// RetryState
// ---------------------------------------------------------------------------

/// Where one exchange currently stands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RetryState {
    /// About to make upstream call number `attempt` (0-based).
    Attempting { attempt: u32 },
    /// Waiting `delay` before making attempt `next_attempt`.
    Backoff { next_attempt: u32, delay: Duration },
    /// The model answered; carries its turn.
    Succeeded(Turn),
    /// Every attempt failed transiently.
    ExhaustedFailed,
    /// A non-retryable failure ended the exchange.
    FatalFailed { message: String },
}

impl RetryState {
    /// Initial state for `policy`. A zero-attempt policy is exhausted up front.
    pub fn start(policy: &RetryPolicy) -> Self {
        if policy.max_attempts == 0 {
            RetryState::ExhaustedFailed
        } else {
            RetryState::Attempting { attempt: 0 }
        }
    }
}

// ---------------------------------------------------------------------------
// AttemptOutcome
// ---------------------------------------------------------------------------

/// Classification of a single upstream call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttemptOutcome {
    Success(Turn),
    TransientFailure(String),
    FatalFailure(String),
}

impl AttemptOutcome {
    /// Classify a raw upstream result.
    ///
    /// A response whose first candidate carries non-blank content is a
    /// success. A response with no usable candidate counts as transient,
    /// same as an explicit overload signal.
    pub fn classify(result: Result<GenerateResponse, LlmError>) -> Self {
        match result {
            Ok(response) => match response.first_content() {
                Some(turn) if !turn.is_blank() => AttemptOutcome::Success(turn.clone()),
                _ => AttemptOutcome::TransientFailure(LlmError::EmptyResponse.to_string()),
            },
            Err(err) if err.is_transient() => AttemptOutcome::TransientFailure(err.to_string()),
            Err(err) => AttemptOutcome::FatalFailure(err.to_string()),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
