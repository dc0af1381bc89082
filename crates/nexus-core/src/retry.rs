//! Retry with exponential backoff

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::error::{ErrorKind, NexusError};

/// Decides whether a failure is worth another attempt
pub type RetryPredicate = Arc<dyn Fn(&NexusError) -> bool + Send + Sync>;

const RETRYABLE_MARKERS: &[&str] = &[
    "enotfound",
    "econnrefused",
    "econnreset",
    "etimedout",
    "timeout",
    "network",
    "502",
    "503",
    "504",
];

const FATAL_MARKERS: &[&str] = &["unauthorized", "forbidden", "invalid", "authentication"];

/// Retry policy: attempt count, backoff curve and retry predicate
#[derive(Clone)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub initial_delay: Duration,
    pub backoff_multiplier: f64,
    predicate: RetryPredicate,
}

impl std::fmt::Debug for RetryPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RetryPolicy")
            .field("max_attempts", &self.max_attempts)
            .field("initial_delay", &self.initial_delay)
            .field("backoff_multiplier", &self.backoff_multiplier)
            .finish_non_exhaustive()
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(3, Duration::from_millis(1000), 2.0)
    }
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, initial_delay: Duration, backoff_multiplier: f64) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            initial_delay,
            backoff_multiplier: backoff_multiplier.max(1.0),
            predicate: Arc::new(is_retryable),
        }
    }

    /// Short operations: 3 attempts, 500ms, x1.5
    pub fn quick() -> Self {
        Self::new(3, Duration::from_millis(500), 1.5)
    }

    /// Network-bound operations: 5 attempts, 1s, x2
    pub fn network() -> Self {
        Self::new(5, Duration::from_millis(1000), 2.0)
    }

    /// Builds: 2 attempts, 2s, constant delay
    pub fn build() -> Self {
        Self::new(2, Duration::from_millis(2000), 1.0)
    }

    /// Only the first attempt, never retried
    pub fn none() -> Self {
        Self::new(1, Duration::ZERO, 1.0)
    }

    /// Replace the retry predicate
    pub fn with_predicate<F>(mut self, predicate: F) -> Self
    where
        F: Fn(&NexusError) -> bool + Send + Sync + 'static,
    {
        self.predicate = Arc::new(predicate);
        self
    }

    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts.max(1);
        self
    }

    /// Delay before the attempt following `attempt` (1-based):
    /// `round(initial * multiplier^(attempt-1))` milliseconds
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1) as i32;
        let millis = self.initial_delay.as_millis() as f64 * self.backoff_multiplier.powi(exponent);
        Duration::from_millis(millis.round() as u64)
    }

    pub fn should_retry(&self, error: &NexusError) -> bool {
        (self.predicate)(error)
    }
}

/// Default retry predicate.
///
/// Known failures retry only when they are network failures. Anything else
/// is judged on its text: transient network markers retry, auth and
/// validation markers never do.
pub fn is_retryable(error: &NexusError) -> bool {
    if let Some(kind) = error.known_kind() {
        return kind == ErrorKind::NetworkError;
    }

    let text = match error {
        NexusError::CommandFailed { stderr, stdout, .. } => {
            format!("{}\n{}\n{}", error, stderr, stdout).to_lowercase()
        }
        _ => error.to_string().to_lowercase(),
    };

    if FATAL_MARKERS.iter().any(|m| text.contains(m)) {
        return false;
    }
    RETRYABLE_MARKERS.iter().any(|m| text.contains(m))
}

/// Runs fallible async operations under a [`RetryPolicy`]
#[derive(Debug, Default, Clone, Copy)]
pub struct RetryExecutor;

impl RetryExecutor {
    pub fn new() -> Self {
        Self
    }

    /// Run `op` until it succeeds, the predicate rejects the failure, or the
    /// attempts run out. The last failure is returned unchanged.
    pub async fn execute<T, F, Fut>(
        &self,
        mut op: F,
        policy: &RetryPolicy,
        label: &str,
    ) -> Result<T, NexusError>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<T, NexusError>>,
    {
        let mut attempt = 1;
        loop {
            debug!(operation = label, attempt, max_attempts = policy.max_attempts, "Attempting operation");
            match op(attempt).await {
                Ok(value) => {
                    if attempt > 1 {
                        info!(operation = label, attempt, "Operation recovered after retry");
                    }
                    return Ok(value);
                }
                Err(err) => {
                    let will_retry = attempt < policy.max_attempts && policy.should_retry(&err);
                    if !will_retry {
                        warn!(
                            operation = label,
                            attempt,
                            max_attempts = policy.max_attempts,
                            will_retry,
                            error = %err,
                            "Operation failed"
                        );
                        return Err(err);
                    }
                    let delay = policy.delay_for(attempt);
                    warn!(
                        operation = label,
                        attempt,
                        will_retry,
                        delay_ms = delay.as_millis() as u64,
                        error = %err,
                        "Operation failed, retrying"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
            }
        }
    }
}
