//! Retrying load cycle.
//!
//! One cycle runs attempts strictly in sequence:
//!
//! ```text
//! Idle -> Attempting(1) -> Success
//!                       -> Attempting(2) -> ... -> TerminalFailure
//! ```
//!
//! Each attempt parses on the blocking thread pool. Between failures the
//! loader waits `base * 2^(attempt-1)` through a [`Sleeper`], so tests can
//! swap in a fake clock. The loader never touches shared state itself; it
//! reports progress as [`LoaderEvent`]s to whoever owns that state.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, info, warn};
use warpbar_core::UsageSnapshot;

use crate::error::FetchError;
use crate::retry::RetryStrategy;
use crate::source::SnapshotSource;

// ============================================================================
// Sleeper
// ============================================================================

/// Non-blocking delay used between attempts.
#[async_trait]
pub trait Sleeper: Send + Sync {
    /// Suspends for `duration`.
    async fn sleep(&self, duration: Duration);
}

/// Sleeps on the tokio timer.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioSleeper;

#[async_trait]
impl Sleeper for TokioSleeper {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

// ============================================================================
// Loader Events
// ============================================================================

/// Progress of a load cycle.
#[derive(Debug, Clone)]
pub enum LoaderEvent {
    /// An attempt is about to run.
    AttemptStarted {
        /// 1-based attempt number.
        attempt: u32,
    },
    /// An attempt failed and another will follow after `retry_in`.
    AttemptFailed {
        /// 1-based attempt number.
        attempt: u32,
        /// Why it failed.
        error: FetchError,
        /// Backoff before the next attempt.
        retry_in: Duration,
    },
    /// The cycle produced a snapshot.
    Succeeded {
        /// Attempt that succeeded.
        attempt: u32,
        /// The parsed snapshot.
        snapshot: UsageSnapshot,
    },
    /// Every attempt failed.
    Exhausted {
        /// A `FetchError::RetriesExhausted` wrapping the last failure.
        error: FetchError,
    },
}

// ============================================================================
// Retrying Loader
// ============================================================================

/// Runs load cycles against a [`SnapshotSource`] with bounded retries.
#[derive(Clone)]
pub struct RetryingLoader {
    source: Arc<dyn SnapshotSource>,
    strategy: RetryStrategy,
    sleeper: Arc<dyn Sleeper>,
}

impl std::fmt::Debug for RetryingLoader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RetryingLoader")
            .field("strategy", &self.strategy)
            .finish_non_exhaustive()
    }
}

impl RetryingLoader {
    /// Creates a loader that sleeps on the tokio timer.
    pub fn new(source: Arc<dyn SnapshotSource>, strategy: RetryStrategy) -> Self {
        Self::with_sleeper(source, strategy, Arc::new(TokioSleeper))
    }

    /// Creates a loader with a custom sleeper.
    pub fn with_sleeper(
        source: Arc<dyn SnapshotSource>,
        strategy: RetryStrategy,
        sleeper: Arc<dyn Sleeper>,
    ) -> Self {
        Self {
            source,
            strategy,
            sleeper,
        }
    }

    /// Returns the snapshot source.
    pub fn source(&self) -> &Arc<dyn SnapshotSource> {
        &self.source
    }

    /// Returns the retry strategy.
    pub fn strategy(&self) -> &RetryStrategy {
        &self.strategy
    }

    /// Runs one full cycle, reporting each step to `on_event`.
    ///
    /// # Errors
    ///
    /// Returns `FetchError::RetriesExhausted` when every attempt fails.
    pub async fn run<F>(&self, mut on_event: F) -> Result<UsageSnapshot, FetchError>
    where
        F: FnMut(LoaderEvent) + Send,
    {
        let max_attempts = self.strategy.attempts();
        let mut attempt = 1;

        loop {
            on_event(LoaderEvent::AttemptStarted { attempt });
            debug!(attempt, max_attempts, "Load attempt");

            match self.attempt().await {
                Ok(snapshot) => {
                    info!(attempt, used = snapshot.requests_used, "Usage loaded");
                    on_event(LoaderEvent::Succeeded {
                        attempt,
                        snapshot: snapshot.clone(),
                    });
                    return Ok(snapshot);
                }
                Err(error) if self.strategy.should_retry(attempt) => {
                    let retry_in = self.strategy.delay_for_attempt(attempt);
                    warn!(
                        attempt,
                        retry_in_ms = u64::try_from(retry_in.as_millis()).unwrap_or(u64::MAX),
                        error = %error,
                        "Load attempt failed, retrying"
                    );
                    on_event(LoaderEvent::AttemptFailed {
                        attempt,
                        error,
                        retry_in,
                    });
                    self.sleeper.sleep(retry_in).await;
                    attempt += 1;
                }
                Err(error) => {
                    let exhausted = FetchError::RetriesExhausted {
                        attempts: attempt,
                        last_error: error.to_string(),
                    };
                    warn!(attempts = attempt, error = %error, "Load retries exhausted");
                    on_event(LoaderEvent::Exhausted {
                        error: exhausted.clone(),
                    });
                    return Err(exhausted);
                }
            }
        }
    }

    /// Runs a cycle without observing intermediate events.
    ///
    /// # Errors
    ///
    /// Returns `FetchError::RetriesExhausted` when every attempt fails.
    pub async fn load(&self) -> Result<UsageSnapshot, FetchError> {
        self.run(|_| {}).await
    }

    /// One parse on the blocking pool.
    async fn attempt(&self) -> Result<UsageSnapshot, FetchError> {
        let source = Arc::clone(&self.source);
        match tokio::task::spawn_blocking(move || source.load()).await {
            Ok(result) => result,
            Err(e) => Err(FetchError::SourceNotFound(format!(
                "preferences read did not complete: {e}"
            ))),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicU32, Ordering};
    use warpbar_core::SubscriptionTier;

    /// Fails a fixed number of times, then succeeds.
    struct FlakySource {
        failures: u32,
        calls: AtomicU32,
    }

    impl FlakySource {
        fn new(failures: u32) -> Self {
            Self {
                failures,
                calls: AtomicU32::new(0),
            }
        }
    }

    impl SnapshotSource for FlakySource {
        fn load(&self) -> Result<UsageSnapshot, FetchError> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
            if call <= self.failures {
                Err(FetchError::MalformedPayload(format!("failure {call}")))
            } else {
                Ok(UsageSnapshot::new(
                    10,
                    100,
                    Utc::now(),
                    false,
                    SubscriptionTier::Free,
                ))
            }
        }
    }

    /// Records requested delays instead of waiting.
    #[derive(Default)]
    struct RecordingSleeper {
        delays: Mutex<Vec<Duration>>,
    }

    #[async_trait]
    impl Sleeper for RecordingSleeper {
        async fn sleep(&self, duration: Duration) {
            self.delays.lock().unwrap().push(duration);
        }
    }

    fn loader(source: Arc<FlakySource>, sleeper: Arc<RecordingSleeper>) -> RetryingLoader {
        RetryingLoader::with_sleeper(source, RetryStrategy::new(3), sleeper)
    }

    #[tokio::test]
    async fn test_succeeds_after_two_failures() {
        let source = Arc::new(FlakySource::new(2));
        let sleeper = Arc::new(RecordingSleeper::default());
        let mut events = Vec::new();

        let result = loader(source.clone(), sleeper.clone())
            .run(|e| events.push(e))
            .await;

        assert!(result.is_ok());
        assert_eq!(source.calls.load(Ordering::SeqCst), 3);
        assert_eq!(
            *sleeper.delays.lock().unwrap(),
            vec![Duration::from_secs(1), Duration::from_secs(2)]
        );
        assert!(matches!(
            events.last(),
            Some(LoaderEvent::Succeeded { attempt: 3, .. })
        ));
        let failures = events
            .iter()
            .filter(|e| matches!(e, LoaderEvent::AttemptFailed { .. }))
            .count();
        assert_eq!(failures, 2);
    }

    #[tokio::test]
    async fn test_exhausts_after_max_attempts() {
        let source = Arc::new(FlakySource::new(u32::MAX));
        let sleeper = Arc::new(RecordingSleeper::default());
        let mut events = Vec::new();

        let err = loader(source.clone(), sleeper.clone())
            .run(|e| events.push(e))
            .await
            .unwrap_err();

        assert_eq!(source.calls.load(Ordering::SeqCst), 3);
        assert_eq!(sleeper.delays.lock().unwrap().len(), 2);
        match err {
            FetchError::RetriesExhausted {
                attempts,
                last_error,
            } => {
                assert_eq!(attempts, 3);
                assert!(last_error.contains("failure 3"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(matches!(events.last(), Some(LoaderEvent::Exhausted { .. })));
    }

    #[tokio::test]
    async fn test_first_attempt_success_never_sleeps() {
        let source = Arc::new(FlakySource::new(0));
        let sleeper = Arc::new(RecordingSleeper::default());

        let snapshot = loader(source, sleeper.clone()).load().await.unwrap();

        assert_eq!(snapshot.requests_used, 10);
        assert!(sleeper.delays.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_no_retry_strategy_makes_single_attempt() {
        let source = Arc::new(FlakySource::new(1));
        let sleeper = Arc::new(RecordingSleeper::default());
        let loader =
            RetryingLoader::with_sleeper(source.clone(), RetryStrategy::no_retry(), sleeper);

        assert!(loader.load().await.is_err());
        assert_eq!(source.calls.load(Ordering::SeqCst), 1);
    }
}
