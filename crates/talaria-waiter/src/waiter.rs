//! The polling waiter: re-invokes an operation until a terminal state.
//!
//! A [`Waiter`] wraps one [`Operation`] (typically a call through a
//! middleware stack) and polls it under a wait budget. Each attempt's
//! result is judged either by the caller-supplied retry predicate or by the
//! configured acceptors; between attempts the waiter sleeps with
//! exponential backoff, bounded by the invocation deadline.

use crate::acceptor::{evaluate, Acceptor};
use crate::backoff::compute_delay;
use crate::error::WaiterError;
use crate::path::{JsonPointer, PathExtractor};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use talaria_core::{ApiError, BoxFuture, Context};
use tokio::time::Instant;

/// Default minimum backoff between attempts.
pub const DEFAULT_MIN_DELAY: Duration = Duration::from_secs(2);

/// Default maximum backoff between attempts.
pub const DEFAULT_MAX_DELAY: Duration = Duration::from_secs(120);

/// The wrapped call a waiter re-invokes.
///
/// Implementations typically dispatch through a middleware stack; the
/// waiter neither knows nor cares, it only needs the modeled result.
pub trait Operation<I>: Send + Sync {
    /// The operation's modeled output.
    type Output: Serialize + Send;

    /// The operation's error type.
    type Error: ApiError + Send + Sync;

    /// Invokes the operation once with the caller's input.
    fn call<'a>(
        &'a self,
        cx: &'a mut Context,
        input: &'a I,
    ) -> BoxFuture<'a, Result<Self::Output, Self::Error>>;
}

/// Caller-supplied override for the acceptor-driven retry decision.
///
/// Returns `Ok(true)` to keep polling, `Ok(false)` on success, or an error
/// for a terminal failure: the same verdict shape the acceptor evaluator
/// produces. Generated clients use this hook for typed error matching the
/// declarative acceptors cannot express.
pub type Retryable<I, O, E> =
    Arc<dyn Fn(&Context, &I, &Result<O, E>) -> Result<bool, WaiterError> + Send + Sync>;

/// One functional override applied to a clone of the base options for a
/// single `wait` call.
pub type OptionOverride<I, O, E> = Box<dyn FnOnce(&mut WaiterOptions<I, O, E>) + Send>;

/// Configuration for a [`Waiter`].
///
/// Options set at construction apply to every wait; per-call overrides are
/// merged onto a clone by [`Waiter::wait_with`].
pub struct WaiterOptions<I, O, E> {
    min_delay: Duration,
    max_delay: Duration,
    log_wait_attempts: bool,
    acceptors: Vec<Acceptor>,
    retryable: Option<Retryable<I, O, E>>,
    extractor: Arc<dyn PathExtractor>,
}

impl<I, O, E> WaiterOptions<I, O, E> {
    /// Creates options with default delays, no acceptors, and JSON Pointer
    /// path extraction.
    #[must_use]
    pub fn new() -> Self {
        Self {
            min_delay: DEFAULT_MIN_DELAY,
            max_delay: DEFAULT_MAX_DELAY,
            log_wait_attempts: false,
            acceptors: Vec::new(),
            retryable: None,
            extractor: Arc::new(JsonPointer),
        }
    }

    /// Sets the minimum backoff between attempts.
    #[must_use]
    pub fn min_delay(mut self, min_delay: Duration) -> Self {
        self.min_delay = min_delay;
        self
    }

    /// Sets the maximum backoff between attempts.
    #[must_use]
    pub fn max_delay(mut self, max_delay: Duration) -> Self {
        self.max_delay = max_delay;
        self
    }

    /// Enables a debug log event per attempt.
    #[must_use]
    pub fn log_wait_attempts(mut self, enabled: bool) -> Self {
        self.log_wait_attempts = enabled;
        self
    }

    /// Appends an acceptor. Acceptors are evaluated in the order added.
    #[must_use]
    pub fn acceptor(mut self, acceptor: Acceptor) -> Self {
        self.acceptors.push(acceptor);
        self
    }

    /// Replaces the acceptor list.
    #[must_use]
    pub fn acceptors(mut self, acceptors: Vec<Acceptor>) -> Self {
        self.acceptors = acceptors;
        self
    }

    /// Overrides the acceptor-driven retry decision.
    #[must_use]
    pub fn retryable(
        mut self,
        retryable: impl Fn(&Context, &I, &Result<O, E>) -> Result<bool, WaiterError>
            + Send
            + Sync
            + 'static,
    ) -> Self {
        self.retryable = Some(Arc::new(retryable));
        self
    }

    /// Replaces the path extractor used by path-based acceptors.
    #[must_use]
    pub fn path_extractor(mut self, extractor: Arc<dyn PathExtractor>) -> Self {
        self.extractor = extractor;
        self
    }
}

impl<I, O, E> Default for WaiterOptions<I, O, E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<I, O, E> Clone for WaiterOptions<I, O, E> {
    fn clone(&self) -> Self {
        Self {
            min_delay: self.min_delay,
            max_delay: self.max_delay,
            log_wait_attempts: self.log_wait_attempts,
            acceptors: self.acceptors.clone(),
            retryable: self.retryable.clone(),
            extractor: self.extractor.clone(),
        }
    }
}

/// Re-invokes an operation until an acceptor reaches a terminal state or
/// the wait budget runs out.
///
/// # Example
///
/// ```ignore
/// let waiter = Waiter::new(
///     GetFleetOperation::new(client),
///     WaiterOptions::new()
///         .acceptor(Acceptor::output_path(
///             "/state", "ready", PathComparator::StringEquals, AcceptorState::Success,
///         ))
///         .acceptor(Acceptor::error_type("NotFound", AcceptorState::Retry)),
/// );
///
/// waiter.wait(&mut cx, input, Duration::from_secs(300)).await?;
/// ```
pub struct Waiter<I, Op>
where
    Op: Operation<I>,
{
    operation: Op,
    options: WaiterOptions<I, Op::Output, Op::Error>,
}

impl<I, Op> Waiter<I, Op>
where
    I: Serialize + Send + Sync,
    Op: Operation<I>,
{
    /// Creates a waiter around an operation.
    #[must_use]
    pub fn new(operation: Op, options: WaiterOptions<I, Op::Output, Op::Error>) -> Self {
        Self { operation, options }
    }

    /// Returns the base options.
    #[must_use]
    pub fn options(&self) -> &WaiterOptions<I, Op::Output, Op::Error> {
        &self.options
    }

    /// Polls the operation until a terminal state, with no per-call
    /// overrides.
    ///
    /// # Errors
    ///
    /// See [`Self::wait_with`].
    pub async fn wait(
        &self,
        cx: &mut Context,
        input: I,
        max_wait: Duration,
    ) -> Result<(), WaiterError> {
        self.wait_with(cx, input, max_wait, Vec::new()).await
    }

    /// Polls the operation until a terminal state, applying per-call option
    /// overrides onto a clone of the base options first.
    ///
    /// The wait budget `max_wait` must be positive. The budget is tracked
    /// as remaining time: each backoff delay is deducted *before* sleeping,
    /// so a sleep cut short by the deadline still reports correctly elapsed
    /// time, and the loop terminates by construction once the budget
    /// reaches zero.
    ///
    /// # Errors
    ///
    /// - [`WaiterError::InvalidMaxWaitTime`] for a zero budget
    /// - [`WaiterError::ExceededMaxWait`] when the budget is exhausted
    /// - [`WaiterError::Cancelled`] when the deadline interrupts a sleep
    /// - [`WaiterError::FailureState`] / [`WaiterError::Evaluation`] from
    ///   acceptor evaluation, and whatever the retry predicate returns
    pub async fn wait_with(
        &self,
        cx: &mut Context,
        input: I,
        max_wait: Duration,
        overrides: Vec<OptionOverride<I, Op::Output, Op::Error>>,
    ) -> Result<(), WaiterError> {
        if max_wait.is_zero() {
            return Err(WaiterError::InvalidMaxWaitTime);
        }

        let mut options = self.options.clone();
        for apply in overrides {
            apply(&mut options);
        }

        let mut attempt: u32 = 0;
        let mut remaining = max_wait;
        let deadline = Instant::now() + max_wait;

        loop {
            if remaining.is_zero() {
                return Err(WaiterError::ExceededMaxWait);
            }

            if attempt > 0 {
                let delay =
                    compute_delay(options.min_delay, options.max_delay, remaining, attempt)?;

                // Deducted before sleeping: a cancelled sleep must not make
                // the budget look healthier than the wall clock.
                remaining = remaining.saturating_sub(delay);

                if tokio::time::timeout_at(deadline, tokio::time::sleep(delay))
                    .await
                    .is_err()
                {
                    return Err(WaiterError::Cancelled);
                }
            }

            if options.log_wait_attempts {
                tracing::debug!(
                    invocation = %cx.invocation_id(),
                    attempt = attempt + 1,
                    "attempting waiter request"
                );
            }

            let result = self.operation.call(cx, &input).await;

            let retryable = match &options.retryable {
                Some(predicate) => predicate(cx, &input, &result)?,
                None => evaluate(&options.acceptors, options.extractor.as_ref(), &input, &result)?,
            };

            if !retryable {
                return Ok(());
            }
            attempt += 1;
        }
    }
}
