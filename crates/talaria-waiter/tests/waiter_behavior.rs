//! Waiter loop behavior tests.
//!
//! All timing runs under tokio's paused test clock, so backoff sleeps are
//! instantaneous and the elapsed-time assertions are exact.

use serde::Serialize;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use talaria_core::{ApiError, BoxFuture, Context};
use talaria_waiter::{
    Acceptor, AcceptorState, Operation, PathComparator, Waiter, WaiterError, WaiterOptions,
};

#[derive(Debug, Serialize)]
struct DescribeFleetInput {
    name: &'static str,
}

#[derive(Debug, Serialize)]
struct DescribeFleetOutput {
    state: &'static str,
}

#[derive(Debug, thiserror::Error)]
#[error("fleet api error: {code}")]
struct FleetError {
    code: &'static str,
}

impl ApiError for FleetError {
    fn error_code(&self) -> Option<&str> {
        Some(self.code)
    }
}

/// Returns the same state on every call, counting attempts through a
/// shared counter the test keeps hold of.
struct FixedState {
    state: &'static str,
    calls: Arc<AtomicUsize>,
}

impl Operation<DescribeFleetInput> for FixedState {
    type Output = DescribeFleetOutput;
    type Error = FleetError;

    fn call<'a>(
        &'a self,
        _cx: &'a mut Context,
        _input: &'a DescribeFleetInput,
    ) -> BoxFuture<'a, Result<DescribeFleetOutput, FleetError>> {
        Box::pin(async move {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(DescribeFleetOutput { state: self.state })
        })
    }
}

/// Fails with `NotFound` for the first `failures` calls, then succeeds.
struct EventuallyCreated {
    failures: usize,
    calls: Arc<AtomicUsize>,
}

impl Operation<DescribeFleetInput> for EventuallyCreated {
    type Output = DescribeFleetOutput;
    type Error = FleetError;

    fn call<'a>(
        &'a self,
        _cx: &'a mut Context,
        _input: &'a DescribeFleetInput,
    ) -> BoxFuture<'a, Result<DescribeFleetOutput, FleetError>> {
        Box::pin(async move {
            let attempt = self.calls.fetch_add(1, Ordering::SeqCst);
            if attempt < self.failures {
                Err(FleetError { code: "NotFound" })
            } else {
                Ok(DescribeFleetOutput { state: "ready" })
            }
        })
    }
}

/// Burns wall-clock time on every call before reporting a pending state.
struct SlowPending {
    per_call: Duration,
    calls: Arc<AtomicUsize>,
}

impl Operation<DescribeFleetInput> for SlowPending {
    type Output = DescribeFleetOutput;
    type Error = FleetError;

    fn call<'a>(
        &'a self,
        _cx: &'a mut Context,
        _input: &'a DescribeFleetInput,
    ) -> BoxFuture<'a, Result<DescribeFleetOutput, FleetError>> {
        Box::pin(async move {
            self.calls.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(self.per_call).await;
            Ok(DescribeFleetOutput { state: "pending" })
        })
    }
}

fn ready_acceptors() -> Vec<Acceptor> {
    vec![Acceptor::output_path(
        "/state",
        "ready",
        PathComparator::StringEquals,
        AcceptorState::Success,
    )]
}

fn slow_options() -> WaiterOptions<DescribeFleetInput, DescribeFleetOutput, FleetError> {
    WaiterOptions::new()
        .min_delay(Duration::from_secs(2))
        .max_delay(Duration::from_secs(120))
        .acceptors(ready_acceptors())
}

fn input() -> DescribeFleetInput {
    DescribeFleetInput { name: "fleet-1" }
}

#[tokio::test(start_paused = true)]
async fn test_exhausted_budget_times_out_exactly() {
    let calls = Arc::new(AtomicUsize::new(0));
    let waiter = Waiter::new(
        FixedState {
            state: "pending",
            calls: calls.clone(),
        },
        slow_options(),
    );

    let start = tokio::time::Instant::now();
    let mut cx = Context::new();
    let err = waiter
        .wait(&mut cx, input(), Duration::from_secs(10))
        .await
        .unwrap_err();

    assert!(err.is_timeout(), "expected timeout, got {err:?}");
    // The backoff bookkeeping spends the wait budget exactly: every delay
    // is capped by the remaining time and the final delay drains it.
    assert_eq!(start.elapsed(), Duration::from_secs(10));

    // First attempt sleeps nothing; every later delay is at least the 2s
    // minimum, so a 10s budget bounds the attempt count.
    let attempts = calls.load(Ordering::SeqCst);
    assert!(attempts >= 2, "expected multiple attempts, got {attempts}");
    assert!(attempts <= 6, "expected at most 6 attempts, got {attempts}");
}

#[tokio::test(start_paused = true)]
async fn test_retry_on_not_found_until_created() {
    let calls = Arc::new(AtomicUsize::new(0));
    let waiter = Waiter::new(
        EventuallyCreated {
            failures: 3,
            calls: calls.clone(),
        },
        WaiterOptions::new()
            .min_delay(Duration::from_secs(2))
            .max_delay(Duration::from_secs(120))
            .acceptor(Acceptor::error_type("NotFound", AcceptorState::Retry))
            .acceptor(Acceptor::success(AcceptorState::Success)),
    );

    let mut cx = Context::new();
    waiter
        .wait(&mut cx, input(), Duration::from_secs(300))
        .await
        .unwrap();

    // Three NotFound attempts swallowed by the Retry acceptor, then one
    // success.
    assert_eq!(calls.load(Ordering::SeqCst), 4);
}

#[tokio::test(start_paused = true)]
async fn test_failure_acceptor_is_terminal() {
    let calls = Arc::new(AtomicUsize::new(0));
    let waiter = Waiter::new(
        FixedState {
            state: "terminated",
            calls: calls.clone(),
        },
        WaiterOptions::new().acceptor(Acceptor::output_path(
            "/state",
            "terminated",
            PathComparator::StringEquals,
            AcceptorState::Failure,
        )),
    );

    let mut cx = Context::new();
    let err = waiter
        .wait(&mut cx, input(), Duration::from_secs(300))
        .await
        .unwrap_err();

    assert!(matches!(err, WaiterError::FailureState { .. }));
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[tokio::test(start_paused = true)]
async fn test_retryable_override_replaces_acceptors() {
    // The base acceptors would retry forever on success.
    let calls = Arc::new(AtomicUsize::new(0));
    let waiter = Waiter::new(
        FixedState {
            state: "pending",
            calls: calls.clone(),
        },
        WaiterOptions::new().acceptor(Acceptor::success(AcceptorState::Retry)),
    );

    let mut cx = Context::new();
    waiter
        .wait_with(
            &mut cx,
            input(),
            Duration::from_secs(10),
            vec![Box::new(
                |options: &mut WaiterOptions<DescribeFleetInput, DescribeFleetOutput, FleetError>| {
                    *options = options
                        .clone()
                        .retryable(|_cx, _input, result| Ok(result.is_err()));
                },
            )],
        )
        .await
        .unwrap();

    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[tokio::test(start_paused = true)]
async fn test_deadline_cuts_sleep_short_as_cancellation() {
    // Each attempt burns 6s of wall clock that the remaining-time
    // bookkeeping never sees, so the deadline fires during a backoff sleep.
    let calls = Arc::new(AtomicUsize::new(0));
    let waiter = Waiter::new(
        SlowPending {
            per_call: Duration::from_secs(6),
            calls: calls.clone(),
        },
        slow_options(),
    );

    let mut cx = Context::new();
    let err = waiter
        .wait(&mut cx, input(), Duration::from_secs(10))
        .await
        .unwrap_err();

    assert!(err.is_cancelled(), "expected cancellation, got {err:?}");
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_zero_max_wait_rejected_before_any_attempt() {
    let calls = Arc::new(AtomicUsize::new(0));
    let waiter = Waiter::new(
        FixedState {
            state: "ready",
            calls: calls.clone(),
        },
        WaiterOptions::new().acceptors(ready_acceptors()),
    );

    let mut cx = Context::new();
    let err = waiter
        .wait(&mut cx, input(), Duration::ZERO)
        .await
        .unwrap_err();

    assert!(matches!(err, WaiterError::InvalidMaxWaitTime));
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}
