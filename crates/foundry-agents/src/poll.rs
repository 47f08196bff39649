//! Run-lifecycle polling.
//!
//! A run is submitted once and then observed until it reaches a terminal status.
//! Every bound is explicit: the poll interval, the number of status checks, the
//! overall deadline, and the retry budget for a single failing status check.

use async_trait::async_trait;
use backoff::ExponentialBackoff;
use std::time::Duration;
use tokio::time::Instant;

use crate::error::{AgentsError, Result};
use crate::models::{Run, RunStatus};

/// Where the poller reads run state from
#[async_trait]
pub trait RunStatusSource: Send + Sync {
    async fn fetch_run(&self, thread_id: &str, run_id: &str) -> Result<Run>;

    async fn cancel_run(&self, thread_id: &str, run_id: &str) -> Result<Run>;
}

#[derive(Debug, Clone)]
pub struct PollConfig {
    /// Pause between status checks
    pub interval: Duration,
    /// Status checks allowed before giving up
    pub max_attempts: u32,
    /// Deadline measured from the first check
    pub timeout: Duration,
    /// Retry budget for one status check failing transiently
    pub retry: RetryPolicy,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(1),
            max_attempts: 600,
            timeout: Duration::from_secs(600),
            retry: RetryPolicy::default(),
        }
    }
}

impl PollConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }
}

/// Exponential backoff for transient status-check failures
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub initial_interval: Duration,
    pub max_interval: Duration,
    pub multiplier: f64,
    /// Total time spent retrying one check; zero disables retries
    pub max_elapsed: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            initial_interval: Duration::from_millis(500),
            max_interval: Duration::from_secs(10),
            multiplier: 2.0,
            max_elapsed: Duration::from_secs(60),
        }
    }
}

impl RetryPolicy {
    pub fn none() -> Self {
        Self {
            max_elapsed: Duration::ZERO,
            ..Self::default()
        }
    }

    fn to_backoff(&self) -> ExponentialBackoff {
        ExponentialBackoff {
            initial_interval: self.initial_interval,
            max_interval: self.max_interval,
            multiplier: self.multiplier,
            max_elapsed_time: Some(self.max_elapsed),
            randomization_factor: 0.1,
            ..Default::default()
        }
    }
}

/// Run `op` again while it fails transiently and the policy has budget left
async fn with_retry<F, Fut, T>(policy: &RetryPolicy, what: &str, mut op: F) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = Result<T>>,
{
    if policy.max_elapsed.is_zero() {
        return op().await;
    }

    let operation = move || {
        let fut = op();
        async move {
            fut.await.map_err(|e| {
                if e.is_transient() {
                    backoff::Error::transient(e)
                } else {
                    backoff::Error::permanent(e)
                }
            })
        }
    };

    backoff::future::retry_notify(policy.to_backoff(), operation, |err: AgentsError, wait: Duration| {
        tracing::warn!("{} failed ({}), retrying in {:?}", what, err, wait);
    })
    .await
}

/// Await `op`, giving up with `PollTimeout` once the poll's deadline passes
async fn before_deadline<Fut>(started: Instant, config: &PollConfig, run_id: &str, op: Fut) -> Result<Run>
where
    Fut: std::future::Future<Output = Result<Run>>,
{
    let remaining = config.timeout.saturating_sub(started.elapsed());
    match tokio::time::timeout(remaining, op).await {
        Ok(result) => result,
        Err(_) => Err(AgentsError::PollTimeout {
            run_id: run_id.to_string(),
            elapsed: started.elapsed(),
        }),
    }
}

/// Observe `run` until it reaches a terminal status.
///
/// The timeout covers retries too: a status check still failing transiently
/// when the deadline passes ends the poll with `PollTimeout`.
///
/// A run that stops in `requires_action` is cancelled, since no client-side tool
/// handlers are registered; polling then continues until the cancellation lands.
pub async fn poll_run<S>(source: &S, run: Run, config: &PollConfig) -> Result<Run>
where
    S: RunStatusSource + ?Sized,
{
    let started = Instant::now();
    let thread_id = run.thread_id.clone();
    let run_id = run.id.clone();
    let mut run = run;
    let mut attempts = 0u32;
    let mut cancel_requested = false;

    loop {
        if run.status.is_terminal() {
            tracing::debug!(run_id = %run_id, attempts, "Run reached {}", run.status);
            return Ok(run);
        }

        if run.status == RunStatus::RequiresAction && !cancel_requested {
            tracing::warn!(run_id = %run_id, "Run requires action but no tool handlers are registered; cancelling");
            let cancel = with_retry(&config.retry, "Cancel run", || source.cancel_run(&thread_id, &run_id));
            run = before_deadline(started, config, &run_id, cancel).await?;
            cancel_requested = true;
            continue;
        }

        if attempts >= config.max_attempts {
            return Err(AgentsError::PollAttemptsExhausted { run_id, attempts });
        }

        let elapsed = started.elapsed();
        if elapsed >= config.timeout {
            return Err(AgentsError::PollTimeout { run_id, elapsed });
        }

        tokio::time::sleep(config.interval.min(config.timeout - elapsed)).await;
        attempts += 1;

        let previous = run.status;
        let fetch = with_retry(&config.retry, "Fetch run status", || source.fetch_run(&thread_id, &run_id));
        run = before_deadline(started, config, &run_id, fetch).await?;

        if run.status != previous {
            tracing::info!(run_id = %run_id, "Run status: {} -> {}", previous, run.status);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::RunError;
    use serde_json::json;
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Mutex;

    fn run_with(status: &str) -> Run {
        serde_json::from_value(json!({
            "id": "run_1",
            "thread_id": "thread_1",
            "assistant_id": "asst_1",
            "status": status,
            "created_at": 1700000000
        }))
        .unwrap()
    }

    /// Replays scripted responses; reports `in_progress` once the script runs out
    struct ScriptedSource {
        script: Mutex<VecDeque<Result<Run>>>,
        fetches: AtomicU32,
        cancels: AtomicU32,
    }

    impl ScriptedSource {
        fn new(script: Vec<Result<Run>>) -> Self {
            Self {
                script: Mutex::new(script.into()),
                fetches: AtomicU32::new(0),
                cancels: AtomicU32::new(0),
            }
        }

        fn next(&self) -> Result<Run> {
            self.script
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Ok(run_with("in_progress")))
        }
    }

    #[async_trait]
    impl RunStatusSource for ScriptedSource {
        async fn fetch_run(&self, _thread_id: &str, _run_id: &str) -> Result<Run> {
            self.fetches.fetch_add(1, Ordering::SeqCst);
            self.next()
        }

        async fn cancel_run(&self, _thread_id: &str, _run_id: &str) -> Result<Run> {
            self.cancels.fetch_add(1, Ordering::SeqCst);
            Ok(run_with("cancelling"))
        }
    }

    struct UnavailableSource {
        fetches: AtomicU32,
    }

    #[async_trait]
    impl RunStatusSource for UnavailableSource {
        async fn fetch_run(&self, _thread_id: &str, _run_id: &str) -> Result<Run> {
            self.fetches.fetch_add(1, Ordering::SeqCst);
            Err(AgentsError::Api { status: 503, message: "busy".into() })
        }

        async fn cancel_run(&self, _thread_id: &str, _run_id: &str) -> Result<Run> {
            Err(AgentsError::Api { status: 503, message: "busy".into() })
        }
    }

    fn fast() -> PollConfig {
        PollConfig::new()
            .with_interval(Duration::from_millis(1))
            .with_retry(RetryPolicy {
                initial_interval: Duration::from_millis(1),
                max_interval: Duration::from_millis(5),
                multiplier: 2.0,
                max_elapsed: Duration::from_secs(1),
            })
    }

    #[tokio::test]
    async fn test_returns_on_first_terminal_status() {
        let source = ScriptedSource::new(vec![
            Ok(run_with("in_progress")),
            Ok(run_with("in_progress")),
            Ok(run_with("completed")),
            Ok(run_with("in_progress")),
        ]);

        let run = poll_run(&source, run_with("queued"), &fast()).await.unwrap();

        assert_eq!(run.status, RunStatus::Completed);
        assert_eq!(source.fetches.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_already_terminal_run_is_not_fetched() {
        let source = ScriptedSource::new(vec![]);
        let run = poll_run(&source, run_with("expired"), &fast()).await.unwrap();

        assert_eq!(run.status, RunStatus::Expired);
        assert_eq!(source.fetches.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_failed_run_keeps_last_error() {
        let mut failed = run_with("failed");
        failed.last_error = Some(RunError {
            code: "server_error".into(),
            message: "Sorry, something went wrong.".into(),
        });
        let source = ScriptedSource::new(vec![Ok(failed)]);

        let run = poll_run(&source, run_with("queued"), &fast()).await.unwrap();

        assert_eq!(run.status, RunStatus::Failed);
        assert_eq!(run.last_error.unwrap().code, "server_error");
    }

    #[tokio::test]
    async fn test_attempts_are_bounded() {
        let source = ScriptedSource::new(vec![]);
        let config = fast().with_max_attempts(4);

        let err = poll_run(&source, run_with("queued"), &config).await.unwrap_err();

        assert!(matches!(err, AgentsError::PollAttemptsExhausted { attempts: 4, .. }));
        assert_eq!(source.fetches.load(Ordering::SeqCst), 4);
    }

    #[tokio::test]
    async fn test_timeout_is_bounded() {
        let source = ScriptedSource::new(vec![]);
        let config = fast()
            .with_interval(Duration::from_millis(10))
            .with_timeout(Duration::from_millis(50));

        let err = poll_run(&source, run_with("in_progress"), &config).await.unwrap_err();

        match err {
            AgentsError::PollTimeout { run_id, elapsed } => {
                assert_eq!(run_id, "run_1");
                assert!(elapsed >= Duration::from_millis(50));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_requires_action_is_cancelled_once() {
        let source = ScriptedSource::new(vec![
            Ok(run_with("requires_action")),
            Ok(run_with("cancelling")),
            Ok(run_with("cancelled")),
        ]);

        let run = poll_run(&source, run_with("queued"), &fast()).await.unwrap();

        assert_eq!(run.status, RunStatus::Cancelled);
        assert_eq!(source.cancels.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_transient_failure_is_retried() {
        let source = ScriptedSource::new(vec![
            Err(AgentsError::Api { status: 503, message: "busy".into() }),
            Err(AgentsError::Api { status: 429, message: "throttled".into() }),
            Ok(run_with("completed")),
        ]);

        let run = poll_run(&source, run_with("queued"), &fast()).await.unwrap();

        assert_eq!(run.status, RunStatus::Completed);
        assert_eq!(source.fetches.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_permanent_failure_is_not_retried() {
        let source = ScriptedSource::new(vec![
            Err(AgentsError::Api { status: 400, message: "bad run id".into() }),
            Ok(run_with("completed")),
        ]);

        let err = poll_run(&source, run_with("queued"), &fast()).await.unwrap_err();

        assert!(matches!(err, AgentsError::Api { status: 400, .. }));
        assert_eq!(source.fetches.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_no_retry_policy_gives_up_immediately() {
        let source = ScriptedSource::new(vec![
            Err(AgentsError::Api { status: 503, message: "busy".into() }),
            Ok(run_with("completed")),
        ]);
        let config = fast().with_retry(RetryPolicy::none());

        let err = poll_run(&source, run_with("queued"), &config).await.unwrap_err();

        assert!(matches!(err, AgentsError::Api { status: 503, .. }));
    }

    #[tokio::test]
    async fn test_timeout_cuts_retries_short() {
        let source = UnavailableSource { fetches: AtomicU32::new(0) };
        let config = PollConfig::new()
            .with_interval(Duration::from_millis(10))
            .with_timeout(Duration::from_millis(100))
            .with_retry(RetryPolicy {
                initial_interval: Duration::from_millis(5),
                max_interval: Duration::from_millis(20),
                multiplier: 2.0,
                max_elapsed: Duration::from_secs(3),
            });

        let started = std::time::Instant::now();
        let err = poll_run(&source, run_with("in_progress"), &config).await.unwrap_err();

        assert!(matches!(err, AgentsError::PollTimeout { .. }), "unexpected error: {err}");
        assert!(started.elapsed() < Duration::from_secs(1));
        assert!(source.fetches.load(Ordering::SeqCst) >= 2);
    }
}
