//! Paginated fetcher
//!
//! Walks a [`WindowPlan`] strictly sequentially, one request per window,
//! with bounded retry per window and the empty-run stop heuristic.

use super::source::{RecordSink, RecordSource};
use crate::config::RetryConfig;
use crate::core::package::is_empty_payload;
use crate::core::plan::{Window, WindowPlan};
use crate::domain::{DataType, ExportError, FetchRequest, Result, SourceError};
use crate::log_retry_attempt;
use crate::logging::ProgressReporter;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;

/// Retry policy applied to every request of a run
#[derive(Debug, Clone, PartialEq)]
pub struct FetchPolicy {
    /// Consecutive failures tolerated for one window; reaching it fails the run
    pub max_retries: u32,

    /// Delay before the first retry
    pub initial_delay: Duration,

    /// Upper bound on any single delay
    pub max_delay: Duration,

    /// Growth factor between consecutive delays
    pub backoff_multiplier: f64,
}

impl FetchPolicy {
    /// Build a policy from the `[source.retry]` section
    pub fn from_config(config: &RetryConfig) -> Self {
        Self {
            max_retries: config.max_retries,
            initial_delay: Duration::from_millis(config.initial_delay_ms),
            max_delay: Duration::from_millis(config.max_delay_ms),
            backoff_multiplier: config.backoff_multiplier,
        }
    }

    /// Policy that retries without sleeping
    pub fn immediate(max_retries: u32) -> Self {
        Self {
            max_retries,
            initial_delay: Duration::ZERO,
            max_delay: Duration::ZERO,
            backoff_multiplier: 1.0,
        }
    }

    /// Delay before retry number `attempt` (1-based)
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1) as i32;
        let millis = self.initial_delay.as_millis() as f64 * self.backoff_multiplier.powi(exponent);
        let capped = millis.min(self.max_delay.as_millis() as f64);
        Duration::from_millis(capped.max(0.0) as u64)
    }
}

impl Default for FetchPolicy {
    fn default() -> Self {
        Self::from_config(&RetryConfig::default())
    }
}

/// Mutable state of one run, owned by the fetcher
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FetchState {
    /// Consecutive windows that returned no records
    pub empty_run_count: u32,

    /// Consecutive failures of the current request
    pub retry_count: u32,

    /// Records handed to the sink so far
    pub records_so_far: u64,

    /// Windows answered successfully
    pub windows_fetched: u64,
}

/// Why a fetch stopped without error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Termination {
    /// The floor-clamped final window was processed
    FloorReached,
    /// Too many consecutive empty windows
    EmptyRunExhausted,
    /// A non-paginated collection was fetched in one request
    SingleRequest,
    /// The cancellation signal fired between windows
    Cancelled,
}

/// Result of a completed or cancelled fetch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchOutcome {
    /// How the fetch ended
    pub termination: Termination,

    /// Records emitted to the sink
    pub records: u64,

    /// Windows answered successfully
    pub windows: u64,
}

impl FetchOutcome {
    fn from_state(termination: Termination, state: &FetchState) -> Self {
        Self {
            termination,
            records: state.records_so_far,
            windows: state.windows_fetched,
        }
    }

    /// Whether the fetch was cut short by the cancellation signal
    pub fn is_cancelled(&self) -> bool {
        self.termination == Termination::Cancelled
    }
}

/// Fetches one collection window by window and streams records to a sink
pub struct PaginatedFetcher {
    source: Arc<dyn RecordSource>,
    reporter: Arc<dyn ProgressReporter>,
    policy: FetchPolicy,
    cancel: Option<watch::Receiver<bool>>,
}

impl PaginatedFetcher {
    /// Create a fetcher over `source`
    pub fn new(
        source: Arc<dyn RecordSource>,
        reporter: Arc<dyn ProgressReporter>,
        policy: FetchPolicy,
    ) -> Self {
        Self {
            source,
            reporter,
            policy,
            cancel: None,
        }
    }

    /// Check `signal` between windows and stop with [`Termination::Cancelled`] once it is set
    pub fn with_cancellation(mut self, signal: watch::Receiver<bool>) -> Self {
        self.cancel = Some(signal);
        self
    }

    /// Fetch every record of `request` into `sink`
    ///
    /// # Errors
    ///
    /// Returns [`ExportError::FetchExhausted`] when a window keeps failing,
    /// [`ExportError::Source`] for non-retryable source errors, and any
    /// error raised by the sink.
    pub async fn fetch<K>(&self, request: &FetchRequest, sink: &mut K) -> Result<FetchOutcome>
    where
        K: RecordSink + ?Sized,
    {
        if request.data_type.is_paginated() {
            self.fetch_windows(request, sink).await
        } else {
            self.fetch_single(request.data_type, sink).await
        }
    }

    async fn fetch_windows<K>(&self, request: &FetchRequest, sink: &mut K) -> Result<FetchOutcome>
    where
        K: RecordSink + ?Sized,
    {
        let data_type = request.data_type;
        let threshold = data_type.empty_run_threshold().unwrap_or(u32::MAX);
        let plan = WindowPlan::for_request(request)?;
        let mut state = FetchState::default();

        tracing::debug!(
            data_type = %data_type,
            floor = %plan.floor().to_rfc3339(),
            ceiling = %plan.ceiling().to_rfc3339(),
            "Planned windows"
        );

        for window in plan {
            if self.is_cancelled() {
                tracing::info!(data_type = %data_type, window = %window, "Fetch cancelled");
                return Ok(FetchOutcome::from_state(Termination::Cancelled, &state));
            }

            self.reporter.update(&format!(
                "Querying {} from {} to {}...",
                data_type,
                window.start.to_rfc3339(),
                window.end.to_rfc3339()
            ));

            let records = self.fetch_window(data_type, &window, &mut state).await?;
            state.windows_fetched += 1;

            if records.is_empty() {
                state.empty_run_count += 1;
                if state.empty_run_count > threshold {
                    tracing::info!(
                        data_type = %data_type,
                        empty_windows = state.empty_run_count,
                        "No data in recent windows, stopping early"
                    );
                    return Ok(FetchOutcome::from_state(
                        Termination::EmptyRunExhausted,
                        &state,
                    ));
                }
                continue;
            }

            state.empty_run_count = 0;
            for record in records {
                sink.accept(record)?;
                state.records_so_far += 1;
            }
        }

        Ok(FetchOutcome::from_state(Termination::FloorReached, &state))
    }

    async fn fetch_single<K>(&self, data_type: DataType, sink: &mut K) -> Result<FetchOutcome>
    where
        K: RecordSink + ?Sized,
    {
        let mut state = FetchState::default();
        self.reporter.update(&format!("Querying {data_type}..."));

        let source = &self.source;
        let payload = self
            .with_retry(data_type, data_type.as_str(), &mut state, || {
                source.fetch_single(data_type)
            })
            .await?;

        state.windows_fetched = 1;
        state.records_so_far = u64::from(!is_empty_payload(&payload));
        sink.accept(payload)?;

        Ok(FetchOutcome::from_state(Termination::SingleRequest, &state))
    }

    async fn fetch_window(
        &self,
        data_type: DataType,
        window: &Window,
        state: &mut FetchState,
    ) -> Result<Vec<serde_json::Value>> {
        let label = window.to_string();
        let source = &self.source;
        self.with_retry(data_type, &label, state, || source.fetch_window(data_type, window))
            .await
    }

    /// Run `operation` until it succeeds, fails non-retryably or runs out of retries
    async fn with_retry<T, F, Fut>(
        &self,
        data_type: DataType,
        label: &str,
        state: &mut FetchState,
        operation: F,
    ) -> Result<T>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = std::result::Result<T, SourceError>>,
    {
        loop {
            match operation().await {
                Ok(value) => {
                    state.retry_count = 0;
                    return Ok(value);
                }
                Err(e) if !e.is_retryable() => return Err(ExportError::Source(e)),
                Err(e) => {
                    state.retry_count += 1;
                    if state.retry_count >= self.policy.max_retries {
                        return Err(ExportError::FetchExhausted {
                            data_type,
                            window: label.to_string(),
                            attempts: state.retry_count,
                            last_error: e,
                        });
                    }

                    log_retry_attempt!(state.retry_count, self.policy.max_retries, e);

                    let delay = self.policy.delay_for(state.retry_count);
                    if !delay.is_zero() {
                        tokio::time::sleep(delay).await;
                    }
                }
            }
        }
    }

    fn is_cancelled(&self) -> bool {
        self.cancel
            .as_ref()
            .map(|signal| *signal.borrow())
            .unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logging::MemoryReporter;
    use async_trait::async_trait;
    use chrono::{DateTime, TimeZone, Utc};
    use serde_json::{json, Value};
    use std::collections::VecDeque;
    use std::sync::Mutex;

    type Scripted = std::result::Result<Vec<Value>, SourceError>;

    /// Source replaying scripted window responses; empty once the script runs out
    struct ScriptedSource {
        responses: Mutex<VecDeque<Scripted>>,
        calls: Mutex<Vec<Window>>,
    }

    impl ScriptedSource {
        fn new(responses: Vec<Scripted>) -> Self {
            Self {
                responses: Mutex::new(responses.into()),
                calls: Mutex::new(Vec::new()),
            }
        }

        fn calls(&self) -> Vec<Window> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl RecordSource for ScriptedSource {
        async fn fetch_window(
            &self,
            _data_type: DataType,
            window: &Window,
        ) -> std::result::Result<Vec<Value>, SourceError> {
            self.calls.lock().unwrap().push(*window);
            self.responses
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Ok(Vec::new()))
        }

        async fn fetch_single(
            &self,
            _data_type: DataType,
        ) -> std::result::Result<Value, SourceError> {
            match self.responses.lock().unwrap().pop_front() {
                Some(Ok(mut records)) => Ok(records.pop().unwrap_or(Value::Null)),
                Some(Err(e)) => Err(e),
                None => Ok(Value::Null),
            }
        }

        fn base_url(&self) -> &str {
            "https://ns.example.com"
        }
    }

    fn date(y: i32, m: u32, d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, 0, 0, 0).unwrap()
    }

    fn server_error() -> Scripted {
        Err(SourceError::TransientHttp {
            status: 500,
            message: "Internal Server Error".to_string(),
        })
    }

    fn fetcher(source: Arc<ScriptedSource>) -> (PaginatedFetcher, Arc<MemoryReporter>) {
        let reporter = Arc::new(MemoryReporter::new());
        let fetcher = PaginatedFetcher::new(source, reporter.clone(), FetchPolicy::immediate(4));
        (fetcher, reporter)
    }

    fn request(data_type: DataType, after: Option<DateTime<Utc>>) -> FetchRequest {
        FetchRequest::new(data_type, "https://ns.example.com", date(2020, 1, 10), after).unwrap()
    }

    #[tokio::test]
    async fn test_three_failures_then_success() {
        let source = Arc::new(ScriptedSource::new(vec![
            server_error(),
            server_error(),
            server_error(),
            Ok(vec![json!({"sgv": 120}), json!({"sgv": 118})]),
        ]));
        let (fetcher, _) = fetcher(source.clone());
        let mut sink: Vec<Value> = Vec::new();

        let outcome = fetcher
            .fetch(&request(DataType::Entries, Some(date(2020, 1, 1))), &mut sink)
            .await
            .unwrap();

        assert_eq!(outcome.termination, Termination::FloorReached);
        assert_eq!(outcome.records, 2);
        assert_eq!(sink.len(), 2);
        // all four attempts target the same window
        let calls = source.calls();
        assert_eq!(calls.len(), 4);
        assert!(calls.iter().all(|w| *w == calls[0]));
    }

    #[tokio::test]
    async fn test_four_failures_exhaust_the_window() {
        let source = Arc::new(ScriptedSource::new(vec![
            server_error(),
            server_error(),
            server_error(),
            server_error(),
            Ok(vec![json!({"sgv": 120})]),
        ]));
        let (fetcher, _) = fetcher(source.clone());
        let mut sink: Vec<Value> = Vec::new();

        let err = fetcher
            .fetch(&request(DataType::Entries, Some(date(2020, 1, 1))), &mut sink)
            .await
            .unwrap_err();

        match err {
            ExportError::FetchExhausted {
                data_type,
                attempts,
                ..
            } => {
                assert_eq!(data_type, DataType::Entries);
                assert_eq!(attempts, 4);
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(source.calls().len(), 4);
        assert!(sink.is_empty());
    }

    #[tokio::test]
    async fn test_retry_count_resets_between_windows() {
        // three failures on each of two windows never reaches four in a row
        let source = Arc::new(ScriptedSource::new(vec![
            server_error(),
            server_error(),
            server_error(),
            Ok(vec![json!({"a": 1})]),
            server_error(),
            server_error(),
            server_error(),
            Ok(vec![json!({"a": 2})]),
        ]));
        let (fetcher, _) = fetcher(source.clone());
        let mut sink: Vec<Value> = Vec::new();

        let outcome = fetcher
            .fetch(&request(DataType::DeviceStatus, Some(date(2020, 1, 1))), &mut sink)
            .await
            .unwrap();

        assert_eq!(outcome.records, 2);
        assert_eq!(outcome.windows, 5);
    }

    #[tokio::test]
    async fn test_malformed_response_is_not_retried() {
        let source = Arc::new(ScriptedSource::new(vec![Err(
            SourceError::MalformedResponse("expected value at line 1".to_string()),
        )]));
        let (fetcher, _) = fetcher(source.clone());
        let mut sink: Vec<Value> = Vec::new();

        let err = fetcher
            .fetch(&request(DataType::Treatments, None), &mut sink)
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            ExportError::Source(SourceError::MalformedResponse(_))
        ));
        assert_eq!(source.calls().len(), 1);
    }

    #[tokio::test]
    async fn test_devicestatus_stops_after_41_empty_windows() {
        let source = Arc::new(ScriptedSource::new(Vec::new()));
        let (fetcher, _) = fetcher(source.clone());
        let mut sink: Vec<Value> = Vec::new();

        let outcome = fetcher
            .fetch(&request(DataType::DeviceStatus, None), &mut sink)
            .await
            .unwrap();

        assert_eq!(outcome.termination, Termination::EmptyRunExhausted);
        assert_eq!(outcome.windows, 41);
        assert_eq!(source.calls().len(), 41);
        assert!(sink.is_empty());
    }

    #[tokio::test]
    async fn test_records_reset_the_empty_run() {
        let mut script: Vec<Scripted> = vec![Ok(Vec::new()); 6];
        script.push(Ok(vec![json!({"sgv": 100})]));
        let source = Arc::new(ScriptedSource::new(script));
        let (fetcher, _) = fetcher(source.clone());
        let mut sink: Vec<Value> = Vec::new();

        let outcome = fetcher
            .fetch(&request(DataType::Entries, None), &mut sink)
            .await
            .unwrap();

        // 6 empty, 1 with data, then 7 more empty before the threshold of 6 is exceeded
        assert_eq!(outcome.termination, Termination::EmptyRunExhausted);
        assert_eq!(outcome.windows, 14);
        assert_eq!(outcome.records, 1);
    }

    #[tokio::test]
    async fn test_reports_each_window() {
        let source = Arc::new(ScriptedSource::new(Vec::new()));
        let (fetcher, reporter) = fetcher(source.clone());
        let mut sink: Vec<Value> = Vec::new();

        fetcher
            .fetch(&request(DataType::Treatments, Some(date(2020, 1, 1))), &mut sink)
            .await
            .unwrap();

        let messages = reporter.messages();
        assert_eq!(messages.len(), 1);
        assert!(messages[0].starts_with("Querying treatments from 2020-01-01T00:00:00+00:00 to "));
        assert!(messages[0].ends_with("..."));
    }

    #[tokio::test]
    async fn test_cancellation_between_windows() {
        let source = Arc::new(ScriptedSource::new(Vec::new()));
        let (tx, rx) = watch::channel(false);
        let (fetcher, _) = fetcher(source.clone());
        let fetcher = fetcher.with_cancellation(rx);
        tx.send(true).unwrap();

        let mut sink: Vec<Value> = Vec::new();
        let outcome = fetcher
            .fetch(&request(DataType::Entries, None), &mut sink)
            .await
            .unwrap();

        assert!(outcome.is_cancelled());
        assert!(source.calls().is_empty());
    }

    #[tokio::test]
    async fn test_profile_is_a_single_request() {
        let source = Arc::new(ScriptedSource::new(vec![
            server_error(),
            Ok(vec![json!([{"defaultProfile": "Default"}])]),
        ]));
        let (fetcher, _) = fetcher(source.clone());
        let mut sink: Vec<Value> = Vec::new();

        let outcome = fetcher
            .fetch(&request(DataType::Profile, None), &mut sink)
            .await
            .unwrap();

        assert_eq!(outcome.termination, Termination::SingleRequest);
        assert_eq!(outcome.records, 1);
        assert_eq!(sink, vec![json!([{"defaultProfile": "Default"}])]);
    }

    #[tokio::test]
    async fn test_empty_profile_counts_no_records() {
        let source = Arc::new(ScriptedSource::new(vec![Ok(vec![json!([])])]));
        let (fetcher, _) = fetcher(source);
        let mut sink: Vec<Value> = Vec::new();

        let outcome = fetcher
            .fetch(&request(DataType::Profile, None), &mut sink)
            .await
            .unwrap();

        assert_eq!(outcome.termination, Termination::SingleRequest);
        assert_eq!(outcome.records, 0);
    }

    #[test]
    fn test_backoff_delays() {
        let policy = FetchPolicy {
            max_retries: 4,
            initial_delay: Duration::from_millis(500),
            max_delay: Duration::from_millis(1500),
            backoff_multiplier: 2.0,
        };
        assert_eq!(policy.delay_for(1), Duration::from_millis(500));
        assert_eq!(policy.delay_for(2), Duration::from_millis(1000));
        assert_eq!(policy.delay_for(3), Duration::from_millis(1500));
        assert_eq!(FetchPolicy::immediate(4).delay_for(3), Duration::ZERO);
    }
}
