//! Streams.
//!
//! A [`Stream`] binds one solved handler to a name and the settings that
//! govern how records reach it: which topics it accepts, how many records
//! run concurrently and what happens when a record's arguments cannot be
//! resolved.
//!
//! ```rust,ignore
//! use kstreams_runtime::{ErrorPolicy, Stream, StreamSource};
//!
//! let stream = Stream::new("orders", on_order, on_order::parameters())?
//!     .topics(["orders"])
//!     .max_in_flight(8)
//!     .on_extraction_error(ErrorPolicy::Skip);
//!
//! stream.run(StreamSource::iter(records), CancellationToken::new()).await?;
//! ```

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use futures::StreamExt;
use kstreams_core::ConsumerRecord;
use kstreams_framework::{
    ExtractError, ExtractResult, Handler, Param, ResolutionPlan, SolvedHandler,
};
use parking_lot::Mutex;
use tokio_util::sync::CancellationToken;
use tower::ServiceExt;
use tower::util::BoxCloneSyncService;
use tracing::{Instrument, debug_span, error, info, trace, warn};

use crate::config::{ErrorPolicy, ProcessingConfig, StreamConfig};
use crate::error::{RuntimeError, RuntimeResult};
use crate::source::RecordSource;

// ============================================================================
// StreamOutcome
// ============================================================================

/// A handler return value the runtime knows how to judge.
///
/// Failed outcomes are logged at `error` level and counted; they never stop
/// the stream.
pub trait StreamOutcome: Send + 'static {
    /// Describes the failure, or returns `None` for a successful outcome.
    fn failure(&self) -> Option<String> {
        None
    }
}

impl StreamOutcome for () {}

impl<T: Send + 'static> StreamOutcome for Option<T> {}

impl<T, E> StreamOutcome for Result<T, E>
where
    T: Send + 'static,
    E: fmt::Display + Send + 'static,
{
    fn failure(&self) -> Option<String> {
        self.as_ref().err().map(ToString::to_string)
    }
}

fn outcome_failure<O: StreamOutcome>(outcome: O) -> Option<String> {
    outcome.failure()
}

/// The type-erased handler service a stream drives.
pub type StreamService = BoxCloneSyncService<Arc<ConsumerRecord>, Option<String>, ExtractError>;

// ============================================================================
// Statistics
// ============================================================================

#[derive(Debug, Default)]
struct Counters {
    processed: AtomicU64,
    filtered: AtomicU64,
    handler_failures: AtomicU64,
    extraction_failures: AtomicU64,
}

/// A snapshot of a stream's record counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StreamStats {
    /// Records whose handler ran and succeeded.
    pub processed: u64,
    /// Records ignored because their topic is not subscribed.
    pub filtered: u64,
    /// Records whose handler ran and reported a failure.
    pub handler_failures: u64,
    /// Records whose arguments could not be resolved.
    pub extraction_failures: u64,
}

// ============================================================================
// Stream
// ============================================================================

/// A named handler with its processing settings.
pub struct Stream {
    name: String,
    topics: Vec<String>,
    max_in_flight: Option<usize>,
    on_extraction_error: Option<ErrorPolicy>,
    plan: Arc<ResolutionPlan>,
    service: StreamService,
    counters: Counters,
}

impl Stream {
    /// Builds `handler` and wraps it in a stream called `name`.
    ///
    /// Fails if the handler's resolution plan cannot be built.
    pub fn new<H, T>(
        name: impl Into<String>,
        handler: H,
        params: impl IntoIterator<Item = Param>,
    ) -> RuntimeResult<Self>
    where
        H: Handler<T>,
        H::Output: StreamOutcome,
        T: Send + 'static,
    {
        let name = name.into();
        let solved = SolvedHandler::build(handler, params).map_err(|source| RuntimeError::Build {
            stream: name.clone(),
            source,
        })?;
        Ok(Self::from_solved(name, solved))
    }

    /// Wraps an already solved handler.
    pub fn from_solved<H, T>(name: impl Into<String>, solved: SolvedHandler<H, T>) -> Self
    where
        H: Handler<T>,
        H::Output: StreamOutcome,
        T: Send + 'static,
    {
        let plan = Arc::clone(solved.plan());
        let service = BoxCloneSyncService::new(solved.map_response(outcome_failure::<H::Output>));

        Self {
            name: name.into(),
            topics: Vec::new(),
            max_in_flight: None,
            on_extraction_error: None,
            plan,
            service,
            counters: Counters::default(),
        }
    }

    /// Restricts the stream to records from `topics`.
    pub fn topics<I, S>(mut self, topics: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.topics = topics.into_iter().map(Into::into).collect();
        self
    }

    /// Sets how many records are handled concurrently (at least one).
    pub fn max_in_flight(mut self, max_in_flight: usize) -> Self {
        self.max_in_flight = Some(max_in_flight.max(1));
        self
    }

    /// Sets what happens when a record's arguments cannot be resolved.
    pub fn on_extraction_error(mut self, policy: ErrorPolicy) -> Self {
        self.on_extraction_error = Some(policy);
        self
    }

    /// Fills every setting not chosen in code from configuration.
    pub(crate) fn apply_config(&mut self, processing: &ProcessingConfig, section: Option<&StreamConfig>) {
        self.max_in_flight.get_or_insert(processing.max_in_flight.max(1));
        self.on_extraction_error
            .get_or_insert(processing.on_extraction_error);

        if self.topics.is_empty() {
            if let Some(section) = section {
                self.topics.clone_from(&section.topics);
            }
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Subscribed topics; empty means every topic.
    pub fn subscribed_topics(&self) -> &[String] {
        &self.topics
    }

    pub fn plan(&self) -> &Arc<ResolutionPlan> {
        &self.plan
    }

    /// Effective concurrency limit.
    pub fn concurrency(&self) -> usize {
        self.max_in_flight.unwrap_or(1)
    }

    /// Effective extraction error policy.
    pub fn error_policy(&self) -> ErrorPolicy {
        self.on_extraction_error.unwrap_or_default()
    }

    /// Returns `true` if records from `topic` reach the handler.
    pub fn accepts(&self, topic: &str) -> bool {
        self.topics.is_empty() || self.topics.iter().any(|t| t == topic)
    }

    pub fn stats(&self) -> StreamStats {
        StreamStats {
            processed: self.counters.processed.load(Ordering::Relaxed),
            filtered: self.counters.filtered.load(Ordering::Relaxed),
            handler_failures: self.counters.handler_failures.load(Ordering::Relaxed),
            extraction_failures: self.counters.extraction_failures.load(Ordering::Relaxed),
        }
    }

    /// Handles one record.
    ///
    /// Records from unsubscribed topics are ignored. Handler failures are
    /// logged and counted here; extraction failures are returned so the
    /// caller can apply the error policy.
    pub async fn process(&self, record: Arc<ConsumerRecord>) -> ExtractResult<()> {
        if !self.accepts(&record.topic) {
            trace!(stream = %self.name, topic = %record.topic, "Topic not subscribed, ignoring record");
            self.counters.filtered.fetch_add(1, Ordering::Relaxed);
            return Ok(());
        }

        let span = debug_span!(
            "record",
            stream = %self.name,
            topic = %record.topic,
            partition = record.partition,
            offset = record.offset,
        );

        match self.service.clone().oneshot(record).instrument(span).await {
            Ok(None) => {
                self.counters.processed.fetch_add(1, Ordering::Relaxed);
                Ok(())
            }
            Ok(Some(failure)) => {
                self.counters.handler_failures.fetch_add(1, Ordering::Relaxed);
                error!(stream = %self.name, error = %failure, "Handler failed");
                Ok(())
            }
            Err(err) => {
                self.counters.extraction_failures.fetch_add(1, Ordering::Relaxed);
                Err(err)
            }
        }
    }

    /// Processes records from `source` until it is exhausted, `shutdown` is
    /// cancelled, or an extraction failure hits the `stop` policy.
    ///
    /// Records already in flight when the stream stops are allowed to
    /// finish.
    pub async fn run<S: RecordSource>(
        &self,
        source: S,
        shutdown: CancellationToken,
    ) -> RuntimeResult<()> {
        let limit = self.concurrency();
        let policy = self.error_policy();
        let stop = shutdown.child_token();
        let failure: Mutex<Option<ExtractError>> = Mutex::new(None);

        info!(stream = %self.name, max_in_flight = limit, policy = %policy, "Stream started");

        let records = futures::stream::unfold(source, |mut source| async move {
            source.next_record().await.map(|record| (record, source))
        });

        records
            .take_until(stop.cancelled())
            .for_each_concurrent(limit, |record| {
                let stop = &stop;
                let failure = &failure;
                async move {
                    let Err(err) = self.process(Arc::new(record)).await else {
                        return;
                    };

                    match policy {
                        ErrorPolicy::Skip => {
                            warn!(stream = %self.name, error = %err, "Skipping record");
                        }
                        ErrorPolicy::Stop => {
                            error!(stream = %self.name, error = %err, "Stopping stream");
                            failure.lock().get_or_insert(err);
                            stop.cancel();
                        }
                    }
                }
            })
            .await;

        match failure.into_inner() {
            Some(source) => Err(RuntimeError::Extraction {
                stream: self.name.clone(),
                source,
            }),
            None => {
                info!(stream = %self.name, stats = ?self.stats(), "Stream finished");
                Ok(())
            }
        }
    }
}

impl fmt::Debug for Stream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Stream")
            .field("name", &self.name)
            .field("topics", &self.topics)
            .field("max_in_flight", &self.max_in_flight)
            .field("on_extraction_error", &self.on_extraction_error)
            .field("plan", &self.plan)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::AtomicUsize;
    use std::time::Duration;

    use kstreams_framework::FromHeader;
    use tokio::sync::Barrier;

    use super::*;
    use crate::source::{ChannelSource, StreamSource};

    async fn tally(event_type: FromHeader<String>) -> Result<(), String> {
        if event_type.0 == "bad" {
            Err("rejected".into())
        } else {
            Ok(())
        }
    }

    fn record(offset: i64, event_type: Option<&str>) -> ConsumerRecord {
        let record = ConsumerRecord::new("events").with_offset(offset);
        match event_type {
            Some(value) => record.with_header("event-type", value),
            None => record,
        }
    }

    fn tally_stream() -> Stream {
        Stream::new("tally", tally, [Param::new("event_type")]).unwrap()
    }

    #[test]
    fn test_build_failure_names_stream() {
        async fn unmarked(_value: String) {}

        let err = Stream::new("broken", unmarked, [Param::new("value")]).unwrap_err();
        assert!(matches!(err, RuntimeError::Build { ref stream, .. } if stream == "broken"));
    }

    #[tokio::test]
    async fn test_skip_policy_continues() {
        let stream = tally_stream().on_extraction_error(ErrorPolicy::Skip);
        let source = StreamSource::iter([
            record(0, Some("ok")),
            record(1, None),
            record(2, Some("bad")),
            record(3, Some("ok")),
        ]);

        stream.run(source, CancellationToken::new()).await.unwrap();

        assert_eq!(
            stream.stats(),
            StreamStats {
                processed: 2,
                filtered: 0,
                handler_failures: 1,
                extraction_failures: 1,
            }
        );
    }

    #[tokio::test]
    async fn test_stop_policy_ends_stream() {
        let stream = tally_stream().on_extraction_error(ErrorPolicy::Stop);
        let source = StreamSource::iter([
            record(0, Some("ok")),
            record(1, None),
            record(2, Some("ok")),
        ]);

        let err = stream.run(source, CancellationToken::new()).await.unwrap_err();

        match err {
            RuntimeError::Extraction { stream: name, source } => {
                assert_eq!(name, "tally");
                assert!(source.is_missing());
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(stream.stats().processed, 1);
        assert_eq!(stream.stats().extraction_failures, 1);
    }

    #[tokio::test]
    async fn test_topic_filter() {
        let stream = tally_stream().topics(["orders"]);
        assert!(stream.accepts("orders"));
        assert!(!stream.accepts("events"));

        stream
            .run(StreamSource::iter([record(0, Some("ok"))]), CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(stream.stats().filtered, 1);
        assert_eq!(stream.stats().processed, 0);
    }

    #[tokio::test]
    async fn test_records_run_concurrently_up_to_limit() {
        let barrier = Arc::new(Barrier::new(4));
        let handler = move |_record: Arc<ConsumerRecord>| {
            let barrier = Arc::clone(&barrier);
            async move {
                barrier.wait().await;
            }
        };

        let stream = Stream::new("gated", handler, [Param::new("record")])
            .unwrap()
            .max_in_flight(4);
        let source = StreamSource::iter((0..4).map(|i| record(i, None)));

        tokio::time::timeout(
            Duration::from_secs(5),
            stream.run(source, CancellationToken::new()),
        )
        .await
        .expect("four records should be in flight at once")
        .unwrap();

        assert_eq!(stream.stats().processed, 4);
    }

    #[tokio::test]
    async fn test_limit_of_one_is_sequential() {
        let current = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));

        let (current_c, peak_c) = (Arc::clone(&current), Arc::clone(&peak));
        let handler = move |_record: Arc<ConsumerRecord>| {
            let (current, peak) = (Arc::clone(&current_c), Arc::clone(&peak_c));
            async move {
                let now = current.fetch_add(1, Ordering::SeqCst) + 1;
                peak.fetch_max(now, Ordering::SeqCst);
                tokio::task::yield_now().await;
                current.fetch_sub(1, Ordering::SeqCst);
            }
        };

        let stream = Stream::new("sequential", handler, [Param::new("record")]).unwrap();
        let source = StreamSource::iter((0..8).map(|i| record(i, None)));
        stream.run(source, CancellationToken::new()).await.unwrap();

        assert_eq!(peak.load(Ordering::SeqCst), 1);
        assert_eq!(stream.stats().processed, 8);
    }

    #[tokio::test]
    async fn test_cancellation_stops_open_source() {
        let stream = tally_stream();
        let (tx, source) = ChannelSource::channel(8);
        let shutdown = CancellationToken::new();

        tx.send(record(0, Some("ok"))).await.unwrap();

        let run = {
            let shutdown = shutdown.clone();
            async move { stream.run(source, shutdown).await.map(|()| stream.stats()) }
        };
        let handle = tokio::spawn(run);

        tokio::task::yield_now().await;
        shutdown.cancel();

        let stats = handle.await.unwrap().unwrap();
        assert!(stats.processed <= 1);
        drop(tx);
    }

    #[test]
    fn test_config_fills_unset_settings() {
        let mut stream = tally_stream().max_in_flight(2);
        let processing = ProcessingConfig {
            max_in_flight: 16,
            on_extraction_error: ErrorPolicy::Stop,
        };
        let section = StreamConfig {
            name: "tally".into(),
            topics: vec!["orders".into()],
            enabled: true,
            max_in_flight: None,
            on_extraction_error: None,
        };

        stream.apply_config(&processing, Some(&section));

        assert_eq!(stream.concurrency(), 2);
        assert_eq!(stream.error_policy(), ErrorPolicy::Stop);
        assert_eq!(stream.subscribed_topics(), ["orders"]);
    }
}
