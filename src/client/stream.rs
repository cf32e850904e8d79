//! Streaming API support
//!
//! The streaming endpoints keep one HTTP response open and push
//! newline-delimited JSON records. [`StreamDispatcher`] turns a body (or a
//! batch of buffered lines) into statuses for a [`StreamHandler`];
//! [`StreamSession`] drives a live connection through it.
//!
//! Reconnecting after the server closes the stream is left to the caller.

use std::sync::Arc;

use compact_str::{CompactString, ToCompactString, format_compact};
use derive_builder::Builder;
use futures_util::StreamExt;
use itertools::Itertools;
use serde_json::Value;
use tokio::{runtime::Handle, sync::broadcast, task::JoinHandle};
use tracing::{debug, info, instrument, trace, warn};

use super::{
    api::TwitterApi,
    config::StreamOptions,
    error::{ClientError, Result},
    request::{ApiRequest, Host},
};
use crate::{
    domain::{DeletedStatus, GeoLocation, LimitNotice, Status},
    id::UserId,
};

/// One decoded line of a stream
#[derive(Debug, Clone)]
pub enum StreamRecord {
    Status(Box<Status>),
    Delete(DeletedStatus),
    Limit(LimitNotice),
    /// Any other object: `scrub_geo`, `warning`, `disconnect`, friend lists
    Control(Value),
}

/// Classify a single JSON record
pub fn classify(line: &str) -> std::result::Result<StreamRecord, serde_json::Error> {
    let value: Value = serde_json::from_str(line)?;

    if let Some(delete) = value.get("delete") {
        let deleted = delete
            .get("status")
            .cloned()
            .map(serde_json::from_value::<DeletedStatus>);
        return Ok(match deleted {
            Some(Ok(deleted)) => StreamRecord::Delete(deleted),
            _ => StreamRecord::Control(value),
        });
    }

    if let Some(limit) = value.get("limit") {
        return Ok(match serde_json::from_value::<LimitNotice>(limit.clone()) {
            Ok(limit) => StreamRecord::Limit(limit),
            Err(_) => StreamRecord::Control(value),
        });
    }

    if value.get("id").is_some() && value.get("text").is_some() {
        return serde_json::from_value::<Status>(value).map(|s| StreamRecord::Status(Box::new(s)));
    }

    if value.is_object() {
        Ok(StreamRecord::Control(value))
    } else {
        serde_json::from_value::<Status>(value).map(|s| StreamRecord::Status(Box::new(s)))
    }
}

/// Lines of a body that carry records; keep-alive blank lines are dropped
pub fn record_lines(body: &str) -> impl Iterator<Item = &str> {
    body.lines().filter(|line| !line.trim().is_empty())
}

/// Receives the statuses decoded from a stream.
///
/// `on_statuses` is called exactly once per dispatched body, possibly with
/// an empty collection. The other hooks observe notices that never become
/// statuses.
pub trait StreamHandler {
    fn on_statuses(&mut self, statuses: Vec<Status>);

    fn on_delete(&mut self, _deleted: DeletedStatus) {}

    fn on_limit(&mut self, _limit: LimitNotice) {}

    fn on_control(&mut self, _message: Value) {}
}

impl<F> StreamHandler for F
where
    F: FnMut(Vec<Status>),
{
    fn on_statuses(&mut self, statuses: Vec<Status>) {
        self(statuses)
    }
}

/// Running totals for one dispatcher
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchStats {
    /// Non-blank lines seen
    pub records: usize,
    /// Statuses forwarded to the handler
    pub statuses: usize,
    /// Handler invocations
    pub dispatches: usize,
}

/// Splits stream bodies into records and forwards statuses to a handler
#[derive(Debug)]
pub struct StreamDispatcher<H> {
    handler: H,
    stats: DispatchStats,
}

impl<H: StreamHandler> StreamDispatcher<H> {
    pub fn new(handler: H) -> Self {
        Self { handler, stats: DispatchStats::default() }
    }

    /// Dispatch one body.
    ///
    /// An empty body produces no callback. A single record is checked for a
    /// deletion notice before being read as a status; several records are
    /// each decoded best-effort and failures are dropped. Notices reach their
    /// hooks after `on_statuses`, so a deletion never precedes the status it
    /// removes. Returns the number of statuses forwarded, or `None` when the
    /// handler was not called.
    pub fn dispatch(&mut self, body: &str) -> Option<usize> {
        if body.is_empty() {
            return None;
        }

        let lines: Vec<&str> = record_lines(body).collect();
        let mut notices = Vec::new();
        let statuses = match lines.as_slice() {
            [single] => single_record(single, &mut notices),
            many => many
                .iter()
                .filter_map(|line| best_effort_record(line, &mut notices))
                .collect(),
        };

        let forwarded = statuses.len();
        self.stats.records += lines.len();
        self.stats.statuses += forwarded;
        self.stats.dispatches += 1;
        self.handler.on_statuses(statuses);
        for record in notices {
            self.notice(record);
        }

        Some(forwarded)
    }

    pub fn stats(&self) -> DispatchStats {
        self.stats
    }

    pub fn handler(&self) -> &H {
        &self.handler
    }

    pub fn into_handler(self) -> H {
        self.handler
    }

    fn notice(&mut self, record: StreamRecord) {
        match record {
            StreamRecord::Delete(deleted) => {
                trace!(status_id = %deleted.id, "Deletion notice");
                self.handler.on_delete(deleted)
            },
            StreamRecord::Limit(limit) => {
                debug!(track = limit.track, "Limit notice");
                self.handler.on_limit(limit)
            },
            StreamRecord::Control(message) => self.handler.on_control(message),
            StreamRecord::Status(_) => {},
        }
    }
}

fn single_record(line: &str, notices: &mut Vec<StreamRecord>) -> Vec<Status> {
    match classify(line) {
        Ok(StreamRecord::Status(status)) => vec![*status],
        Ok(other) => {
            notices.push(other);
            Vec::new()
        },
        Err(e) => {
            warn!(error = %e, "Discarding malformed stream record");
            Vec::new()
        },
    }
}

fn best_effort_record(line: &str, notices: &mut Vec<StreamRecord>) -> Option<Status> {
    match classify(line) {
        Ok(StreamRecord::Status(status)) => Some(*status),
        Ok(other) => {
            notices.push(other);
            None
        },
        Err(e) => {
            debug!(error = %e, "Skipping malformed stream record");
            None
        },
    }
}

/// South-west and north-east corners of a `locations` filter box
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub south_west: GeoLocation,
    pub north_east: GeoLocation,
}

impl BoundingBox {
    /// `sw_long,sw_lat,ne_long,ne_lat`
    fn to_param(self) -> String {
        format!(
            "{},{},{},{}",
            self.south_west.longitude,
            self.south_west.latitude,
            self.north_east.longitude,
            self.north_east.latitude
        )
    }
}

/// Predicates for `statuses/filter`
#[derive(Debug, Clone, Default, Builder)]
#[builder(default, setter(into), build_fn(validate = "Self::validate"))]
pub struct FilterParameters {
    /// Keywords, matched as phrases
    pub track: Vec<CompactString>,
    /// Users whose statuses are delivered
    pub follow: Vec<UserId>,
    pub locations: Vec<BoundingBox>,
}

impl FilterParametersBuilder {
    fn validate(&self) -> std::result::Result<(), String> {
        let no_track = self.track.as_ref().is_none_or(Vec::is_empty);
        let no_follow = self.follow.as_ref().is_none_or(Vec::is_empty);
        let no_locations = self.locations.as_ref().is_none_or(Vec::is_empty);
        if no_track && no_follow && no_locations {
            return Err("a filter needs at least one track, follow or locations predicate".into());
        }
        Ok(())
    }
}

/// The streaming endpoint to connect to
#[derive(Debug, Clone)]
pub enum StreamRequest {
    /// Random sample of all public statuses
    Sample,
    /// All public statuses; requires elevated access
    Firehose,
    Filter(FilterParameters),
}

impl StreamRequest {
    pub fn sample() -> Self {
        Self::Sample
    }

    pub fn firehose() -> Self {
        Self::Firehose
    }

    pub fn filter(parameters: FilterParameters) -> Self {
        Self::Filter(parameters)
    }

    pub fn to_api_request(&self) -> ApiRequest {
        match self {
            Self::Sample => ApiRequest::get("statuses/sample").on(Host::Stream),
            Self::Firehose => ApiRequest::get("statuses/firehose").on(Host::Stream),
            Self::Filter(filter) => {
                let mut request = ApiRequest::post("statuses/filter").on(Host::Stream);
                if !filter.track.is_empty() {
                    request = request.param("track", filter.track.iter().join(","));
                }
                if !filter.follow.is_empty() {
                    request = request.param("follow", filter.follow.iter().join(","));
                }
                if !filter.locations.is_empty() {
                    request = request.param(
                        "locations",
                        filter.locations.iter().map(|b| b.to_param()).join(","),
                    );
                }
                request
            },
        }
    }
}

/// Why a session stopped
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamEnd {
    /// The server closed the response
    Closed,
    DurationElapsed,
    /// `end()` was called or the handle was dropped
    Cancelled,
    /// Reading the body failed mid-stream
    Interrupted(CompactString),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamSummary {
    /// Non-blank lines received
    pub records: usize,
    pub statuses: usize,
    pub dispatches: usize,
    pub reason: StreamEnd,
}

impl StreamSummary {
    fn new(stats: DispatchStats, reason: StreamEnd) -> Self {
        Self {
            records: stats.records,
            statuses: stats.statuses,
            dispatches: stats.dispatches,
            reason,
        }
    }
}

/// A running session; `end` stops it, `wait` lets it run out
#[derive(Debug)]
pub struct StreamHandle {
    shutdown_tx: broadcast::Sender<()>,
    task: JoinHandle<Result<StreamSummary>>,
}

impl StreamHandle {
    /// Stop the session and collect its summary
    pub async fn end(self) -> Result<StreamSummary> {
        debug!("Sending shutdown signal to stream session");
        let _ = self.shutdown_tx.send(());
        Self::join(self.task).await
    }

    /// Wait for the session to finish on its own
    pub async fn wait(self) -> Result<StreamSummary> {
        let StreamHandle { shutdown_tx, task } = self;
        let summary = Self::join(task).await;
        drop(shutdown_tx);
        summary
    }

    /// Get a shutdown sender for external shutdown control
    pub fn shutdown_sender(&self) -> broadcast::Sender<()> {
        self.shutdown_tx.clone()
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    async fn join(task: JoinHandle<Result<StreamSummary>>) -> Result<StreamSummary> {
        task.await
            .map_err(|e| ClientError::stream(format!("stream task failed: {e}")))?
    }
}

/// Begin/end wrapper around one streaming connection
pub struct StreamSession;

impl StreamSession {
    /// Connect and start dispatching on the runtime; the handler runs on a
    /// runtime worker, not on the caller's task.
    pub fn begin<H>(
        api: Arc<TwitterApi>,
        request: StreamRequest,
        options: StreamOptions,
        handler: H,
    ) -> Result<StreamHandle>
    where
        H: StreamHandler + Send + 'static,
    {
        if options.results_per_callback == 0 {
            return Err(ClientError::config_validation(
                "results_per_callback",
                "results_per_callback must be at least 1",
            ));
        }

        let handle = Handle::try_current().map_err(|_| {
            ClientError::config("Streams must be started within a Tokio runtime context")
        })?;

        let (shutdown_tx, shutdown_rx) = broadcast::channel(1);
        let task = handle.spawn(run_session(api, request, options, handler, shutdown_rx));

        Ok(StreamHandle { shutdown_tx, task })
    }
}

#[instrument(
    skip(api, options, handler, shutdown_rx),
    fields(batch = options.results_per_callback, duration = ?options.duration)
)]
async fn run_session<H: StreamHandler>(
    api: Arc<TwitterApi>,
    request: StreamRequest,
    options: StreamOptions,
    handler: H,
    mut shutdown_rx: broadcast::Receiver<()>,
) -> Result<StreamSummary> {
    let mut dispatcher = StreamDispatcher::new(handler);

    // The duration counts from begin, connection time included
    let duration = options.duration;
    let deadline = async move {
        match duration {
            Some(duration) => tokio::time::sleep(duration).await,
            None => std::future::pending::<()>().await,
        }
    };
    tokio::pin!(deadline);

    let api_request = request.to_api_request();
    let response = tokio::select! {
        response = api.open_stream(&api_request) => response?,
        _ = &mut deadline => return Ok(ended_before_connect(dispatcher, StreamEnd::DurationElapsed)),
        _ = shutdown_rx.recv() => return Ok(ended_before_connect(dispatcher, StreamEnd::Cancelled)),
    };
    info!(url = %response.url(), "Stream connected");

    let body = response.bytes_stream();
    tokio::pin!(body);
    let mut lines = LineBuffer::default();

    let end = loop {
        tokio::select! {
            chunk = body.next() => match chunk {
                Some(Ok(bytes)) => {
                    let extended = lines.extend(&bytes);
                    while let Some(batch) = lines.take_batch(options.results_per_callback) {
                        dispatcher.dispatch(&batch);
                    }
                    if let Err(pending) = extended {
                        warn!(pending, limit = MAX_LINE_BYTES, "Stream line too long");
                        break StreamEnd::Interrupted(format_compact!(
                            "line exceeded {MAX_LINE_BYTES} bytes without a newline"
                        ));
                    }
                },
                Some(Err(e)) => {
                    warn!(error = %e, "Stream interrupted");
                    break StreamEnd::Interrupted(e.to_compact_string());
                },
                None => break StreamEnd::Closed,
            },
            _ = &mut deadline => break StreamEnd::DurationElapsed,
            _ = shutdown_rx.recv() => break StreamEnd::Cancelled,
        }
    };

    if let Some(rest) = lines.finish() {
        dispatcher.dispatch(&rest);
    }

    let summary = StreamSummary::new(dispatcher.stats(), end);
    info!(
        records = summary.records,
        statuses = summary.statuses,
        reason = ?summary.reason,
        "Stream session ended"
    );
    Ok(summary)
}

fn ended_before_connect<H: StreamHandler>(
    dispatcher: StreamDispatcher<H>,
    end: StreamEnd,
) -> StreamSummary {
    info!(reason = ?end, "Stream session ended before connecting");
    StreamSummary::new(dispatcher.stats(), end)
}

/// Longest unterminated line a session will hold before giving up
const MAX_LINE_BYTES: usize = 1024 * 1024;

/// Accumulates raw chunks into complete, non-blank lines
#[derive(Debug)]
struct LineBuffer {
    partial: Vec<u8>,
    complete: Vec<String>,
    max_line: usize,
}

impl Default for LineBuffer {
    fn default() -> Self {
        Self::with_max_line(MAX_LINE_BYTES)
    }
}

impl LineBuffer {
    fn with_max_line(max_line: usize) -> Self {
        Self { partial: Vec::new(), complete: Vec::new(), max_line }
    }

    /// Errors with the pending length when a line outgrows the cap; the
    /// oversized fragment is discarded.
    fn extend(&mut self, chunk: &[u8]) -> std::result::Result<(), usize> {
        self.partial.extend_from_slice(chunk);

        while let Some(newline) = self.partial.iter().position(|&b| b == b'\n') {
            let line: Vec<u8> = self.partial.drain(..=newline).collect();
            let line = String::from_utf8_lossy(&line);
            let line = line.trim();
            if line.is_empty() {
                trace!("Keep-alive");
                continue;
            }
            self.complete.push(line.to_string());
        }

        if self.partial.len() > self.max_line {
            let pending = self.partial.len();
            self.partial.clear();
            return Err(pending);
        }
        Ok(())
    }

    /// Joined body of `size` complete lines, once that many are buffered
    fn take_batch(&mut self, size: usize) -> Option<String> {
        if self.complete.len() < size {
            return None;
        }
        Some(self.complete.drain(..size).join("\n"))
    }

    /// Whatever is left, including an unterminated last line
    fn finish(mut self) -> Option<String> {
        let tail = String::from_utf8_lossy(&self.partial).trim().to_string();
        if !tail.is_empty() {
            self.complete.push(tail);
        }
        (!self.complete.is_empty()).then(|| self.complete.join("\n"))
    }
}
