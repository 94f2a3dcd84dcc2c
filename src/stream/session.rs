//! Stream session state
//!
//! A [`StreamSession`] is the runtime state of one acquisition run. It owns
//! the ground truth and scan order (both immutable), a cursor that only moves
//! forward, the consumer sink, and its lifecycle state. All mutation goes
//! through [`StreamEngine`](super::StreamEngine), one tick at a time.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use super::scan_order::ScanOrder;
use super::sink::StreamSink;
use crate::error::{Result, ScanError};
use crate::types::{HeightField, SampledPoint};

/// Default number of points per batch
pub const DEFAULT_BATCH_SIZE: usize = 200;

/// Default delay between batches in milliseconds
pub const DEFAULT_INTERVAL_MS: u64 = 30;

/// Identifier of a session within one engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SessionId(pub u64);

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Lifecycle of a stream session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SessionState {
    /// No session has been started
    #[default]
    Idle,
    /// Delivering batches
    Running,
    /// Every point was delivered
    Completed,
    /// Stopped before the end
    Cancelled,
}

impl SessionState {
    /// Check if currently delivering
    pub fn is_running(&self) -> bool {
        matches!(self, SessionState::Running)
    }

    /// Check if the session has ended, one way or the other
    pub fn is_terminal(&self) -> bool {
        matches!(self, SessionState::Completed | SessionState::Cancelled)
    }

    /// Display name for the state
    pub fn display_name(&self) -> &'static str {
        match self {
            SessionState::Idle => "Idle",
            SessionState::Running => "Running",
            SessionState::Completed => "Completed",
            SessionState::Cancelled => "Cancelled",
        }
    }
}

impl std::fmt::Display for SessionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

/// Pacing parameters of a session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreamParams {
    /// Maximum points per batch (at least 1)
    pub batch_size: usize,
    /// Delay between batches
    pub interval: Duration,
}

impl Default for StreamParams {
    fn default() -> Self {
        Self {
            batch_size: DEFAULT_BATCH_SIZE,
            interval: Duration::from_millis(DEFAULT_INTERVAL_MS),
        }
    }
}

impl StreamParams {
    /// Create parameters from a batch size and an interval in milliseconds
    pub fn new(batch_size: usize, interval_ms: u64) -> Self {
        Self {
            batch_size,
            interval: Duration::from_millis(interval_ms),
        }
    }

    /// Check the parameters before a session is started
    pub fn validate(&self) -> Result<()> {
        if self.batch_size == 0 {
            return Err(ScanError::InvalidBatchSize(self.batch_size));
        }
        Ok(())
    }
}

/// Thread-safe cancellation flag for a single session
///
/// The flag can only ever be set. The engine checks it at the start of every
/// tick, before touching the cursor or the sink, and again after each batch
/// is handed to the sink.
#[derive(Debug, Clone, Default)]
pub struct CancelHandle(Arc<AtomicBool>);

impl CancelHandle {
    /// Create a fresh, untripped handle
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation
    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    /// Whether cancellation was requested
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Delivery statistics of a session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionStats {
    /// Points in the scan order
    pub total_points: usize,
    /// Points handed to the sink so far
    pub points_delivered: usize,
    /// Batches handed to the sink so far
    pub batches_delivered: usize,
    /// Ticks that reached the delivery step
    pub ticks: u64,
    /// When the session was started
    pub started_at: DateTime<Utc>,
    /// When the session reached a terminal state
    pub finished_at: Option<DateTime<Utc>>,
}

impl SessionStats {
    fn new(total_points: usize) -> Self {
        Self {
            total_points,
            points_delivered: 0,
            batches_delivered: 0,
            ticks: 0,
            started_at: Utc::now(),
            finished_at: None,
        }
    }

    /// Fraction of points delivered, 1.0 for an empty order
    pub fn progress(&self) -> f64 {
        if self.total_points == 0 {
            return 1.0;
        }
        self.points_delivered as f64 / self.total_points as f64
    }
}

/// Snapshot of a finished (or running) session, for reporting
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionSummary {
    /// Session identifier
    pub id: SessionId,
    /// State at the time of the snapshot
    pub state: SessionState,
    /// Edge length of the streamed grid
    pub grid_size: usize,
    /// Batch size in use
    pub batch_size: usize,
    /// Interval in milliseconds
    pub interval_ms: u64,
    /// Delivery statistics
    pub stats: SessionStats,
}

/// What a single tick did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// No live session; nothing happened
    Ignored,
    /// A batch of this many points was delivered
    Delivered(usize),
    /// A final batch (possibly empty) was delivered and the session completed
    Completed(usize),
    /// The cancel flag was observed; no further callbacks follow
    Cancelled,
}

/// Runtime state of one acquisition run
pub struct StreamSession {
    id: SessionId,
    field: Arc<HeightField>,
    order: Arc<ScanOrder>,
    cursor: usize,
    params: StreamParams,
    state: SessionState,
    sink: Option<Box<dyn StreamSink>>,
    cancel: CancelHandle,
    stats: SessionStats,
}

impl std::fmt::Debug for StreamSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StreamSession")
            .field("id", &self.id)
            .field("state", &self.state)
            .field("cursor", &self.cursor)
            .field("total", &self.order.len())
            .field("params", &self.params)
            .field("has_sink", &self.sink.is_some())
            .finish()
    }
}

impl StreamSession {
    pub(crate) fn new(
        id: SessionId,
        field: Arc<HeightField>,
        order: Arc<ScanOrder>,
        params: StreamParams,
        sink: Box<dyn StreamSink>,
    ) -> Self {
        let stats = SessionStats::new(order.len());
        Self {
            id,
            field,
            order,
            cursor: 0,
            params,
            state: SessionState::Running,
            sink: Some(sink),
            cancel: CancelHandle::new(),
            stats,
        }
    }

    /// Session identifier
    pub fn id(&self) -> SessionId {
        self.id
    }

    /// Current state, including a cancellation requested through a handle
    pub fn state(&self) -> SessionState {
        if self.state.is_running() && self.cancel.is_cancelled() {
            SessionState::Cancelled
        } else {
            self.state
        }
    }

    /// Position of the next point to deliver
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Points not yet delivered
    pub fn remaining(&self) -> usize {
        self.order.len() - self.cursor
    }

    /// Pacing parameters
    pub fn params(&self) -> StreamParams {
        self.params
    }

    /// Ground truth being streamed
    pub fn field(&self) -> &Arc<HeightField> {
        &self.field
    }

    /// Delivery statistics
    pub fn stats(&self) -> &SessionStats {
        &self.stats
    }

    /// Handle that cancels this session from any thread
    pub fn cancel_handle(&self) -> CancelHandle {
        self.cancel.clone()
    }

    /// Reporting snapshot
    pub fn summary(&self) -> SessionSummary {
        SessionSummary {
            id: self.id,
            state: self.state(),
            grid_size: self.field.size(),
            batch_size: self.params.batch_size,
            interval_ms: self.params.interval.as_millis() as u64,
            stats: self.stats.clone(),
        }
    }

    /// Move to Cancelled and release the sink; no-op once terminal
    pub(crate) fn mark_cancelled(&mut self) -> bool {
        if !self.state.is_running() {
            return false;
        }
        self.cancel.cancel();
        self.state = SessionState::Cancelled;
        self.stats.finished_at = Some(Utc::now());
        self.sink = None;
        true
    }

    /// Run one delivery step
    pub(crate) fn step(&mut self) -> TickOutcome {
        if !self.state.is_running() {
            return TickOutcome::Ignored;
        }
        if self.cancel.is_cancelled() {
            self.mark_cancelled();
            return TickOutcome::Cancelled;
        }

        self.stats.ticks += 1;
        let batch = self.next_batch();
        let delivered = batch.len();

        if let Some(sink) = self.sink.as_mut() {
            if !batch.is_empty() {
                sink.on_batch(&batch);
                self.stats.batches_delivered += 1;
                self.stats.points_delivered += delivered;
            }
        }

        // The sink may have tripped the flag while handling the batch
        if self.cancel.is_cancelled() {
            self.mark_cancelled();
            return TickOutcome::Cancelled;
        }

        if self.cursor < self.order.len() {
            return TickOutcome::Delivered(delivered);
        }

        self.state = SessionState::Completed;
        self.stats.finished_at = Some(Utc::now());
        if let Some(mut sink) = self.sink.take() {
            sink.on_done();
        }
        TickOutcome::Completed(delivered)
    }

    /// Take the next up-to-`batch_size` points and advance the cursor
    fn next_batch(&mut self) -> Vec<SampledPoint> {
        let end = (self.cursor + self.params.batch_size).min(self.order.len());
        let batch = self.order.as_slice()[self.cursor..end]
            .iter()
            .map(|&coord| SampledPoint::new(coord, self.field.get(coord)))
            .collect();
        self.cursor = end;
        batch
    }
}
