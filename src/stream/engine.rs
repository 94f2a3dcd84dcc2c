//! Stream engine
//!
//! The engine owns at most one [`StreamSession`] and the [`Ticker`] that
//! paces it. Everything that changes session state (starting, ticking,
//! cancelling) takes `&mut self`, so ticks can never overlap and a sink can
//! never observe a half-updated cursor.
//!
//! # Lifecycle
//!
//! ```text
//! Idle --start--> Running --last batch--> Completed
//!                    |
//!                    +--cancel / handle--> Cancelled
//! ```
//!
//! Starting while a session is running cancels that session first; its sink
//! is dropped and never called again.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use std::time::Duration;
//! use surfscan::stream::{CallbackSink, ManualTicker, ScanOrder, StreamEngine, StreamParams};
//! use surfscan::surface::{SurfaceModel, SurfaceProfile};
//! use surfscan::types::SampledPoint;
//!
//! let truth = SurfaceModel::with_seed(SurfaceProfile::Coin, 1).generate(8).unwrap();
//! let order = ScanOrder::for_field(&truth).unwrap();
//!
//! let mut engine = StreamEngine::new(ManualTicker::new());
//! engine
//!     .start(
//!         Arc::new(truth),
//!         Arc::new(order),
//!         StreamParams::new(4, 30),
//!         CallbackSink::new(|batch: &[SampledPoint]| assert!(!batch.is_empty()), || {}),
//!     )
//!     .unwrap();
//!
//! engine.ticker_mut().advance(Duration::from_millis(30));
//! assert_eq!(engine.run_pending(), 1);
//! ```

use std::sync::Arc;

use super::scan_order::ScanOrder;
use super::session::{
    CancelHandle, SessionId, SessionState, SessionStats, SessionSummary, StreamParams,
    StreamSession, TickOutcome,
};
use super::sink::StreamSink;
use super::ticker::{IntervalTicker, Ticker};
use crate::error::{Result, ScanError};
use crate::types::HeightField;

/// Check that a session could be started with these inputs
///
/// [`StreamEngine::start`] runs the same check before it touches the running
/// session, so a failed start never cancels anything.
pub fn validate_start(field: &HeightField, order: &ScanOrder, params: &StreamParams) -> Result<()> {
    params.validate()?;
    if order.grid_size() != field.size() {
        return Err(ScanError::DimensionMismatch {
            expected: field.size(),
            actual: order.grid_size(),
        });
    }
    Ok(())
}

/// Drives timed, batched, cancellable delivery of one session at a time
pub struct StreamEngine<T: Ticker = IntervalTicker> {
    ticker: T,
    session: Option<StreamSession>,
    next_id: u64,
}

impl Default for StreamEngine<IntervalTicker> {
    fn default() -> Self {
        Self::new(IntervalTicker::new())
    }
}

impl<T: Ticker> std::fmt::Debug for StreamEngine<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StreamEngine")
            .field("session", &self.session)
            .field("ticker_armed", &self.ticker.is_armed())
            .finish()
    }
}

impl<T: Ticker> StreamEngine<T> {
    /// Create an idle engine paced by `ticker`
    pub fn new(ticker: T) -> Self {
        Self {
            ticker,
            session: None,
            next_id: 1,
        }
    }

    /// Start streaming `order` over `field` into `sink`
    ///
    /// A running session is cancelled first. Invalid parameters are rejected
    /// before the running session is touched.
    pub fn start(
        &mut self,
        field: Arc<HeightField>,
        order: Arc<ScanOrder>,
        params: StreamParams,
        sink: impl StreamSink + 'static,
    ) -> Result<SessionId> {
        validate_start(&field, &order, &params)?;

        if self.is_running() {
            if let Some(previous) = self.session.as_ref().map(|s| s.id()) {
                tracing::debug!("Session {} still running; cancelling before restart", previous);
            }
            self.cancel();
        }

        let id = SessionId(self.next_id);
        self.next_id += 1;

        tracing::info!(
            "Starting session {}: {} points, batch size {}, interval {:?}",
            id,
            order.len(),
            params.batch_size,
            params.interval
        );

        self.session = Some(StreamSession::new(id, field, order, params, Box::new(sink)));
        self.ticker.start(params.interval);
        Ok(id)
    }

    /// Cancel the running session
    ///
    /// Returns `true` if a session was running. Calling this again, or on a
    /// finished session, changes nothing.
    pub fn cancel(&mut self) -> bool {
        let Some(session) = self.session.as_mut() else {
            return false;
        };
        let cancelled = session.mark_cancelled();
        self.ticker.stop();
        if cancelled {
            tracing::info!(
                "Cancelled session {} after {}/{} points",
                session.id(),
                session.stats().points_delivered,
                session.stats().total_points
            );
        }
        cancelled
    }

    /// Run one delivery step
    ///
    /// The step is skipped entirely unless a session is running and its
    /// cancel flag is clear.
    pub fn tick(&mut self) -> TickOutcome {
        let Some(session) = self.session.as_mut() else {
            return TickOutcome::Ignored;
        };

        let outcome = session.step();
        match outcome {
            TickOutcome::Delivered(points) => {
                tracing::trace!(
                    "Session {} tick: {} points (cursor {})",
                    session.id(),
                    points,
                    session.cursor()
                );
            }
            TickOutcome::Completed(_) => {
                self.ticker.stop();
                tracing::info!(
                    "Session {} completed: {} points in {} batches",
                    session.id(),
                    session.stats().points_delivered,
                    session.stats().batches_delivered
                );
            }
            TickOutcome::Cancelled => {
                self.ticker.stop();
                tracing::info!("Session {} cancelled via handle", session.id());
            }
            TickOutcome::Ignored => {
                self.ticker.stop();
            }
        }
        outcome
    }

    /// Handle the next due tick, if there is one, without blocking
    ///
    /// Hosts that must react to other input between batches call this
    /// instead of [`run_pending`](Self::run_pending): with a zero interval
    /// every poll is due, so draining would stream the whole session at once.
    pub fn poll(&mut self) -> Option<TickOutcome> {
        let tick = self.ticker.try_next()?;
        tracing::trace!("Tick {} at {:?}", tick.seq, tick.elapsed);
        Some(self.tick())
    }

    /// Handle every tick that is already due, without blocking
    ///
    /// Returns the number of ticks that delivered or completed.
    pub fn run_pending(&mut self) -> usize {
        let mut handled = 0;
        while let Some(outcome) = self.poll() {
            match outcome {
                TickOutcome::Delivered(_) => handled += 1,
                TickOutcome::Completed(_) => {
                    handled += 1;
                    break;
                }
                TickOutcome::Cancelled | TickOutcome::Ignored => break,
            }
        }
        handled
    }

    /// Block on the ticker until the session ends
    ///
    /// Returns the final state. With a [`ManualTicker`](super::ManualTicker)
    /// virtual time jumps from tick to tick.
    pub fn run_to_completion(&mut self) -> SessionState {
        while self.session.as_ref().is_some_and(|s| s.state().is_running()) {
            if self.ticker.wait().is_none() {
                break;
            }
            self.tick();
        }
        if self
            .session
            .as_ref()
            .is_some_and(|s| s.state() == SessionState::Cancelled)
        {
            // A handle cancellation is only reported by the session; this
            // tick commits it and releases the sink
            self.tick();
        }
        self.state()
    }

    /// State of the current (or last) session; `Idle` before the first start
    pub fn state(&self) -> SessionState {
        self.session
            .as_ref()
            .map(|s| s.state())
            .unwrap_or(SessionState::Idle)
    }

    /// Whether a session is currently running
    pub fn is_running(&self) -> bool {
        self.state().is_running()
    }

    /// Current (or last) session
    pub fn session(&self) -> Option<&StreamSession> {
        self.session.as_ref()
    }

    /// Identifier of the current (or last) session
    pub fn session_id(&self) -> Option<SessionId> {
        self.session.as_ref().map(|s| s.id())
    }

    /// Fraction of the current session delivered
    pub fn progress(&self) -> Option<f64> {
        self.session.as_ref().map(|s| s.stats().progress())
    }

    /// Delivery statistics of the current (or last) session
    pub fn stats(&self) -> Option<&SessionStats> {
        self.session.as_ref().map(|s| s.stats())
    }

    /// Reporting snapshot of the current (or last) session
    pub fn summary(&self) -> Option<SessionSummary> {
        self.session.as_ref().map(|s| s.summary())
    }

    /// Cross-thread cancel handle for the running session
    pub fn cancel_handle(&self) -> Option<CancelHandle> {
        self.session
            .as_ref()
            .filter(|s| s.state().is_running())
            .map(|s| s.cancel_handle())
    }

    /// The tick source
    pub fn ticker(&self) -> &T {
        &self.ticker
    }

    /// The tick source, mutably (e.g. to advance a virtual clock)
    pub fn ticker_mut(&mut self) -> &mut T {
        &mut self.ticker
    }
}
