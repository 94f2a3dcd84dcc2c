//! Streaming acquisition
//!
//! This module turns a ground-truth [`HeightField`](crate::types::HeightField)
//! into a paced sequence of sample batches, the way a physical profilometer
//! would report measured points while it sweeps the surface.
//!
//! # Components
//!
//! - [`ScanOrder`] - Deterministic serpentine traversal, filtered to present cells
//! - [`Ticker`] - Periodic scheduler ([`IntervalTicker`] for real time,
//!   [`ManualTicker`] for tests)
//! - [`StreamSink`] - Consumer seam ([`CallbackSink`], [`ChannelSink`])
//! - [`StreamSession`] - Runtime state of one run
//! - [`StreamEngine`] - Starts, ticks and cancels sessions
//!
//! # Guarantees
//!
//! - Every coordinate of the order is delivered exactly once, in order.
//! - Batches are non-empty and hold at most `batch_size` points.
//! - `on_done` fires once, after the final batch, and only for sessions that
//!   ran to the end.
//! - After [`StreamEngine::cancel`] returns, the cancelled sink is never
//!   called again.

pub mod engine;
pub mod scan_order;
pub mod session;
pub mod sink;
pub mod ticker;

pub use engine::{validate_start, StreamEngine};
pub use scan_order::ScanOrder;
pub use session::{
    CancelHandle, SessionId, SessionState, SessionStats, SessionSummary, StreamParams,
    StreamSession, TickOutcome, DEFAULT_BATCH_SIZE, DEFAULT_INTERVAL_MS,
};
pub use sink::{CallbackSink, ChannelSink, StreamEvent, StreamSink};
pub use ticker::{IntervalTicker, ManualTicker, Tick, Ticker};
