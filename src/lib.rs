//! # SurfScan-RS: Synthetic Surface Acquisition
//!
//! A synthetic profilometer. It generates a ground-truth height field,
//! sweeps it in a deterministic serpentine order and streams the sampled
//! points to a consumer in timed batches, as a real instrument would report
//! measurements while it scans.
//!
//! ## Architecture
//!
//! - **Surface**: Procedural ground truth (coin, hill) with seedable noise
//! - **Stream**: Scan order, tick sources, sinks and the session engine
//! - **Backend**: Runs the engine on a worker thread behind crossbeam channels
//! - **Analysis / Export**: Cross-sections and CSV snapshots of any field
//!
//! ## Configuration
//!
//! The acquisition configuration (`surfscan.toml`) and logs live in the
//! platform data directory under `dev.surfscan.surfscan-rs`, or in
//! `$SURFSCAN_DATA_DIR` when set.
//!
//! ## Example
//!
//! ```
//! use std::sync::Arc;
//! use surfscan::stream::{ManualTicker, ScanOrder, StreamEngine, StreamParams, StreamSink};
//! use surfscan::surface::{SurfaceModel, SurfaceProfile};
//! use surfscan::types::{HeightField, SampledPoint};
//!
//! struct Accumulate(HeightField);
//!
//! impl StreamSink for Accumulate {
//!     fn on_batch(&mut self, batch: &[SampledPoint]) {
//!         self.0.apply_points(batch);
//!     }
//!     fn on_done(&mut self) {}
//! }
//!
//! let mut model = SurfaceModel::with_seed(SurfaceProfile::Coin, 7);
//! let truth = model.generate(16).unwrap();
//! let truth = model.add_noise(&truth, 0.03).unwrap();
//! let order = ScanOrder::for_field(&truth).unwrap();
//!
//! let mut engine = StreamEngine::new(ManualTicker::new());
//! engine
//!     .start(
//!         Arc::new(truth),
//!         Arc::new(order),
//!         StreamParams::new(20, 30),
//!         Accumulate(HeightField::absent(16).unwrap()),
//!     )
//!     .unwrap();
//! assert!(engine.run_to_completion().is_terminal());
//! ```

pub mod analysis;
pub mod backend;
pub mod config;
pub mod error;
pub mod export;
pub mod stream;
pub mod surface;
pub mod types;

// Re-export commonly used types
pub use backend::{AcquisitionBackend, AcquisitionCommand, AcquisitionMessage, FrontendHandle};
pub use config::AcquisitionConfig;
pub use error::{Result, ResultExt, ScanError};
pub use stream::{ScanOrder, SessionState, StreamEngine, StreamParams, StreamSink};
pub use surface::{SurfaceModel, SurfaceProfile};
pub use types::{GridCoord, HeightField, SampledPoint};
