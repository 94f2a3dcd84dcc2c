//! Backend module hosting the stream engine on its own thread
//!
//! The engine is single-threaded and cooperative. To keep a consumer (a UI,
//! the CLI) responsive, the backend runs it on a worker thread and talks to
//! the consumer over crossbeam channels.
//!
//! # Architecture
//!
//! - [`AcquisitionCommand`] - Messages sent from the consumer to the backend
//! - [`AcquisitionMessage`] - Messages sent from the backend to the consumer
//! - [`FrontendHandle`] - Consumer-side handle for commands and messages
//! - [`AcquisitionBackend`] - Entry point that owns the worker's channel ends
//! - [`BackendWorker`] - Loop that processes commands and drives the ticks
//!
//! # Message ordering
//!
//! Messages arrive in the order they were produced. Each session's messages
//! start with `SessionStarted` and end with its one `Summary`; a cancelled
//! session emits nothing after its `Summary`, so every `Batch` belongs to the
//! most recent `SessionStarted`. A `Snapshot` (the answer to
//! `RequestSummary`) can appear anywhere and never ends a session.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use surfscan::backend::{AcquisitionBackend, AcquisitionMessage};
//! use surfscan::stream::{ScanOrder, StreamParams};
//! use surfscan::surface::{SurfaceModel, SurfaceProfile};
//!
//! let truth = SurfaceModel::new(SurfaceProfile::Coin).generate(80).unwrap();
//! let order = ScanOrder::for_field(&truth).unwrap();
//!
//! let (backend, frontend) = AcquisitionBackend::new();
//! let worker = backend.spawn().unwrap();
//!
//! frontend.start(Arc::new(truth), Arc::new(order), StreamParams::default());
//! while let Some(msg) = frontend.recv() {
//!     if let AcquisitionMessage::Summary(summary) = msg {
//!         println!("finished: {}", summary.state);
//!         break;
//!     }
//! }
//!
//! frontend.shutdown();
//! worker.join().unwrap();
//! ```

pub mod worker;

pub use worker::BackendWorker;

use crossbeam_channel::{bounded, unbounded, Receiver, RecvTimeoutError, Sender};
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

use crate::error::{Result, ScanError};
use crate::stream::{ScanOrder, SessionId, SessionSummary, StreamEvent, StreamParams};
use crate::types::{HeightField, SampledPoint};

/// Capacity of the command queue
pub const COMMAND_QUEUE_CAPACITY: usize = 64;

/// Message sent from the consumer to the backend
#[derive(Debug, Clone)]
pub enum AcquisitionCommand {
    /// Start a session, cancelling any running one
    Start {
        /// Ground truth to stream
        field: Arc<HeightField>,
        /// Traversal over `field`
        order: Arc<ScanOrder>,
        /// Pacing
        params: StreamParams,
    },
    /// Cancel the running session
    Cancel,
    /// Ask for a summary of the current (or last) session
    RequestSummary,
    /// Stop the worker
    Shutdown,
}

/// Message sent from the backend to the consumer
#[derive(Debug, Clone)]
pub enum AcquisitionMessage {
    /// A session was started
    SessionStarted {
        id: SessionId,
        total_points: usize,
    },
    /// A batch of the running session
    Batch(Vec<SampledPoint>),
    /// The running session delivered its final batch
    Done,
    /// Final report of a session, sent once when it terminates
    Summary(SessionSummary),
    /// Current (or last) session on request; may still be running
    Snapshot(SessionSummary),
    /// A command could not be carried out
    Error(String),
    /// Backend is shutting down
    Shutdown,
}

impl From<StreamEvent> for AcquisitionMessage {
    fn from(event: StreamEvent) -> Self {
        match event {
            StreamEvent::Batch(points) => AcquisitionMessage::Batch(points),
            StreamEvent::Done => AcquisitionMessage::Done,
        }
    }
}

/// Consumer-side handle for the backend
pub struct FrontendHandle {
    /// Receiver for backend messages
    pub receiver: Receiver<AcquisitionMessage>,
    /// Sender for commands to the backend
    pub command_sender: Sender<AcquisitionCommand>,
}

impl FrontendHandle {
    /// Try to receive a message without blocking
    pub fn try_recv(&self) -> Option<AcquisitionMessage> {
        self.receiver.try_recv().ok()
    }

    /// Block until a message arrives; `None` once the backend is gone
    pub fn recv(&self) -> Option<AcquisitionMessage> {
        self.receiver.recv().ok()
    }

    /// Wait up to `timeout` for a message
    pub fn recv_timeout(&self, timeout: Duration) -> Result<Option<AcquisitionMessage>> {
        match self.receiver.recv_timeout(timeout) {
            Ok(msg) => Ok(Some(msg)),
            Err(RecvTimeoutError::Timeout) => Ok(None),
            Err(RecvTimeoutError::Disconnected) => {
                Err(ScanError::Channel("backend disconnected".to_string()))
            }
        }
    }

    /// Receive all pending messages
    pub fn drain(&self) -> Vec<AcquisitionMessage> {
        let mut messages = Vec::new();
        while let Ok(msg) = self.receiver.try_recv() {
            messages.push(msg);
        }
        messages
    }

    /// Send a command to the backend
    pub fn send_command(&self, cmd: AcquisitionCommand) -> bool {
        self.command_sender.send(cmd).is_ok()
    }

    /// Start a session
    pub fn start(&self, field: Arc<HeightField>, order: Arc<ScanOrder>, params: StreamParams) {
        let _ = self.command_sender.send(AcquisitionCommand::Start {
            field,
            order,
            params,
        });
    }

    /// Cancel the running session
    pub fn cancel(&self) {
        let _ = self.command_sender.send(AcquisitionCommand::Cancel);
    }

    /// Request a session summary
    pub fn request_summary(&self) {
        let _ = self.command_sender.send(AcquisitionCommand::RequestSummary);
    }

    /// Request shutdown
    pub fn shutdown(&self) {
        let _ = self.command_sender.send(AcquisitionCommand::Shutdown);
    }
}

/// The acquisition backend that runs in a separate thread
pub struct AcquisitionBackend {
    /// Receiver for commands from the consumer
    command_receiver: Receiver<AcquisitionCommand>,
    /// Sender for messages to the consumer
    message_sender: Sender<AcquisitionMessage>,
    /// Running flag
    running: Arc<AtomicBool>,
}

impl AcquisitionBackend {
    /// Create a new backend with communication channels
    pub fn new() -> (Self, FrontendHandle) {
        let (cmd_tx, cmd_rx) = bounded(COMMAND_QUEUE_CAPACITY);
        // Unbounded: batches are never dropped, every point is delivered once
        let (msg_tx, msg_rx) = unbounded();

        let backend = Self {
            command_receiver: cmd_rx,
            message_sender: msg_tx,
            running: Arc::new(AtomicBool::new(true)),
        };

        let frontend = FrontendHandle {
            receiver: msg_rx,
            command_sender: cmd_tx,
        };

        (backend, frontend)
    }

    /// Run the backend loop on the current thread
    pub fn run(self) {
        let mut worker =
            BackendWorker::new(self.command_receiver, self.message_sender, self.running);
        worker.run();
    }

    /// Run the backend loop on a named thread
    pub fn spawn(self) -> Result<JoinHandle<()>> {
        std::thread::Builder::new()
            .name("surfscan-backend".to_string())
            .spawn(move || self.run())
            .map_err(ScanError::from)
    }

    /// Get a handle to stop the backend
    pub fn stop_handle(&self) -> Arc<AtomicBool> {
        self.running.clone()
    }
}
