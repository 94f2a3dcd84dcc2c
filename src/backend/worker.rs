//! Backend Worker Thread Implementation
//!
//! This module contains the loop that runs a [`StreamEngine`] in a separate
//! thread. It communicates with the consumer through crossbeam channels.
//!
//! # Responsibilities
//!
//! - **Command processing**: start, cancel, snapshot and shutdown requests
//! - **Tick driving**: hands due ticks to the engine one at a time
//! - **Reporting**: exactly one `Summary` per session once it terminates
//!
//! # Waiting
//!
//! When no tick was due the worker blocks on the command channel. While a
//! session is streaming the wait is short so ticks are picked up promptly;
//! when idle it waits longer. After a handled tick it loops straight back.

use crossbeam_channel::{Receiver, RecvTimeoutError, Sender, TryRecvError};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crate::backend::{AcquisitionCommand, AcquisitionMessage};
use crate::stream::{
    validate_start, ChannelSink, IntervalTicker, ScanOrder, SessionId, StreamEngine, StreamParams,
};
use crate::types::HeightField;

/// Command wait while a session is streaming
pub const STREAM_WAIT: Duration = Duration::from_millis(1);

/// Command wait while idle
pub const IDLE_WAIT: Duration = Duration::from_millis(50);

/// The backend worker that drives the stream engine
pub struct BackendWorker {
    /// Command receiver from the consumer
    command_rx: Receiver<AcquisitionCommand>,
    /// Message sender to the consumer
    message_tx: Sender<AcquisitionMessage>,
    /// Running flag
    running: Arc<AtomicBool>,
    /// Engine paced by a real timer
    engine: StreamEngine<IntervalTicker>,
    /// Last session whose summary was sent
    reported: Option<SessionId>,
}

impl BackendWorker {
    /// Create a new backend worker
    pub fn new(
        command_rx: Receiver<AcquisitionCommand>,
        message_tx: Sender<AcquisitionMessage>,
        running: Arc<AtomicBool>,
    ) -> Self {
        Self {
            command_rx,
            message_tx,
            running,
            engine: StreamEngine::default(),
            reported: None,
        }
    }

    /// Run the main worker loop
    pub fn run(&mut self) {
        tracing::info!("Backend worker started");

        while self.running.load(Ordering::SeqCst) {
            let ticked = self.run_once();
            if !ticked && self.running.load(Ordering::SeqCst) {
                self.wait_for_command();
            }
        }

        // Cleanup
        if self.engine.cancel() {
            self.report_if_terminal();
        }

        let _ = self.message_tx.send(AcquisitionMessage::Shutdown);
        tracing::info!("Backend worker stopped");
    }

    /// One pass of the loop: pending commands, then at most one tick
    ///
    /// Returns whether a tick was handled. Commands are read between every
    /// batch, so a cancel lands even when the interval is zero.
    fn run_once(&mut self) -> bool {
        self.process_commands();
        if !self.running.load(Ordering::SeqCst) {
            return false;
        }

        let ticked = self.engine.poll().is_some();
        self.report_if_terminal();
        ticked
    }

    /// Process pending commands without blocking
    fn process_commands(&mut self) {
        loop {
            match self.command_rx.try_recv() {
                Ok(cmd) => self.handle_command(cmd),
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    self.running.store(false, Ordering::SeqCst);
                    break;
                }
            }
        }
    }

    /// Block briefly on the command channel
    fn wait_for_command(&mut self) {
        let timeout = if self.engine.is_running() {
            STREAM_WAIT
        } else {
            IDLE_WAIT
        };

        match self.command_rx.recv_timeout(timeout) {
            Ok(cmd) => self.handle_command(cmd),
            Err(RecvTimeoutError::Timeout) => {}
            Err(RecvTimeoutError::Disconnected) => {
                self.running.store(false, Ordering::SeqCst);
            }
        }
    }

    /// Handle a single command
    fn handle_command(&mut self, cmd: AcquisitionCommand) {
        match cmd {
            AcquisitionCommand::Start {
                field,
                order,
                params,
            } => {
                self.start_session(field, order, params);
            }
            AcquisitionCommand::Cancel => {
                if self.engine.cancel() {
                    self.report_if_terminal();
                } else {
                    tracing::debug!("Cancel requested with no running session");
                }
            }
            AcquisitionCommand::RequestSummary => {
                if let Some(summary) = self.engine.summary() {
                    let _ = self.message_tx.send(AcquisitionMessage::Snapshot(summary));
                }
            }
            AcquisitionCommand::Shutdown => {
                self.running.store(false, Ordering::SeqCst);
            }
        }
    }

    /// Start a session, reporting the one it replaces
    fn start_session(
        &mut self,
        field: Arc<HeightField>,
        order: Arc<ScanOrder>,
        params: StreamParams,
    ) {
        if let Err(e) = validate_start(&field, &order, &params) {
            tracing::warn!("Rejected start request: {}", e);
            let _ = self.message_tx.send(AcquisitionMessage::Error(e.to_string()));
            return;
        }

        // Close out the running session before the new one emits anything
        if self.engine.cancel() {
            self.report_if_terminal();
        }

        let total_points = order.len();
        let sink = ChannelSink::new(self.message_tx.clone());
        match self.engine.start(field, order, params, sink) {
            Ok(id) => {
                let _ = self
                    .message_tx
                    .send(AcquisitionMessage::SessionStarted { id, total_points });
            }
            Err(e) => {
                tracing::error!("Failed to start session: {}", e);
                let _ = self.message_tx.send(AcquisitionMessage::Error(e.to_string()));
            }
        }
    }

    /// Send the summary of a terminated session once
    fn report_if_terminal(&mut self) {
        let Some(summary) = self.engine.summary() else {
            return;
        };
        if !summary.state.is_terminal() || self.reported == Some(summary.id) {
            return;
        }

        tracing::debug!("Reporting session {} as {}", summary.id, summary.state);
        self.reported = Some(summary.id);
        let _ = self.message_tx.send(AcquisitionMessage::Summary(summary));
    }
}
