//! Sink and channel helpers

use crossbeam_channel::{unbounded, Receiver};
use std::sync::{Arc, Mutex};
use surfscan::stream::{ChannelSink, StreamEvent, StreamSink};
use surfscan::SampledPoint;

/// Everything a [`RecordingSink`] observed
#[derive(Debug, Default)]
pub struct Recording {
    pub batches: Vec<Vec<SampledPoint>>,
    pub done_calls: usize,
    /// `done` was seen while batches were still arriving
    pub batch_after_done: bool,
}

impl Recording {
    pub fn points(&self) -> Vec<SampledPoint> {
        self.batches.iter().flatten().copied().collect()
    }
}

/// Sink that records into shared state
pub struct RecordingSink {
    log: Arc<Mutex<Recording>>,
}

impl RecordingSink {
    pub fn new() -> (Self, Arc<Mutex<Recording>>) {
        let log = Arc::new(Mutex::new(Recording::default()));
        (Self { log: log.clone() }, log)
    }
}

impl StreamSink for RecordingSink {
    fn on_batch(&mut self, batch: &[SampledPoint]) {
        let mut log = self.log.lock().unwrap();
        if log.done_calls > 0 {
            log.batch_after_done = true;
        }
        log.batches.push(batch.to_vec());
    }

    fn on_done(&mut self) {
        self.log.lock().unwrap().done_calls += 1;
    }
}

/// Create a channel sink and its receiving end
pub fn create_event_channel() -> (ChannelSink<StreamEvent>, Receiver<StreamEvent>) {
    let (tx, rx) = unbounded();
    (ChannelSink::new(tx), rx)
}
