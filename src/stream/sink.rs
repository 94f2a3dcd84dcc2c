//! Stream consumers
//!
//! A [`StreamSink`] receives the batches of one session and, if the session
//! runs to the end, a single completion signal. Sinks are called on the
//! engine's thread, synchronously, from inside a tick.

use crossbeam_channel::Sender;

use crate::types::SampledPoint;

/// Consumer of a stream session
#[cfg_attr(test, mockall::automock)]
pub trait StreamSink {
    /// A non-empty batch of points, in scan order
    fn on_batch(&mut self, batch: &[SampledPoint]);

    /// The session delivered its final batch; called at most once
    fn on_done(&mut self);
}

// ==================== Callback Sink ====================

/// Adapts a pair of closures into a [`StreamSink`]
pub struct CallbackSink<B, D> {
    on_batch: B,
    on_done: Option<D>,
}

impl<B, D> CallbackSink<B, D>
where
    B: FnMut(&[SampledPoint]),
    D: FnOnce(),
{
    /// Create a sink from a batch callback and a completion callback
    pub fn new(on_batch: B, on_done: D) -> Self {
        Self {
            on_batch,
            on_done: Some(on_done),
        }
    }
}

impl<B, D> StreamSink for CallbackSink<B, D>
where
    B: FnMut(&[SampledPoint]),
    D: FnOnce(),
{
    fn on_batch(&mut self, batch: &[SampledPoint]) {
        (self.on_batch)(batch);
    }

    fn on_done(&mut self) {
        if let Some(done) = self.on_done.take() {
            done();
        }
    }
}

// ==================== Channel Sink ====================

/// Events produced by a [`ChannelSink`]
#[derive(Debug, Clone, PartialEq)]
pub enum StreamEvent {
    /// One batch of points
    Batch(Vec<SampledPoint>),
    /// The session completed
    Done,
}

/// Forwards stream events into a crossbeam channel
///
/// Any message type constructible from a [`StreamEvent`] can be used, so a
/// backend can interleave stream events with its own messages. Send failures
/// (receiver dropped) are counted, not propagated.
pub struct ChannelSink<M> {
    sender: Sender<M>,
    failed_sends: u64,
}

impl<M: From<StreamEvent>> ChannelSink<M> {
    /// Create a sink that sends into `sender`
    pub fn new(sender: Sender<M>) -> Self {
        Self {
            sender,
            failed_sends: 0,
        }
    }

    /// Number of events that could not be delivered
    pub fn failed_sends(&self) -> u64 {
        self.failed_sends
    }

    fn send(&mut self, event: StreamEvent) {
        if self.sender.send(M::from(event)).is_err() {
            self.failed_sends += 1;
            tracing::warn!("Stream event dropped: receiver disconnected");
        }
    }
}

impl<M: From<StreamEvent>> StreamSink for ChannelSink<M> {
    fn on_batch(&mut self, batch: &[SampledPoint]) {
        self.send(StreamEvent::Batch(batch.to_vec()));
    }

    fn on_done(&mut self) {
        self.send(StreamEvent::Done);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::GridCoord;
    use crossbeam_channel::unbounded;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[test]
    fn test_callback_sink_done_once() {
        let done_count = Rc::new(RefCell::new(0));
        let batches = Rc::new(RefCell::new(Vec::new()));

        let done_clone = done_count.clone();
        let batches_clone = batches.clone();
        let mut sink = CallbackSink::new(
            move |batch: &[SampledPoint]| batches_clone.borrow_mut().push(batch.len()),
            move || *done_clone.borrow_mut() += 1,
        );

        sink.on_batch(&[SampledPoint::new(GridCoord::new(0, 0), Some(1.0))]);
        sink.on_done();
        sink.on_done();

        assert_eq!(*batches.borrow(), vec![1]);
        assert_eq!(*done_count.borrow(), 1);
    }

    #[test]
    fn test_channel_sink_forwards() {
        let (tx, rx) = unbounded::<StreamEvent>();
        let mut sink = ChannelSink::new(tx);

        let point = SampledPoint::new(GridCoord::new(1, 2), Some(0.5));
        sink.on_batch(&[point]);
        sink.on_done();

        assert_eq!(rx.try_recv().unwrap(), StreamEvent::Batch(vec![point]));
        assert_eq!(rx.try_recv().unwrap(), StreamEvent::Done);
        assert_eq!(sink.failed_sends(), 0);
    }

    #[test]
    fn test_channel_sink_counts_failures() {
        let (tx, rx) = unbounded::<StreamEvent>();
        drop(rx);

        let mut sink = ChannelSink::new(tx);
        sink.on_done();
        assert_eq!(sink.failed_sends(), 1);
    }
}
