//! Where finished frames and progress reports go.
//!
//! Both traits are called synchronously on the scan worker. A sink that
//! blocks for the frame's on-air time is what paces the whole scan.

use crate::frame::Frame;
use crate::template::TxParams;

/// Consumes encoded frames. Fire-and-forget.
pub trait TransmissionSink {
    fn transmit(&mut self, frame: &Frame, params: &TxParams);
}

impl<S: TransmissionSink + ?Sized> TransmissionSink for &mut S {
    fn transmit(&mut self, frame: &Frame, params: &TxParams) {
        (**self).transmit(frame, params)
    }
}

impl<S: TransmissionSink + ?Sized> TransmissionSink for Box<S> {
    fn transmit(&mut self, frame: &Frame, params: &TxParams) {
        (**self).transmit(frame, params)
    }
}

/// Receives `(done, total)` after every dispatched codeword.
pub trait ProgressObserver {
    fn on_progress(&mut self, done: u64, total: u64);
}

/// No-op observer.
impl ProgressObserver for () {
    fn on_progress(&mut self, _done: u64, _total: u64) {}
}

impl<O: ProgressObserver + ?Sized> ProgressObserver for &mut O {
    fn on_progress(&mut self, done: u64, total: u64) {
        (**self).on_progress(done, total)
    }
}

/// Adapts a closure into a [`ProgressObserver`].
///
/// ```
/// use ook_scan_core::sink::{ProgressFn, ProgressObserver};
///
/// let mut last = 0;
/// let mut observer = ProgressFn(|done: u64, _total: u64| last = done);
/// observer.on_progress(3, 10);
/// drop(observer);
/// assert_eq!(last, 3);
/// ```
pub struct ProgressFn<F>(pub F);

impl<F: FnMut(u64, u64)> ProgressObserver for ProgressFn<F> {
    fn on_progress(&mut self, done: u64, total: u64) {
        (self.0)(done, total)
    }
}

/// Keeps every frame in memory.
#[derive(Debug, Clone, Default)]
pub struct RecordingSink {
    frames: Vec<Frame>,
    params: Option<TxParams>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Frames in transmission order.
    pub fn frames(&self) -> &[Frame] {
        &self.frames
    }

    /// Parameters of the most recent frame.
    pub fn last_params(&self) -> Option<&TxParams> {
        self.params.as_ref()
    }

    pub fn into_frames(self) -> Vec<Frame> {
        self.frames
    }
}

impl TransmissionSink for RecordingSink {
    fn transmit(&mut self, frame: &Frame, params: &TxParams) {
        self.frames.push(frame.clone());
        self.params = Some(*params);
    }
}
