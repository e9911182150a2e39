//! Scan sessions: one full pass over a protocol's address space.
//!
//! A session wires the pipeline together on a single worker:
//!
//! ```text
//! SequenceEnumerator --chunks--> PacketAssembler --codeword--> TemplateEncoder
//!                                                                    |
//!      ProgressObserver <-- inter-code delay <-- TransmissionSink <--+
//! ```
//!
//! Every step runs synchronously inside the enumerator's callback, so the
//! sink's transmit time and the inter-code delay pace generation. Nothing is
//! queued.
//!
//! Configuration is checked once in [`ScanSession::new`]; after that the only
//! errors are broken encoder preconditions and worker failure. Cancellation
//! is reported as [`ScanOutcome::Cancelled`], not as an error.

use std::fmt;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use tracing::{info, trace, warn};

use crate::alphabet::Codeword;
use crate::assembler::PacketAssembler;
use crate::cancel::CancellationToken;
use crate::debruijn::SequenceEnumerator;
use crate::error::{Error, Result};
use crate::frame::TemplateEncoder;
use crate::metrics::ScanMetrics;
use crate::sink::{ProgressObserver, TransmissionSink};
use crate::template::{LiveFields, Protocol, ProtocolDefinition};

/// Symbol index used to complete a trailing partial codeword.
///
/// The recursive sequence always starts with `0^n`, so this is its cyclic
/// continuation.
const FILL_SYMBOL: u8 = 0;

/// Session knobs that are not part of the protocol.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScanOptions {
    /// Pause after each transmitted frame; zero skips the pause
    pub inter_code_delay: Duration,
}

/// How a session ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanOutcome {
    Completed,
    Cancelled,
}

/// Result of a finished or cancelled session.
#[derive(Debug, Clone)]
pub struct ScanReport {
    pub outcome: ScanOutcome,
    pub codewords_done: u64,
    pub codewords_total: u64,
    pub metrics: ScanMetrics,
}

impl fmt::Display for ScanReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.outcome {
            ScanOutcome::Completed => write!(
                f,
                "completed, {} of {}",
                self.codewords_done, self.codewords_total
            ),
            ScanOutcome::Cancelled => write!(
                f,
                "partial, {} of {} done",
                self.codewords_done, self.codewords_total
            ),
        }
    }
}

/// A validated scan, ready to run once.
#[derive(Debug, Clone)]
pub struct ScanSession {
    protocol: Protocol,
    live: LiveFields,
    options: ScanOptions,
}

impl ScanSession {
    /// Validate `definition` and `live` together.
    ///
    /// # Errors
    /// `Error::InvalidConfiguration` for any problem with the alphabet,
    /// window length, template, pattern table, timing or live fields.
    pub fn new(
        definition: &ProtocolDefinition,
        live: LiveFields,
        options: ScanOptions,
    ) -> Result<Self> {
        Self::with_protocol(definition.compile()?, live, options)
    }

    /// Build a session around an already compiled protocol.
    pub fn with_protocol(
        protocol: Protocol,
        live: LiveFields,
        options: ScanOptions,
    ) -> Result<Self> {
        protocol.check_live_fields(&live)?;
        Ok(Self {
            protocol,
            live,
            options,
        })
    }

    pub fn protocol(&self) -> &Protocol {
        &self.protocol
    }

    pub fn live_fields(&self) -> &LiveFields {
        &self.live
    }

    /// Codewords a full run dispatches: k-1 warm-up words plus ceil(k^n / n).
    pub fn total_codewords(&self) -> u64 {
        self.protocol.keyspace().total_codewords()
    }

    /// Run the scan on the calling thread until it completes or `cancel` is
    /// requested.
    pub fn run<S, O>(
        &self,
        sink: &mut S,
        observer: &mut O,
        cancel: &CancellationToken,
    ) -> Result<ScanReport>
    where
        S: TransmissionSink + ?Sized,
        O: ProgressObserver + ?Sized,
    {
        let keyspace = *self.protocol.keyspace();
        let total = keyspace.total_codewords();
        let alphabet = self.protocol.address_alphabet();
        let encoder = TemplateEncoder::new(&self.protocol);
        let tx = *self.protocol.tx_params();
        let delay = self.options.inter_code_delay;

        info!(
            protocol = self.protocol.name(),
            k = keyspace.k(),
            n = keyspace.n(),
            keyspace = keyspace.size(),
            total,
            "scan started"
        );

        let mut metrics = ScanMetrics::new(total);
        let mut enumerator = SequenceEnumerator::new(alphabet, keyspace.n(), cancel)?;
        let mut assembler = PacketAssembler::with_cancel(keyspace.n(), cancel)?;

        let mut deliver = |word: &Codeword| -> Result<()> {
            let frame = encoder.encode(word, &self.live)?;
            sink.transmit(&frame, &tx);
            metrics.record_frame(frame.bit_len(), tx.airtime(frame.bit_len()));
            trace!(
                codeword = %word.render(alphabet),
                bits = frame.bit_len(),
                "frame dispatched"
            );

            if !delay.is_zero() {
                thread::sleep(delay);
            }
            observer.on_progress(metrics.codewords_dispatched, total);
            Ok(())
        };

        enumerator.run(|chunk| assembler.push(chunk, &mut deliver).map(|_| ()))?;
        let padding = assembler.finish(FILL_SYMBOL, &mut deliver)?;

        let done = assembler.dispatched();
        metrics.chunks_received = assembler.chunks_received();
        metrics.symbols_emitted = enumerator.symbols_emitted();
        metrics.warmup_codewords = done.min(keyspace.warmup_codewords());
        metrics.padded_codewords = u64::from(padding > 0);
        metrics.complete();

        let outcome = if done >= total {
            info!(
                done,
                total,
                elapsed_ms = metrics.duration().as_millis() as u64,
                "scan completed"
            );
            ScanOutcome::Completed
        } else {
            warn!(done, total, "scan cancelled");
            ScanOutcome::Cancelled
        };

        Ok(ScanReport {
            outcome,
            codewords_done: done,
            codewords_total: total,
            metrics,
        })
    }

    /// Run the scan on a dedicated, named worker thread.
    ///
    /// The session, sink and observer move onto the worker; the sink comes
    /// back from [`ScanHandle::join`]. Dropping the handle cancels the scan.
    pub fn spawn<S, O>(self, sink: S, observer: O) -> Result<ScanHandle<S>>
    where
        S: TransmissionSink + Send + 'static,
        O: ProgressObserver + Send + 'static,
    {
        let cancel = CancellationToken::new();
        let worker_cancel = cancel.clone();

        let join = thread::Builder::new()
            .name(format!("scan-{}", self.protocol.name()))
            .spawn(move || -> Result<(ScanReport, S)> {
                let mut sink = sink;
                let mut observer = observer;
                let report = self.run(&mut sink, &mut observer, &worker_cancel)?;
                Ok((report, sink))
            })
            .map_err(|e| Error::Worker(e.to_string()))?;

        Ok(ScanHandle {
            cancel,
            join: Some(join),
        })
    }
}

/// Controller side of a spawned session.
///
/// Dropping the handle without joining cancels the scan. The worker finishes
/// the frame in flight and exits; its report and sink are discarded.
#[derive(Debug)]
#[must_use = "dropping a ScanHandle cancels the scan"]
pub struct ScanHandle<S> {
    cancel: CancellationToken,
    /// `None` once joined
    join: Option<JoinHandle<Result<(ScanReport, S)>>>,
}

impl<S> ScanHandle<S> {
    /// Ask the worker to stop; it finishes the frame in flight first.
    pub fn cancel(&self) {
        self.cancel.request();
    }

    /// A clone of the session's token, e.g. for a timer or signal handler.
    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub fn is_finished(&self) -> bool {
        self.join.as_ref().map_or(true, JoinHandle::is_finished)
    }

    /// Wait for the worker and take back the report and the sink.
    pub fn join(mut self) -> Result<(ScanReport, S)> {
        let join = self
            .join
            .take()
            .ok_or_else(|| Error::Worker("scan worker already joined".into()))?;
        join.join()
            .map_err(|_| Error::Worker("scan worker panicked".into()))?
    }
}

impl<S> Drop for ScanHandle<S> {
    fn drop(&mut self) {
        if self.join.is_some() {
            self.cancel.request();
        }
    }
}
