//! Host-side stand-ins for the radio and the progress display.

use std::thread;

use ook_scan_core::{Frame, ProgressObserver, TransmissionSink, TxParams};
use tracing::{debug, info};

/// Pretends to key a transmitter: logs each frame and blocks for its
/// on-air time, scaled by `time_scale`.
#[derive(Debug)]
pub struct SimulatedTransmitter {
    time_scale: f64,
    frames: u64,
}

impl SimulatedTransmitter {
    /// `time_scale` must be finite and non-negative; 0 never sleeps.
    pub fn new(time_scale: f64) -> Self {
        Self {
            time_scale,
            frames: 0,
        }
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }
}

impl TransmissionSink for SimulatedTransmitter {
    fn transmit(&mut self, frame: &Frame, params: &TxParams) {
        self.frames += 1;
        let airtime = params.airtime(frame.bit_len());
        debug!(
            frame = self.frames,
            bits = %frame,
            samples_per_bit = params.samples_per_bit,
            repeats = params.repeat_count,
            airtime_us = airtime.as_micros() as u64,
            "tx"
        );

        if self.time_scale > 0.0 {
            thread::sleep(airtime.mul_f64(self.time_scale));
        }
    }
}

/// Logs progress each time another tenth of the scan is done.
#[derive(Debug, Default)]
pub struct ProgressLogger {
    last_decile: u64,
}

impl ProgressObserver for ProgressLogger {
    fn on_progress(&mut self, done: u64, total: u64) {
        if total == 0 {
            return;
        }
        let decile = done * 10 / total;
        if decile > self.last_decile {
            self.last_decile = decile;
            info!(done, total, "{}%", decile * 10);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ook_scan_core::{Codeword, LiveFields, ProtocolDefinition, TemplateEncoder, WordTiming};

    #[test]
    fn test_transmitter_counts_without_sleeping() {
        let protocol = ProtocolDefinition {
            name: "sim".into(),
            address_symbols: "01".into(),
            data_symbols: String::new(),
            template: "AA".into(),
            sync: String::new(),
            bit_patterns: vec!["10".into(), "01".into()],
            timing: WordTiming {
                symbol_clock_hz: 1,
                clocks_per_fragment: 1,
                repeat_count: 200,
                pause_symbols: 1_000,
            },
        }
        .compile()
        .unwrap();
        let frame = TemplateEncoder::new(&protocol)
            .encode(&Codeword::new(vec![0, 1]), &LiveFields::default())
            .unwrap();

        let mut tx = SimulatedTransmitter::new(0.0);
        tx.transmit(&frame, protocol.tx_params());
        tx.transmit(&frame, protocol.tx_params());
        assert_eq!(tx.frames(), 2);
    }

    #[test]
    fn test_progress_logger_deciles() {
        let mut logger = ProgressLogger::default();
        for done in 1..=25 {
            logger.on_progress(done, 25);
        }
        assert_eq!(logger.last_decile, 10);
    }
}
