//! Metrics collection and reporting for scan sessions.
//!
//! Counters are updated by the scan worker at each pipeline stage:
//! - Generation (chunks, symbols)
//! - Assembly (codewords dispatched, warm-up and padded codewords)
//! - Transmission (frame bits, estimated on-air time)
//!
//! # Thread Safety
//!
//! `ScanMetrics` is owned by the worker while the scan runs and is moved into
//! the [`crate::session::ScanReport`] when it ends; there is no shared access.

use std::time::{Duration, Instant};

/// Counts and timing for one scan session.
#[derive(Debug, Clone)]
pub struct ScanMetrics {
    // === Timing ===
    /// When the scan started
    pub start_time: Instant,

    /// When the scan ended (set on completion or cancellation)
    pub end_time: Option<Instant>,

    // === Generation ===
    /// Chunks delivered by the enumerator
    pub chunks_received: u64,

    /// Symbols delivered by the enumerator, warm-up included
    pub symbols_emitted: u64,

    // === Assembly ===
    /// Codewords a full scan dispatches
    pub codewords_total: u64,

    /// Codewords encoded and handed to the sink
    pub codewords_dispatched: u64,

    /// Dispatched codewords that came from the warm-up
    pub warmup_codewords: u64,

    /// Dispatched codewords completed with fill symbols
    pub padded_codewords: u64,

    // === Transmission ===
    /// Bits across all frames, one repeat each
    pub frame_bits: u64,

    /// Sum of per-frame airtime, repeats and pauses included
    pub estimated_airtime: Duration,
}

impl ScanMetrics {
    /// Create new metrics with start time set to now.
    pub fn new(codewords_total: u64) -> Self {
        Self {
            start_time: Instant::now(),
            end_time: None,
            chunks_received: 0,
            symbols_emitted: 0,
            codewords_total,
            codewords_dispatched: 0,
            warmup_codewords: 0,
            padded_codewords: 0,
            frame_bits: 0,
            estimated_airtime: Duration::ZERO,
        }
    }

    /// Account for one transmitted frame.
    pub fn record_frame(&mut self, bits: usize, airtime: Duration) {
        self.codewords_dispatched += 1;
        self.frame_bits += bits as u64;
        self.estimated_airtime += airtime;
    }

    /// Mark the scan as finished.
    pub fn complete(&mut self) {
        self.end_time = Some(Instant::now());
    }

    /// Get total duration (or current elapsed if not complete).
    pub fn duration(&self) -> Duration {
        match self.end_time {
            Some(end) => end.duration_since(self.start_time),
            None => self.start_time.elapsed(),
        }
    }

    /// Fraction of the keyspace covered, 0.0..=1.0.
    pub fn progress(&self) -> f64 {
        if self.codewords_total == 0 {
            0.0
        } else {
            self.codewords_dispatched as f64 / self.codewords_total as f64
        }
    }

    /// Codewords per second of wall time.
    pub fn codewords_per_sec(&self) -> f64 {
        let secs = self.duration().as_secs_f64();
        if secs == 0.0 {
            0.0
        } else {
            self.codewords_dispatched as f64 / secs
        }
    }

    /// Print a human-readable summary to stdout.
    pub fn print_summary(&self) {
        println!("\n=== Scan Summary ===");
        println!("Duration: {} ms", self.duration().as_millis());
        println!(
            "Codewords: {} of {} ({:.1}%)",
            self.codewords_dispatched,
            self.codewords_total,
            self.progress() * 100.0
        );
        println!();

        println!("=== Generation ===");
        println!("Chunks: {}", self.chunks_received);
        println!("Symbols: {}", self.symbols_emitted);
        println!("Warm-up codewords: {}", self.warmup_codewords);
        println!("Padded codewords: {}", self.padded_codewords);
        println!();

        println!("=== Transmission ===");
        println!("Frame bits: {}", self.frame_bits);
        println!(
            "Estimated airtime: {:.3} s",
            self.estimated_airtime.as_secs_f64()
        );
        println!("Rate: {:.1} codewords/s", self.codewords_per_sec());
        println!();
    }

    /// Export metrics as a simple text format (for parsing/testing).
    pub fn export_text(&self) -> String {
        format!(
            "duration_ms={}\n\
             chunks_received={}\n\
             symbols_emitted={}\n\
             codewords_total={}\n\
             codewords_dispatched={}\n\
             warmup_codewords={}\n\
             padded_codewords={}\n\
             frame_bits={}\n\
             airtime_ms={}\n",
            self.duration().as_millis(),
            self.chunks_received,
            self.symbols_emitted,
            self.codewords_total,
            self.codewords_dispatched,
            self.warmup_codewords,
            self.padded_codewords,
            self.frame_bits,
            self.estimated_airtime.as_millis(),
        )
    }
}

impl Default for ScanMetrics {
    fn default() -> Self {
        Self::new(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_creation() {
        let metrics = ScanMetrics::new(10);
        assert!(metrics.end_time.is_none());
        assert!(metrics.duration().as_millis() < 100); // Should be recent
        assert_eq!(metrics.progress(), 0.0);
    }

    #[test]
    fn test_record_frame() {
        let mut metrics = ScanMetrics::new(4);
        metrics.record_frame(20, Duration::from_millis(5));
        metrics.record_frame(20, Duration::from_millis(5));

        assert_eq!(metrics.codewords_dispatched, 2);
        assert_eq!(metrics.frame_bits, 40);
        assert_eq!(metrics.estimated_airtime, Duration::from_millis(10));
        assert_eq!(metrics.progress(), 0.5);
    }

    #[test]
    fn test_complete_freezes_duration() {
        let mut metrics = ScanMetrics::new(1);
        std::thread::sleep(Duration::from_millis(5));
        metrics.complete();
        let first = metrics.duration();
        std::thread::sleep(Duration::from_millis(5));
        assert_eq!(metrics.duration(), first);
        assert!(metrics.codewords_per_sec() == 0.0);
    }

    #[test]
    fn test_export_text() {
        let mut metrics = ScanMetrics::new(3);
        metrics.chunks_received = 4;
        metrics.warmup_codewords = 1;
        metrics.record_frame(7, Duration::from_millis(2));

        let text = metrics.export_text();
        assert!(text.contains("chunks_received=4"));
        assert!(text.contains("codewords_total=3"));
        assert!(text.contains("codewords_dispatched=1"));
        assert!(text.contains("warmup_codewords=1"));
        assert!(text.contains("airtime_ms=2"));
    }
}
