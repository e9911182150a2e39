//! ook-scan-core: exhaustive address scanning for OOK remote-control protocols
//!
//! This library enumerates every fixed-length address code over a small
//! symbol alphabet in de Bruijn order and turns each code into a frame ready
//! for transmission:
//! - Generates the sequence incrementally, never holding all k^n symbols
//! - Slices the symbol stream into codewords regardless of chunk boundaries
//! - Encodes each codeword through a protocol template
//! - Paces the scan on the sink and stops cooperatively when cancelled
//!
//! # Architecture
//!
//! - `alphabet`: Symbol sets and codewords
//! - `debruijn`: Streaming FKM de Bruijn enumerator
//! - `cancel`: Shared cancellation token
//! - `assembler`: Chunk-to-codeword reassembly with bounded memory
//! - `bitio`: Bit patterns and MSB-first bit writing
//! - `template`: Protocol templates, definitions and timing
//! - `frame`: Template-driven frame encoder
//! - `sink`: Transmission and progress seams
//! - `session`: Scan sessions on a dedicated worker
//! - `metrics`: Observable scan behavior
//!
//! # Example
//!
//! ```
//! use ook_scan_core::{
//!     CancellationToken, LiveFields, ProtocolDefinition, RecordingSink, ScanOptions,
//!     ScanOutcome, ScanSession, WordTiming,
//! };
//!
//! let definition = ProtocolDefinition {
//!     name: "doc".into(),
//!     address_symbols: "01".into(),
//!     data_symbols: String::new(),
//!     template: "SAA".into(),
//!     sync: "1".into(),
//!     bit_patterns: vec!["0".into(), "1".into()],
//!     timing: WordTiming {
//!         symbol_clock_hz: 10_000,
//!         clocks_per_fragment: 1,
//!         repeat_count: 1,
//!         pause_symbols: 0,
//!     },
//! };
//!
//! let session = ScanSession::new(&definition, LiveFields::default(), ScanOptions::default())?;
//! let mut sink = RecordingSink::new();
//! let report = session.run(&mut sink, &mut (), &CancellationToken::new())?;
//!
//! assert_eq!(report.outcome, ScanOutcome::Completed);
//! assert_eq!(sink.frames().len(), 3);
//! # Ok::<(), ook_scan_core::Error>(())
//! ```

pub mod alphabet;
pub mod assembler;
pub mod bitio;
pub mod cancel;
pub mod debruijn;
pub mod error;
pub mod frame;
pub mod metrics;
pub mod session;
pub mod sink;
pub mod template;

// Re-export commonly used types
pub use alphabet::{Alphabet, Codeword};
pub use assembler::PacketAssembler;
pub use cancel::CancellationToken;
pub use debruijn::{generate, Keyspace, SequenceEnumerator, Termination};
pub use error::{ConfigError, EncodeError, Error, Result};
pub use frame::{Frame, TemplateEncoder};
pub use metrics::ScanMetrics;
pub use session::{ScanHandle, ScanOptions, ScanOutcome, ScanReport, ScanSession};
pub use sink::{ProgressFn, ProgressObserver, RecordingSink, TransmissionSink};
pub use template::{
    FieldTag, LiveFields, Protocol, ProtocolDefinition, ProtocolTemplate, TxParams, WordTiming,
};
