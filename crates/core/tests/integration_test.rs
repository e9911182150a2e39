//! Integration tests for the full scan pipeline.
//!
//! These tests verify end-to-end behavior: enumerate -> assemble -> encode ->
//! transmit, checking coverage of the keyspace, codeword counts, chunk
//! invariance and cancellation through the public API only.

use std::collections::HashSet;
use std::thread;
use std::time::Duration;

use ook_scan_core::{
    generate, Alphabet, CancellationToken, Codeword, ConfigError, Error, Frame, LiveFields,
    PacketAssembler, ProtocolDefinition, RecordingSink, ScanOptions, ScanOutcome, ScanSession,
    TemplateEncoder, TransmissionSink, TxParams, WordTiming,
};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

fn alphabet(k: usize) -> Alphabet {
    Alphabet::new("0123456789".chars().take(k)).expect("alphabet")
}

/// Whole emitted stream (warm-up + body) and its chunk boundaries.
fn stream(k: usize, n: usize) -> (Vec<u8>, Vec<Vec<u8>>) {
    let cancel = CancellationToken::new();
    let mut chunks = Vec::new();
    generate(&alphabet(k), n, &cancel, |chunk| {
        chunks.push(chunk.to_vec());
        Ok(())
    })
    .expect("generation failed");
    (chunks.concat(), chunks)
}

fn assemble(n: usize, chunks: &[Vec<u8>]) -> Vec<Vec<u8>> {
    let mut assembler = PacketAssembler::new(n).expect("assembler");
    let mut words = Vec::new();
    for chunk in chunks {
        assembler
            .push(chunk, |w| {
                words.push(w.symbols().to_vec());
                Ok(())
            })
            .expect("assembly failed");
    }
    words
}

fn timing() -> WordTiming {
    WordTiming {
        symbol_clock_hz: 20_000,
        clocks_per_fragment: 4,
        repeat_count: 1,
        pause_symbols: 0,
    }
}

fn definition(address: &str, template: &str) -> ProtocolDefinition {
    ProtocolDefinition {
        name: "it".into(),
        address_symbols: address.into(),
        data_symbols: "01".into(),
        template: template.into(),
        sync: "101".into(),
        bit_patterns: vec!["10".into(), "11".into(), "01".into()],
        timing: timing(),
    }
}

/// k=2, n=2: warm-up `11`, body `0011`, codewords 11 | 00 | 11.
#[test]
fn test_binary_window_two_end_to_end() {
    let (symbols, chunks) = stream(2, 2);
    assert_eq!(chunks, vec![vec![1, 1], vec![0], vec![0, 1], vec![1]]);

    // cyclic windows of the body: 00, 01, 11, 10
    let body = &symbols[2..];
    let windows: Vec<Vec<u8>> = (0..4).map(|i| vec![body[i], body[(i + 1) % 4]]).collect();
    assert_eq!(
        windows,
        vec![vec![0, 0], vec![0, 1], vec![1, 1], vec![1, 0]]
    );

    let mut def = definition("01", "AA");
    def.bit_patterns = vec!["0".into(), "1".into()];
    let session = ScanSession::new(&def, LiveFields::default(), ScanOptions::default())
        .expect("valid configuration");
    let mut sink = RecordingSink::new();
    let report = session
        .run(&mut sink, &mut (), &CancellationToken::new())
        .expect("scan failed");

    let frames: Vec<String> = sink.frames().iter().map(Frame::to_bit_string).collect();
    assert_eq!(frames, vec!["11", "00", "11"]);
    assert_eq!(report.outcome, ScanOutcome::Completed);
}

/// Every length-n string shows up as a window of the emitted stream.
#[test]
fn test_linear_stream_covers_keyspace() {
    for k in 2..=6usize {
        for n in 1..=6usize {
            let size = k.pow(n as u32);
            if size > 50_000 {
                continue;
            }
            let (symbols, _) = stream(k, n);
            assert_eq!(symbols.len(), (k - 1) * n + size, "k={k} n={n}");

            let windows: HashSet<&[u8]> = symbols.windows(n).collect();
            assert_eq!(windows.len(), size, "k={k} n={n}: missing windows");
        }
    }
}

/// With n | k^n the body assembles into exactly k^n / n codewords.
#[test]
fn test_body_codeword_count() {
    for k in 2..=6usize {
        for n in 1..=6usize {
            let size = k.pow(n as u32);
            if size > 50_000 || size % n != 0 {
                continue;
            }
            let (_, chunks) = stream(k, n);
            let words = assemble(n, &chunks);

            assert_eq!(words.len(), (k - 1) + size / n, "k={k} n={n}");
            assert!(words.iter().all(|w| w.len() == n));
        }
    }
}

/// Same symbols, any chunking: same codewords.
#[test]
fn test_chunk_invariance() {
    let mut rng = ChaCha8Rng::seed_from_u64(0x00C0_FFEE);

    for (k, n) in [(2, 5), (3, 4), (4, 3), (3, 5)] {
        let (symbols, chunks) = stream(k, n);
        let expected = assemble(n, &chunks);

        for _ in 0..8 {
            let mut repartitioned = Vec::new();
            let mut rest = symbols.as_slice();
            while !rest.is_empty() {
                let take = rng.gen_range(0..=2 * n).min(rest.len());
                let (head, tail) = rest.split_at(take);
                repartitioned.push(head.to_vec());
                rest = tail;
            }
            assert_eq!(assemble(n, &repartitioned), expected, "k={k} n={n}");
        }
    }
}

/// Identical inputs give identical frames.
#[test]
fn test_determinism() {
    let run = || {
        let session = ScanSession::new(
            &definition("01F", "SAAAD"),
            LiveFields::new(vec![1]),
            ScanOptions::default(),
        )
        .expect("valid configuration");
        let mut sink = RecordingSink::new();
        session
            .run(&mut sink, &mut (), &CancellationToken::new())
            .expect("scan failed");
        sink.into_frames()
    };
    assert_eq!(run(), run());
}

/// Sink that cancels the session after a fixed number of frames.
struct CancelAfter {
    cancel: CancellationToken,
    limit: usize,
    seen: Vec<Frame>,
}

impl TransmissionSink for CancelAfter {
    fn transmit(&mut self, frame: &Frame, _params: &TxParams) {
        self.seen.push(frame.clone());
        if self.seen.len() == self.limit {
            self.cancel.request();
        }
    }
}

/// Cancelling during codeword m means codeword m+1 is never transmitted.
#[test]
fn test_cancel_after_m_codewords() {
    let session = ScanSession::new(
        &definition("01F", "SAAAA"),
        LiveFields::default(),
        ScanOptions::default(),
    )
    .expect("valid configuration");

    for m in [1, 2, 3, 7, 20] {
        let cancel = CancellationToken::new();
        let mut sink = CancelAfter {
            cancel: cancel.clone(),
            limit: m,
            seen: Vec::new(),
        };
        let report = session
            .run(&mut sink, &mut (), &cancel)
            .expect("scan failed");

        assert_eq!(report.outcome, ScanOutcome::Cancelled, "m={m}");
        assert_eq!(report.codewords_done, m as u64, "m={m}");
        assert_eq!(sink.seen.len(), m, "m={m}");
    }
}

/// A token requested before the run starts produces no frames at all.
#[test]
fn test_pre_cancelled_session() {
    let session = ScanSession::new(
        &definition("01", "SAA"),
        LiveFields::default(),
        ScanOptions::default(),
    )
    .expect("valid configuration");
    let cancel = CancellationToken::new();
    cancel.request();

    let mut sink = RecordingSink::new();
    let report = session.run(&mut sink, &mut (), &cancel).expect("scan failed");
    assert_eq!(report.outcome, ScanOutcome::Cancelled);
    assert!(sink.frames().is_empty());
    assert_eq!(report.to_string(), "partial, 0 of 3 done");
}

/// Template SAADD, sync 101, live data 1 with pattern 11, codeword 01.
#[test]
fn test_frame_layout() {
    let protocol = definition("01", "SAADD").compile().expect("valid definition");
    let encoder = TemplateEncoder::new(&protocol);
    let word = Codeword::parse("01", protocol.address_alphabet()).expect("codeword");
    let live = LiveFields::parse("11", protocol.data_alphabet().expect("data alphabet"))
        .expect("live fields");

    let frame = encoder.encode(&word, &live).expect("encoding failed");
    assert_eq!(frame.to_bit_string(), concat!("101", "10", "11", "11", "11"));
}

/// Every frame of a full scan carries the same sync and live data bits.
#[test]
fn test_live_fields_constant_across_scan() {
    let session = ScanSession::new(
        &definition("01F", "SAADD"),
        LiveFields::new(vec![0, 1]),
        ScanOptions::default(),
    )
    .expect("valid configuration");
    let mut sink = RecordingSink::new();
    let report = session
        .run(&mut sink, &mut (), &CancellationToken::new())
        .expect("scan failed");

    // 2 warm-up + ceil(9 / 2)
    assert_eq!(report.codewords_done, 7);
    for frame in sink.frames() {
        let bits = frame.to_bit_string();
        assert!(bits.starts_with("101"), "{bits}");
        assert!(bits.ends_with("1011"), "{bits}");
    }
}

/// Spawned session cancelled from the controller thread.
#[test]
fn test_spawned_session_cancel() {
    let session = ScanSession::new(
        &definition("01F", "SAAAAAAAA"),
        LiveFields::default(),
        ScanOptions {
            inter_code_delay: Duration::from_millis(1),
        },
    )
    .expect("valid configuration");
    let total = session.total_codewords();

    let handle = session
        .spawn(RecordingSink::new(), ())
        .expect("worker should start");
    thread::sleep(Duration::from_millis(20));
    handle.cancel();

    let (report, sink) = handle.join().expect("worker failed");
    assert_eq!(report.outcome, ScanOutcome::Cancelled);
    assert!(report.codewords_done < total);
    assert_eq!(sink.frames().len() as u64, report.codewords_done);
}

#[test]
fn test_invalid_configurations_rejected() {
    let live = LiveFields::default;
    let options = ScanOptions::default;

    let long = format!("S{}", "A".repeat(33));
    assert!(matches!(
        ScanSession::new(&definition("01", &long), live(), options()),
        Err(Error::InvalidConfiguration(ConfigError::WindowTooLong { n: 33, .. }))
    ));

    assert!(matches!(
        ScanSession::new(&definition("0", "SAA"), live(), options()),
        Err(Error::InvalidConfiguration(ConfigError::AlphabetTooSmall { k: 1 }))
    ));

    assert!(matches!(
        ScanSession::new(&definition("01", "SAQ"), live(), options()),
        Err(Error::InvalidConfiguration(ConfigError::UnknownFieldTag {
            tag: 'Q',
            position: 2
        }))
    ));

    assert!(matches!(
        ScanSession::new(&definition("01", "SDD"), LiveFields::new(vec![0, 0]), options()),
        Err(Error::InvalidConfiguration(ConfigError::WindowLengthZero))
    ));

    assert!(matches!(
        ScanSession::new(&definition("01", "SAD"), LiveFields::new(vec![5]), options()),
        Err(Error::InvalidConfiguration(ConfigError::LiveSymbolOutOfRange { index: 5, k: 2 }))
    ));
}
