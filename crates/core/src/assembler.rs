//! Reassembly of the symbol stream into fixed-width codewords.
//!
//! The enumerator delivers symbols in chunks whose boundaries have nothing
//! to do with codeword boundaries: one chunk may finish two codewords, one,
//! or only part of one. [`PacketAssembler`] collects symbols until it holds n
//! of them and then hands the codeword downstream *before* looking at the
//! next symbol.
//!
//! # Bounded memory
//!
//! At most n - 1 symbols are held between calls. There is never a queue of
//! completed codewords; the downstream step runs synchronously, which is what
//! lets transmission timing pace the whole scan.
//!
//! # Stream tail
//!
//! When n does not divide the stream length, [`PacketAssembler::finish`]
//! completes the last codeword with a caller-supplied fill symbol.

use tracing::debug;

use crate::alphabet::Codeword;
use crate::cancel::CancellationToken;
use crate::debruijn::Termination;
use crate::error::{ConfigError, Result};

/// Slices a chunked symbol stream into n-symbol codewords.
#[derive(Debug)]
pub struct PacketAssembler<'c> {
    n: usize,
    /// Symbols of the codeword being built (always < n between calls)
    pending: Vec<u8>,
    cancel: Option<&'c CancellationToken>,
    chunks_received: u64,
    dispatched: u64,
}

impl<'c> PacketAssembler<'c> {
    /// Create an assembler for codewords of `n` symbols.
    ///
    /// # Errors
    /// `ConfigError::WindowLengthZero` if `n` is 0.
    pub fn new(n: usize) -> std::result::Result<Self, ConfigError> {
        if n == 0 {
            return Err(ConfigError::WindowLengthZero);
        }
        Ok(Self {
            n,
            pending: Vec::with_capacity(n),
            cancel: None,
            chunks_received: 0,
            dispatched: 0,
        })
    }

    /// Create an assembler that stops dispatching once `cancel` is requested.
    pub fn with_cancel(
        n: usize,
        cancel: &'c CancellationToken,
    ) -> std::result::Result<Self, ConfigError> {
        Ok(Self {
            cancel: Some(cancel),
            ..Self::new(n)?
        })
    }

    /// Feed one chunk, dispatching every codeword it completes.
    ///
    /// Returns `Termination::Cancelled` without dispatching if the token was
    /// requested before a completed codeword could be handed on; the symbols
    /// of that codeword are dropped.
    pub fn push<F>(&mut self, chunk: &[u8], mut on_codeword: F) -> Result<Termination>
    where
        F: FnMut(&Codeword) -> Result<()>,
    {
        self.chunks_received += 1;

        for &symbol in chunk {
            self.pending.push(symbol);
            if self.pending.len() == self.n
                && self.dispatch(&mut on_codeword)? == Termination::Cancelled
            {
                return Ok(Termination::Cancelled);
            }
        }

        Ok(Termination::Completed)
    }

    /// Complete and dispatch a trailing partial codeword, if any.
    ///
    /// Returns the number of `fill` symbols appended (0 when the stream
    /// ended on a codeword boundary).
    pub fn finish<F>(&mut self, fill: u8, mut on_codeword: F) -> Result<usize>
    where
        F: FnMut(&Codeword) -> Result<()>,
    {
        if self.pending.is_empty() {
            return Ok(0);
        }

        let padding = self.n - self.pending.len();
        self.pending.resize(self.n, fill);
        debug!(padding, "padding final codeword");

        match self.dispatch(&mut on_codeword)? {
            Termination::Completed => Ok(padding),
            Termination::Cancelled => Ok(0),
        }
    }

    fn dispatch<F>(&mut self, on_codeword: &mut F) -> Result<Termination>
    where
        F: FnMut(&Codeword) -> Result<()>,
    {
        let word = Codeword::new(std::mem::replace(
            &mut self.pending,
            Vec::with_capacity(self.n),
        ));

        if self.cancel.is_some_and(|c| c.is_requested()) {
            return Ok(Termination::Cancelled);
        }

        on_codeword(&word)?;
        self.dispatched += 1;
        Ok(Termination::Completed)
    }

    /// Symbols waiting for the rest of their codeword.
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    /// Codewords handed downstream so far.
    pub fn dispatched(&self) -> u64 {
        self.dispatched
    }

    /// Chunks fed in so far.
    pub fn chunks_received(&self) -> u64 {
        self.chunks_received
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;

    fn collect(n: usize, chunks: &[&[u8]]) -> Vec<Vec<u8>> {
        let mut assembler = PacketAssembler::new(n).unwrap();
        let mut words = Vec::new();
        for chunk in chunks {
            assembler
                .push(chunk, |w| {
                    words.push(w.symbols().to_vec());
                    Ok(())
                })
                .unwrap();
        }
        words
    }

    #[test]
    fn test_chunk_completes_exactly_one() {
        let words = collect(3, &[&[0, 1, 2]]);
        assert_eq!(words, vec![vec![0, 1, 2]]);
    }

    #[test]
    fn test_chunk_completes_several() {
        let words = collect(2, &[&[0, 1, 1, 0, 1]]);
        assert_eq!(words, vec![vec![0, 1], vec![1, 0]]);
    }

    #[test]
    fn test_codeword_spans_chunks() {
        let words = collect(4, &[&[0], &[1, 2], &[], &[2, 1, 0]]);
        assert_eq!(words, vec![vec![0, 1, 2, 2]]);
    }

    #[test]
    fn test_partial_is_held() {
        let mut assembler = PacketAssembler::new(3).unwrap();
        let mut count = 0;
        assembler
            .push(&[1, 1, 1, 0, 0], |_| {
                count += 1;
                Ok(())
            })
            .unwrap();
        assert_eq!(count, 1);
        assert_eq!(assembler.pending_len(), 2);
        assert_eq!(assembler.dispatched(), 1);
        assert_eq!(assembler.chunks_received(), 1);
    }

    #[test]
    fn test_finish_pads_tail() {
        let mut assembler = PacketAssembler::new(4).unwrap();
        assembler.push(&[2, 1], |_| Ok(())).unwrap();

        let mut words = Vec::new();
        let padding = assembler
            .finish(0, |w| {
                words.push(w.symbols().to_vec());
                Ok(())
            })
            .unwrap();

        assert_eq!(padding, 2);
        assert_eq!(words, vec![vec![2, 1, 0, 0]]);
        assert_eq!(assembler.pending_len(), 0);
    }

    #[test]
    fn test_finish_on_boundary() {
        let mut assembler = PacketAssembler::new(2).unwrap();
        assembler.push(&[1, 0], |_| Ok(())).unwrap();
        let mut flushed = 0;
        let padding = assembler
            .finish(0, |_| {
                flushed += 1;
                Ok(())
            })
            .unwrap();
        assert_eq!(padding, 0);
        assert_eq!(flushed, 0);
    }

    #[test]
    fn test_cancel_between_codewords_in_one_chunk() {
        let cancel = CancellationToken::new();
        let mut assembler = PacketAssembler::with_cancel(1, &cancel).unwrap();
        let mut seen = Vec::new();

        let result = assembler
            .push(&[0, 1, 2, 3], |w| {
                seen.push(w.symbols()[0]);
                if seen.len() == 2 {
                    cancel.request();
                }
                Ok(())
            })
            .unwrap();

        assert_eq!(result, Termination::Cancelled);
        assert_eq!(seen, vec![0, 1]);
        assert_eq!(assembler.dispatched(), 2);
    }

    #[test]
    fn test_downstream_error_propagates() {
        let mut assembler = PacketAssembler::new(1).unwrap();
        let result = assembler.push(&[0, 1], |_| Err(Error::Worker("radio busy".into())));
        assert!(matches!(result, Err(Error::Worker(_))));
        assert_eq!(assembler.dispatched(), 0);
    }

    #[test]
    fn test_zero_length_rejected() {
        assert!(matches!(
            PacketAssembler::new(0),
            Err(ConfigError::WindowLengthZero)
        ));
        let cancel = CancellationToken::new();
        assert!(PacketAssembler::with_cancel(0, &cancel).is_err());
    }
}
