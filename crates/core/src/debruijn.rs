//! Streaming de Bruijn sequence generation.
//!
//! The enumerator walks the classic recursive FKM construction and hands the
//! sequence to a callback in small chunks (at most n symbols each), so the
//! full k^n-symbol sequence never exists in memory.
//!
//! # Output layout
//!
//! ```text
//! warm-up: 1^n 2^n ... (k-1)^n      k-1 chunks of n symbols
//! body:    0^n ...      (k-1)       k^n symbols, lexicographically least
//!                                   de Bruijn sequence
//! ```
//!
//! The body always starts with `0^n`. Putting `(k-1)^n` directly in front of
//! it makes every window that would wrap around the end of the cyclic
//! sequence appear in the linear stream, so a receiver never needs the
//! wrap-around.
//!
//! # Chunking
//!
//! The body is emitted as one chunk per Lyndon word whose length p divides
//! n. Chunk boundaries carry no meaning; [`crate::assembler`] re-slices the
//! stream into codewords.
//!
//! # Cancellation
//!
//! The token is polled at every emission and before every branch. Once it
//! is seen, no further callback fires and the recursion unwinds.

use tracing::debug;

use crate::alphabet::Alphabet;
use crate::cancel::CancellationToken;
use crate::error::{ConfigError, Result};

/// Deepest window the recursion accepts. Bounds stack use.
pub const MAX_WINDOW_LEN: usize = 32;

/// How an enumeration ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Termination {
    /// Every symbol was emitted
    Completed,
    /// The cancellation token was observed
    Cancelled,
}

/// Size arithmetic for a k-symbol, length-n keyspace.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Keyspace {
    k: usize,
    n: usize,
    size: u64,
}

impl Keyspace {
    /// Validate `k` and `n` and compute k^n.
    ///
    /// # Errors
    /// - `ConfigError::AlphabetTooSmall` if k < 2
    /// - `ConfigError::WindowLengthZero` / `WindowTooLong` for n outside `1..=MAX_WINDOW_LEN`
    /// - `ConfigError::KeyspaceOverflow` if k^n does not fit in a `u64`
    pub fn new(k: usize, n: usize) -> std::result::Result<Self, ConfigError> {
        if k < 2 {
            return Err(ConfigError::AlphabetTooSmall { k });
        }
        if n == 0 {
            return Err(ConfigError::WindowLengthZero);
        }
        if n > MAX_WINDOW_LEN {
            return Err(ConfigError::WindowTooLong {
                n,
                max: MAX_WINDOW_LEN,
            });
        }

        let size = (k as u64)
            .checked_pow(n as u32)
            .ok_or(ConfigError::KeyspaceOverflow { k, n })?;

        Ok(Self { k, n, size })
    }

    /// Alphabet size.
    pub fn k(&self) -> usize {
        self.k
    }

    /// Window length.
    pub fn n(&self) -> usize {
        self.n
    }

    /// k^n, which is also the number of body symbols.
    pub fn size(&self) -> u64 {
        self.size
    }

    /// Synthetic codewords emitted before the body (k-1).
    pub fn warmup_codewords(&self) -> u64 {
        self.k as u64 - 1
    }

    /// Codewords sliced from the body, counting a padded final one.
    pub fn body_codewords(&self) -> u64 {
        self.size.div_ceil(self.n as u64)
    }

    /// Every codeword a full session dispatches.
    pub fn total_codewords(&self) -> u64 {
        self.warmup_codewords() + self.body_codewords()
    }

    /// Symbols needed to complete the final codeword (0 when n divides k^n).
    pub fn padding_symbols(&self) -> usize {
        let rem = (self.size % self.n as u64) as usize;
        (self.n - rem) % self.n
    }
}

/// Recursion state for one enumeration.
///
/// Owned by exactly one enumeration and dropped with it.
#[derive(Debug)]
pub struct SequenceEnumerator<'c> {
    k: u8,
    n: usize,
    /// Depth-indexed symbol choices, k*n long (index 0 stays 0)
    buffer: Vec<u8>,
    /// Symbols handed to the callback so far, warm-up included
    emitted: u64,
    cancel: &'c CancellationToken,
}

impl<'c> SequenceEnumerator<'c> {
    /// Prepare an enumeration of all length-`n` strings over `alphabet`.
    pub fn new(alphabet: &Alphabet, n: usize, cancel: &'c CancellationToken) -> Result<Self> {
        let keyspace = Keyspace::new(alphabet.len(), n)?;

        Ok(Self {
            k: keyspace.k() as u8,
            n,
            buffer: vec![0; keyspace.k() * n],
            emitted: 0,
            cancel,
        })
    }

    /// Symbols emitted so far.
    pub fn symbols_emitted(&self) -> u64 {
        self.emitted
    }

    /// Emit the warm-up words, then the de Bruijn body.
    ///
    /// Errors returned by `on_chunk` stop the enumeration and are passed
    /// through unchanged.
    pub fn run<F>(&mut self, mut on_chunk: F) -> Result<Termination>
    where
        F: FnMut(&[u8]) -> Result<()>,
    {
        if self.warm_up(&mut on_chunk)? == Termination::Cancelled {
            return Ok(Termination::Cancelled);
        }

        debug!(
            k = self.k,
            n = self.n,
            warmup_symbols = self.emitted,
            "warm-up done, starting recursion"
        );

        self.buffer.fill(0);
        self.descend(1, 1, &mut on_chunk)
    }

    fn warm_up<F>(&mut self, on_chunk: &mut F) -> Result<Termination>
    where
        F: FnMut(&[u8]) -> Result<()>,
    {
        let mut word = vec![0u8; self.n];
        for symbol in 1..self.k {
            if self.cancel.is_requested() {
                return Ok(Termination::Cancelled);
            }
            word.fill(symbol);
            self.emitted += self.n as u64;
            on_chunk(&word)?;
        }
        Ok(Termination::Completed)
    }

    /// FKM step at depth `t` with current period `p`.
    fn descend<F>(&mut self, t: usize, p: usize, on_chunk: &mut F) -> Result<Termination>
    where
        F: FnMut(&[u8]) -> Result<()>,
    {
        if self.cancel.is_requested() {
            return Ok(Termination::Cancelled);
        }

        if t > self.n {
            if self.n % p == 0 {
                self.emitted += p as u64;
                on_chunk(&self.buffer[1..=p])?;
            }
            return Ok(Termination::Completed);
        }

        self.buffer[t] = self.buffer[t - p];
        if self.descend(t + 1, p, on_chunk)? == Termination::Cancelled {
            return Ok(Termination::Cancelled);
        }

        let first = self.buffer[t - p] + 1;
        for symbol in first..self.k {
            if self.cancel.is_requested() {
                return Ok(Termination::Cancelled);
            }
            self.buffer[t] = symbol;
            if self.descend(t + 1, t, on_chunk)? == Termination::Cancelled {
                return Ok(Termination::Cancelled);
            }
        }

        Ok(Termination::Completed)
    }
}

/// Enumerate every length-`n` string over `alphabet`, chunk by chunk.
///
/// Shorthand for building a [`SequenceEnumerator`] and running it.
///
/// # Errors
/// `Error::InvalidConfiguration` if k < 2, n is 0 or above
/// [`MAX_WINDOW_LEN`], or k^n overflows; otherwise whatever `on_chunk`
/// returns.
pub fn generate<F>(
    alphabet: &Alphabet,
    n: usize,
    cancel: &CancellationToken,
    on_chunk: F,
) -> Result<Termination>
where
    F: FnMut(&[u8]) -> Result<()>,
{
    SequenceEnumerator::new(alphabet, n, cancel)?.run(on_chunk)
}
