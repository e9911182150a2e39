//! Bit-level building blocks for OOK frames.
//!
//! Protocol definitions describe their on-air fragments as strings of `0` and
//! `1` (a sync literal, one pattern per symbol). [`BitPattern`] is the parsed
//! form of such a string, [`BitWriter`] concatenates patterns into a packed
//! buffer and [`BitReader`] walks the bits back out.
//!
//! Bits are stored MSB-first. The final byte is padded with zeros; the exact
//! bit count travels next to the bytes so padding is never mistaken for data.
//!
//! # Example
//! ```
//! use ook_scan_core::bitio::{BitPattern, BitReader, BitWriter};
//!
//! let sync: BitPattern = "101".parse().unwrap();
//! let mut writer = BitWriter::new();
//! writer.write_pattern(&sync).unwrap();
//! writer.write_bits(0b11, 2).unwrap();
//!
//! let bit_len = writer.bit_len();
//! let bytes = writer.finish();
//! assert_eq!(bytes, vec![0b10111000]);
//!
//! let bits: Vec<bool> = BitReader::new(&bytes, bit_len).collect();
//! assert_eq!(bits, vec![true, false, true, true, true]);
//! ```

use std::fmt;
use std::str::FromStr;

use crate::error::{BitIoError, ConfigError, Result};

/// Longest pattern a single [`BitWriter::write_bits`] call can carry.
pub const MAX_PATTERN_BITS: usize = 64;

/// A short run of bits parsed from a `0`/`1` string.
///
/// # Invariants
/// - `len` is in `1..=64`
/// - only the lowest `len` bits of `value` are set
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BitPattern {
    value: u64,
    len: u8,
}

impl BitPattern {
    /// Number of bits in the pattern.
    pub fn len(&self) -> usize {
        self.len as usize
    }

    /// Always false; kept for symmetry with `len`.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// The bits, right-aligned.
    pub fn value(&self) -> u64 {
        self.value
    }
}

impl FromStr for BitPattern {
    type Err = ConfigError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        if s.is_empty() {
            return Err(ConfigError::InvalidBitPattern {
                pattern: s.to_string(),
            });
        }
        if s.len() > MAX_PATTERN_BITS {
            return Err(ConfigError::BitPatternTooLong {
                len: s.len(),
                max: MAX_PATTERN_BITS,
            });
        }

        let mut value = 0u64;
        for c in s.chars() {
            let bit = match c {
                '0' => 0,
                '1' => 1,
                _ => {
                    return Err(ConfigError::InvalidBitPattern {
                        pattern: s.to_string(),
                    })
                }
            };
            value = (value << 1) | bit;
        }

        Ok(Self {
            value,
            len: s.len() as u8,
        })
    }
}

impl fmt::Display for BitPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for i in (0..self.len()).rev() {
            let bit = (self.value >> i) & 1;
            f.write_str(if bit == 1 { "1" } else { "0" })?;
        }
        Ok(())
    }
}

/// Writes bits MSB-first into a byte buffer.
///
/// # Invariants
/// - `bit_count` is always < 8
#[derive(Debug, Clone)]
pub struct BitWriter {
    /// Completed bytes
    bytes: Vec<u8>,
    /// Accumulator for the current partial byte (MSB-aligned)
    bit_buffer: u8,
    /// Number of bits in bit_buffer (0-7)
    bit_count: u8,
}

impl BitWriter {
    /// Create a new BitWriter with empty output.
    pub fn new() -> Self {
        Self::with_capacity(0)
    }

    /// Create a writer expecting roughly `bits` bits.
    pub fn with_capacity(bits: usize) -> Self {
        Self {
            bytes: Vec::with_capacity(bits.div_ceil(8)),
            bit_buffer: 0,
            bit_count: 0,
        }
    }

    /// Write the lowest `count` bits of `value`, most significant first.
    ///
    /// # Errors
    /// Returns `BitIoError::InvalidBitCount` if count > 64.
    pub fn write_bits(&mut self, value: u64, count: usize) -> Result<()> {
        if count > 64 {
            return Err(BitIoError::InvalidBitCount(count).into());
        }

        let mut remaining = count;
        while remaining > 0 {
            let room = 8 - self.bit_count as usize;
            let take = remaining.min(room);
            let shift = remaining - take;
            let bits = ((value >> shift) & ((1u64 << take) - 1)) as u8;

            self.bit_buffer |= bits << (room - take);
            self.bit_count += take as u8;

            if self.bit_count == 8 {
                self.bytes.push(self.bit_buffer);
                self.bit_buffer = 0;
                self.bit_count = 0;
            }

            remaining -= take;
        }

        Ok(())
    }

    /// Append a whole pattern.
    pub fn write_pattern(&mut self, pattern: &BitPattern) -> Result<()> {
        self.write_bits(pattern.value, pattern.len())
    }

    /// Finish writing and return the output bytes, zero-padded.
    pub fn finish(mut self) -> Vec<u8> {
        if self.bit_count > 0 {
            self.bytes.push(self.bit_buffer);
        }
        self.bytes
    }

    /// Return the total number of bits written (including partial byte).
    pub fn bit_len(&self) -> usize {
        self.bytes.len() * 8 + self.bit_count as usize
    }
}

impl Default for BitWriter {
    fn default() -> Self {
        Self::new()
    }
}

/// Reads bits MSB-first from a packed buffer, stopping at `bit_len`.
#[derive(Debug, Clone)]
pub struct BitReader<'a> {
    data: &'a [u8],
    bit_len: usize,
    bit_position: usize,
}

impl<'a> BitReader<'a> {
    /// Create a reader over the first `bit_len` bits of `data`.
    ///
    /// `bit_len` is clamped to the bits actually present.
    pub fn new(data: &'a [u8], bit_len: usize) -> Self {
        Self {
            data,
            bit_len: bit_len.min(data.len() * 8),
            bit_position: 0,
        }
    }

    /// Read a single bit, or `None` at the end.
    pub fn read_bit(&mut self) -> Option<bool> {
        if self.bit_position >= self.bit_len {
            return None;
        }
        let byte = self.data[self.bit_position / 8];
        let bit = (byte >> (7 - self.bit_position % 8)) & 1;
        self.bit_position += 1;
        Some(bit == 1)
    }

    /// Return the number of bits remaining.
    pub fn bits_remaining(&self) -> usize {
        self.bit_len - self.bit_position
    }
}

impl Iterator for BitReader<'_> {
    type Item = bool;

    fn next(&mut self) -> Option<bool> {
        self.read_bit()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let n = self.bits_remaining();
        (n, Some(n))
    }
}
