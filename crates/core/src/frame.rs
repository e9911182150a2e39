//! Frame encoding: codeword + live fields -> transmittable bits.
//!
//! The encoder walks the protocol template once per codeword with two
//! independent cursors:
//!
//! ```text
//! template:  S    A    A    D    D
//!                 |    |    |    |
//! codeword: [c0, c1]   |    |    |      address cursor
//! live:               [l0,  l1]         data cursor
//! ```
//!
//! Sync fields append the sync literal. Address fields consume the next
//! codeword symbol, Data fields the next live symbol; both are mapped through
//! the protocol's symbol-to-pattern table.

use std::fmt;

use crate::alphabet::Codeword;
use crate::bitio::{BitPattern, BitReader, BitWriter};
use crate::error::{EncodeError, Result};
use crate::template::{FieldTag, LiveFields, Protocol};

/// Encoded bits of one protocol word.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    /// Packed MSB-first, last byte zero-padded
    bytes: Vec<u8>,
    bit_len: usize,
}

impl Frame {
    fn from_writer(writer: BitWriter) -> Self {
        let bit_len = writer.bit_len();
        Self {
            bytes: writer.finish(),
            bit_len,
        }
    }

    /// Exact number of bits.
    pub fn bit_len(&self) -> usize {
        self.bit_len
    }

    /// Packed bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Iterate over the bits in transmission order.
    pub fn bits(&self) -> BitReader<'_> {
        BitReader::new(&self.bytes, self.bit_len)
    }

    /// Render as a `0`/`1` string.
    pub fn to_bit_string(&self) -> String {
        self.bits().map(|b| if b { '1' } else { '0' }).collect()
    }
}

impl fmt::Display for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_bit_string())
    }
}

/// Template-driven encoder bound to one validated protocol.
#[derive(Debug, Clone, Copy)]
pub struct TemplateEncoder<'p> {
    protocol: &'p Protocol,
}

impl<'p> TemplateEncoder<'p> {
    pub fn new(protocol: &'p Protocol) -> Self {
        Self { protocol }
    }

    /// Encode one scanned codeword with the session's live data values.
    ///
    /// # Errors
    /// - `EncodeError::CodewordExhausted` if the template has more Address
    ///   fields than the codeword has symbols
    /// - `EncodeError::CodewordLeftover` if codeword symbols remain at the end
    /// - `EncodeError::LiveFieldsExhausted` if Data fields outnumber live values
    /// - `EncodeError::SymbolOutOfRange` for a symbol outside its field's alphabet
    pub fn encode(&self, codeword: &Codeword, live: &LiveFields) -> Result<Frame> {
        let mut writer = BitWriter::with_capacity(self.protocol.max_frame_bits());
        let mut address = codeword.symbols().iter();
        let mut data = live.symbols().iter();

        for (field, tag) in self.protocol.template().fields().iter().enumerate() {
            match tag {
                FieldTag::Sync => self.write_sync(&mut writer)?,
                FieldTag::Address => {
                    let &symbol = address.next().ok_or(EncodeError::CodewordExhausted {
                        field,
                        len: codeword.len(),
                    })?;
                    writer.write_pattern(self.field_pattern(field, *tag, symbol)?)?;
                }
                FieldTag::Data => {
                    let &symbol = data
                        .next()
                        .ok_or(EncodeError::LiveFieldsExhausted { field })?;
                    writer.write_pattern(self.field_pattern(field, *tag, symbol)?)?;
                }
            }
        }

        let leftover = address.len();
        if leftover > 0 {
            return Err(EncodeError::CodewordLeftover { leftover }.into());
        }

        Ok(Frame::from_writer(writer))
    }

    /// Encode a single hand-picked word.
    ///
    /// `word` holds one symbol index per Address or Data field, in template
    /// order. Sync fields are filled in as usual.
    pub fn encode_word(&self, word: &[u8]) -> Result<Frame> {
        let template = self.protocol.template();
        let expected = template.address_count() + template.data_count();
        if word.len() != expected {
            return Err(EncodeError::WordLengthMismatch {
                expected,
                actual: word.len(),
            }
            .into());
        }

        let mut writer = BitWriter::with_capacity(self.protocol.max_frame_bits());
        let mut symbols = word.iter();
        for (field, tag) in template.fields().iter().enumerate() {
            match tag {
                FieldTag::Sync => self.write_sync(&mut writer)?,
                FieldTag::Address | FieldTag::Data => {
                    if let Some(&symbol) = symbols.next() {
                        writer.write_pattern(self.field_pattern(field, *tag, symbol)?)?;
                    }
                }
            }
        }

        Ok(Frame::from_writer(writer))
    }

    fn write_sync(&self, writer: &mut BitWriter) -> Result<()> {
        // compile() guarantees a sync pattern whenever the template has a Sync field
        if let Some(sync) = self.protocol.sync() {
            writer.write_pattern(sync)?;
        }
        Ok(())
    }

    /// Pattern for `symbol` at template position `field`, after checking it
    /// against the alphabet that field draws from.
    fn field_pattern(&self, field: usize, tag: FieldTag, symbol: u8) -> Result<&'p BitPattern> {
        let k = match tag {
            FieldTag::Address => self.protocol.address_alphabet().len(),
            FieldTag::Data => self.protocol.data_alphabet().map_or(0, |a| a.len()),
            FieldTag::Sync => 0,
        };
        if symbol as usize >= k {
            return Err(EncodeError::SymbolOutOfRange {
                field,
                index: symbol as usize,
                k,
            }
            .into());
        }
        self.pattern(symbol)
    }

    fn pattern(&self, symbol: u8) -> Result<&'p BitPattern> {
        let table = self.protocol.patterns();
        table.get(symbol as usize).ok_or_else(|| {
            EncodeError::NoBitPattern {
                index: symbol as usize,
                table: table.len(),
            }
            .into()
        })
    }
}
