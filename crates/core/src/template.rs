//! Protocol templates and their validated, ready-to-encode form.
//!
//! A protocol word is described by a tag string such as `"SAAAAAAAADDDD"`:
//!
//! ```text
//! S  Sync     fixed literal (the sync pattern)
//! A  Address  one symbol taken from the codeword being scanned
//! D  Data     one symbol taken from the live, user-chosen values
//! ```
//!
//! A [`ProtocolDefinition`] is the raw, externally supplied description.
//! [`ProtocolDefinition::compile`] checks it once and produces a [`Protocol`]
//! that the encoder and session can use without further checks.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use crate::alphabet::Alphabet;
use crate::bitio::BitPattern;
use crate::debruijn::Keyspace;
use crate::error::ConfigError;

/// Maximum entries in the symbol-to-bit-pattern table.
pub const MAX_BIT_PATTERNS: usize = 3;

/// Baseband sample rate used for OOK transmission, in Hz.
pub const OOK_SAMPLE_RATE: u32 = 2_280_000;

/// One position in a protocol word.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldTag {
    Sync,
    Address,
    Data,
}

impl FieldTag {
    fn from_char(c: char) -> Option<Self> {
        match c {
            'S' => Some(FieldTag::Sync),
            'A' => Some(FieldTag::Address),
            'D' => Some(FieldTag::Data),
            _ => None,
        }
    }

    fn as_char(self) -> char {
        match self {
            FieldTag::Sync => 'S',
            FieldTag::Address => 'A',
            FieldTag::Data => 'D',
        }
    }
}

/// Ordered field layout of a protocol word.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProtocolTemplate {
    fields: Vec<FieldTag>,
}

impl ProtocolTemplate {
    /// Fields in transmission order.
    pub fn fields(&self) -> &[FieldTag] {
        &self.fields
    }

    /// Total number of fields.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Never true for a parsed template.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Number of Address fields, i.e. the codeword length n.
    pub fn address_count(&self) -> usize {
        self.count(FieldTag::Address)
    }

    /// Number of Data fields.
    pub fn data_count(&self) -> usize {
        self.count(FieldTag::Data)
    }

    /// Whether any Sync field is present.
    pub fn has_sync(&self) -> bool {
        self.count(FieldTag::Sync) > 0
    }

    fn count(&self, tag: FieldTag) -> usize {
        self.fields.iter().filter(|&&f| f == tag).count()
    }

    /// Check the template carries exactly `n` Address fields.
    pub fn check_window(&self, n: usize) -> Result<(), ConfigError> {
        let actual = self.address_count();
        if actual != n {
            return Err(ConfigError::AddressCountMismatch {
                expected: n,
                actual,
            });
        }
        Ok(())
    }
}

impl FromStr for ProtocolTemplate {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() {
            return Err(ConfigError::EmptyTemplate);
        }
        let fields = s
            .chars()
            .enumerate()
            .map(|(position, tag)| {
                FieldTag::from_char(tag).ok_or(ConfigError::UnknownFieldTag { tag, position })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { fields })
    }
}

impl fmt::Display for ProtocolTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for field in &self.fields {
            write!(f, "{}", field.as_char())?;
        }
        Ok(())
    }
}

/// Word timing as given by a protocol definition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WordTiming {
    /// Symbol clock in Hz
    pub symbol_clock_hz: u32,
    /// Clock periods per bit fragment
    pub clocks_per_fragment: u32,
    /// How many times the sink repeats each frame
    pub repeat_count: u8,
    /// Silent bit periods after each repeat
    pub pause_symbols: u32,
}

impl WordTiming {
    /// Derive the per-frame parameters handed to the sink.
    ///
    /// `samples_per_bit = OOK_SAMPLE_RATE / (symbol_clock_hz / clocks_per_fragment)`
    pub fn tx_params(&self) -> Result<TxParams, ConfigError> {
        if self.symbol_clock_hz == 0 {
            return Err(ConfigError::ZeroTiming {
                name: "symbol_clock_hz",
            });
        }
        if self.clocks_per_fragment == 0 {
            return Err(ConfigError::ZeroTiming {
                name: "clocks_per_fragment",
            });
        }
        if self.repeat_count == 0 {
            return Err(ConfigError::ZeroTiming {
                name: "repeat_count",
            });
        }

        let fragment_rate = self.symbol_clock_hz / self.clocks_per_fragment;
        if fragment_rate == 0 {
            return Err(ConfigError::ZeroTiming {
                name: "symbol_clock_hz / clocks_per_fragment",
            });
        }

        Ok(TxParams {
            sample_rate: OOK_SAMPLE_RATE,
            samples_per_bit: (OOK_SAMPLE_RATE / fragment_rate).max(1),
            repeat_count: self.repeat_count,
            pause_symbols: self.pause_symbols,
        })
    }
}

/// Timing that accompanies every frame handed to a sink.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TxParams {
    pub sample_rate: u32,
    pub samples_per_bit: u32,
    pub repeat_count: u8,
    pub pause_symbols: u32,
}

impl TxParams {
    /// On-air time for a frame of `frame_bits`, all repeats and pauses included.
    pub fn airtime(&self, frame_bits: usize) -> Duration {
        let bit_periods =
            (frame_bits as u64 + self.pause_symbols as u64) * self.repeat_count as u64;
        let samples = bit_periods.saturating_mul(self.samples_per_bit as u64);
        let rate = (self.sample_rate as u64).max(1);
        Duration::from_secs(samples / rate)
            + Duration::from_nanos((samples % rate) * 1_000_000_000 / rate)
    }
}

/// Externally supplied protocol description, unchecked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProtocolDefinition {
    pub name: String,
    /// Symbols scanned through Address fields, e.g. `"01F"`
    pub address_symbols: String,
    /// Symbols allowed in Data fields; may be empty when the template has none
    pub data_symbols: String,
    /// Field tag string, e.g. `"SAAAAAAAADDDD"`
    pub template: String,
    /// Sync literal; may be empty when the template has no Sync field
    pub sync: String,
    /// Bit pattern per symbol index, at most [`MAX_BIT_PATTERNS`]
    pub bit_patterns: Vec<String>,
    pub timing: WordTiming,
}

impl ProtocolDefinition {
    /// Validate the definition and build its ready-to-use form.
    ///
    /// # Errors
    /// Any [`ConfigError`]: bad alphabets, bad template, window length out of
    /// range, unparsable or missing patterns, zero timing.
    pub fn compile(&self) -> Result<Protocol, ConfigError> {
        let template: ProtocolTemplate = self.template.parse()?;
        let address_alphabet = Alphabet::from_symbols(&self.address_symbols)?;
        let n = template.address_count();
        let keyspace = Keyspace::new(address_alphabet.len(), n)?;
        template.check_window(keyspace.n())?;

        let data_alphabet = if self.data_symbols.is_empty() {
            None
        } else {
            Some(Alphabet::from_symbols(&self.data_symbols)?)
        };
        if template.data_count() > 0 && data_alphabet.is_none() {
            return Err(ConfigError::MissingDataAlphabet {
                fields: template.data_count(),
            });
        }

        let sync = if template.has_sync() {
            Some(self.sync.parse::<BitPattern>()?)
        } else {
            None
        };

        if self.bit_patterns.len() > MAX_BIT_PATTERNS {
            return Err(ConfigError::TooManyBitPatterns {
                len: self.bit_patterns.len(),
                max: MAX_BIT_PATTERNS,
            });
        }
        let patterns = self
            .bit_patterns
            .iter()
            .map(|p| p.parse::<BitPattern>())
            .collect::<Result<Vec<_>, _>>()?;

        if address_alphabet.len() > patterns.len() {
            return Err(ConfigError::MissingBitPattern {
                alphabet: "address",
                k: address_alphabet.len(),
                patterns: patterns.len(),
            });
        }
        if template.data_count() > 0 {
            if let Some(data) = &data_alphabet {
                if data.len() > patterns.len() {
                    return Err(ConfigError::MissingBitPattern {
                        alphabet: "data",
                        k: data.len(),
                        patterns: patterns.len(),
                    });
                }
            }
        }

        let tx = self.timing.tx_params()?;

        Ok(Protocol {
            name: self.name.clone(),
            address_alphabet,
            data_alphabet,
            template,
            sync,
            patterns,
            keyspace,
            tx,
        })
    }
}

/// A validated protocol, ready for encoding and scanning.
#[derive(Debug, Clone)]
pub struct Protocol {
    name: String,
    address_alphabet: Alphabet,
    data_alphabet: Option<Alphabet>,
    template: ProtocolTemplate,
    sync: Option<BitPattern>,
    patterns: Vec<BitPattern>,
    keyspace: Keyspace,
    tx: TxParams,
}

impl Protocol {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn address_alphabet(&self) -> &Alphabet {
        &self.address_alphabet
    }

    pub fn data_alphabet(&self) -> Option<&Alphabet> {
        self.data_alphabet.as_ref()
    }

    pub fn template(&self) -> &ProtocolTemplate {
        &self.template
    }

    /// Sync literal; present whenever the template has a Sync field.
    pub fn sync(&self) -> Option<&BitPattern> {
        self.sync.as_ref()
    }

    /// Symbol-index to bit-pattern table.
    pub fn patterns(&self) -> &[BitPattern] {
        &self.patterns
    }

    /// Codeword length n (number of Address fields).
    pub fn window_len(&self) -> usize {
        self.keyspace.n()
    }

    pub fn keyspace(&self) -> &Keyspace {
        &self.keyspace
    }

    pub fn tx_params(&self) -> &TxParams {
        &self.tx
    }

    /// Upper bound on frame length in bits.
    pub fn max_frame_bits(&self) -> usize {
        let widest = self.patterns.iter().map(BitPattern::len).max().unwrap_or(0);
        self.template
            .fields()
            .iter()
            .map(|f| match f {
                FieldTag::Sync => self.sync.map_or(0, |s| s.len()),
                FieldTag::Address | FieldTag::Data => widest,
            })
            .sum()
    }

    /// Check live data values against this protocol's Data fields.
    pub fn check_live_fields(&self, live: &LiveFields) -> Result<(), ConfigError> {
        let expected = self.template.data_count();
        if live.len() != expected {
            return Err(ConfigError::LiveFieldCountMismatch {
                expected,
                actual: live.len(),
            });
        }
        let k = self.data_alphabet.as_ref().map_or(0, Alphabet::len);
        if let Some(&index) = live.symbols().iter().find(|&&s| s as usize >= k) {
            return Err(ConfigError::LiveSymbolOutOfRange {
                index: index as usize,
                k,
            });
        }
        Ok(())
    }
}

/// User-chosen symbol indices for the Data fields, in template order.
///
/// Independent of the scan: they are the same for every frame.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LiveFields {
    symbols: Vec<u8>,
}

impl LiveFields {
    pub fn new(symbols: Vec<u8>) -> Self {
        Self { symbols }
    }

    /// Parse from display symbols of the data alphabet, e.g. `"0110"`.
    pub fn parse(text: &str, alphabet: &Alphabet) -> Option<Self> {
        text.chars()
            .map(|c| alphabet.index_of(c))
            .collect::<Option<Vec<u8>>>()
            .map(Self::new)
    }

    pub fn symbols(&self) -> &[u8] {
        &self.symbols
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }
}
