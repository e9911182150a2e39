//! Error types for the scanner.
//!
//! Configuration problems are caught once, before a session starts, and are
//! reported as [`Error::InvalidConfiguration`]. Encoding problems during a
//! session mean a precondition was broken and stop the session. Cancellation
//! is not an error; see [`crate::session::ScanOutcome`].

use thiserror::Error;

/// Top-level error type for all operations in the crate.
#[derive(Debug, Error)]
pub enum Error {
    /// Alphabet, window length, template, pattern table or timing is unusable
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(#[from] ConfigError),

    /// Frame encoding broke a precondition (window overrun, missing pattern)
    #[error("frame encoding error: {0}")]
    Encode(#[from] EncodeError),

    /// Bit-level write failed
    #[error("bit I/O error: {0}")]
    BitIo(#[from] BitIoError),

    /// The scan worker thread panicked or could not be started
    #[error("scan worker error: {0}")]
    Worker(String),
}

/// Configuration errors, detected before any symbol is generated.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// Fewer than two symbols
    #[error("alphabet needs at least 2 symbols, got {k}")]
    AlphabetTooSmall { k: usize },

    /// More symbols than fit in a `u8` index
    #[error("alphabet has {k} symbols, maximum is {max}")]
    AlphabetTooLarge { k: usize, max: usize },

    /// The same symbol listed twice
    #[error("duplicate symbol {symbol:?} in alphabet")]
    DuplicateSymbol { symbol: char },

    /// Window length of zero
    #[error("window length must be at least 1")]
    WindowLengthZero,

    /// Window length above the supported recursion ceiling
    #[error("window length {n} exceeds maximum {max}")]
    WindowTooLong { n: usize, max: usize },

    /// k^n does not fit in 64 bits
    #[error("keyspace {k}^{n} overflows 64 bits")]
    KeyspaceOverflow { k: usize, n: usize },

    /// Template string is empty
    #[error("template has no fields")]
    EmptyTemplate,

    /// Template contains a character other than S, A or D
    #[error("unknown field tag {tag:?} at position {position}")]
    UnknownFieldTag { tag: char, position: usize },

    /// Number of Address tags differs from the codeword window length
    #[error("template declares {actual} address fields, window length is {expected}")]
    AddressCountMismatch { expected: usize, actual: usize },

    /// Bit pattern is empty or contains something other than 0/1
    #[error("invalid bit pattern {pattern:?}")]
    InvalidBitPattern { pattern: String },

    /// Bit pattern longer than a single write can carry
    #[error("bit pattern of {len} bits exceeds maximum {max}")]
    BitPatternTooLong { len: usize, max: usize },

    /// More patterns than the symbol table allows
    #[error("{len} bit patterns given, maximum is {max}")]
    TooManyBitPatterns { len: usize, max: usize },

    /// A symbol of the alphabet has no bit pattern
    #[error("{alphabet} alphabet has {k} symbols but only {patterns} bit patterns")]
    MissingBitPattern {
        alphabet: &'static str,
        k: usize,
        patterns: usize,
    },

    /// Live data symbols do not line up with the template's Data fields
    #[error("template declares {expected} data fields, {actual} live values given")]
    LiveFieldCountMismatch { expected: usize, actual: usize },

    /// A live data value is not an index into the data alphabet
    #[error("live data symbol index {index} out of range for {k}-symbol data alphabet")]
    LiveSymbolOutOfRange { index: usize, k: usize },

    /// Template has Data fields but no data alphabet was given
    #[error("template has {fields} data fields but no data alphabet")]
    MissingDataAlphabet { fields: usize },

    /// A timing parameter that divides or multiplies is zero
    #[error("timing parameter {name} must be non-zero")]
    ZeroTiming { name: &'static str },
}

/// Errors raised while turning a codeword into a frame.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EncodeError {
    /// Template asked for more address symbols than the codeword holds
    #[error("codeword exhausted at address field {field} (codeword length {len})")]
    CodewordExhausted { field: usize, len: usize },

    /// Template finished with codeword symbols unused
    #[error("codeword has {leftover} unused symbols after encoding")]
    CodewordLeftover { leftover: usize },

    /// Template asked for more live data values than were supplied
    #[error("live fields exhausted at data field {field}")]
    LiveFieldsExhausted { field: usize },

    /// Symbol index lies outside the alphabet of its field
    #[error("symbol index {index} at field {field} is outside an alphabet of {k} symbols")]
    SymbolOutOfRange { field: usize, index: usize, k: usize },

    /// Symbol index has no entry in the bit pattern table
    #[error("symbol index {index} has no bit pattern (table size {table})")]
    NoBitPattern { index: usize, table: usize },

    /// Single-shot word does not cover every Address and Data field
    #[error("word has {actual} symbols, template needs {expected}")]
    WordLengthMismatch { expected: usize, actual: usize },
}

/// Bit-level I/O errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BitIoError {
    /// Attempted to write more than 64 bits in one call
    #[error("invalid bit count: {0}")]
    InvalidBitCount(usize),
}

/// Type alias for Result with our Error type
pub type Result<T> = std::result::Result<T, Error>;
