//! Symbol alphabets and the codewords drawn from them.
//!
//! Everything downstream of the alphabet works with symbol *indices* (`u8`),
//! never with the display characters. The alphabet is only consulted to
//! render a codeword for logs and to look up indices when parsing user
//! input.

use std::fmt;

use crate::error::ConfigError;

/// Largest alphabet whose indices fit in a `u8`.
pub const MAX_ALPHABET_LEN: usize = u8::MAX as usize;

/// Ordered set of k >= 2 distinct symbols.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Alphabet {
    symbols: Vec<char>,
}

impl Alphabet {
    /// Build an alphabet from its symbols in index order.
    ///
    /// # Errors
    /// - `ConfigError::AlphabetTooSmall` for fewer than two symbols
    /// - `ConfigError::AlphabetTooLarge` above [`MAX_ALPHABET_LEN`]
    /// - `ConfigError::DuplicateSymbol` if a symbol repeats
    pub fn new(symbols: impl IntoIterator<Item = char>) -> Result<Self, ConfigError> {
        let symbols: Vec<char> = symbols.into_iter().collect();

        if symbols.len() < 2 {
            return Err(ConfigError::AlphabetTooSmall { k: symbols.len() });
        }
        if symbols.len() > MAX_ALPHABET_LEN {
            return Err(ConfigError::AlphabetTooLarge {
                k: symbols.len(),
                max: MAX_ALPHABET_LEN,
            });
        }
        for (i, c) in symbols.iter().enumerate() {
            if symbols[..i].contains(c) {
                return Err(ConfigError::DuplicateSymbol { symbol: *c });
            }
        }

        Ok(Self { symbols })
    }

    /// Convenience constructor from a string of symbols, e.g. `"01F"`.
    pub fn from_symbols(symbols: &str) -> Result<Self, ConfigError> {
        Self::new(symbols.chars())
    }

    /// Number of symbols (k).
    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    /// Never true for a constructed alphabet.
    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    /// Symbol at `index`, if any.
    pub fn symbol(&self, index: u8) -> Option<char> {
        self.symbols.get(index as usize).copied()
    }

    /// Index of `symbol`, if it belongs to the alphabet.
    pub fn index_of(&self, symbol: char) -> Option<u8> {
        self.symbols.iter().position(|&c| c == symbol).map(|i| i as u8)
    }

    /// All symbols in index order.
    pub fn symbols(&self) -> &[char] {
        &self.symbols
    }

    /// Render a run of indices as text; unknown indices show as `?`.
    pub fn render(&self, indices: &[u8]) -> String {
        indices
            .iter()
            .map(|&i| self.symbol(i).unwrap_or('?'))
            .collect()
    }
}

impl fmt::Display for Alphabet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for c in &self.symbols {
            write!(f, "{c}")?;
        }
        Ok(())
    }
}

/// One address value: exactly n symbol indices.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Codeword {
    symbols: Vec<u8>,
}

impl Codeword {
    /// Wrap a run of symbol indices.
    pub fn new(symbols: Vec<u8>) -> Self {
        Self { symbols }
    }

    /// Parse a codeword from display symbols, e.g. `"01F"`.
    ///
    /// Returns `None` if any character is not in `alphabet`.
    pub fn parse(text: &str, alphabet: &Alphabet) -> Option<Self> {
        text.chars()
            .map(|c| alphabet.index_of(c))
            .collect::<Option<Vec<u8>>>()
            .map(Self::new)
    }

    /// Symbol indices in order.
    pub fn symbols(&self) -> &[u8] {
        &self.symbols
    }

    /// Number of symbols (n).
    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    /// True for a zero-length codeword.
    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    /// Render through `alphabet`.
    pub fn render(&self, alphabet: &Alphabet) -> String {
        alphabet.render(&self.symbols)
    }
}
