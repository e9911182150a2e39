//! Configuration for the ook-scan application.
//!
//! Handles parsing command-line arguments and generating sensible defaults
//! (including randomized live data that is reproducible with a seed).
//!
//! # Philosophy
//!
//! The tool should work with ZERO arguments: the defaults describe a small
//! three-symbol demo protocol. All resolved values can be printed so runs are
//! reproducible.

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use clap::Parser;
use ook_scan_core::template::FieldTag;
use ook_scan_core::{LiveFields, Protocol, ProtocolDefinition, ScanOptions, WordTiming};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Scan every address code of an OOK protocol in de Bruijn order.
#[derive(Debug, Clone, Parser)]
#[command(name = "ook-scan")]
#[command(version, about, long_about = None)]
pub struct Config {
    // === Protocol ===
    /// Protocol name, used in logs and the worker thread name
    #[arg(long, default_value = "demo")]
    pub name: String,

    /// Symbols scanned through Address fields
    #[arg(long, default_value = "01F")]
    pub address_symbols: String,

    /// Symbols allowed in Data fields
    #[arg(long, default_value = "01")]
    pub data_symbols: String,

    /// Field layout: S = sync, A = address, D = data
    #[arg(long, default_value = "AAAADDS")]
    pub template: String,

    /// Sync literal as a 0/1 string
    #[arg(long, default_value = "10000000000000000000000000000000")]
    pub sync: String,

    /// Bit pattern per symbol index, comma separated (at most 3)
    #[arg(
        long = "bit-patterns",
        value_delimiter = ',',
        default_values = ["10001000", "11101110", "10001110"]
    )]
    pub bit_patterns: Vec<String>,

    // === Live data ===
    /// Data field values in data symbols, e.g. "01" (default: random from seed)
    #[arg(long)]
    pub live: Option<String>,

    /// Seed for randomized defaults (default: time based)
    #[arg(long)]
    pub seed: Option<u64>,

    // === Timing ===
    /// Symbol clock in Hz
    #[arg(long, default_value_t = 20_000)]
    pub symbol_clock_hz: u32,

    /// Clock periods per bit fragment
    #[arg(long, default_value_t = 4)]
    pub clocks_per_fragment: u32,

    /// Transmissions per frame
    #[arg(long, default_value_t = 4)]
    pub repeats: u8,

    /// Silent bit periods after each repeat
    #[arg(long, default_value_t = 0)]
    pub pause_symbols: u32,

    /// Pause between codewords in milliseconds
    #[arg(long, default_value_t = 0)]
    pub delay_ms: u64,

    // === Behavior ===
    /// Transmit one hand-picked word (one symbol per A/D field) instead of scanning
    #[arg(long)]
    pub single: Option<String>,

    /// Cancel the scan after this many milliseconds
    #[arg(long)]
    pub abort_after_ms: Option<u64>,

    /// Simulated airtime multiplier; 0 disables sleeping
    #[arg(long, default_value_t = 1.0)]
    pub time_scale: f64,

    /// Print resolved configuration
    #[arg(long)]
    pub print_config: bool,

    /// Don't print metrics summary
    #[arg(long)]
    pub no_metrics: bool,
}

impl Config {
    /// Parse configuration from command-line arguments.
    ///
    /// If no seed is given, a time-based one is picked so it can be printed
    /// and reused.
    pub fn from_args() -> Result<Self, String> {
        let mut config = Self::parse();

        if !config.time_scale.is_finite() || config.time_scale < 0.0 {
            return Err(format!("invalid time scale: {}", config.time_scale));
        }

        config.seed = Some(config.seed.unwrap_or_else(|| {
            SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .map(|d| d.as_millis() as u64)
                .unwrap_or(0)
        }));

        Ok(config)
    }

    /// Protocol definition described by the flags.
    pub fn definition(&self) -> ProtocolDefinition {
        ProtocolDefinition {
            name: self.name.clone(),
            address_symbols: self.address_symbols.clone(),
            data_symbols: self.data_symbols.clone(),
            template: self.template.clone(),
            sync: self.sync.clone(),
            bit_patterns: self.bit_patterns.clone(),
            timing: WordTiming {
                symbol_clock_hz: self.symbol_clock_hz,
                clocks_per_fragment: self.clocks_per_fragment,
                repeat_count: self.repeats,
                pause_symbols: self.pause_symbols,
            },
        }
    }

    pub fn scan_options(&self) -> ScanOptions {
        ScanOptions {
            inter_code_delay: Duration::from_millis(self.delay_ms),
        }
    }

    /// Live data values: parsed from `--live`, or drawn from the seed.
    pub fn live_fields(&self, protocol: &Protocol) -> Result<LiveFields, String> {
        let count = protocol.template().data_count();
        let Some(alphabet) = protocol.data_alphabet() else {
            return Ok(LiveFields::default());
        };

        match &self.live {
            Some(text) => LiveFields::parse(text, alphabet)
                .ok_or_else(|| format!("live data {text:?} uses symbols outside \"{alphabet}\"")),
            None => {
                let mut rng = ChaCha8Rng::seed_from_u64(self.seed.unwrap_or_default());
                let symbols = (0..count)
                    .map(|_| rng.gen_range(0..alphabet.len()) as u8)
                    .collect();
                Ok(LiveFields::new(symbols))
            }
        }
    }

    /// Symbol indices for `--single`, looked up per field in template order.
    pub fn single_word(&self, protocol: &Protocol) -> Result<Option<Vec<u8>>, String> {
        let Some(text) = &self.single else {
            return Ok(None);
        };

        let fields = protocol
            .template()
            .fields()
            .iter()
            .filter(|&&f| f != FieldTag::Sync);

        let mut word = Vec::with_capacity(text.len());
        for (c, field) in text.chars().zip(fields) {
            let alphabet = match field {
                FieldTag::Data => protocol.data_alphabet(),
                _ => Some(protocol.address_alphabet()),
            };
            let index = alphabet
                .and_then(|a| a.index_of(c))
                .ok_or_else(|| format!("symbol {c:?} not valid for {field:?} field"))?;
            word.push(index);
        }
        if word.len() != text.chars().count() {
            return Err(format!("word {text:?} is longer than the template allows"));
        }

        Ok(Some(word))
    }

    /// Print the configuration in human-readable form.
    pub fn print(&self) {
        println!("=== Configuration ===");
        println!("Protocol: {}", self.name);
        println!("Address symbols: {}", self.address_symbols);
        println!("Data symbols: {}", self.data_symbols);
        println!("Template: {}", self.template);
        println!("Sync: {}", self.sync);
        println!("Bit patterns: {}", self.bit_patterns.join(","));
        println!();
        println!("=== Live Data ===");
        println!("Live: {}", self.live.as_deref().unwrap_or("(random from seed)"));
        println!("Seed: {}", self.seed.unwrap_or_default());
        println!();
        println!("=== Timing ===");
        println!("Symbol clock: {} Hz", self.symbol_clock_hz);
        println!("Clocks per fragment: {}", self.clocks_per_fragment);
        println!("Repeats: {}", self.repeats);
        println!("Pause symbols: {}", self.pause_symbols);
        println!("Inter-code delay: {} ms", self.delay_ms);
        println!("Time scale: {}", self.time_scale);
        match self.abort_after_ms {
            Some(ms) => println!("Abort after: {ms} ms"),
            None => println!("Abort after: never"),
        }
        println!();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Config {
        Config::parse_from(std::iter::once("ook-scan").chain(args.iter().copied()))
    }

    #[test]
    fn test_defaults_compile() {
        let config = parse(&[]);
        assert_eq!(config.bit_patterns.len(), 3);
        let protocol = config.definition().compile().unwrap();
        assert_eq!(protocol.window_len(), 4);
    }

    #[test]
    fn test_live_from_seed_is_reproducible() {
        let config = parse(&["--seed", "7"]);
        let protocol = config.definition().compile().unwrap();
        let a = config.live_fields(&protocol).unwrap();
        let b = config.live_fields(&protocol).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.len(), 2);
        assert!(protocol.check_live_fields(&a).is_ok());
    }

    #[test]
    fn test_live_parsed() {
        let config = parse(&["--live", "10"]);
        let protocol = config.definition().compile().unwrap();
        assert_eq!(config.live_fields(&protocol).unwrap().symbols(), &[1, 0]);

        let bad = parse(&["--live", "1x"]);
        assert!(bad.live_fields(&protocol).is_err());
    }

    #[test]
    fn test_single_word() {
        let config = parse(&["--single", "F01F10"]);
        let protocol = config.definition().compile().unwrap();
        assert_eq!(
            config.single_word(&protocol).unwrap(),
            Some(vec![2, 0, 1, 2, 1, 0])
        );

        // F is not a data symbol
        let bad = parse(&["--single", "0000F0"]);
        assert!(bad.single_word(&protocol).is_err());
    }

    #[test]
    fn test_bit_patterns_flag() {
        let config = parse(&["--bit-patterns", "0,1"]);
        assert_eq!(config.bit_patterns, vec!["0", "1"]);
    }
}
