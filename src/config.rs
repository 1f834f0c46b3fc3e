//! Immutable codec configuration.
//!
//! Validates its parameters eagerly at construction time rather than
//! deferring the checks to the first `compress`/`decompress` call.

use crate::error::Error;

/// Word width, in bytes. Only 4 and 8 are supported.
pub const SUPPORTED_WORD_SIZES: [usize; 2] = [4, 8];

/// Configuration shared by `WKCodec` and the bit packer it drives.
///
/// All fields are immutable after construction: a single `Config` may be
/// shared freely across threads.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Config {
    /// W: word width in bytes, ∈ {4, 8}.
    word_size_bytes: usize,
    /// K: packing-word granularity in bytes for the bit packer.
    packing_word_bytes: usize,
    /// D: recency dictionary capacity, must be a power of two.
    dict_size: usize,
    /// L: number of low bits used in the PARTIAL high/low split.
    num_low_bits: usize,
    /// Whether to emit verbose per-word diagnostic logging.
    debug: bool,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            word_size_bytes: 8,
            packing_word_bytes: 8,
            dict_size: 16,
            num_low_bits: 10,
            debug: false,
        }
    }
}

impl Config {
    /// Build and validate a configuration. Fails fast with
    /// `Error::InvalidConfig` rather than deferring the check to the
    /// first `compress`/`decompress` call.
    pub fn new(
        word_size_bytes: usize,
        packing_word_bytes: usize,
        dict_size: usize,
        num_low_bits: usize,
        debug: bool,
    ) -> Result<Self, Error> {
        if !SUPPORTED_WORD_SIZES.contains(&word_size_bytes) {
            return Err(Error::InvalidConfig(format!(
                "word_size_bytes must be one of {:?}, got {}",
                SUPPORTED_WORD_SIZES, word_size_bytes
            )));
        }
        if dict_size == 0 || !dict_size.is_power_of_two() {
            return Err(Error::InvalidConfig(format!(
                "dict_size must be a power of two, got {}",
                dict_size
            )));
        }
        if packing_word_bytes == 0 {
            return Err(Error::InvalidConfig(
                "packing_word_bytes must be nonzero".to_string(),
            ));
        }
        let max_low_bits = 8 * word_size_bytes - 1;
        if num_low_bits < 1 || num_low_bits > max_low_bits {
            return Err(Error::InvalidConfig(format!(
                "num_low_bits must be in 1..={}, got {}",
                max_low_bits, num_low_bits
            )));
        }
        Ok(Config {
            word_size_bytes,
            packing_word_bytes,
            dict_size,
            num_low_bits,
            debug,
        })
    }

    pub fn word_size_bytes(&self) -> usize {
        self.word_size_bytes
    }

    pub fn packing_word_bytes(&self) -> usize {
        self.packing_word_bytes
    }

    pub fn dict_size(&self) -> usize {
        self.dict_size
    }

    pub fn num_low_bits(&self) -> usize {
        self.num_low_bits
    }

    pub fn debug(&self) -> bool {
        self.debug
    }

    /// log2(D): bit width of a dictionary index.
    pub fn dict_index_bits(&self) -> u32 {
        self.dict_size.trailing_zeros()
    }

    /// Low-bit mask `(1 << L) - 1`.
    pub fn low_bit_mask(&self) -> u64 {
        (1u64 << self.num_low_bits) - 1
    }

    /// `~low_bit_mask`, restricted to the word's bit width.
    pub fn high_bit_mask(&self) -> u64 {
        let word_bits = 8 * self.word_size_bytes as u32;
        let full_mask: u64 = if word_bits >= 64 {
            u64::MAX
        } else {
            (1u64 << word_bits) - 1
        };
        full_mask & !self.low_bit_mask()
    }

    pub fn high(&self, word: u64) -> u64 {
        word >> self.num_low_bits
    }

    pub fn low(&self, word: u64) -> u64 {
        word & self.low_bit_mask()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_non_power_of_two_dict_size() {
        assert!(matches!(
            Config::new(8, 8, 15, 10, false),
            Err(Error::InvalidConfig(_))
        ));
    }

    #[test]
    fn rejects_out_of_range_low_bits() {
        assert!(matches!(
            Config::new(4, 8, 16, 32, false),
            Err(Error::InvalidConfig(_))
        ));
        assert!(matches!(
            Config::new(4, 8, 16, 0, false),
            Err(Error::InvalidConfig(_))
        ));
    }

    #[test]
    fn rejects_unsupported_word_size() {
        assert!(matches!(
            Config::new(3, 8, 16, 10, false),
            Err(Error::InvalidConfig(_))
        ));
    }

    #[test]
    fn accepts_standard_config() {
        let cfg = Config::new(8, 8, 16, 10, false).expect("valid config");
        assert_eq!(cfg.dict_index_bits(), 4);
        assert_eq!(cfg.low_bit_mask(), 0x3ff);
    }
}
