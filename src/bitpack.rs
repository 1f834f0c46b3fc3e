//! Fixed-width symbol bit packing.
//!
//! Symbols narrower than a byte (2-bit tags, sub-byte dictionary
//! indices, and so on) are packed MSB-first into big-endian packing
//! words of `packing_word_bytes` bytes each, left-aligned with any
//! leftover bits at the bottom zero-filled. Packing is done one whole
//! packing word at a time with `u128` arithmetic (packing words up to 16
//! bytes are supported), so padding lands at the end of *each* packing
//! word rather than only at the end of the whole stream.

use crate::error::Error;

/// Packs/unpacks fixed-width unsigned symbols into big-endian,
/// `packing_word_bytes`-aligned byte streams.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BitPacker {
    packing_word_bytes: usize,
}

impl BitPacker {
    /// `packing_word_bytes` (K) must be in `1..=16` to fit a packing word
    /// in a `u128` accumulator.
    pub fn new(packing_word_bytes: usize) -> Result<Self, Error> {
        if packing_word_bytes == 0 || packing_word_bytes > 16 {
            return Err(Error::FormatError(format!(
                "packing_word_bytes must be in 1..=16, got {}",
                packing_word_bytes
            )));
        }
        Ok(BitPacker { packing_word_bytes })
    }

    fn bit_budget(&self) -> u32 {
        8 * self.packing_word_bytes as u32
    }

    /// `reps = floor(8K / width)`: how many symbols fit in one packing word.
    fn reps(&self, width: u32) -> Result<usize, Error> {
        if width == 0 {
            return Err(Error::FormatError("symbol width must be nonzero".to_string()));
        }
        let reps = (self.bit_budget() / width) as usize;
        if reps == 0 {
            return Err(Error::FormatError(format!(
                "width {} exceeds packing-word bit budget {}",
                width,
                self.bit_budget()
            )));
        }
        Ok(reps)
    }

    /// Pack `symbols`, each assumed to fit in `width` bits, into a
    /// big-endian byte string whose length is a multiple of
    /// `packing_word_bytes`. Empty input yields empty output.
    pub fn pack(&self, symbols: &[u64], width: u32) -> Result<Vec<u8>, Error> {
        let reps = self.reps(width)?;
        if symbols.is_empty() {
            return Ok(Vec::new());
        }
        let max_symbol: u64 = if width >= 64 {
            u64::MAX
        } else {
            (1u64 << width) - 1
        };
        let num_words = symbols.len().div_ceil(reps);
        let mut out = Vec::with_capacity(num_words * self.packing_word_bytes);
        for group in symbols.chunks(reps) {
            let mut word: u128 = 0;
            for (i, &symbol) in group.iter().enumerate() {
                if symbol > max_symbol {
                    return Err(Error::FormatError(format!(
                        "symbol {} does not fit in {} bits",
                        symbol, width
                    )));
                }
                let shift = self.bit_budget() as u128 - width as u128 * (i as u128 + 1);
                word |= (symbol as u128) << shift;
            }
            let be = word.to_be_bytes();
            out.extend_from_slice(&be[16 - self.packing_word_bytes..]);
        }
        Ok(out)
    }

    /// Inverse of `pack`. `count` is how many symbols to recover; any
    /// trailing zero-fill in the final packing word is discarded.
    pub fn unpack(&self, bytes: &[u8], width: u32, count: usize) -> Result<Vec<u64>, Error> {
        let reps = self.reps(width)?;
        if count == 0 {
            return Ok(Vec::new());
        }
        if bytes.len() % self.packing_word_bytes != 0 {
            return Err(Error::FormatError(format!(
                "packed byte length {} is not a multiple of {}",
                bytes.len(),
                self.packing_word_bytes
            )));
        }
        let required_words = count.div_ceil(reps);
        if bytes.len() < required_words * self.packing_word_bytes {
            return Err(Error::FormatError(format!(
                "packed data too short: need {} packing word(s) to recover {} symbols, got {}",
                required_words,
                count,
                bytes.len() / self.packing_word_bytes
            )));
        }
        let unused = self.bit_budget() % width;
        let mask: u128 = if width >= 128 {
            u128::MAX
        } else {
            (1u128 << width) - 1
        };
        let mut out = Vec::with_capacity(count);
        'outer: for chunk in bytes.chunks(self.packing_word_bytes) {
            let mut buf = [0u8; 16];
            buf[16 - self.packing_word_bytes..].copy_from_slice(chunk);
            let word = u128::from_be_bytes(buf);
            for i in 0..reps {
                if out.len() == count {
                    break 'outer;
                }
                let shift = width * (reps - 1 - i) as u32 + unused;
                out.push(((word >> shift) & mask) as u64);
            }
        }
        Ok(out)
    }
}
