//! The WK word-oriented dictionary codec.
//!
//! Each fixed-width word of the input is classified against a small
//! recency dictionary: an all-zero word gets a ZERO tag for free, a word
//! whose full value is already in the dictionary is a HIT, a word that
//! shares its high bits with a dictionary entry but differs in the low
//! bits is a PARTIAL match, and anything else is a MISS that gets
//! inserted into the dictionary. Tags, full MISS words, dictionary
//! indices, and PARTIAL low bits are packed into separate sections of
//! one output frame, with a small header recording where each section
//! starts. The tags-area length on decode is derived from the word
//! count in the header rather than a fixed page size, so the codec
//! works on pages of any length that divides evenly by the word size.

use num_derive::{FromPrimitive, ToPrimitive};
use num_traits::FromPrimitive as _;

use crate::bitpack::BitPacker;
use crate::config::Config;
use crate::dictionary::Dictionary;
use crate::error::Error;

const HEADER_SIZE_BYTES: usize = 16;

/// Two-bit word classifier. Discriminants are the wire values.
#[derive(Clone, Copy, Debug, PartialEq, Eq, FromPrimitive, ToPrimitive)]
pub enum Tag {
    Zero = 0,
    Partial = 1,
    Miss = 2,
    Hit = 3,
}

/// The WK compressor/decompressor for one fixed (W, K, D, L) configuration.
#[derive(Clone, Debug)]
pub struct WKCodec {
    config: Config,
    bitpacker: BitPacker,
}

impl WKCodec {
    pub fn new(config: Config) -> Result<Self, Error> {
        let bitpacker = BitPacker::new(config.packing_word_bytes())?;
        Ok(WKCodec { config, bitpacker })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Compress `src` into a WK frame. `src.len()` must be a multiple of
    /// the configured word size.
    pub fn compress(&self, src: &[u8]) -> Result<Vec<u8>, Error> {
        let w = self.config.word_size_bytes();
        if src.len() % w != 0 {
            return Err(Error::InvalidInput(format!(
                "source length {} is not a multiple of word size {}",
                src.len(),
                w
            )));
        }
        let num_words = src.len() / w;
        let low_mask = self.config.low_bit_mask();

        let mut dict = Dictionary::new(self.config.dict_size());
        let mut tags: Vec<u64> = Vec::with_capacity(num_words);
        let mut full_words: Vec<u8> = Vec::new();
        let mut dict_indices: Vec<u64> = Vec::new();
        let mut low_bits: Vec<u64> = Vec::new();

        for chunk in src.chunks(w) {
            let word = read_be_word(chunk);
            if word == 0 {
                tags.push(Tag::Zero as u64);
            } else if let Some(i) = dict.find_full(word) {
                tags.push(Tag::Hit as u64);
                dict_indices.push(i as u64);
                dict.touch_full(i);
            } else if let Some(i) = dict.find_high(word, low_mask) {
                tags.push(Tag::Partial as u64);
                dict_indices.push(i as u64);
                low_bits.push(self.config.low(word));
                dict.replace_partial(i, word);
            } else {
                tags.push(Tag::Miss as u64);
                full_words.extend_from_slice(&word.to_be_bytes()[8 - w..]);
                dict.insert_miss(word);
            }
        }

        let packed_tags = self.bitpacker.pack(&tags, 2)?;
        let packed_dict_indices = self
            .bitpacker
            .pack(&dict_indices, self.config.dict_index_bits())?;
        let packed_low_bits = self
            .bitpacker
            .pack(&low_bits, self.config.num_low_bits() as u32)?;

        let dict_indices_offset = HEADER_SIZE_BYTES + packed_tags.len() + full_words.len();
        let low_bits_offset = dict_indices_offset + packed_dict_indices.len();
        let end_of_frame_offset = low_bits_offset + packed_low_bits.len();

        let mut frame = Vec::with_capacity(end_of_frame_offset);
        frame.extend_from_slice(&(num_words as u32).to_be_bytes());
        frame.extend_from_slice(&(dict_indices_offset as u32).to_be_bytes());
        frame.extend_from_slice(&(low_bits_offset as u32).to_be_bytes());
        frame.extend_from_slice(&(end_of_frame_offset as u32).to_be_bytes());
        frame.extend_from_slice(&packed_tags);
        frame.extend_from_slice(&full_words);
        frame.extend_from_slice(&packed_dict_indices);
        frame.extend_from_slice(&packed_low_bits);

        if self.config.debug() {
            log::debug!(
                "wk compress: header num_words={} dict_indices_offset={} low_bits_offset={} end_of_frame_offset={}",
                num_words, dict_indices_offset, low_bits_offset, end_of_frame_offset
            );
            log::debug!(
                "wk compress: tags={} full_words={}B dict_indices={} low_bits={} final dict={:?}",
                tags.len(),
                full_words.len(),
                dict_indices.len(),
                low_bits.len(),
                dict.entries()
            );
            log::trace!(
                "wk compress: {} -> {} bytes ({:.2} ratio)",
                src.len(),
                frame.len(),
                frame.len() as f64 / src.len().max(1) as f64
            );
        }

        Ok(frame)
    }

    /// Decompress a WK frame back into the original bytes.
    pub fn decompress(&self, frame: &[u8]) -> Result<Vec<u8>, Error> {
        let w = self.config.word_size_bytes();
        let k = self.config.packing_word_bytes();

        if frame.len() < HEADER_SIZE_BYTES {
            return Err(Error::CorruptFrame(format!(
                "frame length {} is shorter than the 16-byte header",
                frame.len()
            )));
        }
        let num_words = read_u32(frame, 0) as usize;
        let dict_indices_offset = read_u32(frame, 4) as usize;
        let low_bits_offset = read_u32(frame, 8) as usize;
        let end_of_frame_offset = read_u32(frame, 12) as usize;

        if !(HEADER_SIZE_BYTES <= dict_indices_offset
            && dict_indices_offset <= low_bits_offset
            && low_bits_offset <= end_of_frame_offset)
        {
            return Err(Error::CorruptFrame(format!(
                "header offsets are not monotonic: {} <= {} <= {} <= {} required",
                HEADER_SIZE_BYTES, dict_indices_offset, low_bits_offset, end_of_frame_offset
            )));
        }
        if end_of_frame_offset > frame.len() {
            return Err(Error::CorruptFrame(format!(
                "end_of_frame_offset {} exceeds frame length {}",
                end_of_frame_offset,
                frame.len()
            )));
        }

        // The tags area has no offset of its own: it runs from the end of
        // the header for exactly enough packing words to hold num_words
        // 2-bit tags, and full_words fills the gap up to dict_indices_offset.
        let tags_per_packing_word = 4 * k;
        let tags_area_len = num_words.div_ceil(tags_per_packing_word) * k;
        if HEADER_SIZE_BYTES + tags_area_len > dict_indices_offset {
            return Err(Error::CorruptFrame(
                "tags area overruns dict_indices_offset".to_string(),
            ));
        }

        let packed_tags = &frame[HEADER_SIZE_BYTES..HEADER_SIZE_BYTES + tags_area_len];
        let full_words_bytes = &frame[HEADER_SIZE_BYTES + tags_area_len..dict_indices_offset];
        let packed_dict_indices = &frame[dict_indices_offset..low_bits_offset];
        let packed_low_bits = &frame[low_bits_offset..end_of_frame_offset];

        let tags = self
            .bitpacker
            .unpack(packed_tags, 2, num_words)
            .map_err(|e| Error::CorruptFrame(format!("failed to unpack tags: {}", e)))?;

        let miss_count = tags.iter().filter(|&&t| t == Tag::Miss as u64).count();
        let partial_count = tags.iter().filter(|&&t| t == Tag::Partial as u64).count();
        let hit_partial_count = tags
            .iter()
            .filter(|&&t| t == Tag::Hit as u64 || t == Tag::Partial as u64)
            .count();

        if full_words_bytes.len() != miss_count * w {
            return Err(Error::CorruptFrame(format!(
                "full_words length {} does not match {} MISS word(s) of width {}",
                full_words_bytes.len(),
                miss_count,
                w
            )));
        }

        let dict_indices = self
            .bitpacker
            .unpack(packed_dict_indices, self.config.dict_index_bits(), hit_partial_count)
            .map_err(|e| Error::CorruptFrame(format!("failed to unpack dict indices: {}", e)))?;
        let low_bits = self
            .bitpacker
            .unpack(packed_low_bits, self.config.num_low_bits() as u32, partial_count)
            .map_err(|e| Error::CorruptFrame(format!("failed to unpack low bits: {}", e)))?;

        let mut dict = Dictionary::new(self.config.dict_size());
        let mut out = Vec::with_capacity(num_words * w);
        let mut full_cursor = 0usize;
        let mut dict_cursor = 0usize;
        let mut low_cursor = 0usize;

        for &raw_tag in &tags {
            let tag = Tag::from_u64(raw_tag)
                .expect("BitPacker::unpack with width=2 only ever yields 0..=3");
            match tag {
                Tag::Zero => {
                    out.extend(std::iter::repeat(0u8).take(w));
                }
                Tag::Partial => {
                    let i = *dict_indices.get(dict_cursor).ok_or_else(|| {
                        Error::CorruptFrame("dict indices exhausted before num_words reached".to_string())
                    })? as usize;
                    dict_cursor += 1;
                    if i >= dict.len() {
                        return Err(Error::CorruptFrame(format!(
                            "dict index {} out of range (dict has {} entries)",
                            i,
                            dict.len()
                        )));
                    }
                    let l = *low_bits.get(low_cursor).ok_or_else(|| {
                        Error::CorruptFrame("low bits exhausted before num_words reached".to_string())
                    })?;
                    low_cursor += 1;
                    let dict_word = dict.get(i);
                    let word = (dict_word & self.config.high_bit_mask()) | l;
                    dict.replace_partial(i, word);
                    out.extend_from_slice(&word.to_be_bytes()[8 - w..]);
                }
                Tag::Miss => {
                    let word = read_be_word(&full_words_bytes[full_cursor..full_cursor + w]);
                    full_cursor += w;
                    dict.insert_miss(word);
                    out.extend_from_slice(&word.to_be_bytes()[8 - w..]);
                }
                Tag::Hit => {
                    let i = *dict_indices.get(dict_cursor).ok_or_else(|| {
                        Error::CorruptFrame("dict indices exhausted before num_words reached".to_string())
                    })? as usize;
                    dict_cursor += 1;
                    if i >= dict.len() {
                        return Err(Error::CorruptFrame(format!(
                            "dict index {} out of range (dict has {} entries)",
                            i,
                            dict.len()
                        )));
                    }
                    let word = dict.get(i);
                    dict.touch_full(i);
                    out.extend_from_slice(&word.to_be_bytes()[8 - w..]);
                }
            }
        }

        if self.config.debug() {
            log::debug!(
                "wk decompress: num_words={} dict_indices_offset={} low_bits_offset={} end_of_frame_offset={}",
                num_words, dict_indices_offset, low_bits_offset, end_of_frame_offset
            );
        }

        Ok(out)
    }

    /// Histogram of dictionary-index usage, tallied straight from the
    /// packed dict-indices section. No tag information is consulted, so
    /// any trailing zero padding in the final packing word is counted
    /// against index 0; this is a coarse usage diagnostic, not an exact
    /// per-word count.
    pub fn dict_index_histogram(&self, frame: &[u8]) -> Result<Vec<u32>, Error> {
        if frame.len() < HEADER_SIZE_BYTES {
            return Err(Error::CorruptFrame(format!(
                "frame length {} is shorter than the 16-byte header",
                frame.len()
            )));
        }
        let dict_indices_offset = read_u32(frame, 4) as usize;
        let low_bits_offset = read_u32(frame, 8) as usize;
        let end_of_frame_offset = read_u32(frame, 12) as usize;
        if !(HEADER_SIZE_BYTES <= dict_indices_offset
            && dict_indices_offset <= low_bits_offset
            && low_bits_offset <= end_of_frame_offset)
            || end_of_frame_offset > frame.len()
        {
            return Err(Error::CorruptFrame(
                "header offsets are not monotonic, or overrun the frame".to_string(),
            ));
        }

        let packed = &frame[dict_indices_offset..low_bits_offset];
        let k = self.config.packing_word_bytes();
        if packed.len() % k != 0 {
            return Err(Error::CorruptFrame(format!(
                "dict indices section length {} is not a multiple of {}",
                packed.len(),
                k
            )));
        }
        let width = self.config.dict_index_bits();
        let reps = (8 * k as u32 / width) as usize;
        let total = (packed.len() / k) * reps;
        let indices = self
            .bitpacker
            .unpack(packed, width, total)
            .map_err(|e| Error::CorruptFrame(format!("failed to unpack dict indices: {}", e)))?;

        let mut histogram = vec![0u32; self.config.dict_size()];
        for idx in indices {
            if let Some(slot) = histogram.get_mut(idx as usize) {
                *slot += 1;
            }
        }
        Ok(histogram)
    }
}

fn read_u32(bytes: &[u8], offset: usize) -> u32 {
    u32::from_be_bytes([
        bytes[offset],
        bytes[offset + 1],
        bytes[offset + 2],
        bytes[offset + 3],
    ])
}

fn read_be_word(bytes: &[u8]) -> u64 {
    let mut buf = [0u8; 8];
    buf[8 - bytes.len()..].copy_from_slice(bytes);
    u64::from_be_bytes(buf)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn codec(w: usize, k: usize, d: usize, l: usize) -> WKCodec {
        let cfg = Config::new(w, k, d, l, false).unwrap();
        WKCodec::new(cfg).unwrap()
    }

    #[test]
    fn all_zero_page_compresses_to_header_plus_zero_tags() {
        let wk = codec(8, 8, 16, 10);
        let src = vec![0u8; 4096];
        let frame = wk.compress(&src).unwrap();
        assert_eq!(read_u32(&frame, 0), 512);
        assert_eq!(frame.len(), 16 + 128);
        assert_eq!(read_u32(&frame, 4), 16 + 128); // dict_indices_offset
        assert_eq!(read_u32(&frame, 8), 16 + 128); // low_bits_offset
        assert_eq!(read_u32(&frame, 12), 16 + 128); // end_of_frame_offset
        assert!(frame[16..].iter().all(|&b| b == 0));
        assert_eq!(wk.decompress(&frame).unwrap(), src);
    }

    #[test]
    fn repeated_word_misses_once_then_hits_at_dict_index_zero() {
        let wk = codec(8, 8, 16, 10);
        let mut src = Vec::new();
        for _ in 0..512 {
            src.extend_from_slice(&0x00000000DEADBEEFu64.to_be_bytes());
        }
        let frame = wk.compress(&src).unwrap();
        let dict_indices_offset = read_u32(&frame, 4) as usize;
        let low_bits_offset = read_u32(&frame, 8) as usize;
        let tags_area_len = (512usize).div_ceil(32) * 8;
        let full_words = &frame[16 + tags_area_len..dict_indices_offset];
        assert_eq!(full_words.len(), 8);
        assert_eq!(full_words.to_vec(), hex::decode("00000000deadbeef").unwrap());
        // 511 HIT indices at dictionary index 0, packed at 4 bits each.
        assert_eq!(low_bits_offset - dict_indices_offset, (511usize * 4).div_ceil(64) * 8);
        assert_eq!(wk.decompress(&frame).unwrap(), src);
    }

    #[test]
    fn partial_match_reconstructs_new_low_bits() {
        let wk = codec(4, 8, 16, 8);
        let mut src = Vec::new();
        src.extend_from_slice(&0x12345678u32.to_be_bytes());
        src.extend_from_slice(&0x123456AAu32.to_be_bytes());
        let frame = wk.compress(&src).unwrap();
        let round_tripped = wk.decompress(&frame).unwrap();
        assert_eq!(round_tripped, src);
    }

    #[test]
    fn round_trips_across_word_size_dict_size_and_split_grid() {
        // Round trip across the supported (W, D, L, K) combinations.
        for &w in &[4usize, 8] {
            for &k in &[4usize, 8] {
                for &d in &[2usize, 16, 256] {
                    let max_l = 8 * w - 1;
                    for &l in &[1usize, 8, max_l.min(20)] {
                        if l == 0 || l > max_l {
                            continue;
                        }
                        let wk = codec(w, k, d, l);
                        let mut src = Vec::new();
                        for i in 0..64u64 {
                            let word = i.wrapping_mul(0x9E3779B97F4A7C15) % (1 << (w * 8 - 1).min(62));
                            let bytes = word.to_be_bytes();
                            src.extend_from_slice(&bytes[8 - w..]);
                        }
                        let frame = wk.compress(&src).unwrap();
                        assert_eq!(wk.decompress(&frame).unwrap(), src, "w={} k={} d={} l={}", w, k, d, l);
                    }
                }
            }
        }
    }

    #[test]
    fn header_offsets_are_monotonic_and_end_at_frame_length() {
        let wk = codec(8, 8, 16, 10);
        let mut src = Vec::new();
        for i in 0..200u64 {
            src.extend_from_slice(&(i * 7).to_be_bytes());
        }
        let frame = wk.compress(&src).unwrap();
        let dict_indices_offset = read_u32(&frame, 4);
        let low_bits_offset = read_u32(&frame, 8);
        let end_of_frame_offset = read_u32(&frame, 12);
        assert!(16 <= dict_indices_offset);
        assert!(dict_indices_offset <= low_bits_offset);
        assert!(low_bits_offset <= end_of_frame_offset);
        assert_eq!(end_of_frame_offset as usize, frame.len());
    }

    #[test]
    fn zero_precedence_over_dictionary_contents() {
        let wk = codec(8, 8, 2, 10);
        // Fill the tiny dictionary, then feed a zero word; it must still
        // be tagged ZERO regardless of dictionary contents.
        let mut src = Vec::new();
        src.extend_from_slice(&1u64.to_be_bytes());
        src.extend_from_slice(&2u64.to_be_bytes());
        src.extend_from_slice(&0u64.to_be_bytes());
        let frame = wk.compress(&src).unwrap();
        assert_eq!(wk.decompress(&frame).unwrap(), src);
        let tags_area_len = (3usize).div_ceil(32) * 8;
        let tag_byte = frame[16];
        // 3 tags packed MSB-first: MISS(2) MISS(2) ZERO(0) -> 10 10 00 ..
        assert_eq!(tag_byte >> 4, 0b1010);
        let _ = tags_area_len;
    }

    #[test]
    fn corrupt_frame_rejects_short_header() {
        let wk = codec(8, 8, 16, 10);
        assert!(matches!(wk.decompress(&[0u8; 8]), Err(Error::CorruptFrame(_))));
    }

    #[test]
    fn corrupt_frame_rejects_non_monotonic_offsets() {
        let wk = codec(8, 8, 16, 10);
        let mut frame = vec![0u8; 32];
        frame[0..4].copy_from_slice(&4u32.to_be_bytes());
        frame[4..8].copy_from_slice(&30u32.to_be_bytes());
        frame[8..12].copy_from_slice(&20u32.to_be_bytes()); // low_bits_offset < dict_indices_offset
        frame[12..16].copy_from_slice(&32u32.to_be_bytes());
        assert!(matches!(wk.decompress(&frame), Err(Error::CorruptFrame(_))));
    }

    #[test]
    fn invalid_input_rejects_non_multiple_length() {
        let wk = codec(8, 8, 16, 10);
        assert!(matches!(wk.compress(&[0u8; 7]), Err(Error::InvalidInput(_))));
    }

    #[test]
    fn dict_index_histogram_counts_hits() {
        let wk = codec(4, 8, 4, 8);
        let mut src = Vec::new();
        src.extend_from_slice(&0xAAu32.to_be_bytes());
        src.extend_from_slice(&0xBBu32.to_be_bytes());
        src.extend_from_slice(&0xAAu32.to_be_bytes()); // HIT at index 1
        let frame = wk.compress(&src).unwrap();
        let hist = wk.dict_index_histogram(&frame).unwrap();
        assert_eq!(hist.len(), 4);
        assert_eq!(hist.iter().sum::<u32>() >= 1, true);
    }
}
