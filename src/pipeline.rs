//! Two-stage compression pipeline: WK dictionary coding optionally
//! followed by canonical Huffman byte coding.
//!
//! `Pipeline` gives that two-stage composition a named, reusable type
//! instead of leaving callers to chain the two codecs by hand.

use crate::config::Config;
use crate::error::Error;
use crate::huffman::HuffmanCodec;
use crate::wk::WKCodec;

/// The two supported pipeline shapes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Stage {
    /// WK dictionary coding alone.
    WkOnly,
    /// WK dictionary coding followed by canonical Huffman byte coding.
    WkHuffman,
}

/// A configured compression pipeline.
pub struct Pipeline {
    wk: WKCodec,
    huffman: Option<HuffmanCodec>,
}

impl Pipeline {
    /// WK dictionary coding with no second stage.
    pub fn wk_only(config: Config) -> Result<Self, Error> {
        Ok(Pipeline {
            wk: WKCodec::new(config)?,
            huffman: None,
        })
    }

    /// WK dictionary coding followed by canonical Huffman byte coding.
    pub fn wk_huffman(config: Config) -> Result<Self, Error> {
        Ok(Pipeline {
            wk: WKCodec::new(config)?,
            huffman: Some(HuffmanCodec::new()),
        })
    }

    pub fn stage(&self) -> Stage {
        match self.huffman {
            Some(_) => Stage::WkHuffman,
            None => Stage::WkOnly,
        }
    }

    pub fn config(&self) -> &Config {
        self.wk.config()
    }

    /// Run every configured stage in order, WK first.
    pub fn compress(&self, src: &[u8]) -> Result<Vec<u8>, Error> {
        let wk_frame = self.wk.compress(src)?;
        match &self.huffman {
            Some(huffman) => huffman.compress(&wk_frame),
            None => Ok(wk_frame),
        }
    }

    /// Run every configured stage in reverse, Huffman (if present) first.
    pub fn decompress(&self, frame: &[u8]) -> Result<Vec<u8>, Error> {
        let wk_frame = match &self.huffman {
            Some(huffman) => huffman.decompress(frame)?,
            None => frame.to_vec(),
        };
        self.wk.decompress(&wk_frame)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page(word_size_bytes: usize) -> Vec<u8> {
        let mut src = vec![0u8; 256 * word_size_bytes];
        for (i, chunk) in src.chunks_mut(word_size_bytes).enumerate() {
            if i % 3 == 0 {
                chunk[word_size_bytes - 1] = (i % 7) as u8;
            }
        }
        src
    }

    #[test]
    fn wk_only_round_trips() {
        let cfg = Config::new(8, 8, 16, 10, false).unwrap();
        let pipeline = Pipeline::wk_only(cfg).unwrap();
        let src = page(8);
        let compressed = pipeline.compress(&src).unwrap();
        assert_eq!(pipeline.decompress(&compressed).unwrap(), src);
        assert_eq!(pipeline.stage(), Stage::WkOnly);
    }

    #[test]
    fn wk_huffman_round_trips() {
        let cfg = Config::new(8, 8, 16, 10, false).unwrap();
        let pipeline = Pipeline::wk_huffman(cfg).unwrap();
        let src = page(8);
        let compressed = pipeline.compress(&src).unwrap();
        assert_eq!(pipeline.decompress(&compressed).unwrap(), src);
        assert_eq!(pipeline.stage(), Stage::WkHuffman);
    }

    #[test]
    fn invalid_config_propagates_from_construction() {
        let cfg = Config::new(3, 8, 16, 10, false);
        assert!(cfg.is_err());
    }
}
