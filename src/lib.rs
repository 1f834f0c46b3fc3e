//! # wkcodec
//!
//! A word-oriented dictionary compressor for virtual-memory pages (the
//! WK family of page compressors), with an optional canonical Huffman
//! second stage.
//!
//! * `wk` implements the dictionary-based word classifier and frame
//!   codec.
//! * `huffman` implements a canonical Huffman byte coder with a compact
//!   length-only header, usable standalone or as the WK frame's second
//!   stage.
//! * `pipeline` composes the two into the shapes the CLI exposes.
//! * `config` holds the immutable parameters (word size, dictionary
//!   size, packing granularity, low-bit split) shared by the WK codec
//!   and its bit packer.
//!
//! ## Buffer Example
//!
//! ```rs
//! use wkcodec::{config::Config, pipeline::Pipeline};
//! let cfg = Config::default();
//! let pipeline = Pipeline::wk_huffman(cfg).expect("valid config");
//! let page = vec![0u8; 4096];
//! let compressed = pipeline.compress(&page).expect("compression failed");
//! let restored = pipeline.decompress(&compressed).expect("decompression failed");
//! assert_eq!(page, restored);
//! ```

pub mod bitpack;
pub mod config;
pub mod dictionary;
pub mod error;
pub mod huffman;
pub mod pipeline;
pub mod wk;

pub use config::Config;
pub use error::Error;
pub use huffman::HuffmanCodec;
pub use pipeline::Pipeline;
pub use wk::WKCodec;
