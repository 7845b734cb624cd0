//! # PNG and APNG chunk stream decoder
//!
//! This crate walks the chunk structure of PNG and Animated PNG files: it
//! validates the file signature, iterates the length-prefixed chunks,
//! verifies each chunk's CRC-32 and classifies the records, including the
//! APNG `acTL`/`fcTL`/`fdAT` extension chunks. Pixel decompression and
//! filtering are deliberately left to consumers of the chunk stream.
//!
//! The most important types are [`Decoder`], which wraps a byte source, and
//! [`ChunkReader`], the lazy iterator it turns into once the signature has
//! been validated.
//!
//! ## Reading chunks
//! ```no_run
//! use std::fs::File;
//!
//! let file = File::open("animation.png").unwrap();
//! let mut reader = png_chunks::Decoder::new(file).read_signature().unwrap();
//! while let Some(chunk) = reader.next_chunk().unwrap() {
//!     println!("{} chunk, {} bytes", chunk.type_, chunk.len());
//! }
//! for diagnostic in reader.diagnostics() {
//!     eprintln!("warning: {}", diagnostic);
//! }
//! ```
//!
//! Corrupt chunks stop decoding by default. To inventory a damaged file
//! instead, request lenient checksum handling:
//! ```no_run
//! use png_chunks::{CrcMode, DecodeOptions, Decoder};
//!
//! let mut options = DecodeOptions::new();
//! options.set_crc_mode(CrcMode::Lenient);
//! # let data: &[u8] = &[];
//! let reader = Decoder::new_with_options(data, options).read_signature();
//! ```

#![deny(unsafe_code)]

pub mod chunk;
mod common;
mod crc;
mod decoder;

pub use chunk::{Chunk, ChunkKind, ChunkType};
pub use common::*;
pub use crc::Crc32;
pub use decoder::{
    ChunkField, ChunkReader, CrcMode, DecodeOptions, Decoded, Decoder, DecodingError, Diagnostic,
    DiagnosticKind, FormatError, FormatErrorInner, Limits, ParameterError, StreamingDecoder,
    SIGNATURE,
};
