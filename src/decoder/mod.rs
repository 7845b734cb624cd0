//! Chunk-level decoding of PNG and APNG streams.

mod read_decoder;
pub(crate) mod stream;

pub use self::stream::{
    ChunkField, CrcMode, DecodeOptions, Decoded, DecodingError, Diagnostic, DiagnosticKind,
    FormatError, FormatErrorInner, Limits, ParameterError, StreamingDecoder, SIGNATURE,
};

use std::io::Read;

use self::read_decoder::ReadDecoder;
use crate::chunk::{self, Chunk};
use crate::common::Info;

/// PNG decoder, a builder for [`ChunkReader`].
pub struct Decoder<R: Read> {
    read_decoder: ReadDecoder<R>,
}

impl<R: Read> Decoder<R> {
    /// Creates a decoder reading from `r` with default options.
    pub fn new(r: R) -> Decoder<R> {
        Decoder::new_with_options(r, DecodeOptions::default())
    }

    pub fn new_with_options(r: R, options: DecodeOptions) -> Decoder<R> {
        Decoder {
            read_decoder: ReadDecoder::with_options(r, options),
        }
    }

    /// Caps the amount of payload memory one decode session may allocate.
    pub fn set_limits(&mut self, limits: Limits) {
        self.read_decoder.set_limits(limits);
    }

    /// Reads and validates the file signature, returning the chunk reader.
    ///
    /// Fails with `InvalidSignature` when the source does not begin with the
    /// eight PNG magic bytes, without reading anything past them.
    pub fn read_signature(mut self) -> Result<ChunkReader<R>, DecodingError> {
        self.read_decoder.read_signature()?;
        Ok(ChunkReader {
            decoder: self.read_decoder,
            finished: false,
        })
    }
}

/// Lazily yields the chunks of a PNG stream.
///
/// Each call to [`next_chunk`](Self::next_chunk) performs a bounded amount of
/// input reading and returns one record; the file as a whole is never
/// buffered. The reader terminates after the `IEND` record or at the first
/// fatal error, and the underlying source is dropped with it.
#[derive(Debug)]
pub struct ChunkReader<R: Read> {
    decoder: ReadDecoder<R>,
    finished: bool,
}

impl<R: Read> ChunkReader<R> {
    /// Returns the next chunk record, or `Ok(None)` at the end of the
    /// stream.
    ///
    /// A fatal error finishes the reader; later calls return `Ok(None)`.
    pub fn next_chunk(&mut self) -> Result<Option<Chunk>, DecodingError> {
        if self.finished {
            return Ok(None);
        }
        loop {
            match self.decoder.decode_next() {
                Ok(Some(Decoded::ChunkComplete(chunk))) => {
                    if chunk.type_ == chunk::IEND {
                        self.finished = true;
                        self.decoder.check_trailing_data()?;
                    }
                    return Ok(Some(chunk));
                }
                Ok(Some(_)) => {}
                Ok(None) => {
                    self.finished = true;
                    return Ok(None);
                }
                Err(err) => {
                    self.finished = true;
                    return Err(err);
                }
            }
        }
    }

    /// Metadata accumulated from the chunks read so far. `None` until the
    /// `IHDR` record has been returned.
    pub fn info(&self) -> Option<&Info> {
        self.decoder.info()
    }

    /// Non-fatal findings recorded so far, in stream order.
    pub fn diagnostics(&self) -> &[Diagnostic] {
        self.decoder.diagnostics()
    }

    /// Number of chunk records completed.
    pub fn chunks_read(&self) -> usize {
        self.decoder.chunks_read()
    }

    /// Total bytes consumed from the source.
    pub fn bytes_consumed(&self) -> u64 {
        self.decoder.bytes_consumed()
    }
}

impl<R: Read> Iterator for ChunkReader<R> {
    type Item = Result<Chunk, DecodingError>;

    /// Equivalent to [`next_chunk`](Self::next_chunk); fused after the
    /// terminal state.
    fn next(&mut self) -> Option<Self::Item> {
        self.next_chunk().transpose()
    }
}
