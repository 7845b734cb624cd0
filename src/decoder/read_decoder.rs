use super::stream::{
    DecodeOptions, Decoded, DecodingError, Diagnostic, Limits, StreamingDecoder,
    CHUNK_BUFFER_SIZE,
};

use std::io::{BufRead, BufReader, Read};

use crate::common::Info;

/// Helper for encapsulating reading input from `Read` and feeding it into a
/// `StreamingDecoder`, hiding buffer management from the chunk-level API.
#[derive(Debug)]
pub(crate) struct ReadDecoder<R: Read> {
    reader: BufReader<R>,
    decoder: StreamingDecoder,
}

impl<R: Read> ReadDecoder<R> {
    pub fn with_options(r: R, options: DecodeOptions) -> Self {
        ReadDecoder {
            reader: BufReader::with_capacity(CHUNK_BUFFER_SIZE, r),
            decoder: StreamingDecoder::new_with_options(options),
        }
    }

    pub fn set_limits(&mut self, limits: Limits) {
        self.decoder.limits = limits;
    }

    /// Runs the state machine until it produces an event or the source is
    /// exhausted.
    ///
    /// `Ok(None)` is the clean end of the stream: the `IEND` record has been
    /// delivered and nothing further will be decoded. Running dry anywhere
    /// else maps to the truncation error for the field the decoder stopped
    /// in.
    pub fn decode_next(&mut self) -> Result<Option<Decoded>, DecodingError> {
        loop {
            if self.decoder.image_end() {
                return Ok(None);
            }
            let (consumed, result) = {
                let buf = self.reader.fill_buf()?;
                if buf.is_empty() {
                    return Err(self.decoder.eof_error());
                }
                self.decoder.update(buf)?
            };
            self.reader.consume(consumed);
            match result {
                Decoded::Nothing => {}
                result => return Ok(Some(result)),
            }
        }
    }

    /// Reads until the end of the signature.
    ///
    /// Prerequisite: nothing has been read yet.
    pub fn read_signature(&mut self) -> Result<(), DecodingError> {
        while !matches!(self.decode_next()?, Some(Decoded::SignatureDone)) {}
        Ok(())
    }

    /// After the terminal chunk, peeks at the source and records any bytes
    /// still present as trailing data.
    ///
    /// Prerequisite: the `IEND` chunk has completed.
    pub fn check_trailing_data(&mut self) -> Result<(), DecodingError> {
        debug_assert!(self.decoder.image_end());
        let buf = self.reader.fill_buf()?;
        if !buf.is_empty() {
            self.decoder.record_trailing_data();
        }
        Ok(())
    }

    pub fn info(&self) -> Option<&Info> {
        self.decoder.info()
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        self.decoder.diagnostics()
    }

    pub fn bytes_consumed(&self) -> u64 {
        self.decoder.bytes_consumed()
    }

    pub fn chunks_read(&self) -> usize {
        self.decoder.chunks_read()
    }
}
