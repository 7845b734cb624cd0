//! The streaming side of the decoder: a resumable state machine that turns
//! raw bytes into chunk records without owning the byte source.

use std::error;
use std::fmt;
use std::io;
use std::mem;

use log::warn;

use crate::chunk::{self, classify, Chunk, ChunkKind, ChunkType};
use crate::common::{
    AnimationControl, BitDepth, BlendOp, ColorType, DisposeOp, FrameControl, Info,
};
use crate::crc::Crc32;

/// Every valid file starts with these eight bytes.
pub const SIGNATURE: [u8; 8] = [0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];

/// Longest chunk payload the format allows (2^31 - 1 bytes).
const MAX_CHUNK_LENGTH: u32 = i32::MAX as u32;

pub(crate) const CHUNK_BUFFER_SIZE: usize = 32 * 1024;

/// Result of one decoding step.
#[derive(Debug)]
pub enum Decoded {
    /// Nothing was decoded, more input is needed.
    Nothing,
    /// The file signature has been read and matched.
    SignatureDone,
    /// Length and type of the next chunk. Fires before its payload is read.
    ChunkBegin(u32, ChunkType),
    /// A whole chunk record, checksum already verified against the stream.
    ChunkComplete(Chunk),
}

/// An error during decoding.
#[derive(Debug)]
pub enum DecodingError {
    /// An error in the underlying byte source.
    IoError(io::Error),
    /// The byte stream violates the file format.
    Format(FormatError),
    /// The decoder was driven in a way that violates its contract.
    Parameter(ParameterError),
    /// A memory limit from [`Limits`] was exhausted.
    LimitsExceeded,
}

/// A format violation, located in the input stream.
#[derive(Debug, PartialEq, Eq)]
pub struct FormatError {
    inner: FormatErrorInner,
    offset: u64,
}

impl FormatError {
    pub(crate) fn at(inner: FormatErrorInner, offset: u64) -> Self {
        FormatError { inner, offset }
    }

    /// Byte offset at which the violation was detected.
    pub fn offset(&self) -> u64 {
        self.offset
    }

    /// The specific violation.
    pub fn kind(&self) -> &FormatErrorInner {
        &self.inner
    }
}

/// The specific format violation.
#[derive(Debug, PartialEq, Eq)]
pub enum FormatErrorInner {
    /// The first eight bytes of the stream are not the PNG signature.
    InvalidSignature,
    /// The stream ended in the middle of a field.
    UnexpectedEof {
        /// The field the read broke off in.
        field: ChunkField,
    },
    /// Stored and computed CRC-32 disagree for one chunk.
    CrcMismatch {
        /// Which chunk failed.
        chunk: ChunkType,
        /// Zero-based index of the failing chunk.
        index: usize,
        /// CRC stored in the stream.
        crc_val: u32,
        /// CRC computed over type tag and payload.
        crc_sum: u32,
    },
    /// The first chunk after the signature is not `IHDR`.
    MissingIhdr {
        /// What was found instead.
        first: ChunkType,
    },
    /// A chunk length above the format ceiling of `2^31 - 1`.
    InvalidChunkLength(u32),
    /// Type tag bytes outside `A-Z` / `a-z`.
    InvalidChunkType([u8; 4]),
    /// A fixed-size chunk with the wrong payload length.
    InvalidChunkSize {
        chunk: ChunkType,
        actual: u32,
    },
    /// A chunk that must precede the image data arrived after it.
    AfterIdat {
        chunk: ChunkType,
    },
    /// `IHDR` declared a width or height of zero.
    InvalidDimensions,
    InvalidBitDepth(u8),
    InvalidColorType(u8),
    InvalidInterlaceMethod(u8),
    InvalidDisposeOp(u8),
    InvalidBlendOp(u8),
}

/// The field of the on-disk chunk layout a read was positioned in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChunkField {
    Length,
    Type,
    Data,
    Crc,
}

/// The decoder was driven in a way that violates its contract.
#[derive(Debug, PartialEq, Eq)]
pub enum ParameterError {
    /// `update` was called again after a fatal error.
    PolledAfterFatalError,
}

impl fmt::Display for Decoded {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Decoded::Nothing => write!(f, "nothing"),
            Decoded::SignatureDone => write!(f, "signature"),
            Decoded::ChunkBegin(len, type_) => write!(f, "begin {} ({} bytes)", type_, len),
            Decoded::ChunkComplete(chunk) => write!(f, "chunk {}", chunk.type_),
        }
    }
}

impl fmt::Display for ChunkField {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = match *self {
            ChunkField::Length => "length",
            ChunkField::Type => "type",
            ChunkField::Data => "data",
            ChunkField::Crc => "crc",
        };
        write!(f, "{}", name)
    }
}

impl fmt::Display for FormatError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{} (at byte offset {})", self.inner, self.offset)
    }
}

impl fmt::Display for FormatErrorInner {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        use FormatErrorInner::*;
        match self {
            InvalidSignature => write!(f, "invalid PNG signature"),
            UnexpectedEof { field } => {
                write!(f, "unexpected end of stream in chunk {} field", field)
            }
            CrcMismatch {
                chunk,
                index,
                crc_val,
                crc_sum,
            } => write!(
                f,
                "CRC error: expected 0x{:08x} have 0x{:08x} while decoding {} chunk at index {}",
                crc_val, crc_sum, chunk, index
            ),
            MissingIhdr { first } => {
                write!(f, "expected IHDR as the first chunk, found {}", first)
            }
            InvalidChunkLength(len) => {
                write!(f, "chunk length {} exceeds the format maximum", len)
            }
            InvalidChunkType(bytes) => {
                write!(f, "invalid chunk type {:?}", bytes)
            }
            InvalidChunkSize { chunk, actual } => {
                write!(f, "wrong payload size {} for {} chunk", actual, chunk)
            }
            AfterIdat { chunk } => {
                write!(f, "chunk {} is not allowed after the image data", chunk)
            }
            InvalidDimensions => write!(f, "invalid image dimensions"),
            InvalidBitDepth(n) => write!(f, "invalid bit depth {}", n),
            InvalidColorType(n) => write!(f, "invalid color type {}", n),
            InvalidInterlaceMethod(n) => write!(f, "invalid interlace method {}", n),
            InvalidDisposeOp(n) => write!(f, "invalid dispose operation {}", n),
            InvalidBlendOp(n) => write!(f, "invalid blend operation {}", n),
        }
    }
}

impl fmt::Display for ParameterError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ParameterError::PolledAfterFatalError => {
                write!(f, "a fatal decoding error has already been reported")
            }
        }
    }
}

impl fmt::Display for DecodingError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            DecodingError::IoError(err) => write!(f, "{}", err),
            DecodingError::Format(err) => write!(f, "{}", err),
            DecodingError::Parameter(err) => write!(f, "{}", err),
            DecodingError::LimitsExceeded => write!(f, "memory limit exceeded"),
        }
    }
}

impl error::Error for DecodingError {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        match self {
            DecodingError::IoError(err) => Some(err),
            _ => None,
        }
    }
}

impl From<io::Error> for DecodingError {
    fn from(err: io::Error) -> Self {
        DecodingError::IoError(err)
    }
}

impl From<FormatError> for DecodingError {
    fn from(err: FormatError) -> Self {
        DecodingError::Format(err)
    }
}

/// How a failed chunk CRC is handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CrcMode {
    /// Stop decoding at the first mismatch.
    #[default]
    Strict,
    /// Record a diagnostic and keep going. The chunk is still yielded, with
    /// [`Chunk::is_valid`] reporting false.
    Lenient,
}

/// Decoder configuration.
#[derive(Debug, Clone, Copy, Default)]
pub struct DecodeOptions {
    crc_mode: CrcMode,
}

impl DecodeOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_crc_mode(&mut self, mode: CrcMode) {
        self.crc_mode = mode;
    }

    pub fn crc_mode(&self) -> CrcMode {
        self.crc_mode
    }
}

/// Limits on the resources the decoder is allowed to use.
#[derive(Debug, Clone, Copy)]
pub struct Limits {
    /// Maximum number of payload bytes a decode session may allocate in
    /// total. Defaults to no limit.
    pub bytes: usize,
}

impl Default for Limits {
    fn default() -> Limits {
        Limits { bytes: usize::MAX }
    }
}

impl Limits {
    fn reserve_bytes(&mut self, bytes: usize) -> Result<(), DecodingError> {
        if self.bytes >= bytes {
            self.bytes -= bytes;
            Ok(())
        } else {
            Err(DecodingError::LimitsExceeded)
        }
    }
}

/// A non-fatal finding recorded during decoding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub kind: DiagnosticKind,
    /// Byte offset the finding refers to.
    pub offset: u64,
    /// Number of chunks completed when the finding was recorded.
    pub chunk_index: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DiagnosticKind {
    /// Stored and computed CRC disagree (lenient mode only).
    CrcMismatch {
        chunk: ChunkType,
        crc_val: u32,
        crc_sum: u32,
    },
    /// A critical chunk the decoder does not recognize. Pixel reconstruction
    /// could not proceed, but the chunk stream itself remains readable.
    UnknownCriticalChunk(ChunkType),
    /// Bytes present after the `IEND` chunk.
    TrailingData,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "{} (at byte offset {}, chunk index {})",
            self.kind, self.offset, self.chunk_index
        )
    }
}

impl fmt::Display for DiagnosticKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            DiagnosticKind::CrcMismatch {
                chunk,
                crc_val,
                crc_sum,
            } => write!(
                f,
                "CRC mismatch in {} chunk: stored 0x{:08x}, computed 0x{:08x}",
                chunk, crc_val, crc_sum
            ),
            DiagnosticKind::UnknownCriticalChunk(chunk) => {
                write!(f, "unrecognized critical chunk {}", chunk)
            }
            DiagnosticKind::TrailingData => write!(f, "data after IEND chunk"),
        }
    }
}

#[derive(Debug)]
enum State {
    /// Next input byte is compared against `SIGNATURE[n]`.
    Signature(u8),
    /// Accumulating a big-endian 32-bit value.
    U32 {
        kind: U32ValueKind,
        bytes: [u8; 4],
        accumulated_count: usize,
    },
    /// Consuming the current chunk's payload.
    ReadChunkData(ChunkType),
}

#[derive(Debug)]
enum U32ValueKind {
    /// Length field of the next chunk.
    Length,
    /// Type tag of the next chunk.
    Type { length: u32 },
    /// Stored CRC of the current chunk.
    Crc(ChunkType),
}

#[derive(Debug)]
struct ChunkState {
    /// Running checksum over type tag and payload.
    crc: Crc32,
    /// Payload bytes still expected.
    remaining: u32,
    /// Payload accumulated so far.
    raw_bytes: Vec<u8>,
    /// Offset of the chunk's length field.
    offset: u64,
}

impl Default for ChunkState {
    fn default() -> Self {
        ChunkState {
            crc: Crc32::new(),
            remaining: 0,
            raw_bytes: Vec::new(),
            offset: 0,
        }
    }
}

/// PNG chunk stream parser, used to parse chunk records out of a stream of
/// bytes fed in arbitrary increments.
///
/// The decoder never reads by itself; callers push byte slices via
/// [`update`](Self::update) and re-supply whatever was not consumed. The
/// higher-level [`ChunkReader`](crate::ChunkReader) drives it from any
/// [`Read`](std::io::Read) source.
#[derive(Debug)]
pub struct StreamingDecoder {
    state: Option<State>,
    current_chunk: ChunkState,
    options: DecodeOptions,
    pub(crate) limits: Limits,
    info: Option<Info>,
    diagnostics: Vec<Diagnostic>,
    /// Total bytes consumed from the stream so far.
    consumed: u64,
    /// Chunks completed so far.
    chunks_read: usize,
    have_idat: bool,
    seen_iend: bool,
}

impl StreamingDecoder {
    pub fn new() -> Self {
        Self::new_with_options(DecodeOptions::default())
    }

    pub fn new_with_options(options: DecodeOptions) -> Self {
        StreamingDecoder {
            state: Some(State::Signature(0)),
            current_chunk: ChunkState::default(),
            options,
            limits: Limits::default(),
            info: None,
            diagnostics: Vec::new(),
            consumed: 0,
            chunks_read: 0,
            have_idat: false,
            seen_iend: false,
        }
    }

    /// Low level decoding. Updates the internal state machine with the bytes
    /// in `buf`.
    ///
    /// Returns how many bytes were consumed and the decoding result. Bytes
    /// not consumed must be supplied again on the next call.
    pub fn update(&mut self, mut buf: &[u8]) -> Result<(usize, Decoded), DecodingError> {
        let len = buf.len();
        while !buf.is_empty() {
            match self.next_state(buf)? {
                (bytes, Decoded::Nothing) => buf = &buf[bytes..],
                (bytes, result) => {
                    buf = &buf[bytes..];
                    return Ok((len - buf.len(), result));
                }
            }
        }
        Ok((len, Decoded::Nothing))
    }

    /// Metadata accumulated so far. `None` until the `IHDR` chunk completes.
    pub fn info(&self) -> Option<&Info> {
        self.info.as_ref()
    }

    /// Non-fatal findings recorded so far, in stream order.
    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    /// Total bytes consumed from the stream.
    pub fn bytes_consumed(&self) -> u64 {
        self.consumed
    }

    /// Number of chunk records completed.
    pub fn chunks_read(&self) -> usize {
        self.chunks_read
    }

    /// True once the `IEND` chunk has completed.
    pub fn image_end(&self) -> bool {
        self.seen_iend
    }

    fn next_state(&mut self, buf: &[u8]) -> Result<(usize, Decoded), DecodingError> {
        if self.seen_iend {
            // The terminal chunk has been read; everything else is trailing
            // garbage. Swallow it so the state machine cannot be driven past
            // the end of the stream.
            self.record_trailing_data();
            self.consumed += buf.len() as u64;
            return Ok((buf.len(), Decoded::Nothing));
        }

        let state = match self.state.take() {
            Some(state) => state,
            None => {
                return Err(DecodingError::Parameter(
                    ParameterError::PolledAfterFatalError,
                ))
            }
        };

        match state {
            State::Signature(i) => {
                let remaining = SIGNATURE.len() - i as usize;
                let n = remaining.min(buf.len());
                for k in 0..n {
                    if buf[k] != SIGNATURE[i as usize + k] {
                        return Err(self.fatal_at(
                            FormatErrorInner::InvalidSignature,
                            self.consumed + k as u64,
                        ));
                    }
                }
                self.consumed += n as u64;
                if n == remaining {
                    self.state = Some(State::U32 {
                        kind: U32ValueKind::Length,
                        bytes: [0; 4],
                        accumulated_count: 0,
                    });
                    Ok((n, Decoded::SignatureDone))
                } else {
                    self.state = Some(State::Signature(i + n as u8));
                    Ok((n, Decoded::Nothing))
                }
            }
            State::U32 {
                kind,
                mut bytes,
                accumulated_count,
            } => {
                let n = (4 - accumulated_count).min(buf.len());
                bytes[accumulated_count..accumulated_count + n].copy_from_slice(&buf[..n]);
                let accumulated_count = accumulated_count + n;
                self.consumed += n as u64;
                if accumulated_count < 4 {
                    self.state = Some(State::U32 {
                        kind,
                        bytes,
                        accumulated_count,
                    });
                    Ok((n, Decoded::Nothing))
                } else {
                    let decoded = self.parse_u32(kind, bytes)?;
                    Ok((n, decoded))
                }
            }
            State::ReadChunkData(type_) => {
                let remaining = self.current_chunk.remaining as usize;
                if remaining == 0 {
                    self.state = Some(State::U32 {
                        kind: U32ValueKind::Crc(type_),
                        bytes: [0; 4],
                        accumulated_count: 0,
                    });
                    Ok((0, Decoded::Nothing))
                } else {
                    let n = remaining.min(buf.len());
                    self.current_chunk.crc.update(&buf[..n]);
                    self.current_chunk.raw_bytes.extend_from_slice(&buf[..n]);
                    self.current_chunk.remaining -= n as u32;
                    self.consumed += n as u64;
                    self.state = Some(State::ReadChunkData(type_));
                    Ok((n, Decoded::Nothing))
                }
            }
        }
    }

    fn parse_u32(&mut self, kind: U32ValueKind, bytes: [u8; 4]) -> Result<Decoded, DecodingError> {
        match kind {
            U32ValueKind::Length => {
                let length = u32::from_be_bytes(bytes);
                if length > MAX_CHUNK_LENGTH {
                    return Err(self.fatal_at(
                        FormatErrorInner::InvalidChunkLength(length),
                        self.consumed - 4,
                    ));
                }
                self.current_chunk.offset = self.consumed - 4;
                self.state = Some(State::U32 {
                    kind: U32ValueKind::Type { length },
                    bytes: [0; 4],
                    accumulated_count: 0,
                });
                Ok(Decoded::Nothing)
            }
            U32ValueKind::Type { length } => {
                let type_ = ChunkType(bytes);
                if bytes.iter().any(|b| !b.is_ascii_alphabetic()) {
                    return Err(self.fatal_at(
                        FormatErrorInner::InvalidChunkType(bytes),
                        self.consumed - 4,
                    ));
                }
                if self.chunks_read == 0 && type_ != chunk::IHDR {
                    return Err(self.fatal_at(
                        FormatErrorInner::MissingIhdr { first: type_ },
                        self.consumed - 4,
                    ));
                }
                if type_ == chunk::acTL && self.have_idat {
                    return Err(self.fatal_at(
                        FormatErrorInner::AfterIdat { chunk: type_ },
                        self.consumed - 4,
                    ));
                }
                if chunk::is_critical(type_) && classify(type_) == ChunkKind::Unknown {
                    let offset = self.current_chunk.offset;
                    self.record(DiagnosticKind::UnknownCriticalChunk(type_), offset);
                }
                self.limits.reserve_bytes(length as usize)?;
                self.current_chunk.remaining = length;
                self.current_chunk.raw_bytes.clear();
                self.current_chunk.crc.reset();
                self.current_chunk.crc.update(&bytes);
                self.state = Some(State::ReadChunkData(type_));
                Ok(Decoded::ChunkBegin(length, type_))
            }
            U32ValueKind::Crc(type_) => {
                let crc_val = u32::from_be_bytes(bytes);
                let crc_sum = self.current_chunk.crc.finalize();
                let index = self.chunks_read;
                let offset = self.current_chunk.offset;
                if crc_val != crc_sum {
                    match self.options.crc_mode() {
                        CrcMode::Strict => {
                            return Err(self.fatal_at(
                                FormatErrorInner::CrcMismatch {
                                    chunk: type_,
                                    index,
                                    crc_val,
                                    crc_sum,
                                },
                                offset,
                            ));
                        }
                        CrcMode::Lenient => {
                            self.record(
                                DiagnosticKind::CrcMismatch {
                                    chunk: type_,
                                    crc_val,
                                    crc_sum,
                                },
                                offset,
                            );
                        }
                    }
                }
                let chunk = Chunk {
                    type_,
                    data: mem::take(&mut self.current_chunk.raw_bytes),
                    crc: crc_val,
                    computed_crc: crc_sum,
                    offset,
                    index,
                };
                self.parse_chunk(&chunk)?;
                self.chunks_read += 1;
                if type_ == chunk::IEND {
                    self.seen_iend = true;
                } else {
                    self.state = Some(State::U32 {
                        kind: U32ValueKind::Length,
                        bytes: [0; 4],
                        accumulated_count: 0,
                    });
                }
                Ok(Decoded::ChunkComplete(chunk))
            }
        }
    }

    /// Folds a completed chunk into the accumulated metadata.
    fn parse_chunk(&mut self, chunk: &Chunk) -> Result<(), DecodingError> {
        match chunk.kind() {
            ChunkKind::Header => self.parse_ihdr(chunk),
            ChunkKind::ImageData => {
                self.have_idat = true;
                Ok(())
            }
            ChunkKind::AnimationControl => self.parse_actl(chunk),
            ChunkKind::FrameControl => self.parse_fctl(chunk),
            _ => Ok(()),
        }
    }

    fn parse_ihdr(&mut self, chunk: &Chunk) -> Result<(), DecodingError> {
        let data = &chunk.data;
        if data.len() != 13 {
            return Err(self.wrong_size(chunk));
        }
        let width = u32::from_be_bytes([data[0], data[1], data[2], data[3]]);
        let height = u32::from_be_bytes([data[4], data[5], data[6], data[7]]);
        if width == 0 || height == 0 {
            return Err(self.fatal_at(FormatErrorInner::InvalidDimensions, chunk.offset));
        }
        let bit_depth = match BitDepth::from_u8(data[8]) {
            Some(depth) => depth,
            None => {
                return Err(self.fatal_at(FormatErrorInner::InvalidBitDepth(data[8]), chunk.offset))
            }
        };
        let color_type = match ColorType::from_u8(data[9]) {
            Some(color) => color,
            None => {
                return Err(
                    self.fatal_at(FormatErrorInner::InvalidColorType(data[9]), chunk.offset)
                )
            }
        };
        let interlaced = match data[12] {
            0 => false,
            1 => true,
            n => {
                return Err(self.fatal_at(FormatErrorInner::InvalidInterlaceMethod(n), chunk.offset))
            }
        };
        self.info = Some(Info {
            width,
            height,
            bit_depth,
            color_type,
            interlaced,
            ..Info::default()
        });
        Ok(())
    }

    fn parse_actl(&mut self, chunk: &Chunk) -> Result<(), DecodingError> {
        let data = &chunk.data;
        if data.len() != 8 {
            return Err(self.wrong_size(chunk));
        }
        let animation_control = AnimationControl {
            num_frames: u32::from_be_bytes([data[0], data[1], data[2], data[3]]),
            num_plays: u32::from_be_bytes([data[4], data[5], data[6], data[7]]),
        };
        if let Some(info) = self.info.as_mut() {
            info.animation_control = Some(animation_control);
        }
        Ok(())
    }

    fn parse_fctl(&mut self, chunk: &Chunk) -> Result<(), DecodingError> {
        let data = &chunk.data;
        if data.len() != 26 {
            return Err(self.wrong_size(chunk));
        }
        let dispose_op = match DisposeOp::from_u8(data[24]) {
            Some(op) => op,
            None => {
                return Err(
                    self.fatal_at(FormatErrorInner::InvalidDisposeOp(data[24]), chunk.offset)
                )
            }
        };
        let blend_op = match BlendOp::from_u8(data[25]) {
            Some(op) => op,
            None => {
                return Err(self.fatal_at(FormatErrorInner::InvalidBlendOp(data[25]), chunk.offset))
            }
        };
        let frame_control = FrameControl {
            sequence_number: u32::from_be_bytes([data[0], data[1], data[2], data[3]]),
            width: u32::from_be_bytes([data[4], data[5], data[6], data[7]]),
            height: u32::from_be_bytes([data[8], data[9], data[10], data[11]]),
            x_offset: u32::from_be_bytes([data[12], data[13], data[14], data[15]]),
            y_offset: u32::from_be_bytes([data[16], data[17], data[18], data[19]]),
            delay_num: u16::from_be_bytes([data[20], data[21]]),
            delay_den: u16::from_be_bytes([data[22], data[23]]),
            dispose_op,
            blend_op,
        };
        if let Some(info) = self.info.as_mut() {
            info.frame_control = Some(frame_control);
        }
        Ok(())
    }

    fn wrong_size(&mut self, chunk: &Chunk) -> DecodingError {
        self.fatal_at(
            FormatErrorInner::InvalidChunkSize {
                chunk: chunk.type_,
                actual: chunk.len(),
            },
            chunk.offset,
        )
    }

    /// A fatal error terminates the state machine for good.
    fn fatal_at(&mut self, inner: FormatErrorInner, offset: u64) -> DecodingError {
        self.state = None;
        DecodingError::Format(FormatError::at(inner, offset))
    }

    fn record(&mut self, kind: DiagnosticKind, offset: u64) {
        let diagnostic = Diagnostic {
            kind,
            offset,
            chunk_index: self.chunks_read,
        };
        warn!("{}", diagnostic);
        self.diagnostics.push(diagnostic);
    }

    /// Records the presence of bytes past the `IEND` chunk, once.
    pub(crate) fn record_trailing_data(&mut self) {
        let already = self
            .diagnostics
            .iter()
            .any(|d| d.kind == DiagnosticKind::TrailingData);
        if !already {
            let offset = self.consumed;
            self.record(DiagnosticKind::TrailingData, offset);
        }
    }

    /// The error to report when the byte source runs dry mid-stream. Which
    /// error depends on where the state machine stopped: inside the signature
    /// a short file is simply not a PNG, anywhere else it is a truncation of
    /// the field being read.
    pub(crate) fn eof_error(&self) -> DecodingError {
        let inner = match &self.state {
            Some(State::Signature(_)) => FormatErrorInner::InvalidSignature,
            Some(State::U32 {
                kind: U32ValueKind::Length,
                ..
            })
            | None => FormatErrorInner::UnexpectedEof {
                field: ChunkField::Length,
            },
            Some(State::U32 {
                kind: U32ValueKind::Type { .. },
                ..
            }) => FormatErrorInner::UnexpectedEof {
                field: ChunkField::Type,
            },
            Some(State::U32 {
                kind: U32ValueKind::Crc(_),
                ..
            }) => FormatErrorInner::UnexpectedEof {
                field: ChunkField::Crc,
            },
            Some(State::ReadChunkData(_)) => FormatErrorInner::UnexpectedEof {
                field: ChunkField::Data,
            },
        };
        DecodingError::Format(FormatError::at(inner, self.consumed))
    }
}

impl Default for StreamingDecoder {
    fn default() -> Self {
        Self::new()
    }
}
