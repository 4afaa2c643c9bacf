//! Trinary field codec: cursors, size functions, transcript-coupled fields
//!
//! Buffers are never advanced through shared pointers; every operation goes
//! through an explicit [`TritReader`] or [`TritWriter`] cursor that consumes
//! exactly the requested number of trits or fails with a typed EOF error.
//!
//! Each `wrap_*` function has a matching `sizeof_*` function that predicts
//! the exact number of trits written, from shapes only. The wrap/unwrap pairs
//! keep the transcript on both sides in lockstep:
//!
//! - `absorb` fields are written to the buffer and mixed into the transcript
//! - external fields are mixed into the transcript only
//! - `crypt` fields are keystream-transformed on the way through
//! - `squeeze` fields are keystream output (MAC-style), compared on unwrap

use thiserror::Error;

use crate::sponge::Transcript;
use crate::trits::{self, TRITS_PER_TRYTE, Trit};

/// Errors from cursor and field coding operations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CodecError {
    /// A read or write ran past the end of the buffer.
    #[error("unexpected end of buffer: needed {needed} trits, {remaining} remain")]
    Eof {
        /// Trits the operation needed
        needed: usize,
        /// Trits that were actually available
        remaining: usize,
    },

    /// A decoded dynamic size does not fit the platform word.
    #[error("size field overflow: {digits} base-27 digits")]
    SizeOverflow {
        /// Number of digits the wire claimed
        digits: usize,
    },

    /// A decoded field held a value outside its valid range.
    #[error("invalid {field} value")]
    InvalidValue {
        /// Name of the offending field
        field: &'static str,
    },
}

/// Write cursor over a caller-allocated trit buffer.
pub struct TritWriter<'a> {
    buf: &'a mut [Trit],
    pos: usize,
}

impl<'a> TritWriter<'a> {
    /// Cursor starting at the beginning of `buf`.
    pub fn new(buf: &'a mut [Trit]) -> Self {
        Self { buf, pos: 0 }
    }

    /// Trits written so far.
    pub fn written(&self) -> usize {
        self.pos
    }

    /// Trits still available.
    pub fn remaining(&self) -> usize {
        self.buf.len() - self.pos
    }

    /// Consume exactly `n` trits, or fail without consuming anything.
    pub fn take(&mut self, n: usize) -> Result<&mut [Trit], CodecError> {
        if self.remaining() < n {
            return Err(CodecError::Eof { needed: n, remaining: self.remaining() });
        }
        let start = self.pos;
        self.pos += n;
        Ok(&mut self.buf[start..self.pos])
    }
}

/// Read cursor over a received trit buffer.
pub struct TritReader<'a> {
    buf: &'a [Trit],
    pos: usize,
}

impl<'a> TritReader<'a> {
    /// Cursor starting at the beginning of `buf`.
    pub fn new(buf: &'a [Trit]) -> Self {
        Self { buf, pos: 0 }
    }

    /// Trits consumed so far.
    pub fn consumed(&self) -> usize {
        self.pos
    }

    /// Trits still available.
    pub fn remaining(&self) -> usize {
        self.buf.len() - self.pos
    }

    /// True once the buffer is fully consumed.
    pub fn is_empty(&self) -> bool {
        self.remaining() == 0
    }

    /// Consume exactly `n` trits, or fail without consuming anything.
    pub fn take(&mut self, n: usize) -> Result<&'a [Trit], CodecError> {
        if self.remaining() < n {
            return Err(CodecError::Eof { needed: n, remaining: self.remaining() });
        }
        let start = self.pos;
        self.pos += n;
        Ok(&self.buf[start..self.pos])
    }
}

/// Size of one tryte field.
pub const fn sizeof_tryte() -> usize {
    TRITS_PER_TRYTE
}

/// Size of a one-trit discriminator field (carried as a full tryte).
pub const fn sizeof_oneof() -> usize {
    sizeof_tryte()
}

/// Size of a 9-trit signed integer field.
pub const fn sizeof_trint() -> usize {
    9
}

/// Size of an 18-trit signed integer field.
pub const fn sizeof_long_trint() -> usize {
    18
}

/// Size of `n` trytes of raw payload.
pub const fn sizeof_ntrytes(n: usize) -> usize {
    n * TRITS_PER_TRYTE
}

/// Size of a dynamic `size` field holding `value`.
///
/// One tryte of digit count followed by that many base-27 digits; zero has no
/// digits. Depends only on the value, never on secrets.
pub const fn sizeof_size(value: usize) -> usize {
    sizeof_tryte() + sizeof_ntrytes(base27_digits(value))
}

/// Size of a repeated-count prefix for `count` entries.
pub const fn sizeof_repeated(count: usize) -> usize {
    sizeof_size(count)
}

const fn base27_digits(mut value: usize) -> usize {
    let mut digits = 0;
    while value > 0 {
        digits += 1;
        value /= 27;
    }
    digits
}

/// Write and absorb raw trits.
pub fn wrap_absorb_trits(
    transcript: &mut Transcript,
    writer: &mut TritWriter<'_>,
    data: &[Trit],
) -> Result<(), CodecError> {
    writer.take(data.len())?.copy_from_slice(data);
    transcript.absorb(data);
    Ok(())
}

/// Read and absorb raw trits into `out`.
pub fn unwrap_absorb_trits(
    transcript: &mut Transcript,
    reader: &mut TritReader<'_>,
    out: &mut [Trit],
) -> Result<(), CodecError> {
    out.copy_from_slice(reader.take(out.len())?);
    transcript.absorb(out);
    Ok(())
}

/// Write and absorb one tryte value (`-13..=13`).
pub fn wrap_absorb_tryte(
    transcript: &mut Transcript,
    writer: &mut TritWriter<'_>,
    value: i8,
) -> Result<(), CodecError> {
    let mut tryte = [0; TRITS_PER_TRYTE];
    trits::encode_int(i64::from(value), &mut tryte);
    wrap_absorb_trits(transcript, writer, &tryte)
}

/// Read and absorb one tryte value.
pub fn unwrap_absorb_tryte(
    transcript: &mut Transcript,
    reader: &mut TritReader<'_>,
) -> Result<i8, CodecError> {
    let mut tryte = [0; TRITS_PER_TRYTE];
    unwrap_absorb_trits(transcript, reader, &mut tryte)?;
    Ok(trits::decode_int(&tryte) as i8)
}

/// Write and absorb a 9-trit signed integer.
pub fn wrap_absorb_trint(
    transcript: &mut Transcript,
    writer: &mut TritWriter<'_>,
    value: i16,
) -> Result<(), CodecError> {
    let mut field = [0; sizeof_trint()];
    trits::encode_int(i64::from(value), &mut field);
    wrap_absorb_trits(transcript, writer, &field)
}

/// Read and absorb a 9-trit signed integer.
pub fn unwrap_absorb_trint(
    transcript: &mut Transcript,
    reader: &mut TritReader<'_>,
) -> Result<i16, CodecError> {
    let mut field = [0; sizeof_trint()];
    unwrap_absorb_trits(transcript, reader, &mut field)?;
    Ok(trits::decode_int(&field) as i16)
}

/// Write and absorb a dynamic `size` field.
pub fn wrap_absorb_size(
    transcript: &mut Transcript,
    writer: &mut TritWriter<'_>,
    value: usize,
) -> Result<(), CodecError> {
    let digits = base27_digits(value);
    wrap_absorb_tryte(transcript, writer, center27(digits as u8))?;
    let mut rest = value;
    for _ in 0..digits {
        wrap_absorb_tryte(transcript, writer, center27((rest % 27) as u8))?;
        rest /= 27;
    }
    Ok(())
}

/// Read and absorb a dynamic `size` field.
pub fn unwrap_absorb_size(
    transcript: &mut Transcript,
    reader: &mut TritReader<'_>,
) -> Result<usize, CodecError> {
    let digits = uncenter27(unwrap_absorb_tryte(transcript, reader)?) as usize;
    if digits > base27_digits(usize::MAX) {
        return Err(CodecError::SizeOverflow { digits });
    }
    let mut value: usize = 0;
    let mut scale: usize = 1;
    for i in 0..digits {
        let digit = uncenter27(unwrap_absorb_tryte(transcript, reader)?) as usize;
        value = digit
            .checked_mul(scale)
            .and_then(|d| value.checked_add(d))
            .ok_or(CodecError::SizeOverflow { digits })?;
        if i + 1 < digits {
            scale = scale.checked_mul(27).ok_or(CodecError::SizeOverflow { digits })?;
        }
    }
    Ok(value)
}

/// Mix trits into the transcript without writing them (external field).
pub fn absorb_external(transcript: &mut Transcript, data: &[Trit]) {
    transcript.absorb(data);
}

/// Mix an 18-trit integer into the transcript without writing it.
pub fn absorb_external_long_trint(transcript: &mut Transcript, value: i64) {
    let mut field = [0; sizeof_long_trint()];
    trits::encode_int(value, &mut field);
    transcript.absorb(&field);
}

/// Encrypt and write trits under the transcript keystream.
pub fn wrap_crypt(
    transcript: &mut Transcript,
    writer: &mut TritWriter<'_>,
    plaintext: &[Trit],
) -> Result<(), CodecError> {
    let dst = writer.take(plaintext.len())?;
    dst.copy_from_slice(plaintext);
    transcript.encrypt(dst);
    Ok(())
}

/// Read and decrypt trits under the transcript keystream.
pub fn unwrap_crypt(
    transcript: &mut Transcript,
    reader: &mut TritReader<'_>,
    out: &mut [Trit],
) -> Result<(), CodecError> {
    out.copy_from_slice(reader.take(out.len())?);
    transcript.decrypt(out);
    Ok(())
}

/// Squeeze keystream trits to the wire (MAC-style tag).
pub fn wrap_squeeze(
    transcript: &mut Transcript,
    writer: &mut TritWriter<'_>,
    n: usize,
) -> Result<(), CodecError> {
    transcript.squeeze_into(writer.take(n)?);
    Ok(())
}

/// Read `n` trits and compare against the squeezed keystream.
///
/// Returns `false` on mismatch; the caller decides how hard that failure is.
pub fn unwrap_squeeze_check(
    transcript: &mut Transcript,
    reader: &mut TritReader<'_>,
    n: usize,
) -> Result<bool, CodecError> {
    let wire = reader.take(n)?;
    let mut expected = vec![0; n];
    transcript.squeeze_into(&mut expected);
    Ok(expected.as_slice() == wire)
}

fn center27(digit: u8) -> i8 {
    debug_assert!(digit < 27);
    let d = digit as i8;
    if d > 13 { d - 27 } else { d }
}

fn uncenter27(value: i8) -> u8 {
    value.rem_euclid(27) as u8
}
