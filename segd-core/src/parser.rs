//! Low-level decoding of SEG-D byte fields.
//!
//! Pure functions converting fixed-width big-endian byte slices into
//! integers, binary-coded decimals, binary fractions, floats, and
//! filtered ASCII text. No state, no I/O; everything the block readers
//! do is expressed in terms of these primitives.

use byteorder::{BigEndian, ByteOrder};

use crate::error::{Result, SegdError};

/// Splits a byte into its (high, low) nibbles.
///
/// Packed half-byte fields (polarity, record length high part, trace
/// header extension flags) are built from these.
#[inline]
pub fn bcd_nibbles(byte: u8) -> (u8, u8) {
    (byte >> 4, byte & 0x0F)
}

/// Decodes an arbitrary-length binary-coded decimal into an integer.
///
/// Each nibble is one base-10 digit, most significant first; a nibble
/// value of 10 or more is malformed BCD.
pub fn decode_bcd(bytes: &[u8]) -> Result<u64> {
    if bytes.is_empty() {
        return Err(SegdError::InvalidLength {
            expected: "at least 1",
            actual: 0,
        });
    }
    let mut value: u64 = 0;
    for &byte in bytes {
        let (hi, lo) = bcd_nibbles(byte);
        if hi > 9 || lo > 9 {
            return Err(SegdError::InvalidBcd { byte });
        }
        value = value * 100 + hi as u64 * 10 + lo as u64;
    }
    Ok(value)
}

/// Decodes 1 to 4 bytes as a big-endian unsigned integer.
///
/// Shorter inputs are zero-padded on the left to 4 bytes.
#[inline]
pub fn decode_bin(bytes: &[u8]) -> Result<u32> {
    if bytes.is_empty() || bytes.len() > 4 {
        return Err(SegdError::InvalidLength {
            expected: "1 to 4",
            actual: bytes.len(),
        });
    }
    let mut padded = [0u8; 4];
    padded[4 - bytes.len()..].copy_from_slice(bytes);
    Ok(BigEndian::read_u32(&padded))
}

/// Decodes 1 to 4 bytes as a boolean: true iff the integer value is nonzero.
#[inline]
pub fn decode_bin_bool(bytes: &[u8]) -> Result<bool> {
    Ok(decode_bin(bytes)? > 0)
}

/// Decodes a positive binary fraction in [0, 1).
///
/// The bit string is read most significant bit first, bit i weighing
/// 2^-(i+1). Used for the fractional parts of source line and point
/// numbers in General Header 3.
pub fn decode_fraction(bytes: &[u8]) -> Result<f64> {
    if bytes.is_empty() {
        return Err(SegdError::InvalidLength {
            expected: "at least 1",
            actual: 0,
        });
    }
    let mut value = 0.0;
    let mut weight = 0.5;
    for &byte in bytes {
        for bit in (0..8).rev() {
            if byte >> bit & 1 == 1 {
                value += weight;
            }
            weight /= 2.0;
        }
    }
    Ok(value)
}

/// Decodes 1 to 4 bytes as a big-endian IEEE single-precision float.
///
/// Shorter inputs are zero-padded on the left. A decoded NaN is
/// normalized to `None` rather than propagated.
pub fn decode_f32(bytes: &[u8]) -> Result<Option<f32>> {
    if bytes.is_empty() || bytes.len() > 4 {
        return Err(SegdError::InvalidLength {
            expected: "1 to 4",
            actual: bytes.len(),
        });
    }
    let mut padded = [0u8; 4];
    padded[4 - bytes.len()..].copy_from_slice(bytes);
    let value = BigEndian::read_f32(&padded);
    Ok(if value.is_nan() { None } else { Some(value) })
}

/// Decodes exactly 8 bytes as a big-endian IEEE double-precision float.
#[inline]
pub fn decode_f64(bytes: &[u8]) -> Result<f64> {
    if bytes.len() != 8 {
        return Err(SegdError::InvalidLength {
            expected: "exactly 8",
            actual: bytes.len(),
        });
    }
    Ok(BigEndian::read_f64(bytes))
}

/// Decodes a byte slice as printable ASCII, dropping everything else.
///
/// An empty result after filtering is reported as `None`, not as an
/// empty string.
pub fn decode_ascii(bytes: &[u8]) -> Option<String> {
    let text: String = bytes
        .iter()
        .filter(|b| b.is_ascii_graphic() || b.is_ascii_whitespace())
        .map(|&b| b as char)
        .collect();
    if text.is_empty() {
        None
    } else {
        Some(text)
    }
}

/// Returns the seismological band code for a sample rate in Hz,
/// assuming a short-period instrument.
#[inline]
pub fn band_code(sample_rate_hz: f64) -> Option<char> {
    if sample_rate_hz >= 1000.0 {
        Some('G')
    } else if sample_rate_hz >= 250.0 {
        Some('D')
    } else if sample_rate_hz >= 80.0 {
        Some('E')
    } else if sample_rate_hz >= 10.0 {
        Some('S')
    } else {
        None
    }
}
