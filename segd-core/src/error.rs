//! Error types for SEG-D decoding.

use thiserror::Error;

/// Errors that can occur while decoding a SEG-D record.
///
/// Every fatal condition aborts the whole decode; no partial record is
/// returned. The only internally recovered condition, an all-zero scan
/// type header, never surfaces here (the scan table builder skips it).
#[derive(Debug, Error)]
pub enum SegdError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("unsupported format code {code}: only 32-bit IEEE demultiplexed data (8058) is supported")]
    UnsupportedFormat { code: u64 },

    #[error("invalid BCD byte {byte:#04X}: nibble out of decimal range")]
    InvalidBcd { byte: u8 },

    #[error("invalid input length: expected {expected}, got {actual} bytes")]
    InvalidLength {
        expected: &'static str,
        actual: usize,
    },

    #[error("unexpected end of stream: needed {needed} bytes, {remaining} remaining")]
    UnexpectedEndOfStream { needed: usize, remaining: usize },

    #[error("trace header declares {count} extension blocks, at most 7 are defined")]
    InvalidExtensionCount { count: u32 },

    #[error("trace references channel set {channel_set} absent from the scan type table")]
    MissingChannelSetMapping { channel_set: u64 },
}

pub type Result<T> = std::result::Result<T, SegdError>;
