//! SEG-D decoder library for seismic field data.
//!
//! This crate decodes SEG-D records carrying 32-bit IEEE demultiplexed
//! data with SERCEL-format extended headers and trace header extension
//! blocks. The whole record is consumed in one forward pass; besides
//! the interpreted headers and sample matrix, the raw bytes of every
//! header block are captured for byte-identical persistence.
//!
//! # Example
//!
//! ```no_run
//! use segd_core::SegdDecoder;
//!
//! let mut decoder = SegdDecoder::new();
//! let record = decoder.decode_file("00000986.segd").unwrap();
//!
//! println!("Decoded {} traces of {} samples", record.matrix.rows(), record.matrix.cols());
//! println!("Shot at {}", record.general.time);
//! ```
//!
//! # Features
//!
//! - General headers 1-3, scan type table, SERCEL extended header
//!   (including the noise-elimination overlay region), free-text
//!   external header, trace headers with 0-7 extension blocks
//! - Sentinel field values normalized to `Option` at decode time
//! - Raw header-block and per-trace byte capture for write-back
//! - Persistence writers for the header block, trace headers, and the
//!   sample matrix

pub mod cursor;
pub mod decoder;
pub mod error;
pub mod output;
pub mod parser;
pub mod types;

// Re-export commonly used types
pub use cursor::ByteCursor;
pub use decoder::SegdDecoder;
pub use error::{Result, SegdError};
pub use output::OutputError;
pub use types::{
    ExtendedHeader, GeneralHeader, NoiseElimination, RecordTime, SampleMatrix, ScanTypeHeader,
    SegdRecord, Trace, TraceHeader, TraceHeaderExtension,
};
