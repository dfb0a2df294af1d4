//! Persistence writers for decoded SEG-D records.
//!
//! Three artifacts mirror what write-back collaborators expect: a
//! byte-identical dump of the captured header block, one raw dump per
//! trace of its header + extension bytes, and a plain-text table of the
//! sample matrix.

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::Path;

use thiserror::Error;

use crate::types::{SampleMatrix, SegdRecord};

/// Errors that can occur while writing parsed artifacts.
#[derive(Error, Debug)]
pub enum OutputError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Writes the captured header block bytes unchanged.
pub fn write_header_block<P: AsRef<Path>>(path: P, header_block: &[u8]) -> Result<(), OutputError> {
    let mut file = File::create(path)?;
    file.write_all(header_block)?;
    Ok(())
}

/// Writes one raw `<stem>.trace_<i>.headers` file per trace into
/// `dir/trace_headers/`, numbering from 1 in trace order.
pub fn write_trace_headers<P: AsRef<Path>>(
    dir: P,
    stem: &str,
    trace_headers_raw: &[Vec<u8>],
) -> Result<(), OutputError> {
    let headers_dir = dir.as_ref().join("trace_headers");
    fs::create_dir_all(&headers_dir)?;
    for (i, raw) in trace_headers_raw.iter().enumerate() {
        let path = headers_dir.join(format!("{}.trace_{}.headers", stem, i + 1));
        let mut file = File::create(path)?;
        file.write_all(raw)?;
    }
    Ok(())
}

/// Writes the sample matrix as a text table: one line per trace,
/// space-separated samples with 16 decimal places.
pub fn write_trace_data<P: AsRef<Path>>(path: P, matrix: &SampleMatrix) -> Result<(), OutputError> {
    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);
    for row in 0..matrix.rows() {
        let mut first = true;
        for &sample in matrix.row(row) {
            if !first {
                write!(writer, " ")?;
            }
            write!(writer, "{:.16}", sample as f64)?;
            first = false;
        }
        writeln!(writer)?;
    }
    writer.flush()?;
    Ok(())
}

/// Writes all three artifacts for a decoded record under `dir`:
/// `<stem>.hdr_block`, `trace_headers/<stem>.trace_<i>.headers`, and
/// `<stem>.trace_data`.
pub fn write_record<P: AsRef<Path>>(
    dir: P,
    stem: &str,
    record: &SegdRecord,
) -> Result<(), OutputError> {
    let dir = dir.as_ref();
    fs::create_dir_all(dir)?;
    write_header_block(dir.join(format!("{stem}.hdr_block")), &record.header_block)?;
    write_trace_headers(dir, stem, &record.trace_headers_raw)?;
    write_trace_data(dir.join(format!("{stem}.trace_data")), &record.matrix)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ScanTypeHeader, Trace, TraceHeader};

    fn matrix(rows: Vec<Vec<f32>>) -> SampleMatrix {
        let cols = rows[0].len();
        let traces: Vec<Trace> = rows
            .into_iter()
            .map(|samples| Trace {
                header: TraceHeader {
                    file_number: None,
                    scan_type_number: 1,
                    channel_set_number: 1,
                    trace_number: 1,
                    first_timing_word_ms: 0.0,
                    trace_header_extensions: 0,
                    sample_skew: 0,
                    trace_edit: 0,
                    time_break_window: 0.0,
                    extended_channel_set_number: 0,
                    extended_file_number: 0,
                },
                extensions: Vec::new(),
                scan_type: ScanTypeHeader {
                    scan_type_number: 1,
                    channel_set_number: 1,
                    starting_time: 0,
                    end_time: 0,
                    number_of_channels: 1,
                    channel_type_id: 1,
                    subscans_exponent: 0,
                    gain_control_method: 0,
                    alias_filter_freq_hz: 0,
                    alias_filter_slope_db_per_octave: 0,
                    low_cut_filter_freq_hz: 0,
                    low_cut_filter_slope_db_per_octave: 0,
                    first_notch_freq: 0,
                    second_notch_freq: 0,
                    third_notch_freq: 0,
                    extended_channel_set_number: 0,
                    extended_header_flag: 0,
                    trace_header_extensions: 0,
                    vertical_stack: 0,
                    streamer_cable_number: 0,
                    array_forming: 0,
                },
                band_code: None,
                samples,
            })
            .collect();
        SampleMatrix::from_traces(&traces, cols)
    }

    #[test]
    fn test_write_header_block_is_byte_identical() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rec.hdr_block");
        let bytes = vec![0x09u8, 0x86, 0x80, 0x58, 0x00, 0xFF];
        write_header_block(&path, &bytes).unwrap();
        assert_eq!(fs::read(&path).unwrap(), bytes);
    }

    #[test]
    fn test_write_trace_headers_one_file_per_trace() {
        let dir = tempfile::tempdir().unwrap();
        let raw = vec![vec![1u8, 2, 3], vec![4u8, 5]];
        write_trace_headers(dir.path(), "rec", &raw).unwrap();
        let base = dir.path().join("trace_headers");
        assert_eq!(
            fs::read(base.join("rec.trace_1.headers")).unwrap(),
            vec![1, 2, 3]
        );
        assert_eq!(
            fs::read(base.join("rec.trace_2.headers")).unwrap(),
            vec![4, 5]
        );
    }

    #[test]
    fn test_write_trace_data_format() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rec.trace_data");
        let matrix = matrix(vec![vec![1.0, -2.5], vec![0.0, 3.0]]);
        write_trace_data(&path, &matrix).unwrap();
        let text = fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0], "1.0000000000000000 -2.5000000000000000");
        assert_eq!(lines[1], "0.0000000000000000 3.0000000000000000");
    }
}
