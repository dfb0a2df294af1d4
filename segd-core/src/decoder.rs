//! Single-pass SEG-D record decoder.
//!
//! Walks the byte stream exactly once, in fixed order: General Header
//! 1-3, scan type headers, extended header, external header, then one
//! block per trace (header, 0-7 extension blocks, sample array). Each
//! reader consumes exactly the bytes it declares; any failure aborts
//! the whole decode.

use std::collections::BTreeMap;
use std::path::Path;

use byteorder::{BigEndian, ByteOrder};

use crate::cursor::ByteCursor;
use crate::error::{Result, SegdError};
use crate::parser;
use crate::types::{
    ExtendedHeader, GeneralHeader, NoiseElimination, RecordTime, SampleMatrix, ScanTypeHeader,
    SegdRecord, Trace, TraceHeader, TraceHeaderExtension,
};

/// Format code for 32-bit IEEE demultiplexed data, the only variant
/// this decoder supports.
const FORMAT_IEEE_32BIT_DEMUX: u64 = 8058;

/// Fixed size of the SERCEL extended header layout.
const EXTENDED_HEADER_MIN_BYTES: usize = 1024;

/// SEG-D record decoder.
///
/// Besides the interpreted record, the decoder captures the raw bytes
/// of every header block it consumes (and, per trace, the trace header
/// plus its extensions) so collaborators can persist them
/// byte-identically.
#[derive(Debug, Default)]
pub struct SegdDecoder {
    header_block: Vec<u8>,
    trace_headers_raw: Vec<Vec<u8>>,
}

impl SegdDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decodes a SEG-D file from disk.
    ///
    /// The file is read whole and closed before decoding starts, so the
    /// handle is released on every exit path.
    pub fn decode_file<P: AsRef<Path>>(&mut self, path: P) -> Result<SegdRecord> {
        let data = std::fs::read(path.as_ref())?;
        self.decode_bytes(&data)
    }

    /// Decodes one complete SEG-D record from a byte slice.
    ///
    /// Bytes past the record's computed end are ignored.
    pub fn decode_bytes(&mut self, data: &[u8]) -> Result<SegdRecord> {
        self.header_block.clear();
        self.trace_headers_raw.clear();

        let mut cursor = ByteCursor::new(data);

        let general = self.read_general_headers(&mut cursor)?;
        let scan_types =
            self.read_scan_type_table(&mut cursor, general.n_channel_sets_per_record)?;
        let extended = self.read_extended_header(
            &mut cursor,
            general.extended_header_length as usize * 32,
        )?;
        // 0xFF in General Header 1 means the external header count
        // overflowed one byte; the true count lives in General Header 2.
        let external_blocks = match general.external_header_length {
            Some(blocks) => blocks as usize,
            None => general.external_header_blocks as usize,
        };
        let external_text = self.read_external_header(&mut cursor, external_blocks * 32)?;

        let sample_rate_hz = if extended.sample_rate_us > 0 {
            1e6 / extended.sample_rate_us as f64
        } else {
            0.0
        };
        let band_code = parser::band_code(sample_rate_hz);

        let samples_per_trace = extended.number_of_samples_in_trace as usize;
        let total_traces = extended.total_number_of_traces as usize;
        let mut traces = Vec::with_capacity(total_traces);
        for _ in 0..total_traces {
            traces.push(self.read_trace(
                &mut cursor,
                samples_per_trace,
                &scan_types,
                band_code,
            )?);
        }

        let matrix = SampleMatrix::from_traces(&traces, samples_per_trace);

        Ok(SegdRecord {
            general,
            scan_types,
            extended,
            external_text,
            traces,
            matrix,
            header_block: std::mem::take(&mut self.header_block),
            trace_headers_raw: std::mem::take(&mut self.trace_headers_raw),
        })
    }

    /// Reads `n` bytes and appends them to the raw header capture.
    fn read_header_bytes<'a>(
        &mut self,
        cursor: &mut ByteCursor<'a>,
        n: usize,
    ) -> Result<&'a [u8]> {
        let buf = cursor.read(n)?;
        self.header_block.extend_from_slice(buf);
        Ok(buf)
    }

    /// Reads `n` bytes and appends them to the current trace's raw
    /// capture.
    fn read_trace_bytes<'a>(
        &mut self,
        cursor: &mut ByteCursor<'a>,
        n: usize,
    ) -> Result<&'a [u8]> {
        let buf = cursor.read(n)?;
        self.trace_headers_raw
            .last_mut()
            .expect("trace capture entry pushed before reads")
            .extend_from_slice(buf);
        Ok(buf)
    }

    /// Reads and merges General Header blocks 1-3 (32 bytes each).
    fn read_general_headers(&mut self, cursor: &mut ByteCursor) -> Result<GeneralHeader> {
        // --- General Header 1 ---
        let buf = self.read_header_bytes(cursor, 32)?;

        let file_number = parser::decode_bcd(&buf[0..2])?;
        let format_code = parser::decode_bcd(&buf[2..4])?;
        if format_code != FORMAT_IEEE_32BIT_DEMUX {
            return Err(SegdError::UnsupportedFormat { code: format_code });
        }
        let mut general_constants = [0u8; 6];
        for (i, slot) in general_constants.iter_mut().enumerate() {
            *slot = parser::decode_bcd(&buf[4 + i..5 + i])? as u8;
        }
        let year = parser::decode_bcd(&buf[10..11])? as u16 + 2000;
        let (n_additional_blocks, jday_high) = parser::bcd_nibbles(buf[11]);
        let julian_day = jday_high as u16 * 100 + parser::decode_bcd(&buf[12..13])? as u16;
        let time = RecordTime {
            year,
            julian_day,
            hour: parser::decode_bcd(&buf[13..14])? as u8,
            minute: parser::decode_bcd(&buf[14..15])? as u8,
            second: parser::decode_bcd(&buf[15..16])? as u8,
        };
        let manufacture_code = parser::decode_bcd(&buf[16..17])?;
        let manufacture_serial_number = parser::decode_bcd(&buf[17..19])?;
        let bytes_per_scan = parser::decode_bcd(&buf[19..22])?;
        let bsi = parser::decode_bcd(&buf[22..23])? as f64;
        let base_scan_interval_ms = if bsi < 10.0 { 1.0 / bsi } else { bsi / 10.0 };
        let (polarity, _) = parser::bcd_nibbles(buf[23]);
        // Bytes 23 (low nibble) and 24 are unused.
        let (_record_type, length_high) = parser::bcd_nibbles(buf[25]);
        let raw_length = 0x100 * length_high as u32 + parser::decode_bin(&buf[26..27])?;
        let record_length_ms = if raw_length == 0xFFF {
            None
        } else {
            Some(raw_length)
        };
        let scan_types_per_record = parser::decode_bcd(&buf[27..28])?;
        let n_channel_sets_per_record = parser::decode_bcd(&buf[28..29])?;
        let n_sample_skew_32bit_extensions = parser::decode_bcd(&buf[29..30])?;
        let extended_header_length = parser::decode_bcd(&buf[30..31])?;
        // The raw 0xFF sentinel must be tested before BCD decoding (both
        // nibbles are out of decimal range).
        let external_header_length = if buf[31] == 0xFF {
            None
        } else {
            Some(parser::decode_bcd(&buf[31..32])?)
        };

        // --- General Header 2 ---
        let buf = self.read_header_bytes(cursor, 32)?;

        let _expanded_file_number = parser::decode_bin(&buf[0..3])?;
        let external_header_blocks = parser::decode_bin(&buf[7..9])?;
        let segd_revision = buf[10] as f64 + buf[11] as f64 / 10.0;
        let general_trailer_blocks = parser::decode_bin(&buf[12..14])?;
        let extended_record_length_ms = parser::decode_bin(&buf[14..17])?;

        // --- General Header 3 ---
        let buf = self.read_header_bytes(cursor, 32)?;

        let expanded_file_number = parser::decode_bin(&buf[0..3])?;
        let source_line_number =
            parser::decode_bin(&buf[3..6])? as f64 + parser::decode_fraction(&buf[6..8])?;
        let source_point_number =
            parser::decode_bin(&buf[8..11])? as f64 + parser::decode_fraction(&buf[11..13])?;
        let phase_control = parser::decode_bin(&buf[14..15])?;
        let vibrator_type = parser::decode_bin(&buf[15..16])?;
        let phase_angle = parser::decode_bin(&buf[16..18])?;
        let general_header_block_number = parser::decode_bin(&buf[18..19])?;
        let source_set_number = parser::decode_bin(&buf[19..20])?;

        Ok(GeneralHeader {
            file_number,
            format_code,
            general_constants,
            n_additional_blocks,
            time,
            manufacture_code,
            manufacture_serial_number,
            bytes_per_scan,
            base_scan_interval_ms,
            polarity,
            record_length_ms,
            scan_types_per_record,
            n_channel_sets_per_record,
            n_sample_skew_32bit_extensions,
            extended_header_length,
            external_header_length,
            expanded_file_number,
            external_header_blocks,
            segd_revision,
            general_trailer_blocks,
            extended_record_length_ms,
            general_header_block_number,
            source_line_number,
            source_point_number,
            phase_control,
            vibrator_type,
            phase_angle,
            source_set_number,
        })
    }

    /// Reads the declared number of 32-byte scan type headers.
    ///
    /// An all-zero block marks an unused channel set slot and is
    /// skipped; duplicate channel set numbers overwrite (last wins).
    fn read_scan_type_table(
        &mut self,
        cursor: &mut ByteCursor,
        count: u64,
    ) -> Result<BTreeMap<u64, ScanTypeHeader>> {
        let mut table = BTreeMap::new();
        for _ in 0..count {
            let buf = self.read_header_bytes(cursor, 32)?;
            if buf.iter().all(|&b| b == 0) {
                continue;
            }
            let sch = Self::parse_scan_type(buf)?;
            table.insert(sch.channel_set_number, sch);
        }
        Ok(table)
    }

    fn parse_scan_type(buf: &[u8]) -> Result<ScanTypeHeader> {
        let scan_type_number = parser::decode_bcd(&buf[0..1])?;
        let channel_set_number = parser::decode_bcd(&buf[1..2])?;
        let starting_time = parser::decode_bin(&buf[2..4])?;
        let end_time = parser::decode_bin(&buf[4..6])?;
        // Bytes 6-7: descale multiplier, consumed but not interpreted.
        let number_of_channels = parser::decode_bcd(&buf[8..10])?;
        let (channel_type_id, _) = parser::bcd_nibbles(buf[10]);
        let (subscans_exponent, gain_control_method) = parser::bcd_nibbles(buf[11]);
        let alias_filter_freq_hz = parser::decode_bcd(&buf[12..14])?;
        let alias_filter_slope_db_per_octave = parser::decode_bcd(&buf[14..16])?;
        let low_cut_filter_freq_hz = parser::decode_bcd(&buf[16..18])?;
        let low_cut_filter_slope_db_per_octave = parser::decode_bcd(&buf[18..20])?;
        let first_notch_freq = parser::decode_bcd(&buf[20..22])?;
        let second_notch_freq = parser::decode_bcd(&buf[22..24])?;
        let third_notch_freq = parser::decode_bcd(&buf[24..26])?;
        let extended_channel_set_number = parser::decode_bcd(&buf[26..28])?;
        let (extended_header_flag, trace_header_extensions) = parser::bcd_nibbles(buf[28]);
        let vertical_stack = parser::decode_bin(&buf[29..30])?;
        let streamer_cable_number = parser::decode_bin(&buf[30..31])?;
        let array_forming = parser::decode_bin(&buf[31..32])?;

        Ok(ScanTypeHeader {
            scan_type_number,
            channel_set_number,
            starting_time,
            end_time,
            number_of_channels,
            channel_type_id,
            subscans_exponent,
            gain_control_method,
            alias_filter_freq_hz,
            alias_filter_slope_db_per_octave,
            low_cut_filter_freq_hz,
            low_cut_filter_slope_db_per_octave,
            first_notch_freq,
            second_notch_freq,
            third_notch_freq,
            extended_channel_set_number,
            extended_header_flag,
            trace_header_extensions,
            vertical_stack,
            streamer_cable_number,
            array_forming,
        })
    }

    fn read_extended_header(
        &mut self,
        cursor: &mut ByteCursor,
        size: usize,
    ) -> Result<ExtendedHeader> {
        if size < EXTENDED_HEADER_MIN_BYTES {
            return Err(SegdError::InvalidLength {
                expected: "at least 1024",
                actual: size,
            });
        }
        let buf = self.read_header_bytes(cursor, size)?;
        Self::parse_extended(buf)
    }

    /// Decodes the SERCEL extended header layout.
    fn parse_extended(buf: &[u8]) -> Result<ExtendedHeader> {
        let noise_type = parser::decode_bin(&buf[96..100])?;
        // Bytes 108-139 overlay different layouts depending on the
        // noise elimination type read above.
        let value1 = parser::decode_bin(&buf[108..112])?;
        let value2 = parser::decode_bin(&buf[112..116])?;
        let noise_elimination = match noise_type {
            2 => NoiseElimination::DiversityStack {
                number_of_windows: value1,
            },
            3 => NoiseElimination::Historic {
                range: parser::decode_bin(&buf[120..124])?,
                taper_length_2_exponent: parser::decode_bin(&buf[124..128])?,
                threshold_init_value: parser::decode_bin(&buf[132..136])?,
                zeroing_length: parser::decode_bin(&buf[136..140])?,
            },
            4 => NoiseElimination::EnhancedDiversityStack {
                window_length: value1,
                overlap: value2,
            },
            other => NoiseElimination::Other(other),
        };

        let mut acquisition_type_tables = [0u32; 32];
        for (n, slot) in acquisition_type_tables.iter_mut().enumerate() {
            *slot = parser::decode_bin(&buf[144 + n * 4..148 + n * 4])?;
        }
        let mut threshold_type_tables = [0u32; 32];
        for (n, slot) in threshold_type_tables.iter_mut().enumerate() {
            *slot = parser::decode_bin(&buf[272 + n * 4..276 + n * 4])?;
        }

        let raw_stack_sign = parser::decode_bin(&buf[772..776])?;
        let stack_sign = if raw_stack_sign == 2 {
            -1
        } else {
            raw_stack_sign as i32
        };

        Ok(ExtendedHeader {
            acquisition_length_ms: parser::decode_bin(&buf[0..4])?,
            sample_rate_us: parser::decode_bin(&buf[4..8])?,
            total_number_of_traces: parser::decode_bin(&buf[8..12])?,
            number_of_auxes: parser::decode_bin(&buf[12..16])?,
            number_of_seis_traces: parser::decode_bin(&buf[16..20])?,
            number_of_dead_seis_traces: parser::decode_bin(&buf[20..24])?,
            number_of_live_seis_traces: parser::decode_bin(&buf[24..28])?,
            number_of_samples_in_trace: parser::decode_bin(&buf[32..36])?,
            shot_number: parser::decode_bin(&buf[36..40])?,
            tb_window_s: parser::decode_f32(&buf[40..44])?,
            spread_first_line: parser::decode_bin(&buf[48..52])?,
            spread_first_number: parser::decode_bin(&buf[52..56])?,
            spread_number: parser::decode_bin(&buf[56..60])?,
            time_break_us: parser::decode_bin(&buf[64..68])?,
            uphole_time_us: parser::decode_bin(&buf[68..72])?,
            blaster_id: parser::decode_bin(&buf[72..76])?,
            blaster_status: parser::decode_bin(&buf[76..80])?,
            refraction_delay_ms: parser::decode_bin(&buf[80..84])?,
            tb_to_t0_time_us: parser::decode_bin(&buf[84..88])?,
            internal_time_break: parser::decode_bin_bool(&buf[88..92])?,
            prestack_within_field_units: parser::decode_bin_bool(&buf[92..96])?,
            noise_elimination,
            low_trace_percentage: parser::decode_bin(&buf[100..104])?,
            low_trace_value_db: parser::decode_bin(&buf[104..108])?,
            noisy_trace_percentage: parser::decode_bin(&buf[116..120])?,
            acquisition_type_tables,
            threshold_type_tables,
            stacking_fold: parser::decode_bin(&buf[400..404])?,
            record_length_ms: parser::decode_bin(&buf[484..488])?,
            autocorrelation_peak_time_ms: parser::decode_bin(&buf[488..492])?,
            correlation_pilot_number: parser::decode_bin(&buf[496..500])?,
            pilot_length_ms: parser::decode_bin(&buf[500..504])?,
            sweep_length_ms: parser::decode_bin(&buf[504..508])?,
            acquisition_number: parser::decode_bin(&buf[508..512])?,
            max_of_max_aux: parser::decode_f32(&buf[512..516])?,
            max_of_max_seis: parser::decode_f32(&buf[516..520])?,
            dump_stacking_fold: parser::decode_bin(&buf[520..524])?,
            tape_label: parser::decode_ascii(&buf[524..540]),
            tape_number: parser::decode_bin(&buf[540..544])?,
            software_version: parser::decode_ascii(&buf[544..560]),
            date: parser::decode_ascii(&buf[560..572]),
            source_easting: parser::decode_f64(&buf[572..580])?,
            source_northing: parser::decode_f64(&buf[580..588])?,
            source_elevation: parser::decode_f32(&buf[588..592])?,
            slip_sweep_mode_used: parser::decode_bin_bool(&buf[592..596])?,
            files_per_tape: parser::decode_bin(&buf[596..600])?,
            file_count: parser::decode_bin(&buf[600..604])?,
            acquisition_error_description: parser::decode_ascii(&buf[604..764]),
            stack_is_dumped: parser::decode_bin_bool(&buf[768..772])?,
            stack_sign,
            prm_tilt_correction_used: parser::decode_bin_bool(&buf[776..780])?,
            swath_name: parser::decode_ascii(&buf[780..844]),
            operating_mode: parser::decode_bin(&buf[844..848])?,
            no_log: parser::decode_bin_bool(&buf[852..856])?,
            listening_time_ms: parser::decode_bin(&buf[856..860])?,
            swath_id: parser::decode_bin(&buf[868..872])?,
            offset_removal_disabled: parser::decode_bin_bool(&buf[872..876])?,
        })
    }

    /// Reads the free-text external header as filtered ASCII.
    fn read_external_header(
        &mut self,
        cursor: &mut ByteCursor,
        size: usize,
    ) -> Result<Option<String>> {
        let buf = self.read_header_bytes(cursor, size)?;
        Ok(parser::decode_ascii(buf))
    }

    /// Reads one trace block: header, extension blocks, sample array.
    fn read_trace(
        &mut self,
        cursor: &mut ByteCursor,
        samples_per_trace: usize,
        scan_types: &BTreeMap<u64, ScanTypeHeader>,
        band_code: Option<char>,
    ) -> Result<Trace> {
        self.trace_headers_raw.push(Vec::new());

        let buf = self.read_trace_bytes(cursor, 20)?;
        let header = Self::parse_trace_header(buf)?;

        let mut extensions = Vec::with_capacity(header.trace_header_extensions as usize);
        for block in 1..=header.trace_header_extensions as u8 {
            let buf = self.read_trace_bytes(cursor, 32)?;
            extensions.push(Self::parse_extension(block, buf)?);
        }

        let scan_type = scan_types
            .get(&header.channel_set_number)
            .cloned()
            .ok_or(SegdError::MissingChannelSetMapping {
                channel_set: header.channel_set_number,
            })?;

        let raw = cursor.read(samples_per_trace * 4)?;
        let mut samples = vec![0f32; samples_per_trace];
        BigEndian::read_f32_into(raw, &mut samples);

        Ok(Trace {
            header,
            extensions,
            scan_type,
            band_code,
            samples,
        })
    }

    fn parse_trace_header(buf: &[u8]) -> Result<TraceHeader> {
        // Raw FF FF is the "no file number" sentinel; it must be tested
        // before BCD decoding.
        let file_number = if buf[0..2] == [0xFF, 0xFF] {
            None
        } else {
            Some(parser::decode_bcd(&buf[0..2])?)
        };
        let scan_type_number = parser::decode_bcd(&buf[2..3])?;
        let channel_set_number = parser::decode_bcd(&buf[3..4])?;
        let trace_number = parser::decode_bcd(&buf[4..6])?;
        let first_timing_word_ms = parser::decode_bin(&buf[6..9])? as f64 / 256.0;
        let trace_header_extensions = parser::decode_bin(&buf[9..10])?;
        if trace_header_extensions > 7 {
            return Err(SegdError::InvalidExtensionCount {
                count: trace_header_extensions,
            });
        }
        let sample_skew = parser::decode_bin(&buf[10..11])?;
        let trace_edit = parser::decode_bin(&buf[11..12])?;
        let time_break_window = parser::decode_bin(&buf[12..14])? as f64
            + parser::decode_bin(&buf[14..15])? as f64 / 100.0;
        let extended_channel_set_number = parser::decode_bin(&buf[15..16])?;
        let extended_file_number = parser::decode_bin(&buf[17..20])?;

        Ok(TraceHeader {
            file_number,
            scan_type_number,
            channel_set_number,
            trace_number,
            first_timing_word_ms,
            trace_header_extensions,
            sample_skew,
            trace_edit,
            time_break_window,
            extended_channel_set_number,
            extended_file_number,
        })
    }

    /// Decodes trace header extension block `block` (1-7).
    fn parse_extension(block: u8, buf: &[u8]) -> Result<TraceHeaderExtension> {
        let ext = match block {
            1 => {
                let raw_line = parser::decode_bin(&buf[0..3])?;
                let raw_point = parser::decode_bin(&buf[3..6])?;
                TraceHeaderExtension::ReceiverGeometry {
                    receiver_line_number: (raw_line != 0xFFFFFF).then_some(raw_line),
                    receiver_point_number: (raw_point != 0xFFFFFF).then_some(raw_point),
                    receiver_point_index: parser::decode_bin(&buf[6..7])?,
                    samples_per_trace: parser::decode_bin(&buf[7..10])?,
                }
            }
            2 => TraceHeaderExtension::ReceiverPosition {
                easting: parser::decode_f64(&buf[0..8])?,
                northing: parser::decode_f64(&buf[8..16])?,
                elevation: parser::decode_f32(&buf[16..20])?,
                sensor_type_number: parser::decode_bin(&buf[20..21])?,
                dsd_identification_number: parser::decode_bin(&buf[24..28])?,
                extended_trace_number: parser::decode_bin(&buf[28..32])?,
            },
            3 => TraceHeaderExtension::ResistanceTilt {
                resistance_low_limit: parser::decode_f32(&buf[0..4])?,
                resistance_high_limit: parser::decode_f32(&buf[4..8])?,
                resistance_ohms: parser::decode_f32(&buf[8..12])?,
                tilt_limit: parser::decode_f32(&buf[12..16])?,
                tilt_value: parser::decode_f32(&buf[16..20])?,
                resistance_error: parser::decode_bin_bool(&buf[20..21])?,
                tilt_error: parser::decode_bin_bool(&buf[21..22])?,
            },
            4 => TraceHeaderExtension::CapacitanceCutoff {
                capacitance_low_limit: parser::decode_f32(&buf[0..4])?,
                capacitance_high_limit: parser::decode_f32(&buf[4..8])?,
                capacitance_nf: parser::decode_f32(&buf[8..12])?,
                cutoff_low_limit: parser::decode_f32(&buf[12..16])?,
                cutoff_high_limit: parser::decode_f32(&buf[16..20])?,
                cutoff_hz: parser::decode_f32(&buf[20..24])?,
                capacitance_error: parser::decode_bin_bool(&buf[24..25])?,
                cutoff_error: parser::decode_bin_bool(&buf[25..26])?,
            },
            5 => TraceHeaderExtension::LeakagePosition {
                leakage_limit: parser::decode_f32(&buf[0..4])?,
                leakage_megaohms: parser::decode_f32(&buf[4..8])?,
                longitude: parser::decode_f64(&buf[8..16])?,
                latitude: parser::decode_f64(&buf[16..24])?,
                leakage_error: parser::decode_bin_bool(&buf[24..25])?,
                horizontal_accuracy_mm: parser::decode_bin(&buf[25..28])?,
                elevation_mm: parser::decode_f32(&buf[28..32])?,
            },
            6 => TraceHeaderExtension::SensorUnit {
                unit_type: parser::decode_bin(&buf[0..1])?,
                unit_serial_number: parser::decode_bin(&buf[1..4])?,
                channel_number: parser::decode_bin(&buf[4..5])?,
                assembly_type: parser::decode_bin(&buf[8..9])?,
                assembly_serial_number: parser::decode_bin(&buf[9..12])?,
                location_in_assembly: parser::decode_bin(&buf[12..13])?,
                subunit_type: parser::decode_bin(&buf[16..17])?,
                channel_type: parser::decode_bin(&buf[17..18])?,
                sensor_sensitivity: parser::decode_f32(&buf[20..24])?,
            },
            7 => TraceHeaderExtension::ControlUnit {
                control_unit_type: parser::decode_bin(&buf[0..1])?,
                trace_max_value: parser::decode_f32(&buf[16..20])?,
                trace_max_time_us: parser::decode_bin(&buf[20..24])?,
                interpolations: parser::decode_bin(&buf[24..28])?,
                offset_value: parser::decode_bin(&buf[28..32])?,
            },
            other => {
                return Err(SegdError::InvalidExtensionCount {
                    count: other as u32,
                })
            }
        };
        Ok(ext)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_trace_header_sentinel_file_number() {
        let mut buf = [0u8; 20];
        buf[0] = 0xFF;
        buf[1] = 0xFF;
        let header = SegdDecoder::parse_trace_header(&buf).unwrap();
        assert_eq!(header.file_number, None);

        let mut buf = [0u8; 20];
        buf[0] = 0x09;
        buf[1] = 0x86;
        let header = SegdDecoder::parse_trace_header(&buf).unwrap();
        assert_eq!(header.file_number, Some(986));
    }

    #[test]
    fn test_parse_trace_header_fixed_point_fields() {
        let mut buf = [0u8; 20];
        // first timing word: 512 / 256 = 2.0 ms
        buf[7] = 0x02;
        buf[8] = 0x00;
        // time break window: 3 + 25/100
        buf[13] = 0x03;
        buf[14] = 25;
        let header = SegdDecoder::parse_trace_header(&buf).unwrap();
        assert_eq!(header.first_timing_word_ms, 2.0);
        assert_eq!(header.time_break_window, 3.25);
    }

    #[test]
    fn test_parse_trace_header_extension_count_out_of_range() {
        let mut buf = [0u8; 20];
        buf[9] = 8;
        assert!(matches!(
            SegdDecoder::parse_trace_header(&buf),
            Err(SegdError::InvalidExtensionCount { count: 8 })
        ));
    }

    #[test]
    fn test_parse_extension_receiver_sentinels() {
        let mut buf = [0u8; 32];
        buf[0..3].copy_from_slice(&[0xFF, 0xFF, 0xFF]);
        buf[3..6].copy_from_slice(&[0x00, 0x01, 0x02]);
        let ext = SegdDecoder::parse_extension(1, &buf).unwrap();
        match ext {
            TraceHeaderExtension::ReceiverGeometry {
                receiver_line_number,
                receiver_point_number,
                ..
            } => {
                assert_eq!(receiver_line_number, None);
                assert_eq!(receiver_point_number, Some(0x0102));
            }
            other => panic!("wrong variant: {other:?}"),
        }
    }

    #[test]
    fn test_parse_extended_overlay_variants() {
        let mut buf = vec![0u8; 1024];
        buf[96..100].copy_from_slice(&2u32.to_be_bytes());
        buf[108..112].copy_from_slice(&16u32.to_be_bytes());
        let extdh = SegdDecoder::parse_extended(&buf).unwrap();
        assert_eq!(
            extdh.noise_elimination,
            NoiseElimination::DiversityStack {
                number_of_windows: 16
            }
        );

        buf[96..100].copy_from_slice(&3u32.to_be_bytes());
        buf[120..124].copy_from_slice(&6u32.to_be_bytes());
        buf[124..128].copy_from_slice(&4u32.to_be_bytes());
        buf[132..136].copy_from_slice(&9u32.to_be_bytes());
        buf[136..140].copy_from_slice(&2u32.to_be_bytes());
        let extdh = SegdDecoder::parse_extended(&buf).unwrap();
        assert_eq!(
            extdh.noise_elimination,
            NoiseElimination::Historic {
                range: 6,
                taper_length_2_exponent: 4,
                threshold_init_value: 9,
                zeroing_length: 2
            }
        );

        buf[96..100].copy_from_slice(&4u32.to_be_bytes());
        buf[112..116].copy_from_slice(&8u32.to_be_bytes());
        let extdh = SegdDecoder::parse_extended(&buf).unwrap();
        assert_eq!(
            extdh.noise_elimination,
            NoiseElimination::EnhancedDiversityStack {
                window_length: 16,
                overlap: 8
            }
        );

        buf[96..100].copy_from_slice(&1u32.to_be_bytes());
        let extdh = SegdDecoder::parse_extended(&buf).unwrap();
        assert_eq!(extdh.noise_elimination, NoiseElimination::Other(1));
    }

    #[test]
    fn test_parse_extended_stack_sign() {
        let mut buf = vec![0u8; 1024];
        buf[772..776].copy_from_slice(&2u32.to_be_bytes());
        assert_eq!(SegdDecoder::parse_extended(&buf).unwrap().stack_sign, -1);
        buf[772..776].copy_from_slice(&1u32.to_be_bytes());
        assert_eq!(SegdDecoder::parse_extended(&buf).unwrap().stack_sign, 1);
    }

    #[test]
    fn test_extended_header_too_short() {
        let mut decoder = SegdDecoder::new();
        let data = vec![0u8; 512];
        let mut cursor = ByteCursor::new(&data);
        assert!(matches!(
            decoder.read_extended_header(&mut cursor, 512),
            Err(SegdError::InvalidLength { .. })
        ));
    }

    #[test]
    fn test_scan_type_table_skips_empty_blocks() {
        let mut decoder = SegdDecoder::new();
        let mut data = Vec::new();
        // One real scan type header for channel set 1
        let mut sch = [0u8; 32];
        sch[0] = 0x01; // scan type 1
        sch[1] = 0x01; // channel set 1
        sch[8..10].copy_from_slice(&[0x00, 0x24]); // 24 channels, BCD
        data.extend_from_slice(&sch);
        // Two empty slots
        data.extend_from_slice(&[0u8; 64]);

        let mut cursor = ByteCursor::new(&data);
        let table = decoder.read_scan_type_table(&mut cursor, 3).unwrap();
        assert_eq!(table.len(), 1);
        assert_eq!(table[&1].number_of_channels, 24);
        // All three blocks were consumed and captured
        assert_eq!(cursor.position(), 96);
        assert_eq!(decoder.header_block.len(), 96);
    }
}
