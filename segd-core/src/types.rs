//! Data model for decoded SEG-D records.
//!
//! Every struct here is built once during the single decode pass and is
//! immutable afterwards. Header structs expose a `fields()` method that
//! renders (name, value) pairs in declaration order, which is the order
//! the fields occur in the byte stream; display consumers rely on it.

use std::collections::BTreeMap;
use std::fmt;

/// Record start time decoded from the BCD year, julian day, and
/// time-of-day fields of General Header 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecordTime {
    /// Full year (two-digit BCD field + 2000)
    pub year: u16,
    /// Day of year, 1-366
    pub julian_day: u16,
    pub hour: u8,
    pub minute: u8,
    pub second: u8,
}

impl fmt::Display for RecordTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:04}-{:03}T{:02}:{:02}:{:02}",
            self.year, self.julian_day, self.hour, self.minute, self.second
        )
    }
}

/// Merged General Header blocks 1-3.
///
/// Fields whose raw value is a reserved sentinel (`0xFFF` record
/// length, `0xFF` external header length) are normalized to `None` at
/// decode time; the sentinel never leaks into the model.
#[derive(Debug, Clone, PartialEq)]
pub struct GeneralHeader {
    pub file_number: u64,
    /// Always 8058 once decoding succeeds (32-bit IEEE demultiplexed)
    pub format_code: u64,
    pub general_constants: [u8; 6],
    pub n_additional_blocks: u8,
    pub time: RecordTime,
    pub manufacture_code: u64,
    pub manufacture_serial_number: u64,
    pub bytes_per_scan: u64,
    pub base_scan_interval_ms: f64,
    pub polarity: u8,
    /// `None` means "unspecified, see extended header" (0xFFF sentinel)
    pub record_length_ms: Option<u32>,
    pub scan_types_per_record: u64,
    pub n_channel_sets_per_record: u64,
    pub n_sample_skew_32bit_extensions: u64,
    /// Extended header length in 32-byte blocks
    pub extended_header_length: u64,
    /// External header length in 32-byte blocks; `None` means the true
    /// count overflowed one byte and lives in `external_header_blocks`
    pub external_header_length: Option<u64>,
    pub expanded_file_number: u32,
    pub external_header_blocks: u32,
    pub segd_revision: f64,
    pub general_trailer_blocks: u32,
    pub extended_record_length_ms: u32,
    pub general_header_block_number: u32,
    pub source_line_number: f64,
    pub source_point_number: f64,
    pub phase_control: u32,
    pub vibrator_type: u32,
    pub phase_angle: u32,
    pub source_set_number: u32,
}

impl GeneralHeader {
    /// Field names and rendered values in stream declaration order.
    pub fn fields(&self) -> Vec<(&'static str, String)> {
        vec![
            ("file_number", self.file_number.to_string()),
            ("format_code", self.format_code.to_string()),
            ("general_constants", format!("{:?}", self.general_constants)),
            ("n_additional_blocks", self.n_additional_blocks.to_string()),
            ("time", self.time.to_string()),
            ("manufacture_code", self.manufacture_code.to_string()),
            (
                "manufacture_serial_number",
                self.manufacture_serial_number.to_string(),
            ),
            ("bytes_per_scan", self.bytes_per_scan.to_string()),
            (
                "base_scan_interval_in_ms",
                self.base_scan_interval_ms.to_string(),
            ),
            ("polarity", self.polarity.to_string()),
            ("record_length_in_ms", opt_string(&self.record_length_ms)),
            (
                "scan_types_per_record",
                self.scan_types_per_record.to_string(),
            ),
            (
                "n_channel_sets_per_record",
                self.n_channel_sets_per_record.to_string(),
            ),
            (
                "n_sample_skew_32bit_extensions",
                self.n_sample_skew_32bit_extensions.to_string(),
            ),
            (
                "extended_header_length",
                self.extended_header_length.to_string(),
            ),
            (
                "external_header_length",
                opt_string(&self.external_header_length),
            ),
            ("expanded_file_number", self.expanded_file_number.to_string()),
            (
                "external_header_blocks",
                self.external_header_blocks.to_string(),
            ),
            ("segd_revision_number", self.segd_revision.to_string()),
            (
                "general_trailer_blocks",
                self.general_trailer_blocks.to_string(),
            ),
            (
                "extended_record_length_in_ms",
                self.extended_record_length_ms.to_string(),
            ),
            (
                "general_header_block_number",
                self.general_header_block_number.to_string(),
            ),
            ("source_line_number", self.source_line_number.to_string()),
            ("source_point_number", self.source_point_number.to_string()),
            ("phase_control", self.phase_control.to_string()),
            ("vibrator_type", self.vibrator_type.to_string()),
            ("phase_angle", self.phase_angle.to_string()),
            ("source_set_number", self.source_set_number.to_string()),
        ]
    }
}

/// One 32-byte scan type header, describing the acquisition parameters
/// of a single channel set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanTypeHeader {
    pub scan_type_number: u64,
    pub channel_set_number: u64,
    pub starting_time: u32,
    pub end_time: u32,
    pub number_of_channels: u64,
    pub channel_type_id: u8,
    pub subscans_exponent: u8,
    pub gain_control_method: u8,
    pub alias_filter_freq_hz: u64,
    pub alias_filter_slope_db_per_octave: u64,
    pub low_cut_filter_freq_hz: u64,
    pub low_cut_filter_slope_db_per_octave: u64,
    pub first_notch_freq: u64,
    pub second_notch_freq: u64,
    pub third_notch_freq: u64,
    pub extended_channel_set_number: u64,
    pub extended_header_flag: u8,
    pub trace_header_extensions: u8,
    pub vertical_stack: u32,
    pub streamer_cable_number: u32,
    pub array_forming: u32,
}

impl ScanTypeHeader {
    pub fn fields(&self) -> Vec<(&'static str, String)> {
        vec![
            ("scan_type_number", self.scan_type_number.to_string()),
            ("channel_set_number", self.channel_set_number.to_string()),
            ("channel_set_starting_time", self.starting_time.to_string()),
            ("channel_set_end_time", self.end_time.to_string()),
            ("number_of_channels", self.number_of_channels.to_string()),
            ("channel_type_id", self.channel_type_id.to_string()),
            (
                "number_of_subscans_exponent",
                self.subscans_exponent.to_string(),
            ),
            (
                "channel_gain_control_method",
                self.gain_control_method.to_string(),
            ),
            (
                "alias_filter_freq_in_hz",
                self.alias_filter_freq_hz.to_string(),
            ),
            (
                "alias_filter_slope_in_db_per_octave",
                self.alias_filter_slope_db_per_octave.to_string(),
            ),
            (
                "low_cut_filter_freq_in_hz",
                self.low_cut_filter_freq_hz.to_string(),
            ),
            (
                "low_cut_filter_slope_in_db_per_octave",
                self.low_cut_filter_slope_db_per_octave.to_string(),
            ),
            ("first_notch_freq", self.first_notch_freq.to_string()),
            ("second_notch_freq", self.second_notch_freq.to_string()),
            ("third_notch_freq", self.third_notch_freq.to_string()),
            (
                "extended_channel_set_number",
                self.extended_channel_set_number.to_string(),
            ),
            ("extended_header_flag", self.extended_header_flag.to_string()),
            (
                "trace_header_extensions",
                self.trace_header_extensions.to_string(),
            ),
            ("vertical_stack", self.vertical_stack.to_string()),
            ("streamer_cable_number", self.streamer_cable_number.to_string()),
            ("array_forming", self.array_forming.to_string()),
        ]
    }
}

/// Noise elimination parameters from the extended header.
///
/// Bytes [108:140] of the extended header overlay three different
/// layouts depending on the noise elimination type at [96:100]; the
/// discriminant is decoded first and selects the variant. Any other
/// discriminant value leaves the region uninterpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoiseElimination {
    DiversityStack {
        number_of_windows: u32,
    },
    Historic {
        range: u32,
        taper_length_2_exponent: u32,
        threshold_init_value: u32,
        zeroing_length: u32,
    },
    EnhancedDiversityStack {
        window_length: u32,
        overlap: u32,
    },
    /// Unrecognized type; the overlay region is left uninterpreted.
    Other(u32),
}

impl fmt::Display for NoiseElimination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DiversityStack { number_of_windows } => {
                write!(f, "diversity stack ({number_of_windows} windows)")
            }
            Self::Historic {
                range,
                taper_length_2_exponent,
                threshold_init_value,
                zeroing_length,
            } => write!(
                f,
                "historic (range {range}, taper 2^{taper_length_2_exponent}, \
                 threshold init {threshold_init_value}, zeroing {zeroing_length})"
            ),
            Self::EnhancedDiversityStack {
                window_length,
                overlap,
            } => write!(
                f,
                "enhanced diversity stack (window {window_length}, overlap {overlap})"
            ),
            Self::Other(raw) => write!(f, "type {raw}"),
        }
    }
}

/// SERCEL-format extended header (1024 bytes).
#[derive(Debug, Clone, PartialEq)]
pub struct ExtendedHeader {
    pub acquisition_length_ms: u32,
    pub sample_rate_us: u32,
    pub total_number_of_traces: u32,
    pub number_of_auxes: u32,
    pub number_of_seis_traces: u32,
    pub number_of_dead_seis_traces: u32,
    pub number_of_live_seis_traces: u32,
    pub number_of_samples_in_trace: u32,
    pub shot_number: u32,
    pub tb_window_s: Option<f32>,
    pub spread_first_line: u32,
    pub spread_first_number: u32,
    pub spread_number: u32,
    pub time_break_us: u32,
    pub uphole_time_us: u32,
    pub blaster_id: u32,
    pub blaster_status: u32,
    pub refraction_delay_ms: u32,
    pub tb_to_t0_time_us: u32,
    pub internal_time_break: bool,
    pub prestack_within_field_units: bool,
    pub noise_elimination: NoiseElimination,
    pub low_trace_percentage: u32,
    pub low_trace_value_db: u32,
    pub noisy_trace_percentage: u32,
    pub acquisition_type_tables: [u32; 32],
    pub threshold_type_tables: [u32; 32],
    pub stacking_fold: u32,
    pub record_length_ms: u32,
    pub autocorrelation_peak_time_ms: u32,
    pub correlation_pilot_number: u32,
    pub pilot_length_ms: u32,
    pub sweep_length_ms: u32,
    pub acquisition_number: u32,
    pub max_of_max_aux: Option<f32>,
    pub max_of_max_seis: Option<f32>,
    pub dump_stacking_fold: u32,
    pub tape_label: Option<String>,
    pub tape_number: u32,
    pub software_version: Option<String>,
    pub date: Option<String>,
    pub source_easting: f64,
    pub source_northing: f64,
    pub source_elevation: Option<f32>,
    pub slip_sweep_mode_used: bool,
    pub files_per_tape: u32,
    pub file_count: u32,
    pub acquisition_error_description: Option<String>,
    pub stack_is_dumped: bool,
    /// Raw value 2 encodes a negative stack sign
    pub stack_sign: i32,
    pub prm_tilt_correction_used: bool,
    pub swath_name: Option<String>,
    /// Raw operating mode word; the per-bit mode decomposition is not
    /// interpreted (the SERCEL bit-to-flag mapping is not implemented).
    pub operating_mode: u32,
    pub no_log: bool,
    pub listening_time_ms: u32,
    pub swath_id: u32,
    pub offset_removal_disabled: bool,
}

impl ExtendedHeader {
    pub fn fields(&self) -> Vec<(&'static str, String)> {
        vec![
            (
                "acquisition_length_in_ms",
                self.acquisition_length_ms.to_string(),
            ),
            ("sample_rate_in_us", self.sample_rate_us.to_string()),
            (
                "total_number_of_traces",
                self.total_number_of_traces.to_string(),
            ),
            ("number_of_auxes", self.number_of_auxes.to_string()),
            (
                "number_of_seis_traces",
                self.number_of_seis_traces.to_string(),
            ),
            (
                "number_of_dead_seis_traces",
                self.number_of_dead_seis_traces.to_string(),
            ),
            (
                "number_of_live_seis_traces",
                self.number_of_live_seis_traces.to_string(),
            ),
            (
                "number_of_samples_in_trace",
                self.number_of_samples_in_trace.to_string(),
            ),
            ("shot_number", self.shot_number.to_string()),
            ("tb_window_in_s", opt_string(&self.tb_window_s)),
            ("spread_first_line", self.spread_first_line.to_string()),
            ("spread_first_number", self.spread_first_number.to_string()),
            ("spread_number", self.spread_number.to_string()),
            ("time_break_in_us", self.time_break_us.to_string()),
            ("uphole_time_in_us", self.uphole_time_us.to_string()),
            ("blaster_id", self.blaster_id.to_string()),
            ("blaster_status", self.blaster_status.to_string()),
            ("refraction_delay_in_ms", self.refraction_delay_ms.to_string()),
            ("tb_to_t0_time_in_us", self.tb_to_t0_time_us.to_string()),
            ("internal_time_break", self.internal_time_break.to_string()),
            (
                "prestack_within_field_units",
                self.prestack_within_field_units.to_string(),
            ),
            ("noise_elimination", self.noise_elimination.to_string()),
            ("low_trace_percentage", self.low_trace_percentage.to_string()),
            ("low_trace_value_in_db", self.low_trace_value_db.to_string()),
            (
                "noisy_trace_percentage",
                self.noisy_trace_percentage.to_string(),
            ),
            (
                "acquisition_type_tables",
                format!("{:?}", self.acquisition_type_tables),
            ),
            (
                "threshold_type_tables",
                format!("{:?}", self.threshold_type_tables),
            ),
            ("stacking_fold", self.stacking_fold.to_string()),
            ("record_length_in_ms", self.record_length_ms.to_string()),
            (
                "autocorrelation_peak_time_in_ms",
                self.autocorrelation_peak_time_ms.to_string(),
            ),
            (
                "correlation_pilot_number",
                self.correlation_pilot_number.to_string(),
            ),
            ("pilot_length_in_ms", self.pilot_length_ms.to_string()),
            ("sweep_length_in_ms", self.sweep_length_ms.to_string()),
            ("acquisition_number", self.acquisition_number.to_string()),
            ("max_of_max_aux", opt_string(&self.max_of_max_aux)),
            ("max_of_max_seis", opt_string(&self.max_of_max_seis)),
            ("dump_stacking_fold", self.dump_stacking_fold.to_string()),
            ("tape_label", opt_string(&self.tape_label)),
            ("tape_number", self.tape_number.to_string()),
            ("software_version", opt_string(&self.software_version)),
            ("date", opt_string(&self.date)),
            ("source_easting", self.source_easting.to_string()),
            ("source_northing", self.source_northing.to_string()),
            ("source_elevation", opt_string(&self.source_elevation)),
            ("slip_sweep_mode_used", self.slip_sweep_mode_used.to_string()),
            ("files_per_tape", self.files_per_tape.to_string()),
            ("file_count", self.file_count.to_string()),
            (
                "acquisition_error_description",
                opt_string(&self.acquisition_error_description),
            ),
            ("stack_is_dumped", self.stack_is_dumped.to_string()),
            ("stack_sign", self.stack_sign.to_string()),
            (
                "prm_tilt_correction_used",
                self.prm_tilt_correction_used.to_string(),
            ),
            ("swath_name", opt_string(&self.swath_name)),
            ("operating_mode", self.operating_mode.to_string()),
            ("no_log", self.no_log.to_string()),
            ("listening_time_in_ms", self.listening_time_ms.to_string()),
            ("swath_id", self.swath_id.to_string()),
            (
                "seismic_trace_offset_removal_is_disabled",
                self.offset_removal_disabled.to_string(),
            ),
        ]
    }
}

/// Fixed 20-byte demultiplexed trace header.
#[derive(Debug, Clone, PartialEq)]
pub struct TraceHeader {
    /// `None` when the raw field carries the 0xFFFF sentinel
    pub file_number: Option<u64>,
    pub scan_type_number: u64,
    pub channel_set_number: u64,
    pub trace_number: u64,
    /// Fixed-point field, raw value divided by 256
    pub first_timing_word_ms: f64,
    /// Number of extension blocks following this header (0-7)
    pub trace_header_extensions: u32,
    pub sample_skew: u32,
    pub trace_edit: u32,
    /// Two-part fixed-point sum (integer part + hundredths)
    pub time_break_window: f64,
    pub extended_channel_set_number: u32,
    pub extended_file_number: u32,
}

impl TraceHeader {
    pub fn fields(&self) -> Vec<(&'static str, String)> {
        vec![
            ("file_number", opt_string(&self.file_number)),
            ("scan_type_number", self.scan_type_number.to_string()),
            ("channel_set_number", self.channel_set_number.to_string()),
            ("trace_number", self.trace_number.to_string()),
            (
                "first_timing_word_in_ms",
                self.first_timing_word_ms.to_string(),
            ),
            (
                "trace_header_extensions",
                self.trace_header_extensions.to_string(),
            ),
            ("sample_skew", self.sample_skew.to_string()),
            ("trace_edit", self.trace_edit.to_string()),
            ("time_break_window", self.time_break_window.to_string()),
            (
                "extended_channel_set_number",
                self.extended_channel_set_number.to_string(),
            ),
            ("extended_file_number", self.extended_file_number.to_string()),
        ]
    }
}

/// One of the seven fixed 32-byte trace header extension blocks.
///
/// Which subset follows a trace header is chosen per trace by the
/// header's extension count; blocks always occur in order 1 through 7.
#[derive(Debug, Clone, PartialEq)]
pub enum TraceHeaderExtension {
    /// Block #1, SEG-D standard: receiver geometry.
    ReceiverGeometry {
        /// `None` when the raw field carries the 0xFFFFFF sentinel
        receiver_line_number: Option<u32>,
        /// `None` when the raw field carries the 0xFFFFFF sentinel
        receiver_point_number: Option<u32>,
        receiver_point_index: u32,
        samples_per_trace: u32,
    },
    /// Block #2, SERCEL: geodetic receiver position and identity.
    ReceiverPosition {
        easting: f64,
        northing: f64,
        elevation: Option<f32>,
        sensor_type_number: u32,
        dsd_identification_number: u32,
        extended_trace_number: u32,
    },
    /// Block #3, SERCEL: resistance and tilt diagnostics.
    ResistanceTilt {
        resistance_low_limit: Option<f32>,
        resistance_high_limit: Option<f32>,
        resistance_ohms: Option<f32>,
        tilt_limit: Option<f32>,
        tilt_value: Option<f32>,
        resistance_error: bool,
        tilt_error: bool,
    },
    /// Block #4, SERCEL: capacitance and cutoff diagnostics.
    CapacitanceCutoff {
        capacitance_low_limit: Option<f32>,
        capacitance_high_limit: Option<f32>,
        capacitance_nf: Option<f32>,
        cutoff_low_limit: Option<f32>,
        cutoff_high_limit: Option<f32>,
        cutoff_hz: Option<f32>,
        capacitance_error: bool,
        cutoff_error: bool,
    },
    /// Block #5, SERCEL: leakage diagnostics and instrument position.
    LeakagePosition {
        leakage_limit: Option<f32>,
        leakage_megaohms: Option<f32>,
        longitude: f64,
        latitude: f64,
        leakage_error: bool,
        horizontal_accuracy_mm: u32,
        elevation_mm: Option<f32>,
    },
    /// Block #6, SERCEL: sensor and field unit identity.
    SensorUnit {
        unit_type: u32,
        unit_serial_number: u32,
        channel_number: u32,
        assembly_type: u32,
        assembly_serial_number: u32,
        location_in_assembly: u32,
        subunit_type: u32,
        channel_type: u32,
        sensor_sensitivity: Option<f32>,
    },
    /// Block #7, SERCEL: control unit diagnostics.
    ControlUnit {
        control_unit_type: u32,
        trace_max_value: Option<f32>,
        trace_max_time_us: u32,
        interpolations: u32,
        offset_value: u32,
    },
}

impl TraceHeaderExtension {
    /// The 1-based block number this variant decodes.
    pub fn block_number(&self) -> u8 {
        match self {
            Self::ReceiverGeometry { .. } => 1,
            Self::ReceiverPosition { .. } => 2,
            Self::ResistanceTilt { .. } => 3,
            Self::CapacitanceCutoff { .. } => 4,
            Self::LeakagePosition { .. } => 5,
            Self::SensorUnit { .. } => 6,
            Self::ControlUnit { .. } => 7,
        }
    }
}

/// A single decoded trace: its header, extension blocks, the scan type
/// header matched by channel set number, and the demultiplexed sample
/// array.
#[derive(Debug, Clone)]
pub struct Trace {
    pub header: TraceHeader,
    pub extensions: Vec<TraceHeaderExtension>,
    /// Scan type entry for this trace's channel set, cloned at assembly
    pub scan_type: ScanTypeHeader,
    /// Band code derived from the record sample rate
    pub band_code: Option<char>,
    pub samples: Vec<f32>,
}

/// Rectangular traces-by-samples matrix assembled after all trace
/// blocks are read. Row order is trace-encounter order.
#[derive(Debug, Clone)]
pub struct SampleMatrix {
    data: Vec<f32>,
    rows: usize,
    cols: usize,
    integral: bool,
}

impl SampleMatrix {
    pub(crate) fn from_traces(traces: &[Trace], cols: usize) -> Self {
        let rows = traces.len();
        let mut data = Vec::with_capacity(rows * cols);
        for trace in traces {
            data.extend_from_slice(&trace.samples);
        }
        let integral = data.iter().all(|s| s.fract() == 0.0);
        Self {
            data,
            rows,
            cols,
            integral,
        }
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    /// Row-major backing slice.
    pub fn data(&self) -> &[f32] {
        &self.data
    }

    pub fn row(&self, index: usize) -> &[f32] {
        &self.data[index * self.cols..(index + 1) * self.cols]
    }

    /// True iff every sample across the matrix has zero fractional
    /// part. Advisory only; the stored values stay f32.
    pub fn is_integral(&self) -> bool {
        self.integral
    }

    /// Explicit lossless narrowing to integers. Returns `None` when the
    /// matrix holds at least one fractional sample.
    pub fn to_i32(&self) -> Option<Vec<i32>> {
        if !self.integral {
            return None;
        }
        Some(self.data.iter().map(|&s| s as i32).collect())
    }
}

/// A fully decoded SEG-D record.
#[derive(Debug, Clone)]
pub struct SegdRecord {
    pub general: GeneralHeader,
    /// Scan type headers keyed by channel set number; all-zero blocks
    /// are omitted entirely
    pub scan_types: BTreeMap<u64, ScanTypeHeader>,
    pub extended: ExtendedHeader,
    /// Free-text external header (printable ASCII only)
    pub external_text: Option<String>,
    pub traces: Vec<Trace>,
    pub matrix: SampleMatrix,
    /// Raw bytes of every header block consumed, in encounter order
    /// (general 1-3, scan types, extended, external)
    pub header_block: Vec<u8>,
    /// Raw trace header + extension bytes, one entry per trace
    pub trace_headers_raw: Vec<Vec<u8>>,
}

fn opt_string<T: fmt::Display>(value: &Option<T>) -> String {
    value.as_ref().map(ToString::to_string).unwrap_or_default()
}
