// Capture Decoder Module
// Version 1.0

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CaptureError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Invalid format tag: {0}")]
    InvalidFormatTag(u8),

    #[error("Unknown waveform format, capture is unusable")]
    UnknownFormat,

    #[error("Format {0:?} requires an explicit sample count")]
    MissingLength(WaveformFormat),

    #[error("Format {format:?} expects a {expected} buffer")]
    BufferKind {
        format: WaveformFormat,
        expected: &'static str,
    },

    #[error("Format {format:?} requires a non-negative integral {name}, got {value}")]
    InvalidParameter {
        format: WaveformFormat,
        name: &'static str,
        value: f64,
    },

    #[error("Gap filling is not supported for format {0:?}")]
    GapFillUnsupported(WaveformFormat),
}

pub type Result<T> = std::result::Result<T, CaptureError>;

/// Source encoding of a waveform capture.
///
/// The numeric tags match the capture-acquisition wire contract: 0 is
/// reserved for unrecognized captures and never decodes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum WaveformFormat {
    Unknown = 0,
    /// Tightly packed 4-byte little-endian IEEE-754 floats.
    PackedFloatBytes = 1,
    /// One unsigned byte code per sample, scaled to a physical value.
    ScaledByteCodes = 2,
    /// One 16-bit little-endian code per sample, scaled to a physical value.
    ScaledWordCodes = 3,
    /// Comma-separated text, one row per line.
    CsvText = 4,
    /// 4-byte little-endian floats at a fixed byte stride, possibly
    /// interleaved with other channel data.
    VariableStrideLog = 5,
    /// Already-decoded numeric elements at a fixed element stride.
    FloatArray = 6,
}

impl TryFrom<u8> for WaveformFormat {
    type Error = CaptureError;

    fn try_from(tag: u8) -> Result<Self> {
        match tag {
            1 => Ok(WaveformFormat::PackedFloatBytes),
            2 => Ok(WaveformFormat::ScaledByteCodes),
            3 => Ok(WaveformFormat::ScaledWordCodes),
            4 => Ok(WaveformFormat::CsvText),
            5 => Ok(WaveformFormat::VariableStrideLog),
            6 => Ok(WaveformFormat::FloatArray),
            _ => Err(CaptureError::InvalidFormatTag(tag)),
        }
    }
}

/// Borrowed capture payload. Binary and text formats carry bytes; the
/// float-array format carries an in-memory numeric sequence.
#[derive(Clone, Copy, Debug)]
pub enum RawBuffer<'a> {
    Bytes(&'a [u8]),
    Floats(&'a [f64]),
}

impl<'a> From<&'a [u8]> for RawBuffer<'a> {
    fn from(data: &'a [u8]) -> Self {
        RawBuffer::Bytes(data)
    }
}

impl<'a> From<&'a [f64]> for RawBuffer<'a> {
    fn from(data: &'a [f64]) -> Self {
        RawBuffer::Floats(data)
    }
}

/// Everything the acquisition side knows about one capture.
///
/// `offset` and `scale` are format-dependent: scaling bias and gain for the
/// scaled-code formats, byte offset and byte stride for the stride log,
/// element offset and element stride for the float array, unused for
/// packed floats and CSV. `length` is an explicit sample-count hint,
/// consulted only by the stride-log and float-array formats.
#[derive(Clone, Copy, Debug)]
pub struct CaptureDescriptor<'a> {
    pub format: WaveformFormat,
    pub values: RawBuffer<'a>,
    pub offset: f64,
    pub scale: f64,
    pub length: Option<usize>,
}

/// Random-access view over one decoded capture.
///
/// Built once per capture by [`SampleAccessor::decode`], then queried many
/// times during rendering. Each variant carries its derived sample count and
/// decode parameters; `value` and `raw_code` are O(1) per call and never
/// allocate. The borrowed buffer is never mutated.
#[derive(Clone, Debug)]
pub enum SampleAccessor<'a> {
    PackedFloatBytes {
        data: &'a [u8],
        length: usize,
    },
    ScaledByteCodes {
        data: &'a [u8],
        offset: f64,
        scale: f64,
    },
    ScaledWordCodes {
        data: &'a [u8],
        offset: f64,
        scale: f64,
        length: usize,
    },
    CsvText {
        samples: Vec<f64>,
    },
    VariableStrideLog {
        data: &'a [u8],
        offset: usize,
        stride: usize,
        length: usize,
    },
    FloatArray {
        data: &'a [f64],
        offset: usize,
        stride: usize,
        length: usize,
    },
}

impl<'a> SampleAccessor<'a> {
    /// Build the accessor for a capture descriptor.
    ///
    /// Derives the logical sample count from the buffer size (or the
    /// descriptor's explicit count for the stride-log and float-array
    /// formats) and selects the per-index decode rule for the declared
    /// format. An `Unknown` format is an error, not a silent no-op: a
    /// capture with an unrecognized tag must be rejected before rendering.
    pub fn decode(descriptor: &CaptureDescriptor<'a>) -> Result<Self> {
        match descriptor.format {
            WaveformFormat::Unknown => Err(CaptureError::UnknownFormat),

            WaveformFormat::PackedFloatBytes => {
                let data = byte_buffer(descriptor)?;
                Ok(SampleAccessor::PackedFloatBytes {
                    data,
                    length: data.len() / 4,
                })
            }

            WaveformFormat::ScaledByteCodes => {
                let data = byte_buffer(descriptor)?;
                Ok(SampleAccessor::ScaledByteCodes {
                    data,
                    offset: descriptor.offset,
                    scale: descriptor.scale,
                })
            }

            WaveformFormat::ScaledWordCodes => {
                let data = byte_buffer(descriptor)?;
                Ok(SampleAccessor::ScaledWordCodes {
                    data,
                    offset: descriptor.offset,
                    scale: descriptor.scale,
                    length: data.len() / 2,
                })
            }

            WaveformFormat::CsvText => {
                let data = byte_buffer(descriptor)?;
                Ok(SampleAccessor::CsvText {
                    samples: parse_csv(data),
                })
            }

            WaveformFormat::VariableStrideLog => {
                let data = byte_buffer(descriptor)?;
                Ok(SampleAccessor::VariableStrideLog {
                    data,
                    offset: element_param(descriptor, "byte offset", descriptor.offset)?,
                    stride: element_param(descriptor, "byte stride", descriptor.scale)?,
                    length: descriptor.length.unwrap_or(data.len()),
                })
            }

            WaveformFormat::FloatArray => {
                let data = float_buffer(descriptor)?;
                let length = descriptor
                    .length
                    .ok_or(CaptureError::MissingLength(WaveformFormat::FloatArray))?;
                Ok(SampleAccessor::FloatArray {
                    data,
                    offset: element_param(descriptor, "element offset", descriptor.offset)?,
                    stride: element_param(descriptor, "element stride", descriptor.scale)?,
                    length,
                })
            }
        }
    }

    /// Format this accessor was decoded from.
    pub fn format(&self) -> WaveformFormat {
        match self {
            SampleAccessor::PackedFloatBytes { .. } => WaveformFormat::PackedFloatBytes,
            SampleAccessor::ScaledByteCodes { .. } => WaveformFormat::ScaledByteCodes,
            SampleAccessor::ScaledWordCodes { .. } => WaveformFormat::ScaledWordCodes,
            SampleAccessor::CsvText { .. } => WaveformFormat::CsvText,
            SampleAccessor::VariableStrideLog { .. } => WaveformFormat::VariableStrideLog,
            SampleAccessor::FloatArray { .. } => WaveformFormat::FloatArray,
        }
    }

    /// Logical sample count of the capture.
    pub fn len(&self) -> usize {
        match *self {
            SampleAccessor::PackedFloatBytes { length, .. } => length,
            SampleAccessor::ScaledByteCodes { data, .. } => data.len(),
            SampleAccessor::ScaledWordCodes { length, .. } => length,
            SampleAccessor::CsvText { ref samples } => samples.len(),
            SampleAccessor::VariableStrideLog { length, .. } => length,
            SampleAccessor::FloatArray { length, .. } => length,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Undecoded sample at `index`: the raw instrument code for the
    /// scaled-code formats, identical to [`value`](Self::value) for formats
    /// that are already physical.
    ///
    /// For the length-hinted formats an in-range index may still address
    /// past the end of a short buffer; such reads decode as gaps (NaN)
    /// rather than failing mid-render.
    ///
    /// Panics if `index >= len()`.
    pub fn raw_code(&self, index: usize) -> f64 {
        assert!(
            index < self.len(),
            "sample index {} out of range (length {})",
            index,
            self.len()
        );

        match *self {
            SampleAccessor::PackedFloatBytes { data, .. } => read_f32_le(data, 4 * index),
            SampleAccessor::ScaledByteCodes { data, .. } => data[index] as f64,
            SampleAccessor::ScaledWordCodes { data, .. } => read_u16_le(data, 2 * index) as f64,
            SampleAccessor::CsvText { ref samples } => samples[index],
            SampleAccessor::VariableStrideLog {
                data,
                offset,
                stride,
                ..
            } => {
                let at = offset + index * stride;
                if at + 4 <= data.len() {
                    read_f32_le(data, at)
                } else {
                    f64::NAN
                }
            }
            SampleAccessor::FloatArray {
                data,
                offset,
                stride,
                ..
            } => data.get(offset + index * stride).copied().unwrap_or(f64::NAN),
        }
    }

    /// Decoded physical value at `index`, possibly NaN for formats that
    /// carry explicit gaps or unparsable fields.
    ///
    /// Panics if `index >= len()`.
    pub fn value(&self, index: usize) -> f64 {
        match *self {
            SampleAccessor::ScaledByteCodes { offset, scale, .. }
            | SampleAccessor::ScaledWordCodes { offset, scale, .. } => {
                offset + self.raw_code(index) * scale
            }
            _ => self.raw_code(index),
        }
    }

    /// Write the decoded samples to a CSV file.
    pub fn write_csv<P: AsRef<Path>>(&self, output_file: P) -> Result<()> {
        let file = File::create(output_file)?;
        let mut writer = BufWriter::new(file);

        writeln!(writer, "Sample,Value")?;

        for index in 0..self.len() {
            writeln!(writer, "{},{}", index, self.value(index))?;
        }

        writer.flush()?;
        Ok(())
    }
}

fn byte_buffer<'a>(descriptor: &CaptureDescriptor<'a>) -> Result<&'a [u8]> {
    match descriptor.values {
        RawBuffer::Bytes(data) => Ok(data),
        RawBuffer::Floats(_) => Err(CaptureError::BufferKind {
            format: descriptor.format,
            expected: "byte",
        }),
    }
}

fn float_buffer<'a>(descriptor: &CaptureDescriptor<'a>) -> Result<&'a [f64]> {
    match descriptor.values {
        RawBuffer::Floats(data) => Ok(data),
        RawBuffer::Bytes(_) => Err(CaptureError::BufferKind {
            format: descriptor.format,
            expected: "numeric",
        }),
    }
}

/// Convert a format-dependent `offset`/`scale` parameter to a buffer
/// position. Negative, fractional, or non-finite values would shift reads
/// silently, so they are rejected at decode time.
fn element_param(descriptor: &CaptureDescriptor, name: &'static str, value: f64) -> Result<usize> {
    if !value.is_finite() || value < 0.0 || value.fract() != 0.0 {
        return Err(CaptureError::InvalidParameter {
            format: descriptor.format,
            name,
            value,
        });
    }
    Ok(value as usize)
}

fn read_f32_le(data: &[u8], at: usize) -> f64 {
    let mut raw = [0u8; 4];
    raw.copy_from_slice(&data[at..at + 4]);
    f32::from_le_bytes(raw) as f64
}

fn read_u16_le(data: &[u8], at: usize) -> u16 {
    u16::from_le_bytes([data[at], data[at + 1]])
}

/// Decode a CSV export. A single line is the sample sequence directly; with
/// multiple lines only the first field of each line is the signal of
/// interest (multi-column exports put other channels in later columns).
/// An empty buffer holds no samples.
fn parse_csv(data: &[u8]) -> Vec<f64> {
    let text = String::from_utf8_lossy(data);
    if text.is_empty() {
        return Vec::new();
    }

    let lines: Vec<&str> = text.split('\n').collect();

    if lines.len() == 1 {
        return lines[0].split(',').map(parse_field).collect();
    }

    lines
        .iter()
        .map(|line| parse_field(line.split(',').next().unwrap_or("")))
        .collect()
}

fn parse_field(field: &str) -> f64 {
    field.trim().parse::<f64>().unwrap_or(f64::NAN)
}
