// src/lib.rs
// Capture Reader Library - Public API

//! # Capture Reader
//!
//! A Rust library for random-access decoding of instrument waveform captures.
//!
//! ## Features
//!
//! - One uniform `value(index)` / `raw_code(index)` interface over packed
//!   floats, scaled byte/word codes, CSV exports, variable-stride logs, and
//!   in-memory float arrays
//! - Raw instrument codes and scaled physical values for scaled-code formats
//! - Optional nearest-valid-sample substitution for stride logs with gaps
//! - Export decoded samples to CSV format
//! - Proper error handling
//!
//! ## Example
//!
//! ```
//! use capture_reader::{CaptureDescriptor, RawBuffer, SampleAccessor, WaveformFormat};
//!
//! // Three byte codes from an 8-bit digitizer, scaled to volts.
//! let codes = [0u8, 128, 255];
//! let descriptor = CaptureDescriptor {
//!     format: WaveformFormat::ScaledByteCodes,
//!     values: RawBuffer::Bytes(&codes),
//!     offset: -1.0,
//!     scale: 0.01,
//!     length: None,
//! };
//!
//! let accessor = SampleAccessor::decode(&descriptor).expect("recognized format");
//!
//! assert_eq!(accessor.len(), 3);
//! assert_eq!(accessor.raw_code(1), 128.0);
//! assert_eq!(accessor.value(1), -1.0 + 128.0 * 0.01);
//! ```

mod capture;
mod gap_fill;

pub use capture::{
    CaptureDescriptor, CaptureError, RawBuffer, Result, SampleAccessor, WaveformFormat,
};
pub use gap_fill::GapFillingAccessor;
