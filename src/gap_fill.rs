// Gap Filling Module
// Version 1.0

use crate::capture::{CaptureError, Result, SampleAccessor};

/// Substitutes the nearest valid sample when the decoded value is a gap.
///
/// Stride-log captures legitimately contain missing samples recorded as NaN.
/// For display it is often preferable to repeat a neighboring value instead
/// of breaking the trace, so this wrapper searches outward from the queried
/// index and returns the closest non-NaN sample. Only the stride-log format
/// may be wrapped; every other format either cannot contain gaps or is not
/// expected to declare them.
///
/// Each query is a pure function of the wrapped accessor; nothing persists
/// between calls. The common case stays O(1), but a query landing in a long
/// run of gaps degrades to O(length) as the search widens. That cost is
/// accepted: captures are overwhelmingly valid and the sweep only runs on
/// the rare degenerate ones.
#[derive(Clone, Debug)]
pub struct GapFillingAccessor<'a> {
    inner: SampleAccessor<'a>,
}

impl<'a> GapFillingAccessor<'a> {
    /// Wrap a decoded stride-log accessor.
    ///
    /// Fails with [`CaptureError::GapFillUnsupported`] for any other format.
    pub fn wrap(inner: SampleAccessor<'a>) -> Result<Self> {
        match inner {
            SampleAccessor::VariableStrideLog { .. } => Ok(GapFillingAccessor { inner }),
            _ => Err(CaptureError::GapFillUnsupported(inner.format())),
        }
    }

    /// The wrapped accessor.
    pub fn inner(&self) -> &SampleAccessor<'a> {
        &self.inner
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// Undecoded sample at `index`, without gap substitution.
    pub fn raw_code(&self, index: usize) -> f64 {
        self.inner.raw_code(index)
    }

    /// Decoded value at `index`, substituting the nearest valid sample when
    /// the raw value is a gap.
    ///
    /// The search probes left then right at increasing distance until the
    /// shorter side of the buffer is exhausted, then sweeps the remainder of
    /// the longer side only. When both sides have equal span the first phase
    /// already reached both boundaries and no sweep runs. Returns NaN when
    /// every sample in the capture is a gap.
    ///
    /// Panics if `index >= len()`.
    pub fn value(&self, index: usize) -> f64 {
        let x = self.inner.value(index);
        if !x.is_nan() {
            return x;
        }

        let length = self.inner.len();
        let n_left = index;
        let n_right = length - index - 1;
        let n = n_left.min(n_right);

        for k in 1..=n {
            let x = self.inner.value(index - k);
            if !x.is_nan() {
                return x;
            }

            let x = self.inner.value(index + k);
            if !x.is_nan() {
                return x;
            }
        }

        if n_left > n_right {
            // n == n_right < index, so this cannot underflow.
            let mut i = index - (n + 1);
            loop {
                let x = self.inner.value(i);
                if !x.is_nan() {
                    return x;
                }
                if i == 0 {
                    break;
                }
                i -= 1;
            }
        } else if n_left < n_right {
            for i in (index + n + 1)..length {
                let x = self.inner.value(i);
                if !x.is_nan() {
                    return x;
                }
            }
        }

        // give up
        f64::NAN
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::{CaptureDescriptor, RawBuffer, WaveformFormat};

    fn encode_stride_log(samples: &[f32]) -> Vec<u8> {
        let mut buffer = Vec::with_capacity(samples.len() * 4);
        for sample in samples {
            buffer.extend_from_slice(&sample.to_le_bytes());
        }
        buffer
    }

    fn decode_stride_log(buffer: &[u8], length: usize) -> SampleAccessor<'_> {
        SampleAccessor::decode(&CaptureDescriptor {
            format: WaveformFormat::VariableStrideLog,
            values: RawBuffer::Bytes(buffer),
            offset: 0.0,
            scale: 4.0,
            length: Some(length),
        })
        .unwrap()
    }

    #[test]
    fn test_valid_samples_pass_through() {
        let buffer = encode_stride_log(&[1.0, 2.0, 3.0]);
        let filled = GapFillingAccessor::wrap(decode_stride_log(&buffer, 3)).unwrap();

        assert_eq!(filled.len(), 3);
        assert_eq!(filled.value(0), 1.0);
        assert_eq!(filled.value(1), 2.0);
        assert_eq!(filled.value(2), 3.0);
    }

    #[test]
    fn test_nearest_neighbor_substitution() {
        let buffer = encode_stride_log(&[f32::NAN, 2.0, f32::NAN, f32::NAN, 5.0]);
        let filled = GapFillingAccessor::wrap(decode_stride_log(&buffer, 5)).unwrap();

        // Nearest valid sample at distance 1.
        assert_eq!(filled.value(0), 2.0);
        // Equidistant neighbors: the left side is probed first.
        assert_eq!(filled.value(2), 2.0);
        // Right neighbor is strictly closer than the left one.
        assert_eq!(filled.value(3), 5.0);
        assert_eq!(filled.value(1), 2.0);
        assert_eq!(filled.value(4), 5.0);
    }

    #[test]
    fn test_far_side_sweep_right() {
        let buffer = encode_stride_log(&[f32::NAN, f32::NAN, f32::NAN, f32::NAN, 7.0]);
        let filled = GapFillingAccessor::wrap(decode_stride_log(&buffer, 5)).unwrap();

        // From index 1 the radius search exhausts the left side, then the
        // rightward sweep finds the lone valid sample at the end.
        assert_eq!(filled.value(1), 7.0);
        assert_eq!(filled.value(0), 7.0);
    }

    #[test]
    fn test_far_side_sweep_left() {
        let buffer = encode_stride_log(&[7.0, f32::NAN, f32::NAN, f32::NAN, f32::NAN]);
        let filled = GapFillingAccessor::wrap(decode_stride_log(&buffer, 5)).unwrap();

        assert_eq!(filled.value(3), 7.0);
        assert_eq!(filled.value(4), 7.0);
    }

    #[test]
    fn test_all_gaps_gives_up() {
        for length in [1usize, 2, 5, 9] {
            let buffer = encode_stride_log(&vec![f32::NAN; length]);
            let filled = GapFillingAccessor::wrap(decode_stride_log(&buffer, length)).unwrap();

            for index in 0..length {
                assert!(filled.value(index).is_nan(), "index {index} length {length}");
            }
        }
    }

    #[test]
    fn test_raw_code_is_not_substituted() {
        let buffer = encode_stride_log(&[f32::NAN, 2.0]);
        let filled = GapFillingAccessor::wrap(decode_stride_log(&buffer, 2)).unwrap();

        assert!(filled.raw_code(0).is_nan());
        assert_eq!(filled.value(0), 2.0);
    }

    #[test]
    fn test_wrap_rejects_other_formats() {
        let bytes = [0u8; 8];
        let floats = [0.0f64; 4];

        let candidates = [
            CaptureDescriptor {
                format: WaveformFormat::PackedFloatBytes,
                values: RawBuffer::Bytes(&bytes),
                offset: 0.0,
                scale: 1.0,
                length: None,
            },
            CaptureDescriptor {
                format: WaveformFormat::ScaledByteCodes,
                values: RawBuffer::Bytes(&bytes),
                offset: 0.0,
                scale: 1.0,
                length: None,
            },
            CaptureDescriptor {
                format: WaveformFormat::ScaledWordCodes,
                values: RawBuffer::Bytes(&bytes),
                offset: 0.0,
                scale: 1.0,
                length: None,
            },
            CaptureDescriptor {
                format: WaveformFormat::CsvText,
                values: RawBuffer::Bytes(b"1,2"),
                offset: 0.0,
                scale: 1.0,
                length: None,
            },
            CaptureDescriptor {
                format: WaveformFormat::FloatArray,
                values: RawBuffer::Floats(&floats),
                offset: 0.0,
                scale: 1.0,
                length: Some(4),
            },
        ];

        for descriptor in candidates {
            let accessor = SampleAccessor::decode(&descriptor).unwrap();
            let format = accessor.format();
            let result = GapFillingAccessor::wrap(accessor);
            assert!(
                matches!(result, Err(CaptureError::GapFillUnsupported(f)) if f == format),
                "{format:?} must not be wrappable"
            );
        }
    }
}
