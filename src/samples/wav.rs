// Copyright (C) 2026 The sampad authors
//
// This program is free software: you can redistribute it and/or modify it under
// the terms of the GNU General Public License as published by the Free Software
// Foundation, version 3.
//
// This program is distributed in the hope that it will be useful, but WITHOUT
// ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS
// FOR A PARTICULAR PURPOSE. See the GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License along with
// this program. If not, see <https://www.gnu.org/licenses/>.
//

//! WAV decoding and normalization.
//!
//! Decodes 8/16/24-bit integer PCM into interleaved stereo f32 frames in
//! [-1.0, 1.0]. Mono files are duplicated to stereo; files at a different
//! sample rate are resampled with linear interpolation, which is sufficient
//! for one-shot hits and avoids pulling in a full resampler.

use std::path::Path;

use super::error::SampleError;

/// Bit depths we accept from the WAV container.
const SUPPORTED_BITS: [u16; 3] = [8, 16, 24];

/// A decoded, normalized sample ready to be wrapped in a `SampleBuffer`.
pub(super) struct DecodedSample {
    /// Interleaved stereo frames at the target rate.
    pub frames: Vec<f32>,
    /// Bit depth of the source file, kept for diagnostics.
    pub source_bits: u16,
    /// Sample rate of the source file, kept for diagnostics.
    pub source_rate: u32,
}

/// Decodes a WAV file into normalized stereo frames at `target_rate`.
pub(super) fn decode_wav(path: &Path, target_rate: u32) -> Result<DecodedSample, SampleError> {
    let mut reader = hound::WavReader::open(path)?;
    let spec = reader.spec();

    if spec.sample_format != hound::SampleFormat::Int {
        return Err(SampleError::UnsupportedFormat(format!(
            "{:?} samples (only integer PCM is supported)",
            spec.sample_format
        )));
    }
    if !SUPPORTED_BITS.contains(&spec.bits_per_sample) {
        return Err(SampleError::UnsupportedFormat(format!(
            "{}-bit samples (supported: 8/16/24-bit)",
            spec.bits_per_sample
        )));
    }
    if spec.channels == 0 || spec.channels > 2 {
        return Err(SampleError::UnsupportedFormat(format!(
            "{} channels (only mono and stereo are supported)",
            spec.channels
        )));
    }

    // Scale integer samples into [-1.0, 1.0]. i64 keeps the shift safe for
    // the full range of supported bit depths.
    let scale = 1.0 / (1i64 << (spec.bits_per_sample - 1)) as f32;
    let samples = reader
        .samples::<i32>()
        .map(|s| s.map(|v| v as f32 * scale))
        .collect::<Result<Vec<f32>, hound::Error>>()?;

    let mut frames: Vec<f32> = if spec.channels == 1 {
        let mut stereo = Vec::with_capacity(samples.len() * 2);
        for s in samples {
            stereo.push(s);
            stereo.push(s);
        }
        stereo
    } else {
        // Drop a trailing odd sample from a truncated final frame.
        let whole = samples.len() - samples.len() % 2;
        let mut stereo = samples;
        stereo.truncate(whole);
        stereo
    };

    if spec.sample_rate != target_rate {
        frames = resample_linear(&frames, spec.sample_rate, target_rate);
    }

    Ok(DecodedSample {
        frames,
        source_bits: spec.bits_per_sample,
        source_rate: spec.sample_rate,
    })
}

/// Resamples interleaved stereo frames using linear interpolation.
fn resample_linear(frames: &[f32], source_rate: u32, target_rate: u32) -> Vec<f32> {
    let source_frames = frames.len() / 2;
    let ratio = target_rate as f64 / source_rate as f64;
    let target_frames = (source_frames as f64 * ratio).ceil() as usize;

    let mut output = Vec::with_capacity(target_frames * 2);
    for target_frame in 0..target_frames {
        let source_pos = target_frame as f64 / ratio;
        let source_frame = source_pos.floor() as usize;
        let frac = source_pos.fract() as f32;

        for channel in 0..2 {
            let idx0 = source_frame * 2 + channel;
            let idx1 = (source_frame + 1) * 2 + channel;

            let s0 = frames.get(idx0).copied().unwrap_or(0.0);
            let s1 = frames.get(idx1).copied().unwrap_or(s0);

            output.push(s0 + (s1 - s0) * frac);
        }
    }

    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::write_wav;

    #[test]
    fn test_decode_16_bit_mono_duplicates_channels() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("mono.wav");
        write_wav(&path, 16, 1, 44100, &[0.5, -0.5, 0.25]);

        let decoded = decode_wav(&path, 44100).expect("decode");
        assert_eq!(decoded.frames.len(), 6);
        assert_eq!(decoded.source_bits, 16);
        assert_eq!(decoded.source_rate, 44100);

        // Both channels of every frame carry the same sample.
        for frame in decoded.frames.chunks_exact(2) {
            assert_eq!(frame[0], frame[1]);
        }
        assert!((decoded.frames[0] - 0.5).abs() < 1e-3);
        assert!((decoded.frames[2] + 0.5).abs() < 1e-3);
    }

    #[test]
    fn test_decode_values_in_range_for_all_depths() {
        let dir = tempfile::tempdir().expect("tempdir");
        let samples: Vec<f32> = (0..100).map(|i| ((i as f32) / 50.0 - 1.0) * 0.99).collect();

        for bits in [8u16, 16, 24] {
            for channels in [1u16, 2] {
                let path = dir.path().join(format!("{}bit_{}ch.wav", bits, channels));
                write_wav(&path, bits, channels, 44100, &samples);

                let decoded = decode_wav(&path, 44100).expect("decode");
                let source_frames = samples.len() / channels as usize;
                assert_eq!(decoded.frames.len(), source_frames * 2);
                for s in &decoded.frames {
                    assert!((-1.0..=1.0).contains(s), "{}-bit sample out of range: {}", bits, s);
                }
            }
        }
    }

    #[test]
    fn test_resample_doubles_frame_count() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("22k.wav");

        // One second of 22.05kHz mono.
        let samples = vec![0.5f32; 22050];
        write_wav(&path, 16, 1, 22050, &samples);

        let decoded = decode_wav(&path, 44100).expect("decode");
        assert_eq!(decoded.frames.len() / 2, 44100);
        assert_eq!(decoded.source_rate, 22050);

        // Constant input stays constant through interpolation, both channels equal.
        for frame in decoded.frames.chunks_exact(2) {
            assert!((frame[0] - 0.5).abs() < 1e-3);
            assert_eq!(frame[0], frame[1]);
        }
    }

    #[test]
    fn test_float_wav_is_unsupported() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("float.wav");

        let spec = hound::WavSpec {
            channels: 1,
            sample_rate: 44100,
            bits_per_sample: 32,
            sample_format: hound::SampleFormat::Float,
        };
        let mut writer = hound::WavWriter::create(&path, spec).expect("writer");
        writer.write_sample(0.5f32).expect("write");
        writer.finalize().expect("finalize");

        match decode_wav(&path, 44100) {
            Err(SampleError::UnsupportedFormat(_)) => {}
            other => panic!("expected UnsupportedFormat, got {:?}", other.map(|d| d.frames.len())),
        }
    }

    #[test]
    fn test_garbage_file_is_decode_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("garbage.wav");
        std::fs::write(&path, b"definitely not a RIFF container").expect("write");

        match decode_wav(&path, 44100) {
            Err(SampleError::Decode(_)) => {}
            other => panic!("expected Decode, got {:?}", other.map(|d| d.frames.len())),
        }
    }

    #[test]
    fn test_missing_file_is_io_error() {
        match decode_wav(Path::new("/nonexistent/sample.wav"), 44100) {
            Err(SampleError::Io(_)) => {}
            other => panic!("expected Io, got {:?}", other.map(|d| d.frames.len())),
        }
    }
}
