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

use std::path::Path;

use hound::{SampleFormat, WavSpec, WavWriter};

/// Writes an integer PCM WAV for tests. Samples are f32 in [-1, 1], written
/// interleaved at the given bit depth.
pub fn write_wav(path: &Path, bits: u16, channels: u16, sample_rate: u32, samples: &[f32]) {
    let spec = WavSpec {
        channels,
        sample_rate,
        bits_per_sample: bits,
        sample_format: SampleFormat::Int,
    };
    let scale = ((1i64 << (bits - 1)) - 1) as f32;

    let mut writer = WavWriter::create(path, spec).expect("create wav");
    match bits {
        8 => {
            for &s in samples {
                writer.write_sample((s * scale) as i8).expect("write");
            }
        }
        16 => {
            for &s in samples {
                writer.write_sample((s * scale) as i16).expect("write");
            }
        }
        24 | 32 => {
            for &s in samples {
                writer.write_sample((s * scale) as i32).expect("write");
            }
        }
        _ => panic!("unsupported test bit depth {}", bits),
    }
    writer.finalize().expect("finalize wav");
}
