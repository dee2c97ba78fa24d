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

//! A voice: one active playback of a sample.

use std::sync::Arc;

use crate::samples::SampleBuffer;

/// A cursor into a shared sample buffer.
///
/// Voices are owned and mutated exclusively by the mixing engine on the
/// render thread. A voice is active while its position is short of the
/// buffer's frame count; once it reaches the end it is removed from the
/// active set and never reused.
pub struct Voice {
    /// The sample being played. Read-only, shared with the store and table.
    buffer: Arc<SampleBuffer>,
    /// Current playback position in frames.
    position: usize,
    /// Gain applied to every frame.
    gain: f32,
}

impl Voice {
    /// Starts a voice at the beginning of the buffer.
    pub fn new(buffer: Arc<SampleBuffer>, gain: f32) -> Self {
        Self {
            buffer,
            position: 0,
            gain,
        }
    }

    /// Returns true once the voice has played past the end of its buffer.
    pub fn is_finished(&self) -> bool {
        self.position >= self.buffer.frame_count()
    }

    /// Accumulates this voice into an interleaved stereo block and advances
    /// the position. Returns false when the voice finished inside the block.
    ///
    /// Summation is additive with no clamping; the output driver clamps the
    /// final signal.
    pub fn mix_into(&mut self, out: &mut [f32]) -> bool {
        let total = self.buffer.frame_count();
        let block_frames = out.len() / 2;
        let to_mix = (total - self.position).min(block_frames);

        let start = self.position * 2;
        let frames = &self.buffer.frames()[start..start + to_mix * 2];
        for (o, s) in out[..to_mix * 2].iter_mut().zip(frames) {
            *o += s * self.gain;
        }

        self.position += to_mix;
        self.position < total
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::samples::SampleId;

    fn buffer_of(frames: usize, amplitude: f32) -> Arc<SampleBuffer> {
        Arc::new(SampleBuffer::from_frames(
            SampleId::from_index(0),
            vec![amplitude; frames * 2],
            16,
            44100,
        ))
    }

    #[test]
    fn test_mixes_scaled_frames() {
        let mut voice = Voice::new(buffer_of(4, 0.5), 0.5);
        let mut out = vec![0.0f32; 8];

        assert!(!voice.mix_into(&mut out));
        assert!(out.iter().all(|&s| (s - 0.25).abs() < 1e-6));
        assert!(voice.is_finished());
    }

    #[test]
    fn test_accumulates_without_clamping() {
        let mut first = Voice::new(buffer_of(2, 0.8), 1.0);
        let mut second = Voice::new(buffer_of(2, 0.8), 1.0);
        let mut out = vec![0.0f32; 4];

        first.mix_into(&mut out);
        second.mix_into(&mut out);

        // The sum exceeds 1.0 and is left that way.
        assert!(out.iter().all(|&s| (s - 1.6).abs() < 1e-6));
    }

    #[test]
    fn test_partial_final_block() {
        let mut voice = Voice::new(buffer_of(3, 1.0), 1.0);
        let mut out = vec![0.0f32; 4]; // 2-frame blocks

        assert!(voice.mix_into(&mut out));
        assert!(!voice.is_finished());

        out.fill(0.0);
        assert!(!voice.mix_into(&mut out));

        // Only the first frame of the block was written.
        assert_eq!(&out[..2], &[1.0, 1.0]);
        assert_eq!(&out[2..], &[0.0, 0.0]);
    }
}
