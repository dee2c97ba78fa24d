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

//! The mixing engine: the real-time render path.
//!
//! `render_block` runs once per block on the audio callback thread. It must
//! finish inside the block deadline (~5.8ms at 256 frames / 44.1kHz), so the
//! whole path is O(active voices) with no heap allocation, no locking, and
//! no error returns. A dropped trigger or a missed deadline is silent by
//! design; anything that blocks or unwinds here is worse than either.

use crate::audio::voice::Voice;
use crate::samples::SampleTable;
use crate::trigger::TriggerReceiver;

/// Hard cap on simultaneously active voices. The voice vec is preallocated
/// to this length so starting a voice never reallocates.
pub const MAX_VOICES: usize = 64;

/// Bound on triggers consumed per block, limiting per-block voice-spawn
/// cost. Anything beyond this stays queued for the next block.
pub const MAX_TRIGGERS_PER_BLOCK: usize = 16;

/// Mixes all active voices into the output stream.
///
/// Owned by the audio callback; no other thread observes or mutates the
/// active voice set.
pub struct MixingEngine {
    /// Consumer half of the trigger queue.
    triggers: TriggerReceiver,
    /// Read-only sample lookup built at bank load, indexed by `SampleId`.
    table: SampleTable,
    /// Active voices. Capacity is reserved up front and never exceeded.
    voices: Vec<Voice>,
}

impl MixingEngine {
    /// Creates an engine over a sample table and the consumer half of the
    /// trigger queue.
    pub fn new(triggers: TriggerReceiver, table: SampleTable) -> Self {
        Self {
            triggers,
            table,
            voices: Vec::with_capacity(MAX_VOICES),
        }
    }

    /// Renders one interleaved stereo block.
    pub fn render_block(&mut self, out: &mut [f32]) {
        out.fill(0.0);

        // Start voices for pending triggers. Triggers without a resolvable
        // buffer (evicted or never loaded) and triggers past the voice cap
        // are dropped silently.
        let voices = &mut self.voices;
        let table = &self.table;
        self.triggers.drain(MAX_TRIGGERS_PER_BLOCK, |message| {
            if voices.len() >= MAX_VOICES {
                return;
            }
            if let Some(buffer) = table.get(message.sample.index()).and_then(Option::as_ref) {
                voices.push(Voice::new(buffer.clone(), message.gain));
            }
        });

        // Mix and retire in one pass.
        self.voices.retain_mut(|voice| voice.mix_into(out));
    }

    /// Number of currently active voices.
    pub fn active_voices(&self) -> usize {
        self.voices.len()
    }
}
