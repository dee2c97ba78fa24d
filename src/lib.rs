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

//! sampad is a low-latency sample pad player: a 4x4 bank of one-shot WAV
//! samples triggered from the keyboard or a MIDI controller, mixed by a
//! real-time engine that never allocates or blocks on the audio thread.

pub mod audio;
pub mod bank;
pub mod midi;
pub mod samples;
pub mod trigger;

#[cfg(test)]
mod testutil;
