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

//! Sample ingestion and caching.
//!
//! Samples are decoded, normalized to interleaved stereo f32 at the output
//! rate, and held entirely in memory for zero-latency triggering. Loading
//! happens only in the startup/bank-load context; the render path only ever
//! reads the resulting immutable buffers.

mod error;
mod store;
mod wav;

pub use error::SampleError;
pub use store::{SampleBuffer, SampleId, SampleStore, SampleTable, DEFAULT_CACHE_BYTES};
