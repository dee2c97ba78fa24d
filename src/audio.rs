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

//! Audio output: device selection, the output stream, and the mixing engine
//! behind it.

pub mod cpal;
pub mod engine;
mod thread_priority;
pub mod voice;

/// Fixed output sample rate. Every sample is normalized to this rate at load
/// time so the render path never resamples.
pub const OUTPUT_SAMPLE_RATE: u32 = 44_100;

/// Output channel count. All buffers are interleaved stereo.
pub const OUTPUT_CHANNELS: u16 = 2;

/// Default render block size in frames (~5.8ms at 44.1kHz).
pub const DEFAULT_BLOCK_FRAMES: u32 = 256;

/// Errors from audio device selection and stream setup. Raised only at
/// startup, never from the render path.
#[derive(Debug, thiserror::Error)]
pub enum DeviceError {
    #[error("no default audio output device")]
    NoDevice,

    #[error("no audio output device matching '{0}'")]
    NotFound(String),

    #[error("failed to enumerate audio devices: {0}")]
    Devices(#[from] ::cpal::DevicesError),

    #[error("failed to query device config: {0}")]
    Config(#[from] ::cpal::DefaultStreamConfigError),

    #[error("failed to build output stream: {0}")]
    BuildStream(#[from] ::cpal::BuildStreamError),

    #[error("failed to start output stream: {0}")]
    PlayStream(#[from] ::cpal::PlayStreamError),

    #[error("unsupported output sample format {0}")]
    UnsupportedFormat(String),
}

/// Lists the names of the available output devices.
pub fn list_devices() -> Result<Vec<String>, DeviceError> {
    cpal::list_output_devices()
}

/// Resolves an output device by name substring, or the default device.
pub fn get_device(name: Option<&str>) -> Result<cpal::OutputDevice, DeviceError> {
    cpal::get_output_device(name)
}
