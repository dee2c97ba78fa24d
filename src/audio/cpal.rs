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

//! cpal-backed output device and stream setup.

use std::fmt;
use std::time::Duration;

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{BufferSize, StreamConfig};
use tracing::{error, info, warn};

use super::engine::MixingEngine;
use super::thread_priority::{promote_render_thread, render_thread_priority, rt_audio_enabled};
use super::{DeviceError, OUTPUT_CHANNELS, OUTPUT_SAMPLE_RATE};

/// Scratch size for format-converting callbacks, in samples. Large enough
/// for any block size a backend hands us so the callback never allocates.
const SCRATCH_SAMPLES: usize = 16384;

/// A cpal output device selected for playback.
pub struct OutputDevice {
    name: String,
    device: cpal::Device,
}

impl fmt::Display for OutputDevice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

/// A running output stream. Dropping it stops playback.
pub struct OutputStream {
    _stream: cpal::Stream,
    latency: Option<Duration>,
}

impl OutputStream {
    /// The output latency derived from the negotiated block size and sample
    /// rate. `None` when the device fell back to its default block size,
    /// which the backend does not report.
    pub fn latency(&self) -> Option<Duration> {
        self.latency
    }
}

/// Picks the requested fixed block size when the device's supported range
/// allows it, otherwise the device default.
fn negotiate_buffer_size(supported: &cpal::SupportedBufferSize, requested: u32) -> BufferSize {
    match supported {
        cpal::SupportedBufferSize::Range { min, max } if (*min..=*max).contains(&requested) => {
            BufferSize::Fixed(requested)
        }
        _ => BufferSize::Default,
    }
}

/// One block's duration at the output rate, when the block size is known.
fn block_latency(buffer_size: &BufferSize) -> Option<Duration> {
    match buffer_size {
        BufferSize::Fixed(frames) => Some(Duration::from_secs_f64(
            *frames as f64 / OUTPUT_SAMPLE_RATE as f64,
        )),
        BufferSize::Default => None,
    }
}

/// Lists the names of all cpal output devices on the default host.
pub(super) fn list_output_devices() -> Result<Vec<String>, DeviceError> {
    let host = cpal::default_host();
    let mut names = Vec::new();
    for device in host.output_devices()? {
        names.push(
            device
                .name()
                .unwrap_or_else(|_| String::from("<unknown>")),
        );
    }
    Ok(names)
}

/// Resolves an output device: the default device, or the first device whose
/// name contains `name` (case-insensitive).
pub(super) fn get_output_device(name: Option<&str>) -> Result<OutputDevice, DeviceError> {
    let host = cpal::default_host();

    let device = match name {
        None => host.default_output_device().ok_or(DeviceError::NoDevice)?,
        Some(wanted) => {
            let wanted_lower = wanted.to_lowercase();
            host.output_devices()?
                .find(|device| {
                    device
                        .name()
                        .map(|n| n.to_lowercase().contains(&wanted_lower))
                        .unwrap_or(false)
                })
                .ok_or_else(|| DeviceError::NotFound(wanted.to_string()))?
        }
    };

    let name = device
        .name()
        .unwrap_or_else(|_| String::from("<unknown>"));
    Ok(OutputDevice { name, device })
}

impl OutputDevice {
    /// Returns the device name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Starts the output stream, handing the engine to the render callback.
    ///
    /// Requests a fixed block of `block_frames` when the device supports it,
    /// otherwise falls back to the device default. Stereo at 44.1kHz; f32
    /// output natively, i16/u16 via conversion.
    pub fn start(
        &self,
        engine: MixingEngine,
        block_frames: u32,
    ) -> Result<OutputStream, DeviceError> {
        let supported = self.device.default_output_config()?;

        let buffer_size = negotiate_buffer_size(supported.buffer_size(), block_frames);
        if matches!(buffer_size, BufferSize::Default) {
            warn!(
                block_frames,
                "Device does not support the requested block size, using device default"
            );
        }

        let config = StreamConfig {
            channels: OUTPUT_CHANNELS,
            sample_rate: OUTPUT_SAMPLE_RATE,
            buffer_size,
        };

        let stream = match supported.sample_format() {
            cpal::SampleFormat::F32 => self.build_stream_f32(engine, &config)?,
            cpal::SampleFormat::I16 => self.build_stream_converted::<i16>(engine, &config)?,
            cpal::SampleFormat::U16 => self.build_stream_converted::<u16>(engine, &config)?,
            other => return Err(DeviceError::UnsupportedFormat(format!("{:?}", other))),
        };

        stream.play()?;

        let latency = block_latency(&config.buffer_size);
        match latency {
            Some(latency) => info!(
                device = self.name,
                block_frames,
                latency_ms = format!("{:.1}", latency.as_secs_f64() * 1000.0),
                "Audio output started"
            ),
            None => info!(
                device = self.name,
                "Audio output started with device-default block size, latency unknown"
            ),
        }

        Ok(OutputStream {
            _stream: stream,
            latency,
        })
    }

    /// f32 devices render straight into the cpal buffer.
    fn build_stream_f32(
        &self,
        mut engine: MixingEngine,
        config: &StreamConfig,
    ) -> Result<cpal::Stream, DeviceError> {
        let priority = render_thread_priority();
        let rt_audio = rt_audio_enabled();
        let mut priority_set = false;

        let stream = self.device.build_output_stream(
            config,
            move |data: &mut [f32], _: &cpal::OutputCallbackInfo| {
                promote_render_thread(priority, rt_audio, &mut priority_set);
                engine.render_block(data);
            },
            |err| error!(error = %err, "Audio output stream error"),
            None,
        )?;
        Ok(stream)
    }

    /// Integer devices render into a preallocated scratch block and convert.
    fn build_stream_converted<T>(
        &self,
        mut engine: MixingEngine,
        config: &StreamConfig,
    ) -> Result<cpal::Stream, DeviceError>
    where
        T: cpal::SizedSample + cpal::FromSample<f32>,
    {
        let priority = render_thread_priority();
        let rt_audio = rt_audio_enabled();
        let mut priority_set = false;
        let mut scratch = vec![0.0f32; SCRATCH_SAMPLES];

        let stream = self.device.build_output_stream(
            config,
            move |data: &mut [T], _: &cpal::OutputCallbackInfo| {
                promote_render_thread(priority, rt_audio, &mut priority_set);

                let len = data.len().min(scratch.len());
                engine.render_block(&mut scratch[..len]);
                for (dst, &src) in data.iter_mut().zip(&scratch[..len]) {
                    *dst = T::from_sample(src);
                }
                // A backend block larger than the scratch is silence-filled
                // rather than grown; growing would allocate on the hot path.
                for dst in data[len..].iter_mut() {
                    *dst = T::from_sample(0.0f32);
                }
            },
            |err| error!(error = %err, "Audio output stream error"),
            None,
        )?;
        Ok(stream)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_negotiate_buffer_size() {
        let range = cpal::SupportedBufferSize::Range { min: 64, max: 4096 };

        assert!(matches!(
            negotiate_buffer_size(&range, 256),
            BufferSize::Fixed(256)
        ));
        // Outside the device range or an unknown range falls back.
        assert!(matches!(
            negotiate_buffer_size(&range, 32),
            BufferSize::Default
        ));
        assert!(matches!(
            negotiate_buffer_size(&range, 8192),
            BufferSize::Default
        ));
        assert!(matches!(
            negotiate_buffer_size(&cpal::SupportedBufferSize::Unknown, 256),
            BufferSize::Default
        ));
    }

    #[test]
    fn test_latency_follows_negotiated_size_not_request() {
        // 256 frames at 44.1kHz is ~5.8ms.
        let fixed = block_latency(&BufferSize::Fixed(256)).expect("fixed latency");
        assert!((fixed.as_secs_f64() - 256.0 / 44100.0).abs() < 1e-9);

        // A fallback to the device default reports no latency figure.
        assert!(block_latency(&BufferSize::Default).is_none());
    }
}
