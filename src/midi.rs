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

//! MIDI: binding grammar, event matching, and the input listener.
//!
//! A binding string ties a pad to an incoming event:
//! `note:36:ch9`, `cc:1:ch0`, `pc:5:ch0`. Channels are 0-based.

mod midir;

pub use midir::{list_input_ports, resolve_input_port, InputPort, MidiListener};

use midly::live::LiveEvent;
use midly::MidiMessage;

use crate::samples::SampleId;

/// Errors from parsing a MIDI binding string.
#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum BindError {
    #[error("malformed MIDI binding '{0}' (expected note|cc|pc:<number>:ch<channel>)")]
    Malformed(String),

    #[error("MIDI binding value {value} out of range (0-{max})")]
    OutOfRange { value: u32, max: u8 },
}

/// Errors from MIDI device selection and connection. Startup only.
#[derive(Debug, thiserror::Error)]
pub enum DeviceError {
    #[error("failed to initialize MIDI input: {0}")]
    Init(#[from] ::midir::InitError),

    #[error("failed to read MIDI port name: {0}")]
    PortName(#[from] ::midir::PortInfoError),

    #[error("failed to connect to MIDI input: {0}")]
    Connect(String),

    #[error("no MIDI input ports available")]
    NoPorts,

    #[error("no MIDI input port matching '{0}'")]
    NotFound(String),

    #[error("MIDI input port index {index} out of range (0-{last})")]
    IndexOutOfRange { index: usize, last: usize },

    #[error("ambiguous MIDI input port '{0}': matches {1}")]
    Ambiguous(String, String),
}

/// A parsed pad binding.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MidiBinding {
    /// NoteOn with velocity > 0 on a key/channel.
    Note { key: u8, channel: u8 },
    /// Any ControlChange on a controller/channel, regardless of value.
    Control { controller: u8, channel: u8 },
    /// ProgramChange on a program/channel.
    Program { program: u8, channel: u8 },
}

impl MidiBinding {
    /// Parses a binding string such as `note:36:ch9`.
    pub fn parse(s: &str) -> Result<Self, BindError> {
        let malformed = || BindError::Malformed(s.to_string());

        let mut parts = s.split(':');
        let kind = parts.next().ok_or_else(malformed)?;
        let number = parts.next().ok_or_else(malformed)?;
        let channel = parts.next().ok_or_else(malformed)?;
        if parts.next().is_some() {
            return Err(malformed());
        }

        let number: u32 = number.parse().map_err(|_| malformed())?;
        if number > 127 {
            return Err(BindError::OutOfRange {
                value: number,
                max: 127,
            });
        }
        let number = number as u8;

        let channel: u32 = channel
            .strip_prefix("ch")
            .ok_or_else(malformed)?
            .parse()
            .map_err(|_| malformed())?;
        if channel > 15 {
            return Err(BindError::OutOfRange {
                value: channel,
                max: 15,
            });
        }
        let channel = channel as u8;

        match kind {
            "note" => Ok(MidiBinding::Note {
                key: number,
                channel,
            }),
            "cc" => Ok(MidiBinding::Control {
                controller: number,
                channel,
            }),
            "pc" => Ok(MidiBinding::Program {
                program: number,
                channel,
            }),
            _ => Err(malformed()),
        }
    }

    /// Derives the binding an incoming event would satisfy, for capturing
    /// binding strings off a controller. Returns `None` for events that can
    /// never trigger a pad: note releases (including velocity-0 NoteOn) and
    /// anything outside note/cc/pc.
    pub fn from_event(event: &LiveEvent<'_>) -> Option<Self> {
        let LiveEvent::Midi { channel, message } = event else {
            return None;
        };
        let channel = u8::from(*channel);

        match message {
            MidiMessage::NoteOn { key, vel } if u8::from(*vel) > 0 => Some(MidiBinding::Note {
                key: u8::from(*key),
                channel,
            }),
            MidiMessage::Controller { controller, .. } => Some(MidiBinding::Control {
                controller: u8::from(*controller),
                channel,
            }),
            MidiMessage::ProgramChange { program } => Some(MidiBinding::Program {
                program: u8::from(*program),
                channel,
            }),
            _ => None,
        }
    }

    /// Checks whether an incoming event matches this binding.
    ///
    /// NoteOn with velocity 0 is a NoteOff in disguise and never matches.
    pub fn matches(&self, event: &LiveEvent<'_>) -> bool {
        let LiveEvent::Midi { channel, message } = event else {
            return false;
        };
        let event_channel = u8::from(*channel);

        match (self, message) {
            (MidiBinding::Note { key, channel }, MidiMessage::NoteOn { key: k, vel }) => {
                u8::from(*vel) > 0 && u8::from(*k) == *key && event_channel == *channel
            }
            (
                MidiBinding::Control {
                    controller,
                    channel,
                },
                MidiMessage::Controller { controller: c, .. },
            ) => u8::from(*c) == *controller && event_channel == *channel,
            (
                MidiBinding::Program { program, channel },
                MidiMessage::ProgramChange { program: p },
            ) => u8::from(*p) == *program && event_channel == *channel,
            _ => false,
        }
    }
}

impl std::fmt::Display for MidiBinding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MidiBinding::Note { key, channel } => write!(f, "note:{}:ch{}", key, channel),
            MidiBinding::Control {
                controller,
                channel,
            } => write!(f, "cc:{}:ch{}", controller, channel),
            MidiBinding::Program { program, channel } => write!(f, "pc:{}:ch{}", program, channel),
        }
    }
}

/// A binding resolved against a loaded bank: matching events trigger the
/// sample at the pad's gain scaled by event velocity.
#[derive(Clone, Debug)]
pub struct MidiTrigger {
    /// The binding to match incoming events against.
    pub binding: MidiBinding,
    /// The sample to trigger.
    pub sample: SampleId,
    /// The pad's configured gain.
    pub gain: f32,
}

/// The velocity-derived gain scalar for a matched event: NoteOn velocity
/// scaled to [0, 1], full gain for cc/pc.
pub fn velocity_gain(event: &LiveEvent<'_>) -> f32 {
    match event {
        LiveEvent::Midi {
            message: MidiMessage::NoteOn { vel, .. },
            ..
        } => f32::from(u8::from(*vel)) / 127.0,
        _ => 1.0,
    }
}
