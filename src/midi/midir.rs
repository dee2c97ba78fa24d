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

//! midir-backed MIDI input: port listing, resolution, and the listener that
//! turns matching events into trigger pushes.

use std::fmt;

use midir::{MidiInput, MidiInputConnection, MidiInputPort};
use midly::live::LiveEvent;
use tracing::{debug, info, warn};

use super::{velocity_gain, DeviceError, MidiBinding, MidiTrigger};
use crate::trigger::{TriggerMessage, TriggerSender};

const CLIENT_NAME: &str = "sampad";

/// A resolved MIDI input port.
pub struct InputPort {
    name: String,
    port: MidiInputPort,
}

impl InputPort {
    /// Returns the port name.
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl fmt::Display for InputPort {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

/// Lists the available MIDI input ports.
pub fn list_input_ports() -> Result<Vec<InputPort>, DeviceError> {
    let input = MidiInput::new(CLIENT_NAME)?;
    let mut ports = Vec::new();
    for port in input.ports() {
        let name = input.port_name(&port)?;
        ports.push(InputPort { name, port });
    }
    Ok(ports)
}

/// Resolves a MIDI input port by selector: a numeric index into the port
/// list, or a case-insensitive name substring. A substring matching more
/// than one port is an error rather than a guess.
pub fn resolve_input_port(selector: &str) -> Result<InputPort, DeviceError> {
    let mut ports = list_input_ports()?;
    if ports.is_empty() {
        return Err(DeviceError::NoPorts);
    }

    if let Ok(index) = selector.parse::<usize>() {
        let last = ports.len() - 1;
        if index > last {
            return Err(DeviceError::IndexOutOfRange { index, last });
        }
        return Ok(ports.swap_remove(index));
    }

    let wanted = selector.to_lowercase();
    let mut matches: Vec<usize> = ports
        .iter()
        .enumerate()
        .filter(|(_, port)| port.name.to_lowercase().contains(&wanted))
        .map(|(i, _)| i)
        .collect();

    match matches.len() {
        0 => Err(DeviceError::NotFound(selector.to_string())),
        1 => Ok(ports.swap_remove(matches.pop().expect("one match"))),
        _ => {
            let names: Vec<&str> = matches.iter().map(|&i| ports[i].name.as_str()).collect();
            Err(DeviceError::Ambiguous(
                selector.to_string(),
                names.join(", "),
            ))
        }
    }
}

/// A live MIDI input connection. Dropping it disconnects.
///
/// The callback runs on midir's input thread and is a pure producer: parse,
/// match, push. An event matching no binding is ignored; a full queue drops
/// the trigger and moves on, counted on the sender.
pub struct MidiListener {
    _connection: MidiInputConnection<()>,
}

impl MidiListener {
    /// Connects to the port and starts listening.
    pub fn connect(
        port: InputPort,
        triggers: Vec<MidiTrigger>,
        sender: TriggerSender,
    ) -> Result<Self, DeviceError> {
        let input = MidiInput::new(CLIENT_NAME)?;
        let port_name = port.name.clone();

        let connection = input
            .connect(
                &port.port,
                CLIENT_NAME,
                move |_timestamp, raw, _| {
                    let Ok(event) = LiveEvent::parse(raw) else {
                        return;
                    };
                    for trigger in &triggers {
                        if trigger.binding.matches(&event) {
                            let gain = trigger.gain * velocity_gain(&event);
                            let message = TriggerMessage::new(trigger.sample, gain);
                            if sender.push(message) {
                                debug!(binding = %trigger.binding, gain, "MIDI trigger");
                            } else {
                                warn!(binding = %trigger.binding, "Trigger queue full, dropped MIDI trigger");
                            }
                            break;
                        }
                    }
                },
                (),
            )
            .map_err(|e| DeviceError::Connect(e.to_string()))?;

        info!(port = port_name, "MIDI input connected");
        Ok(MidiListener {
            _connection: connection,
        })
    }

    /// Connects to the port and hands the callback the binding each bindable
    /// event would satisfy. Backs the `midi-learn` command: press a pad or
    /// turn a knob, get the string to paste into a bank file.
    pub fn watch_bindings(
        port: InputPort,
        mut f: impl FnMut(MidiBinding) + Send + 'static,
    ) -> Result<Self, DeviceError> {
        let input = MidiInput::new(CLIENT_NAME)?;
        let port_name = port.name.clone();

        let connection = input
            .connect(
                &port.port,
                CLIENT_NAME,
                move |_timestamp, raw, _| {
                    let Ok(event) = LiveEvent::parse(raw) else {
                        return;
                    };
                    if let Some(binding) = MidiBinding::from_event(&event) {
                        f(binding);
                    }
                },
                (),
            )
            .map_err(|e| DeviceError::Connect(e.to_string()))?;

        info!(port = port_name, "MIDI input connected");
        Ok(MidiListener {
            _connection: connection,
        })
    }
}
