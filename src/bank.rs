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

//! Bank configuration: the YAML pad layout and the table it resolves into.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::midi::{MidiBinding, MidiTrigger};
use crate::samples::{SampleId, SampleStore};

/// Number of pads in a bank. Fixed 4x4 layout.
pub const NUM_PADS: usize = 16;

/// Keybinds assigned to pads without an explicit one, by pad id. The classic
/// left-hand 4x4 grid.
pub const DEFAULT_KEYBINDS: &str = "1234qwerasdfzxcv";

/// Errors from reading a bank file.
#[derive(Debug, thiserror::Error)]
pub enum BankError {
    #[error("failed to read bank file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse bank file: {0}")]
    Parse(#[from] serde_yml::Error),
}

/// A pad bank as read from YAML.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct Bank {
    /// Display name of the bank.
    pub name: String,

    /// Preferred MIDI input port, a numeric index or name substring.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub midi_device: Option<String>,

    /// The pads. At most one per id in 0..16; out-of-range or duplicate
    /// ids are skipped at resolution time.
    pub pads: Vec<Pad>,
}

/// One pad entry in a bank file.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct Pad {
    /// Grid position, 0 to 15.
    pub id: usize,

    /// Display name.
    pub name: String,

    /// Sample path, absolute or relative to the bank file.
    pub sample: PathBuf,

    /// Trigger key. Defaults from [`DEFAULT_KEYBINDS`] by pad id.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub keybind: Option<char>,

    /// MIDI binding string, e.g. `note:36:ch9`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub midibind: Option<String>,

    /// Linear gain applied when the pad fires.
    #[serde(default = "default_gain")]
    pub gain: f32,
}

fn default_gain() -> f32 {
    1.0
}

impl Bank {
    /// Reads and parses a bank file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Bank, BankError> {
        let contents = fs::read_to_string(path.as_ref())?;
        let bank: Bank = serde_yml::from_str(&contents)?;
        Ok(bank)
    }
}

/// A pad resolved against the sample store.
#[derive(Clone, Debug)]
pub struct PadSlot {
    /// Display name from the bank file.
    pub name: String,
    /// The loaded sample.
    pub sample: SampleId,
    /// Configured gain.
    pub gain: f32,
}

/// The read-only lookup built once at bank load: pad id to sample, key to
/// pad, and the MIDI triggers for the listener. Event handlers only read it.
pub struct PadTable {
    pads: Vec<Option<PadSlot>>,
    keybinds: HashMap<char, usize>,
    midi_triggers: Vec<MidiTrigger>,
}

impl PadTable {
    /// Resolves a bank against the store, loading every pad's sample.
    ///
    /// Pads that cannot be resolved are logged and skipped rather than
    /// failing the whole bank: a bad id, a missing or undecodable sample.
    /// A malformed midibind only loses the MIDI binding, not the pad.
    pub fn build(bank: &Bank, base_dir: &Path, store: &mut SampleStore) -> PadTable {
        let mut table = PadTable {
            pads: vec![None; NUM_PADS],
            keybinds: HashMap::new(),
            midi_triggers: Vec::new(),
        };

        for pad in &bank.pads {
            if pad.id >= NUM_PADS {
                warn!(pad = pad.id, name = pad.name, "Pad id out of range, skipping");
                continue;
            }
            if table.pads[pad.id].is_some() {
                warn!(pad = pad.id, name = pad.name, "Duplicate pad id, skipping");
                continue;
            }

            let path = if pad.sample.is_absolute() {
                pad.sample.clone()
            } else {
                base_dir.join(&pad.sample)
            };

            let buffer = match store.load(&path) {
                Ok(buffer) => buffer,
                Err(e) => {
                    warn!(
                        pad = pad.id,
                        name = pad.name,
                        sample = %path.display(),
                        error = %e,
                        "Failed to load pad sample, skipping"
                    );
                    continue;
                }
            };
            let sample = buffer.id();

            let keybind = pad
                .keybind
                .or_else(|| DEFAULT_KEYBINDS.chars().nth(pad.id));
            if let Some(key) = keybind {
                if let Some(&other) = table.keybinds.get(&key) {
                    warn!(
                        pad = pad.id,
                        other,
                        key = %key,
                        "Keybind already taken, pad has no key"
                    );
                } else {
                    table.keybinds.insert(key, pad.id);
                }
            }

            if let Some(spec) = &pad.midibind {
                match MidiBinding::parse(spec) {
                    Ok(binding) => table.midi_triggers.push(MidiTrigger {
                        binding,
                        sample,
                        gain: pad.gain,
                    }),
                    Err(e) => {
                        warn!(pad = pad.id, midibind = %spec, error = %e, "Invalid midibind");
                    }
                }
            }

            table.pads[pad.id] = Some(PadSlot {
                name: pad.name.clone(),
                sample,
                gain: pad.gain,
            });
        }

        info!(
            bank = bank.name,
            pads = table.active_pads(),
            midi_bindings = table.midi_triggers.len(),
            "Bank loaded"
        );
        table
    }

    /// The pad at a grid position, if one resolved.
    pub fn pad(&self, id: usize) -> Option<&PadSlot> {
        self.pads.get(id).and_then(Option::as_ref)
    }

    /// Resolves a pressed key to the pad it triggers.
    pub fn pad_for_key(&self, key: char) -> Option<&PadSlot> {
        self.keybinds.get(&key).and_then(|&id| self.pad(id))
    }

    /// The triggers for the MIDI listener.
    pub fn midi_triggers(&self) -> &[MidiTrigger] {
        &self.midi_triggers
    }

    /// Number of pads that resolved.
    pub fn active_pads(&self) -> usize {
        self.pads.iter().filter(|p| p.is_some()).count()
    }
}
