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

use std::error::Error;
use std::path::{Path, PathBuf};
use std::thread;
use std::time::Duration;

use clap::{crate_version, Parser, Subcommand};
use crossterm::event::{self, Event, KeyCode, KeyEventKind, KeyModifiers};
use crossterm::terminal;
use tracing::{info, warn};

use sampad::audio::{self, engine::MixingEngine, DEFAULT_BLOCK_FRAMES};
use sampad::bank::{Bank, PadTable};
use sampad::midi::{self, MidiListener};
use sampad::samples::{SampleStore, DEFAULT_CACHE_BYTES};
use sampad::trigger::{trigger_queue, TriggerMessage, TriggerSender, DEFAULT_CAPACITY};

#[derive(Parser)]
#[clap(version = crate_version!(), about = "A low-latency sample pad player.")]
struct Cli {
    #[clap(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Loads a bank and plays pads from the keyboard and MIDI.
    Run {
        /// The path to the bank YAML file.
        bank: PathBuf,
        /// The audio output device to play through. Defaults to the system
        /// default output.
        #[arg(short, long)]
        audio_device: Option<String>,
        /// The MIDI input port, an index or name substring. Overrides the
        /// bank's midi_device.
        #[arg(short, long)]
        midi_device: Option<String>,
        /// The render block size in frames.
        #[arg(short, long, default_value_t = DEFAULT_BLOCK_FRAMES)]
        block_size: u32,
    },
    /// Lists the available audio output devices.
    Devices {},
    /// Lists the available MIDI input ports.
    MidiDevices {},
    /// Prints the binding string for each incoming MIDI event, for pasting
    /// into a bank file.
    MidiLearn {
        /// The MIDI input port, an index or name substring. Defaults to the
        /// first available port.
        #[arg(short, long)]
        midi_device: Option<String>,
    },
}

fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            bank,
            audio_device,
            midi_device,
            block_size,
        } => run(&bank, audio_device, midi_device, block_size)?,
        Commands::Devices {} => {
            let devices = audio::list_devices()?;

            if devices.is_empty() {
                println!("No devices found.");
                return Ok(());
            }

            println!("Devices:");
            for device in devices {
                println!("- {}", device);
            }
        }
        Commands::MidiDevices {} => {
            let ports = midi::list_input_ports()?;

            if ports.is_empty() {
                println!("No MIDI input ports found.");
                return Ok(());
            }

            println!("MIDI input ports:");
            for (i, port) in ports.iter().enumerate() {
                println!("{}: {}", i, port);
            }
        }
        Commands::MidiLearn { midi_device } => midi_learn(midi_device)?,
    }

    Ok(())
}

/// Connects to a MIDI input and prints one binding string per incoming
/// note/cc/pc event until interrupted.
fn midi_learn(midi_device: Option<String>) -> Result<(), Box<dyn Error>> {
    let port = match midi_device {
        Some(selector) => midi::resolve_input_port(&selector)?,
        None => {
            let mut ports = midi::list_input_ports()?;
            if ports.is_empty() {
                return Err("no MIDI input ports available".into());
            }
            ports.remove(0)
        }
    };

    eprintln!("Listening on {} (Ctrl-C to quit)", port.name());
    let _listener = MidiListener::watch_bindings(port, |binding| {
        println!("{}", binding);
    })?;

    loop {
        thread::sleep(Duration::from_secs(1));
    }
}

fn run(
    bank_path: &Path,
    audio_device: Option<String>,
    midi_device: Option<String>,
    block_size: u32,
) -> Result<(), Box<dyn Error>> {
    let bank = Bank::load(bank_path)?;
    let base_dir = bank_path.parent().unwrap_or_else(|| Path::new("."));

    let mut store = SampleStore::new(DEFAULT_CACHE_BYTES);
    let table = PadTable::build(&bank, base_dir, &mut store);

    let (sender, receiver) = trigger_queue(DEFAULT_CAPACITY);
    let engine = MixingEngine::new(receiver, store.sample_table());

    let device = audio::get_device(audio_device.as_deref())?;
    let _stream = device.start(engine, block_size)?;

    // Keep the listener alive for the whole session; dropping disconnects.
    let _listener = connect_midi(&table, &bank, midi_device, sender.clone());

    println!("Bank: {}", bank.name);
    for key in sampad::bank::DEFAULT_KEYBINDS.chars() {
        if let Some(slot) = table.pad_for_key(key) {
            println!("  [{}] {}", key, slot.name);
        }
    }
    println!("Press pads, Esc to quit.");

    key_loop(&table, &sender)?;
    Ok(())
}

/// Connects the MIDI listener when the bank has bindings and a port was
/// requested. MIDI trouble degrades to keyboard-only rather than failing
/// the session.
fn connect_midi(
    table: &PadTable,
    bank: &Bank,
    midi_device: Option<String>,
    sender: TriggerSender,
) -> Option<MidiListener> {
    if table.midi_triggers().is_empty() {
        return None;
    }

    let selector = midi_device.or_else(|| bank.midi_device.clone())?;
    let port = match midi::resolve_input_port(&selector) {
        Ok(port) => port,
        Err(e) => {
            warn!(error = %e, "MIDI unavailable, continuing keyboard-only");
            return None;
        }
    };

    match MidiListener::connect(port, table.midi_triggers().to_vec(), sender) {
        Ok(listener) => Some(listener),
        Err(e) => {
            warn!(error = %e, "MIDI connect failed, continuing keyboard-only");
            None
        }
    }
}

/// Restores the terminal even when the loop errors out.
struct RawModeGuard;

impl RawModeGuard {
    fn enable() -> Result<Self, std::io::Error> {
        terminal::enable_raw_mode()?;
        Ok(RawModeGuard)
    }
}

impl Drop for RawModeGuard {
    fn drop(&mut self) {
        let _ = terminal::disable_raw_mode();
    }
}

fn key_loop(table: &PadTable, sender: &TriggerSender) -> Result<(), Box<dyn Error>> {
    let _guard = RawModeGuard::enable()?;
    let mut reported_dropped = 0u64;

    loop {
        if !event::poll(Duration::from_millis(50))? {
            // Surface queue overflow outside the hot path.
            let dropped = sender.dropped();
            if dropped > reported_dropped {
                warn!(dropped, "Trigger queue overflowed, some pads were lost");
                reported_dropped = dropped;
            }
            continue;
        }

        let Event::Key(key) = event::read()? else {
            continue;
        };
        // Key release events would double-fire pads.
        if key.kind == KeyEventKind::Release {
            continue;
        }

        match key.code {
            KeyCode::Esc => break,
            KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => break,
            KeyCode::Char(c) => {
                if let Some(slot) = table.pad_for_key(c) {
                    sender.push(TriggerMessage::new(slot.sample, slot.gain));
                }
            }
            _ => {}
        }
    }

    info!("Shutting down");
    Ok(())
}
