//! MIDI input source
//!
//! Lists input ports and forwards Note On events from one port into a
//! channel. The midir callback runs on the driver's own thread; it only
//! parses and forwards, so note processing stays on a single consumer.

use anyhow::{bail, Context, Result};
use colored::*;
use midir::{MidiInput, MidiInputConnection};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::midi::{format_hex, MidiMessage};

const CLIENT_NAME: &str = "MIDI-Letters";

/// Note On received from the device
#[derive(Debug, Clone)]
pub struct NoteOnEvent {
    pub note: u8,
    pub velocity: u8,
    /// Driver timestamp in microseconds
    pub timestamp_us: u64,
}

/// Information about a MIDI input port
#[derive(Debug, Clone)]
pub struct PortInfo {
    pub index: usize,
    pub name: String,
}

/// Discover input ports in driver order
pub fn discover_input_ports() -> Result<Vec<PortInfo>> {
    let midi_in = MidiInput::new(CLIENT_NAME).context("Failed to create MIDI input")?;

    let ports = midi_in
        .ports()
        .iter()
        .enumerate()
        .map(|(index, port)| PortInfo {
            index,
            name: midi_in
                .port_name(port)
                .unwrap_or_else(|_| "<unknown>".to_string()),
        })
        .collect();

    Ok(ports)
}

/// Print the input port list the way it appears at startup
pub fn print_ports(ports: &[PortInfo]) {
    println!("{}", "Available MIDI Input Devices:".bold());
    if ports.is_empty() {
        println!("  {}", "(none)".dimmed());
    }
    for port in ports {
        println!("  [{}] {}", port.index.to_string().yellow(), port.name);
    }
    println!();
}

/// Check a configured device index against the discovered ports
pub fn select_port(ports: &[PortInfo], index: i64) -> Result<&PortInfo> {
    let Some(port) = usize::try_from(index).ok().and_then(|i| ports.get(i)) else {
        bail!(
            "MidiDeviceIndex {} is invalid ({} input device(s) available)",
            index,
            ports.len()
        );
    };
    Ok(port)
}

/// Open connection delivering Note On events
pub struct NoteSource {
    _conn: MidiInputConnection<()>,
    rx: mpsc::Receiver<NoteOnEvent>,
    port_name: String,
}

impl NoteSource {
    /// Connect to the input port at `index`
    pub fn connect(index: usize) -> Result<Self> {
        let (tx, rx) = mpsc::channel(1000);

        let midi_in = MidiInput::new(CLIENT_NAME).context("Failed to create MIDI input")?;
        let ports = midi_in.ports();
        let port = ports
            .get(index)
            .with_context(|| format!("Input port {} disappeared", index))?;
        let port_name = midi_in
            .port_name(port)
            .unwrap_or_else(|_| format!("port {}", index));

        info!("Connecting to input port: {}", port_name);

        let conn = midi_in
            .connect(
                port,
                "MIDI-Letters-In",
                move |timestamp_us, data, _| match MidiMessage::parse(data) {
                    Some(MidiMessage::NoteOn { note, velocity, .. }) => {
                        let event = NoteOnEvent {
                            note,
                            velocity,
                            timestamp_us,
                        };
                        // Never block the driver thread
                        if let Err(e) = tx.try_send(event) {
                            warn!("Dropping note, event queue unavailable: {}", e);
                        }
                    }
                    Some(_) => {}
                    None => debug!("Failed to parse MIDI: {}", format_hex(data)),
                },
                (),
            )
            .map_err(|e| anyhow::anyhow!("Failed to connect to input port: {}", e))?;

        Ok(Self {
            _conn: conn,
            rx,
            port_name,
        })
    }

    pub fn port_name(&self) -> &str {
        &self.port_name
    }

    /// Note On events in arrival order. Closes when the connection is gone.
    pub fn events(&mut self) -> &mut mpsc::Receiver<NoteOnEvent> {
        &mut self.rx
    }
}
