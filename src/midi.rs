//! MIDI message parsing
//!
//! Only the channel voice messages the letter pipeline cares about are
//! decoded; everything else is reported as [`MidiMessage::Other`].

/// MIDI message types
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MidiMessage {
    /// Note Off: channel (0-15), note (0-127), velocity (0-127)
    NoteOff { channel: u8, note: u8, velocity: u8 },

    /// Note On: channel (0-15), note (0-127), velocity (1-127)
    NoteOn { channel: u8, note: u8, velocity: u8 },

    /// Any other well-formed message, identified by its status byte
    Other { status: u8 },
}

impl MidiMessage {
    /// Parse a MIDI message from raw bytes
    pub fn parse(data: &[u8]) -> Option<Self> {
        let (&status, rest) = data.split_first()?;

        // Running status is not tracked
        if status < 0x80 {
            return None;
        }

        let channel = status & 0x0F;
        let data_byte = |i: usize| rest.get(i).map(|b| b & 0x7F);

        match status & 0xF0 {
            0x80 => Some(MidiMessage::NoteOff {
                channel,
                note: data_byte(0)?,
                velocity: data_byte(1)?,
            }),
            0x90 => {
                let note = data_byte(0)?;
                let velocity = data_byte(1)?;

                // Note On with velocity 0 = Note Off
                if velocity == 0 {
                    Some(MidiMessage::NoteOff { channel, note, velocity: 0 })
                } else {
                    Some(MidiMessage::NoteOn { channel, note, velocity })
                }
            }
            _ => Some(MidiMessage::Other { status }),
        }
    }
}

/// Format MIDI bytes as hex string for debugging
pub fn format_hex(data: &[u8]) -> String {
    data.iter()
        .map(|b| format!("{:02X}", b))
        .collect::<Vec<_>>()
        .join(" ")
}
