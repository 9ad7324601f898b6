//! MIDI channel-voice decoding
//!
//! Classifies fixed-size 3-byte MIDI messages into structured events. Decoding
//! is total: anything that is not a recognised channel-voice status comes back
//! as [`DecodedEvent::Unknown`] instead of an error.

use std::fmt;

/// A raw channel-voice message: status byte, data byte 1, data byte 2
pub type RawMessage = [u8; 3];

/// Recognised channel-voice message kinds (status nibbles 0x8-0xE)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum EventKind {
    NoteOff,
    NoteOn,
    PolyKeyPressure,
    ControllerChange,
    ProgramChange,
    ChannelPressure,
    PitchBend,
}

impl EventKind {
    /// Map the high nibble of a status byte to its kind
    pub fn from_status_nibble(nibble: u8) -> Option<Self> {
        match nibble {
            0x8 => Some(EventKind::NoteOff),
            0x9 => Some(EventKind::NoteOn),
            0xA => Some(EventKind::PolyKeyPressure),
            0xB => Some(EventKind::ControllerChange),
            0xC => Some(EventKind::ProgramChange),
            0xD => Some(EventKind::ChannelPressure),
            0xE => Some(EventKind::PitchBend),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            EventKind::NoteOff => "NoteOff",
            EventKind::NoteOn => "NoteOn",
            EventKind::PolyKeyPressure => "PolyKeyPressure",
            EventKind::ControllerChange => "ControllerChange",
            EventKind::ProgramChange => "ProgramChange",
            EventKind::ChannelPressure => "ChannelPressure",
            EventKind::PitchBend => "PitchBend",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Decoded MIDI event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodedEvent {
    /// Note Off: channel (0-15), key (0-127), velocity (0-127)
    NoteOff { channel: u8, key: u8, velocity: u8 },

    /// Note On: channel (0-15), key (0-127), velocity (0-127)
    ///
    /// Velocity 0 stays a Note On; mappings read it as a release.
    NoteOn { channel: u8, key: u8, velocity: u8 },

    /// Polyphonic Key Pressure: channel (0-15), key (0-127), pressure (0-127)
    PolyKeyPressure { channel: u8, key: u8, pressure: u8 },

    /// Control Change: channel (0-15), controller (0-127), value (0-127)
    ControllerChange { channel: u8, controller: u8, value: u8 },

    /// Program Change: channel (0-15), preset (0-127)
    ProgramChange { channel: u8, preset: u8 },

    /// Channel Pressure: channel (0-15), pressure (0-127)
    ChannelPressure { channel: u8, pressure: u8 },

    /// Pitch Bend: channel (0-15), pitch (0-16383, LSB first on the wire)
    PitchBend { channel: u8, pitch: u16 },

    /// Status nibble outside 0x8-0xE, raw bytes kept as received
    Unknown { bytes: RawMessage },
}

/// Decode a 3-byte MIDI message
///
/// Every 7-bit field is masked with `0x7F` and the channel with `0x0F`, so
/// stray high bits in the input never leak into the event.
pub fn decode(bytes: RawMessage) -> DecodedEvent {
    let [status, data1, data2] = bytes;
    let channel = status & 0x0F;
    let d1 = data1 & 0x7F;
    let d2 = data2 & 0x7F;

    let Some(kind) = EventKind::from_status_nibble((status >> 4) & 0x0F) else {
        return DecodedEvent::Unknown { bytes };
    };

    match kind {
        EventKind::NoteOff => DecodedEvent::NoteOff { channel, key: d1, velocity: d2 },
        EventKind::NoteOn => DecodedEvent::NoteOn { channel, key: d1, velocity: d2 },
        EventKind::PolyKeyPressure => DecodedEvent::PolyKeyPressure { channel, key: d1, pressure: d2 },
        EventKind::ControllerChange => DecodedEvent::ControllerChange { channel, controller: d1, value: d2 },
        EventKind::ProgramChange => DecodedEvent::ProgramChange { channel, preset: d1 },
        EventKind::ChannelPressure => DecodedEvent::ChannelPressure { channel, pressure: d1 },
        EventKind::PitchBend => DecodedEvent::PitchBend {
            channel,
            pitch: ((d2 as u16) << 7) | d1 as u16,
        },
    }
}

impl DecodedEvent {
    /// Message kind, `None` for unknown status bytes
    pub fn kind(&self) -> Option<EventKind> {
        match self {
            DecodedEvent::NoteOff { .. } => Some(EventKind::NoteOff),
            DecodedEvent::NoteOn { .. } => Some(EventKind::NoteOn),
            DecodedEvent::PolyKeyPressure { .. } => Some(EventKind::PolyKeyPressure),
            DecodedEvent::ControllerChange { .. } => Some(EventKind::ControllerChange),
            DecodedEvent::ProgramChange { .. } => Some(EventKind::ProgramChange),
            DecodedEvent::ChannelPressure { .. } => Some(EventKind::ChannelPressure),
            DecodedEvent::PitchBend { .. } => Some(EventKind::PitchBend),
            DecodedEvent::Unknown { .. } => None,
        }
    }

    /// Channel (0-15), `None` for unknown status bytes
    pub fn channel(&self) -> Option<u8> {
        match *self {
            DecodedEvent::NoteOff { channel, .. }
            | DecodedEvent::NoteOn { channel, .. }
            | DecodedEvent::PolyKeyPressure { channel, .. }
            | DecodedEvent::ControllerChange { channel, .. }
            | DecodedEvent::ProgramChange { channel, .. }
            | DecodedEvent::ChannelPressure { channel, .. }
            | DecodedEvent::PitchBend { channel, .. } => Some(channel),
            DecodedEvent::Unknown { .. } => None,
        }
    }

    /// `(controller, value)` for Control Change events
    pub fn controller(&self) -> Option<(u8, u8)> {
        match *self {
            DecodedEvent::ControllerChange { controller, value, .. } => Some((controller, value)),
            _ => None,
        }
    }

    /// `(key, velocity)` for note events
    ///
    /// Poly pressure carries a key but no velocity; its pressure stands in.
    pub fn key(&self) -> Option<(u8, u8)> {
        match *self {
            DecodedEvent::NoteOff { key, velocity, .. }
            | DecodedEvent::NoteOn { key, velocity, .. } => Some((key, velocity)),
            DecodedEvent::PolyKeyPressure { key, pressure, .. } => Some((key, pressure)),
            _ => None,
        }
    }
}

impl fmt::Display for DecodedEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            DecodedEvent::NoteOff { channel, key, velocity } => {
                write!(f, "NoteOff ch:{} key:{} vel:{}", channel, key, velocity)
            }
            DecodedEvent::NoteOn { channel, key, velocity } => {
                write!(f, "NoteOn ch:{} key:{} vel:{}", channel, key, velocity)
            }
            DecodedEvent::PolyKeyPressure { channel, key, pressure } => {
                write!(f, "PolyKeyPressure ch:{} key:{} p:{}", channel, key, pressure)
            }
            DecodedEvent::ControllerChange { channel, controller, value } => {
                write!(f, "CC ch:{} cc:{} v:{}", channel, controller, value)
            }
            DecodedEvent::ProgramChange { channel, preset } => {
                write!(f, "ProgramChange ch:{} preset:{}", channel, preset)
            }
            DecodedEvent::ChannelPressure { channel, pressure } => {
                write!(f, "ChannelPressure ch:{} p:{}", channel, pressure)
            }
            DecodedEvent::PitchBend { channel, pitch } => {
                write!(f, "PitchBend ch:{} pitch:{}", channel, pitch)
            }
            DecodedEvent::Unknown { bytes } => write!(f, "Unknown [{}]", format_hex(&bytes)),
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

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_note_on_parsing() {
        let msg = decode([0x91, 12, 100]);

        assert_eq!(msg, DecodedEvent::NoteOn {
            channel: 1,
            key: 12,
            velocity: 100,
        });
        assert_eq!(msg.key(), Some((12, 100)));
        assert_eq!(msg.controller(), None);
    }

    #[test]
    fn test_note_on_velocity_zero_stays_note_on() {
        let msg = decode([0x90, 60, 0]);

        assert_eq!(msg.kind(), Some(EventKind::NoteOn));
    }

    #[test]
    fn test_control_change() {
        let msg = decode([0xB2, 7, 100]);

        assert_eq!(msg, DecodedEvent::ControllerChange {
            channel: 2,
            controller: 7,
            value: 100,
        });
        assert_eq!(msg.controller(), Some((7, 100)));
        assert_eq!(msg.key(), None);
    }

    #[test]
    fn test_two_byte_kinds_ignore_second_data_byte() {
        assert_eq!(decode([0xC3, 5, 0x7F]), DecodedEvent::ProgramChange { channel: 3, preset: 5 });
        assert_eq!(decode([0xD4, 90, 0x7F]), DecodedEvent::ChannelPressure { channel: 4, pressure: 90 });
    }

    #[test]
    fn test_pitch_bend_lsb_first() {
        assert_eq!(decode([0xE0, 0x00, 0x40]), DecodedEvent::PitchBend { channel: 0, pitch: 8192 });
        assert_eq!(decode([0xE0, 0, 0]), DecodedEvent::PitchBend { channel: 0, pitch: 0 });
        assert_eq!(decode([0xE0, 127, 127]), DecodedEvent::PitchBend { channel: 0, pitch: 16383 });
        assert_eq!(decode([0xE0, 0x01, 0x00]), DecodedEvent::PitchBend { channel: 0, pitch: 1 });
    }

    #[test]
    fn test_stray_high_bits_are_masked() {
        assert_eq!(decode([0xB5, 0xA1, 0xFF]), DecodedEvent::ControllerChange {
            channel: 5,
            controller: 0x21,
            value: 0x7F,
        });
    }

    #[test]
    fn test_system_and_data_status_are_unknown() {
        for bytes in [[0xF8, 0, 0], [0xF0, 1, 2], [0x7F, 3, 4], [0x00, 0, 0]] {
            assert_eq!(decode(bytes), DecodedEvent::Unknown { bytes });
            assert_eq!(decode(bytes).channel(), None);
        }
    }

    #[test]
    fn test_display() {
        assert_eq!(decode([0xB0, 32, 20]).to_string(), "CC ch:0 cc:32 v:20");
        assert_eq!(decode([0xF8, 0, 0]).to_string(), "Unknown [F8 00 00]");
    }

    proptest! {
        #[test]
        fn prop_decode_is_total_and_masked(status in any::<u8>(), data1 in any::<u8>(), data2 in any::<u8>()) {
            let event = decode([status, data1, data2]);
            let nibble = status >> 4;

            if (0x8..=0xE).contains(&nibble) {
                prop_assert_eq!(event.channel(), Some(status & 0x0F));
            } else {
                prop_assert_eq!(event, DecodedEvent::Unknown { bytes: [status, data1, data2] });
            }

            match event {
                DecodedEvent::NoteOff { key, velocity, .. } | DecodedEvent::NoteOn { key, velocity, .. } => {
                    prop_assert!(key <= 127 && velocity <= 127);
                }
                DecodedEvent::PolyKeyPressure { key, pressure, .. } => {
                    prop_assert!(key <= 127 && pressure <= 127);
                }
                DecodedEvent::ControllerChange { controller, value, .. } => {
                    prop_assert!(controller <= 127 && value <= 127);
                }
                DecodedEvent::ProgramChange { preset, .. } => prop_assert!(preset <= 127),
                DecodedEvent::ChannelPressure { pressure, .. } => prop_assert!(pressure <= 127),
                DecodedEvent::PitchBend { pitch, .. } => prop_assert!(pitch <= 16383),
                DecodedEvent::Unknown { .. } => {}
            }
            if let Some(channel) = event.channel() {
                prop_assert!(channel <= 15);
            }
        }

        #[test]
        fn prop_pitch_bend_composition(lsb in 0u8..=127, msb in 0u8..=127) {
            let event = decode([0xE0, lsb, msb]);
            prop_assert_eq!(event, DecodedEvent::PitchBend {
                channel: 0,
                pitch: ((msb as u16) << 7) | lsb as u16,
            });
        }
    }
}
