//! MIDI input port adapter
//!
//! Opens a physical input with midir and forwards each incoming message into
//! a tokio channel, so the consumer can await the next event instead of
//! running inside the midir callback thread.

use midir::{MidiInput, MidiInputConnection};
use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::error::PortError;
use crate::midi::{format_hex, RawMessage};

/// Capacity of the callback → consumer channel
const EVENT_QUEUE: usize = 1000;

const CLIENT_NAME: &str = "midi-pad";

/// Which input port to open
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PortSelector {
    /// Position in the system port list
    Index(usize),
    /// Case-insensitive substring of the port name
    Name(String),
}

impl PortSelector {
    /// Index of the first port this selector picks
    pub fn resolve(&self, names: &[String]) -> Option<usize> {
        match self {
            PortSelector::Index(index) => (*index < names.len()).then_some(*index),
            PortSelector::Name(pattern) => {
                let pattern = pattern.to_lowercase();
                names
                    .iter()
                    .position(|name| name.to_lowercase().contains(&pattern))
            }
        }
    }
}

impl FromStr for PortSelector {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        Ok(match s.parse::<usize>() {
            Ok(index) => PortSelector::Index(index),
            Err(_) => PortSelector::Name(s.to_string()),
        })
    }
}

impl Default for PortSelector {
    fn default() -> Self {
        PortSelector::Index(0)
    }
}

impl fmt::Display for PortSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PortSelector::Index(index) => write!(f, "#{}", index),
            PortSelector::Name(name) => write!(f, "'{}'", name),
        }
    }
}

/// An input port as listed by the system
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortInfo {
    pub index: usize,
    pub name: String,
}

/// A message as delivered by the port
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawEvent {
    /// Backend timestamp in microseconds
    pub timestamp_us: u64,
    pub bytes: Vec<u8>,
}

impl RawEvent {
    /// The first three bytes, zero-padded when shorter
    ///
    /// One- and two-byte system messages therefore decode as unknown.
    pub fn message(&self) -> Option<RawMessage> {
        if self.bytes.is_empty() {
            return None;
        }
        let mut message = [0u8; 3];
        for (slot, byte) in message.iter_mut().zip(&self.bytes) {
            *slot = *byte;
        }
        Some(message)
    }
}

fn port_names(midi_in: &MidiInput) -> Vec<String> {
    midi_in
        .ports()
        .iter()
        .map(|port| midi_in.port_name(port).unwrap_or_else(|_| "<unknown>".to_string()))
        .collect()
}

/// List available MIDI input ports
pub fn list_input_ports() -> Result<Vec<PortInfo>, PortError> {
    let midi_in = MidiInput::new(CLIENT_NAME)?;
    Ok(port_names(&midi_in)
        .into_iter()
        .enumerate()
        .map(|(index, name)| PortInfo { index, name })
        .collect())
}

/// Open MIDI input connection
pub struct InputPort {
    name: String,
    connection: Option<MidiInputConnection<()>>,
}

impl InputPort {
    /// Open the selected port and start forwarding its messages
    pub fn open(selector: &PortSelector) -> Result<(Self, mpsc::Receiver<RawEvent>), PortError> {
        let midi_in = MidiInput::new(CLIENT_NAME)?;
        let names = port_names(&midi_in);
        info!("Found {} MIDI input port(s)", names.len());

        if names.is_empty() {
            return Err(PortError::NoPorts);
        }

        let index = selector
            .resolve(&names)
            .ok_or_else(|| PortError::NotFound(selector.to_string()))?;
        let name = names[index].clone();
        let port = midi_in
            .ports()
            .into_iter()
            .nth(index)
            .ok_or_else(|| PortError::NotFound(selector.to_string()))?;

        info!("Using MIDI input port {}: {}", index, name);

        let (event_tx, event_rx) = mpsc::channel(EVENT_QUEUE);

        let connection = midi_in
            .connect(
                &port,
                "midi-pad-input",
                move |timestamp_us, data, _| {
                    let event = RawEvent {
                        timestamp_us,
                        bytes: data.to_vec(),
                    };
                    // Never block the backend thread
                    if let Err(e) = event_tx.try_send(event) {
                        warn!("Dropping MIDI message {}: {}", format_hex(data), e);
                    }
                },
                (),
            )
            .map_err(|e| PortError::Connect {
                port: name.clone(),
                reason: e.to_string(),
            })?;

        Ok((
            Self {
                name,
                connection: Some(connection),
            },
            event_rx,
        ))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Close the connection; the event channel ends afterwards
    pub fn close(&mut self) {
        if let Some(connection) = self.connection.take() {
            connection.close();
            debug!("Closed MIDI input port: {}", self.name);
        }
    }
}

impl Drop for InputPort {
    fn drop(&mut self) {
        self.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names() -> Vec<String> {
        vec![
            "Midi Through Port-0".to_string(),
            "Arturia BeatStep:Arturia BeatStep MIDI 1".to_string(),
        ]
    }

    #[test]
    fn test_selector_parsing() {
        assert_eq!("1".parse::<PortSelector>().unwrap(), PortSelector::Index(1));
        assert_eq!(" 0 ".parse::<PortSelector>().unwrap(), PortSelector::Index(0));
        assert_eq!(
            "beatstep".parse::<PortSelector>().unwrap(),
            PortSelector::Name("beatstep".to_string())
        );
    }

    #[test]
    fn test_resolve_by_index() {
        assert_eq!(PortSelector::Index(1).resolve(&names()), Some(1));
        assert_eq!(PortSelector::Index(2).resolve(&names()), None);
    }

    #[test]
    fn test_resolve_by_name_is_case_insensitive() {
        assert_eq!(PortSelector::Name("BEATSTEP".to_string()).resolve(&names()), Some(1));
        assert_eq!(PortSelector::Name("launchpad".to_string()).resolve(&names()), None);
    }

    #[test]
    fn test_raw_event_message_padding() {
        let short = RawEvent { timestamp_us: 0, bytes: vec![0xC0, 5] };
        assert_eq!(short.message(), Some([0xC0, 5, 0]));

        let long = RawEvent { timestamp_us: 0, bytes: vec![0xF0, 1, 2, 3, 0xF7] };
        assert_eq!(long.message(), Some([0xF0, 1, 2]));

        let empty = RawEvent { timestamp_us: 0, bytes: vec![] };
        assert_eq!(empty.message(), None);
    }
}
