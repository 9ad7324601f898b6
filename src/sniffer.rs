//! Passive MIDI monitor (`debug` command)
//!
//! Decodes and prints every message from the selected port without touching
//! the virtual gamepad.

use anyhow::{Context, Result};
use colored::*;
use tracing::info;

use crate::input::{list_input_ports, InputPort, PortSelector, RawEvent};
use crate::midi::{decode, format_hex, DecodedEvent, EventKind};

/// Format a message for sniffer output
///
/// With `paint` set, fields are coloured by message type for the terminal.
pub fn format_line(port: &str, event: &RawEvent, paint: bool) -> String {
    let decoded = event.message().map(decode);
    let timestamp = format!("{:>12}", event.timestamp_us);
    let port = shorten(port);
    let hex = format_hex(&event.bytes);
    let parsed = decoded.as_ref().map(DecodedEvent::to_string);

    if !paint {
        return layout(&timestamp, &port, &hex, parsed.as_deref());
    }

    // Color code by message type
    let hex_colored = match decoded.as_ref().and_then(DecodedEvent::kind) {
        Some(EventKind::NoteOn) => hex.bright_green(),
        Some(EventKind::NoteOff) => hex.bright_red(),
        Some(EventKind::ControllerChange) => hex.bright_yellow(),
        Some(EventKind::PitchBend) => hex.bright_cyan(),
        Some(_) => hex.normal(),
        None => hex.bright_black(),
    };

    layout(
        &timestamp.dimmed().to_string(),
        &port.white().to_string(),
        &hex_colored.to_string(),
        parsed.map(|p| p.bright_blue().to_string()).as_deref(),
    )
}

fn layout(timestamp: &str, port: &str, hex: &str, decoded: Option<&str>) -> String {
    match decoded {
        Some(decoded) => format!("[{}us] {} | {} => {}", timestamp, port, hex, decoded),
        None => format!("[{}us] {} | {}", timestamp, port, hex),
    }
}

fn shorten(port: &str) -> String {
    if port.chars().count() > 20 {
        format!("{}...", port.chars().take(17).collect::<String>())
    } else {
        port.to_string()
    }
}

fn print_event(port: &str, event: &RawEvent) {
    println!("{}", format_line(port, event, true));
}

/// Print decoded traffic from one port until Ctrl+C
pub async fn run_debug(selector: &PortSelector) -> Result<()> {
    println!("{}", "=== MIDI Monitor ===".bold().cyan());
    println!("Press Ctrl+C to exit\n");

    let (mut port, mut events) = InputPort::open(selector)
        .with_context(|| format!("Failed to open MIDI input {}", selector))?;

    println!("{}", "Format: [timestamp] PORT | HEX => DECODED".dimmed());
    println!("{}\n", "─".repeat(80).dimmed());

    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            event = events.recv() => match event {
                Some(event) => print_event(port.name(), &event),
                None => break,
            },
            _ = &mut shutdown => {
                info!("Shutdown signal received");
                break;
            }
        }
    }

    port.close();
    println!("\n{}", "Monitor stopped".yellow());
    Ok(())
}

/// List input ports in a formatted way
pub fn list_ports_formatted() -> Result<()> {
    let ports = list_input_ports().context("Failed to enumerate MIDI input ports")?;

    println!("\n{}", "=== Available MIDI Input Ports ===".bold().cyan());
    println!("Found {} midi controller(s)", ports.len().to_string().green());

    if ports.is_empty() {
        println!("  {}", "No input ports found".dimmed());
    }
    for port in ports {
        println!("  {} {}", format!("[{}]", port.index).yellow(), port.name);
    }

    println!();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_line_decodes_channel_voice() {
        let event = RawEvent { timestamp_us: 1500, bytes: vec![0x91, 12, 100] };

        assert_eq!(
            format_line("BeatStep", &event, false),
            "[        1500us] BeatStep | 91 0C 64 => NoteOn ch:1 key:12 vel:100"
        );
    }

    #[test]
    fn test_format_line_unknown_and_empty() {
        let clock = RawEvent { timestamp_us: 0, bytes: vec![0xF8] };
        assert!(format_line("p", &clock, false).ends_with("F8 => Unknown [F8 00 00]"));

        let empty = RawEvent { timestamp_us: 0, bytes: vec![] };
        assert!(format_line("p", &empty, false).ends_with("| "));
    }

    #[test]
    fn test_painted_line_keeps_layout() {
        let event = RawEvent { timestamp_us: 7, bytes: vec![0xB0, 32, 20] };
        let line = format_line("Arturia BeatStep MIDI 1", &event, true);

        assert!(line.starts_with('['));
        assert!(line.contains("Arturia BeatStep ..."));
        assert!(line.contains("B0 20 14"));
        assert!(line.contains(" => "));
        assert!(line.contains("CC ch:0 cc:32 v:20"));
    }

    #[test]
    fn test_long_port_names_are_shortened() {
        assert_eq!(shorten("Arturia BeatStep MIDI 1"), "Arturia BeatStep ...");
        assert_eq!(shorten("short"), "short");
    }
}
