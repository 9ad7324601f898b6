//! Error types for the device adapters and configuration
//!
//! The decoding and mapping core is infallible; only the code that touches
//! MIDI ports, the virtual gamepad driver or the filesystem returns these.

use thiserror::Error;

/// MIDI input port failures
#[derive(Debug, Error)]
pub enum PortError {
    /// The MIDI backend could not be initialised
    #[error("failed to initialise MIDI input: {0}")]
    Init(#[from] midir::InitError),

    /// No port matched the selector
    #[error("MIDI input port {0} not found")]
    NotFound(String),

    /// The system reports no input ports at all
    #[error("no MIDI input ports available")]
    NoPorts,

    /// The port exists but could not be opened
    #[error("failed to connect to MIDI input port '{port}': {reason}")]
    Connect { port: String, reason: String },
}

/// Virtual gamepad failures
#[derive(Debug, Error)]
pub enum GamepadError {
    /// The requested backend does not exist on this platform
    #[error("gamepad backend '{0}' is not supported on this platform")]
    Unsupported(&'static str),

    /// `update` called before `connect`
    #[error("virtual gamepad is not connected")]
    NotConnected,

    /// uinput / device node failure
    #[error("virtual gamepad I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Error reported by the gamepad bus driver
    #[error("virtual gamepad driver error: {0}")]
    Driver(String),
}

/// Configuration file failures
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file '{path}': {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse YAML config '{path}': {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_yaml::Error,
    },
}
