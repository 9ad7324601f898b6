//! midi-pad - drive a virtual Xbox 360 controller from a MIDI control surface
//!
//! Incoming channel-voice messages are decoded ([`midi`]), matched against a
//! compiled-in rule table ([`mapping`]) and applied to controller state by the
//! [`dispatcher`], with 14-bit controller pairs reassembled by the
//! [`aggregator`]. [`input`] and [`gamepad`] adapt the physical MIDI port and
//! the virtual controller driver.

pub mod aggregator;
pub mod config;
pub mod dispatcher;
pub mod error;
pub mod gamepad;
pub mod input;
pub mod mapping;
pub mod midi;
pub mod session;
pub mod sniffer;

pub use dispatcher::{DispatchReport, Dispatcher};
pub use midi::{decode, DecodedEvent, EventKind, RawMessage};
