//! Event dispatch
//!
//! Routes decoded MIDI events through the [`MappingTable`] onto the
//! controller state. The dispatcher owns the controller state and the pair
//! aggregator for the lifetime of a session; events must be fed in arrival
//! order from a single consumer.

use tracing::debug;

use crate::aggregator::ValueAggregator;
use crate::gamepad::GamepadState;
use crate::mapping::MappingTable;
use crate::midi::{decode, DecodedEvent, RawMessage};

/// What a single event triggered
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchReport {
    /// Actions matched through the controller number
    pub controller_actions: usize,
    /// Actions matched through the key number
    pub key_actions: usize,
}

impl DispatchReport {
    pub fn fired(&self) -> usize {
        self.controller_actions + self.key_actions
    }
}

pub struct Dispatcher {
    table: MappingTable,
    aggregator: ValueAggregator,
    pad: GamepadState,
}

impl Dispatcher {
    pub fn new(table: MappingTable, aggregator: ValueAggregator) -> Self {
        Self {
            table,
            aggregator,
            pad: GamepadState::new(),
        }
    }

    /// Dispatcher over the compiled-in mapping with an empty aggregator
    pub fn with_default_mapping() -> Self {
        Self::new(MappingTable::default(), ValueAggregator::new())
    }

    /// Apply every action matching the event
    ///
    /// The controller number and the key number are looked up independently,
    /// so an event carrying both would fire both. Unmapped and unknown events
    /// are ignored.
    pub fn on_event(&mut self, event: &DecodedEvent) -> DispatchReport {
        let mut report = DispatchReport::default();
        let (Some(kind), Some(channel)) = (event.kind(), event.channel()) else {
            return report;
        };

        if let Some((controller, value)) = event.controller() {
            for action in self.table.lookup(kind, channel, controller) {
                action.apply(value, &mut self.pad, &mut self.aggregator);
                report.controller_actions += 1;
            }
        }

        if let Some((key, velocity)) = event.key() {
            for action in self.table.lookup(kind, channel, key) {
                action.apply(velocity, &mut self.pad, &mut self.aggregator);
                report.key_actions += 1;
            }
        }

        if report.fired() > 0 {
            debug!("{} -> {} action(s)", event, report.fired());
        }
        report
    }

    /// Decode and dispatch a raw message
    pub fn on_raw(&mut self, bytes: RawMessage) -> (DecodedEvent, DispatchReport) {
        let event = decode(bytes);
        let report = self.on_event(&event);
        (event, report)
    }

    pub fn pad(&self) -> &GamepadState {
        &self.pad
    }

    pub fn pad_mut(&mut self) -> &mut GamepadState {
        &mut self.pad
    }

    pub fn aggregator(&self) -> &ValueAggregator {
        &self.aggregator
    }
}

impl Default for Dispatcher {
    fn default() -> Self {
        Self::with_default_mapping()
    }
}
