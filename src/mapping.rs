//! Compiled-in MIDI to gamepad mapping
//!
//! The table is plain data: an ordered list of [`Rule`]s, each binding a
//! (kind, channel, number) triple to an [`Action`]. `number` is matched
//! against the controller of a Control Change and against the key of a note
//! event. Behaviour lives in [`Action::apply`], not in the table.

use std::collections::HashMap;
use std::f32::consts::FRAC_PI_2;
use std::fmt;
use tracing::trace;

use crate::aggregator::{PairKey, ValueAggregator};
use crate::gamepad::{Axis, Button, GamepadState};
use crate::midi::EventKind;

/// Values strictly above this count as pressed / positive
pub const MIDPOINT: u8 = 64;

/// Increment applied by relative (endless encoder) controllers
pub const NUDGE_STEP: f32 = 0.01;

/// What a matching event does to the controller
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Action {
    /// Press while the value is above the midpoint, release otherwise
    Button(Button),

    /// Move an axis by `+step` above the midpoint, `-step` otherwise
    Nudge { axis: Axis, step: f32 },

    /// Remember the MSB of a 14-bit pair
    RecordMsb(PairKey),

    /// Compose the pair and write it to one axis
    PairAxis { pair: PairKey, axis: Axis },

    /// Compose the pair and split its sign across two triggers:
    /// positive values go to `positive`, the magnitude of negative ones to `negative`
    PairSplit { pair: PairKey, positive: Axis, negative: Axis },

    /// Compose the pair as an angle in [-π/2, π/2) and write its sine and cosine
    ///
    /// A composite of exactly 0 zeroes both axes instead of producing (0, 1).
    PairPolar { pair: PairKey, sin_axis: Axis, cos_axis: Axis },
}

impl Action {
    /// Apply to the controller with the raw 7-bit value of the event
    pub fn apply(&self, value: u8, pad: &mut GamepadState, aggregator: &mut ValueAggregator) {
        match *self {
            Action::Button(button) => {
                pad.set_button(button, value > MIDPOINT);
            }
            Action::Nudge { axis, step } => {
                let delta = if value > MIDPOINT { step } else { -step };
                pad.set_axis(axis, pad.axis(axis) + delta);
            }
            Action::RecordMsb(pair) => {
                aggregator.record(pair, value);
            }
            Action::PairAxis { pair, axis } => {
                pad.set_axis(axis, aggregator.compose(pair, value));
            }
            Action::PairSplit { pair, positive, negative } => {
                let composed = aggregator.compose(pair, value);
                if composed >= 0.0 {
                    pad.set_axis(positive, composed);
                    pad.set_axis(negative, 0.0);
                } else {
                    pad.set_axis(positive, 0.0);
                    pad.set_axis(negative, -composed);
                }
            }
            Action::PairPolar { pair, sin_axis, cos_axis } => {
                let composed = aggregator.compose(pair, value);
                let (sin, cos) = polar(composed);
                pad.set_axis(sin_axis, sin);
                pad.set_axis(cos_axis, cos);
            }
        }
        trace!("applied {} with value {}", self, value);
    }
}

/// `(sin, cos)` of `scalar * π/2`, with 0 mapping to (0, 0)
pub fn polar(scalar: f32) -> (f32, f32) {
    if scalar == 0.0 {
        return (0.0, 0.0);
    }
    let angle = scalar * FRAC_PI_2;
    (angle.sin(), angle.cos())
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Action::Button(button) => write!(f, "button {}", button),
            Action::Nudge { axis, step } => write!(f, "nudge {} ±{}", axis, step),
            Action::RecordMsb(pair) => write!(f, "record MSB [{}]", pair),
            Action::PairAxis { pair, axis } => write!(f, "[{}] -> {}", pair, axis),
            Action::PairSplit { pair, positive, negative } => {
                write!(f, "[{}] -> +{} / -{}", pair, positive, negative)
            }
            Action::PairPolar { pair, sin_axis, cos_axis } => {
                write!(f, "[{}] -> sin {} / cos {}", pair, sin_axis, cos_axis)
            }
        }
    }
}

/// One table entry
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rule {
    pub kind: EventKind,
    pub channel: u8,
    /// Controller number for Control Change, key number for note events
    pub number: u8,
    pub action: Action,
}

impl Rule {
    pub const fn new(kind: EventKind, channel: u8, number: u8, action: Action) -> Self {
        Self { kind, channel, number, action }
    }

    pub const fn cc(channel: u8, controller: u8, action: Action) -> Self {
        Self::new(EventKind::ControllerChange, channel, controller, action)
    }

    pub const fn note_on(channel: u8, key: u8, button: Button) -> Self {
        Self::new(EventKind::NoteOn, channel, key, Action::Button(button))
    }
}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ch:{} #{} => {}", self.kind, self.channel, self.number, self.action)
    }
}

const fn pair(channel: u8, msb: u8) -> PairKey {
    PairKey::new(channel, msb)
}

/// Mapping for the supported control surface
///
/// Channel acts as a mode selector: the same key on channels 0, 1 and 4
/// drives different buttons.
pub const DEFAULT_RULES: &[Rule] = &[
    // Endless encoders on channel 1, both steering the left stick X
    Rule::cc(1, 33, Action::Nudge { axis: Axis::LeftX, step: NUDGE_STEP }),
    Rule::cc(1, 34, Action::Nudge { axis: Axis::LeftX, step: NUDGE_STEP }),
    // 14-bit pairs on channel 0
    Rule::cc(0, 0, Action::RecordMsb(pair(0, 0))),
    Rule::cc(0, 32, Action::PairSplit {
        pair: pair(0, 0),
        positive: Axis::RightTrigger,
        negative: Axis::LeftTrigger,
    }),
    Rule::cc(0, 19, Action::RecordMsb(pair(0, 19))),
    Rule::cc(0, 51, Action::PairAxis { pair: pair(0, 19), axis: Axis::LeftY }),
    // 14-bit pairs on channel 6
    Rule::cc(6, 31, Action::RecordMsb(pair(6, 31))),
    Rule::cc(6, 63, Action::PairAxis { pair: pair(6, 31), axis: Axis::LeftX }),
    Rule::cc(6, 24, Action::RecordMsb(pair(6, 24))),
    Rule::cc(6, 56, Action::PairPolar {
        pair: pair(6, 24),
        sin_axis: Axis::RightX,
        cos_axis: Axis::RightY,
    }),
    // Buttons
    Rule::note_on(1, 12, Button::A),
    Rule::note_on(1, 11, Button::B),
    Rule::note_on(1, 63, Button::RightShoulder),
    Rule::note_on(1, 84, Button::Start),
    Rule::note_on(0, 12, Button::X),
    Rule::note_on(0, 11, Button::Y),
    Rule::note_on(0, 84, Button::Back),
    Rule::note_on(0, 63, Button::LeftShoulder),
    Rule::note_on(4, 74, Button::LeftShoulder),
    Rule::note_on(4, 75, Button::RightShoulder),
];

type RuleKey = (EventKind, u8, u8);

/// Indexed, immutable view over a rule list
#[derive(Debug, Clone)]
pub struct MappingTable {
    rules: Vec<Rule>,
    index: HashMap<RuleKey, Vec<usize>>,
}

impl MappingTable {
    /// Build from rules; several rules on one triple all fire, in list order
    pub fn new(rules: impl IntoIterator<Item = Rule>) -> Self {
        let rules: Vec<Rule> = rules.into_iter().collect();
        let mut index: HashMap<RuleKey, Vec<usize>> = HashMap::new();
        for (i, rule) in rules.iter().enumerate() {
            index
                .entry((rule.kind, rule.channel, rule.number))
                .or_default()
                .push(i);
        }
        Self { rules, index }
    }

    /// Actions bound to a triple; empty when unmapped
    pub fn lookup(&self, kind: EventKind, channel: u8, number: u8) -> impl Iterator<Item = &Action> + '_ {
        self.index
            .get(&(kind, channel, number))
            .into_iter()
            .flatten()
            .map(move |&i| &self.rules[i].action)
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

impl Default for MappingTable {
    fn default() -> Self {
        Self::new(DEFAULT_RULES.iter().copied())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn apply(action: Action, value: u8, pad: &mut GamepadState, agg: &mut ValueAggregator) {
        action.apply(value, pad, agg);
    }

    #[test]
    fn test_button_threshold_is_strict() {
        let mut pad = GamepadState::new();
        let mut agg = ValueAggregator::new();

        apply(Action::Button(Button::A), 65, &mut pad, &mut agg);
        assert!(pad.button(Button::A));

        apply(Action::Button(Button::A), 64, &mut pad, &mut agg);
        assert!(!pad.button(Button::A));
    }

    #[test]
    fn test_nudge_direction() {
        let mut pad = GamepadState::new();
        let mut agg = ValueAggregator::new();
        let nudge = Action::Nudge { axis: Axis::LeftX, step: NUDGE_STEP };

        apply(nudge, 65, &mut pad, &mut agg);
        apply(nudge, 65, &mut pad, &mut agg);
        assert!((pad.axis(Axis::LeftX) - 0.02).abs() < 1e-6);

        apply(nudge, 64, &mut pad, &mut agg);
        assert!((pad.axis(Axis::LeftX) - 0.01).abs() < 1e-6);
    }

    #[test]
    fn test_nudge_saturates_at_range() {
        let mut pad = GamepadState::new();
        let mut agg = ValueAggregator::new();
        pad.set_axis(Axis::LeftX, 1.0);

        apply(Action::Nudge { axis: Axis::LeftX, step: NUDGE_STEP }, 127, &mut pad, &mut agg);
        assert_eq!(pad.axis(Axis::LeftX), 1.0);
    }

    #[test]
    fn test_pair_split_routes_by_sign() {
        let mut pad = GamepadState::new();
        let mut agg = ValueAggregator::new();
        let key = PairKey::new(0, 0);
        let split = Action::PairSplit {
            pair: key,
            positive: Axis::RightTrigger,
            negative: Axis::LeftTrigger,
        };

        apply(Action::RecordMsb(key), 96, &mut pad, &mut agg);
        apply(split, 0, &mut pad, &mut agg);
        assert_eq!(pad.axis(Axis::RightTrigger), 0.5);
        assert_eq!(pad.axis(Axis::LeftTrigger), 0.0);

        apply(Action::RecordMsb(key), 32, &mut pad, &mut agg);
        apply(split, 0, &mut pad, &mut agg);
        assert_eq!(pad.axis(Axis::RightTrigger), 0.0);
        assert_eq!(pad.axis(Axis::LeftTrigger), 0.5);
    }

    #[test]
    fn test_polar_zero_is_origin() {
        assert_eq!(polar(0.0), (0.0, 0.0));
    }

    #[test]
    fn test_polar_nonzero() {
        let (sin, cos) = polar(-1.0);
        assert!((sin + 1.0).abs() < 1e-6);
        assert!(cos.abs() < 1e-6);

        let (sin, cos) = polar(0.5);
        assert!((sin - (FRAC_PI_2 * 0.5).sin()).abs() < 1e-6);
        assert!((cos - (FRAC_PI_2 * 0.5).cos()).abs() < 1e-6);
    }

    #[test]
    fn test_pair_polar_center_zeroes_both_axes() {
        let mut pad = GamepadState::new();
        let mut agg = ValueAggregator::new();
        let key = PairKey::new(6, 24);
        pad.set_axis(Axis::RightY, 0.7);

        apply(Action::RecordMsb(key), 64, &mut pad, &mut agg);
        apply(
            Action::PairPolar { pair: key, sin_axis: Axis::RightX, cos_axis: Axis::RightY },
            0,
            &mut pad,
            &mut agg,
        );

        assert_eq!(pad.axis(Axis::RightX), 0.0);
        assert_eq!(pad.axis(Axis::RightY), 0.0);
    }

    #[test]
    fn test_default_table_lookup() {
        let table = MappingTable::default();

        let actions: Vec<_> = table.lookup(EventKind::NoteOn, 1, 12).collect();
        assert_eq!(actions, vec![&Action::Button(Button::A)]);

        let actions: Vec<_> = table.lookup(EventKind::NoteOn, 0, 12).collect();
        assert_eq!(actions, vec![&Action::Button(Button::X)]);

        assert_eq!(table.lookup(EventKind::NoteOff, 1, 12).count(), 0);
        assert_eq!(table.lookup(EventKind::ControllerChange, 2, 0).count(), 0);
    }

    #[test]
    fn test_default_table_has_no_duplicate_triples() {
        let table = MappingTable::default();
        for rule in table.rules() {
            assert_eq!(table.lookup(rule.kind, rule.channel, rule.number).count(), 1, "{}", rule);
        }
    }

    #[test]
    fn test_multiple_rules_fire_in_order() {
        let table = MappingTable::new([
            Rule::note_on(2, 40, Button::A),
            Rule::note_on(2, 40, Button::B),
        ]);

        let actions: Vec<_> = table.lookup(EventKind::NoteOn, 2, 40).collect();
        assert_eq!(actions, vec![&Action::Button(Button::A), &Action::Button(Button::B)]);
    }

    #[test]
    fn test_rule_display() {
        let rule = Rule::note_on(4, 74, Button::LeftShoulder);
        assert_eq!(rule.to_string(), "NoteOn ch:4 #74 => button LEFT_SHOULDER");
    }
}
