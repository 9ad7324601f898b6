//! 14-bit controller pairing
//!
//! Some surfaces send high-resolution controls as two Control Change messages:
//! the coarse half (MSB) on controller `n`, then the fine half (LSB) on
//! controller `n + 32`. The aggregator remembers the latest MSB per pair and
//! combines it with the LSB when that arrives.
//!
//! Ordering is not defended: an LSB that overtakes its MSB is composed with
//! whatever MSB was stored before.

use std::collections::HashMap;
use std::fmt;
use tracing::{debug, trace};

/// Center of the 14-bit range, maps to 0.0
pub const CENTER_14BIT: i32 = 8192;

/// Identity of a controller pair: channel plus the MSB controller number
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PairKey {
    pub channel: u8,
    pub controller: u8,
}

impl PairKey {
    pub const fn new(channel: u8, controller: u8) -> Self {
        Self { channel, controller }
    }
}

impl fmt::Display for PairKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.channel, self.controller)
    }
}

/// Map a 14-bit value (0-16383) to a signed float in [-1.0, 1.0)
pub fn normalize_14bit(value14: u16) -> f32 {
    (value14 as i32 - CENTER_14BIT) as f32 / CENTER_14BIT as f32
}

/// Most recent MSB per controller pair
#[derive(Debug, Default, Clone)]
pub struct ValueAggregator {
    halves: HashMap<PairKey, u8>,
}

impl ValueAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store the coarse half of a pair, replacing any previous value
    pub fn record(&mut self, key: PairKey, value: u8) {
        trace!("aggregator {} <- {}", key, value);
        self.halves.insert(key, value & 0x7F);
    }

    /// Last recorded half, if any
    pub fn get(&self, key: PairKey) -> Option<u8> {
        self.halves.get(&key).copied()
    }

    /// 14-bit composite of the recorded MSB and a fresh LSB
    ///
    /// A pair that was never recorded composes with an MSB of 0.
    pub fn compose_raw(&self, key: PairKey, lsb: u8) -> u16 {
        let msb = match self.get(key) {
            Some(msb) => msb,
            None => {
                debug!("no MSB recorded for pair {}, using 0", key);
                0
            }
        };
        ((msb as u16) << 7) + (lsb & 0x7F) as u16
    }

    /// Composite normalized to [-1.0, 1.0): `((msb << 7) + lsb - 8192) / 8192`
    pub fn compose(&self, key: PairKey, lsb: u8) -> f32 {
        normalize_14bit(self.compose_raw(key, lsb))
    }

    pub fn len(&self) -> usize {
        self.halves.len()
    }

    pub fn is_empty(&self) -> bool {
        self.halves.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compose_minimum_is_exactly_minus_one() {
        let mut agg = ValueAggregator::new();
        let key = PairKey::new(0, 0);

        agg.record(key, 0);
        assert_eq!(agg.compose(key, 0), -1.0);
    }

    #[test]
    fn test_compose_maximum_is_just_below_one() {
        let mut agg = ValueAggregator::new();
        let key = PairKey::new(0, 0);

        agg.record(key, 127);
        let value = agg.compose(key, 127);
        assert_eq!(value, 8191.0 / 8192.0);
        assert!(value < 1.0 && value > 0.999);
    }

    #[test]
    fn test_compose_center() {
        let mut agg = ValueAggregator::new();
        let key = PairKey::new(6, 24);

        agg.record(key, 64);
        assert_eq!(agg.compose_raw(key, 0), 8192);
        assert_eq!(agg.compose(key, 0), 0.0);
    }

    #[test]
    fn test_missing_record_composes_as_zero_msb() {
        let agg = ValueAggregator::new();

        assert_eq!(agg.compose_raw(PairKey::new(0, 19), 5), 5);
        assert_eq!(agg.compose(PairKey::new(0, 19), 0), -1.0);
    }

    #[test]
    fn test_record_overwrites_and_keys_are_independent() {
        let mut agg = ValueAggregator::new();

        agg.record(PairKey::new(0, 0), 10);
        agg.record(PairKey::new(0, 0), 11);
        agg.record(PairKey::new(6, 0), 99);

        assert_eq!(agg.get(PairKey::new(0, 0)), Some(11));
        assert_eq!(agg.get(PairKey::new(6, 0)), Some(99));
        assert_eq!(agg.len(), 2);
    }

    #[test]
    fn test_pair_key_display() {
        assert_eq!(PairKey::new(0, 0).to_string(), "0,0");
        assert_eq!(PairKey::new(6, 31).to_string(), "6,31");
    }

    #[test]
    fn test_normalize_14bit() {
        assert_eq!(normalize_14bit(0), -1.0);
        assert_eq!(normalize_14bit(8192), 0.0);
        assert_eq!(normalize_14bit(12288), 0.5);
    }
}
