//! Byte-lane decomposition of 256-bit values.
//!
//! ```text
//! byte position p (0 = least significant)
//!
//!   p:     0  1  2 ... 15 | 16 17 ... 31
//!   lane:  0  1  2 ... 15 |  0  1 ... 15
//!   half:  Low            |  High
//! ```
//!
//! Each lane owns two bytes, one per 128-bit half. Both bytes advance under
//! the lane's multiplier and the same drift.

use std::fmt;

use address_verify::U256;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Lanes per value.
pub const LANE_COUNT: usize = 16;

/// Bytes per value.
pub const POSITION_COUNT: usize = LANE_COUNT * Half::ALL.len();

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("lane {0} is out of range (max {max})", max = LANE_COUNT - 1)]
pub struct InvalidLane(pub u8);

/// Lane number, always below [`LANE_COUNT`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct Lane(u8);

impl Lane {
    pub fn new(lane: u8) -> Result<Self, InvalidLane> {
        if (lane as usize) < LANE_COUNT {
            Ok(Self(lane))
        } else {
            Err(InvalidLane(lane))
        }
    }

    pub fn get(self) -> u8 {
        self.0
    }

    pub fn index(self) -> usize {
        self.0 as usize
    }

    /// All 16 lanes in order.
    pub fn all() -> impl Iterator<Item = Lane> {
        (0..LANE_COUNT as u8).map(Lane)
    }
}

impl TryFrom<u8> for Lane {
    type Error = InvalidLane;

    fn try_from(lane: u8) -> Result<Self, Self::Error> {
        Lane::new(lane)
    }
}

impl From<Lane> for u8 {
    fn from(lane: Lane) -> Self {
        lane.0
    }
}

impl fmt::Display for Lane {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Half {
    Low,
    High,
}

impl Half {
    pub const ALL: [Half; 2] = [Half::Low, Half::High];

    pub fn index(self) -> usize {
        match self {
            Half::Low => 0,
            Half::High => 1,
        }
    }
}

/// One byte of a value, addressed by lane and half.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct LanePosition {
    pub lane: Lane,
    pub half: Half,
}

impl LanePosition {
    pub fn new(lane: Lane, half: Half) -> Self {
        Self { lane, half }
    }

    /// Position of byte `p`, counted from the least significant byte.
    pub fn from_byte_index(p: usize) -> Self {
        let p = p % POSITION_COUNT;
        let half = if p < LANE_COUNT { Half::Low } else { Half::High };
        Self::new(Lane((p % LANE_COUNT) as u8), half)
    }

    pub fn byte_index(self) -> usize {
        self.half.index() * LANE_COUNT + self.lane.index()
    }

    /// All 32 positions in byte order.
    pub fn all() -> impl Iterator<Item = LanePosition> {
        (0..POSITION_COUNT).map(LanePosition::from_byte_index)
    }
}

impl fmt::Display for LanePosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let half = match self.half {
            Half::Low => "low",
            Half::High => "high",
        };
        write!(f, "lane {}/{}", self.lane, half)
    }
}

/// A value split into bytes, least significant first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct LaneBytes([u8; POSITION_COUNT]);

impl LaneBytes {
    pub fn from_array(bytes: [u8; POSITION_COUNT]) -> Self {
        Self(bytes)
    }

    pub fn as_array(&self) -> &[u8; POSITION_COUNT] {
        &self.0
    }

    pub fn get(&self, position: LanePosition) -> u8 {
        self.0[position.byte_index()]
    }

    pub fn set(&mut self, position: LanePosition, byte: u8) {
        self.0[position.byte_index()] = byte;
    }

    /// The low and high byte of `lane`.
    pub fn lane_pair(&self, lane: Lane) -> [u8; 2] {
        Half::ALL.map(|half| self.get(LanePosition::new(lane, half)))
    }

    pub fn set_lane_pair(&mut self, lane: Lane, pair: [u8; 2]) {
        for half in Half::ALL {
            self.set(LanePosition::new(lane, half), pair[half.index()]);
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (LanePosition, u8)> + '_ {
        self.0
            .iter()
            .enumerate()
            .map(|(p, &b)| (LanePosition::from_byte_index(p), b))
    }
}

/// Split `value` into lane bytes.
pub fn decompose(value: &U256) -> LaneBytes {
    let mut bytes = value.to_be_bytes();
    bytes.reverse();
    LaneBytes(bytes)
}

/// Exact inverse of [`decompose`].
pub fn recompose(bytes: &LaneBytes) -> U256 {
    let mut be = bytes.0;
    be.reverse();
    U256::from_be_bytes(be)
}
