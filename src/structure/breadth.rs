//! Market-wide breadth and sector tilt.
//!
//! Breadth counts how many sectors show HH/HL structure. Tilt checks
//! whether that improving structure concentrates in the Defensive or the
//! Cyclical tag set.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::direction::Direction;
use crate::universe::{Sector, SectorTag, SectorUniverse};

/// HH/HL count at or above which participation is broad.
pub const BROAD_MIN_HH: usize = 4;
/// HH/HL count at or below which leadership is narrow.
pub const NARROW_MAX_HH: usize = 2;
/// HH/HL count within a tag set needed for a tilt.
pub const TILT_MIN_HH: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Breadth {
    #[serde(rename = "Broad Participation")]
    BroadParticipation,
    #[serde(rename = "Narrow Leadership")]
    NarrowLeadership,
    Fragmented,
}

impl Breadth {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::BroadParticipation => "Broad Participation",
            Self::NarrowLeadership => "Narrow Leadership",
            Self::Fragmented => "Fragmented",
        }
    }
}

impl fmt::Display for Breadth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Tilt {
    #[serde(rename = "Defensive Tilt")]
    Defensive,
    #[serde(rename = "Cyclical Tilt")]
    Cyclical,
    Balanced,
}

impl Tilt {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Defensive => "Defensive Tilt",
            Self::Cyclical => "Cyclical Tilt",
            Self::Balanced => "Balanced",
        }
    }
}

impl fmt::Display for Tilt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Tilt {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        [Self::Defensive, Self::Cyclical, Self::Balanced]
            .into_iter()
            .find(|t| t.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("Unknown tilt label: {}", s))
    }
}

/// Number of sectors per direction label.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirectionCounts {
    pub hh_hl: usize,
    pub lh_ll: usize,
    pub range: usize,
    pub transition: usize,
}

impl DirectionCounts {
    pub fn from_directions<I>(directions: I) -> Self
    where
        I: IntoIterator<Item = Direction>,
    {
        let mut counts = Self::default();
        for direction in directions {
            match direction {
                Direction::HigherHighs => counts.hh_hl += 1,
                Direction::LowerLows => counts.lh_ll += 1,
                Direction::Range => counts.range += 1,
                Direction::Transition => counts.transition += 1,
            }
        }
        counts
    }

    pub fn get(&self, direction: Direction) -> usize {
        match direction {
            Direction::HigherHighs => self.hh_hl,
            Direction::LowerLows => self.lh_ll,
            Direction::Range => self.range,
            Direction::Transition => self.transition,
        }
    }

    pub fn total(&self) -> usize {
        self.hh_hl + self.lh_ll + self.range + self.transition
    }
}

/// HH/HL counts restricted to each tag set.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TagCounts {
    pub defensive_hh: usize,
    pub cyclical_hh: usize,
}

impl TagCounts {
    pub fn from_directions<I>(directions: I, universe: &SectorUniverse) -> Self
    where
        I: IntoIterator<Item = (Sector, Direction)>,
    {
        let mut counts = Self::default();
        for (sector, direction) in directions {
            if direction != Direction::HigherHighs {
                continue;
            }
            match universe.tag(sector) {
                Some(SectorTag::Defensive) => counts.defensive_hh += 1,
                Some(SectorTag::Cyclical) => counts.cyclical_hh += 1,
                None => {}
            }
        }
        counts
    }
}

pub fn classify_breadth(counts: &DirectionCounts) -> Breadth {
    if counts.hh_hl >= BROAD_MIN_HH {
        Breadth::BroadParticipation
    } else if counts.hh_hl <= NARROW_MAX_HH {
        Breadth::NarrowLeadership
    } else {
        Breadth::Fragmented
    }
}

/// Defensive is checked first, so a dual tilt resolves to Defensive.
pub fn classify_tilt(tags: &TagCounts) -> Tilt {
    if tags.defensive_hh >= TILT_MIN_HH {
        Tilt::Defensive
    } else if tags.cyclical_hh >= TILT_MIN_HH {
        Tilt::Cyclical
    } else {
        Tilt::Balanced
    }
}
