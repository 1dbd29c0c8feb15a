//! Leadership tier for a ranked sector.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::direction::Direction;

/// Ranks at or above this count as top-tier for persistent leadership.
pub const LEADER_RANK_CUTOFF: usize = 3;

/// Leadership tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Leadership {
    #[serde(rename = "Persistent Leader")]
    PersistentLeader,
    #[serde(rename = "Emerging Leader")]
    EmergingLeader,
    Fading,
    Weak,
    Neutral,
}

impl Leadership {
    pub const ALL: [Leadership; 5] = [
        Self::PersistentLeader,
        Self::EmergingLeader,
        Self::Fading,
        Self::Weak,
        Self::Neutral,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PersistentLeader => "Persistent Leader",
            Self::EmergingLeader => "Emerging Leader",
            Self::Fading => "Fading",
            Self::Weak => "Weak",
            Self::Neutral => "Neutral",
        }
    }
}

impl fmt::Display for Leadership {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Leadership {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let label = s.trim();
        Self::ALL
            .iter()
            .copied()
            .find(|l| l.as_str().eq_ignore_ascii_case(label))
            .ok_or_else(|| format!("Unknown leadership label: {}", s))
    }
}

/// Leadership from rank (1 = best 4-week return), direction and returns.
///
/// The 5-day return is accepted for the record but does not affect the tier.
pub fn classify_leadership(
    rank: usize,
    direction: Direction,
    return_4w: Option<f64>,
    _return_5d: Option<f64>,
) -> Leadership {
    match direction {
        Direction::LowerLows => Leadership::Weak,
        Direction::HigherHighs if rank <= LEADER_RANK_CUTOFF => Leadership::PersistentLeader,
        Direction::HigherHighs => Leadership::EmergingLeader,
        Direction::Transition if return_4w.is_some_and(|r| r > 0.0) => Leadership::Fading,
        _ => Leadership::Neutral,
    }
}
