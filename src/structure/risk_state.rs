//! Market risk state from the classified sector set.
//!
//! Conditions overlap, so the rule order is part of the contract: the first
//! matching rule decides the state and later rules are never evaluated.
//!
//! 1. Risk-Off: 5+ sectors in LH/LL
//! 2. Defensive Shift: 3+ Defensive sectors in HH/HL
//! 3. Risk-On: 4+ sectors in HH/HL with Cyclical Tilt
//! 4. Narrow Leadership: one or two Persistent Leaders
//! 5. Fragmented: HH/HL and LH/LL both present
//! 6. Balanced: otherwise

use std::fmt;

use serde::{Deserialize, Serialize};

use super::breadth::{DirectionCounts, TagCounts, Tilt};
use super::record::{persistent_leaders, SectorRecord};
use crate::universe::{Sector, SectorUniverse};

pub const RISK_OFF_MIN_LH: usize = 5;
pub const DEFENSIVE_SHIFT_MIN_HH: usize = 3;
pub const RISK_ON_MIN_HH: usize = 4;

/// Maximum justification lines carried with a state.
pub const MAX_JUSTIFICATION_LINES: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RiskState {
    #[serde(rename = "Risk-Off")]
    RiskOff,
    #[serde(rename = "Defensive Shift")]
    DefensiveShift,
    #[serde(rename = "Risk-On")]
    RiskOn,
    #[serde(rename = "Narrow Leadership")]
    NarrowLeadership,
    Fragmented,
    Balanced,
}

impl RiskState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::RiskOff => "Risk-Off",
            Self::DefensiveShift => "Defensive Shift",
            Self::RiskOn => "Risk-On",
            Self::NarrowLeadership => "Narrow Leadership",
            Self::Fragmented => "Fragmented",
            Self::Balanced => "Balanced",
        }
    }
}

impl fmt::Display for RiskState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Risk state with the lines that justify it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RiskAssessment {
    pub state: RiskState,
    pub justification: Vec<String>,
}

impl RiskAssessment {
    fn new(state: RiskState, mut justification: Vec<String>) -> Self {
        justification.truncate(MAX_JUSTIFICATION_LINES);
        Self {
            state,
            justification,
        }
    }
}

/// Inputs to the rule chain, reduced from the record set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RiskInputs {
    pub counts: DirectionCounts,
    pub tags: TagCounts,
    pub persistent_leaders: Vec<Sector>,
    pub tilt: Tilt,
}

impl RiskInputs {
    pub fn from_records(records: &[SectorRecord], tilt: Tilt, universe: &SectorUniverse) -> Self {
        Self {
            counts: DirectionCounts::from_directions(records.iter().map(|r| r.direction)),
            tags: TagCounts::from_directions(
                records.iter().map(|r| (r.ticker, r.direction)),
                universe,
            ),
            persistent_leaders: persistent_leaders(records),
            tilt,
        }
    }
}

/// Run the rule chain over the full record set and the tilt label.
pub fn assess_risk(
    records: &[SectorRecord],
    tilt: Tilt,
    universe: &SectorUniverse,
) -> RiskAssessment {
    evaluate_rules(&RiskInputs::from_records(records, tilt, universe))
}

/// Rule chain over pre-reduced inputs.
pub fn evaluate_rules(inputs: &RiskInputs) -> RiskAssessment {
    let counts = &inputs.counts;
    let tilt = inputs.tilt;
    let hh_line = format!("HH/HL sectors count: {}.", counts.hh_hl);
    let lh_line = format!("LH/LL sectors count: {}.", counts.lh_ll);
    let tilt_line = format!("Tilt: {}.", tilt);

    if counts.lh_ll >= RISK_OFF_MIN_LH {
        return RiskAssessment::new(RiskState::RiskOff, vec![lh_line, hh_line, tilt_line]);
    }

    if inputs.tags.defensive_hh >= DEFENSIVE_SHIFT_MIN_HH {
        return RiskAssessment::new(
            RiskState::DefensiveShift,
            vec![
                format!(
                    "Defensive sectors show {} HH/HL structures.",
                    inputs.tags.defensive_hh
                ),
                format!(
                    "Cyclical sectors show {} HH/HL structures.",
                    inputs.tags.cyclical_hh
                ),
                format!("Breadth based on HH/HL count: {}.", counts.hh_hl),
            ],
        );
    }

    if counts.hh_hl >= RISK_ON_MIN_HH && tilt == Tilt::Cyclical {
        return RiskAssessment::new(RiskState::RiskOn, vec![hh_line, tilt_line, lh_line]);
    }

    if matches!(inputs.persistent_leaders.len(), 1 | 2) {
        return RiskAssessment::new(
            RiskState::NarrowLeadership,
            vec![
                format!(
                    "Persistent Leaders: {}.",
                    join_tickers(&inputs.persistent_leaders)
                ),
                hh_line,
                tilt_line,
            ],
        );
    }

    if counts.hh_hl > 0 && counts.lh_ll > 0 {
        return RiskAssessment::new(RiskState::Fragmented, vec![hh_line, lh_line, tilt_line]);
    }

    RiskAssessment::new(RiskState::Balanced, vec![hh_line, lh_line, tilt_line])
}

/// Comma-joined tickers, `n/a` when empty.
pub fn join_tickers(tickers: &[Sector]) -> String {
    if tickers.is_empty() {
        return "n/a".to_string();
    }
    tickers
        .iter()
        .map(Sector::as_str)
        .collect::<Vec<_>>()
        .join(", ")
}
