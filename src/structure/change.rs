//! Week-over-week change detection.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use super::record::SectorLabels;
use crate::universe::Sector;

/// Number of sectors whose labels changed since the prior period.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChangeCount {
    /// No prior period, or no sector in common with it.
    NotApplicable,
    Changed(usize),
}

impl ChangeCount {
    pub fn count(&self) -> Option<usize> {
        match self {
            Self::NotApplicable => None,
            Self::Changed(n) => Some(*n),
        }
    }
}

impl fmt::Display for ChangeCount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotApplicable => f.write_str("n/a"),
            Self::Changed(n) => write!(f, "{}", n),
        }
    }
}

/// Count sectors present in both periods whose direction or leadership
/// differs. Any difference counts once per sector.
pub fn detect_changes(current: &[SectorLabels], prior: Option<&[SectorLabels]>) -> ChangeCount {
    let Some(prior) = prior else {
        return ChangeCount::NotApplicable;
    };

    let prior_by_ticker: HashMap<Sector, &SectorLabels> =
        prior.iter().map(|labels| (labels.ticker, labels)).collect();

    let mut common = 0;
    let mut changed = 0;
    for labels in current {
        if let Some(before) = prior_by_ticker.get(&labels.ticker) {
            common += 1;
            if before.direction != labels.direction || before.leadership != labels.leadership {
                changed += 1;
            }
        }
    }

    if common == 0 {
        ChangeCount::NotApplicable
    } else {
        ChangeCount::Changed(changed)
    }
}
