//! Sector universe and tag membership.
//!
//! The universe is the fixed set of SPDR sector ETFs measured against the
//! benchmark. Each sector carries at most one tag (Defensive or Cyclical);
//! tag sets are configuration, loaded once and then shared read-only.

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A sector ETF in the fixed universe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Sector {
    /// Materials.
    XLB,
    /// Energy.
    XLE,
    /// Financials.
    XLF,
    /// Industrials.
    XLI,
    /// Technology.
    XLK,
    /// Consumer Staples.
    XLP,
    /// Utilities.
    XLU,
    /// Health Care.
    XLV,
    /// Consumer Discretionary.
    XLY,
    /// Communication Services.
    XLC,
    /// Real Estate.
    XLRE,
}

impl Sector {
    /// All sectors in canonical universe order.
    pub const ALL: [Sector; 11] = [
        Self::XLB,
        Self::XLE,
        Self::XLF,
        Self::XLI,
        Self::XLK,
        Self::XLP,
        Self::XLU,
        Self::XLV,
        Self::XLY,
        Self::XLC,
        Self::XLRE,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::XLB => "XLB",
            Self::XLE => "XLE",
            Self::XLF => "XLF",
            Self::XLI => "XLI",
            Self::XLK => "XLK",
            Self::XLP => "XLP",
            Self::XLU => "XLU",
            Self::XLV => "XLV",
            Self::XLY => "XLY",
            Self::XLC => "XLC",
            Self::XLRE => "XLRE",
        }
    }

    /// Human-readable sector name.
    pub fn name(&self) -> &'static str {
        match self {
            Self::XLB => "Materials",
            Self::XLE => "Energy",
            Self::XLF => "Financials",
            Self::XLI => "Industrials",
            Self::XLK => "Technology",
            Self::XLP => "Consumer Staples",
            Self::XLU => "Utilities",
            Self::XLV => "Health Care",
            Self::XLY => "Consumer Discretionary",
            Self::XLC => "Communication Services",
            Self::XLRE => "Real Estate",
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Unknown sector ticker: {0}")]
pub struct UnknownSector(pub String);

impl FromStr for Sector {
    type Err = UnknownSector;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let upper = s.trim().to_uppercase();
        Self::ALL
            .iter()
            .copied()
            .find(|sector| sector.as_str() == upper)
            .ok_or_else(|| UnknownSector(s.to_string()))
    }
}

impl TryFrom<String> for Sector {
    type Error = UnknownSector;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Sector> for String {
    fn from(sector: Sector) -> Self {
        sector.as_str().to_string()
    }
}

impl fmt::Display for Sector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Tag grouping sectors by economic sensitivity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SectorTag {
    Defensive,
    Cyclical,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum UniverseError {
    #[error("Sector universe is empty")]
    Empty,

    #[error("Sector {0} listed more than once in the universe")]
    Duplicate(Sector),

    #[error("Tagged sector {0} is not part of the universe")]
    NotInUniverse(Sector),

    #[error("Sector {0} is tagged both Defensive and Cyclical")]
    Overlap(Sector),
}

/// Immutable sector universe with its tag sets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SectorUniverse {
    sectors: Vec<Sector>,
    defensive: BTreeSet<Sector>,
    cyclical: BTreeSet<Sector>,
}

impl SectorUniverse {
    /// Build a universe, checking that tag sets are disjoint members of it.
    pub fn new(
        sectors: Vec<Sector>,
        defensive: impl IntoIterator<Item = Sector>,
        cyclical: impl IntoIterator<Item = Sector>,
    ) -> Result<Self, UniverseError> {
        if sectors.is_empty() {
            return Err(UniverseError::Empty);
        }

        let mut seen = BTreeSet::new();
        for sector in &sectors {
            if !seen.insert(*sector) {
                return Err(UniverseError::Duplicate(*sector));
            }
        }

        let defensive: BTreeSet<Sector> = defensive.into_iter().collect();
        let cyclical: BTreeSet<Sector> = cyclical.into_iter().collect();

        for sector in defensive.iter().chain(cyclical.iter()) {
            if !seen.contains(sector) {
                return Err(UniverseError::NotInUniverse(*sector));
            }
        }
        if let Some(sector) = defensive.intersection(&cyclical).next() {
            return Err(UniverseError::Overlap(*sector));
        }

        Ok(Self {
            sectors,
            defensive,
            cyclical,
        })
    }

    /// Sectors in universe order. This order breaks ranking ties.
    pub fn sectors(&self) -> &[Sector] {
        &self.sectors
    }

    pub fn contains(&self, sector: Sector) -> bool {
        self.sectors.contains(&sector)
    }

    /// Tag for a sector, if it carries one.
    pub fn tag(&self, sector: Sector) -> Option<SectorTag> {
        if self.defensive.contains(&sector) {
            Some(SectorTag::Defensive)
        } else if self.cyclical.contains(&sector) {
            Some(SectorTag::Cyclical)
        } else {
            None
        }
    }

    pub fn is_tagged(&self, sector: Sector, tag: SectorTag) -> bool {
        self.tag(sector) == Some(tag)
    }

    pub fn defensive(&self) -> &BTreeSet<Sector> {
        &self.defensive
    }

    pub fn cyclical(&self) -> &BTreeSet<Sector> {
        &self.cyclical
    }
}

impl Default for SectorUniverse {
    fn default() -> Self {
        Self {
            sectors: Sector::ALL.to_vec(),
            defensive: [Sector::XLP, Sector::XLU, Sector::XLV].into_iter().collect(),
            cyclical: [Sector::XLF, Sector::XLI, Sector::XLB, Sector::XLY, Sector::XLK]
                .into_iter()
                .collect(),
        }
    }
}
