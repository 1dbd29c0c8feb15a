//! Per-sector classification records.

use serde::{Deserialize, Serialize};

use super::direction::Direction;
use super::leadership::Leadership;
use crate::universe::Sector;

/// Ranked, classified sector for one window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SectorRecord {
    /// 1-indexed rank by 4-week return, best first.
    #[serde(rename = "Rank")]
    pub rank: usize,
    #[serde(rename = "Ticker")]
    pub ticker: Sector,
    /// Ratio return over the window; `None` when undefined.
    #[serde(rename = "Ret_4W")]
    pub return_4w: Option<f64>,
    /// Ratio return over the last 5 sessions.
    #[serde(rename = "Ret_5D")]
    pub return_5d: Option<f64>,
    #[serde(rename = "Direction")]
    pub direction: Direction,
    #[serde(rename = "Leadership")]
    pub leadership: Leadership,
}

impl SectorRecord {
    pub fn labels(&self) -> SectorLabels {
        SectorLabels {
            rank: Some(self.rank),
            ticker: self.ticker,
            direction: self.direction,
            leadership: self.leadership,
        }
    }
}

/// Labels kept from a prior period for change detection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SectorLabels {
    pub rank: Option<usize>,
    pub ticker: Sector,
    pub direction: Direction,
    pub leadership: Leadership,
}

/// Tickers of records matching a predicate, in record order.
pub fn tickers_where<F>(records: &[SectorRecord], predicate: F) -> Vec<Sector>
where
    F: Fn(&SectorRecord) -> bool,
{
    records
        .iter()
        .filter(|r| predicate(r))
        .map(|r| r.ticker)
        .collect()
}

/// Sectors labelled Persistent Leader.
pub fn persistent_leaders(records: &[SectorRecord]) -> Vec<Sector> {
    tickers_where(records, |r| r.leadership == Leadership::PersistentLeader)
}

/// Sectors in TRANSITION.
pub fn transitions(records: &[SectorRecord]) -> Vec<Sector> {
    tickers_where(records, |r| r.direction == Direction::Transition)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(rank: usize, ticker: Sector, direction: Direction, leadership: Leadership) -> SectorRecord {
        SectorRecord {
            rank,
            ticker,
            return_4w: Some(0.02),
            return_5d: None,
            direction,
            leadership,
        }
    }

    #[test]
    fn test_filters_keep_record_order() {
        let records = vec![
            record(1, Sector::XLK, Direction::HigherHighs, Leadership::PersistentLeader),
            record(2, Sector::XLY, Direction::Transition, Leadership::Fading),
            record(3, Sector::XLF, Direction::HigherHighs, Leadership::PersistentLeader),
            record(4, Sector::XLE, Direction::Transition, Leadership::Fading),
        ];
        assert_eq!(persistent_leaders(&records), vec![Sector::XLK, Sector::XLF]);
        assert_eq!(transitions(&records), vec![Sector::XLY, Sector::XLE]);
        assert!(tickers_where(&records, |r| r.rank > 4).is_empty());
    }

    #[test]
    fn test_record_serializes_with_column_names() {
        let value =
            serde_json::to_value(record(1, Sector::XLRE, Direction::Range, Leadership::Neutral))
                .unwrap();
        assert_eq!(value["Rank"], 1);
        assert_eq!(value["Ticker"], "XLRE");
        assert!(value["Ret_5D"].is_null());
        assert_eq!(value["Direction"], "RANGE");
        assert_eq!(value["Leadership"], "Neutral");
    }

    #[test]
    fn test_labels_carry_rank() {
        let labels = record(7, Sector::XLV, Direction::LowerLows, Leadership::Weak).labels();
        assert_eq!(labels.rank, Some(7));
        assert_eq!(labels.ticker, Sector::XLV);
    }
}
