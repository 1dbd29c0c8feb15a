//! Weekly structure engine.
//!
//! Runs the full classification over one ratio table:
//! window -> per-sector returns and direction -> rank -> leadership ->
//! breadth and tilt -> risk state. Each run owns its inputs and produces
//! fresh records; nothing is carried between runs.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::breadth::{classify_breadth, classify_tilt, Breadth, DirectionCounts, TagCounts, Tilt};
use super::direction::{classify_direction, Direction};
use super::leadership::classify_leadership;
use super::record::{persistent_leaders, transitions, SectorLabels, SectorRecord};
use super::risk_state::{assess_risk, RiskAssessment};
use crate::config::{ConfigError, EngineConfig};
use crate::data::{tail_sessions, LoaderError, RatioTable};
use crate::universe::{Sector, SectorUniverse};

/// Sessions used for the short-horizon return.
pub const SHORT_RETURN_SESSIONS: usize = 5;

/// Aggregate view of one classified window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StructureSummary {
    pub sessions_used: usize,
    pub breadth: Breadth,
    pub tilt: Tilt,
    pub counts: DirectionCounts,
    pub defensive_hh: usize,
    pub cyclical_hh: usize,
}

/// Complete output of one engine run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeeklyClassification {
    pub summary: StructureSummary,
    /// Records sorted by rank ascending.
    pub records: Vec<SectorRecord>,
    pub risk: RiskAssessment,
}

impl WeeklyClassification {
    /// Best `n` sectors by rank.
    pub fn top(&self, n: usize) -> &[SectorRecord] {
        &self.records[..n.min(self.records.len())]
    }

    /// Worst `n` sectors by rank, worst last.
    pub fn bottom(&self, n: usize) -> &[SectorRecord] {
        let start = self.records.len().saturating_sub(n);
        &self.records[start..]
    }

    pub fn labels(&self) -> Vec<SectorLabels> {
        self.records.iter().map(SectorRecord::labels).collect()
    }

    pub fn persistent_leaders(&self) -> Vec<Sector> {
        persistent_leaders(&self.records)
    }

    pub fn transitions(&self) -> Vec<Sector> {
        transitions(&self.records)
    }
}

/// Ratio return over a series: last / first - 1 after dropping gaps.
///
/// Undefined with fewer than two observations or a non-finite result.
pub fn ratio_return(values: &[Option<f64>]) -> Option<f64> {
    let mut observed = values.iter().flatten();
    let first = *observed.next()?;
    let last = *observed.last()?;
    let ret = last / first - 1.0;
    ret.is_finite().then_some(ret)
}

/// Order by return descending, undefined returns last. Stable, so ties keep
/// input order.
pub fn rank_order(a: Option<f64>, b: Option<f64>) -> Ordering {
    match (a, b) {
        (Some(x), Some(y)) => y.partial_cmp(&x).unwrap_or(Ordering::Equal),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

#[derive(Debug, Clone)]
struct Unranked {
    ticker: Sector,
    return_4w: Option<f64>,
    return_5d: Option<f64>,
    direction: Direction,
}

/// Weekly structure classification engine.
pub struct StructureEngine {
    config: EngineConfig,
    universe: SectorUniverse,
}

impl StructureEngine {
    pub fn new(config: EngineConfig, universe: SectorUniverse) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self { config, universe })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn universe(&self) -> &SectorUniverse {
        &self.universe
    }

    /// Classify the most recent window of `table`.
    pub fn classify(&self, table: &RatioTable) -> Result<WeeklyClassification, LoaderError> {
        let window = tail_sessions(table, self.config.days)?;
        if let Some((start, end)) = window.date_range() {
            info!(%start, %end, sessions = window.len(), "Classifying window");
        }

        let unranked: Vec<Unranked> = window
            .sectors()
            .iter()
            .filter(|sector| self.universe.contains(**sector))
            .filter_map(|sector| window.series(*sector))
            .map(|series| {
                let observed = series.observed_count();
                if observed < self.config.days {
                    warn!(
                        sector = %series.sector,
                        observed,
                        required = self.config.days,
                        "Gaps in window; direction defaults to RANGE"
                    );
                }
                Unranked {
                    ticker: series.sector,
                    return_4w: ratio_return(&series.values),
                    return_5d: ratio_return(series.tail_values(SHORT_RETURN_SESSIONS)),
                    direction: classify_direction(&series.values, &self.config),
                }
            })
            .collect();

        let records = rank_and_lead(unranked);
        for record in &records {
            debug!(
                rank = record.rank,
                ticker = %record.ticker,
                direction = %record.direction,
                leadership = %record.leadership,
                "Sector classified"
            );
        }

        let summary = self.summarize(&records, window.len());
        let risk = assess_risk(&records, summary.tilt, &self.universe);

        info!(
            breadth = %summary.breadth,
            tilt = %summary.tilt,
            hh_hl = summary.counts.hh_hl,
            lh_ll = summary.counts.lh_ll,
            risk_state = %risk.state,
            "Weekly structure classified"
        );

        Ok(WeeklyClassification {
            summary,
            records,
            risk,
        })
    }

    /// Breadth, tilt and counts over the full record set.
    pub fn summarize(&self, records: &[SectorRecord], sessions_used: usize) -> StructureSummary {
        let counts = DirectionCounts::from_directions(records.iter().map(|r| r.direction));
        let tags = TagCounts::from_directions(
            records.iter().map(|r| (r.ticker, r.direction)),
            &self.universe,
        );
        StructureSummary {
            sessions_used,
            breadth: classify_breadth(&counts),
            tilt: classify_tilt(&tags),
            counts,
            defensive_hh: tags.defensive_hh,
            cyclical_hh: tags.cyclical_hh,
        }
    }
}

fn rank_and_lead(mut unranked: Vec<Unranked>) -> Vec<SectorRecord> {
    unranked.sort_by(|a, b| rank_order(a.return_4w, b.return_4w));
    unranked
        .into_iter()
        .enumerate()
        .map(|(idx, u)| {
            let rank = idx + 1;
            SectorRecord {
                rank,
                ticker: u.ticker,
                return_4w: u.return_4w,
                return_5d: u.return_5d,
                direction: u.direction,
                leadership: classify_leadership(rank, u.direction, u.return_4w, u.return_5d),
            }
        })
        .collect()
}
