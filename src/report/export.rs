//! Machine-readable weekly exports.
//!
//! - `weekly_structure_summary.csv`: one row per sector, rank ascending
//! - `weekly_classification.json`: run metadata plus the same table
//!
//! A previously written summary CSV can be read back as the prior period
//! for change detection.

use std::collections::HashSet;
use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;

use serde::{Deserialize, Serialize};

use super::ReportError;
use crate::data::{fmt_cell, LoaderError};
use crate::structure::{
    Breadth, Direction, DirectionCounts, Leadership, RiskAssessment, RiskState, SectorLabels,
    SectorRecord, StructureSummary, TagCounts, Tilt, WeeklyClassification,
};
use crate::universe::{Sector, SectorUniverse};

pub const SUMMARY_FILE: &str = "weekly_structure_summary.csv";
pub const CLASSIFICATION_FILE: &str = "weekly_classification.json";

const SUMMARY_HEADER: [&str; 6] = ["Rank", "Ticker", "Ret_4W", "Ret_5D", "Direction", "Leadership"];
const PRIOR_REQUIRED: [&str; 4] = ["Rank", "Ticker", "Direction", "Leadership"];

/// Write the summary table as CSV.
pub fn write_summary<W: Write>(records: &[SectorRecord], writer: W) -> Result<(), ReportError> {
    let mut writer = csv::Writer::from_writer(writer);
    writer.write_record(SUMMARY_HEADER)?;
    for record in records {
        writer.write_record([
            record.rank.to_string(),
            record.ticker.to_string(),
            fmt_cell(record.return_4w),
            fmt_cell(record.return_5d),
            record.direction.to_string(),
            record.leadership.to_string(),
        ])?;
    }
    writer.flush()?;
    Ok(())
}

pub fn write_summary_csv(records: &[SectorRecord], path: &Path) -> Result<(), ReportError> {
    write_summary(records, File::create(path)?)
}

/// Read a prior summary CSV into label sets sorted by rank.
pub fn read_prior_summary(path: &Path) -> Result<Vec<SectorLabels>, LoaderError> {
    if !path.exists() {
        return Err(LoaderError::FileNotFound(path.display().to_string()));
    }
    prior_from_reader(File::open(path)?, &path.display().to_string())
}

pub fn prior_from_reader<R: Read>(reader: R, source: &str) -> Result<Vec<SectorLabels>, LoaderError> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers = reader.headers()?.clone();
    let present: HashSet<&str> = headers.iter().collect();
    let mut missing: Vec<&str> = PRIOR_REQUIRED
        .iter()
        .copied()
        .filter(|c| !present.contains(c))
        .collect();
    if !missing.is_empty() {
        missing.sort_unstable();
        return Err(LoaderError::Schema(format!(
            "{} missing columns: {}",
            source,
            missing.join(", ")
        )));
    }

    let index = |name: &str| headers.iter().position(|h| h == name).unwrap_or_default();
    let (rank_idx, ticker_idx, direction_idx, leadership_idx) = (
        index("Rank"),
        index("Ticker"),
        index("Direction"),
        index("Leadership"),
    );

    let mut labels = Vec::new();
    for (line, result) in reader.records().enumerate() {
        let record = result?;
        let cell = |idx: usize| record.get(idx).unwrap_or("");
        let invalid = |what: &str, value: &str| {
            LoaderError::InvalidData(format!(
                "{} '{}' on row {} of {}",
                what,
                value,
                line + 2,
                source
            ))
        };

        let rank = cell(rank_idx)
            .parse::<usize>()
            .map_err(|_| invalid("rank", cell(rank_idx)))?;
        let ticker: Sector = cell(ticker_idx)
            .parse()
            .map_err(|_| invalid("ticker", cell(ticker_idx)))?;
        let direction: Direction = cell(direction_idx)
            .parse()
            .map_err(|_| invalid("direction", cell(direction_idx)))?;
        let leadership: Leadership = cell(leadership_idx)
            .parse()
            .map_err(|_| invalid("leadership", cell(leadership_idx)))?;

        labels.push(SectorLabels {
            rank: Some(rank),
            ticker,
            direction,
            leadership,
        });
    }

    labels.sort_by_key(|l| l.rank);
    Ok(labels)
}

/// `meta` block of the classification JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassificationMeta {
    pub sessions_used: usize,
    pub breadth: Breadth,
    pub tilt: Tilt,
    #[serde(rename = "count_HH_HL")]
    pub count_hh_hl: usize,
    #[serde(rename = "count_LH_LL")]
    pub count_lh_ll: usize,
    #[serde(rename = "count_RANGE")]
    pub count_range: usize,
    #[serde(rename = "count_TRANSITION")]
    pub count_transition: usize,
    pub risk_state: RiskState,
    pub justification: Vec<String>,
}

/// Full classification JSON document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassificationPayload {
    pub meta: ClassificationMeta,
    pub table: Vec<SectorRecord>,
}

impl ClassificationPayload {
    pub fn from_classification(result: &WeeklyClassification) -> Self {
        let summary = &result.summary;
        Self {
            meta: ClassificationMeta {
                sessions_used: summary.sessions_used,
                breadth: summary.breadth,
                tilt: summary.tilt,
                count_hh_hl: summary.counts.hh_hl,
                count_lh_ll: summary.counts.lh_ll,
                count_range: summary.counts.range,
                count_transition: summary.counts.transition,
                risk_state: result.risk.state,
                justification: result.risk.justification.clone(),
            },
            table: result.records.clone(),
        }
    }

    /// Rebuild the classification. Tag counts are not stored, so they are
    /// recomputed from the table against `universe`.
    pub fn into_classification(self, universe: &SectorUniverse) -> WeeklyClassification {
        let mut records = self.table;
        records.sort_by_key(|r| r.rank);
        let tags = TagCounts::from_directions(
            records.iter().map(|r| (r.ticker, r.direction)),
            universe,
        );
        let meta = self.meta;
        WeeklyClassification {
            summary: StructureSummary {
                sessions_used: meta.sessions_used,
                breadth: meta.breadth,
                tilt: meta.tilt,
                counts: DirectionCounts {
                    hh_hl: meta.count_hh_hl,
                    lh_ll: meta.count_lh_ll,
                    range: meta.count_range,
                    transition: meta.count_transition,
                },
                defensive_hh: tags.defensive_hh,
                cyclical_hh: tags.cyclical_hh,
            },
            records,
            risk: RiskAssessment {
                state: meta.risk_state,
                justification: meta.justification,
            },
        }
    }
}

pub fn write_classification_json(
    result: &WeeklyClassification,
    path: &Path,
) -> Result<(), ReportError> {
    let payload = ClassificationPayload::from_classification(result);
    std::fs::write(path, serde_json::to_string_pretty(&payload)?)?;
    Ok(())
}

pub fn read_classification_json(
    path: &Path,
    universe: &SectorUniverse,
) -> Result<WeeklyClassification, ReportError> {
    if !path.exists() {
        return Err(LoaderError::FileNotFound(path.display().to_string()).into());
    }
    let content = std::fs::read_to_string(path)?;
    let payload: ClassificationPayload = serde_json::from_str(&content)?;
    Ok(payload.into_classification(universe))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(
        rank: usize,
        ticker: Sector,
        return_4w: Option<f64>,
        direction: Direction,
        leadership: Leadership,
    ) -> SectorRecord {
        SectorRecord {
            rank,
            ticker,
            return_4w,
            return_5d: Some(0.001),
            direction,
            leadership,
        }
    }

    fn classification() -> WeeklyClassification {
        WeeklyClassification {
            summary: StructureSummary {
                sessions_used: 20,
                breadth: Breadth::NarrowLeadership,
                tilt: Tilt::Balanced,
                counts: DirectionCounts {
                    hh_hl: 1,
                    lh_ll: 0,
                    range: 1,
                    transition: 0,
                },
                defensive_hh: 1,
                cyclical_hh: 0,
            },
            records: vec![
                record(1, Sector::XLU, Some(0.0425), Direction::HigherHighs, Leadership::PersistentLeader),
                record(2, Sector::XLE, None, Direction::Range, Leadership::Neutral),
            ],
            risk: RiskAssessment {
                state: RiskState::NarrowLeadership,
                justification: vec!["Persistent Leaders: XLU.".to_string()],
            },
        }
    }

    #[test]
    fn test_summary_csv_layout() {
        let mut buf = Vec::new();
        write_summary(&classification().records, &mut buf).unwrap();
        let text = String::from_utf8(buf).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "Rank,Ticker,Ret_4W,Ret_5D,Direction,Leadership");
        assert_eq!(lines[1], "1,XLU,0.042500,0.001000,HH/HL,Persistent Leader");
        assert_eq!(lines[2], "2,XLE,,0.001000,RANGE,Neutral");
    }

    #[test]
    fn test_prior_summary_sorted_by_rank() {
        let csv = "Rank,Ticker,Ret_4W,Ret_5D,Direction,Leadership\n\
                   2,XLE,,,RANGE,Neutral\n\
                   1,XLU,0.1,0.0,HH/HL,Persistent Leader\n";
        let labels = prior_from_reader(csv.as_bytes(), "prior.csv").unwrap();
        assert_eq!(labels.len(), 2);
        assert_eq!(labels[0].ticker, Sector::XLU);
        assert_eq!(labels[0].rank, Some(1));
        assert_eq!(labels[1].direction, Direction::Range);
    }

    #[test]
    fn test_prior_summary_round_trips_written_csv() {
        let result = classification();
        let mut buf = Vec::new();
        write_summary(&result.records, &mut buf).unwrap();
        let labels = prior_from_reader(buf.as_slice(), "summary.csv").unwrap();
        assert_eq!(labels, result.labels());
    }

    #[test]
    fn test_prior_summary_missing_columns() {
        let csv = "Rank,Ticker\n1,XLK\n";
        let err = prior_from_reader(csv.as_bytes(), "prior.csv").unwrap_err();
        match err {
            LoaderError::Schema(msg) => {
                assert!(msg.contains("Direction, Leadership"), "{}", msg);
            }
            other => panic!("unexpected error: {}", other),
        }
    }

    #[test]
    fn test_prior_summary_unknown_label() {
        let csv = "Rank,Ticker,Direction,Leadership\n1,XLK,UP,Neutral\n";
        let err = prior_from_reader(csv.as_bytes(), "prior.csv").unwrap_err();
        assert!(matches!(err, LoaderError::InvalidData(_)));

        let csv = "Rank,Ticker,Direction,Leadership\n1,SPY,RANGE,Neutral\n";
        let err = prior_from_reader(csv.as_bytes(), "prior.csv").unwrap_err();
        assert!(matches!(err, LoaderError::InvalidData(_)));
    }

    #[test]
    fn test_classification_json_shape() {
        let payload = ClassificationPayload::from_classification(&classification());
        let value = serde_json::to_value(&payload).unwrap();
        let meta = &value["meta"];
        assert_eq!(meta["sessions_used"], 20);
        assert_eq!(meta["breadth"], "Narrow Leadership");
        assert_eq!(meta["count_HH_HL"], 1);
        assert_eq!(meta["risk_state"], "Narrow Leadership");
        let row = &value["table"][1];
        assert_eq!(row["Ticker"], "XLE");
        assert!(row["Ret_4W"].is_null());
        assert_eq!(row["Direction"], "RANGE");
    }

    #[test]
    fn test_classification_json_reads_back() {
        let expected = classification();
        let json = serde_json::to_string_pretty(&ClassificationPayload::from_classification(&expected))
            .unwrap();
        let payload: ClassificationPayload = serde_json::from_str(&json).unwrap();
        let restored = payload.into_classification(&SectorUniverse::default());
        assert_eq!(restored, expected);
    }
}
