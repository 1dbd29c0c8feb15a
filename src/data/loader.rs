//! Data loader for wide CSV tables.
//!
//! Both the ratio table and the raw closes table share one layout:
//! - a `Date` column (`YYYY-MM-DD`, an optional time suffix is ignored)
//! - one float column per ticker, empty cells meaning "missing"
//!
//! Ratio tables keep only columns belonging to the sector universe, in
//! universe order. Rows missing for every sector are dropped; partially
//! populated rows stay, so individual series may still carry gaps.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use chrono::NaiveDate;
use thiserror::Error;
use tracing::{debug, info};

use super::types::{RatioTable, WideTable};
use crate::universe::{Sector, SectorUniverse};

/// Name of the date column in every wide table.
pub const DATE_COLUMN: &str = "Date";

#[derive(Error, Debug)]
pub enum LoaderError {
    #[error("Schema error: {0}")]
    Schema(String),

    #[error("Insufficient data: window needs {required} sessions, found only {found}")]
    InsufficientData { required: usize, found: usize },

    #[error("Benchmark {0} missing or empty")]
    MissingBenchmark(String),

    #[error("File not found: {0}")]
    FileNotFound(String),

    #[error("Invalid data: {0}")]
    InvalidData(String),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Loader for ratio and closes tables over a fixed sector universe.
pub struct DataLoader {
    universe: SectorUniverse,
}

impl DataLoader {
    pub fn new(universe: SectorUniverse) -> Self {
        Self { universe }
    }

    pub fn universe(&self) -> &SectorUniverse {
        &self.universe
    }

    /// Load a wide ratios CSV (e.g. `ratios_wide.csv`).
    pub fn load_ratios(&self, path: &Path) -> Result<RatioTable, LoaderError> {
        let wide = read_wide_file(path)?;
        let source = path.display().to_string();
        self.ratio_table(wide, &source)
    }

    /// Load a wide ratios table from any reader.
    pub fn ratios_from_reader<R: Read>(
        &self,
        reader: R,
        source: &str,
    ) -> Result<RatioTable, LoaderError> {
        let wide = read_wide_csv(reader, source)?;
        self.ratio_table(wide, source)
    }

    /// Load a wide closes CSV. All ticker columns are kept, benchmark included.
    pub fn load_closes(&self, path: &Path) -> Result<WideTable, LoaderError> {
        read_wide_file(path)
    }

    /// Restrict a wide table to universe sectors and drop empty rows.
    pub fn ratio_table(&self, wide: WideTable, source: &str) -> Result<RatioTable, LoaderError> {
        let mut sectors = Vec::new();
        let mut columns = Vec::new();
        for sector in self.universe.sectors() {
            if let Some(column) = wide.column(sector.as_str()) {
                sectors.push(*sector);
                columns.push(column.to_vec());
            }
        }

        if sectors.is_empty() {
            let expected: Vec<&str> = self.universe.sectors().iter().map(Sector::as_str).collect();
            return Err(LoaderError::Schema(format!(
                "no sector columns found in {}; expected at least one of {:?}",
                source, expected
            )));
        }

        let mut selected = WideTable {
            dates: wide.dates,
            columns: sectors.iter().map(|s| s.to_string()).collect(),
            values: columns,
        };
        let dropped = selected.drop_empty_rows();

        info!(
            source,
            rows = selected.len(),
            sectors = sectors.len(),
            dropped,
            "Loaded ratio table"
        );

        Ok(RatioTable::from_parts(selected.dates, sectors, selected.values))
    }
}

/// Select exactly the most recent `days` sessions.
pub fn tail_sessions(table: &RatioTable, days: usize) -> Result<RatioTable, LoaderError> {
    if table.len() < days {
        return Err(LoaderError::InsufficientData {
            required: days,
            found: table.len(),
        });
    }
    Ok(table.tail(days))
}

fn read_wide_file(path: &Path) -> Result<WideTable, LoaderError> {
    if !path.exists() {
        return Err(LoaderError::FileNotFound(path.display().to_string()));
    }
    let file = File::open(path)?;
    read_wide_csv(file, &path.display().to_string())
}

/// Parse a wide CSV into a date-sorted table.
pub fn read_wide_csv<R: Read>(reader: R, source: &str) -> Result<WideTable, LoaderError> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers = reader.headers()?.clone();
    let date_idx = headers
        .iter()
        .position(|h| h.eq_ignore_ascii_case(DATE_COLUMN))
        .ok_or_else(|| {
            LoaderError::Schema(format!("missing '{}' column in {}", DATE_COLUMN, source))
        })?;

    let value_idx: Vec<usize> = (0..headers.len()).filter(|i| *i != date_idx).collect();
    let columns: Vec<String> = value_idx.iter().map(|i| headers[*i].to_string()).collect();

    let mut rows: Vec<(NaiveDate, Vec<Option<f64>>)> = Vec::new();
    for (line, result) in reader.records().enumerate() {
        let record = result?;
        let date_str = record.get(date_idx).unwrap_or("");
        if date_str.is_empty() {
            continue;
        }
        let date = parse_date(date_str).ok_or_else(|| {
            LoaderError::InvalidData(format!(
                "unparseable date '{}' on row {} of {}",
                date_str,
                line + 2,
                source
            ))
        })?;
        let values = value_idx
            .iter()
            .map(|i| record.get(*i).and_then(parse_value))
            .collect();
        rows.push((date, values));
    }

    rows.sort_by_key(|(date, _)| *date);
    if let Some(pair) = rows.windows(2).find(|w| w[0].0 == w[1].0) {
        return Err(LoaderError::InvalidData(format!(
            "duplicate date {} in {}",
            pair[0].0, source
        )));
    }

    let mut table = WideTable {
        dates: Vec::with_capacity(rows.len()),
        columns,
        values: vec![Vec::with_capacity(rows.len()); value_idx.len()],
    };
    for (date, values) in rows {
        table.dates.push(date);
        for (column, value) in table.values.iter_mut().zip(values) {
            column.push(value);
        }
    }

    debug!(source, rows = table.len(), columns = table.columns.len(), "Parsed wide CSV");
    Ok(table)
}

/// Parse `YYYY-MM-DD`, ignoring any time-of-day suffix.
fn parse_date(s: &str) -> Option<NaiveDate> {
    let day = s.split(|c: char| c == ' ' || c == 'T').next()?;
    NaiveDate::parse_from_str(day, "%Y-%m-%d").ok()
}

/// Parse a cell; empty, unparseable and non-finite cells are missing.
fn parse_value(s: &str) -> Option<f64> {
    let v = s.trim().parse::<f64>().ok()?;
    v.is_finite().then_some(v)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn loader() -> DataLoader {
        DataLoader::new(SectorUniverse::default())
    }

    #[test]
    fn test_parse_date_with_time_suffix() {
        assert_eq!(
            parse_date("2026-01-09 00:00:00"),
            NaiveDate::from_ymd_opt(2026, 1, 9)
        );
        assert_eq!(parse_date("2026-01-09T00:00:00"), NaiveDate::from_ymd_opt(2026, 1, 9));
        assert!(parse_date("01/09/2026").is_none());
    }

    #[test]
    fn test_parse_value_missing_cells() {
        assert_eq!(parse_value("0.5"), Some(0.5));
        assert_eq!(parse_value(""), None);
        assert_eq!(parse_value("nan"), None);
        assert_eq!(parse_value("inf"), None);
        assert_eq!(parse_value("n/a"), None);
    }

    #[test]
    fn test_missing_date_column() {
        let csv = "Day,XLK\n2026-01-02,1.0\n";
        let err = loader().ratios_from_reader(csv.as_bytes(), "test").unwrap_err();
        assert!(matches!(err, LoaderError::Schema(msg) if msg.contains("Date")));
    }

    #[test]
    fn test_no_sector_columns() {
        let csv = "Date,SPY,QQQ\n2026-01-02,1.0,2.0\n";
        let err = loader().ratios_from_reader(csv.as_bytes(), "test").unwrap_err();
        assert!(matches!(err, LoaderError::Schema(_)));
    }

    #[test]
    fn test_rows_sorted_and_empty_rows_dropped() {
        let csv = "Date,XLU,XLK,QQQ\n\
                   2026-01-06,0.30,,9\n\
                   2026-01-02,0.31,0.50,9\n\
                   2026-01-05,,,9\n";
        let table = loader().ratios_from_reader(csv.as_bytes(), "test").unwrap();

        // Universe order, unknown columns ignored.
        assert_eq!(table.sectors(), &[Sector::XLK, Sector::XLU]);
        assert_eq!(table.len(), 2);
        assert_eq!(table.dates()[0], NaiveDate::from_ymd_opt(2026, 1, 2).unwrap());
        assert_eq!(table.column(Sector::XLK).unwrap(), &[Some(0.50), None]);
    }

    #[test]
    fn test_duplicate_dates_rejected() {
        let csv = "Date,XLK\n2026-01-02,1.0\n2026-01-02,1.1\n";
        let err = loader().ratios_from_reader(csv.as_bytes(), "test").unwrap_err();
        assert!(matches!(err, LoaderError::InvalidData(_)));
    }

    #[test]
    fn test_tail_sessions() {
        let csv = "Date,XLK\n2026-01-02,1.0\n2026-01-05,1.1\n2026-01-06,1.2\n";
        let table = loader().ratios_from_reader(csv.as_bytes(), "test").unwrap();

        let window = tail_sessions(&table, 2).unwrap();
        assert_eq!(window.len(), 2);
        assert_eq!(window.column(Sector::XLK).unwrap(), &[Some(1.1), Some(1.2)]);

        let err = tail_sessions(&table, 20).unwrap_err();
        assert!(matches!(
            err,
            LoaderError::InsufficientData {
                required: 20,
                found: 3
            }
        ));
    }

    #[test]
    fn test_missing_file() {
        let err = loader()
            .load_ratios(Path::new("does/not/exist.csv"))
            .unwrap_err();
        assert!(matches!(err, LoaderError::FileNotFound(_)));
    }
}
