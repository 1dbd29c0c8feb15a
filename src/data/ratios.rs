//! Sector-to-benchmark ratio construction.
//!
//! Turns an already-fetched closes table into the wide ratio table consumed
//! by the structure engine, plus the long and per-ticker CSV exports.
//! Rows are aligned on sessions where the benchmark traded so missing
//! benchmark closes never distort a ratio.

use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use tracing::{info, warn};

use super::loader::LoaderError;
use super::types::{RatioTable, WideTable};
use crate::universe::{Sector, SectorUniverse};

/// Ratio table together with the closes it was derived from.
#[derive(Debug, Clone)]
pub struct RatioBuild {
    pub benchmark: String,
    pub ratios: RatioTable,
    /// Closes per sector over the same rows, aligned with `ratios`.
    pub closes: Vec<(Sector, Vec<Option<f64>>)>,
    pub benchmark_closes: Vec<Option<f64>>,
}

/// Builder for ratios against one benchmark.
pub struct RatioBuilder<'a> {
    universe: &'a SectorUniverse,
    benchmark: String,
    days: usize,
}

impl<'a> RatioBuilder<'a> {
    pub fn new(universe: &'a SectorUniverse, benchmark: &str, days: usize) -> Self {
        Self {
            universe,
            benchmark: benchmark.to_string(),
            days,
        }
    }

    /// Build ratios from a wide closes table.
    pub fn build(&self, closes: &WideTable) -> Result<RatioBuild, LoaderError> {
        let bench_idx = closes
            .column_index(&self.benchmark)
            .ok_or_else(|| LoaderError::MissingBenchmark(self.benchmark.clone()))?;
        if closes.values[bench_idx].iter().all(Option::is_none) {
            return Err(LoaderError::MissingBenchmark(self.benchmark.clone()));
        }

        let mut aligned = closes.clone();
        aligned.drop_empty_rows();
        let bench_col = aligned.values[bench_idx].clone();
        aligned.retain_rows(|row| bench_col[row].is_some());

        let window = aligned.tail(self.days);
        if window.len() < self.days {
            warn!(
                benchmark = %self.benchmark,
                rows = window.len(),
                days = self.days,
                "Fewer benchmark sessions than requested"
            );
        }
        let benchmark_closes = window.values[bench_idx].clone();

        let mut sectors = Vec::new();
        let mut ratio_columns = Vec::new();
        let mut sector_closes = Vec::new();
        for sector in self.universe.sectors() {
            let etf: Vec<Option<f64>> = match window.column(sector.as_str()) {
                Some(column) => column.to_vec(),
                None => {
                    warn!(sector = %sector, "Sector missing from closes; carried as empty");
                    vec![None; window.len()]
                }
            };
            let ratio = etf
                .iter()
                .zip(&benchmark_closes)
                .map(|(etf, bench)| ratio(*etf, *bench))
                .collect();
            sectors.push(*sector);
            ratio_columns.push(ratio);
            sector_closes.push((*sector, etf));
        }

        if sector_closes
            .iter()
            .all(|(_, c)| c.iter().all(Option::is_none))
        {
            return Err(LoaderError::InvalidData(
                "no sector ETF data available to compute ratios".to_string(),
            ));
        }

        info!(
            benchmark = %self.benchmark,
            rows = window.len(),
            sectors = sectors.len(),
            "Built sector ratios"
        );

        Ok(RatioBuild {
            benchmark: self.benchmark.clone(),
            ratios: RatioTable::from_parts(window.dates.clone(), sectors, ratio_columns),
            closes: sector_closes,
            benchmark_closes,
        })
    }
}

fn ratio(etf: Option<f64>, bench: Option<f64>) -> Option<f64> {
    match (etf, bench) {
        (Some(e), Some(b)) if b > 0.0 => Some(e / b),
        _ => None,
    }
}

/// Format a float cell with six decimals, empty when missing.
pub fn fmt_cell(value: Option<f64>) -> String {
    value.map(|v| format!("{:.6}", v)).unwrap_or_default()
}

impl RatioBuild {
    /// Write `ratios_wide.csv`: Date plus one column per sector.
    pub fn write_wide(&self, path: &Path) -> Result<(), LoaderError> {
        let mut writer = csv::Writer::from_path(path)?;
        let mut header = vec!["Date".to_string()];
        header.extend(self.ratios.sectors().iter().map(|s| s.to_string()));
        writer.write_record(&header)?;

        for (row, date) in self.ratios.dates().iter().enumerate() {
            let mut record = vec![date.to_string()];
            for sector in self.ratios.sectors() {
                let value = self.ratios.column(*sector).and_then(|c| c[row]);
                record.push(fmt_cell(value));
            }
            writer.write_record(&record)?;
        }
        writer.flush()?;
        Ok(())
    }

    /// Write `ratios_long.csv`, one row per sector and session.
    ///
    /// Sectors without any close are skipped. The benchmark close column is
    /// named after the benchmark (`SPY_Close` by default).
    pub fn write_long(&self, path: &Path) -> Result<(), LoaderError> {
        let mut tickers: Vec<&(Sector, Vec<Option<f64>>)> = self
            .closes
            .iter()
            .filter(|(_, c)| c.iter().any(Option::is_some))
            .collect();
        tickers.sort_by_key(|(sector, _)| sector.as_str());

        let bench_header = format!("{}_Close", self.benchmark.to_uppercase());
        let mut writer = csv::Writer::from_path(path)?;
        writer.write_record(["Date", "Ticker", "ETF_Close", bench_header.as_str(), "Ratio"])?;

        for (sector, closes) in tickers {
            let ratios = self.ratios.column(*sector).unwrap_or(&[]);
            for (row, date) in self.ratios.dates().iter().enumerate() {
                writer.write_record([
                    date.to_string(),
                    sector.to_string(),
                    fmt_cell(closes[row]),
                    fmt_cell(self.benchmark_closes[row]),
                    fmt_cell(ratios.get(row).copied().flatten()),
                ])?;
            }
        }
        writer.flush()?;
        Ok(())
    }

    /// Write one `<TICKER>_vs_<BENCH>_last<N>.csv` per sector with data.
    pub fn write_per_ticker(&self, dir: &Path, days: usize) -> Result<Vec<PathBuf>, LoaderError> {
        fs::create_dir_all(dir)?;
        let bench = self.benchmark.to_uppercase();
        let mut written = Vec::new();

        for (sector, closes) in &self.closes {
            if closes.iter().all(Option::is_none) {
                continue;
            }
            let ratios = self.ratios.column(*sector).unwrap_or(&[]);
            let path = dir.join(format!("{}_vs_{}_last{}.csv", sector, bench, days));
            let mut file = File::create(&path)?;
            writeln!(file, "Date,ETF_Close,{}_Close,Ratio", bench)?;
            for (row, date) in self.ratios.dates().iter().enumerate() {
                writeln!(
                    file,
                    "{},{},{},{}",
                    date,
                    fmt_cell(closes[row]),
                    fmt_cell(self.benchmark_closes[row]),
                    fmt_cell(ratios.get(row).copied().flatten())
                )?;
            }
            written.push(path);
        }

        Ok(written)
    }
}
