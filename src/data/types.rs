//! Core data types for ratio tables.
//!
//! Tables are stored column-major: one vector of optional values per column,
//! aligned with a shared, strictly increasing date index. A `None` cell is a
//! missing observation.

use chrono::NaiveDate;

use crate::universe::Sector;

/// Wide table of dated float columns keyed by column name.
///
/// Used for raw closes, where the benchmark is just another column.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WideTable {
    pub dates: Vec<NaiveDate>,
    pub columns: Vec<String>,
    /// One vector per column, each `dates.len()` long.
    pub values: Vec<Vec<Option<f64>>>,
}

impl WideTable {
    pub fn len(&self) -> usize {
        self.dates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }

    /// Index of a column, matched case-insensitively.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns
            .iter()
            .position(|c| c.trim().eq_ignore_ascii_case(name.trim()))
    }

    pub fn column(&self, name: &str) -> Option<&[Option<f64>]> {
        self.column_index(name).map(|idx| self.values[idx].as_slice())
    }

    /// Keep only rows whose index satisfies the predicate.
    pub fn retain_rows<F>(&mut self, mut keep: F)
    where
        F: FnMut(usize) -> bool,
    {
        let keep_mask: Vec<bool> = (0..self.dates.len()).map(&mut keep).collect();
        self.dates = filter_by_mask(&self.dates, &keep_mask);
        for column in self.values.iter_mut() {
            *column = filter_by_mask(column, &keep_mask);
        }
    }

    /// Drop rows where every column is missing.
    pub fn drop_empty_rows(&mut self) -> usize {
        let before = self.len();
        let values = self.values.clone();
        self.retain_rows(|row| values.iter().any(|col| col[row].is_some()));
        before - self.len()
    }

    /// Keep the most recent `n` rows (all rows if fewer exist).
    pub fn tail(&self, n: usize) -> WideTable {
        let start = self.len().saturating_sub(n);
        WideTable {
            dates: self.dates[start..].to_vec(),
            columns: self.columns.clone(),
            values: self.values.iter().map(|c| c[start..].to_vec()).collect(),
        }
    }
}

/// Per-sector ratio table (sector price / benchmark price).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RatioTable {
    dates: Vec<NaiveDate>,
    sectors: Vec<Sector>,
    columns: Vec<Vec<Option<f64>>>,
}

impl RatioTable {
    /// Assemble a table. Callers guarantee aligned column lengths and
    /// strictly increasing dates; the loader checks both.
    pub(crate) fn from_parts(
        dates: Vec<NaiveDate>,
        sectors: Vec<Sector>,
        columns: Vec<Vec<Option<f64>>>,
    ) -> Self {
        debug_assert_eq!(sectors.len(), columns.len());
        debug_assert!(columns.iter().all(|c| c.len() == dates.len()));
        debug_assert!(dates.windows(2).all(|w| w[0] < w[1]));
        Self {
            dates,
            sectors,
            columns,
        }
    }

    pub fn len(&self) -> usize {
        self.dates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }

    pub fn dates(&self) -> &[NaiveDate] {
        &self.dates
    }

    /// Sectors present as columns, in universe order.
    pub fn sectors(&self) -> &[Sector] {
        &self.sectors
    }

    pub fn column(&self, sector: Sector) -> Option<&[Option<f64>]> {
        self.sectors
            .iter()
            .position(|s| *s == sector)
            .map(|idx| self.columns[idx].as_slice())
    }

    pub fn series(&self, sector: Sector) -> Option<RatioSeries> {
        self.column(sector).map(|values| RatioSeries {
            sector,
            dates: self.dates.clone(),
            values: values.to_vec(),
        })
    }

    /// Keep the most recent `n` rows (all rows if fewer exist).
    pub fn tail(&self, n: usize) -> RatioTable {
        let start = self.len().saturating_sub(n);
        RatioTable {
            dates: self.dates[start..].to_vec(),
            sectors: self.sectors.clone(),
            columns: self.columns.iter().map(|c| c[start..].to_vec()).collect(),
        }
    }

    /// First and last date covered.
    pub fn date_range(&self) -> Option<(NaiveDate, NaiveDate)> {
        Some((*self.dates.first()?, *self.dates.last()?))
    }
}

/// Dated ratio series for a single sector.
#[derive(Debug, Clone, PartialEq)]
pub struct RatioSeries {
    pub sector: Sector,
    pub dates: Vec<NaiveDate>,
    pub values: Vec<Option<f64>>,
}

impl RatioSeries {
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Non-missing values in date order.
    pub fn observed(&self) -> Vec<f64> {
        self.values.iter().flatten().copied().collect()
    }

    /// Count of non-missing values.
    pub fn observed_count(&self) -> usize {
        self.values.iter().filter(|v| v.is_some()).count()
    }

    /// Values of the most recent `n` rows, gaps included.
    pub fn tail_values(&self, n: usize) -> &[Option<f64>] {
        let start = self.values.len().saturating_sub(n);
        &self.values[start..]
    }
}

fn filter_by_mask<T: Clone>(items: &[T], mask: &[bool]) -> Vec<T> {
    items
        .iter()
        .zip(mask)
        .filter(|(_, keep)| **keep)
        .map(|(item, _)| item.clone())
        .collect()
}
