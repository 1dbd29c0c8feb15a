//! Ratio data: wide CSV loading, windowing and ratio construction.

pub mod loader;
pub mod ratios;
pub mod types;

pub use loader::{read_wide_csv, tail_sessions, DataLoader, LoaderError, DATE_COLUMN};
pub use ratios::{fmt_cell, RatioBuild, RatioBuilder};
pub use types::{RatioSeries, RatioTable, WideTable};
