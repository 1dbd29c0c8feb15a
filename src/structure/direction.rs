//! Trend direction of a ratio series.
//!
//! The window is split into an earlier and a later half. Comparing the
//! extremes of the two halves gives the structure:
//! - HH/HL: later half makes a higher high and a higher low
//! - LH/LL: later half makes a lower high and a lower low
//! - TRANSITION: one side shifted without its partner
//! - RANGE: no shift beyond the noise guard

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::config::EngineConfig;

/// Trend label for one sector over one window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    #[serde(rename = "HH/HL")]
    HigherHighs,
    #[serde(rename = "LH/LL")]
    LowerLows,
    #[serde(rename = "RANGE")]
    Range,
    #[serde(rename = "TRANSITION")]
    Transition,
}

impl Direction {
    pub const ALL: [Direction; 4] = [
        Self::HigherHighs,
        Self::LowerLows,
        Self::Range,
        Self::Transition,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::HigherHighs => "HH/HL",
            Self::LowerLows => "LH/LL",
            Self::Range => "RANGE",
            Self::Transition => "TRANSITION",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Direction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let label = s.trim();
        Self::ALL
            .iter()
            .copied()
            .find(|d| d.as_str().eq_ignore_ascii_case(label))
            .ok_or_else(|| format!("Unknown direction label: {}", s))
    }
}

/// Extremes of the two half-windows.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HalfExtremes {
    pub max1: f64,
    pub min1: f64,
    pub max2: f64,
    pub min2: f64,
}

impl HalfExtremes {
    /// Extremes of `earlier` and `later`; `None` if either half is empty.
    pub fn from_halves(earlier: &[f64], later: &[f64]) -> Option<Self> {
        let (max1, min1) = extremes(earlier)?;
        let (max2, min2) = extremes(later)?;
        Some(Self {
            max1,
            min1,
            max2,
            min2,
        })
    }

    /// Apply the half-to-half decision with noise guard `epsilon`.
    pub fn direction(&self, epsilon: f64) -> Direction {
        let higher_high = self.max2 > self.max1 + epsilon;
        let higher_low = self.min2 > self.min1 + epsilon;
        let lower_high = self.max2 < self.max1 - epsilon;
        let lower_low = self.min2 < self.min1 - epsilon;

        if higher_high && higher_low {
            return Direction::HigherHighs;
        }
        if lower_high && lower_low {
            return Direction::LowerLows;
        }

        // A high or low moved without its partner.
        if higher_high != higher_low || lower_high != lower_low {
            return Direction::Transition;
        }

        Direction::Range
    }
}

fn extremes(values: &[f64]) -> Option<(f64, f64)> {
    let first = *values.first()?;
    Some(
        values
            .iter()
            .fold((first, first), |(max, min), v| (max.max(*v), min.min(*v))),
    )
}

/// Label a windowed series.
///
/// Missing values are dropped first. With fewer than `config.days` observed
/// points the series is labelled `RANGE`, the conservative default.
pub fn classify_direction(values: &[Option<f64>], config: &EngineConfig) -> Direction {
    let observed: Vec<f64> = values.iter().flatten().copied().collect();
    if observed.len() < config.days {
        return Direction::Range;
    }

    let window = &observed[observed.len() - config.days..];
    let (earlier, later) = window.split_at(config.half);

    match HalfExtremes::from_halves(earlier, later) {
        Some(extremes) => extremes.direction(config.epsilon),
        None => Direction::Range,
    }
}
