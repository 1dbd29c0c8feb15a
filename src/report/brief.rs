//! Weekly brief template filling.
//!
//! Templates are plain markdown. Filling is line-based and leaves every
//! line it does not recognise untouched:
//! - header fields (`Week:`, `Date:`) and summary fields (`Top 3 Leaders:`,
//!   `Breadth:`, `Tilt:`, ...) are rewritten in place
//! - the first ranking table under `## 1. Relative Strength Ranking` is
//!   replaced by the current ranking
//! - structural-observation bullets are filled, or a neutral block is
//!   inserted when the template has none
//! - the state line under `## 4. Market Risk State` is replaced and the
//!   justification lines follow `Justification (max 3 lines).`

use crate::structure::{
    join_tickers, ChangeCount, SectorRecord, WeeklyClassification, MAX_JUSTIFICATION_LINES,
};

use super::blocks::ranking_table;

const RANKING_HEADING: &str = "## 1. Relative Strength Ranking";
const RANKING_HEADER: &str = "| Rank | ETF | 4W Direction | Leadership Status |";
const OBSERVATIONS_HEADING: &str = "## 2. Structural Observations";
const RISK_HEADING: &str = "## 4. Market Risk State";
const JUSTIFICATION_MARKER: &str = "Justification (max 3 lines).";
const CLOSING_PLACEHOLDER: &str = "Neutral structural summary.";

const SUMMARY_SIZE: usize = 3;

/// Everything a brief needs beyond the template text.
#[derive(Debug, Clone)]
pub struct BriefContext<'a> {
    pub week: String,
    pub date: String,
    pub classification: &'a WeeklyClassification,
    pub change: ChangeCount,
}

impl<'a> BriefContext<'a> {
    pub fn new(
        week: impl Into<String>,
        date: impl Into<String>,
        classification: &'a WeeklyClassification,
        change: ChangeCount,
    ) -> Self {
        Self {
            week: week.into(),
            date: date.into(),
            classification,
            change,
        }
    }

    fn leadership_line(&self) -> String {
        format!(
            "Leadership concentrated in {} sectors.",
            self.classification.persistent_leaders().len()
        )
    }

    fn defensive_line(&self) -> String {
        format!(
            "Defensive sectors show {} HH/HL structure count.",
            self.classification.summary.defensive_hh
        )
    }

    fn cyclical_line(&self) -> String {
        format!(
            "Cyclical sectors show {} HH/HL structure count.",
            self.classification.summary.cyclical_hh
        )
    }

    fn change_line(&self) -> String {
        format!(
            "Change vs prior week: {} sectors shifted classification.",
            self.change
        )
    }

    fn rotation_text(&self) -> String {
        let transitions = self.classification.transitions();
        if transitions.is_empty() {
            "n/a".to_string()
        } else {
            format!("TRANSITION sectors: {}", join_tickers(&transitions))
        }
    }

    fn closing_line(&self) -> String {
        let summary = &self.classification.summary;
        format!(
            "Closing statement: Breadth classified as {}. Leadership concentrated in {} sectors. Tilt condition: {}.",
            summary.breadth,
            self.classification.persistent_leaders().len(),
            summary.tilt
        )
    }

    /// Replacement for a single recognised field line.
    fn field_line(&self, line: &str) -> Option<String> {
        let result = self.classification;
        let tickers = |records: &[SectorRecord]| {
            join_tickers(&records.iter().map(|r| r.ticker).collect::<Vec<_>>())
        };

        let filled = if line.starts_with("Week:") {
            format!("Week: {}", self.week)
        } else if line.starts_with("Date:") {
            format!("Date: {}", self.date)
        } else if line.starts_with("Top 3 Leaders:") {
            format!("Top 3 Leaders: {}", tickers(result.top(SUMMARY_SIZE)))
        } else if line.starts_with("Bottom 3 Laggards:") || line.starts_with("Bottom 3 by 4W Rank:")
        {
            format!("Bottom 3 by 4W Rank: {}", tickers(result.bottom(SUMMARY_SIZE)))
        } else if line.starts_with("Breadth:") {
            format!("Breadth: {}", result.summary.breadth)
        } else if line.starts_with("Tilt:") {
            format!("Tilt: {}", result.summary.tilt)
        } else if line.starts_with("Change vs Last Week:") {
            format!("Change vs Last Week: {}", self.change)
        } else if line.starts_with("- Leadership concentration:") {
            format!("- {}", self.leadership_line())
        } else if line.starts_with("- Rotation signals:") {
            format!("- Rotation signals: {}", self.rotation_text())
        } else if line.starts_with("- Defensive behavior:") {
            format!("- {}", self.defensive_line())
        } else if line.starts_with("- Cyclical confirmation:") {
            format!("- {}", self.cyclical_line())
        } else if line.trim_end() == CLOSING_PLACEHOLDER {
            self.closing_line()
        } else {
            return None;
        };
        Some(filled)
    }
}

/// Fill `template` from `ctx`.
pub fn render_brief(template: &str, ctx: &BriefContext<'_>) -> String {
    let mut lines: Vec<String> = template.lines().map(str::to_string).collect();

    replace_ranking_table(&mut lines, &ranking_table(&ctx.classification.records));

    for line in lines.iter_mut() {
        if let Some(filled) = ctx.field_line(line) {
            *line = filled;
        }
    }

    insert_observations(&mut lines, ctx);
    fill_risk_state(&mut lines, ctx);

    for line in lines.iter_mut() {
        normalize_bullet(line);
    }

    let mut out = lines.join("\n");
    if template.ends_with('\n') {
        out.push('\n');
    }
    out
}

fn is_ranking_header(line: &str) -> bool {
    let mut cells = line.trim().trim_start_matches('|').split('|');
    line.trim_start().starts_with('|') && cells.next().is_some_and(|c| c.trim() == "Rank")
}

/// Replace the first ranking table after the section heading. Without the
/// heading, the first ranking header line is replaced instead.
fn replace_ranking_table(lines: &mut Vec<String>, table: &[String]) {
    if let Some(heading) = lines.iter().position(|l| l.trim_end() == RANKING_HEADING) {
        let start = lines[heading + 1..]
            .iter()
            .position(|l| !l.trim().is_empty())
            .map(|offset| heading + 1 + offset);
        if let Some(start) = start.filter(|s| is_ranking_header(&lines[*s])) {
            let end = lines[start..]
                .iter()
                .position(|l| l.trim().is_empty())
                .map_or(lines.len(), |offset| start + offset);
            lines.splice(start..end, table.iter().cloned());
            return;
        }
    }

    if let Some(header) = lines.iter().position(|l| l.trim() == RANKING_HEADER) {
        lines.splice(header..=header, table.iter().cloned());
    }
}

/// Insert the neutral observations block when the template has no bullets.
fn insert_observations(lines: &mut Vec<String>, ctx: &BriefContext<'_>) {
    let leadership = ctx.leadership_line();
    if lines.iter().any(|l| l.contains(&leadership)) {
        return;
    }
    let Some(heading) = lines.iter().position(|l| l.trim_end() == OBSERVATIONS_HEADING) else {
        return;
    };
    let block = [
        String::new(),
        leadership,
        String::new(),
        ctx.defensive_line(),
        String::new(),
        ctx.cyclical_line(),
        String::new(),
        ctx.change_line(),
        String::new(),
    ];
    lines.splice(heading + 1..heading + 1, block);
}

fn fill_risk_state(lines: &mut Vec<String>, ctx: &BriefContext<'_>) {
    let risk = &ctx.classification.risk;

    if let Some(heading) = lines.iter().position(|l| l.trim_end() == RISK_HEADING) {
        if let Some(offset) = lines[heading + 1..].iter().position(|l| !l.trim().is_empty()) {
            lines[heading + 1 + offset] = risk.state.to_string();
        }
    }

    if let Some(marker) = lines.iter().position(|l| l.trim() == JUSTIFICATION_MARKER) {
        let justification = risk
            .justification
            .iter()
            .take(MAX_JUSTIFICATION_LINES)
            .cloned();
        lines.splice(marker + 1..marker + 1, justification);
    }
}

/// `-Item` becomes `- Item`; a bare `TRANSITION → ...` line becomes a
/// bullet. Horizontal rules and tables are left alone.
fn normalize_bullet(line: &mut String) {
    if let Some(rest) = line.strip_prefix("TRANSITION") {
        if rest.trim_start().starts_with('→') && rest.trim_start().len() > '→'.len_utf8() {
            *line = format!("- {}", line);
            return;
        }
    }

    let mut chars = line.chars();
    if chars.next() == Some('-') {
        if let Some(next) = chars.next() {
            if !next.is_whitespace() && next != '-' {
                *line = format!("- {}", &line[1..]);
            }
        }
    }
}
