//! Markdown blocks for pasting into a weekly brief.

use crate::structure::{SectorRecord, WeeklyClassification};

pub const BLOCKS_FILE: &str = "weekly_brief_blocks.md";

/// Sectors shown in the top and bottom blocks.
const BLOCK_SIZE: usize = 3;

/// Percent with two decimals, `n/a` when undefined.
pub fn fmt_pct(value: Option<f64>) -> String {
    match value {
        Some(v) => format!("{:.2}%", v * 100.0),
        None => "n/a".to_string(),
    }
}

fn block_line(record: &SectorRecord) -> String {
    format!(
        "- {}: {} | {} | {}",
        record.ticker,
        fmt_pct(record.return_4w),
        record.direction,
        record.leadership
    )
}

/// Rank/ETF/direction/leadership table used by brief templates.
pub fn ranking_table(records: &[SectorRecord]) -> Vec<String> {
    let mut lines = vec![
        "| Rank | ETF | 4W Direction | Leadership Status |".to_string(),
        "|---:|:---:|:---:|:---|".to_string(),
    ];
    lines.extend(records.iter().map(|r| {
        format!(
            "| {} | {} | {} | {} |",
            r.rank, r.ticker, r.direction, r.leadership
        )
    }));
    lines
}

/// Render the snapshot, top/bottom and full ranking blocks.
///
/// The bottom block lists the worst-ranked sector first.
pub fn render_blocks(result: &WeeklyClassification) -> String {
    let summary = &result.summary;
    let mut lines = vec![
        "# Weekly Brief Blocks (Copy/Paste)".to_string(),
        String::new(),
        "## Snapshot".to_string(),
        format!("- Sessions used: {}", summary.sessions_used),
        format!("- Breadth: {}", summary.breadth),
        format!("- Tilt: {}", summary.tilt),
        String::new(),
        "## Top 3 (4W Ratio Return)".to_string(),
    ];
    lines.extend(result.top(BLOCK_SIZE).iter().map(block_line));
    lines.push(String::new());

    lines.push("## Bottom 3 (4W Ratio Return)".to_string());
    lines.extend(result.bottom(BLOCK_SIZE).iter().rev().map(block_line));
    lines.push(String::new());

    lines.push("## Full Ranking Table (for template)".to_string());
    lines.push("| Rank | Ticker | 4W Ret | 5D Ret | Direction | Leadership |".to_string());
    lines.push("|---:|:---:|---:|---:|:---:|:---|".to_string());
    lines.extend(result.records.iter().map(|r| {
        format!(
            "| {} | {} | {} | {} | {} | {} |",
            r.rank,
            r.ticker,
            fmt_pct(r.return_4w),
            fmt_pct(r.return_5d),
            r.direction,
            r.leadership
        )
    }));
    lines.push(String::new());

    lines.join("\n")
}
