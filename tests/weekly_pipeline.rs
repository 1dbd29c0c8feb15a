//! Closes -> ratios -> classification -> outputs -> brief, through files.

use std::fs;
use std::path::Path;

use chrono::{Duration, NaiveDate};
use tempfile::TempDir;

use sector_structure::data::{DataLoader, LoaderError, RatioBuilder};
use sector_structure::report::{
    read_classification_json, read_prior_summary, render_brief, write_weekly_outputs,
    BriefContext,
};
use sector_structure::structure::{
    detect_changes, Breadth, ChangeCount, Direction, Leadership, RiskState, Tilt,
};
use sector_structure::{EngineConfig, Sector, SectorUniverse, StructureEngine};

const TEMPLATE: &str = include_str!("../templates/weekly_brief.md");

/// SPY flat at 100; four cyclicals climbing, XLP/XLU sliding, the rest flat.
fn close(ticker: &str, session: usize) -> f64 {
    let i = session as f64;
    match ticker {
        "SPY" => 100.0,
        "XLK" => 50.0 + i * 1.0,
        "XLF" => 50.0 + i * 0.8,
        "XLI" => 50.0 + i * 0.6,
        "XLY" => 50.0 + i * 0.4,
        "XLP" | "XLU" => 80.0 - i * 0.5,
        _ => 60.0,
    }
}

fn write_closes(path: &Path, sessions: usize) {
    let tickers = [
        "SPY", "XLB", "XLE", "XLF", "XLI", "XLK", "XLP", "XLU", "XLV", "XLY", "XLC", "XLRE",
    ];
    let start = NaiveDate::from_ymd_opt(2026, 1, 1).unwrap();
    let mut text = format!("Date,{}\n", tickers.join(","));
    for session in 0..sessions {
        let date = start + Duration::days(session as i64);
        let row: Vec<String> = tickers
            .iter()
            .map(|t| format!("{:.2}", close(t, session)))
            .collect();
        text.push_str(&format!("{},{}\n", date, row.join(",")));
    }
    fs::write(path, text).unwrap();
}

fn build_ratios(dir: &Path, sessions: usize) -> std::path::PathBuf {
    let closes_path = dir.join("closes.csv");
    write_closes(&closes_path, sessions);

    let universe = SectorUniverse::default();
    let loader = DataLoader::new(universe.clone());
    let closes = loader.load_closes(&closes_path).unwrap();
    let build = RatioBuilder::new(&universe, "SPY", 20).build(&closes).unwrap();

    let wide_path = dir.join("ratios_wide.csv");
    build.write_wide(&wide_path).unwrap();
    wide_path
}

fn engine() -> StructureEngine {
    StructureEngine::new(EngineConfig::default(), SectorUniverse::default()).unwrap()
}

#[test]
fn test_full_weekly_pipeline() {
    let dir = TempDir::new().unwrap();
    let wide_path = build_ratios(dir.path(), 25);

    let loader = DataLoader::new(SectorUniverse::default());
    let ratios = loader.load_ratios(&wide_path).unwrap();
    assert_eq!(ratios.len(), 20);

    let result = engine().classify(&ratios).unwrap();

    let order: Vec<Sector> = result.records.iter().map(|r| r.ticker).collect();
    assert_eq!(
        order,
        vec![
            Sector::XLK,
            Sector::XLF,
            Sector::XLI,
            Sector::XLY,
            Sector::XLB,
            Sector::XLE,
            Sector::XLV,
            Sector::XLC,
            Sector::XLRE,
            Sector::XLP,
            Sector::XLU,
        ]
    );
    assert_eq!(result.records[0].direction, Direction::HigherHighs);
    assert_eq!(result.records[2].leadership, Leadership::PersistentLeader);
    assert_eq!(result.records[3].leadership, Leadership::EmergingLeader);
    assert_eq!(result.records[4].direction, Direction::Range);
    assert_eq!(result.records[10].direction, Direction::LowerLows);
    assert_eq!(result.records[10].leadership, Leadership::Weak);

    assert_eq!(result.summary.breadth, Breadth::BroadParticipation);
    assert_eq!(result.summary.tilt, Tilt::Cyclical);
    assert_eq!(result.risk.state, RiskState::RiskOn);
    assert_eq!(
        result.risk.justification,
        vec![
            "HH/HL sectors count: 4.",
            "Tilt: Cyclical Tilt.",
            "LH/LL sectors count: 2.",
        ]
    );

    let outdir = dir.path().join("out");
    let outputs = write_weekly_outputs(&result, &outdir).unwrap();
    assert!(outputs.blocks.exists());

    let summary = fs::read_to_string(&outputs.summary).unwrap();
    assert!(summary.starts_with("Rank,Ticker,Ret_4W,Ret_5D,Direction,Leadership\n1,XLK,"));

    let restored = read_classification_json(&outputs.classification, &SectorUniverse::default())
        .unwrap();
    assert_eq!(restored.summary, result.summary);
    assert_eq!(restored.labels(), result.labels());
    assert_eq!(restored.risk, result.risk);

    let prior = read_prior_summary(&outputs.summary).unwrap();
    assert_eq!(
        detect_changes(&result.labels(), Some(prior.as_slice())),
        ChangeCount::Changed(0)
    );

    let ctx = BriefContext::new("2026_W04", "2026-01-23", &restored, ChangeCount::Changed(0));
    let brief = render_brief(TEMPLATE, &ctx);
    assert!(brief.contains("Week: 2026_W04\n"));
    assert!(brief.contains("| 1 | XLK | HH/HL | Persistent Leader |\n"));
    assert!(brief.contains("Top 3 Leaders: XLK, XLF, XLI\n"));
    assert!(brief.contains("Bottom 3 by 4W Rank: XLRE, XLP, XLU\n"));
    assert!(brief.contains("Change vs Last Week: 0\n"));
    assert!(brief.contains("- Leadership concentrated in 3 sectors.\n"));
    assert!(brief.contains("- Cyclical sectors show 4 HH/HL structure count.\n"));
    assert!(brief.contains("## 4. Market Risk State\n\nRisk-On\n"));
    assert!(brief.contains("Justification (max 3 lines).\nHH/HL sectors count: 4.\n"));
    assert!(brief.contains(
        "Closing statement: Breadth classified as Broad Participation. \
         Leadership concentrated in 3 sectors. Tilt condition: Cyclical Tilt.\n"
    ));
    assert!(brief.contains("No forecast language.\n"));
}

#[test]
fn test_short_history_is_insufficient() {
    let dir = TempDir::new().unwrap();
    let wide_path = build_ratios(dir.path(), 12);

    let ratios = DataLoader::new(SectorUniverse::default())
        .load_ratios(&wide_path)
        .unwrap();
    let err = engine().classify(&ratios).unwrap_err();
    assert!(matches!(
        err,
        LoaderError::InsufficientData {
            required: 20,
            found: 12
        }
    ));
}

#[test]
fn test_missing_benchmark_column() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("closes.csv");
    fs::write(&path, "Date,XLK,XLU\n2026-01-02,200,70\n").unwrap();

    let universe = SectorUniverse::default();
    let closes = DataLoader::new(universe.clone()).load_closes(&path).unwrap();
    let err = RatioBuilder::new(&universe, "SPY", 20).build(&closes).unwrap_err();
    assert!(matches!(err, LoaderError::MissingBenchmark(b) if b == "SPY"));
}

#[test]
fn test_prior_week_changes_are_counted() {
    let dir = TempDir::new().unwrap();
    let wide_path = build_ratios(dir.path(), 25);
    let ratios = DataLoader::new(SectorUniverse::default())
        .load_ratios(&wide_path)
        .unwrap();
    let result = engine().classify(&ratios).unwrap();

    let prior_path = dir.path().join("prior.csv");
    fs::write(
        &prior_path,
        "Rank,Ticker,Ret_4W,Ret_5D,Direction,Leadership\n\
         1,XLK,0.1,0.01,HH/HL,Persistent Leader\n\
         2,XLU,0.05,0.0,HH/HL,Persistent Leader\n\
         3,XLE,0.0,0.0,TRANSITION,Fading\n",
    )
    .unwrap();
    let prior = read_prior_summary(&prior_path).unwrap();
    assert_eq!(
        detect_changes(&result.labels(), Some(prior.as_slice())),
        ChangeCount::Changed(2)
    );

    let missing = read_prior_summary(&dir.path().join("nope.csv")).unwrap_err();
    assert!(matches!(missing, LoaderError::FileNotFound(_)));
}
