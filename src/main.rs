//! Weekly sector structure CLI.
//!
//! ```bash
//! # Build sector/SPY ratios from an already-fetched closes table
//! sector-structure ratios --closes data/closes.csv --outdir out --per-ticker
//!
//! # Classify the last 20 sessions
//! sector-structure classify --infile out/ratios_wide.csv --outdir out
//!
//! # Fill the weekly brief template
//! sector-structure brief --template templates/weekly_brief.md \
//!     --classification out/weekly_classification.json --week 2026_W03 \
//!     --prev-summary archive/2026_W02/weekly_structure_summary.csv
//! ```

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::{info, warn};

use sector_structure::data::{DataLoader, RatioBuilder};
use sector_structure::report::{self, read_classification_json, read_prior_summary};
use sector_structure::structure::detect_changes;
use sector_structure::{render_brief, BriefContext, ChangeCount, Settings, StructureEngine};

const SEPARATOR: &str = "============================================================";

#[derive(Parser)]
#[command(name = "sector-structure")]
#[command(about = "Weekly sector-vs-benchmark structure classification")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Optional TOML settings file
    #[arg(long, global = true)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Build sector/benchmark ratios from a wide closes CSV
    Ratios {
        /// Wide closes CSV (Date plus one column per ticker)
        #[arg(long, default_value = "data/closes.csv")]
        closes: PathBuf,

        /// Output directory
        #[arg(long, default_value = "out")]
        outdir: PathBuf,

        /// Sessions to keep (defaults to the configured window)
        #[arg(long)]
        days: Option<usize>,

        /// Also write one CSV per sector
        #[arg(long)]
        per_ticker: bool,
    },

    /// Classify the most recent window of a ratio table
    Classify {
        /// Wide ratio CSV
        #[arg(long, default_value = "out/ratios_wide.csv")]
        infile: PathBuf,

        /// Output directory
        #[arg(long, default_value = "out")]
        outdir: PathBuf,

        /// Sessions in the window
        #[arg(long)]
        days: Option<usize>,

        /// Sessions in the earlier half-window
        #[arg(long)]
        half: Option<usize>,

        /// Noise guard for half-to-half comparisons
        #[arg(long)]
        epsilon: Option<f64>,
    },

    /// Fill a weekly brief template
    Brief {
        /// Markdown template
        #[arg(long, default_value = "templates/weekly_brief.md")]
        template: PathBuf,

        /// Classification JSON written by `classify`
        #[arg(long, default_value = "out/weekly_classification.json")]
        classification: PathBuf,

        /// Week code, e.g. 2026_W03
        #[arg(long)]
        week: String,

        /// Date shown in the brief (defaults to today)
        #[arg(long)]
        date: Option<String>,

        /// Prior week's summary CSV for change detection
        #[arg(long)]
        prev_summary: Option<PathBuf>,

        /// Output path (defaults to briefs/<week>.md)
        #[arg(long)]
        out: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("sector_structure=info".parse()?),
        )
        .init();

    let cli = Cli::parse();
    let settings = Settings::load_or_default(cli.config.as_deref())
        .context("Failed to load settings")?;

    match cli.command {
        Commands::Ratios {
            closes,
            outdir,
            days,
            per_ticker,
        } => cmd_ratios(&settings, &closes, &outdir, days, per_ticker),
        Commands::Classify {
            infile,
            outdir,
            days,
            half,
            epsilon,
        } => {
            let mut settings = settings;
            if let Some(days) = days {
                settings.window.days = days;
            }
            if let Some(half) = half {
                settings.window.half = half;
            }
            if let Some(epsilon) = epsilon {
                settings.window.epsilon = epsilon;
            }
            cmd_classify(&settings, &infile, &outdir)
        }
        Commands::Brief {
            template,
            classification,
            week,
            date,
            prev_summary,
            out,
        } => {
            let date = date.unwrap_or_else(|| chrono::Local::now().date_naive().to_string());
            let out = out.unwrap_or_else(|| Path::new("briefs").join(format!("{}.md", week)));
            cmd_brief(
                &settings,
                &template,
                &classification,
                &week,
                &date,
                prev_summary.as_deref(),
                &out,
            )
        }
    }
}

fn cmd_ratios(
    settings: &Settings,
    closes: &Path,
    outdir: &Path,
    days: Option<usize>,
    per_ticker: bool,
) -> Result<()> {
    let universe = settings.universe.build()?;
    let days = days.unwrap_or(settings.window.days);

    let loader = DataLoader::new(universe.clone());
    let table = loader
        .load_closes(closes)
        .with_context(|| format!("Failed to load closes from {}", closes.display()))?;

    let build = RatioBuilder::new(&universe, &settings.universe.benchmark, days).build(&table)?;

    std::fs::create_dir_all(outdir)
        .with_context(|| format!("Failed to create {}", outdir.display()))?;
    let wide_path = outdir.join("ratios_wide.csv");
    let long_path = outdir.join("ratios_long.csv");
    build.write_wide(&wide_path)?;
    build.write_long(&long_path)?;

    println!("Wrote:");
    println!("- {}", wide_path.display());
    println!("- {}", long_path.display());

    if per_ticker {
        let written = build.write_per_ticker(outdir, days)?;
        info!(files = written.len(), "Wrote per-ticker ratio files");
        println!("- Per-ticker CSVs in {}", outdir.display());
    }
    Ok(())
}

fn cmd_classify(settings: &Settings, infile: &Path, outdir: &Path) -> Result<()> {
    let universe = settings.universe.build()?;
    let loader = DataLoader::new(universe.clone());
    let table = loader
        .load_ratios(infile)
        .with_context(|| format!("Failed to load ratios from {}", infile.display()))?;

    let engine = StructureEngine::new(settings.window, universe)?;
    let result = engine.classify(&table)?;
    let outputs = report::write_weekly_outputs(&result, outdir)?;

    println!("Wrote:");
    println!("- {}", outputs.summary.display());
    println!("- {}", outputs.classification.display());
    println!("- {}", outputs.blocks.display());
    println!(
        "Meta: Breadth={} | Tilt={} | HH/HL={}",
        result.summary.breadth, result.summary.tilt, result.summary.counts.hh_hl
    );
    Ok(())
}

fn cmd_brief(
    settings: &Settings,
    template: &Path,
    classification: &Path,
    week: &str,
    date: &str,
    prev_summary: Option<&Path>,
    out: &Path,
) -> Result<()> {
    let universe = settings.universe.build()?;
    let template_text = std::fs::read_to_string(template)
        .with_context(|| format!("Template not found: {}", template.display()))?;
    let result = read_classification_json(classification, &universe)
        .with_context(|| format!("Failed to read {}", classification.display()))?;

    let prior = match prev_summary {
        Some(path) if path.exists() => Some(read_prior_summary(path)?),
        Some(path) => {
            warn!(path = %path.display(), "Prior summary not found; change count is n/a");
            None
        }
        None => None,
    };
    let change = match &prior {
        Some(labels) => detect_changes(&result.labels(), Some(labels.as_slice())),
        None => ChangeCount::NotApplicable,
    };

    let ctx = BriefContext::new(week, date, &result, change);
    let filled = render_brief(&template_text, &ctx);

    if let Some(parent) = out.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(out, filled).with_context(|| format!("Failed to write {}", out.display()))?;

    println!("{}", SEPARATOR);
    println!("Week {} | Risk state: {} | Change vs last week: {}", week, result.risk.state, change);
    println!("{}", SEPARATOR);
    println!("Wrote:");
    println!("- {}", out.display());
    Ok(())
}
