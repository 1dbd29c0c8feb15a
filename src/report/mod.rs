//! Weekly outputs: summary CSV, classification JSON, markdown blocks and
//! filled brief templates.

pub mod blocks;
pub mod brief;
pub mod export;

use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::info;

use crate::data::LoaderError;
use crate::structure::WeeklyClassification;

pub use blocks::{fmt_pct, ranking_table, render_blocks, BLOCKS_FILE};
pub use brief::{render_brief, BriefContext};
pub use export::{
    prior_from_reader, read_classification_json, read_prior_summary, write_classification_json,
    write_summary, write_summary_csv, ClassificationMeta, ClassificationPayload,
    CLASSIFICATION_FILE, SUMMARY_FILE,
};

#[derive(Error, Debug)]
pub enum ReportError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Loader(#[from] LoaderError),
}

/// Paths written by [`write_weekly_outputs`].
#[derive(Debug, Clone)]
pub struct WeeklyOutputs {
    pub summary: PathBuf,
    pub classification: PathBuf,
    pub blocks: PathBuf,
}

/// Write the summary CSV, classification JSON and markdown blocks into
/// `outdir`, creating it if needed.
pub fn write_weekly_outputs(
    result: &WeeklyClassification,
    outdir: &Path,
) -> Result<WeeklyOutputs, ReportError> {
    std::fs::create_dir_all(outdir)?;

    let outputs = WeeklyOutputs {
        summary: outdir.join(SUMMARY_FILE),
        classification: outdir.join(CLASSIFICATION_FILE),
        blocks: outdir.join(BLOCKS_FILE),
    };

    write_summary_csv(&result.records, &outputs.summary)?;
    write_classification_json(result, &outputs.classification)?;
    std::fs::write(&outputs.blocks, render_blocks(result))?;

    info!(outdir = %outdir.display(), "Wrote weekly outputs");
    Ok(outputs)
}
