//! Weekly structure classification.
//!
//! Labels each sector's ratio series by direction and leadership, then
//! reduces the labelled set to breadth, tilt and a market risk state.
//! Week-over-week change detection compares label sets between runs.

pub mod breadth;
pub mod change;
pub mod direction;
pub mod engine;
pub mod leadership;
pub mod record;
pub mod risk_state;

pub use breadth::{classify_breadth, classify_tilt, Breadth, DirectionCounts, TagCounts, Tilt};
pub use change::{detect_changes, ChangeCount};
pub use direction::{classify_direction, Direction, HalfExtremes};
pub use engine::{
    rank_order, ratio_return, StructureEngine, StructureSummary, WeeklyClassification,
    SHORT_RETURN_SESSIONS,
};
pub use leadership::{classify_leadership, Leadership, LEADER_RANK_CUTOFF};
pub use record::{persistent_leaders, tickers_where, transitions, SectorLabels, SectorRecord};
pub use risk_state::{
    assess_risk, evaluate_rules, join_tickers, RiskAssessment, RiskInputs, RiskState,
    MAX_JUSTIFICATION_LINES,
};
