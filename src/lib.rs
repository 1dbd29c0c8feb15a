pub mod config;
pub mod data;
pub mod report;
pub mod structure;
pub mod universe;

// Re-export commonly used types
pub use config::{ConfigError, EngineConfig, Settings, UniverseConfig};
pub use data::{DataLoader, LoaderError, RatioBuilder, RatioTable};
pub use report::{render_brief, write_weekly_outputs, BriefContext, ReportError};
pub use structure::{
    detect_changes, Breadth, ChangeCount, Direction, Leadership, RiskState, SectorRecord,
    StructureEngine, Tilt, WeeklyClassification,
};
pub use universe::{Sector, SectorUniverse};
