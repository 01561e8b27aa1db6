pub mod config;
pub mod engine;
pub mod error;
pub mod grouper;
pub mod parser;
pub mod progress;
pub mod ranker;
pub mod scanner;
pub mod staging;

pub use config::AppConfig;
pub use engine::{DedupeEngine, DryRunReport, ReportGroup};
pub use error::Error;
pub use parser::{parse_filename, DumpQuality, FileMetadata, FilenameParser};
pub use progress::{ProgressReporter, SilentReporter};
pub use ranker::{RankPolicy, RankResult, ScoreKey};
pub use scanner::RomEntry;
pub use staging::{ApplyOptions, ApplyOutcome, OnConflict, RestoreOutcome};
