pub mod action_log;
pub mod analyzer;
pub mod classifier;
pub mod config;
pub mod conflict;
pub mod engine;
pub mod error;
pub mod fs_ops;
pub mod metadata;
pub mod namer;
pub mod organize;
pub mod progress;
pub mod reconcile;
pub mod scanner;

pub use action_log::{ActionLog, LogEntry};
pub use analyzer::{ContentAnalyzer, DisableReason};
pub use classifier::Category;
pub use config::{AppConfig, RootFolder};
pub use engine::{FilePlan, Organizer};
pub use error::Error;
pub use organize::OrganizeStats;
pub use progress::{ProgressReporter, SilentReporter};
pub use reconcile::ReanalysisStats;
