//! # hookline run
//!
//! Everything between a loaded config and a [`RunReport`]:
//!
//! - [`FileClassifier`] tags each path of the working file set
//! - [`match_files`] narrows those records down per hook
//! - [`HookRunner`] executes one hook as a process and judges the outcome
//! - [`Orchestrator`] runs all hooks in order and aggregates the statuses
//!
//! [`Settings`] holds the `.hooklinerc` values that tune a run.

pub mod classify;
pub mod matcher;
pub mod orchestrator;
pub mod report;
pub mod runner;
pub mod settings;

pub use classify::{Classification, FileClassifier, FileRecord, PathKind, Probe};
pub use matcher::{MatchSet, match_files, matches};
pub use orchestrator::{Orchestrator, Phase, RunOptions};
pub use report::{HookResult, HookStatus, RunReport};
pub use runner::HookRunner;
pub use settings::Settings;
