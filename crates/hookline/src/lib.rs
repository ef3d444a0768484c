//! # hookline
//!
//! Ordered pre-commit hook orchestration.
//!
//! A run loads hook declarations from `.hookline.toml`, classifies the
//! working file set into type tags, narrows it per hook, executes matching
//! hooks one at a time in declared order and folds their outcomes into a
//! single [`RunReport`].
//!
//! ```rust,no_run
//! use hookline::prelude::*;
//!
//! let config = load_file(std::path::Path::new(".hookline.toml")).expect("valid config");
//! let root = repo_root(".").expect("inside a git repository");
//! let files = collect_files(&root, &FileSelection::Staged).expect("git works");
//!
//! let records = FileClassifier::new().classify_all(&root, &files);
//! let report = Orchestrator::from_config(&config, HookRunner::new(&root)).run(&records);
//!
//! std::process::exit(report.exit_code());
//! ```

pub use hookline_config::{
    CONFIG_FILE_NAME, ConfigError, HookConfig, HookDeclaration, HookSource, Span, find_config,
    load_file, parse,
};
pub use hookline_git::{FileSelection, collect_files, repo_root};
pub use hookline_run::{
    Classification, FileClassifier, FileRecord, HookResult, HookRunner, HookStatus, MatchSet,
    Orchestrator, Phase, RunOptions, RunReport, Settings, match_files,
};

pub use hookline_config;
pub use hookline_git;
pub use hookline_run;

pub mod prelude {
    pub use crate::{FileClassifier, HookRunner, Orchestrator, RunOptions};
    pub use crate::{FileSelection, collect_files, load_file, repo_root};
    pub use crate::{HookDeclaration, HookStatus, RunReport};
}
