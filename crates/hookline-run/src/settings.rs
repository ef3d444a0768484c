//! Runtime settings for hookline.
//!
//! [`Settings`] controls timeouts, fail-fast behavior and output. Use
//! [`Settings::default()`] for sensible defaults (300 s command timeout,
//! keep going after failures, colored output).
//!
//! # Settings file: `.hooklinerc`
//!
//! Similar to `.gitconfig`, hookline reads `.hooklinerc` files with TOML syntax:
//!
//! - **Global**: `~/.hooklinerc`, applies to all projects
//! - **Local**: `.hooklinerc` or `.hookline/.hooklinerc` in your project, overrides global
//!
//! ```toml
//! # .hooklinerc example
//! command_timeout = 120
//! fail_fast = true
//! colored = false
//! verbose = true
//! ```
//!
//! All fields are optional. Local values override global values, and
//! command-line flags override both.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::warn;

pub const SETTINGS_FILE_NAME: &str = ".hooklinerc";

/// Keys accepted in a settings file.
pub const KNOWN_KEYS: &[&str] = &["command_timeout", "fail_fast", "colored", "verbose"];

/// TOML-friendly intermediate representation (all fields optional).
#[derive(Debug, Deserialize, Default)]
#[serde(deny_unknown_fields)]
struct SettingsFile {
    /// Command timeout in seconds.
    command_timeout: Option<u64>,
    fail_fast: Option<bool>,
    colored: Option<bool>,
    verbose: Option<bool>,
}

/// Runtime settings.
///
/// # Defaults
///
/// | Setting | Default |
/// |---------|---------|
/// | `command_timeout` | 300 s |
/// | `fail_fast` | `false` |
/// | `colored` | `true` |
/// | `verbose` | `false` |
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    /// Maximum time one hook may run before it is killed.
    pub command_timeout: Duration,
    /// Stop running hooks after the first failure or error.
    pub fail_fast: bool,
    pub colored: bool,
    pub verbose: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            command_timeout: Duration::from_secs(300),
            fail_fast: false,
            colored: true,
            verbose: false,
        }
    }
}

impl Settings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads settings by merging global and local `.hooklinerc` files.
    ///
    /// 1. Loads `~/.hooklinerc` (global) if it exists
    /// 2. Searches for `.hooklinerc` or `.hookline/.hooklinerc` starting from `start_dir`
    /// 3. Local values override global values
    ///
    /// A file that cannot be read or parsed is logged and skipped, so a broken
    /// local file never discards valid global values.
    pub fn load(start_dir: impl AsRef<Path>) -> Self {
        Self::load_reporting(start_dir, |path, e| {
            warn!(path = %path.display(), error = %e, "ignoring settings file");
        })
    }

    /// Like [`load`](Self::load), but hands every skipped file and its error
    /// to `on_error`.
    pub fn load_reporting(
        start_dir: impl AsRef<Path>,
        on_error: impl FnMut(&Path, &anyhow::Error),
    ) -> Self {
        Self::load_from(Self::find_global(), Self::find_local(start_dir), on_error)
    }

    fn load_from(
        global: Option<PathBuf>,
        local: Option<PathBuf>,
        mut on_error: impl FnMut(&Path, &anyhow::Error),
    ) -> Self {
        let mut settings = Self::default();

        for path in global.iter().chain(local.iter()) {
            match Self::read_file(path) {
                Ok(file) => settings.apply(file),
                Err(e) => on_error(path, &e),
            }
        }

        settings
    }

    /// Loads settings from a specific file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let mut settings = Self::default();
        settings.apply(Self::read_file(path)?);
        Ok(settings)
    }

    /// Parses settings from a TOML string.
    pub fn from_toml_str(toml_str: &str) -> Result<Self> {
        let file: SettingsFile = toml::from_str(toml_str).context("Failed to parse settings")?;
        let mut settings = Self::default();
        settings.apply(file);
        Ok(settings)
    }

    fn read_file(path: &Path) -> Result<SettingsFile> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read settings file: {}", path.display()))?;
        toml::from_str(&content).with_context(|| format!("Failed to parse {}", path.display()))
    }

    fn apply(&mut self, file: SettingsFile) {
        if let Some(secs) = file.command_timeout {
            self.command_timeout = Duration::from_secs(secs.max(1));
        }
        if let Some(fail_fast) = file.fail_fast {
            self.fail_fast = fail_fast;
        }
        if let Some(colored) = file.colored {
            self.colored = colored;
        }
        if let Some(verbose) = file.verbose {
            self.verbose = verbose;
        }
    }

    /// Path of the global settings file, whether or not it exists.
    pub fn global_path() -> Option<PathBuf> {
        dirs::home_dir().map(|home| home.join(SETTINGS_FILE_NAME))
    }

    fn find_global() -> Option<PathBuf> {
        Self::global_path().filter(|p| p.is_file())
    }

    /// Walks up from `start_dir` looking for `.hooklinerc` or `.hookline/.hooklinerc`.
    pub fn find_local(start_dir: impl AsRef<Path>) -> Option<PathBuf> {
        let mut dir = start_dir.as_ref().to_path_buf();

        if let Ok(abs) = dir.canonicalize() {
            dir = abs;
        }

        loop {
            let rc_file = dir.join(SETTINGS_FILE_NAME);
            if rc_file.is_file() {
                return Some(rc_file);
            }

            let nested = dir.join(".hookline").join(SETTINGS_FILE_NAME);
            if nested.is_file() {
                return Some(nested);
            }

            if !dir.pop() {
                return None;
            }
        }
    }

    /// Applies command-line overrides on top of file settings.
    pub fn merge_cli_args(&mut self, timeout: Option<u64>, fail_fast: bool, verbose: bool, no_color: bool) {
        if let Some(secs) = timeout {
            self.command_timeout = Duration::from_secs(secs.max(1));
        }
        if fail_fast {
            self.fail_fast = true;
        }
        if verbose {
            self.verbose = true;
        }
        if no_color {
            self.colored = false;
        }
    }

    pub fn with_command_timeout(mut self, timeout: Duration) -> Self {
        self.command_timeout = timeout;
        self
    }

    pub fn with_fail_fast(mut self, fail_fast: bool) -> Self {
        self.fail_fast = fail_fast;
        self
    }
}
