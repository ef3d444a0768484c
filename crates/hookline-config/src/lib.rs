//! # hookline config
//!
//! Hook declarations and the `.hookline.toml` loader.
//!
//! ## Overview
//!
//! - **Declarations**: [`HookDeclaration`] describes one hook: what to run,
//!   which file types it applies to, which paths to include or exclude and
//!   whether it rewrites files.
//! - **Loading**: [`parse`] / [`load_file`] turn TOML into a [`HookConfig`],
//!   validating ids, entries, patterns and timeouts up front.
//! - **Errors**: every [`ConfigError`] is fatal to a run and carries a
//!   [`Span`] when the location is known.
//!
//! ## Example
//!
//! ```rust
//! use hookline_config::parse;
//!
//! let config = parse(r#"
//!     [[repos]]
//!     repo = "local"
//!
//!     [[repos.hooks]]
//!     id = "check-yaml"
//!     types = ["yaml"]
//! "#).expect("valid config");
//!
//! assert_eq!(config.hooks.len(), 1);
//! assert_eq!(config.hooks[0].entry, vec!["check-yaml"]);
//! ```
//!
//! ## Format
//!
//! ```text
//! exclude = "^vendor/"        global exclude, optional
//! fail_fast = false
//!
//! [tags]                      extra extension tags
//! protobuf = ["proto"]
//!
//! [[repos]]
//! repo = "local"              local | system | meta | <url>
//!
//! [[repos.hooks]]
//! id, name, entry, args, types, files, exclude,
//! fixing, pass_filenames, timeout
//! ```

pub mod decl;
pub mod error;
pub mod parser;

pub use decl::{HookConfig, HookDeclaration, HookSource};
pub use error::{ConfigError, Span};
pub use parser::{CONFIG_FILE_NAME, find_config, load_file, parse};
