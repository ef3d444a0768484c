use crate::error::Span;
use regex::Regex;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::time::Duration;

/// Where a group of hooks comes from.
///
/// Remote sources are only recorded; their executables must already be
/// resolvable on `PATH`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HookSource {
    Local,
    System,
    Meta,
    Remote(String),
}

impl HookSource {
    pub fn parse(repo: &str) -> Self {
        match repo.trim() {
            "local" => HookSource::Local,
            "system" => HookSource::System,
            "meta" => HookSource::Meta,
            other => HookSource::Remote(other.to_string()),
        }
    }

    pub fn is_remote(&self) -> bool {
        matches!(self, HookSource::Remote(_))
    }

    pub fn as_str(&self) -> &str {
        match self {
            HookSource::Local => "local",
            HookSource::System => "system",
            HookSource::Meta => "meta",
            HookSource::Remote(url) => url,
        }
    }
}

impl fmt::Display for HookSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One configured hook.
///
/// `types`, `files` and `exclude` are combined conjunctively: a path must
/// carry one of the types, match `files` and not match `exclude`.
#[derive(Debug, Clone)]
pub struct HookDeclaration {
    pub source: HookSource,
    pub id: String,
    pub name: Option<String>,
    /// Program followed by any arguments embedded in the `entry` string.
    pub entry: Vec<String>,
    pub args: Vec<String>,
    pub types: BTreeSet<String>,
    pub files: Option<Regex>,
    pub exclude: Option<Regex>,
    /// Fixing hooks may rewrite the files they are given.
    pub fixing: bool,
    pub pass_filenames: bool,
    pub timeout: Option<Duration>,
    pub span: Option<Span>,
}

impl HookDeclaration {
    /// Creates a local checking hook whose entry is a single program.
    pub fn new(id: impl Into<String>, program: impl Into<String>) -> Self {
        Self {
            source: HookSource::Local,
            id: id.into(),
            name: None,
            entry: vec![program.into()],
            args: Vec::new(),
            types: BTreeSet::new(),
            files: None,
            exclude: None,
            fixing: false,
            pass_filenames: true,
            timeout: None,
            span: None,
        }
    }

    pub fn with_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args = args.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_types<I, S>(mut self, types: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.types = types.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_files(mut self, pattern: Regex) -> Self {
        self.files = Some(pattern);
        self
    }

    pub fn with_exclude(mut self, pattern: Regex) -> Self {
        self.exclude = Some(pattern);
        self
    }

    pub fn with_source(mut self, source: HookSource) -> Self {
        self.source = source;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn fixing(mut self) -> Self {
        self.fixing = true;
        self
    }

    pub fn without_filenames(mut self) -> Self {
        self.pass_filenames = false;
        self
    }

    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.id)
    }

    /// True when nothing narrows the file set, so the hook runs once for the
    /// whole repository instead of per file list. `pass_filenames` plays no
    /// part here; it only decides whether matched paths become arguments.
    pub fn is_unrestricted(&self) -> bool {
        self.types.is_empty() && self.files.is_none() && self.exclude.is_none()
    }

    /// The fixed part of the command line: entry followed by `args`.
    pub fn command_line(&self) -> Vec<String> {
        self.entry.iter().chain(self.args.iter()).cloned().collect()
    }
}

/// A fully validated hook config.
#[derive(Debug, Clone, Default)]
pub struct HookConfig {
    /// Declarations in execution order.
    pub hooks: Vec<HookDeclaration>,
    /// Paths matching this are removed before any hook is matched.
    pub exclude: Option<Regex>,
    pub fail_fast: bool,
    /// Extra extension-based tags: tag name to extensions without the dot.
    pub tags: BTreeMap<String, Vec<String>>,
}

impl HookConfig {
    pub fn hook(&self, id: &str) -> Option<&HookDeclaration> {
        self.hooks.iter().find(|h| h.id == id)
    }
}
