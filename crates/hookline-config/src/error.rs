use std::fmt;
use std::ops::Range;
use std::path::PathBuf;

/// A location inside a config source, 1-based line/column plus byte offsets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Span {
    pub line: usize,
    pub col: usize,
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(line: usize, col: usize, start: usize, end: usize) -> Self {
        Self { line, col, start, end }
    }

    /// Converts a byte range reported by the TOML deserializer into a span.
    pub fn from_range(source: &str, range: Range<usize>) -> Self {
        let start = range.start.min(source.len());
        let end = range.end.clamp(start, source.len());

        let mut line = 1;
        let mut line_start = 0;
        for (idx, ch) in source.char_indices() {
            if idx >= start {
                break;
            }
            if ch == '\n' {
                line += 1;
                line_start = idx + 1;
            }
        }

        let col = source
            .get(line_start..start)
            .map(|prefix| prefix.chars().count() + 1)
            .unwrap_or(1);

        Self { line, col, start, end }
    }
}

/// Fatal problems with the hook declarations themselves.
///
/// Any of these aborts a run before a single hook is started.
#[derive(Debug, Clone)]
pub enum ConfigError {
    Io { path: PathBuf, message: String },
    Syntax { message: String, span: Option<Span> },
    MissingField { field: &'static str, location: String, span: Option<Span> },
    EmptyField { field: &'static str, hook: String, span: Option<Span> },
    DuplicateId { id: String, span: Option<Span> },
    InvalidPattern { hook: Option<String>, pattern: String, message: String, span: Option<Span> },
    InvalidEntry { hook: String, message: String, span: Option<Span> },
    InvalidTimeout { hook: String, span: Option<Span> },
    InvalidTag { tag: String, message: String },
}

impl ConfigError {
    pub fn span(&self) -> Option<Span> {
        match self {
            ConfigError::Io { .. } => None,
            ConfigError::Syntax { span, .. } => *span,
            ConfigError::MissingField { span, .. } => *span,
            ConfigError::EmptyField { span, .. } => *span,
            ConfigError::DuplicateId { span, .. } => *span,
            ConfigError::InvalidPattern { span, .. } => *span,
            ConfigError::InvalidEntry { span, .. } => *span,
            ConfigError::InvalidTimeout { span, .. } => *span,
            ConfigError::InvalidTag { .. } => None,
        }
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Io { path, message } => {
                write!(f, "cannot read config file {}: {}", path.display(), message)
            }
            ConfigError::Syntax { message, .. } => write!(f, "invalid config: {}", message),
            ConfigError::MissingField { field, location, .. } => {
                write!(f, "missing required field '{}' in {}", field, location)
            }
            ConfigError::EmptyField { field, hook, .. } => {
                write!(f, "field '{}' of hook '{}' must not be empty", field, hook)
            }
            ConfigError::DuplicateId { id, .. } => {
                write!(f, "hook id '{}' is declared more than once", id)
            }
            ConfigError::InvalidPattern { hook, pattern, message, .. } => match hook {
                Some(hook) => write!(
                    f,
                    "invalid pattern '{}' in hook '{}': {}",
                    pattern, hook, message
                ),
                None => write!(f, "invalid global exclude pattern '{}': {}", pattern, message),
            },
            ConfigError::InvalidEntry { hook, message, .. } => {
                write!(f, "invalid entry for hook '{}': {}", hook, message)
            }
            ConfigError::InvalidTimeout { hook, .. } => {
                write!(f, "timeout of hook '{}' must be at least one second", hook)
            }
            ConfigError::InvalidTag { tag, message } => {
                write!(f, "invalid tag '{}': {}", tag, message)
            }
        }
    }
}

impl std::error::Error for ConfigError {}
