use colored::*;
use hookline_config::{ConfigError, Span};
use std::fmt;

/// Enhanced error with context and suggestions
pub struct EnhancedError {
    pub message: String,
    pub span: Option<Span>,
    pub file: Option<String>,
    pub source: Option<String>,
    pub suggestion: Option<String>,
    pub help: Option<String>,
}

impl EnhancedError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            span: None,
            file: None,
            source: None,
            suggestion: None,
            help: None,
        }
    }

    pub fn with_span(mut self, span: Span) -> Self {
        self.span = Some(span);
        self
    }

    pub fn with_file(mut self, file: impl Into<String>) -> Self {
        self.file = Some(file.into());
        self
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }

    pub fn with_help(mut self, help: impl Into<String>) -> Self {
        self.help = Some(help.into());
        self
    }

    /// Display the error with colored output and context
    pub fn display(&self) {
        eprint!("{}", self.render());
    }

    /// The full report as printed by [`display`](Self::display).
    pub fn render(&self) -> String {
        let mut out = String::new();
        out.push_str(&format!("{} {}\n", "error:".red().bold(), self.message.bold()));

        if let Some(file) = &self.file {
            match &self.span {
                Some(span) => out.push_str(&format!(
                    "  {} {}:{}:{}\n",
                    "-->".blue().bold(),
                    file,
                    span.line,
                    span.col
                )),
                None => out.push_str(&format!("  {} {}\n", "-->".blue().bold(), file)),
            }
        }

        if let (Some(source), Some(span)) = (&self.source, &self.span) {
            out.push('\n');
            out.push_str(&source_snippet(source, span));
        }

        if let Some(suggestion) = &self.suggestion {
            out.push_str(&format!("\n{} {}\n", "suggestion:".green().bold(), suggestion));
        }

        if let Some(help) = &self.help {
            out.push_str(&format!("\n{} {}\n", "help:".cyan().bold(), help));
        }

        out
    }
}

/// Two lines of context around `span`, with carets under the offending text.
fn source_snippet(source: &str, span: &Span) -> String {
    let lines: Vec<&str> = source.lines().collect();
    let line_idx = span.line.saturating_sub(1);

    if line_idx >= lines.len() {
        return String::new();
    }

    let max_line = (span.line + 2).min(lines.len());
    let width = max_line.to_string().len();

    let start = line_idx.saturating_sub(2);
    let end = (line_idx + 3).min(lines.len());

    let mut out = String::new();
    for (i, line) in lines.iter().enumerate().take(end).skip(start) {
        let line_num = i + 1;

        if line_num == span.line {
            out.push_str(&format!(
                "{:>width$} {} {}\n",
                line_num.to_string().blue().bold(),
                "|".blue().bold(),
                line,
                width = width
            ));

            // Carets stop at the end of the line for multi-line spans.
            let spaces = " ".repeat(span.col.saturating_sub(1));
            let remaining = line.chars().count().saturating_sub(span.col.saturating_sub(1));
            let caret_len = (span.end.saturating_sub(span.start)).clamp(1, remaining.max(1));
            out.push_str(&format!(
                "{:>width$} {} {}{}\n",
                "",
                "|".blue().bold(),
                spaces,
                "^".repeat(caret_len).red().bold(),
                width = width
            ));
        } else {
            out.push_str(&format!(
                "{:>width$} {} {}\n",
                line_num.to_string().dimmed(),
                "|".blue().bold(),
                line,
                width = width
            ));
        }
    }
    out
}

impl fmt::Display for EnhancedError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl fmt::Debug for EnhancedError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EnhancedError: {}", self.message)
    }
}

impl std::error::Error for EnhancedError {}

/// Turns a config problem into a report pointing at the declaration.
pub fn config_error(err: &ConfigError, file: &str, source: Option<&str>) -> EnhancedError {
    let mut enhanced = EnhancedError::new(err.to_string()).with_file(file);

    if let Some(span) = err.span() {
        enhanced = enhanced.with_span(span);
    }
    if let Some(source) = source {
        enhanced = enhanced.with_source(source);
    }

    match err {
        ConfigError::Io { .. } => enhanced
            .with_suggestion("Create a config with 'hookline init'")
            .with_help("hookline looks for .hookline.toml in the repository root"),
        ConfigError::Syntax { message, .. } if message.contains("unknown field") => enhanced
            .with_help("Hook fields: id, name, entry, args, types, files, exclude, fixing, pass_filenames, timeout"),
        ConfigError::Syntax { .. } => {
            enhanced.with_suggestion("Check for unclosed strings, brackets or a misplaced table header")
        }
        ConfigError::MissingField { field, .. } => {
            enhanced.with_suggestion(format!("Add `{} = \"...\"` to the declaration", field))
        }
        ConfigError::EmptyField { .. } => {
            enhanced.with_suggestion("Give the field a value or remove it to use the default")
        }
        ConfigError::DuplicateId { .. } => enhanced
            .with_suggestion("Rename one of the hooks")
            .with_help("Hook ids select hooks on the command line and in SKIP, so they must be unique"),
        ConfigError::InvalidPattern { .. } => enhanced
            .with_suggestion("Escape regex metacharacters, e.g. '\\\\.py$' inside a TOML string")
            .with_help("Patterns are regular expressions matched against repository-relative paths"),
        ConfigError::InvalidEntry { .. } => {
            enhanced.with_suggestion("Check the quoting in `entry`; it is split like a shell command line")
        }
        ConfigError::InvalidTimeout { .. } => {
            enhanced.with_suggestion("Use a timeout of at least 1 second or remove it")
        }
        ConfigError::InvalidTag { .. } => {
            enhanced.with_help("Tags map a name to file extensions, e.g. protobuf = [\"proto\"]")
        }
    }
}

/// Convert anyhow::Error to EnhancedError with suggestions
pub fn enhance_error(err: &anyhow::Error) -> EnhancedError {
    let message = format!("{:#}", err);
    let lower = message.to_lowercase();
    let mut enhanced = EnhancedError::new(message);

    if lower.contains("not inside a git repository") || lower.contains("not a git repository") {
        enhanced = enhanced
            .with_suggestion("Run hookline inside a git repository, or pass --files")
            .with_help("Use 'git init' to create a repository");
    } else if lower.contains("settings") || lower.contains(".hooklinerc") {
        enhanced = enhanced.with_help(
            "Settings keys: command_timeout, fail_fast, colored, verbose (see 'hookline config --list')",
        );
    } else if lower.contains("failed to execute git") {
        enhanced = enhanced.with_suggestion("Verify git is installed and in your PATH");
    }

    enhanced
}
