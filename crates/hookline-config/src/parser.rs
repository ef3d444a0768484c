//! Turns `.hookline.toml` into validated [`HookDeclaration`]s.
//!
//! Deserialization happens into a loose intermediate form first so that
//! every validation failure can point at the offending value.

use crate::decl::{HookConfig, HookDeclaration, HookSource};
use crate::error::{ConfigError, Span};
use regex::Regex;
use serde::Deserialize;
use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::path::{Path, PathBuf};
use std::time::Duration;
use toml::Spanned;

/// File name looked up in the repository root.
pub const CONFIG_FILE_NAME: &str = ".hookline.toml";

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawConfig {
    #[serde(default)]
    exclude: Option<Spanned<String>>,
    #[serde(default)]
    fail_fast: bool,
    #[serde(default)]
    tags: BTreeMap<String, Vec<String>>,
    #[serde(default)]
    repos: Vec<RawRepo>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawRepo {
    repo: Spanned<String>,
    #[serde(default)]
    hooks: Vec<RawHook>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawHook {
    id: Option<Spanned<String>>,
    name: Option<String>,
    entry: Option<Spanned<String>>,
    #[serde(default)]
    args: Vec<String>,
    #[serde(default)]
    types: Vec<String>,
    files: Option<Spanned<String>>,
    exclude: Option<Spanned<String>>,
    #[serde(default)]
    fixing: bool,
    #[serde(default = "default_true")]
    pass_filenames: bool,
    timeout: Option<Spanned<u64>>,
}

fn default_true() -> bool {
    true
}

/// Parses and validates a hook config from TOML source.
pub fn parse(source: &str) -> Result<HookConfig, ConfigError> {
    let raw: RawConfig = toml::from_str(source).map_err(|e| ConfigError::Syntax {
        message: e.message().to_string(),
        span: e.span().map(|range| Span::from_range(source, range)),
    })?;

    let exclude = match raw.exclude {
        Some(pattern) => Some(compile(source, None, pattern)?),
        None => None,
    };

    let tags = validate_tags(raw.tags)?;

    let mut hooks = Vec::new();
    let mut seen = HashSet::new();

    for (repo_idx, repo) in raw.repos.into_iter().enumerate() {
        let source_kind = HookSource::parse(repo.repo.get_ref());
        let repo_span = Span::from_range(source, repo.repo.span());

        for (hook_idx, hook) in repo.hooks.into_iter().enumerate() {
            let decl = build_hook(source, source_kind.clone(), repo_span, repo_idx, hook_idx, hook)?;
            if !seen.insert(decl.id.clone()) {
                return Err(ConfigError::DuplicateId {
                    id: decl.id,
                    span: decl.span,
                });
            }
            hooks.push(decl);
        }
    }

    Ok(HookConfig {
        hooks,
        exclude,
        fail_fast: raw.fail_fast,
        tags,
    })
}

/// Reads and parses a config file.
pub fn load_file(path: &Path) -> Result<HookConfig, ConfigError> {
    let source = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;
    parse(&source)
}

/// Walks up from `start_dir` looking for [`CONFIG_FILE_NAME`].
pub fn find_config(start_dir: impl AsRef<Path>) -> Option<PathBuf> {
    let mut dir = start_dir.as_ref().to_path_buf();
    if let Ok(abs) = dir.canonicalize() {
        dir = abs;
    }

    loop {
        let candidate = dir.join(CONFIG_FILE_NAME);
        if candidate.is_file() {
            return Some(candidate);
        }
        if !dir.pop() {
            return None;
        }
    }
}

fn build_hook(
    source: &str,
    source_kind: HookSource,
    repo_span: Span,
    repo_idx: usize,
    hook_idx: usize,
    raw: RawHook,
) -> Result<HookDeclaration, ConfigError> {
    let id_field = raw.id.ok_or_else(|| ConfigError::MissingField {
        field: "id",
        location: format!("repos[{}].hooks[{}]", repo_idx, hook_idx),
        span: Some(repo_span),
    })?;
    let span = Span::from_range(source, id_field.span());
    let id = id_field.into_inner().trim().to_string();
    if id.is_empty() {
        return Err(ConfigError::MissingField {
            field: "id",
            location: format!("repos[{}].hooks[{}]", repo_idx, hook_idx),
            span: Some(span),
        });
    }

    let entry = match raw.entry {
        Some(entry) => {
            let entry_span = Span::from_range(source, entry.span());
            let words = shell_words::split(entry.get_ref()).map_err(|e| ConfigError::InvalidEntry {
                hook: id.clone(),
                message: e.to_string(),
                span: Some(entry_span),
            })?;
            if words.is_empty() {
                return Err(ConfigError::EmptyField {
                    field: "entry",
                    hook: id,
                    span: Some(entry_span),
                });
            }
            words
        }
        None => vec![id.clone()],
    };

    let mut types = BTreeSet::new();
    for tag in raw.types {
        let tag = tag.trim().to_string();
        if tag.is_empty() {
            return Err(ConfigError::EmptyField {
                field: "types",
                hook: id,
                span: Some(span),
            });
        }
        types.insert(tag);
    }

    let files = match raw.files {
        Some(pattern) => Some(compile(source, Some(&id), pattern)?),
        None => None,
    };
    let exclude = match raw.exclude {
        Some(pattern) => Some(compile(source, Some(&id), pattern)?),
        None => None,
    };

    let timeout = match raw.timeout {
        Some(secs) if *secs.get_ref() == 0 => {
            return Err(ConfigError::InvalidTimeout {
                hook: id,
                span: Some(Span::from_range(source, secs.span())),
            });
        }
        Some(secs) => Some(Duration::from_secs(secs.into_inner())),
        None => None,
    };

    Ok(HookDeclaration {
        source: source_kind,
        id,
        name: raw.name.filter(|n| !n.trim().is_empty()),
        entry,
        args: raw.args,
        types,
        files,
        exclude,
        fixing: raw.fixing,
        pass_filenames: raw.pass_filenames,
        timeout,
        span: Some(span),
    })
}

fn compile(source: &str, hook: Option<&str>, pattern: Spanned<String>) -> Result<Regex, ConfigError> {
    let span = Span::from_range(source, pattern.span());
    let text = pattern.into_inner();
    Regex::new(&text).map_err(|e| ConfigError::InvalidPattern {
        hook: hook.map(str::to_string),
        pattern: text,
        message: e.to_string(),
        span: Some(span),
    })
}

fn validate_tags(
    raw: BTreeMap<String, Vec<String>>,
) -> Result<BTreeMap<String, Vec<String>>, ConfigError> {
    let mut tags = BTreeMap::new();
    for (tag, extensions) in raw {
        if tag.trim().is_empty() {
            return Err(ConfigError::InvalidTag {
                tag,
                message: "tag names must not be empty".into(),
            });
        }
        let extensions: Vec<String> = extensions
            .iter()
            .map(|ext| ext.trim().trim_start_matches('.').to_ascii_lowercase())
            .collect();
        if extensions.is_empty() || extensions.iter().any(String::is_empty) {
            return Err(ConfigError::InvalidTag {
                tag,
                message: "expected a non-empty list of file extensions".into(),
            });
        }
        tags.insert(tag.trim().to_string(), extensions);
    }
    Ok(tags)
}
