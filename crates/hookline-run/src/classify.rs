//! File classification into type tags.
//!
//! A [`FileClassifier`] is an open registry of `tag -> predicate` entries.
//! Each path is probed once (kind, executable bit, extension, first bytes)
//! and every registered predicate is asked about the same [`Probe`]. Adding
//! a tag never requires touching the existing ones.

use once_cell::sync::Lazy;
use rayon::prelude::*;
use std::collections::BTreeSet;
use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::warn;

/// How many leading bytes are read for content sniffing.
const SNIFF_LEN: u64 = 8 * 1024;

pub type TagPredicate = fn(&Probe<'_>) -> bool;

type Predicate = Arc<dyn Fn(&Probe<'_>) -> bool + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathKind {
    File,
    Directory,
    Symlink,
    Other,
}

/// Facts about one path, gathered once and shared by all predicates.
#[derive(Debug)]
pub struct Probe<'a> {
    path: &'a Path,
    kind: PathKind,
    executable: bool,
    head: Vec<u8>,
}

impl<'a> Probe<'a> {
    /// Inspects `path` on disk. Fails when the path cannot be stat'ed or read.
    pub fn inspect(path: &'a Path) -> std::io::Result<Self> {
        let metadata = fs::symlink_metadata(path)?;
        let file_type = metadata.file_type();

        let kind = if file_type.is_symlink() {
            PathKind::Symlink
        } else if file_type.is_dir() {
            PathKind::Directory
        } else if file_type.is_file() {
            PathKind::File
        } else {
            PathKind::Other
        };

        let mut head = Vec::new();
        if kind == PathKind::File {
            fs::File::open(path)?.take(SNIFF_LEN).read_to_end(&mut head)?;
        }

        Ok(Self {
            path,
            kind,
            executable: kind == PathKind::File && is_executable(&metadata),
            head,
        })
    }

    /// Builds a probe from known facts without touching the file system.
    pub fn from_parts(path: &'a Path, kind: PathKind, executable: bool, head: Vec<u8>) -> Self {
        Self { path, kind, executable, head }
    }

    pub fn path(&self) -> &Path {
        self.path
    }

    pub fn kind(&self) -> PathKind {
        self.kind
    }

    pub fn is_executable(&self) -> bool {
        self.executable
    }

    /// Lower-cased extension without the dot.
    pub fn extension(&self) -> Option<String> {
        self.path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
    }

    pub fn file_name(&self) -> Option<&str> {
        self.path.file_name().and_then(|n| n.to_str())
    }

    pub fn head(&self) -> &[u8] {
        &self.head
    }

    /// Interpreter named on a `#!` line with `env` and version numbers
    /// looked through: `#!/usr/bin/env python3.12` gives `python`.
    pub fn shebang(&self) -> Option<&str> {
        let rest = self.head.strip_prefix(b"#!")?;
        let line_end = rest.iter().position(|&b| b == b'\n').unwrap_or(rest.len());
        let line = std::str::from_utf8(&rest[..line_end]).ok()?;

        let mut words = line.split_whitespace();
        let mut interpreter = words.next()?.rsplit('/').next()?;
        if interpreter == "env" {
            interpreter = words.find(|w| !w.starts_with('-'))?;
        }
        let interpreter = interpreter.trim_end_matches(|c: char| c.is_ascii_digit() || c == '.');
        (!interpreter.is_empty()).then_some(interpreter)
    }

    pub fn is_binary(&self) -> bool {
        self.head.contains(&0)
    }
}

#[cfg(unix)]
fn is_executable(metadata: &fs::Metadata) -> bool {
    use std::os::unix::fs::PermissionsExt;
    metadata.permissions().mode() & 0o111 != 0
}

#[cfg(not(unix))]
fn is_executable(_metadata: &fs::Metadata) -> bool {
    false
}

static KIND_TAGS: Lazy<Vec<(&'static str, TagPredicate)>> = Lazy::new(|| {
    vec![
        ("file", tag_file as TagPredicate),
        ("directory", tag_directory as TagPredicate),
        ("symlink", tag_symlink as TagPredicate),
        ("executable", tag_executable as TagPredicate),
        ("non-executable", tag_non_executable as TagPredicate),
        ("text", tag_text as TagPredicate),
        ("binary", tag_binary as TagPredicate),
    ]
});

static EXTENSION_TAGS: &[(&str, &[&str])] = &[
    ("python", &["py", "pyi", "pyw"]),
    ("pyi", &["pyi"]),
    ("yaml", &["yaml", "yml"]),
    ("json", &["json"]),
    ("toml", &["toml"]),
    ("markdown", &["md", "markdown"]),
    ("rust", &["rs"]),
    ("shell", &["sh", "bash"]),
    ("javascript", &["js", "mjs", "cjs"]),
    ("typescript", &["ts", "tsx"]),
    ("ini", &["ini", "cfg"]),
    ("plain-text", &["txt"]),
];

static NAME_TAGS: &[(&str, &[&str])] = &[
    ("dockerfile", &["Dockerfile"]),
    ("makefile", &["Makefile", "GNUmakefile", "makefile"]),
];

static SHEBANG_TAGS: &[(&str, &[&str])] = &[
    ("python", &["python", "pypy"]),
    ("shell", &["sh", "bash", "zsh", "dash"]),
];

fn tag_file(p: &Probe<'_>) -> bool {
    p.kind() == PathKind::File
}

fn tag_directory(p: &Probe<'_>) -> bool {
    p.kind() == PathKind::Directory
}

fn tag_symlink(p: &Probe<'_>) -> bool {
    p.kind() == PathKind::Symlink
}

fn tag_executable(p: &Probe<'_>) -> bool {
    p.is_executable()
}

fn tag_non_executable(p: &Probe<'_>) -> bool {
    p.kind() == PathKind::File && !p.is_executable()
}

fn tag_text(p: &Probe<'_>) -> bool {
    p.kind() == PathKind::File && !p.is_binary()
}

fn tag_binary(p: &Probe<'_>) -> bool {
    p.kind() == PathKind::File && p.is_binary()
}

/// The result of classifying one path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Classification {
    Tagged(BTreeSet<String>),
    /// The path could not be read; it matches no hook.
    Unclassifiable(String),
}

/// A path of the working file set plus its classification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileRecord {
    /// Repository-relative, `/`-separated.
    pub path: String,
    pub classification: Classification,
}

impl FileRecord {
    pub fn tagged<I, S>(path: impl Into<String>, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            path: path.into(),
            classification: Classification::Tagged(tags.into_iter().map(Into::into).collect()),
        }
    }

    pub fn tags(&self) -> Option<&BTreeSet<String>> {
        match &self.classification {
            Classification::Tagged(tags) => Some(tags),
            Classification::Unclassifiable(_) => None,
        }
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags().is_some_and(|tags| tags.contains(tag))
    }
}

/// Registry of type tags and the predicates that decide them.
#[derive(Clone, Default)]
pub struct FileClassifier {
    predicates: Vec<(String, Predicate)>,
}

impl FileClassifier {
    /// A classifier with no tags at all.
    pub fn empty() -> Self {
        Self::default()
    }

    /// A classifier with the built-in kind, content and language tags.
    pub fn new() -> Self {
        let mut classifier = Self::empty();
        for (tag, predicate) in KIND_TAGS.iter() {
            classifier.register(*tag, *predicate);
        }
        for (tag, extensions) in EXTENSION_TAGS {
            classifier.register_extensions(*tag, extensions.iter().copied());
        }
        for (tag, names) in NAME_TAGS {
            let names: Vec<&'static str> = names.to_vec();
            classifier.register(*tag, move |p: &Probe<'_>| {
                p.kind() == PathKind::File
                    && p.file_name().is_some_and(|n| names.iter().any(|known| *known == n))
            });
        }
        for (tag, interpreters) in SHEBANG_TAGS {
            classifier.register_interpreters(*tag, interpreters.iter().copied());
        }
        classifier
    }

    /// Adds a predicate for `tag`. A tag registered more than once applies
    /// when any of its predicates does.
    pub fn register<F>(&mut self, tag: impl Into<String>, predicate: F)
    where
        F: Fn(&Probe<'_>) -> bool + Send + Sync + 'static,
    {
        self.predicates.push((tag.into(), Arc::new(predicate)));
    }

    /// Tags regular files whose extension (case-insensitive, no dot) is listed.
    pub fn register_extensions<I, S>(&mut self, tag: impl Into<String>, extensions: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let extensions: Vec<String> = extensions
            .into_iter()
            .map(|e| e.as_ref().trim_start_matches('.').to_ascii_lowercase())
            .collect();
        self.register(tag, move |p: &Probe<'_>| {
            p.kind() == PathKind::File
                && p.extension().is_some_and(|ext| extensions.contains(&ext))
        });
    }

    /// Tags regular files whose shebang names one of `interpreters`.
    pub fn register_interpreters<I, S>(&mut self, tag: impl Into<String>, interpreters: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let interpreters: Vec<String> = interpreters.into_iter().map(Into::into).collect();
        self.register(tag, move |p: &Probe<'_>| {
            p.kind() == PathKind::File
                && p.shebang().is_some_and(|i| interpreters.iter().any(|known| known == i))
        });
    }

    /// Every tag name this classifier can produce, sorted.
    pub fn tag_names(&self) -> BTreeSet<&str> {
        self.predicates.iter().map(|(tag, _)| tag.as_str()).collect()
    }

    pub fn knows(&self, tag: &str) -> bool {
        self.predicates.iter().any(|(known, _)| known == tag)
    }

    /// Tags that apply to an already gathered probe.
    pub fn tags_for(&self, probe: &Probe<'_>) -> BTreeSet<String> {
        self.predicates
            .iter()
            .filter(|(_, predicate)| predicate(probe))
            .map(|(tag, _)| tag.clone())
            .collect()
    }

    /// Classifies the path at `path`; unreadable paths are reported, not raised.
    pub fn classify(&self, path: &Path) -> Classification {
        match Probe::inspect(path) {
            Ok(probe) => Classification::Tagged(self.tags_for(&probe)),
            Err(e) => Classification::Unclassifiable(e.to_string()),
        }
    }

    /// Classifies repository-relative `paths` under `root`, keeping input order.
    pub fn classify_all(&self, root: &Path, paths: &[String]) -> Vec<FileRecord> {
        paths
            .par_iter()
            .map(|path| {
                let full: PathBuf = root.join(path);
                let classification = self.classify(&full);
                if let Classification::Unclassifiable(reason) = &classification {
                    warn!(path = %path, %reason, "file could not be classified");
                }
                FileRecord {
                    path: path.clone(),
                    classification,
                }
            })
            .collect()
    }
}

impl std::fmt::Debug for FileClassifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileClassifier")
            .field("tags", &self.tag_names())
            .finish()
    }
}
