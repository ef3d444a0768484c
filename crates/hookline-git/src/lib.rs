//! # hookline git
//!
//! The few git queries hookline needs: where the repository root is,
//! which files are staged, which files are tracked, and where hook
//! scripts live.
//!
//! Every query shells out to `git -C <dir> ...` so the caller's working
//! directory never matters.
//!
//! ## Example
//!
//! ```rust,no_run
//! use hookline_git::{FileSelection, collect_files, repo_root};
//!
//! let root = repo_root(".").unwrap();
//! for path in collect_files(&root, &FileSelection::Staged).unwrap() {
//!     println!("staged: {}", path);
//! }
//! ```

use anyhow::{Context, Result, bail};
use std::path::{Path, PathBuf};
use std::process::Command;
use tracing::debug;

/// Which paths make up the working file set of a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileSelection {
    /// Added, copied or modified paths in the index.
    Staged,
    /// Every tracked path.
    AllFiles,
    /// Paths given by the caller, relative to the repository root.
    Explicit(Vec<String>),
}

/// Execute a git command in `dir` and capture its stdout, minus the
/// trailing newline.
///
/// Any non-zero exit code is turned into an error carrying git's stderr.
///
/// ```rust,no_run
/// use hookline_git::git_capture;
/// use std::path::Path;
///
/// let branch = git_capture(Path::new("."), &["branch", "--show-current"]).unwrap();
/// println!("Current branch: {}", branch);
/// ```
pub fn git_capture(dir: &Path, args: &[&str]) -> Result<String> {
    let output = git_capture_raw(dir, args)?;
    Ok(output.trim_end_matches(['\n', '\r']).to_string())
}

/// Like [`git_capture`], but stdout is returned untouched.
fn git_capture_raw(dir: &Path, args: &[&str]) -> Result<String> {
    debug!(dir = %dir.display(), ?args, "running git");

    let output = Command::new("git")
        .arg("-C")
        .arg(dir)
        .args(args)
        .output()
        .context("Failed to execute git")?;

    if !output.status.success() {
        bail!(
            "Git command failed: {}",
            String::from_utf8_lossy(&output.stderr).trim()
        );
    }

    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}

/// Top-level directory of the repository containing `dir`.
pub fn repo_root(dir: impl AsRef<Path>) -> Result<PathBuf> {
    let root = git_capture(dir.as_ref(), &["rev-parse", "--show-toplevel"])
        .context("Not inside a git repository")?;
    Ok(PathBuf::from(root))
}

/// Directory git reads hook scripts from (respects `core.hooksPath`).
pub fn hooks_dir(repo: &Path) -> Result<PathBuf> {
    let path = PathBuf::from(git_capture(repo, &["rev-parse", "--git-path", "hooks"])?);
    if path.is_absolute() {
        Ok(path)
    } else {
        Ok(repo.join(path))
    }
}

// Path listings use `-z`: names arrive verbatim and NUL-separated instead of
// C-quoted under `core.quotePath`.

pub fn staged_files(repo: &Path) -> Result<Vec<String>> {
    let output = git_capture_raw(
        repo,
        &["diff", "--cached", "--name-only", "-z", "--diff-filter=ACM"],
    )?;
    Ok(split_paths(&output))
}

pub fn tracked_files(repo: &Path) -> Result<Vec<String>> {
    let output = git_capture_raw(repo, &["ls-files", "-z"])?;
    Ok(split_paths(&output))
}

/// Resolves a selection into a sorted, de-duplicated list of paths.
pub fn collect_files(repo: &Path, selection: &FileSelection) -> Result<Vec<String>> {
    let files = match selection {
        FileSelection::Staged => staged_files(repo)?,
        FileSelection::AllFiles => tracked_files(repo)?,
        FileSelection::Explicit(paths) => paths.iter().map(|p| normalize(p)).collect(),
    };
    Ok(sorted_unique(files))
}

fn split_paths(output: &str) -> Vec<String> {
    output
        .split('\0')
        .filter(|path| !path.is_empty())
        .map(|s| s.to_string())
        .collect()
}

fn normalize(path: &str) -> String {
    let path = path.replace('\\', "/");
    path.trim_start_matches("./").to_string()
}

fn sorted_unique(mut files: Vec<String>) -> Vec<String> {
    files.sort();
    files.dedup();
    files
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_paths_on_nul() {
        let files = split_paths("a.py\0\0 lead.txt\0caf\u{e9}.py\0");
        assert_eq!(files, vec!["a.py", " lead.txt", "caf\u{e9}.py"]);
    }

    #[test]
    fn explicit_selection_is_sorted_and_normalized() {
        let selection = FileSelection::Explicit(vec![
            "./b.py".to_string(),
            "a.yaml".to_string(),
            "b.py".to_string(),
        ]);
        let files = collect_files(Path::new("."), &selection).unwrap();
        assert_eq!(files, vec!["a.yaml", "b.py"]);
    }
}
