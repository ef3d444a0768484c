use anyhow::Result;
use hookline_git::{FileSelection, collect_files, hooks_dir, repo_root};
use std::path::Path;
use std::process::Command;

fn git(dir: &Path, args: &[&str]) -> Result<()> {
    let status = Command::new("git").arg("-C").arg(dir).args(args).status()?;
    anyhow::ensure!(status.success(), "git {:?} failed", args);
    Ok(())
}

fn git_available() -> bool {
    Command::new("git")
        .arg("--version")
        .output()
        .map(|o| o.status.success())
        .unwrap_or(false)
}

fn init_repo() -> Result<tempfile::TempDir> {
    let dir = tempfile::tempdir()?;
    git(dir.path(), &["init", "-q"])?;
    git(dir.path(), &["config", "user.email", "dev@example.com"])?;
    git(dir.path(), &["config", "user.name", "Dev"])?;
    Ok(dir)
}

#[test]
fn test_staged_and_tracked_files() -> Result<()> {
    if !git_available() {
        return Ok(());
    }
    let dir = init_repo()?;
    let root = dir.path();

    std::fs::write(root.join("b.py"), "print(1)\n")?;
    std::fs::write(root.join("a.yaml"), "a: 1\n")?;
    git(root, &["add", "b.py", "a.yaml"])?;
    git(root, &["commit", "-q", "-m", "init"])?;

    std::fs::write(root.join("c.toml"), "x = 1\n")?;
    std::fs::write(root.join("b.py"), "print(2)\n")?;
    git(root, &["add", "c.toml", "b.py"])?;
    std::fs::write(root.join("untracked.txt"), "")?;

    let staged = collect_files(root, &FileSelection::Staged)?;
    assert_eq!(staged, vec!["b.py", "c.toml"]);

    let all = collect_files(root, &FileSelection::AllFiles)?;
    assert_eq!(all, vec!["a.yaml", "b.py", "c.toml"]);
    Ok(())
}

#[test]
fn test_repo_root_and_hooks_dir() -> Result<()> {
    if !git_available() {
        return Ok(());
    }
    let dir = init_repo()?;
    let nested = dir.path().join("src");
    std::fs::create_dir(&nested)?;

    let root = repo_root(&nested)?;
    assert_eq!(root.canonicalize()?, dir.path().canonicalize()?);

    let hooks = hooks_dir(&root)?;
    assert!(hooks.ends_with("hooks"));
    Ok(())
}

#[test]
fn test_repo_root_outside_repository() -> Result<()> {
    if !git_available() {
        return Ok(());
    }
    let dir = tempfile::tempdir()?;
    let outside = dir.path().join("plain");
    std::fs::create_dir(&outside)?;
    // A temp dir can sit inside a repository on some machines.
    if Command::new("git")
        .arg("-C")
        .arg(&outside)
        .args(["rev-parse", "--show-toplevel"])
        .output()?
        .status
        .success()
    {
        return Ok(());
    }
    assert!(repo_root(&outside).is_err());
    Ok(())
}

#[test]
fn test_unusual_names_are_returned_verbatim() -> Result<()> {
    if !git_available() {
        return Ok(());
    }
    let dir = init_repo()?;
    let root = dir.path();

    std::fs::write(root.join("café.py"), "print(1)\n")?;
    std::fs::write(root.join(" lead.txt"), "x\n")?;
    git(root, &["add", "café.py", " lead.txt"])?;

    let staged = collect_files(root, &FileSelection::Staged)?;
    assert_eq!(staged, vec![" lead.txt", "café.py"]);
    for path in &staged {
        assert!(root.join(path).is_file(), "{} should exist", path);
    }

    git(root, &["commit", "-q", "-m", "init"])?;
    let all = collect_files(root, &FileSelection::AllFiles)?;
    assert_eq!(all, vec![" lead.txt", "café.py"]);
    Ok(())
}
