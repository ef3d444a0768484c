//! Runs one hook as an external process.

use crate::matcher::MatchSet;
use crate::report::{HookResult, HookStatus};
use hookline_config::HookDeclaration;
use rayon::prelude::*;
use sha2::{Digest, Sha256};
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::process::{Child, Command, ExitStatus, Stdio};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};
use tracing::{debug, warn};

const POLL_INTERVAL: Duration = Duration::from_millis(20);

/// How the child process ended.
enum Exit {
    Exited(ExitStatus),
    TimedOut(Duration),
    Interrupted,
    WaitFailed(io::Error),
}

/// Starts hook processes in the repository root and judges their outcome.
#[derive(Debug, Clone)]
pub struct HookRunner {
    root: PathBuf,
    timeout: Duration,
    cancel: Arc<AtomicBool>,
}

impl HookRunner {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            timeout: Duration::from_secs(300),
            cancel: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Builder: default timeout for hooks without their own.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Builder: share an interrupt flag (e.g. one set from a signal handler).
    pub fn with_cancel_flag(mut self, cancel: Arc<AtomicBool>) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn cancel_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.cancel)
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.load(Ordering::SeqCst)
    }

    /// Runs `decl` against `matches`.
    ///
    /// `watched` lists the files whose contents are compared before and
    /// after the run when the hook is a fixing hook. Every failure mode is
    /// folded into the returned result.
    pub fn run(&self, decl: &HookDeclaration, matches: &MatchSet, watched: &[String]) -> HookResult {
        let started = Instant::now();
        let mut result = self.execute(decl, matches, watched);
        result.files = matches.files().len();
        result.duration = started.elapsed();
        debug!(
            hook = %decl.id,
            status = ?result.status,
            elapsed_ms = result.duration.as_millis() as u64,
            "hook finished"
        );
        result
    }

    fn execute(&self, decl: &HookDeclaration, matches: &MatchSet, watched: &[String]) -> HookResult {
        if self.is_cancelled() {
            return HookResult::errored(decl, "interrupted");
        }

        let Some((program, entry_args)) = decl.entry.split_first() else {
            return HookResult::errored(decl, "hook has no entry");
        };

        let before = if decl.fixing {
            fingerprint(&self.root, watched)
        } else {
            Vec::new()
        };

        let file_args: &[String] = if decl.pass_filenames { matches.files() } else { &[] };

        let mut command = Command::new(program);
        // Own process group, so a kill also reaches anything the hook spawned.
        #[cfg(unix)]
        std::os::unix::process::CommandExt::process_group(&mut command, 0);
        command
            .args(entry_args)
            .args(&decl.args)
            .args(file_args)
            .current_dir(&self.root)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        debug!(hook = %decl.id, command = ?decl.command_line(), files = file_args.len(), "starting hook");

        let mut child = match command.spawn() {
            Ok(child) => child,
            Err(e) => return HookResult::errored(decl, spawn_error(program, &e)),
        };

        let stdout = child.stdout.take().map(drain);
        let stderr = child.stderr.take().map(drain);

        let timeout = decl.timeout.unwrap_or(self.timeout);
        let exit = self.wait(&mut child, timeout);

        let mut result = HookResult::new(decl, HookStatus::Errored);

        let status = match exit {
            Exit::Exited(status) => status,
            Exit::TimedOut(after) => {
                result.reason = Some(format!("timed out after {}", describe(after)));
                return result;
            }
            Exit::Interrupted => {
                result.reason = Some("interrupted".to_string());
                return result;
            }
            Exit::WaitFailed(e) => {
                result.reason = Some(format!("error waiting for hook: {}", e));
                return result;
            }
        };

        result.stdout = collect(stdout);
        result.stderr = collect(stderr);
        result.exit_code = status.code();

        if decl.fixing {
            let after = fingerprint(&self.root, watched);
            result.modified = watched
                .iter()
                .zip(before.iter().zip(after.iter()))
                .filter(|(_, (b, a))| b != a)
                .map(|(path, _)| PathBuf::from(path))
                .collect();
        }

        result.status = if !result.modified.is_empty() {
            HookStatus::NeedsReview
        } else if status.success() {
            HookStatus::Success
        } else {
            HookStatus::Failure
        };

        if result.exit_code.is_none() && !status.success() {
            result.reason = Some("terminated by signal".to_string());
        }

        result
    }

    fn wait(&self, child: &mut Child, timeout: Duration) -> Exit {
        let start = Instant::now();

        loop {
            match child.try_wait() {
                Ok(Some(status)) => return Exit::Exited(status),
                Ok(None) => {
                    if self.is_cancelled() {
                        kill(child);
                        return Exit::Interrupted;
                    }
                    if start.elapsed() > timeout {
                        kill(child);
                        return Exit::TimedOut(timeout);
                    }
                    thread::sleep(POLL_INTERVAL);
                }
                Err(e) => {
                    kill(child);
                    return Exit::WaitFailed(e);
                }
            }
        }
    }
}

#[cfg(unix)]
fn kill(child: &mut Child) {
    use nix::sys::signal::{Signal, killpg};
    use nix::unistd::Pid;

    let group = Pid::from_raw(child.id() as i32);
    if let Err(e) = killpg(group, Signal::SIGKILL) {
        warn!(error = %e, "failed to kill hook process group");
        let _ = child.kill();
    }
    let _ = child.wait();
}

#[cfg(not(unix))]
fn kill(child: &mut Child) {
    if let Err(e) = child.kill() {
        warn!(error = %e, "failed to kill hook process");
    }
    let _ = child.wait();
}

fn describe(duration: Duration) -> String {
    match (duration.as_secs(), duration.subsec_millis()) {
        (1, 0) => "1 second".to_string(),
        (secs, 0) => format!("{} seconds", secs),
        _ => format!("{} ms", duration.as_millis()),
    }
}

fn spawn_error(program: &str, e: &io::Error) -> String {
    match e.kind() {
        io::ErrorKind::NotFound => format!("executable not found: {}", program),
        io::ErrorKind::PermissionDenied => format!("permission denied: {}", program),
        _ => format!("failed to start {}: {}", program, e),
    }
}

/// Reads a pipe to the end on its own thread so the child never blocks on
/// a full pipe buffer.
fn drain<R: Read + Send + 'static>(mut pipe: R) -> JoinHandle<Vec<u8>> {
    thread::spawn(move || {
        let mut buf = Vec::new();
        let _ = pipe.read_to_end(&mut buf);
        buf
    })
}

fn collect(handle: Option<JoinHandle<Vec<u8>>>) -> String {
    handle
        .and_then(|h| h.join().ok())
        .map(|bytes| String::from_utf8_lossy(&bytes).into_owned())
        .unwrap_or_default()
}

/// SHA-256 of each file under `root`; `None` for files that cannot be read.
fn fingerprint(root: &Path, paths: &[String]) -> Vec<Option<[u8; 32]>> {
    paths
        .par_iter()
        .map(|path| {
            std::fs::read(root.join(path))
                .ok()
                .map(|bytes| Sha256::digest(&bytes).into())
        })
        .collect()
}
