//! Per-hook results and the aggregated run report.

use hookline_config::HookDeclaration;
use serde::{Serialize, Serializer};
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

/// Outcome of one hook, and of a whole run.
///
/// Variants are declared from mildest to most severe; the derived `Ord`
/// is the precedence used when results are combined.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum HookStatus {
    /// The hook ran and reported nothing.
    Success,
    /// No file matched, or the hook was skipped on request.
    Skipped,
    /// A fixing hook rewrote files that now need another look.
    NeedsReview,
    /// The hook ran and reported violations.
    Failure,
    /// The hook could not run: missing executable, timeout, interrupt.
    Errored,
}

impl HookStatus {
    /// Short label used in terminal output.
    pub fn label(&self) -> &'static str {
        match self {
            HookStatus::Success => "Passed",
            HookStatus::Skipped => "Skipped",
            HookStatus::NeedsReview => "Files modified",
            HookStatus::Failure => "Failed",
            HookStatus::Errored => "Errored",
        }
    }

    /// `true` for the outcomes that let a commit through.
    pub fn is_ok(&self) -> bool {
        matches!(self, HookStatus::Success | HookStatus::Skipped)
    }

    pub fn exit_code(&self) -> i32 {
        match self {
            HookStatus::Success | HookStatus::Skipped => 0,
            HookStatus::NeedsReview | HookStatus::Failure => 1,
            HookStatus::Errored => 2,
        }
    }

    /// Combines two outcomes, keeping the more severe one.
    pub fn combine(self, other: HookStatus) -> HookStatus {
        self.max(other)
    }
}

impl fmt::Display for HookStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// What happened when one declaration was considered for a run.
#[derive(Debug, Clone, Serialize)]
pub struct HookResult {
    pub id: String,
    pub name: String,
    pub status: HookStatus,
    /// `None` when the process never exited on its own.
    pub exit_code: Option<i32>,
    /// Number of file arguments passed; `0` for whole-repository hooks.
    pub files: usize,
    /// Files a fixing hook changed, in input order.
    pub modified: Vec<PathBuf>,
    pub stdout: String,
    pub stderr: String,
    #[serde(rename = "duration_ms", serialize_with = "as_millis")]
    pub duration: Duration,
    /// Why the hook was skipped or could not run.
    pub reason: Option<String>,
}

impl HookResult {
    pub fn new(decl: &HookDeclaration, status: HookStatus) -> Self {
        Self {
            id: decl.id.clone(),
            name: decl.display_name().to_string(),
            status,
            exit_code: None,
            files: 0,
            modified: Vec::new(),
            stdout: String::new(),
            stderr: String::new(),
            duration: Duration::ZERO,
            reason: None,
        }
    }

    pub fn skipped(decl: &HookDeclaration, reason: impl Into<String>) -> Self {
        let mut result = Self::new(decl, HookStatus::Skipped);
        result.reason = Some(reason.into());
        result
    }

    pub fn errored(decl: &HookDeclaration, reason: impl Into<String>) -> Self {
        let mut result = Self::new(decl, HookStatus::Errored);
        result.reason = Some(reason.into());
        result
    }

    /// Captured stdout and stderr, in that order.
    pub fn output(&self) -> String {
        let mut output = self.stdout.clone();
        if !self.stderr.is_empty() {
            if !output.is_empty() && !output.ends_with('\n') {
                output.push('\n');
            }
            output.push_str(&self.stderr);
        }
        output
    }
}

// Timing is not part of the outcome.
impl PartialEq for HookResult {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
            && self.name == other.name
            && self.status == other.status
            && self.exit_code == other.exit_code
            && self.files == other.files
            && self.modified == other.modified
            && self.stdout == other.stdout
            && self.stderr == other.stderr
            && self.reason == other.reason
    }
}

/// The ordered outcome of one orchestration pass.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunReport {
    pub results: Vec<HookResult>,
    pub status: HookStatus,
    /// The run was cut short by an interrupt; `results` holds what finished.
    pub interrupted: bool,
}

impl RunReport {
    pub fn new(results: Vec<HookResult>, interrupted: bool) -> Self {
        let status = if interrupted {
            HookStatus::Failure
        } else {
            Self::aggregate(&results)
        };
        Self {
            results,
            status,
            interrupted,
        }
    }

    /// Most severe outcome across `results`. Skipped hooks count as passed,
    /// so a run where nothing matched is a success.
    pub fn aggregate(results: &[HookResult]) -> HookStatus {
        results
            .iter()
            .map(|r| match r.status {
                HookStatus::Skipped => HookStatus::Success,
                other => other,
            })
            .fold(HookStatus::Success, HookStatus::combine)
    }

    pub fn result(&self, id: &str) -> Option<&HookResult> {
        self.results.iter().find(|r| r.id == id)
    }

    pub fn count(&self, status: HookStatus) -> usize {
        self.results.iter().filter(|r| r.status == status).count()
    }

    /// Process exit code; `130` when interrupted, as shells report SIGINT.
    pub fn exit_code(&self) -> i32 {
        if self.interrupted {
            130
        } else {
            self.status.exit_code()
        }
    }
}

fn as_millis<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_u64(duration.as_millis().min(u128::from(u64::MAX)) as u64)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result(id: &str, status: HookStatus) -> HookResult {
        HookResult::new(&HookDeclaration::new(id, id), status)
    }

    #[test]
    fn precedence_order() {
        assert!(HookStatus::Success < HookStatus::Skipped);
        assert!(HookStatus::Skipped < HookStatus::NeedsReview);
        assert!(HookStatus::NeedsReview < HookStatus::Failure);
        assert!(HookStatus::Failure < HookStatus::Errored);
    }

    #[test]
    fn empty_run_is_success() {
        assert_eq!(RunReport::aggregate(&[]), HookStatus::Success);
    }

    #[test]
    fn skipped_counts_as_success() {
        let results = vec![result("a", HookStatus::Skipped)];
        assert_eq!(RunReport::aggregate(&results), HookStatus::Success);
    }

    #[test]
    fn failure_beats_needs_review() {
        let results = vec![
            result("fmt", HookStatus::NeedsReview),
            result("lint", HookStatus::Failure),
        ];
        assert_eq!(RunReport::aggregate(&results), HookStatus::Failure);
    }

    #[test]
    fn errored_beats_everything() {
        let all = [
            HookStatus::Success,
            HookStatus::Skipped,
            HookStatus::NeedsReview,
            HookStatus::Failure,
        ];
        for status in all {
            let results = vec![result("a", status), result("b", HookStatus::Errored)];
            assert_eq!(RunReport::aggregate(&results), HookStatus::Errored);
        }
    }

    #[test]
    fn failing_results_never_aggregate_to_ok() {
        let statuses = [
            HookStatus::Success,
            HookStatus::Skipped,
            HookStatus::NeedsReview,
            HookStatus::Failure,
            HookStatus::Errored,
        ];
        for a in statuses {
            for b in statuses {
                let results = vec![result("a", a), result("b", b)];
                let overall = RunReport::aggregate(&results);
                let has_failure = [a, b]
                    .iter()
                    .any(|s| matches!(s, HookStatus::Failure | HookStatus::Errored));
                if has_failure {
                    assert!(!overall.is_ok(), "{:?} + {:?} gave {:?}", a, b, overall);
                }
            }
        }
    }

    #[test]
    fn interrupted_report_fails() {
        let report = RunReport::new(vec![result("a", HookStatus::Success)], true);
        assert_eq!(report.status, HookStatus::Failure);
        assert_eq!(report.exit_code(), 130);
    }

    #[test]
    fn exit_codes() {
        assert_eq!(HookStatus::Success.exit_code(), 0);
        assert_eq!(HookStatus::Skipped.exit_code(), 0);
        assert_eq!(HookStatus::NeedsReview.exit_code(), 1);
        assert_eq!(HookStatus::Failure.exit_code(), 1);
        assert_eq!(HookStatus::Errored.exit_code(), 2);
    }

    #[test]
    fn output_joins_streams() {
        let mut r = result("a", HookStatus::Failure);
        r.stdout = "out".into();
        r.stderr = "err\n".into();
        assert_eq!(r.output(), "out\nerr\n");
    }

    #[test]
    fn equality_ignores_duration() {
        let a = result("a", HookStatus::Success);
        let mut b = a.clone();
        b.duration = Duration::from_secs(3);
        assert_eq!(a, b);
    }

    #[test]
    fn serializes_duration_in_millis() {
        let mut r = result("a", HookStatus::Errored);
        r.duration = Duration::from_millis(1500);
        r.reason = Some("timed out after 2 seconds".into());
        let value = serde_json::to_value(&r).unwrap();
        assert_eq!(value["duration_ms"], 1500);
        assert_eq!(value["status"], "errored");
        assert!(value.get("duration").is_none());
    }
}
