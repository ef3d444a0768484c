//! Ordered, single-pass execution of every declared hook.

use crate::classify::FileRecord;
use crate::matcher::{MatchSet, match_files};
use crate::report::{HookResult, HookStatus, RunReport};
use crate::runner::HookRunner;
use hookline_config::{HookConfig, HookDeclaration};
use regex::Regex;
use std::collections::HashSet;
use std::fmt;
use tracing::debug;

/// Where a run currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Pending,
    /// Running the declaration at this index.
    Running(usize),
    Aggregating,
    Done(HookStatus),
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Phase::Pending => write!(f, "pending"),
            Phase::Running(i) => write!(f, "running({})", i),
            Phase::Aggregating => write!(f, "aggregating"),
            Phase::Done(status) => write!(f, "done({})", status),
        }
    }
}

/// Per-run policy on top of the declarations.
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    /// Stop after the first FAILURE or ERRORED; the rest are recorded as skipped.
    pub fail_fast: bool,
    /// Hook ids the user asked to skip.
    pub skip: HashSet<String>,
    /// Run only this hook id; other declarations are left out of the report.
    pub only: Option<String>,
}

impl RunOptions {
    pub fn with_fail_fast(mut self, fail_fast: bool) -> Self {
        self.fail_fast = fail_fast;
        self
    }

    pub fn with_skip<I, S>(mut self, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.skip.extend(ids.into_iter().map(Into::into));
        self
    }

    pub fn with_only(mut self, id: impl Into<String>) -> Self {
        self.only = Some(id.into());
        self
    }

    /// Parses a `SKIP`-style list: comma separated, blanks ignored.
    pub fn parse_skip_list(value: &str) -> Vec<String> {
        value
            .split(',')
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .map(String::from)
            .collect()
    }
}

/// Drives declarations through matching and execution, in configured order.
#[derive(Debug)]
pub struct Orchestrator {
    hooks: Vec<HookDeclaration>,
    exclude: Option<Regex>,
    runner: HookRunner,
    options: RunOptions,
    phase: Phase,
}

impl Orchestrator {
    pub fn new(hooks: Vec<HookDeclaration>, runner: HookRunner) -> Self {
        Self {
            hooks,
            exclude: None,
            runner,
            options: RunOptions::default(),
            phase: Phase::Pending,
        }
    }

    /// Takes declarations, the global exclude and `fail_fast` from a loaded config.
    pub fn from_config(config: &HookConfig, runner: HookRunner) -> Self {
        let mut orchestrator = Self::new(config.hooks.clone(), runner);
        orchestrator.exclude = config.exclude.clone();
        orchestrator.options.fail_fast = config.fail_fast;
        orchestrator
    }

    /// Builder: replaces the run options. `fail_fast` from the config is kept
    /// when already set.
    pub fn with_options(mut self, options: RunOptions) -> Self {
        let fail_fast = self.options.fail_fast || options.fail_fast;
        self.options = options;
        self.options.fail_fast = fail_fast;
        self
    }

    pub fn with_exclude(mut self, exclude: Regex) -> Self {
        self.exclude = Some(exclude);
        self
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn hooks(&self) -> &[HookDeclaration] {
        &self.hooks
    }

    pub fn runner(&self) -> &HookRunner {
        &self.runner
    }

    /// Number of declarations a run will try: those picked by `only`, minus
    /// the ones the user skipped.
    pub fn selected_count(&self) -> usize {
        self.hooks
            .iter()
            .filter(|decl| self.is_selected(decl) && !self.options.skip.contains(&decl.id))
            .count()
    }

    fn is_selected(&self, decl: &HookDeclaration) -> bool {
        self.options.only.as_ref().is_none_or(|only| *only == decl.id)
    }

    pub fn run(&mut self, records: &[FileRecord]) -> RunReport {
        self.run_with(records, |_| {})
    }

    /// Runs every selected declaration once, handing each result to
    /// `on_result` as soon as it exists.
    ///
    /// The returned report lists results in execution order. An interrupt
    /// stops the run after the in-flight hook; what finished stays in the
    /// report.
    pub fn run_with<F>(&mut self, records: &[FileRecord], mut on_result: F) -> RunReport
    where
        F: FnMut(&HookResult),
    {
        let records: Vec<FileRecord> = match &self.exclude {
            Some(exclude) => records
                .iter()
                .filter(|r| !exclude.is_match(&r.path))
                .cloned()
                .collect(),
            None => records.to_vec(),
        };

        // Candidates for change detection on whole-repository fixers.
        let all_files: Vec<String> = records
            .iter()
            .filter(|r| r.has_tag("file"))
            .map(|r| r.path.clone())
            .collect();

        let mut results = Vec::new();
        let mut interrupted = false;
        let mut stopped = false;

        for (index, decl) in self.hooks.iter().enumerate() {
            if !self.is_selected(decl) {
                continue;
            }

            if self.runner.is_cancelled() {
                interrupted = true;
                break;
            }

            let result = if stopped {
                HookResult::skipped(decl, "fail fast")
            } else if self.options.skip.contains(&decl.id) {
                HookResult::skipped(decl, "skipped by user")
            } else {
                transition(&mut self.phase, Phase::Running(index));
                let matched = match_files(decl, &records);
                if matched.is_empty() {
                    debug!(hook = %decl.id, "no matching files");
                    HookResult::skipped(decl, "no files to check")
                } else {
                    let watched = match &matched {
                        MatchSet::WholeRepo => all_files.as_slice(),
                        MatchSet::Files(files) => files.as_slice(),
                    };
                    self.runner.run(decl, &matched, watched)
                }
            };

            if self.options.fail_fast && matches!(result.status, HookStatus::Failure | HookStatus::Errored) {
                stopped = true;
            }

            on_result(&result);
            results.push(result);

            if self.runner.is_cancelled() {
                interrupted = true;
                break;
            }
        }

        transition(&mut self.phase, Phase::Aggregating);
        let report = RunReport::new(results, interrupted);
        transition(&mut self.phase, Phase::Done(report.status));
        report
    }
}

fn transition(phase: &mut Phase, next: Phase) {
    debug!(from = %phase, to = %next, "orchestrator phase");
    *phase = next;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_skip_list_ignores_blanks() {
        assert_eq!(
            RunOptions::parse_skip_list(" ruff, ,mypy ,"),
            vec!["ruff".to_string(), "mypy".to_string()]
        );
        assert!(RunOptions::parse_skip_list("").is_empty());
    }

    #[test]
    fn selected_count_honors_only_and_skip() {
        let hooks = vec![
            HookDeclaration::new("ruff", "ruff"),
            HookDeclaration::new("mypy", "mypy"),
            HookDeclaration::new("check-yaml", "check-yaml"),
        ];
        let all = Orchestrator::new(hooks.clone(), HookRunner::new("."));
        assert_eq!(all.selected_count(), 3);

        let skipped = Orchestrator::new(hooks.clone(), HookRunner::new("."))
            .with_options(RunOptions::default().with_skip(["mypy"]));
        assert_eq!(skipped.selected_count(), 2);

        let only = Orchestrator::new(hooks.clone(), HookRunner::new("."))
            .with_options(RunOptions::default().with_only("ruff"));
        assert_eq!(only.selected_count(), 1);

        let only_skipped = Orchestrator::new(hooks, HookRunner::new("."))
            .with_options(RunOptions::default().with_only("ruff").with_skip(["ruff"]));
        assert_eq!(only_skipped.selected_count(), 0);
    }

    #[test]
    fn starts_pending() {
        let orchestrator = Orchestrator::new(Vec::new(), HookRunner::new("."));
        assert_eq!(orchestrator.phase(), Phase::Pending);
    }

    #[test]
    fn empty_run_is_done_success() {
        let mut orchestrator = Orchestrator::new(Vec::new(), HookRunner::new("."));
        let report = orchestrator.run(&[]);
        assert!(report.results.is_empty());
        assert_eq!(orchestrator.phase(), Phase::Done(HookStatus::Success));
    }

    #[test]
    fn skipped_hooks_never_start() {
        let hooks = vec![
            HookDeclaration::new("json", "definitely-not-a-real-binary").with_types(["json"]),
            HookDeclaration::new("user", "definitely-not-a-real-binary"),
        ];
        let options = RunOptions::default().with_skip(["user"]);
        let mut orchestrator = Orchestrator::new(hooks, HookRunner::new(".")).with_options(options);

        let report = orchestrator.run(&[FileRecord::tagged("a.py", ["file", "python"])]);

        assert_eq!(report.results.len(), 2);
        assert_eq!(report.results[0].status, HookStatus::Skipped);
        assert_eq!(report.results[0].reason.as_deref(), Some("no files to check"));
        assert_eq!(report.results[1].reason.as_deref(), Some("skipped by user"));
        assert_eq!(report.status, HookStatus::Success);
    }

    #[test]
    fn only_lists_selected_hook() {
        let hooks = vec![
            HookDeclaration::new("a", "a").with_types(["json"]),
            HookDeclaration::new("b", "b").with_types(["json"]),
        ];
        let options = RunOptions::default().with_only("b");
        let mut orchestrator = Orchestrator::new(hooks, HookRunner::new(".")).with_options(options);

        let report = orchestrator.run(&[]);
        assert_eq!(report.results.len(), 1);
        assert_eq!(report.results[0].id, "b");
    }

    #[test]
    fn global_exclude_removes_records() {
        let hooks = vec![HookDeclaration::new("py", "definitely-not-a-real-binary").with_types(["python"])];
        let mut orchestrator =
            Orchestrator::new(hooks, HookRunner::new(".")).with_exclude(Regex::new("^vendor/").unwrap());

        let report = orchestrator.run(&[FileRecord::tagged("vendor/a.py", ["file", "python"])]);
        assert_eq!(report.results[0].status, HookStatus::Skipped);
    }

    #[test]
    fn missing_executable_with_fail_fast_skips_rest() {
        let hooks = vec![
            HookDeclaration::new("missing", "definitely-not-a-real-binary"),
            HookDeclaration::new("after", "definitely-not-a-real-binary"),
        ];
        let options = RunOptions::default().with_fail_fast(true);
        let mut orchestrator = Orchestrator::new(hooks, HookRunner::new(".")).with_options(options);

        let report = orchestrator.run(&[]);
        assert_eq!(report.results[0].status, HookStatus::Errored);
        assert_eq!(report.results[1].status, HookStatus::Skipped);
        assert_eq!(report.results[1].reason.as_deref(), Some("fail fast"));
        assert_eq!(report.status, HookStatus::Errored);
    }

    #[test]
    fn cancelled_before_start_reports_interrupt() {
        let hooks = vec![HookDeclaration::new("a", "a")];
        let runner = HookRunner::new(".");
        runner.cancel_flag().store(true, std::sync::atomic::Ordering::SeqCst);
        let mut orchestrator = Orchestrator::new(hooks, runner);

        let report = orchestrator.run(&[]);
        assert!(report.interrupted);
        assert!(report.results.is_empty());
        assert_eq!(report.status, HookStatus::Failure);
        assert_eq!(orchestrator.phase(), Phase::Done(HookStatus::Failure));
    }
}
