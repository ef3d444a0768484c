use colored::*;
use hookline_run::{HookResult, HookStatus, RunReport};

const LINE_WIDTH: usize = 72;

fn status_text(status: HookStatus) -> ColoredString {
    match status {
        HookStatus::Success => status.label().green(),
        HookStatus::Skipped => status.label().cyan(),
        HookStatus::NeedsReview => status.label().yellow(),
        HookStatus::Failure => status.label().red(),
        HookStatus::Errored => status.label().red().bold(),
    }
}

/// One line per hook, dotted out to a fixed width, followed by details for
/// hooks that need attention.
pub fn render_result(result: &HookResult, verbose: bool) -> String {
    let label = result.status.label();
    let base_len = result.name.chars().count() + label.len();
    let dots = ".".repeat(LINE_WIDTH.saturating_sub(base_len).max(1));

    let mut out = format!("{}{}{}", result.name, dots, status_text(result.status));
    if let Some(reason) = &result.reason {
        out.push_str(&format!(" {}", format!("({})", reason).dimmed()));
    }
    out.push('\n');

    if verbose || !result.status.is_ok() {
        out.push_str(&format!("{}\n", format!("- hook id: {}", result.id).dimmed()));
        if let Some(code) = result.exit_code
            && code != 0
        {
            out.push_str(&format!("{}\n", format!("- exit code: {}", code).dimmed()));
        }
        if verbose {
            out.push_str(&format!(
                "{}\n",
                format!("- duration: {:.2}s", result.duration.as_secs_f64()).dimmed()
            ));
        }
    }

    if !result.modified.is_empty() {
        out.push_str(&format!("{}\n", "- files were modified by this hook:".yellow()));
        for path in &result.modified {
            out.push_str(&format!("  {} {}\n", "~".yellow(), path.display()));
        }
    }

    let output = result.output();
    if !output.trim().is_empty() && (verbose || !result.status.is_ok()) {
        out.push('\n');
        for line in output.lines() {
            out.push_str(&format!("    {}\n", line));
        }
        out.push('\n');
    }

    out
}

/// Closing summary for the whole run.
pub fn render_summary(report: &RunReport) -> String {
    let counts = [
        (HookStatus::Success, report.count(HookStatus::Success)),
        (HookStatus::Skipped, report.count(HookStatus::Skipped)),
        (HookStatus::NeedsReview, report.count(HookStatus::NeedsReview)),
        (HookStatus::Failure, report.count(HookStatus::Failure)),
        (HookStatus::Errored, report.count(HookStatus::Errored)),
    ];
    let breakdown: Vec<String> = counts
        .iter()
        .filter(|(_, n)| *n > 0)
        .map(|(status, n)| format!("{} {}", n, status.label().to_lowercase()))
        .collect();
    let breakdown = breakdown.join(", ");

    let headline = if report.interrupted {
        format!("{} {}", "x".red().bold(), "Interrupted".red().bold())
    } else {
        match report.status {
            HookStatus::Success | HookStatus::Skipped => {
                if report.results.is_empty() {
                    return format!("{} {}\n", "✓".green().bold(), "No hooks to run".dimmed());
                }
                format!("{} {}", "✓".green().bold(), "Passed".green().bold())
            }
            HookStatus::NeedsReview => format!(
                "{} {}",
                "~".yellow().bold(),
                "Files were modified, review and stage them".yellow().bold()
            ),
            HookStatus::Failure => format!("{} {}", "x".red().bold(), "Failed".red().bold()),
            HookStatus::Errored => {
                format!("{} {}", "x".red().bold(), "Some hooks could not run".red().bold())
            }
        }
    };

    if breakdown.is_empty() {
        format!("{}\n", headline)
    } else {
        format!("{} {}\n", headline, breakdown.dimmed())
    }
}

pub fn render_json(report: &RunReport) -> anyhow::Result<String> {
    Ok(serde_json::to_string_pretty(report)?)
}
