#![cfg(unix)]

use anyhow::Result;
use hookline::prelude::*;
use hookline::{MatchSet, match_files, parse};

const CONFIG: &str = r##"
[[repos]]
repo = "local"

[[repos.hooks]]
id = "check-yaml"
entry = "sh -c 'exit 0' --"
types = ["yaml"]

[[repos.hooks]]
id = "ruff-format"
entry = "sh -c 'for f in \"$@\"; do printf \"# fmt\\n\" >> \"$f\"; done' --"
types = ["python"]
fixing = true

[[repos.hooks]]
id = "check-json"
entry = "sh -c 'exit 1' --"
types = ["json"]
"##;

#[test]
fn test_config_to_report() -> Result<()> {
    let dir = tempfile::tempdir()?;
    std::fs::write(dir.path().join("a.yaml"), "a: 1\n")?;
    std::fs::write(dir.path().join("b.py"), "x = 1\n")?;

    let config = parse(CONFIG)?;
    let files = collect_files(
        dir.path(),
        &FileSelection::Explicit(vec!["./b.py".into(), "a.yaml".into()]),
    )?;
    assert_eq!(files, ["a.yaml", "b.py"]);

    let records = FileClassifier::new().classify_all(dir.path(), &files);
    assert_eq!(
        match_files(&config.hooks[0], &records),
        MatchSet::Files(vec!["a.yaml".into()])
    );

    let report = Orchestrator::from_config(&config, HookRunner::new(dir.path())).run(&records);

    let statuses: Vec<(&str, HookStatus)> = report
        .results
        .iter()
        .map(|r| (r.id.as_str(), r.status))
        .collect();
    assert_eq!(
        statuses,
        [
            ("check-yaml", HookStatus::Success),
            ("ruff-format", HookStatus::NeedsReview),
            ("check-json", HookStatus::Skipped),
        ]
    );
    assert_eq!(report.status, HookStatus::NeedsReview);
    assert_eq!(
        std::fs::read_to_string(dir.path().join("b.py"))?,
        "x = 1\n# fmt\n"
    );
    Ok(())
}
