//! Narrowing the working file set down to what one hook should see.

use crate::classify::FileRecord;
use hookline_config::HookDeclaration;

/// Files a hook applies to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MatchSet {
    /// The hook has no file restriction and runs once without file arguments.
    WholeRepo,
    /// Matching paths in input order. Empty means the hook is skipped.
    Files(Vec<String>),
}

impl MatchSet {
    pub fn is_empty(&self) -> bool {
        match self {
            MatchSet::WholeRepo => false,
            MatchSet::Files(files) => files.is_empty(),
        }
    }

    /// Matched paths; none for whole-repository hooks.
    pub fn files(&self) -> &[String] {
        match self {
            MatchSet::WholeRepo => &[],
            MatchSet::Files(files) => files,
        }
    }
}

/// Whether `record` passes every filter of `decl`.
///
/// Unclassifiable records never match. With no `types` any classified path
/// passes the type check.
pub fn matches(decl: &HookDeclaration, record: &FileRecord) -> bool {
    let Some(tags) = record.tags() else {
        return false;
    };

    if !decl.types.is_empty() && decl.types.is_disjoint(tags) {
        return false;
    }

    if let Some(files) = &decl.files
        && !files.is_match(&record.path)
    {
        return false;
    }

    if let Some(exclude) = &decl.exclude
        && exclude.is_match(&record.path)
    {
        return false;
    }

    true
}

/// Resolves the files `decl` should run against.
pub fn match_files(decl: &HookDeclaration, records: &[FileRecord]) -> MatchSet {
    if decl.is_unrestricted() {
        return MatchSet::WholeRepo;
    }

    MatchSet::Files(
        records
            .iter()
            .filter(|record| matches(decl, record))
            .map(|record| record.path.clone())
            .collect(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::Classification;
    use regex::Regex;

    fn records() -> Vec<FileRecord> {
        vec![
            FileRecord::tagged("a.yaml", ["file", "text", "yaml"]),
            FileRecord::tagged("b.py", ["file", "text", "python"]),
            FileRecord::tagged("stubs/c.pyi", ["file", "text", "python", "pyi"]),
            FileRecord::tagged("vendor/d.py", ["file", "text", "python"]),
            FileRecord {
                path: "gone.py".into(),
                classification: Classification::Unclassifiable("not found".into()),
            },
        ]
    }

    #[test]
    fn type_filter_keeps_order() {
        let decl = HookDeclaration::new("ruff", "ruff").with_types(["python"]);
        assert_eq!(
            match_files(&decl, &records()),
            MatchSet::Files(vec![
                "b.py".into(),
                "stubs/c.pyi".into(),
                "vendor/d.py".into()
            ])
        );
    }

    #[test]
    fn types_are_any_of() {
        let decl = HookDeclaration::new("check", "check").with_types(["yaml", "pyi"]);
        assert_eq!(
            match_files(&decl, &records()),
            MatchSet::Files(vec!["a.yaml".into(), "stubs/c.pyi".into()])
        );
    }

    #[test]
    fn exclude_is_conjunctive_with_types() {
        let decl = HookDeclaration::new("ruff", "ruff")
            .with_types(["python"])
            .with_exclude(Regex::new("^vendor/").unwrap());
        assert_eq!(
            match_files(&decl, &records()),
            MatchSet::Files(vec!["b.py".into(), "stubs/c.pyi".into()])
        );
    }

    #[test]
    fn files_pattern_narrows() {
        let decl = HookDeclaration::new("stubs", "stubs").with_files(Regex::new("^stubs/").unwrap());
        assert_eq!(
            match_files(&decl, &records()),
            MatchSet::Files(vec!["stubs/c.pyi".into()])
        );
    }

    #[test]
    fn exclude_only_filters_everything_classified() {
        let decl = HookDeclaration::new("eol", "eol").with_exclude(Regex::new(r"\.py$").unwrap());
        assert_eq!(match_files(&decl, &records()), MatchSet::Files(vec!["a.yaml".into()]));
    }

    #[test]
    fn unclassifiable_never_matches() {
        let decl = HookDeclaration::new("all", "all").with_files(Regex::new(".*").unwrap());
        let matched = match_files(&decl, &records());
        assert!(!matched.files().contains(&"gone.py".to_string()));
    }

    #[test]
    fn unrestricted_matches_whole_repo() {
        let decl = HookDeclaration::new("pyright", "pyright");
        let matched = match_files(&decl, &[]);
        assert_eq!(matched, MatchSet::WholeRepo);
        assert!(!matched.is_empty());
        assert!(matched.files().is_empty());
    }

    #[test]
    fn no_match_is_empty() {
        let decl = HookDeclaration::new("x", "x").with_types(["json"]);
        let matched = match_files(&decl, &[FileRecord::tagged("a.py", ["python"])]);
        assert!(matched.is_empty());
    }

    #[test]
    fn matched_files_always_satisfy_filters() {
        let filters: &[&[&str]] = &[&["python"], &["yaml"], &["pyi", "yaml"], &["json"]];
        let exclude = Regex::new("^vendor/").unwrap();
        let records = records();
        for types in filters {
            let decl = HookDeclaration::new("h", "h")
                .with_types(types.iter().copied())
                .with_exclude(exclude.clone());
            for path in match_files(&decl, &records).files() {
                let record = records.iter().find(|r| &r.path == path).unwrap();
                let tags = record.tags().unwrap();
                assert!(types.iter().any(|t| tags.contains(*t)));
                assert!(!exclude.is_match(path));
            }
        }
    }
}
