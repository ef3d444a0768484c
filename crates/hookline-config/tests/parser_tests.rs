use anyhow::Result;
use hookline_config::{ConfigError, HookSource, load_file, parse};
use std::time::Duration;

const SAMPLE: &str = r#"
exclude = "^vendor/"
fail_fast = true

[tags]
protobuf = [".proto"]

[[repos]]
repo = "https://github.com/pre-commit/pre-commit-hooks"

[[repos.hooks]]
id = "check-yaml"
types = ["yaml"]

[[repos.hooks]]
id = "detect-private-key"

[[repos]]
repo = "local"

[[repos.hooks]]
id = "ruff-format"
name = "ruff (format)"
entry = "ruff format"
args = ["--quiet"]
types = ["python", "pyi"]
exclude = "_pb2\\.py$"
fixing = true
timeout = 60

[[repos.hooks]]
id = "pyright"
entry = "pyright"
types = ["python"]
pass_filenames = false
"#;

#[test]
fn test_sample_config() -> Result<()> {
    let config = parse(SAMPLE)?;

    assert!(config.fail_fast);
    assert!(config.exclude.as_ref().unwrap().is_match("vendor/x.py"));
    assert_eq!(config.tags["protobuf"], vec!["proto"]);

    let ids: Vec<&str> = config.hooks.iter().map(|h| h.id.as_str()).collect();
    assert_eq!(ids, vec!["check-yaml", "detect-private-key", "ruff-format", "pyright"]);
    Ok(())
}

#[test]
fn test_remote_source_recorded() -> Result<()> {
    let config = parse(SAMPLE)?;
    assert!(config.hooks[0].source.is_remote());
    assert_eq!(config.hooks[2].source, HookSource::Local);
    Ok(())
}

#[test]
fn test_entry_defaults_to_id() -> Result<()> {
    let config = parse(SAMPLE)?;
    assert_eq!(config.hooks[0].entry, vec!["check-yaml"]);
    Ok(())
}

#[test]
fn test_entry_is_split_into_words() -> Result<()> {
    let config = parse(SAMPLE)?;
    let hook = config.hook("ruff-format").unwrap();
    assert_eq!(hook.command_line(), vec!["ruff", "format", "--quiet"]);
    assert!(hook.fixing);
    assert_eq!(hook.timeout, Some(Duration::from_secs(60)));
    assert_eq!(hook.display_name(), "ruff (format)");
    assert!(hook.types.contains("pyi"));
    Ok(())
}

#[test]
fn test_unrestricted_hooks() -> Result<()> {
    let config = parse(SAMPLE)?;
    assert!(config.hook("detect-private-key").unwrap().is_unrestricted());
    // Typed but not given file names: still skipped when no python file is present.
    let pyright = config.hook("pyright").unwrap();
    assert!(!pyright.pass_filenames);
    assert!(!pyright.is_unrestricted());
    assert!(!config.hook("check-yaml").unwrap().is_unrestricted());
    Ok(())
}

#[test]
fn test_empty_config() -> Result<()> {
    let config = parse("")?;
    assert!(config.hooks.is_empty());
    assert!(!config.fail_fast);
    Ok(())
}

#[test]
fn test_missing_id() {
    let source = r#"
[[repos]]
repo = "local"

[[repos.hooks]]
entry = "true"
"#;
    match parse(source) {
        Err(ConfigError::MissingField { field, location, span }) => {
            assert_eq!(field, "id");
            assert_eq!(location, "repos[0].hooks[0]");
            assert_eq!(span.unwrap().line, 3);
        }
        other => panic!("Expected MissingField, got {:?}", other),
    }
}

#[test]
fn test_duplicate_id() {
    let source = r#"
[[repos]]
repo = "local"

[[repos.hooks]]
id = "lint"

[[repos.hooks]]
id = "lint"
"#;
    match parse(source) {
        Err(ConfigError::DuplicateId { id, span }) => {
            assert_eq!(id, "lint");
            assert_eq!(span.unwrap().line, 9);
        }
        other => panic!("Expected DuplicateId, got {:?}", other),
    }
}

#[test]
fn test_invalid_exclude_pattern() {
    let source = r#"
[[repos]]
repo = "local"

[[repos.hooks]]
id = "lint"
exclude = "(unclosed"
"#;
    match parse(source) {
        Err(ConfigError::InvalidPattern { hook, pattern, span, .. }) => {
            assert_eq!(hook.as_deref(), Some("lint"));
            assert_eq!(pattern, "(unclosed");
            assert_eq!(span.unwrap().line, 7);
        }
        other => panic!("Expected InvalidPattern, got {:?}", other),
    }
}

#[test]
fn test_invalid_global_exclude() {
    let err = parse(r#"exclude = "[""#).unwrap_err();
    assert!(matches!(err, ConfigError::InvalidPattern { hook: None, .. }));
}

#[test]
fn test_empty_entry() {
    let source = r#"
[[repos]]
repo = "local"

[[repos.hooks]]
id = "lint"
entry = "   "
"#;
    let err = parse(source).unwrap_err();
    assert!(matches!(err, ConfigError::EmptyField { field: "entry", .. }));
}

#[test]
fn test_unbalanced_entry_quotes() {
    let source = r#"
[[repos]]
repo = "local"

[[repos.hooks]]
id = "lint"
entry = "sh -c 'echo"
"#;
    let err = parse(source).unwrap_err();
    assert!(matches!(err, ConfigError::InvalidEntry { .. }));
}

#[test]
fn test_zero_timeout() {
    let source = r#"
[[repos]]
repo = "local"

[[repos.hooks]]
id = "lint"
timeout = 0
"#;
    let err = parse(source).unwrap_err();
    assert!(matches!(err, ConfigError::InvalidTimeout { .. }));
}

#[test]
fn test_unknown_field_is_rejected() {
    let source = r#"
[[repos]]
repo = "local"

[[repos.hooks]]
id = "lint"
langauge = "python"
"#;
    match parse(source) {
        Err(ConfigError::Syntax { message, .. }) => {
            assert!(message.contains("langauge"));
        }
        other => panic!("Expected Syntax error, got {:?}", other),
    }
}

#[test]
fn test_toml_syntax_error_has_location() {
    let err = parse("repos = [").unwrap_err();
    assert!(matches!(err, ConfigError::Syntax { span: Some(_), .. }));
}

#[test]
fn test_empty_tag_extensions() {
    let err = parse("[tags]\nproto = []").unwrap_err();
    assert!(matches!(err, ConfigError::InvalidTag { .. }));
}

#[test]
fn test_load_file_missing() {
    let dir = tempfile::tempdir().unwrap();
    let err = load_file(&dir.path().join("nope.toml")).unwrap_err();
    assert!(matches!(err, ConfigError::Io { .. }));
}

#[test]
fn test_find_config_walks_up() -> Result<()> {
    let dir = tempfile::tempdir()?;
    std::fs::write(dir.path().join(".hookline.toml"), "")?;
    let nested = dir.path().join("src").join("deep");
    std::fs::create_dir_all(&nested)?;

    let found = hookline_config::find_config(&nested).unwrap();
    assert_eq!(found, dir.path().canonicalize()?.join(".hookline.toml"));
    Ok(())
}
