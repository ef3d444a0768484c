//! # hookline-cli
//!
//! Command-line interface for hookline.
//!
//! Loads `.hookline.toml`, collects the working file set from git (staged
//! files by default), classifies it and runs every declared hook in order.
//! The exit code reflects the most severe hook outcome.

mod config;
mod errors;
mod report;

use anyhow::{Context, Result, bail};
use clap::{Args, Parser, Subcommand};
use colored::*;
use hookline_config::{CONFIG_FILE_NAME, ConfigError, HookConfig, find_config, parse};
use hookline_git::{FileSelection, collect_files, hooks_dir, repo_root};
use hookline_run::{
    Classification, FileClassifier, HookRunner, Orchestrator, RunOptions, Settings,
};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::AtomicBool;
use tracing::{debug, warn};

use errors::{EnhancedError, config_error, enhance_error};

#[derive(Parser)]
#[command(name = "hookline")]
#[command(about = "Run pre-commit hooks declared in .hookline.toml", long_about = None)]
#[command(version)]
#[command(args_conflicts_with_subcommands = true)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    #[command(flatten)]
    run: RunArgs,

    /// Show debug logs and full hook output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    no_color: bool,
}

#[derive(Args, Debug, Default)]
struct RunArgs {
    /// Run only the hook with this id
    #[arg(value_name = "HOOK_ID")]
    hook: Option<String>,

    /// Run on every tracked file instead of the staged ones
    #[arg(short, long, conflicts_with = "files")]
    all_files: bool,

    /// Run on these files instead of the staged ones
    #[arg(long, num_args = 1..)]
    files: Vec<String>,

    /// Path to the hook config (default: .hookline.toml in the repository root)
    #[arg(short, long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Skip hooks by id (also read from the SKIP environment variable)
    #[arg(long, value_delimiter = ',')]
    skip: Vec<String>,

    /// Default per-hook timeout in seconds
    #[arg(long, value_name = "SECONDS")]
    timeout: Option<u64>,

    /// Stop after the first failing hook
    #[arg(long)]
    fail_fast: bool,

    /// Print the run report as JSON
    #[arg(long)]
    json: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Run hooks (the default command)
    Run(RunArgs),
    /// List declared hooks and their filters
    List {
        #[arg(short, long, value_name = "PATH")]
        config: Option<PathBuf>,
    },
    /// Print the type tags of each path
    Classify {
        #[arg(required = true)]
        paths: Vec<PathBuf>,
    },
    /// Write a sample .hookline.toml
    Init,
    /// Install a git pre-commit hook that runs hookline
    Install {
        /// Overwrite an existing pre-commit hook
        #[arg(short, long)]
        force: bool,
    },
    #[command(about = "Get or set settings in .hooklinerc")]
    Config {
        /// Setting key (command_timeout, fail_fast, colored, verbose)
        key: Option<String>,
        /// Value to set (omit to get current value)
        value: Option<String>,
        /// List all settings
        #[arg(short, long)]
        list: bool,
        /// Remove a setting
        #[arg(short, long)]
        unset: bool,
        /// Use global settings (~/.hooklinerc) instead of local (.hooklinerc)
        #[arg(short, long)]
        global: bool,
    },
}

fn main() {
    let cli = Cli::parse();

    let cwd = match std::env::current_dir() {
        Ok(dir) => dir,
        Err(e) => {
            EnhancedError::new(format!("Failed to read current directory: {}", e)).display();
            std::process::exit(1);
        }
    };

    // Logging is not set up yet; settings decide its level.
    let mut settings = Settings::load_reporting(&cwd, |path, e| {
        eprintln!(
            "{} Ignoring settings file {}: {:#}",
            "⚠".yellow().bold(),
            path.display(),
            e
        );
    });

    let run_args = match &cli.command {
        Some(Commands::Run(args)) => Some(args),
        None => Some(&cli.run),
        _ => None,
    };
    match run_args {
        Some(args) => settings.merge_cli_args(args.timeout, args.fail_fast, cli.verbose, cli.no_color),
        None => settings.merge_cli_args(None, false, cli.verbose, cli.no_color),
    }

    init_logging(settings.verbose);
    if !settings.colored {
        colored::control::set_override(false);
    }

    let result = match cli.command {
        None => run_hooks(&cwd, &cli.run, &settings),
        Some(Commands::Run(args)) => run_hooks(&cwd, &args, &settings),
        Some(Commands::List { config }) => list_hooks(&cwd, config.as_deref()),
        Some(Commands::Classify { paths }) => classify_paths(&cwd, &paths),
        Some(Commands::Init) => init_config(&cwd),
        Some(Commands::Install { force }) => install_hook(&cwd, force),
        Some(Commands::Config {
            key,
            value,
            list,
            unset,
            global,
        }) => config::handle_config(key, value, list, unset, global).map(|_| 0),
    };

    let code = match result {
        Ok(code) => code,
        Err(e) => {
            enhance_error(&e).display();
            1
        }
    };
    std::process::exit(code);
}

fn init_logging(verbose: bool) {
    let level = if verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::WARN
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

/// Registers SIGINT and SIGTERM so an interrupt stops the in-flight hook
/// instead of killing hookline itself.
fn interrupt_flag() -> Arc<AtomicBool> {
    let flag = Arc::new(AtomicBool::new(false));
    for signal in [signal_hook::consts::SIGINT, signal_hook::consts::SIGTERM] {
        if let Err(e) = signal_hook::flag::register(signal, Arc::clone(&flag)) {
            warn!(signal, error = %e, "failed to register signal handler");
        }
    }
    flag
}

/// Reads and validates the hook config, rendering any problem for the user.
fn load_config(path: &Path) -> std::result::Result<HookConfig, EnhancedError> {
    let display = path.display().to_string();
    let source = fs::read_to_string(path).map_err(|e| {
        let err = ConfigError::Io {
            path: path.to_path_buf(),
            message: e.to_string(),
        };
        config_error(&err, &display, None)
    })?;
    parse(&source).map_err(|err| config_error(&err, &display, Some(&source)))
}

fn resolve_config_path(cwd: &Path, root: &Path, explicit: Option<&Path>) -> PathBuf {
    match explicit {
        Some(path) if path.is_absolute() => path.to_path_buf(),
        Some(path) => cwd.join(path),
        None => find_config(cwd).unwrap_or_else(|| root.join(CONFIG_FILE_NAME)),
    }
}

fn classifier_for(config: &HookConfig) -> FileClassifier {
    let mut classifier = FileClassifier::new();
    for (tag, extensions) in &config.tags {
        classifier.register_extensions(tag.clone(), extensions.iter());
    }
    classifier
}

/// Merges the comma separated `SKIP` environment value with `--skip` ids.
fn skip_list(env: Option<&str>, cli: &[String]) -> Vec<String> {
    let mut ids = env.map(RunOptions::parse_skip_list).unwrap_or_default();
    ids.extend(cli.iter().map(|id| id.trim().to_string()).filter(|id| !id.is_empty()));
    ids
}

fn run_hooks(cwd: &Path, args: &RunArgs, settings: &Settings) -> Result<i32> {
    let selection = if !args.files.is_empty() {
        FileSelection::Explicit(args.files.clone())
    } else if args.all_files {
        FileSelection::AllFiles
    } else {
        FileSelection::Staged
    };

    let root = match repo_root(cwd) {
        Ok(root) => root,
        Err(e) if matches!(selection, FileSelection::Explicit(_)) => {
            debug!(error = %e, "not in a git repository, using the current directory");
            cwd.to_path_buf()
        }
        Err(e) => return Err(e),
    };

    let config_path = resolve_config_path(cwd, &root, args.config.as_deref());
    let config = match load_config(&config_path) {
        Ok(config) => config,
        Err(enhanced) => {
            enhanced.display();
            return Ok(1);
        }
    };

    if let Some(id) = &args.hook
        && config.hook(id).is_none()
    {
        let known: Vec<&str> = config.hooks.iter().map(|h| h.id.as_str()).collect();
        EnhancedError::new(format!("No hook with id '{}'", id))
            .with_file(config_path.display().to_string())
            .with_help(format!("Declared hooks: {}", known.join(", ")))
            .display();
        return Ok(1);
    }

    let files = collect_files(&root, &selection)?;
    let records = classifier_for(&config).classify_all(&root, &files);
    debug!(files = records.len(), root = %root.display(), "collected working file set");

    let skip_env = std::env::var("SKIP").ok();
    let mut options = RunOptions::default()
        .with_fail_fast(settings.fail_fast)
        .with_skip(skip_list(skip_env.as_deref(), &args.skip));
    if let Some(id) = &args.hook {
        options = options.with_only(id.clone());
    }

    let runner = HookRunner::new(&root)
        .with_timeout(settings.command_timeout)
        .with_cancel_flag(interrupt_flag());
    let mut orchestrator = Orchestrator::from_config(&config, runner).with_options(options);

    if args.json {
        let report = orchestrator.run(&records);
        println!("{}", report::render_json(&report)?);
        return Ok(report.exit_code());
    }

    println!(
        "{} {}",
        "▶".cyan().bold(),
        format!(
            "Running {} hooks on {} files",
            orchestrator.selected_count(),
            records.len()
        )
        .bold()
    );
    println!();

    let verbose = settings.verbose;
    let report = orchestrator.run_with(&records, |result| {
        print!("{}", report::render_result(result, verbose));
    });

    println!();
    print!("{}", report::render_summary(&report));
    Ok(report.exit_code())
}

fn list_hooks(cwd: &Path, explicit: Option<&Path>) -> Result<i32> {
    let root = repo_root(cwd).unwrap_or_else(|_| cwd.to_path_buf());
    let config_path = resolve_config_path(cwd, &root, explicit);
    let config = match load_config(&config_path) {
        Ok(config) => config,
        Err(enhanced) => {
            enhanced.display();
            return Ok(1);
        }
    };

    println!("{} {}", "Hooks in".cyan().bold(), config_path.display());
    println!();

    if config.hooks.is_empty() {
        println!("{}", "No hooks declared yet.".dimmed());
        return Ok(0);
    }

    for decl in &config.hooks {
        let kind = if decl.fixing {
            "fixing".yellow()
        } else {
            "checking".normal()
        };
        println!(
            "  {} {} {}",
            decl.id.green().bold(),
            format!("[{}]", decl.source).dimmed(),
            kind
        );
        if decl.name.is_some() {
            println!("    name:    {}", decl.display_name());
        }
        println!("    entry:   {}", decl.command_line().join(" "));
        if !decl.types.is_empty() {
            let types: Vec<&str> = decl.types.iter().map(String::as_str).collect();
            println!("    types:   {}", types.join(", "));
        }
        if let Some(files) = &decl.files {
            println!("    files:   {}", files.as_str());
        }
        if let Some(exclude) = &decl.exclude {
            println!("    exclude: {}", exclude.as_str());
        }
        if decl.is_unrestricted() {
            println!("    {}", "runs once for the whole repository".dimmed());
        }
        if let Some(timeout) = decl.timeout {
            println!("    timeout: {}s", timeout.as_secs());
        }
    }

    if let Some(exclude) = &config.exclude {
        println!();
        println!("{} {}", "Global exclude:".dimmed(), exclude.as_str());
    }

    Ok(0)
}

fn classify_paths(cwd: &Path, paths: &[PathBuf]) -> Result<i32> {
    let classifier = match find_config(cwd) {
        Some(path) => match load_config(&path) {
            Ok(config) => classifier_for(&config),
            Err(enhanced) => {
                warn!(error = %enhanced, "ignoring config tags");
                FileClassifier::new()
            }
        },
        None => FileClassifier::new(),
    };

    for path in paths {
        match classifier.classify(path) {
            Classification::Tagged(tags) => {
                let tags: Vec<&str> = tags.iter().map(String::as_str).collect();
                println!("{}: {}", path.display().to_string().bold(), tags.join(", "));
            }
            Classification::Unclassifiable(reason) => {
                println!(
                    "{}: {} {}",
                    path.display().to_string().bold(),
                    "unclassifiable".red(),
                    format!("({})", reason).dimmed()
                );
            }
        }
    }
    Ok(0)
}

const SAMPLE_CONFIG: &str = r#"# hookline configuration
# Hooks run in the order they are declared.

exclude = "^(vendor|third_party)/"

[[repos]]
repo = "local"

[[repos.hooks]]
id = "check-yaml"
name = "check yaml"
entry = "python -c 'import sys, yaml; [yaml.safe_load(open(f)) for f in sys.argv[1:]]'"
types = ["yaml"]

[[repos.hooks]]
id = "ruff-format"
entry = "ruff format"
types = ["python"]
fixing = true

[[repos.hooks]]
id = "ruff"
entry = "ruff check"
args = ["--fix", "--exit-non-zero-on-fix"]
types = ["python"]
fixing = true

[[repos.hooks]]
id = "cargo-clippy"
entry = "cargo clippy -- -D warnings"
pass_filenames = false
timeout = 600
"#;

fn init_config(cwd: &Path) -> Result<i32> {
    let root = repo_root(cwd).unwrap_or_else(|_| cwd.to_path_buf());
    let config_path = root.join(CONFIG_FILE_NAME);

    if config_path.exists() {
        println!(
            "{} {} already exists",
            "ℹ".cyan(),
            config_path.display()
        );
        return Ok(0);
    }

    fs::write(&config_path, SAMPLE_CONFIG)
        .with_context(|| format!("Failed to write config to {}", config_path.display()))?;
    println!(
        "{} Created example config: {}",
        "✓".green().bold(),
        config_path.display()
    );
    println!();
    println!("  Edit {} to declare your hooks", config_path.display());
    println!("  Run {} to run them on every commit", "hookline install".cyan());
    Ok(0)
}

const SHIM_MARKER: &str = "# installed by hookline";

fn pre_commit_shim() -> String {
    format!("#!/bin/sh\n{}\nexec hookline run \"$@\"\n", SHIM_MARKER)
}

fn install_hook(cwd: &Path, force: bool) -> Result<i32> {
    let root = repo_root(cwd)?;
    let dir = hooks_dir(&root)?;
    fs::create_dir_all(&dir)
        .with_context(|| format!("Failed to create directory {}", dir.display()))?;

    let hook_path = dir.join("pre-commit");
    if hook_path.exists() && !force {
        let existing = fs::read_to_string(&hook_path).unwrap_or_default();
        if !existing.contains(SHIM_MARKER) {
            bail!(
                "{} already exists and was not written by hookline (use --force to overwrite)",
                hook_path.display()
            );
        }
    }

    fs::write(&hook_path, pre_commit_shim())
        .with_context(|| format!("Failed to write hook to {}", hook_path.display()))?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(&hook_path, fs::Permissions::from_mode(0o755))
            .with_context(|| format!("Failed to make {} executable", hook_path.display()))?;
    }

    println!(
        "{} Installed pre-commit hook: {}",
        "✓".green().bold(),
        hook_path.display()
    );
    Ok(0)
}
