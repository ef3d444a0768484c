//! `hookline config`: read and edit `.hooklinerc` files.

use anyhow::{Context, Result, anyhow, bail};
use colored::*;
use hookline_run::Settings;
use hookline_run::settings::{KNOWN_KEYS, SETTINGS_FILE_NAME};
use std::fs;
use std::path::Path;

pub fn handle_config(
    key: Option<String>,
    value: Option<String>,
    list: bool,
    unset: bool,
    global: bool,
) -> Result<()> {
    let config_path = if global {
        Settings::global_path().ok_or_else(|| anyhow!("Could not determine home directory"))?
    } else {
        let cwd = std::env::current_dir().context("Failed to read current directory")?;
        Settings::find_local(&cwd).unwrap_or_else(|| cwd.join(SETTINGS_FILE_NAME))
    };
    let scope = if global { "global" } else { "local" };

    if list {
        return list_config(&config_path, scope);
    }

    let key = key.ok_or_else(|| {
        anyhow!(
            "Missing key. Usage:\n  \
            hookline config <key>           - get value\n  \
            hookline config <key> <value>   - set value\n  \
            hookline config --list          - list all values\n  \
            hookline config --unset <key>   - remove value"
        )
    })?;

    if unset {
        let mut table = read_table(&config_path)?;
        unset_value(&mut table, &key)?;
        write_table(&config_path, &table)?;
        println!("{} Removed {} setting: {}", "✓".green().bold(), scope, key.cyan());
        return Ok(());
    }

    match value {
        Some(value) => {
            let mut table = if config_path.exists() {
                read_table(&config_path)?
            } else {
                toml::Table::new()
            };
            set_value(&mut table, &key, &value)?;
            write_table(&config_path, &table)?;
            println!(
                "{} Set {} setting: {} = {}",
                "✓".green().bold(),
                scope,
                key.cyan(),
                value
            );
            println!("  Location: {}", config_path.display());
        }
        None => {
            if !config_path.exists() {
                bail!("No {} settings file found at {}", scope, config_path.display());
            }
            let table = read_table(&config_path)?;
            let value = table
                .get(&key)
                .ok_or_else(|| anyhow!("Setting '{}' not found", key))?;
            println!("{}", display_value(value));
        }
    }

    Ok(())
}

fn list_config(config_path: &Path, scope: &str) -> Result<()> {
    if !config_path.exists() {
        println!("{} No {} settings file found", "ℹ".cyan(), scope);
        println!("  Location: {}", config_path.display());
        return Ok(());
    }

    let table = read_table(config_path)?;
    println!("{} Settings ({}): {}", "⚙".cyan().bold(), scope, config_path.display());
    println!();
    for (key, value) in &table {
        println!("  {} = {}", key.cyan(), display_value(value));
    }
    Ok(())
}

/// Validates `key`, converts `raw` to the type the key expects and stores it.
pub fn set_value(table: &mut toml::Table, key: &str, raw: &str) -> Result<()> {
    let value = match key {
        "command_timeout" => {
            let secs: i64 = raw
                .parse()
                .with_context(|| format!("command_timeout expects whole seconds, got '{}'", raw))?;
            if secs < 1 {
                bail!("command_timeout must be at least 1 second");
            }
            toml::Value::Integer(secs)
        }
        "fail_fast" | "colored" | "verbose" => {
            let flag: bool = raw
                .parse()
                .with_context(|| format!("{} expects true or false, got '{}'", key, raw))?;
            toml::Value::Boolean(flag)
        }
        _ => bail!(
            "Unknown setting '{}'. Known settings: {}",
            key,
            KNOWN_KEYS.join(", ")
        ),
    };
    table.insert(key.to_string(), value);
    Ok(())
}

pub fn unset_value(table: &mut toml::Table, key: &str) -> Result<()> {
    if table.remove(key).is_none() {
        bail!("Setting '{}' not found", key);
    }
    Ok(())
}

fn display_value(value: &toml::Value) -> String {
    match value {
        toml::Value::String(s) => s.clone(),
        toml::Value::Integer(i) => i.to_string(),
        toml::Value::Float(f) => f.to_string(),
        toml::Value::Boolean(b) => b.to_string(),
        _ => value.to_string(),
    }
}

fn read_table(path: &Path) -> Result<toml::Table> {
    if !path.exists() {
        bail!("No settings file found at {}", path.display());
    }
    let content =
        fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))?;
    toml::from_str(&content).with_context(|| format!("Failed to parse {}", path.display()))
}

fn write_table(path: &Path, table: &toml::Table) -> Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
        && !parent.exists()
    {
        fs::create_dir_all(parent)?;
    }
    let content = toml::to_string_pretty(table)?;
    fs::write(path, content).with_context(|| format!("Failed to write {}", path.display()))
}
