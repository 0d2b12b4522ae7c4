//! `taskforge config`: read and write configuration values.

use std::path::{Path, PathBuf};

use crate::{
    cli::{ConfigCommands, GlobalArgs},
    config::AppConfig,
    error::{CliError, CliResult, IntoCli},
    output::OutputManager,
};

/// Dispatch to the correct config subcommand.
pub fn execute(
    cmd: ConfigCommands,
    global: GlobalArgs,
    config: AppConfig,
    output: OutputManager,
) -> CliResult<()> {
    match cmd {
        ConfigCommands::Get { key } => {
            let value = config.get(&key).map_err(CliError::config)?;
            output.data(&render_value(value.as_ref()))?;
        }

        ConfigCommands::Set { key, value } => {
            let path = target_path(&global);
            // Only the file's own values are persisted, not the environment.
            let on_disk = if path.is_file() {
                AppConfig::load_file(&path).map_err(CliError::config)?
            } else {
                AppConfig::default()
            };
            let updated = on_disk.with_value(&key, &value).map_err(CliError::config)?;
            write_config(&path, &updated)?;
            output.success(&format!("{key} = {value}  ({})", path.display()))?;
        }

        ConfigCommands::List => {
            let serialised = toml::to_string_pretty(&config)
                .with_cli_context(|| "Failed to serialise config")?;
            output.header("Current Configuration:")?;
            for line in serialised.lines() {
                output.data(line)?;
            }
        }

        ConfigCommands::Path => {
            output.data(&target_path(&global).display().to_string())?;
        }
    }

    Ok(())
}

// ── helpers ───────────────────────────────────────────────────────────────────

fn target_path(global: &GlobalArgs) -> PathBuf {
    global.config.clone().unwrap_or_else(AppConfig::active_path)
}

fn render_value(value: Option<&toml::Value>) -> String {
    match value {
        None => "(unset)".into(),
        Some(toml::Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

fn write_config(path: &Path, config: &AppConfig) -> CliResult<()> {
    let text = toml::to_string_pretty(config).with_cli_context(|| "Failed to serialise config")?;
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).with_cli_context(|| {
            format!("Failed to create config directory '{}'", parent.display())
        })?;
    }
    std::fs::write(path, text)
        .with_cli_context(|| format!("Failed to write config to '{}'", path.display()))
}

// ── tests ─────────────────────────────────────────────────────────────────────
