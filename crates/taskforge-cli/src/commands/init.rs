//! `taskforge init`: create a default configuration file.

use std::path::PathBuf;

use crate::{
    cli::{GlobalArgs, InitArgs},
    config::{AppConfig, LOCAL_CONFIG_FILE},
    error::{CliResult, IntoCli},
    output::OutputManager,
};

/// Create a default taskforge configuration file.
pub fn execute(args: InitArgs, global: GlobalArgs, output: OutputManager) -> CliResult<()> {
    let config_path = match (&global.config, args.local) {
        (Some(path), _) => path.clone(),
        (None, true) => PathBuf::from(LOCAL_CONFIG_FILE),
        (None, false) => AppConfig::config_path(),
    };

    if config_path.exists() && !args.force {
        if !global.quiet && confirm_overwrite(&config_path)? {
            output.info("Overwriting existing configuration")?;
        } else {
            output.warning(&format!(
                "Config already exists at {}  (use --force to overwrite)",
                config_path.display(),
            ))?;
            return Ok(());
        }
    }

    let body = toml::to_string_pretty(&AppConfig::default())
        .with_cli_context(|| "Failed to serialise default config")?;
    let text = format!(
        "# taskforge configuration, created {}\n\n{body}",
        chrono::Local::now().format("%Y-%m-%d")
    );

    if let Some(parent) = config_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).with_cli_context(|| {
            format!("Failed to create config directory '{}'", parent.display())
        })?;
    }
    std::fs::write(&config_path, text)
        .with_cli_context(|| format!("Failed to write config to '{}'", config_path.display()))?;

    output.success(&format!(
        "Configuration created at {}",
        config_path.display(),
    ))?;
    Ok(())
}

#[cfg(feature = "interactive")]
fn confirm_overwrite(path: &std::path::Path) -> CliResult<bool> {
    use std::io::IsTerminal as _;

    if !std::io::stdin().is_terminal() {
        return Ok(false);
    }
    dialoguer::Confirm::new()
        .with_prompt(format!("{} already exists. Overwrite?", path.display()))
        .default(false)
        .interact()
        .map_err(|e| crate::error::CliError::InvalidInput {
            message: "could not read the confirmation".into(),
            source: Some(Box::new(e)),
        })
}

#[cfg(not(feature = "interactive"))]
fn confirm_overwrite(_path: &std::path::Path) -> CliResult<bool> {
    Ok(false)
}
