//! Settings file commands

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use torqueflow_engine::Settings;
use tracing::debug;

use crate::commands::{SettingsCommands, SettingsFormat};
use crate::error::CliError;
use crate::output;

/// Execute a settings command
pub fn execute(cmd: &SettingsCommands, json: bool) -> Result<()> {
    match cmd {
        SettingsCommands::Defaults { format } => {
            let format = if json { SettingsFormat::Json } else { *format };
            output::print_settings(&Settings::default(), format)
        }
        SettingsCommands::Validate { path, clamp } => validate(path, *clamp, json),
    }
}

fn validate(path: &Path, clamp: bool, json: bool) -> Result<()> {
    let settings = load(path)?;
    if clamp {
        let format = if json { SettingsFormat::Json } else { format_of(path)? };
        return output::print_settings(&settings.clamped(), format);
    }
    settings
        .validate()
        .map_err(CliError::from)
        .with_context(|| format!("{} failed validation", path.display()))?;
    output::print_validation_ok(path, &settings, json);
    Ok(())
}

/// Load settings from a JSON or YAML file, chosen by extension.
pub fn load(path: &Path) -> Result<Settings> {
    let format = format_of(path)?;
    if !path.exists() {
        return Err(CliError::SettingsNotFound(path.display().to_string()).into());
    }
    let text = fs::read_to_string(path)
        .map_err(CliError::from)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    debug!(path = %path.display(), ?format, "Loading settings");
    let settings = match format {
        SettingsFormat::Json => serde_json::from_str(&text).map_err(CliError::from),
        SettingsFormat::Yaml => serde_yaml::from_str(&text).map_err(CliError::from),
    };
    settings.with_context(|| format!("Failed to parse {}", path.display()))
}

fn format_of(path: &Path) -> Result<SettingsFormat> {
    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase);
    match extension.as_deref() {
        Some("json") => Ok(SettingsFormat::Json),
        Some("yaml" | "yml") => Ok(SettingsFormat::Yaml),
        _ => Err(CliError::UnsupportedFormat(path.display().to_string()).into()),
    }
}
