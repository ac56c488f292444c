//! Output formatting for CLI responses

use std::path::Path;

use anyhow::{Error, Result};
use colored::Colorize;
use serde_json::json;
use torqueflow_engine::{Indicator, Settings};

use crate::commands::SettingsFormat;
use crate::commands::run::RunReport;

/// Print error in JSON format
pub fn print_error_json(error: &Error) {
    let error_json = json!({
        "success": false,
        "error": {
            "message": error.to_string(),
            "chain": error.chain().skip(1).map(ToString::to_string).collect::<Vec<_>>(),
        }
    });
    match serde_json::to_string_pretty(&error_json) {
        Ok(s) => println!("{s}"),
        Err(e) => eprintln!("Failed to format error as JSON: {e}"),
    }
}

/// Print error in human-readable format
pub fn print_error_human(error: &Error) {
    eprintln!("{} {}", "Error:".red().bold(), error);
    for cause in error.chain().skip(1) {
        eprintln!("  {} {}", "Caused by:".yellow(), cause);
    }
}

/// Print settings as JSON or YAML
pub fn print_settings(settings: &Settings, format: SettingsFormat) -> Result<()> {
    let text = match format {
        SettingsFormat::Json => serde_json::to_string_pretty(settings)?,
        SettingsFormat::Yaml => serde_yaml::to_string(settings)?,
    };
    println!("{}", text.trim_end());
    Ok(())
}

/// Report a settings file that passed validation
pub fn print_validation_ok(path: &Path, settings: &Settings, json: bool) {
    if json {
        let output = json!({
            "success": true,
            "path": path.display().to_string(),
            "settings": settings,
        });
        match serde_json::to_string_pretty(&output) {
            Ok(s) => println!("{s}"),
            Err(e) => eprintln!("Failed to format validation result as JSON: {e}"),
        }
    } else {
        println!("{} {}", "✓".green(), path.display());
        println!("  Algorithm: {}", settings.algorithm);
        println!("  Max force: {:.1} Nm", settings.max_force_nm);
    }
}

/// Print the summary of a run
pub fn print_run_report(report: &RunReport, json: bool) -> Result<()> {
    if json {
        let output = json!({
            "success": true,
            "run": report,
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    let indicator = match report.status.indicator {
        Indicator::Active => "Active".green(),
        Indicator::Transitioning => "Transitioning".yellow(),
        Indicator::Inactive => "Inactive".dimmed(),
    };
    println!("{}", "Run Summary".bold());
    println!("  Duration: {:.1} s", report.duration_s);
    println!("  Telemetry frames: {}", report.frames_sent);
    println!("  Force commands: {}", report.commands_sent);
    println!("  Peak command: {:.3}", report.peak_command);
    println!("  Peak torque: {:.2} Nm", report.status.peak_torque_nm);
    println!("  Auto torque: {:.2} Nm", report.status.auto_torque_nm);
    println!("  Final state: {indicator}");
    println!("{}", "Timing".bold());
    println!("  Ticks: {}", report.ticks);
    let missed = if report.missed_ticks == 0 {
        "0".green()
    } else {
        report.missed_ticks.to_string().yellow()
    };
    println!("  Missed ticks: {missed}");
    println!("  Max jitter: {:.1} µs", report.max_jitter_us);
    println!("  P99 jitter: {:.1} µs", report.p99_jitter_us);
    if report.device_write_errors > 0 || report.tick_faults > 0 {
        println!("{}", "Faults".bold().red());
        println!("  Device write errors: {}", report.device_write_errors);
        println!("  Tick faults: {}", report.tick_faults);
    }
    Ok(())
}
