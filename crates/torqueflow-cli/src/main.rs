//! torqueflow - force feedback engine CLI
//!
//! Runs the torque pipeline against a virtual wheel fed with synthetic
//! telemetry, and inspects or validates settings files.

#![deny(static_mut_refs)]
#![deny(unused_must_use)]
#![deny(clippy::unwrap_used)]

mod commands;
mod completion;
mod error;
mod output;

use std::process::ExitCode;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use crate::commands::{RunArgs, SettingsCommands};
use crate::error::CliError;

#[derive(Parser, Debug)]
#[command(name = "torqueflow")]
#[command(about = "TorqueFlow CLI - run the force feedback engine and manage its settings")]
#[command(version)]
#[command(long_about = "
torqueflow drives the 500 Hz force feedback engine against a virtual wheel.
`run` feeds it synthetic 60 Hz telemetry and reports what reached the wheel;
`settings` prints the defaults or checks a JSON/YAML settings file.

Use --json for machine-readable output suitable for scripting.
")]
struct Cli {
    /// Output in JSON format for machine parsing
    #[arg(long, global = true)]
    json: bool,

    /// Verbose logging
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the engine against a virtual wheel
    Run(RunArgs),

    /// Settings file commands
    #[command(subcommand)]
    Settings(SettingsCommands),

    /// Generate shell completion scripts
    Completion {
        /// Shell to generate completion for
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let log_level = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(format!("torqueflow={log_level}"))),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .init();

    match execute_command(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            if cli.json {
                output::print_error_json(&e);
            } else {
                output::print_error_human(&e);
            }
            let code = e.downcast_ref::<CliError>().map_or(1, CliError::exit_code);
            ExitCode::from(code)
        }
    }
}

fn execute_command(cli: &Cli) -> Result<()> {
    match &cli.command {
        Commands::Run(args) => commands::run::execute(args, cli.json),
        Commands::Settings(cmd) => commands::settings::execute(cmd, cli.json),
        Commands::Completion { shell } => {
            completion::generate_completion(*shell);
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::{AlgorithmArg, SettingsFormat};
    use clap::Parser;

    type TestResult = Result<(), Box<dyn std::error::Error>>;

    #[test]
    fn parse_run_defaults() -> TestResult {
        let cli = Cli::try_parse_from(["torqueflow", "run"])?;
        assert!(!cli.json);
        assert_eq!(cli.verbose, 0);
        let Commands::Run(args) = cli.command else {
            return Err("expected run".into());
        };
        assert!((args.duration - 5.0).abs() < f32::EPSILON);
        assert!(args.settings.is_none());
        assert!(!args.realtime);
        Ok(())
    }

    #[test]
    fn parse_run_overrides() -> TestResult {
        let cli = Cli::try_parse_from([
            "torqueflow",
            "--json",
            "-vv",
            "run",
            "--duration",
            "0.5",
            "--algorithm",
            "delta-limiter",
            "--rumble",
            "0.3",
        ])?;
        assert!(cli.json);
        assert_eq!(cli.verbose, 2);
        let Commands::Run(args) = cli.command else {
            return Err("expected run".into());
        };
        assert_eq!(args.algorithm, Some(AlgorithmArg::DeltaLimiter));
        assert!((args.rumble - 0.3).abs() < f32::EPSILON);
        Ok(())
    }

    #[test]
    fn parse_settings_defaults_format() -> TestResult {
        let cli = Cli::try_parse_from(["torqueflow", "settings", "defaults", "-f", "json"])?;
        assert!(matches!(
            cli.command,
            Commands::Settings(SettingsCommands::Defaults {
                format: SettingsFormat::Json
            })
        ));
        Ok(())
    }

    #[test]
    fn parse_settings_validate_requires_path() {
        assert!(Cli::try_parse_from(["torqueflow", "settings", "validate"]).is_err());
    }

    #[test]
    fn verify_cli() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
