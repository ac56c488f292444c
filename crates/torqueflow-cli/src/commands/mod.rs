//! Command implementations for the torqueflow CLI

pub mod run;
pub mod settings;

use std::path::PathBuf;

use clap::{Args, Subcommand, ValueEnum};
use torqueflow_algorithms::Algorithm;

#[derive(Args, Debug)]
pub struct RunArgs {
    /// How long to run, in seconds
    #[arg(short, long, default_value_t = 5.0)]
    pub duration: f32,

    /// Settings file (JSON or YAML); defaults are used when omitted
    #[arg(short, long, env = "TORQUEFLOW_SETTINGS")]
    pub settings: Option<PathBuf>,

    /// Override the torque shaping algorithm
    #[arg(short, long, value_enum)]
    pub algorithm: Option<AlgorithmArg>,

    /// Peak of the synthetic steering torque, Nm
    #[arg(long, default_value_t = 20.0)]
    pub torque: f32,

    /// Frequency of the synthetic steering torque, Hz
    #[arg(long, default_value_t = 0.5)]
    pub frequency: f32,

    /// Amplitude of the synthetic engine rumble on the LFE channel, 0 to 1
    #[arg(long, default_value_t = 0.0)]
    pub rumble: f32,

    /// Raise thread priority and lock memory
    #[arg(long)]
    pub realtime: bool,
}

#[derive(Subcommand, Debug)]
pub enum SettingsCommands {
    /// Print the default settings
    Defaults {
        /// Output format
        #[arg(short, long, value_enum, default_value_t = SettingsFormat::Yaml)]
        format: SettingsFormat,
    },

    /// Check a settings file
    Validate {
        /// Settings file (JSON or YAML)
        path: PathBuf,
        /// Print the file with every field forced into range
        #[arg(long)]
        clamp: bool,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum SettingsFormat {
    Json,
    Yaml,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum AlgorithmArg {
    NativeLowRate,
    NativeHighRate,
    DetailBooster,
    DeltaLimiter,
    DetailBoosterLowRate,
    DeltaLimiterLowRate,
    SlewAndRangeCompressor,
}

impl From<AlgorithmArg> for Algorithm {
    fn from(arg: AlgorithmArg) -> Self {
        match arg {
            AlgorithmArg::NativeLowRate => Algorithm::NativeLowRate,
            AlgorithmArg::NativeHighRate => Algorithm::NativeHighRate,
            AlgorithmArg::DetailBooster => Algorithm::DetailBooster,
            AlgorithmArg::DeltaLimiter => Algorithm::DeltaLimiter,
            AlgorithmArg::DetailBoosterLowRate => Algorithm::DetailBoosterLowRate,
            AlgorithmArg::DeltaLimiterLowRate => Algorithm::DeltaLimiterLowRate,
            AlgorithmArg::SlewAndRangeCompressor => Algorithm::SlewAndRangeCompressor,
        }
    }
}
