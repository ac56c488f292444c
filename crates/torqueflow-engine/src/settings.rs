//! Settings snapshot and engine configuration.
//!
//! [`Settings`] is a plain `Copy` value: the non-RT side edits and validates
//! it, then hands a whole copy to the tick. The tick never reads settings
//! through a shared reference.

use serde::{Deserialize, Serialize};
use torqueflow_algorithms::{Algorithm, AlgorithmParams, OutputShaping};
use torqueflow_errors::{ValidationError, validate_finite, validate_range};
use torqueflow_scheduler::{MAX_JITTER_NS, PERIOD_500HZ_NS, RTSetup, SUSPEND_DEBOUNCE_NS};

/// Every tunable of the torque pipeline.
///
/// ```
/// use torqueflow_engine::Settings;
///
/// let mut settings = Settings::default();
/// assert!(settings.validate().is_ok());
///
/// settings.output_maximum = 3.0;
/// assert!(settings.validate().is_err());
/// assert_eq!(settings.clamped().output_maximum, 1.0);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Power toggle; off releases the device
    pub enable_force_feedback: bool,
    /// Keep driving the wheel even while the simulator's own force feedback is on
    pub always_enable_ffb: bool,
    /// Torque in Nm that maps to full output
    pub max_force_nm: f32,
    /// Headroom added to the peak torque when auto-setting max force
    pub auto_margin: f32,
    /// Torque shaping strategy
    pub algorithm: Algorithm,
    /// Detail booster gain
    pub detail_boost: f32,
    /// Detail booster pull toward its target
    pub detail_boost_bias: f32,
    /// Delta limiter cap in Nm per second
    pub delta_limit_nm_per_s: f32,
    /// Delta limiter pull toward its target
    pub delta_limiter_bias: f32,
    /// Slew compressor threshold, percent of max force per second
    pub slew_compression_threshold: f32,
    /// Slew compressor rate, percent
    pub slew_compression_rate: f32,
    /// Range compressor threshold, percent of max force
    pub total_compression_threshold: f32,
    /// Range compressor rate, percent
    pub total_compression_rate: f32,
    /// Smallest output magnitude for a nonzero signal
    pub output_minimum: f32,
    /// Largest output magnitude before effects are added
    pub output_maximum: f32,
    /// Output curve, 0 is linear
    pub output_curve: f32,
    /// LFE bleed strength
    pub lfe_strength: f32,
    /// G-force that triggers crash protection
    pub crash_protection_g_force: f32,
    /// Crash protection hold time in seconds, before the recovery tail
    pub crash_protection_duration_s: f32,
    /// Fraction of torque removed by crash protection
    pub crash_protection_force_reduction: f32,
    /// Shock velocity in m/s that triggers curb protection
    pub curb_protection_shock_velocity: f32,
    /// Curb protection hold time in seconds
    pub curb_protection_duration_s: f32,
    /// How far curb protection softens the detail booster and delta limiter
    pub curb_protection_force_reduction: f32,
    /// Torque scale at standstill
    pub parked_strength: f32,
    /// Soft lock strength
    pub soft_lock_strength: f32,
    /// Friction gain on wheel velocity
    pub friction: f32,
    /// Centering spring strength while no torque data is in use
    pub centering_strength: f32,
    /// Fade torque in and out when torque data starts or stops
    pub fade_enabled: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            enable_force_feedback: true,
            always_enable_ffb: false,
            max_force_nm: 50.0,
            auto_margin: 0.0,
            algorithm: Algorithm::DetailBooster,
            detail_boost: 0.0,
            detail_boost_bias: 0.1,
            delta_limit_nm_per_s: 32.4,
            delta_limiter_bias: 0.2,
            slew_compression_threshold: 200.0,
            slew_compression_rate: 65.0,
            total_compression_threshold: 65.0,
            total_compression_rate: 75.0,
            output_minimum: 0.0,
            output_maximum: 1.0,
            output_curve: 0.0,
            lfe_strength: 0.05,
            crash_protection_g_force: 8.0,
            crash_protection_duration_s: 5.0,
            crash_protection_force_reduction: 0.95,
            curb_protection_shock_velocity: 0.5,
            curb_protection_duration_s: 0.1,
            curb_protection_force_reduction: 0.75,
            parked_strength: 0.25,
            soft_lock_strength: 0.25,
            friction: 0.0,
            centering_strength: 0.0,
            fade_enabled: true,
        }
    }
}

/// Smallest max force the auto-set commit may write.
pub const MIN_MAX_FORCE_NM: f32 = 5.0;
/// Largest max force the auto-set commit may write.
pub const MAX_MAX_FORCE_NM: f32 = 99.9;

macro_rules! ranged_fields {
    ($($field:ident: $min:expr, $max:expr;)*) => {
        impl Settings {
            /// Allowed range of every numeric field, by name.
            pub const RANGES: &'static [(&'static str, f32, f32)] = &[
                $((stringify!($field), $min, $max)),*
            ];

            fn validate_ranges(&self) -> Result<(), ValidationError> {
                $(
                    validate_finite!(stringify!($field), self.$field);
                    validate_range!(stringify!($field), self.$field, $min, $max);
                )*
                Ok(())
            }

            fn clamp_ranges(&mut self) {
                let defaults = Settings::default();
                $(
                    self.$field = clamp_or(self.$field, $min, $max, defaults.$field);
                )*
            }
        }
    };
}

ranged_fields! {
    max_force_nm: MIN_MAX_FORCE_NM, MAX_MAX_FORCE_NM;
    auto_margin: -1.0, 1.0;
    detail_boost: 0.0, 9.99;
    detail_boost_bias: 0.0, 1.0;
    delta_limit_nm_per_s: 0.0, 99.9;
    delta_limiter_bias: 0.0, 1.0;
    slew_compression_threshold: 0.0, 35000.0;
    slew_compression_rate: 0.0, 100.0;
    total_compression_threshold: 0.0, 100.0;
    total_compression_rate: 0.0, 100.0;
    output_minimum: 0.0, 0.1;
    output_maximum: 0.2, 1.0;
    output_curve: -1.0, 1.0;
    lfe_strength: 0.0, 1.0;
    crash_protection_g_force: 2.0, 20.0;
    crash_protection_duration_s: 0.0, 10.0;
    crash_protection_force_reduction: 0.0, 1.0;
    curb_protection_shock_velocity: 0.0, 1.0;
    curb_protection_duration_s: 0.0, 1.0;
    curb_protection_force_reduction: 0.0, 1.0;
    parked_strength: 0.0, 1.0;
    soft_lock_strength: 0.0, 1.0;
    friction: 0.0, 1.0;
    centering_strength: 0.0, 1.0;
}

fn clamp_or(value: f32, min: f32, max: f32, fallback: f32) -> f32 {
    if value.is_finite() {
        value.clamp(min, max)
    } else {
        fallback
    }
}

impl Settings {
    /// Check every field, returning the first problem found.
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.validate_ranges()
    }

    /// Copy with every field forced into range. Non-finite fields fall back
    /// to their defaults.
    pub fn clamped(&self) -> Self {
        let mut settings = *self;
        settings.clamp_ranges();
        settings
    }

    /// Strategy parameters for the current values.
    pub fn algorithm_params(&self) -> AlgorithmParams {
        AlgorithmParams {
            max_force_nm: self.max_force_nm,
            detail_boost: self.detail_boost,
            detail_boost_bias: self.detail_boost_bias,
            delta_limit_nm_per_s: self.delta_limit_nm_per_s,
            delta_limiter_bias: self.delta_limiter_bias,
            slew_compression_threshold: self.slew_compression_threshold,
            slew_compression_rate: self.slew_compression_rate,
            total_compression_threshold: self.total_compression_threshold,
            total_compression_rate: self.total_compression_rate,
        }
    }

    /// Output curve, ceiling and floor.
    pub fn output_shaping(&self) -> OutputShaping {
        OutputShaping {
            curve: self.output_curve,
            minimum: self.output_minimum,
            maximum: self.output_maximum,
        }
    }

    /// Whether the simulator's own force feedback state should suspend ours.
    pub fn suspends_for_sim_ffb(&self, sim_ffb_enabled: bool) -> bool {
        sim_ffb_enabled && !self.always_enable_ffb
    }
}

/// How the engine thread runs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Tick period in nanoseconds
    pub tick_period_ns: u64,
    /// Jitter above which a tick is reported as a timing violation
    pub max_jitter_ns: u64,
    /// Raise the engine thread's priority
    pub high_priority: bool,
    /// Lock process memory
    pub lock_memory: bool,
    /// How long the simulator may be gone before the engine thread parks
    pub suspend_debounce_ns: u64,
    /// Engine thread name
    pub thread_name: String,
    /// Capacity of the command channel
    pub command_capacity: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            tick_period_ns: PERIOD_500HZ_NS,
            max_jitter_ns: MAX_JITTER_NS,
            high_priority: true,
            lock_memory: true,
            suspend_debounce_ns: SUSPEND_DEBOUNCE_NS,
            thread_name: "torqueflow-rt".to_string(),
            command_capacity: 64,
        }
    }
}

impl EngineConfig {
    /// Real-time thread setup for this config.
    pub fn rt_setup(&self) -> RTSetup {
        RTSetup::default()
            .with_high_priority(self.high_priority)
            .with_lock_memory(self.lock_memory)
    }

    /// Config for tests and the CLI: no priority changes, no memory locking.
    pub fn unprivileged() -> Self {
        Self {
            high_priority: false,
            lock_memory: false,
            ..Self::default()
        }
    }
}
