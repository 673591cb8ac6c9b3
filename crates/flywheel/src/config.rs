//! # Ticker Configuration
//!
//! Startup configuration for the scheduler, loadable once from a TOML
//! file. Defaults match the engine's long-standing constants: a 20-frame
//! quit delay, a 15 fps simulation floor and a 5 fps pacing floor.

use serde::Deserialize;
use thiserror::Error;

/// Errors raised while loading or validating a [`TickerConfig`].
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Config file could not be read.
    #[error("cannot read config file: {0}")]
    Io(#[from] std::io::Error),

    /// Config file is not valid TOML for this schema.
    #[error("cannot parse config: {0}")]
    Parse(#[from] toml::de::Error),

    /// Values parsed but are out of range.
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Scheduler timing and shutdown parameters.
#[derive(Clone, Copy, Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TickerConfig {
    /// Target frames per second; 0 disables frame pacing entirely.
    pub fps: f32,

    /// Frames to wait after a shutdown request before force-poking
    /// stuck entities; halved after each escalation down to 1.
    pub quit_delay: u32,

    /// Simulation floor: delta time is clamped so one tick never
    /// simulates more than `1 / min_sim_fps` seconds.
    pub min_sim_fps: f32,

    /// Pacing floor expressed as a bias allowance in seconds: the pacing
    /// sleep is capped at `bias + max_lag`, so a lagging engine never
    /// sleeps itself below roughly `1 / max_lag` fps (0.2 s ≈ 5 fps).
    pub max_lag: f32,
}

impl Default for TickerConfig {
    fn default() -> Self {
        Self {
            fps: 60.0,
            quit_delay: 20,
            min_sim_fps: 15.0,
            max_lag: 0.2,
        }
    }
}

impl TickerConfig {
    /// Parses a config from TOML text and validates it.
    ///
    /// # Errors
    ///
    /// [`ConfigError::Parse`] on malformed TOML or unknown keys,
    /// [`ConfigError::Invalid`] on out-of-range values.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Loads and validates a config file.
    ///
    /// # Errors
    ///
    /// [`ConfigError::Io`] when the file cannot be read, otherwise as
    /// [`Self::from_toml_str`].
    pub fn load(path: impl AsRef<std::path::Path>) -> Result<Self, ConfigError> {
        Self::from_toml_str(&std::fs::read_to_string(path)?)
    }

    /// Checks value ranges.
    ///
    /// # Errors
    ///
    /// [`ConfigError::Invalid`] with a description of the bad field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.fps.is_finite() || self.fps < 0.0 {
            return Err(ConfigError::Invalid(format!(
                "fps must be finite and >= 0, got {}",
                self.fps
            )));
        }
        if self.quit_delay == 0 {
            return Err(ConfigError::Invalid(
                "quit_delay must be at least 1 frame".to_owned(),
            ));
        }
        if !self.min_sim_fps.is_finite() || self.min_sim_fps <= 0.0 {
            return Err(ConfigError::Invalid(format!(
                "min_sim_fps must be positive, got {}",
                self.min_sim_fps
            )));
        }
        if !self.max_lag.is_finite() || self.max_lag <= 0.0 {
            return Err(ConfigError::Invalid(format!(
                "max_lag must be positive, got {}",
                self.max_lag
            )));
        }
        Ok(())
    }

    /// Largest delta time a single tick may simulate.
    #[inline]
    #[must_use]
    pub fn max_delta(&self) -> f32 {
        1.0 / self.min_sim_fps
    }

    /// Target frame interval, or 0 when pacing is disabled.
    #[inline]
    #[must_use]
    pub fn frame_interval(&self) -> f32 {
        if self.fps > 0.0 {
            1.0 / self.fps
        } else {
            0.0
        }
    }
}
