//! Run-wide simulation parameters.
//!
//! Every field has a default, so a TOML file only needs the values it
//! overrides:
//!
//! ```toml
//! population_size = 250
//! contagion_rate_percent = 60
//! due_tick_mode = "cache_at_infection"
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Result, SimError};
use crate::motion::Arena;
use crate::phases::{ContagionParams, ProgressionParams};
use crate::types::Tick;

/// How a sick person's due tick is chosen.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DueTickMode {
    /// Draw a fresh variation on every evaluation.
    #[default]
    Redraw,
    /// Draw once, on the first evaluation after infection, and keep it.
    CacheAtInfection,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub arena_width: f32,
    pub arena_height: f32,
    pub radius: f32,
    pub max_speed: i32,
    pub population_size: usize,

    pub ticks_per_day: Tick,
    pub days_to_heal_or_die: Tick,
    pub duration_variance_days: Tick,

    pub quarantined_rate_percent: u32,
    pub contagion_distance: f32,
    pub contagion_rate_percent: u32,
    pub death_rate_percent: u32,

    pub due_tick_mode: DueTickMode,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            arena_width: 600.0,
            arena_height: 400.0,
            radius: 5.0,
            max_speed: 3,
            population_size: 100,
            ticks_per_day: 200,
            days_to_heal_or_die: 14,
            duration_variance_days: 2,
            quarantined_rate_percent: 80,
            contagion_distance: 5.0,
            contagion_rate_percent: 90,
            death_rate_percent: 5,
            due_tick_mode: DueTickMode::Redraw,
        }
    }
}

impl Config {
    /// Parses a config from TOML text and validates it.
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let cfg: Config = toml::from_str(text)?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Reads and validates a TOML config file.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    /// Checks that the parameters describe a runnable simulation.
    ///
    /// The arena must leave room for one full step on each side of a person,
    /// otherwise a reflected person could end up outside the bounds. Illness
    /// durations in ticks must fit in an `i64`, since due ticks are signed.
    pub fn validate(&self) -> Result<()> {
        let invalid = |msg: String| Err(SimError::InvalidConfig(msg));

        for (name, value) in [
            ("arena_width", self.arena_width),
            ("arena_height", self.arena_height),
            ("radius", self.radius),
            ("contagion_distance", self.contagion_distance),
        ] {
            if !value.is_finite() {
                return invalid(format!("{name} must be finite, got {value}"));
            }
        }
        if self.population_size == 0 {
            return invalid("population_size must be at least 1".into());
        }
        if self.ticks_per_day == 0 {
            return invalid("ticks_per_day must be positive".into());
        }
        if !(self.radius > 0.0) {
            return invalid(format!("radius must be positive, got {}", self.radius));
        }
        if self.max_speed < 1 {
            return invalid(format!("max_speed must be at least 1, got {}", self.max_speed));
        }
        if !(self.contagion_distance >= 0.0) {
            return invalid(format!(
                "contagion_distance must be non-negative, got {}",
                self.contagion_distance
            ));
        }
        for (name, value) in [
            ("quarantined_rate_percent", self.quarantined_rate_percent),
            ("contagion_rate_percent", self.contagion_rate_percent),
            ("death_rate_percent", self.death_rate_percent),
        ] {
            if value > 100 {
                return invalid(format!("{name} must be within 0..=100, got {value}"));
            }
        }

        let min_extent = 2.0 * (self.radius + self.max_speed as f32);
        if self.arena_width < min_extent || self.arena_height < min_extent {
            return invalid(format!(
                "arena {}x{} is smaller than {min_extent} on one axis",
                self.arena_width, self.arena_height
            ));
        }

        let mean = self.mean_duration_ticks()?;
        let variance = self.duration_variance_ticks()?;
        if mean.checked_add(variance).is_none_or(|latest| latest > i64::MAX as Tick) {
            return invalid(format!(
                "illness duration of {mean} ± {variance} ticks does not fit a due tick"
            ));
        }
        Ok(())
    }

    pub fn arena(&self) -> Arena {
        Arena::new(self.arena_width, self.arena_height)
    }

    /// `days_to_heal_or_die` in ticks.
    pub fn mean_duration_ticks(&self) -> Result<Tick> {
        days_to_ticks("days_to_heal_or_die", self.days_to_heal_or_die, self.ticks_per_day)
    }

    /// `duration_variance_days` in ticks.
    pub fn duration_variance_ticks(&self) -> Result<Tick> {
        days_to_ticks("duration_variance_days", self.duration_variance_days, self.ticks_per_day)
    }

    pub fn contagion_params(&self) -> ContagionParams {
        ContagionParams {
            distance: self.contagion_distance,
            probability_percent: self.contagion_rate_percent,
        }
    }

    pub fn progression_params(&self) -> Result<ProgressionParams> {
        Ok(ProgressionParams {
            mean_duration_ticks: self.mean_duration_ticks()?,
            duration_variance_ticks: self.duration_variance_ticks()?,
            death_probability_percent: self.death_rate_percent,
            due_tick_mode: self.due_tick_mode,
        })
    }
}

fn days_to_ticks(name: &str, days: Tick, ticks_per_day: Tick) -> Result<Tick> {
    days.checked_mul(ticks_per_day)
        .filter(|&ticks| ticks <= i64::MAX as Tick)
        .ok_or_else(|| {
            SimError::InvalidConfig(format!(
                "{name} = {days} at {ticks_per_day} ticks per day overflows the tick range"
            ))
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let cfg = Config::default();
        assert!(cfg.validate().is_ok());
        assert_eq!(cfg.mean_duration_ticks().unwrap(), 14 * 200);
        assert_eq!(cfg.duration_variance_ticks().unwrap(), 2 * 200);
    }

    #[test]
    fn partial_toml_keeps_defaults() {
        let cfg = Config::from_toml_str(
            "population_size = 7\ndue_tick_mode = \"cache_at_infection\"\n",
        )
        .unwrap();

        assert_eq!(cfg.population_size, 7);
        assert_eq!(cfg.due_tick_mode, DueTickMode::CacheAtInfection);
        assert_eq!(cfg.ticks_per_day, 200);
        assert_eq!(cfg.contagion_rate_percent, 90);
    }

    #[test]
    fn rejects_out_of_range_percentages() {
        let err = Config::from_toml_str("death_rate_percent = 101").unwrap_err();
        assert!(matches!(err, SimError::InvalidConfig(_)));
    }

    #[test]
    fn rejects_empty_population_and_tiny_arena() {
        let mut cfg = Config::default();
        cfg.population_size = 0;
        assert!(cfg.validate().is_err());

        let mut cfg = Config::default();
        cfg.arena_width = 15.0; // needs 2 * (5 + 3)
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn rejects_non_finite_floats() {
        for text in [
            "arena_width = nan",
            "arena_height = inf",
            "radius = nan",
            "contagion_distance = inf",
        ] {
            let err = Config::from_toml_str(text).unwrap_err();
            assert!(matches!(err, SimError::InvalidConfig(_)), "{text} was accepted");
        }
    }

    #[test]
    fn rejects_tick_products_that_overflow() {
        let err = Config::from_toml_str("ticks_per_day = 9223372036854775807").unwrap_err();
        assert!(matches!(err, SimError::InvalidConfig(_)));

        // Fits a u64 but not the signed due-tick range.
        let mut cfg = Config::default();
        cfg.ticks_per_day = 1 << 62;
        cfg.days_to_heal_or_die = 2;
        cfg.duration_variance_days = 0;
        assert!(cfg.mean_duration_ticks().is_err());
        assert!(cfg.validate().is_err());

        // Each product fits, their sum does not.
        let mut cfg = Config::default();
        cfg.ticks_per_day = 1 << 61;
        cfg.days_to_heal_or_die = 3;
        cfg.duration_variance_days = 1;
        assert!(cfg.progression_params().is_ok());
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn malformed_toml_is_a_parse_error() {
        let err = Config::from_toml_str("population_size = \"many\"").unwrap_err();
        assert!(matches!(err, SimError::Toml(_)));
    }
}
