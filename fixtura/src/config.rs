//! Configuration: validated percentages and ranges, and the per-thread global
//! defaults that builders start from.

use std::fmt;

/// Name given to generators that are not explicitly named
pub const DEFAULT_GENERATOR_NAME: &str = "default";

/// Absence chance given to generators that do not set one
pub const DEFAULT_ABSENCE_CHANCE: f64 = 0.0;

/// Configuration validation errors
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigError {
    /// A percentage outside [0, 100] (or NaN)
    #[error("invalid {field}: {value} (must be between 0 and 100)")]
    InvalidChance { field: &'static str, value: f64 },

    /// A range whose minimum exceeds its maximum
    #[error("invalid {field} range: min {min} is greater than max {max}")]
    InvertedRange {
        field: &'static str,
        min: String,
        max: String,
    },

    /// A bound outside what the generator can represent
    #[error("invalid {field}: {value} ({reason})")]
    OutOfBounds {
        field: &'static str,
        value: String,
        reason: &'static str,
    },

    /// A generator name that is empty
    #[error("generator name cannot be empty")]
    EmptyName,

    /// A value list that is empty
    #[error("{field} cannot be empty")]
    EmptyValues { field: &'static str },
}

/// A percentage in [0, 100].
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct Chance(f64);

impl Chance {
    pub const NEVER: Chance = Chance(0.0);
    pub const EVEN: Chance = Chance(50.0);

    /// Validate a percentage for the named field
    pub fn new(field: &'static str, value: f64) -> Result<Self, ConfigError> {
        if !(0.0..=100.0).contains(&value) {
            return Err(ConfigError::InvalidChance { field, value });
        }
        Ok(Self(value))
    }

    pub fn percent(self) -> f64 {
        self.0
    }

    pub fn is_never(self) -> bool {
        self.0 == 0.0
    }
}

impl Default for Chance {
    fn default() -> Self {
        Self::NEVER
    }
}

impl fmt::Display for Chance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}%", self.0)
    }
}

/// Check `min <= max` for the named field
pub fn check_range<T: PartialOrd + fmt::Display>(
    field: &'static str,
    min: T,
    max: T,
) -> Result<(), ConfigError> {
    if min > max {
        return Err(ConfigError::InvertedRange {
            field,
            min: min.to_string(),
            max: max.to_string(),
        });
    }
    Ok(())
}

/// Global defaults for new generators
#[derive(Debug, Clone, PartialEq)]
pub struct GlobalConfig {
    /// Name used when a builder is not given one
    pub default_generator_name: String,
    /// Absence chance used when a builder is not given one
    pub default_absence_chance: f64,
    /// Seed for [`create_rng`](crate::rng::create_rng); `None` draws from entropy
    pub default_seed: Option<u64>,
}

impl Default for GlobalConfig {
    fn default() -> Self {
        Self {
            default_generator_name: DEFAULT_GENERATOR_NAME.to_string(),
            default_absence_chance: DEFAULT_ABSENCE_CHANCE,
            default_seed: None,
        }
    }
}

impl GlobalConfig {
    /// Create a new global configuration with validation
    pub fn new(
        default_generator_name: impl Into<String>,
        default_absence_chance: f64,
        default_seed: Option<u64>,
    ) -> Result<Self, ConfigError> {
        let config = Self {
            default_generator_name: default_generator_name.into(),
            default_absence_chance,
            default_seed,
        };
        config.validate()?;
        Ok(config)
    }

    /// Validate the global configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.default_generator_name.is_empty() {
            return Err(ConfigError::EmptyName);
        }
        Chance::new("default_absence_chance", self.default_absence_chance)?;
        Ok(())
    }
}

/// Holds the global configuration
#[derive(Debug, Default)]
pub struct ConfigManager {
    global_config: GlobalConfig,
}

impl ConfigManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn global_config(&self) -> &GlobalConfig {
        &self.global_config
    }

    /// Replace the global configuration after validating it
    pub fn set_global_config(&mut self, global_config: GlobalConfig) -> Result<(), ConfigError> {
        global_config.validate()?;
        self.global_config = global_config;
        Ok(())
    }
}

// Thread-local so that tests running in parallel do not observe each other's defaults.
thread_local! {
    static CONFIG_MANAGER: std::cell::RefCell<ConfigManager> =
        std::cell::RefCell::new(ConfigManager::new());
}

/// Get the current global configuration
pub fn get_global_config() -> GlobalConfig {
    CONFIG_MANAGER.with(|manager| manager.borrow().global_config().clone())
}

/// Set the global configuration
pub fn set_global_config(config: GlobalConfig) -> Result<(), ConfigError> {
    CONFIG_MANAGER.with(|manager| manager.borrow_mut().set_global_config(config))
}

/// Restore the default global configuration
pub fn reset_global_config() {
    CONFIG_MANAGER.with(|manager| *manager.borrow_mut() = ConfigManager::new());
}
