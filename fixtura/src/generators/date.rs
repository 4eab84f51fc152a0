//! UTC timestamp generator over an epoch-seconds range.

use chrono::{DateTime, Utc};
use rand::RngCore;

use crate::config::ConfigError;
use crate::error::{FixtureError, FixtureResult};
use crate::generators::IntegerGenerator;
use crate::value::ValueGenerator;

/// Generator for UTC timestamps between two epoch times, in whole seconds.
///
/// The default range runs from the epoch to 2040-01-01.
#[derive(Debug, Clone, Copy)]
pub struct DateGenerator {
    seconds: IntegerGenerator<i64>,
}

impl DateGenerator {
    pub const DEFAULT_MIN_EPOCH_SECONDS: i64 = 0;
    pub const DEFAULT_MAX_EPOCH_SECONDS: i64 = 2_208_988_800;

    pub fn new(min_epoch_seconds: i64, max_epoch_seconds: i64) -> Result<Self, ConfigError> {
        for (field, bound) in [
            ("min_epoch_seconds", min_epoch_seconds),
            ("max_epoch_seconds", max_epoch_seconds),
        ] {
            if DateTime::from_timestamp(bound, 0).is_none() {
                return Err(ConfigError::OutOfBounds {
                    field,
                    value: bound.to_string(),
                    reason: "outside the representable date range",
                });
            }
        }
        Ok(Self {
            seconds: IntegerGenerator::new(min_epoch_seconds, max_epoch_seconds)?,
        })
    }

    /// Timestamps between two instants, truncated to whole seconds
    pub fn between(min: DateTime<Utc>, max: DateTime<Utc>) -> Result<Self, ConfigError> {
        Self::new(min.timestamp(), max.timestamp())
    }

    /// Yield absence on `absence_chance` percent of calls
    pub fn with_absence_chance(mut self, absence_chance: f64) -> Result<Self, ConfigError> {
        self.seconds = self.seconds.with_absence_chance(absence_chance)?;
        Ok(self)
    }
}

impl Default for DateGenerator {
    fn default() -> Self {
        Self {
            seconds: IntegerGenerator::from_ordered(
                Self::DEFAULT_MIN_EPOCH_SECONDS,
                Self::DEFAULT_MAX_EPOCH_SECONDS,
            ),
        }
    }
}

impl ValueGenerator<DateTime<Utc>> for DateGenerator {
    fn generate_value(&self, rng: &mut dyn RngCore) -> FixtureResult<Option<DateTime<Utc>>> {
        let Some(seconds) = self.seconds.generate_value(rng)? else {
            return Ok(None);
        };
        DateTime::from_timestamp(seconds, 0).map(Some).ok_or_else(|| {
            FixtureError::generation_failed(format!("timestamp {} out of range", seconds))
        })
    }

    fn can_generate_absent(&self) -> bool {
        self.seconds.can_generate_absent()
    }
}
