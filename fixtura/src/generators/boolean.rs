//! Boolean generator with a configurable chance of `true`.

use rand::RngCore;

use crate::config::{Chance, ConfigError};
use crate::error::FixtureResult;
use crate::sampler::{AbsenceGate, roll};
use crate::value::ValueGenerator;

/// Generator for boolean values with a configurable chance of `true`
#[derive(Debug, Clone, Copy)]
pub struct BooleanGenerator {
    true_chance: Chance,
    absence: AbsenceGate,
}

impl BooleanGenerator {
    /// Create a generator yielding `true` with probability `true_chance` percent
    pub fn new(true_chance: f64) -> Result<Self, ConfigError> {
        Ok(Self {
            true_chance: Chance::new("true_chance", true_chance)?,
            absence: AbsenceGate::never(),
        })
    }

    /// Yield absence on `absence_chance` percent of calls
    pub fn with_absence_chance(mut self, absence_chance: f64) -> Result<Self, ConfigError> {
        self.absence = AbsenceGate::new(absence_chance)?;
        Ok(self)
    }
}

impl Default for BooleanGenerator {
    fn default() -> Self {
        Self {
            true_chance: Chance::EVEN,
            absence: AbsenceGate::never(),
        }
    }
}

impl ValueGenerator<bool> for BooleanGenerator {
    fn generate_value(&self, rng: &mut dyn RngCore) -> FixtureResult<Option<bool>> {
        if self.absence.roll(rng) {
            return Ok(None);
        }
        Ok(Some(roll(rng, self.true_chance)))
    }

    fn can_generate_absent(&self) -> bool {
        self.absence.can_be_absent()
    }
}
