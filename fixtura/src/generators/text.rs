//! Character and string generators.

use std::sync::Arc;

use rand::RngCore;

use crate::config::{ConfigError, check_range};
use crate::error::FixtureResult;
use crate::sampler::{AbsenceGate, sample_inclusive};
use crate::value::ValueGenerator;

/// Printable ASCII, space through tilde
pub fn default_allowable_chars() -> Vec<char> {
    (32u8..127).map(char::from).collect()
}

fn pick(rng: &mut dyn RngCore, chars: &[char]) -> char {
    chars[sample_inclusive(rng, 0usize, chars.len() - 1)]
}

fn check_chars(chars: &[char]) -> Result<(), ConfigError> {
    if chars.is_empty() {
        return Err(ConfigError::EmptyValues {
            field: "allowable_chars",
        });
    }
    Ok(())
}

/// Generator for single characters drawn from an allowable set
#[derive(Debug, Clone)]
pub struct CharGenerator {
    chars: Arc<[char]>,
    absence: AbsenceGate,
}

impl CharGenerator {
    pub fn new(allowable_chars: Vec<char>) -> Result<Self, ConfigError> {
        check_chars(&allowable_chars)?;
        Ok(Self {
            chars: allowable_chars.into(),
            absence: AbsenceGate::never(),
        })
    }

    /// Yield absence on `absence_chance` percent of calls
    pub fn with_absence_chance(mut self, absence_chance: f64) -> Result<Self, ConfigError> {
        self.absence = AbsenceGate::new(absence_chance)?;
        Ok(self)
    }
}

impl Default for CharGenerator {
    fn default() -> Self {
        Self {
            chars: default_allowable_chars().into(),
            absence: AbsenceGate::never(),
        }
    }
}

impl ValueGenerator<char> for CharGenerator {
    fn generate_value(&self, rng: &mut dyn RngCore) -> FixtureResult<Option<char>> {
        if self.absence.roll(rng) {
            return Ok(None);
        }
        Ok(Some(pick(rng, &self.chars)))
    }

    fn can_generate_absent(&self) -> bool {
        self.absence.can_be_absent()
    }
}

/// Generator for strings with a length range and an allowable character set
#[derive(Debug, Clone)]
pub struct StringGenerator {
    min_length: usize,
    max_length: usize,
    chars: Arc<[char]>,
    absence: AbsenceGate,
}

impl StringGenerator {
    pub const DEFAULT_MIN_LENGTH: usize = 1;
    pub const DEFAULT_MAX_LENGTH: usize = 32;

    /// Strings of `min_length..=max_length` printable ASCII characters
    pub fn new(min_length: usize, max_length: usize) -> Result<Self, ConfigError> {
        Self::with_chars(min_length, max_length, default_allowable_chars())
    }

    pub fn with_chars(
        min_length: usize,
        max_length: usize,
        allowable_chars: Vec<char>,
    ) -> Result<Self, ConfigError> {
        if max_length == 0 {
            return Err(ConfigError::OutOfBounds {
                field: "max_length",
                value: max_length.to_string(),
                reason: "must be at least 1",
            });
        }
        check_range("length", min_length, max_length)?;
        check_chars(&allowable_chars)?;
        Ok(Self {
            min_length,
            max_length,
            chars: allowable_chars.into(),
            absence: AbsenceGate::never(),
        })
    }

    /// Yield absence on `absence_chance` percent of calls
    pub fn with_absence_chance(mut self, absence_chance: f64) -> Result<Self, ConfigError> {
        self.absence = AbsenceGate::new(absence_chance)?;
        Ok(self)
    }
}

impl Default for StringGenerator {
    fn default() -> Self {
        Self {
            min_length: Self::DEFAULT_MIN_LENGTH,
            max_length: Self::DEFAULT_MAX_LENGTH,
            chars: default_allowable_chars().into(),
            absence: AbsenceGate::never(),
        }
    }
}

impl ValueGenerator<String> for StringGenerator {
    fn generate_value(&self, rng: &mut dyn RngCore) -> FixtureResult<Option<String>> {
        if self.absence.roll(rng) {
            return Ok(None);
        }
        let length = sample_inclusive(rng, self.min_length, self.max_length);
        Ok(Some((0..length).map(|_| pick(rng, &self.chars)).collect()))
    }

    fn can_generate_absent(&self) -> bool {
        self.absence.can_be_absent()
    }
}
