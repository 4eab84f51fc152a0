//! Integer and floating-point range generators.

use std::fmt;

use num_traits::Float;
use rand::RngCore;
use rand::distributions::{Distribution, Standard};

use crate::config::{ConfigError, check_range};
use crate::error::FixtureResult;
use crate::reflect::Typed;
use crate::sampler::{AbsenceGate, RangeInt, sample_float, sample_inclusive};
use crate::value::ValueGenerator;

/// Generator for integer types over an inclusive range
#[derive(Debug, Clone, Copy)]
pub struct IntegerGenerator<T> {
    min: T,
    max: T,
    absence: AbsenceGate,
}

impl<T: RangeInt + fmt::Display> IntegerGenerator<T> {
    /// Create a generator for `[min, max]` that never yields absence
    pub fn new(min: T, max: T) -> Result<Self, ConfigError> {
        check_range("integer", min, max)?;
        Ok(Self {
            min,
            max,
            absence: AbsenceGate::never(),
        })
    }

    /// Create a generator for the full range of the type
    pub fn full_range() -> Self {
        Self::from_ordered(T::min_value(), T::max_value())
    }

    /// Bounds known to be ordered at compile time
    pub(crate) fn from_ordered(min: T, max: T) -> Self {
        Self {
            min,
            max,
            absence: AbsenceGate::never(),
        }
    }

    /// Yield absence on `absence_chance` percent of calls
    pub fn with_absence_chance(mut self, absence_chance: f64) -> Result<Self, ConfigError> {
        self.absence = AbsenceGate::new(absence_chance)?;
        Ok(self)
    }

    pub fn min(&self) -> T {
        self.min
    }

    pub fn max(&self) -> T {
        self.max
    }
}

impl<T: RangeInt + fmt::Display> Default for IntegerGenerator<T> {
    fn default() -> Self {
        Self::full_range()
    }
}

impl<T: RangeInt + Typed> ValueGenerator<T> for IntegerGenerator<T> {
    fn generate_value(&self, rng: &mut dyn RngCore) -> FixtureResult<Option<T>> {
        if self.absence.roll(rng) {
            return Ok(None);
        }
        Ok(Some(sample_inclusive(rng, self.min, self.max)))
    }

    fn can_generate_absent(&self) -> bool {
        self.absence.can_be_absent()
    }
}

/// Generator for floating-point types over a closed range
#[derive(Debug, Clone, Copy)]
pub struct FloatGenerator<T> {
    min: T,
    max: T,
    absence: AbsenceGate,
}

impl<T: Float + fmt::Display> FloatGenerator<T> {
    /// Create a generator for `[min, max]`; both bounds must be finite
    pub fn new(min: T, max: T) -> Result<Self, ConfigError> {
        for (field, bound) in [("float min", min), ("float max", max)] {
            if !bound.is_finite() {
                return Err(ConfigError::OutOfBounds {
                    field,
                    value: bound.to_string(),
                    reason: "must be finite",
                });
            }
        }
        check_range("float", min, max)?;
        Ok(Self {
            min,
            max,
            absence: AbsenceGate::never(),
        })
    }

    /// Create a generator for every finite value of the type
    pub fn full_range() -> Self {
        Self {
            min: T::min_value(),
            max: T::max_value(),
            absence: AbsenceGate::never(),
        }
    }

    /// Yield absence on `absence_chance` percent of calls
    pub fn with_absence_chance(mut self, absence_chance: f64) -> Result<Self, ConfigError> {
        self.absence = AbsenceGate::new(absence_chance)?;
        Ok(self)
    }
}

impl<T: Float + fmt::Display> Default for FloatGenerator<T> {
    fn default() -> Self {
        Self::full_range()
    }
}

impl<T> ValueGenerator<T> for FloatGenerator<T>
where
    T: Float + Typed,
    Standard: Distribution<T>,
{
    fn generate_value(&self, rng: &mut dyn RngCore) -> FixtureResult<Option<T>> {
        if self.absence.roll(rng) {
            return Ok(None);
        }
        Ok(Some(sample_float(rng, self.min, self.max)))
    }

    fn can_generate_absent(&self) -> bool {
        self.absence.can_be_absent()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rng::create_seeded_rng;

    #[test]
    fn test_integer_generator_range() {
        let generator = IntegerGenerator::new(-3i16, 3).unwrap();
        let mut rng = create_seeded_rng(10);
        for _ in 0..500 {
            let value = generator.generate_value(&mut rng).unwrap().unwrap();
            assert!((-3..=3).contains(&value));
        }
    }

    #[test]
    fn test_integer_generator_full_range_types() {
        let mut rng = create_seeded_rng(11);
        let byte = IntegerGenerator::<i8>::full_range();
        let long = IntegerGenerator::<i64>::default();
        assert_eq!(byte.min(), i8::MIN);
        assert_eq!(long.max(), i64::MAX);
        for _ in 0..100 {
            assert!(byte.generate_value(&mut rng).unwrap().is_some());
            assert!(long.generate_value(&mut rng).unwrap().is_some());
        }
    }

    #[test]
    fn test_integer_generator_validation() {
        assert_eq!(
            IntegerGenerator::new(5i32, 4).unwrap_err(),
            ConfigError::InvertedRange {
                field: "integer",
                min: "5".to_string(),
                max: "4".to_string(),
            }
        );
        assert!(
            IntegerGenerator::new(0i32, 1)
                .unwrap()
                .with_absence_chance(-1.0)
                .is_err()
        );
    }

    #[test]
    fn test_integer_generator_always_absent() {
        let generator = IntegerGenerator::new(0u8, 9)
            .unwrap()
            .with_absence_chance(100.0)
            .unwrap();
        let mut rng = create_seeded_rng(12);
        assert!(generator.can_generate_absent());
        for _ in 0..100 {
            assert!(generator.generate_value(&mut rng).unwrap().is_none());
        }
    }

    #[test]
    fn test_float_generator() {
        let generator = FloatGenerator::new(-0.5f32, 0.5).unwrap();
        let mut rng = create_seeded_rng(13);
        for _ in 0..500 {
            let value = generator.generate_value(&mut rng).unwrap().unwrap();
            assert!((-0.5..=0.5).contains(&value));
        }

        let wide = FloatGenerator::<f64>::full_range();
        for _ in 0..100 {
            assert!(wide.generate_value(&mut rng).unwrap().unwrap().is_finite());
        }

        assert!(FloatGenerator::new(1.0f64, 0.0).is_err());
        assert!(FloatGenerator::new(f64::NAN, 0.0).is_err());
        assert!(FloatGenerator::new(0.0, f64::INFINITY).is_err());
    }
}
