//! Uniform range sampling and the absence-chance gate shared by every scalar
//! generator.

use num_traits::{Float, PrimInt};
use rand::distributions::{Distribution, Standard};
use rand::{Rng, RngCore};

use crate::config::{Chance, ConfigError};

/// Integer types that can be sampled by [`sample_inclusive`].
///
/// Values are widened to `i128`, which holds the span of every implementing
/// type without overflow.
pub trait RangeInt: PrimInt + Send + Sync + 'static {
    fn to_wide(self) -> i128;
    fn from_wide(value: i128) -> Self;
}

macro_rules! impl_range_int {
    ($($t:ty),*) => {
        $(
            impl RangeInt for $t {
                fn to_wide(self) -> i128 {
                    self as i128
                }

                fn from_wide(value: i128) -> Self {
                    value as $t
                }
            }
        )*
    };
}

impl_range_int!(i8, i16, i32, i64, isize, u8, u16, u32, u64, usize);

/// Draw a uniform offset in `[0, span]` without modulo bias.
///
/// Draws as many random bits as `span` needs and rejects draws above it, so the
/// expected number of draws is below two.
pub fn sample_offset(rng: &mut dyn RngCore, span: u128) -> u128 {
    if span == 0 {
        return 0;
    }

    let bits = 128 - span.leading_zeros();
    let mask = if bits == 128 {
        u128::MAX
    } else {
        (1u128 << bits) - 1
    };

    loop {
        let draw = if bits <= 64 {
            u128::from(rng.next_u64())
        } else {
            (u128::from(rng.next_u64()) << 64) | u128::from(rng.next_u64())
        };
        let candidate = draw & mask;
        if candidate <= span {
            return candidate;
        }
    }
}

/// Draw a uniform value in the inclusive range `[min, max]`.
///
/// Callers validate `min <= max` when the generator is constructed.
pub fn sample_inclusive<T: RangeInt>(rng: &mut dyn RngCore, min: T, max: T) -> T {
    debug_assert!(min <= max, "sample_inclusive called with an inverted range");
    let low = min.to_wide();
    let span = (max.to_wide() - low) as u128;
    T::from_wide(low + sample_offset(rng, span) as i128)
}

/// Draw a uniform floating-point value in `[min, max]`.
///
/// Interpolates between the bounds instead of computing `max - min`, which
/// overflows for ranges wider than the type's maximum.
pub fn sample_float<T>(rng: &mut dyn RngCore, min: T, max: T) -> T
where
    T: Float,
    Standard: Distribution<T>,
{
    let unit: T = rng.sample(Standard);
    let value = min * (T::one() - unit) + max * unit;
    value.max(min).min(max)
}

/// Roll a percentage: true with probability `chance`
pub fn roll(rng: &mut dyn RngCore, chance: Chance) -> bool {
    f64::from(sample_inclusive(rng, 0u8, 99)) < chance.percent()
}

/// The absence-chance gate: decides whether a generation call yields absence.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct AbsenceGate {
    chance: Chance,
}

impl AbsenceGate {
    /// Validate `absence_chance` as a percentage
    pub fn new(absence_chance: f64) -> Result<Self, ConfigError> {
        Ok(Self {
            chance: Chance::new("absence_chance", absence_chance)?,
        })
    }

    /// A gate that never yields absence
    pub fn never() -> Self {
        Self {
            chance: Chance::NEVER,
        }
    }

    pub fn chance(&self) -> Chance {
        self.chance
    }

    /// Whether [`roll`](Self::roll) can ever return true
    pub fn can_be_absent(&self) -> bool {
        !self.chance.is_never()
    }

    /// True when this call should yield absence
    pub fn roll(&self, rng: &mut dyn RngCore) -> bool {
        roll(rng, self.chance)
    }
}
