//! Generators that draw from a fixed collection of values.
//!
//! These generators are stateful: each instance keeps its own position or
//! pool of unused values behind a lock. Share one instance to share one
//! sequence; create separate instances for independent sequences.

use std::hash::Hash;
use std::sync::{Mutex, PoisonError};

use indexmap::IndexSet;
use rand::RngCore;

use crate::config::ConfigError;
use crate::error::FixtureResult;
use crate::reflect::{Enumerable, Typed};
use crate::sampler::sample_inclusive;
use crate::value::ValueGenerator;

/// Yields values in order. Once every value has been yielded it starts over
/// when `repeat` is set and yields absence otherwise.
#[derive(Debug)]
pub struct ListGenerator<T> {
    values: Vec<T>,
    repeat: bool,
    cursor: Mutex<usize>,
}

impl<T: Typed> ListGenerator<T> {
    /// Fails when `values` is empty
    pub fn new(values: Vec<T>, repeat: bool) -> Result<Self, ConfigError> {
        if values.is_empty() {
            return Err(ConfigError::EmptyValues { field: "values" });
        }
        Ok(Self {
            values,
            repeat,
            cursor: Mutex::new(0),
        })
    }
}

impl<T: Typed> ValueGenerator<T> for ListGenerator<T> {
    fn generate_value(&self, _rng: &mut dyn RngCore) -> FixtureResult<Option<T>> {
        let mut cursor = self.cursor.lock().unwrap_or_else(PoisonError::into_inner);
        if *cursor == self.values.len() {
            if !self.repeat {
                return Ok(None);
            }
            *cursor = 0;
        }
        let value = self.values[*cursor].clone();
        *cursor += 1;
        Ok(Some(value))
    }

    fn can_generate_absent(&self) -> bool {
        !self.repeat
    }
}

/// Yields random values from a set.
///
/// With `unique_selections`, no value repeats until every value has been
/// yielded once; the pool then refills.
#[derive(Debug)]
pub struct SetGenerator<T> {
    values: Vec<T>,
    unique_selections: bool,
    unused: Mutex<Vec<usize>>,
}

impl<T: Typed + Eq + Hash> SetGenerator<T> {
    /// Duplicate values are dropped, keeping the first occurrence
    pub fn new(
        values: impl IntoIterator<Item = T>,
        unique_selections: bool,
    ) -> Result<Self, ConfigError> {
        let values: IndexSet<T> = values.into_iter().collect();
        Self::from_distinct(values.into_iter().collect(), unique_selections)
    }
}

impl<T: Typed> SetGenerator<T> {
    pub(crate) fn from_distinct(
        values: Vec<T>,
        unique_selections: bool,
    ) -> Result<Self, ConfigError> {
        if values.is_empty() {
            return Err(ConfigError::EmptyValues { field: "values" });
        }
        Ok(Self {
            values,
            unique_selections,
            unused: Mutex::new(Vec::new()),
        })
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl<T: Typed> ValueGenerator<T> for SetGenerator<T> {
    fn generate_value(&self, rng: &mut dyn RngCore) -> FixtureResult<Option<T>> {
        if !self.unique_selections {
            let index = sample_inclusive(rng, 0usize, self.values.len() - 1);
            return Ok(Some(self.values[index].clone()));
        }

        let mut unused = self.unused.lock().unwrap_or_else(PoisonError::into_inner);
        if unused.is_empty() {
            unused.extend(0..self.values.len());
        }
        let position = sample_inclusive(rng, 0usize, unused.len() - 1);
        let index = unused.swap_remove(position);
        Ok(Some(self.values[index].clone()))
    }

    fn can_generate_absent(&self) -> bool {
        false
    }
}

/// Random variants of a fieldless enum
#[derive(Debug)]
pub struct EnumGenerator<E> {
    inner: SetGenerator<E>,
}

impl<E: Enumerable> EnumGenerator<E> {
    pub fn new(unique_selections: bool) -> Result<Self, ConfigError> {
        Ok(Self {
            inner: SetGenerator::from_distinct(E::variants(), unique_selections)?,
        })
    }
}

impl<E: Enumerable> ValueGenerator<E> for EnumGenerator<E> {
    fn generate_value(&self, rng: &mut dyn RngCore) -> FixtureResult<Option<E>> {
        self.inner.generate_value(rng)
    }

    fn can_generate_absent(&self) -> bool {
        false
    }
}
