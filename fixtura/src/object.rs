//! Object generators: construct an instance through one of its initializers,
//! then overwrite mapped attributes.

use std::fmt;

use rand::RngCore;

use crate::config::ConfigError;
use crate::construct::{evaluate_arguments, new_instance};
use crate::error::FixtureResult;
use crate::mapping::{AttributeMapping, MappingTable};
use crate::reflect::{TypeInfo, Typed};
use crate::rng::create_rng;
use crate::sampler::AbsenceGate;
use crate::value::{ValueGenerator, ValueSource};

/// The part of a generator a child generator inherits: its effective mapping.
#[derive(Clone)]
pub struct ParentGenerator {
    name: String,
    effective: MappingTable,
}

impl ParentGenerator {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn value_type(&self) -> &'static TypeInfo {
        self.effective.target()
    }
}

impl fmt::Debug for ParentGenerator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ParentGenerator")
            .field("name", &self.name)
            .field("value_type", &self.value_type().name())
            .finish()
    }
}

/// Generates instances of `T`.
///
/// Every call rolls the absence gate, evaluates the constructor arguments,
/// invokes the single initializer of `T` that accepts them, and assigns the
/// effective mapping: this generator's own mapping merged over its parent's
/// effective mapping. The parent's constructor arguments are not used.
pub struct ObjectGenerator<T> {
    name: String,
    mapping: AttributeMapping<T>,
    effective: AttributeMapping<T>,
    constructor_args: Vec<ValueSource>,
    absence: AbsenceGate,
    parent: Option<ParentGenerator>,
}

impl<T: Typed> ObjectGenerator<T> {
    /// Create a generator, validating its name and absence chance and merging
    /// its mapping over the parent's.
    pub fn new(
        name: impl Into<String>,
        mapping: AttributeMapping<T>,
        constructor_args: Vec<ValueSource>,
        absence_chance: f64,
        parent: Option<ParentGenerator>,
    ) -> FixtureResult<Self> {
        let name = name.into();
        if name.is_empty() {
            return Err(ConfigError::EmptyName.into());
        }
        let absence = AbsenceGate::new(absence_chance)?;

        let effective = match &parent {
            Some(parent) => {
                AttributeMapping::from_table(mapping.table().merged_over(&parent.effective)?)
            }
            None => mapping.clone(),
        };

        tracing::debug!(
            "Built object generator '{}' for {} ({} mapped attributes, {} constructor arguments)",
            name,
            T::static_type_info().name(),
            effective.len(),
            constructor_args.len()
        );

        Ok(Self {
            name,
            mapping,
            effective,
            constructor_args,
            absence,
            parent,
        })
    }

    /// Produce an instance, or `None` when the absence gate fires
    pub fn generate_value(&self, rng: &mut dyn RngCore) -> FixtureResult<Option<T>> {
        if self.absence.roll(rng) {
            tracing::trace!("Absence gate fired for '{}'", self.name);
            return Ok(None);
        }

        let arguments = evaluate_arguments(&self.constructor_args, rng)?;
        let mut instance: T = new_instance(arguments)?;
        self.effective.apply_to(&mut instance, rng)?;
        Ok(Some(instance))
    }

    /// Produce an instance using [`create_rng`]
    pub fn generate(&self) -> FixtureResult<Option<T>> {
        self.generate_value(&mut create_rng())
    }

    /// Hand this generator's effective mapping to a child generator
    pub fn as_parent(&self) -> ParentGenerator {
        ParentGenerator {
            name: self.name.clone(),
            effective: self.effective.table().clone(),
        }
    }

    pub fn value_type(&self) -> &'static TypeInfo {
        T::static_type_info()
    }
}

impl<T> ObjectGenerator<T> {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// This generator's own mapping, without the parent's entries
    pub fn mapping(&self) -> &AttributeMapping<T> {
        &self.mapping
    }

    /// Own mapping merged over the parent's effective mapping
    pub fn effective_mapping(&self) -> &AttributeMapping<T> {
        &self.effective
    }

    pub fn constructor_args(&self) -> &[ValueSource] {
        &self.constructor_args
    }

    pub fn absence_chance(&self) -> f64 {
        self.absence.chance().percent()
    }

    pub fn parent(&self) -> Option<&ParentGenerator> {
        self.parent.as_ref()
    }
}

impl<T: Typed> ValueGenerator<T> for ObjectGenerator<T> {
    fn generate_value(&self, rng: &mut dyn RngCore) -> FixtureResult<Option<T>> {
        ObjectGenerator::generate_value(self, rng)
    }

    fn can_generate_absent(&self) -> bool {
        self.absence.can_be_absent()
    }
}

impl<T> fmt::Debug for ObjectGenerator<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObjectGenerator")
            .field("name", &self.name)
            .field("mapping", &self.effective)
            .field("constructor_args", &self.constructor_args)
            .field("absence_chance", &self.absence.chance())
            .field("parent", &self.parent)
            .finish()
    }
}
