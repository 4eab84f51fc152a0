//! Fluent configuration of object generators.

use std::fmt;
use std::sync::Arc;

use crate::config::get_global_config;
use crate::error::FixtureResult;
use crate::mapping::AttributeMapping;
use crate::object::{ObjectGenerator, ParentGenerator};
use crate::reflect::Typed;
use crate::registry::{self, GeneratorRegistry};
use crate::value::{ValueGenerator, ValueSource};

/// Builder for [`ObjectGenerator`].
///
/// Starts from the global configuration's name and absence chance. Mapping
/// calls resolve the attribute immediately and fail the same way
/// [`AttributeMapping`] does, so chains read as
/// `builder.map_value("a", 1)?.map_value("b", 2)?`.
///
/// # Example
///
/// ```rust,ignore
/// let generator = ObjectGeneratorBuilder::<Person>::new()
///     .name("adult")
///     .constructor_arg("Ada".to_string())
///     .map_generator("age", IntegerGenerator::new(18i32, 99)?)?
///     .build()?;
/// ```
pub struct ObjectGeneratorBuilder<T> {
    name: String,
    mapping: AttributeMapping<T>,
    constructor_args: Vec<ValueSource>,
    absence_chance: f64,
    parent: Option<ParentGenerator>,
}

impl<T: Typed> Default for ObjectGeneratorBuilder<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Typed> ObjectGeneratorBuilder<T> {
    pub fn new() -> Self {
        let config = get_global_config();
        Self {
            name: config.default_generator_name,
            mapping: AttributeMapping::new(),
            constructor_args: Vec::new(),
            absence_chance: config.default_absence_chance,
            parent: None,
        }
    }

    /// Name used for registry disambiguation
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Percentage in [0, 100]; validated by [`build`](Self::build)
    pub fn absence_chance(mut self, absence_chance: f64) -> Self {
        self.absence_chance = absence_chance;
        self
    }

    pub fn map_value<V: Typed>(mut self, attribute: &str, value: V) -> FixtureResult<Self> {
        self.mapping.map_value(attribute, value)?;
        Ok(self)
    }

    pub fn map_absent(mut self, attribute: &str) -> FixtureResult<Self> {
        self.mapping.map_absent(attribute)?;
        Ok(self)
    }

    pub fn map_generator<V, G>(mut self, attribute: &str, generator: G) -> FixtureResult<Self>
    where
        V: Typed,
        G: ValueGenerator<V> + 'static,
    {
        self.mapping.map_generator(attribute, generator)?;
        Ok(self)
    }

    /// Append a fixed constructor argument
    pub fn constructor_arg<V: Typed>(mut self, value: V) -> Self {
        self.constructor_args.push(ValueSource::value(value));
        self
    }

    /// Append an absent constructor argument
    pub fn constructor_absent(mut self) -> Self {
        self.constructor_args.push(ValueSource::absent());
        self
    }

    /// Append a constructor argument produced by `generator` on every call
    pub fn constructor_generator<V, G>(mut self, generator: G) -> Self
    where
        V: Typed,
        G: ValueGenerator<V> + 'static,
    {
        self.constructor_args.push(ValueSource::generator(generator));
        self
    }

    /// Replace the constructor arguments
    pub fn constructor_args(mut self, args: Vec<ValueSource>) -> Self {
        self.constructor_args = args;
        self
    }

    /// Inherit the effective mapping of `parent`, which must produce `T` or a
    /// supertype of `T`
    pub fn parent<P: Typed>(mut self, parent: &ObjectGenerator<P>) -> Self {
        self.parent = Some(parent.as_parent());
        self
    }

    /// Inherit from the generator registered in the process-wide registry
    pub fn parent_from_registry<P: Typed>(mut self, name: &str) -> FixtureResult<Self> {
        self.parent = Some(registry::lookup::<P>(name)?.as_parent());
        Ok(self)
    }

    /// Inherit from a generator registered in `registry`
    pub fn parent_from<P: Typed>(
        mut self,
        registry: &GeneratorRegistry,
        name: &str,
    ) -> FixtureResult<Self> {
        self.parent = Some(registry.lookup::<P>(name)?.as_parent());
        Ok(self)
    }

    pub fn build(self) -> FixtureResult<ObjectGenerator<T>> {
        ObjectGenerator::new(
            self.name,
            self.mapping,
            self.constructor_args,
            self.absence_chance,
            self.parent,
        )
    }

    /// Build and register in the process-wide registry
    pub fn register(self) -> FixtureResult<Arc<ObjectGenerator<T>>> {
        Ok(registry::register(self.build()?))
    }

    /// Build and register in `registry`
    pub fn register_in(
        self,
        registry: &mut GeneratorRegistry,
    ) -> FixtureResult<Arc<ObjectGenerator<T>>> {
        Ok(registry.register(self.build()?))
    }
}

impl<T> fmt::Debug for ObjectGeneratorBuilder<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObjectGeneratorBuilder")
            .field("name", &self.name)
            .field("mapping", &self.mapping)
            .field("constructor_args", &self.constructor_args)
            .field("absence_chance", &self.absence_chance)
            .field("parent", &self.parent)
            .finish()
    }
}

/// Start configuring a generator for `T`
pub fn create_object_generator<T: Typed>() -> ObjectGeneratorBuilder<T> {
    ObjectGeneratorBuilder::new()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ConfigError, GlobalConfig, reset_global_config, set_global_config};
    use crate::error::FixtureError;
    use crate::reflect::{
        AttributeInfo, DynValue, Initializer, Param, TypeInfo, downcast_target, take_required,
    };
    use crate::rng::create_seeded_rng;
    use std::any::Any;
    use std::sync::OnceLock;

    #[derive(Debug, Clone, PartialEq)]
    struct Counter {
        start: i64,
        step: i64,
    }

    fn set_step(target: &mut dyn Any, value: Option<DynValue>) -> FixtureResult<()> {
        downcast_target::<Counter>(target)?.step = take_required(value)?;
        Ok(())
    }

    fn starting_at(mut arguments: Vec<Option<DynValue>>) -> FixtureResult<DynValue> {
        Ok(Box::new(Counter {
            start: take_required(arguments.remove(0))?,
            step: 1,
        }))
    }

    impl Typed for Counter {
        fn static_type_info() -> &'static TypeInfo {
            static INFO: OnceLock<TypeInfo> = OnceLock::new();
            INFO.get_or_init(|| {
                TypeInfo::of::<Counter>("Counter")
                    .with_attribute(AttributeInfo::new(
                        "step",
                        i64::static_type_info,
                        false,
                        set_step,
                    ))
                    .with_initializer(Initializer::new(
                        "starting_at",
                        vec![Param::new(i64::static_type_info, false)],
                        starting_at,
                    ))
            })
        }
    }

    #[test]
    fn test_builder_defaults_follow_global_config() {
        set_global_config(GlobalConfig::new("configured", 0.0, None).unwrap()).unwrap();
        let builder = create_object_generator::<Counter>();
        reset_global_config();

        let generator = builder.constructor_arg(5i64).build().unwrap();
        assert_eq!(generator.name(), "configured");
        assert_eq!(generator.absence_chance(), 0.0);
    }

    #[test]
    fn test_builder_chain() {
        let generator = create_object_generator::<Counter>()
            .name("by-two")
            .constructor_arg(10i64)
            .map_value("step", 2i64)
            .unwrap()
            .build()
            .unwrap();

        let counter = generator
            .generate_value(&mut create_seeded_rng(0))
            .unwrap()
            .unwrap();
        assert_eq!(counter, Counter { start: 10, step: 2 });
    }

    #[test]
    fn test_builder_rejects_bad_configuration() {
        assert!(matches!(
            create_object_generator::<Counter>().map_value("stride", 2i64),
            Err(FixtureError::AttributeNotFound { .. })
        ));
        assert!(matches!(
            create_object_generator::<Counter>().absence_chance(101.0).build(),
            Err(FixtureError::Config(ConfigError::InvalidChance { .. }))
        ));
        assert!(matches!(
            create_object_generator::<Counter>().name("").build(),
            Err(FixtureError::Config(ConfigError::EmptyName))
        ));
    }

    #[test]
    fn test_register_in_and_parent_from() {
        let mut registry = GeneratorRegistry::new();
        create_object_generator::<Counter>()
            .name("base")
            .map_value("step", 3i64)
            .unwrap()
            .register_in(&mut registry)
            .unwrap();

        let child = create_object_generator::<Counter>()
            .name("child")
            .constructor_arg(1i64)
            .parent_from::<Counter>(&registry, "base")
            .unwrap()
            .build()
            .unwrap();
        let counter = child.generate_value(&mut create_seeded_rng(0)).unwrap().unwrap();
        assert_eq!(counter.step, 3);

        assert!(matches!(
            create_object_generator::<Counter>().parent_from::<Counter>(&registry, "nope"),
            Err(FixtureError::GeneratorNotFound { .. })
        ));
    }
}
