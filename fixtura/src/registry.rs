//! Registry of object generators keyed by produced type and name.

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::sync::{Arc, OnceLock, PoisonError};

use crossbeam::sync::ShardedLock;

use crate::config::DEFAULT_GENERATOR_NAME;
use crate::error::{FixtureError, FixtureResult};
use crate::object::ObjectGenerator;
use crate::reflect::Typed;

/// Type-safe registry for storing and retrieving object generators
pub struct GeneratorRegistry {
    generators: HashMap<(TypeId, String), Box<dyn Any + Send + Sync>>,
}

impl GeneratorRegistry {
    /// Create a new empty generator registry
    pub fn new() -> Self {
        Self {
            generators: HashMap::new(),
        }
    }

    /// Register a generator under its own name, replacing any generator with
    /// the same type and name
    pub fn register<T: Typed>(
        &mut self,
        generator: ObjectGenerator<T>,
    ) -> Arc<ObjectGenerator<T>> {
        let generator = Arc::new(generator);
        let key = (TypeId::of::<T>(), generator.name().to_string());
        let replaced = self
            .generators
            .insert(key, Box::new(Arc::clone(&generator)))
            .is_some();

        if replaced {
            tracing::warn!(
                "Replaced object generator '{}' for {}",
                generator.name(),
                T::static_type_info().name()
            );
        } else {
            tracing::debug!(
                "Registered object generator '{}' for {}",
                generator.name(),
                T::static_type_info().name()
            );
        }
        generator
    }

    /// Get the generator registered for `T` under `name`
    pub fn get<T: Typed>(&self, name: &str) -> Option<Arc<ObjectGenerator<T>>> {
        self.generators
            .get(&(TypeId::of::<T>(), name.to_string()))
            .and_then(|boxed| boxed.downcast_ref::<Arc<ObjectGenerator<T>>>())
            .cloned()
    }

    /// Like [`get`](Self::get), but a miss is an error naming the type and name
    pub fn lookup<T: Typed>(&self, name: &str) -> FixtureResult<Arc<ObjectGenerator<T>>> {
        self.get(name).ok_or_else(|| FixtureError::GeneratorNotFound {
            target: T::static_type_info().name().to_string(),
            name: name.to_string(),
        })
    }

    /// Look up and invoke a generator
    pub fn generate<T: Typed>(&self, name: &str) -> FixtureResult<Option<T>> {
        self.lookup::<T>(name)?.generate()
    }

    pub fn contains<T: Typed>(&self, name: &str) -> bool {
        self.generators
            .contains_key(&(TypeId::of::<T>(), name.to_string()))
    }

    /// Remove a generator, returning whether one was registered
    pub fn remove<T: Typed>(&mut self, name: &str) -> bool {
        self.generators
            .remove(&(TypeId::of::<T>(), name.to_string()))
            .is_some()
    }

    pub fn len(&self) -> usize {
        self.generators.len()
    }

    pub fn is_empty(&self) -> bool {
        self.generators.is_empty()
    }

    pub fn clear(&mut self) {
        self.generators.clear();
    }
}

impl Default for GeneratorRegistry {
    fn default() -> Self {
        Self::new()
    }
}

fn global() -> &'static ShardedLock<GeneratorRegistry> {
    static REGISTRY: OnceLock<ShardedLock<GeneratorRegistry>> = OnceLock::new();
    REGISTRY.get_or_init(|| ShardedLock::new(GeneratorRegistry::new()))
}

/// Register a generator in the process-wide registry
pub fn register<T: Typed>(generator: ObjectGenerator<T>) -> Arc<ObjectGenerator<T>> {
    global()
        .write()
        .unwrap_or_else(PoisonError::into_inner)
        .register(generator)
}

/// Look up a generator in the process-wide registry
pub fn lookup<T: Typed>(name: &str) -> FixtureResult<Arc<ObjectGenerator<T>>> {
    global()
        .read()
        .unwrap_or_else(PoisonError::into_inner)
        .lookup(name)
}

/// Look up a generator in the process-wide registry and invoke it.
///
/// The lock is released before the generator runs, so generators may
/// themselves consult the registry.
pub fn generate<T: Typed>(name: &str) -> FixtureResult<Option<T>> {
    lookup::<T>(name)?.generate()
}

/// [`generate`] with the default generator name
pub fn generate_default<T: Typed>() -> FixtureResult<Option<T>> {
    generate(DEFAULT_GENERATOR_NAME)
}

/// Remove every generator from the process-wide registry
pub fn clear_registry() {
    global()
        .write()
        .unwrap_or_else(PoisonError::into_inner)
        .clear();
    tracing::debug!("Cleared the generator registry");
}
