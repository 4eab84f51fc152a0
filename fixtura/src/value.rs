//! The value-generator contract and its type-erased form.

use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use rand::RngCore;

use crate::error::FixtureResult;
use crate::reflect::{Candidate, DynValue, TypeInfo, Typed, describe};

/// A producer of (possibly absent) values of type `V`.
///
/// Generators are shared behind `&self`; stateful generators keep their state
/// behind a lock.
pub trait ValueGenerator<V>: Send + Sync {
    /// Produce a value, or `None` for absence
    fn generate_value(&self, rng: &mut dyn RngCore) -> FixtureResult<Option<V>>;

    /// Whether [`generate_value`](Self::generate_value) can ever return `None`
    fn can_generate_absent(&self) -> bool;

    /// Declared type of the produced values
    fn value_type(&self) -> &'static TypeInfo
    where
        V: Typed,
    {
        V::static_type_info()
    }
}

impl<V, G: ValueGenerator<V> + ?Sized> ValueGenerator<V> for Arc<G> {
    fn generate_value(&self, rng: &mut dyn RngCore) -> FixtureResult<Option<V>> {
        (**self).generate_value(rng)
    }

    fn can_generate_absent(&self) -> bool {
        (**self).can_generate_absent()
    }
}

impl<V, G: ValueGenerator<V> + ?Sized> ValueGenerator<V> for Box<G> {
    fn generate_value(&self, rng: &mut dyn RngCore) -> FixtureResult<Option<V>> {
        (**self).generate_value(rng)
    }

    fn can_generate_absent(&self) -> bool {
        (**self).can_generate_absent()
    }
}

/// A value generator with its value type erased, as stored in mappings and
/// constructor-argument slots.
pub trait ErasedGenerator: Send + Sync {
    fn generate_dyn(&self, rng: &mut dyn RngCore) -> FixtureResult<Option<DynValue>>;

    fn value_type(&self) -> &'static TypeInfo;

    fn can_generate_absent(&self) -> bool;
}

/// Wrapper to make any ValueGenerator work as an ErasedGenerator
struct GeneratorWrapper<V, G> {
    inner: G,
    _marker: PhantomData<fn() -> V>,
}

impl<V: Typed, G: ValueGenerator<V>> ErasedGenerator for GeneratorWrapper<V, G> {
    fn generate_dyn(&self, rng: &mut dyn RngCore) -> FixtureResult<Option<DynValue>> {
        Ok(self
            .inner
            .generate_value(rng)?
            .map(|value| Box::new(value) as DynValue))
    }

    fn value_type(&self) -> &'static TypeInfo {
        V::static_type_info()
    }

    fn can_generate_absent(&self) -> bool {
        self.inner.can_generate_absent()
    }
}

/// Erase the value type of a generator
pub fn erase<V, G>(generator: G) -> Arc<dyn ErasedGenerator>
where
    V: Typed,
    G: ValueGenerator<V> + 'static,
{
    Arc::new(GeneratorWrapper {
        inner: generator,
        _marker: PhantomData,
    })
}

/// A fixed value (possibly absent) or a generator invoked on every use.
#[derive(Clone)]
pub enum ValueSource {
    Fixed(Option<DynValue>),
    Generated(Arc<dyn ErasedGenerator>),
}

impl ValueSource {
    pub fn value<V: Typed>(value: V) -> Self {
        Self::Fixed(Some(Box::new(value)))
    }

    pub fn absent() -> Self {
        Self::Fixed(None)
    }

    pub fn generator<V, G>(generator: G) -> Self
    where
        V: Typed,
        G: ValueGenerator<V> + 'static,
    {
        Self::Generated(erase(generator))
    }

    /// What this source offers to an attribute or parameter
    pub fn candidate(&self) -> Candidate {
        match self {
            Self::Fixed(Some(value)) => Candidate::value(value.as_ref()),
            Self::Fixed(None) => Candidate::absent(),
            Self::Generated(generator) => {
                Candidate::generator(generator.value_type(), generator.can_generate_absent())
            }
        }
    }

    /// Echo the fixed value or invoke the generator
    pub fn produce(&self, rng: &mut dyn RngCore) -> FixtureResult<Option<DynValue>> {
        match self {
            Self::Fixed(value) => Ok(value.clone()),
            Self::Generated(generator) => generator.generate_dyn(rng),
        }
    }
}

impl fmt::Debug for ValueSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Fixed(value) => write!(f, "Fixed({})", describe(value.as_ref())),
            Self::Generated(generator) => write!(f, "Generated({})", generator.value_type().name()),
        }
    }
}
