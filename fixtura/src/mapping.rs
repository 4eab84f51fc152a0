//! Attribute mappings: which attributes of a target type get overwritten after
//! construction, and with what.

use std::any::Any;
use std::fmt;
use std::marker::PhantomData;

use indexmap::IndexMap;
use rand::RngCore;

use crate::error::{FixtureError, FixtureResult};
use crate::reflect::{AttributeInfo, Candidate, DynValue, TypeInfo, Typed};
use crate::value::{ValueGenerator, ValueSource};

/// One attribute and the fixed value or generator that feeds it.
///
/// Compatibility with the attribute is checked once, here; an entry is never
/// modified afterwards.
#[derive(Clone)]
pub struct MappingEntry {
    attribute: &'static AttributeInfo,
    source: ValueSource,
}

impl MappingEntry {
    /// Pair `source` with `attribute`, failing with
    /// [`FixtureError::IncompatibleMapping`] if the attribute cannot hold it
    pub fn new(attribute: &'static AttributeInfo, source: ValueSource) -> FixtureResult<Self> {
        let candidate = source.candidate();
        if !attribute.accepts(&candidate) {
            return Err(FixtureError::IncompatibleMapping {
                attribute: attribute.name().to_string(),
                declaring: attribute.declaring_name().to_string(),
                expected: attribute.type_label(),
                candidate: candidate_label(&candidate),
            });
        }
        Ok(Self { attribute, source })
    }

    /// Entry with a fixed value; `None` maps absence
    pub fn fixed(
        attribute: &'static AttributeInfo,
        value: Option<DynValue>,
    ) -> FixtureResult<Self> {
        Self::new(attribute, ValueSource::Fixed(value))
    }

    /// Entry whose value is generated on every assignment
    pub fn generated<V, G>(attribute: &'static AttributeInfo, generator: G) -> FixtureResult<Self>
    where
        V: Typed,
        G: ValueGenerator<V> + 'static,
    {
        Self::new(attribute, ValueSource::generator(generator))
    }

    /// The attribute this entry targets
    pub fn attribute(&self) -> &'static AttributeInfo {
        self.attribute
    }

    /// The fixed value or generator feeding the attribute
    pub fn source(&self) -> &ValueSource {
        &self.source
    }

    /// The fixed value, or a freshly generated one
    pub fn get_or_generate(&self, rng: &mut dyn RngCore) -> FixtureResult<Option<DynValue>> {
        self.source.produce(rng)
    }
}

impl fmt::Debug for MappingEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?} <- {:?}", self.attribute, self.source)
    }
}

fn candidate_label(candidate: &Candidate) -> String {
    match (candidate.value_type(), candidate.may_be_absent()) {
        (Some(value_type), true) => format!("{} or absent", value_type.name()),
        _ => candidate.to_string(),
    }
}

/// A mapping with its target type erased; the form parents hand to children.
#[derive(Clone)]
pub(crate) struct MappingTable {
    target: &'static TypeInfo,
    entries: IndexMap<&'static AttributeInfo, MappingEntry>,
}

impl MappingTable {
    pub(crate) fn new(target: &'static TypeInfo) -> Self {
        Self {
            target,
            entries: IndexMap::new(),
        }
    }

    pub(crate) fn target(&self) -> &'static TypeInfo {
        self.target
    }

    /// Walk the target's chain for the first attribute named `name` that is
    /// not yet mapped and accepts `candidate`.
    pub(crate) fn find_unclaimed(
        &self,
        name: &str,
        candidate: &Candidate,
    ) -> FixtureResult<&'static AttributeInfo> {
        let mut seen_claimed = false;

        for level in self.target.chain() {
            let Some(attribute) = level.declared_attribute(name) else {
                continue;
            };
            if self.entries.contains_key(attribute) {
                seen_claimed = true;
                continue;
            }
            if attribute.accepts(candidate) {
                return Ok(attribute);
            }
        }

        if seen_claimed {
            Err(FixtureError::AttributeExhausted {
                attribute: name.to_string(),
                candidate: candidate.to_string(),
            })
        } else {
            Err(FixtureError::AttributeNotFound {
                attribute: name.to_string(),
                candidate: candidate.to_string(),
                target: self.target.name().to_string(),
            })
        }
    }

    pub(crate) fn map(&mut self, name: &str, source: ValueSource) -> FixtureResult<()> {
        let attribute = self.find_unclaimed(name, &source.candidate())?;
        let entry = MappingEntry::new(attribute, source)?;
        tracing::debug!(
            "Mapped {}::{} on {}",
            attribute.declaring_name(),
            attribute.name(),
            self.target.name()
        );
        self.entries.insert(attribute, entry);
        Ok(())
    }

    /// Entries of `secondary`, then entries of `self` overwriting shared targets
    pub(crate) fn merged_over(&self, secondary: &MappingTable) -> FixtureResult<MappingTable> {
        if !self.target.is_a(secondary.target) {
            return Err(FixtureError::NotASubtype {
                child: self.target.name().to_string(),
                parent: secondary.target.name().to_string(),
            });
        }

        let mut entries = secondary.entries.clone();
        for (attribute, entry) in &self.entries {
            entries.insert(*attribute, entry.clone());
        }
        Ok(MappingTable {
            target: self.target,
            entries,
        })
    }

    /// Assign every entry into `instance` in iteration order
    pub(crate) fn apply(&self, instance: &mut dyn Any, rng: &mut dyn RngCore) -> FixtureResult<()> {
        for (attribute, entry) in &self.entries {
            let value = entry.get_or_generate(rng)?;
            tracing::trace!(
                "Assigning {}::{} on {}",
                attribute.declaring_name(),
                attribute.name(),
                self.target.name()
            );
            self.target.assign(instance, attribute, value)?;
        }
        Ok(())
    }
}

/// Attribute-to-entry table for type `T`, iterated in insertion order.
///
/// Each `map_*` call resolves the attribute name against `T`'s chain at call
/// time. Mapping the same name again targets the next unmapped same-named
/// attribute further up the chain, so shadowed attributes can each be set.
pub struct AttributeMapping<T> {
    table: MappingTable,
    _marker: PhantomData<fn() -> T>,
}

impl<T> Clone for AttributeMapping<T> {
    fn clone(&self) -> Self {
        Self {
            table: self.table.clone(),
            _marker: PhantomData,
        }
    }
}

impl<T: Typed> Default for AttributeMapping<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Typed> AttributeMapping<T> {
    pub fn new() -> Self {
        Self {
            table: MappingTable::new(T::static_type_info()),
            _marker: PhantomData,
        }
    }

    /// Map a fixed value onto the first unmapped attribute named `name`
    pub fn map_value<V: Typed>(&mut self, name: &str, value: V) -> FixtureResult<()> {
        self.table.map(name, ValueSource::value(value))
    }

    /// Map absence onto the first unmapped nullable attribute named `name`
    pub fn map_absent(&mut self, name: &str) -> FixtureResult<()> {
        self.table.map(name, ValueSource::absent())
    }

    /// Map a generator, invoked on every assignment
    pub fn map_generator<V, G>(&mut self, name: &str, generator: G) -> FixtureResult<()>
    where
        V: Typed,
        G: ValueGenerator<V> + 'static,
    {
        self.table.map(name, ValueSource::generator(generator))
    }

    pub fn map_source(&mut self, name: &str, source: ValueSource) -> FixtureResult<()> {
        self.table.map(name, source)
    }

    /// Resolve `name` without mapping it.
    ///
    /// Fails with [`FixtureError::AttributeExhausted`] when every same-named
    /// attribute is already mapped, and with [`FixtureError::AttributeNotFound`]
    /// when none accepts `candidate`.
    pub fn find_unclaimed(
        &self,
        name: &str,
        candidate: &Candidate,
    ) -> FixtureResult<&'static AttributeInfo> {
        self.table.find_unclaimed(name, candidate)
    }

    /// Combine two mappings; `primary` wins where both target the same attribute.
    ///
    /// `T` must be `B` or a subtype of it.
    pub fn merge<B: Typed>(
        primary: &AttributeMapping<T>,
        secondary: &AttributeMapping<B>,
    ) -> FixtureResult<AttributeMapping<T>> {
        Ok(Self::from_table(primary.table.merged_over(&secondary.table)?))
    }

    /// Overwrite the mapped attributes of `instance`
    pub fn apply_to(&self, instance: &mut T, rng: &mut dyn RngCore) -> FixtureResult<()> {
        self.table.apply(instance, rng)
    }

    pub(crate) fn from_table(table: MappingTable) -> Self {
        Self {
            table,
            _marker: PhantomData,
        }
    }
}

impl<T> AttributeMapping<T> {
    pub fn target(&self) -> &'static TypeInfo {
        self.table.target()
    }

    pub fn get(&self, attribute: &AttributeInfo) -> Option<&MappingEntry> {
        self.table.entries.get(attribute)
    }

    pub fn iter(&self) -> impl Iterator<Item = &MappingEntry> {
        self.table.entries.values()
    }

    pub fn len(&self) -> usize {
        self.table.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.entries.is_empty()
    }

    pub(crate) fn table(&self) -> &MappingTable {
        &self.table
    }
}

impl<T> fmt::Debug for AttributeMapping<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AttributeMapping")
            .field("target", &self.table.target.name())
            .field("entries", &self.table.entries.values().collect::<Vec<_>>())
            .finish()
    }
}
