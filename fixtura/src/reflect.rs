//! Run-time type introspection for fixture types.
//!
//! Rust has no reflection, so every type that takes part in fixture generation
//! carries a registration table, a [`TypeInfo`], describing its supertype, the
//! attributes it declares and the initializers it can be built with. The
//! `#[derive(Fixture)]` macro writes these tables; the primitive and standard
//! value types get theirs from this module.
//!
//! "Inheritance" is modelled by composition: a type names one of its fields as
//! its base (`#[fixture(base)]`), and the table records how to reach that field
//! from an instance (`project`) and how to turn a whole value into its base
//! (`upcast`).

use std::any::{Any, TypeId};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::OnceLock;

use chrono::{DateTime, Utc};

use crate::error::{FixtureError, FixtureResult};

/// A dynamically typed, cloneable value. Absence is expressed as
/// `Option<DynValue>::None`, never as a special value.
pub type DynValue = Box<dyn Reflect>;

/// Object-safe view of a [`Typed`] value.
pub trait Reflect: Any + Send + Sync + fmt::Debug + 'static {
    /// The registration table of the value's concrete type
    fn type_info(&self) -> &'static TypeInfo;

    /// Clone into a new boxed value
    fn clone_value(&self) -> DynValue;

    fn as_any(&self) -> &dyn Any;

    fn as_any_mut(&mut self) -> &mut dyn Any;

    fn into_any(self: Box<Self>) -> Box<dyn Any>;
}

/// A type with a static registration table.
///
/// Implemented by `#[derive(Fixture)]` for user types and by this module for
/// the primitive value types.
pub trait Typed: Any + Send + Sync + Clone + fmt::Debug {
    fn static_type_info() -> &'static TypeInfo;
}

impl<T: Typed> Reflect for T {
    fn type_info(&self) -> &'static TypeInfo {
        T::static_type_info()
    }

    fn clone_value(&self) -> DynValue {
        Box::new(self.clone())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }

    fn into_any(self: Box<Self>) -> Box<dyn Any> {
        self
    }
}

impl Clone for Box<dyn Reflect> {
    fn clone(&self) -> Self {
        (**self).clone_value()
    }
}

/// Fieldless enums whose variants can be enumerated.
pub trait Enumerable: Typed {
    fn variants() -> Vec<Self>;
}

/// Writes a possibly absent value into an attribute of an instance of the
/// declaring type.
pub type Setter = fn(&mut dyn Any, Option<DynValue>) -> FixtureResult<()>;

/// Invokes an initializer with already-evaluated arguments.
pub type Invoker = fn(Vec<Option<DynValue>>) -> FixtureResult<DynValue>;

/// Lazily resolves a type's table; used for references between tables so that
/// self-referential and mutually referential types never recurse on init.
pub type TypeInfoFn = fn() -> &'static TypeInfo;

/// Registration table of a type: the TypeDescriptor.
pub struct TypeInfo {
    name: &'static str,
    type_id: TypeId,
    scalar: bool,
    supertype: Option<Supertype>,
    attributes: Vec<AttributeInfo>,
    initializers: Vec<Initializer>,
}

impl TypeInfo {
    /// Start a table for `T` with no supertype, attributes or initializers
    pub fn of<T: Any>(name: &'static str) -> Self {
        Self {
            name,
            type_id: TypeId::of::<T>(),
            scalar: false,
            supertype: None,
            attributes: Vec::new(),
            initializers: Vec::new(),
        }
    }

    /// Mark the type as a primitive scalar, matched by exact type only
    pub fn scalar(mut self) -> Self {
        self.scalar = true;
        self
    }

    pub fn with_supertype(mut self, supertype: Supertype) -> Self {
        self.supertype = Some(supertype);
        self
    }

    /// Declare an attribute; its declaring type becomes this type
    pub fn with_attribute(mut self, mut attribute: AttributeInfo) -> Self {
        attribute.declaring = self.type_id;
        attribute.declaring_name = self.name;
        self.attributes.push(attribute);
        self
    }

    pub fn with_initializer(mut self, initializer: Initializer) -> Self {
        self.initializers.push(initializer);
        self
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn type_id(&self) -> TypeId {
        self.type_id
    }

    /// Whether this is a primitive scalar (bool, char, integer or float)
    pub fn is_scalar(&self) -> bool {
        self.scalar
    }

    pub fn supertype(&self) -> Option<&Supertype> {
        self.supertype.as_ref()
    }

    pub fn attributes(&self) -> &[AttributeInfo] {
        &self.attributes
    }

    pub fn initializers(&self) -> &[Initializer] {
        &self.initializers
    }

    /// The attribute this level declares under `name`, ignoring supertypes
    pub fn declared_attribute(&self, name: &str) -> Option<&AttributeInfo> {
        self.attributes.iter().find(|attribute| attribute.name == name)
    }

    /// This type followed by each of its supertypes, most derived first
    pub fn chain(&'static self) -> impl Iterator<Item = &'static TypeInfo> {
        std::iter::successors(Some(self), |info| info.supertype().map(Supertype::info))
    }

    /// Whether this type is `other` or one of its subtypes
    pub fn is_a(&'static self, other: &TypeInfo) -> bool {
        self.chain().any(|info| info.type_id == other.type_id)
    }

    /// Whether a present value of this type fits a slot declared as
    /// `declared`: exactly for a required scalar slot, otherwise as `is_a`
    pub fn fits(&'static self, declared: &TypeInfo, nullable: bool) -> bool {
        if declared.scalar && !nullable {
            self.type_id == declared.type_id
        } else {
            self.is_a(declared)
        }
    }

    /// Assign `value` to `attribute` inside `instance`, an instance of this
    /// type. The attribute may be declared at any level of the chain.
    pub fn assign(
        &'static self,
        instance: &mut dyn Any,
        attribute: &AttributeInfo,
        value: Option<DynValue>,
    ) -> FixtureResult<()> {
        let mut level = self;
        let mut target = instance;

        while level.type_id != attribute.declaring {
            let supertype = level.supertype().ok_or_else(|| FixtureError::NotASubtype {
                child: self.name.to_string(),
                parent: attribute.declaring_name.to_string(),
            })?;
            target = (supertype.project)(target).ok_or_else(|| FixtureError::TypeMismatch {
                expected: level.name.to_string(),
                found: "an instance of another type".to_string(),
            })?;
            level = supertype.info();
        }

        (attribute.setter)(target, value)
    }
}

impl fmt::Debug for TypeInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeInfo")
            .field("name", &self.name)
            .field("supertype", &self.supertype.as_ref().map(|s| s.info().name))
            .field("attributes", &self.attributes)
            .field("initializers", &self.initializers)
            .finish()
    }
}

/// Link from a type to its base type.
#[derive(Clone, Copy)]
pub struct Supertype {
    info: TypeInfoFn,
    project: fn(&mut dyn Any) -> Option<&mut dyn Any>,
    upcast: fn(DynValue) -> Option<DynValue>,
}

impl Supertype {
    pub fn new(
        info: TypeInfoFn,
        project: fn(&mut dyn Any) -> Option<&mut dyn Any>,
        upcast: fn(DynValue) -> Option<DynValue>,
    ) -> Self {
        Self {
            info,
            project,
            upcast,
        }
    }

    pub fn info(&self) -> &'static TypeInfo {
        (self.info)()
    }
}

/// A named, typed slot declared by a type: the AttributeDescriptor.
///
/// Identity is the pair (declaring type, name), so same-named attributes at
/// different levels of a chain are distinct.
pub struct AttributeInfo {
    name: &'static str,
    declaring: TypeId,
    declaring_name: &'static str,
    value_type: TypeInfoFn,
    nullable: bool,
    setter: Setter,
}

impl AttributeInfo {
    pub fn new(name: &'static str, value_type: TypeInfoFn, nullable: bool, setter: Setter) -> Self {
        Self {
            name,
            declaring: TypeId::of::<()>(),
            declaring_name: "",
            value_type,
            nullable,
            setter,
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn declaring_name(&self) -> &'static str {
        self.declaring_name
    }

    pub fn value_type(&self) -> &'static TypeInfo {
        (self.value_type)()
    }

    /// Declared type as written on the field, e.g. `Option<String>`
    pub fn type_label(&self) -> String {
        if self.nullable {
            format!("Option<{}>", self.value_type().name)
        } else {
            self.value_type().name.to_string()
        }
    }

    /// Whether the attribute can hold absence (an `Option` field)
    pub fn is_nullable(&self) -> bool {
        self.nullable
    }

    /// Compatibility rule shared by mapping resolution and entry construction.
    ///
    /// A nullable attribute takes absence or any value whose type is the
    /// declared type or a subtype of it. A non-nullable attribute never takes a
    /// candidate that may be absent; a non-nullable scalar attribute also
    /// requires its exact type.
    pub fn accepts(&self, candidate: &Candidate) -> bool {
        if candidate.may_be_absent && !self.nullable {
            return false;
        }
        candidate
            .value_type
            .is_none_or(|value_type| value_type.fits(self.value_type(), self.nullable))
    }
}

impl PartialEq for AttributeInfo {
    fn eq(&self, other: &Self) -> bool {
        self.declaring == other.declaring && self.name == other.name
    }
}

impl Eq for AttributeInfo {}

impl Hash for AttributeInfo {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.declaring.hash(state);
        self.name.hash(state);
    }
}

impl fmt::Debug for AttributeInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}::{}: {}",
            self.declaring_name,
            self.name,
            self.type_label()
        )
    }
}

/// What a mapping request offers an attribute: the type of the fixed value or
/// generator (`None` for a fixed absent value) and whether it may be absent.
#[derive(Clone, Copy, Debug)]
pub struct Candidate {
    value_type: Option<&'static TypeInfo>,
    may_be_absent: bool,
}

impl Candidate {
    pub fn absent() -> Self {
        Self {
            value_type: None,
            may_be_absent: true,
        }
    }

    pub fn value(value: &dyn Reflect) -> Self {
        Self {
            value_type: Some(value.type_info()),
            may_be_absent: false,
        }
    }

    pub fn generator(value_type: &'static TypeInfo, may_be_absent: bool) -> Self {
        Self {
            value_type: Some(value_type),
            may_be_absent,
        }
    }

    pub fn value_type(&self) -> Option<&'static TypeInfo> {
        self.value_type
    }

    pub fn may_be_absent(&self) -> bool {
        self.may_be_absent
    }
}

impl fmt::Display for Candidate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.value_type {
            Some(value_type) => f.write_str(value_type.name),
            None => f.write_str("absent"),
        }
    }
}

/// A declared initializer parameter.
#[derive(Clone, Copy)]
pub struct Param {
    value_type: TypeInfoFn,
    nullable: bool,
}

impl Param {
    pub fn new(value_type: TypeInfoFn, nullable: bool) -> Self {
        Self {
            value_type,
            nullable,
        }
    }

    pub fn value_type(&self) -> &'static TypeInfo {
        (self.value_type)()
    }

    pub fn is_nullable(&self) -> bool {
        self.nullable
    }

    /// Absent arguments only fit nullable parameters. Present ones may be
    /// subtypes of the declared type, except for required scalars.
    pub fn accepts(&self, argument: Option<&DynValue>) -> bool {
        match argument {
            None => self.nullable,
            Some(value) => value.type_info().fits(self.value_type(), self.nullable),
        }
    }
}

impl fmt::Debug for Param {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.nullable {
            write!(f, "Option<{}>", self.value_type().name)
        } else {
            f.write_str(self.value_type().name)
        }
    }
}

/// A callable producing a new instance: the Initializer.
pub struct Initializer {
    name: &'static str,
    params: Vec<Param>,
    invoke: Invoker,
}

impl Initializer {
    pub fn new(name: &'static str, params: Vec<Param>, invoke: Invoker) -> Self {
        Self {
            name,
            params,
            invoke,
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn params(&self) -> &[Param] {
        &self.params
    }

    /// Same arity and every positional argument fits its parameter
    pub fn matches(&self, arguments: &[Option<DynValue>]) -> bool {
        self.params.len() == arguments.len()
            && self
                .params
                .iter()
                .zip(arguments)
                .all(|(param, argument)| param.accepts(argument.as_ref()))
    }

    pub fn invoke(&self, arguments: Vec<Option<DynValue>>) -> FixtureResult<DynValue> {
        (self.invoke)(arguments)
    }

    /// Signature for diagnostics, e.g. `with_name(String)`
    pub fn signature(&self) -> String {
        let params: Vec<String> = self.params.iter().map(|param| format!("{:?}", param)).collect();
        format!("{}({})", self.name, params.join(", "))
    }
}

impl fmt::Debug for Initializer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.signature())
    }
}

/// Describe a possibly absent argument for diagnostics
pub fn describe(value: Option<&DynValue>) -> String {
    match value {
        Some(value) => format!("{}({:?})", value.type_info().name, value),
        None => "absent".to_string(),
    }
}

/// Walk `value` up its chain until it is of type `T`, then unbox it.
pub fn into_typed<T: Typed>(value: DynValue) -> FixtureResult<T> {
    let expected = T::static_type_info();
    let found = value.type_info().name;
    let mismatch = || FixtureError::TypeMismatch {
        expected: expected.name.to_string(),
        found: found.to_string(),
    };

    let mut value = value;
    while value.type_info().type_id != expected.type_id {
        let supertype = value.type_info().supertype().copied().ok_or_else(mismatch)?;
        value = (supertype.upcast)(value).ok_or_else(mismatch)?;
    }

    value
        .into_any()
        .downcast::<T>()
        .map(|boxed| *boxed)
        .map_err(|_| mismatch())
}

/// Extract an argument or attribute value for a non-nullable slot
pub fn take_required<T: Typed>(value: Option<DynValue>) -> FixtureResult<T> {
    match value {
        Some(value) => into_typed(value),
        None => Err(FixtureError::TypeMismatch {
            expected: T::static_type_info().name.to_string(),
            found: "absent".to_string(),
        }),
    }
}

/// Extract an argument or attribute value for a nullable slot
pub fn take_nullable<T: Typed>(value: Option<DynValue>) -> FixtureResult<Option<T>> {
    value.map(into_typed).transpose()
}

/// Take the next positional argument inside an initializer invoker
pub fn next_argument(
    arguments: &mut impl Iterator<Item = Option<DynValue>>,
) -> FixtureResult<Option<DynValue>> {
    arguments.next().ok_or_else(|| {
        FixtureError::generation_failed("initializer invoked with too few arguments")
    })
}

/// Downcast the instance handed to a setter
pub fn downcast_target<T: Typed>(target: &mut dyn Any) -> FixtureResult<&mut T> {
    target
        .downcast_mut::<T>()
        .ok_or_else(|| FixtureError::TypeMismatch {
            expected: T::static_type_info().name.to_string(),
            found: "an instance of another type".to_string(),
        })
}

macro_rules! impl_typed_value {
    (scalar: $($t:ty => $name:expr),* $(,)?) => {
        $(
            impl Typed for $t {
                fn static_type_info() -> &'static TypeInfo {
                    static INFO: OnceLock<TypeInfo> = OnceLock::new();
                    INFO.get_or_init(|| TypeInfo::of::<$t>($name).scalar())
                }
            }
        )*
    };
    ($($t:ty => $name:expr),* $(,)?) => {
        $(
            impl Typed for $t {
                fn static_type_info() -> &'static TypeInfo {
                    static INFO: OnceLock<TypeInfo> = OnceLock::new();
                    INFO.get_or_init(|| TypeInfo::of::<$t>($name))
                }
            }
        )*
    };
}

impl_typed_value!(
    scalar:
    bool => "bool",
    char => "char",
    i8 => "i8",
    i16 => "i16",
    i32 => "i32",
    i64 => "i64",
    i128 => "i128",
    isize => "isize",
    u8 => "u8",
    u16 => "u16",
    u32 => "u32",
    u64 => "u64",
    u128 => "u128",
    usize => "usize",
    f32 => "f32",
    f64 => "f64",
);

impl_typed_value!(
    String => "String",
    DateTime<Utc> => "DateTime<Utc>",
);

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    struct Base {
        label: Option<String>,
    }

    #[derive(Debug, Clone, PartialEq)]
    struct Derived {
        base: Base,
        count: i32,
    }

    fn set_label(target: &mut dyn Any, value: Option<DynValue>) -> FixtureResult<()> {
        downcast_target::<Base>(target)?.label = take_nullable(value)?;
        Ok(())
    }

    fn set_count(target: &mut dyn Any, value: Option<DynValue>) -> FixtureResult<()> {
        downcast_target::<Derived>(target)?.count = take_required(value)?;
        Ok(())
    }

    fn project(target: &mut dyn Any) -> Option<&mut dyn Any> {
        target
            .downcast_mut::<Derived>()
            .map(|derived| &mut derived.base as &mut dyn Any)
    }

    fn upcast(value: DynValue) -> Option<DynValue> {
        into_typed::<Derived>(value)
            .ok()
            .map(|derived| Box::new(derived.base) as DynValue)
    }

    impl Typed for Base {
        fn static_type_info() -> &'static TypeInfo {
            static INFO: OnceLock<TypeInfo> = OnceLock::new();
            INFO.get_or_init(|| {
                TypeInfo::of::<Base>("Base").with_attribute(AttributeInfo::new(
                    "label",
                    String::static_type_info,
                    true,
                    set_label,
                ))
            })
        }
    }

    impl Typed for Derived {
        fn static_type_info() -> &'static TypeInfo {
            static INFO: OnceLock<TypeInfo> = OnceLock::new();
            INFO.get_or_init(|| {
                TypeInfo::of::<Derived>("Derived")
                    .with_supertype(Supertype::new(Base::static_type_info, project, upcast))
                    .with_attribute(AttributeInfo::new(
                        "count",
                        i32::static_type_info,
                        false,
                        set_count,
                    ))
            })
        }
    }

    #[test]
    fn test_chain_and_subtyping() {
        let derived = Derived::static_type_info();
        let names: Vec<_> = derived.chain().map(TypeInfo::name).collect();
        assert_eq!(names, vec!["Derived", "Base"]);
        assert!(derived.is_a(Base::static_type_info()));
        assert!(!Base::static_type_info().is_a(derived));
    }

    #[test]
    fn test_assign_through_supertype() {
        let derived_info = Derived::static_type_info();
        let label = Base::static_type_info().declared_attribute("label").unwrap();
        let count = derived_info.declared_attribute("count").unwrap();

        let mut derived = Derived {
            base: Base { label: None },
            count: 0,
        };
        derived_info
            .assign(&mut derived, label, Some(Box::new("x".to_string())))
            .unwrap();
        derived_info
            .assign(&mut derived, count, Some(Box::new(7i32)))
            .unwrap();

        assert_eq!(derived.base.label.as_deref(), Some("x"));
        assert_eq!(derived.count, 7);
    }

    #[test]
    fn test_required_slot_rejects_absence() {
        let err = take_required::<i32>(None).unwrap_err();
        assert_eq!(
            err,
            FixtureError::TypeMismatch {
                expected: "i32".to_string(),
                found: "absent".to_string(),
            }
        );
    }

    #[test]
    fn test_into_typed_upcasts() {
        let value: DynValue = Box::new(Derived {
            base: Base {
                label: Some("up".to_string()),
            },
            count: 3,
        });
        let base: Base = into_typed(value).unwrap();
        assert_eq!(base.label.as_deref(), Some("up"));

        let wrong: DynValue = Box::new(5u8);
        assert!(into_typed::<Base>(wrong).is_err());
    }

    #[test]
    fn test_accepts_rule() {
        let label = Base::static_type_info().declared_attribute("label").unwrap();
        let count = Derived::static_type_info().declared_attribute("count").unwrap();

        assert!(label.accepts(&Candidate::absent()));
        assert!(label.accepts(&Candidate::value(&"x".to_string())));
        assert!(!label.accepts(&Candidate::value(&1i32)));

        assert!(count.accepts(&Candidate::value(&1i32)));
        assert!(!count.accepts(&Candidate::absent()));
        assert!(!count.accepts(&Candidate::value(&1i64)));
        assert!(!count.accepts(&Candidate::generator(i32::static_type_info(), true)));
        assert!(count.accepts(&Candidate::generator(i32::static_type_info(), false)));
    }

    #[test]
    fn test_param_accepts_subtypes() {
        let nullable = Param::new(Base::static_type_info, true);
        let required = Param::new(Base::static_type_info, false);
        let derived: DynValue = Box::new(Derived {
            base: Base { label: None },
            count: 0,
        });

        assert!(nullable.accepts(None));
        assert!(nullable.accepts(Some(&derived)));
        assert!(!required.accepts(None));
        assert!(required.accepts(Some(&derived)));
        assert!(!required.accepts(Some(&(Box::new(1i32) as DynValue))));
    }

    #[test]
    fn test_required_scalar_param_is_exact() {
        let required = Param::new(i64::static_type_info, false);
        assert!(required.accepts(Some(&(Box::new(1i64) as DynValue))));
        assert!(!required.accepts(Some(&(Box::new(1i32) as DynValue))));
        assert!(!required.accepts(None));
    }

    #[test]
    fn test_scalar_flag() {
        assert!(i32::static_type_info().is_scalar());
        assert!(f64::static_type_info().is_scalar());
        assert!(bool::static_type_info().is_scalar());
        assert!(!String::static_type_info().is_scalar());
        assert!(!Base::static_type_info().is_scalar());
    }

    #[test]
    fn test_required_non_scalar_attribute_accepts_subtypes() {
        let required = AttributeInfo::new("item", Base::static_type_info, false, set_label);
        let derived = Derived {
            base: Base { label: None },
            count: 0,
        };

        assert!(required.accepts(&Candidate::value(&derived)));
        assert!(required.accepts(&Candidate::generator(Derived::static_type_info(), false)));
        assert!(!required.accepts(&Candidate::generator(Derived::static_type_info(), true)));
        assert!(!required.accepts(&Candidate::absent()));
        assert!(!required.accepts(&Candidate::value(&"x".to_string())));
    }

    #[test]
    fn test_next_argument_reports_missing() {
        let mut arguments = vec![Some(Box::new(1i32) as DynValue)].into_iter();
        assert!(next_argument(&mut arguments).unwrap().is_some());
        assert!(matches!(
            next_argument(&mut arguments),
            Err(FixtureError::GenerationFailed { .. })
        ));
    }
}
