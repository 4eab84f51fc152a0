//! Derive macro for the fixtura fixture-generation library
//!
//! This crate provides `#[derive(Fixture)]`, which writes the introspection
//! table (`fixtura::Typed`) a type needs before object generators can build it.

use proc_macro::TokenStream;

mod derive;

/// Derive macro for implementing `Typed` (and `Enumerable` for enums)
///
/// Applied to a struct with named fields, every field becomes an attribute
/// that mappings can target. An `Option<T>` field is a nullable attribute of
/// value type `T`; any other field is a non-nullable attribute of its own type.
///
/// # Basic Usage
///
/// ```rust
/// use fixtura::Fixture;
///
/// #[derive(Debug, Clone, Fixture)]
/// #[fixture(init(Self::new, String))]
/// struct User {
///     name: String,
///     email: Option<String>,
///     age: i32,
/// }
///
/// impl User {
///     fn new(name: String) -> Self {
///         Self { name, email: None, age: 0 }
///     }
/// }
/// ```
///
/// # Supported Attributes
///
/// - `#[fixture(init(path, Type, ...))]` on the type: declares an initializer
///   callable as `path(args...)` with the listed parameter types. Repeat it to
///   declare several initializers; use `Option<T>` for a parameter that may be
///   absent.
/// - `#[fixture(base)]` on one field: the field's type becomes the supertype,
///   so attributes declared by the base can be mapped on this type.
/// - `#[fixture(skip)]` on a field: the field is not exposed as an attribute.
///
/// # Enums
///
/// Fieldless enums get `Typed` plus `Enumerable`, which lists the variants in
/// declaration order:
///
/// ```rust
/// use fixtura::Fixture;
///
/// #[derive(Debug, Clone, Fixture)]
/// enum Status {
///     Active,
///     Inactive,
/// }
/// ```
///
/// Generic types, tuple structs, unions and enums with data are rejected.
#[proc_macro_derive(Fixture, attributes(fixture))]
pub fn derive_fixture(input: TokenStream) -> TokenStream {
    derive::derive_fixture_impl(input)
}
