#![allow(clippy::result_large_err)]

//! # Fixtura - Declarative Test Fixtures for Rust
//!
//! Fixtura builds test objects the way a test author describes them: pick an
//! initializer by the arguments you supply, then override the attributes that
//! matter for the test with fixed values, absent values or value generators.
//! Generators can inherit the mapping of a parent generator, and can be
//! registered by type and name for reuse across a test suite.
//!
//! ## Quick Start
//!
//! ```rust
//! use fixtura::{Fixture, IntegerGenerator, create_object_generator};
//!
//! #[derive(Debug, Clone, Fixture)]
//! #[fixture(init(Self::new, String))]
//! struct Person {
//!     name: String,
//!     nickname: Option<String>,
//!     age: i32,
//! }
//!
//! impl Person {
//!     fn new(name: String) -> Self {
//!         Self { name, nickname: None, age: 0 }
//!     }
//! }
//!
//! # fn main() -> fixtura::FixtureResult<()> {
//! let adults = create_object_generator::<Person>()
//!     .constructor_arg("Ada".to_string())
//!     .map_absent("nickname")?
//!     .map_generator("age", IntegerGenerator::new(18i32, 99)?)?
//!     .build()?;
//!
//! let person = adults.generate()?.expect("absence chance is zero");
//! assert_eq!(person.name, "Ada");
//! assert!((18..=99).contains(&person.age));
//! # Ok(())
//! # }
//! ```

extern crate self as fixtura;

// Public modules
pub mod builder;
pub mod config;
pub mod construct;
pub mod error;
pub mod generators;
pub mod mapping;
pub mod object;
pub mod reflect;
pub mod registry;
pub mod rng;
pub mod sampler;
pub mod value;

// Re-export the main public API
pub use builder::{ObjectGeneratorBuilder, create_object_generator};
pub use config::{
    Chance, ConfigError, GlobalConfig, get_global_config, reset_global_config, set_global_config,
};
pub use error::{FixtureError, FixtureResult};
pub use generators::*;
pub use mapping::{AttributeMapping, MappingEntry};
pub use object::{ObjectGenerator, ParentGenerator};
pub use reflect::{
    AttributeInfo, Candidate, DynValue, Enumerable, Initializer, Param, Reflect, Supertype,
    TypeInfo, Typed,
};
pub use registry::{GeneratorRegistry, clear_registry, generate, generate_default, lookup, register};
pub use rng::{DefaultRngProvider, RngProvider, create_rng, create_seeded_rng};
pub use value::{ErasedGenerator, ValueGenerator, ValueSource};

// Re-export derive macro from separate crate when derive feature is enabled
#[cfg(feature = "derive")]
pub use fixtura_derive::Fixture;
