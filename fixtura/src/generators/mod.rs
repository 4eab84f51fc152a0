//! Ready-made value generators for scalars, dates, names and fixed collections.

pub mod boolean;
pub mod collection;
pub mod date;
pub mod names;
pub mod numeric;
pub mod text;

pub use boolean::BooleanGenerator;
pub use collection::{EnumGenerator, ListGenerator, SetGenerator};
pub use date::DateGenerator;
pub use names::{FirstNameGenerator, LastNameGenerator};
pub use numeric::{FloatGenerator, IntegerGenerator};
pub use text::{CharGenerator, StringGenerator, default_allowable_chars};
