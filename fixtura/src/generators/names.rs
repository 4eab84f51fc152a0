//! Person-name generators over word lists compiled into the crate.

use rand::RngCore;

use crate::config::ConfigError;
use crate::error::FixtureResult;
use crate::generators::SetGenerator;
use crate::value::ValueGenerator;

const FIRST_NAMES: &str = include_str!("../../data/first-names.txt");
const LAST_NAMES: &str = include_str!("../../data/last-names.txt");

fn words(list: &str) -> impl Iterator<Item = String> + '_ {
    list.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
}

macro_rules! name_generator {
    ($(#[$meta:meta])* $name:ident, $list:expr) => {
        $(#[$meta])*
        #[derive(Debug)]
        pub struct $name {
            inner: SetGenerator<String>,
        }

        impl $name {
            pub fn new(unique_selections: bool) -> Result<Self, ConfigError> {
                Ok(Self {
                    inner: SetGenerator::new(words($list), unique_selections)?,
                })
            }

            /// Number of distinct names available
            pub fn len(&self) -> usize {
                self.inner.len()
            }

            pub fn is_empty(&self) -> bool {
                self.inner.is_empty()
            }
        }

        impl ValueGenerator<String> for $name {
            fn generate_value(&self, rng: &mut dyn RngCore) -> FixtureResult<Option<String>> {
                self.inner.generate_value(rng)
            }

            fn can_generate_absent(&self) -> bool {
                false
            }
        }
    };
}

name_generator!(
    /// Random first names
    FirstNameGenerator,
    FIRST_NAMES
);

name_generator!(
    /// Random last names
    LastNameGenerator,
    LAST_NAMES
);
