//! Error types for configuring and running fixture generators.

use crate::config::ConfigError;

/// Everything that can go wrong while configuring or invoking a generator.
///
/// Mapping failures surface at configuration time (the builder or
/// [`AttributeMapping`](crate::AttributeMapping) call that triggered them);
/// initializer failures surface from the `generate_value` call.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum FixtureError {
    /// No attribute with the requested name accepts the candidate anywhere in
    /// the target's chain
    #[error(
        "could not find an attribute named '{attribute}' that accepts '{candidate}' on '{target}' or any of its supertypes"
    )]
    AttributeNotFound {
        attribute: String,
        candidate: String,
        target: String,
    },

    /// Every same-named attribute in the chain is already mapped
    #[error(
        "the '{attribute}' attribute that accepts '{candidate}' has already been mapped as many times as possible"
    )]
    AttributeExhausted { attribute: String, candidate: String },

    /// A mapping entry was built with a value or generator its attribute cannot hold
    #[error("cannot map '{candidate}' onto '{declaring}::{attribute}' of type '{expected}'")]
    IncompatibleMapping {
        attribute: String,
        declaring: String,
        expected: String,
        candidate: String,
    },

    /// No declared initializer accepts the evaluated arguments
    #[error("no initializer of '{target}' accepts the arguments [{}]", .arguments.join(", "))]
    NoMatchingInitializer {
        target: String,
        arguments: Vec<String>,
    },

    /// More than one declared initializer accepts the evaluated arguments
    #[error(
        "initializer of '{target}' is ambiguous for the arguments [{}]: {}",
        .arguments.join(", "),
        .candidates.join(", ")
    )]
    AmbiguousInitializer {
        target: String,
        arguments: Vec<String>,
        candidates: Vec<String>,
    },

    /// A parent generator or merged mapping targets an unrelated type
    #[error("'{child}' is not '{parent}' or a subtype of it")]
    NotASubtype { child: String, parent: String },

    /// A setter or initializer received a value of the wrong type
    #[error("expected a value of type '{expected}', found '{found}'")]
    TypeMismatch { expected: String, found: String },

    /// Registry lookup miss
    #[error("no generator named '{name}' is registered for '{target}'")]
    GeneratorNotFound { target: String, name: String },

    /// A value generator could not produce a value
    #[error("generation failed: {message}")]
    GenerationFailed { message: String },

    /// Invalid generator configuration
    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Result alias used throughout the crate
pub type FixtureResult<T> = Result<T, FixtureError>;

impl FixtureError {
    /// Create a generation failed error
    pub fn generation_failed(message: impl Into<String>) -> Self {
        Self::GenerationFailed {
            message: message.into(),
        }
    }

    /// Whether this error is raised while configuring, rather than running, a generator
    pub fn is_configuration_error(&self) -> bool {
        matches!(
            self,
            Self::AttributeNotFound { .. }
                | Self::AttributeExhausted { .. }
                | Self::IncompatibleMapping { .. }
                | Self::NotASubtype { .. }
                | Self::GeneratorNotFound { .. }
                | Self::Config(_)
        )
    }
}
