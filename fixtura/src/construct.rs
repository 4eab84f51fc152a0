//! Initializer resolution: choosing and invoking the one initializer of a type
//! that accepts a list of evaluated arguments.

use rand::RngCore;

use crate::error::{FixtureError, FixtureResult};
use crate::reflect::{DynValue, Initializer, TypeInfo, Typed, describe, into_typed};
use crate::value::ValueSource;

/// Evaluate constructor-argument slots left to right.
///
/// Generator slots are invoked now, so stateful generators advance once per
/// call.
pub fn evaluate_arguments(
    slots: &[ValueSource],
    rng: &mut dyn RngCore,
) -> FixtureResult<Vec<Option<DynValue>>> {
    slots.iter().map(|slot| slot.produce(rng)).collect()
}

/// Find the unique initializer of `target` that accepts `arguments`.
///
/// Matching is positional and by run-time type only. Two or more matches are
/// an error even when one is more specific than the other.
pub fn resolve_initializer<'a>(
    target: &'a TypeInfo,
    arguments: &[Option<DynValue>],
) -> FixtureResult<&'a Initializer> {
    let matches: Vec<&Initializer> = target
        .initializers()
        .iter()
        .filter(|initializer| initializer.matches(arguments))
        .collect();

    tracing::trace!(
        "{} of {} initializers of {} match {} arguments",
        matches.len(),
        target.initializers().len(),
        target.name(),
        arguments.len()
    );

    match matches.as_slice() {
        [initializer] => Ok(*initializer),
        [] => Err(FixtureError::NoMatchingInitializer {
            target: target.name().to_string(),
            arguments: describe_all(arguments),
        }),
        candidates => Err(FixtureError::AmbiguousInitializer {
            target: target.name().to_string(),
            arguments: describe_all(arguments),
            candidates: candidates
                .iter()
                .map(|initializer| initializer.signature())
                .collect(),
        }),
    }
}

/// Resolve and invoke an initializer of `T`
pub fn new_instance<T: Typed>(arguments: Vec<Option<DynValue>>) -> FixtureResult<T> {
    let initializer = resolve_initializer(T::static_type_info(), &arguments)?;
    into_typed(initializer.invoke(arguments)?)
}

fn describe_all(arguments: &[Option<DynValue>]) -> Vec<String> {
    arguments
        .iter()
        .map(|argument| describe(argument.as_ref()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reflect::{Param, take_nullable, take_required};
    use crate::rng::create_seeded_rng;
    use std::sync::OnceLock;

    #[derive(Debug, Clone, PartialEq)]
    struct Ticket {
        label: Option<String>,
        seat: i32,
    }

    fn from_label(mut arguments: Vec<Option<DynValue>>) -> FixtureResult<DynValue> {
        let label = take_nullable::<String>(arguments.remove(0))?;
        Ok(Box::new(Ticket { label, seat: 0 }))
    }

    fn from_seat(mut arguments: Vec<Option<DynValue>>) -> FixtureResult<DynValue> {
        let seat = take_required::<i32>(arguments.remove(0))?;
        Ok(Box::new(Ticket { label: None, seat }))
    }

    fn from_boxed_seat(mut arguments: Vec<Option<DynValue>>) -> FixtureResult<DynValue> {
        let seat = take_nullable::<i32>(arguments.remove(0))?.unwrap_or(-1);
        Ok(Box::new(Ticket { label: None, seat }))
    }

    fn empty(_: Vec<Option<DynValue>>) -> FixtureResult<DynValue> {
        Ok(Box::new(Ticket {
            label: None,
            seat: 0,
        }))
    }

    impl Typed for Ticket {
        fn static_type_info() -> &'static TypeInfo {
            static INFO: OnceLock<TypeInfo> = OnceLock::new();
            INFO.get_or_init(|| {
                TypeInfo::of::<Ticket>("Ticket")
                    .with_initializer(Initializer::new("empty", vec![], empty))
                    .with_initializer(Initializer::new(
                        "from_label",
                        vec![Param::new(String::static_type_info, true)],
                        from_label,
                    ))
                    .with_initializer(Initializer::new(
                        "from_seat",
                        vec![Param::new(i32::static_type_info, false)],
                        from_seat,
                    ))
                    .with_initializer(Initializer::new(
                        "from_boxed_seat",
                        vec![Param::new(i32::static_type_info, true)],
                        from_boxed_seat,
                    ))
            })
        }
    }

    #[test]
    fn test_unique_match_is_invoked() {
        let ticket: Ticket = new_instance(vec![]).unwrap();
        assert_eq!(ticket.seat, 0);

        let ticket: Ticket =
            new_instance(vec![Some(Box::new("a1".to_string()) as DynValue)]).unwrap();
        assert_eq!(ticket.label.as_deref(), Some("a1"));
    }

    #[test]
    fn test_resolution_is_deterministic() {
        let arguments = vec![Some(Box::new("x".to_string()) as DynValue)];
        for _ in 0..10 {
            let initializer = resolve_initializer(Ticket::static_type_info(), &arguments).unwrap();
            assert_eq!(initializer.name(), "from_label");
        }
    }

    #[test]
    fn test_present_scalar_is_ambiguous() {
        let err = new_instance::<Ticket>(vec![Some(Box::new(5i32) as DynValue)]).unwrap_err();
        match err {
            FixtureError::AmbiguousInitializer { candidates, .. } => {
                assert_eq!(
                    candidates,
                    vec![
                        "from_seat(i32)".to_string(),
                        "from_boxed_seat(Option<i32>)".to_string()
                    ]
                );
            }
            other => panic!("expected ambiguity, got {:?}", other),
        }
    }

    #[test]
    fn test_absent_argument_is_ambiguous_across_nullable_params() {
        let err = new_instance::<Ticket>(vec![None]).unwrap_err();
        assert!(matches!(err, FixtureError::AmbiguousInitializer { .. }));
        assert!(err.to_string().contains("[absent]"));
    }

    #[test]
    fn test_no_match() {
        let err = new_instance::<Ticket>(vec![Some(Box::new(1.5f64) as DynValue)]).unwrap_err();
        assert_eq!(
            err,
            FixtureError::NoMatchingInitializer {
                target: "Ticket".to_string(),
                arguments: vec!["f64(1.5)".to_string()],
            }
        );

        let err = new_instance::<Ticket>(vec![None, None]).unwrap_err();
        assert!(matches!(err, FixtureError::NoMatchingInitializer { .. }));
    }

    #[test]
    fn test_evaluate_arguments_in_order() {
        let slots = vec![ValueSource::value(1i32), ValueSource::absent()];
        let evaluated = evaluate_arguments(&slots, &mut create_seeded_rng(0)).unwrap();
        assert_eq!(evaluated.len(), 2);
        assert_eq!(
            evaluated[0].as_ref().and_then(|v| v.as_any().downcast_ref::<i32>()),
            Some(&1)
        );
        assert!(evaluated[1].is_none());
    }
}
