//! Converter ordering, chaining and binding lookup through the public API.

use cmdgraph::error::{
    ArgumentError, ArgumentParseError, NonnumericalInput, OverRange, SetupError, UsageError,
};
use cmdgraph::provider::bind_primitives;
use cmdgraph::{
    provider_fn, BindingRegistry, Command, CommandCallable, CommandError, ExceptionContext,
    ExceptionConverter, HandlerTable, Key, Namespace, Param, ParametricBuilder, Range,
};

/// Marks the string that names a planet's moon.
struct Moon;

fn registry() -> BindingRegistry {
    let mut registry = BindingRegistry::new();
    bind_primitives(&mut registry).unwrap();
    registry
}

fn settemp(builder: ParametricBuilder) -> impl CommandCallable {
    builder
        .build(Command::new(["settemp"]).handler(
            (Param::<String>::new("name"), Param::<f64>::new("temp")),
            |_: &mut Namespace, _: (String, f64)| Ok(()),
        ))
        .unwrap()
}

fn message(err: CommandError) -> String {
    match err {
        CommandError::Usage(UsageError::Invalid(usage)) => usage.message,
        other => panic!("unexpected {:?}", other),
    }
}

fn general() -> HandlerTable {
    HandlerTable::builder()
        .on::<ArgumentError>(|_, ctx| ctx.invalid_usage("general", None))
        .build()
}

#[test]
fn test_specific_handler_wins_in_either_order() {
    let general_first = HandlerTable::builder()
        .on::<ArgumentError>(|_, ctx| ctx.invalid_usage("general", None))
        .on::<NonnumericalInput>(|e, ctx| ctx.invalid_usage(format!("specific {}", e.input), None))
        .build();
    let specific_first = HandlerTable::builder()
        .on::<NonnumericalInput>(|e, ctx| ctx.invalid_usage(format!("specific {}", e.input), None))
        .on::<ArgumentError>(|_, ctx| ctx.invalid_usage("general", None))
        .build();

    for table in [general_first, specific_first] {
        let command = settemp(ParametricBuilder::new(registry()).add_converter(table));
        let err = command
            .call("mercury hot", &mut Namespace::new(), &["settemp".into()])
            .unwrap_err();
        assert_eq!(message(err), "specific hot");

        // Other argument failures still reach the general handler.
        let err = command
            .call("mercury", &mut Namespace::new(), &["settemp".into()])
            .unwrap_err();
        assert_eq!(message(err), "general");
    }
}

#[test]
fn test_custom_converter_runs_before_default() {
    let command = settemp(ParametricBuilder::new(registry()).add_converter(general()));
    let err = command
        .call("mercury 1 2", &mut Namespace::new(), &[])
        .unwrap_err();
    assert_eq!(message(err), "general");
}

#[test]
fn test_unhandled_failure_falls_through_to_default() {
    let table = HandlerTable::builder()
        .on::<NonnumericalInput>(|_, ctx| ctx.invalid_usage("not a number", None))
        .build();
    let command = settemp(ParametricBuilder::new(registry()).add_converter(table));
    let err = command
        .call("mercury 1 2", &mut Namespace::new(), &[])
        .unwrap_err();
    assert_eq!(message(err), "Too many arguments! Unused arguments: 2");
}

/// Handlers for the value a provider rejected.
fn parse_messages() -> HandlerTable {
    HandlerTable::builder()
        .on::<OverRange>(|e, ctx| ctx.invalid_usage(format!("at most {}", e.maximum), None))
        .on::<NonnumericalInput>(|e, ctx| ctx.invalid_usage(format!("'{}' is no number", e.input), None))
        .build()
}

#[test]
fn test_parse_failures_delegate_to_inner_table() {
    let inner = parse_messages();
    let outer = HandlerTable::builder()
        .on::<ArgumentError>(|_, ctx| ctx.invalid_usage("general", None))
        .try_on::<ArgumentParseError>(move |e, ctx| {
            inner.convert(&ArgumentError::from(e.clone()).into(), ctx)
        })
        .build();

    let command = ParametricBuilder::new(registry())
        .add_converter(outer)
        .build(Command::new(["settemp"]).handler(
            Param::<f64>::new("temp").modifier(Range::at_most(500.0)),
            |_: &mut Namespace, _: f64| Ok(()),
        ))
        .unwrap();

    let run = |line: &str| message(command.call(line, &mut Namespace::new(), &[]).unwrap_err());
    assert_eq!(run("hot"), "'hot' is no number");
    assert_eq!(run("900"), "at most 500");
    assert_eq!(run(""), "general");
}

#[test]
fn test_cause_converted_by_second_converter() {
    let command = settemp(ParametricBuilder::new(registry()));
    let err = command
        .call("mercury hot", &mut Namespace::new(), &["settemp".into()])
        .unwrap_err();
    assert_eq!(err.to_string(), "For parameter 'temp': Expected 'hot' to be a number");

    let cause = err.cause().unwrap();
    let context = ExceptionContext::new(command.description().clone(), vec!["settemp".to_string()])
        .with_parameter(cause.parameter().cloned());
    let localized = parse_messages().convert(cause, &context).unwrap();
    assert_eq!(message(localized), "'hot' is no number");
}

#[test]
fn test_classified_binding_is_separate_slot() {
    let mut registry = registry();
    registry
        .bind_classified::<String, Moon, _>(provider_fn(|args, _| {
            let name = args.next()?;
            Ok(format!("moon of {}", name))
        }))
        .unwrap();

    assert!(registry.lookup(&Key::of::<String>()).is_some());
    assert!(registry.lookup(&Key::of::<String>().classified::<Moon>()).is_some());
    assert!(registry.lookup(&Key::of::<i64>().classified::<Moon>()).is_none());

    let err = registry
        .bind_classified::<String, Moon, _>(provider_fn(|args, _| Ok(args.next()?.to_string())))
        .unwrap_err();
    assert!(matches!(err, SetupError::DuplicateBinding { .. }));

    let seen = std::sync::Arc::new(std::sync::Mutex::new(Vec::new()));
    let command = ParametricBuilder::new(registry)
        .build(Command::new(["moon"]).handler(
            (
                Param::<String>::new("planet"),
                Param::<String>::new("moon").classified::<Moon>(),
            ),
            {
                let seen = seen.clone();
                move |_: &mut Namespace, pair: (String, String)| {
                    seen.lock().unwrap().push(pair);
                    Ok(())
                }
            },
        ))
        .unwrap();

    command.call("earth earth", &mut Namespace::new(), &[]).unwrap();
    assert_eq!(
        seen.lock().unwrap()[0],
        ("earth".to_string(), "moon of earth".to_string())
    );
}
