//! Parameter resolution.
//!
//! Commands declare typed parameters ([`Param`]) and a handler ([`Command`]).
//! The [`ParametricBuilder`] checks the declaration against the binding
//! registry once and produces a [`ParametricCallable`]. Each call then:
//!
//! 1. checks authorization,
//! 2. pulls declared flags out of the tokens,
//! 3. resolves parameters in declaration order,
//! 4. rejects leftover tokens,
//! 5. runs the handler,
//!
//! and routes any failure through the exception converters.

mod builder;
mod callable;
mod command;
mod param;

pub use builder::ParametricBuilder;
pub use callable::ParametricCallable;
pub use command::{Command, CommandDef};
pub use param::{Param, ParamRole, ParamSpec, ParameterInfo, Params};

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use super::*;
    use crate::callable::CommandCallable;
    use crate::error::{ArgumentError, CommandError, SetupError, UsageError};
    use crate::modifier::Range;
    use crate::namespace::Namespace;
    use crate::provider::{bind_primitives, NamespaceProvider};
    use crate::BindingRegistry;

    #[derive(Clone, Debug, PartialEq)]
    struct Subject(String);

    fn builder() -> ParametricBuilder {
        let mut registry = BindingRegistry::new();
        bind_primitives(&mut registry).unwrap();
        registry.bind(NamespaceProvider::<Subject>::new()).unwrap();
        ParametricBuilder::new(registry).without_default_converter()
    }

    type Seen<T> = Arc<Mutex<Vec<T>>>;

    fn record<T: Send + 'static>(
        seen: &Seen<T>,
    ) -> impl Fn(&mut Namespace, T) -> Result<(), CommandError> + Send + Sync + 'static {
        let seen = seen.clone();
        move |_: &mut Namespace, value: T| {
            seen.lock().unwrap().push(value);
            Ok(())
        }
    }

    #[test]
    fn test_default_and_empty_text() {
        let seen: Seen<(String, i32, String)> = Arc::default();
        let command = builder()
            .build(Command::new(["set"]).handler(
                (
                    Param::<String>::new("a"),
                    Param::<i32>::new("b").optional().default_value("5"),
                    Param::<String>::new("c").text(),
                ),
                {
                    let seen = seen.clone();
                    move |_: &mut Namespace, (a, b, c): (String, Option<i32>, String)| {
                        seen.lock().unwrap().push((a, b.unwrap_or_default(), c));
                        Ok(())
                    }
                },
            ))
            .unwrap();

        command.call("x", &mut Namespace::new(), &[]).unwrap();
        assert_eq!(
            seen.lock().unwrap()[0],
            ("x".to_string(), 5, String::new())
        );
    }

    #[test]
    fn test_unused_arguments() {
        let seen: Seen<(String, String)> = Arc::default();
        let command = builder()
            .build(Command::new(["pair"]).handler(
                (Param::<String>::new("a"), Param::<String>::new("b")),
                record(&seen),
            ))
            .unwrap();

        let err = command.call("x y z", &mut Namespace::new(), &[]).unwrap_err();
        match err {
            CommandError::Argument(ArgumentError::Unused(unused)) => {
                assert_eq!(unused.unconsumed, vec!["z"]);
            }
            other => panic!("unexpected {:?}", other),
        }
        assert!(seen.lock().unwrap().is_empty());
    }

    #[test]
    fn test_missing_argument_names_parameter() {
        let command = builder()
            .build(Command::new(["settype"]).handler(
                (Param::<String>::new("name"), Param::<String>::new("type")),
                |_: &mut Namespace, _: (String, String)| Ok(()),
            ))
            .unwrap();

        let err = command.call("pluto", &mut Namespace::new(), &[]).unwrap_err();
        assert_eq!(err.parameter().map(|p| p.name.as_str()), Some("type"));
    }

    #[test]
    fn test_flags_and_text() {
        let seen: Seen<(bool, Option<u32>, String)> = Arc::default();
        let command = builder()
            .build(Command::new(["note"]).handler(
                (
                    Param::switch('f', "force"),
                    Param::<u32>::new("radius").flag('r').optional(),
                    Param::<String>::new("text").text(),
                ),
                record(&seen),
            ))
            .unwrap();

        let mut namespace = Namespace::new();
        command
            .call("closest -r 12 to the -f sun", &mut namespace, &[])
            .unwrap();
        command.call("hello", &mut namespace, &[]).unwrap();

        let seen = seen.lock().unwrap();
        assert_eq!(seen[0], (true, Some(12), "closest to the sun".to_string()));
        assert_eq!(seen[1], (false, None, "hello".to_string()));
    }

    #[test]
    fn test_default_tokens_must_all_be_consumed() {
        let command = builder()
            .build(Command::new(["orbit"]).handler(
                Param::<i32>::new("days").optional().default_value("365 12"),
                |_: &mut Namespace, _: Option<i32>| Ok(()),
            ))
            .unwrap();

        command.call("88", &mut Namespace::new(), &[]).unwrap();
        match command.call("", &mut Namespace::new(), &[]).unwrap_err() {
            CommandError::Argument(ArgumentError::Unused(unused)) => {
                assert_eq!(unused.unconsumed, vec!["12"]);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_provided_parameter_consumes_nothing() {
        let seen: Seen<(Subject, String)> = Arc::default();
        let command = builder()
            .build(Command::new(["whoami"]).handler(
                (Param::<Subject>::new("subject"), Param::<String>::new("name")),
                record(&seen),
            ))
            .unwrap();
        assert_eq!(command.description().usage, "<name>");

        let mut namespace = Namespace::new();
        let err = command.call("pluto", &mut namespace, &[]).unwrap_err();
        assert!(matches!(err, CommandError::Provision(_)));

        namespace.insert(Subject("ada".into()));
        command.call("pluto", &mut namespace, &[]).unwrap();
        assert_eq!(
            seen.lock().unwrap()[0],
            (Subject("ada".into()), "pluto".to_string())
        );
    }

    #[test]
    fn test_range_modifier_and_parameter_attachment() {
        let command = builder()
            .build(Command::new(["settemp"]).handler(
                Param::<f64>::new("temp").modifier(Range::new(-273.15, 10_000.0)),
                |_: &mut Namespace, _: f64| Ok(()),
            ))
            .unwrap();

        let err = command.call("-300", &mut Namespace::new(), &[]).unwrap_err();
        assert_eq!(err.kind(), crate::FailureKind::UnderRange);
        assert_eq!(err.parameter().map(|p| p.name.as_str()), Some("temp"));
    }

    #[test]
    fn test_usage_string() {
        let command = builder()
            .build(Command::new(["info"]).handler(
                (
                    Param::<String>::new("name"),
                    Param::<i32>::new("count").optional(),
                    Param::switch('f', "fahrenheit"),
                    Param::<u32>::new("radius").flag('r').optional(),
                    Param::<String>::new("note").text(),
                ),
                |_: &mut Namespace, _: (String, Option<i32>, bool, Option<u32>, String)| Ok(()),
            ))
            .unwrap();
        assert_eq!(
            command.description().usage,
            "<name> [count] [-f] [-r <radius>] <note...>"
        );
        assert_eq!(command.description().parameters.len(), 5);
    }

    #[test]
    fn test_layout_errors() {
        let b = builder();
        let ok = |_: &mut Namespace, _: (String, String)| Ok(());

        let err = b
            .build(Command::new(["x"]).handler(
                (Param::<String>::new("a").text(), Param::<String>::new("b")),
                ok,
            ))
            .unwrap_err();
        assert!(matches!(err, SetupError::TextNotLast { .. }));

        let err = b
            .build(Command::new(["x"]).handler(
                (
                    Param::<String>::new("a").default_value("q"),
                    Param::<String>::new("b"),
                ),
                ok,
            ))
            .unwrap_err();
        assert!(matches!(err, SetupError::RequiredAfterOptional { .. }));

        let err = b
            .build(Command::new(["x"]).handler(
                (Param::<String>::new("a"), Param::<String>::new("a")),
                ok,
            ))
            .unwrap_err();
        assert!(matches!(err, SetupError::DuplicateParameter { .. }));

        let err = b
            .build(Command::new(["x"]).handler(
                (Param::switch('f', "a"), Param::switch('f', "b")),
                |_: &mut Namespace, _: (bool, bool)| Ok(()),
            ))
            .unwrap_err();
        assert_eq!(
            err,
            SetupError::DuplicateFlag {
                command: "x".into(),
                flag: 'f'
            }
        );
    }

    #[test]
    fn test_unresolved_parameter() {
        struct Unbound;
        let err = builder()
            .build(Command::new(["x"]).handler(
                Param::<String>::new("a").classified::<Unbound>(),
                |_: &mut Namespace, _: String| Ok(()),
            ))
            .unwrap_err();
        assert!(matches!(err, SetupError::UnresolvedParameter { ref parameter, .. } if parameter == "a"));
    }

    #[test]
    fn test_authorization_before_parsing() {
        let b = builder().authorizer(|_: &Namespace, permission: &str| permission == "allowed");
        let denied = b
            .build(Command::new(["delete"]).require(["body.delete"]).handler(
                Param::<i32>::new("n"),
                |_: &mut Namespace, _: i32| Ok(()),
            ))
            .unwrap();

        let err = denied
            .call("not-a-number extra", &mut Namespace::new(), &["delete".into()])
            .unwrap_err();
        assert!(matches!(err, CommandError::Authorization(_)));
        assert!(!denied.test_permission(&Namespace::new()));
    }

    #[test]
    fn test_handler_panic_becomes_invocation_error() {
        let command = builder()
            .build(Command::new(["boom"]).handler((), |_: &mut Namespace, ()| -> Result<(), CommandError> {
                panic!("kaboom")
            }))
            .unwrap();
        match command.call("", &mut Namespace::new(), &[]).unwrap_err() {
            CommandError::Invocation(e) => assert!(e.message.contains("kaboom")),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_converters_see_failures() {
        let b = builder().add_converter(
            crate::convert::HandlerTable::builder()
                .on::<crate::error::MissingArgument>(|_, ctx| ctx.invalid_usage("need more", None))
                .build(),
        );
        let command = b
            .build(Command::new(["x"]).handler(
                Param::<String>::new("a"),
                |_: &mut Namespace, _: String| Ok(()),
            ))
            .unwrap();

        match command.call("", &mut Namespace::new(), &["x".into()]).unwrap_err() {
            CommandError::Usage(UsageError::Invalid(usage)) => {
                assert_eq!(usage.message, "need more");
                assert_eq!(usage.alias_stack, vec!["x"]);
            }
            other => panic!("unexpected {:?}", other),
        }
    }
}
