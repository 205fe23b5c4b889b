//! Failure kinds and the "is-more-specific-than" relation.
//!
//! Each kind has at most one parent. The parent chain of a kind mirrors how
//! the corresponding error types nest inside [`CommandError`]. A kind is
//! *more specific* than every kind on its parent chain and unrelated to
//! everything else.

use serde::Serialize;

use crate::error::*;

/// Tag of every type in the failure taxonomy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum FailureKind {
    /// Root: any [`CommandError`].
    Any,

    Usage,
    InvalidUsage,
    SubcommandRequired,
    CommandNotFound,

    NoSubcommands,
    Failed,

    Argument,
    MissingArgument,
    UnusedArgument,
    InvalidArgument,
    ArgumentParse,
    NonnumericalInput,
    OverRange,
    UnderRange,
    NoMatchInEnum,
    StringFormat,
    InvalidInput,

    Flag,
    AlreadyPresentFlag,
    MissingFlagValue,

    Provision,
    Interrupted,
    Authorization,
    Invocation,
}

impl FailureKind {
    /// Every kind, parents before children.
    pub const ALL: [FailureKind; 25] = [
        FailureKind::Any,
        FailureKind::Usage,
        FailureKind::InvalidUsage,
        FailureKind::SubcommandRequired,
        FailureKind::CommandNotFound,
        FailureKind::NoSubcommands,
        FailureKind::Failed,
        FailureKind::Argument,
        FailureKind::MissingArgument,
        FailureKind::UnusedArgument,
        FailureKind::InvalidArgument,
        FailureKind::ArgumentParse,
        FailureKind::NonnumericalInput,
        FailureKind::OverRange,
        FailureKind::UnderRange,
        FailureKind::NoMatchInEnum,
        FailureKind::StringFormat,
        FailureKind::InvalidInput,
        FailureKind::Flag,
        FailureKind::AlreadyPresentFlag,
        FailureKind::MissingFlagValue,
        FailureKind::Provision,
        FailureKind::Interrupted,
        FailureKind::Authorization,
        FailureKind::Invocation,
    ];

    /// The next more general kind, `None` only for [`FailureKind::Any`].
    pub fn parent(self) -> Option<FailureKind> {
        use FailureKind::*;
        match self {
            Any => None,
            InvalidUsage | SubcommandRequired | CommandNotFound => Some(Usage),
            MissingArgument | UnusedArgument | InvalidArgument | ArgumentParse => Some(Argument),
            NonnumericalInput | OverRange | UnderRange | NoMatchInEnum | StringFormat
            | InvalidInput => Some(ArgumentParse),
            AlreadyPresentFlag | MissingFlagValue => Some(Flag),
            Usage | NoSubcommands | Failed | Argument | Flag | Provision | Interrupted
            | Authorization | Invocation => Some(Any),
        }
    }

    /// Whether `self` equals `other` or descends from it.
    pub fn is_a(self, other: FailureKind) -> bool {
        let mut current = Some(self);
        while let Some(kind) = current {
            if kind == other {
                return true;
            }
            current = kind.parent();
        }
        false
    }

    /// Strict descendant check.
    pub fn is_more_specific_than(self, other: FailureKind) -> bool {
        self != other && self.is_a(other)
    }
}

impl CommandError {
    /// The most specific kind of this failure.
    pub fn kind(&self) -> FailureKind {
        match self {
            CommandError::Usage(UsageError::Invalid(_)) => FailureKind::InvalidUsage,
            CommandError::Usage(UsageError::SubcommandRequired(_)) => {
                FailureKind::SubcommandRequired
            }
            CommandError::Usage(UsageError::CommandNotFound(_)) => FailureKind::CommandNotFound,
            CommandError::NoSubcommands(_) => FailureKind::NoSubcommands,
            CommandError::Failed(_) => FailureKind::Failed,
            CommandError::Argument(ArgumentError::Missing(_)) => FailureKind::MissingArgument,
            CommandError::Argument(ArgumentError::Unused(_)) => FailureKind::UnusedArgument,
            CommandError::Argument(ArgumentError::Invalid(_)) => FailureKind::InvalidArgument,
            CommandError::Argument(ArgumentError::Parse(e)) => match &e.error {
                ParseError::Nonnumerical(_) => FailureKind::NonnumericalInput,
                ParseError::OverRange(_) => FailureKind::OverRange,
                ParseError::UnderRange(_) => FailureKind::UnderRange,
                ParseError::NoMatchInEnum(_) => FailureKind::NoMatchInEnum,
                ParseError::StringFormat(_) => FailureKind::StringFormat,
                ParseError::Invalid(_) => FailureKind::InvalidInput,
            },
            CommandError::Flag(FlagError::AlreadyPresent(_)) => FailureKind::AlreadyPresentFlag,
            CommandError::Flag(FlagError::MissingValue(_)) => FailureKind::MissingFlagValue,
            CommandError::Provision(_) => FailureKind::Provision,
            CommandError::Interrupted(_) => FailureKind::Interrupted,
            CommandError::Authorization(_) => FailureKind::Authorization,
            CommandError::Invocation(_) => FailureKind::Invocation,
        }
    }
}

// ============================================================================
// Typed views
// ============================================================================

/// A type in the failure taxonomy that can be "caught" out of a
/// [`CommandError`].
///
/// `catch` returns `Some` exactly when the error's kind is `KIND` or a
/// descendant of it.
pub trait Catch: Sized + 'static {
    const KIND: FailureKind;

    fn catch(error: &CommandError) -> Option<&Self>;
}

macro_rules! catch_impl {
    ($ty:ty, $kind:ident, |$e:ident| $body:expr) => {
        impl Catch for $ty {
            const KIND: FailureKind = FailureKind::$kind;

            fn catch($e: &CommandError) -> Option<&Self> {
                $body
            }
        }
    };
}

macro_rules! catch_parse {
    ($ty:ty, $kind:ident, $variant:ident) => {
        catch_impl!($ty, $kind, |e| match e {
            CommandError::Argument(ArgumentError::Parse(ArgumentParseError {
                error: ParseError::$variant(inner),
                ..
            })) => Some(inner),
            _ => None,
        });
    };
}

catch_impl!(CommandError, Any, |e| Some(e));

catch_impl!(UsageError, Usage, |e| match e {
    CommandError::Usage(inner) => Some(inner),
    _ => None,
});
catch_impl!(InvalidUsage, InvalidUsage, |e| match e {
    CommandError::Usage(UsageError::Invalid(inner)) => Some(inner),
    _ => None,
});
catch_impl!(SubcommandRequired, SubcommandRequired, |e| match e {
    CommandError::Usage(UsageError::SubcommandRequired(inner)) => Some(inner),
    _ => None,
});
catch_impl!(CommandNotFound, CommandNotFound, |e| match e {
    CommandError::Usage(UsageError::CommandNotFound(inner)) => Some(inner),
    _ => None,
});

catch_impl!(NoSubcommands, NoSubcommands, |e| match e {
    CommandError::NoSubcommands(inner) => Some(inner),
    _ => None,
});
catch_impl!(HandlerFailure, Failed, |e| match e {
    CommandError::Failed(inner) => Some(inner),
    _ => None,
});

catch_impl!(ArgumentError, Argument, |e| match e {
    CommandError::Argument(inner) => Some(inner),
    _ => None,
});
catch_impl!(MissingArgument, MissingArgument, |e| match e {
    CommandError::Argument(ArgumentError::Missing(inner)) => Some(inner),
    _ => None,
});
catch_impl!(UnusedArgument, UnusedArgument, |e| match e {
    CommandError::Argument(ArgumentError::Unused(inner)) => Some(inner),
    _ => None,
});
catch_impl!(InvalidArgument, InvalidArgument, |e| match e {
    CommandError::Argument(ArgumentError::Invalid(inner)) => Some(inner),
    _ => None,
});
catch_impl!(ArgumentParseError, ArgumentParse, |e| match e {
    CommandError::Argument(ArgumentError::Parse(inner)) => Some(inner),
    _ => None,
});
// Shares the kind of its wrapper: every parse failure arrives inside an
// `ArgumentParseError`.
catch_impl!(ParseError, ArgumentParse, |e| match e {
    CommandError::Argument(ArgumentError::Parse(inner)) => Some(&inner.error),
    _ => None,
});
catch_parse!(NonnumericalInput, NonnumericalInput, Nonnumerical);
catch_parse!(OverRange, OverRange, OverRange);
catch_parse!(UnderRange, UnderRange, UnderRange);
catch_parse!(NoMatchInEnum, NoMatchInEnum, NoMatchInEnum);
catch_parse!(StringFormat, StringFormat, StringFormat);
catch_parse!(InvalidInput, InvalidInput, Invalid);

catch_impl!(FlagError, Flag, |e| match e {
    CommandError::Flag(inner) => Some(inner),
    _ => None,
});
catch_impl!(AlreadyPresentFlag, AlreadyPresentFlag, |e| match e {
    CommandError::Flag(FlagError::AlreadyPresent(inner)) => Some(inner),
    _ => None,
});
catch_impl!(MissingFlagValue, MissingFlagValue, |e| match e {
    CommandError::Flag(FlagError::MissingValue(inner)) => Some(inner),
    _ => None,
});

catch_impl!(ProvisionError, Provision, |e| match e {
    CommandError::Provision(inner) => Some(inner),
    _ => None,
});
catch_impl!(Interrupted, Interrupted, |e| match e {
    CommandError::Interrupted(inner) => Some(inner),
    _ => None,
});
catch_impl!(AuthorizationError, Authorization, |e| match e {
    CommandError::Authorization(inner) => Some(inner),
    _ => None,
});
catch_impl!(InvocationError, Invocation, |e| match e {
    CommandError::Invocation(inner) => Some(inner),
    _ => None,
});

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use crate::callable::Description;

    fn samples() -> Vec<CommandError> {
        let command = Arc::new(Description::default());
        let parse = |error: ParseError| CommandError::from(error);
        vec![
            InvalidUsage::new("bad", command.clone(), Vec::new()).into(),
            CommandError::Usage(UsageError::SubcommandRequired(SubcommandRequired {
                command: command.clone(),
                alias_stack: Vec::new(),
                subcommands: Vec::new(),
            })),
            CommandError::Usage(UsageError::CommandNotFound(CommandNotFound {
                alias: "x".into(),
                command: command.clone(),
                alias_stack: Vec::new(),
                subcommands: Vec::new(),
            })),
            CommandError::NoSubcommands(NoSubcommands {
                command,
                alias_stack: Vec::new(),
            }),
            CommandError::failed("nope"),
            MissingArgument { parameter: None }.into(),
            UnusedArgument {
                unconsumed: vec!["z".into()],
            }
            .into(),
            CommandError::Argument(ArgumentError::Invalid(InvalidArgument {
                message: "bad".into(),
                parameter: None,
            })),
            parse(NonnumericalInput { input: "x".into() }.into()),
            parse(OverRange { input: 9.0, maximum: 5.0 }.into()),
            parse(UnderRange { input: 1.0, minimum: 5.0 }.into()),
            parse(
                NoMatchInEnum {
                    enum_name: "type".into(),
                    input: "x".into(),
                }
                .into(),
            ),
            parse(
                StringFormat {
                    input: "x".into(),
                    format: "[a-z]+".into(),
                }
                .into(),
            ),
            parse(ParseError::invalid("x", "bad")),
            CommandError::Flag(AlreadyPresentFlag { flag: 'f' }.into()),
            CommandError::Flag(MissingFlagValue { flag: 'f' }.into()),
            CommandError::Provision(ProvisionError::new("absent")),
            CommandError::Interrupted(Interrupted),
            CommandError::Authorization(AuthorizationError {
                alias_stack: Vec::new(),
            }),
            CommandError::Invocation(InvocationError::new("boom")),
        ]
    }

    fn caught<E: Catch>(error: &CommandError) -> bool {
        E::catch(error).is_some()
    }

    fn check<E: Catch>(errors: &[CommandError]) {
        for error in errors {
            assert_eq!(
                caught::<E>(error),
                error.kind().is_a(E::KIND),
                "{:?} vs {:?}",
                error.kind(),
                E::KIND
            );
        }
    }

    #[test]
    fn test_every_kind_reaches_root() {
        for kind in FailureKind::ALL {
            assert!(kind.is_a(FailureKind::Any));
        }
    }

    #[test]
    fn test_all_lists_parents_first() {
        for (index, kind) in FailureKind::ALL.iter().enumerate() {
            if let Some(parent) = kind.parent() {
                let parent_index = FailureKind::ALL.iter().position(|k| *k == parent).unwrap();
                assert!(parent_index < index);
            }
        }
    }

    #[test]
    fn test_specificity() {
        assert!(FailureKind::NonnumericalInput.is_more_specific_than(FailureKind::ArgumentParse));
        assert!(FailureKind::NonnumericalInput.is_more_specific_than(FailureKind::Argument));
        assert!(!FailureKind::Argument.is_more_specific_than(FailureKind::Argument));
        assert!(!FailureKind::Flag.is_a(FailureKind::Argument));
        assert!(!FailureKind::MissingArgument.is_a(FailureKind::ArgumentParse));
    }

    #[test]
    fn test_catch_agrees_with_kind() {
        let errors = samples();
        check::<CommandError>(&errors);
        check::<UsageError>(&errors);
        check::<InvalidUsage>(&errors);
        check::<SubcommandRequired>(&errors);
        check::<CommandNotFound>(&errors);
        check::<NoSubcommands>(&errors);
        check::<HandlerFailure>(&errors);
        check::<ArgumentError>(&errors);
        check::<MissingArgument>(&errors);
        check::<UnusedArgument>(&errors);
        check::<InvalidArgument>(&errors);
        check::<ArgumentParseError>(&errors);
        check::<ParseError>(&errors);
        check::<NonnumericalInput>(&errors);
        check::<OverRange>(&errors);
        check::<UnderRange>(&errors);
        check::<NoMatchInEnum>(&errors);
        check::<StringFormat>(&errors);
        check::<InvalidInput>(&errors);
        check::<FlagError>(&errors);
        check::<AlreadyPresentFlag>(&errors);
        check::<MissingFlagValue>(&errors);
        check::<ProvisionError>(&errors);
        check::<Interrupted>(&errors);
        check::<AuthorizationError>(&errors);
        check::<InvocationError>(&errors);
    }

    #[test]
    fn test_parse_error_caught_through_wrapper() {
        let error = CommandError::from(ParseError::from(OverRange { input: 9.0, maximum: 5.0 }));
        assert!(matches!(ParseError::catch(&error), Some(ParseError::OverRange(_))));
        assert_eq!(ParseError::KIND, ArgumentParseError::KIND);
        assert!(ParseError::catch(&MissingArgument { parameter: None }.into()).is_none());
    }

    #[test]
    fn test_samples_cover_every_leaf() {
        let kinds: Vec<_> = samples().iter().map(CommandError::kind).collect();
        for kind in FailureKind::ALL {
            let is_leaf = !FailureKind::ALL.iter().any(|k| k.parent() == Some(kind));
            if is_leaf {
                assert!(kinds.contains(&kind), "no sample for {:?}", kind);
            }
        }
    }
}
