//! Exception conversion.
//!
//! Raw failures (a missing argument, a bad number, an interruption) are
//! turned into what the host should show, usually an
//! [`InvalidUsage`](crate::error::InvalidUsage) carrying a readable message.
//!
//! A [`HandlerTable`] maps failure types to handler functions. Entries are
//! ordered once, when the table is built, so that a handler for a more
//! specific kind always comes before any handler for one of its ancestors.
//! For each failure the first matching entry runs, and only that one.
//!
//! ```
//! use cmdgraph::convert::{ExceptionConverter, HandlerTable};
//! use cmdgraph::error::{ArgumentError, NonnumericalInput, ParseError};
//! use cmdgraph::CommandError;
//!
//! let table = HandlerTable::builder()
//!     .on::<ArgumentError>(|_, ctx| ctx.invalid_usage("general", None))
//!     .on::<NonnumericalInput>(|e, ctx| ctx.invalid_usage(format!("'{}'?", e.input), None))
//!     .build();
//!
//! let error: CommandError = ParseError::Nonnumerical(NonnumericalInput { input: "x".into() }).into();
//! let converted = table.convert(&error, &Default::default()).unwrap();
//! assert_eq!(converted.to_string(), "'x'?");
//! ```

use std::any::type_name;
use std::fmt;
use std::sync::Arc;

use crate::callable::Description;
use crate::error::*;
use crate::kind::{Catch, FailureKind};
use crate::parametric::ParameterInfo;

/// Where a failure happened.
#[derive(Debug, Clone, Default)]
pub struct ExceptionContext {
    command: Arc<Description>,
    alias_stack: Vec<String>,
    parameter: Option<ParameterInfo>,
}

impl ExceptionContext {
    pub fn new(command: Arc<Description>, alias_stack: impl Into<Vec<String>>) -> Self {
        Self {
            command,
            alias_stack: alias_stack.into(),
            parameter: None,
        }
    }

    pub fn with_parameter(mut self, parameter: Option<ParameterInfo>) -> Self {
        self.parameter = parameter;
        self
    }

    /// Description of the command that failed.
    pub fn command(&self) -> &Arc<Description> {
        &self.command
    }

    pub fn alias_stack(&self) -> &[String] {
        &self.alias_stack
    }

    /// The parameter being resolved when the failure happened, if any.
    pub fn parameter(&self) -> Option<&ParameterInfo> {
        self.parameter.as_ref()
    }

    /// An [`InvalidUsage`] for this context.
    ///
    /// `cause` is kept as the source of the new error.
    pub fn invalid_usage(
        &self,
        message: impl Into<String>,
        cause: Option<&CommandError>,
    ) -> CommandError {
        let usage = InvalidUsage::new(message, self.command.clone(), self.alias_stack.clone());
        match cause {
            Some(cause) => usage.with_cause(cause.clone()).into(),
            None => usage.into(),
        }
    }
}

/// Turns a raw failure into what should be reported.
///
/// `None` means the converter has nothing to say about this failure.
pub trait ExceptionConverter: Send + Sync {
    fn convert(&self, error: &CommandError, context: &ExceptionContext) -> Option<CommandError>;
}

// ============================================================================
// Handler table
// ============================================================================

type HandlerFn = Box<dyn Fn(&CommandError, &ExceptionContext) -> Option<CommandError> + Send + Sync>;

struct Entry {
    kind: FailureKind,
    type_name: &'static str,
    handler: HandlerFn,
}

/// Ordered, immutable list of typed failure handlers.
pub struct HandlerTable {
    entries: Vec<Entry>,
}

impl HandlerTable {
    pub fn builder() -> HandlerTableBuilder {
        HandlerTableBuilder {
            entries: Vec::new(),
        }
    }

    /// Kinds in the order they are tried.
    pub fn kinds(&self) -> Vec<FailureKind> {
        self.entries.iter().map(|entry| entry.kind).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl ExceptionConverter for HandlerTable {
    fn convert(&self, error: &CommandError, context: &ExceptionContext) -> Option<CommandError> {
        let kind = error.kind();
        let entry = self.entries.iter().find(|entry| kind.is_a(entry.kind))?;
        tracing::trace!(failure = ?kind, handler = entry.type_name, "exception handler matched");
        (entry.handler)(error, context)
    }
}

impl fmt::Debug for HandlerTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.entries.iter().map(|entry| entry.type_name))
            .finish()
    }
}

/// Collects handlers for a [`HandlerTable`].
pub struct HandlerTableBuilder {
    entries: Vec<Entry>,
}

impl HandlerTableBuilder {
    /// Handle failures of type `E` (and every more specific type).
    pub fn on<E: Catch>(
        self,
        handler: impl Fn(&E, &ExceptionContext) -> CommandError + Send + Sync + 'static,
    ) -> Self {
        self.try_on::<E>(move |error, context| Some(handler(error, context)))
    }

    /// Like [`on`](Self::on), but the handler may decline by returning
    /// `None`. Declining still stops the search: only the first matching
    /// handler runs.
    pub fn try_on<E: Catch>(
        mut self,
        handler: impl Fn(&E, &ExceptionContext) -> Option<CommandError> + Send + Sync + 'static,
    ) -> Self {
        self.entries.push(Entry {
            kind: E::KIND,
            type_name: type_name::<E>(),
            handler: Box::new(move |error: &CommandError, context: &ExceptionContext| {
                E::catch(error).and_then(|caught| handler(caught, context))
            }),
        });
        self
    }

    /// Order the handlers most specific first and freeze them.
    ///
    /// Each entry is inserted in front of the first already placed entry it
    /// is strictly more specific than, otherwise appended. Entries with
    /// unrelated kinds keep their registration order.
    pub fn build(self) -> HandlerTable {
        let mut ordered: Vec<Entry> = Vec::with_capacity(self.entries.len());
        for entry in self.entries {
            let slot = ordered
                .iter()
                .position(|placed| entry.kind.is_more_specific_than(placed.kind));
            match slot {
                Some(index) => ordered.insert(index, entry),
                None => ordered.push(entry),
            }
        }
        HandlerTable { entries: ordered }
    }
}

// ============================================================================
// Default converter
// ============================================================================

/// The stock messages for argument, flag, provisioning and interruption
/// failures. Everything else passes through unchanged.
pub struct DefaultExceptionConverter {
    table: HandlerTable,
}

impl DefaultExceptionConverter {
    pub fn new() -> Self {
        let table = HandlerTable::builder()
            .on::<MissingArgument>(|e, ctx| {
                let message = match e.parameter.as_ref().or(ctx.parameter()) {
                    Some(parameter) => format!(
                        "Too few arguments! No value found for parameter '{}'",
                        parameter.name
                    ),
                    None => "Too few arguments!".to_string(),
                };
                ctx.invalid_usage(message, Some(&CommandError::from(e.clone())))
            })
            .on::<UnusedArgument>(|e, ctx| {
                let message = format!(
                    "Too many arguments! Unused arguments: {}",
                    e.unconsumed.join(" ")
                );
                ctx.invalid_usage(message, Some(&CommandError::from(e.clone())))
            })
            .on::<FlagError>(|e, ctx| {
                let usage = InvalidUsage::new(
                    e.to_string(),
                    ctx.command().clone(),
                    ctx.alias_stack().to_vec(),
                )
                .suggest_full_help(true)
                .with_cause(CommandError::Flag(e.clone()));
                usage.into()
            })
            .on::<ArgumentParseError>(|e, ctx| {
                let message = match e.parameter.as_ref() {
                    Some(parameter) => format!("For parameter '{}': {}", parameter.name, e.error),
                    None => format!("Error parsing arguments: {}", e.error),
                };
                let cause = CommandError::Argument(ArgumentError::Parse(e.clone()));
                ctx.invalid_usage(message, Some(&cause))
            })
            .on::<ArgumentError>(|e, ctx| {
                let cause = CommandError::Argument(e.clone());
                ctx.invalid_usage(format!("Error parsing arguments: {}", e), Some(&cause))
            })
            .on::<ProvisionError>(|e, _| {
                InvocationError::new(format!("Internal error occurred: {}", e.message))
                    .with_cause(CommandError::Provision(e.clone()))
                    .into()
            })
            .on::<Interrupted>(|_, _| {
                InvocationError::new("Execution of the command was interrupted")
                    .with_cause(CommandError::Interrupted(Interrupted))
                    .into()
            })
            .build();

        Self { table }
    }
}

impl Default for DefaultExceptionConverter {
    fn default() -> Self {
        Self::new()
    }
}

impl ExceptionConverter for DefaultExceptionConverter {
    fn convert(&self, error: &CommandError, context: &ExceptionContext) -> Option<CommandError> {
        self.table.convert(error, context)
    }
}

impl fmt::Debug for DefaultExceptionConverter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("DefaultExceptionConverter")
            .field(&self.table)
            .finish()
    }
}

/// Run `converters` in order and return the first conversion, or the
/// original failure when none applies.
pub(crate) fn convert_with(
    converters: &[Arc<dyn ExceptionConverter>],
    error: CommandError,
    context: &ExceptionContext,
) -> CommandError {
    for converter in converters {
        if let Some(converted) = converter.convert(&error, context) {
            tracing::debug!(from = ?error.kind(), to = ?converted.kind(), "failure converted");
            return converted;
        }
    }
    error
}
