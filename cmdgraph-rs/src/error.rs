//! Failure taxonomy.
//!
//! Every failure an invocation can raise is a [`CommandError`]. The variants
//! nest the same way the kinds in [`FailureKind`](crate::FailureKind) do, so a
//! family enum (e.g. [`ArgumentError`]) is the "general" view of all of its
//! leaf structs (e.g. [`MissingArgument`]).
//!
//! Configuration mistakes found while building a command graph are reported
//! separately as [`SetupError`].

use std::error::Error as StdError;
use std::sync::Arc;

use thiserror::Error;

use crate::callable::Description;
use crate::parametric::ParameterInfo;

// ============================================================================
// Root
// ============================================================================

/// Any failure raised while dispatching or invoking a command.
#[derive(Debug, Clone, Error)]
pub enum CommandError {
    /// User-facing usage problem. This is what converters produce.
    #[error(transparent)]
    Usage(#[from] UsageError),

    /// A group was dispatched to but has nothing registered under it.
    #[error(transparent)]
    NoSubcommands(#[from] NoSubcommands),

    /// A failure declared by the handler itself.
    #[error(transparent)]
    Failed(#[from] HandlerFailure),

    /// Raw argument problem (before conversion).
    #[error(transparent)]
    Argument(#[from] ArgumentError),

    /// Raw flag problem (before conversion).
    #[error(transparent)]
    Flag(#[from] FlagError),

    /// A provider could not derive a value from the context.
    #[error(transparent)]
    Provision(#[from] ProvisionError),

    /// The invocation was cancelled cooperatively.
    #[error(transparent)]
    Interrupted(#[from] Interrupted),

    /// The caller may not run this command.
    #[error(transparent)]
    Authorization(#[from] AuthorizationError),

    /// Unexpected internal failure. The message is not meant for end users.
    #[error(transparent)]
    Invocation(#[from] InvocationError),
}

impl CommandError {
    /// A handler-declared failure with a user-presentable message.
    pub fn failed(message: impl Into<String>) -> Self {
        CommandError::Failed(HandlerFailure {
            message: message.into(),
        })
    }

    /// Wrap an arbitrary error as an internal invocation failure.
    pub fn internal<E>(error: E) -> Self
    where
        E: StdError + Send + Sync + 'static,
    {
        CommandError::Invocation(InvocationError::new(error.to_string()).with_cause(error))
    }

    /// Whether the user can fix this by changing their input.
    ///
    /// Authorization, provisioning, interruption and internal failures are
    /// not user errors.
    pub fn is_user_error(&self) -> bool {
        matches!(
            self,
            CommandError::Usage(_)
                | CommandError::Argument(_)
                | CommandError::Flag(_)
                | CommandError::Failed(_)
        )
    }

    /// Process exit code for hosts that surface failures that way
    /// (1 = user error, 101 = system failure).
    pub fn exit_code(&self) -> i32 {
        if self.is_user_error() {
            1
        } else {
            101
        }
    }

    /// The parameter this failure is about, when known.
    pub fn parameter(&self) -> Option<&ParameterInfo> {
        match self {
            CommandError::Argument(e) => e.parameter(),
            _ => None,
        }
    }

    /// The failure this one wraps, if it wraps another [`CommandError`].
    pub fn cause(&self) -> Option<&CommandError> {
        match self {
            CommandError::Usage(UsageError::Invalid(e)) => e.cause.as_deref(),
            CommandError::Invocation(e) => e.cause_as_command_error(),
            _ => None,
        }
    }

    /// Attach `parameter` to argument failures that do not name one yet.
    pub(crate) fn with_parameter(self, parameter: &ParameterInfo) -> Self {
        match self {
            CommandError::Argument(e) => CommandError::Argument(e.with_parameter(parameter)),
            other => other,
        }
    }
}

impl From<ParseError> for CommandError {
    fn from(error: ParseError) -> Self {
        CommandError::Argument(ArgumentError::Parse(ArgumentParseError {
            parameter: None,
            error,
        }))
    }
}

impl From<MissingArgument> for CommandError {
    fn from(error: MissingArgument) -> Self {
        CommandError::Argument(ArgumentError::Missing(error))
    }
}

impl From<UnusedArgument> for CommandError {
    fn from(error: UnusedArgument) -> Self {
        CommandError::Argument(ArgumentError::Unused(error))
    }
}

impl From<InvalidUsage> for CommandError {
    fn from(error: InvalidUsage) -> Self {
        CommandError::Usage(UsageError::Invalid(error))
    }
}

impl From<std::io::Error> for CommandError {
    fn from(error: std::io::Error) -> Self {
        CommandError::internal(error)
    }
}

// ============================================================================
// Usage errors
// ============================================================================

/// User-facing usage failures.
#[derive(Debug, Clone, Error)]
pub enum UsageError {
    #[error(transparent)]
    Invalid(#[from] InvalidUsage),

    #[error(transparent)]
    SubcommandRequired(#[from] SubcommandRequired),

    #[error(transparent)]
    CommandNotFound(#[from] CommandNotFound),
}

impl UsageError {
    /// Description of the command the user should consult.
    pub fn command(&self) -> &Arc<Description> {
        match self {
            UsageError::Invalid(e) => &e.command,
            UsageError::SubcommandRequired(e) => &e.command,
            UsageError::CommandNotFound(e) => &e.command,
        }
    }

    /// Aliases typed to reach the command.
    pub fn alias_stack(&self) -> &[String] {
        match self {
            UsageError::Invalid(e) => &e.alias_stack,
            UsageError::SubcommandRequired(e) => &e.alias_stack,
            UsageError::CommandNotFound(e) => &e.alias_stack,
        }
    }

    /// Whether the host should print the command's full help with the message.
    pub fn is_full_help_suggested(&self) -> bool {
        match self {
            UsageError::Invalid(e) => e.full_help_suggested,
            UsageError::SubcommandRequired(_) | UsageError::CommandNotFound(_) => true,
        }
    }
}

/// The message a converter decided to show the user.
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct InvalidUsage {
    pub message: String,
    pub command: Arc<Description>,
    pub alias_stack: Vec<String>,
    pub full_help_suggested: bool,
    #[source]
    pub cause: Option<Box<CommandError>>,
}

impl InvalidUsage {
    pub fn new(
        message: impl Into<String>,
        command: Arc<Description>,
        alias_stack: impl Into<Vec<String>>,
    ) -> Self {
        Self {
            message: message.into(),
            command,
            alias_stack: alias_stack.into(),
            full_help_suggested: false,
            cause: None,
        }
    }

    pub fn suggest_full_help(mut self, suggest: bool) -> Self {
        self.full_help_suggested = suggest;
        self
    }

    pub fn with_cause(mut self, cause: CommandError) -> Self {
        self.cause = Some(Box::new(cause));
        self
    }
}

/// A group was reached with no sub-command named and no default command.
#[derive(Debug, Clone, Error)]
#[error("Please choose a sub-command.")]
pub struct SubcommandRequired {
    pub command: Arc<Description>,
    pub alias_stack: Vec<String>,
    /// Primary aliases of the group's children.
    pub subcommands: Vec<String>,
}

/// The alias does not name any child of the group.
#[derive(Debug, Clone, Error)]
#[error("Unknown sub-command '{alias}'")]
pub struct CommandNotFound {
    pub alias: String,
    /// Description of the group that was searched.
    pub command: Arc<Description>,
    pub alias_stack: Vec<String>,
    pub subcommands: Vec<String>,
}

/// A group with no children was dispatched to. This is an integration
/// problem, not an input problem.
#[derive(Debug, Clone, Error)]
#[error("No sub-commands are registered under '{}'", .alias_stack.join(" "))]
pub struct NoSubcommands {
    pub command: Arc<Description>,
    pub alias_stack: Vec<String>,
}

/// A failure raised by a handler on purpose.
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct HandlerFailure {
    pub message: String,
}

// ============================================================================
// Argument errors
// ============================================================================

/// Problems with the positional arguments of a command.
#[derive(Debug, Clone, Error)]
pub enum ArgumentError {
    #[error(transparent)]
    Missing(#[from] MissingArgument),

    #[error(transparent)]
    Unused(#[from] UnusedArgument),

    #[error(transparent)]
    Parse(#[from] ArgumentParseError),

    #[error(transparent)]
    Invalid(#[from] InvalidArgument),
}

impl ArgumentError {
    pub fn parameter(&self) -> Option<&ParameterInfo> {
        match self {
            ArgumentError::Missing(e) => e.parameter.as_ref(),
            ArgumentError::Unused(_) => None,
            ArgumentError::Parse(e) => e.parameter.as_ref(),
            ArgumentError::Invalid(e) => e.parameter.as_ref(),
        }
    }

    fn with_parameter(self, parameter: &ParameterInfo) -> Self {
        let fill = |slot: Option<ParameterInfo>| slot.or_else(|| Some(parameter.clone()));
        match self {
            ArgumentError::Missing(e) => ArgumentError::Missing(MissingArgument {
                parameter: fill(e.parameter),
            }),
            ArgumentError::Parse(e) => ArgumentError::Parse(ArgumentParseError {
                parameter: fill(e.parameter),
                error: e.error,
            }),
            ArgumentError::Invalid(e) => ArgumentError::Invalid(InvalidArgument {
                message: e.message,
                parameter: fill(e.parameter),
            }),
            unused @ ArgumentError::Unused(_) => unused,
        }
    }
}

/// A required positional or flag value was absent.
#[derive(Debug, Clone, Error)]
#[error(
    "Too few arguments{}",
    .parameter.as_ref().map(|p| format!(": no value for '{}'", p.name)).unwrap_or_default()
)]
pub struct MissingArgument {
    pub parameter: Option<ParameterInfo>,
}

/// Tokens were left over after every parameter was satisfied.
#[derive(Debug, Clone, Error)]
#[error("Too many arguments: {}", .unconsumed.join(" "))]
pub struct UnusedArgument {
    pub unconsumed: Vec<String>,
}

/// A provider rejected the content of a token.
#[derive(Debug, Clone, Error)]
#[error("{error}")]
pub struct ArgumentParseError {
    pub parameter: Option<ParameterInfo>,
    pub error: ParseError,
}

/// Generic argument failure raised by a provider.
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct InvalidArgument {
    pub message: String,
    pub parameter: Option<ParameterInfo>,
}

/// Why a provider rejected a token.
#[derive(Debug, Clone, Error)]
pub enum ParseError {
    #[error(transparent)]
    Nonnumerical(#[from] NonnumericalInput),

    #[error(transparent)]
    OverRange(#[from] OverRange),

    #[error(transparent)]
    UnderRange(#[from] UnderRange),

    #[error(transparent)]
    NoMatchInEnum(#[from] NoMatchInEnum),

    #[error(transparent)]
    StringFormat(#[from] StringFormat),

    #[error(transparent)]
    Invalid(#[from] InvalidInput),
}

impl ParseError {
    /// Generic rejection with a custom message.
    pub fn invalid(input: impl Into<String>, message: impl Into<String>) -> Self {
        ParseError::Invalid(InvalidInput {
            input: input.into(),
            message: message.into(),
        })
    }
}

#[derive(Debug, Clone, Error)]
#[error("Expected '{input}' to be a number")]
pub struct NonnumericalInput {
    pub input: String,
}

#[derive(Debug, Clone, Error)]
#[error("A valid value is less than or equal to {maximum} (you entered {input})")]
pub struct OverRange {
    pub input: f64,
    pub maximum: f64,
}

#[derive(Debug, Clone, Error)]
#[error("A valid value is greater than or equal to {minimum} (you entered {input})")]
pub struct UnderRange {
    pub input: f64,
    pub minimum: f64,
}

#[derive(Debug, Clone, Error)]
#[error("No matching value found in the '{enum_name}' list.")]
pub struct NoMatchInEnum {
    pub enum_name: String,
    pub input: String,
}

#[derive(Debug, Clone, Error)]
#[error("The given text doesn't match the right format (technically speaking, the 'format' is {format})")]
pub struct StringFormat {
    pub input: String,
    pub format: String,
}

#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct InvalidInput {
    pub input: String,
    pub message: String,
}

// ============================================================================
// Flag errors
// ============================================================================

/// Malformed flag usage.
#[derive(Debug, Clone, Error)]
pub enum FlagError {
    #[error(transparent)]
    AlreadyPresent(#[from] AlreadyPresentFlag),

    #[error(transparent)]
    MissingValue(#[from] MissingFlagValue),
}

impl FlagError {
    pub fn flag(&self) -> char {
        match self {
            FlagError::AlreadyPresent(e) => e.flag,
            FlagError::MissingValue(e) => e.flag,
        }
    }
}

#[derive(Debug, Clone, Error)]
#[error("Value flag '{flag}' already given")]
pub struct AlreadyPresentFlag {
    pub flag: char,
}

#[derive(Debug, Clone, Error)]
#[error("No value specified for the '-{flag}' flag.")]
pub struct MissingFlagValue {
    pub flag: char,
}

// ============================================================================
// System-side errors
// ============================================================================

/// A provider failed to produce a value that does not come from user input.
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct ProvisionError {
    pub message: String,
}

impl ProvisionError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, Error)]
#[error("Execution of the command was interrupted")]
pub struct Interrupted;

#[derive(Debug, Clone, Error)]
#[error("You are not permitted to use '{}'", .alias_stack.join(" "))]
pub struct AuthorizationError {
    pub alias_stack: Vec<String>,
}

/// Internal failure. `message` is for operator logs, not for end users.
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct InvocationError {
    pub message: String,
    #[source]
    pub cause: Option<Arc<dyn StdError + Send + Sync>>,
}

impl InvocationError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            cause: None,
        }
    }

    pub fn with_cause<E>(mut self, cause: E) -> Self
    where
        E: StdError + Send + Sync + 'static,
    {
        self.cause = Some(Arc::new(cause));
        self
    }

    /// Whether this wraps a cooperative cancellation.
    pub fn is_interrupted(&self) -> bool {
        match self.cause.as_deref() {
            Some(cause) => {
                cause.is::<Interrupted>()
                    || matches!(
                        cause.downcast_ref::<CommandError>(),
                        Some(CommandError::Interrupted(_))
                    )
            }
            None => false,
        }
    }

    fn cause_as_command_error(&self) -> Option<&CommandError> {
        self.cause
            .as_deref()
            .and_then(|cause| cause.downcast_ref::<CommandError>())
    }
}

// ============================================================================
// Setup errors
// ============================================================================

/// Configuration mistakes detected while building a command graph.
///
/// These surface before any command can be dispatched.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SetupError {
    #[error("A provider is already registered for {key}")]
    DuplicateBinding { key: String },

    #[error("Cannot bind a provider of {provided} under {key}")]
    KeyTypeMismatch { key: String, provided: String },

    #[error("Command '{command}': no provider is bound for parameter '{parameter}' ({key})")]
    UnresolvedParameter {
        command: String,
        parameter: String,
        key: String,
    },

    #[error("Command '{command}': text parameter '{parameter}' must be the last positional parameter")]
    TextNotLast { command: String, parameter: String },

    #[error("Command '{command}': required parameter '{parameter}' follows an optional one")]
    RequiredAfterOptional { command: String, parameter: String },

    #[error("Command '{command}': flag '-{flag}' is declared more than once")]
    DuplicateFlag { command: String, flag: char },

    #[error("Command '{command}': flag '{flag}' is not an ASCII letter")]
    InvalidFlag { command: String, flag: char },

    #[error("Command '{command}': parameter '{parameter}' is declared more than once")]
    DuplicateParameter { command: String, parameter: String },

    #[error("A command under '{path}' has no aliases")]
    EmptyAliases { path: String },

    #[error("Alias '{alias}' is registered more than once under '{path}'")]
    DuplicateAlias { alias: String, path: String },
}
