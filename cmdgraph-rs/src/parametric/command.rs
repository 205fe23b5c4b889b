//! Command declarations.

use std::fmt;
use std::sync::Arc;

use crate::binding::AnyValue;
use crate::error::CommandError;
use crate::namespace::Namespace;

use super::param::{ParamSpec, Params};

pub(crate) type Invoke =
    Arc<dyn Fn(&mut Namespace, Vec<Option<AnyValue>>) -> Result<(), CommandError> + Send + Sync>;

/// Builder for a [`CommandDef`].
///
/// ```
/// use cmdgraph::{Command, Namespace, Param};
///
/// let info = Command::new(["info", "i"])
///     .desc("Show information about a body")
///     .require(["body.info"])
///     .handler(
///         (Param::<String>::new("name"), Param::switch('f', "fahrenheit")),
///         |_namespace: &mut Namespace, (name, fahrenheit): (String, bool)| {
///             println!("{} (fahrenheit: {})", name, fahrenheit);
///             Ok(())
///         },
///     );
/// assert_eq!(info.aliases(), ["info", "i"]);
/// ```
#[derive(Debug, Clone, Default)]
pub struct Command {
    aliases: Vec<String>,
    short: Option<String>,
    help: Option<String>,
    permissions: Vec<String>,
}

impl Command {
    /// A command reachable by `aliases`. The first alias is the primary one.
    pub fn new<I, S>(aliases: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            aliases: aliases.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    /// One-line description.
    pub fn desc(mut self, text: impl Into<String>) -> Self {
        self.short = Some(text.into());
        self
    }

    /// Long help text.
    pub fn help(mut self, text: impl Into<String>) -> Self {
        self.help = Some(text.into());
        self
    }

    /// Permissions any one of which allows the command.
    pub fn require<I, S>(mut self, permissions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.permissions
            .extend(permissions.into_iter().map(Into::into));
        self
    }

    /// Attach the parameter list and the handler.
    pub fn handler<P, F>(self, params: P, handler: F) -> CommandDef
    where
        P: Params,
        F: Fn(&mut Namespace, P::Output) -> Result<(), CommandError> + Send + Sync + 'static,
    {
        let specs = params.specs();
        let invoke: Invoke = Arc::new(
            move |namespace: &mut Namespace, values: Vec<Option<AnyValue>>| {
                let mut values = values.into_iter();
                let arguments = params.extract(&mut values)?;
                handler(namespace, arguments)
            },
        );

        CommandDef {
            aliases: self.aliases,
            short: self.short,
            help: self.help,
            permissions: self.permissions,
            params: specs,
            invoke,
        }
    }
}

/// A declared command, ready to be compiled by a
/// [`ParametricBuilder`](super::ParametricBuilder).
#[derive(Clone)]
pub struct CommandDef {
    pub(crate) aliases: Vec<String>,
    pub(crate) short: Option<String>,
    pub(crate) help: Option<String>,
    pub(crate) permissions: Vec<String>,
    pub(crate) params: Vec<ParamSpec>,
    pub(crate) invoke: Invoke,
}

impl CommandDef {
    pub fn aliases(&self) -> &[String] {
        &self.aliases
    }

    pub fn params(&self) -> &[ParamSpec] {
        &self.params
    }

    pub fn permissions(&self) -> &[String] {
        &self.permissions
    }

    /// Name used in setup diagnostics.
    pub(crate) fn display_name(&self) -> &str {
        self.aliases
            .first()
            .map(String::as_str)
            .unwrap_or("<default>")
    }
}

impl fmt::Debug for CommandDef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandDef")
            .field("aliases", &self.aliases)
            .field("short", &self.short)
            .field("permissions", &self.permissions)
            .field("params", &self.params)
            .finish_non_exhaustive()
    }
}
