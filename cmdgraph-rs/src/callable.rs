//! The invocable unit shared by leaves and groups.

use std::sync::Arc;

use serde::Serialize;

use crate::argument::split;
use crate::error::CommandError;
use crate::namespace::Namespace;
use crate::parametric::ParameterInfo;

/// Human-facing description of a command.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Description {
    /// One-line summary.
    pub short: Option<String>,
    /// Long help text.
    pub help: Option<String>,
    /// Usage line, e.g. `<name> [temp] [-f]`.
    pub usage: String,
    pub parameters: Vec<ParameterInfo>,
    /// Permissions any one of which allows the command.
    pub permissions: Vec<String>,
}

impl Description {
    /// Help text, falling back to the short description.
    pub fn help_or_short(&self) -> Option<&str> {
        self.help.as_deref().or(self.short.as_deref())
    }
}

/// Serializable view of a command tree.
#[derive(Debug, Clone, Serialize)]
pub struct CommandSummary {
    pub aliases: Vec<String>,
    pub description: Description,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<CommandSummary>,
}

/// A resolved, invocable command: either a leaf with a compiled invocation
/// plan or a group of children.
pub trait CommandCallable: Send + Sync {
    /// Run the command against already split tokens.
    ///
    /// `alias_stack` holds every alias typed to reach this command,
    /// including its own.
    fn call_tokens(
        &self,
        tokens: &[String],
        namespace: &mut Namespace,
        alias_stack: &[String],
    ) -> Result<(), CommandError>;

    /// Split `arguments` on whitespace and run the command.
    fn call(
        &self,
        arguments: &str,
        namespace: &mut Namespace,
        parent_aliases: &[String],
    ) -> Result<(), CommandError> {
        self.call_tokens(&split(arguments), namespace, parent_aliases)
    }

    fn description(&self) -> &Arc<Description>;

    /// Whether the invoker described by `namespace` may run this command.
    fn test_permission(&self, namespace: &Namespace) -> bool;

    /// Completion hints for the last token of `arguments`. Advisory only.
    fn suggestions(&self, arguments: &str, namespace: &Namespace) -> Vec<String> {
        let _ = (arguments, namespace);
        Vec::new()
    }

    /// Summary of this command registered under `aliases`.
    fn summary(&self, aliases: &[String]) -> CommandSummary {
        CommandSummary {
            aliases: aliases.to_vec(),
            description: Description::clone(self.description()),
            children: Vec::new(),
        }
    }
}

impl<C: CommandCallable + ?Sized> CommandCallable for Arc<C> {
    fn call_tokens(
        &self,
        tokens: &[String],
        namespace: &mut Namespace,
        alias_stack: &[String],
    ) -> Result<(), CommandError> {
        (**self).call_tokens(tokens, namespace, alias_stack)
    }

    fn description(&self) -> &Arc<Description> {
        (**self).description()
    }

    fn test_permission(&self, namespace: &Namespace) -> bool {
        (**self).test_permission(namespace)
    }

    fn suggestions(&self, arguments: &str, namespace: &Namespace) -> Vec<String> {
        (**self).suggestions(arguments, namespace)
    }

    fn summary(&self, aliases: &[String]) -> CommandSummary {
        (**self).summary(aliases)
    }
}
