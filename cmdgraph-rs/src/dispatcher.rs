//! Nested command groups.
//!
//! A [`Dispatcher`] consumes the first token of the path, looks the alias up
//! among its children and hands the rest of the path to the match. Leaves
//! stop the descent. Every token left at that point belongs to the leaf's
//! parameter resolver.

use std::borrow::Cow;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::argument::split;
use crate::callable::{CommandCallable, CommandSummary, Description};
use crate::error::{
    AuthorizationError, CommandError, CommandNotFound, NoSubcommands, SetupError,
    SubcommandRequired, UsageError,
};
use crate::namespace::Namespace;

/// How aliases are compared when dispatching.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum AliasCase {
    /// `Info` and `info` are different commands.
    #[default]
    Sensitive,
    /// Aliases match regardless of case.
    Insensitive,
}

impl AliasCase {
    pub fn normalize<'a>(self, alias: &'a str) -> Cow<'a, str> {
        match self {
            AliasCase::Sensitive => Cow::Borrowed(alias),
            AliasCase::Insensitive => Cow::Owned(alias.to_lowercase()),
        }
    }
}

/// A child of a group with the aliases it answers to.
pub struct CommandMapping {
    aliases: Vec<String>,
    callable: Box<dyn CommandCallable>,
}

impl CommandMapping {
    pub fn new(aliases: Vec<String>, callable: Box<dyn CommandCallable>) -> Self {
        Self { aliases, callable }
    }

    pub fn aliases(&self) -> &[String] {
        &self.aliases
    }

    pub fn primary_alias(&self) -> &str {
        self.aliases.first().map(String::as_str).unwrap_or_default()
    }

    pub fn callable(&self) -> &dyn CommandCallable {
        self.callable.as_ref()
    }
}

impl fmt::Debug for CommandMapping {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandMapping")
            .field("aliases", &self.aliases)
            .finish_non_exhaustive()
    }
}

/// A group node of the dispatch tree. Immutable once built.
pub struct Dispatcher {
    description: Arc<Description>,
    children: Vec<CommandMapping>,
    index: HashMap<String, usize>,
    default_command: Option<Box<dyn CommandCallable>>,
    alias_case: AliasCase,
}

impl Dispatcher {
    /// Assemble a group. `path` names the group in setup errors.
    ///
    /// Fails if a child has no aliases or an alias (after normalization)
    /// appears twice.
    pub fn new(
        path: &str,
        short: Option<String>,
        help: Option<String>,
        alias_case: AliasCase,
        children: Vec<CommandMapping>,
        default_command: Option<Box<dyn CommandCallable>>,
    ) -> Result<Self, SetupError> {
        let mut index = HashMap::new();
        for (position, child) in children.iter().enumerate() {
            if child.aliases.is_empty() {
                return Err(SetupError::EmptyAliases {
                    path: path.to_string(),
                });
            }
            for alias in &child.aliases {
                let normalized = alias_case.normalize(alias).into_owned();
                if index.insert(normalized, position).is_some() {
                    return Err(SetupError::DuplicateAlias {
                        alias: alias.clone(),
                        path: path.to_string(),
                    });
                }
            }
        }

        let description = Description {
            short,
            help,
            usage: group_usage(&children, default_command.is_some()),
            parameters: Vec::new(),
            permissions: Vec::new(),
        };

        tracing::debug!(
            path = %path,
            children = children.len(),
            default_command = default_command.is_some(),
            "dispatcher sealed"
        );
        Ok(Self {
            description: Arc::new(description),
            children,
            index,
            default_command,
            alias_case,
        })
    }

    pub fn children(&self) -> &[CommandMapping] {
        &self.children
    }

    /// The child registered under `alias`, compared per [`AliasCase`].
    pub fn get(&self, alias: &str) -> Option<&CommandMapping> {
        self.index
            .get(self.alias_case.normalize(alias).as_ref())
            .map(|&position| &self.children[position])
    }

    pub fn default_command(&self) -> Option<&dyn CommandCallable> {
        self.default_command.as_deref()
    }

    pub fn alias_case(&self) -> AliasCase {
        self.alias_case
    }

    fn subcommands(&self) -> Vec<String> {
        self.children
            .iter()
            .map(|child| child.primary_alias().to_string())
            .collect()
    }
}

/// `<info|settype>`, or `[info|settype]` when a default command can run
/// without a sub-command.
fn group_usage(children: &[CommandMapping], has_default: bool) -> String {
    let names = children
        .iter()
        .map(CommandMapping::primary_alias)
        .collect::<Vec<_>>()
        .join("|");
    if has_default {
        format!("[{}]", names)
    } else {
        format!("<{}>", names)
    }
}

impl CommandCallable for Dispatcher {
    fn call_tokens(
        &self,
        tokens: &[String],
        namespace: &mut Namespace,
        alias_stack: &[String],
    ) -> Result<(), CommandError> {
        if !self.test_permission(namespace) {
            return Err(AuthorizationError {
                alias_stack: alias_stack.to_vec(),
            }
            .into());
        }

        if self.children.is_empty() && self.default_command.is_none() {
            return Err(NoSubcommands {
                command: self.description.clone(),
                alias_stack: alias_stack.to_vec(),
            }
            .into());
        }

        let Some((first, rest)) = tokens.split_first() else {
            return match &self.default_command {
                Some(default) => default.call_tokens(tokens, namespace, alias_stack),
                None => Err(CommandError::from(UsageError::from(
                    SubcommandRequired {
                        command: self.description.clone(),
                        alias_stack: alias_stack.to_vec(),
                        subcommands: self.subcommands(),
                    },
                ))),
            };
        };

        if let Some(child) = self.get(first) {
            let mut stack = alias_stack.to_vec();
            stack.push(first.clone());
            tracing::trace!(alias = %first, depth = stack.len(), "dispatching to sub-command");
            return child.callable.call_tokens(rest, namespace, &stack);
        }

        match &self.default_command {
            Some(default) => {
                tracing::trace!(token = %first, "no sub-command matched, using default command");
                default.call_tokens(tokens, namespace, alias_stack)
            }
            None => Err(CommandError::from(UsageError::from(
                CommandNotFound {
                    alias: first.clone(),
                    command: self.description.clone(),
                    alias_stack: alias_stack.to_vec(),
                    subcommands: self.subcommands(),
                },
            ))),
        }
    }

    fn description(&self) -> &Arc<Description> {
        &self.description
    }

    /// A group is usable if any child (or its default command) is. An empty
    /// group has nothing to protect.
    fn test_permission(&self, namespace: &Namespace) -> bool {
        if self.children.is_empty() && self.default_command.is_none() {
            return true;
        }
        self.children
            .iter()
            .any(|child| child.callable.test_permission(namespace))
            || self
                .default_command
                .as_ref()
                .is_some_and(|default| default.test_permission(namespace))
    }

    fn suggestions(&self, arguments: &str, namespace: &Namespace) -> Vec<String> {
        let tokens = split(arguments);
        let completing_first =
            tokens.len() <= 1 && !(tokens.len() == 1 && arguments.ends_with(char::is_whitespace));

        if completing_first {
            let prefix = tokens.first().map(String::as_str).unwrap_or_default();
            let prefix = self.alias_case.normalize(prefix).into_owned();
            let mut suggestions: Vec<String> = self
                .children
                .iter()
                .filter(|child| child.callable.test_permission(namespace))
                .flat_map(|child| child.aliases.iter())
                .filter(|alias| self.alias_case.normalize(alias).starts_with(&prefix))
                .cloned()
                .collect();
            if let Some(default) = &self.default_command {
                suggestions.extend(default.suggestions(arguments, namespace));
            }
            return suggestions;
        }

        let first = &tokens[0];
        match self.get(first) {
            Some(child) => {
                let rest = arguments.trim_start()[first.len()..].trim_start();
                child.callable.suggestions(rest, namespace)
            }
            None => self
                .default_command
                .as_ref()
                .map(|default| default.suggestions(arguments, namespace))
                .unwrap_or_default(),
        }
    }

    fn summary(&self, aliases: &[String]) -> CommandSummary {
        CommandSummary {
            aliases: aliases.to_vec(),
            description: Description::clone(&self.description),
            children: self
                .children
                .iter()
                .map(|child| child.callable.summary(&child.aliases))
                .collect(),
        }
    }
}

impl fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dispatcher")
            .field("description", &self.description)
            .field("children", &self.children)
            .field("default_command", &self.default_command.is_some())
            .field("alias_case", &self.alias_case)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use super::*;
    use crate::parametric::{Command, Param, ParametricBuilder};
    use crate::provider::bind_primitives;
    use crate::BindingRegistry;

    type Log = Arc<Mutex<Vec<String>>>;

    fn builder() -> ParametricBuilder {
        let mut registry = BindingRegistry::new();
        bind_primitives(&mut registry).unwrap();
        ParametricBuilder::new(registry)
            .without_default_converter()
            .authorizer(|_: &Namespace, permission: &str| permission != "denied")
    }

    fn leaf(name: &str, log: &Log, permission: &str) -> Box<dyn CommandCallable> {
        let log = log.clone();
        let tag = name.to_string();
        let def = Command::new([name]).require([permission]).handler(
            Param::<String>::new("rest").optional().text(),
            move |_: &mut Namespace, rest: Option<String>| {
                log.lock()
                    .unwrap()
                    .push(format!("{}:{}", tag, rest.unwrap_or_default()));
                Ok(())
            },
        );
        Box::new(builder().build(def).unwrap())
    }

    fn group(log: &Log, case: AliasCase, with_default: bool) -> Dispatcher {
        let default = with_default.then(|| leaf("fallback", log, "ok"));
        Dispatcher::new(
            "body",
            Some("Celestial bodies".into()),
            None,
            case,
            vec![
                CommandMapping::new(vec!["info".into(), "i".into()], leaf("info", log, "ok")),
                CommandMapping::new(vec!["delete".into()], leaf("delete", log, "denied")),
            ],
            default,
        )
        .unwrap()
    }

    #[test]
    fn test_descends_and_pushes_alias() {
        let log = Log::default();
        let body = group(&log, AliasCase::Sensitive, false);
        body.call("i pluto the dwarf", &mut Namespace::new(), &["body".into()])
            .unwrap();
        assert_eq!(log.lock().unwrap()[0], "info:pluto the dwarf");
    }

    #[test]
    fn test_subcommand_required_and_not_found() {
        let log = Log::default();
        let body = group(&log, AliasCase::Sensitive, false);

        match body.call("", &mut Namespace::new(), &["body".into()]).unwrap_err() {
            CommandError::Usage(UsageError::SubcommandRequired(e)) => {
                assert_eq!(e.subcommands, vec!["info", "delete"]);
                assert_eq!(e.alias_stack, vec!["body"]);
            }
            other => panic!("unexpected {:?}", other),
        }

        match body.call("Info", &mut Namespace::new(), &[]).unwrap_err() {
            CommandError::Usage(UsageError::CommandNotFound(e)) => assert_eq!(e.alias, "Info"),
            other => panic!("unexpected {:?}", other),
        }
        assert!(log.lock().unwrap().is_empty());
    }

    #[test]
    fn test_case_insensitive_aliases() {
        let log = Log::default();
        let body = group(&log, AliasCase::Insensitive, false);
        body.call("INFO mars", &mut Namespace::new(), &[]).unwrap();
        assert_eq!(log.lock().unwrap()[0], "info:mars");
    }

    #[test]
    fn test_default_command_takes_unmatched_path() {
        let log = Log::default();
        let body = group(&log, AliasCase::Sensitive, true);
        let mut namespace = Namespace::new();
        body.call("", &mut namespace, &[]).unwrap();
        body.call("mercury venus", &mut namespace, &[]).unwrap();
        assert_eq!(
            *log.lock().unwrap(),
            vec!["fallback:".to_string(), "fallback:mercury venus".to_string()]
        );
        assert_eq!(body.description().usage, "[info|delete]");
    }

    #[test]
    fn test_permissions() {
        let log = Log::default();
        let body = group(&log, AliasCase::Sensitive, false);
        let mut namespace = Namespace::new();

        assert!(body.test_permission(&namespace));
        let err = body.call("delete earth", &mut namespace, &["body".into()]).unwrap_err();
        match err {
            CommandError::Authorization(e) => assert_eq!(e.alias_stack, vec!["body", "delete"]),
            other => panic!("unexpected {:?}", other),
        }

        let locked = Dispatcher::new(
            "locked",
            None,
            None,
            AliasCase::Sensitive,
            vec![CommandMapping::new(vec!["delete".into()], leaf("delete", &log, "denied"))],
            None,
        )
        .unwrap();
        assert!(!locked.test_permission(&namespace));
        assert!(matches!(
            locked.call("delete", &mut namespace, &[]),
            Err(CommandError::Authorization(_))
        ));
    }

    #[test]
    fn test_empty_group() {
        let empty = Dispatcher::new("empty", None, None, AliasCase::Sensitive, Vec::new(), None)
            .unwrap();
        assert!(matches!(
            empty.call("anything", &mut Namespace::new(), &[]),
            Err(CommandError::NoSubcommands(_))
        ));
    }

    #[test]
    fn test_alias_conflicts() {
        let log = Log::default();
        let err = Dispatcher::new(
            "body",
            None,
            None,
            AliasCase::Insensitive,
            vec![
                CommandMapping::new(vec!["info".into()], leaf("info", &log, "ok")),
                CommandMapping::new(vec!["INFO".into()], leaf("info2", &log, "ok")),
            ],
            None,
        )
        .unwrap_err();
        assert_eq!(
            err,
            SetupError::DuplicateAlias {
                alias: "INFO".into(),
                path: "body".into()
            }
        );

        let err = Dispatcher::new(
            "body",
            None,
            None,
            AliasCase::Sensitive,
            vec![CommandMapping::new(Vec::new(), leaf("x", &log, "ok"))],
            None,
        )
        .unwrap_err();
        assert!(matches!(err, SetupError::EmptyAliases { .. }));
    }

    #[test]
    fn test_suggestions() {
        let log = Log::default();
        let body = group(&log, AliasCase::Sensitive, false);
        let namespace = Namespace::new();

        assert_eq!(body.suggestions("", &namespace), vec!["info", "i"]);
        assert_eq!(body.suggestions("in", &namespace), vec!["info"]);
        assert!(body.suggestions("zz", &namespace).is_empty());
        assert!(body.suggestions("info ", &namespace).is_empty());
    }

    #[test]
    fn test_summary_tree() {
        let log = Log::default();
        let body = group(&log, AliasCase::Sensitive, false);
        let summary = body.summary(&["body".into()]);
        assert_eq!(summary.aliases, vec!["body"]);
        assert_eq!(summary.children.len(), 2);
        assert_eq!(summary.children[0].aliases, vec!["info", "i"]);
        assert_eq!(summary.children[0].description.usage, "[rest...]");
    }

    #[test]
    fn test_summary_serializes() {
        let log = Log::default();
        let body = group(&log, AliasCase::Sensitive, false);
        let json = serde_json::to_value(body.summary(&["body".into()])).unwrap();

        assert_eq!(json["aliases"], serde_json::json!(["body"]));
        assert_eq!(json["description"]["short"], "Celestial bodies");
        assert_eq!(json["description"]["usage"], "<info|delete>");

        let info = &json["children"][0];
        assert_eq!(info["aliases"], serde_json::json!(["info", "i"]));
        assert!(info.get("children").is_none());
        assert_eq!(info["description"]["permissions"], serde_json::json!(["ok"]));

        let rest = &info["description"]["parameters"][0];
        assert_eq!(rest["name"], "rest");
        assert_eq!(rest["role"], "text");
        assert_eq!(rest["optional"], true);
        assert!(rest.get("description").is_none());
    }
}
