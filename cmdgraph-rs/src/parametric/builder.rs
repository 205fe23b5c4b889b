//! Compiles command declarations into invocation plans.

use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use crate::auth::{Authorizer, NullAuthorizer};
use crate::binding::BindingRegistry;
use crate::callable::Description;
use crate::convert::{DefaultExceptionConverter, ExceptionConverter};
use crate::error::SetupError;
use crate::i18n::{Messages, ResourceProvider};

use super::callable::{ParametricCallable, ResolvedParam};
use super::command::CommandDef;
use super::param::{ParamRole, ParamSpec};

/// Shared settings for compiling commands: the binding registry, the
/// authorizer, the exception converters and an optional resource provider.
///
/// ```
/// use cmdgraph::{provider, BindingRegistry, Command, CommandCallable, Namespace, Param, ParametricBuilder};
///
/// let mut registry = BindingRegistry::new();
/// provider::bind_primitives(&mut registry).unwrap();
///
/// let builder = ParametricBuilder::new(registry);
/// let double = builder
///     .build(Command::new(["double"]).handler(
///         Param::<i32>::new("n"),
///         |_: &mut Namespace, n: i32| {
///             assert_eq!(n * 2, 42);
///             Ok(())
///         },
///     ))
///     .unwrap();
///
/// double.call("21", &mut Namespace::new(), &[]).unwrap();
/// ```
#[derive(Clone)]
pub struct ParametricBuilder {
    registry: Arc<BindingRegistry>,
    authorizer: Arc<dyn Authorizer>,
    converters: Vec<Arc<dyn ExceptionConverter>>,
    default_converter: Option<Arc<dyn ExceptionConverter>>,
    resources: Option<Arc<dyn ResourceProvider>>,
}

impl ParametricBuilder {
    pub fn new(registry: BindingRegistry) -> Self {
        Self::shared(Arc::new(registry))
    }

    /// Builder over a registry that is already shared.
    pub fn shared(registry: Arc<BindingRegistry>) -> Self {
        Self {
            registry,
            authorizer: Arc::new(NullAuthorizer),
            converters: Vec::new(),
            default_converter: Some(Arc::new(DefaultExceptionConverter::new())),
            resources: None,
        }
    }

    pub fn authorizer(mut self, authorizer: impl Authorizer + 'static) -> Self {
        self.authorizer = Arc::new(authorizer);
        self
    }

    /// Add a converter. Converters run in the order they were added, before
    /// the default one.
    pub fn add_converter(mut self, converter: impl ExceptionConverter + 'static) -> Self {
        self.converters.push(Arc::new(converter));
        self
    }

    /// Drop the [`DefaultExceptionConverter`], leaving unhandled failures
    /// raw.
    pub fn without_default_converter(mut self) -> Self {
        self.default_converter = None;
        self
    }

    pub fn resources(mut self, resources: impl ResourceProvider + 'static) -> Self {
        self.resources = Some(Arc::new(resources));
        self
    }

    pub fn registry(&self) -> &Arc<BindingRegistry> {
        &self.registry
    }

    /// Validate `def` against the registry and compile it.
    pub fn build(&self, def: CommandDef) -> Result<ParametricCallable, SetupError> {
        let command = def.display_name().to_string();

        let mut params = Vec::with_capacity(def.params.len());
        for spec in &def.params {
            let binding = match spec.role() {
                ParamRole::Switch(_) => None,
                _ => {
                    let binding = self.registry.lookup(spec.key()).ok_or_else(|| {
                        SetupError::UnresolvedParameter {
                            command: command.clone(),
                            parameter: spec.name().to_string(),
                            key: spec.key().to_string(),
                        }
                    })?;
                    Some(binding.clone())
                }
            };
            params.push(ResolvedParam::new(spec.clone(), binding));
        }
        check_layout(&command, &params)?;

        let description = Description {
            short: def.short.map(|text| self.translate(text)),
            help: def.help.map(|text| self.translate(text)),
            usage: usage(&params),
            parameters: params.iter().map(|p| p.info().clone()).collect(),
            permissions: def.permissions.clone(),
        };

        let mut converters = self.converters.clone();
        converters.extend(self.default_converter.clone());

        tracing::debug!(command = %command, usage = %description.usage, "command compiled");
        Ok(ParametricCallable::new(
            Arc::new(description),
            params,
            def.permissions,
            def.invoke,
            self.authorizer.clone(),
            converters.into(),
        ))
    }

    pub(crate) fn translate(&self, text: String) -> String {
        match &self.resources {
            Some(resources) if resources.supports_descriptions() => {
                Messages::shared(resources.clone()).get(&text)
            }
            _ => text,
        }
    }
}

impl fmt::Debug for ParametricBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ParametricBuilder")
            .field("registry", &self.registry)
            .field("converters", &self.converters.len())
            .field("default_converter", &self.default_converter.is_some())
            .finish_non_exhaustive()
    }
}

// ============================================================================
// Layout checks
// ============================================================================

/// Names and flags are unique, the text parameter comes last and no
/// required positional follows an omissible one. Parameters filled from the
/// namespace take no tokens and are ignored by the ordering rules.
fn check_layout(command: &str, params: &[ResolvedParam]) -> Result<(), SetupError> {
    let mut names = HashSet::new();
    let mut flags = HashSet::new();
    let mut text: Option<&ParamSpec> = None;
    let mut optional: Option<&ParamSpec> = None;

    for param in params {
        let spec = param.spec();
        if !names.insert(spec.name()) {
            return Err(SetupError::DuplicateParameter {
                command: command.to_string(),
                parameter: spec.name().to_string(),
            });
        }

        if let Some(flag) = spec.role().flag() {
            if !flag.is_ascii_alphabetic() {
                return Err(SetupError::InvalidFlag {
                    command: command.to_string(),
                    flag,
                });
            }
            if !flags.insert(flag) {
                return Err(SetupError::DuplicateFlag {
                    command: command.to_string(),
                    flag,
                });
            }
            continue;
        }

        if param.is_provided() {
            continue;
        }

        if let Some(text) = text {
            return Err(SetupError::TextNotLast {
                command: command.to_string(),
                parameter: text.name().to_string(),
            });
        }

        match spec.role() {
            ParamRole::Text => text = Some(spec),
            _ if spec.can_be_omitted() => optional = optional.or(Some(spec)),
            _ => {
                if optional.is_some() {
                    return Err(SetupError::RequiredAfterOptional {
                        command: command.to_string(),
                        parameter: spec.name().to_string(),
                    });
                }
            }
        }
    }

    Ok(())
}

fn usage(params: &[ResolvedParam]) -> String {
    params
        .iter()
        .filter(|param| !param.is_provided())
        .map(|param| {
            let spec = param.spec();
            let name = spec.name();
            match spec.role() {
                ParamRole::Switch(flag) => format!("[-{}]", flag),
                ParamRole::ValueFlag(flag) if spec.can_be_omitted() => {
                    format!("[-{} <{}>]", flag, name)
                }
                ParamRole::ValueFlag(flag) => format!("-{} <{}>", flag, name),
                ParamRole::Text if spec.can_be_omitted() => format!("[{}...]", name),
                ParamRole::Text => format!("<{}...>", name),
                ParamRole::Positional if spec.can_be_omitted() => format!("[{}]", name),
                ParamRole::Positional => format!("<{}>", name),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}
