//! Invocation of compiled commands.

use std::any::Any;
use std::collections::HashSet;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use crate::argument::{flag_letter, split, CommandArgs, FlagSet};
use crate::auth::{any_permitted, Authorizer};
use crate::binding::{AnyValue, Binding};
use crate::callable::{CommandCallable, Description};
use crate::convert::{convert_with, ExceptionContext, ExceptionConverter};
use crate::error::{
    AuthorizationError, CommandError, InvocationError, MissingArgument, UnusedArgument,
};
use crate::namespace::Namespace;

use super::command::Invoke;
use super::param::{ParamRole, ParamSpec, ParameterInfo};

/// A parameter with its binding looked up. Switches have no binding.
#[derive(Debug, Clone)]
pub(crate) struct ResolvedParam {
    spec: ParamSpec,
    info: ParameterInfo,
    binding: Option<Binding>,
}

impl ResolvedParam {
    pub(crate) fn new(spec: ParamSpec, binding: Option<Binding>) -> Self {
        let info = spec.info();
        Self {
            spec,
            info,
            binding,
        }
    }

    pub(crate) fn spec(&self) -> &ParamSpec {
        &self.spec
    }

    pub(crate) fn info(&self) -> &ParameterInfo {
        &self.info
    }

    pub(crate) fn is_provided(&self) -> bool {
        self.binding.as_ref().is_some_and(Binding::is_provided)
    }
}

/// A leaf command: a compiled invocation plan bound to its handler.
pub struct ParametricCallable {
    description: Arc<Description>,
    params: Vec<ResolvedParam>,
    value_flags: HashSet<char>,
    switches: HashSet<char>,
    permissions: Vec<String>,
    invoke: Invoke,
    authorizer: Arc<dyn Authorizer>,
    converters: Arc<[Arc<dyn ExceptionConverter>]>,
}

impl ParametricCallable {
    pub(crate) fn new(
        description: Arc<Description>,
        params: Vec<ResolvedParam>,
        permissions: Vec<String>,
        invoke: Invoke,
        authorizer: Arc<dyn Authorizer>,
        converters: Arc<[Arc<dyn ExceptionConverter>]>,
    ) -> Self {
        let mut value_flags = HashSet::new();
        let mut switches = HashSet::new();
        for param in &params {
            match param.spec.role() {
                ParamRole::ValueFlag(flag) => {
                    value_flags.insert(flag);
                }
                ParamRole::Switch(flag) => {
                    switches.insert(flag);
                }
                ParamRole::Positional | ParamRole::Text => {}
            }
        }

        Self {
            description,
            params,
            value_flags,
            switches,
            permissions,
            invoke,
            authorizer,
            converters,
        }
    }

    /// Turn tokens into one value slot per parameter, in declaration order.
    ///
    /// Optional parameters the user left out get `None`.
    fn resolve(
        &self,
        tokens: &[String],
        namespace: &Namespace,
    ) -> Result<Vec<Option<AnyValue>>, CommandError> {
        let (flags, positional) =
            FlagSet::split(tokens.to_vec(), &self.value_flags, &self.switches)?;
        let mut args = CommandArgs::new(positional, namespace);

        let mut values = Vec::with_capacity(self.params.len());
        for param in &self.params {
            let value = self
                .resolve_param(param, &flags, &mut args)
                .map_err(|error| error.with_parameter(&param.info))?;
            tracing::trace!(parameter = %param.info.name, resolved = value.is_some(), "parameter resolved");
            values.push(value);
        }

        if args.has_next() {
            return Err(UnusedArgument {
                unconsumed: args.remaining().to_vec(),
            }
            .into());
        }
        Ok(values)
    }

    fn resolve_param(
        &self,
        param: &ResolvedParam,
        flags: &FlagSet,
        args: &mut CommandArgs<'_>,
    ) -> Result<Option<AnyValue>, CommandError> {
        let role = param.spec.role();
        if let ParamRole::Switch(flag) = role {
            return Ok(Some(Box::new(flags.is_set(flag))));
        }
        let Some(binding) = param.binding.as_ref() else {
            return Err(InvocationError::new(format!(
                "Parameter '{}' has no binding",
                param.info.name
            ))
            .into());
        };
        let namespace = args.namespace();

        match role {
            ParamRole::ValueFlag(flag) => match flags.value(flag) {
                Some(value) => provide_from(binding, param, vec![value.to_string()], namespace),
                None => fallback(binding, param, namespace),
            },
            ParamRole::Text => {
                if args.has_next() {
                    let joined = args.take_remaining().join(" ");
                    provide_from(binding, param, vec![joined], namespace)
                } else if param.spec.can_be_omitted() {
                    fallback(binding, param, namespace)
                } else {
                    provide_from(binding, param, vec![String::new()], namespace)
                }
            }
            _ => {
                if binding.is_provided() || args.has_next() {
                    binding.provide(args, param.spec.modifiers()).map(Some)
                } else {
                    fallback(binding, param, namespace)
                }
            }
        }
    }

    fn invoke(
        &self,
        namespace: &mut Namespace,
        values: Vec<Option<AnyValue>>,
    ) -> Result<(), CommandError> {
        let invoke = &self.invoke;
        match panic::catch_unwind(AssertUnwindSafe(|| invoke(namespace, values))) {
            Ok(result) => result,
            Err(payload) => Err(InvocationError::new(format!(
                "Command handler panicked: {}",
                panic_message(payload.as_ref())
            ))
            .into()),
        }
    }

    fn convert(&self, error: CommandError, alias_stack: &[String]) -> CommandError {
        let context = ExceptionContext::new(self.description.clone(), alias_stack.to_vec())
            .with_parameter(error.parameter().cloned());
        convert_with(&self.converters, error, &context)
    }
}

/// Run the provider over `tokens` instead of the command's own positionals.
/// Every token must be consumed.
fn provide_from(
    binding: &Binding,
    param: &ResolvedParam,
    tokens: Vec<String>,
    namespace: &Namespace,
) -> Result<Option<AnyValue>, CommandError> {
    let mut args = CommandArgs::new(tokens, namespace);
    let value = binding.provide(&mut args, param.spec.modifiers())?;
    if args.has_next() {
        return Err(UnusedArgument {
            unconsumed: args.remaining().to_vec(),
        }
        .into());
    }
    Ok(Some(value))
}

/// Value of a parameter the user left out: its defaults, then `None` if it
/// is optional, otherwise a missing argument.
fn fallback(
    binding: &Binding,
    param: &ResolvedParam,
    namespace: &Namespace,
) -> Result<Option<AnyValue>, CommandError> {
    if !param.spec.defaults().is_empty() {
        return provide_from(binding, param, param.spec.defaults().to_vec(), namespace);
    }
    if param.spec.is_optional() {
        return Ok(None);
    }
    Err(MissingArgument {
        parameter: Some(param.info.clone()),
    }
    .into())
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(message) = payload.downcast_ref::<&'static str>() {
        message
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message
    } else {
        "unknown panic"
    }
}

impl CommandCallable for ParametricCallable {
    fn call_tokens(
        &self,
        tokens: &[String],
        namespace: &mut Namespace,
        alias_stack: &[String],
    ) -> Result<(), CommandError> {
        if !self.test_permission(namespace) {
            tracing::debug!(command = ?alias_stack, "permission denied");
            return Err(AuthorizationError {
                alias_stack: alias_stack.to_vec(),
            }
            .into());
        }

        tracing::debug!(command = ?alias_stack, tokens = tokens.len(), "invoking command");
        self.resolve(tokens, namespace)
            .and_then(|values| self.invoke(namespace, values))
            .map_err(|error| self.convert(error, alias_stack))
    }

    fn description(&self) -> &Arc<Description> {
        &self.description
    }

    fn test_permission(&self, namespace: &Namespace) -> bool {
        any_permitted(self.authorizer.as_ref(), namespace, &self.permissions)
    }

    /// Completes the parameter the last token of `arguments` would fill.
    fn suggestions(&self, arguments: &str, namespace: &Namespace) -> Vec<String> {
        let mut tokens = split(arguments);
        let prefix = if arguments.is_empty() || arguments.ends_with(char::is_whitespace) {
            String::new()
        } else {
            tokens.pop().unwrap_or_default()
        };

        if let Some(flag) = tokens.last().and_then(|token| flag_letter(token)) {
            if self.value_flags.contains(&flag) {
                return self
                    .params
                    .iter()
                    .find(|param| param.spec.role() == ParamRole::ValueFlag(flag))
                    .and_then(|param| param.binding.as_ref())
                    .map(|binding| binding.suggestions(&prefix, namespace))
                    .unwrap_or_default();
            }
        }

        let mut positional = 0;
        let mut skip_value = false;
        for token in &tokens {
            if skip_value {
                skip_value = false;
                continue;
            }
            match flag_letter(token) {
                Some(flag) if self.value_flags.contains(&flag) => skip_value = true,
                Some(flag) if self.switches.contains(&flag) => {}
                _ => positional += 1,
            }
        }

        let slots: Vec<&ResolvedParam> = self
            .params
            .iter()
            .filter(|param| {
                matches!(param.spec.role(), ParamRole::Positional | ParamRole::Text)
                    && !param.is_provided()
            })
            .collect();
        let target = slots.get(positional).copied().or_else(|| {
            slots
                .last()
                .copied()
                .filter(|param| param.spec.role() == ParamRole::Text)
        });

        target
            .and_then(|param| param.binding.as_ref())
            .map(|binding| binding.suggestions(&prefix, namespace))
            .unwrap_or_default()
    }
}

impl fmt::Debug for ParametricCallable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ParametricCallable")
            .field("description", &self.description)
            .field("params", &self.params)
            .finish_non_exhaustive()
    }
}
