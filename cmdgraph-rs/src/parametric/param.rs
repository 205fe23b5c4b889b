//! Parameter declarations.
//!
//! A handler declares its parameters as typed [`Param`] values grouped in a
//! tuple. The tuple fixes both the erased layout the resolver works with
//! ([`ParamSpec`]) and the typed arguments the handler receives.

use serde::Serialize;

use crate::argument::split;
use crate::binding::AnyValue;
use crate::error::{CommandError, InvocationError};
use crate::key::Key;
use crate::modifier::Modifiers;

/// How a parameter takes its value from the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ParamRole {
    /// Consumes tokens in declaration order.
    Positional,
    /// Consumes every remaining positional token, joined by single spaces.
    Text,
    /// `-x value`.
    ValueFlag(char),
    /// Presence-only `-x`.
    Switch(char),
}

impl ParamRole {
    pub fn flag(self) -> Option<char> {
        match self {
            ParamRole::ValueFlag(flag) | ParamRole::Switch(flag) => Some(flag),
            ParamRole::Positional | ParamRole::Text => None,
        }
    }
}

/// Public description of a parameter, attached to descriptions and errors.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParameterInfo {
    pub name: String,
    pub role: ParamRole,
    pub optional: bool,
    pub value_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Type-erased parameter declaration.
#[derive(Debug, Clone)]
pub struct ParamSpec {
    key: Key,
    name: String,
    role: ParamRole,
    optional: bool,
    defaults: Vec<String>,
    modifiers: Modifiers,
    description: Option<String>,
}

impl ParamSpec {
    fn new(key: Key, name: String, role: ParamRole) -> Self {
        Self {
            key,
            name,
            role,
            optional: false,
            defaults: Vec::new(),
            modifiers: Modifiers::new(),
            description: None,
        }
    }

    pub fn key(&self) -> &Key {
        &self.key
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn role(&self) -> ParamRole {
        self.role
    }

    pub fn is_optional(&self) -> bool {
        self.optional
    }

    /// Tokens parsed when the user gives no value.
    pub fn defaults(&self) -> &[String] {
        &self.defaults
    }

    pub fn modifiers(&self) -> &Modifiers {
        &self.modifiers
    }

    /// Whether the user may leave this parameter out.
    pub fn can_be_omitted(&self) -> bool {
        self.optional || !self.defaults.is_empty() || matches!(self.role, ParamRole::Switch(_))
    }

    pub fn info(&self) -> ParameterInfo {
        ParameterInfo {
            name: self.name.clone(),
            role: self.role,
            optional: self.can_be_omitted(),
            value_type: self.key.short_type_name().to_string(),
            description: self.description.clone(),
        }
    }
}

fn take<T: 'static>(value: Option<AnyValue>) -> Option<T> {
    value
        .and_then(|value| value.downcast::<T>().ok())
        .map(|value| *value)
}

fn take_optional<T: 'static>(value: Option<AnyValue>) -> Option<Option<T>> {
    Some(take::<T>(value))
}

/// A typed parameter declaration.
///
/// ```
/// use cmdgraph::Param;
///
/// let name = Param::<String>::new("name");
/// let temp = Param::<f64>::new("temp").optional();
/// let fahrenheit = Param::switch('f', "fahrenheit");
/// let description = Param::<String>::new("description").text();
/// # let _ = (name, temp, fahrenheit, description);
/// ```
pub struct Param<T> {
    spec: ParamSpec,
    extract: fn(Option<AnyValue>) -> Option<T>,
}

impl<T: Send + 'static> Param<T> {
    /// Required positional parameter bound to the unclassified key of `T`.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            spec: ParamSpec::new(Key::of::<T>(), name.into(), ParamRole::Positional),
            extract: take::<T>,
        }
    }

    /// Allow the parameter to be left out. The handler receives `None`
    /// unless a default is declared.
    pub fn optional(self) -> Param<Option<T>> {
        let mut spec = self.spec;
        spec.optional = true;
        Param {
            spec,
            extract: take_optional::<T>,
        }
    }

    /// Token(s) parsed by the provider when no value is given.
    pub fn default_value(mut self, tokens: &str) -> Self {
        self.spec.defaults = split(tokens);
        self
    }

    /// Take every remaining positional token as one string. Must be the last
    /// positional parameter.
    pub fn text(mut self) -> Self {
        self.spec.role = ParamRole::Text;
        self
    }

    /// Read the value from `-<letter> <value>` instead of positionally.
    pub fn flag(mut self, letter: char) -> Self {
        self.spec.role = ParamRole::ValueFlag(letter);
        self
    }

    /// Narrow the binding key with the classifier `C`.
    pub fn classified<C: 'static>(mut self) -> Self {
        self.spec.key = self.spec.key.classified::<C>();
        self
    }

    pub fn modifier<M: Send + Sync + 'static>(mut self, modifier: M) -> Self {
        self.spec.modifiers.push(modifier);
        self
    }

    pub fn describe(mut self, text: impl Into<String>) -> Self {
        self.spec.description = Some(text.into());
        self
    }

    pub fn spec(&self) -> &ParamSpec {
        &self.spec
    }
}

impl Param<bool> {
    /// Presence-only flag `-<letter>`. Needs no binding.
    pub fn switch(letter: char, name: impl Into<String>) -> Self {
        Self {
            spec: ParamSpec::new(Key::of::<bool>(), name.into(), ParamRole::Switch(letter)),
            extract: take::<bool>,
        }
    }
}

// ============================================================================
// Parameter lists
// ============================================================================

/// A list of parameters and the typed arguments it produces.
///
/// Implemented for `()`, a single [`Param`] and tuples of up to eight
/// parameter lists.
pub trait Params: Send + Sync + 'static {
    type Output;

    fn collect_specs(&self, specs: &mut Vec<ParamSpec>);

    /// Take this list's values, in declaration order, from `values`.
    fn extract(
        &self,
        values: &mut std::vec::IntoIter<Option<AnyValue>>,
    ) -> Result<Self::Output, CommandError>;

    fn specs(&self) -> Vec<ParamSpec> {
        let mut specs = Vec::new();
        self.collect_specs(&mut specs);
        specs
    }
}

impl Params for () {
    type Output = ();

    fn collect_specs(&self, _specs: &mut Vec<ParamSpec>) {}

    fn extract(
        &self,
        _values: &mut std::vec::IntoIter<Option<AnyValue>>,
    ) -> Result<Self::Output, CommandError> {
        Ok(())
    }
}

impl<T: Send + 'static> Params for Param<T> {
    type Output = T;

    fn collect_specs(&self, specs: &mut Vec<ParamSpec>) {
        specs.push(self.spec.clone());
    }

    fn extract(
        &self,
        values: &mut std::vec::IntoIter<Option<AnyValue>>,
    ) -> Result<Self::Output, CommandError> {
        (self.extract)(values.next().flatten()).ok_or_else(|| {
            InvocationError::new(format!(
                "No value was resolved for parameter '{}'",
                self.spec.name
            ))
            .into()
        })
    }
}

macro_rules! tuple_params {
    ($($name:ident),+) => {
        impl<$($name: Params),+> Params for ($($name,)+) {
            type Output = ($($name::Output,)+);

            #[allow(non_snake_case)]
            fn collect_specs(&self, specs: &mut Vec<ParamSpec>) {
                let ($($name,)+) = self;
                $($name.collect_specs(specs);)+
            }

            #[allow(non_snake_case)]
            fn extract(
                &self,
                values: &mut std::vec::IntoIter<Option<AnyValue>>,
            ) -> Result<Self::Output, CommandError> {
                let ($($name,)+) = self;
                Ok(($($name.extract(values)?,)+))
            }
        }
    };
}

tuple_params!(A);
tuple_params!(A, B);
tuple_params!(A, B, C);
tuple_params!(A, B, C, D);
tuple_params!(A, B, C, D, E);
tuple_params!(A, B, C, D, E, F);
tuple_params!(A, B, C, D, E, F, G);
tuple_params!(A, B, C, D, E, F, G, H);

#[cfg(test)]
mod tests {
    use super::*;

    struct Target;

    fn boxed<T: Send + 'static>(value: T) -> Option<AnyValue> {
        Some(Box::new(value))
    }

    #[test]
    fn test_builders_shape_the_spec() {
        let temp = Param::<f64>::new("temp").optional().default_value("20");
        assert_eq!(temp.spec().role(), ParamRole::Positional);
        assert!(temp.spec().is_optional());
        assert_eq!(temp.spec().defaults(), ["20"]);
        assert!(temp.spec().key().is::<f64>());

        let radius = Param::<u32>::new("radius").flag('r').classified::<Target>();
        assert_eq!(radius.spec().role(), ParamRole::ValueFlag('r'));
        assert_eq!(radius.spec().key(), &Key::of::<u32>().classified::<Target>());

        let fast = Param::switch('f', "fast");
        assert_eq!(fast.spec().role().flag(), Some('f'));
        assert!(fast.spec().can_be_omitted());
    }

    #[test]
    fn test_info() {
        let info = Param::<String>::new("description")
            .text()
            .describe("Free text")
            .spec()
            .info();
        assert_eq!(info.name, "description");
        assert_eq!(info.role, ParamRole::Text);
        assert!(!info.optional);
        assert_eq!(info.value_type, "String");
        assert_eq!(info.description.as_deref(), Some("Free text"));
    }

    #[test]
    fn test_role_serialization() {
        assert_eq!(serde_json::to_value(ParamRole::Positional).unwrap(), "positional");
        assert_eq!(
            serde_json::to_value(ParamRole::ValueFlag('r')).unwrap(),
            serde_json::json!({ "value_flag": "r" })
        );
        assert_eq!(
            serde_json::to_value(ParamRole::Switch('f')).unwrap(),
            serde_json::json!({ "switch": "f" })
        );
    }

    #[test]
    fn test_tuple_extract_in_order() {
        let params = (
            Param::<String>::new("name"),
            Param::<i32>::new("count").optional(),
            Param::switch('f', "fast"),
        );
        assert_eq!(params.specs().len(), 3);

        let mut values = vec![boxed("pluto".to_string()), None, boxed(true)].into_iter();
        let (name, count, fast) = params.extract(&mut values).unwrap();
        assert_eq!(name, "pluto");
        assert_eq!(count, None);
        assert!(fast);
    }

    #[test]
    fn test_missing_required_value_is_internal() {
        let params = Param::<String>::new("name");
        let mut values = vec![None].into_iter();
        let err = params.extract(&mut values).unwrap_err();
        assert!(matches!(err, CommandError::Invocation(_)));
    }
}
