//! Enum-valued parameters.

use std::marker::PhantomData;

use crate::argument::CommandArgs;
use crate::binding::Provider;
use crate::error::{CommandError, NoMatchInEnum, ParseError};
use crate::modifier::Modifiers;
use crate::namespace::Namespace;

/// A closed set of named values a parameter can take.
///
/// Usually derived with `#[derive(Choice)]`:
///
/// ```
/// use cmdgraph::provider::Choice;
///
/// #[derive(Debug, PartialEq, Choice)]
/// #[choice(name = "body type")]
/// enum BodyType {
///     Planet,
///     #[choice(alias = "dwarf")]
///     DwarfPlanet,
///     Star,
/// }
///
/// assert_eq!(BodyType::NAME, "body type");
/// assert_eq!(BodyType::from_choice("dwarfplanet"), Some(BodyType::DwarfPlanet));
/// assert_eq!(BodyType::from_choice("dwarf"), Some(BodyType::DwarfPlanet));
/// assert_eq!(BodyType::choices(), ["planet", "dwarfplanet", "star"]);
/// ```
pub trait Choice: Sized + Send + 'static {
    /// Shown in `NoMatchInEnum` messages.
    const NAME: &'static str;

    /// Primary names, already normalized.
    fn choices() -> &'static [&'static str];

    /// Look up a normalized name or alias.
    fn from_choice(normalized: &str) -> Option<Self>;
}

/// Lowercase `input` and drop everything that is not ASCII alphanumeric, so
/// `"Dwarf_Planet"` and `"dwarf-planet"` both become `"dwarfplanet"`.
pub fn normalize(input: &str) -> String {
    input
        .chars()
        .filter(char::is_ascii_alphanumeric)
        .map(|c| c.to_ascii_lowercase())
        .collect()
}

/// Resolves one token to a [`Choice`] value.
#[derive(Debug)]
pub struct ChoiceProvider<E> {
    _marker: PhantomData<fn() -> E>,
}

impl<E> ChoiceProvider<E> {
    pub fn new() -> Self {
        Self {
            _marker: PhantomData,
        }
    }
}

impl<E> Default for ChoiceProvider<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: Choice> Provider<E> for ChoiceProvider<E> {
    fn get(&self, args: &mut CommandArgs<'_>, _: &Modifiers) -> Result<E, CommandError> {
        let token = args.next()?;
        E::from_choice(&normalize(&token)).ok_or_else(|| {
            ParseError::from(NoMatchInEnum {
                enum_name: E::NAME.to_string(),
                input: token,
            })
            .into()
        })
    }

    fn suggestions(&self, prefix: &str, _: &Namespace) -> Vec<String> {
        let prefix = normalize(prefix);
        E::choices()
            .iter()
            .filter(|choice| choice.starts_with(&prefix))
            .map(|choice| choice.to_string())
            .collect()
    }
}
