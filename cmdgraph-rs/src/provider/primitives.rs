//! Providers for strings, booleans, characters and numbers.

use std::marker::PhantomData;

use crate::argument::CommandArgs;
use crate::binding::{BindingModule, BindingRegistry, Provider};
use crate::error::{CommandError, NonnumericalInput, OverRange, ParseError, SetupError, StringFormat, UnderRange};
use crate::modifier::{Modifiers, Range, Validate};
use crate::namespace::Namespace;

/// Binds [`StringProvider`], [`BoolProvider`], [`CharProvider`] and a
/// [`NumberProvider`] for every integer and float type.
#[derive(Debug, Clone, Copy, Default)]
pub struct PrimitivesModule;

impl BindingModule for PrimitivesModule {
    fn configure(&self, registry: &mut BindingRegistry) -> Result<(), SetupError> {
        registry
            .bind(StringProvider)?
            .bind(BoolProvider)?
            .bind(CharProvider)?
            .bind(NumberProvider::<i8>::new())?
            .bind(NumberProvider::<i16>::new())?
            .bind(NumberProvider::<i32>::new())?
            .bind(NumberProvider::<i64>::new())?
            .bind(NumberProvider::<i128>::new())?
            .bind(NumberProvider::<isize>::new())?
            .bind(NumberProvider::<u8>::new())?
            .bind(NumberProvider::<u16>::new())?
            .bind(NumberProvider::<u32>::new())?
            .bind(NumberProvider::<u64>::new())?
            .bind(NumberProvider::<u128>::new())?
            .bind(NumberProvider::<usize>::new())?
            .bind(NumberProvider::<f32>::new())?
            .bind(NumberProvider::<f64>::new())?;
        Ok(())
    }
}

/// Install [`PrimitivesModule`] into `registry`.
pub fn bind_primitives(registry: &mut BindingRegistry) -> Result<(), SetupError> {
    registry.install(PrimitivesModule)?;
    Ok(())
}

// ============================================================================
// Text
// ============================================================================

/// One token as a `String`. Honors [`Validate`].
#[derive(Debug, Clone, Copy, Default)]
pub struct StringProvider;

impl Provider<String> for StringProvider {
    fn get(&self, args: &mut CommandArgs<'_>, modifiers: &Modifiers) -> Result<String, CommandError> {
        let token = args.next()?;
        for validate in modifiers.iter_of::<Validate>() {
            if !validate.is_match(&token) {
                return Err(ParseError::from(StringFormat {
                    input: token,
                    format: validate.pattern().to_string(),
                })
                .into());
            }
        }
        Ok(token)
    }
}

/// `true`/`false` and the usual yes/no spellings.
#[derive(Debug, Clone, Copy, Default)]
pub struct BoolProvider;

const TRUE_WORDS: [&str; 6] = ["true", "yes", "on", "y", "1", "t"];
const FALSE_WORDS: [&str; 6] = ["false", "no", "off", "n", "0", "f"];

impl Provider<bool> for BoolProvider {
    fn get(&self, args: &mut CommandArgs<'_>, _: &Modifiers) -> Result<bool, CommandError> {
        let token = args.next()?;
        let lower = token.to_ascii_lowercase();
        if TRUE_WORDS.contains(&lower.as_str()) {
            Ok(true)
        } else if FALSE_WORDS.contains(&lower.as_str()) {
            Ok(false)
        } else {
            Err(ParseError::invalid(token, "You must enter true or false").into())
        }
    }

    fn suggestions(&self, prefix: &str, _: &Namespace) -> Vec<String> {
        ["true", "false"]
            .iter()
            .filter(|word| word.starts_with(&prefix.to_ascii_lowercase()))
            .map(|word| word.to_string())
            .collect()
    }
}

/// Exactly one character.
#[derive(Debug, Clone, Copy, Default)]
pub struct CharProvider;

impl Provider<char> for CharProvider {
    fn get(&self, args: &mut CommandArgs<'_>, _: &Modifiers) -> Result<char, CommandError> {
        let token = args.next()?;
        let mut chars = token.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) => Ok(c),
            _ => Err(ParseError::invalid(token, "You must enter exactly one character").into()),
        }
    }
}

// ============================================================================
// Numbers
// ============================================================================

/// Numeric types [`NumberProvider`] can produce.
pub trait Number: std::str::FromStr + Copy + Send + Sync + 'static {
    /// Smallest and largest representable value, as reported to the user.
    const BOUNDS: (f64, f64);

    fn to_f64(self) -> f64;

    /// Convert a finite value, truncating any fraction. `None` when the
    /// result does not fit.
    fn from_f64(value: f64) -> Option<Self>;
}

macro_rules! integer {
    ($($ty:ty => $exclusive_max:expr),+) => {
        $(
            impl Number for $ty {
                const BOUNDS: (f64, f64) = (<$ty>::MIN as f64, <$ty>::MAX as f64);

                fn to_f64(self) -> f64 {
                    self as f64
                }

                fn from_f64(value: f64) -> Option<Self> {
                    // `MAX as f64` can round up to the first value past MAX, so
                    // compare against the exact exclusive bound.
                    let value = value.trunc();
                    (value >= <$ty>::MIN as f64 && value < $exclusive_max).then(|| value as $ty)
                }
            }
        )+
    };
}

macro_rules! signed {
    ($($ty:ty),+) => {
        integer!($($ty => -(<$ty>::MIN as f64)),+);
    };
}

macro_rules! unsigned {
    ($($ty:ty),+) => {
        integer!($($ty => (<$ty>::MAX / 2 + 1) as f64 * 2.0),+);
    };
}

signed!(i8, i16, i32, i64, i128, isize);
unsigned!(u8, u16, u32, u64, u128, usize);

impl Number for f32 {
    const BOUNDS: (f64, f64) = (f32::MIN as f64, f32::MAX as f64);

    fn to_f64(self) -> f64 {
        self as f64
    }

    fn from_f64(value: f64) -> Option<Self> {
        let narrowed = value as f32;
        narrowed.is_finite().then_some(narrowed)
    }
}

impl Number for f64 {
    const BOUNDS: (f64, f64) = (f64::MIN, f64::MAX);

    fn to_f64(self) -> f64 {
        self
    }

    fn from_f64(value: f64) -> Option<Self> {
        value.is_finite().then_some(value)
    }
}

/// Parses numbers and checks every [`Range`] modifier.
///
/// Input that is not valid for `T` but is a valid decimal is accepted and
/// truncated, so `"2.7"` gives `2` for integer types. A decimal that does
/// not fit `T` is `OverRange` or `UnderRange`, never clamped.
#[derive(Debug)]
pub struct NumberProvider<T> {
    _marker: PhantomData<fn() -> T>,
}

impl<T> NumberProvider<T> {
    pub fn new() -> Self {
        Self {
            _marker: PhantomData,
        }
    }
}

impl<T> Default for NumberProvider<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Clone for NumberProvider<T> {
    fn clone(&self) -> Self {
        Self::new()
    }
}

impl<T: Number> Provider<T> for NumberProvider<T> {
    fn get(&self, args: &mut CommandArgs<'_>, modifiers: &Modifiers) -> Result<T, CommandError> {
        let token = args.next()?;
        let value = parse_number::<T>(&token)?;
        check_ranges(value.to_f64(), modifiers)?;
        Ok(value)
    }
}

fn parse_number<T: Number>(token: &str) -> Result<T, ParseError> {
    let nonnumerical = || NonnumericalInput {
        input: token.to_string(),
    };

    if let Ok(value) = token.parse::<T>() {
        if value.to_f64().is_finite() {
            return Ok(value);
        }
    }

    let value = token.parse::<f64>().map_err(|_| nonnumerical())?;
    // "inf" and "NaN" are not numbers; "1e400" is a number out of range.
    if value.is_nan() || (value.is_infinite() && token.to_ascii_lowercase().contains("inf")) {
        return Err(nonnumerical().into());
    }

    match T::from_f64(value) {
        Some(number) => Ok(number),
        None => {
            let (minimum, maximum) = T::BOUNDS;
            if value < 0.0 {
                Err(UnderRange { input: value, minimum }.into())
            } else {
                Err(OverRange { input: value, maximum }.into())
            }
        }
    }
}

fn check_ranges(value: f64, modifiers: &Modifiers) -> Result<(), ParseError> {
    for range in modifiers.iter_of::<Range>() {
        if value < range.min {
            return Err(UnderRange {
                input: value,
                minimum: range.min,
            }
            .into());
        }
        if value > range.max {
            return Err(OverRange {
                input: value,
                maximum: range.max,
            }
            .into());
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ArgumentError, ArgumentParseError};

    fn get<T, P: Provider<T>>(provider: P, line: &str, modifiers: &Modifiers) -> Result<T, CommandError> {
        let namespace = Namespace::new();
        let mut args = CommandArgs::new(crate::argument::split(line), &namespace);
        provider.get(&mut args, modifiers)
    }

    fn parse_error(error: CommandError) -> ParseError {
        match error {
            CommandError::Argument(ArgumentError::Parse(ArgumentParseError { error, .. })) => error,
            other => panic!("expected a parse error, got {:?}", other),
        }
    }

    #[test]
    fn test_numbers() {
        let none = Modifiers::new();
        assert_eq!(get(NumberProvider::<i32>::new(), "-12", &none).unwrap(), -12);
        assert_eq!(get(NumberProvider::<i32>::new(), "2.7", &none).unwrap(), 2);
        assert_eq!(get(NumberProvider::<f64>::new(), "167", &none).unwrap(), 167.0);

        let err = parse_error(get(NumberProvider::<f64>::new(), "hot", &none).unwrap_err());
        assert!(matches!(err, ParseError::Nonnumerical(_)));

        let err = parse_error(get(NumberProvider::<f64>::new(), "NaN", &none).unwrap_err());
        assert!(matches!(err, ParseError::Nonnumerical(_)));

        let err = parse_error(get(NumberProvider::<u8>::new(), "300", &none).unwrap_err());
        assert!(matches!(err, ParseError::OverRange(OverRange { maximum, .. }) if maximum == 255.0));

        let err = parse_error(get(NumberProvider::<f64>::new(), "-inf", &none).unwrap_err());
        assert!(matches!(err, ParseError::Nonnumerical(_)));
    }

    #[test]
    fn test_integer_limits_are_exact() {
        let none = Modifiers::new();
        assert_eq!(
            get(NumberProvider::<i64>::new(), "9223372036854775807", &none).unwrap(),
            i64::MAX
        );
        assert_eq!(
            get(NumberProvider::<i64>::new(), "-9223372036854775808", &none).unwrap(),
            i64::MIN
        );
        assert_eq!(get(NumberProvider::<i32>::new(), "2147483647.9", &none).unwrap(), i32::MAX);

        let err = parse_error(get(NumberProvider::<i64>::new(), "9223372036854775808", &none).unwrap_err());
        assert!(matches!(err, ParseError::OverRange(_)));
        let err = parse_error(get(NumberProvider::<u64>::new(), "18446744073709551616", &none).unwrap_err());
        assert!(matches!(err, ParseError::OverRange(_)));
        let err = parse_error(get(NumberProvider::<u32>::new(), "-1", &none).unwrap_err());
        assert!(matches!(err, ParseError::UnderRange(UnderRange { minimum, .. }) if minimum == 0.0));
        assert_eq!(get(NumberProvider::<u8>::new(), "-0.5", &none).unwrap(), 0);
    }

    #[test]
    fn test_float_overflow_is_out_of_range() {
        let none = Modifiers::new();
        let err = parse_error(get(NumberProvider::<f32>::new(), "1e39", &none).unwrap_err());
        assert!(matches!(err, ParseError::OverRange(_)));
        let err = parse_error(get(NumberProvider::<f32>::new(), "-1e39", &none).unwrap_err());
        assert!(matches!(err, ParseError::UnderRange(_)));
        let err = parse_error(get(NumberProvider::<f64>::new(), "1e400", &none).unwrap_err());
        assert!(matches!(err, ParseError::OverRange(_)));
        assert_eq!(get(NumberProvider::<f32>::new(), "3.4e38", &none).unwrap(), 3.4e38);
    }

    #[test]
    fn test_range_modifier() {
        let mut modifiers = Modifiers::new();
        modifiers.push(Range::new(0.0, 100.0));

        assert_eq!(get(NumberProvider::<u32>::new(), "100", &modifiers).unwrap(), 100);
        let err = parse_error(get(NumberProvider::<i32>::new(), "-1", &modifiers).unwrap_err());
        assert_eq!(
            err.to_string(),
            "A valid value is greater than or equal to 0 (you entered -1)"
        );
        let err = parse_error(get(NumberProvider::<f32>::new(), "100.5", &modifiers).unwrap_err());
        assert!(matches!(err, ParseError::OverRange(_)));
    }

    #[test]
    fn test_string_validation() {
        let mut modifiers = Modifiers::new();
        modifiers.push(Validate::new("[a-z]+").unwrap());

        assert_eq!(get(StringProvider, "pluto", &modifiers).unwrap(), "pluto");
        let err = parse_error(get(StringProvider, "Pluto9", &modifiers).unwrap_err());
        match err {
            ParseError::StringFormat(e) => {
                assert_eq!(e.input, "Pluto9");
                assert_eq!(e.format, "[a-z]+");
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_bool_and_char() {
        let none = Modifiers::new();
        assert!(get(BoolProvider, "Yes", &none).unwrap());
        assert!(!get(BoolProvider, "off", &none).unwrap());
        assert!(get(BoolProvider, "maybe", &none).is_err());
        assert_eq!(get(CharProvider, "x", &none).unwrap(), 'x');
        assert!(get(CharProvider, "xy", &none).is_err());

        assert_eq!(BoolProvider.suggestions("T", &Namespace::new()), vec!["true"]);
    }

    #[test]
    fn test_primitives_module() {
        let mut registry = BindingRegistry::new();
        bind_primitives(&mut registry).unwrap();
        assert_eq!(registry.len(), 17);
        assert!(registry.lookup(&crate::Key::of::<u64>()).is_some());
        assert!(matches!(
            bind_primitives(&mut registry),
            Err(SetupError::DuplicateBinding { .. })
        ));
    }
}
