//! Message bundles and the localized exception converter.

use cmdgraph::error::{
    AlreadyPresentFlag, ArgumentError, ArgumentParseError, FlagError, InvalidInput, InvalidUsage,
    MissingArgument, MissingFlagValue, NoMatchInEnum, NonnumericalInput, OverRange, ParseError,
    StringFormat, UnderRange, UnusedArgument,
};
use cmdgraph::{
    BundleResourceProvider, CommandError, ExceptionContext, ExceptionConverter, HandlerTable,
    Messages,
};

const EN: &str = r#"
# Descriptions
body.desc = Manage celestial bodies
body.info.desc = Show what is known about a body
body.settype.desc = Change the type of a body
body.settemp.desc = Set the mean surface temperature of a body
body.setdesc.desc = Set the description of a body
body.delete.desc = Remove a body from the universe
whoami.desc = Show who you are

# Dispatch and invocation
subcommand.none = There are no sub-commands here.
subcommand.choose = Please choose a sub-command: {0}
subcommand.unknown = Unknown sub-command '{0}'. Choose one of: {1}
error.no-permission = You are not permitted to do that.
error.internal = An internal error occurred. See the log for details.
error.interrupted = The command was interrupted.

# Arguments
parameter.argument.missing = Too few arguments! No value found for '{0}'.
parameter.argument.missing.unknown = Too few arguments!
parameter.argument.unused = Too many arguments! Unused: {0}
parameter.flag.value.missing = The flag is missing its value.
parameter.flag.value.already-given = The flag was given more than once.
parameter.error = Error in '{0}': {1}
parameter.error.unknown = Error: {0}
primitives.invalid.format = The text does not match {0}.
primitives.invalid.non-number = '{0}' is not a number.
primitives.invalid.greater-or-equal = The value must be at most {0} (you entered {1}).
primitives.invalid.less-or-equal = The value must be at least {0} (you entered {1}).
enum.no-matching-value = Not a valid {0}.
"#;

const DE: &str = r#"
body.desc = Himmelskoerper verwalten
body.info.desc = Zeigt alles Bekannte ueber einen Himmelskoerper
body.settype.desc = Aendert den Typ eines Himmelskoerpers
body.settemp.desc = Setzt die mittlere Oberflaechentemperatur
body.setdesc.desc = Setzt die Beschreibung eines Himmelskoerpers
body.delete.desc = Entfernt einen Himmelskoerper
whoami.desc = Zeigt, wer du bist

subcommand.none = Hier gibt es keine Unterbefehle.
subcommand.choose = Bitte waehle einen Unterbefehl: {0}
subcommand.unknown = Unbekannter Unterbefehl '{0}'. Moeglich sind: {1}
error.no-permission = Dazu fehlt dir die Berechtigung.
error.internal = Ein interner Fehler ist aufgetreten.
error.interrupted = Der Befehl wurde abgebrochen.

parameter.argument.missing = Zu wenige Argumente! Es fehlt '{0}'.
parameter.argument.missing.unknown = Zu wenige Argumente!
parameter.argument.unused = Zu viele Argumente! Uebrig: {0}
parameter.flag.value.missing = Dem Flag fehlt ein Wert.
parameter.flag.value.already-given = Das Flag wurde mehrfach angegeben.
parameter.error = Fehler bei '{0}': {1}
parameter.error.unknown = Fehler: {0}
primitives.invalid.non-number = '{0}' ist keine Zahl.
enum.no-matching-value = Kein gueltiger Wert fuer {0}.
"#;

/// English and German bundles, falling back to English.
pub fn resources(locale: &str) -> BundleResourceProvider {
    BundleResourceProvider::new(locale)
        .fallback("en")
        .properties("en", EN)
        .properties("de", DE)
        .translate_descriptions(true)
}

/// Localized messages for argument and flag failures. Parse failures are
/// delegated to [`argument_converter`]; anything else is left to the default
/// converter.
pub fn converter(messages: Messages) -> HandlerTable {
    let missing = messages.clone();
    let unused = messages.clone();
    let no_value = messages.clone();
    let twice = messages.clone();
    let arguments = argument_converter(messages);

    HandlerTable::builder()
        .on::<MissingArgument>(move |e, ctx| {
            let message = match &e.parameter {
                Some(parameter) => missing.format("parameter.argument.missing", &[&parameter.name]),
                None => missing.get("parameter.argument.missing.unknown"),
            };
            usage(message, ctx, e.clone().into(), false)
        })
        .on::<UnusedArgument>(move |e, ctx| {
            let message = unused.format("parameter.argument.unused", &[&e.unconsumed.join(" ")]);
            usage(message, ctx, e.clone().into(), false)
        })
        .on::<MissingFlagValue>(move |e, ctx| {
            let message = no_value.get("parameter.flag.value.missing");
            usage(message, ctx, FlagError::from(e.clone()).into(), true)
        })
        .on::<AlreadyPresentFlag>(move |e, ctx| {
            let message = twice.get("parameter.flag.value.already-given");
            usage(message, ctx, FlagError::from(e.clone()).into(), true)
        })
        .try_on::<ArgumentParseError>(move |e, ctx| {
            arguments.convert(&ArgumentError::from(e.clone()).into(), ctx)
        })
        .build()
}

/// Localized messages for values a provider rejected, one handler per
/// parse failure.
pub fn argument_converter(messages: Messages) -> HandlerTable {
    let format = messages.clone();
    let number = messages.clone();
    let over = messages.clone();
    let under = messages.clone();
    let choice = messages.clone();
    let invalid = messages;

    HandlerTable::builder()
        .on::<StringFormat>(move |e, ctx| {
            let detail = format.format("primitives.invalid.format", &[&e.format]);
            parse_usage(&format, detail, ctx, e.clone().into())
        })
        .on::<NonnumericalInput>(move |e, ctx| {
            let detail = number.format("primitives.invalid.non-number", &[&e.input]);
            parse_usage(&number, detail, ctx, e.clone().into())
        })
        .on::<OverRange>(move |e, ctx| {
            let detail = over.format("primitives.invalid.greater-or-equal", &[&e.maximum, &e.input]);
            parse_usage(&over, detail, ctx, e.clone().into())
        })
        .on::<UnderRange>(move |e, ctx| {
            let detail = under.format("primitives.invalid.less-or-equal", &[&e.minimum, &e.input]);
            parse_usage(&under, detail, ctx, e.clone().into())
        })
        .on::<NoMatchInEnum>(move |e, ctx| {
            let detail = choice.format("enum.no-matching-value", &[&e.enum_name]);
            parse_usage(&choice, detail, ctx, e.clone().into())
        })
        .on::<InvalidInput>(move |e, ctx| {
            parse_usage(&invalid, e.message.clone(), ctx, e.clone().into())
        })
        .build()
}

/// "Error in 'temp': ..." for the parameter being parsed.
fn parse_usage(
    messages: &Messages,
    detail: String,
    ctx: &ExceptionContext,
    cause: ParseError,
) -> CommandError {
    let message = match ctx.parameter() {
        Some(parameter) => messages.format("parameter.error", &[&parameter.name, &detail]),
        None => messages.format("parameter.error.unknown", &[&detail]),
    };
    InvalidUsage::new(message, ctx.command().clone(), ctx.alias_stack())
        .with_cause(cause.into())
        .into()
}

fn usage(message: String, ctx: &ExceptionContext, cause: CommandError, full_help: bool) -> CommandError {
    InvalidUsage::new(message, ctx.command().clone(), ctx.alias_stack())
        .suggest_full_help(full_help)
        .with_cause(cause)
        .into()
}
