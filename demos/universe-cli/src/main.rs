//! `universe`: drives a cmdgraph command tree over a toy solar system.
//!
//! Without arguments it replays a scripted session. Otherwise every
//! positional argument is one command line:
//!
//! ```text
//! universe "body info pluto" "body settemp mercury 167"
//! universe --locale de "body settype pluto unknown"
//! universe --tree
//! universe --complete "body settype pluto d"
//! ```

mod commands;
mod lang;
mod universe;

use std::process::ExitCode;

use anstyle::{AnsiColor, Style};
use anyhow::Context;
use clap::Parser;
use cmdgraph::error::UsageError;
use cmdgraph::provider::bind_primitives;
use cmdgraph::{
    init_subscriber_with_config, AliasCase, BindingRegistry, CancelFlag, CommandCallable, CommandError,
    CommandGraph, Dispatcher, Messages, Namespace, ParametricBuilder, TracingConfig,
    TracingFormat,
};

use crate::commands::{whoami, UniverseCommands};
use crate::universe::{subject_authorizer, Subject, Universe, UniverseModule};

const SCRIPT: &[&str] = &[
    "body info pluto",
    "body settype pluto dwarfplanet",
    "body info pluto",
    "body settype poseidon planet",
    "body settype pluto unknown",
    "body settemp mercury 167",
    "body setdesc mercury Closest to the Sun",
    "body info mercury",
    "body info -f mercury",
    "body settemp earth 59 -f",
    "body info earth",
    "body settemp earth -r",
    "body",
    "body orbit earth",
    "body delete earth",
    "whoami",
];

#[derive(Parser, Debug)]
#[command(name = "universe", version, about = "Command graph demo over a toy solar system")]
struct Cli {
    /// Command lines to run, e.g. "body info pluto"
    lines: Vec<String>,

    /// Message and description language (en, de)
    #[arg(long, env = "UNIVERSE_LOCALE", default_value = "en")]
    locale: String,

    /// Match command aliases regardless of case
    #[arg(long)]
    ignore_case: bool,

    /// Permissions granted to the acting user
    #[arg(
        long = "permit",
        value_delimiter = ',',
        default_value = "body.info,body.settype,body.settemp,body.setdesc"
    )]
    permissions: Vec<String>,

    /// Print the command tree as JSON and exit
    #[arg(long)]
    tree: bool,

    /// Print completions for a partial command line and exit
    #[arg(long, value_name = "LINE")]
    complete: Option<String>,

    /// Log filter directives (defaults to RUST_LOG)
    #[arg(long, env = "UNIVERSE_LOG")]
    log_filter: Option<String>,

    /// Log format: pretty, compact or json
    #[arg(long, default_value = "compact")]
    log_format: TracingFormat,
}

fn build_graph(cli: &Cli, universe: &Universe) -> anyhow::Result<Dispatcher> {
    let mut registry = BindingRegistry::new();
    bind_primitives(&mut registry)?;
    registry.install(UniverseModule {
        universe: universe.clone(),
    })?;

    let resources = lang::resources(&cli.locale);
    let builder = ParametricBuilder::new(registry)
        .authorizer(subject_authorizer)
        .add_converter(lang::converter(Messages::new(resources.clone())))
        .resources(resources);

    let case = if cli.ignore_case {
        AliasCase::Insensitive
    } else {
        AliasCase::Sensitive
    };

    let dispatcher = CommandGraph::new(builder)
        .alias_case(case)
        .commands()
        .register(whoami())
        .group(["body", "b"])
        .describe("body.desc")
        .register_methods(UniverseCommands)
        .parent()
        .graph()
        .build()
        .context("invalid command graph")?;
    Ok(dispatcher)
}

fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();
    init_subscriber_with_config(TracingConfig {
        filter: cli.log_filter.clone(),
        format: cli.log_format,
        ..TracingConfig::default()
    })?;

    let universe = Universe::solar_system();
    let root = build_graph(&cli, &universe)?;

    let mut subject = Subject::new("example_user");
    for permission in &cli.permissions {
        subject.permit(permission.clone());
    }
    let mut namespace = Namespace::new();
    namespace.insert(subject);
    namespace.insert(CancelFlag::new());

    if cli.tree {
        let summary = root.summary(&[]);
        println!("{}", serde_json::to_string_pretty(&summary)?);
        return Ok(ExitCode::SUCCESS);
    }

    if let Some(line) = &cli.complete {
        for suggestion in root.suggestions(line, &namespace) {
            println!("{}", suggestion);
        }
        return Ok(ExitCode::SUCCESS);
    }

    let messages = Messages::new(lang::resources(&cli.locale));
    let lines: Vec<String> = if cli.lines.is_empty() {
        SCRIPT.iter().map(|line| line.to_string()).collect()
    } else {
        cli.lines.clone()
    };

    let prompt = Style::new().bold();
    let mut exit_code = 0;
    for line in &lines {
        println!();
        println!("{}/{}{}", prompt.render(), line, prompt.render_reset());
        if let Err(error) = root.call(line, &mut namespace, &[]) {
            report(&error, &messages);
            exit_code = exit_code.max(error.exit_code());
        }
    }

    Ok(ExitCode::from(u8::try_from(exit_code).unwrap_or(1)))
}

/// Print `error` for the user.
fn report(error: &CommandError, messages: &Messages) {
    let style = if error.is_user_error() {
        Style::new().fg_color(Some(AnsiColor::Yellow.into()))
    } else {
        Style::new().fg_color(Some(AnsiColor::Red.into())).bold()
    };

    let text = match error {
        CommandError::NoSubcommands(_) => messages.get("subcommand.none"),
        CommandError::Usage(UsageError::SubcommandRequired(e)) => {
            messages.format("subcommand.choose", &[&e.subcommands.join(", ")])
        }
        CommandError::Usage(UsageError::CommandNotFound(e)) => messages.format(
            "subcommand.unknown",
            &[&e.alias, &e.subcommands.join(", ")],
        ),
        CommandError::Usage(UsageError::Invalid(e)) => {
            let mut text = e.message.clone();
            if e.full_help_suggested {
                if let Some(help) = e.command.help_or_short() {
                    text.push('\n');
                    text.push_str(help);
                }
                text.push_str(&format!("\nUsage: {}", e.command.usage));
            }
            text
        }
        CommandError::Failed(e) => e.message.clone(),
        CommandError::Authorization(_) => messages.get("error.no-permission"),
        CommandError::Invocation(e) if e.is_interrupted() => messages.get("error.interrupted"),
        other => {
            tracing::warn!(error = %other, "unexpected failure while executing a command");
            messages.get("error.internal")
        }
    };

    eprintln!("{}{}{}", style.render(), text, style.render_reset());
}
