//! The `body` command group.

use cmdgraph::{Command, CommandDef, CommandError, CommandSet, Namespace, Param, Range};

use crate::universe::{BodyName, CelestialType, Subject, Universe};

const ABSOLUTE_ZERO: f64 = -273.15;

fn to_fahrenheit(celsius: f64) -> f64 {
    celsius * 9.0 / 5.0 + 32.0
}

fn to_celsius(fahrenheit: f64) -> f64 {
    (fahrenheit - 32.0) * 5.0 / 9.0
}

pub struct UniverseCommands;

impl CommandSet for UniverseCommands {
    fn commands(&self) -> Vec<CommandDef> {
        vec![info(), set_type(), set_temp(), set_desc(), delete()]
    }
}

fn info() -> CommandDef {
    Command::new(["info", "i"])
        .desc("body.info.desc")
        .require(["body.info"])
        .handler(
            (
                Param::<Universe>::new("universe"),
                Param::<BodyName>::new("name"),
                Param::switch('f', "fahrenheit"),
            ),
            |_: &mut Namespace, (universe, name, fahrenheit): (Universe, BodyName, bool)| {
                let body = universe
                    .get(&name.0)
                    .ok_or_else(|| CommandError::failed(format!("'{}' vanished", name)))?;
                println!("{} is a {}", name, body.kind);
                if let Some(celsius) = body.temperature {
                    if fahrenheit {
                        println!("  temperature: {:.1} F", to_fahrenheit(celsius));
                    } else {
                        println!("  temperature: {:.1} C", celsius);
                    }
                }
                if let Some(description) = &body.description {
                    println!("  {}", description);
                }
                Ok(())
            },
        )
}

fn set_type() -> CommandDef {
    Command::new(["settype"])
        .desc("body.settype.desc")
        .require(["body.settype"])
        .handler(
            (
                Param::<Universe>::new("universe"),
                Param::<BodyName>::new("name"),
                Param::<CelestialType>::new("type"),
            ),
            |_: &mut Namespace, (universe, name, kind): (Universe, BodyName, CelestialType)| {
                universe.update(&name.0, |body| body.kind = kind)?;
                println!("{} is now a {}", name, kind);
                Ok(())
            },
        )
}

fn set_temp() -> CommandDef {
    Command::new(["settemp"])
        .desc("body.settemp.desc")
        .require(["body.settemp"])
        .handler(
            (
                Param::<Universe>::new("universe"),
                Param::<BodyName>::new("name"),
                Param::<f64>::new("temp").modifier(Range::at_least(to_fahrenheit(ABSOLUTE_ZERO))),
                Param::switch('f', "fahrenheit"),
            ),
            |namespace: &mut Namespace, (universe, name, temp, fahrenheit): (Universe, BodyName, f64, bool)| {
                let celsius = if fahrenheit { to_celsius(temp) } else { temp };
                if celsius < ABSOLUTE_ZERO {
                    return Err(CommandError::failed("Nothing is colder than absolute zero"));
                }
                namespace.check_cancelled()?;
                universe.update(&name.0, |body| body.temperature = Some(celsius))?;
                println!("{} is now {:.1} C", name, celsius);
                Ok(())
            },
        )
}

fn set_desc() -> CommandDef {
    Command::new(["setdesc"])
        .desc("body.setdesc.desc")
        .require(["body.setdesc"])
        .handler(
            (
                Param::<Universe>::new("universe"),
                Param::<BodyName>::new("name"),
                Param::<String>::new("description").text(),
            ),
            |_: &mut Namespace, (universe, name, description): (Universe, BodyName, String)| {
                universe.update(&name.0, |body| body.description = Some(description))?;
                println!("Description of {} updated", name);
                Ok(())
            },
        )
}

fn delete() -> CommandDef {
    Command::new(["delete"])
        .desc("body.delete.desc")
        .require(["body.delete"])
        .handler(
            (Param::<Universe>::new("universe"), Param::<BodyName>::new("name")),
            |_: &mut Namespace, (universe, name): (Universe, BodyName)| {
                universe.remove(&name.0);
                println!("{} is gone", name);
                Ok(())
            },
        )
}

/// Root-level command reporting the acting subject.
pub fn whoami() -> CommandDef {
    Command::new(["whoami"]).desc("whoami.desc").handler(
        Param::<Subject>::new("subject"),
        |_: &mut Namespace, subject: Subject| {
            println!("You are {}", subject.name);
            Ok(())
        },
    )
}
