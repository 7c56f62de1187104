//! Command descriptors registered with the console engine.
//!
//! A command pairs a clap definition (name, about text, arguments) with the
//! code it runs. Commands do business logic and write human-readable text to
//! the sink they are given; parsing, routing, and output capture belong to
//! the engine.

use std::io::Write;

use clap::{ArgMatches, Command as CommandDefinition};
use serde::Serialize;

/// Exit code or error produced by a command body.
///
/// By convention 0 is success and nonzero is a command-reported failure.
/// Returning `Err` marks the run as failed and hands the error to the
/// kernel's failure boundary.
pub type CommandResult = anyhow::Result<i32>;

/// Parameter map for call-by-name invocations and queued jobs.
///
/// Keys starting with `--` are options (booleans become bare flags); other
/// keys contribute positional values in map order.
pub type Parameters = serde_json::Map<String, serde_json::Value>;

/// A single console command.
pub trait Command: Send {
    /// The clap definition declaring name, about text, and arguments.
    fn definition(&self) -> CommandDefinition;

    /// Executes with parsed arguments, writing human output to `out`.
    fn execute(&mut self, matches: &ArgMatches, out: &mut dyn Write) -> CommandResult;
}

/// Wrapper implementing [`Command`] for closures.
///
/// The closure takes `FnMut`, so commands can keep internal state across
/// runs the same way engine-registered handlers do in stateful CLIs.
///
/// # Example
///
/// ```rust,ignore
/// use clap::{Arg, Command as CommandDefinition};
/// use webterm_kernel::FnCommand;
///
/// let greet = FnCommand::new(
///     CommandDefinition::new("greet").arg(Arg::new("name").required(true)),
///     |matches, out| {
///         let name: &String = matches.get_one("name").expect("required");
///         writeln!(out, "Hello {name}")?;
///         Ok(0)
///     },
/// );
/// ```
pub struct FnCommand<F> {
    definition: CommandDefinition,
    run: F,
}

impl<F> FnCommand<F>
where
    F: FnMut(&ArgMatches, &mut dyn Write) -> CommandResult + Send,
{
    /// Creates a command from a clap definition and a closure body.
    pub fn new(definition: CommandDefinition, run: F) -> Self {
        Self { definition, run }
    }
}

impl<F> Command for FnCommand<F>
where
    F: FnMut(&ArgMatches, &mut dyn Write) -> CommandResult + Send,
{
    fn definition(&self) -> CommandDefinition {
        self.definition.clone()
    }

    fn execute(&mut self, matches: &ArgMatches, out: &mut dyn Write) -> CommandResult {
        (self.run)(matches, out)
    }
}

/// Serializable metadata describing a registered command.
///
/// This is the read-only view `all()` exposes; the executable descriptor
/// stays inside the engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommandMeta {
    /// Command name as declared by its clap definition.
    pub name: String,
    /// About text, when the definition declares one.
    pub about: Option<String>,
}

impl CommandMeta {
    pub(crate) fn from_definition(definition: &CommandDefinition) -> Self {
        Self {
            name: definition.get_name().to_string(),
            about: definition.get_about().map(|about| about.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fn_command_executes_closure() {
        let mut command = FnCommand::new(CommandDefinition::new("echo"), |_matches, out| {
            writeln!(out, "hi")?;
            Ok(0)
        });

        let matches = command.definition().get_matches_from(["echo"]);
        let mut out = Vec::new();
        let code = command.execute(&matches, &mut out).unwrap();

        assert_eq!(code, 0);
        assert_eq!(String::from_utf8(out).unwrap(), "hi\n");
    }

    #[test]
    fn test_fn_command_keeps_state_across_runs() {
        let mut count = 0u32;
        let mut command = FnCommand::new(CommandDefinition::new("inc"), move |_matches, _out| {
            count += 1;
            Ok(count as i32)
        });

        let matches = command.definition().get_matches_from(["inc"]);
        let mut out = Vec::new();
        assert_eq!(command.execute(&matches, &mut out).unwrap(), 1);
        assert_eq!(command.execute(&matches, &mut out).unwrap(), 2);
    }

    #[test]
    fn test_command_meta_from_definition() {
        let definition = CommandDefinition::new("list").about("List everything");
        let meta = CommandMeta::from_definition(&definition);

        assert_eq!(meta.name, "list");
        assert_eq!(meta.about.as_deref(), Some("List everything"));
    }

    #[test]
    fn test_command_meta_without_about() {
        let meta = CommandMeta::from_definition(&CommandDefinition::new("bare"));
        assert!(meta.about.is_none());
    }

    #[test]
    fn test_command_meta_serializes() {
        let meta = CommandMeta {
            name: "list".into(),
            about: None,
        };
        let json = serde_json::to_value(&meta).unwrap();
        assert_eq!(json["name"], "list");
    }
}
