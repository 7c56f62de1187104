//! Clap-backed console engine.
//!
//! [`ConsoleApp`] is the default [`Runner`]: it keeps the registered commands
//! in a name-keyed registry, parses each invocation with the target command's
//! clap definition, and tees everything a command writes into both the
//! caller's sink and a last-output capture buffer.
//!
//! The engine raises recoverable errors (unknown command, argument parse
//! failure, command error) as `anyhow::Error`; it never converts them to exit
//! codes itself. That conversion is the kernel's job.

use std::collections::BTreeMap;
use std::io::{self, Write};
use std::sync::Arc;

use anyhow::anyhow;
use serde_json::Value;

use crate::command::{Command, CommandMeta, Parameters};
use crate::events::ConsoleEvents;
use crate::invocation::Invocation;
use crate::runner::{EngineConfig, Runner};

/// The default console engine.
pub struct ConsoleApp {
    version: String,
    events: Arc<dyn ConsoleEvents>,
    commands: BTreeMap<String, Box<dyn Command>>,
    last_output: String,
}

impl ConsoleApp {
    /// The engine's identity string (host application version).
    pub fn version(&self) -> &str {
        &self.version
    }

    fn execute(&mut self, name: &str, argv: Vec<String>, sink: &mut dyn Write) -> anyhow::Result<i32> {
        let command = self
            .commands
            .get_mut(name)
            .ok_or_else(|| anyhow!("command \"{name}\" is not defined"))?;
        let matches = command.definition().try_get_matches_from(&argv)?;

        self.last_output.clear();
        let mut tee = Tee {
            sink,
            capture: &mut self.last_output,
        };

        self.events.command_starting(name);
        let code = command.execute(&matches, &mut tee)?;
        self.events.command_finished(name, code);
        Ok(code)
    }
}

impl Runner for ConsoleApp {
    fn boot(config: EngineConfig) -> Self {
        Self {
            version: config.version,
            events: config.events,
            commands: BTreeMap::new(),
            last_output: String::new(),
        }
    }

    fn register(&mut self, commands: Vec<Box<dyn Command>>, replace: bool) {
        for command in commands {
            let name = command.definition().get_name().to_string();
            if !replace && self.commands.contains_key(&name) {
                continue;
            }
            self.commands.insert(name, command);
        }
    }

    fn run(&mut self, input: &Invocation, sink: &mut dyn Write) -> anyhow::Result<i32> {
        let name = input
            .command()
            .ok_or_else(|| anyhow!("empty input line"))?
            .to_string();
        self.execute(&name, input.tokens().to_vec(), sink)
    }

    fn call(&mut self, name: &str, parameters: &Parameters) -> anyhow::Result<i32> {
        let argv = argv_from_parameters(name, parameters);
        let mut discard = io::sink();
        self.execute(name, argv, &mut discard)
    }

    fn all(&self) -> BTreeMap<String, CommandMeta> {
        self.commands
            .iter()
            .map(|(name, command)| (name.clone(), CommandMeta::from_definition(&command.definition())))
            .collect()
    }

    fn output(&self) -> String {
        self.last_output.clone()
    }
}

/// Translates a parameter map into argv tokens.
///
/// `--key` entries become options: `true` a bare flag, `false` omitted,
/// arrays repeated, everything else `--key <value>`. Other keys contribute
/// positional values in map order.
fn argv_from_parameters(name: &str, parameters: &Parameters) -> Vec<String> {
    let mut argv = vec![name.to_string()];
    for (key, value) in parameters {
        if key.starts_with("--") {
            match value {
                Value::Bool(true) => argv.push(key.clone()),
                Value::Bool(false) => {}
                Value::Array(items) => {
                    for item in items {
                        argv.push(key.clone());
                        argv.push(scalar(item));
                    }
                }
                other => {
                    argv.push(key.clone());
                    argv.push(scalar(other));
                }
            }
        } else {
            argv.push(scalar(value));
        }
    }
    argv
}

fn scalar(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

/// Writes through to the caller's sink while recording into the capture
/// buffer. Only bytes the sink accepted are recorded.
struct Tee<'a> {
    sink: &'a mut dyn Write,
    capture: &'a mut String,
}

impl Write for Tee<'_> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let written = self.sink.write(buf)?;
        self.capture
            .push_str(&String::from_utf8_lossy(&buf[..written]));
        Ok(written)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.sink.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::FnCommand;
    use crate::events::NullDispatcher;
    use clap::{Arg, ArgAction, Command as CommandDefinition};
    use std::sync::atomic::{AtomicI32, Ordering};
    use std::sync::Mutex;

    fn engine() -> ConsoleApp {
        ConsoleApp::boot(EngineConfig {
            version: "9.1.0".into(),
            events: Arc::new(NullDispatcher),
        })
    }

    fn greet() -> Box<dyn Command> {
        Box::new(FnCommand::new(
            CommandDefinition::new("greet").arg(Arg::new("name").required(true)),
            |matches, out| {
                let name: &String = matches.get_one("name").expect("required arg");
                writeln!(out, "Hello {name}")?;
                Ok(0)
            },
        ))
    }

    fn params(value: Value) -> Parameters {
        value.as_object().cloned().unwrap_or_default()
    }

    #[test]
    fn test_boot_keeps_version() {
        assert_eq!(engine().version(), "9.1.0");
    }

    #[test]
    fn test_run_writes_to_sink_and_capture() {
        let mut app = engine();
        app.register(vec![greet()], true);

        let mut sink = Vec::new();
        let code = app
            .run(&Invocation::new(["greet", "Ada"]), &mut sink)
            .unwrap();

        assert_eq!(code, 0);
        assert_eq!(String::from_utf8(sink).unwrap(), "Hello Ada\n");
        assert_eq!(app.output(), "Hello Ada\n");
    }

    #[test]
    fn test_run_unknown_command_is_recoverable_error() {
        let mut app = engine();
        let mut sink = Vec::new();
        let err = app.run(&Invocation::new(["nope"]), &mut sink).unwrap_err();
        assert!(err.to_string().contains("\"nope\" is not defined"));
    }

    #[test]
    fn test_run_empty_input_is_recoverable_error() {
        let mut app = engine();
        let mut sink = Vec::new();
        let err = app.run(&Invocation::default(), &mut sink).unwrap_err();
        assert!(err.to_string().contains("empty input line"));
    }

    #[test]
    fn test_run_parse_failure_is_recoverable_error() {
        let mut app = engine();
        app.register(vec![greet()], true);

        let mut sink = Vec::new();
        let result = app.run(&Invocation::new(["greet"]), &mut sink);
        assert!(result.is_err());
    }

    #[test]
    fn test_parse_failure_keeps_previous_capture() {
        let mut app = engine();
        app.register(vec![greet()], true);

        let mut sink = Vec::new();
        app.run(&Invocation::new(["greet", "Ada"]), &mut sink)
            .unwrap();
        let _ = app.run(&Invocation::new(["greet"]), &mut sink);

        assert_eq!(app.output(), "Hello Ada\n");
    }

    #[test]
    fn test_call_translates_positional_parameters() {
        let mut app = engine();
        app.register(vec![greet()], true);

        let code = app
            .call("greet", &params(serde_json::json!({"name": "Ada"})))
            .unwrap();

        assert_eq!(code, 0);
        assert_eq!(app.output(), "Hello Ada\n");
    }

    #[test]
    fn test_call_translates_options_and_flags() {
        let recorded = Arc::new(Mutex::new(Vec::new()));
        let seen = recorded.clone();
        let mut app = engine();
        app.register(
            vec![Box::new(FnCommand::new(
                CommandDefinition::new("deploy")
                    .arg(Arg::new("target").long("target"))
                    .arg(Arg::new("force").long("force").action(ArgAction::SetTrue))
                    .arg(Arg::new("dry-run").long("dry-run").action(ArgAction::SetTrue)),
                move |matches, _out| {
                    seen.lock().unwrap().push((
                        matches.get_one::<String>("target").cloned(),
                        matches.get_flag("force"),
                        matches.get_flag("dry-run"),
                    ));
                    Ok(0)
                },
            ))],
            true,
        );

        app.call(
            "deploy",
            &params(serde_json::json!({
                "--target": "prod",
                "--force": true,
                "--dry-run": false,
            })),
        )
        .unwrap();

        let calls = recorded.lock().unwrap();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0], (Some("prod".to_string()), true, false));
    }

    #[test]
    fn test_argv_from_parameters_repeats_array_options() {
        let argv = argv_from_parameters(
            "tail",
            &params(serde_json::json!({"--file": ["a.log", "b.log"]})),
        );
        assert_eq!(argv, ["tail", "--file", "a.log", "--file", "b.log"]);
    }

    #[test]
    fn test_argv_from_parameters_stringifies_numbers() {
        let argv = argv_from_parameters("take", &params(serde_json::json!({"--count": 5})));
        assert_eq!(argv, ["take", "--count", "5"]);
    }

    #[test]
    fn test_register_replaces_same_named_command() {
        let mut app = engine();
        app.register(
            vec![Box::new(FnCommand::new(
                CommandDefinition::new("version").about("old"),
                |_matches, _out| Ok(1),
            ))],
            true,
        );
        app.register(
            vec![Box::new(FnCommand::new(
                CommandDefinition::new("version").about("new"),
                |_matches, _out| Ok(0),
            ))],
            true,
        );

        let all = app.all();
        assert_eq!(all.len(), 1);
        assert_eq!(all["version"].about.as_deref(), Some("new"));

        let mut sink = Vec::new();
        assert_eq!(app.run(&Invocation::new(["version"]), &mut sink).unwrap(), 0);
    }

    #[test]
    fn test_register_without_replace_keeps_existing() {
        let mut app = engine();
        app.register(
            vec![Box::new(FnCommand::new(
                CommandDefinition::new("version").about("old"),
                |_matches, _out| Ok(0),
            ))],
            true,
        );
        app.register(
            vec![Box::new(FnCommand::new(
                CommandDefinition::new("version").about("new"),
                |_matches, _out| Ok(0),
            ))],
            false,
        );

        assert_eq!(app.all()["version"].about.as_deref(), Some("old"));
    }

    #[test]
    fn test_all_lists_registered_commands_by_name() {
        let mut app = engine();
        app.register(vec![greet()], true);
        app.register(
            vec![Box::new(FnCommand::new(
                CommandDefinition::new("list").about("List things"),
                |_matches, _out| Ok(0),
            ))],
            true,
        );

        let all = app.all();
        let names: Vec<_> = all.keys().cloned().collect();
        assert_eq!(names, ["greet", "list"]);
    }

    #[test]
    fn test_output_empty_before_any_run() {
        assert_eq!(engine().output(), "");
    }

    #[test]
    fn test_events_fire_around_execution() {
        #[derive(Default)]
        struct Recorder {
            started: Mutex<Vec<String>>,
            finished: AtomicI32,
        }
        impl ConsoleEvents for Recorder {
            fn command_starting(&self, command: &str) {
                self.started.lock().unwrap().push(command.to_string());
            }
            fn command_finished(&self, _command: &str, exit_code: i32) {
                self.finished.store(exit_code, Ordering::SeqCst);
            }
        }

        let recorder = Arc::new(Recorder::default());
        let mut app = ConsoleApp::boot(EngineConfig {
            version: "9.1.0".into(),
            events: recorder.clone(),
        });
        app.register(
            vec![Box::new(FnCommand::new(
                CommandDefinition::new("noop"),
                |_matches, _out| Ok(7),
            ))],
            true,
        );

        let mut sink = Vec::new();
        app.run(&Invocation::new(["noop"]), &mut sink).unwrap();

        assert_eq!(*recorder.started.lock().unwrap(), ["noop"]);
        assert_eq!(recorder.finished.load(Ordering::SeqCst), 7);
    }
}
