//! The registry/runner boundary the kernel drives.
//!
//! [`Runner`] is the contract between the dispatch facade and the console
//! engine behind it: registration of descriptors, execution of invocations,
//! and capture of the most recent run's output. [`crate::ConsoleApp`] is the
//! default implementation; hosts and tests can substitute their own.

use std::collections::BTreeMap;
use std::io::Write;
use std::sync::Arc;

use crate::command::{Command, CommandMeta, Parameters};
use crate::events::ConsoleEvents;
use crate::invocation::Invocation;

/// Everything an engine needs at boot time.
pub struct EngineConfig {
    /// Host application version, used as the engine's identity string.
    pub version: String,
    /// Event dispatcher notified around command execution.
    pub events: Arc<dyn ConsoleEvents>,
}

/// The console engine contract.
pub trait Runner {
    /// Builds an engine instance from the boot configuration.
    fn boot(config: EngineConfig) -> Self
    where
        Self: Sized;

    /// Registers descriptors under their declared names.
    ///
    /// With `replace`, a same-named newcomer wins; otherwise the existing
    /// registration is kept and the newcomer dropped.
    fn register(&mut self, commands: Vec<Box<dyn Command>>, replace: bool);

    /// Runs a parsed input line, writing human output to `sink`.
    fn run(&mut self, input: &Invocation, sink: &mut dyn Write) -> anyhow::Result<i32>;

    /// Runs a command by name with a parameter map, capturing its output.
    fn call(&mut self, name: &str, parameters: &Parameters) -> anyhow::Result<i32>;

    /// Metadata for every registered command, keyed by name.
    fn all(&self) -> BTreeMap<String, CommandMeta>;

    /// Captured output of the most recent run; empty before any run.
    fn output(&self) -> String;
}
