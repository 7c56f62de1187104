//! Console lifecycle events.
//!
//! The kernel holds an event dispatcher and forwards it to the engine at
//! boot; the engine notifies it around command execution. Hosts that don't
//! care use [`NullDispatcher`].

/// Observer for command lifecycle events fired by the engine.
pub trait ConsoleEvents: Send + Sync {
    /// A command has been resolved and is about to execute.
    fn command_starting(&self, _command: &str) {}

    /// A command ran to completion with the given exit code.
    fn command_finished(&self, _command: &str, _exit_code: i32) {}
}

/// Dispatcher that ignores every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullDispatcher;

impl ConsoleEvents for NullDispatcher {}
