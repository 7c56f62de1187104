//! Console command dispatch kernel for web-hosted terminals.
//!
//! `webterm-kernel` lets a web terminal run console commands against a host
//! application: commands are registered once, executed by name or from a raw
//! input line, their output captured, and every uncaught failure translated
//! into the host's error-reporting pipeline with a stable exit code.
//!
//! # Dispatch flow
//!
//! ```text
//! caller
//!   → Kernel::handle(input, output)
//!   → lazily-booted engine (ConsoleApp) runs the command
//!   → success: the command's exit code
//!   → failure: normalize → Reporter::report → Renderer::render → exit code 1
//! ```
//!
//! # Pieces
//!
//! - **[`Kernel`]**: the facade. Boots the engine exactly once, on first
//!   use; owns the failure boundary in [`Kernel::handle`]; passes errors
//!   through everywhere else ([`Kernel::call`], [`Kernel::queue`]).
//! - **[`Runner`] / [`ConsoleApp`]**: the engine contract and its default
//!   clap-backed implementation — registration with replace-on-collision,
//!   execution, last-output capture.
//! - **[`Command`] / [`FnCommand`]**: descriptors pairing a clap definition
//!   with the code it runs.
//! - **[`Reporter`] / [`Renderer`] / [`Queue`]**: host collaborators, all
//!   explicitly optional on [`AppContext`].
//!
//! Parsing is clap's job throughout; this crate owns no flag surface of its
//! own.

mod command;
mod console;
mod context;
mod error;
mod events;
mod invocation;
mod kernel;
mod queue;
mod report;
mod runner;

pub use command::{Command, CommandMeta, CommandResult, FnCommand, Parameters};
pub use console::ConsoleApp;
pub use context::{binary_name, define_binary_name, AppContext, AppContextBuilder, DEFAULT_BINARY};
pub use error::{DispatchError, FailureKind};
pub use events::{ConsoleEvents, NullDispatcher};
pub use invocation::{InputError, Invocation};
pub use kernel::{Kernel, KernelBuilder};
pub use queue::{Queue, QueueError, QueuedCommand, QUEUED_COMMAND_JOB};
pub use report::{PlainRenderer, Renderer, Reporter, TracingReporter};
pub use runner::{EngineConfig, Runner};
