//! The dispatch facade.
//!
//! [`Kernel`] is the stable entry point for running console commands from a
//! non-console context (typically a web terminal). It boots the engine
//! exactly once, on first use, and keeps it for the process lifetime; it is
//! also the hardened failure boundary: everything a run can raise — a
//! command error or a panic — is normalized, reported, rendered, and turned
//! into exit code 1 in [`Kernel::handle`].
//!
//! `handle` is the only operation that converts failures. [`Kernel::call`]
//! is the trusted in-process entry point and lets errors propagate, as do
//! [`Kernel::queue`], [`Kernel::all`], and [`Kernel::output`].
//!
//! # Example
//!
//! ```rust,ignore
//! use clap::Command as CommandDefinition;
//! use webterm_kernel::{AppContext, FnCommand, Invocation, Kernel, PlainRenderer, TracingReporter};
//!
//! let context = AppContext::builder(app_version)
//!     .reporter(TracingReporter)
//!     .renderer(PlainRenderer)
//!     .build();
//!
//! let kernel = Kernel::builder(context)
//!     .command(FnCommand::new(CommandDefinition::new("list"), |_m, out| {
//!         writeln!(out, "nothing here yet")?;
//!         Ok(0)
//!     }))
//!     .build();
//!
//! let code = kernel.handle(&Invocation::parse("list")?, &mut response)?;
//! ```

use std::collections::BTreeMap;
use std::io::{self, Write};
use std::marker::PhantomData;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, Mutex, MutexGuard};

use once_cell::sync::OnceCell;

use crate::command::{Command, CommandMeta, Parameters};
use crate::console::ConsoleApp;
use crate::context::{self, AppContext, DEFAULT_BINARY};
use crate::error::{normalize, DispatchError};
use crate::events::{ConsoleEvents, NullDispatcher};
use crate::invocation::Invocation;
use crate::queue::{QueueError, QueuedCommand, QUEUED_COMMAND_JOB};
use crate::runner::{EngineConfig, Runner};

/// Exit code reported when `handle` converts a failure.
const FAILURE_EXIT: i32 = 1;

/// The console kernel: lazy engine owner and failure boundary.
pub struct Kernel<R: Runner = ConsoleApp> {
    context: AppContext,
    events: Arc<dyn ConsoleEvents>,
    /// Descriptors waiting for the first engine boot; taken exactly once.
    pending: Mutex<Option<Vec<Box<dyn Command>>>>,
    /// The memoized engine, built on first use.
    engine: OnceCell<Mutex<R>>,
}

impl Kernel {
    /// Starts a builder for a kernel backed by the default clap engine.
    pub fn builder(context: AppContext) -> KernelBuilder<ConsoleApp> {
        KernelBuilder::new(context)
    }
}

impl<R: Runner> Kernel<R> {
    /// Runs a parsed input line, writing human output to `output`.
    ///
    /// On normal completion returns the engine's own exit code. Any failure
    /// raised during the run — a command error or a panic — is caught,
    /// normalized, reported, rendered onto `output`, and converted to
    /// `Ok(1)`. With no reporter or no renderer configured the normalized
    /// error is returned instead of being swallowed.
    pub fn handle(&self, input: &Invocation, output: &mut dyn Write) -> Result<i32, DispatchError> {
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
            self.engine_mut().run(input, &mut *output)
        }));
        match normalize(outcome, input.command()) {
            Ok(code) => Ok(code),
            Err(error) => self.fail(error, output),
        }
    }

    /// [`Kernel::handle`] without a caller-provided sink; output is still
    /// captured by the engine and readable via [`Kernel::output`].
    pub fn handle_captured(&self, input: &Invocation) -> Result<i32, DispatchError> {
        let mut discard = io::sink();
        self.handle(input, &mut discard)
    }

    /// Runs a command by name, returning the engine's exit code unmodified.
    ///
    /// No catching here: errors propagate to the caller.
    pub fn call(&self, command: &str, parameters: &Parameters) -> anyhow::Result<i32> {
        self.engine_mut().call(command, parameters)
    }

    /// Enqueues a deferred run of `command`; never executes it synchronously.
    ///
    /// The job payload carries the invoking-binary name, the command name,
    /// and the parameters. Enqueue failures propagate.
    pub fn queue(&self, command: &str, parameters: &Parameters) -> Result<(), QueueError> {
        let queue = self.context.queue().ok_or(QueueError::Unavailable)?;
        let job = QueuedCommand {
            binary: context::binary_name().to_string(),
            command: command.to_string(),
            parameters: parameters.clone(),
        };
        queue.push(QUEUED_COMMAND_JOB, serde_json::to_value(&job)?)
    }

    /// Every command registered with the engine, keyed by name.
    pub fn all(&self) -> BTreeMap<String, CommandMeta> {
        self.engine_mut().all()
    }

    /// Captured output of the most recently executed command; empty if
    /// nothing has run yet.
    pub fn output(&self) -> String {
        self.engine_mut().output()
    }

    /// Reports and renders a normalized failure, converting it to exit
    /// code 1.
    ///
    /// Mirrors the report-then-render order: a missing reporter re-raises
    /// before anything is persisted; a missing renderer re-raises after the
    /// reporter has run.
    fn fail(&self, error: DispatchError, output: &mut dyn Write) -> Result<i32, DispatchError> {
        let Some(reporter) = self.context.reporter() else {
            return Err(error);
        };
        reporter.report(&error);

        let Some(renderer) = self.context.renderer() else {
            return Err(error);
        };
        if let Err(render_error) = renderer.render(output, &error) {
            tracing::warn!("could not render failure to the output sink: {render_error}");
        }
        Ok(FAILURE_EXIT)
    }

    /// The engine, booting it on first use.
    ///
    /// Boot supplies the host version and the event dispatcher, then
    /// resolves the pending descriptors exactly once, replacing same-named
    /// commands.
    fn engine(&self) -> &Mutex<R> {
        self.engine.get_or_init(|| {
            let mut engine = R::boot(EngineConfig {
                version: self.context.version().to_string(),
                events: Arc::clone(&self.events),
            });
            let commands = lock_unpoisoned(&self.pending).take().unwrap_or_default();
            let resolved = commands.len();
            engine.register(commands, true);
            tracing::debug!(
                version = self.context.version(),
                commands = resolved,
                "console engine booted"
            );
            Mutex::new(engine)
        })
    }

    fn engine_mut(&self) -> MutexGuard<'_, R> {
        lock_unpoisoned(self.engine())
    }
}

/// Locks recovering from poisoning: a panicking command unwinds through
/// `handle`, which survives it by contract, so the engine must stay usable.
fn lock_unpoisoned<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    match mutex.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

/// Builder for [`Kernel`].
pub struct KernelBuilder<R: Runner = ConsoleApp> {
    context: AppContext,
    events: Arc<dyn ConsoleEvents>,
    commands: Vec<Box<dyn Command>>,
    _engine: PhantomData<fn() -> R>,
}

impl<R: Runner> KernelBuilder<R> {
    /// Starts a builder from the host context.
    pub fn new(context: AppContext) -> Self {
        Self {
            context,
            events: Arc::new(NullDispatcher),
            commands: Vec::new(),
            _engine: PhantomData,
        }
    }

    /// Replaces the event dispatcher forwarded to the engine at boot.
    pub fn events(mut self, events: impl ConsoleEvents + 'static) -> Self {
        self.events = Arc::new(events);
        self
    }

    /// Adds one command descriptor to resolve at engine boot.
    pub fn command(mut self, command: impl Command + 'static) -> Self {
        self.commands.push(Box::new(command));
        self
    }

    /// Adds a batch of descriptors.
    pub fn commands(mut self, commands: Vec<Box<dyn Command>>) -> Self {
        self.commands.extend(commands);
        self
    }

    /// Selects a different engine type.
    pub fn engine<R2: Runner>(self) -> KernelBuilder<R2> {
        KernelBuilder {
            context: self.context,
            events: self.events,
            commands: self.commands,
            _engine: PhantomData,
        }
    }

    /// Builds the kernel. The engine itself is not booted until first use.
    pub fn build(self) -> Kernel<R> {
        context::define_binary_name(DEFAULT_BINARY);
        Kernel {
            context: self.context,
            events: self.events,
            pending: Mutex::new(Some(self.commands)),
            engine: OnceCell::new(),
        }
    }
}
