//! Error reporting and rendering collaborators.
//!
//! The kernel hands every normalized failure first to the [`Reporter`]
//! (persistence/logging) and then to the [`Renderer`] (a human-readable
//! block on the caller's sink). Both are host-provided; the implementations
//! here cover the common case of a tracing-backed log and a plain-text web
//! terminal.

use std::io::{self, Write};

use crate::error::{DispatchError, FailureKind};

/// Persists or logs a dispatch failure.
pub trait Reporter: Send + Sync {
    fn report(&self, error: &DispatchError);
}

/// Writes a human-readable rendering of a dispatch failure to a sink.
pub trait Renderer: Send + Sync {
    fn render(&self, out: &mut dyn Write, error: &DispatchError) -> io::Result<()>;
}

/// Reporter that emits one structured `tracing` event per failure.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingReporter;

impl Reporter for TracingReporter {
    fn report(&self, error: &DispatchError) {
        let command = error.command().unwrap_or("<none>");
        match error.kind() {
            FailureKind::Command => {
                tracing::error!(command, "console command failed: {error}");
            }
            FailureKind::Fault => {
                tracing::error!(command, "unrecoverable fault in console command: {error}");
            }
        }
    }
}

/// Renderer producing the plain-text failure block a web terminal shows.
#[derive(Debug, Default, Clone, Copy)]
pub struct PlainRenderer;

impl Renderer for PlainRenderer {
    fn render(&self, out: &mut dyn Write, error: &DispatchError) -> io::Result<()> {
        writeln!(out)?;
        writeln!(out, "  ERROR  {error}")?;
        if let Some(command) = error.command() {
            writeln!(out, "  while running \"{command}\"")?;
        }
        writeln!(out)
    }
}
