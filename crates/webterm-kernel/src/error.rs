//! Normalized dispatch failures.
//!
//! A run can fail two ways: a command (or the engine) returns an error, or a
//! panic unwinds out of command execution. Both are flattened into a single
//! [`DispatchError`] at the kernel's catch site, so the reporter and renderer
//! downstream see one shape regardless of origin. The [`FailureKind`] tag is
//! preserved for reporters that care, but the kernel itself does not branch
//! on it after normalization.

use std::any::Any;
use std::thread;

use thiserror::Error;

/// Classification of a normalized dispatch failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// An error a command or the engine raised during a run.
    Command,
    /// A panic that unwound out of command execution.
    Fault,
}

/// A failure raised while dispatching a command.
///
/// Carries the failure classification, the human-readable message, the name
/// of the command being run when the failure occurred (when known), and the
/// underlying error for `source()` chains.
#[derive(Debug, Error)]
#[error("{message}")]
pub struct DispatchError {
    kind: FailureKind,
    message: String,
    command: Option<String>,
    #[source]
    source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl DispatchError {
    /// The failure classification.
    pub fn kind(&self) -> FailureKind {
        self.kind
    }

    /// The human-readable failure message.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// The command being run when the failure occurred, when known.
    pub fn command(&self) -> Option<&str> {
        self.command.as_deref()
    }

    /// Returns true for failures normalized from a panic.
    pub fn is_fault(&self) -> bool {
        self.kind == FailureKind::Fault
    }
}

/// Normalizes the outcome of a guarded run into an exit code or a
/// [`DispatchError`].
///
/// This is the single point where the two failure shapes (a command error and
/// a caught panic payload) converge.
pub(crate) fn normalize(
    outcome: thread::Result<anyhow::Result<i32>>,
    command: Option<&str>,
) -> Result<i32, DispatchError> {
    let command = command.map(str::to_owned);
    match outcome {
        Ok(Ok(code)) => Ok(code),
        Ok(Err(source)) => Err(DispatchError {
            kind: FailureKind::Command,
            message: source.to_string(),
            command,
            source: Some(source.into()),
        }),
        Err(payload) => Err(DispatchError {
            kind: FailureKind::Fault,
            message: panic_message(payload.as_ref()),
            command,
            source: None,
        }),
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unrecoverable fault with a non-string panic payload".to_string()
    }
}
