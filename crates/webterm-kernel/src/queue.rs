//! Deferred command execution.
//!
//! The kernel never executes queued commands itself; it only pushes a job
//! descriptor onto the host's queue service for a worker to pick up later.
//! Enqueue failures are not swallowed.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::command::Parameters;

/// Job type identifier pushed alongside every queued command payload.
pub const QUEUED_COMMAND_JOB: &str = "console.queued-command";

/// Failure while enqueueing a command.
#[derive(Debug, Error)]
pub enum QueueError {
    /// The host context carries no queue service.
    #[error("no queue service is configured")]
    Unavailable,
    /// The job payload could not be serialized.
    #[error("could not serialize queued command: {0}")]
    Payload(#[from] serde_json::Error),
    /// The queue backend rejected the push.
    #[error("queue push failed: {0}")]
    Push(#[source] anyhow::Error),
}

/// Queue backend contract: accepts a job type plus an opaque JSON payload.
pub trait Queue: Send + Sync {
    fn push(&self, job: &str, payload: serde_json::Value) -> Result<(), QueueError>;
}

/// Payload describing one deferred command invocation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueuedCommand {
    /// Name of the invoking binary workers should execute under.
    pub binary: String,
    /// Command name to run.
    pub command: String,
    /// Parameters forwarded verbatim.
    pub parameters: Parameters,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_queued_command_payload_shape() {
        let job = QueuedCommand {
            binary: "artisan".into(),
            command: "mail:send".into(),
            parameters: serde_json::json!({"to": "a@b.com"})
                .as_object()
                .cloned()
                .unwrap_or_default(),
        };

        let payload = serde_json::to_value(&job).unwrap();
        assert_eq!(payload["binary"], "artisan");
        assert_eq!(payload["command"], "mail:send");
        assert_eq!(payload["parameters"]["to"], "a@b.com");
    }

    #[test]
    fn test_queue_error_messages() {
        assert_eq!(
            QueueError::Unavailable.to_string(),
            "no queue service is configured"
        );
        let push = QueueError::Push(anyhow::anyhow!("backend down"));
        assert!(push.to_string().contains("backend down"));
    }
}
