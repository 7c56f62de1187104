//! Host application context and process-wide identity.
//!
//! [`AppContext`] is what the host hands the kernel at bootstrap: its version
//! string and the collaborators it actually has. Collaborators are explicitly
//! optional; their absence is part of the contract (a missing reporter or
//! renderer makes `handle` re-raise instead of swallowing).

use std::sync::Arc;

use once_cell::sync::OnceCell;

use crate::queue::Queue;
use crate::report::{Renderer, Reporter};

/// Default invoking-binary name, used when the host defines none.
pub const DEFAULT_BINARY: &str = "artisan";

static BINARY_NAME: OnceCell<String> = OnceCell::new();

/// Defines the process-wide invoking-binary name if not already defined.
///
/// First write wins; later calls are ignored whatever value they carry.
/// Returns the effective name.
pub fn define_binary_name(name: impl Into<String>) -> &'static str {
    BINARY_NAME.get_or_init(|| name.into())
}

/// The effective invoking-binary name ([`DEFAULT_BINARY`] until defined).
pub fn binary_name() -> &'static str {
    BINARY_NAME.get().map(String::as_str).unwrap_or(DEFAULT_BINARY)
}

/// Host services handed to the kernel at construction time.
#[derive(Clone)]
pub struct AppContext {
    version: String,
    reporter: Option<Arc<dyn Reporter>>,
    renderer: Option<Arc<dyn Renderer>>,
    queue: Option<Arc<dyn Queue>>,
}

impl AppContext {
    /// Starts a builder carrying the host application version.
    pub fn builder(version: impl Into<String>) -> AppContextBuilder {
        AppContextBuilder {
            version: version.into(),
            reporter: None,
            renderer: None,
            queue: None,
        }
    }

    /// The host application version string.
    pub fn version(&self) -> &str {
        &self.version
    }

    /// The error reporter, when the host configured one.
    pub fn reporter(&self) -> Option<&Arc<dyn Reporter>> {
        self.reporter.as_ref()
    }

    /// The error renderer, when the host configured one.
    pub fn renderer(&self) -> Option<&Arc<dyn Renderer>> {
        self.renderer.as_ref()
    }

    /// The queue service, when the host configured one.
    pub fn queue(&self) -> Option<&Arc<dyn Queue>> {
        self.queue.as_ref()
    }
}

/// Builder for [`AppContext`].
pub struct AppContextBuilder {
    version: String,
    reporter: Option<Arc<dyn Reporter>>,
    renderer: Option<Arc<dyn Renderer>>,
    queue: Option<Arc<dyn Queue>>,
}

impl AppContextBuilder {
    /// Configures the error reporter.
    pub fn reporter(mut self, reporter: impl Reporter + 'static) -> Self {
        self.reporter = Some(Arc::new(reporter));
        self
    }

    /// Configures the error renderer.
    pub fn renderer(mut self, renderer: impl Renderer + 'static) -> Self {
        self.renderer = Some(Arc::new(renderer));
        self
    }

    /// Configures the queue service.
    pub fn queue(mut self, queue: impl Queue + 'static) -> Self {
        self.queue = Some(Arc::new(queue));
        self
    }

    pub fn build(self) -> AppContext {
        AppContext {
            version: self.version,
            reporter: self.reporter,
            renderer: self.renderer,
            queue: self.queue,
        }
    }
}
