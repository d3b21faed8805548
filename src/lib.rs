//! diagshot
//!
//! Renders a local HTML document containing client-side diagrams (Mermaid and
//! friends) in headless Chrome and captures selected elements as PNG files.
//!
//! # Features
//!
//! - **CDP Backend** (default): Uses Chrome DevTools Protocol via headless Chrome
//! - **Fault isolation**: each target is captured independently; one missing
//!   diagram never blocks the others
//! - **Guaranteed cleanup**: the browser is released on every exit path
//!
//! # Example
//!
//! ```no_run
//! use diagshot::{runner, RunConfig};
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = RunConfig::default();
//! let engine_config = config.engine_config();
//! let outcome = runner::run(
//!     &config,
//!     move || diagshot::cdp::CdpEngine::launch(engine_config),
//!     std::future::pending::<()>(),
//! )
//! .await?;
//! if let runner::RunOutcome::Completed(summary) = outcome {
//!     println!("{}", summary.render());
//! }
//! # Ok(())
//! # }
//! ```

use serde::{Deserialize, Serialize};
use std::time::Duration;

pub mod error;
pub use error::{Error, Result};

pub mod config;
pub use config::{DiagramTarget, RunConfig};

pub mod report;
pub use report::{CaptureResult, CaptureStatus, Summary};

#[cfg(feature = "cdp")]
pub mod cdp;

// Async facade over a worker-thread-owned engine
pub mod session;
pub use session::BrowserSession;

pub mod runner;

/// Browser settings derived from a [`RunConfig`]
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Viewport dimensions
    pub viewport: Viewport,
    /// Whether Chrome runs with its sandbox enabled
    pub sandbox: bool,
    /// Idle timeout for the DevTools connection in milliseconds
    pub idle_timeout_ms: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            viewport: Viewport::default(),
            sandbox: true,
            idle_timeout_ms: config::DEFAULT_IDLE_TIMEOUT_MS,
        }
    }
}

/// Viewport dimensions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            width: 1920,
            height: 1080,
        }
    }
}

/// Core trait for browser backends.
///
/// Implementations are driven from a single worker thread (see
/// [`BrowserSession`]) and therefore do not need to be `Send` after creation.
pub trait CaptureEngine {
    /// Load a URL and wait for navigation to finish
    fn load_url(&mut self, url: &str) -> Result<()>;

    /// Block until an element matching `selector` exists, or fail with
    /// [`Error::ElementTimeout`] once `timeout` elapses.
    fn wait_for_element(&mut self, selector: &str, timeout: Duration) -> Result<()>;

    /// Capture exactly the element's rendered bounds as PNG bytes.
    ///
    /// Fails with [`Error::ElementNotFound`] when the lookup resolves to no
    /// element and [`Error::CaptureError`] when the capture itself fails.
    fn capture_element_png(&mut self, selector: &str) -> Result<Vec<u8>>;

    /// Close the engine and clean up resources
    fn close(self) -> Result<()>
    where
        Self: Sized;
}
