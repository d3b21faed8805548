//! Run configuration: where the document lives, where images go, and which
//! elements to capture.
//!
//! The compiled-in [`RunConfig::default`] reproduces the stock documentation
//! setup (four architecture diagrams). A JSON file can replace any subset of
//! fields:
//!
//! ```json
//! {
//!   "input": "architecture.html",
//!   "output_dir": "images",
//!   "viewport": { "width": 1600, "height": 900 },
//!   "settle_delay_ms": 1500,
//!   "targets": [
//!     { "id": "overview", "filename": "overview.png", "description": "Overview",
//!       "ready_selector": "#overview svg" }
//!   ]
//! }
//! ```

use crate::{EngineConfig, Error, Result, Viewport};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};

/// Default HTML document, relative to the working directory
pub const DEFAULT_INPUT: &str = "docs/architecture-diagrams.html";

/// Default output directory, relative to the working directory
pub const DEFAULT_OUTPUT_DIR: &str = "docs/images";

/// Default settle delay (milliseconds)
pub const DEFAULT_SETTLE_DELAY_MS: u64 = 3000;

/// Default per-element wait timeout (milliseconds)
pub const DEFAULT_ELEMENT_TIMEOUT_MS: u64 = 10_000;

/// Default time the browser connection may sit idle (milliseconds)
pub const DEFAULT_IDLE_TIMEOUT_MS: u64 = 30_000;

/// One DOM region to capture as its own image.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiagramTarget {
    /// Element id in the HTML document (without the leading `#`)
    pub id: String,
    /// File name written inside the output directory
    pub filename: String,
    /// Human-readable name used in progress and summary lines
    pub description: String,
    /// Optional selector that only matches once the diagram has finished
    /// drawing, e.g. `#overview svg`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ready_selector: Option<String>,
}

impl DiagramTarget {
    pub fn new(id: &str, filename: &str, description: &str) -> Self {
        Self {
            id: id.to_string(),
            filename: filename.to_string(),
            description: description.to_string(),
            ready_selector: None,
        }
    }

    /// CSS selector matching this target's element.
    ///
    /// Plain identifiers use `#id`; anything else falls back to an attribute
    /// selector so ids with dots, colons or spaces still match.
    pub fn selector(&self) -> String {
        if is_css_ident(&self.id) {
            format!("#{}", self.id)
        } else {
            let escaped = self.id.replace('\\', "\\\\").replace('"', "\\\"");
            format!("[id=\"{}\"]", escaped)
        }
    }
}

fn is_css_ident(s: &str) -> bool {
    let mut chars = s.chars();
    let first = match chars.next() {
        Some(c) => c,
        None => return false,
    };
    if first.is_ascii_digit() {
        return false;
    }
    if first == '-' && s.chars().nth(1).is_some_and(|c| c.is_ascii_digit()) {
        return false;
    }
    s.chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

/// Everything a run needs. Immutable once the run starts.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    /// HTML document to render
    pub input: PathBuf,
    /// Directory receiving the PNG files (created if missing)
    pub output_dir: PathBuf,
    /// Browser window size
    pub viewport: Viewport,
    /// Fixed wait after load and before each capture, for client-side rendering
    pub settle_delay_ms: u64,
    /// Upper bound on waiting for each target element to appear
    pub element_timeout_ms: u64,
    /// How long the browser connection may stay silent before it is dropped
    pub idle_timeout_ms: u64,
    /// Run Chrome with its sandbox enabled
    pub sandbox: bool,
    /// Targets, captured in this order
    pub targets: Vec<DiagramTarget>,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            input: PathBuf::from(DEFAULT_INPUT),
            output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
            viewport: Viewport {
                width: 1920,
                height: 1080,
            },
            settle_delay_ms: DEFAULT_SETTLE_DELAY_MS,
            element_timeout_ms: DEFAULT_ELEMENT_TIMEOUT_MS,
            idle_timeout_ms: DEFAULT_IDLE_TIMEOUT_MS,
            sandbox: true,
            targets: default_targets(),
        }
    }
}

/// The stock architecture-document targets.
pub fn default_targets() -> Vec<DiagramTarget> {
    vec![
        DiagramTarget::new(
            "architecture-diagram",
            "system-architecture.png",
            "System architecture overview",
        ),
        DiagramTarget::new(
            "interaction-diagram",
            "interaction-flow.png",
            "Interaction sequence diagram",
        ),
        DiagramTarget::new("dataflow-diagram", "data-flow.png", "Data flow diagram"),
        DiagramTarget::new(
            "deployment-diagram",
            "deployment-architecture.png",
            "Deployment architecture",
        ),
    ]
}

impl RunConfig {
    /// Load a JSON config. Missing fields keep their defaults; relative paths
    /// are resolved against the file's directory.
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .map_err(|e| Error::ConfigError(format!("cannot read {}: {}", path.display(), e)))?;
        let mut cfg: RunConfig = serde_json::from_str(&raw)?;

        let base = path.parent().unwrap_or_else(|| Path::new(""));
        cfg.input = resolve_against(base, &cfg.input);
        cfg.output_dir = resolve_against(base, &cfg.output_dir);
        Ok(cfg)
    }

    /// Check invariants the runner relies on.
    pub fn validate(&self) -> Result<()> {
        if self.targets.is_empty() {
            return Err(Error::ConfigError("no capture targets configured".into()));
        }
        if self.viewport.width == 0 || self.viewport.height == 0 {
            return Err(Error::ConfigError(format!(
                "viewport must be non-zero, got {}x{}",
                self.viewport.width, self.viewport.height
            )));
        }

        let mut ids = HashSet::new();
        let mut files = HashSet::new();
        for t in &self.targets {
            if t.id.trim().is_empty() {
                return Err(Error::ConfigError(format!(
                    "target '{}' has an empty element id",
                    t.description
                )));
            }
            if !ids.insert(t.id.as_str()) {
                return Err(Error::ConfigError(format!("duplicate element id '{}'", t.id)));
            }
            if !is_plain_filename(&t.filename) {
                return Err(Error::ConfigError(format!(
                    "output filename '{}' for '{}' must be a bare file name",
                    t.filename, t.id
                )));
            }
            if !files.insert(t.filename.as_str()) {
                return Err(Error::ConfigError(format!(
                    "output filename '{}' is used by more than one target",
                    t.filename
                )));
            }
        }
        Ok(())
    }

    /// Browser-facing subset of the configuration.
    pub fn engine_config(&self) -> EngineConfig {
        EngineConfig {
            viewport: self.viewport,
            sandbox: self.sandbox,
            idle_timeout_ms: self.idle_timeout_ms,
        }
    }

    /// Output path for a target.
    pub fn output_path(&self, target: &DiagramTarget) -> PathBuf {
        self.output_dir.join(&target.filename)
    }
}

fn resolve_against(base: &Path, p: &Path) -> PathBuf {
    if p.is_absolute() {
        p.to_path_buf()
    } else {
        base.join(p)
    }
}

fn is_plain_filename(name: &str) -> bool {
    !name.is_empty()
        && name != "."
        && name != ".."
        && !name.contains('/')
        && !name.contains('\\')
}
