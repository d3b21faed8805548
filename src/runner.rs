//! The capture run: load the document once, then capture every target in
//! order with per-target fault isolation.
//!
//! Sequence: pre-flight input check → output directory → browser launch →
//! navigation → settle delay → targets (independent) → close. The browser is
//! closed on every path out of [`run`], including errors and interruption.

use crate::config::{DiagramTarget, RunConfig};
use crate::report::{CaptureResult, CaptureStatus, Summary};
use crate::session::BrowserSession;
use crate::{CaptureEngine, Error, Result};
use log::{debug, info, warn};
use std::future::Future;
use std::path::{Path, PathBuf};
use std::pin::pin;
use std::time::Duration;
use url::Url;

/// How a run ended
#[derive(Debug)]
pub enum RunOutcome {
    /// Every target was attempted
    Completed(Summary),
    /// The interrupt future resolved before the run finished
    Interrupted,
}

/// Run the capture sequence described by `config`.
///
/// `factory` builds the browser engine on the session's worker thread; it is
/// never called when the input document is missing. `interrupt` aborts the run
/// when it resolves; pass [`std::future::pending`] to run to completion.
///
/// Per-target failures are recorded in the returned [`Summary`]. Errors from
/// pre-flight, launch or navigation are returned as `Err`.
pub async fn run<E, F, I>(config: &RunConfig, factory: F, interrupt: I) -> Result<RunOutcome>
where
    E: CaptureEngine + 'static,
    F: FnOnce() -> Result<E> + Send + 'static,
    I: Future<Output = ()>,
{
    let url = preflight(config)?;
    ensure_output_dir(&config.output_dir)?;

    let mut interrupt = pin!(interrupt);

    println!("🌐 Launching browser...");
    let mut launch = pin!(BrowserSession::spawn(factory));
    let launched = tokio::select! {
        res = &mut launch => Some(res),
        _ = &mut interrupt => None,
    };
    let session = match launched {
        Some(res) => res?,
        None => {
            // Let the launch finish so the browser it produced is closed.
            info!("interrupted during browser launch");
            if let Ok(session) = launch.await {
                if let Err(e) = session.close().await {
                    warn!("browser close failed: {}", e);
                }
            }
            return Ok(RunOutcome::Interrupted);
        }
    };

    let outcome = tokio::select! {
        res = drive(&session, config, &url) => res.map(RunOutcome::Completed),
        _ = &mut interrupt => Ok(RunOutcome::Interrupted),
    };

    if let Err(e) = session.close().await {
        warn!("browser close failed: {}", e);
    }
    outcome
}

/// Check the input document and turn it into a `file://` URL.
fn preflight(config: &RunConfig) -> Result<Url> {
    if !config.input.is_file() {
        return Err(Error::InputMissing(config.input.clone()));
    }
    let absolute = config.input.canonicalize()?;
    Url::from_file_path(&absolute)
        .map_err(|_| Error::ConfigError(format!("cannot build file URL for {}", absolute.display())))
}

fn ensure_output_dir(dir: &Path) -> Result<()> {
    if !dir.is_dir() {
        std::fs::create_dir_all(dir)?;
        println!("✅ Created output directory: {}", dir.display());
    }
    Ok(())
}

async fn drive(session: &BrowserSession, config: &RunConfig, url: &Url) -> Result<Summary> {
    println!("📄 Loading HTML file...");
    session.goto(url.as_str()).await?;

    println!("⏳ Waiting for diagrams to render...");
    settle(config.settle_delay_ms).await;

    let mut results = Vec::with_capacity(config.targets.len());
    for target in &config.targets {
        results.push(capture_target(session, config, target).await);
    }

    Ok(Summary {
        results,
        output_dir: config.output_dir.clone(),
    })
}

/// Attempt one target. Never fails: errors become a `Failed` status.
async fn capture_target(
    session: &BrowserSession,
    config: &RunConfig,
    target: &DiagramTarget,
) -> CaptureResult {
    println!("📊 Capturing: {}", target.description);

    let status = match try_capture(session, config, target).await {
        Ok((path, bytes)) => {
            println!("✅ Captured: {}", target.filename);
            CaptureStatus::Captured { path, bytes }
        }
        Err(e) => {
            eprintln!("❌ Failed: {}", target.description);
            eprintln!("   Error: {}", e);
            if !e.is_per_target() {
                warn!("non-element error while capturing {}: {}", target.id, e);
            }
            CaptureStatus::Failed {
                message: e.to_string(),
            }
        }
    };

    CaptureResult {
        id: target.id.clone(),
        description: target.description.clone(),
        status,
    }
}

async fn try_capture(
    session: &BrowserSession,
    config: &RunConfig,
    target: &DiagramTarget,
) -> Result<(PathBuf, usize)> {
    let selector = target.selector();
    let timeout = Duration::from_millis(config.element_timeout_ms);

    session.wait_for(&selector, timeout).await?;
    wait_until_ready(session, config, target, timeout).await;

    let png = session.capture(&selector).await?;
    let path = config.output_path(target);
    tokio::fs::write(&path, &png).await?;
    info!("wrote {} ({} bytes)", path.display(), png.len());
    Ok((path, png.len()))
}

/// Give client-side rendering time to finish. A configured readiness selector
/// replaces the fixed delay when it shows up in time.
async fn wait_until_ready(
    session: &BrowserSession,
    config: &RunConfig,
    target: &DiagramTarget,
    timeout: Duration,
) {
    if let Some(ready) = &target.ready_selector {
        match session.wait_for(ready, timeout).await {
            Ok(()) => {
                debug!("{}: readiness selector {} matched", target.id, ready);
                return;
            }
            Err(e) => warn!(
                "{}: readiness selector {} not matched ({}); falling back to settle delay",
                target.id, ready, e
            ),
        }
    }
    settle(config.settle_delay_ms).await;
}

async fn settle(ms: u64) {
    if ms > 0 {
        tokio::time::sleep(Duration::from_millis(ms)).await;
    }
}
