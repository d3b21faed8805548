use anyhow::Context;
use clap::Parser;
use diagshot::cdp::CdpEngine;
use diagshot::runner::{self, RunOutcome};
use diagshot::RunConfig;
use std::path::PathBuf;
use std::process::ExitCode;

/// Capture diagram elements from an HTML document as PNG files.
///
/// With no arguments the built-in document layout is used.
#[derive(Parser, Debug)]
#[command(name = "diagshot", version, about)]
struct Cli {
    /// JSON configuration file (fields default when omitted)
    #[arg(short, long, env = "DIAGSHOT_CONFIG")]
    config: Option<PathBuf>,

    /// HTML document to render
    #[arg(short, long, env = "DIAGSHOT_INPUT")]
    input: Option<PathBuf>,

    /// Directory receiving the PNG files
    #[arg(short, long, env = "DIAGSHOT_OUTPUT_DIR")]
    output_dir: Option<PathBuf>,

    /// Viewport width in pixels
    #[arg(long, env = "DIAGSHOT_WIDTH")]
    width: Option<u32>,

    /// Viewport height in pixels
    #[arg(long, env = "DIAGSHOT_HEIGHT")]
    height: Option<u32>,

    /// Settle delay for client-side rendering (ms)
    #[arg(long, env = "DIAGSHOT_DELAY_MS")]
    delay_ms: Option<u64>,

    /// Per-element wait timeout (ms)
    #[arg(long, env = "DIAGSHOT_TIMEOUT_MS")]
    timeout_ms: Option<u64>,

    /// Launch Chrome without its sandbox (needed in some containers)
    #[arg(long, env = "DIAGSHOT_NO_SANDBOX")]
    no_sandbox: bool,
}

impl Cli {
    fn into_config(self) -> anyhow::Result<RunConfig> {
        let mut cfg = match &self.config {
            Some(path) => RunConfig::from_json_file(path)
                .with_context(|| format!("loading config {}", path.display()))?,
            None => RunConfig::default(),
        };

        if let Some(input) = self.input {
            cfg.input = input;
        }
        if let Some(dir) = self.output_dir {
            cfg.output_dir = dir;
        }
        if let Some(w) = self.width {
            cfg.viewport.width = w;
        }
        if let Some(h) = self.height {
            cfg.viewport.height = h;
        }
        if let Some(ms) = self.delay_ms {
            cfg.settle_delay_ms = ms;
        }
        if let Some(ms) = self.timeout_ms {
            cfg.element_timeout_ms = ms;
        }
        if self.no_sandbox {
            cfg.sandbox = false;
        }

        cfg.validate()?;
        Ok(cfg)
    }
}

#[cfg(unix)]
type InterruptListener = tokio::signal::unix::Signal;
#[cfg(windows)]
type InterruptListener = tokio::signal::windows::CtrlC;

/// Install the Ctrl-C handler right away so an interrupt during config
/// loading or browser launch is caught instead of killing the process.
#[cfg(unix)]
fn listen_for_interrupt() -> std::io::Result<InterruptListener> {
    use tokio::signal::unix::{signal, SignalKind};
    signal(SignalKind::interrupt())
}

#[cfg(windows)]
fn listen_for_interrupt() -> std::io::Result<InterruptListener> {
    tokio::signal::windows::ctrl_c()
}

/// Resolves on Ctrl-C. Without a listener the run simply cannot be
/// interrupted.
async fn interrupted(listener: Option<InterruptListener>) {
    if let Some(mut listener) = listener {
        if listener.recv().await.is_some() {
            return;
        }
    }
    std::future::pending::<()>().await
}

async fn run_cli(cli: Cli) -> anyhow::Result<ExitCode> {
    let listener = listen_for_interrupt()
        .map_err(|e| log::warn!("cannot listen for Ctrl-C: {}", e))
        .ok();

    let config = cli.into_config()?;
    println!("🚀 Generating diagram images...\n");

    let engine_config = config.engine_config();
    let outcome = runner::run(
        &config,
        move || CdpEngine::launch(engine_config),
        interrupted(listener),
    )
    .await
    .context("capture run aborted")?;

    match outcome {
        RunOutcome::Completed(summary) => {
            println!("\n{}", summary.render());
            Ok(ExitCode::from(summary.exit_code()))
        }
        RunOutcome::Interrupted => {
            println!("\n🛑 Interrupted by user");
            Ok(ExitCode::SUCCESS)
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match run_cli(cli).await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("❌ Diagram generation failed:");
            eprintln!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}
