pub mod capture;
pub mod host;
pub mod models;
pub mod permissions;
pub mod settings;
pub mod signals;
pub mod upload;
pub mod utils;
pub mod verification;

use std::{path::PathBuf, sync::Arc};

use anyhow::{anyhow, Context, Result};
use clap::Parser;
use log::{error, info, warn};

use settings::Settings;
use upload::ReqwestTransport;
use verification::{RunOutcome, VerificationController};

pub use verification::{RunPhase, RunStatus};

#[derive(Parser, Debug)]
#[command(
    name = "liveness-check",
    version,
    about = "Capture a liveness clip and submit it for verification"
)]
pub struct Cli {
    /// Settings file (JSON). Missing files fall back to defaults.
    #[arg(long, default_value = "liveness.json")]
    pub settings: PathBuf,

    /// Verification server base URL, overrides settings and LIVENESS_BASE_URL.
    #[arg(long)]
    pub base_url: Option<String>,

    /// Clip the replay camera serves instead of a live recording.
    #[arg(long)]
    pub video: Option<PathBuf>,

    /// Ping the server's /health endpoint before the run.
    #[arg(long)]
    pub warm_up: bool,
}

pub fn run() {
    utils::logging::init();
    log::info!("liveness-check starting up...");

    let cli = Cli::parse();

    let runtime = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(err) => {
            error!("failed to start async runtime: {err}");
            std::process::exit(2);
        }
    };

    let code = match runtime.block_on(run_cli(cli)) {
        Ok(outcome) if outcome.is_success() => 0,
        Ok(_) => 1,
        Err(err) => {
            error!("{err:#}");
            2
        }
    };
    std::process::exit(code);
}

pub async fn run_cli(cli: Cli) -> Result<RunOutcome> {
    let mut settings = Settings::load(&cli.settings)?;
    settings.apply_env();
    if let Some(base_url) = cli.base_url {
        settings.base_url = base_url.trim_end_matches('/').to_string();
    }

    let video = cli
        .video
        .or_else(|| settings.replay_video.clone())
        .ok_or_else(|| anyhow!("no video clip configured; pass --video or set replayVideo"))?;

    let transport = Arc::new(ReqwestTransport::new()?);
    let controller =
        VerificationController::new(host::host_deps(&settings, video, transport), &settings);
    info!("verifying against {}", settings.base_url);

    let mut status_rx = controller.subscribe();
    let printer = tokio::spawn(async move {
        while status_rx.changed().await.is_ok() {
            let status = status_rx.borrow_and_update().clone();
            println!("{}", status.message);
            if status.phase.is_terminal() {
                break;
            }
        }
    });

    let interrupt = {
        let controller = controller.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                warn!("interrupted, cancelling verification");
                controller.shutdown().await;
            }
        })
    };

    controller.prepare().await;
    if cli.warm_up && !controller.warm_up().await {
        warn!("server did not report healthy; continuing anyway");
    }

    let outcome = controller.run_once().await.context("verification run rejected")?;

    interrupt.abort();
    controller.shutdown().await;
    let _ = printer.await;

    Ok(outcome)
}
