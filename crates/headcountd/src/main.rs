use anyhow::{Context, Result};
use headcount_core::{OnnxAnalyzer, PresenceRegistry};
use headcount_hw::{Camera, Overlay, PreviewWindow};
use tracing_subscriber::EnvFilter;

mod config;
mod engine;
mod report;
mod shutdown;
mod ticker;

use config::Config;
use engine::Engine;
use report::HttpReporter;
use ticker::ReportTicker;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = Config::from_env();
    tracing::info!(
        device = %config.camera_device,
        model_dir = %config.model_dir.display(),
        policy = ?config.match_policy,
        threshold = config.match_threshold,
        expiry_secs = config.expiry.as_secs(),
        endpoint = config.endpoint.as_deref().unwrap_or("<disabled>"),
        "headcountd starting"
    );

    shutdown::install().context("failed to install signal handlers")?;

    // Fail fast: nothing runs without a camera and both models.
    let camera = Camera::open(&config.camera_device, config.frame_width, config.frame_height)
        .with_context(|| format!("could not open camera {}", config.camera_device))?;

    let analyzer = OnnxAnalyzer::load(
        &config.scrfd_model_path(),
        &config.arcface_model_path(),
        config.detection_confidence,
    )
    .context("could not load face models")?;

    let registry = PresenceRegistry::new(config.match_policy, config.match_threshold, config.expiry);
    let mut engine = Engine::new(camera, analyzer, registry, ReportTicker::new(config.report_interval_secs));

    if config.display {
        engine = engine
            .with_display(Box::new(PreviewWindow::new("headcount")))
            .with_overlay(Overlay::load(&config.overlay_font));
    } else {
        tracing::info!("running headless");
    }

    match &config.endpoint {
        Some(endpoint) => {
            let reporter = HttpReporter::new(endpoint, config.report_timeout)
                .context("could not create HTTP client")?;
            engine = engine.with_reporter(Box::new(reporter));
        }
        None => tracing::info!("reporting disabled"),
    }

    engine.run(shutdown::requested)?;

    tracing::info!("headcountd stopped");
    Ok(())
}
