//! SurfScan - Main Entry Point
//!
//! Runs one headless synthetic acquisition: generate a noisy ground truth,
//! stream it through the backend, rebuild the measured field from the
//! batches, then report a cross-section and export the snapshot as CSV.
//!
//! Usage: `surfscan [CONFIG.toml]`. Without an argument the configuration is
//! read from the app data directory (or defaults are used).

use anyhow::{anyhow, bail, Context};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use surfscan::{
    analysis,
    backend::{AcquisitionBackend, AcquisitionMessage},
    config::{self, AcquisitionConfig},
    export,
    stream::{ScanOrder, SessionSummary},
    types::HeightField,
};

/// Log progress every this many percent
const PROGRESS_STEP_PERCENT: usize = 10;

fn main() -> anyhow::Result<()> {
    // Guard must live until exit so buffered file logs are flushed
    let _log_guard = init_logging();

    tracing::info!("Starting SurfScan");

    let config = load_config()?;
    run(&config)?;

    tracing::info!("Shutting down...");
    Ok(())
}

/// Console logging plus a daily rolling file in the app data directory
fn init_logging() -> Option<WorkerGuard> {
    let (file_layer, guard) = match config::ensure_app_data_dir() {
        Ok(dir) => {
            let appender = tracing_appender::rolling::daily(dir.join("logs"), "surfscan.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = tracing_subscriber::fmt::layer()
                .with_writer(writer)
                .with_ansi(false);
            (Some(layer), Some(guard))
        }
        Err(_) => (None, None),
    };

    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,surfscan=debug")),
        )
        .with(tracing_subscriber::fmt::layer())
        .with(file_layer)
        .init();

    if guard.is_none() {
        tracing::warn!("App data directory unavailable; logging to console only");
    }
    guard
}

fn load_config() -> anyhow::Result<AcquisitionConfig> {
    let config = match std::env::args_os().nth(1).map(PathBuf::from) {
        Some(path) => {
            tracing::info!("Loading configuration from {:?}", path);
            AcquisitionConfig::load(&path)
                .with_context(|| format!("loading configuration {:?}", path))?
        }
        None => AcquisitionConfig::load_from_app_dir().context("loading configuration")?,
    };
    config.validate().context("validating configuration")?;
    Ok(config)
}

fn run(config: &AcquisitionConfig) -> anyhow::Result<()> {
    let size = config.surface.grid_size;

    // Ground truth: the noisy surface the instrument "measures"
    let mut model = config.surface_model();
    let clean = model.generate(size)?;
    let truth = Arc::new(model.add_noise(&clean, config.surface.noise_amplitude)?);
    let order = Arc::new(ScanOrder::for_field(&truth)?);
    tracing::info!(
        "{} surface {}x{}: {} points to scan",
        model.profile(),
        size,
        size,
        order.len()
    );

    let (working, summary) = acquire(config, truth.clone(), order)?;

    let mismatched = truth
        .cells()
        .filter(|&(coord, z)| z.is_some() && working.get(coord) != z)
        .count();
    if mismatched > 0 {
        tracing::warn!("{} scanned cells differ from ground truth", mismatched);
    }

    let row = config.cross_section_row();
    let section = analysis::extract(&working, row)?;
    match section.height_range() {
        Some((lo, hi)) => tracing::info!(
            "Cross-section row {}: {} of {} columns present, height {:.4}..{:.4}",
            row,
            section.present_points().count(),
            section.len(),
            lo,
            hi
        ),
        None => tracing::info!("Cross-section row {}: no present columns", row),
    }

    let path = config.export_path();
    export::write_to(&path, &working).with_context(|| format!("exporting {:?}", path))?;

    let report = serde_json::to_string_pretty(&summary).context("serializing summary")?;
    tracing::info!("Acquisition summary:\n{}", report);
    Ok(())
}

/// Stream `order` through the backend and rebuild the measured field
fn acquire(
    config: &AcquisitionConfig,
    truth: Arc<HeightField>,
    order: Arc<ScanOrder>,
) -> anyhow::Result<(HeightField, SessionSummary)> {
    let mut working = HeightField::absent(truth.size())?;

    let (backend, frontend) = AcquisitionBackend::new();
    let worker = backend.spawn()?;
    frontend.start(truth, order, config.stream_params());

    let mut total = 0;
    let mut received = 0;
    let mut next_report = PROGRESS_STEP_PERCENT;

    let outcome = loop {
        let Some(msg) = frontend.recv() else {
            break Err(anyhow!("backend stopped before the session finished"));
        };
        match msg {
            AcquisitionMessage::SessionStarted { id, total_points } => {
                tracing::info!("Session {} started", id);
                total = total_points;
            }
            AcquisitionMessage::Batch(points) => {
                received += points.len();
                working.apply_points(&points);
                while total > 0 && received * 100 >= next_report * total {
                    tracing::info!("Scan progress: {}% ({}/{})", next_report, received, total);
                    next_report += PROGRESS_STEP_PERCENT;
                }
            }
            AcquisitionMessage::Done => tracing::debug!("Final batch received"),
            AcquisitionMessage::Summary(summary) => break Ok(summary),
            AcquisitionMessage::Snapshot(_) => {}
            AcquisitionMessage::Error(e) => break Err(anyhow!("backend error: {}", e)),
            AcquisitionMessage::Shutdown => {
                break Err(anyhow!("backend shut down before the session finished"))
            }
        }
    };

    frontend.shutdown();
    if worker.join().is_err() {
        bail!("backend thread panicked");
    }

    Ok((working, outcome?))
}
