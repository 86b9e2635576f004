use tracing::{error, info};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use trustlens::api::AnalysisClient;
use trustlens::bus::{self, SnipCommand, SurfaceEvent};
use trustlens::config::Config;
use trustlens::orchestrator::Orchestrator;
use trustlens::overlay::XcapGrabber;
use trustlens::windows::{HeadlessWindow, WindowId, WindowRegistry};
use trustlens::paths;

// Single-threaded event model: input events and bus messages interleave on
// one runtime thread, suspension only at the capture and HTTP boundaries.
#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    init_logging();

    info!("Starting TrustLens");

    let config = Config::load()?;
    info!("Configuration loaded: endpoint={}", config.backend.endpoint);

    let (message_bus, receivers) = bus::channel();
    let bus::BusReceivers {
        commands,
        mut events,
    } = receivers;

    // The host shell registers its real windows here; without one we run
    // headless and log the window operations.
    let mut windows = WindowRegistry::new();
    windows.register(WindowId::Main, Box::new(HeadlessWindow::new(WindowId::Main)));
    windows.register(
        WindowId::Overlay,
        Box::new(HeadlessWindow::new(WindowId::Overlay)),
    );

    let grabber = XcapGrabber::new(config.capture.max_width, config.capture.max_height);
    let analyzer = AnalysisClient::new(&config.backend)?;

    let orchestrator = Orchestrator::new(windows, message_bus.clone(), grabber, analyzer);

    let shutdown_bus = message_bus.clone();
    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to listen for shutdown signal: {}", e);
            return;
        }
        info!("Shutdown signal received");
        shutdown_bus.send_command(SnipCommand::Shutdown);
    });

    // The host shell renders these on its surfaces; headless runs log them.
    tokio::spawn(async move {
        while let Some(event) = events.recv().await {
            match event {
                SurfaceEvent::SnipSuccess(result) => {
                    info!("result: {}% - {}", result.score, result.reasoning)
                }
                SurfaceEvent::SnipAborted { reason } => info!("cycle aborted: {}", reason),
                SurfaceEvent::SnipStart { crop, .. } => info!("preview ready: {:?}", crop),
                SurfaceEvent::ResetSnip => info!("overlay reset"),
            }
        }
    });

    orchestrator.run(commands).await;

    info!("TrustLens stopped");
    Ok(())
}

/// Initialize logging - use fallback if file logging fails
fn init_logging() {
    let file_logging_result = (|| -> anyhow::Result<()> {
        let log_dir = paths::get_logs_dir()?;
        std::fs::create_dir_all(&log_dir)?;

        let file_appender = tracing_appender::rolling::daily(log_dir, "app.log");
        let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);

        tracing_subscriber::registry()
            .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
            .with(fmt::layer().with_writer(non_blocking))
            .with(fmt::layer().with_writer(std::io::stdout))
            .init();

        // Keep the guard alive
        std::mem::forget(_guard);
        Ok(())
    })();

    // If file logging failed, fall back to stdout-only logging
    if let Err(e) = file_logging_result {
        eprintln!("Warning: Failed to initialize file logging: {}", e);
        eprintln!("Falling back to stdout-only logging");

        tracing_subscriber::registry()
            .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
            .with(fmt::layer().with_writer(std::io::stdout))
            .init();
    }
}
