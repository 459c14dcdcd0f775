use absorption_feeder::config::{AppConfig, ConfigError};
use absorption_feeder::engine::{DetectorActor, EngineEvent};
use absorption_feeder::logging::{cleanup_old_logs, init_dual_logging, init_simple_logging};
use absorption_feeder::websocket::{build_stream_url, run_stream};
use tokio::sync::mpsc;
use tracing::{error, info, warn};

#[tokio::main]
async fn main() {
    let config_path = std::env::args().nth(1).unwrap_or_else(|| "config.toml".to_string());

    // Pre-load configuration to get logging settings
    let config = match AppConfig::from_toml(&config_path) {
        Ok(config) => {
            println!("✅ Loaded configuration from {}", config_path);
            config
        }
        Err(ConfigError::Invalid(e)) => {
            eprintln!("❌ Invalid configuration in {}: {}", config_path, e);
            std::process::exit(2);
        }
        Err(e) => {
            println!("⚠️ Failed to load {}: {}. Using default configuration", config_path, e);
            AppConfig::default()
        }
    };

    let _logging_guard = match init_dual_logging(config.logging.clone()) {
        Ok(guard) => Some(guard),
        Err(e) => {
            eprintln!("❌ Failed to initialize logging system: {}", e);
            if let Err(init_err) = init_simple_logging() {
                eprintln!("❌ Console logging unavailable: {}", init_err);
            }
            error!("⚠️ Using fallback console-only logging due to error: {}", e);
            None
        }
    };

    if let Err(e) = cleanup_old_logs(&config.logging.log_dir, config.logging.cleanup_days) {
        warn!("⚠️ Failed to clean up old log files: {}", e);
    }

    info!(
        symbol = %config.symbol,
        base_interval_secs = config.detector.base_interval_secs,
        coarse_window_secs = config.detector.coarse_window_secs,
        cluster_size = config.detector.price_cluster_size,
        stream = %config.stream.base_url,
        log_dir = %config.logging.log_dir,
        "🔧 System configuration logged for debugging"
    );

    info!("🚀 Starting Absorption Feeder");

    if let Err(e) = run_detector(config).await {
        error!("💥 Detector pipeline failed: {}", e);
        std::process::exit(1);
    }
}

/// Spawn the detector, drain its events and stream market data into it
async fn run_detector(config: AppConfig) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let interval = config.detector.kline_interval()?;
    let url = build_stream_url(&config.stream, &config.symbol, interval)?;

    let (event_tx, mut event_rx) = mpsc::unbounded_channel();
    let actor = DetectorActor::new(config.symbol.clone(), config.detector.clone()).with_event_sender(event_tx);
    let detector_ref = kameo::spawn(actor);
    info!("🎭 Detector actor launched for {}", config.symbol);

    let symbol = config.symbol.clone();
    tokio::spawn(async move {
        while let Some(event) = event_rx.recv().await {
            match event {
                EngineEvent::SignalConfirmed(signal) => warn!("🚨 ABSORPTION SIGNAL [{}] {}", symbol, signal),
                EngineEvent::CandidateOpened { direction, sweep_price } => {
                    info!("🎯 [{}] {} candidate at {:.2}", symbol, direction, sweep_price)
                }
                EngineEvent::CandidateCancelled { direction, reason } => {
                    info!("❌ [{}] {} candidate cancelled: {}", symbol, direction, reason)
                }
                EngineEvent::PivotConfirmed { side, pivot } => {
                    info!("📍 [{}] {} pivot at {:.2}", symbol, side, pivot.price)
                }
                EngineEvent::BaseBucketClosed(_) | EngineEvent::CoarseBucketClosed(_) => {}
            }
        }
        info!("Event channel closed");
    });

    info!("📡 Streaming {}", url);
    run_stream(config.stream.clone(), url, detector_ref).await?;
    Ok(())
}
