use std::sync::Arc;

use confbus::api;
use confbus::api::ApiContext;
use confbus::AppConfig;
use confbus::ChangeNotifier;
use confbus::ConfigStore;
use confbus::LayeredSource;
use confbus::LocalBus;
use confbus::Result;
use confbus::SystemError;
use tokio::signal::unix::signal;
use tokio::signal::unix::SignalKind;
use tokio::sync::watch;
use tracing::error;
use tracing::info;
use tracing::warn;
use tracing_subscriber::EnvFilter;

#[tokio::main(flavor = "multi_thread", worker_threads = 2)]
async fn main() -> Result<()> {
    init_observability();

    let settings = AppConfig::new()?.validate()?;
    info!(?settings, "confbus starting");

    // Initializing Shutdown Signal
    let (graceful_tx, graceful_rx) = watch::channel(());

    let source = Arc::new(LayeredSource::from_config(&settings.store));
    let store = Arc::new(ConfigStore::new(
        source,
        settings.store.defaults.clone(),
        settings.refresh,
    ));
    let report = store.initialize().await;
    for (key, e) in report.failures() {
        warn!(key, error = %e, "initial resolution failed, serving default");
    }

    let bus = LocalBus::new(settings.bus.channel_capacity);
    let notifier = Arc::new(ChangeNotifier::new(store.clone(), settings.bus.dedup_window));
    let dispatcher = bus.register(notifier, graceful_rx.clone());

    tokio::spawn(async move {
        if let Err(e) = graceful_shutdown(graceful_tx).await {
            error!("Failed to shutdown: {:?}", e);
        }
    });

    let ctx = ApiContext::new(store, bus, &settings.server);
    if let Err(e) = api::start_server(&settings.server, ctx, graceful_rx).await {
        error!("server stops: {:?}", e);
        return Err(e);
    }

    dispatcher.await.map_err(SystemError::TaskFailed)?;
    info!("Exiting program.");
    Ok(())
}

async fn graceful_shutdown(graceful_tx: watch::Sender<()>) -> Result<()> {
    let mut sigint = signal(SignalKind::interrupt()).map_err(SystemError::Signal)?;
    let mut sigterm = signal(SignalKind::terminate()).map_err(SystemError::Signal)?;
    tokio::select! {
        _ = sigint.recv() => {
            info!("SIGINT detected.");
        },
        _ = sigterm.recv() => {
            info!("SIGTERM detected.");
        },
    }

    graceful_tx.send(()).map_err(|e| {
        error!("Failed to send shutdown signal: {}", e);
        SystemError::SignalSendFailed(e.to_string())
    })?;

    info!("Shutdown completed");
    Ok(())
}

fn init_observability() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(true)
        .compact()
        .init();
}
