use lease_elector::ExitReason;
use lease_elector::Result;
use lease_elector::Settings;
use lease_elector::SupervisorBuilder;
use tokio::signal::unix::signal;
use tokio::signal::unix::SignalKind;
use tokio_util::sync::CancellationToken;
use tracing::error;
use tracing::info;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

#[tokio::main(flavor = "multi_thread", worker_threads = 2)]
async fn main() -> Result<()> {
    init_observability();

    let reason = match run().await {
        Ok(reason) => reason,
        Err(e) => {
            error!("fatal startup error: {}", e);
            return Err(e);
        }
    };

    info!("exiting: {}", reason);
    std::process::exit(reason.exit_code());
}

async fn run() -> Result<ExitReason> {
    let settings = Settings::load(None)?;
    info!(identity = %settings.identity, lease = %settings.lease_key(), "starting lease elector");

    // Initializing Shutdown Signal
    let shutdown = CancellationToken::new();
    tokio::spawn({
        let shutdown = shutdown.clone();
        async move {
            if let Err(e) = graceful_shutdown(shutdown).await {
                error!("Failed to listen for shutdown signals: {:?}", e);
            }
        }
    });

    SupervisorBuilder::new(settings).build().await?.run(shutdown).await
}

async fn graceful_shutdown(shutdown: CancellationToken) -> Result<()> {
    let mut sigint = signal(SignalKind::interrupt())?;
    let mut sigterm = signal(SignalKind::terminate())?;
    tokio::select! {
        _ = sigint.recv() => {
            info!("SIGINT detected.");
        },
        _ = sigterm.recv() => {
            info!("SIGTERM detected.");
        },
        _ = tokio::signal::ctrl_c() => {
            info!("Ctrl+C detected.");
        },
        _ = shutdown.cancelled() => {
            return Ok(());
        },
    }

    shutdown.cancel();
    info!("Shutdown requested");
    Ok(())
}

fn init_observability() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(filter)
        .init();
}
