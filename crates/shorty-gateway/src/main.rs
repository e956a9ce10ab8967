use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use shorty_gateway::{telemetry, App, AppState, Config};
use shorty_generator::RandomGenerator;
use tracing::{debug, info};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let env_file = dotenvy::dotenv();
    let config = Config::parse();
    telemetry::init(&config);

    match env_file {
        Ok(path) => info!(path = %path.display(), "loaded environment file"),
        Err(err) => debug!(error = %err, "no environment file loaded"),
    }

    info!(
        listen_addr = %config.listen_addr(),
        base_url = %config.base_url(),
        storage_backend = %config.database,
        debug = config.debug,
        "starting shorty"
    );

    let repository = shorty_storage::open(&config.database, &config.storage_options())
        .await
        .context("failed to initialize storage")?;
    let generator = RandomGenerator::new(usize::from(config.shortener_length))
        .context("invalid shortener length")?;
    debug!(length = generator.length(), "random short codes");

    let state = AppState::new(repository.clone(), Arc::new(generator), config.base_url());
    let router = App::router(state, config.debug);
    if config.debug {
        info!(url = %config.full_url("/list"), "debug listing enabled");
    }

    let listener = tokio::net::TcpListener::bind(config.listen_addr())
        .await
        .with_context(|| format!("failed to bind {}", config.listen_addr()))?;
    info!(listen_addr = %listener.local_addr()?, "listening");

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    repository.close().await.context("failed to close storage")?;
    info!("shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %err, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => {
                tracing::error!(error = %err, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("shutdown signal received");
}
