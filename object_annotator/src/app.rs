use crate::{catalog::Catalog, config::Config, font::LabelFont, pipeline::Pipeline, server::HttpServer};

use std::{error::Error, sync::Arc};
use tokio::{signal, sync::broadcast};

pub async fn start_app(config: Config) -> Result<(), Box<dyn Error>> {
    let catalog = match Catalog::from_config(&config.annotation) {
        Ok(catalog) => Arc::new(catalog),
        Err(e) => {
            tracing::error!("Failed to load category labels: {:?}", e);
            return Err(Box::new(e));
        }
    };

    let font = Arc::new(LabelFont::load_or_default(
        &config.annotation.font_path,
        config.annotation.font_size,
    ));
    tracing::info!(
        "Annotating with {} categories, {} colors and {:?}",
        catalog.categories.len(),
        catalog.palette.len(),
        font
    );

    let pipeline = Arc::new(Pipeline::new(catalog, font));
    let server = HttpServer::new(pipeline, &config).await?;

    let (shutdown_tx, _) = broadcast::channel(1);
    let server_shutdown_rx = shutdown_tx.subscribe();

    let server_handle = server.run(server_shutdown_rx).await?;

    shutdown_signal().await;
    tracing::info!("Shutdown signal received, starting graceful shutdown.");

    let _ = shutdown_tx.send(());
    match server_handle.await {
        Ok(Ok(())) => {}
        Ok(Err(e)) => tracing::error!("Server stopped with an error: {:?}", e),
        Err(e) => tracing::error!("Server task failed: {:?}", e),
    }

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
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
}
