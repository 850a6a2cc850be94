use anyhow::Result;
use tower_http::trace::TraceLayer;

use lnatprep::AppState;

pub async fn serve(
    config: lnatprep::Config,
    host_override: Option<String>,
    port_override: Option<u16>,
) -> Result<()> {
    tracing::info!("Starting lnatprep server...");

    let host = host_override.unwrap_or(config.server.host.to_owned());
    let port = port_override.unwrap_or(config.server.port);

    // Write pool first so the database file exists before the read-only pool opens it.
    let write_pool = lnatprep::db::create_write_pool(&config.database.url).await?;
    let read_pool =
        lnatprep::db::create_read_pool(&config.database.url, config.database.max_connections)
            .await?;

    let command = lnatprep::command(&config, read_pool.clone(), write_pool.clone());

    let seeded = command.seed_catalog().await?;
    tracing::info!(seeded, "permission catalog ready");

    let mut scheduler = match &config.entitlement.sweep_schedule {
        Some(schedule) => {
            let sched = lnatprep_user::scheduler(&command, schedule).await?;
            sched.start().await?;
            tracing::info!(schedule = %schedule, "maintenance scheduler started");
            Some(sched)
        }
        None => None,
    };

    let state = AppState {
        config,
        command,
        pool: read_pool.clone(),
    };

    let app = lnatprep::router(state).layer(TraceLayer::new_for_http());

    let addr = format!("{}:{}", host, port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on {}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    if let Some(sched) = scheduler.as_mut() {
        tracing::info!("Stopping maintenance scheduler...");
        if let Err(err) = sched.shutdown().await {
            tracing::error!(err = %err, "failed to stop maintenance scheduler");
        }
    }

    tracing::info!("Closing database pools...");
    read_pool.close().await;
    write_pool.close().await;

    tracing::info!("Graceful shutdown complete");

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            tracing::error!(err = %err, "failed to install Ctrl+C handler");
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
                tracing::error!(err = %err, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C signal");
        },
        _ = terminate => {
            tracing::info!("Received SIGTERM signal");
        },
    }

    tracing::info!("Starting graceful shutdown...");
}
