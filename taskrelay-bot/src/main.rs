/// TaskRelay bot entry point
///
/// Wires configuration, the database, the dispatcher, and the optional
/// keep-alive heartbeat together, then runs until Ctrl+C.
use std::sync::Arc;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use taskrelay_bot::router::{self, Router};
use taskrelay_bot::transport::{ChatTransport, Event, LogTransport};
use taskrelay_bot::Context;
use taskrelay_shared::config::Config;
use taskrelay_shared::db::{create_pool, run_migrations};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "taskrelay_bot=info,taskrelay_shared=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env()?;

    tracing::info!("starting TaskRelay bot");

    let pool = create_pool(config.database.clone()).await?;
    run_migrations(&pool).await?;
    tracing::info!("database ready");

    let transport: Arc<dyn ChatTransport> = Arc::new(LogTransport);
    let ctx = Arc::new(Context::new(pool, transport, config.admin_passphrase.clone()));
    let router = Router::new(ctx);

    let shutdown = CancellationToken::new();

    let heartbeat = config
        .keepalive
        .clone()
        .map(|keepalive| taskrelay_bot::heartbeat::spawn(keepalive, shutdown.clone()));

    // Inbound events arrive on this channel from the platform adapter
    let (_event_tx, event_rx) = mpsc::channel::<Event>(256);

    let dispatcher = tokio::spawn(router::run(router, event_rx, shutdown.clone()));

    tokio::signal::ctrl_c().await?;
    tracing::info!("shutdown signal received");
    shutdown.cancel();

    dispatcher.await?;
    if let Some(heartbeat) = heartbeat {
        heartbeat.await?;
    }

    tracing::info!("bye");
    Ok(())
}
