use tokio::sync::watch;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use coursehub_live_client::LiveClient;

mod config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "coursehub_live=debug,coursehub_live_client=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load environment variables
    dotenvy::dotenv().ok();

    let config = config::Config::from_env()?;
    let channel = config.channel();

    tracing::info!(
        url = %config.common.live.ws_url,
        channel = %channel,
        environment = %config.common.environment,
        "Starting CourseHub live watcher"
    );

    let (_token_tx, tokens) = watch::channel(Some(config.token.clone()));
    let client = LiveClient::new(&config.common.live, channel, tokens)?;

    let mut statuses = client.watch_status();
    let mut changes = client.watch_changes();

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("Interrupt received, shutting down");
                break;
            }
            Ok(()) = statuses.changed() => {
                let status = *statuses.borrow_and_update();
                tracing::info!(
                    %status,
                    attempts = client.reconnect_attempts(),
                    "Connection status changed"
                );
            }
            Ok(()) = changes.changed() => {
                changes.borrow_and_update();
                let notifications = client.notifications();
                tracing::info!(
                    total = notifications.len(),
                    unread = client.unread_count(),
                    latest = ?notifications.first().and_then(|n| n.id.as_ref()).map(ToString::to_string),
                    "Notifications updated"
                );
            }
        }
    }

    client.shutdown().await;
    tracing::info!("Live watcher stopped");

    Ok(())
}
