/// Keep-alive heartbeat
///
/// Free-tier hosting suspends idle services; a periodic self-ping keeps the
/// process awake. The loop pings the configured URL at a fixed interval and
/// shortens the wait after a failure so transient outages recover quickly.
/// Cancellation stops the loop promptly, including mid-backoff.
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use taskrelay_shared::config::KeepaliveConfig;

/// Spawns the heartbeat loop, returning its join handle
pub fn spawn(config: KeepaliveConfig, token: CancellationToken) -> JoinHandle<()> {
    tokio::spawn(run(config, token))
}

async fn run(config: KeepaliveConfig, token: CancellationToken) {
    let client = reqwest::Client::new();
    let interval = Duration::from_secs(config.interval_seconds);
    let backoff = Duration::from_secs(config.backoff_seconds);

    tracing::info!(url = %config.url, interval_seconds = config.interval_seconds, "heartbeat started");

    loop {
        tokio::select! {
            _ = token.cancelled() => break,
            _ = tokio::time::sleep(interval) => {}
        }

        match client.get(&config.url).send().await {
            Ok(response) => {
                tracing::debug!(status = %response.status(), "heartbeat ping");
            }
            Err(err) => {
                tracing::warn!(error = %err, "heartbeat ping failed, backing off");
                tokio::select! {
                    _ = token.cancelled() => break,
                    _ = tokio::time::sleep(backoff) => {}
                }
            }
        }
    }

    tracing::info!("heartbeat stopped");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_cancellation_stops_loop_before_first_ping() {
        let config = KeepaliveConfig {
            url: "http://localhost:1/ping".to_string(),
            interval_seconds: 3600,
            backoff_seconds: 60,
        };
        let token = CancellationToken::new();
        let handle = spawn(config, token.clone());

        token.cancel();

        tokio::time::timeout(Duration::from_secs(5), handle)
            .await
            .expect("heartbeat should stop promptly")
            .expect("heartbeat task should not panic");
    }
}
