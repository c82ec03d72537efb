use super::traits::Channel;
use std::time::Duration;

/// Probe `channel` up to `attempts` times, `delay` apart.
///
/// Returns whether any probe succeeded. Callers keep going either way;
/// the listener retries on its own.
pub async fn wait_until_healthy(channel: &dyn Channel, attempts: u32, delay: Duration) -> bool {
    for attempt in 1..=attempts {
        let healthy = tokio::time::timeout(Duration::from_secs(10), channel.health_check())
            .await
            .unwrap_or(false);
        if healthy {
            tracing::info!("{} connection OK (attempt {attempt})", channel.name());
            return true;
        }

        tracing::warn!(
            "{} health check failed (attempt {attempt}/{attempts})",
            channel.name()
        );
        if attempt < attempts {
            tokio::time::sleep(delay).await;
        }
    }

    tracing::error!(
        "Could not reach {} after {attempts} attempts; polling anyway",
        channel.name()
    );
    false
}
