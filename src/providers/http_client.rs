use reqwest::Client;
use std::time::Duration;

/// Shared client settings for every remote service the bot calls.
///
/// `timeout_secs` bounds the whole request; callers that long-poll pass a
/// value above their poll window.
pub fn build_client(timeout_secs: u64, user_agent: Option<&str>) -> Client {
    let mut builder = Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .connect_timeout(Duration::from_secs(10))
        .pool_max_idle_per_host(10)
        .pool_idle_timeout(Duration::from_secs(90))
        .tcp_keepalive(Duration::from_secs(60));

    if let Some(agent) = user_agent {
        builder = builder.user_agent(agent.to_string());
    }

    builder.build().unwrap_or_else(|e| {
        tracing::warn!("Falling back to default HTTP client: {e}");
        Client::new()
    })
}
