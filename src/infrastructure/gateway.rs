//! Shard-count discovery through the platform's gateway-info endpoint.

use async_trait::async_trait;
use reqwest::Client as HttpClient;
use serde::Deserialize;
use tracing::info;

use crate::error::{Error, Result};
use crate::infrastructure::config::gateway::GatewayConfig;
use crate::port::ShardCountSource;

/// Gateway-info response. Only `shards` is used.
#[derive(Debug, Deserialize)]
pub struct GatewayInfo {
    pub shards: u32,
    #[serde(default)]
    pub url: Option<String>,
}

/// HTTP client for the gateway-info endpoint.
pub struct GatewayClient {
    http: HttpClient,
    url: String,
    token: String,
}

impl GatewayClient {
    /// Build a client authenticating with `token`.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be constructed.
    pub fn new(config: &GatewayConfig, token: impl Into<String>) -> Result<Self> {
        let http = HttpClient::builder()
            .user_agent(config.user_agent.clone())
            .timeout(config.timeout())
            .build()?;
        Ok(Self {
            http,
            url: config.url.clone(),
            token: token.into(),
        })
    }
}

#[async_trait]
impl ShardCountSource for GatewayClient {
    async fn shard_count(&self) -> Result<u32> {
        let response = self
            .http
            .get(&self.url)
            .header("Authorization", format!("Bot {}", self.token))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::Discovery(format!(
                "gateway returned {status} for {}",
                self.url
            )));
        }

        let info: GatewayInfo = response.json().await?;
        info!(
            shards = info.shards,
            status = status.as_u16(),
            "Successfully got shard count"
        );
        Ok(info.shards)
    }
}

/// Fixed shard count from configuration; no network call.
#[derive(Debug, Clone, Copy)]
pub struct FixedShardCount(pub u32);

#[async_trait]
impl ShardCountSource for FixedShardCount {
    async fn shard_count(&self) -> Result<u32> {
        info!(shards = self.0, "Using configured shard count");
        Ok(self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_gateway_payload() {
        let info: GatewayInfo = serde_json::from_str(
            r#"{"url":"wss://gateway.discord.gg","shards":9,
                "session_start_limit":{"total":1000,"remaining":999,"reset_after":14400000,"max_concurrency":1}}"#,
        )
        .unwrap();
        assert_eq!(info.shards, 9);
        assert_eq!(info.url.as_deref(), Some("wss://gateway.discord.gg"));
    }

    #[tokio::test]
    async fn fixed_count_is_returned_as_is() {
        assert_eq!(FixedShardCount(16).shard_count().await.unwrap(), 16);
    }

    #[tokio::test]
    async fn unreachable_gateway_is_an_error() {
        let config = GatewayConfig {
            url: "http://127.0.0.1:9/gateway/bot".into(),
            timeout_secs: 1,
            ..Default::default()
        };
        let client = GatewayClient::new(&config, "token").unwrap();
        assert!(client.shard_count().await.is_err());
    }
}
